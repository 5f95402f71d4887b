//! Core data types for the Platewise store
//!
//! This module defines the records persisted by the storage layer and read
//! by the analytics engine:
//! - `UserProfile`: goals and body data for one user
//! - `WeightSample` and `MealRecord`: the logged history
//! - `Measurement`: a value with an explicit unit
//! - `Timeframe`: the lookback windows offered to clients

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fallback daily calorie goal when the profile has none
pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;
/// Fallback daily protein goal (grams)
pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
/// Fallback daily carbohydrate goal (grams)
pub const DEFAULT_CARBS_GOAL: f64 = 200.0;
/// Fallback daily fat goal (grams)
pub const DEFAULT_FAT_GOAL: f64 = 65.0;

/// What the user is working towards
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    MuscleGain,
    Maintenance,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::WeightLoss => "weight_loss",
            GoalType::WeightGain => "weight_gain",
            GoalType::MuscleGain => "muscle_gain",
            GoalType::Maintenance => "maintenance",
        }
    }

    /// Whether progress is measured as weight going up
    pub fn is_gain(&self) -> bool {
        matches!(self, GoalType::WeightGain | GoalType::MuscleGain)
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight_loss" => Ok(GoalType::WeightLoss),
            "weight_gain" => Ok(GoalType::WeightGain),
            "muscle_gain" => Ok(GoalType::MuscleGain),
            "maintenance" => Ok(GoalType::Maintenance),
            other => Err(format!("unknown goal type '{}'", other)),
        }
    }
}

/// Biological sex, used only by the BMR formula
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{}'", other)),
        }
    }
}

/// Habitual activity level for TDEE estimation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// 1-3 days/week
    #[default]
    LightlyActive,
    /// 3-5 days/week
    ModeratelyActive,
    /// 6-7 days/week
    VeryActive,
    /// Hard training twice a day
    ExtraActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" => Ok(ActivityLevel::VeryActive),
            "extra_active" => Ok(ActivityLevel::ExtraActive),
            other => Err(format!("unknown activity level '{}'", other)),
        }
    }
}

/// Unit attached to a `Measurement`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Lb,
    Cm,
    In,
}

/// Physical dimension of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Length,
}

impl Unit {
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Kg | Unit::Lb => Dimension::Mass,
            Unit::Cm | Unit::In => Dimension::Length,
        }
    }
}

const KG_PER_LB: f64 = 0.453_592_37;
const CM_PER_IN: f64 = 2.54;

/// A body measurement as entered by the user
///
/// Canonical storage is metric; imperial input is converted once, through
/// [`Measurement::to_metric`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: Unit,
}

impl Measurement {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn kg(value: f64) -> Self {
        Self::new(value, Unit::Kg)
    }

    pub fn cm(value: f64) -> Self {
        Self::new(value, Unit::Cm)
    }

    /// Value in the metric unit of its dimension (kg for mass, cm for length)
    pub fn to_metric(&self) -> f64 {
        match self.unit {
            Unit::Kg | Unit::Cm => self.value,
            Unit::Lb => self.value * KG_PER_LB,
            Unit::In => self.value * CM_PER_IN,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }
}

/// User profile as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    /// Latest known body weight (kg)
    pub current_weight: f64,
    /// Goal body weight (kg)
    pub target_weight: f64,
    pub goal_type: GoalType,
    #[serde(default)]
    pub daily_calorie_goal: Option<i64>,
    #[serde(default)]
    pub protein_goal: Option<f64>,
    #[serde(default)]
    pub carbs_goal: Option<f64>,
    #[serde(default)]
    pub fat_goal: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    /// Offset from UTC used to cut meals into local calendar days
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Last modification, unix milliseconds
    #[serde(default)]
    pub updated_at: i64,
}

impl UserProfile {
    /// Create a profile with the required fields; everything else defaults
    pub fn new(
        user_id: impl Into<String>,
        current_weight: f64,
        target_weight: f64,
        goal_type: GoalType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            current_weight,
            target_weight,
            goal_type,
            daily_calorie_goal: None,
            protein_goal: None,
            carbs_goal: None,
            fat_goal: None,
            height_cm: None,
            age: None,
            sex: None,
            activity_level: ActivityLevel::default(),
            utc_offset_minutes: 0,
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    /// Builder method: set the calorie and macro goals
    pub fn goals(mut self, calories: i64, protein: f64, carbs: f64, fat: f64) -> Self {
        self.daily_calorie_goal = Some(calories);
        self.protein_goal = Some(protein);
        self.carbs_goal = Some(carbs);
        self.fat_goal = Some(fat);
        self
    }

    /// Builder method: set the UTC offset in minutes
    pub fn utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Effective nutrition goals, with defaults filled in
    pub fn nutrition_goals(&self) -> NutritionGoals {
        fn positive_or(value: Option<f64>, default: f64) -> f64 {
            value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
        }

        NutritionGoals {
            calories: positive_or(self.daily_calorie_goal.map(|c| c as f64), DEFAULT_CALORIE_GOAL),
            protein: positive_or(self.protein_goal, DEFAULT_PROTEIN_GOAL),
            carbs: positive_or(self.carbs_goal, DEFAULT_CARBS_GOAL),
            fat: positive_or(self.fat_goal, DEFAULT_FAT_GOAL),
        }
    }
}

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionGoals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            calories: DEFAULT_CALORIE_GOAL,
            protein: DEFAULT_PROTEIN_GOAL,
            carbs: DEFAULT_CARBS_GOAL,
            fat: DEFAULT_FAT_GOAL,
        }
    }
}

/// A single body-weight reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightSample {
    /// Weight in kilograms
    pub weight: f64,
    pub recorded_at: DateTime<Utc>,
}

impl WeightSample {
    pub fn new(weight: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            weight,
            recorded_at,
        }
    }
}

/// Meal slot, for display only
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(format!("unknown meal type '{}'", other)),
        }
    }
}

/// A logged meal with its nutrition totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meal_type: MealType,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub consumed_at: DateTime<Utc>,
}

impl MealRecord {
    /// Create a meal from its totals
    pub fn new(
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
        consumed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: None,
            meal_type: MealType::default(),
            total_calories: calories,
            total_protein: protein,
            total_carbs: carbs,
            total_fat: fat,
            consumed_at,
        }
    }

    /// Builder method: set name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method: set meal type
    pub fn meal_type(mut self, meal_type: MealType) -> Self {
        self.meal_type = meal_type;
        self
    }
}

/// Lookback window offered to clients
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Timeframe {
    #[serde(rename = "1W")]
    OneWeek,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl Timeframe {
    /// Length of the window in days
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::OneWeek => 7,
            Timeframe::OneMonth => 30,
            Timeframe::ThreeMonths => 90,
            Timeframe::SixMonths => 180,
            Timeframe::OneYear => 365,
        }
    }

    /// Start of the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1W" => Ok(Timeframe::OneWeek),
            "1M" => Ok(Timeframe::OneMonth),
            "3M" => Ok(Timeframe::ThreeMonths),
            "6M" => Ok(Timeframe::SixMonths),
            "1Y" => Ok(Timeframe::OneYear),
            other => Err(format!("unknown timeframe '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_conversion() {
        let lb = Measurement::new(220.0, Unit::Lb);
        assert!((lb.to_metric() - 99.79).abs() < 0.01);
        assert_eq!(lb.dimension(), Dimension::Mass);

        let inches = Measurement::new(70.0, Unit::In);
        assert!((inches.to_metric() - 177.8).abs() < 1e-9);
        assert_eq!(inches.dimension(), Dimension::Length);

        assert_eq!(Measurement::kg(72.5).to_metric(), 72.5);
    }

    #[test]
    fn test_nutrition_goals_defaults() {
        let profile = UserProfile::new("u1", 80.0, 70.0, GoalType::WeightLoss);
        assert_eq!(profile.nutrition_goals(), NutritionGoals::default());

        let profile = profile.goals(1800, 140.0, 0.0, 60.0);
        let goals = profile.nutrition_goals();
        assert_eq!(goals.calories, 1800.0);
        assert_eq!(goals.protein, 140.0);
        // Non-positive goals fall back to defaults
        assert_eq!(goals.carbs, DEFAULT_CARBS_GOAL);
        assert_eq!(goals.fat, 60.0);
    }

    #[test]
    fn test_timeframe_serde() {
        let tf: Timeframe = serde_json::from_str("\"3M\"").unwrap();
        assert_eq!(tf, Timeframe::ThreeMonths);
        assert_eq!(tf.days(), 90);
        assert_eq!(serde_json::to_string(&Timeframe::OneYear).unwrap(), "\"1Y\"");
        assert!("2W".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_goal_type_round_trip_str() {
        for goal in [
            GoalType::WeightLoss,
            GoalType::WeightGain,
            GoalType::MuscleGain,
            GoalType::Maintenance,
        ] {
            assert_eq!(goal.as_str().parse::<GoalType>().unwrap(), goal);
        }
    }

    #[test]
    fn test_profile_json_is_camel_case() {
        let profile = UserProfile::new("u1", 80.0, 70.0, GoalType::WeightLoss);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["goalType"], "weight_loss");
        assert_eq!(json["currentWeight"], 80.0);
        assert_eq!(json["activityLevel"], "lightly_active");
    }
}

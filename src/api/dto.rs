//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{
    CalorieAnalytics, DailyTotals, GoalProgress, NutritionPlan, PlanInput, WeightAnalytics,
};
use crate::insights::{AiInsights, FoodRecommendations, InsightSource};
use crate::storage::{
    ActivityLevel, Dimension, GoalType, MealRecord, MealType, Measurement, Sex, Timeframe,
    UserProfile, WeightSample,
};

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

// ============================================
// ANALYTICS DTOs
// ============================================

/// Analytics request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    /// Lookback window, defaults to 1M
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default, rename = "includeAI")]
    pub include_ai: bool,
    #[serde(default)]
    pub include_food_recommendations: bool,
}

/// Analytics payload; the AI parts are null unless requested
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub weight_analytics: WeightAnalytics,
    pub calorie_analytics: CalorieAnalytics,
    pub goal_progress: GoalProgress,
    pub ai_insights: Option<AiInsights>,
    pub recommendations: Option<FoodRecommendations>,
}

// ============================================
// PROFILE DTOs
// ============================================

/// Create or replace a profile
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub current_weight: Measurement,
    pub target_weight: Measurement,
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
    pub height: Option<Measurement>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl ProfileRequest {
    /// Validate and convert into a stored profile for `user_id`
    pub fn into_profile(self, user_id: &str) -> Result<UserProfile, String> {
        let mut profile = UserProfile::new(
            user_id,
            body_weight(&self.current_weight)?,
            body_weight(&self.target_weight)?,
            self.goal_type,
        );
        profile.activity_level = self.activity_level;

        if let Some(calories) = self.daily_calorie_goal {
            ProfileUpdate::DailyCalorieGoal(calories).apply(&mut profile)?;
        }
        if self.protein_goal.is_some() || self.carbs_goal.is_some() || self.fat_goal.is_some() {
            ProfileUpdate::Macros(MacroGoals {
                protein: self.protein_goal,
                carbs: self.carbs_goal,
                fat: self.fat_goal,
            })
            .apply(&mut profile)?;
        }
        if let Some(height) = self.height {
            ProfileUpdate::Height(height).apply(&mut profile)?;
        }
        if let Some(age) = self.age {
            ProfileUpdate::Age(age).apply(&mut profile)?;
        }
        profile.sex = self.sex;
        ProfileUpdate::UtcOffsetMinutes(self.utc_offset_minutes).apply(&mut profile)?;

        Ok(profile)
    }
}

/// Macro goals in grams; absent fields are left unchanged
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct MacroGoals {
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
}

/// Single-field profile update
///
/// Wire form: `{ "field": "weight", "value": { "value": 180, "unit": "lb" } }`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ProfileUpdate {
    Weight(Measurement),
    TargetWeight(Measurement),
    Height(Measurement),
    GoalType(GoalType),
    DailyCalorieGoal(i64),
    Macros(MacroGoals),
    ActivityLevel(ActivityLevel),
    Age(u32),
    Sex(Sex),
    UtcOffsetMinutes(i32),
}

impl ProfileUpdate {
    /// Apply the update after validating it
    pub fn apply(self, profile: &mut UserProfile) -> Result<(), String> {
        match self {
            ProfileUpdate::Weight(m) => profile.current_weight = body_weight(&m)?,
            ProfileUpdate::TargetWeight(m) => profile.target_weight = body_weight(&m)?,
            ProfileUpdate::Height(m) => {
                let cm = metric_value(&m, Dimension::Length, "height")?;
                if !(50.0..=275.0).contains(&cm) {
                    return Err(format!("height {:.1} cm is out of range", cm));
                }
                profile.height_cm = Some(cm);
            }
            ProfileUpdate::GoalType(goal) => profile.goal_type = goal,
            ProfileUpdate::DailyCalorieGoal(calories) => {
                if !(800..=10_000).contains(&calories) {
                    return Err("dailyCalorieGoal must be between 800 and 10000".to_string());
                }
                profile.daily_calorie_goal = Some(calories);
            }
            ProfileUpdate::Macros(macros) => {
                let goals = [
                    ("protein", macros.protein),
                    ("carbs", macros.carbs),
                    ("fat", macros.fat),
                ];
                for (name, value) in goals {
                    if let Some(v) = value {
                        if !v.is_finite() || v < 0.0 {
                            return Err(format!("{} goal must be a non-negative number", name));
                        }
                    }
                }
                profile.protein_goal = macros.protein.or(profile.protein_goal);
                profile.carbs_goal = macros.carbs.or(profile.carbs_goal);
                profile.fat_goal = macros.fat.or(profile.fat_goal);
            }
            ProfileUpdate::ActivityLevel(level) => profile.activity_level = level,
            ProfileUpdate::Age(age) => {
                if !(13..=120).contains(&age) {
                    return Err("age must be between 13 and 120".to_string());
                }
                profile.age = Some(age);
            }
            ProfileUpdate::Sex(sex) => profile.sex = Some(sex),
            ProfileUpdate::UtcOffsetMinutes(minutes) => {
                if !(-720..=840).contains(&minutes) {
                    return Err("utcOffsetMinutes must be between -720 and 840".to_string());
                }
                profile.utc_offset_minutes = minutes;
            }
        }
        profile.updated_at = Utc::now().timestamp_millis();
        Ok(())
    }
}

fn metric_value(m: &Measurement, expected: Dimension, what: &str) -> Result<f64, String> {
    if m.dimension() != expected {
        return Err(format!("{} has the wrong unit", what));
    }
    let value = m.to_metric();
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be a positive number", what));
    }
    Ok(value)
}

/// Body weight in kg, validated to a plausible range
pub fn body_weight(m: &Measurement) -> Result<f64, String> {
    let kg = metric_value(m, Dimension::Mass, "weight")?;
    if !(20.0..=500.0).contains(&kg) {
        return Err(format!("weight {:.1} kg is out of range", kg));
    }
    Ok(kg)
}

// ============================================
// HISTORY DTOs
// ============================================

/// `?timeframe=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct TimeframeQuery {
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// Log a weigh-in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWeightRequest {
    pub weight: Measurement,
    /// Defaults to now
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Stored weigh-in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub id: i64,
    pub weight: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct WeightHistory {
    pub timeframe: Timeframe,
    pub samples: Vec<WeightSample>,
}

/// Log a meal
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meal_type: MealType,
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_carbs: f64,
    #[serde(default)]
    pub total_fat: f64,
    /// Defaults to now
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl LogMealRequest {
    pub fn into_record(self, now: DateTime<Utc>) -> Result<MealRecord, String> {
        let totals = [
            ("totalCalories", self.total_calories),
            ("totalProtein", self.total_protein),
            ("totalCarbs", self.total_carbs),
            ("totalFat", self.total_fat),
        ];
        for (name, value) in totals {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }

        let mut meal = MealRecord::new(
            self.total_calories,
            self.total_protein,
            self.total_carbs,
            self.total_fat,
            self.consumed_at.unwrap_or(now),
        )
        .meal_type(self.meal_type);
        meal.name = self.name.filter(|n| !n.trim().is_empty());
        Ok(meal)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
    pub id: i64,
    pub meal: MealRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealHistory {
    pub timeframe: Timeframe,
    pub meals: Vec<MealRecord>,
    pub daily_totals: Vec<DailyTotals>,
}

// ============================================
// PLAN / CHAT DTOs
// ============================================

/// Nutrition plan request; without `input` the stored profile is used
#[derive(Debug, Default, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub input: Option<PlanInput>,
    /// Write the resulting goals to the profile
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: NutritionPlan,
    pub applied: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub source: InsightSource,
    /// Messages left in the current rate-limit window
    pub remaining: u32,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, unhealthy
    pub status: String,
    /// Storage status: ok, error
    pub storage: String,
    /// LLM status: enabled, disabled
    pub llm: String,
    /// Profiles currently held in the cache
    pub cached_profiles: usize,
    /// Users with an open chat rate-limit window
    pub chat_windows: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}

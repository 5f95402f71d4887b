//! Nutrition Plan Calculator
//!
//! Onboarding targets from body data:
//!
//! - BMR: Mifflin-St Jeor (1990), `10w + 6.25h - 5a + 5` for men and
//!   `- 161` for women, floored at 1000 kcal
//! - TDEE: BMR x activity factor (McArdle et al.)
//! - Daily calories: TDEE adjusted for the goal, floored at 1200 kcal
//! - Macros: protein by g/kg of body weight, fat at 25% of calories,
//!   carbohydrates fill the remainder

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{ActivityLevel, GoalType, Sex, UserProfile};

const MIN_BMR: f64 = 1000.0;
const MIN_DAILY_CALORIES: f64 = 1200.0;
const FAT_SHARE_OF_CALORIES: f64 = 0.25;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Errors from plan calculation
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Missing profile field: {0}")]
    MissingField(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Body data needed for a plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    pub goal_type: GoalType,
}

impl PlanInput {
    /// Build input from a stored profile; height, age and sex are required
    pub fn from_profile(profile: &UserProfile) -> Result<Self, PlanError> {
        Ok(Self {
            weight_kg: profile.current_weight,
            height_cm: profile.height_cm.ok_or(PlanError::MissingField("heightCm"))?,
            age: profile.age.ok_or(PlanError::MissingField("age"))?,
            sex: profile.sex.ok_or(PlanError::MissingField("sex"))?,
            activity_level: profile.activity_level,
            goal_type: profile.goal_type,
        })
    }

    fn validate(&self) -> Result<(), PlanError> {
        if !self.weight_kg.is_finite() || !(20.0..=300.0).contains(&self.weight_kg) {
            return Err(PlanError::InvalidInput(
                "weight must be between 20 and 300 kg".to_string(),
            ));
        }
        if !self.height_cm.is_finite() || !(100.0..=250.0).contains(&self.height_cm) {
            return Err(PlanError::InvalidInput(
                "height must be between 100 and 250 cm".to_string(),
            ));
        }
        if !(13..=100).contains(&self.age) {
            return Err(PlanError::InvalidInput(
                "age must be between 13 and 100 years".to_string(),
            ));
        }
        Ok(())
    }
}

/// Calorie and macro targets
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
    pub bmr: f64,
    pub tdee: f64,
    pub daily_calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    let sex_constant = match sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + sex_constant;
    bmr.max(MIN_BMR)
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtraActive => 1.9,
    }
}

/// kcal/day added to TDEE for each goal
pub fn goal_adjustment(goal: GoalType) -> f64 {
    match goal {
        GoalType::WeightLoss => -500.0,
        GoalType::WeightGain => 300.0,
        GoalType::MuscleGain => 250.0,
        GoalType::Maintenance => 0.0,
    }
}

/// Protein in g per kg of body weight for each goal
pub fn protein_per_kg(goal: GoalType) -> f64 {
    match goal {
        // Higher protein preserves lean mass in a deficit
        GoalType::WeightLoss => 1.8,
        GoalType::WeightGain => 1.6,
        GoalType::MuscleGain => 2.0,
        GoalType::Maintenance => 1.4,
    }
}

/// Compute a full plan
pub fn calculate(input: &PlanInput) -> Result<NutritionPlan, PlanError> {
    input.validate()?;

    let bmr = basal_metabolic_rate(input.weight_kg, input.height_cm, input.age, input.sex);
    let tdee = bmr * activity_factor(input.activity_level);
    let calories = (tdee + goal_adjustment(input.goal_type))
        .max(MIN_DAILY_CALORIES)
        .round();

    let protein_g = (input.weight_kg * protein_per_kg(input.goal_type)).round();
    let fat_g = (calories * FAT_SHARE_OF_CALORIES / KCAL_PER_G_FAT).round();
    let carbs_g = ((calories - protein_g * KCAL_PER_G_PROTEIN - fat_g * KCAL_PER_G_FAT)
        / KCAL_PER_G_CARBS)
        .max(0.0)
        .round();

    Ok(NutritionPlan {
        bmr: bmr.round(),
        tdee: tdee.round(),
        daily_calories: calories as i64,
        protein_g,
        carbs_g,
        fat_g,
    })
}

impl NutritionPlan {
    /// Write the plan's targets into a profile
    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.daily_calorie_goal = Some(self.daily_calories);
        profile.protein_goal = Some(self.protein_g);
        profile.carbs_goal = Some(self.carbs_g);
        profile.fat_goal = Some(self.fat_g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(goal: GoalType) -> PlanInput {
        PlanInput {
            weight_kg: 80.0,
            height_cm: 180.0,
            age: 30,
            sex: Sex::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            goal_type: goal,
        }
    }

    #[test]
    fn test_mifflin_st_jeor() {
        // 800 + 1125 - 150 + 5
        assert_eq!(basal_metabolic_rate(80.0, 180.0, 30, Sex::Male), 1780.0);
        // 600 + 1031.25 - 125 - 161
        assert_eq!(basal_metabolic_rate(60.0, 165.0, 25, Sex::Female), 1345.25);
        // Floor
        assert_eq!(basal_metabolic_rate(20.0, 100.0, 100, Sex::Female), MIN_BMR);
    }

    #[test]
    fn test_weight_loss_plan() {
        let plan = calculate(&input(GoalType::WeightLoss)).unwrap();

        assert_eq!(plan.bmr, 1780.0);
        // 1780 * 1.55 = 2759
        assert_eq!(plan.tdee, 2759.0);
        assert_eq!(plan.daily_calories, 2259);
        assert_eq!(plan.protein_g, 144.0);
        // 2259 * 0.25 / 9 = 62.75
        assert_eq!(plan.fat_g, 63.0);
        // (2259 - 576 - 567) / 4 = 279
        assert_eq!(plan.carbs_g, 279.0);
    }

    #[test]
    fn test_calorie_floor() {
        let mut small = input(GoalType::WeightLoss);
        small.weight_kg = 40.0;
        small.height_cm = 150.0;
        small.age = 70;
        small.sex = Sex::Female;
        small.activity_level = ActivityLevel::Sedentary;

        let plan = calculate(&small).unwrap();
        assert_eq!(plan.daily_calories, 1200);
    }

    #[test]
    fn test_validation() {
        let mut bad = input(GoalType::Maintenance);
        bad.age = 8;
        assert!(matches!(calculate(&bad), Err(PlanError::InvalidInput(_))));

        let mut bad = input(GoalType::Maintenance);
        bad.weight_kg = f64::NAN;
        assert!(calculate(&bad).is_err());
    }

    #[test]
    fn test_from_profile_requires_body_data() {
        let mut profile = UserProfile::new("u1", 80.0, 75.0, GoalType::WeightLoss);
        assert_eq!(
            PlanInput::from_profile(&profile),
            Err(PlanError::MissingField("heightCm"))
        );

        profile.height_cm = Some(180.0);
        profile.age = Some(30);
        profile.sex = Some(Sex::Male);
        let input = PlanInput::from_profile(&profile).unwrap();
        assert_eq!(input.activity_level, ActivityLevel::LightlyActive);

        let plan = calculate(&input).unwrap();
        plan.apply_to(&mut profile);
        assert_eq!(profile.daily_calorie_goal, Some(plan.daily_calories));
        assert_eq!(profile.protein_goal, Some(plan.protein_g));
    }
}

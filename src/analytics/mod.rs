//! Analytics Engine
//!
//! Pure computation over history already fetched from storage.
//!
//! ## Pipeline
//!
//! 1. **weight**: trends, goal progress and chart data from weight samples
//! 2. **calories**: daily totals, adherence and macro averages from meals
//! 3. **goal**: status and success probability from (1) and (2)
//!
//! [`analyze`] runs all three or fails as a whole; there are no partial
//! results. The only time dependency is the `now` passed in, which anchors
//! the weekly and monthly trend windows.
//!
//! [`plan`] holds the onboarding calorie/macro calculator.

pub mod calories;
pub mod goal;
pub mod plan;
pub mod regression;
pub mod weight;

pub use calories::{CalorieAnalytics, DailyTotals, MacroTrend, MacroTrends};
pub use goal::{GoalProgress, GoalStatus};
pub use plan::{NutritionPlan, PlanError, PlanInput};
pub use regression::LinearFit;
pub use weight::{TrendDirection, WeightAnalytics};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::storage::{MealRecord, UserProfile, WeightSample};

/// Errors raised when inputs cannot be analyzed
#[derive(Debug, Error, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid weight sample at index {index}: {reason}")]
    InvalidSample { index: usize, reason: String },

    #[error("Invalid meal at index {index}: {reason}")]
    InvalidMeal { index: usize, reason: String },
}

/// Output of the full pipeline
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub weight_analytics: WeightAnalytics,
    pub calorie_analytics: CalorieAnalytics,
    pub goal_progress: GoalProgress,
}

/// Run weight, calorie and goal analysis for one user.
///
/// `samples` need not be sorted; a sorted copy is analyzed.
pub fn analyze(
    profile: &UserProfile,
    samples: &[WeightSample],
    meals: &[MealRecord],
    now: DateTime<Utc>,
) -> Result<AnalyticsReport, AnalyticsError> {
    validate(profile, samples, meals)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.recorded_at);

    let weight_analytics = weight::analyze(&sorted, profile, now);
    let calorie_analytics =
        calories::analyze(meals, &profile.nutrition_goals(), profile.utc_offset_minutes);
    let goal_progress = goal::synthesize(&weight_analytics, &calorie_analytics, profile.goal_type);

    tracing::debug!(
        user_id = %profile.user_id,
        samples = sorted.len(),
        meals = meals.len(),
        status = ?goal_progress.status,
        "Analytics computed"
    );

    Ok(AnalyticsReport {
        weight_analytics,
        calorie_analytics,
        goal_progress,
    })
}

fn validate(
    profile: &UserProfile,
    samples: &[WeightSample],
    meals: &[MealRecord],
) -> Result<(), AnalyticsError> {
    if !profile.current_weight.is_finite() || !profile.target_weight.is_finite() {
        return Err(AnalyticsError::InvalidProfile(
            "current and target weight must be finite".to_string(),
        ));
    }

    for (index, sample) in samples.iter().enumerate() {
        if !sample.weight.is_finite() || sample.weight <= 0.0 {
            return Err(AnalyticsError::InvalidSample {
                index,
                reason: format!("weight {} is not a positive number", sample.weight),
            });
        }
    }

    for (index, meal) in meals.iter().enumerate() {
        let totals = [
            meal.total_calories,
            meal.total_protein,
            meal.total_carbs,
            meal.total_fat,
        ];
        if totals.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnalyticsError::InvalidMeal {
                index,
                reason: "totals must be non-negative numbers".to_string(),
            });
        }
    }

    Ok(())
}

/// Local calendar date (`YYYY-MM-DD`) of an instant at a fixed UTC offset
pub fn local_day_key(at: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    (at + Duration::minutes(i64::from(utc_offset_minutes)))
        .format("%Y-%m-%d")
        .to_string()
}

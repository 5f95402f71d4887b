//! Goal Progress Synthesizer
//!
//! Compares the observed monthly rate of change with a fixed expected rate
//! per goal type and derives a status and a heuristic success probability.

use serde::Serialize;

use super::calories::CalorieAnalytics;
use super::weight::{WeightAnalytics, TREND_DEAD_ZONE};
use crate::storage::GoalType;

/// kg/month expected for each goal type.
///
/// Heuristic constants, independent of any per-user rate setting.
pub fn expected_monthly_change(goal: GoalType) -> f64 {
    match goal {
        GoalType::WeightLoss => -2.0,
        GoalType::WeightGain | GoalType::MuscleGain => 2.0,
        GoalType::Maintenance => 0.0,
    }
}

/// The monthly trend window is 30 days; its kg/week rate scales by 30/7
const WEEKS_PER_MONTH: f64 = 30.0 / 7.0;

/// Status by distance from the expected rate
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Excellent,
    Good,
    Concerning,
    OffTrack,
}

impl GoalStatus {
    /// Classify `variance = |actual - expected|` in kg/month
    pub fn from_variance(variance: f64) -> Self {
        if variance <= 0.5 {
            GoalStatus::Excellent
        } else if variance <= 1.0 {
            GoalStatus::Good
        } else if variance <= 2.0 {
            GoalStatus::Concerning
        } else {
            GoalStatus::OffTrack
        }
    }
}

/// Progress against the user's stated goal
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// Human-readable goal, e.g. "Lose 8.0 kg"
    pub primary_goal: String,
    pub goal_type: GoalType,
    /// kg/month
    pub expected_progress: f64,
    /// kg/month, from the monthly trend
    pub actual_progress: f64,
    pub variance: f64,
    pub status: GoalStatus,
    /// Days to target at the weekly trend; 0 when the trend is flat
    pub days_to_goal: u32,
    /// 0..=100
    pub success_probability: f64,
    /// Calorie adherence carried over for display next to the status
    pub calorie_adherence: f64,
}

/// Combine weight and calorie analytics into a goal assessment
pub fn synthesize(
    weight: &WeightAnalytics,
    calories: &CalorieAnalytics,
    goal: GoalType,
) -> GoalProgress {
    let expected_progress = expected_monthly_change(goal);
    let actual_progress = weight.monthly_trend * WEEKS_PER_MONTH;
    let variance = (actual_progress - expected_progress).abs();

    GoalProgress {
        primary_goal: describe_goal(goal, weight.current_weight, weight.target_weight),
        goal_type: goal,
        expected_progress,
        actual_progress,
        variance,
        status: GoalStatus::from_variance(variance),
        days_to_goal: days_to_goal(weight.time_to_goal),
        success_probability: success_probability(
            actual_progress,
            expected_progress,
            weight.weekly_trend,
        ),
        calorie_adherence: calories.adherence_rate,
    }
}

/// `clamp(0, 100, actual / expected * 50 * trendFactor)`.
///
/// A zero expectation (maintenance) divides by 1 instead.
pub fn success_probability(actual: f64, expected: f64, weekly_trend: f64) -> f64 {
    let divisor = if expected == 0.0 { 1.0 } else { expected };
    let trend_factor = if weekly_trend.abs() > TREND_DEAD_ZONE {
        1.2
    } else {
        0.8
    };

    let probability = actual / divisor * 50.0 * trend_factor;
    if probability.is_finite() {
        probability.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn days_to_goal(weeks: f64) -> u32 {
    if !weeks.is_finite() || weeks <= 0.0 {
        return 0;
    }
    (weeks * 7.0).ceil().min(u32::MAX as f64) as u32
}

fn describe_goal(goal: GoalType, current: f64, target: f64) -> String {
    let remaining = (target - current).abs();
    match goal {
        GoalType::WeightLoss => format!("Lose {:.1} kg", remaining),
        GoalType::WeightGain => format!("Gain {:.1} kg", remaining),
        GoalType::MuscleGain => format!("Build muscle to {:.1} kg", target),
        GoalType::Maintenance => format!("Maintain {:.1} kg", target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::weight::{TrendDirection, WeightChartData};

    fn weight(weekly: f64, monthly: f64, time_to_goal: f64) -> WeightAnalytics {
        WeightAnalytics {
            current_weight: 78.0,
            start_weight: 80.0,
            target_weight: 70.0,
            weight_change: -2.0,
            weekly_trend: weekly,
            monthly_trend: monthly,
            progress_percentage: 20.0,
            time_to_goal,
            is_on_track: true,
            trend_direction: TrendDirection::Improving,
            chart_data: WeightChartData::default(),
        }
    }

    fn calories() -> CalorieAnalytics {
        crate::analytics::calories::analyze(&[], &Default::default(), 0)
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(GoalStatus::from_variance(0.0), GoalStatus::Excellent);
        assert_eq!(GoalStatus::from_variance(0.5), GoalStatus::Excellent);
        assert_eq!(GoalStatus::from_variance(0.75), GoalStatus::Good);
        assert_eq!(GoalStatus::from_variance(1.0), GoalStatus::Good);
        assert_eq!(GoalStatus::from_variance(2.0), GoalStatus::Concerning);
        assert_eq!(GoalStatus::from_variance(2.01), GoalStatus::OffTrack);
    }

    #[test]
    fn test_on_pace_weight_loss() {
        // 0.466.. kg/week over 30 days is -2 kg/month
        let monthly = -2.0 / WEEKS_PER_MONTH;
        let result = synthesize(&weight(-0.5, monthly, 16.0), &calories(), GoalType::WeightLoss);

        assert_eq!(result.expected_progress, -2.0);
        assert!((result.actual_progress + 2.0).abs() < 1e-9);
        assert!(result.variance < 1e-9);
        assert_eq!(result.status, GoalStatus::Excellent);
        // ratio 1 * 50 * 1.2
        assert!((result.success_probability - 60.0).abs() < 1e-9);
        assert_eq!(result.days_to_goal, 112);
        assert_eq!(result.primary_goal, "Lose 8.0 kg");
    }

    #[test]
    fn test_wrong_direction_has_zero_probability() {
        let result = synthesize(&weight(0.5, 0.5, 16.0), &calories(), GoalType::WeightLoss);
        assert_eq!(result.success_probability, 0.0);
        assert_eq!(result.status, GoalStatus::OffTrack);
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(success_probability(-8.0, -2.0, -1.0), 100.0);
        assert_eq!(success_probability(3.0, -2.0, 0.5), 0.0);
    }

    #[test]
    fn test_maintenance_divides_by_one() {
        // Flat: 0 / 1
        assert_eq!(success_probability(0.0, 0.0, 0.0), 0.0);
        // Slow gain during maintenance: 0.5 * 50 * 0.8
        assert!((success_probability(0.5, 0.0, 0.05) - 20.0).abs() < 1e-9);

        let result = synthesize(&weight(0.0, 0.0, 0.0), &calories(), GoalType::Maintenance);
        assert_eq!(result.status, GoalStatus::Excellent);
        assert_eq!(result.days_to_goal, 0);
        assert_eq!(result.primary_goal, "Maintain 70.0 kg");
    }

    #[test]
    fn test_expected_table() {
        assert_eq!(expected_monthly_change(GoalType::WeightGain), 2.0);
        assert_eq!(expected_monthly_change(GoalType::MuscleGain), 2.0);
        assert_eq!(expected_monthly_change(GoalType::Maintenance), 0.0);
    }
}

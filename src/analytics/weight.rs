//! Weight Trend Analyzer
//!
//! Turns an ascending series of weight samples into current/start weight,
//! weekly and monthly trends, goal progress and chart data.
//!
//! Trends are expressed in kg/week and clamped to ±10 kg/week. Two samples
//! a few minutes apart would otherwise produce rates in the thousands.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::local_day_key;
use super::regression::trend_line;
use crate::storage::{GoalType, UserProfile, WeightSample};

/// Upper bound on |trend| in kg/week
pub const MAX_TREND_KG_PER_WEEK: f64 = 10.0;

/// Trends within ±0.1 kg/week count as stable
pub const TREND_DEAD_ZONE: f64 = 0.1;

/// Maintenance gets full credit within 5% of the target weight
pub const MAINTENANCE_TOLERANCE: f64 = 0.05;

pub const WEEKLY_WINDOW_DAYS: i64 = 7;
pub const MONTHLY_WINDOW_DAYS: i64 = 30;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Direction of the weekly trend relative to the user's goal
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// Series for the weight chart
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightChartData {
    /// Local calendar date of each sample
    pub labels: Vec<String>,
    pub weights: Vec<f64>,
    /// Least-squares fit over sample index
    pub trend_line: Vec<f64>,
}

/// Weight statistics for one analysis window
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightAnalytics {
    pub current_weight: f64,
    pub start_weight: f64,
    pub target_weight: f64,
    pub weight_change: f64,
    /// kg/week over the last 7 days
    pub weekly_trend: f64,
    /// kg/week over the last 30 days
    pub monthly_trend: f64,
    /// 0..=100
    pub progress_percentage: f64,
    /// Weeks to reach the target at the weekly trend; 0 when the trend is flat
    pub time_to_goal: f64,
    pub is_on_track: bool,
    pub trend_direction: TrendDirection,
    pub chart_data: WeightChartData,
}

impl WeightAnalytics {
    /// Neutral result for a user with no samples in the window
    fn empty(profile: &UserProfile) -> Self {
        Self {
            current_weight: profile.current_weight,
            start_weight: profile.current_weight,
            target_weight: profile.target_weight,
            weight_change: 0.0,
            weekly_trend: 0.0,
            monthly_trend: 0.0,
            progress_percentage: 0.0,
            time_to_goal: 0.0,
            is_on_track: false,
            trend_direction: TrendDirection::Stable,
            chart_data: WeightChartData::default(),
        }
    }
}

/// Analyze `samples`, which must be sorted by `recorded_at` ascending.
pub fn analyze(
    samples: &[WeightSample],
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> WeightAnalytics {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return WeightAnalytics::empty(profile),
    };

    let goal = profile.goal_type;
    let start_weight = first.weight;
    let current_weight = last.weight;
    let target_weight = profile.target_weight;

    let weekly_trend = calculate_trend(samples, WEEKLY_WINDOW_DAYS, now);
    let monthly_trend = calculate_trend(samples, MONTHLY_WINDOW_DAYS, now);
    let progress_percentage =
        progress_percentage(goal, start_weight, current_weight, target_weight);
    let trend_direction = trend_direction(goal, weekly_trend);

    let is_on_track = progress_percentage >= 100.0
        || trend_direction == TrendDirection::Improving
        || (goal == GoalType::Maintenance && trend_direction == TrendDirection::Stable);

    let weights: Vec<f64> = samples.iter().map(|s| s.weight).collect();
    let chart_data = WeightChartData {
        labels: samples
            .iter()
            .map(|s| local_day_key(s.recorded_at, profile.utc_offset_minutes))
            .collect(),
        trend_line: trend_line(&weights),
        weights,
    };

    WeightAnalytics {
        current_weight,
        start_weight,
        target_weight,
        weight_change: current_weight - start_weight,
        weekly_trend,
        monthly_trend,
        progress_percentage,
        time_to_goal: time_to_goal(current_weight, target_weight, weekly_trend),
        is_on_track,
        trend_direction,
        chart_data,
    }
}

/// Rate of change in kg/week over the samples in the last `days` days.
///
/// Uses the first and last sample inside the window; fewer than two samples
/// (or no elapsed time between them) gives 0.
pub fn calculate_trend(samples: &[WeightSample], days: i64, now: DateTime<Utc>) -> f64 {
    let cutoff = now - Duration::days(days);
    let mut recent = samples.iter().filter(|s| s.recorded_at >= cutoff);

    let first = match recent.next() {
        Some(first) => first,
        None => return 0.0,
    };
    let last = match recent.last() {
        Some(last) => last,
        None => return 0.0,
    };

    let span_days = (last.recorded_at - first.recorded_at).num_milliseconds() as f64 / MS_PER_DAY;
    if span_days <= 0.0 {
        return 0.0;
    }

    let trend = (last.weight - first.weight) / span_days * 7.0;
    trend.clamp(-MAX_TREND_KG_PER_WEEK, MAX_TREND_KG_PER_WEEK)
}

/// Percentage of the way from `start` to `target`, always in 0..=100.
pub fn progress_percentage(goal: GoalType, start: f64, current: f64, target: f64) -> f64 {
    let raw = match goal {
        GoalType::WeightLoss | GoalType::WeightGain | GoalType::MuscleGain => {
            let distance = (start - target).abs();
            if distance < f64::EPSILON {
                return 0.0;
            }
            let moved = if goal.is_gain() {
                current - start
            } else {
                start - current
            };
            moved / distance * 100.0
        }
        GoalType::Maintenance => {
            let band = target * MAINTENANCE_TOLERANCE;
            if band <= 0.0 {
                return 0.0;
            }
            100.0 - (current - target).abs() / band * 100.0
        }
    };

    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Classify the weekly trend against the goal, with a ±0.1 kg/week dead-zone.
///
/// For maintenance any movement outside the dead-zone is drift away from
/// the target.
pub fn trend_direction(goal: GoalType, weekly_trend: f64) -> TrendDirection {
    let moving_up = weekly_trend > TREND_DEAD_ZONE;
    let moving_down = weekly_trend < -TREND_DEAD_ZONE;

    match goal {
        GoalType::WeightLoss if moving_down => TrendDirection::Improving,
        GoalType::WeightLoss if moving_up => TrendDirection::Declining,
        GoalType::WeightGain | GoalType::MuscleGain if moving_up => TrendDirection::Improving,
        GoalType::WeightGain | GoalType::MuscleGain if moving_down => TrendDirection::Declining,
        GoalType::Maintenance if moving_up || moving_down => TrendDirection::Declining,
        _ => TrendDirection::Stable,
    }
}

/// Weeks to close the gap at the current rate.
///
/// A flat trend returns 0, the same value as "already at target"; callers
/// must read 0 with a zero trend as unknown.
pub fn time_to_goal(current: f64, target: f64, weekly_trend: f64) -> f64 {
    if weekly_trend == 0.0 {
        return 0.0;
    }
    (target - current).abs() / weekly_trend.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap() + Duration::days(n)
    }

    fn profile(current: f64, target: f64, goal: GoalType) -> UserProfile {
        UserProfile::new("u1", current, target, goal)
    }

    fn samples(points: &[(f64, i64)]) -> Vec<WeightSample> {
        points
            .iter()
            .map(|&(w, d)| WeightSample::new(w, day(d)))
            .collect()
    }

    #[test]
    fn test_empty_samples_are_neutral() {
        for goal in [
            GoalType::WeightLoss,
            GoalType::WeightGain,
            GoalType::MuscleGain,
            GoalType::Maintenance,
        ] {
            let result = analyze(&[], &profile(82.0, 75.0, goal), day(0));
            assert_eq!(result.progress_percentage, 0.0);
            assert_eq!(result.current_weight, 82.0);
            assert_eq!(result.start_weight, 82.0);
            assert_eq!(result.trend_direction, TrendDirection::Stable);
            assert!(result.chart_data.labels.is_empty());
            assert!(result.chart_data.weights.is_empty());
            assert!(result.chart_data.trend_line.is_empty());
        }
    }

    #[test]
    fn test_two_week_loss_scenario() {
        let series = samples(&[(80.0, 0), (78.0, 14)]);
        // Both samples fall inside the weekly window measured from day 7
        let result = analyze(&series, &profile(78.0, 70.0, GoalType::WeightLoss), day(7));

        assert!((result.weekly_trend + 1.0).abs() < 1e-9);
        assert!((result.monthly_trend + 1.0).abs() < 1e-9);
        assert!((result.progress_percentage - 20.0).abs() < 1e-9);
        assert_eq!(result.weight_change, -2.0);
        assert_eq!(result.trend_direction, TrendDirection::Improving);
        assert!(result.is_on_track);
        assert!((result.time_to_goal - 8.0).abs() < 1e-9);
        assert_eq!(result.chart_data.labels, vec!["2024-01-01", "2024-01-15"]);
        assert_eq!(result.chart_data.trend_line.len(), 2);
    }

    #[test]
    fn test_weekly_window_excludes_old_samples() {
        let series = samples(&[(80.0, 0), (78.0, 14)]);
        let result = analyze(&series, &profile(78.0, 70.0, GoalType::WeightLoss), day(14));

        // Only the day-14 sample is inside the last 7 days
        assert_eq!(result.weekly_trend, 0.0);
        assert!((result.monthly_trend + 1.0).abs() < 1e-9);
        assert_eq!(result.trend_direction, TrendDirection::Stable);
        assert_eq!(result.time_to_goal, 0.0);
    }

    #[test]
    fn test_trend_is_clamped() {
        let base = day(0);
        let series = vec![
            WeightSample::new(70.0, base),
            WeightSample::new(120.0, base + Duration::hours(1)),
        ];
        let up = calculate_trend(&series, 7, base + Duration::hours(2));
        assert_eq!(up, MAX_TREND_KG_PER_WEEK);

        let series = vec![
            WeightSample::new(120.0, base),
            WeightSample::new(70.0, base + Duration::hours(1)),
        ];
        let result = analyze(&series, &profile(70.0, 60.0, GoalType::WeightLoss), base);
        assert_eq!(result.weekly_trend, -MAX_TREND_KG_PER_WEEK);
        assert_eq!(result.monthly_trend, -MAX_TREND_KG_PER_WEEK);
    }

    #[test]
    fn test_same_timestamp_samples_have_no_trend() {
        let series = vec![
            WeightSample::new(70.0, day(1)),
            WeightSample::new(71.0, day(1)),
        ];
        assert_eq!(calculate_trend(&series, 7, day(2)), 0.0);
    }

    #[test]
    fn test_progress_bounds() {
        // Target equals start: no division error
        assert_eq!(progress_percentage(GoalType::WeightLoss, 80.0, 78.0, 80.0), 0.0);
        assert_eq!(progress_percentage(GoalType::WeightGain, 60.0, 62.0, 60.0), 0.0);

        // Moving the wrong way floors at 0
        assert_eq!(progress_percentage(GoalType::WeightLoss, 80.0, 85.0, 70.0), 0.0);
        // Overshooting caps at 100
        assert_eq!(progress_percentage(GoalType::WeightLoss, 80.0, 65.0, 70.0), 100.0);
        assert_eq!(progress_percentage(GoalType::MuscleGain, 70.0, 80.0, 75.0), 100.0);

        // Maintenance outside the band
        assert_eq!(progress_percentage(GoalType::Maintenance, 70.0, 80.0, 70.0), 0.0);
        // Half the band away
        let half = progress_percentage(GoalType::Maintenance, 70.0, 71.75, 70.0);
        assert!((half - 50.0).abs() < 1e-9);
        // Degenerate target
        assert_eq!(progress_percentage(GoalType::Maintenance, 70.0, 70.0, 0.0), 0.0);
    }

    #[test]
    fn test_monotonic_series_reaches_full_progress() {
        let loss: Vec<(f64, i64)> = (0..=10).map(|i| (90.0 - i as f64, i * 7)).collect();
        let result = analyze(
            &samples(&loss),
            &profile(80.0, 80.0, GoalType::WeightLoss),
            day(70),
        );
        assert_eq!(result.progress_percentage, 100.0);
        assert!(result.is_on_track);

        let gain: Vec<(f64, i64)> = (0..=5).map(|i| (60.0 + i as f64, i * 7)).collect();
        let result = analyze(
            &samples(&gain),
            &profile(65.0, 65.0, GoalType::WeightGain),
            day(35),
        );
        assert_eq!(result.progress_percentage, 100.0);
    }

    #[test]
    fn test_maintenance_at_target_gets_full_credit() {
        let series = samples(&[(70.0, 0)]);
        let result = analyze(&series, &profile(70.0, 70.0, GoalType::Maintenance), day(1));
        assert_eq!(result.progress_percentage, 100.0);
        assert_eq!(result.trend_direction, TrendDirection::Stable);
        assert!(result.is_on_track);
    }

    #[test]
    fn test_trend_direction_dead_zone() {
        assert_eq!(trend_direction(GoalType::WeightLoss, -0.05), TrendDirection::Stable);
        assert_eq!(trend_direction(GoalType::WeightLoss, -0.5), TrendDirection::Improving);
        assert_eq!(trend_direction(GoalType::WeightLoss, 0.5), TrendDirection::Declining);
        assert_eq!(trend_direction(GoalType::WeightGain, 0.5), TrendDirection::Improving);
        assert_eq!(trend_direction(GoalType::MuscleGain, -0.5), TrendDirection::Declining);
        assert_eq!(trend_direction(GoalType::Maintenance, 0.3), TrendDirection::Declining);
        assert_eq!(trend_direction(GoalType::Maintenance, 0.1), TrendDirection::Stable);
    }

    #[test]
    fn test_local_labels_follow_offset() {
        // 23:30 UTC is already the next day at UTC+2
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        let series = vec![WeightSample::new(70.0, at)];
        let p = profile(70.0, 70.0, GoalType::Maintenance).utc_offset(120);
        let result = analyze(&series, &p, at);
        assert_eq!(result.chart_data.labels, vec!["2024-05-02"]);
    }
}

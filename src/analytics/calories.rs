//! Calorie/Macro Analyzer
//!
//! Buckets meals into local calendar days and scores each day against the
//! user's calorie goal.

use serde::Serialize;
use std::collections::BTreeMap;

use super::local_day_key;
use crate::storage::{MealRecord, NutritionGoals};

/// A day counts as adherent within ±10% of the calorie goal
pub const ADHERENCE_TOLERANCE: f64 = 0.10;

/// Energy density used for weight projections: 7700 kcal ≈ 1 kg body mass
pub const KCAL_PER_KG: f64 = 7700.0;

/// Number of most recent days shown in the chart
pub const CHART_WINDOW_DAYS: usize = 14;

/// Summed nutrition for one local calendar day
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    /// `YYYY-MM-DD`
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meal_count: usize,
}

/// Series for the calorie chart
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalorieChartData {
    pub labels: Vec<String>,
    pub calories: Vec<f64>,
    pub protein: Vec<f64>,
    pub carbs: Vec<f64>,
    pub fat: Vec<f64>,
    pub goal: f64,
}

/// Average intake of one macro against its goal
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroTrend {
    pub average: f64,
    pub goal: f64,
    pub percent_of_goal: f64,
}

impl MacroTrend {
    fn new(average: f64, goal: f64) -> Self {
        let percent_of_goal = if goal > 0.0 { average / goal * 100.0 } else { 0.0 };
        Self {
            average,
            goal,
            percent_of_goal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct MacroTrends {
    pub protein: MacroTrend,
    pub carbs: MacroTrend,
    pub fat: MacroTrend,
}

/// Calorie statistics for one analysis window
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalorieAnalytics {
    pub average_daily_calories: f64,
    pub calorie_goal: f64,
    /// Percentage of logged days within ±10% of the goal
    pub adherence_rate: f64,
    /// Goal minus average intake; positive means eating under goal
    pub calorie_deficit: f64,
    /// Expected weight change in kg/week from the deficit
    pub projected_weight_loss: f64,
    /// Date closest to goal, empty when nothing was logged
    pub best_day: String,
    /// Date furthest from goal, empty when nothing was logged
    pub worst_day: String,
    pub days_logged: usize,
    pub chart_data: CalorieChartData,
    pub macro_trends: MacroTrends,
}

impl CalorieAnalytics {
    fn empty(goals: &NutritionGoals) -> Self {
        Self {
            average_daily_calories: 0.0,
            calorie_goal: goals.calories,
            adherence_rate: 0.0,
            calorie_deficit: 0.0,
            projected_weight_loss: 0.0,
            best_day: String::new(),
            worst_day: String::new(),
            days_logged: 0,
            chart_data: CalorieChartData {
                goal: goals.calories,
                ..Default::default()
            },
            macro_trends: MacroTrends {
                protein: MacroTrend::new(0.0, goals.protein),
                carbs: MacroTrend::new(0.0, goals.carbs),
                fat: MacroTrend::new(0.0, goals.fat),
            },
        }
    }
}

/// Sum meals per local calendar day, oldest day first
pub fn daily_totals(meals: &[MealRecord], utc_offset_minutes: i32) -> Vec<DailyTotals> {
    let mut days: BTreeMap<String, DailyTotals> = BTreeMap::new();

    for meal in meals {
        let key = local_day_key(meal.consumed_at, utc_offset_minutes);
        let day = days.entry(key.clone()).or_insert_with(|| DailyTotals {
            date: key,
            ..Default::default()
        });
        day.calories += meal.total_calories;
        day.protein += meal.total_protein;
        day.carbs += meal.total_carbs;
        day.fat += meal.total_fat;
        day.meal_count += 1;
    }

    days.into_values().collect()
}

/// Analyze meals against the user's goals
pub fn analyze(
    meals: &[MealRecord],
    goals: &NutritionGoals,
    utc_offset_minutes: i32,
) -> CalorieAnalytics {
    let days = daily_totals(meals, utc_offset_minutes);
    if days.is_empty() {
        return CalorieAnalytics::empty(goals);
    }

    let goal = goals.calories;
    let n = days.len() as f64;
    let average = |f: fn(&DailyTotals) -> f64| days.iter().map(f).sum::<f64>() / n;

    let average_daily_calories = average(|d| d.calories);
    let adherent_days = days.iter().filter(|d| is_adherent(d.calories, goal)).count();

    let (best_day, worst_day) = best_and_worst(&days, goal);
    let calorie_deficit = goal - average_daily_calories;

    let chart_start = days.len().saturating_sub(CHART_WINDOW_DAYS);
    let window = &days[chart_start..];
    let chart_data = CalorieChartData {
        labels: window.iter().map(|d| d.date.clone()).collect(),
        calories: window.iter().map(|d| d.calories).collect(),
        protein: window.iter().map(|d| d.protein).collect(),
        carbs: window.iter().map(|d| d.carbs).collect(),
        fat: window.iter().map(|d| d.fat).collect(),
        goal,
    };

    CalorieAnalytics {
        average_daily_calories,
        calorie_goal: goal,
        adherence_rate: adherent_days as f64 / n * 100.0,
        calorie_deficit,
        projected_weight_loss: projected_weekly_change(goal, average_daily_calories),
        best_day,
        worst_day,
        days_logged: days.len(),
        chart_data,
        macro_trends: MacroTrends {
            protein: MacroTrend::new(average(|d| d.protein), goals.protein),
            carbs: MacroTrend::new(average(|d| d.carbs), goals.carbs),
            fat: MacroTrend::new(average(|d| d.fat), goals.fat),
        },
    }
}

/// Whether a day's total is within ±10% of the goal
pub fn is_adherent(calories: f64, goal: f64) -> bool {
    (calories - goal).abs() <= goal * ADHERENCE_TOLERANCE
}

/// Expected kg/week from eating `average` against `goal` for a week
pub fn projected_weekly_change(goal: f64, average: f64) -> f64 {
    (goal - average) * 7.0 / KCAL_PER_KG
}

/// Dates with the smallest and largest deviation from `goal`; the earliest
/// day wins ties.
fn best_and_worst(days: &[DailyTotals], goal: f64) -> (String, String) {
    let mut best: Option<(&DailyTotals, f64)> = None;
    let mut worst: Option<(&DailyTotals, f64)> = None;

    for day in days {
        let deviation = (day.calories - goal).abs();
        if best.map_or(true, |(_, d)| deviation < d) {
            best = Some((day, deviation));
        }
        if worst.map_or(true, |(_, d)| deviation > d) {
            worst = Some((day, deviation));
        }
    }

    (
        best.map(|(d, _)| d.date.clone()).unwrap_or_default(),
        worst.map(|(d, _)| d.date.clone()).unwrap_or_default(),
    )
}

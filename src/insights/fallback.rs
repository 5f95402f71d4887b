//! Rule-based responses used whenever the LLM is disabled or fails.

use crate::analytics::{AnalyticsReport, GoalStatus, TrendDirection};
use crate::storage::{GoalType, UserProfile};

use super::{AiInsights, FoodRecommendation, InsightSource};

/// Protein below this share of goal triggers protein-focused advice
const LOW_PROTEIN_RATIO: f64 = 0.8;

/// Adherence below this share counts as inconsistent logging
const LOW_ADHERENCE_RATE: f64 = 50.0;

/// Build insights from the analytics alone
pub fn insights(profile: &UserProfile, report: &AnalyticsReport) -> AiInsights {
    let mut highlights = Vec::new();
    let mut recommendations = Vec::new();

    analyze_weight(profile, report, &mut highlights, &mut recommendations);
    analyze_calories(report, &mut highlights, &mut recommendations);
    analyze_protein(report, &mut highlights, &mut recommendations);

    if recommendations.is_empty() {
        recommendations
            .push("Keep logging meals and weigh-ins to keep your trends accurate.".to_string());
    }

    AiInsights {
        summary: summary(profile.goal_type, report),
        highlights,
        recommendations,
        source: InsightSource::Fallback,
    }
}

fn summary(goal: GoalType, report: &AnalyticsReport) -> String {
    let progress = report.weight_analytics.progress_percentage;
    match report.goal_progress.status {
        GoalStatus::Excellent => format!(
            "You're ahead of pace on your {} goal at {:.0}% progress. Great work!",
            goal_phrase(goal),
            progress
        ),
        GoalStatus::Good => format!(
            "You're on pace for your {} goal with {:.0}% progress so far.",
            goal_phrase(goal),
            progress
        ),
        GoalStatus::Concerning => format!(
            "Progress on your {} goal has slowed ({:.0}% so far). \
             Small adjustments can get you back on track.",
            goal_phrase(goal),
            progress
        ),
        GoalStatus::OffTrack => format!(
            "Your {} goal is off track right now ({:.0}% progress). \
             Let's focus on consistency this week.",
            goal_phrase(goal),
            progress
        ),
    }
}

fn goal_phrase(goal: GoalType) -> &'static str {
    match goal {
        GoalType::WeightLoss => "weight loss",
        GoalType::WeightGain => "weight gain",
        GoalType::MuscleGain => "muscle gain",
        GoalType::Maintenance => "maintenance",
    }
}

fn analyze_weight(
    profile: &UserProfile,
    report: &AnalyticsReport,
    highlights: &mut Vec<String>,
    recommendations: &mut Vec<String>,
) {
    let weight = &report.weight_analytics;

    if weight.chart_data.weights.is_empty() {
        highlights.push("No weigh-ins recorded in this period yet.".to_string());
        recommendations
            .push("Log your weight a few times a week to unlock trend analysis.".to_string());
        return;
    }

    match weight.trend_direction {
        TrendDirection::Improving => highlights.push(format!(
            "Your weight is moving in the right direction ({:+.2} kg/week).",
            weight.weekly_trend
        )),
        TrendDirection::Stable => {
            highlights.push("Your weight has been stable this week.".to_string())
        }
        TrendDirection::Declining => {
            highlights.push(format!(
                "Your weight is moving away from your target ({:+.2} kg/week).",
                weight.weekly_trend
            ));
            let advice = match profile.goal_type {
                GoalType::WeightLoss => "Try trimming 200-300 kcal from your daily intake.",
                GoalType::WeightGain | GoalType::MuscleGain => {
                    "Add a calorie-dense snack to reach your daily target."
                }
                GoalType::Maintenance => "Aim to eat close to your calorie goal every day.",
            };
            recommendations.push(advice.to_string());
        }
    }

    if weight.time_to_goal > 0.0 {
        highlights.push(format!(
            "At this pace you'll reach {:.1} kg in about {:.0} weeks.",
            weight.target_weight, weight.time_to_goal
        ));
    }
}

fn analyze_calories(
    report: &AnalyticsReport,
    highlights: &mut Vec<String>,
    recommendations: &mut Vec<String>,
) {
    let calories = &report.calorie_analytics;

    if calories.days_logged == 0 {
        recommendations
            .push("Start logging meals to see how your intake compares to your goal.".to_string());
        return;
    }

    highlights.push(format!(
        "You averaged {:.0} kcal/day against a goal of {:.0}.",
        calories.average_daily_calories, calories.calorie_goal
    ));

    if calories.adherence_rate < LOW_ADHERENCE_RATE {
        recommendations.push(format!(
            "Only {:.0}% of logged days were within 10% of your goal. \
             Planning meals ahead can help.",
            calories.adherence_rate
        ));
    } else {
        highlights.push(format!(
            "{:.0}% of logged days were within your calorie target.",
            calories.adherence_rate
        ));
    }
}

fn analyze_protein(
    report: &AnalyticsReport,
    highlights: &mut Vec<String>,
    recommendations: &mut Vec<String>,
) {
    let protein = &report.calorie_analytics.macro_trends.protein;
    if report.calorie_analytics.days_logged == 0 || protein.goal <= 0.0 {
        return;
    }

    if protein.average < protein.goal * LOW_PROTEIN_RATIO {
        recommendations.push(format!(
            "Protein is averaging {:.0} g vs a {:.0} g goal. \
             Add a lean protein source to each meal.",
            protein.average, protein.goal
        ));
    } else {
        highlights.push("Protein intake is on target.".to_string());
    }
}

/// Canned foods for the user's goal, protein-dense first when protein is low
pub fn foods(profile: &UserProfile, report: &AnalyticsReport) -> Vec<FoodRecommendation> {
    let catalog: &[(&str, f64, f64, &str)] = match profile.goal_type {
        GoalType::WeightLoss => &[
            ("Greek yogurt with berries", 180.0, 17.0, "High protein and filling for few calories"),
            ("Grilled chicken salad", 350.0, 35.0, "Lean protein with plenty of volume"),
            ("Lentil soup", 260.0, 18.0, "Fiber keeps you full between meals"),
            ("Egg white omelette with spinach", 150.0, 20.0, "Low-calorie protein boost"),
        ],
        GoalType::WeightGain => &[
            ("Peanut butter oatmeal", 520.0, 18.0, "Calorie-dense and easy to eat"),
            ("Salmon rice bowl", 650.0, 38.0, "Healthy fats and carbs for a surplus"),
            ("Trail mix", 300.0, 9.0, "Easy snack to close a calorie gap"),
            ("Whole milk smoothie with banana", 450.0, 16.0, "Liquid calories are easy to add"),
        ],
        GoalType::MuscleGain => &[
            ("Chicken breast with quinoa", 520.0, 48.0, "Complete protein with carbs for training"),
            ("Cottage cheese with pineapple", 220.0, 25.0, "Slow-digesting protein"),
            ("Tuna wrap", 410.0, 32.0, "Portable high-protein meal"),
            ("Protein shake with oats", 380.0, 35.0, "Quick post-workout recovery"),
        ],
        GoalType::Maintenance => &[
            ("Turkey and avocado sandwich", 450.0, 30.0, "Balanced macros in one meal"),
            ("Stir-fried tofu and vegetables", 380.0, 22.0, "Plant protein and micronutrients"),
            ("Hummus with whole-grain pita", 300.0, 10.0, "Steady energy snack"),
            ("Baked cod with sweet potato", 420.0, 34.0, "Lean protein and complex carbs"),
        ],
    };

    let mut items: Vec<FoodRecommendation> = catalog
        .iter()
        .map(|(name, calories, protein, reason)| FoodRecommendation {
            name: name.to_string(),
            calories: *calories,
            protein: *protein,
            reason: reason.to_string(),
        })
        .collect();

    let calories = &report.calorie_analytics;
    let protein = &calories.macro_trends.protein;
    if calories.days_logged > 0
        && protein.goal > 0.0
        && protein.average < protein.goal * LOW_PROTEIN_RATIO
    {
        items.sort_by(|a, b| b.protein.total_cmp(&a.protein));
    }

    items
}

/// Reply used when the chat assistant cannot be reached
pub fn chat_reply(profile: &UserProfile) -> String {
    format!(
        "I can't reach the nutrition assistant right now. Meanwhile, stick to your \
         {} plan: aim for about {:.0} kcal and {:.0} g of protein today.",
        goal_phrase(profile.goal_type),
        profile.nutrition_goals().calories,
        profile.nutrition_goals().protein
    )
}

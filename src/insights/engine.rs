//! Insight Engine
//!
//! Turns an analytics report into narrative insights, food suggestions and
//! chat replies. Each call asks the provider once; any failure (transport,
//! status, unparseable output) degrades to the rule-based response.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::client::{InsightProvider, LlmError};
use super::fallback;
use crate::analytics::AnalyticsReport;
use crate::storage::UserProfile;

const INSIGHTS_SYSTEM_PROMPT: &str = "You are a supportive nutrition coach. \
Given a user's analytics summary, respond ONLY with JSON of the form \
{\"summary\": string, \"highlights\": [string], \"recommendations\": [string]}. \
Keep each item to one sentence.";

const FOODS_SYSTEM_PROMPT: &str = "You are a registered dietitian. \
Suggest 3 to 5 foods for the user's goal. Respond ONLY with a JSON array of \
{\"name\": string, \"calories\": number, \"protein\": number, \"reason\": string}.";

const CHAT_SYSTEM_PROMPT: &str = "You are a friendly nutrition assistant. \
Answer briefly and practically using the user's profile for context. \
Do not give medical diagnoses.";

/// Where a response came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Llm,
    Fallback,
}

/// Narrative insights for the analytics response
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiInsights {
    pub summary: String,
    pub highlights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: InsightSource,
}

/// One suggested food
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodRecommendation {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub reason: String,
}

/// Food suggestions with their origin
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodRecommendations {
    pub foods: Vec<FoodRecommendation>,
    pub source: InsightSource,
}

/// Chat answer with its origin
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub source: InsightSource,
}

#[derive(Debug, Deserialize)]
struct LlmInsights {
    summary: String,
    #[serde(default)]
    highlights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Generates insights through an optional LLM provider
#[derive(Clone)]
pub struct InsightEngine {
    provider: Option<Arc<dyn InsightProvider>>,
}

impl InsightEngine {
    pub fn new(provider: Arc<dyn InsightProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Engine that always answers with the rule-based responses
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Narrative insights for `report`
    pub async fn generate_insights(
        &self,
        profile: &UserProfile,
        report: &AnalyticsReport,
    ) -> AiInsights {
        let Some(provider) = &self.provider else {
            return fallback::insights(profile, report);
        };

        let prompt = analytics_prompt(profile, report);
        let result = provider
            .complete(INSIGHTS_SYSTEM_PROMPT, &prompt)
            .await
            .and_then(|text| parse_insights(&text));

        match result {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(
                    user_id = %profile.user_id,
                    error = %e,
                    "LLM insights failed, using fallback"
                );
                fallback::insights(profile, report)
            }
        }
    }

    /// Food suggestions for the user's goal and recent intake
    pub async fn recommend_foods(
        &self,
        profile: &UserProfile,
        report: &AnalyticsReport,
    ) -> FoodRecommendations {
        let Some(provider) = &self.provider else {
            return FoodRecommendations {
                foods: fallback::foods(profile, report),
                source: InsightSource::Fallback,
            };
        };

        let prompt = analytics_prompt(profile, report);
        let result = provider
            .complete(FOODS_SYSTEM_PROMPT, &prompt)
            .await
            .and_then(|text| parse_foods(&text));

        match result {
            Ok(foods) => FoodRecommendations {
                foods,
                source: InsightSource::Llm,
            },
            Err(e) => {
                tracing::warn!(
                    user_id = %profile.user_id,
                    error = %e,
                    "LLM food recommendations failed, using fallback"
                );
                FoodRecommendations {
                    foods: fallback::foods(profile, report),
                    source: InsightSource::Fallback,
                }
            }
        }
    }

    /// Answer a free-form question
    pub async fn chat(&self, profile: &UserProfile, message: &str) -> ChatReply {
        let Some(provider) = &self.provider else {
            return ChatReply {
                reply: fallback::chat_reply(profile),
                source: InsightSource::Fallback,
            };
        };

        let prompt = format!("{}\n\nUser question: {}", profile_context(profile), message.trim());

        match provider.complete(CHAT_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => ChatReply {
                reply: text.trim().to_string(),
                source: InsightSource::Llm,
            },
            Err(e) => {
                tracing::warn!(
                    user_id = %profile.user_id,
                    error = %e,
                    "LLM chat failed, using fallback"
                );
                ChatReply {
                    reply: fallback::chat_reply(profile),
                    source: InsightSource::Fallback,
                }
            }
        }
    }
}

fn profile_context(profile: &UserProfile) -> String {
    let goals = profile.nutrition_goals();
    format!(
        "Profile: goal {}, current weight {:.1} kg, target {:.1} kg, \
         daily goals {:.0} kcal / {:.0} g protein / {:.0} g carbs / {:.0} g fat.",
        profile.goal_type,
        profile.current_weight,
        profile.target_weight,
        goals.calories,
        goals.protein,
        goals.carbs,
        goals.fat
    )
}

/// Compact summary of the report; chart series are left out
fn analytics_prompt(profile: &UserProfile, report: &AnalyticsReport) -> String {
    let weight = &report.weight_analytics;
    let calories = &report.calorie_analytics;
    let goal = &report.goal_progress;

    let summary = json!({
        "goal": goal.primary_goal,
        "goalType": profile.goal_type,
        "weight": {
            "current": weight.current_weight,
            "start": weight.start_weight,
            "target": weight.target_weight,
            "weeklyTrend": weight.weekly_trend,
            "monthlyTrend": weight.monthly_trend,
            "progressPercentage": weight.progress_percentage,
            "trendDirection": weight.trend_direction,
            "weeksToGoal": weight.time_to_goal,
        },
        "calories": {
            "averageDaily": calories.average_daily_calories,
            "goal": calories.calorie_goal,
            "adherenceRate": calories.adherence_rate,
            "daysLogged": calories.days_logged,
            "proteinAverage": calories.macro_trends.protein.average,
            "proteinGoal": calories.macro_trends.protein.goal,
            "carbsAverage": calories.macro_trends.carbs.average,
            "fatAverage": calories.macro_trends.fat.average,
        },
        "progress": {
            "status": goal.status,
            "successProbability": goal.success_probability,
            "daysToGoal": goal.days_to_goal,
        },
    });

    format!("Analytics summary:\n{}", summary)
}

/// Strip markdown code fences and surrounding prose from a JSON answer
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s <= e => &trimmed[s..=e],
        _ => trimmed,
    }
}

fn parse_insights(text: &str) -> Result<AiInsights, LlmError> {
    let parsed: LlmInsights =
        serde_json::from_str(extract_json(text)).map_err(|e| LlmError::Parse(e.to_string()))?;

    if parsed.summary.trim().is_empty() {
        return Err(LlmError::Parse("empty summary".to_string()));
    }

    Ok(AiInsights {
        summary: parsed.summary,
        highlights: parsed.highlights,
        recommendations: parsed.recommendations,
        source: InsightSource::Llm,
    })
}

fn parse_foods(text: &str) -> Result<Vec<FoodRecommendation>, LlmError> {
    let foods: Vec<FoodRecommendation> =
        serde_json::from_str(extract_json(text)).map_err(|e| LlmError::Parse(e.to_string()))?;

    let foods: Vec<FoodRecommendation> = foods
        .into_iter()
        .filter(|f| !f.name.trim().is_empty())
        .collect();

    if foods.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(foods)
}

//! AI insights
//!
//! Optional LLM layer on top of the analytics report. The engine is held in
//! `AppState`; when no provider is configured every call returns the
//! rule-based response from [`fallback`].

pub mod client;
pub mod engine;
pub mod fallback;

pub use client::{InsightProvider, LlmClient, LlmConfig, LlmError};
pub use engine::{
    AiInsights, ChatReply, FoodRecommendation, FoodRecommendations, InsightEngine, InsightSource,
};

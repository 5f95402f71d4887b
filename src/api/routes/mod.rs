//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod chat;
pub mod health;
pub mod meals;
pub mod plan;
pub mod profile;
pub mod weights;

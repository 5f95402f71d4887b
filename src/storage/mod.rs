//! Platewise Storage
//!
//! SQLite persistence for profiles and logged history.
//!
//! ## Tables
//!
//! - `profiles`: one row per user (goals, body data, UTC offset)
//! - `weight_samples`: append-only weight log
//! - `meals`: append-only meal log with calorie/macro totals
//!
//! Analytics never writes back; profile writes go through the API, which
//! also invalidates the profile cache.

pub mod error;
pub mod store;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use store::{NutritionStore, StoreStats};
pub use types::*;

//! Nutrition Store - SQLite-backed persistence
//!
//! Holds user profiles, weight samples and meal records in a single SQLite
//! database. Timestamps are stored as unix milliseconds; enums as their
//! snake_case names.
//!
//! The connection sits behind a mutex. Every statement is short and runs to
//! completion while the lock is held.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    ActivityLevel, GoalType, MealRecord, MealType, Sex, UserProfile, WeightSample,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS profiles (
        user_id TEXT PRIMARY KEY,
        current_weight REAL NOT NULL,
        target_weight REAL NOT NULL,
        goal_type TEXT NOT NULL,
        daily_calorie_goal INTEGER,
        protein_goal REAL,
        carbs_goal REAL,
        fat_goal REAL,
        height_cm REAL,
        age INTEGER,
        sex TEXT,
        activity_level TEXT NOT NULL,
        utc_offset_minutes INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS weight_samples (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        weight REAL NOT NULL,
        recorded_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_weight_user_time
        ON weight_samples(user_id, recorded_at);

    CREATE TABLE IF NOT EXISTS meals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        name TEXT,
        meal_type TEXT NOT NULL,
        total_calories REAL NOT NULL,
        total_protein REAL NOT NULL,
        total_carbs REAL NOT NULL,
        total_fat REAL NOT NULL,
        consumed_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_meals_user_time
        ON meals(user_id, consumed_at);
";

/// Row counts, for health reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub profiles: u64,
    pub weight_samples: u64,
    pub meals: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} profiles, {} weight samples, {} meals",
            self.profiles, self.weight_samples, self.meals
        )
    }
}

/// SQLite-backed store for profiles and logged history
pub struct NutritionStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl NutritionStore {
    /// Create or open a database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// Open a private in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = ?path, "Nutrition store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    // ============================================
    // Profiles
    // ============================================

    /// Insert or replace a profile
    pub fn upsert_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO profiles (
                user_id, current_weight, target_weight, goal_type,
                daily_calorie_goal, protein_goal, carbs_goal, fat_goal,
                height_cm, age, sex, activity_level, utc_offset_minutes, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(user_id) DO UPDATE SET
                current_weight = excluded.current_weight,
                target_weight = excluded.target_weight,
                goal_type = excluded.goal_type,
                daily_calorie_goal = excluded.daily_calorie_goal,
                protein_goal = excluded.protein_goal,
                carbs_goal = excluded.carbs_goal,
                fat_goal = excluded.fat_goal,
                height_cm = excluded.height_cm,
                age = excluded.age,
                sex = excluded.sex,
                activity_level = excluded.activity_level,
                utc_offset_minutes = excluded.utc_offset_minutes,
                updated_at = excluded.updated_at",
            params![
                profile.user_id,
                profile.current_weight,
                profile.target_weight,
                profile.goal_type.as_str(),
                profile.daily_calorie_goal,
                profile.protein_goal,
                profile.carbs_goal,
                profile.fat_goal,
                profile.height_cm,
                profile.age,
                profile.sex.map(|s| s.as_str()),
                profile.activity_level.as_str(),
                profile.utc_offset_minutes,
                profile.updated_at,
            ],
        )?;

        Ok(())
    }

    /// Fetch a profile by user id
    pub fn get_profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT user_id, current_weight, target_weight, goal_type,
                        daily_calorie_goal, protein_goal, carbs_goal, fat_goal,
                        height_cm, age, sex, activity_level, utc_offset_minutes, updated_at
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                ProfileRow::from_row,
            )
            .optional()?;

        row.map(UserProfile::try_from).transpose()
    }

    // ============================================
    // Weight samples
    // ============================================

    /// Append a weight sample, returning its row id
    pub fn log_weight(&self, user_id: &str, sample: &WeightSample) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO weight_samples (user_id, weight, recorded_at) VALUES (?1, ?2, ?3)",
            params![user_id, sample.weight, sample.recorded_at.timestamp_millis()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a weight sample and make it the profile's current weight.
    ///
    /// Both writes share one transaction. Returns the sample's row id and
    /// whether a profile row was updated; a user without a profile still gets
    /// the sample.
    pub fn record_weight(
        &self,
        user_id: &str,
        sample: &WeightSample,
    ) -> StorageResult<(i64, bool)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO weight_samples (user_id, weight, recorded_at) VALUES (?1, ?2, ?3)",
            params![user_id, sample.weight, sample.recorded_at.timestamp_millis()],
        )?;
        let id = tx.last_insert_rowid();

        let updated = tx.execute(
            "UPDATE profiles SET current_weight = ?1, updated_at = ?2 WHERE user_id = ?3",
            params![sample.weight, Utc::now().timestamp_millis(), user_id],
        )?;

        tx.commit()?;
        Ok((id, updated > 0))
    }

    /// Weight samples recorded at or after `since`, oldest first
    pub fn weight_samples(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<WeightSample>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT weight, recorded_at FROM weight_samples
             WHERE user_id = ?1 AND recorded_at >= ?2
             ORDER BY recorded_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![user_id, since.timestamp_millis()], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut samples = Vec::new();
        for row in rows {
            let (weight, recorded_at) = row?;
            samples.push(WeightSample::new(weight, from_millis(recorded_at)?));
        }
        Ok(samples)
    }

    // ============================================
    // Meals
    // ============================================

    /// Append a meal, returning its row id
    pub fn log_meal(&self, user_id: &str, meal: &MealRecord) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO meals (
                user_id, name, meal_type, total_calories, total_protein,
                total_carbs, total_fat, consumed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                meal.name,
                meal.meal_type.as_str(),
                meal.total_calories,
                meal.total_protein,
                meal.total_carbs,
                meal.total_fat,
                meal.consumed_at.timestamp_millis(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Meals consumed at or after `since`, oldest first
    pub fn meals(&self, user_id: &str, since: DateTime<Utc>) -> StorageResult<Vec<MealRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT name, meal_type, total_calories, total_protein, total_carbs,
                    total_fat, consumed_at
             FROM meals
             WHERE user_id = ?1 AND consumed_at >= ?2
             ORDER BY consumed_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![user_id, since.timestamp_millis()], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut meals = Vec::new();
        for row in rows {
            let (name, meal_type, calories, protein, carbs, fat, consumed_at) = row?;
            meals.push(MealRecord {
                name,
                meal_type: meal_type.parse::<MealType>().map_err(StorageError::InvalidRecord)?,
                total_calories: calories,
                total_protein: protein,
                total_carbs: carbs,
                total_fat: fat,
                consumed_at: from_millis(consumed_at)?,
            });
        }
        Ok(meals)
    }

    // ============================================
    // Health
    // ============================================

    /// Cheap liveness query against the database
    pub fn ping(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Row counts per table
    pub fn stats(&self) -> StorageResult<StoreStats> {
        let conn = self.lock()?;
        let count = |table: &str| -> StorageResult<u64> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        };

        Ok(StoreStats {
            profiles: count("profiles")?,
            weight_samples: count("weight_samples")?,
            meals: count("meals")?,
        })
    }
}

fn from_millis(ms: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::InvalidRecord(format!("timestamp out of range: {}", ms)))
}

/// Raw profile columns, before enum parsing
struct ProfileRow {
    user_id: String,
    current_weight: f64,
    target_weight: f64,
    goal_type: String,
    daily_calorie_goal: Option<i64>,
    protein_goal: Option<f64>,
    carbs_goal: Option<f64>,
    fat_goal: Option<f64>,
    height_cm: Option<f64>,
    age: Option<u32>,
    sex: Option<String>,
    activity_level: String,
    utc_offset_minutes: i32,
    updated_at: i64,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            current_weight: row.get(1)?,
            target_weight: row.get(2)?,
            goal_type: row.get(3)?,
            daily_calorie_goal: row.get(4)?,
            protein_goal: row.get(5)?,
            carbs_goal: row.get(6)?,
            fat_goal: row.get(7)?,
            height_cm: row.get(8)?,
            age: row.get(9)?,
            sex: row.get(10)?,
            activity_level: row.get(11)?,
            utc_offset_minutes: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StorageError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            user_id: row.user_id,
            current_weight: row.current_weight,
            target_weight: row.target_weight,
            goal_type: row
                .goal_type
                .parse::<GoalType>()
                .map_err(StorageError::InvalidRecord)?,
            daily_calorie_goal: row.daily_calorie_goal,
            protein_goal: row.protein_goal,
            carbs_goal: row.carbs_goal,
            fat_goal: row.fat_goal,
            height_cm: row.height_cm,
            age: row.age,
            sex: row
                .sex
                .map(|s| s.parse::<Sex>())
                .transpose()
                .map_err(StorageError::InvalidRecord)?,
            activity_level: row
                .activity_level
                .parse::<ActivityLevel>()
                .map_err(StorageError::InvalidRecord)?,
            utc_offset_minutes: row.utc_offset_minutes,
            updated_at: row.updated_at,
        })
    }
}

//! Platewise CLI
//!
//! Command-line client for a running Platewise API server:
//! - Manage the profile
//! - Log weigh-ins and meals
//! - View analytics and nutrition plans
//! - Chat with the nutrition assistant

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "platewise")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Nutrition tracking and analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// User id sent in the X-User-Id header
    #[arg(short, long, default_value = "local-user", global = true)]
    pub user: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the profile, or create/replace it when weights and goal are given
    Profile {
        /// Current weight
        #[arg(long, requires_all = ["target", "goal"])]
        weight: Option<f64>,
        /// Target weight
        #[arg(long)]
        target: Option<f64>,
        /// Goal: weight_loss, weight_gain, muscle_gain, maintenance
        #[arg(long)]
        goal: Option<String>,
        /// Weight unit (kg, lb)
        #[arg(long, default_value = "kg")]
        unit: String,
        /// Height in cm
        #[arg(long)]
        height_cm: Option<f64>,
        #[arg(long)]
        age: Option<u32>,
        /// male or female
        #[arg(long)]
        sex: Option<String>,
        /// sedentary, lightly_active, moderately_active, very_active, extra_active
        #[arg(long)]
        activity: Option<String>,
    },

    /// Log a weigh-in
    LogWeight {
        value: f64,
        /// Unit (kg, lb)
        #[arg(long, default_value = "kg")]
        unit: String,
        /// Timestamp (default: now). Supports: "now", "yesterday", ISO 8601
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Log a meal
    LogMeal {
        /// Total calories
        calories: f64,
        #[arg(long, default_value = "0")]
        protein: f64,
        #[arg(long, default_value = "0")]
        carbs: f64,
        #[arg(long, default_value = "0")]
        fat: f64,
        #[arg(short, long)]
        name: Option<String>,
        /// breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal_type: String,
        /// Timestamp (default: now). Supports: "now", "yesterday", ISO 8601
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Show analytics
    Analytics {
        /// 1W, 1M, 3M, 6M, 1Y
        #[arg(short, long, default_value = "1M")]
        timeframe: String,
        /// Include AI insights
        #[arg(long)]
        ai: bool,
        /// Include food recommendations
        #[arg(long)]
        foods: bool,
    },

    /// Calculate a calorie and macro plan from the profile
    Plan {
        /// Save the plan's goals to the profile
        #[arg(long)]
        apply: bool,
    },

    /// Ask the nutrition assistant
    Chat {
        message: Vec<String>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
}

impl ApiClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let request = self.http.get(self.url(path)).header("X-User-Id", &self.user);
        Self::send(request).await
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Value,
    ) -> anyhow::Result<Value> {
        let request = self
            .http
            .request(method, self.url(path))
            .header("X-User-Id", &self.user)
            .json(&body);
        Self::send(request).await
    }

    async fn send(request: reqwest::RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("cannot reach the Platewise API")?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("unknown error");
            bail!("request failed ({}): {}", status, message);
        }
        Ok(body["data"].clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient {
        http: reqwest::Client::new(),
        base_url: cli.api_url.clone(),
        user: cli.user.clone(),
    };
    let as_json = cli.format == "json";

    match cli.command {
        Commands::Profile {
            weight,
            target,
            goal,
            unit,
            height_cm,
            age,
            sex,
            activity,
        } => {
            let profile = match (weight, target, goal) {
                (Some(weight), Some(target), Some(goal)) => {
                    let mut body = json!({
                        "currentWeight": {"value": weight, "unit": unit},
                        "targetWeight": {"value": target, "unit": unit},
                        "goalType": goal,
                        "age": age,
                        "sex": sex,
                    });
                    if let Some(cm) = height_cm {
                        body["height"] = json!({"value": cm, "unit": "cm"});
                    }
                    if let Some(level) = activity {
                        body["activityLevel"] = json!(level);
                    }
                    api.send_json(reqwest::Method::PUT, "/api/v1/profile", body).await?
                }
                _ => api.get("/api/v1/profile").await?,
            };

            if as_json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }

        Commands::LogWeight { value, unit, time } => {
            let recorded_at = parse_time(time.as_deref())?;
            let entry = api
                .send_json(
                    reqwest::Method::POST,
                    "/api/v1/weights",
                    json!({"weight": {"value": value, "unit": unit}, "recordedAt": recorded_at}),
                )
                .await?;
            println!(
                "Logged weight: {:.1} kg at {}",
                entry["weight"].as_f64().unwrap_or(0.0),
                recorded_at.format("%Y-%m-%d %H:%M")
            );
        }

        Commands::LogMeal {
            calories,
            protein,
            carbs,
            fat,
            name,
            meal_type,
            time,
        } => {
            let consumed_at = parse_time(time.as_deref())?;
            api.send_json(
                reqwest::Method::POST,
                "/api/v1/meals",
                json!({
                    "name": name,
                    "mealType": meal_type,
                    "totalCalories": calories,
                    "totalProtein": protein,
                    "totalCarbs": carbs,
                    "totalFat": fat,
                    "consumedAt": consumed_at,
                }),
            )
            .await?;
            println!(
                "Logged {}: {:.0} kcal (P {:.0} g / C {:.0} g / F {:.0} g)",
                meal_type, calories, protein, carbs, fat
            );
        }

        Commands::Analytics { timeframe, ai, foods } => {
            let data = api
                .send_json(
                    reqwest::Method::POST,
                    "/api/v1/analytics",
                    json!({
                        "timeframe": timeframe,
                        "includeAI": ai,
                        "includeFoodRecommendations": foods,
                    }),
                )
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_analytics(&data);
            }
        }

        Commands::Plan { apply } => {
            let data = api
                .send_json(reqwest::Method::POST, "/api/v1/plan", json!({"apply": apply}))
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let plan = &data["plan"];
                println!("BMR:       {:.0} kcal", plan["bmr"].as_f64().unwrap_or(0.0));
                println!("TDEE:      {:.0} kcal", plan["tdee"].as_f64().unwrap_or(0.0));
                println!("Calories:  {} kcal", plan["dailyCalories"].as_i64().unwrap_or(0));
                println!("Protein:   {:.0} g", plan["proteinG"].as_f64().unwrap_or(0.0));
                println!("Carbs:     {:.0} g", plan["carbsG"].as_f64().unwrap_or(0.0));
                println!("Fat:       {:.0} g", plan["fatG"].as_f64().unwrap_or(0.0));
                if apply {
                    println!();
                    println!("Goals saved to your profile.");
                }
            }
        }

        Commands::Chat { message } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                bail!("message cannot be empty");
            }
            let data = api
                .send_json(reqwest::Method::POST, "/api/v1/chat", json!({"message": message}))
                .await?;
            println!("{}", data["reply"].as_str().unwrap_or(""));
        }

        Commands::Status => {
            let response = api.http.get(api.url("/health")).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;
                    println!("Platewise v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Storage:    {}", health["storage"].as_str().unwrap_or("unknown"));
                    println!("LLM:        {}", health["llm"].as_str().unwrap_or("unknown"));
                    if let Some(cached) = health["cached_profiles"].as_u64() {
                        println!("Cached:     {} profiles", cached);
                    }
                    if let Some(windows) = health["chat_windows"].as_u64() {
                        println!("Chat users: {} in current window", windows);
                    }
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:     {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Platewise API at {}", cli.api_url);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin platewise");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = platewise::config::generate_default_config();

            match output {
                Some(path) => {
                    std::fs::write(&path, &config)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

fn parse_time(input: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match input {
        None | Some("now") => Ok(Utc::now()),
        Some("yesterday") => Ok(Utc::now() - Duration::days(1)),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid timestamp: {}", s)),
    }
}

fn print_profile(p: &Value) {
    println!("User:      {}", p["userId"].as_str().unwrap_or("-"));
    println!("Goal:      {}", p["goalType"].as_str().unwrap_or("-"));
    println!("Weight:    {:.1} kg", p["currentWeight"].as_f64().unwrap_or(0.0));
    println!("Target:    {:.1} kg", p["targetWeight"].as_f64().unwrap_or(0.0));
    if let Some(calories) = p["dailyCalorieGoal"].as_i64() {
        println!("Calories:  {} kcal/day", calories);
    }
}

fn print_analytics(data: &Value) {
    let weight = &data["weightAnalytics"];
    let calories = &data["calorieAnalytics"];
    let goal = &data["goalProgress"];

    println!("Weight");
    println!("{}", "-".repeat(40));
    println!(
        "  {:.1} kg -> {:.1} kg (target {:.1} kg)",
        weight["startWeight"].as_f64().unwrap_or(0.0),
        weight["currentWeight"].as_f64().unwrap_or(0.0),
        weight["targetWeight"].as_f64().unwrap_or(0.0)
    );
    println!(
        "  Trend: {:+.2} kg/week ({})",
        weight["weeklyTrend"].as_f64().unwrap_or(0.0),
        weight["trendDirection"].as_str().unwrap_or("-")
    );
    println!("  Progress: {:.0}%", weight["progressPercentage"].as_f64().unwrap_or(0.0));

    println!();
    println!("Calories");
    println!("{}", "-".repeat(40));
    println!(
        "  Average: {:.0} / {:.0} kcal",
        calories["averageDailyCalories"].as_f64().unwrap_or(0.0),
        calories["calorieGoal"].as_f64().unwrap_or(0.0)
    );
    println!("  Adherence: {:.0}%", calories["adherenceRate"].as_f64().unwrap_or(0.0));
    if let Some(best) = calories["bestDay"].as_str().filter(|d| !d.is_empty()) {
        println!("  Best day: {}", best);
    }

    println!();
    println!("Goal: {}", goal["primaryGoal"].as_str().unwrap_or("-"));
    println!("{}", "-".repeat(40));
    println!("  Status: {}", goal["status"].as_str().unwrap_or("-"));
    println!(
        "  Success probability: {:.0}%",
        goal["successProbability"].as_f64().unwrap_or(0.0)
    );

    let insights = &data["aiInsights"];
    if insights.is_object() {
        println!();
        println!("Insights");
        println!("{}", "-".repeat(40));
        println!("  {}", insights["summary"].as_str().unwrap_or(""));
        for line in insights["recommendations"].as_array().into_iter().flatten() {
            println!("  - {}", line.as_str().unwrap_or(""));
        }
    }

    if let Some(foods) = data["recommendations"]["foods"].as_array() {
        println!();
        println!("{:<36} {:>6} {:>8}", "Food", "kcal", "protein");
        println!("{}", "-".repeat(52));
        for food in foods {
            println!(
                "{:<36} {:>6.0} {:>7.0}g",
                food["name"].as_str().unwrap_or("-"),
                food["calories"].as_f64().unwrap_or(0.0),
                food["protein"].as_f64().unwrap_or(0.0)
            );
        }
    }
}

fn format_duration(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

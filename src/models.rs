use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyGoals {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub water: u32,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            carbs: 250.0,
            protein: 150.0,
            water: 8,
        }
    }
}

/// One calendar day of logged food and water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedger {
    pub date: String,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
    #[serde(default)]
    pub water_glasses: u32,
}

impl DailyLedger {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            foods: Vec::new(),
            water_glasses: 0,
        }
    }
}

/// Everything written to the data file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub goals: Option<DailyGoals>,
    #[serde(default)]
    pub days: BTreeMap<String, DailyLedger>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Calories,
    Carbs,
    Protein,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric: Metric,
    pub over_by: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Normal,
    Warning,
    Over,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub metric: Metric,
    pub current: f64,
    pub goal: f64,
    pub fraction: f64,
    pub level: ProgressLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    FoodAdded { id: String, name: String, calories: f64 },
    FoodRemoved { id: String },
    WaterChanged { water_glasses: u32 },
    GoalUpdated { goals: DailyGoals },
    ThresholdExceeded { metric: Metric, over_by: f64 },
}

/// Food as typed into the form; numeric fields may arrive as numbers or strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub calories: Option<Value>,
    #[serde(default)]
    pub carbs: Option<Value>,
    #[serde(default)]
    pub protein: Option<Value>,
}

/// A full replacement of the goals. All four keys are required; their values
/// are coerced like food input.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalsInput {
    pub calories: Value,
    pub carbs: Value,
    pub protein: Value,
    pub water: Value,
}

#[derive(Debug, Deserialize)]
pub struct SelectDateRequest {
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalsResponse {
    pub goals: DailyGoals,
    pub first_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerView {
    pub date: String,
    pub is_today: bool,
    pub foods: Vec<FoodEntry>,
    pub water_glasses: u32,
    pub totals: Totals,
    pub goals: DailyGoals,
    pub progress: Vec<Progress>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ledger: LedgerView,
    pub notifications: Vec<Notification>,
}

/// Lenient numeric coercion: numbers and numeric strings pass, anything else
/// (blank strings, NaN, infinities, other JSON types) counts as absent.
/// Negative values clamp to zero.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.max(0.0))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

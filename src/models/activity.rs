use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseEntry {
  pub id: i64,
  pub name: String,
  pub performed_at: DateTime<Utc>,
  pub duration_minutes: i64,
  pub calories_burned: i64,
}

/// For inserting new exercise entries (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExerciseEntry {
  pub name: String,
  pub performed_at: DateTime<Utc>,
  pub duration_minutes: i64,
  pub calories_burned: i64,
}

/// Body weight measurement, at most one per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
  pub id: i64,
  pub recorded_on: NaiveDate,
  pub weight_kg: f64,
  pub note: Option<String>,
}

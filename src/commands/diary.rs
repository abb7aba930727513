//! Food diary: meal logging, exercise logging, daily totals and weight progress

use chrono::NaiveDate;

use crate::db::AppState;
use crate::error::AppError;
use crate::models::{ExerciseEntry, Meal, NewExerciseEntry, NewMeal};
use crate::store::activity::{insert_exercise, load_exercises_for_day, load_weights_between};
use crate::store::meals::{insert_meal, load_meals_for_day};
use crate::store::settings::load_goals;
use crate::summary::{DailySummary, WeightProgress};

pub async fn log_meal(state: &AppState, meal: &NewMeal) -> Result<Meal, AppError> {
  Ok(insert_meal(&state.db, meal).await?)
}

pub async fn log_exercise(
  state: &AppState,
  entry: &NewExerciseEntry,
) -> Result<ExerciseEntry, AppError> {
  Ok(insert_exercise(&state.db, entry).await?)
}

/// Calories and macros for one day against the stored goals
pub async fn daily_summary(state: &AppState, date: NaiveDate) -> Result<DailySummary, AppError> {
  let offset = state.config.adherence.local_offset();

  let goals = load_goals(&state.db).await?;
  let meals = load_meals_for_day(&state.db, date, offset).await?;
  let exercises = load_exercises_for_day(&state.db, date, offset).await?;

  Ok(DailySummary::compute(date, goals, &meals, &exercises))
}

pub async fn weight_progress(
  state: &AppState,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Option<WeightProgress>, AppError> {
  let entries = load_weights_between(&state.db, start, end).await?;
  Ok(WeightProgress::compute(&entries))
}

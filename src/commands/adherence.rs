//! Adherence commands: load a day's records, evaluate, optionally backfill reminders

use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::adherence::{adherence_streak, AdherenceEvaluator, AdherenceReport};
use crate::db::AppState;
use crate::error::AppError;
use crate::models::MealReminder;
use crate::store::diet_plans::load_active_plans;
use crate::store::meals::{day_bounds, load_meals_between};
use crate::store::reminders::{backfill_from_report, load_reminders_between, mark_completed};

fn evaluator(state: &AppState) -> AdherenceEvaluator {
  AdherenceEvaluator::new(state.config.adherence)
}

/// Adherence report for one day
pub async fn evaluate_day(state: &AppState, date: NaiveDate) -> Result<AdherenceReport, AppError> {
  let reports = evaluate_range(state, date, date).await?;
  Ok(reports.into_iter().next().unwrap_or_else(|| {
    evaluator(state).evaluate(date, &[], &[], &[])
  }))
}

/// Evaluate one day and write time-matched completions back to reminders
pub async fn evaluate_and_backfill(
  state: &AppState,
  date: NaiveDate,
) -> Result<AdherenceReport, AppError> {
  let report = evaluate_day(state, date).await?;
  backfill_from_report(&state.db, &report).await?;
  Ok(report)
}

/// Reports for every day in [start, end]
pub async fn evaluate_range(
  state: &AppState,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Vec<AdherenceReport>, AppError> {
  let offset = state.config.adherence.local_offset();
  let (range_start, _) = day_bounds(start, offset);
  let (_, range_end) = day_bounds(end, offset);

  let plans = load_active_plans(&state.db).await?;
  let reminders = load_reminders_between(&state.db, start, end).await?;
  let meals = load_meals_between(&state.db, range_start, range_end).await?;

  Ok(evaluator(state).evaluate_range(start, end, &plans, &reminders, &meals))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WeeklyAdherence {
  pub reports: Vec<AdherenceReport>,
  pub average_completion_rate: f64,
  pub perfect_days: usize,
  pub current_streak: usize,
}

/// Seven days ending on `end`
pub async fn weekly_adherence(state: &AppState, end: NaiveDate) -> Result<WeeklyAdherence, AppError> {
  let start = end - Duration::days(6);
  let reports = evaluate_range(state, start, end).await?;

  let average_completion_rate = if reports.is_empty() {
    1.0
  } else {
    reports.iter().map(|r| r.completion_rate()).sum::<f64>() / reports.len() as f64
  };
  let perfect_days = reports.iter().filter(|r| r.has_perfect_adherence()).count();
  let current_streak = adherence_streak(&reports);

  info!(end = %end, perfect_days, current_streak, "Weekly adherence computed");

  Ok(WeeklyAdherence {
    reports,
    average_completion_rate,
    perfect_days,
    current_streak,
  })
}

/// The user answered a meal reminder with a logged meal
pub async fn complete_reminder(
  state: &AppState,
  scheduled_meal_id: i64,
  date: NaiveDate,
  meal_id: i64,
) -> Result<MealReminder, AppError> {
  Ok(
    mark_completed(
      &state.db,
      scheduled_meal_id,
      date,
      meal_id,
      state.config.adherence.goal_tolerance,
    )
    .await?,
  )
}

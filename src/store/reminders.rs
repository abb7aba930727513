//! Meal reminder repository
//!
//! Reminders are created by the notification collaborator, completed when the
//! user answers one, and backfilled from time-matched adherence results.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::adherence::{evaluate_meal_goal_achievement, AdherenceReport};
use crate::error::StoreError;
use crate::models::MealReminder;

fn reminder_from_row(row: &SqliteRow) -> Result<MealReminder, StoreError> {
    Ok(MealReminder {
        id: row.try_get("id")?,
        scheduled_meal_id: row.try_get("scheduled_meal_id")?,
        reminder_date: row.try_get("reminder_date")?,
        was_completed: row.try_get("was_completed")?,
        completed_meal_id: row.try_get("completed_meal_id")?,
        goal_achieved: row.try_get("goal_achieved")?,
        goal_deviation: row.try_get("goal_deviation")?,
    })
}

pub async fn load_reminder(
    pool: &SqlitePool,
    scheduled_meal_id: i64,
    date: NaiveDate,
) -> Result<Option<MealReminder>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, scheduled_meal_id, reminder_date, was_completed,
               completed_meal_id, goal_achieved, goal_deviation
        FROM meal_reminders
        WHERE scheduled_meal_id = ? AND reminder_date = ?
        "#,
    )
    .bind(scheduled_meal_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(reminder_from_row).transpose()
}

/// Get or create the reminder for one scheduled meal occurrence
pub async fn upsert_reminder(
    pool: &SqlitePool,
    scheduled_meal_id: i64,
    date: NaiveDate,
) -> Result<MealReminder, StoreError> {
    sqlx::query(
        r#"
        INSERT INTO meal_reminders (scheduled_meal_id, reminder_date)
        VALUES (?, ?)
        ON CONFLICT(scheduled_meal_id, reminder_date) DO NOTHING
        "#,
    )
    .bind(scheduled_meal_id)
    .bind(date)
    .execute(pool)
    .await?;

    load_reminder(pool, scheduled_meal_id, date)
        .await?
        .ok_or_else(|| StoreError::not_found("Reminder for scheduled meal", scheduled_meal_id))
}

/// Reminders dated within [start, end] inclusive
pub async fn load_reminders_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<MealReminder>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, scheduled_meal_id, reminder_date, was_completed,
               completed_meal_id, goal_achieved, goal_deviation
        FROM meal_reminders
        WHERE reminder_date >= ? AND reminder_date <= ?
        ORDER BY reminder_date, scheduled_meal_id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter().map(reminder_from_row).collect()
}

pub async fn load_reminders_for_day(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<MealReminder>, StoreError> {
    load_reminders_between(pool, date, date).await
}

/// The user confirmed a scheduled meal through its reminder with a logged meal.
///
/// Goal achievement is computed against the scheduled meal's template target.
pub async fn mark_completed(
    pool: &SqlitePool,
    scheduled_meal_id: i64,
    date: NaiveDate,
    meal_id: i64,
    tolerance: f64,
) -> Result<MealReminder, StoreError> {
    let expected: Option<Option<i64>> = sqlx::query_scalar(
        r#"
        SELECT mt.expected_calories
        FROM scheduled_meals sm
        LEFT JOIN meal_templates mt ON mt.id = sm.template_id
        WHERE sm.id = ?
        "#,
    )
    .bind(scheduled_meal_id)
    .fetch_optional(pool)
    .await?;
    let expected = expected.ok_or_else(|| StoreError::not_found("Scheduled meal", scheduled_meal_id))?;

    let actual: i64 = sqlx::query_scalar("SELECT total_calories FROM meals WHERE id = ?")
        .bind(meal_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Meal", meal_id))?;

    let achievement = evaluate_meal_goal_achievement(expected, actual, tolerance);

    sqlx::query(
        r#"
        INSERT INTO meal_reminders
            (scheduled_meal_id, reminder_date, was_completed, completed_meal_id,
             goal_achieved, goal_deviation)
        VALUES (?, ?, 1, ?, ?, ?)
        ON CONFLICT(scheduled_meal_id, reminder_date) DO UPDATE SET
            was_completed = 1,
            completed_meal_id = excluded.completed_meal_id,
            goal_achieved = excluded.goal_achieved,
            goal_deviation = excluded.goal_deviation
        "#,
    )
    .bind(scheduled_meal_id)
    .bind(date)
    .bind(meal_id)
    .bind(achievement.achieved)
    .bind(achievement.deviation)
    .execute(pool)
    .await?;

    info!(
        scheduled_meal_id,
        meal_id,
        achieved = achievement.achieved,
        "Reminder completed"
    );

    load_reminder(pool, scheduled_meal_id, date)
        .await?
        .ok_or_else(|| StoreError::not_found("Reminder for scheduled meal", scheduled_meal_id))
}

/// Record time-matched completions from a report on their reminders.
///
/// Reminders that are already completed are left alone. Returns rows written.
pub async fn backfill_from_report(
    pool: &SqlitePool,
    report: &AdherenceReport,
) -> Result<u64, StoreError> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for matched in report.time_matches() {
        let achievement = matched.achievement;
        let result = sqlx::query(
            r#"
            INSERT INTO meal_reminders
                (scheduled_meal_id, reminder_date, was_completed, completed_meal_id,
                 goal_achieved, goal_deviation)
            VALUES (?, ?, 1, ?, ?, ?)
            ON CONFLICT(scheduled_meal_id, reminder_date) DO UPDATE SET
                was_completed = 1,
                completed_meal_id = excluded.completed_meal_id,
                goal_achieved = excluded.goal_achieved,
                goal_deviation = excluded.goal_deviation
            WHERE meal_reminders.was_completed = 0
               OR meal_reminders.completed_meal_id IS NULL
            "#,
        )
        .bind(matched.scheduled_meal_id)
        .bind(report.date)
        .bind(matched.logged_meal_id)
        .bind(achievement.map(|a| a.achieved))
        .bind(achievement.map(|a| a.deviation))
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;

    if written > 0 {
        info!(date = %report.date, written, "Backfilled reminders from adherence report");
    }
    Ok(written)
}

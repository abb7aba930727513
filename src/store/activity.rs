//! Exercise and body-weight repositories

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::meals::day_bounds;
use crate::error::StoreError;
use crate::models::{ExerciseEntry, NewExerciseEntry, WeightEntry};

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

fn exercise_from_row(row: &SqliteRow) -> Result<ExerciseEntry, StoreError> {
    Ok(ExerciseEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        performed_at: row.try_get("performed_at")?,
        duration_minutes: row.try_get("duration_minutes")?,
        calories_burned: row.try_get("calories_burned")?,
    })
}

pub async fn insert_exercise(
    pool: &SqlitePool,
    entry: &NewExerciseEntry,
) -> Result<ExerciseEntry, StoreError> {
    if entry.duration_minutes < 0 || entry.calories_burned < 0 {
        return Err(StoreError::Invalid(
            "exercise duration and calories must not be negative".to_string(),
        ));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO exercises (name, performed_at, duration_minutes, calories_burned)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&entry.name)
    .bind(entry.performed_at)
    .bind(entry.duration_minutes)
    .bind(entry.calories_burned)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(exercise_id = id, calories = entry.calories_burned, "Exercise logged");

    Ok(ExerciseEntry {
        id,
        name: entry.name.clone(),
        performed_at: entry.performed_at,
        duration_minutes: entry.duration_minutes,
        calories_burned: entry.calories_burned,
    })
}

/// Exercises performed in [start, end)
pub async fn load_exercises_between(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ExerciseEntry>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, performed_at, duration_minutes, calories_burned
        FROM exercises
        WHERE performed_at >= ? AND performed_at < ?
        ORDER BY performed_at, id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter().map(exercise_from_row).collect()
}

pub async fn load_exercises_for_day(
    pool: &SqlitePool,
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<ExerciseEntry>, StoreError> {
    let (start, end) = day_bounds(date, offset);
    load_exercises_between(pool, start, end).await
}

pub async fn delete_exercise(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let deleted = sqlx::query("DELETE FROM exercises WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(StoreError::not_found("Exercise", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Weight
// ---------------------------------------------------------------------------

fn weight_from_row(row: &SqliteRow) -> Result<WeightEntry, StoreError> {
    Ok(WeightEntry {
        id: row.try_get("id")?,
        recorded_on: row.try_get("recorded_on")?,
        weight_kg: row.try_get("weight_kg")?,
        note: row.try_get("note")?,
    })
}

/// Record the weight for a day, replacing any earlier entry for that day
pub async fn record_weight(
    pool: &SqlitePool,
    recorded_on: NaiveDate,
    weight_kg: f64,
    note: Option<&str>,
) -> Result<WeightEntry, StoreError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(StoreError::Invalid(format!(
            "weight must be a positive number, got {}",
            weight_kg
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO weight_entries (recorded_on, weight_kg, note)
        VALUES (?, ?, ?)
        ON CONFLICT(recorded_on) DO UPDATE SET
            weight_kg = excluded.weight_kg,
            note = excluded.note
        "#,
    )
    .bind(recorded_on)
    .bind(weight_kg)
    .bind(note)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT id, recorded_on, weight_kg, note FROM weight_entries WHERE recorded_on = ?",
    )
    .bind(recorded_on)
    .fetch_one(pool)
    .await?;

    info!(date = %recorded_on, weight_kg, "Weight recorded");
    weight_from_row(&row)
}

/// Weights recorded in [start, end] inclusive, oldest first
pub async fn load_weights_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<WeightEntry>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, recorded_on, weight_kg, note
        FROM weight_entries
        WHERE recorded_on >= ? AND recorded_on <= ?
        ORDER BY recorded_on
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter().map(weight_from_row).collect()
}

pub async fn latest_weight(pool: &SqlitePool) -> Result<Option<WeightEntry>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, recorded_on, weight_kg, note
        FROM weight_entries
        ORDER BY recorded_on DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(weight_from_row).transpose()
}

//! Logged meal repository

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::parse_category;
use crate::error::StoreError;
use crate::models::{Meal, MealItem, NewMeal};

/// UTC bounds [start, end) of a calendar day on a wall clock with `offset`
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let start =
        (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc();
    (start, start + Duration::days(1))
}

async fn insert_items(
    conn: &mut SqliteConnection,
    meal_id: i64,
    items: &[MealItem],
) -> Result<(), StoreError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO meal_items (meal_id, name, quantity, calories, protein_g, carbs_g, fat_g)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(meal_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.calories)
        .bind(item.protein_g)
        .bind(item.carbs_g)
        .bind(item.fat_g)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_items(pool: &SqlitePool, meal_id: i64) -> Result<Vec<MealItem>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT name, quantity, calories, protein_g, carbs_g, fat_g
        FROM meal_items
        WHERE meal_id = ?
        ORDER BY id
        "#,
    )
    .bind(meal_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<MealItem, StoreError> {
            Ok(MealItem {
                name: row.try_get("name")?,
                quantity: row.try_get("quantity")?,
                calories: row.try_get("calories")?,
                protein_g: row.try_get("protein_g")?,
                carbs_g: row.try_get("carbs_g")?,
                fat_g: row.try_get("fat_g")?,
            })
        })
        .collect()
}

async fn meal_from_row(pool: &SqlitePool, row: &SqliteRow) -> Result<Meal, StoreError> {
    let id: i64 = row.try_get("id")?;
    let category: String = row.try_get("category")?;

    Ok(Meal {
        id,
        name: row.try_get("name")?,
        category: parse_category(&category)?,
        logged_at: row.try_get("logged_at")?,
        total_calories: row.try_get("total_calories")?,
        items: load_items(pool, id).await?,
    })
}

/// Save a new meal with its items
pub async fn insert_meal(pool: &SqlitePool, meal: &NewMeal) -> Result<Meal, StoreError> {
    let total = meal.resolved_total_calories();
    let mut tx = pool.begin().await?;

    let meal_id = sqlx::query(
        r#"
        INSERT INTO meals (name, category, logged_at, total_calories)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&meal.name)
    .bind(meal.category.as_str())
    .bind(meal.logged_at)
    .bind(total)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    insert_items(&mut tx, meal_id, &meal.items).await?;
    tx.commit().await?;

    info!(meal_id, category = %meal.category, calories = total, "Meal logged");
    load_meal(pool, meal_id).await
}

pub async fn load_meal(pool: &SqlitePool, id: i64) -> Result<Meal, StoreError> {
    let row = sqlx::query(
        "SELECT id, name, category, logged_at, total_calories FROM meals WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("Meal", id))?;

    meal_from_row(pool, &row).await
}

/// Meals logged in [start, end), oldest first
pub async fn load_meals_between(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Meal>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, category, logged_at, total_calories
        FROM meals
        WHERE logged_at >= ? AND logged_at < ?
        ORDER BY logged_at, id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    let mut meals = Vec::with_capacity(rows.len());
    for row in &rows {
        meals.push(meal_from_row(pool, row).await?);
    }
    Ok(meals)
}

pub async fn load_meals_for_day(
    pool: &SqlitePool,
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<Meal>, StoreError> {
    let (start, end) = day_bounds(date, offset);
    load_meals_between(pool, start, end).await
}

/// Replace a meal's fields and items wholesale
pub async fn replace_meal(pool: &SqlitePool, id: i64, meal: &NewMeal) -> Result<Meal, StoreError> {
    let total = meal.resolved_total_calories();
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE meals
        SET name = ?, category = ?, logged_at = ?, total_calories = ?
        WHERE id = ?
        "#,
    )
    .bind(&meal.name)
    .bind(meal.category.as_str())
    .bind(meal.logged_at)
    .bind(total)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::not_found("Meal", id));
    }

    sqlx::query("DELETE FROM meal_items WHERE meal_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_items(&mut tx, id, &meal.items).await?;
    tx.commit().await?;

    info!(meal_id = id, calories = total, "Meal replaced");
    load_meal(pool, id).await
}

pub async fn delete_meal(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let deleted = sqlx::query("DELETE FROM meals WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(StoreError::not_found("Meal", id));
    }
    info!(meal_id = id, "Meal deleted");
    Ok(())
}

//! Diet plan repository
//!
//! At most one plan is active. Activation always runs as two sequential
//! transactions: every other plan is deactivated and committed first, then the
//! target is activated. A crash between the two leaves no active plan, never two.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use tracing::{info, warn};

use super::parse_category;
use crate::error::StoreError;
use crate::models::{DietPlan, NewDietPlan, NewScheduledMeal, ScheduledMeal};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_plan(plan: &NewDietPlan) -> Result<(), StoreError> {
    if plan.scheduled_meals.is_empty() {
        return Err(StoreError::NoMeals);
    }
    if plan.name.trim().is_empty() {
        return Err(StoreError::Invalid("plan name must not be empty".to_string()));
    }
    for meal in &plan.scheduled_meals {
        if meal.days_of_week.is_empty() {
            return Err(StoreError::Invalid(format!(
                "scheduled meal '{}' has no days",
                meal.name
            )));
        }
        if let Some(day) = meal.days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(StoreError::Invalid(format!(
                "scheduled meal '{}' has weekday {} outside 1-7",
                meal.name, day
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row Mapping
// ---------------------------------------------------------------------------

fn scheduled_meal_from_row(row: &SqliteRow) -> Result<ScheduledMeal, StoreError> {
    let category: String = row.try_get("category")?;
    let days_json: String = row.try_get("days_of_week_json")?;
    let days_of_week: BTreeSet<u8> = serde_json::from_str(&days_json)
        .map_err(|e| StoreError::Corrupt(format!("days_of_week '{}': {}", days_json, e)))?;

    Ok(ScheduledMeal {
        id: row.try_get("id")?,
        plan_id: row.try_get("plan_id")?,
        name: row.try_get("name")?,
        category: parse_category(&category)?,
        time_of_day: row.try_get("time_of_day")?,
        days_of_week,
        template_id: row.try_get("template_id")?,
        expected_calories: row.try_get("expected_calories")?,
    })
}

async fn load_scheduled_meals(
    pool: &SqlitePool,
    plan_id: i64,
) -> Result<Vec<ScheduledMeal>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT
            sm.id, sm.plan_id, sm.name, sm.category, sm.time_of_day,
            sm.days_of_week_json, sm.template_id, mt.expected_calories
        FROM scheduled_meals sm
        LEFT JOIN meal_templates mt ON mt.id = sm.template_id
        WHERE sm.plan_id = ?
        ORDER BY sm.time_of_day, sm.id
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(scheduled_meal_from_row).collect()
}

async fn plan_from_row(pool: &SqlitePool, row: &SqliteRow) -> Result<DietPlan, StoreError> {
    let id: i64 = row.try_get("id")?;
    Ok(DietPlan {
        id,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        daily_calorie_goal: row.try_get("daily_calorie_goal")?,
        scheduled_meals: load_scheduled_meals(pool, id).await?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn insert_scheduled_meals(
    conn: &mut SqliteConnection,
    plan_id: i64,
    meals: &[NewScheduledMeal],
) -> Result<(), StoreError> {
    for meal in meals {
        let days_json = serde_json::to_string(&meal.days_of_week)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO scheduled_meals
                (plan_id, name, category, time_of_day, days_of_week_json, template_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan_id)
        .bind(&meal.name)
        .bind(meal.category.as_str())
        .bind(meal.time_of_day)
        .bind(&days_json)
        .bind(meal.template_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn ensure_plan_exists(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM diet_plans WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| StoreError::not_found("Diet plan", id))
}

/// First of the two activation transactions: clear every active flag except `keep`
async fn deactivate_others(pool: &SqlitePool, keep: Option<i64>) -> Result<u64, StoreError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE diet_plans
        SET is_active = 0, updated_at = ?
        WHERE is_active = 1 AND (? IS NULL OR id != ?)
        "#,
    )
    .bind(now)
    .bind(keep)
    .bind(keep)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Database Operations
// ---------------------------------------------------------------------------

/// Create a plan. Fails with `NoMeals` before touching storage if nothing is scheduled.
pub async fn create_diet_plan(pool: &SqlitePool, plan: &NewDietPlan) -> Result<DietPlan, StoreError> {
    validate_plan(plan)?;

    if plan.is_active {
        let cleared = deactivate_others(pool, None).await?;
        info!(cleared, "Deactivated plans before creating active plan");
    }

    let now: DateTime<Utc> = Utc::now();
    let mut tx = pool.begin().await?;
    let plan_id = sqlx::query(
        r#"
        INSERT INTO diet_plans (name, is_active, daily_calorie_goal, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&plan.name)
    .bind(plan.is_active)
    .bind(plan.daily_calorie_goal)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    insert_scheduled_meals(&mut tx, plan_id, &plan.scheduled_meals).await?;
    tx.commit().await?;

    info!(
        plan_id,
        name = %plan.name,
        active = plan.is_active,
        meals = plan.scheduled_meals.len(),
        "Diet plan created"
    );
    load_plan(pool, plan_id).await
}

/// Replace a plan's contents; scheduled meals are replaced wholesale
pub async fn update_diet_plan(
    pool: &SqlitePool,
    id: i64,
    plan: &NewDietPlan,
) -> Result<DietPlan, StoreError> {
    validate_plan(plan)?;
    ensure_plan_exists(pool, id).await?;

    if plan.is_active {
        deactivate_others(pool, Some(id)).await?;
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE diet_plans
        SET name = ?, is_active = ?, daily_calorie_goal = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&plan.name)
    .bind(plan.is_active)
    .bind(plan.daily_calorie_goal)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM scheduled_meals WHERE plan_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_scheduled_meals(&mut tx, id, &plan.scheduled_meals).await?;
    tx.commit().await?;

    info!(plan_id = id, meals = plan.scheduled_meals.len(), "Diet plan updated");
    load_plan(pool, id).await
}

/// Make `id` the single active plan
pub async fn activate_plan(pool: &SqlitePool, id: i64) -> Result<DietPlan, StoreError> {
    ensure_plan_exists(pool, id).await?;

    let cleared = deactivate_others(pool, Some(id)).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE diet_plans SET is_active = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(plan_id = id, cleared, "Diet plan activated");
    load_plan(pool, id).await
}

pub async fn deactivate_plan(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let updated = sqlx::query("UPDATE diet_plans SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::not_found("Diet plan", id));
    }
    info!(plan_id = id, "Diet plan deactivated");
    Ok(())
}

pub async fn load_plan(pool: &SqlitePool, id: i64) -> Result<DietPlan, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, name, is_active, daily_calorie_goal, created_at, updated_at
        FROM diet_plans
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("Diet plan", id))?;

    plan_from_row(pool, &row).await
}

pub async fn load_all_plans(pool: &SqlitePool) -> Result<Vec<DietPlan>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, is_active, daily_calorie_goal, created_at, updated_at
        FROM diet_plans
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut plans = Vec::with_capacity(rows.len());
    for row in &rows {
        plans.push(plan_from_row(pool, row).await?);
    }
    Ok(plans)
}

pub async fn load_active_plans(pool: &SqlitePool) -> Result<Vec<DietPlan>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, is_active, daily_calorie_goal, created_at, updated_at
        FROM diet_plans
        WHERE is_active = 1
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    if rows.len() > 1 {
        warn!(count = rows.len(), "More than one active diet plan found");
    }

    let mut plans = Vec::with_capacity(rows.len());
    for row in &rows {
        plans.push(plan_from_row(pool, row).await?);
    }
    Ok(plans)
}

pub async fn delete_plan(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let deleted = sqlx::query("DELETE FROM diet_plans WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(StoreError::not_found("Diet plan", id));
    }
    info!(plan_id = id, "Diet plan deleted");
    Ok(())
}

//! Meal template repository

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::parse_category;
use crate::error::StoreError;
use crate::models::{MealTemplate, NewMealTemplate};

fn template_from_row(row: &SqliteRow) -> Result<MealTemplate, StoreError> {
    let category: String = row.try_get("category")?;
    Ok(MealTemplate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: parse_category(&category)?,
        expected_calories: row.try_get("expected_calories")?,
        protein_g: row.try_get("protein_g")?,
        carbs_g: row.try_get("carbs_g")?,
        fat_g: row.try_get("fat_g")?,
    })
}

pub async fn insert_template(
    pool: &SqlitePool,
    template: &NewMealTemplate,
) -> Result<MealTemplate, StoreError> {
    if template.expected_calories < 0 {
        return Err(StoreError::Invalid(format!(
            "expected calories must not be negative: {}",
            template.expected_calories
        )));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO meal_templates (name, category, expected_calories, protein_g, carbs_g, fat_g)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&template.name)
    .bind(template.category.as_str())
    .bind(template.expected_calories)
    .bind(template.protein_g)
    .bind(template.carbs_g)
    .bind(template.fat_g)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(template_id = id, name = %template.name, "Meal template created");
    load_template(pool, id).await
}

pub async fn load_template(pool: &SqlitePool, id: i64) -> Result<MealTemplate, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, name, category, expected_calories, protein_g, carbs_g, fat_g
        FROM meal_templates
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("Meal template", id))?;

    template_from_row(&row)
}

pub async fn load_all_templates(pool: &SqlitePool) -> Result<Vec<MealTemplate>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, category, expected_calories, protein_g, carbs_g, fat_g
        FROM meal_templates
        ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(template_from_row).collect()
}

/// Scheduled meals pointing at the template keep their slot but lose the target
pub async fn delete_template(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let deleted = sqlx::query("DELETE FROM meal_templates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(StoreError::not_found("Meal template", id));
    }
    Ok(())
}

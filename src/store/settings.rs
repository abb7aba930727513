//! User settings persistence for generated goals

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreError;
use crate::goals::GeneratedGoals;

pub async fn save_goals(pool: &SqlitePool, goals: &GeneratedGoals) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO user_settings (id, daily_calories, protein_g, carbs_g, fat_g, updated_at)
    VALUES (1, ?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
    ON CONFLICT(id) DO UPDATE SET
      daily_calories = excluded.daily_calories,
      protein_g = excluded.protein_g,
      carbs_g = excluded.carbs_g,
      fat_g = excluded.fat_g,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(goals.calories)
  .bind(goals.protein_g)
  .bind(goals.carbs_g)
  .bind(goals.fat_g)
  .execute(pool)
  .await?;

  info!(calories = goals.calories, "Daily goals saved");
  Ok(())
}

/// Stored goals, or the defaults when onboarding never completed
pub async fn load_goals(pool: &SqlitePool) -> Result<GeneratedGoals, StoreError> {
  let row: Option<(Option<i64>, Option<f64>, Option<f64>, Option<f64>)> = sqlx::query_as(
    "SELECT daily_calories, protein_g, carbs_g, fat_g FROM user_settings WHERE id = 1",
  )
  .fetch_optional(pool)
  .await?;

  match row {
    Some((Some(calories), Some(protein_g), Some(carbs_g), Some(fat_g))) => Ok(GeneratedGoals {
      calories,
      protein_g,
      carbs_g,
      fat_g,
    }),
    _ => Ok(GeneratedGoals::default()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{setup_test_db, teardown_test_db};

  #[tokio::test]
  async fn test_load_defaults_before_save() {
    let pool = setup_test_db().await;
    let goals = load_goals(&pool).await.expect("Should load");
    assert_eq!(goals, GeneratedGoals::default());
    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_save_then_load() {
    let pool = setup_test_db().await;
    let goals = GeneratedGoals {
      calories: 1440,
      protein_g: 86.0,
      carbs_g: 144.0,
      fat_g: 48.0,
    };

    save_goals(&pool, &goals).await.expect("Should save");
    assert_eq!(load_goals(&pool).await.unwrap(), goals);

    let updated = GeneratedGoals { calories: 2300, ..goals };
    save_goals(&pool, &updated).await.expect("Should overwrite");
    assert_eq!(load_goals(&pool).await.unwrap().calories, 2300);

    teardown_test_db(pool).await;
  }
}

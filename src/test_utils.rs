//! Test utilities and helpers for unit and database tests
//!
//! This module provides common test infrastructure including:
//! - In-memory database setup/teardown
//! - Seeders for rows other fixtures depend on
//! - Mock data factories

use crate::config::AppConfig;
use crate::db::AppState;
use crate::models::{
  DietPlan, Meal, MealCategory, MealItem, MealTemplate, NewDietPlan, NewMeal, NewMealTemplate,
  NewScheduledMeal, ScheduledMeal,
};
use crate::store::templates::insert_template;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) so every query sees the same in-memory database
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// In-memory database plus default configuration
pub async fn setup_test_state() -> AppState {
  AppState {
    db: setup_test_db().await,
    config: AppConfig::default(),
  }
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

pub async fn seed_test_template(
  pool: &SqlitePool,
  name: &str,
  category: MealCategory,
  expected_calories: i64,
) -> MealTemplate {
  insert_template(
    pool,
    &NewMealTemplate {
      name: name.to_string(),
      category,
      expected_calories,
      protein_g: None,
      carbs_g: None,
      fat_g: None,
    },
  )
  .await
  .expect("Failed to seed meal template")
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn every_day() -> std::collections::BTreeSet<u8> {
  (1..=7).collect()
}

pub fn mock_meal_item(name: &str, calories: i64) -> MealItem {
  MealItem {
    name: name.to_string(),
    quantity: 1.0,
    calories,
    protein_g: 10.0,
    carbs_g: 20.0,
    fat_g: 5.0,
  }
}

/// New meal without items; `calories` becomes the stored total
pub fn mock_new_meal(category: MealCategory, logged_at: DateTime<Utc>, calories: i64) -> NewMeal {
  NewMeal {
    name: format!("Test {}", category),
    category,
    logged_at,
    total_calories: Some(calories),
    items: Vec::new(),
  }
}

pub fn mock_logged_meal(
  id: i64,
  category: MealCategory,
  logged_at: DateTime<Utc>,
  calories: i64,
) -> Meal {
  Meal {
    id,
    name: format!("Test {}", category),
    category,
    logged_at,
    total_calories: calories,
    items: Vec::new(),
  }
}

/// Scheduled every day of the week, no template
pub fn mock_scheduled_meal(id: i64, category: MealCategory, hour: u32, minute: u32) -> ScheduledMeal {
  ScheduledMeal {
    id,
    plan_id: 1,
    name: format!("Planned {}", category),
    category,
    time_of_day: NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"),
    days_of_week: every_day(),
    template_id: None,
    expected_calories: None,
  }
}

pub fn mock_diet_plan(id: i64, is_active: bool, scheduled_meals: Vec<ScheduledMeal>) -> DietPlan {
  DietPlan {
    id,
    name: format!("Plan {}", id),
    is_active,
    daily_calorie_goal: Some(2000),
    scheduled_meals: scheduled_meals
      .into_iter()
      .map(|m| ScheduledMeal { plan_id: id, ..m })
      .collect(),
    created_at: Utc::now(),
    updated_at: Utc::now(),
  }
}

pub fn mock_new_scheduled_meal(
  name: &str,
  category: MealCategory,
  hour: u32,
  days: impl IntoIterator<Item = u8>,
) -> NewScheduledMeal {
  NewScheduledMeal {
    name: name.to_string(),
    category,
    time_of_day: NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"),
    days_of_week: days.into_iter().collect(),
    template_id: None,
  }
}

/// Breakfast at 08:00 and lunch at 12:30, every day
pub fn mock_new_plan(name: &str, is_active: bool) -> NewDietPlan {
  let mut lunch = mock_new_scheduled_meal("Lunch", MealCategory::Lunch, 12, every_day());
  lunch.time_of_day = NaiveTime::from_hms_opt(12, 30, 0).expect("valid time");

  NewDietPlan {
    name: name.to_string(),
    is_active,
    daily_calorie_goal: Some(1800),
    scheduled_meals: vec![
      mock_new_scheduled_meal("Breakfast", MealCategory::Breakfast, 8, every_day()),
      lunch,
    ],
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('meals', 'diet_plans', 'scheduled_meals', 'meal_reminders', 'user_settings')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {:?}", tables);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_plan_shape() {
    let plan = mock_new_plan("Test", true);
    assert_eq!(plan.scheduled_meals.len(), 2);
    assert_eq!(plan.scheduled_meals[1].time_of_day, NaiveTime::from_hms_opt(12, 30, 0).unwrap());

    let built = mock_diet_plan(4, true, vec![mock_scheduled_meal(1, MealCategory::Snack, 15, 0)]);
    assert_eq!(built.scheduled_meals[0].plan_id, 4);
  }
}

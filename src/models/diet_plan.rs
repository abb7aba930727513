use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MealCategory;

/// Weekday number as stored in `days_of_week`: 1 = Sunday ... 7 = Saturday
pub fn weekday_number(date: NaiveDate) -> u8 {
  date.weekday().number_from_sunday() as u8
}

/// Reusable calorie target for a meal slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealTemplate {
  pub id: i64,
  pub name: String,
  pub category: MealCategory,
  pub expected_calories: i64,
  pub protein_g: Option<f64>,
  pub carbs_g: Option<f64>,
  pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMealTemplate {
  pub name: String,
  pub category: MealCategory,
  pub expected_calories: i64,
  pub protein_g: Option<f64>,
  pub carbs_g: Option<f64>,
  pub fat_g: Option<f64>,
}

/// A planned meal slot belonging to a diet plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMeal {
  pub id: i64,
  pub plan_id: i64,
  pub name: String,
  pub category: MealCategory,
  pub time_of_day: NaiveTime,
  pub days_of_week: BTreeSet<u8>,
  pub template_id: Option<i64>,
  /// Expected calories of the linked template (None when unlinked)
  pub expected_calories: Option<i64>,
}

impl ScheduledMeal {
  pub fn occurs_on(&self, date: NaiveDate) -> bool {
    self.days_of_week.contains(&weekday_number(date))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduledMeal {
  pub name: String,
  pub category: MealCategory,
  pub time_of_day: NaiveTime,
  pub days_of_week: BTreeSet<u8>,
  pub template_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietPlan {
  pub id: i64,
  pub name: String,
  pub is_active: bool,
  pub daily_calorie_goal: Option<i64>,
  pub scheduled_meals: Vec<ScheduledMeal>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// For creating a plan or replacing an existing plan's contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDietPlan {
  pub name: String,
  pub is_active: bool,
  pub daily_calorie_goal: Option<i64>,
  pub scheduled_meals: Vec<NewScheduledMeal>,
}

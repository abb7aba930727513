use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reminder state for one scheduled meal occurrence on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealReminder {
  pub id: i64,
  pub scheduled_meal_id: i64,
  pub reminder_date: NaiveDate,
  pub was_completed: bool,
  pub completed_meal_id: Option<i64>,
  pub goal_achieved: Option<bool>,
  pub goal_deviation: Option<f64>,
}

impl MealReminder {
  /// Completed through the reminder flow with a concrete logged meal attached
  pub fn is_fulfilled(&self) -> bool {
    self.was_completed && self.completed_meal_id.is_some()
  }
}

//! SQLite repositories. Every function takes the pool explicitly.

pub mod activity;
pub mod diet_plans;
pub mod meals;
pub mod reminders;
pub mod settings;
pub mod templates;

use crate::error::StoreError;
use crate::models::MealCategory;

pub(crate) fn parse_category(raw: &str) -> Result<MealCategory, StoreError> {
  raw.parse().map_err(StoreError::Corrupt)
}

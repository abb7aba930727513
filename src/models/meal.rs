use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meal slot a logged or scheduled meal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealCategory {
  Breakfast,
  Lunch,
  Dinner,
  Snack,
}

impl MealCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      MealCategory::Breakfast => "breakfast",
      MealCategory::Lunch => "lunch",
      MealCategory::Dinner => "dinner",
      MealCategory::Snack => "snack",
    }
  }

  pub fn all() -> [MealCategory; 4] {
    [
      MealCategory::Breakfast,
      MealCategory::Lunch,
      MealCategory::Dinner,
      MealCategory::Snack,
    ]
  }
}

impl std::fmt::Display for MealCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for MealCategory {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "breakfast" => Ok(Self::Breakfast),
      "lunch" => Ok(Self::Lunch),
      "dinner" => Ok(Self::Dinner),
      "snack" | "snacks" => Ok(Self::Snack),
      _ => Err(format!("Unknown meal category: {}", s)),
    }
  }
}

/// One food entry inside a logged meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
  pub name: String,
  pub quantity: f64,
  pub calories: i64,
  pub protein_g: f64,
  pub carbs_g: f64,
  pub fat_g: f64,
}

/// A meal the user saved. Edits replace the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
  pub id: i64,
  pub name: String,
  pub category: MealCategory,
  pub logged_at: DateTime<Utc>,
  pub total_calories: i64,
  pub items: Vec<MealItem>,
}

impl Meal {
  pub fn protein_g(&self) -> f64 {
    self.items.iter().map(|i| i.protein_g).sum()
  }

  pub fn carbs_g(&self) -> f64 {
    self.items.iter().map(|i| i.carbs_g).sum()
  }

  pub fn fat_g(&self) -> f64 {
    self.items.iter().map(|i| i.fat_g).sum()
  }
}

/// For inserting or replacing meals (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeal {
  pub name: String,
  pub category: MealCategory,
  pub logged_at: DateTime<Utc>,
  /// Used only when `items` is empty; otherwise the item sum wins
  pub total_calories: Option<i64>,
  pub items: Vec<MealItem>,
}

impl NewMeal {
  pub fn resolved_total_calories(&self) -> i64 {
    if self.items.is_empty() {
      self.total_calories.unwrap_or(0)
    } else {
      self.items.iter().map(|i| i.calories).sum()
    }
  }
}

//! Daily diary totals and weight progress
//!
//! Pure aggregation over records already loaded from the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::goals::GeneratedGoals;
use crate::models::{ExerciseEntry, Meal, MealCategory, WeightEntry};

/// ---------------------------------------------------------------------------
/// Daily Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
  pub category: MealCategory,
  pub calories: i64,
  pub meal_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
  pub date: NaiveDate,
  pub goals: GeneratedGoals,
  pub consumed_calories: i64,
  pub protein_g: f64,
  pub carbs_g: f64,
  pub fat_g: f64,
  pub burned_calories: i64,
  /// goal - consumed + burned; negative when over budget
  pub remaining_calories: i64,
  pub by_category: Vec<CategoryTotal>,
}

impl DailySummary {
  pub fn compute(
    date: NaiveDate,
    goals: GeneratedGoals,
    meals: &[Meal],
    exercises: &[ExerciseEntry],
  ) -> Self {
    let consumed_calories: i64 = meals.iter().map(|m| m.total_calories).sum();
    let burned_calories: i64 = exercises.iter().map(|e| e.calories_burned).sum();

    let by_category = MealCategory::all()
      .into_iter()
      .map(|category| {
        let in_category = meals.iter().filter(|m| m.category == category);
        CategoryTotal {
          category,
          calories: in_category.clone().map(|m| m.total_calories).sum(),
          meal_count: in_category.count(),
        }
      })
      .collect();

    Self {
      date,
      goals,
      consumed_calories,
      protein_g: meals.iter().map(Meal::protein_g).sum(),
      carbs_g: meals.iter().map(Meal::carbs_g).sum(),
      fat_g: meals.iter().map(Meal::fat_g).sum(),
      burned_calories,
      remaining_calories: goals.calories - consumed_calories + burned_calories,
      by_category,
    }
  }

  /// Fraction of the calorie goal eaten (0.0 when the goal is zero)
  pub fn calorie_progress(&self) -> f64 {
    if self.goals.calories <= 0 {
      0.0
    } else {
      self.consumed_calories as f64 / self.goals.calories as f64
    }
  }

  pub fn is_over_budget(&self) -> bool {
    self.remaining_calories < 0
  }
}

/// ---------------------------------------------------------------------------
/// Weight Progress
/// ---------------------------------------------------------------------------

const MOVING_AVERAGE_ENTRIES: usize = 7;
const STABLE_BAND_KG: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTrend {
  Losing,
  Stable,
  Gaining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProgress {
  pub start_date: NaiveDate,
  pub start_kg: f64,
  pub current_date: NaiveDate,
  pub current_kg: f64,
  pub change_kg: f64,
  /// Mean of the most recent entries (up to seven)
  pub moving_average_kg: f64,
  pub trend: WeightTrend,
  pub entries: usize,
}

impl WeightProgress {
  /// None when there are no entries. Entries may arrive in any order.
  pub fn compute(entries: &[WeightEntry]) -> Option<Self> {
    let mut sorted: Vec<&WeightEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.recorded_on);

    let first = *sorted.first()?;
    let last = *sorted.last()?;

    let recent = &sorted[sorted.len().saturating_sub(MOVING_AVERAGE_ENTRIES)..];
    let moving_average_kg = recent.iter().map(|e| e.weight_kg).sum::<f64>() / recent.len() as f64;

    let change_kg = last.weight_kg - first.weight_kg;
    let trend = if change_kg < -STABLE_BAND_KG {
      WeightTrend::Losing
    } else if change_kg > STABLE_BAND_KG {
      WeightTrend::Gaining
    } else {
      WeightTrend::Stable
    };

    Some(Self {
      start_date: first.recorded_on,
      start_kg: first.weight_kg,
      current_date: last.recorded_on,
      current_kg: last.weight_kg,
      change_kg,
      moving_average_kg,
      trend,
      entries: sorted.len(),
    })
  }

  /// Share of the way from the start weight to `target_kg`, clamped to [0, 1]
  pub fn progress_toward(&self, target_kg: f64) -> f64 {
    let total = target_kg - self.start_kg;
    if total.abs() < f64::EPSILON {
      return 1.0;
    }
    (self.change_kg / total).clamp(0.0, 1.0)
  }
}

//! Daily calorie and macro goal generation from onboarding answers
//!
//! Pure arithmetic: answers in, goals out. Persisting the result is the
//! caller's job (see `store::settings`).

use serde::{Deserialize, Serialize};

use crate::error::OnboardingError;

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

pub const DEFAULT_CALORIES: i64 = 2000;

const PROTEIN_SHARE: f64 = 0.30;
const CARBS_SHARE: f64 = 0.40;
const FAT_SHARE: f64 = 0.30;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// ---------------------------------------------------------------------------
/// Generated Goals
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedGoals {
  pub calories: i64,
  pub protein_g: f64,
  pub carbs_g: f64,
  pub fat_g: f64,
}

impl Default for GeneratedGoals {
  /// Fallback used when no usable onboarding answer was given
  fn default() -> Self {
    Self {
      calories: DEFAULT_CALORIES,
      protein_g: 150.0,
      carbs_g: 250.0,
      fat_g: 65.0,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Answer Normalization
/// ---------------------------------------------------------------------------

fn normalize(raw: &str) -> String {
  raw
    .trim()
    .to_ascii_lowercase()
    .chars()
    .map(|c| if c == ' ' || c == '-' { '_' } else { c })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
  Sedentary,
  Light,
  Moderate,
  Active,
  Athlete,
}

impl ActivityLevel {
  /// Returns None for values outside the known tiers
  pub fn parse(raw: &str) -> Option<Self> {
    match normalize(raw).as_str() {
      "sedentary" => Some(Self::Sedentary),
      "light" | "lightly_active" => Some(Self::Light),
      "moderate" | "moderately_active" => Some(Self::Moderate),
      "active" | "very_active" => Some(Self::Active),
      "athlete" | "extra_active" => Some(Self::Athlete),
      _ => None,
    }
  }

  pub fn base_calories(&self) -> i64 {
    match self {
      Self::Sedentary => 1800,
      Self::Light => 2000,
      Self::Moderate => 2200,
      Self::Active => 2500,
      Self::Athlete => 2800,
    }
  }

  pub fn protein_multiplier(&self) -> f64 {
    match self {
      Self::Sedentary => 0.8,
      Self::Light => 1.0,
      Self::Moderate => 1.1,
      Self::Active => 1.2,
      Self::Athlete => 1.3,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
  LoseWeight,
  Maintain,
  Gain,
}

impl GoalType {
  pub fn parse(raw: &str) -> Option<Self> {
    match normalize(raw).as_str() {
      "lose_weight" | "weight_loss" | "lose" | "lose_fat" => Some(Self::LoseWeight),
      "maintain" | "maintenance" | "maintain_weight" => Some(Self::Maintain),
      "gain_weight" | "weight_gain" | "gain_muscle" | "muscle_gain" | "build_muscle" | "gain" => {
        Some(Self::Gain)
      }
      _ => None,
    }
  }

  pub fn calorie_multiplier(&self) -> f64 {
    match self {
      Self::LoseWeight => 0.8,
      Self::Maintain => 1.0,
      Self::Gain => 1.15,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Onboarding Answers
/// ---------------------------------------------------------------------------

/// Canonical onboarding answer shape, validated once when it enters the crate.
///
/// Unknown keys and wrongly typed values are rejected. Unrecognized *values*
/// for `activity_level` or `goal` are accepted and fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnboardingAnswers {
  #[serde(default)]
  pub activity_level: Option<String>,
  #[serde(default)]
  pub goal: Option<String>,
  #[serde(default)]
  pub age: Option<u32>,
  #[serde(default)]
  pub height_cm: Option<f64>,
  #[serde(default)]
  pub weight_kg: Option<f64>,
  #[serde(default)]
  pub target_weight_kg: Option<f64>,
}

impl OnboardingAnswers {
  pub fn new(activity_level: &str, goal: &str) -> Self {
    Self {
      activity_level: Some(activity_level.to_string()),
      goal: Some(goal.to_string()),
      ..Default::default()
    }
  }

  pub fn from_json(json: &str) -> Result<Self, OnboardingError> {
    let answers: Self =
      serde_json::from_str(json).map_err(|e| OnboardingError::Malformed(e.to_string()))?;
    answers.validate()?;
    Ok(answers)
  }

  pub fn from_value(value: serde_json::Value) -> Result<Self, OnboardingError> {
    let answers: Self =
      serde_json::from_value(value).map_err(|e| OnboardingError::Malformed(e.to_string()))?;
    answers.validate()?;
    Ok(answers)
  }

  fn validate(&self) -> Result<(), OnboardingError> {
    let positive = [
      ("height_cm", self.height_cm),
      ("weight_kg", self.weight_kg),
      ("target_weight_kg", self.target_weight_kg),
    ];
    for (field, value) in positive {
      if let Some(v) = value {
        if !v.is_finite() || v <= 0.0 {
          return Err(OnboardingError::InvalidField {
            field: field.to_string(),
            reason: format!("must be a positive number, got {}", v),
          });
        }
      }
    }
    Ok(())
  }

  pub fn activity(&self) -> Option<ActivityLevel> {
    self.activity_level.as_deref().and_then(ActivityLevel::parse)
  }

  pub fn goal_type(&self) -> Option<GoalType> {
    self.goal.as_deref().and_then(GoalType::parse)
  }
}

/// ---------------------------------------------------------------------------
/// Goal Calculation
/// ---------------------------------------------------------------------------

pub fn generate_goals(answers: &OnboardingAnswers) -> GeneratedGoals {
  let activity = answers.activity();
  let goal = answers.goal_type();

  if activity.is_none() && goal.is_none() {
    return GeneratedGoals::default();
  }

  let base = activity.map_or(DEFAULT_CALORIES, |a| a.base_calories());
  let calories = (base as f64 * goal.map_or(1.0, |g| g.calorie_multiplier())).round() as i64;
  let protein_multiplier = activity.map_or(1.0, |a| a.protein_multiplier());

  let kcal = calories as f64;
  GeneratedGoals {
    calories,
    protein_g: (kcal * PROTEIN_SHARE / KCAL_PER_G_PROTEIN * protein_multiplier).round(),
    carbs_g: (kcal * CARBS_SHARE / KCAL_PER_G_CARBS).round(),
    fat_g: (kcal * FAT_SHARE / KCAL_PER_G_FAT).round(),
  }
}

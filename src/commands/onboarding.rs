//! Onboarding completion: answers in, persisted daily goals out

use crate::db::AppState;
use crate::error::AppError;
use crate::goals::{generate_goals, GeneratedGoals, OnboardingAnswers};
use crate::store::settings::{load_goals, save_goals};

/// Generate goals from validated answers and store them in user settings
pub async fn complete_onboarding(
  state: &AppState,
  answers: &OnboardingAnswers,
) -> Result<GeneratedGoals, AppError> {
  let goals = generate_goals(answers);
  save_goals(&state.db, &goals).await?;
  Ok(goals)
}

/// Same as `complete_onboarding`, validating a raw JSON payload first
pub async fn complete_onboarding_json(
  state: &AppState,
  payload: &str,
) -> Result<GeneratedGoals, AppError> {
  let answers = OnboardingAnswers::from_json(payload)?;
  complete_onboarding(state, &answers).await
}

pub async fn get_goals(state: &AppState) -> Result<GeneratedGoals, AppError> {
  Ok(load_goals(&state.db).await?)
}

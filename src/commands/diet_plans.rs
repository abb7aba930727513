//! Diet plan commands

use crate::db::AppState;
use crate::error::AppError;
use crate::models::{DietPlan, MealTemplate, NewDietPlan, NewMealTemplate};
use crate::store::diet_plans::{
    activate_plan, create_diet_plan, deactivate_plan, delete_plan, load_active_plans,
    load_all_plans, update_diet_plan,
};
use crate::store::templates::{insert_template, load_all_templates};

/// Get all diet plans
pub async fn get_diet_plans(state: &AppState) -> Result<Vec<DietPlan>, AppError> {
    Ok(load_all_plans(&state.db).await?)
}

/// Get the active plan, if any
pub async fn get_active_plan(state: &AppState) -> Result<Option<DietPlan>, AppError> {
    Ok(load_active_plans(&state.db).await?.into_iter().next())
}

/// Create a plan (fails with `NoMeals` when nothing is scheduled)
pub async fn create_plan(state: &AppState, plan: &NewDietPlan) -> Result<DietPlan, AppError> {
    Ok(create_diet_plan(&state.db, plan).await?)
}

/// Replace a plan's name, goal and scheduled meals
pub async fn update_plan(
    state: &AppState,
    plan_id: i64,
    plan: &NewDietPlan,
) -> Result<DietPlan, AppError> {
    Ok(update_diet_plan(&state.db, plan_id, plan).await?)
}

/// Make a plan the single active one
pub async fn set_active_plan(state: &AppState, plan_id: i64) -> Result<DietPlan, AppError> {
    Ok(activate_plan(&state.db, plan_id).await?)
}

pub async fn clear_active_plan(state: &AppState, plan_id: i64) -> Result<(), AppError> {
    Ok(deactivate_plan(&state.db, plan_id).await?)
}

pub async fn remove_plan(state: &AppState, plan_id: i64) -> Result<(), AppError> {
    Ok(delete_plan(&state.db, plan_id).await?)
}

pub async fn create_template(
    state: &AppState,
    template: &NewMealTemplate,
) -> Result<MealTemplate, AppError> {
    Ok(insert_template(&state.db, template).await?)
}

pub async fn get_templates(state: &AppState) -> Result<Vec<MealTemplate>, AppError> {
    Ok(load_all_templates(&state.db).await?)
}

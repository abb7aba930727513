pub mod activity;
pub mod diet_plan;
pub mod meal;
pub mod reminder;

pub use activity::{ExerciseEntry, NewExerciseEntry, WeightEntry};
pub use diet_plan::{
  weekday_number, DietPlan, MealTemplate, NewDietPlan, NewMealTemplate, NewScheduledMeal,
  ScheduledMeal,
};
pub use meal::{Meal, MealCategory, MealItem, NewMeal};
pub use reminder::MealReminder;

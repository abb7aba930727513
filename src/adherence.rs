//! Diet adherence evaluation
//!
//! For one day, decides which scheduled plan meals were fulfilled by logged meals,
//! whether each fulfilled meal landed near its calorie target, and which logged
//! meals fell outside the plan entirely.
//!
//! Matching order per scheduled meal:
//! - a completed reminder pointing at a logged meal wins
//! - otherwise the first logged meal of the same category inside the time window
//! - otherwise the meal is missed

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::config::AdherenceConfig;
use crate::models::{DietPlan, Meal, MealReminder, ScheduledMeal};

// ---------------------------------------------------------------------------
/// Goal Achievement: calorie closeness of one fulfilled meal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalAchievement {
    pub achieved: bool,
    /// (actual - expected) / expected; 0.0 when there is no target
    pub deviation: f64,
}

/// Compare actual calories against a scheduled meal's expected calories.
///
/// No target (or a zero target) counts as achieved with zero deviation.
pub fn evaluate_meal_goal_achievement(
    expected_calories: Option<i64>,
    actual_calories: i64,
    tolerance: f64,
) -> GoalAchievement {
    match expected_calories {
        Some(expected) if expected != 0 => {
            let expected = expected as f64;
            let deviation = (actual_calories as f64 - expected) / expected;
            GoalAchievement {
                achieved: deviation.abs() <= tolerance,
                deviation,
            }
        }
        _ => GoalAchievement {
            achieved: true,
            deviation: 0.0,
        },
    }
}

// ---------------------------------------------------------------------------
/// Report Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSource {
    Reminder,
    TimeMatch,
}

/// Link between a scheduled meal and the logged meal that fulfilled it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealMatch {
    pub scheduled_meal_id: i64,
    pub logged_meal_id: i64,
    pub source: CompletionSource,
    /// None when a reminder was completed without a recorded goal outcome
    pub achievement: Option<GoalAchievement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdherenceReport {
    pub date: NaiveDate,
    pub scheduled_meals: Vec<ScheduledMeal>,
    /// Ids of scheduled meals that were fulfilled
    pub completed_meal_ids: Vec<i64>,
    pub missed_meals: Vec<ScheduledMeal>,
    pub off_diet_meals: Vec<Meal>,
    pub off_diet_calories: i64,
    pub goal_achieved_ids: Vec<i64>,
    pub goal_missed_ids: Vec<i64>,
    pub matches: Vec<MealMatch>,
}

impl AdherenceReport {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            scheduled_meals: Vec::new(),
            completed_meal_ids: Vec::new(),
            missed_meals: Vec::new(),
            off_diet_meals: Vec::new(),
            off_diet_calories: 0,
            goal_achieved_ids: Vec::new(),
            goal_missed_ids: Vec::new(),
            matches: Vec::new(),
        }
    }

    /// Completed / scheduled; a day with nothing scheduled is fully complete
    pub fn completion_rate(&self) -> f64 {
        if self.scheduled_meals.is_empty() {
            1.0
        } else {
            self.completed_meal_ids.len() as f64 / self.scheduled_meals.len() as f64
        }
    }

    /// Goal-achieved / completed; 0.0 when nothing was completed
    pub fn goal_achievement_rate(&self) -> f64 {
        if self.completed_meal_ids.is_empty() {
            0.0
        } else {
            self.goal_achieved_ids.len() as f64 / self.completed_meal_ids.len() as f64
        }
    }

    pub fn has_perfect_adherence(&self) -> bool {
        self.missed_meals.is_empty()
            && self.off_diet_meals.is_empty()
            && self.goal_missed_ids.is_empty()
    }

    /// Matches found by time-matching, which have no reminder record yet
    pub fn time_matches(&self) -> impl Iterator<Item = &MealMatch> {
        self.matches
            .iter()
            .filter(|m| m.source == CompletionSource::TimeMatch)
    }
}

/// Number of consecutive perfect days at the end of `reports` (oldest first)
pub fn adherence_streak(reports: &[AdherenceReport]) -> usize {
    reports
        .iter()
        .rev()
        .take_while(|r| r.has_perfect_adherence())
        .count()
}

/// Scheduled meals of active plans that occur on `date`, ordered by time of day
pub fn scheduled_meals_for_day(date: NaiveDate, plans: &[DietPlan]) -> Vec<ScheduledMeal> {
    let mut meals: Vec<ScheduledMeal> = plans
        .iter()
        .filter(|p| p.is_active)
        .flat_map(|p| p.scheduled_meals.iter())
        .filter(|m| m.occurs_on(date))
        .cloned()
        .collect();
    meals.sort_by_key(|m| (m.time_of_day, m.id));
    meals
}

// ---------------------------------------------------------------------------
/// Evaluator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AdherenceEvaluator {
    config: AdherenceConfig,
}

impl AdherenceEvaluator {
    pub fn new(config: AdherenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdherenceConfig {
        &self.config
    }

    /// Calendar date of a timestamp on the user's wall clock
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.config.local_offset()).date_naive()
    }

    /// Same category and logged within the window of the scheduled time (inclusive)
    pub fn meal_matches(&self, scheduled: &ScheduledMeal, logged: &Meal) -> bool {
        if scheduled.category != logged.category {
            return false;
        }
        let logged_time = logged
            .logged_at
            .with_timezone(&self.config.local_offset())
            .time();
        let delta = i64::from(logged_time.num_seconds_from_midnight())
            - i64::from(scheduled.time_of_day.num_seconds_from_midnight());
        delta.abs() <= self.config.match_window_minutes * 60
    }

    pub fn goal_achievement(&self, scheduled: &ScheduledMeal, logged: &Meal) -> GoalAchievement {
        evaluate_meal_goal_achievement(
            scheduled.expected_calories,
            logged.total_calories,
            self.config.goal_tolerance,
        )
    }

    /// Evaluate one day.
    ///
    /// `reminders` and `logged_meals` may contain other days; only entries on
    /// `date` are considered. A logged meal may fulfill every slot it matches.
    ///
    /// Off-diet goes beyond the time/category rule: a meal linked to a completed
    /// reminder is on plan even when it matches no scheduled meal by time.
    pub fn evaluate(
        &self,
        date: NaiveDate,
        active_plans: &[DietPlan],
        reminders: &[MealReminder],
        logged_meals: &[Meal],
    ) -> AdherenceReport {
        let mut report = AdherenceReport::empty(date);
        report.scheduled_meals = scheduled_meals_for_day(date, active_plans);

        let day_meals: Vec<&Meal> = logged_meals
            .iter()
            .filter(|m| self.local_date(m.logged_at) == date)
            .collect();
        let day_reminders: Vec<&MealReminder> = reminders
            .iter()
            .filter(|r| r.reminder_date == date && r.is_fulfilled())
            .collect();

        let reminder_linked: HashSet<i64> = day_reminders
            .iter()
            .filter_map(|r| r.completed_meal_id)
            .collect();

        for scheduled in &report.scheduled_meals {
            if let Some(reminder) = day_reminders
                .iter()
                .find(|r| r.scheduled_meal_id == scheduled.id)
            {
                report.completed_meal_ids.push(scheduled.id);
                match reminder.goal_achieved {
                    Some(true) => report.goal_achieved_ids.push(scheduled.id),
                    Some(false) => report.goal_missed_ids.push(scheduled.id),
                    None => {}
                }
                report.matches.push(MealMatch {
                    scheduled_meal_id: scheduled.id,
                    logged_meal_id: reminder.completed_meal_id.unwrap_or_default(),
                    source: CompletionSource::Reminder,
                    achievement: reminder.goal_achieved.map(|achieved| GoalAchievement {
                        achieved,
                        deviation: reminder.goal_deviation.unwrap_or(0.0),
                    }),
                });
                continue;
            }

            let fallback = day_meals
                .iter()
                .find(|m| self.meal_matches(scheduled, m));

            match fallback {
                Some(logged) => {
                    let achievement = self.goal_achievement(scheduled, logged);
                    debug!(
                        scheduled_meal_id = scheduled.id,
                        logged_meal_id = logged.id,
                        deviation = achievement.deviation,
                        achieved = achievement.achieved,
                        "scheduled meal fulfilled by time match"
                    );
                    report.completed_meal_ids.push(scheduled.id);
                    if achievement.achieved {
                        report.goal_achieved_ids.push(scheduled.id);
                    } else {
                        report.goal_missed_ids.push(scheduled.id);
                    }
                    report.matches.push(MealMatch {
                        scheduled_meal_id: scheduled.id,
                        logged_meal_id: logged.id,
                        source: CompletionSource::TimeMatch,
                        achievement: Some(achievement),
                    });
                }
                None => report.missed_meals.push(scheduled.clone()),
            }
        }

        for logged in day_meals {
            let on_plan = reminder_linked.contains(&logged.id)
                || report
                    .scheduled_meals
                    .iter()
                    .any(|s| self.meal_matches(s, logged));
            if !on_plan {
                report.off_diet_calories += logged.total_calories;
                report.off_diet_meals.push(logged.clone());
            }
        }

        debug!(
            date = %date,
            scheduled = report.scheduled_meals.len(),
            completed = report.completed_meal_ids.len(),
            missed = report.missed_meals.len(),
            off_diet = report.off_diet_meals.len(),
            "adherence evaluated"
        );

        report
    }

    /// One report per day from `start` to `end` inclusive
    pub fn evaluate_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        active_plans: &[DietPlan],
        reminders: &[MealReminder],
        logged_meals: &[Meal],
    ) -> Vec<AdherenceReport> {
        let mut reports = Vec::new();
        let mut day = start;
        while day <= end {
            reports.push(self.evaluate(day, active_plans, reminders, logged_meals));
            day += Duration::days(1);
        }
        reports
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealCategory;
    use crate::test_utils::{mock_diet_plan, mock_logged_meal, mock_scheduled_meal};
    use chrono::NaiveTime;

    // 2025-03-03 is a Monday (weekday number 2)
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        monday().and_hms_opt(h, m, 0).unwrap().and_utc()
    }

    fn breakfast_plan(expected: Option<i64>) -> DietPlan {
        let mut breakfast = mock_scheduled_meal(1, MealCategory::Breakfast, 8, 0);
        breakfast.expected_calories = expected;
        mock_diet_plan(1, true, vec![breakfast])
    }

    fn reminder(scheduled_meal_id: i64, meal_id: Option<i64>, achieved: Option<bool>) -> MealReminder {
        MealReminder {
            id: 1,
            scheduled_meal_id,
            reminder_date: monday(),
            was_completed: true,
            completed_meal_id: meal_id,
            goal_achieved: achieved,
            goal_deviation: achieved.map(|_| 0.05),
        }
    }

    #[test]
    fn test_goal_achievement_boundary_inclusive() {
        let at_edge = evaluate_meal_goal_achievement(Some(500), 600, 0.20);
        assert!(at_edge.achieved);
        assert!((at_edge.deviation - 0.20).abs() < 1e-12);

        let over = evaluate_meal_goal_achievement(Some(500), 601, 0.20);
        assert!(!over.achieved);
        assert!(over.deviation > 0.20);

        let under = evaluate_meal_goal_achievement(Some(500), 400, 0.20);
        assert!(under.achieved);
        assert!(!evaluate_meal_goal_achievement(Some(500), 399, 0.20).achieved);
    }

    #[test]
    fn test_goal_achievement_without_target() {
        let none = evaluate_meal_goal_achievement(None, 1200, 0.20);
        assert_eq!(none, GoalAchievement { achieved: true, deviation: 0.0 });

        let zero = evaluate_meal_goal_achievement(Some(0), 1200, 0.20);
        assert_eq!(zero, GoalAchievement { achieved: true, deviation: 0.0 });
    }

    #[test]
    fn test_no_scheduled_meals_is_fully_complete() {
        let evaluator = AdherenceEvaluator::default();
        let meals = vec![mock_logged_meal(10, MealCategory::Lunch, at(12, 0), 700)];
        let report = evaluator.evaluate(monday(), &[], &[], &meals);

        assert_eq!(report.completion_rate(), 1.0);
        assert_eq!(report.goal_achievement_rate(), 0.0);
        assert_eq!(report.off_diet_calories, 700);
        assert!(!report.has_perfect_adherence());
    }

    #[test]
    fn test_time_window_inclusive_edges() {
        let evaluator = AdherenceEvaluator::default();
        let plan = breakfast_plan(None);

        let inside = vec![mock_logged_meal(10, MealCategory::Breakfast, at(9, 59), 400)];
        let report = evaluator.evaluate(monday(), &[plan.clone()], &[], &inside);
        assert_eq!(report.completed_meal_ids, vec![1]);
        assert!(report.missed_meals.is_empty());

        let exact = vec![mock_logged_meal(10, MealCategory::Breakfast, at(10, 0), 400)];
        let report = evaluator.evaluate(monday(), &[plan.clone()], &[], &exact);
        assert_eq!(report.completed_meal_ids, vec![1]);

        let outside = vec![mock_logged_meal(10, MealCategory::Breakfast, at(10, 1), 400)];
        let report = evaluator.evaluate(monday(), &[plan], &[], &outside);
        assert!(report.completed_meal_ids.is_empty());
        assert_eq!(report.missed_meals.len(), 1);
        assert_eq!(report.off_diet_calories, 400);
        assert_eq!(report.completion_rate(), 0.0);
    }

    #[test]
    fn test_category_must_match_exactly() {
        let evaluator = AdherenceEvaluator::default();
        let meals = vec![mock_logged_meal(10, MealCategory::Snack, at(8, 0), 200)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(None)], &[], &meals);

        assert_eq!(report.missed_meals.len(), 1);
        assert_eq!(report.off_diet_meals.len(), 1);
    }

    #[test]
    fn test_reminder_completion_wins_over_time() {
        let evaluator = AdherenceEvaluator::default();
        // Logged far from the slot, but the user confirmed it through the reminder
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(11, 30), 900)];
        let reminders = vec![reminder(1, Some(10), Some(false))];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &reminders, &meals);

        assert_eq!(report.completed_meal_ids, vec![1]);
        assert_eq!(report.goal_missed_ids, vec![1]);
        assert!(report.goal_achieved_ids.is_empty());
        assert!(report.off_diet_meals.is_empty());
        assert_eq!(report.matches[0].source, CompletionSource::Reminder);
        assert_eq!(report.time_matches().count(), 0);
    }

    #[test]
    fn test_reminder_without_meal_falls_back_to_time_match() {
        let evaluator = AdherenceEvaluator::default();
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(8, 30), 550)];
        let reminders = vec![reminder(1, None, None)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &reminders, &meals);

        assert_eq!(report.completed_meal_ids, vec![1]);
        assert_eq!(report.goal_achieved_ids, vec![1]);
        let matched = report.time_matches().next().expect("time match recorded");
        assert_eq!(matched.logged_meal_id, 10);
        assert!((matched.achievement.unwrap().deviation - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_reminder_without_goal_flag_counts_completion_only() {
        let evaluator = AdherenceEvaluator::default();
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(8, 0), 500)];
        let reminders = vec![reminder(1, Some(10), None)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &reminders, &meals);

        assert_eq!(report.completion_rate(), 1.0);
        assert_eq!(report.goal_achievement_rate(), 0.0);
        assert!(report.has_perfect_adherence());
    }

    #[test]
    fn test_first_matching_meal_wins_per_slot() {
        let evaluator = AdherenceEvaluator::default();
        let early = mock_scheduled_meal(1, MealCategory::Snack, 10, 0);
        let late = mock_scheduled_meal(2, MealCategory::Snack, 11, 0);
        let plan = mock_diet_plan(1, true, vec![late, early]);
        let meals = vec![
            mock_logged_meal(10, MealCategory::Snack, at(10, 30), 150),
            mock_logged_meal(11, MealCategory::Snack, at(10, 45), 180),
        ];

        let report = evaluator.evaluate(monday(), &[plan], &[], &meals);
        assert_eq!(report.completed_meal_ids, vec![1, 2]);
        let pairs: Vec<(i64, i64)> = report
            .matches
            .iter()
            .map(|m| (m.scheduled_meal_id, m.logged_meal_id))
            .collect();
        assert_eq!(pairs, vec![(1, 10), (2, 10)]);
        assert!(report.off_diet_meals.is_empty());
    }

    #[test]
    fn test_one_meal_fulfills_every_matching_slot() {
        let evaluator = AdherenceEvaluator::default();
        let plan = mock_diet_plan(
            1,
            true,
            vec![
                mock_scheduled_meal(1, MealCategory::Snack, 10, 0),
                mock_scheduled_meal(2, MealCategory::Snack, 11, 0),
            ],
        );
        let meals = vec![mock_logged_meal(10, MealCategory::Snack, at(10, 30), 150)];

        let report = evaluator.evaluate(monday(), &[plan], &[], &meals);
        assert_eq!(report.completed_meal_ids, vec![1, 2]);
        assert!(report.missed_meals.is_empty());
        assert_eq!(report.completion_rate(), 1.0);
        assert!(report.has_perfect_adherence());
    }

    #[test]
    fn test_weekday_filter_and_inactive_plans() {
        let evaluator = AdherenceEvaluator::default();
        let mut weekend_only = mock_scheduled_meal(1, MealCategory::Lunch, 12, 0);
        weekend_only.days_of_week = [1, 7].into_iter().collect();
        let weekend_plan = mock_diet_plan(1, true, vec![weekend_only]);
        let inactive = mock_diet_plan(2, false, vec![mock_scheduled_meal(2, MealCategory::Dinner, 19, 0)]);

        let report = evaluator.evaluate(monday(), &[weekend_plan, inactive], &[], &[]);
        assert!(report.scheduled_meals.is_empty());
        assert_eq!(report.completion_rate(), 1.0);
        assert!(report.has_perfect_adherence());
    }

    #[test]
    fn test_goal_missed_breaks_perfect_adherence() {
        let evaluator = AdherenceEvaluator::default();
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(8, 0), 900)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &[], &meals);

        assert_eq!(report.completion_rate(), 1.0);
        assert_eq!(report.goal_missed_ids, vec![1]);
        assert_eq!(report.goal_achievement_rate(), 0.0);
        assert!(!report.has_perfect_adherence());
    }

    #[test]
    fn test_meals_on_other_days_ignored() {
        let evaluator = AdherenceEvaluator::default();
        let yesterday = at(8, 0) - Duration::days(1);
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, yesterday, 500)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(None)], &[], &meals);

        assert_eq!(report.missed_meals.len(), 1);
        assert_eq!(report.off_diet_calories, 0);
    }

    #[test]
    fn test_local_offset_applies_to_matching() {
        let config = AdherenceConfig {
            utc_offset_minutes: -300,
            ..AdherenceConfig::default()
        };
        let evaluator = AdherenceEvaluator::new(config);
        // 13:00 UTC is 08:00 at UTC-5
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(13, 0), 450)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(None)], &[], &meals);
        assert_eq!(report.completed_meal_ids, vec![1]);
    }

    #[test]
    fn test_configurable_window_and_tolerance() {
        let evaluator = AdherenceEvaluator::new(AdherenceConfig {
            match_window_minutes: 30,
            goal_tolerance: 0.05,
            utc_offset_minutes: 0,
        });
        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(8, 45), 540)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &[], &meals);
        assert_eq!(report.missed_meals.len(), 1);

        let meals = vec![mock_logged_meal(10, MealCategory::Breakfast, at(8, 15), 540)];
        let report = evaluator.evaluate(monday(), &[breakfast_plan(Some(500))], &[], &meals);
        assert_eq!(report.goal_missed_ids, vec![1]);
    }

    #[test]
    fn test_evaluate_range_and_streak() {
        let evaluator = AdherenceEvaluator::default();
        let plan = breakfast_plan(None);
        let start = monday();
        let end = start + Duration::days(2);
        let meals = vec![
            mock_logged_meal(10, MealCategory::Breakfast, at(8, 0) + Duration::days(1), 400),
            mock_logged_meal(11, MealCategory::Breakfast, at(8, 10) + Duration::days(2), 400),
        ];

        let reports = evaluator.evaluate_range(start, end, &[plan], &[], &meals);
        assert_eq!(reports.len(), 3);
        assert!(!reports[0].has_perfect_adherence());
        assert_eq!(adherence_streak(&reports), 2);
        assert_eq!(adherence_streak(&[]), 0);
    }

    #[test]
    fn test_scheduled_meals_sorted_by_time() {
        let plan = mock_diet_plan(
            1,
            true,
            vec![
                mock_scheduled_meal(3, MealCategory::Dinner, 19, 0),
                mock_scheduled_meal(1, MealCategory::Breakfast, 7, 30),
            ],
        );
        let meals = scheduled_meals_for_day(monday(), &[plan]);
        let times: Vec<NaiveTime> = meals.iter().map(|m| m.time_of_day).collect();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(19, 0, 0).unwrap()
            ]
        );
    }
}

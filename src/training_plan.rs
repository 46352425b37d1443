//! Weekly distance progression towards a goal run
//!
//! The plan holds the starting pace constant and grows the distance by a
//! fixed weekly rate, one long run per cadence day, landing exactly on the
//! goal distance on the last cadence day before the goal date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::Run;

/// Weekday the long run falls on
pub const CADENCE_WEEKDAY: Weekday = Weekday::Sat;

/// Starting point and target of a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSeed {
    pub start_duration_minutes: f64,
    pub start_distance_miles: f64,
    pub goal_distance_miles: f64,
    pub goal_date: NaiveDate,
}

impl PlanSeed {
    /// Seed a plan from a logged run
    pub fn from_run(run: &Run, goal_distance_miles: f64, goal_date: NaiveDate) -> Self {
        Self {
            start_duration_minutes: run.duration_minutes as f64,
            start_distance_miles: run.distance_miles,
            goal_distance_miles,
            goal_date,
        }
    }

    fn is_computable(&self) -> bool {
        [
            self.start_duration_minutes,
            self.start_distance_miles,
            self.goal_distance_miles,
        ]
        .iter()
        .all(|value| value.is_finite() && *value > 0.0)
    }
}

/// One projected week of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgressionStep {
    /// 1-based
    pub week_number: u32,
    pub date: NaiveDate,
    pub target_distance_miles: f64,
    pub estimated_duration_minutes: u32,
    pub growth_from_start_percent: f64,
    pub is_final: bool,
}

/// A computed plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgression {
    pub seed: PlanSeed,
    pub pace_min_per_mile: f64,
    pub goal_duration_minutes: u32,
    pub weeks_remaining: u32,
    /// Fractional growth per week, e.g. 0.2 for +20%
    pub weekly_growth_rate: f64,
    pub steps: Vec<WeeklyProgressionStep>,
}

impl TrainingProgression {
    /// Share of the goal distance already covered by the starting run, in [0, 1]
    pub fn start_progress(&self) -> f64 {
        (self.seed.start_distance_miles / self.seed.goal_distance_miles).clamp(0.0, 1.0)
    }

    pub fn final_step(&self) -> Option<&WeeklyProgressionStep> {
        self.steps.last()
    }
}

/// Every cadence day from `from` (inclusive when it is one) through `to` inclusive
pub fn cadence_days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let offset = (7 + CADENCE_WEEKDAY.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    let first = from + Duration::days(offset);

    first
        .iter_weeks()
        .take_while(|date| *date <= to)
        .collect()
}

/// Project the plan from `today`.
///
/// Returns `None` when a seed value is not strictly positive or no cadence
/// day remains before the goal date.
pub fn plan_progression(seed: &PlanSeed, today: NaiveDate) -> Option<TrainingProgression> {
    if !seed.is_computable() {
        tracing::debug!(?seed, "Plan seed not computable");
        return None;
    }

    let days = cadence_days(today, seed.goal_date);
    if days.is_empty() {
        tracing::debug!(%today, goal_date = %seed.goal_date, "No cadence days before goal date");
        return None;
    }

    let pace = seed.start_duration_minutes / seed.start_distance_miles;
    let weeks = days.len() as u32;
    let growth_rate =
        (seed.goal_distance_miles / seed.start_distance_miles).powf(1.0 / weeks as f64) - 1.0;

    let mut distance = seed.start_distance_miles;
    let steps: Vec<WeeklyProgressionStep> = days
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let is_final = i + 1 == days.len();
            distance *= 1.0 + growth_rate;
            let target = if is_final {
                seed.goal_distance_miles
            } else {
                distance
            };
            let growth = if i == 0 {
                0.0
            } else {
                (target / seed.start_distance_miles - 1.0) * 100.0
            };

            WeeklyProgressionStep {
                week_number: i as u32 + 1,
                date: *date,
                target_distance_miles: target,
                estimated_duration_minutes: (pace * target).round() as u32,
                growth_from_start_percent: growth,
                is_final,
            }
        })
        .collect();

    tracing::debug!(
        weeks,
        pace,
        growth_rate,
        goal = seed.goal_distance_miles,
        "Training progression planned"
    );

    Some(TrainingProgression {
        seed: *seed,
        pace_min_per_mile: pace,
        goal_duration_minutes: (pace * seed.goal_distance_miles).round() as u32,
        weeks_remaining: weeks,
        weekly_growth_rate: growth_rate,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday; the following Saturday is 2024-06-15
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn seed(duration: f64, distance: f64, goal: f64, goal_date: NaiveDate) -> PlanSeed {
        PlanSeed {
            start_duration_minutes: duration,
            start_distance_miles: distance,
            goal_distance_miles: goal,
            goal_date,
        }
    }

    #[test]
    fn test_cadence_days() {
        let days = cadence_days(today(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 22).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 29).unwrap(),
            ]
        );
        assert!(days.iter().all(|d| d.weekday() == CADENCE_WEEKDAY));
    }

    #[test]
    fn test_cadence_includes_today_and_goal_date() {
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(cadence_days(saturday, saturday), vec![saturday]);
        assert!(cadence_days(today(), NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()).is_empty());
    }

    #[test]
    fn test_plan_lands_exactly_on_goal() {
        let goal_date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap() + Duration::weeks(9);
        let plan = plan_progression(&seed(30.0, 3.0, 22.0, goal_date), today()).unwrap();

        assert_eq!(plan.weeks_remaining, 10);
        assert_eq!(plan.steps.len(), 10);
        assert_eq!(plan.pace_min_per_mile, 10.0);
        assert_eq!(plan.goal_duration_minutes, 220);

        let last = plan.final_step().unwrap();
        assert_eq!(last.target_distance_miles, 22.0);
        assert_eq!(last.estimated_duration_minutes, 220);
        assert!(last.is_final);
        assert_eq!(last.date, goal_date);
        assert_eq!(plan.steps.iter().filter(|s| s.is_final).count(), 1);
    }

    #[test]
    fn test_steps_compound_from_start() {
        let goal_date = NaiveDate::from_ymd_opt(2024, 6, 29).unwrap();
        let plan = plan_progression(&seed(40.0, 4.0, 9.0, goal_date), today()).unwrap();

        assert_eq!(plan.weeks_remaining, 3);
        let r = (9.0f64 / 4.0).powf(1.0 / 3.0) - 1.0;
        assert!((plan.weekly_growth_rate - r).abs() < 1e-12);

        let first = &plan.steps[0];
        assert_eq!(first.week_number, 1);
        assert_eq!(first.growth_from_start_percent, 0.0);
        assert!((first.target_distance_miles - 4.0 * (1.0 + r)).abs() < 1e-9);
        assert_eq!(
            first.estimated_duration_minutes,
            (10.0 * 4.0 * (1.0 + r)).round() as u32
        );

        let second = &plan.steps[1];
        assert!((second.growth_from_start_percent - ((1.0 + r).powi(2) - 1.0) * 100.0).abs() < 1e-6);
        assert!(plan.steps.windows(2).all(|w| w[0].target_distance_miles < w[1].target_distance_miles));
    }

    #[test]
    fn test_non_positive_seed_yields_nothing() {
        let goal_date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert!(plan_progression(&seed(30.0, 0.0, 22.0, goal_date), today()).is_none());
        assert!(plan_progression(&seed(0.0, 3.0, 22.0, goal_date), today()).is_none());
        assert!(plan_progression(&seed(30.0, 3.0, -1.0, goal_date), today()).is_none());
    }

    #[test]
    fn test_goal_in_past_yields_nothing() {
        let goal_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(plan_progression(&seed(30.0, 3.0, 22.0, goal_date), today()).is_none());
    }

    #[test]
    fn test_start_progress_is_clamped() {
        let goal_date = NaiveDate::from_ymd_opt(2024, 6, 29).unwrap();
        let plan = plan_progression(&seed(30.0, 3.0, 12.0, goal_date), today()).unwrap();
        assert_eq!(plan.start_progress(), 0.25);

        let shrinking = plan_progression(&seed(60.0, 8.0, 4.0, goal_date), today()).unwrap();
        assert_eq!(shrinking.start_progress(), 1.0);
        assert_eq!(shrinking.final_step().unwrap().target_distance_miles, 4.0);
    }

    #[test]
    fn test_seed_from_run() {
        let run = Run {
            id: 7,
            date: today().and_hms_opt(6, 0, 0).unwrap(),
            duration_minutes: 45,
            target_heart_rate: crate::models::TargetHeartRate::Bpm(139),
            distance_miles: 4.5,
            final_minute_speed: 6.0,
            total_feet_climbed: 120,
            final_minute_incline: 3.0,
        };
        let seed = PlanSeed::from_run(&run, 22.0, today());
        assert_eq!(seed.start_duration_minutes, 45.0);
        assert_eq!(seed.start_distance_miles, 4.5);
    }
}

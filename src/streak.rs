//! Activity streaks with rest-day tolerance
//!
//! A streak counts days with at least one run, walking back from today.
//! Short gaps do not break it: a day without a run is classified as a rest
//! day when another run follows within [`MAX_REST_GAP_DAYS`] further back.
//! The bridging check is made gap day by gap day, not over the whole history.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::Run;

/// Longest run of missed days a streak survives
pub const MAX_REST_GAP_DAYS: i64 = 2;

/// Runs bucketed by calendar day
pub type RunsByDay<'a> = BTreeMap<NaiveDate, Vec<&'a Run>>;

/// Current streak and the rest days it bridged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub rest_days: BTreeSet<NaiveDate>,
}

impl StreakSummary {
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date)
    }

    pub fn is_active(&self) -> bool {
        self.current_streak > 0
    }
}

/// Bucket runs by the calendar day they were logged on
pub fn group_runs_by_day<'a, I>(runs: I) -> RunsByDay<'a>
where
    I: IntoIterator<Item = &'a Run>,
{
    let mut by_day: RunsByDay<'a> = BTreeMap::new();
    for run in runs {
        by_day.entry(run.day()).or_default().push(run);
    }
    by_day
}

/// Calculate the streak ending at `today`.
pub fn calculate_streak(runs_by_day: &RunsByDay, today: NaiveDate) -> StreakSummary {
    if runs_by_day.is_empty() {
        return StreakSummary::default();
    }

    let has_run = |date: NaiveDate| runs_by_day.contains_key(&date);
    let mut rest_days = BTreeSet::new();

    // Anchor on the most recent run within the tolerance window
    let anchor = (0..=MAX_REST_GAP_DAYS)
        .map(|days_back| today - Duration::days(days_back))
        .find(|date| has_run(*date));

    let Some(anchor) = anchor else {
        tracing::debug!(%today, "No run within the streak window");
        return StreakSummary::default();
    };

    // Missed days between today and the anchor are resting, not breaking
    let mut date = today;
    while date > anchor {
        if !has_run(date) {
            rest_days.insert(date);
        }
        date -= Duration::days(1);
    }

    let mut streak: u32 = 1;
    let mut consecutive_gap_days = 0;
    let mut cursor = anchor;

    loop {
        cursor -= Duration::days(1);

        if has_run(cursor) {
            streak += 1;
            consecutive_gap_days = 0;
            continue;
        }

        consecutive_gap_days += 1;
        if consecutive_gap_days > MAX_REST_GAP_DAYS {
            break;
        }

        let run_follows = (1..=MAX_REST_GAP_DAYS).any(|i| has_run(cursor - Duration::days(i)));
        if run_follows {
            rest_days.insert(cursor);
        } else {
            break;
        }
    }

    tracing::debug!(
        %today,
        %anchor,
        streak,
        rest_days = rest_days.len(),
        "Streak calculated"
    );

    StreakSummary {
        current_streak: streak,
        rest_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetHeartRate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn runs_on(days_back: &[i64]) -> Vec<Run> {
        days_back
            .iter()
            .enumerate()
            .map(|(i, back)| Run {
                id: i as i64 + 1,
                date: (today() - Duration::days(*back)).and_hms_opt(18, 30, 0).unwrap(),
                duration_minutes: 40,
                target_heart_rate: TargetHeartRate::Bpm(139),
                distance_miles: 4.0,
                final_minute_speed: 6.5,
                total_feet_climbed: 100,
                final_minute_incline: 2.0,
            })
            .collect()
    }

    fn days(back: &[i64]) -> BTreeSet<NaiveDate> {
        back.iter().map(|b| today() - Duration::days(*b)).collect()
    }

    fn streak_for(days_back: &[i64]) -> StreakSummary {
        let runs = runs_on(days_back);
        let by_day = group_runs_by_day(&runs);
        calculate_streak(&by_day, today())
    }

    #[test]
    fn test_empty_history() {
        let summary = calculate_streak(&RunsByDay::new(), today());
        assert_eq!(summary, StreakSummary::default());
        assert!(!summary.is_active());
    }

    #[test]
    fn test_no_recent_run_is_zero() {
        let summary = streak_for(&[3, 4, 5, 6]);
        assert_eq!(summary.current_streak, 0);
        assert!(summary.rest_days.is_empty());
    }

    #[test]
    fn test_single_gap_is_bridged() {
        let summary = streak_for(&[0, 1, 3]);
        assert_eq!(summary.current_streak, 3);
        assert_eq!(summary.rest_days, days(&[2]));
        assert!(summary.is_rest_day(today() - Duration::days(2)));
    }

    #[test]
    fn test_leading_gap_days_are_rest_days() {
        let summary = streak_for(&[2, 3, 4]);
        assert_eq!(summary.current_streak, 3);
        assert_eq!(summary.rest_days, days(&[0, 1]));
    }

    #[test]
    fn test_two_day_gap_is_bridged() {
        let summary = streak_for(&[0, 3, 4]);
        assert_eq!(summary.current_streak, 3);
        assert_eq!(summary.rest_days, days(&[1, 2]));
    }

    #[test]
    fn test_three_day_gap_breaks() {
        let summary = streak_for(&[0, 1, 5, 6]);
        assert_eq!(summary.current_streak, 2);
        assert!(summary.rest_days.is_empty());
    }

    #[test]
    fn test_multiple_runs_per_day_count_once() {
        let summary = streak_for(&[0, 0, 1, 1, 1]);
        assert_eq!(summary.current_streak, 2);
    }

    #[test]
    fn test_grouping_by_calendar_day() {
        let runs = runs_on(&[0, 0, 2]);
        let by_day = group_runs_by_day(&runs);
        assert_eq!(by_day.len(), 2);
        assert_eq!(by_day[&today()].len(), 2);
    }

    #[test]
    fn test_streak_crosses_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let runs: Vec<Run> = [0, 1, 2]
            .iter()
            .map(|back| Run {
                id: *back + 1,
                date: (today - Duration::days(*back)).and_hms_opt(7, 0, 0).unwrap(),
                duration_minutes: 30,
                target_heart_rate: TargetHeartRate::Bpm(130),
                distance_miles: 3.0,
                final_minute_speed: 6.0,
                total_feet_climbed: 0,
                final_minute_incline: 0.0,
            })
            .collect();
        let summary = calculate_streak(&group_runs_by_day(&runs), today);
        assert_eq!(summary.current_streak, 3);
    }
}

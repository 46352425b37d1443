//! Aggregate statistics over a selection of runs
//!
//! Callers choose the runs (date range, heart-rate group, calendar month)
//! and every reduction here falls back to zero on an empty selection.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Run, TargetHeartRate};
use crate::streak::{RunsByDay, StreakSummary};

/// Fixed unit conversion used for incline
pub const FEET_PER_MILE: f64 = 5280.0;

/// Totals, averages and single-run bests for a set of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: usize,
    pub total_duration_minutes: u64,
    pub total_miles: f64,
    pub total_feet_climbed: u64,
    /// Zero when no time was logged
    pub avg_speed_mph: f64,
    /// Zero when no distance was logged
    pub avg_pace_min_per_mile: f64,
    pub best_single_run_miles: f64,
    pub best_single_run_duration: u32,
    /// Fastest pace among runs with distance; `None` renders as a placeholder
    pub best_pace: Option<f64>,
    pub most_elevation_single_run: u32,
}

impl RunStats {
    pub fn from_runs<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a Run>,
    {
        let mut stats = RunStats::default();

        for run in runs {
            stats.total_runs += 1;
            stats.total_duration_minutes += u64::from(run.duration_minutes);
            stats.total_miles += run.distance_miles;
            stats.total_feet_climbed += u64::from(run.total_feet_climbed);

            stats.best_single_run_miles = stats.best_single_run_miles.max(run.distance_miles);
            stats.best_single_run_duration = stats.best_single_run_duration.max(run.duration_minutes);
            stats.most_elevation_single_run =
                stats.most_elevation_single_run.max(run.total_feet_climbed);

            if let Some(pace) = run.pace() {
                stats.best_pace = Some(stats.best_pace.map_or(pace, |best| best.min(pace)));
            }
        }

        if stats.total_duration_minutes > 0 {
            stats.avg_speed_mph = stats.total_miles * 60.0 / stats.total_duration_minutes as f64;
        }
        if stats.total_miles > 0.0 {
            stats.avg_pace_min_per_mile = stats.total_duration_minutes as f64 / stats.total_miles;
        }

        tracing::debug!(runs = stats.total_runs, miles = stats.total_miles, "Run stats aggregated");
        stats
    }

    pub fn is_empty(&self) -> bool {
        self.total_runs == 0
    }
}

/// Totals for the runs of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub run_ids: Vec<i64>,
    pub total_distance_miles: f64,
    pub total_duration_minutes: u64,
    pub total_elevation_feet: u64,
    pub avg_pace_min_per_mile: f64,
    /// Climb over distance as a percent grade, derived rather than stored
    pub avg_incline_percent: f64,
}

impl DaySummary {
    /// Summarise a day's runs; `None` when the day has none
    pub fn from_runs(date: NaiveDate, runs: &[&Run]) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }

        let total_distance_miles: f64 = runs.iter().map(|run| run.distance_miles).sum();
        let total_duration_minutes: u64 = runs
            .iter()
            .map(|run| u64::from(run.duration_minutes))
            .sum();
        let total_elevation_feet: u64 = runs
            .iter()
            .map(|run| u64::from(run.total_feet_climbed))
            .sum();

        let (avg_pace_min_per_mile, avg_incline_percent) = if total_distance_miles > 0.0 {
            (
                total_duration_minutes as f64 / total_distance_miles,
                total_elevation_feet as f64 / (total_distance_miles * FEET_PER_MILE) * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        Some(DaySummary {
            date,
            run_ids: runs.iter().map(|run| run.id).collect(),
            total_distance_miles,
            total_duration_minutes,
            total_elevation_feet,
            avg_pace_min_per_mile,
            avg_incline_percent,
        })
    }
}

/// Averages derived from a single run's stored fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: i64,
    /// Zero when no time was logged
    pub avg_speed_mph: f64,
    /// `None` for a zero-distance run
    pub avg_pace_min_per_mile: Option<f64>,
    /// Climb over distance as a percent grade; zero without distance
    pub avg_incline_percent: f64,
}

impl RunSummary {
    pub fn from_run(run: &Run) -> Self {
        let avg_speed_mph = if run.duration_minutes > 0 {
            run.distance_miles * 60.0 / run.duration_minutes as f64
        } else {
            0.0
        };
        let avg_incline_percent = if run.distance_miles > 0.0 {
            run.total_feet_climbed as f64 / (run.distance_miles * FEET_PER_MILE) * 100.0
        } else {
            0.0
        };

        RunSummary {
            run_id: run.id,
            avg_speed_mph,
            avg_pace_min_per_mile: run.pace(),
            avg_incline_percent,
        }
    }
}

/// First day of the week for "this week" ranges and calendar grids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Days between the start of the week and `date`
    pub fn offset(&self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }
}

/// Summary date range choices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateRangePreset {
    #[default]
    AllTime,
    ThisWeek,
    ThisMonth,
    ThisYear,
    Custom,
}

impl FromStr for DateRangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "all" | "all-time" => Ok(DateRangePreset::AllTime),
            "week" | "this-week" => Ok(DateRangePreset::ThisWeek),
            "month" | "this-month" => Ok(DateRangePreset::ThisMonth),
            "year" | "this-year" => Ok(DateRangePreset::ThisYear),
            "custom" => Ok(DateRangePreset::Custom),
            _ => Err(format!("Unknown date range preset: {}", s)),
        }
    }
}

/// Inclusive range of calendar days; open bounds are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Resolve a preset relative to `today`. `custom` is only used by the custom preset.
    pub fn for_preset(
        preset: DateRangePreset,
        today: NaiveDate,
        week_start: WeekStart,
        custom: DateRange,
    ) -> Self {
        match preset {
            DateRangePreset::AllTime => DateRange::default(),
            DateRangePreset::ThisWeek => DateRange::new(
                Some(today - Duration::days(week_start.offset(today) as i64)),
                Some(today),
            ),
            DateRangePreset::ThisMonth => DateRange::new(today.with_day(1), Some(today)),
            DateRangePreset::ThisYear => DateRange::new(today.with_ordinal(1), Some(today)),
            DateRangePreset::Custom => custom,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Selection of runs for a summary: a date range and optionally one heart-rate group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFilter {
    pub date_range: DateRange,
    pub heart_rate: Option<TargetHeartRate>,
}

impl RunFilter {
    pub fn matches(&self, run: &Run) -> bool {
        self.date_range.contains(run.day())
            && self.heart_rate.map_or(true, |hr| run.target_heart_rate == hr)
    }

    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|run| self.matches(run)).collect()
    }
}

/// One day cell of a month calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub summary: Option<DaySummary>,
    pub is_rest_day: bool,
}

impl CalendarDay {
    pub fn has_run(&self) -> bool {
        self.summary.is_some()
    }
}

/// A month of day summaries with the month's aggregate stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st in a week-aligned grid
    pub leading_blank_days: u32,
    pub days: Vec<CalendarDay>,
    /// `None` when nothing was logged in the month
    pub stats: Option<RunStats>,
}

impl MonthCalendar {
    /// Build the calendar for `year`/`month` (1-12); `None` for an invalid month
    pub fn build(
        runs_by_day: &RunsByDay,
        streak: &StreakSummary,
        year: i32,
        month: u32,
        week_start: WeekStart,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        let days: Vec<CalendarDay> = first
            .iter_days()
            .take_while(|date| *date < next_month)
            .map(|date| CalendarDay {
                day: date.day(),
                date,
                summary: runs_by_day
                    .get(&date)
                    .and_then(|runs| DaySummary::from_runs(date, runs)),
                is_rest_day: streak.is_rest_day(date),
            })
            .collect();

        let month_runs: Vec<&Run> = runs_by_day
            .range(first..next_month)
            .flat_map(|(_, runs)| runs.iter().copied())
            .collect();
        let stats = if month_runs.is_empty() {
            None
        } else {
            Some(RunStats::from_runs(month_runs))
        };

        Some(MonthCalendar {
            year,
            month,
            leading_blank_days: week_start.offset(first),
            days,
            stats,
        })
    }
}

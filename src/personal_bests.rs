//! Personal-best attribution within heart-rate groups
//!
//! Runs are only ever compared with runs logged at the same target heart
//! rate (or in the same category). Two policy exclusions apply to the
//! per-group PB flags: a run with no climb cannot hold the elevation PB and
//! a run at the placeholder duration cannot hold the duration PB.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use crate::models::{Run, TargetHeartRate};

/// Duration the logging form defaults to; runs left at it are not timed efforts
pub const UNTIMED_DURATION_MINUTES: u32 = 30;

/// Default number of entries in a PB history ranking
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Which PBs a single run holds in its group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPersonalBests {
    pub distance: bool,
    pub pace: bool,
    pub elevation: bool,
    pub duration: bool,
}

impl RunPersonalBests {
    pub fn has_any(&self) -> bool {
        self.distance || self.pace || self.elevation || self.duration
    }

    /// Short labels for the PBs held, in display order
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if self.distance {
            badges.push("distance");
        }
        if self.pace {
            badges.push("pace");
        }
        if self.elevation {
            badges.push("elevation");
        }
        if self.duration {
            badges.push("duration");
        }
        badges
    }
}

/// Compute PB flags for every run, keyed by run id.
///
/// Runs holding no PB are left out of the map.
pub fn calculate_personal_bests(runs: &[Run]) -> HashMap<i64, RunPersonalBests> {
    let mut groups: BTreeMap<TargetHeartRate, Vec<&Run>> = BTreeMap::new();
    for run in runs {
        groups.entry(run.target_heart_rate).or_default().push(run);
    }

    let mut result = HashMap::new();

    for (heart_rate, group) in &groups {
        let best_distance = first_max_by(group.iter().copied(), |run| run.distance_miles);
        let best_pace = first_max_by(
            group.iter().copied().filter(|run| run.distance_miles > 0.0),
            |run| -(run.duration_minutes as f64 / run.distance_miles),
        );
        let best_elevation = first_max_by(
            group.iter().copied().filter(|run| run.total_feet_climbed > 0),
            |run| run.total_feet_climbed as f64,
        );
        let best_duration = first_max_by(
            group
                .iter()
                .copied()
                .filter(|run| run.duration_minutes != UNTIMED_DURATION_MINUTES),
            |run| run.duration_minutes as f64,
        );

        let holder = |best: Option<&Run>, run: &Run| best.map_or(false, |b| b.id == run.id);

        for &run in group {
            let flags = RunPersonalBests {
                distance: holder(best_distance, run),
                pace: holder(best_pace, run),
                elevation: holder(best_elevation, run),
                duration: holder(best_duration, run),
            };
            if flags.has_any() {
                result.insert(run.id, flags);
            }
        }

        tracing::trace!(heart_rate = %heart_rate, runs = group.len(), "PB group evaluated");
    }

    tracing::debug!(groups = groups.len(), holders = result.len(), "Personal bests calculated");
    result
}

/// First run with the largest key; later runs must be strictly larger to win.
fn first_max_by<'a, I, F>(runs: I, key: F) -> Option<&'a Run>
where
    I: Iterator<Item = &'a Run>,
    F: Fn(&Run) -> f64,
{
    let mut best: Option<(&Run, f64)> = None;
    for run in runs {
        let value = key(run);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((run, value)),
        }
    }
    best.map(|(run, _)| run)
}

/// Metric a PB history ranking is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PbCategory {
    LongestRun,
    BestPace,
    MostElevation,
    LongestDuration,
}

impl PbCategory {
    pub fn title(&self) -> &'static str {
        match self {
            PbCategory::LongestRun => "Longest Runs",
            PbCategory::BestPace => "Best Pace Runs",
            PbCategory::MostElevation => "Most Elevation Runs",
            PbCategory::LongestDuration => "Longest Duration Runs",
        }
    }

    /// Metric value for a run; zero-distance runs have an infinite pace
    pub fn value(&self, run: &Run) -> f64 {
        match self {
            PbCategory::LongestRun => run.distance_miles,
            PbCategory::BestPace => run.pace().unwrap_or(f64::INFINITY),
            PbCategory::MostElevation => run.total_feet_climbed as f64,
            PbCategory::LongestDuration => run.duration_minutes as f64,
        }
    }

    fn lower_is_better(&self) -> bool {
        matches!(self, PbCategory::BestPace)
    }

    fn is_improvement(&self, value: f64, current_best: f64) -> bool {
        if self.lower_is_better() {
            value < current_best
        } else {
            value > current_best
        }
    }

    fn initial_best(&self) -> f64 {
        if self.lower_is_better() {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

impl FromStr for PbCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "longest" | "distance" | "longest-run" => Ok(PbCategory::LongestRun),
            "pace" | "best-pace" => Ok(PbCategory::BestPace),
            "elevation" | "most-elevation" => Ok(PbCategory::MostElevation),
            "duration" | "longest-duration" => Ok(PbCategory::LongestDuration),
            _ => Err(format!("Unknown PB category: {}", s)),
        }
    }
}

/// One line of a PB history ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbHistoryEntry {
    /// 1-based position in the ranking
    pub rank: usize,
    pub run: Run,
    pub value: f64,
    /// The run beat every earlier run at the time it was logged
    pub set_pb_when_logged: bool,
}

/// Rank runs best-first for one category and mark the runs that set a new
/// best when they were logged.
pub fn pb_history(runs: &[Run], category: PbCategory, limit: usize) -> Vec<PbHistoryEntry> {
    let mut chronological: Vec<&Run> = runs.iter().collect();
    chronological.sort_by_key(|run| run.date);

    let mut current_best = category.initial_best();
    let mut record_setters = HashSet::new();
    for run in chronological {
        let value = category.value(run);
        if category.is_improvement(value, current_best) {
            current_best = value;
            record_setters.insert(run.id);
        }
    }

    let mut ranked: Vec<&Run> = runs
        .iter()
        .filter(|run| category != PbCategory::BestPace || run.distance_miles > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        let ordering = category
            .value(a)
            .partial_cmp(&category.value(b))
            .unwrap_or(Ordering::Equal);
        if category.lower_is_better() {
            ordering
        } else {
            ordering.reverse()
        }
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, run)| PbHistoryEntry {
            rank: index + 1,
            run: run.clone(),
            value: category.value(run),
            set_pb_when_logged: record_setters.contains(&run.id),
        })
        .collect()
}

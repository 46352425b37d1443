use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Non heart-rate groupings a run can be logged under.
///
/// These are stored as reserved negative values in the heart-rate column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Category {
    /// Race efforts (-1)
    Races,
    /// Runs done with a specific training partner (-2)
    Person,
    /// Anything else (-3)
    Other,
    /// Any other negative value found in storage
    Unnamed(i32),
}

impl Category {
    pub const RACES_RAW: i32 = -1;
    pub const PERSON_RAW: i32 = -2;
    pub const OTHER_RAW: i32 = -3;

    /// Named categories offered when logging a run
    pub const NAMED: [Category; 3] = [Category::Races, Category::Person, Category::Other];

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::RACES_RAW => Category::Races,
            Self::PERSON_RAW => Category::Person,
            Self::OTHER_RAW => Category::Other,
            other => Category::Unnamed(other),
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            Category::Races => Self::RACES_RAW,
            Category::Person => Self::PERSON_RAW,
            Category::Other => Self::OTHER_RAW,
            Category::Unnamed(raw) => *raw,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Category::Races => "Races".to_string(),
            Category::Person => "Person".to_string(),
            Category::Other => "Other".to_string(),
            Category::Unnamed(raw) => format!("Category {}", raw),
        }
    }
}

/// Grouping key of a run: a target heart rate in bpm, or a category.
///
/// Equality, hashing and ordering all follow the raw storage value, so
/// grouping behaves exactly like the integer column it is persisted as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TargetHeartRate {
    Bpm(u16),
    Category(Category),
}

impl TargetHeartRate {
    /// Decode a stored value. Negative values are categories; the sign is the only tag.
    ///
    /// `None` for a bpm too large to be a heart rate.
    pub fn from_raw(raw: i32) -> Option<Self> {
        if raw < 0 {
            Some(TargetHeartRate::Category(Category::from_raw(raw)))
        } else {
            u16::try_from(raw).ok().map(TargetHeartRate::Bpm)
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            TargetHeartRate::Bpm(bpm) => i32::from(*bpm),
            TargetHeartRate::Category(category) => category.raw(),
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, TargetHeartRate::Category(_))
    }
}

impl TryFrom<i32> for TargetHeartRate {
    type Error = String;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        TargetHeartRate::from_raw(raw).ok_or_else(|| format!("Heart rate out of range: {}", raw))
    }
}

impl From<TargetHeartRate> for i32 {
    fn from(value: TargetHeartRate) -> Self {
        value.raw()
    }
}

impl PartialEq for TargetHeartRate {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for TargetHeartRate {}

impl Hash for TargetHeartRate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

impl PartialOrd for TargetHeartRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TargetHeartRate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw().cmp(&other.raw())
    }
}

impl fmt::Display for TargetHeartRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetHeartRate::Bpm(bpm) => write!(f, "{} bpm", bpm),
            TargetHeartRate::Category(category) => write!(f, "{}", category.label()),
        }
    }
}

impl FromStr for TargetHeartRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        match trimmed.as_str() {
            "races" | "race" => Ok(TargetHeartRate::Category(Category::Races)),
            "person" => Ok(TargetHeartRate::Category(Category::Person)),
            "other" => Ok(TargetHeartRate::Category(Category::Other)),
            _ => {
                let digits = trimmed.trim_end_matches("bpm").trim();
                digits
                    .parse::<i32>()
                    .ok()
                    .and_then(TargetHeartRate::from_raw)
                    .ok_or_else(|| format!("Invalid target heart rate: {}", s))
            }
        }
    }
}

/// One logged treadmill session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Repository-assigned identifier
    pub id: i64,

    /// Local wall-clock time the run was logged for
    pub date: NaiveDateTime,

    pub duration_minutes: u32,

    pub target_heart_rate: TargetHeartRate,

    pub distance_miles: f64,

    /// Speed during the last minute (mph)
    pub final_minute_speed: f64,

    pub total_feet_climbed: u32,

    /// Incline during the last minute (percent grade)
    pub final_minute_incline: f64,
}

impl Run {
    /// Calendar day the run counts towards
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Minutes per mile, or `None` for a zero-distance run
    pub fn pace(&self) -> Option<f64> {
        if self.distance_miles > 0.0 {
            Some(self.duration_minutes as f64 / self.distance_miles)
        } else {
            None
        }
    }
}

/// A run that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub date: NaiveDateTime,
    pub duration_minutes: u32,
    pub target_heart_rate: TargetHeartRate,
    pub distance_miles: f64,
    pub final_minute_speed: f64,
    pub total_feet_climbed: u32,
    pub final_minute_incline: f64,
}

impl NewRun {
    /// Attach a repository id
    pub fn with_id(self, id: i64) -> Run {
        Run {
            id,
            date: self.date,
            duration_minutes: self.duration_minutes,
            target_heart_rate: self.target_heart_rate,
            distance_miles: self.distance_miles,
            final_minute_speed: self.final_minute_speed,
            total_feet_climbed: self.total_feet_climbed,
            final_minute_incline: self.final_minute_incline,
        }
    }

    /// Check the fields a stored run must satisfy
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_minutes == 0 {
            return Err("duration must be at least one minute".to_string());
        }
        if !self.distance_miles.is_finite() || self.distance_miles < 0.0 {
            return Err(format!("invalid distance: {}", self.distance_miles));
        }
        if !self.final_minute_speed.is_finite() {
            return Err(format!("invalid final minute speed: {}", self.final_minute_speed));
        }
        if !self.final_minute_incline.is_finite() {
            return Err(format!("invalid final minute incline: {}", self.final_minute_incline));
        }
        Ok(())
    }
}

impl From<Run> for NewRun {
    fn from(run: Run) -> Self {
        NewRun {
            date: run.date,
            duration_minutes: run.duration_minutes,
            target_heart_rate: run.target_heart_rate,
            distance_miles: run.distance_miles,
            final_minute_speed: run.final_minute_speed,
            total_feet_climbed: run.total_feet_climbed,
            final_minute_incline: run.final_minute_incline,
        }
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::models::{Category, TargetHeartRate};
use crate::stats::{DateRange, DateRangePreset, WeekStart};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Heart rates offered as quick picks when logging a run
    pub preset_heart_rates: Vec<TargetHeartRate>,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where runs are stored
    pub storage: StorageSettings,

    /// Logging output
    pub logging: LogConfig,

    /// Last used summary filter
    pub summary: SummarySettings,

    /// Training plan goal
    pub plan: PlanSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: PathBuf,
}

/// Persisted summary filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub date_preset: DateRangePreset,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
    pub week_start: WeekStart,
}

impl SummarySettings {
    pub fn custom_range(&self) -> DateRange {
        DateRange::new(self.custom_start, self.custom_end)
    }
}

/// Weeks from today to the goal run when no goal date is configured
pub const DEFAULT_GOAL_WEEKS: i64 = 16;

/// Goal the training plan works towards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Heart-rate group whose latest run seeds the plan
    pub heart_rate: TargetHeartRate,
    pub goal_distance_miles: f64,
    /// Unset means [`DEFAULT_GOAL_WEEKS`] from the day the plan is computed
    pub goal_date: Option<NaiveDate>,
}

impl PlanSettings {
    pub fn goal_date_or_default(&self, today: NaiveDate) -> NaiveDate {
        self.goal_date
            .unwrap_or_else(|| today + Duration::weeks(DEFAULT_GOAL_WEEKS))
    }
}

/// A heart-rate group offered when logging or filtering runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeartRateChoice {
    pub heart_rate: TargetHeartRate,
    /// Listed in `preset_heart_rates`
    pub preset: bool,
    /// At least one stored run uses it
    pub logged: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            preset_heart_rates: [120, 130, 139, 140, 160]
                .into_iter()
                .map(TargetHeartRate::Bpm)
                .collect(),
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            storage: StorageSettings::default(),
            logging: LogConfig::default(),
            summary: SummarySettings::default(),
            plan: PlanSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: AppConfig::config_dir().join("runs.db"),
        }
    }
}

impl Default for PlanSettings {
    fn default() -> Self {
        PlanSettings {
            heart_rate: TargetHeartRate::Bpm(139),
            goal_distance_miles: 22.0,
            goal_date: None,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Directory holding the config file and, by default, the database
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".treadlog")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults.
    ///
    /// A missing file is normal on first run; an unreadable one is reported.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring invalid config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Presets, the named categories and every logged group, each once.
    ///
    /// Heart rates come first in ascending bpm, then categories in storage order.
    pub fn heart_rate_choices(&self, logged: &[TargetHeartRate]) -> Vec<HeartRateChoice> {
        let candidates = self
            .preset_heart_rates
            .iter()
            .copied()
            .chain(Category::NAMED.into_iter().map(TargetHeartRate::Category))
            .chain(logged.iter().copied());

        let mut choices: Vec<HeartRateChoice> = Vec::new();
        for heart_rate in candidates {
            if choices.iter().any(|choice| choice.heart_rate == heart_rate) {
                continue;
            }
            choices.push(HeartRateChoice {
                heart_rate,
                preset: self.preset_heart_rates.contains(&heart_rate),
                logged: logged.contains(&heart_rate),
            });
        }

        choices.sort_by_key(|choice| {
            (
                choice.heart_rate.is_category(),
                choice.heart_rate.raw().unsigned_abs(),
            )
        });
        choices
    }

    /// Remember the summary filter for the next session
    pub fn remember_summary(
        &mut self,
        preset: DateRangePreset,
        custom: DateRange,
    ) {
        self.summary.date_preset = preset;
        if preset == DateRangePreset::Custom {
            self.summary.custom_start = custom.start;
            self.summary.custom_end = custom.end;
        }
        self.metadata.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training_plan::{plan_progression, PlanSeed};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.plan.heart_rate, TargetHeartRate::Bpm(139));
        assert_eq!(config.plan.goal_distance_miles, 22.0);
        assert_eq!(config.plan.goal_date, None);
        let presets: Vec<i32> = config.preset_heart_rates.iter().map(|hr| hr.raw()).collect();
        assert_eq!(presets, vec![120, 130, 139, 140, 160]);
        assert_eq!(config.summary.date_preset, DateRangePreset::AllTime);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig::default();
        config.plan.heart_rate = TargetHeartRate::Category(Category::Races);
        config.summary.week_start = WeekStart::Monday;

        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.remember_summary(
            DateRangePreset::Custom,
            DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 1, 31)),
        );
        original.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.summary.date_preset, DateRangePreset::Custom);
        assert_eq!(loaded.summary.custom_range(), original.summary.custom_range());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[plan]\ngoal_distance_miles = 13.1\n").unwrap();

        let config = AppConfig::load_or_default_from(&config_path);
        assert_eq!(config.plan.goal_distance_miles, 13.1);
        assert_eq!(config.plan.heart_rate, TargetHeartRate::Bpm(139));
        assert_eq!(config.preset_heart_rates.len(), 5);
    }

    #[test]
    fn test_missing_or_invalid_file_falls_back() {
        let temp_dir = tempdir().unwrap();
        let missing = AppConfig::load_or_default_from(temp_dir.path().join("absent.toml"));
        assert_eq!(missing.plan, PlanSettings::default());

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "plan = [").unwrap();
        assert!(AppConfig::load_from_file(&broken).is_err());
        assert_eq!(AppConfig::load_or_default_from(&broken).plan, PlanSettings::default());
    }

    #[test]
    fn test_unset_goal_date_stays_ahead_of_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut plan = PlanSettings::default();
        assert_eq!(
            plan.goal_date_or_default(today),
            NaiveDate::from_ymd_opt(2027, 2, 8).unwrap()
        );

        let seed = PlanSeed {
            start_duration_minutes: 30.0,
            start_distance_miles: 3.0,
            goal_distance_miles: plan.goal_distance_miles,
            goal_date: plan.goal_date_or_default(today),
        };
        let progression = plan_progression(&seed, today).unwrap();
        assert_eq!(progression.weeks_remaining, 16);

        let fixed = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
        plan.goal_date = Some(fixed);
        assert_eq!(plan.goal_date_or_default(today), fixed);
    }

    #[test]
    fn test_heart_rate_choices() {
        let config = AppConfig::default();
        let logged = [
            TargetHeartRate::Bpm(139),
            TargetHeartRate::Bpm(150),
            TargetHeartRate::Category(Category::Unnamed(-9)),
            TargetHeartRate::Category(Category::Races),
        ];
        let choices = config.heart_rate_choices(&logged);

        let order: Vec<i32> = choices.iter().map(|choice| choice.heart_rate.raw()).collect();
        assert_eq!(order, vec![120, 130, 139, 140, 150, 160, -1, -2, -3, -9]);

        let flags = |raw: i32| {
            let choice = choices
                .iter()
                .find(|choice| choice.heart_rate.raw() == raw)
                .unwrap();
            (choice.preset, choice.logged)
        };
        assert_eq!(flags(139), (true, true));
        assert_eq!(flags(150), (false, true));
        assert_eq!(flags(120), (true, false));
        assert_eq!(flags(-2), (false, false));
        assert_eq!(flags(-9), (false, true));
    }
}

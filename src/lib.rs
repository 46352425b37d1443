// Library interface for treadlog modules
// This allows integration tests and benches to access the core functionality

pub mod config;
pub mod database;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod personal_bests;
pub mod stats;
pub mod streak;
pub mod training_plan;

// Re-export commonly used types for convenience
pub use models::*;
pub use database::{InMemoryRunRepository, RunRepository, SqliteRunRepository};
pub use error::{DatabaseError, TreadlogError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use personal_bests::{calculate_personal_bests, pb_history, PbCategory, RunPersonalBests};
pub use stats::{
    DateRange, DateRangePreset, DaySummary, MonthCalendar, RunFilter, RunStats, RunSummary,
};
pub use streak::{calculate_streak, group_runs_by_day, StreakSummary};
pub use training_plan::{plan_progression, PlanSeed, TrainingProgression};

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use treadlog::config::{AppConfig, HeartRateChoice};
use treadlog::database::{RunRepository, SqliteRunRepository};
use treadlog::error::{DatabaseError, ErrorSeverity, TreadlogError};
use treadlog::format::{format_duration, format_growth, format_optional_pace, format_pace};
use treadlog::logging::{init_logging, LogFormat, LogLevel};
use treadlog::models::{NewRun, Run, TargetHeartRate};
use treadlog::personal_bests::{
    calculate_personal_bests, pb_history, PbCategory, PbHistoryEntry, RunPersonalBests,
    DEFAULT_HISTORY_LIMIT,
};
use treadlog::stats::{
    DateRange, DateRangePreset, MonthCalendar, RunFilter, RunStats, RunSummary, WeekStart,
};
use treadlog::streak::{calculate_streak, group_runs_by_day, StreakSummary};
use treadlog::training_plan::{plan_progression, PlanSeed, TrainingProgression};

/// treadlog - Treadmill run log and analytics CLI
///
/// Logs treadmill runs grouped by target heart rate and reports personal
/// bests, activity streaks, summaries and a progression plan towards a goal run.
#[derive(Parser)]
#[command(name = "treadlog")]
#[command(version = "0.1.0")]
#[command(about = "Treadmill run log and analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Use this database instead of the configured one
    #[arg(long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Override the configured log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Override the configured log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new run
    Add {
        /// When the run happened (YYYY-MM-DD [HH:MM]); defaults to now
        #[arg(long, value_parser = parse_date_time)]
        date: Option<NaiveDateTime>,

        /// Duration in minutes
        #[arg(short = 't', long)]
        duration: u32,

        /// Target heart rate in bpm, or a category (races, person, other)
        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: TargetHeartRate,

        /// Distance in miles
        #[arg(short, long)]
        distance: f64,

        /// Speed during the final minute (mph)
        #[arg(long, default_value_t = 0.0)]
        speed: f64,

        /// Total feet climbed
        #[arg(long, default_value_t = 0)]
        feet: u32,

        /// Incline during the final minute (percent)
        #[arg(long, default_value_t = 0.0)]
        incline: f64,
    },

    /// Replace fields of a logged run
    Edit {
        /// Run id
        id: i64,

        #[arg(long, value_parser = parse_date_time)]
        date: Option<NaiveDateTime>,

        #[arg(short = 't', long)]
        duration: Option<u32>,

        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: Option<TargetHeartRate>,

        #[arg(short, long)]
        distance: Option<f64>,

        #[arg(long)]
        speed: Option<f64>,

        #[arg(long)]
        feet: Option<u32>,

        #[arg(long)]
        incline: Option<f64>,
    },

    /// Delete a logged run
    Delete {
        /// Run id
        id: i64,
    },

    /// Details of one run: averages, derived incline and the PBs it holds
    Show {
        /// Run id
        id: i64,
    },

    /// Heart-rate groups to log under: presets, categories and those already used
    HeartRates,

    /// List runs with their personal bests
    List {
        /// Only runs in this heart-rate group
        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: Option<TargetHeartRate>,

        /// Number of recent runs to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Totals and averages for a date range
    Summary {
        #[command(flatten)]
        range: RangeArgs,

        /// Only runs in this heart-rate group
        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: Option<TargetHeartRate>,
    },

    /// Month calendar with the current streak and rest days
    Calendar {
        #[arg(long)]
        year: Option<i32>,

        /// Month number (1-12)
        #[arg(long)]
        month: Option<u32>,
    },

    /// Ranked runs for one PB category
    History {
        /// distance, pace, elevation or duration
        category: PbCategory,

        #[command(flatten)]
        range: RangeArgs,

        /// Only runs in this heart-rate group
        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: Option<TargetHeartRate>,

        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },

    /// Weekly distance progression towards the goal run
    Plan {
        /// Heart-rate group whose latest run seeds the plan
        #[arg(long = "hr", allow_hyphen_values = true)]
        heart_rate: Option<TargetHeartRate>,

        /// Goal distance in miles
        #[arg(long)]
        goal_distance: Option<f64>,

        /// Goal date (YYYY-MM-DD); defaults to the configured date or 16 weeks out
        #[arg(long)]
        goal_date: Option<NaiveDate>,

        /// Starting duration in minutes, instead of the latest run
        #[arg(long, requires = "start_distance")]
        start_duration: Option<f64>,

        /// Starting distance in miles, instead of the latest run
        #[arg(long, requires = "start_duration")]
        start_distance: Option<f64>,

        /// Remember the heart rate and goal in the config file
        #[arg(long)]
        save: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Date range flags; without any, the saved summary filter applies
#[derive(Args)]
struct RangeArgs {
    /// all-time, this-week, this-month, this-year or custom
    #[arg(short, long)]
    preset: Option<DateRangePreset>,

    /// Custom range start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Custom range end (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl RangeArgs {
    fn is_explicit(&self) -> bool {
        self.preset.is_some() || self.from.is_some() || self.to.is_some()
    }

    /// Preset and custom bounds to use, given the saved summary filter
    fn resolve(&self, config: &AppConfig) -> (DateRangePreset, DateRange) {
        let preset = match (self.preset, self.from, self.to) {
            (Some(preset), _, _) => preset,
            (None, None, None) => config.summary.date_preset,
            _ => DateRangePreset::Custom,
        };
        let custom = if self.from.is_some() || self.to.is_some() {
            DateRange::new(self.from, self.to)
        } else {
            config.summary.custom_range()
        };
        (preset, custom)
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to disk
    Init,
    /// Print the config file location
    Path,
}

fn parse_date_time(s: &str) -> std::result::Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(date_time);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD [HH:MM]", s))
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        report_error(error);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default_from(&config_path);

    let mut log_config = config.logging.clone().with_verbosity(cli.verbose);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config).context("Failed to initialize logging")?;

    let database_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.storage.database_path.clone());
    let today = Local::now().date_naive();
    tracing::debug!(config = %config_path.display(), database = %database_path.display(), %today, "Starting");

    match cli.command {
        Commands::Add {
            date,
            duration,
            heart_rate,
            distance,
            speed,
            feet,
            incline,
        } => {
            let mut repo = open_repository(&database_path)?;
            let run = repo.insert(NewRun {
                date: date.unwrap_or_else(|| Local::now().naive_local()),
                duration_minutes: duration,
                target_heart_rate: heart_rate,
                distance_miles: distance,
                final_minute_speed: speed,
                total_feet_climbed: feet,
                final_minute_incline: incline,
            })?;

            if cli.json {
                print_json(&run)?;
            } else {
                println!("{} run {} logged", "✓".green(), run.id);
                print_runs(&[run], &Default::default());
            }
        }

        Commands::Edit {
            id,
            date,
            duration,
            heart_rate,
            distance,
            speed,
            feet,
            incline,
        } => {
            let mut repo = open_repository(&database_path)?;
            let mut run = repo
                .get(id)?
                .ok_or(TreadlogError::Database(DatabaseError::NotFound { id }))?;

            run.date = date.unwrap_or(run.date);
            run.duration_minutes = duration.unwrap_or(run.duration_minutes);
            run.target_heart_rate = heart_rate.unwrap_or(run.target_heart_rate);
            run.distance_miles = distance.unwrap_or(run.distance_miles);
            run.final_minute_speed = speed.unwrap_or(run.final_minute_speed);
            run.total_feet_climbed = feet.unwrap_or(run.total_feet_climbed);
            run.final_minute_incline = incline.unwrap_or(run.final_minute_incline);
            repo.update(&run)?;

            if cli.json {
                print_json(&run)?;
            } else {
                println!("{} run {} updated", "✓".green(), run.id);
            }
        }

        Commands::Delete { id } => {
            let mut repo = open_repository(&database_path)?;
            if !repo.delete(id)? {
                return Err(TreadlogError::Database(DatabaseError::NotFound { id }).into());
            }
            println!("{} run {} deleted", "✓".green(), id);
        }

        Commands::Show { id } => {
            let repo = open_repository(&database_path)?;
            let run = repo
                .get(id)?
                .ok_or(TreadlogError::Database(DatabaseError::NotFound { id }))?;
            let personal_bests = calculate_personal_bests(&repo.list_all()?)
                .get(&run.id)
                .copied()
                .unwrap_or_default();
            let summary = RunSummary::from_run(&run);

            if cli.json {
                print_json(&RunDetail {
                    run: &run,
                    summary,
                    personal_bests,
                })?;
            } else {
                print_run_detail(&run, &summary, personal_bests);
            }
        }

        Commands::HeartRates => {
            let repo = open_repository(&database_path)?;
            let choices = config.heart_rate_choices(&repo.distinct_heart_rates()?);

            if cli.json {
                print_json(&choices)?;
            } else {
                print_heart_rates(&choices);
            }
        }

        Commands::List { heart_rate, limit } => {
            let repo = open_repository(&database_path)?;
            let all_runs = repo.list_all()?;
            let pbs = calculate_personal_bests(&all_runs);

            let runs: Vec<Run> = all_runs
                .into_iter()
                .filter(|run| heart_rate.map_or(true, |hr| run.target_heart_rate == hr))
                .take(limit.unwrap_or(usize::MAX))
                .collect();

            if cli.json {
                let listed: Vec<ListedRun> = runs
                    .iter()
                    .map(|run| ListedRun {
                        run,
                        personal_bests: pbs.get(&run.id).copied().unwrap_or_default(),
                    })
                    .collect();
                print_json(&listed)?;
            } else if runs.is_empty() {
                println!("{}", "No runs logged yet".dimmed());
            } else {
                print_runs(&runs, &pbs);
            }
        }

        Commands::Summary { range, heart_rate } => {
            let explicit = range.is_explicit();
            let (preset, custom) = range.resolve(&config);
            let range = DateRange::for_preset(preset, today, config.summary.week_start, custom);

            let repo = open_repository(&database_path)?;
            let runs = repo.list_all()?;
            let filter = RunFilter {
                date_range: range,
                heart_rate,
            };
            let stats = RunStats::from_runs(filter.apply(&runs));

            if explicit {
                config.remember_summary(preset, custom);
                config.save_to_file(&config_path)?;
            }

            if cli.json {
                print_json(&stats)?;
            } else {
                print_summary(&stats, range, heart_rate);
            }
        }

        Commands::Calendar { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());

            let repo = open_repository(&database_path)?;
            let runs = repo.list_all()?;
            let by_day = group_runs_by_day(&runs);
            let streak = calculate_streak(&by_day, today);
            let calendar =
                MonthCalendar::build(&by_day, &streak, year, month, config.summary.week_start)
                    .ok_or_else(|| {
                        TreadlogError::Validation(format!("{}-{} is not a valid month", year, month))
                    })?;

            if cli.json {
                print_json(&CalendarView {
                    streak: &streak,
                    calendar: &calendar,
                })?;
            } else {
                print_calendar(&calendar, &streak, config.summary.week_start, today);
            }
        }

        Commands::History {
            category,
            range,
            heart_rate,
            limit,
        } => {
            let (preset, custom) = range.resolve(&config);
            let filter = RunFilter {
                date_range: DateRange::for_preset(preset, today, config.summary.week_start, custom),
                heart_rate,
            };

            let repo = open_repository(&database_path)?;
            let runs = repo.list_all()?;
            let selected: Vec<Run> = filter.apply(&runs).into_iter().cloned().collect();
            let entries = pb_history(&selected, category, limit);

            if cli.json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("{}", "No runs to rank".dimmed());
            } else {
                println!("{}", category.title().bold());
                print_history(category, &entries);
            }
        }

        Commands::Plan {
            heart_rate,
            goal_distance,
            goal_date,
            start_duration,
            start_distance,
            save,
        } => {
            let heart_rate = heart_rate.unwrap_or(config.plan.heart_rate);
            let goal_distance = goal_distance.unwrap_or(config.plan.goal_distance_miles);
            let goal_date =
                goal_date.unwrap_or_else(|| config.plan.goal_date_or_default(today));

            if save {
                config.plan.heart_rate = heart_rate;
                config.plan.goal_distance_miles = goal_distance;
                config.plan.goal_date = Some(goal_date);
                config.save_to_file(&config_path)?;
            }

            let seed = match (start_duration, start_distance) {
                (Some(duration), Some(distance)) => PlanSeed {
                    start_duration_minutes: duration,
                    start_distance_miles: distance,
                    goal_distance_miles: goal_distance,
                    goal_date,
                },
                _ => {
                    let repo = open_repository(&database_path)?;
                    match repo.latest_by_heart_rate(heart_rate)? {
                        Some(run) => PlanSeed::from_run(&run, goal_distance, goal_date),
                        None => {
                            println!(
                                "{}",
                                format!("No runs logged at {} yet; log one to seed the plan", heart_rate)
                                    .yellow()
                            );
                            return Ok(());
                        }
                    }
                }
            };

            match plan_progression(&seed, today) {
                Some(plan) if cli.json => print_json(&plan)?,
                Some(plan) => print_plan(&plan, heart_rate),
                None => println!(
                    "{}",
                    "Plan can't be computed: the seed needs a positive duration and distance, \
                     and the goal date must leave at least one Saturday"
                        .yellow()
                ),
            }
        }

        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                if cli.json {
                    print_json(&config)?;
                } else {
                    print!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to render configuration")?
                    );
                }
            }
            ConfigCommands::Init => {
                config.save_to_file(&config_path)?;
                println!("{} configuration written to {}", "✓".green(), config_path.display());
            }
            ConfigCommands::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn open_repository(path: &Path) -> Result<SqliteRunRepository> {
    let repo = SqliteRunRepository::open(path)?;
    Ok(repo)
}

fn report_error(error: anyhow::Error) {
    let error = match error.downcast::<DatabaseError>() {
        Ok(db_error) => anyhow::Error::new(TreadlogError::from(db_error)),
        Err(other) => other,
    };

    match error.downcast_ref::<TreadlogError>() {
        Some(err) => {
            let label = match err.severity() {
                ErrorSeverity::Warning => "Warning:".yellow().bold(),
                ErrorSeverity::Error => "Error:".red().bold(),
            };
            if err.severity().to_tracing_level() == tracing::Level::WARN {
                tracing::warn!(error = %err, "Command rejected");
            } else {
                tracing::error!(error = %err, "Command failed");
            }
            eprintln!("{} {}", label, err.user_message());
        }
        None => {
            tracing::error!(error = %error, "Command failed");
            eprintln!("{} {:#}", "Error:".red().bold(), error);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ListedRun<'a> {
    #[serde(flatten)]
    run: &'a Run,
    personal_bests: RunPersonalBests,
}

#[derive(Serialize)]
struct RunDetail<'a> {
    #[serde(flatten)]
    run: &'a Run,
    summary: RunSummary,
    personal_bests: RunPersonalBests,
}

#[derive(Serialize)]
struct CalendarView<'a> {
    streak: &'a StreakSummary,
    calendar: &'a MonthCalendar,
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Target")]
    heart_rate: String,
    #[tabled(rename = "Time")]
    duration: String,
    #[tabled(rename = "Miles")]
    distance: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Climb")]
    climb: String,
    #[tabled(rename = "Final min")]
    final_minute: String,
    #[tabled(rename = "PBs")]
    badges: String,
}

fn print_runs(runs: &[Run], pbs: &std::collections::HashMap<i64, RunPersonalBests>) {
    let rows: Vec<RunRow> = runs
        .iter()
        .map(|run| RunRow {
            id: run.id,
            date: run.date.format("%Y-%m-%d %H:%M").to_string(),
            heart_rate: run.target_heart_rate.to_string(),
            duration: format_duration(u64::from(run.duration_minutes)),
            distance: format!("{:.2}", run.distance_miles),
            pace: format_optional_pace(run.pace()),
            climb: format!("{} ft", run.total_feet_climbed),
            final_minute: format!(
                "{:.1} mph @ {:.1}%",
                run.final_minute_speed, run.final_minute_incline
            ),
            badges: pbs
                .get(&run.id)
                .map(|pb| pb.badges().join(", "))
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_summary(stats: &RunStats, range: DateRange, heart_rate: Option<TargetHeartRate>) {
    let describe = |date: Option<NaiveDate>| {
        date.map_or_else(|| "…".to_string(), |d| d.format("%Y-%m-%d").to_string())
    };
    println!(
        "{} {} to {}{}",
        "Summary".bold(),
        describe(range.start),
        describe(range.end),
        heart_rate
            .map(|hr| format!(" at {}", hr))
            .unwrap_or_default()
    );

    if stats.is_empty() {
        println!("{}", "No runs in this range".dimmed());
        return;
    }

    let lines = [
        ("Runs", stats.total_runs.to_string()),
        ("Total time", format_duration(stats.total_duration_minutes)),
        ("Total distance", format!("{:.2} mi", stats.total_miles)),
        ("Total climb", format!("{} ft", stats.total_feet_climbed)),
        ("Average speed", format!("{:.2} mph", stats.avg_speed_mph)),
        ("Average pace", format_pace(stats.avg_pace_min_per_mile)),
        ("Longest run", format!("{:.2} mi", stats.best_single_run_miles)),
        ("Longest time", format_duration(u64::from(stats.best_single_run_duration))),
        ("Best pace", format_optional_pace(stats.best_pace)),
        ("Most climb", format!("{} ft", stats.most_elevation_single_run)),
    ];
    for (label, value) in lines {
        println!("  {:<15} {}", label.cyan(), value);
    }
}

fn print_calendar(
    calendar: &MonthCalendar,
    streak: &StreakSummary,
    week_start: WeekStart,
    today: NaiveDate,
) {
    let title = calendar
        .days
        .first()
        .map(|day| day.date.format("%B %Y").to_string())
        .unwrap_or_default();
    println!("{}", title.bold());

    let header = match week_start {
        WeekStart::Sunday => " Su Mo Tu We Th Fr Sa",
        WeekStart::Monday => " Mo Tu We Th Fr Sa Su",
    };
    println!("{}", header.dimmed());

    let mut line = "   ".repeat(calendar.leading_blank_days as usize);
    for (index, day) in calendar.days.iter().enumerate() {
        let cell = format!("{:>3}", day.day);
        let cell = if day.has_run() {
            cell.green().bold()
        } else if day.is_rest_day {
            cell.yellow()
        } else if day.date == today {
            cell.underline()
        } else {
            cell.dimmed()
        };
        line.push_str(&cell.to_string());

        let column = calendar.leading_blank_days as usize + index + 1;
        if column % 7 == 0 {
            println!("{}", line);
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line);
    }

    println!();
    if streak.is_active() {
        println!(
            "{} {} day streak ({} rest days)",
            "🔥".bold(),
            streak.current_streak,
            streak.rest_days.len()
        );
    } else {
        println!("{}", "No active streak".dimmed());
    }

    if let Some(stats) = &calendar.stats {
        println!(
            "{} runs, {:.2} mi, {}, {} ft climbed",
            stats.total_runs,
            stats.total_miles,
            format_duration(stats.total_duration_minutes),
            stats.total_feet_climbed
        );
    }
}

fn print_run_detail(run: &Run, summary: &RunSummary, personal_bests: RunPersonalBests) {
    println!(
        "{} {} at {}",
        format!("Run {}", run.id).bold(),
        run.date.format("%a %b %-d %Y, %H:%M"),
        run.target_heart_rate
    );

    let lines = [
        ("Time", format_duration(u64::from(run.duration_minutes))),
        ("Distance", format!("{:.2} mi", run.distance_miles)),
        ("Average speed", format!("{:.2} mph", summary.avg_speed_mph)),
        ("Average pace", format_optional_pace(summary.avg_pace_min_per_mile)),
        ("Climb", format!("{} ft", run.total_feet_climbed)),
        ("Average incline", format!("{:.1}%", summary.avg_incline_percent)),
        (
            "Final minute",
            format!(
                "{:.1} mph @ {:.1}%",
                run.final_minute_speed, run.final_minute_incline
            ),
        ),
    ];
    for (label, value) in lines {
        println!("  {:<15} {}", label.cyan(), value);
    }

    if personal_bests.has_any() {
        let tiles: Vec<String> = personal_bests
            .badges()
            .into_iter()
            .map(|badge| format!("🏆 {}", badge))
            .collect();
        println!("  {:<15} {}", "PBs".cyan(), tiles.join("  ").yellow());
    }
}

#[derive(Tabled)]
struct HeartRateRow {
    #[tabled(rename = "Target")]
    heart_rate: String,
    #[tabled(rename = "Value")]
    raw: i32,
    #[tabled(rename = "Preset")]
    preset: String,
    #[tabled(rename = "Logged")]
    logged: String,
}

fn print_heart_rates(choices: &[HeartRateChoice]) {
    let mark = |flag: bool| if flag { "✓".to_string() } else { String::new() };
    let rows: Vec<HeartRateRow> = choices
        .iter()
        .map(|choice| HeartRateRow {
            heart_rate: choice.heart_rate.to_string(),
            raw: choice.heart_rate.raw(),
            preset: mark(choice.preset),
            logged: mark(choice.logged),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Target")]
    heart_rate: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "PB when logged")]
    record: String,
}

fn print_history(category: PbCategory, entries: &[PbHistoryEntry]) {
    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|entry| HistoryRow {
            rank: entry.rank,
            date: entry.run.date.format("%Y-%m-%d").to_string(),
            heart_rate: entry.run.target_heart_rate.to_string(),
            value: match category {
                PbCategory::LongestRun => format!("{:.2} mi", entry.value),
                PbCategory::BestPace => format!("{} /mi", format_pace(entry.value)),
                PbCategory::MostElevation => format!("{} ft", entry.value as u32),
                PbCategory::LongestDuration => format_duration(entry.value as u64),
            },
            record: if entry.set_pb_when_logged {
                "★".to_string()
            } else {
                String::new()
            },
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Week")]
    week: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Miles")]
    distance: String,
    #[tabled(rename = "Est. time")]
    duration: String,
    #[tabled(rename = "Growth")]
    growth: String,
}

fn print_plan(plan: &TrainingProgression, heart_rate: TargetHeartRate) {
    println!(
        "{} {:.1} mi by {} at {}",
        "Goal".bold(),
        plan.seed.goal_distance_miles,
        plan.seed.goal_date,
        heart_rate
    );
    println!(
        "  Pace {} /mi, goal time {}, {} weeks at {:.1}% per week, {:.0}% of goal today",
        format_pace(plan.pace_min_per_mile),
        format_duration(u64::from(plan.goal_duration_minutes)),
        plan.weeks_remaining,
        plan.weekly_growth_rate * 100.0,
        plan.start_progress() * 100.0
    );

    let rows: Vec<StepRow> = plan
        .steps
        .iter()
        .map(|step| StepRow {
            week: step.week_number,
            date: step.date.format("%a %b %-d").to_string(),
            distance: if step.is_final {
                format!("{:.2} (goal)", step.target_distance_miles)
            } else {
                format!("{:.2}", step.target_distance_miles)
            },
            duration: format_duration(u64::from(step.estimated_duration_minutes)),
            growth: format_growth(step.growth_from_start_percent),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::tempdir;
use treadlog::{config, database, personal_bests, stats, streak, training_plan};

/// Integration tests that run the analytics over a stored run log

#[cfg(test)]
mod integration_tests {
    use super::*;
    use database::RunRepository;
    use treadlog::models::{Category, NewRun, TargetHeartRate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn at(days_back: i64, hour: u32) -> NaiveDateTime {
        (today() - Duration::days(days_back))
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn new_run(
        days_back: i64,
        heart_rate: TargetHeartRate,
        duration: u32,
        distance: f64,
        feet: u32,
    ) -> NewRun {
        NewRun {
            date: at(days_back, 7),
            duration_minutes: duration,
            target_heart_rate: heart_rate,
            distance_miles: distance,
            final_minute_speed: 6.5,
            total_feet_climbed: feet,
            final_minute_incline: 2.0,
        }
    }

    /// Two weeks of runs across two heart rates and a race
    fn seed_log(repo: &mut dyn RunRepository) {
        let hr139 = TargetHeartRate::Bpm(139);
        let hr130 = TargetHeartRate::Bpm(130);
        let races = TargetHeartRate::Category(Category::Races);

        let runs = [
            new_run(14, hr139, 30, 3.0, 0),
            new_run(12, hr139, 40, 3.8, 120),
            new_run(10, hr130, 45, 4.2, 300),
            new_run(8, races, 25, 3.1, 0),
            new_run(4, hr139, 30, 3.2, 60),
            new_run(3, hr139, 50, 4.6, 200),
            new_run(1, hr130, 35, 3.0, 0),
            new_run(0, hr139, 40, 4.0, 150),
        ];
        for run in runs {
            repo.insert(run).unwrap();
        }
    }

    #[test]
    fn test_complete_workflow_from_sqlite() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("runs.db");

        {
            let mut repo = database::SqliteRunRepository::open(&db_path).unwrap();
            seed_log(&mut repo);
        }

        let repo = database::SqliteRunRepository::open(&db_path).unwrap();
        let runs = repo.list_all().unwrap();
        assert_eq!(runs.len(), 8);
        assert!(runs.windows(2).all(|w| w[0].date >= w[1].date));

        // PBs: the 139 group's longest run is the 4.6 mile one
        let pbs = personal_bests::calculate_personal_bests(&runs);
        let longest_139 = runs
            .iter()
            .find(|run| run.target_heart_rate == TargetHeartRate::Bpm(139) && run.distance_miles == 4.6)
            .unwrap();
        assert!(pbs[&longest_139.id].distance);
        assert!(pbs[&longest_139.id].elevation);
        assert!(pbs[&longest_139.id].duration);

        // The race is alone in its group; its 25 minutes still counts for duration
        let races = repo
            .list_by_heart_rate(TargetHeartRate::Category(Category::Races))
            .unwrap();
        let race_pbs = pbs[&races[0].id];
        assert!(race_pbs.distance && race_pbs.pace && race_pbs.duration);
        assert!(!race_pbs.elevation);

        // Streak: days 0, 1, (2 rest), 3, 4, then a three-day gap
        let by_day = streak::group_runs_by_day(&runs);
        let summary = streak::calculate_streak(&by_day, today());
        assert_eq!(summary.current_streak, 4);
        assert!(summary.is_rest_day(today() - Duration::days(2)));
        assert_eq!(summary.rest_days.len(), 1);

        // This week (Sunday start) covers June 9-12
        let range = stats::DateRange::for_preset(
            stats::DateRangePreset::ThisWeek,
            today(),
            stats::WeekStart::Sunday,
            stats::DateRange::default(),
        );
        let filter = stats::RunFilter {
            date_range: range,
            heart_rate: None,
        };
        let week = stats::RunStats::from_runs(filter.apply(&runs));
        assert_eq!(week.total_runs, 3);
        assert_eq!(week.total_duration_minutes, 50 + 35 + 40);
        assert_eq!(week.best_single_run_miles, 4.6);
        assert_eq!(
            week.avg_pace_min_per_mile,
            week.total_duration_minutes as f64 / week.total_miles
        );
    }

    #[test]
    fn test_plan_seeded_from_latest_run() {
        let mut repo = database::InMemoryRunRepository::new();
        seed_log(&mut repo);

        let latest = repo
            .latest_by_heart_rate(TargetHeartRate::Bpm(139))
            .unwrap()
            .unwrap();
        assert_eq!(latest.date, at(0, 7));

        let goal_date = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        let seed = training_plan::PlanSeed::from_run(&latest, 22.0, goal_date);
        let plan = training_plan::plan_progression(&seed, today()).unwrap();

        assert_eq!(plan.weeks_remaining, 12);
        assert_eq!(plan.pace_min_per_mile, 10.0);
        assert_eq!(plan.goal_duration_minutes, 220);
        assert_eq!(plan.steps.last().unwrap().target_distance_miles, 22.0);
        assert_eq!(plan.steps[0].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn test_history_and_month_calendar() {
        let mut repo = database::InMemoryRunRepository::new();
        seed_log(&mut repo);
        let runs = repo.list_all().unwrap();

        let history = personal_bests::pb_history(
            &runs,
            personal_bests::PbCategory::LongestRun,
            personal_bests::DEFAULT_HISTORY_LIMIT,
        );
        assert_eq!(history.len(), 8);
        assert_eq!(history[0].run.distance_miles, 4.6);
        assert!(history[0].set_pb_when_logged);
        // The 3.0 mile first run set the initial record
        assert!(history
            .iter()
            .any(|entry| entry.run.date == at(14, 7) && entry.set_pb_when_logged));

        let by_day = streak::group_runs_by_day(&runs);
        let summary = streak::calculate_streak(&by_day, today());
        let june = stats::MonthCalendar::build(&by_day, &summary, 2024, 6, stats::WeekStart::Sunday)
            .unwrap();
        assert_eq!(june.days.len(), 30);
        assert_eq!(june.days.iter().filter(|day| day.has_run()).count(), 6);
        assert!(june.days[9].is_rest_day);
        assert_eq!(june.stats.unwrap().total_runs, 6);

        let may = stats::MonthCalendar::build(&by_day, &summary, 2024, 5, stats::WeekStart::Sunday)
            .unwrap();
        assert_eq!(may.stats.unwrap().total_runs, 2);
    }

    #[test]
    fn test_config_round_trip_points_at_database() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("data").join("runs.db");

        let mut app_config = config::AppConfig::default();
        app_config.storage.database_path = db_path.clone();
        app_config.plan.heart_rate = TargetHeartRate::Category(Category::Person);
        app_config.save_to_file(&config_path).unwrap();

        let loaded = config::AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.storage.database_path, db_path);
        assert_eq!(loaded.plan.heart_rate.raw(), -2);

        let mut repo = database::SqliteRunRepository::open(&loaded.storage.database_path).unwrap();
        repo.insert(new_run(0, loaded.plan.heart_rate, 30, 2.5, 0)).unwrap();
        assert_eq!(
            repo.distinct_heart_rates().unwrap(),
            vec![TargetHeartRate::Category(Category::Person)]
        );
    }

    #[test]
    fn test_history_ranks_only_filtered_runs() {
        let mut repo = database::InMemoryRunRepository::new();
        seed_log(&mut repo);
        let runs = repo.list_all().unwrap();

        let this_week = stats::DateRange::for_preset(
            stats::DateRangePreset::ThisWeek,
            today(),
            stats::WeekStart::Sunday,
            stats::DateRange::default(),
        );
        let filter = stats::RunFilter {
            date_range: this_week,
            heart_rate: None,
        };
        let selected: Vec<_> = filter.apply(&runs).into_iter().cloned().collect();
        let history = personal_bests::pb_history(
            &selected,
            personal_bests::PbCategory::LongestRun,
            personal_bests::DEFAULT_HISTORY_LIMIT,
        );
        let miles: Vec<f64> = history.iter().map(|entry| entry.run.distance_miles).collect();
        assert_eq!(miles, vec![4.6, 4.0, 3.0]);

        let filter = stats::RunFilter {
            date_range: this_week,
            heart_rate: Some(TargetHeartRate::Bpm(139)),
        };
        let selected: Vec<_> = filter.apply(&runs).into_iter().cloned().collect();
        let history = personal_bests::pb_history(
            &selected,
            personal_bests::PbCategory::LongestRun,
            personal_bests::DEFAULT_HISTORY_LIMIT,
        );
        let miles: Vec<f64> = history.iter().map(|entry| entry.run.distance_miles).collect();
        assert_eq!(miles, vec![4.6, 4.0]);
    }

    #[test]
    fn test_run_detail_with_personal_bests() {
        let mut repo = database::InMemoryRunRepository::new();
        seed_log(&mut repo);
        let runs = repo.list_all().unwrap();

        let longest = runs
            .iter()
            .find(|run| run.distance_miles == 4.6)
            .unwrap();
        let detail = repo.get(longest.id).unwrap().unwrap();
        let summary = stats::RunSummary::from_run(&detail);

        assert_eq!(summary.run_id, detail.id);
        assert!((summary.avg_speed_mph - 5.52).abs() < 1e-9);
        assert!((summary.avg_incline_percent - 200.0 / (4.6 * 5280.0) * 100.0).abs() < 1e-9);
        assert_eq!(summary.avg_pace_min_per_mile, detail.pace());

        let held = personal_bests::calculate_personal_bests(&runs)[&detail.id];
        assert_eq!(held.badges(), vec!["distance", "elevation", "duration"]);
    }

    #[test]
    fn test_heart_rate_choices_from_stored_groups() {
        let mut repo = database::SqliteRunRepository::in_memory().unwrap();
        seed_log(&mut repo);

        let app_config = config::AppConfig::default();
        let choices = app_config.heart_rate_choices(&repo.distinct_heart_rates().unwrap());

        let order: Vec<i32> = choices.iter().map(|choice| choice.heart_rate.raw()).collect();
        assert_eq!(order, vec![120, 130, 139, 140, 160, -1, -2, -3]);
        let logged: Vec<i32> = choices
            .iter()
            .filter(|choice| choice.logged)
            .map(|choice| choice.heart_rate.raw())
            .collect();
        assert_eq!(logged, vec![130, 139, -1]);
    }
}

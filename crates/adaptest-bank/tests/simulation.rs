//! Full simulated runs against banks loaded from TOML.

use std::fmt::Write as _;
use std::path::Path;

use adaptest_bank::parser::{load_banks, validate_bank};
use adaptest_bank::simulation::Simulation;
use adaptest_core::config::{parse_config_str, TestConfig};
use adaptest_core::model::{DifficultyRange, StopReason};

/// A bank with `per_level` questions at every level of `[1, highest]`,
/// split across categories 1 and 2.
fn write_bank(dir: &Path, highest: i32, per_level: u64) -> std::path::PathBuf {
    let mut toml = String::from("[bank]\nid = \"grid\"\nname = \"Grid\"\n");
    for level in 1..=highest {
        for n in 0..per_level {
            let id = level as u64 * 100 + n;
            let category = 1 + n % 2;
            write!(
                toml,
                "\n[[questions]]\nid = {id}\nname = \"L{level}-{n}\"\ncategory = {category}\ntags = [\"adpq_{level}\"]\n"
            )
            .unwrap();
        }
    }
    let path = dir.join("grid.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

fn config(highest: i32, max: u32, error_percent: f64) -> TestConfig {
    TestConfig {
        range: DifficultyRange::new(1, highest).unwrap(),
        starting_level: highest / 2,
        minimum_questions: 3,
        maximum_questions: max,
        standard_error_percent: error_percent,
        ..TestConfig::default()
    }
}

#[test]
fn estimates_separate_weak_and_strong_test_takers() {
    let dir = tempfile::tempdir().unwrap();
    let bank = load_banks(&write_bank(dir.path(), 100, 2)).unwrap();
    let config = config(100, 30, 5.0);

    let weak = Simulation::new(&config, &bank).with_seed(9).run(5).unwrap();
    let strong = Simulation::new(&config, &bank).with_seed(9).run(95).unwrap();

    let weak_level = weak.estimated_ability.unwrap().level;
    let strong_level = strong.estimated_ability.unwrap().level;
    assert!(
        strong_level > weak_level + 30.0,
        "weak {weak_level}, strong {strong_level}"
    );
    assert!(strong.raw_score > weak.raw_score);
}

#[test]
fn loose_error_limit_stops_at_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let bank = load_banks(&write_bank(dir.path(), 20, 2)).unwrap();
    // Threshold ln(0.9 / 0.1) ~ 2.2 is met by any three answers.
    let config = config(20, 10, 40.0);

    let report = Simulation::new(&config, &bank).with_seed(1).run(10).unwrap();
    assert_eq!(report.questions_attempted(), 3);
    assert!(matches!(
        report.stop_reason,
        StopReason::ErrorWithinLimits {
            configured_percent: 40,
            ..
        }
    ));
}

#[test]
fn scope_limits_served_categories() {
    let dir = tempfile::tempdir().unwrap();
    let bank = load_banks(&write_bank(dir.path(), 20, 4)).unwrap();
    let mut config = config(20, 8, 5.0);
    config.scope.category_ids = vec![2];

    let report = Simulation::new(&config, &bank).with_seed(4).run(12).unwrap();
    assert_eq!(report.questions_attempted(), 8);
    for step in &report.steps {
        let question = bank.get(step.question_id).unwrap();
        assert_eq!(question.category_id, 2, "{} served", step.question_id);
    }
}

#[test]
fn small_bank_runs_out_of_questions() {
    let dir = tempfile::tempdir().unwrap();
    let bank = load_banks(&write_bank(dir.path(), 5, 1)).unwrap();
    let config = config(5, 20, 5.0);

    let report = Simulation::new(&config, &bank).with_seed(3).run(3).unwrap();
    assert_eq!(report.questions_attempted(), 5);
    assert!(matches!(
        report.stop_reason,
        StopReason::NoQuestionAvailable { .. }
    ));

    let mut ids: Vec<_> = report.steps.iter().map(|s| s.question_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[test]
fn config_file_and_bank_validate_together() {
    let dir = tempfile::tempdir().unwrap();
    let bank = load_banks(&write_bank(dir.path(), 10, 1)).unwrap();
    let config = parse_config_str(
        "starting_level = 5\n[range]\nlowest = 1\nhighest = 12\n",
        Path::new("adaptest.toml"),
    )
    .unwrap();

    let warnings = validate_bank(&bank, &config);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message,
        "2 of 12 difficulty levels in [1, 12] have no questions"
    );
}

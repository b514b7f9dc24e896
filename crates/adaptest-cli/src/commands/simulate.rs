//! The `adaptest simulate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_bank::parser::load_banks;
use adaptest_bank::simulation::{Simulation, SimulationReport};
use adaptest_core::config::load_config_from;

pub fn execute(
    config_path: Option<PathBuf>,
    bank_path: PathBuf,
    ability: i32,
    seed: Option<u64>,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    if !config.range.contains(ability) {
        anyhow::bail!(
            "ability {ability} is outside the difficulty range {}",
            config.range
        );
    }
    if format != "text" && format != "json" {
        anyhow::bail!("unknown format: {format} (expected text or json)");
    }

    let bank = load_banks(&bank_path)?;
    let seed = seed.unwrap_or_else(rand::random);
    let report = Simulation::new(&config, &bank).with_seed(seed).run(ability)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Slot",
        "Question",
        "Level",
        "Answer",
        "Std. error",
        "Measure",
    ]);

    let estimate = |value: Option<f64>| {
        value
            .map(|v| format!("{v:.5}"))
            .unwrap_or_else(|| "-".to_string())
    };
    for step in &report.steps {
        table.add_row(vec![
            Cell::new(step.slot),
            Cell::new(step.question_id),
            Cell::new(step.level),
            Cell::new(step.outcome),
            Cell::new(estimate(step.standard_error)),
            Cell::new(estimate(step.measure)),
        ]);
    }

    println!(
        "Bank: {}  range: {}  true ability: {}  seed: {}",
        report.bank_id, report.config.range, report.true_ability, report.seed
    );
    println!("{table}");
    println!("Stopped: {}", report.stop_reason);
    println!(
        "Questions attempted: {}  raw score: {}",
        report.questions_attempted(),
        report.raw_score
    );
    match report.estimated_ability {
        Some(scaled) => println!(
            "Estimated ability: {:.2} (±{:.2}%)",
            scaled.level, scaled.error_percent
        ),
        None => println!("Estimated ability: none (no answers recorded)"),
    }
}

//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_bank::parser::{load_banks, validate_bank};
use adaptest_core::config::load_config_from;

pub fn execute(config_path: Option<PathBuf>, bank_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    println!(
        "Config: range {}, starting level {}, {}..{} questions, {}% standard error",
        config.range,
        config.starting_level,
        config.minimum_questions,
        config.maximum_questions,
        config.standard_error_percent
    );

    let Some(bank_path) = bank_path else {
        println!("Config valid.");
        return Ok(());
    };

    let bank = load_banks(&bank_path)?;
    println!("Question bank: {} ({} questions)", bank.name, bank.len());

    let warnings = validate_bank(&bank, &config);
    for w in &warnings {
        let prefix = w
            .question_id
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Config and question bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

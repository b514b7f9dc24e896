//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and checks them
//! against a test configuration.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use adaptest_core::config::TestConfig;
use adaptest_core::model::QuestionId;

use crate::bank::{Question, QuestionBank};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    /// Category applied to questions that do not name one.
    #[serde(default)]
    default_category: u64,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    name: String,
    #[serde(default)]
    category: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_category = parsed.bank.default_category;
    let questions = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            id: QuestionId(q.id),
            name: q.name,
            category_id: q.category.unwrap_or(default_category),
            tags: q.tags,
        })
        .collect();

    Ok(QuestionBank::new(parsed.bank.id, parsed.bank.name, questions))
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank from a file, or every bank under a directory merged into one.
pub fn load_banks(path: &Path) -> Result<QuestionBank> {
    if !path.exists() {
        anyhow::bail!("question bank not found: {}", path.display());
    }
    if !path.is_dir() {
        return parse_bank(path);
    }

    let mut banks = load_bank_directory(path)?.into_iter();
    let Some(mut merged) = banks.next() else {
        anyhow::bail!("no question banks found in {}", path.display());
    };
    for bank in banks {
        merged.merge(bank);
    }
    Ok(merged)
}

/// A warning from bank validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The question concerned, if the warning is about one question.
    pub question_id: Option<QuestionId>,
    pub message: String,
}

/// Check a bank against the configuration that will draw from it.
pub fn validate_bank(bank: &QuestionBank, config: &TestConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let prefixes = &config.scope.tag_prefixes;
    let range = &config.range;

    let mut seen_ids = HashSet::new();
    for q in bank.questions() {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    let mut populated = BTreeSet::new();
    for q in bank.questions() {
        match q.level(prefixes) {
            None => warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!(
                    "no difficulty tag (expected one of: {})",
                    prefixes
                        .iter()
                        .map(|p| format!("{p}<level>"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
            Some(level) if !range.contains(level) => warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("difficulty {level} is outside the configured range {range}"),
            }),
            Some(level) => {
                populated.insert(level);
            }
        }
    }

    let levels = range.span() as u64 + 1;
    let empty = levels - populated.len() as u64;
    if empty > 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!("{empty} of {levels} difficulty levels in {range} have no questions"),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::DifficultyRange;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "arith"
name = "Arithmetic"
default_category = 3

[[questions]]
id = 1
name = "1 + 1"
tags = ["adpq_1"]

[[questions]]
id = 2
name = "12 x 12"
category = 7
tags = ["adpq_2", "multiplication"]
"#;

    fn small_config() -> TestConfig {
        TestConfig {
            range: DifficultyRange::new(1, 2).unwrap(),
            starting_level: 1,
            ..TestConfig::default()
        }
    }

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("arith.toml")).unwrap();
        assert_eq!(bank.id, "arith");
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions()[0].category_id, 3);
        assert_eq!(bank.questions()[1].category_id, 7);
        assert_eq!(bank.questions()[1].tags.len(), 2);
    }

    #[test]
    fn parse_missing_questions() {
        let bank =
            parse_bank_str("[bank]\nid = \"e\"\nname = \"Empty\"\n", &PathBuf::from("e.toml"))
                .unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn parse_invalid_toml() {
        let err = parse_bank_str("not [valid", &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn clean_bank_has_no_warnings() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("arith.toml")).unwrap();
        assert!(validate_bank(&bank, &small_config()).is_empty());
    }

    #[test]
    fn validate_reports_problems() {
        let toml = r#"
[bank]
id = "messy"
name = "Messy"

[[questions]]
id = 1
name = "a"
tags = ["adpq_1"]

[[questions]]
id = 1
name = "a again"
tags = ["adpq_1"]

[[questions]]
id = 2
name = "untagged"

[[questions]]
id = 3
name = "too hard"
tags = ["adpq_9"]
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("messy.toml")).unwrap();
        let warnings = validate_bank(&bank, &small_config());
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert_eq!(warnings.len(), 4, "{messages:?}");
        assert!(messages[0].contains("duplicate question ID: q1"));
        assert!(messages[1].contains("no difficulty tag"));
        assert_eq!(warnings[1].question_id, Some(QuestionId(2)));
        assert!(messages[2].contains("outside the configured range [1, 2]"));
        assert_eq!(messages[3], "1 of 2 difficulty levels in [1, 2] have no questions");
        assert_eq!(warnings[3].question_id, None);
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[bank").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("more");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("b.toml"),
            "[bank]\nid = \"b\"\nname = \"B\"\n\n[[questions]]\nid = 10\nname = \"x\"\ntags = [\"adpq_2\"]\n",
        )
        .unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 2);

        let merged = load_banks(dir.path()).unwrap();
        assert_eq!(merged.len(), 3);
        assert!(merged.get(QuestionId(10)).is_some());
    }

    #[test]
    fn load_banks_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_banks(&dir.path().join("missing.toml")).is_err());
        let err = load_banks(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no question banks found"));
    }
}

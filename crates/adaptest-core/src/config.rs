//! Test configuration and loader.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::model::{DifficultyRange, PoolScope};

/// Read-only configuration of one adaptive test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Bounds of the difficulty scale.
    #[serde(default = "default_range")]
    pub range: DifficultyRange,
    /// Level of the first question.
    #[serde(default = "default_starting_level")]
    pub starting_level: i32,
    /// Questions to attempt before the error limit can stop the test.
    #[serde(default = "default_minimum_questions")]
    pub minimum_questions: u32,
    /// Hard cap on questions attempted.
    #[serde(default = "default_maximum_questions")]
    pub maximum_questions: u32,
    /// Stop once the standard error is at or below this percentage.
    #[serde(default = "default_standard_error_percent")]
    pub standard_error_percent: f64,
    /// Which questions of the pool the test draws from.
    #[serde(default)]
    pub scope: PoolScope,
}

fn default_range() -> DifficultyRange {
    DifficultyRange::default()
}
fn default_starting_level() -> i32 {
    50
}
fn default_minimum_questions() -> u32 {
    5
}
fn default_maximum_questions() -> u32 {
    20
}
fn default_standard_error_percent() -> f64 {
    5.0
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            starting_level: default_starting_level(),
            minimum_questions: default_minimum_questions(),
            maximum_questions: default_maximum_questions(),
            standard_error_percent: default_standard_error_percent(),
            scope: PoolScope::default(),
        }
    }
}

impl TestConfig {
    /// Reject configurations the administration cycle cannot run with.
    pub fn validate(&self) -> std::result::Result<(), CatError> {
        if !self.range.contains(self.starting_level) {
            return Err(CatError::InvalidConfig(format!(
                "starting level {} is outside the difficulty range {}",
                self.starting_level, self.range
            )));
        }
        if self.maximum_questions == 0 {
            return Err(CatError::InvalidConfig(
                "maximum_questions must be at least 1".into(),
            ));
        }
        if self.minimum_questions > self.maximum_questions {
            return Err(CatError::InvalidConfig(format!(
                "minimum_questions ({}) exceeds maximum_questions ({})",
                self.minimum_questions, self.maximum_questions
            )));
        }
        if !(0.0..50.0).contains(&self.standard_error_percent) {
            return Err(CatError::InvalidConfig(format!(
                "standard_error_percent must be in [0, 50), got {}",
                self.standard_error_percent
            )));
        }
        if self.scope.tag_prefixes.iter().all(|p| p.is_empty()) {
            return Err(CatError::InvalidConfig(
                "scope.tag_prefixes must name at least one non-empty prefix".into(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate a TOML configuration string.
pub fn parse_config_str(content: &str, source: &Path) -> Result<TestConfig> {
    let config: TestConfig = toml::from_str(content)
        .with_context(|| format!("failed to parse config: {}", source.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", source.display()))?;
    Ok(config)
}

/// Load a test configuration from an explicit path, or fall back to the
/// defaults when no path is given.
pub fn load_config_from(path: Option<&Path>) -> Result<TestConfig> {
    let Some(path) = path else {
        return Ok(TestConfig::default());
    };
    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config_str(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.range, DifficultyRange::new(1, 100).unwrap());
        assert_eq!(config.scope.tag_prefixes, vec!["adpq_".to_string()]);
    }

    #[test]
    fn full_i32_range_is_usable() {
        let config = TestConfig {
            range: DifficultyRange::new(i32::MIN, i32::MAX).unwrap(),
            starting_level: 0,
            ..TestConfig::default()
        };
        assert!(config.validate().is_ok());
        let start = crate::logit::linear_to_logit(config.starting_level, &config.range);
        let next =
            crate::selector::compute_next_difficulty(1, true, &config.range, start).unwrap();
        assert!(next > 0, "next {next}");
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
starting_level = 5
minimum_questions = 3
maximum_questions = 12
standard_error_percent = 10.0

[range]
lowest = 1
highest = 10

[scope]
category_ids = [4, 7]
tag_prefixes = ["adpq_", "difficulty_"]
"#;
        let config = parse_config_str(toml_str, Path::new("test.toml")).unwrap();
        assert_eq!(config.range.highest(), 10);
        assert_eq!(config.maximum_questions, 12);
        assert_eq!(config.scope.category_ids, vec![4, 7]);
        assert_eq!(config.scope.tag_prefixes.len(), 2);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_config_str("starting_level = 20\n", Path::new("t.toml")).unwrap();
        assert_eq!(config.starting_level, 20);
        assert_eq!(config.maximum_questions, 20);
    }

    #[test]
    fn inverted_range_rejected_at_parse_time() {
        let err = parse_config_str(
            "[range]\nlowest = 10\nhighest = 10\n",
            Path::new("bad.toml"),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("lowest 10 must be below highest 10"));
    }

    #[test]
    fn invalid_values_rejected() {
        let cases = [
            TestConfig {
                starting_level: 0,
                ..TestConfig::default()
            },
            TestConfig {
                maximum_questions: 0,
                minimum_questions: 0,
                ..TestConfig::default()
            },
            TestConfig {
                minimum_questions: 30,
                ..TestConfig::default()
            },
            TestConfig {
                standard_error_percent: 50.0,
                ..TestConfig::default()
            },
            TestConfig {
                scope: PoolScope {
                    category_ids: vec![],
                    tag_prefixes: vec![],
                },
                ..TestConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(CatError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptest.toml");
        std::fs::write(&path, "maximum_questions = 8\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.maximum_questions, 8);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
        assert_eq!(load_config_from(None).unwrap(), TestConfig::default());
    }
}

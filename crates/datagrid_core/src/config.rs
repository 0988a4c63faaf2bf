//! Grid session configuration.
//!
//! # Responsibility
//! - Hold tunables shared by the loader, salary editor and storage bootstrap.
//! - Parse host-provided JSON configuration with defaults for omitted keys.
//!
//! # Invariants
//! - `page_size` is within `1..=MAX_PAGE_SIZE`.
//! - `salary_max` is positive.

use crate::model::row::SALARY_MAX;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Largest page the loader will request in one fetch.
pub const MAX_PAGE_SIZE: usize = 20;
/// Distance from the document bottom that counts as "reached bottom".
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 100.0;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Rows requested per fetch, including the initial page.
    pub page_size: usize,
    /// Bottom proximity in CSS pixels that triggers the next fetch.
    pub scroll_threshold_px: f64,
    /// Inclusive salary ceiling enforced by the salary editor.
    pub salary_max: i64,
    /// Comment store location. `None` keeps comments in memory only.
    pub db_path: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            salary_max: SALARY_MAX,
            db_path: None,
        }
    }
}

impl GridConfig {
    /// Parses configuration JSON and validates it.
    ///
    /// Omitted keys fall back to defaults; unknown keys are rejected.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeOutOfRange(self.page_size));
        }
        if !self.scroll_threshold_px.is_finite() || self.scroll_threshold_px < 0.0 {
            return Err(ConfigError::InvalidScrollThreshold(self.scroll_threshold_px));
        }
        if self.salary_max <= 0 || self.salary_max > SALARY_MAX {
            return Err(ConfigError::InvalidSalaryMax(self.salary_max));
        }
        Ok(())
    }
}

/// Configuration parse/validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    PageSizeOutOfRange(usize),
    InvalidScrollThreshold(f64),
    InvalidSalaryMax(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid grid config: {message}"),
            Self::PageSizeOutOfRange(value) => {
                write!(f, "page_size {value} outside 1..={MAX_PAGE_SIZE}")
            }
            Self::InvalidScrollThreshold(value) => {
                write!(f, "scroll_threshold_px must be a non-negative number, got {value}")
            }
            Self::InvalidSalaryMax(value) => {
                write!(f, "salary_max {value} outside 1..={SALARY_MAX}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GridConfig};

    #[test]
    fn empty_object_yields_defaults() {
        let config = GridConfig::from_json_str("{}").expect("defaults should parse");
        assert_eq!(config, GridConfig::default());
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn oversized_page_is_rejected() {
        let err = GridConfig::from_json_str(r#"{"page_size": 50}"#)
            .expect_err("page size above 20 must fail");
        assert_eq!(err, ConfigError::PageSizeOutOfRange(50));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = GridConfig::from_json_str(r#"{"viewport": 1}"#).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn db_path_is_parsed() {
        let config = GridConfig::from_json_str(r#"{"db_path": "/tmp/grid.sqlite3"}"#)
            .expect("db_path should parse");
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/grid.sqlite3"))
        );
    }
}

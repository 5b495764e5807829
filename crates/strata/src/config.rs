//! # Probe Configuration
//!
//! Settings for the probe scenarios, read from TOML. Every field has a
//! default, so an empty file (or no file) is valid.
//!
//! ```toml
//! elements = 256
//! fail_at_clone = 100
//! log_filter = "strata=debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a probe configuration.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ProbeConfig`].
    #[error("invalid probe config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parse but cannot be run.
    #[error("unusable probe config: {0}")]
    Invalid(String),
}

/// Result type for probe configuration.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Largest list the probe arenas are sized for.
pub const MAX_ELEMENTS: usize = 1024;

/// Settings for [`ProbeRunner`](crate::probe::ProbeRunner).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Elements per list in each scenario.
    pub elements: usize,
    /// Which clone (0-based) the instrumented element refuses.
    pub fail_at_clone: usize,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            elements: 64,
            fail_at_clone: 17,
            log_filter: "info".to_string(),
        }
    }
}

impl ProbeConfig {
    /// Largest lists and verbose logging, for chasing a failing scenario.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            elements: MAX_ELEMENTS,
            fail_at_clone: 777,
            log_filter: "strata=debug,strata_list=debug,strata_alloc=debug".to_string(),
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Parse`] for malformed TOML or unknown keys,
    /// [`ProbeError::Invalid`] for values the scenarios cannot use.
    pub fn from_toml_str(text: &str) -> ProbeResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Io`] if the file cannot be read, otherwise as
    /// [`ProbeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "probe config loaded");
        Ok(config)
    }

    /// Checks the values against what the scenarios need.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Invalid`] if `elements` is outside `1..=MAX_ELEMENTS`
    /// or `fail_at_clone` does not fall inside the list.
    pub fn validate(&self) -> ProbeResult<()> {
        if !(1..=MAX_ELEMENTS).contains(&self.elements) {
            return Err(ProbeError::Invalid(format!(
                "elements ({}) must be between 1 and {MAX_ELEMENTS}",
                self.elements
            )));
        }
        if self.fail_at_clone >= self.elements {
            return Err(ProbeError::Invalid(format!(
                "fail_at_clone ({}) must be below elements ({})",
                self.fail_at_clone, self.elements
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ProbeConfig::default().validate().is_ok());
        assert!(ProbeConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ProbeConfig::from_toml_str("").unwrap(), ProbeConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = ProbeConfig::from_toml_str("elements = 8\nfail_at_clone = 3\n").unwrap();
        assert_eq!(config.elements, 8);
        assert_eq!(config.fail_at_clone, 3);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ProbeConfig::from_toml_str("element = 8").unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }

    #[test]
    fn test_oversized_list_is_rejected() {
        let err = ProbeConfig::from_toml_str("elements = 5000").unwrap_err();
        assert!(matches!(err, ProbeError::Invalid(_)));
    }

    #[test]
    fn test_failure_index_outside_list_is_rejected() {
        let err = ProbeConfig::from_toml_str("elements = 4\nfail_at_clone = 4").unwrap_err();
        assert!(matches!(err, ProbeError::Invalid(_)));
        assert!(err.to_string().contains("fail_at_clone (4)"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ProbeConfig::load("/nonexistent/strata/probe.toml").unwrap_err();
        assert!(matches!(err, ProbeError::Io { .. }));
        assert!(err.to_string().contains("probe.toml"));
    }
}

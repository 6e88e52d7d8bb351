//! Graph configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Failure to load a [`GraphConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Content is not a valid configuration
    #[error("invalid graph config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid graph config: {0}")]
    Invalid(String),
}

/// Tunables of a [`ModelGraph`](crate::ModelGraph)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Deepest chain of nested realizations before giving up
    pub max_realization_depth: usize,
    /// Reject every registration once any realization has started, not
    /// only those for subjects already started
    pub freeze_on_first_realize: bool,
    /// Run [`ModelGraph::finalize`](crate::ModelGraph::finalize) before the
    /// first realization
    pub finalize_before_realize: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_realization_depth: 256,
            freeze_on_first_realize: false,
            finalize_before_realize: false,
        }
    }
}

impl GraphConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With maximum realization depth, at least 1
    #[inline]
    #[must_use]
    pub fn with_max_realization_depth(mut self, depth: usize) -> Self {
        self.max_realization_depth = depth.max(1);
        self
    }

    /// With freeze-on-first-realize
    #[inline]
    #[must_use]
    pub fn with_freeze_on_first_realize(mut self, freeze: bool) -> Self {
        self.freeze_on_first_realize = freeze;
        self
    }

    /// With finalize-before-realize
    #[inline]
    #[must_use]
    pub fn with_finalize_before_realize(mut self, finalize: bool) -> Self {
        self.finalize_before_realize = finalize;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed input and
    /// [`ConfigError::Invalid`] for a zero depth.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// As [`from_toml_str`](Self::from_toml_str), plus [`ConfigError::Io`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_realization_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_realization_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

use crate::error::{ConfiguratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Charts root used when neither the CLI nor a config file names one
pub const DEFAULT_CHARTS_DIR: &str = "helm-chart/mediamicroservices/charts";

/// Settings for a [`crate::LatencyConfigurator`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorConfig {
    /// Directory holding one subdirectory per service chart
    #[serde(default = "default_charts_dir")]
    pub charts_dir: PathBuf,

    /// Also write the integer `container.extraLatencyMs` field
    #[serde(default)]
    pub legacy_field: bool,
}

fn default_charts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CHARTS_DIR)
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            charts_dir: default_charts_dir(),
            legacy_field: false,
        }
    }
}

impl ConfiguratorConfig {
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_legacy_field(mut self, enabled: bool) -> Self {
        self.legacy_field = enabled;
        self
    }

    /// Load configuration from a YAML file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfiguratorError::Config`] if the file cannot be read or is not
    /// a valid configuration document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfiguratorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        // An empty file deserializes as null rather than an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| {
            ConfiguratorError::Config(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Path of the values file for one service
    pub fn values_path(&self, service_name: &str) -> PathBuf {
        self.charts_dir.join(service_name).join("values.yaml")
    }
}

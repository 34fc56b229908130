use crate::config::ConfiguratorConfig;
use crate::error::{ConfiguratorError, Result};
use crate::latency::{format_latency, parse_latency};
use crate::report::{BatchReport, LatencyReading, ServiceOutcome};
use crate::values;
use std::fs;
use tracing::{debug, info, warn};

/// Edits the `EXTRA_LATENCY` setting in service chart values files
pub struct LatencyConfigurator {
    config: ConfiguratorConfig,
}

impl LatencyConfigurator {
    pub fn new(config: ConfiguratorConfig) -> Self {
        Self { config }
    }

    /// Set `EXTRA_LATENCY` to `"<latency_ms>ms"` for one service.
    ///
    /// Never fails: any problem is returned as [`ServiceOutcome::Skipped`]
    /// and the file is not modified, except on a failed write where it may
    /// be left partially written.
    pub fn update_extra_latency(&self, service_name: &str, latency_ms: i64) -> ServiceOutcome {
        match self.try_update(service_name, latency_ms) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(service = service_name, error = %reason, "Skipping service");
                ServiceOutcome::Skipped {
                    service: service_name.to_string(),
                    reason,
                }
            }
        }
    }

    fn try_update(&self, service_name: &str, latency_ms: i64) -> Result<ServiceOutcome> {
        let path = self.config.values_path(service_name);
        if !path.is_file() {
            return Err(ConfiguratorError::MissingFile {
                service: service_name.to_string(),
                path,
            });
        }

        debug!(service = service_name, path = %path.display(), "Loading values file");
        let mut doc = values::load(&path)?;

        values::apply_extra_latency(&mut doc, latency_ms, self.config.legacy_field).map_err(
            |violation| ConfiguratorError::Schema {
                path: path.clone(),
                reason: violation.to_string(),
            },
        )?;

        values::store(&path, &doc)?;

        let value = format_latency(latency_ms);
        info!(service = service_name, latency_ms, path = %path.display(), "Updated EXTRA_LATENCY");
        Ok(ServiceOutcome::Updated {
            service: service_name.to_string(),
            latency_ms,
            value,
            path,
        })
    }

    /// Names of the service directories under the charts root, sorted.
    ///
    /// # Errors
    ///
    /// [`ConfiguratorError::MissingBaseDirectory`] when the charts root does not
    /// exist, [`ConfiguratorError::NoServicesFound`] when it has no
    /// subdirectories, [`ConfiguratorError::ListDirectory`] when it cannot be read.
    pub fn discover_services(&self) -> Result<Vec<String>> {
        let charts_dir = &self.config.charts_dir;
        if !charts_dir.is_dir() {
            return Err(ConfiguratorError::MissingBaseDirectory(charts_dir.clone()));
        }

        let list_err = |source: std::io::Error| ConfiguratorError::ListDirectory {
            path: charts_dir.clone(),
            source,
        };

        let mut services = Vec::new();
        for entry in fs::read_dir(charts_dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => services.push(name),
                Err(raw) => warn!(name = ?raw, "Ignoring service directory with non UTF-8 name"),
            }
        }

        if services.is_empty() {
            return Err(ConfiguratorError::NoServicesFound(charts_dir.clone()));
        }

        services.sort();
        debug!(count = services.len(), charts_dir = %charts_dir.display(), "Discovered services");
        Ok(services)
    }

    /// Reset every discovered service to zero latency.
    ///
    /// Each service is handled independently; a failure on one never stops the
    /// others.
    ///
    /// # Errors
    ///
    /// Only when the services themselves cannot be discovered, see
    /// [`Self::discover_services`]. Nothing is written in that case.
    pub fn reset_all_services(&self) -> Result<BatchReport> {
        let services = self.discover_services()?;
        info!(count = services.len(), "Resetting EXTRA_LATENCY for all services");

        Ok(services
            .iter()
            .map(|service| self.update_extra_latency(service, 0))
            .collect())
    }

    /// Effective latency of every discovered service, without modifying anything.
    ///
    /// # Errors
    ///
    /// Same as [`Self::discover_services`]. Per-service read problems are
    /// reported inside each [`LatencyReading`].
    pub fn show_services(&self) -> Result<Vec<LatencyReading>> {
        Ok(self
            .discover_services()?
            .into_iter()
            .map(|service| self.read_service(service))
            .collect())
    }

    fn read_service(&self, service: String) -> LatencyReading {
        let path = self.config.values_path(&service);
        if !path.is_file() {
            let reason = ConfiguratorError::MissingFile {
                service: service.clone(),
                path,
            };
            return LatencyReading {
                service,
                raw: None,
                effective_ms: Err(reason),
            };
        }

        match values::load(&path) {
            Ok(doc) => {
                let raw = values::read_extra_latency(&doc);
                let effective = raw.as_deref().map_or(0, parse_latency);
                LatencyReading {
                    service,
                    raw,
                    effective_ms: Ok(effective),
                }
            }
            Err(reason) => LatencyReading {
                service,
                raw: None,
                effective_ms: Err(reason),
            },
        }
    }
}

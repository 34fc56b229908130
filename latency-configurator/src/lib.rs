//! Artificial latency configuration for the media microservices Helm charts
//!
//! Every service chart under the charts root carries a `values.yaml` whose
//! `container.env` list is rendered into the service's environment. Services
//! read `EXTRA_LATENCY` at startup and sleep that long on each request. This
//! crate edits that entry:
//!
//! - Set the latency of a single service
//! - Reset every service back to zero
//! - Show the latency each service would currently apply
//! - Optionally keep the legacy `container.extraLatencyMs` field in sync
//!
//! Failures are reported per service and never abort a batch.
//!
//! # Example
//!
//! ```no_run
//! use latency_configurator::{ConfiguratorConfig, LatencyConfigurator};
//!
//! let configurator = LatencyConfigurator::new(ConfiguratorConfig::new("helm-chart/charts"));
//!
//! let outcome = configurator.update_extra_latency("movie-id-service", 50);
//! println!("{} updated: {}", outcome.service(), outcome.is_updated());
//!
//! if let Ok(report) = configurator.reset_all_services() {
//!     println!("{} services reset", report.updated().count());
//! }
//! ```

pub mod config;
pub mod configurator;
pub mod error;
pub mod latency;
pub mod report;
pub mod values;

pub use config::*;
pub use configurator::*;
pub use error::*;
pub use latency::{format_latency, parse_latency, EXTRA_LATENCY_ENV, LEGACY_LATENCY_FIELD};
pub use report::*;

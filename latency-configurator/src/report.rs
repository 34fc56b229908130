//! Per-service results and how they are shown to the user.

use crate::error::ConfiguratorError;
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;

/// What happened to one service
#[derive(Debug)]
pub enum ServiceOutcome {
    Updated {
        service: String,
        latency_ms: i64,
        value: String,
        path: PathBuf,
    },
    Skipped {
        service: String,
        reason: ConfiguratorError,
    },
}

impl ServiceOutcome {
    pub fn service(&self) -> &str {
        match self {
            Self::Updated { service, .. } | Self::Skipped { service, .. } => service,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    /// Write the status line for this outcome. Confirmations go to `out`,
    /// skips to `err`.
    ///
    /// # Errors
    ///
    /// Propagates failures from the underlying writers.
    pub fn render(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Updated {
                service,
                value,
                path,
                ..
            } => writeln!(
                out,
                "{} Updated EXTRA_LATENCY to {} for {} in {}",
                "✓".green(),
                value.bright_white(),
                service.cyan(),
                path.display()
            ),
            Self::Skipped { service, reason } => writeln!(
                err,
                "{} Skipped {}: {}",
                "Error:".red().bold(),
                service.cyan(),
                reason
            ),
        }
    }
}

/// Outcomes of a multi-service run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<ServiceOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[ServiceOutcome] {
        &self.outcomes
    }

    pub fn updated(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| o.is_updated())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| !o.is_updated())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Write the summary line, one line per service, then a single
    /// completion line.
    ///
    /// # Errors
    ///
    /// Propagates failures from the underlying writers.
    pub fn render(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "Resetting EXTRA_LATENCY to 0 for {} services...",
            self.len()
        )?;
        for outcome in &self.outcomes {
            outcome.render(out, err)?;
        }
        writeln!(
            out,
            "{} Finished resetting all services ({} updated, {} skipped)",
            "✓".green(),
            self.updated().count(),
            self.skipped().count()
        )
    }
}

impl FromIterator<ServiceOutcome> for BatchReport {
    fn from_iter<I: IntoIterator<Item = ServiceOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Effective latency of one service as its runtime would see it
#[derive(Debug)]
pub struct LatencyReading {
    pub service: String,
    /// Raw `EXTRA_LATENCY` value, `None` when the entry is absent
    pub raw: Option<String>,
    /// Parsed delay in milliseconds, or why the file could not be read
    pub effective_ms: Result<i64, ConfiguratorError>,
}

impl LatencyReading {
    /// # Errors
    ///
    /// Propagates failures from the underlying writers.
    pub fn render(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
        match &self.effective_ms {
            Ok(ms) => writeln!(
                out,
                "{:<32} {:>8}ms  ({})",
                self.service.cyan(),
                ms,
                self.raw.as_deref().unwrap_or("unset")
            ),
            Err(reason) => writeln!(
                err,
                "{} {}: {}",
                "Error:".red().bold(),
                self.service.cyan(),
                reason
            ),
        }
    }
}

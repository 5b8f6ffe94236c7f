//! Metric reporting
//!
//! The metrics backend receives one `(name, unit, value)` triple per
//! surviving metric. Supported sinks:
//! - Console (human-readable)
//! - JSON lines
//! - CSV
//! - In-memory recording (tests)

use std::io::{self, Write};

use clap::ValueEnum;
use tracing::warn;

/// Receiver of reported metrics
///
/// The order of calls within a cycle is not stable.
pub trait Reporter {
    fn report(&mut self, name: &str, unit: &str, value: f64);

    /// Called once after the last metric of a cycle
    fn flush(&mut self) {}
}

/// Output format for `ConsoleReporter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Csv,
}

/// Writes metrics to a stream in one of the `OutputFormat`s
pub struct ConsoleReporter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    /// Reporter writing to stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_metric(&mut self, name: &str, unit: &str, value: f64) -> io::Result<()> {
        match self.format {
            OutputFormat::Console => writeln!(self.out, "{} = {:.3} [{}]", name, value, unit),
            OutputFormat::Json => {
                let line = serde_json::json!({
                    "name": name,
                    "unit": unit,
                    "value": value,
                });
                writeln!(self.out, "{}", line)
            }
            OutputFormat::Csv => writeln!(self.out, "{},{},{}", csv_field(name), unit, value),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, name: &str, unit: &str, value: f64) {
        if let Err(e) = self.write_metric(name, unit, value) {
            warn!("Failed to write metric {}: {}", name, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("Failed to flush metrics output: {}", e);
        }
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Keeps every reported triple in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub reported: Vec<(String, String, f64)>,
    pub flushes: usize,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.reported.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.reported
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, v)| *v)
    }

    pub fn unit_of(&self, name: &str) -> Option<&str> {
        self.reported
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, u, _)| u.as_str())
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, name: &str, unit: &str, value: f64) {
        self.reported.push((name.to_string(), unit.to_string(), value));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

//! Command-line interface definitions for portprobe.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags take
//! precedence over the settings file, which takes precedence over defaults.

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::probes::{ProbeCatalog, ServiceIdentifier};
use crate::scanner::{run_scan, ScanJobConfig, ScanMode, TcpConnectScanner};
use crate::services::ServiceRegistry;
use crate::types::{PortList, Target};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Concurrent TCP connect scanner with service and version detection.
#[derive(Parser, Debug)]
#[command(name = "portprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP port scanner with service detection", long_about = None)]
pub struct Cli {
    /// Target IP address or hostname (IPv6 may be bracketed)
    #[arg(short = 'u', long, value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,443,8000-9000")
    #[arg(short, long, default_value = "1-1000")]
    pub ports: String,

    /// Probe open ports to identify the service version
    #[arg(short = 's', long = "service-version")]
    pub service_version: bool,

    /// Force targeted or sweep reporting instead of deciding by port count
    #[arg(long, value_enum)]
    pub mode: Option<ScanMode>,

    /// Maximum number of concurrent scanning tasks
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Port/service name registry file
    #[arg(long, value_name = "PATH")]
    pub services_file: Option<PathBuf>,

    /// Try generic probes when a port's own probes do not match
    #[arg(long)]
    pub fallback_probes: bool,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Verbose output (show scanning progress)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a custom settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl Cli {
    /// Merge the settings file with command-line overrides.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let mut settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };

        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            settings.connect_timeout_ms = timeout;
        }
        if let Some(path) = &self.services_file {
            settings.services_file = path.clone();
        }
        if self.fallback_probes {
            settings.fallback_probes = true;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Run the scan described by the parsed arguments and print the report.
    pub async fn execute(&self) -> CliResult<()> {
        let ports: PortList = self.ports.parse()?;
        let target = Target::parse(&self.target)?;
        let settings = self.settings()?;
        debug!(?settings, "effective settings");

        let registry = Arc::new(ServiceRegistry::load_or_empty(&settings.services_file));
        info!(entries = registry.len(), "service registry ready");

        let mut scanner = TcpConnectScanner::new(target.clone(), registry)
            .with_timeout(settings.connect_timeout());

        if self.service_version {
            let catalog = Arc::new(ProbeCatalog::builtin()?);
            let identifier = ServiceIdentifier::new(catalog)
                .with_session_timeout(settings.probe_session_timeout())
                .with_read_timeout(settings.probe_read_timeout())
                .with_fallback(settings.fallback_probes);
            scanner = scanner.with_identifier(identifier);
        }

        let mut job = ScanJobConfig::new(ports).with_concurrency(settings.concurrency);
        if let Some(mode) = self.mode {
            job = job.with_mode(mode);
        }
        if self.verbose && self.output == OutputFormat::Plain {
            job = job.with_progress();
        }

        if !self.quiet && self.output == OutputFormat::Plain {
            output::print_info(&format!(
                "Scanning {} ({} ports, {} mode)",
                target,
                job.ports.len(),
                job.effective_mode()
            ));
        }

        let report = run_scan(Arc::new(scanner), job).await;
        output::print_results(&report, self.output)?;

        Ok(())
    }
}

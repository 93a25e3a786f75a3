//! Scanner module - dispatches port scans across a bounded worker pool.
//!
//! One tokio task is spawned per requested port. A semaphore caps how many
//! of them run network I/O at once, and each task publishes its record on
//! an mpsc channel. The channel closes when the last task drops its sender,
//! which ends the aggregator's receive loop.

pub mod aggregator;
pub mod tcp;
pub mod traits;

use crate::types::PortList;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

pub use aggregator::{collect_results, ScanReport};
pub use tcp::{classify, TcpConnectScanner, DEFAULT_CONNECT_TIMEOUT};
pub use traits::{PortState, ScanMode, ScanResult, Scanner};

/// Default ceiling on concurrently running scan tasks.
pub const DEFAULT_CONCURRENCY: usize = 1000;

/// Configuration for a scan job: which ports and how to run them.
#[derive(Debug, Clone)]
pub struct ScanJobConfig {
    /// Ports to scan, in request order.
    pub ports: PortList,
    /// Maximum number of tasks doing network I/O at once.
    pub concurrency: usize,
    /// Explicit visibility mode; inferred from the port count when unset.
    pub mode: Option<ScanMode>,
    /// Show a progress bar on stderr.
    pub progress: bool,
}

impl ScanJobConfig {
    /// Create a job configuration for the given ports.
    pub fn new(ports: PortList) -> Self {
        Self {
            ports,
            concurrency: DEFAULT_CONCURRENCY,
            mode: None,
            progress: false,
        }
    }

    /// Set the concurrency limit. Zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Force the visibility mode instead of inferring it.
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Enable the progress bar.
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }

    /// The visibility mode this job runs under.
    pub fn effective_mode(&self) -> ScanMode {
        self.mode
            .unwrap_or_else(|| ScanMode::from_port_count(self.ports.len()))
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("=>-")),
        Err(e) => warn!("invalid progress template: {}", e),
    }
    pb
}

/// Execute a complete port scan.
///
/// Every port gets its own task; results the mode does not report are
/// dropped by the task before publication. There is no way to cancel a
/// running scan: it returns once every task has finished.
pub async fn run_scan<S>(scanner: Arc<S>, job: ScanJobConfig) -> ScanReport
where
    S: Scanner + 'static,
{
    let started_at = Local::now();
    let start = Instant::now();
    let mode = job.effective_mode();
    let total = job.ports.len();

    info!(
        target_host = %scanner.target(),
        ports = total,
        %mode,
        concurrency = job.concurrency,
        "starting scan"
    );

    let progress = job.progress.then(|| progress_bar(total));
    let semaphore = Arc::new(Semaphore::new(job.concurrency));
    let (tx, rx) = mpsc::channel(total.max(1));

    for port in job.ports {
        let scanner = Arc::clone(&scanner);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let progress = progress.clone();

        tokio::spawn(async move {
            let result = {
                let Ok(_permit) = semaphore.acquire().await else {
                    warn!(port = port.as_u16(), "worker pool closed; port skipped");
                    return;
                };
                scanner.scan_port(port).await
            };

            if let Some(pb) = &progress {
                pb.inc(1);
                if result.state.is_reachable() {
                    pb.set_message(format!("Found open port: {}", port));
                }
            }

            if mode.emits(result.state) {
                // The receiver lives until every sender is gone.
                let _ = tx.send(result).await;
            }
        });
    }
    drop(tx);

    let results = collect_results(rx).await;

    if let Some(pb) = progress {
        pb.finish_with_message("Scan complete");
    }

    let report = ScanReport::new(
        scanner.target().to_string(),
        mode,
        scanner.detects_services(),
        started_at,
        total,
        start.elapsed(),
        results,
    );

    info!(
        reported = report.results.len(),
        open = report.open_ports,
        duration_ms = report.duration_ms,
        "scan finished"
    );

    report
}

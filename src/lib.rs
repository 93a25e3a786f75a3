//! # portprobe
//!
//! A concurrent TCP connect scanner for a single host, with optional
//! probe-based service and version identification.
//!
//! Every requested port is checked by its own task, bounded by a
//! semaphore. Small scans report every port; large scans (50 ports or
//! more) run in sweep mode and only report reachable ports.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portprobe::scanner::{run_scan, ScanJobConfig, TcpConnectScanner};
//! use portprobe::services::ServiceRegistry;
//! use portprobe::types::Target;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let target = Target::parse("127.0.0.1").unwrap();
//!     let registry = Arc::new(ServiceRegistry::load_or_empty("/usr/share/nmap/nmap-services"));
//!     let scanner = Arc::new(TcpConnectScanner::new(target, registry));
//!
//!     let report = run_scan(scanner, ScanJobConfig::new("22,80,443".parse().unwrap())).await;
//!     for result in &report.results {
//!         println!("{}/tcp {} {}", result.port, result.state, result.service);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port and target newtypes
//! - [`scanner`] - Connect scanner, worker pool, and result aggregation
//! - [`probes`] - Probe catalog and service identification
//! - [`services`] - Port to service name registry
//! - [`config`] - Settings file handling
//! - [`output`] - Plain, JSON, and CSV rendering
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod probes;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use probes::{Identification, ProbeCatalog, ServiceIdentifier};
pub use scanner::{PortState, ScanMode, ScanReport, ScanResult, Scanner, TcpConnectScanner};
pub use services::ServiceRegistry;
pub use types::{Port, PortList, Target};

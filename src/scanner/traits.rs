//! Scanner trait abstraction and the records it produces.
//!
//! Defines a common interface for port scanners so the dispatcher can be
//! driven by substitutes in tests.

use crate::types::{Port, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability state of a scanned port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// The TCP handshake completed.
    Open,
    /// The connection was actively refused or failed.
    Closed,
    /// The connection attempt timed out.
    Filtered,
    /// Connected, but a probe reply shows an access wrapper gating the service.
    #[serde(rename = "tcpwrapped")]
    TcpWrapped,
}

impl PortState {
    /// Whether the TCP connection itself succeeded.
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Open | Self::TcpWrapped)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
            Self::TcpWrapped => write!(f, "tcpwrapped"),
        }
    }
}

/// Result of scanning a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// The port that was scanned.
    pub port: Port,
    /// State determined by the scan.
    pub state: PortState,
    /// Detected or registry-provided service name.
    pub service: String,
    /// Version text extracted by a probe.
    pub version: String,
}

impl ScanResult {
    /// A fresh record; ports start out as filtered until proven otherwise.
    pub fn new(port: Port) -> Self {
        Self {
            port,
            state: PortState::Filtered,
            service: String::new(),
            version: String::new(),
        }
    }

    pub fn with_state(mut self, state: PortState) -> Self {
        self.state = state;
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// Which results a scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Report every requested port, whatever its state.
    Targeted,
    /// Report only ports that accepted a connection.
    Sweep,
}

impl ScanMode {
    /// Port count at which a scan is treated as a sweep.
    pub const SWEEP_THRESHOLD: usize = 50;

    /// Infer the mode from the number of requested ports.
    pub fn from_port_count(count: usize) -> Self {
        if count < Self::SWEEP_THRESHOLD {
            Self::Targeted
        } else {
            Self::Sweep
        }
    }

    /// Whether a result in `state` is published under this mode.
    pub fn emits(self, state: PortState) -> bool {
        match self {
            Self::Targeted => true,
            Self::Sweep => state.is_reachable(),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Targeted => write!(f, "targeted"),
            Self::Sweep => write!(f, "sweep"),
        }
    }
}

/// Trait for port scanner implementations.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// The host being scanned.
    fn target(&self) -> &Target;

    /// Whether open ports are probed for service and version.
    fn detects_services(&self) -> bool {
        false
    }

    /// Scan a single port and return its finalised record.
    async fn scan_port(&self, port: Port) -> ScanResult;
}

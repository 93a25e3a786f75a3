//! Probe-driven service and version identification.
//!
//! Works on any async byte stream, so the same code drives live
//! `TcpStream`s and in-memory test endpoints.

use super::catalog::{ProbeCatalog, ServiceProbe, TCPWRAPPED};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, trace};

/// Maximum bytes read per probe response.
pub const RESPONSE_BUFFER_SIZE: usize = 1024;

/// Default ceiling for a whole identification session.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout for a single probe.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of identifying the service behind an open port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// A probe response matched one of its rules.
    Matched {
        probe: String,
        service: String,
        version: String,
    },
    /// The matching rule flagged the service as access-wrapped.
    Wrapped { probe: String },
    /// No probe produced a match.
    Unidentified,
}

/// Sends catalog probes to an open connection and matches the replies.
#[derive(Debug, Clone)]
pub struct ServiceIdentifier {
    catalog: Arc<ProbeCatalog>,
    session_timeout: Duration,
    read_timeout: Duration,
    use_fallback: bool,
}

impl ServiceIdentifier {
    pub fn new(catalog: Arc<ProbeCatalog>) -> Self {
        Self {
            catalog,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            use_fallback: false,
        }
    }

    /// Set the ceiling for a whole identification session.
    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    /// Set the read timeout for each probe.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Try the generic fallback probes when the port's own probes miss.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.use_fallback = enabled;
        self
    }

    /// Identify the service on `stream`, which is connected to `port`.
    ///
    /// Probes run in catalog order and the first match ends the session.
    /// Write errors, read errors, timeouts and non-matching replies move on
    /// to the next probe.
    pub async fn identify<S>(&self, stream: &mut S, port: u16) -> Identification
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let deadline = Instant::now() + self.session_timeout;

        for probe in self.catalog.probes_for(port) {
            if let Some(found) = self.run_probe(stream, probe, deadline, false).await {
                debug!(port, probe = probe.name(), outcome = ?found, "service identified");
                return found;
            }
        }

        if self.use_fallback {
            for probe in self.catalog.fallback() {
                if let Some(found) = self.run_probe(stream, probe, deadline, true).await {
                    debug!(port, probe = probe.name(), outcome = ?found, "service identified by fallback probe");
                    return found;
                }
            }
        }

        debug!(port, "no probe matched");
        Identification::Unidentified
    }

    async fn run_probe<S>(
        &self,
        stream: &mut S,
        probe: &ServiceProbe,
        deadline: Instant,
        fallback: bool,
    ) -> Option<Identification>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if !probe.payload().is_empty() {
            match timeout_at(deadline, stream.write_all(probe.payload())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    trace!(probe = probe.name(), error = %e, "probe write failed");
                    return None;
                }
                Err(_) => {
                    trace!(probe = probe.name(), "probe write timed out");
                    return None;
                }
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let mut buffer = [0u8; RESPONSE_BUFFER_SIZE];
        let n = match timeout(self.read_timeout.min(remaining), stream.read(&mut buffer)).await {
            Ok(Ok(n)) if n > 0 => n,
            Ok(Ok(_)) => {
                trace!(probe = probe.name(), "connection closed before reply");
                return None;
            }
            Ok(Err(e)) => {
                trace!(probe = probe.name(), error = %e, "probe read failed");
                return None;
            }
            Err(_) => {
                trace!(probe = probe.name(), "probe read timed out");
                return None;
            }
        };

        let (rule, captured) = probe.evaluate(&buffer[..n])?;
        trace!(probe = probe.name(), pattern = rule.pattern(), "rule matched");

        if captured == TCPWRAPPED || rule.service() == TCPWRAPPED {
            return Some(Identification::Wrapped {
                probe: probe.name().to_string(),
            });
        }

        // Whole-match captures identify the service but carry no version.
        let version = match (fallback, rule.capture_index()) {
            (true, 0) => String::new(),
            (true, _) => clean_version(&captured),
            (false, _) => captured,
        };

        Some(Identification::Matched {
            probe: probe.name().to_string(),
            service: rule.service().to_string(),
            version,
        })
    }
}

/// Normalise version text extracted by a generic fallback probe.
fn clean_version(raw: &str) -> String {
    let version = raw.trim();
    let version = version
        .strip_prefix("version ")
        .or_else(|| version.strip_prefix("Version "))
        .unwrap_or(version);
    version
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string()
}

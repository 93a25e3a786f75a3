//! TCP Connect Scanner implementation.
//!
//! Performs standard TCP connect scans using the operating system's
//! socket API, then optionally hands the open connection to the
//! [`ServiceIdentifier`].

use crate::error::{ConnectResult, ScanError};
use crate::probes::{Identification, ServiceIdentifier};
use crate::scanner::traits::{PortState, ScanResult, Scanner};
use crate::services::ServiceRegistry;
use crate::types::{Port, Target};
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Map a failed connection attempt to a port state.
///
/// Timeouts mean something swallowed the handshake; every other failure,
/// refusals included, counts as closed.
pub fn classify(error: &ScanError) -> PortState {
    match error {
        ScanError::Timeout => PortState::Filtered,
        ScanError::Io(e) if e.kind() == io::ErrorKind::TimedOut => PortState::Filtered,
        _ => PortState::Closed,
    }
}

/// TCP Connect Scanner.
///
/// Does not require elevated privileges. Service identification runs only
/// when an identifier is attached.
pub struct TcpConnectScanner {
    target: Target,
    timeout: Duration,
    registry: Arc<ServiceRegistry>,
    identifier: Option<ServiceIdentifier>,
}

impl TcpConnectScanner {
    /// Create a new TCP connect scanner.
    ///
    /// # Arguments
    /// * `target` - Host to scan
    /// * `registry` - Default service names attached to each record
    pub fn new(target: Target, registry: Arc<ServiceRegistry>) -> Self {
        Self {
            target,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            registry,
            identifier: None,
        }
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable service/version detection on open ports.
    pub fn with_identifier(mut self, identifier: ServiceIdentifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Attempt to connect to the target address.
    async fn attempt_connect(&self, address: &str) -> ConnectResult<TcpStream> {
        match timeout(self.timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                Err(ScanError::ConnectionRefused)
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => Err(ScanError::Io(e)),
            Ok(Err(e)) => Err(ScanError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScanError::Timeout),
        }
    }
}

#[async_trait]
impl Scanner for TcpConnectScanner {
    fn target(&self) -> &Target {
        &self.target
    }

    fn detects_services(&self) -> bool {
        self.identifier.is_some()
    }

    async fn scan_port(&self, port: Port) -> ScanResult {
        let port_num = port.as_u16();
        let address = self.target.address(port_num);
        let result = ScanResult::new(port).with_service(self.registry.service_name(port_num));

        let mut stream = match self.attempt_connect(&address).await {
            Ok(stream) => stream,
            Err(e) => {
                let state = classify(&e);
                debug!(%address, error = %e, %state, "connect failed");
                return result.with_state(state);
            }
        };

        debug!(%address, "port open");
        let result = result.with_state(PortState::Open);

        let Some(identifier) = &self.identifier else {
            return result;
        };

        // The stream is dropped, closing the connection, when this returns.
        match identifier.identify(&mut stream, port_num).await {
            Identification::Matched {
                service, version, ..
            } => {
                let result = result.with_version(version);
                if service.is_empty() {
                    result
                } else {
                    result.with_service(service)
                }
            }
            Identification::Wrapped { .. } => result.with_state(PortState::TcpWrapped),
            Identification::Unidentified => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::{ProbeCatalog, ProbeMatch, ServiceProbe};
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn localhost() -> Target {
        Target::parse("127.0.0.1").unwrap()
    }

    fn registry() -> Arc<ServiceRegistry> {
        let table = "echo\t7/tcp\nredis\t6379/tcp\n";
        Arc::new(ServiceRegistry::from_reader(Cursor::new(table)).unwrap())
    }

    /// A port that nothing is listening on.
    async fn closed_port() -> Port {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Port::new(port).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&ScanError::Timeout), PortState::Filtered);
        assert_eq!(classify(&ScanError::ConnectionRefused), PortState::Closed);
        assert_eq!(
            classify(&ScanError::Io(io::Error::from(io::ErrorKind::TimedOut))),
            PortState::Filtered
        );
        assert_eq!(
            classify(&ScanError::ConnectionFailed {
                address: "example.invalid:80".to_string(),
                reason: "no such host".to_string(),
            }),
            PortState::Closed
        );
    }

    #[test]
    fn test_scanner_creation() {
        let scanner = TcpConnectScanner::new(localhost(), registry());
        assert_eq!(scanner.target(), &localhost());
        assert_eq!(scanner.timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(!scanner.detects_services());
    }

    #[tokio::test]
    async fn test_scan_closed_port() {
        let scanner = TcpConnectScanner::new(localhost(), registry())
            .with_timeout(Duration::from_millis(500));

        let port = closed_port().await;
        let result = scanner.scan_port(port).await;

        assert_eq!(result.port, port);
        assert_eq!(result.state, PortState::Closed);
        assert!(result.version.is_empty());
    }

    #[tokio::test]
    async fn test_scan_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let scanner = TcpConnectScanner::new(localhost(), registry());
        let result = scanner.scan_port(port).await;

        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.service, "unknown");
        assert!(result.version.is_empty());
    }

    #[tokio::test]
    async fn test_scan_identifies_service() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 6];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"INFO\r\n");
            socket
                .write_all(b"# Server\r\nredis_version:7.0.0\r\n")
                .await
                .unwrap();
        });

        let mut catalog = ProbeCatalog::new();
        catalog.insert(
            port,
            ServiceProbe::new("Redis", "INFO\r\n")
                .with_match(ProbeMatch::new(r"redis_version:([^\r\n]+)", 1, "redis").unwrap()),
        );
        let scanner = TcpConnectScanner::new(localhost(), registry())
            .with_identifier(ServiceIdentifier::new(Arc::new(catalog)));

        let result = scanner.scan_port(Port::new(port).unwrap()).await;
        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.service, "redis");
        assert_eq!(result.version, "7.0.0");
    }

    #[tokio::test]
    async fn test_scan_tcpwrapped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(b"tcpwrapped\n").await.unwrap();
        });

        let mut catalog = ProbeCatalog::new();
        catalog.insert(
            port,
            ServiceProbe::new("Gate", "HELO\n")
                .with_match(ProbeMatch::new(r"^(\w+)", 1, "gate").unwrap()),
        );
        let scanner = TcpConnectScanner::new(localhost(), registry())
            .with_identifier(ServiceIdentifier::new(Arc::new(catalog)));

        let result = scanner.scan_port(Port::new(port).unwrap()).await;
        assert_eq!(result.state, PortState::TcpWrapped);
        assert!(result.version.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_unroutable_address_is_filtered() {
        // TEST-NET-3 is never routed; the connect attempt should hang until the timeout.
        let scanner = TcpConnectScanner::new(Target::parse("203.0.113.1").unwrap(), registry())
            .with_timeout(Duration::from_millis(200));
        let result = scanner.scan_port(Port::new(80).unwrap()).await;
        assert_eq!(result.state, PortState::Filtered);
    }
}

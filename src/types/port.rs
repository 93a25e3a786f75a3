//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortList` is the ordered, possibly repeating sequence of ports a scan
//! works through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value.into()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u64),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An ordered list of ports to scan.
///
/// Order is preserved and duplicates are kept: scanning `80,80` produces
/// two independent results for port 80.
///
/// Parses the formats:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000"
/// - Mixed: "22,80,443,8000-9000"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortList(Vec<Port>);

impl PortList {
    /// Create an empty port list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a single port.
    pub fn push(&mut self, port: Port) {
        self.0.push(port);
    }

    /// Append an inclusive range of ports.
    pub fn push_range(&mut self, start: Port, end: Port) -> Result<(), PortError> {
        if start > end {
            return Err(PortError::InvalidRange(start.0, end.0));
        }
        self.0.extend((start.0..=end.0).map(Port));
        Ok(())
    }

    /// Number of ports, counting duplicates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Port> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Port>> for PortList {
    fn from(ports: Vec<Port>) -> Self {
        Self(ports)
    }
}

impl FromIterator<Port> for PortList {
    fn from_iter<I: IntoIterator<Item = Port>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PortList {
    type Item = Port;
    type IntoIter = std::vec::IntoIter<Port>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn parse_port(s: &str) -> Result<Port, PortError> {
    let s = s.trim();
    let value: u64 = s
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortError::OutOfRange(value))
}

impl FromStr for PortList {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut list = Self::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.contains('-') {
                let bounds: Vec<&str> = part.split('-').collect();
                if bounds.len() != 2 {
                    return Err(PortError::InvalidFormat(part.to_string()));
                }
                let start = parse_port(bounds[0])?;
                let end = parse_port(bounds[1])?;
                list.push_range(start, end)?;
            } else {
                list.push(parse_port(part)?);
            }
        }

        Ok(list)
    }
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
        assert_eq!(Port::try_from(0), Err(PortError::OutOfRange(0)));
    }

    #[test]
    fn test_port_list_parsing() {
        let list: PortList = "80".parse().unwrap();
        assert_eq!(list.len(), 1);

        let list: PortList = "80,443".parse().unwrap();
        let ports: Vec<u16> = list.iter().map(Port::as_u16).collect();
        assert_eq!(ports, vec![80, 443]);

        let list: PortList = "1-100".parse().unwrap();
        assert_eq!(list.len(), 100);

        let list: PortList = "22, 80,443,8000-8010".parse().unwrap();
        assert_eq!(list.len(), 14);
    }

    #[test]
    fn test_port_list_keeps_order_and_duplicates() {
        let list: PortList = "443,80,80,22-23".parse().unwrap();
        let ports: Vec<u16> = list.iter().map(Port::as_u16).collect();
        assert_eq!(ports, vec![443, 80, 80, 22, 23]);
    }

    #[test]
    fn test_port_list_errors() {
        assert_eq!("".parse::<PortList>(), Err(PortError::Empty));
        assert_eq!("0".parse::<PortList>(), Err(PortError::OutOfRange(0)));
        assert_eq!(
            "70000".parse::<PortList>(),
            Err(PortError::OutOfRange(70000))
        );
        assert_eq!(
            "100-10".parse::<PortList>(),
            Err(PortError::InvalidRange(100, 10))
        );
        assert!(matches!(
            "1-2-3".parse::<PortList>(),
            Err(PortError::InvalidFormat(_))
        ));
        assert!(matches!(
            "http".parse::<PortList>(),
            Err(PortError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_port_list_display() {
        let list: PortList = "80,443".parse().unwrap();
        assert_eq!(list.to_string(), "80,443");
    }
}

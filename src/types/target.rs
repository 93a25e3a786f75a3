//! Target host specification.
//!
//! A target is an IPv4 literal, an IPv6 literal or a hostname. Hostnames are
//! left to the operating system resolver at connect time, so every scan task
//! resolves the name itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A single scan target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// An IP address literal.
    Ip(IpAddr),
    /// A hostname to be resolved on connect.
    Hostname(String),
}

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("empty target")]
    Empty,
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
}

impl Target {
    /// Parse a target from a string.
    ///
    /// Bracketed IPv6 literals (`[::1]`) are accepted and unwrapped.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        let unbracketed = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);

        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Format the connection address for a port.
    ///
    /// IPv6 literals are bracketed (`[::1]:22`); IPv4 literals and hostnames
    /// are used as-is (`10.0.0.1:22`, `example.com:22`).
    pub fn address(&self, port: u16) -> String {
        match self {
            Self::Ip(IpAddr::V6(ip)) => format!("[{}]:{}", ip, port),
            Self::Ip(IpAddr::V4(ip)) => format!("{}:{}", ip, port),
            Self::Hostname(host) => format!("{}:{}", host, port),
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Hostname(host) => write!(f, "{}", host),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_ipv4() {
        let target = Target::parse("192.168.1.1").unwrap();
        assert_eq!(target, Target::Ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
    }

    #[test]
    fn test_parse_ipv6() {
        let target = Target::parse("::1").unwrap();
        assert_eq!(target, Target::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));

        let bracketed = Target::parse("[::1]").unwrap();
        assert_eq!(bracketed, target);
    }

    #[test]
    fn test_parse_hostname() {
        let target = Target::parse("scanme.example.com").unwrap();
        assert!(matches!(target, Target::Hostname(_)));
        assert!(Target::parse("localhost").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Target::parse("  "), Err(TargetError::Empty));
        assert!(matches!(
            Target::parse("-bad.com"),
            Err(TargetError::InvalidFormat(_))
        ));
        assert!(matches!(
            Target::parse("a..b"),
            Err(TargetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_address_formatting() {
        assert_eq!(Target::parse("10.0.0.1").unwrap().address(22), "10.0.0.1:22");
        assert_eq!(Target::parse("::1").unwrap().address(22), "[::1]:22");
        assert_eq!(
            Target::parse("fe80::1").unwrap().address(8080),
            "[fe80::1]:8080"
        );
        assert_eq!(
            Target::parse("example.com").unwrap().address(443),
            "example.com:443"
        );
    }
}

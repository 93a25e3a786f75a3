//! Service name registry.
//!
//! Maps port numbers to default service names, loaded from a line-oriented
//! registry file in the `nmap-services` / `/etc/services` format:
//!
//! ```text
//! # comment
//! ssh     22/tcp   0.182286   # Secure Shell Login
//! ```
//!
//! The registry is built once and shared read-only between scan tasks.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Name reported for ports without a registry entry.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Default location of the registry file.
pub const DEFAULT_SERVICES_FILE: &str = "/usr/share/nmap/nmap-services";

/// A single registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNameEntry {
    pub name: String,
    pub port: u16,
    pub protocol: String,
    pub description: String,
}

impl ServiceNameEntry {
    /// Parse one registry line. Comments, blank and malformed lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 2 {
            return None;
        }

        let (port, protocol) = fields[1].split_once('/')?;
        if protocol.is_empty() || protocol.contains('/') {
            return None;
        }
        let port: u16 = port.parse().ok()?;

        let description = if fields.len() > 3 {
            fields[3..].join(" ")
        } else {
            String::new()
        };

        Some(Self {
            name: fields[0].to_string(),
            port,
            protocol: protocol.to_string(),
            description,
        })
    }
}

/// Read-only lookup table from port to default service name.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    entries: HashMap<u16, ServiceNameEntry>,
}

impl ServiceRegistry {
    /// An empty registry: every port resolves to [`UNKNOWN_SERVICE`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the registry from a file.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RegistryError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_reader(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            entries = registry.len(),
            "loaded service registry"
        );
        Ok(registry)
    }

    /// Load the registry, falling back to an empty table if it cannot be read.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("{}; service names will be reported as '{}'", e, UNKNOWN_SERVICE);
                Self::empty()
            }
        }
    }

    /// Build the registry from any buffered reader.
    ///
    /// When a port appears more than once the first `tcp` entry wins; entries
    /// for other protocols are only kept if no `tcp` entry exists.
    pub fn from_reader<R: BufRead>(reader: R) -> RegistryResult<Self> {
        let mut registry = Self::empty();
        for line in reader.lines() {
            if let Some(entry) = ServiceNameEntry::parse_line(&line?) {
                registry.insert(entry);
            }
        }
        Ok(registry)
    }

    /// Add an entry, honouring the tcp-first precedence.
    pub fn insert(&mut self, entry: ServiceNameEntry) {
        match self.entries.get(&entry.port) {
            Some(existing) if existing.protocol == "tcp" => {}
            Some(_) if entry.protocol != "tcp" => {}
            _ => {
                self.entries.insert(entry.port, entry);
            }
        }
    }

    /// Look up the entry for a port.
    pub fn get(&self, port: u16) -> Option<&ServiceNameEntry> {
        self.entries.get(&port)
    }

    /// Service name for a port, or [`UNKNOWN_SERVICE`].
    pub fn service_name(&self, port: u16) -> &str {
        self.get(port).map_or(UNKNOWN_SERVICE, |e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

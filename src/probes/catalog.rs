//! Probe catalog.
//!
//! Associates well-known ports with an ordered list of protocol probes. Each
//! probe carries a fixed payload and ordered response-matching rules. A
//! separate generic probe list is available as a fallback for ports whose
//! own probes do not produce a match.

use crate::error::{CatalogError, CatalogResult};
use regex::bytes::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Capture text (or service tag) marking a service gated by an access wrapper.
pub const TCPWRAPPED: &str = "tcpwrapped";

/// A single response-matching rule.
#[derive(Debug, Clone)]
pub struct ProbeMatch {
    pattern: Regex,
    capture: usize,
    service: String,
}

impl ProbeMatch {
    /// Compile a rule.
    ///
    /// Patterns run over raw response bytes with Unicode disabled, so
    /// classes like `[^\r\n]` also match non-UTF-8 bytes.
    pub fn new(pattern: &str, capture: usize, service: impl Into<String>) -> CatalogResult<Self> {
        let compiled = RegexBuilder::new(pattern)
            .unicode(false)
            .build()
            .map_err(|source| CatalogError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: compiled,
            capture,
            service: service.into(),
        })
    }

    /// Apply the rule to a response.
    ///
    /// Returns the captured text when the pattern matches and the capture
    /// group participated in the match.
    pub fn captures(&self, response: &[u8]) -> Option<String> {
        let caps = self.pattern.captures(response)?;
        let group = caps.get(self.capture)?;
        Some(String::from_utf8_lossy(group.as_bytes()).into_owned())
    }

    pub fn capture_index(&self) -> usize {
        self.capture
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// A protocol probe: a payload plus the rules used to read its response.
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    name: String,
    payload: Vec<u8>,
    matches: Vec<ProbeMatch>,
}

impl ServiceProbe {
    /// Create a probe. An empty payload sends nothing and only reads.
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            matches: Vec::new(),
        }
    }

    /// Append a match rule; rules are evaluated in insertion order.
    pub fn with_match(mut self, rule: ProbeMatch) -> Self {
        self.matches.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn matches(&self) -> &[ProbeMatch] {
        &self.matches
    }

    /// First rule that matches the response, with its captured text.
    pub fn evaluate(&self, response: &[u8]) -> Option<(&ProbeMatch, String)> {
        self.matches
            .iter()
            .find_map(|rule| rule.captures(response).map(|text| (rule, text)))
    }
}

/// Static table entry used to build the built-in catalogs.
struct ProbeDef {
    ports: &'static [u16],
    name: &'static str,
    payload: &'static [u8],
    matches: &'static [(&'static str, usize, &'static str)],
}

const HTTP_GET: &[u8] = b"GET / HTTP/1.0\r\nHost: localhost\r\n\r\n";

const PORT_PROBES: &[ProbeDef] = &[
    ProbeDef {
        ports: &[21],
        name: "FTP",
        payload: b"USER anonymous\r\n",
        matches: &[
            (r"^220[ -]([^\r\n]+)", 1, "ftp"),
            (r"^220 ([^\r\n]+) FTP", 1, "ftp"),
        ],
    },
    ProbeDef {
        ports: &[22],
        name: "SSH",
        payload: b"SSH-2.0-portprobe\r\n",
        matches: &[
            (r"SSH-(\d+\.\d+[^ -]*)", 1, "ssh"),
            (r"OpenSSH[_-]([^\r\n]+)", 1, "ssh"),
        ],
    },
    ProbeDef {
        ports: &[23],
        name: "Telnet",
        payload: b"\r\n",
        matches: &[(r"([^\r\n]+)", 1, "telnet")],
    },
    ProbeDef {
        ports: &[25],
        name: "SMTP",
        payload: b"EHLO portprobe\r\n",
        matches: &[
            (r"^220[ -]([^\r\n]+)", 1, "smtp"),
            (r"^220 ([^\r\n]+) ESMTP", 1, "smtp"),
        ],
    },
    ProbeDef {
        ports: &[53],
        name: "DNS",
        payload: &[0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        matches: &[(r"([^\r\n]+)", 1, "dns")],
    },
    ProbeDef {
        ports: &[80],
        name: "HTTP",
        payload: HTTP_GET,
        matches: &[
            (r"Server: ([^\r\n]+)", 1, "http"),
            (r"X-Powered-By: ([^\r\n]+)", 1, "http"),
        ],
    },
    ProbeDef {
        ports: &[110],
        name: "POP3",
        payload: b"CAPA\r\n",
        matches: &[(r"^\+OK ([^\r\n]+)", 1, "pop3")],
    },
    ProbeDef {
        ports: &[143],
        name: "IMAP",
        payload: b"A001 CAPABILITY\r\n",
        matches: &[(r"([^\r\n]+) IMAP", 1, "imap")],
    },
    ProbeDef {
        ports: &[161],
        name: "SNMP",
        payload: &[0x30, 0x26, 0x02, 0x01, 0x01, 0x04],
        matches: &[(r"([^\r\n]+)", 1, "snmp")],
    },
    ProbeDef {
        ports: &[443],
        name: "HTTPS",
        payload: HTTP_GET,
        matches: &[(r"Server: ([^\r\n]+)", 1, "https")],
    },
    ProbeDef {
        ports: &[1433],
        name: "MSSQL",
        payload: &[0x12, 0x01, 0x00, 0x34, 0x00, 0x00, 0x00, 0x00],
        matches: &[(r"([^\r\n]+)", 1, "mssql")],
    },
    ProbeDef {
        ports: &[3306],
        name: "MySQL",
        payload: &[0x0a],
        matches: &[(r"([0-9]+\.[0-9]+\.[0-9]+)", 1, "mysql")],
    },
    ProbeDef {
        ports: &[5432],
        name: "PostgreSQL",
        payload: &[0x00, 0x00, 0x00, 0x08, 0x04, 0xd2, 0x16, 0x2f],
        matches: &[(r"PostgreSQL ([^\r\n]+)", 1, "postgresql")],
    },
    ProbeDef {
        ports: &[5672],
        name: "RabbitMQ",
        payload: b"AMQP",
        matches: &[(r"rabbitmq_version=([^\r\n]+)", 1, "rabbitmq")],
    },
    ProbeDef {
        ports: &[6379],
        name: "Redis",
        payload: b"INFO\r\n",
        matches: &[(r"redis_version:([^\r\n]+)", 1, "redis")],
    },
    ProbeDef {
        ports: &[8080],
        name: "HTTP-Proxy",
        payload: HTTP_GET,
        matches: &[(r"Server: ([^\r\n]+)", 1, "http-proxy")],
    },
    ProbeDef {
        ports: &[11211],
        name: "Memcached",
        payload: b"version\r\n",
        matches: &[(r"VERSION ([^\r\n]+)", 1, "memcached")],
    },
    ProbeDef {
        ports: &[27017],
        name: "MongoDB",
        payload: &[0x41, 0x00, 0x00, 0x00],
        matches: &[(r"(?i)mongodb/([^\s]+)", 1, "mongodb")],
    },
];

const FALLBACK_PROBES: &[ProbeDef] = &[
    ProbeDef {
        ports: &[],
        name: "NULL",
        payload: b"",
        matches: &[
            (r"(?i)^SSH-([.\d]+)", 1, "ssh"),
            (r"(?i)^220[ -]([^\r\n]*FTP)", 1, "ftp"),
            (r"^VER[ =]([^\r\n]*)", 1, ""),
        ],
    },
    ProbeDef {
        ports: &[],
        name: "GenericLines",
        payload: b"\r\n\r\n",
        matches: &[
            (r"^HTTP/[\d.]+\s+(\d+)", 1, "http"),
            (r"^SMTP", 0, "smtp"),
            (r"^SSH-\d\.\d-", 0, "ssh"),
        ],
    },
    ProbeDef {
        ports: &[],
        name: "GetRequest",
        payload: b"GET / HTTP/1.0\r\n\r\n",
        matches: &[
            (r"Server: ([^\r\n]+)", 1, "http"),
            (r"X-Powered-By: ([^\r\n]+)", 1, "http"),
        ],
    },
    ProbeDef {
        ports: &[],
        name: "HTTPOptions",
        payload: b"OPTIONS / HTTP/1.0\r\n\r\n",
        matches: &[(r"Server: ([^\r\n]+)", 1, "http")],
    },
    ProbeDef {
        ports: &[],
        name: "RTSPRequest",
        payload: b"DESCRIBE rtsp://hello RTSP/1.0\r\n\r\n",
        matches: &[(r"^RTSP/\d\.\d", 0, "rtsp")],
    },
    ProbeDef {
        ports: &[],
        name: "DNSVersionBindReq",
        payload: &[0x00, 0x00, 0x10, 0x00, 0x00],
        matches: &[(r"(?i)^bind\.\d+\.\d+", 0, "dns")],
    },
];

fn build(def: &ProbeDef) -> CatalogResult<ServiceProbe> {
    let mut probe = ServiceProbe::new(def.name, def.payload);
    for &(pattern, capture, service) in def.matches {
        probe = probe.with_match(ProbeMatch::new(pattern, capture, service)?);
    }
    Ok(probe)
}

/// Read-only table of probes keyed by destination port.
#[derive(Debug, Clone, Default)]
pub struct ProbeCatalog {
    by_port: HashMap<u16, Vec<ServiceProbe>>,
    fallback: Vec<ServiceProbe>,
}

impl ProbeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog of well-known service probes.
    pub fn builtin() -> CatalogResult<Self> {
        let mut catalog = Self::new();
        for def in PORT_PROBES {
            let probe = build(def)?;
            for &port in def.ports {
                catalog.insert(port, probe.clone());
            }
        }
        for def in FALLBACK_PROBES {
            catalog.push_fallback(build(def)?);
        }
        Ok(catalog)
    }

    /// Append a probe to a port's list.
    pub fn insert(&mut self, port: u16, probe: ServiceProbe) {
        self.by_port.entry(port).or_default().push(probe);
    }

    /// Append a generic fallback probe.
    pub fn push_fallback(&mut self, probe: ServiceProbe) {
        self.fallback.push(probe);
    }

    /// Probes for a port in catalog order; empty if the port is unknown.
    pub fn probes_for(&self, port: u16) -> &[ServiceProbe] {
        self.by_port.get(&port).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fallback(&self) -> &[ServiceProbe] {
        &self.fallback
    }

}

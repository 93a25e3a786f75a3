//! Service and version detection through protocol probes.
//!
//! [`ProbeCatalog`] holds the payloads and match rules,
//! [`ServiceIdentifier`] runs them against an open connection.

mod catalog;
mod identify;

pub use catalog::{ProbeCatalog, ProbeMatch, ServiceProbe, TCPWRAPPED};
pub use identify::{
    Identification, ServiceIdentifier, DEFAULT_READ_TIMEOUT, DEFAULT_SESSION_TIMEOUT,
    RESPONSE_BUFFER_SIZE,
};

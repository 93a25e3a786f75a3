//! Configuration management for portprobe.
//!
//! Provides XDG-compliant settings loading. Command-line flags override
//! whatever the settings file provides.

mod settings;

pub use settings::{AppSettings, Paths};

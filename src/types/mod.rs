//! Core type definitions using newtype patterns for type safety.
//!
//! These types reject invalid ports and targets at parse time so the
//! scanner only ever sees well-formed input.

mod port;
mod target;

pub use port::{Port, PortError, PortList};
pub use target::{Target, TargetError};

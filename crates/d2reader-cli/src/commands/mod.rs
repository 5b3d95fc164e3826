//! CLI command implementations.

pub mod snapshot;
pub mod versions;
pub mod watch;

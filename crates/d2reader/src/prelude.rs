//! Prelude module for convenient imports
//!
//! ```ignore
//! use d2reader::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Orchestration: `DataReader`, `ReaderConfig`, `ReadFlag`, `ReaderControl`
//! - Events: `ReaderEvent`, `DataReadEvent`, `EventSink`, `FnSink`
//! - Character data: `Character`, `CharacterClass`, `Difficulty`
//! - Item data: `BodyLocation`, `ItemRecord`
//! - Error handling: `Error`, `Result`

// Orchestration
pub use crate::config::{ReadFlag, ReadFlags, ReaderConfig};
pub use crate::process::SystemProcesses;
pub use crate::reader::{DataReader, LayoutSwitch, ReaderControl, StopReason, TickOutcome};

// Events
pub use crate::reader::{DataReadEvent, EventSink, FnSink, ReaderEvent};

// Character data
pub use crate::character::{Character, CharacterClass, CharacterStats, Difficulty};

// Item data
pub use crate::item::{BodyLocation, ItemRecord};

// Error handling
pub use crate::error::{Error, Result};

//! # d2reader
//!
//! Reads live character state out of a running Diablo II process.
//!
//! This crate provides:
//! - Per-version layout tables (global addresses, quest rules)
//! - Windows process attachment and typed memory reads
//! - Decoders for the game's fixed-layout records
//! - Stat, inventory, item text, quest and skill readers
//! - Character identity tracking across resets
//! - A polling orchestrator that emits "character created" and "data read" events
//!
//! ```ignore
//! use d2reader::prelude::*;
//!
//! let mut reader = DataReader::new(SystemProcesses, ReaderConfig::default())?;
//! let control = ReaderControl::new();
//! reader.run(&control, FnSink(|event| {
//!     println!("{}", serde_json::to_string(&event)?);
//!     Ok(())
//! }))?;
//! ```

pub mod character;
pub mod config;
pub mod error;
pub mod item;
pub mod layout;
pub mod prelude;
pub mod process;
pub mod quest;
pub mod reader;
pub mod skills;
pub mod stats;
pub mod structs;

#[cfg(test)]
mod testing;

pub use character::{
    Character, CharacterClass, CharacterStats, CharacterTracker, Difficulty, Observation,
    PlayerMode, Transition,
};
pub use config::{ReadFlag, ReadFlags, ReaderConfig, ReaderConfigBuilder};
pub use error::{Error, Result};
pub use item::{
    BodyLocation, InventoryReader, ItemContainer, ItemQuality, ItemReader, ItemRecord, ItemUnit,
    StringTable, format_property, is_charm, is_equipped, magical_properties,
};
pub use layout::{VersionLayout, for_version, supported_versions};
pub use process::{
    AddressingMode, MemoryReader, ProcessProvider, ProcessTarget, ReadMemory, RemoteAddress,
    SystemProcesses,
};
pub use quest::{completed_count, decode_words, read_quest_buffer};
pub use reader::{
    CollectSink, DataReadEvent, DataReader, EventSink, FnSink, GameInfo, LayoutSwitch,
    ReaderControl, ReaderEvent, ReaderState, StopReason, TickOutcome, resolve_game,
};
pub use skills::{SkillLevels, SkillReader};
pub use stats::{StatId, StatMap, StatReader, display_value, stat_value};

//! Reader configuration
//!
//! ```ignore
//! let config = ReaderConfig::builder()
//!     .game_version("1.14c")
//!     .polling_rate(Duration::from_millis(250))
//!     .read_flags(ReadFlags::default() | ReadFlag::EquippedItemStrings)
//!     .build();
//! ```

use std::fmt;
use std::ops::BitOr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::process::ProcessTarget;

/// One optional sub-read of the per-tick pipeline
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum ReadFlag {
    CurrentArea,
    CurrentDifficulty,
    QuestBuffers,
    InventoryItemIds,
    EquippedItemStrings,
    StructuredInventory,
    SkillLevels,
}

impl ReadFlag {
    fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Set of enabled sub-reads
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ReadFlag>", into = "Vec<ReadFlag>")]
pub struct ReadFlags(u32);

impl ReadFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        ReadFlag::iter().collect()
    }

    pub fn contains(&self, flag: ReadFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: ReadFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: ReadFlag) {
        self.0 &= !flag.bit();
    }

    pub fn iter(&self) -> impl Iterator<Item = ReadFlag> + '_ {
        ReadFlag::iter().filter(|flag| self.contains(*flag))
    }
}

impl Default for ReadFlags {
    fn default() -> Self {
        [
            ReadFlag::CurrentArea,
            ReadFlag::CurrentDifficulty,
            ReadFlag::QuestBuffers,
            ReadFlag::InventoryItemIds,
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<ReadFlag> for ReadFlags {
    fn from_iter<I: IntoIterator<Item = ReadFlag>>(iter: I) -> Self {
        let mut flags = Self::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<Vec<ReadFlag>> for ReadFlags {
    fn from(flags: Vec<ReadFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<ReadFlags> for Vec<ReadFlag> {
    fn from(flags: ReadFlags) -> Self {
        flags.iter().collect()
    }
}

impl From<ReadFlag> for ReadFlags {
    fn from(flag: ReadFlag) -> Self {
        std::iter::once(flag).collect()
    }
}

impl BitOr<ReadFlag> for ReadFlags {
    type Output = Self;

    fn bitor(mut self, flag: ReadFlag) -> Self {
        self.insert(flag);
        self
    }
}

impl fmt::Debug for ReadFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Settings for [`DataReader`](crate::DataReader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub process_name: String,
    pub module_name: String,
    /// Layout identifier, see [`crate::layout::supported_versions`]
    pub game_version: String,
    pub polling_rate_ms: u64,
    pub read_flags: ReadFlags,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            process_name: "game".to_string(),
            module_name: "Game.exe".to_string(),
            game_version: "1.14d".to_string(),
            polling_rate_ms: 500,
            read_flags: ReadFlags::default(),
        }
    }
}

impl ReaderConfig {
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::default()
    }

    pub fn polling_rate(&self) -> Duration {
        Duration::from_millis(self.polling_rate_ms)
    }

    pub fn target(&self) -> ProcessTarget {
        ProcessTarget::new(&self.process_name, &self.module_name)
    }
}

/// Builder for ReaderConfig
#[derive(Debug, Clone, Default)]
pub struct ReaderConfigBuilder {
    process_name: Option<String>,
    module_name: Option<String>,
    game_version: Option<String>,
    polling_rate: Option<Duration>,
    read_flags: Option<ReadFlags>,
}

impl ReaderConfigBuilder {
    pub fn process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    pub fn game_version(mut self, version: impl Into<String>) -> Self {
        self.game_version = Some(version.into());
        self
    }

    pub fn polling_rate(mut self, rate: Duration) -> Self {
        self.polling_rate = Some(rate);
        self
    }

    pub fn read_flags(mut self, flags: ReadFlags) -> Self {
        self.read_flags = Some(flags);
        self
    }

    pub fn build(self) -> ReaderConfig {
        let default = ReaderConfig::default();
        ReaderConfig {
            process_name: self.process_name.unwrap_or(default.process_name),
            module_name: self.module_name.unwrap_or(default.module_name),
            game_version: self.game_version.unwrap_or(default.game_version),
            polling_rate_ms: self
                .polling_rate
                .map(|rate| rate.as_millis() as u64)
                .unwrap_or(default.polling_rate_ms),
            read_flags: self.read_flags.unwrap_or(default.read_flags),
        }
    }
}

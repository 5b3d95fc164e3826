//! Unit stat lists
//!
//! A unit carries two record arrays: its own base stats and the full list
//! after item and aura modifiers. Both are flattened into [`StatMap`]s keyed
//! by stat id.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::process::{AddressingMode, ReadMemory};
use crate::structs::{StatArray, StatListHeader, StatRecord, Unit, decode_array, offsets};

pub type StatMap = BTreeMap<u16, i32>;

/// Well-known stat ids
pub struct StatId;

impl StatId {
    pub const STRENGTH: u16 = 0;
    pub const ENERGY: u16 = 1;
    pub const DEXTERITY: u16 = 2;
    pub const VITALITY: u16 = 3;
    /// Stored in 1/256 units
    pub const LIFE: u16 = 6;
    pub const MAX_LIFE: u16 = 7;
    pub const MANA: u16 = 8;
    pub const MAX_MANA: u16 = 9;
    pub const LEVEL: u16 = 12;
    pub const EXPERIENCE: u16 = 13;
    pub const GOLD: u16 = 14;
    pub const STASH_GOLD: u16 = 15;
    pub const DEFENSE: u16 = 31;
    pub const FIRE_RESIST: u16 = 39;
    pub const MAX_FIRE_RESIST: u16 = 40;
    pub const LIGHTNING_RESIST: u16 = 41;
    pub const MAX_LIGHTNING_RESIST: u16 = 42;
    pub const COLD_RESIST: u16 = 43;
    pub const MAX_COLD_RESIST: u16 = 44;
    pub const POISON_RESIST: u16 = 45;
    pub const MAX_POISON_RESIST: u16 = 46;
    pub const GOLD_FIND: u16 = 79;
    pub const MAGIC_FIND: u16 = 80;
    pub const CLASS_SKILLS: u16 = 83;
    pub const INCREASED_ATTACK_SPEED: u16 = 93;
    pub const FASTER_RUN_WALK: u16 = 96;
    pub const FASTER_HIT_RECOVERY: u16 = 99;
    pub const FASTER_BLOCK_RATE: u16 = 102;
    pub const FASTER_CAST_RATE: u16 = 105;
    pub const ALL_SKILLS: u16 = 127;
    pub const SOCKETS: u16 = 194;

    /// Fixed-point stats stored with 8 fractional bits
    pub fn is_fixed_point(id: u16) -> bool {
        matches!(
            id,
            Self::LIFE | Self::MAX_LIFE | Self::MANA | Self::MAX_MANA
        )
    }
}

/// Fold records into a map; a later duplicate id overwrites an earlier one
pub fn collect_stats(records: &[StatRecord]) -> StatMap {
    records
        .iter()
        .map(|record| (record.id, record.value))
        .collect()
}

/// Reads stat lists for one tick
pub struct StatReader<'a, R: ReadMemory> {
    reader: &'a R,
}

impl<'a, R: ReadMemory> StatReader<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// The unit's own stat records
    pub fn stats_of(&self, unit: &Unit) -> Result<StatMap> {
        let header = self.header_of(unit)?;
        Ok(collect_stats(&self.read_records(&header.base)?))
    }

    /// The unit's stats after all modifiers
    pub fn full_stats_of(&self, unit: &Unit) -> Result<StatMap> {
        let header = self.header_of(unit)?;
        Ok(collect_stats(&self.read_records(&header.full)?))
    }

    /// Stats contributed by a set of items.
    ///
    /// Inside one item's list the last duplicate wins; across items the
    /// values add up. An unreadable item contributes nothing.
    pub fn item_stats_of<'u>(&self, items: impl IntoIterator<Item = &'u Unit>) -> StatMap {
        let mut total = StatMap::new();
        for item in items {
            match self.stats_of(item) {
                Ok(stats) => {
                    for (id, value) in stats {
                        let entry = total.entry(id).or_insert(0);
                        *entry = entry.saturating_add(value);
                    }
                }
                Err(e) => debug!("Skipping item stats: {}", e),
            }
        }
        total
    }

    fn header_of(&self, unit: &Unit) -> Result<StatListHeader> {
        self.reader.read_struct(unit.stat_list)
    }

    fn read_records(&self, array: &StatArray) -> Result<Vec<StatRecord>> {
        let count = array.checked_len()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let records = array
            .records
            .checked()
            .ok_or(crate::Error::InvalidAddress(array.records.raw()))?;
        let bytes = self.reader.read_bytes(
            self.reader
                .resolve(records.as_u64(), AddressingMode::Absolute),
            count * offsets::stat::SIZE,
        )?;
        decode_array(&bytes)
    }
}

/// Read one stat from a map, treating absence as zero
pub fn stat_value(stats: &StatMap, id: u16) -> i32 {
    display_value(id, stats.get(&id).copied().unwrap_or(0))
}

/// Drop the 8 fractional bits of life and mana; other stats pass through
pub fn display_value(id: u16, raw: i32) -> i32 {
    if StatId::is_fixed_point(id) {
        raw >> 8
    } else {
        raw
    }
}

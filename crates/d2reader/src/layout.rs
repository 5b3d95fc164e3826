//! Per-version address tables
//!
//! Each supported game build gets one immutable [`VersionLayout`]. Addresses
//! are offsets from the main module base (`Game.exe`) and are read with
//! [`AddressingMode::ModuleRelative`](crate::process::AddressingMode).
//!
//! Selecting a build happens once per attach cycle; the orchestrator only
//! swaps layouts between ticks.

use crate::error::{Error, Result};

/// Index and address tables of one localized string segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTableAddresses {
    /// Global holding a pointer to the id → slot table (u16 entries)
    pub indexer: u64,
    /// Global holding a pointer to the slot → string pointer table
    pub addresses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutAddresses {
    /// u32 id of the active game
    pub game_id: u64,
    /// Global holding the world pointer; null on the title screen
    pub world: u64,
    /// Current area byte
    pub area: u64,
    /// Global holding the data tables pointer
    pub data_tables: u64,
    pub strings: StringTableAddresses,
    pub patch_strings: StringTableAddresses,
    pub expansion_strings: StringTableAddresses,
}

/// Shape of the world's game slot array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameArrayLayout {
    /// Bytes per game slot
    pub record_stride: u64,
    /// Bytes before the first slot
    pub header_size: u64,
    /// Masks above this are treated as corrupt
    pub max_mask: u32,
}

impl GameArrayLayout {
    /// Byte offset of the pointer slot for `game_id` inside the game buffer.
    ///
    /// The index is `game_id & mask`, so it always lies in `[0, mask]`.
    pub fn slot_offset(&self, game_id: u32, mask: u32) -> Result<u64> {
        if mask > self.max_mask {
            return Err(Error::malformed(format!(
                "game mask {:#x} exceeds {:#x}",
                mask, self.max_mask
            )));
        }
        let index = u64::from(game_id & mask);
        Ok(index * self.record_stride + self.header_size)
    }
}

/// Quest status word semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestRules {
    /// Word indices of the real quests inside a difficulty's status buffer
    pub quest_words: &'static [usize],
    /// Set once the quest is actually finished and rewarded
    pub completed_flag: u16,
    /// Set once the player has seen the completion in the quest log
    pub acknowledged_flag: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLayout {
    pub version: &'static str,
    pub addresses: LayoutAddresses,
    pub game_array: GameArrayLayout,
    pub quests: QuestRules,
}

/// Act I: 1-6, Act II: 9-14, Act III: 17-22, Act IV: 25-27, Act V: 35-40
const LOD_QUEST_WORDS: &[usize] = &[
    1, 2, 3, 4, 5, 6, //
    9, 10, 11, 12, 13, 14, //
    17, 18, 19, 20, 21, 22, //
    25, 26, 27, //
    35, 36, 37, 38, 39, 40,
];

const LOD_QUEST_RULES: QuestRules = QuestRules {
    quest_words: LOD_QUEST_WORDS,
    completed_flag: 1 << 0,
    acknowledged_flag: 1 << 12,
};

const GAME_ARRAY: GameArrayLayout = GameArrayLayout {
    record_stride: 0x0C,
    header_size: 0x08,
    max_mask: 0xFFFF,
};

pub const V1_14B: VersionLayout = VersionLayout {
    version: "1.14b",
    addresses: LayoutAddresses {
        game_id: 0x0047_AD4C,
        world: 0x0047_BD78,
        area: 0x0039_C1C8,
        data_tables: 0x0034_0D78,
        strings: StringTableAddresses {
            indexer: 0x0047_AAF4,
            addresses: 0x0047_AAF8,
        },
        patch_strings: StringTableAddresses {
            indexer: 0x0047_AB10,
            addresses: 0x0047_AAFC,
        },
        expansion_strings: StringTableAddresses {
            indexer: 0x0047_AB14,
            addresses: 0x0047_AB00,
        },
    },
    game_array: GAME_ARRAY,
    quests: LOD_QUEST_RULES,
};

pub const V1_14C: VersionLayout = VersionLayout {
    version: "1.14c",
    addresses: LayoutAddresses {
        game_id: 0x0047_9C94,
        world: 0x0047_ACC0,
        area: 0x0039_B1C8,
        data_tables: 0x0033_FD78,
        strings: StringTableAddresses {
            indexer: 0x0047_9A3C,
            addresses: 0x0047_9A40,
        },
        patch_strings: StringTableAddresses {
            indexer: 0x0047_9A58,
            addresses: 0x0047_9A44,
        },
        expansion_strings: StringTableAddresses {
            indexer: 0x0047_9A5C,
            addresses: 0x0047_9A48,
        },
    },
    game_array: GAME_ARRAY,
    quests: LOD_QUEST_RULES,
};

pub const V1_14D: VersionLayout = VersionLayout {
    version: "1.14d",
    addresses: LayoutAddresses {
        game_id: 0x0048_2D0C,
        world: 0x0048_3D38,
        area: 0x003A_3140,
        data_tables: 0x0034_4304,
        strings: StringTableAddresses {
            indexer: 0x0048_29B4,
            addresses: 0x0048_29B8,
        },
        patch_strings: StringTableAddresses {
            indexer: 0x0048_29D0,
            addresses: 0x0048_29BC,
        },
        expansion_strings: StringTableAddresses {
            indexer: 0x0048_29D4,
            addresses: 0x0048_29C0,
        },
    },
    game_array: GAME_ARRAY,
    quests: LOD_QUEST_RULES,
};

static LAYOUTS: [VersionLayout; 3] = [V1_14B, V1_14C, V1_14D];

/// Look up the layout for a version identifier such as `"1.14d"`
pub fn for_version(version: &str) -> Result<&'static VersionLayout> {
    let wanted = version.trim();
    LAYOUTS
        .iter()
        .find(|layout| layout.version.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| Error::UnknownVersion(version.to_string()))
}

pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    LAYOUTS.iter().map(|layout| layout.version)
}

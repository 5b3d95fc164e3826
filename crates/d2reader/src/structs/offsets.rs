//! Field offsets of the game's in-memory records
//!
//! These describe the logical shape of each record and do not move between
//! the supported game builds. Where a record lives is a per-version concern
//! handled by [`crate::layout`].
//!
//! All pointers are 32-bit.

/// World (server-side game table)
///
/// ```text
/// Offset   Field          Size
/// ─────────────────────────────
/// 0x1C     GameBuffer     4     array of game slots
/// 0x24     GameMask       4     slot index mask
/// ```
pub mod world {
    pub const GAME_BUFFER: usize = 0x1C;
    pub const GAME_MASK: usize = 0x24;
    pub const SIZE: usize = 0x28;
}

/// Game instance
pub mod game {
    pub const DIFFICULTY: usize = 0x6D;
    pub const CLIENT: usize = 0x88;
    pub const UNIT_LISTS: usize = 0x1120;
    /// Unit lists by type: player, monster, object, missile, item
    pub const UNIT_LIST_COUNT: usize = 5;
    /// Hash buckets per unit list; unit ids are masked with `UNIT_BUCKETS - 1`
    pub const UNIT_BUCKETS: usize = 128;
    pub const SIZE: usize = UNIT_LISTS + UNIT_LIST_COUNT * UNIT_BUCKETS * 4;
}

/// Client connection
pub mod client {
    pub const UNIT_TYPE: usize = 0x00;
    pub const UNIT_ID: usize = 0x04;
    pub const SIZE: usize = 0x08;
}

/// Unit (player, monster, item, ...)
///
/// ```text
/// Offset   Field          Size
/// ─────────────────────────────
/// 0x00     UnitType       4
/// 0x04     ClassId        4     character class / item row
/// 0x0C     UnitId         4
/// 0x10     Mode           4
/// 0x14     UnitData       4     PlayerData* or ItemData*
/// 0x5C     StatList       4
/// 0x60     Inventory      4
/// 0xA8     Skills         4
/// ```
pub mod unit {
    pub const UNIT_TYPE: usize = 0x00;
    pub const CLASS_ID: usize = 0x04;
    pub const UNIT_ID: usize = 0x0C;
    pub const MODE: usize = 0x10;
    pub const UNIT_DATA: usize = 0x14;
    pub const STAT_LIST: usize = 0x5C;
    pub const INVENTORY: usize = 0x60;
    pub const SKILLS: usize = 0xA8;
    pub const SIZE: usize = 0xAC;
}

/// Player data hung off a player unit
pub mod player {
    pub const NAME: usize = 0x00;
    pub const NAME_LEN: usize = 16;
    /// One quest array pointer per difficulty
    pub const QUESTS: usize = 0x10;
    pub const QUEST_SLOTS: usize = 3;
    pub const SIZE: usize = QUESTS + QUEST_SLOTS * 4;
}

/// Quest status array header
pub mod quest {
    pub const BUFFER: usize = 0x00;
    pub const LENGTH: usize = 0x04;
    pub const SIZE: usize = 0x08;
    /// Upper bound for the decoded length; larger values are treated as corrupt
    pub const MAX_BUFFER_LEN: usize = 0x200;
}

/// Inventory header
pub mod inventory {
    pub const SIGNATURE: usize = 0x00;
    pub const FIRST_ITEM: usize = 0x0C;
    pub const LAST_ITEM: usize = 0x10;
    pub const ITEM_COUNT: usize = 0x28;
    pub const SIZE: usize = 0x2C;
    /// Constant stamped into every live inventory
    pub const MAGIC: u32 = 0x0102_0304;
    /// Traversal bound; no inventory graph holds more nodes than this
    pub const MAX_NODES: usize = 1024;
}

/// Item data hung off an item unit
pub mod item {
    pub const QUALITY: usize = 0x00;
    pub const FLAGS: usize = 0x18;
    pub const BODY_LOCATION: usize = 0x44;
    pub const PAGE: usize = 0x45;
    pub const NEXT_ITEM: usize = 0x64;
    pub const NODE_PAGE: usize = 0x69;
    pub const SIZE: usize = 0x6C;

    pub const FLAG_IDENTIFIED: u32 = 0x0000_0010;
    pub const FLAG_SOCKETED: u32 = 0x0000_0800;
    pub const FLAG_ETHEREAL: u32 = 0x0040_0000;
    pub const FLAG_RUNEWORD: u32 = 0x0400_0000;
}

/// Stat list attached to a unit
///
/// ```text
/// Offset   Field          Size
/// ─────────────────────────────
/// 0x10     Flags          4
/// 0x24     BaseStats      4     Stat* (unit's own records)
/// 0x28     BaseCount      2
/// 0x48     FullStats      4     Stat* (after modifiers)
/// 0x4C     FullCount      2
/// ```
pub mod stat_list {
    pub const FLAGS: usize = 0x10;
    pub const BASE_STATS: usize = 0x24;
    pub const BASE_COUNT: usize = 0x28;
    pub const FULL_STATS: usize = 0x48;
    pub const FULL_COUNT: usize = 0x4C;
    pub const SIZE: usize = 0x50;
    /// Records per list above which the count is treated as corrupt
    pub const MAX_RECORDS: usize = 512;
}

/// A single (layer, id, value) stat record
pub mod stat {
    pub const LAYER: usize = 0x00;
    pub const ID: usize = 0x02;
    pub const VALUE: usize = 0x04;
    pub const SIZE: usize = 0x08;
}

/// Skill list head attached to a unit
pub mod skill_info {
    pub const FIRST_SKILL: usize = 0x04;
    pub const SIZE: usize = 0x08;
}

/// One learned skill
pub mod skill {
    pub const SKILL_TXT: usize = 0x00;
    pub const NEXT_SKILL: usize = 0x04;
    pub const LEVEL: usize = 0x28;
    pub const SIZE: usize = 0x2C;
    pub const MAX_NODES: usize = 256;
}

/// Row of the skills text table
pub mod skill_txt {
    pub const ID: usize = 0x00;
    pub const SIZE: usize = 0x02;
}

/// Global data tables
pub mod data_tables {
    pub const ITEMS_TXT: usize = 0xCF4;
    pub const ITEMS_TXT_COUNT: usize = 0xCFC;
}

/// Row of the items text table
pub mod item_txt {
    pub const NAME_STRING: usize = 0xF4;
    /// Distance between consecutive rows
    pub const STRIDE: u64 = 0x1A8;
}

/// Localized string tables
pub mod strings {
    /// First id served by the patch table
    pub const PATCH_BASE: u16 = 10000;
    /// First id served by the expansion table
    pub const EXPANSION_BASE: u16 = 20000;
    /// Longest string read, in UTF-16 code units
    pub const MAX_CHARS: usize = 256;
}

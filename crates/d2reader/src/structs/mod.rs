//! Fixed-layout records decoded from raw bytes.
//!
//! Decoders only know field offsets (see [`offsets`]); the addresses they are
//! read from come from the version layout. Pointer fields decode to
//! [`RemoteAddress`] and are left for the caller to validate and follow.

pub mod offsets;

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use crate::error::{Error, Result};
use crate::process::{ByteBuffer, Decode, RemoteAddress};

use offsets::{
    client, game, inventory, item, player, quest, skill, skill_info, skill_txt, stat, stat_list,
    unit, world,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct World {
    pub game_buffer: RemoteAddress,
    pub game_mask: u32,
}

impl Decode for World {
    const SIZE: usize = world::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            game_buffer: buf.address_at(world::GAME_BUFFER)?,
            game_mask: buf.u32_at(world::GAME_MASK)?,
        })
    }
}

/// The active game instance
#[derive(Debug, Clone)]
pub struct Game {
    pub difficulty: u8,
    pub client: RemoteAddress,
    pub unit_lists: [[RemoteAddress; game::UNIT_BUCKETS]; game::UNIT_LIST_COUNT],
}

impl Game {
    /// Bucket mask applied to a client's unit id
    pub const PLAYER_SLOT_MASK: u32 = game::UNIT_BUCKETS as u32 - 1;

    /// Slot in the player unit list for a client's unit id
    pub fn player_unit(&self, unit_id: u32) -> RemoteAddress {
        self.unit_lists[0][(unit_id & Self::PLAYER_SLOT_MASK) as usize]
    }
}

impl Decode for Game {
    const SIZE: usize = game::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        let mut unit_lists = [[RemoteAddress::NULL; game::UNIT_BUCKETS]; game::UNIT_LIST_COUNT];
        for (list_index, list) in unit_lists.iter_mut().enumerate() {
            let list_offset = game::UNIT_LISTS + list_index * game::UNIT_BUCKETS * 4;
            for (slot, entry) in list.iter_mut().enumerate() {
                *entry = buf.address_at(list_offset + slot * 4)?;
            }
        }

        Ok(Self {
            difficulty: buf.u8_at(game::DIFFICULTY)?,
            client: buf.address_at(game::CLIENT)?,
            unit_lists,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    pub unit_type: u32,
    pub unit_id: u32,
}

impl Decode for Client {
    const SIZE: usize = client::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            unit_type: buf.u32_at(client::UNIT_TYPE)?,
            unit_id: buf.u32_at(client::UNIT_ID)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, Display)]
#[repr(u32)]
pub enum UnitType {
    Player = 0,
    Monster = 1,
    Object = 2,
    Missile = 3,
    Item = 4,
    Tile = 5,
}

/// Any actor; items and players share this record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub unit_type: u32,
    pub class_id: u32,
    pub unit_id: u32,
    pub mode: u32,
    pub unit_data: RemoteAddress,
    pub stat_list: RemoteAddress,
    pub inventory: RemoteAddress,
    pub skills: RemoteAddress,
}

impl Unit {
    pub fn kind(&self) -> Option<UnitType> {
        UnitType::from_repr(self.unit_type)
    }
}

impl Decode for Unit {
    const SIZE: usize = unit::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            unit_type: buf.u32_at(unit::UNIT_TYPE)?,
            class_id: buf.u32_at(unit::CLASS_ID)?,
            unit_id: buf.u32_at(unit::UNIT_ID)?,
            mode: buf.u32_at(unit::MODE)?,
            unit_data: buf.address_at(unit::UNIT_DATA)?,
            stat_list: buf.address_at(unit::STAT_LIST)?,
            inventory: buf.address_at(unit::INVENTORY)?,
            skills: buf.address_at(unit::SKILLS)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerData {
    pub name: String,
    /// Quest arrays for normal, nightmare and hell
    pub quests: [RemoteAddress; player::QUEST_SLOTS],
}

impl Decode for PlayerData {
    const SIZE: usize = player::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        let mut quests = [RemoteAddress::NULL; player::QUEST_SLOTS];
        for (i, slot) in quests.iter_mut().enumerate() {
            *slot = buf.address_at(player::QUESTS + i * 4)?;
        }

        Ok(Self {
            name: decode_fixed_string(buf.slice(player::NAME, player::NAME_LEN)?),
            quests,
        })
    }
}

/// Decode a NUL-padded, single-byte encoded name field
pub fn decode_fixed_string(bytes: &[u8]) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    let (text, _, _) = WINDOWS_1252.decode(&bytes[..end]);
    text.into_owned()
}

/// Header of a variable-length quest status buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestArray {
    pub buffer: RemoteAddress,
    pub length: u32,
}

impl QuestArray {
    /// Payload length, rejecting values no real buffer reaches
    pub fn checked_len(&self) -> Result<usize> {
        let len = self.length as usize;
        if len > quest::MAX_BUFFER_LEN {
            return Err(Error::malformed(format!(
                "quest buffer length {} exceeds {}",
                len,
                quest::MAX_BUFFER_LEN
            )));
        }
        Ok(len)
    }
}

impl Decode for QuestArray {
    const SIZE: usize = quest::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            buffer: buf.address_at(quest::BUFFER)?,
            length: buf.u32_at(quest::LENGTH)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryHeader {
    pub signature: u32,
    pub first_item: RemoteAddress,
    pub last_item: RemoteAddress,
    pub item_count: u32,
}

impl InventoryHeader {
    pub fn is_live(&self) -> bool {
        self.signature == inventory::MAGIC
    }
}

impl Decode for InventoryHeader {
    const SIZE: usize = inventory::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            signature: buf.u32_at(inventory::SIGNATURE)?,
            first_item: buf.address_at(inventory::FIRST_ITEM)?,
            last_item: buf.address_at(inventory::LAST_ITEM)?,
            item_count: buf.u32_at(inventory::ITEM_COUNT)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemData {
    pub quality: u32,
    pub flags: u32,
    pub body_location: u8,
    pub page: u8,
    pub next_item: RemoteAddress,
    pub node_page: u8,
}

impl ItemData {
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_ethereal(&self) -> bool {
        self.has_flag(item::FLAG_ETHEREAL)
    }

    pub fn is_socketed(&self) -> bool {
        self.has_flag(item::FLAG_SOCKETED)
    }

    pub fn is_runeword(&self) -> bool {
        self.has_flag(item::FLAG_RUNEWORD)
    }

    pub fn is_identified(&self) -> bool {
        self.has_flag(item::FLAG_IDENTIFIED)
    }
}

impl Decode for ItemData {
    const SIZE: usize = item::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            quality: buf.u32_at(item::QUALITY)?,
            flags: buf.u32_at(item::FLAGS)?,
            body_location: buf.u8_at(item::BODY_LOCATION)?,
            page: buf.u8_at(item::PAGE)?,
            next_item: buf.address_at(item::NEXT_ITEM)?,
            node_page: buf.u8_at(item::NODE_PAGE)?,
        })
    }
}

/// Pointer and length of one stat record array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatArray {
    pub records: RemoteAddress,
    pub count: u16,
}

impl StatArray {
    pub fn checked_len(&self) -> Result<usize> {
        let count = usize::from(self.count);
        if count > stat_list::MAX_RECORDS {
            return Err(Error::malformed(format!(
                "stat record count {} exceeds {}",
                count,
                stat_list::MAX_RECORDS
            )));
        }
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatListHeader {
    pub flags: u32,
    pub base: StatArray,
    pub full: StatArray,
}

impl Decode for StatListHeader {
    const SIZE: usize = stat_list::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            flags: buf.u32_at(stat_list::FLAGS)?,
            base: StatArray {
                records: buf.address_at(stat_list::BASE_STATS)?,
                count: buf.u16_at(stat_list::BASE_COUNT)?,
            },
            full: StatArray {
                records: buf.address_at(stat_list::FULL_STATS)?,
                count: buf.u16_at(stat_list::FULL_COUNT)?,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    pub layer: u16,
    pub id: u16,
    pub value: i32,
}

impl Decode for StatRecord {
    const SIZE: usize = stat::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            layer: buf.u16_at(stat::LAYER)?,
            id: buf.u16_at(stat::ID)?,
            value: buf.i32_at(stat::VALUE)?,
        })
    }
}

/// Decode a packed array of records
pub fn decode_array<T: Decode>(bytes: &[u8]) -> Result<Vec<T>> {
    if bytes.len() % T::SIZE != 0 {
        return Err(Error::malformed(format!(
            "{} bytes is not a whole number of {}-byte records",
            bytes.len(),
            T::SIZE
        )));
    }
    bytes
        .chunks_exact(T::SIZE)
        .map(|chunk| T::decode(&ByteBuffer::new(chunk)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillInfo {
    pub first_skill: RemoteAddress,
}

impl Decode for SkillInfo {
    const SIZE: usize = skill_info::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            first_skill: buf.address_at(skill_info::FIRST_SKILL)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub skill_txt: RemoteAddress,
    pub next_skill: RemoteAddress,
    pub level: u32,
}

impl Decode for Skill {
    const SIZE: usize = skill::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            skill_txt: buf.address_at(skill::SKILL_TXT)?,
            next_skill: buf.address_at(skill::NEXT_SKILL)?,
            level: buf.u32_at(skill::LEVEL)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillTxt {
    pub id: u16,
}

impl Decode for SkillTxt {
    const SIZE: usize = skill_txt::SIZE;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
        Ok(Self {
            id: buf.u16_at(skill_txt::ID)?,
        })
    }
}

//! A complete game graph in mock memory for end-to-end tests.
//!
//! Addresses follow the 1.14d layout. Every record lives in its own region so
//! tests can break one link without disturbing the rest.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::item::ItemQuality;
use crate::layout::V1_14D;
use crate::process::{MockMemoryReader, MockProcesses, RemoteAddress};
use crate::stats::StatId;
use crate::structs::offsets::{
    client, data_tables, game, inventory, item, item_txt, player, quest, skill, skill_info, stat,
    stat_list, unit, world,
};

const BASE: u64 = 0x0040_0000;
const WORLD: u64 = 0x1000_0000;
const GAME_BUFFER: u64 = 0x1100_0000;
const GAME: u64 = 0x1200_0000;
const CLIENT: u64 = 0x1300_0000;
const PLAYER: u64 = 0x1400_0000;
const PLAYER_DATA: u64 = 0x1500_0000;
const PLAYER_STATS: u64 = 0x1600_0000;
const INVENTORY: u64 = 0x1700_0000;
const QUESTS: u64 = 0x1800_0000;
const DATA_TABLES: u64 = 0x1900_0000;
const STRINGS: u64 = 0x1A00_0000;
const ITEMS: u64 = 0x1B00_0000;
const SKILLS: u64 = 0x1C00_0000;
const ITEM_ROWS: u64 = 0x1D00_0000;

const GAME_MASK: u32 = 0x3F;
const CLIENT_UNIT_ID: u32 = 1;
const ITEM_ROW_COUNT: u32 = 1000;

/// Bytes reserved per item: unit, item data, stat list, records, sockets
const ITEM_STRIDE: u64 = 0x1000;
const ITEM_DATA: u64 = 0x100;
const ITEM_STATS: u64 = 0x200;
const ITEM_RECORDS: u64 = 0x300;
const ITEM_SOCKETS: u64 = 0x800;

#[derive(Default)]
struct FixtureState {
    level: i32,
    experience: i32,
    extra_stats: Vec<(u16, i32)>,
    next_item: u64,
    /// Last item of each chain, keyed by inventory address
    chain_tails: HashMap<u64, u64>,
    next_string_slot: u16,
}

pub(crate) struct GameFixture {
    mem: MockMemoryReader,
    state: RefCell<FixtureState>,
}

impl GameFixture {
    pub const GAME_ID: u32 = 5;

    pub fn new() -> Self {
        let fixture = Self {
            mem: MockMemoryReader::new(BASE),
            state: RefCell::new(FixtureState::default()),
        };
        fixture.install();
        fixture.set_player("Hero", 1, 0);
        fixture
    }

    pub fn memory(&self) -> MockMemoryReader {
        self.mem.clone()
    }

    pub fn processes(&self) -> MockProcesses {
        MockProcesses::new(self.mem.clone())
    }

    pub fn player_address() -> RemoteAddress {
        RemoteAddress::new(PLAYER as u32)
    }

    pub fn inventory(&self) -> RemoteAddress {
        RemoteAddress::new(INVENTORY as u32)
    }

    fn global(offset: u64) -> u64 {
        BASE + offset
    }

    fn install(&self) {
        let addresses = V1_14D.addresses;
        let m = &self.mem;

        m.write_u32(Self::global(addresses.game_id), Self::GAME_ID);
        m.write_u32(Self::global(addresses.world), WORLD as u32);
        m.write_u8(Self::global(addresses.area), 1);

        m.write_zeroes(WORLD, world::SIZE);
        m.write_u32(WORLD + world::GAME_BUFFER as u64, GAME_BUFFER as u32);
        m.write_u32(WORLD + world::GAME_MASK as u64, GAME_MASK);
        m.write_zeroes(GAME_BUFFER, 0x0C * (GAME_MASK as usize + 1) + 0x08);
        self.set_game_pointer(GAME as u32);

        m.write_zeroes(GAME, game::SIZE);
        m.write_u32(GAME + game::CLIENT as u64, CLIENT as u32);
        let bucket = u64::from(CLIENT_UNIT_ID & (game::UNIT_BUCKETS as u32 - 1));
        m.write_u32(GAME + game::UNIT_LISTS as u64 + bucket * 4, PLAYER as u32);

        m.write_u32(CLIENT + client::UNIT_TYPE as u64, 0);
        m.write_u32(CLIENT + client::UNIT_ID as u64, CLIENT_UNIT_ID);

        m.write_zeroes(PLAYER, unit::SIZE);
        m.write_u32(PLAYER + unit::CLASS_ID as u64, 1);
        m.write_u32(PLAYER + unit::UNIT_ID as u64, CLIENT_UNIT_ID);
        m.write_u32(PLAYER + unit::MODE as u64, 1);
        m.write_u32(PLAYER + unit::UNIT_DATA as u64, PLAYER_DATA as u32);
        m.write_u32(PLAYER + unit::STAT_LIST as u64, PLAYER_STATS as u32);
        m.write_u32(PLAYER + unit::INVENTORY as u64, INVENTORY as u32);

        m.write_zeroes(PLAYER_DATA, player::SIZE);
        self.write_inventory_header(INVENTORY);

        // Item names resolve through the classic string segment
        m.write_u32(Self::global(addresses.data_tables), DATA_TABLES as u32);
        m.write_u32(DATA_TABLES + data_tables::ITEMS_TXT as u64, ITEM_ROWS as u32);
        m.write_u32(DATA_TABLES + data_tables::ITEMS_TXT_COUNT as u64, ITEM_ROW_COUNT);
        m.write_u32(Self::global(addresses.strings.indexer), STRINGS as u32);
        m.write_u32(Self::global(addresses.strings.addresses), (STRINGS + 0x10_0000) as u32);

        self.state.borrow_mut().next_item = ITEMS;
    }

    fn write_inventory_header(&self, address: u64) {
        self.mem.write_zeroes(address, inventory::SIZE);
        self.mem
            .write_u32(address + inventory::SIGNATURE as u64, inventory::MAGIC);
    }

    /// Write a stat list with the same records in its base and full arrays
    fn write_stat_list(&self, list: u64, records: &[(u16, i32)]) {
        let base = list + 0x100;
        let full = list + 0x100 + (stat_list::MAX_RECORDS * stat::SIZE) as u64;
        let mut bytes = Vec::with_capacity(records.len() * stat::SIZE);
        for &(id, value) in records {
            bytes.extend_from_slice(&0u16.to_le_bytes());
            bytes.extend_from_slice(&id.to_le_bytes());
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let m = &self.mem;
        m.write_zeroes(list, stat_list::SIZE);
        m.write_u32(list + stat_list::BASE_STATS as u64, base as u32);
        m.write_u16(list + stat_list::BASE_COUNT as u64, records.len() as u16);
        m.write_u32(list + stat_list::FULL_STATS as u64, full as u32);
        m.write_u16(list + stat_list::FULL_COUNT as u64, records.len() as u16);
        m.write_bytes(base, &bytes);
        m.write_bytes(full, &bytes);
    }

    fn write_player_stats(&self) {
        let state = self.state.borrow();
        let mut records = vec![
            (StatId::LEVEL, state.level),
            (StatId::EXPERIENCE, state.experience),
        ];
        records.extend_from_slice(&state.extra_stats);
        self.write_stat_list(PLAYER_STATS, &records);
    }

    pub fn set_player(&self, name: &str, level: i32, experience: i32) {
        let mut field = [0u8; player::NAME_LEN];
        let len = name.len().min(player::NAME_LEN);
        field[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.mem
            .write_bytes(PLAYER_DATA + player::NAME as u64, &field);

        {
            let mut state = self.state.borrow_mut();
            state.level = level;
            state.experience = experience;
        }
        self.write_player_stats();
    }

    /// Additional player stats on top of level and experience
    pub fn set_player_stats(&self, stats: &[(u16, i32)]) {
        self.state.borrow_mut().extra_stats = stats.to_vec();
        self.write_player_stats();
    }

    pub fn set_player_mode(&self, mode: u32) {
        self.mem.write_u32(PLAYER + unit::MODE as u64, mode);
    }

    pub fn set_title_screen(&self, title: bool) {
        let world = if title { 0 } else { WORLD as u32 };
        self.set_world_pointer(world);
    }

    pub fn set_world_pointer(&self, raw: u32) {
        self.mem
            .write_u32(Self::global(V1_14D.addresses.world), raw);
    }

    /// Unmap the world global so game resolution fails to read
    pub fn unmap_world_global(&self) {
        self.mem.unmap(Self::global(V1_14D.addresses.world), 4);
    }

    pub fn set_game_id(&self, game_id: u32) {
        self.mem
            .write_u32(Self::global(V1_14D.addresses.game_id), game_id);
    }

    /// Overwrite the game slot the fixture's game id resolves to
    pub fn set_game_pointer(&self, raw: u32) {
        let slot = u64::from(Self::GAME_ID & GAME_MASK) * 0x0C + 0x08;
        self.mem.write_u32(GAME_BUFFER + slot, raw);
    }

    pub fn set_client_unit_type(&self, unit_type: u32) {
        self.mem
            .write_u32(CLIENT + client::UNIT_TYPE as u64, unit_type);
    }

    pub fn set_difficulty(&self, difficulty: u8) {
        self.mem.write_u8(GAME + game::DIFFICULTY as u64, difficulty);
    }

    pub fn set_area(&self, area: u8) {
        self.mem
            .write_u8(Self::global(V1_14D.addresses.area), area);
    }

    /// Install a quest status buffer for difficulty slot `index`
    pub fn set_quests(&self, index: usize, bytes: &[u8]) {
        let header = QUESTS + index as u64 * 0x100;
        let buffer = QUESTS + 0x1000 + index as u64 * 0x1000;
        self.mem
            .write_u32(header + quest::BUFFER as u64, buffer as u32);
        self.mem
            .write_u32(header + quest::LENGTH as u64, bytes.len() as u32);
        self.mem.write_bytes(buffer, bytes);
        self.mem
            .write_u32(PLAYER_DATA + (player::QUESTS + index * 4) as u64, header as u32);
    }

    /// Install a quest header whose length field is corrupt
    pub fn set_corrupt_quests(&self, index: usize) {
        self.set_quests(index, &[]);
        let header = QUESTS + index as u64 * 0x100;
        self.mem
            .write_u32(header + quest::LENGTH as u64, 0x7FFF_FFFF);
    }

    pub fn set_skills(&self, skills: &[(u16, u32)]) {
        let info = SKILLS;
        let first = SKILLS + 0x100;
        self.mem.write_zeroes(info, skill_info::SIZE);
        self.mem.write_u32(
            info + skill_info::FIRST_SKILL as u64,
            if skills.is_empty() { 0 } else { first as u32 },
        );

        for (i, &(id, level)) in skills.iter().enumerate() {
            let node = first + i as u64 * 0x100;
            let txt = node + 0x80;
            let next = if i + 1 < skills.len() { node + 0x100 } else { 0 };
            self.mem.write_zeroes(node, skill::SIZE);
            self.mem
                .write_u32(node + skill::SKILL_TXT as u64, txt as u32);
            self.mem
                .write_u32(node + skill::NEXT_SKILL as u64, next as u32);
            self.mem.write_u32(node + skill::LEVEL as u64, level);
            self.mem.write_u16(txt, id);
        }
        self.mem.write_u32(PLAYER + unit::SKILLS as u64, info as u32);
    }

    /// Name the items-table row for `class_id`
    pub fn add_item_type(&self, class_id: u32, name: &str) {
        let name_id = class_id as u16;
        let slot = {
            let mut state = self.state.borrow_mut();
            state.next_string_slot += 1;
            state.next_string_slot
        };

        let row = ITEM_ROWS + u64::from(class_id) * item_txt::STRIDE;
        self.mem
            .write_u16(row + item_txt::NAME_STRING as u64, name_id);

        let indexer = STRINGS;
        let table = STRINGS + 0x10_0000;
        let text = STRINGS + 0x20_0000 + u64::from(slot) * 0x200;
        self.mem.write_u16(indexer + u64::from(name_id) * 2, slot);
        self.mem
            .write_u32(table + u64::from(slot) * 4, text as u32);
        self.mem.write_zeroes(text, 0x200);
        self.mem
            .write_bytes(text, &crate::item::encode_wide(name));
    }

    fn allocate_item(&self, class_id: u32, body: u8, quality: ItemQuality, stats: &[(u16, i32)]) -> u64 {
        let address = {
            let mut state = self.state.borrow_mut();
            let address = state.next_item;
            state.next_item += ITEM_STRIDE;
            address
        };
        let data = address + ITEM_DATA;
        let list = address + ITEM_STATS;

        let m = &self.mem;
        m.write_zeroes(address, unit::SIZE);
        m.write_u32(address + unit::UNIT_TYPE as u64, 4);
        m.write_u32(address + unit::CLASS_ID as u64, class_id);
        m.write_u32(address + unit::UNIT_DATA as u64, data as u32);
        m.write_u32(address + unit::STAT_LIST as u64, list as u32);

        m.write_zeroes(data, item::SIZE);
        m.write_u32(data + item::QUALITY as u64, quality as u32);
        m.write_u8(data + item::BODY_LOCATION as u64, body);
        m.write_u8(data + item::PAGE as u64, if body == 0 { 0 } else { 0xFF });

        let base = address + ITEM_RECORDS;
        m.write_zeroes(list, stat_list::SIZE);
        m.write_u32(list + stat_list::BASE_STATS as u64, base as u32);
        m.write_u16(list + stat_list::BASE_COUNT as u64, stats.len() as u16);
        for (i, &(id, value)) in stats.iter().enumerate() {
            let record = base + (i * stat::SIZE) as u64;
            m.write_u16(record + stat::LAYER as u64, 0);
            m.write_u16(record + stat::ID as u64, id);
            m.write_i32(record + stat::VALUE as u64, value);
        }

        address
    }

    fn append_to_chain(&self, inventory_address: u64, item_address: u64) {
        let previous = self
            .state
            .borrow_mut()
            .chain_tails
            .insert(inventory_address, item_address);
        match previous {
            Some(tail) => self.mem.write_u32(
                tail + ITEM_DATA + item::NEXT_ITEM as u64,
                item_address as u32,
            ),
            None => self.mem.write_u32(
                inventory_address + inventory::FIRST_ITEM as u64,
                item_address as u32,
            ),
        }
    }

    /// Add an item to the player's inventory chain; `body` 0 means carried
    pub fn add_item(
        &self,
        class_id: u32,
        body: u8,
        quality: ItemQuality,
        stats: &[(u16, i32)],
    ) -> RemoteAddress {
        let address = self.allocate_item(class_id, body, quality, stats);
        self.append_to_chain(INVENTORY, address);
        RemoteAddress::new(address as u32)
    }

    /// Socket a new item into `parent`
    pub fn socket_into(
        &self,
        parent: RemoteAddress,
        class_id: u32,
        stats: &[(u16, i32)],
    ) -> RemoteAddress {
        let sockets = parent.as_u64() + ITEM_SOCKETS;
        if !self.state.borrow().chain_tails.contains_key(&sockets) {
            self.write_inventory_header(sockets);
            self.mem
                .write_u32(parent.offset(unit::INVENTORY as u64), sockets as u32);
            let data = parent.as_u64() + ITEM_DATA;
            self.mem
                .write_u32(data + item::FLAGS as u64, item::FLAG_SOCKETED);
        }

        let child = self.allocate_item(class_id, 0, ItemQuality::Normal, stats);
        // Socketed children sit on no page
        self.mem
            .write_u8(child + ITEM_DATA + item::PAGE as u64, 0xFF);
        self.append_to_chain(sockets, child);
        RemoteAddress::new(child as u32)
    }

    pub fn set_ethereal(&self, item_address: RemoteAddress) {
        let flags = item_address.as_u64() + ITEM_DATA + item::FLAGS as u64;
        let current = crate::process::ReadMemory::read_u32(&self.mem, flags).unwrap_or(0);
        self.mem.write_u32(flags, current | item::FLAG_ETHEREAL);
    }

    /// Point the last item of the player's chain back at `target`
    /// Point the end of `parent`'s socket chain at `target`
    pub fn link_sockets_to(&self, parent: RemoteAddress, target: RemoteAddress) {
        let sockets = parent.as_u64() + ITEM_SOCKETS;
        if let Some(&tail) = self.state.borrow().chain_tails.get(&sockets) {
            self.mem.write_u32(
                tail + ITEM_DATA + item::NEXT_ITEM as u64,
                target.raw(),
            );
        }
    }

    pub fn link_back_to(&self, target: RemoteAddress) {
        if let Some(&tail) = self.state.borrow().chain_tails.get(&INVENTORY) {
            self.mem.write_u32(
                tail + ITEM_DATA + item::NEXT_ITEM as u64,
                target.raw(),
            );
        }
    }
}

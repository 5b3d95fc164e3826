//! Acquisition orchestrator
//!
//! [`DataReader`] owns the attached address space and the cross-tick state
//! (character identities, last quest buffers). Every [`DataReader::tick`]
//! re-resolves the game from the module globals and builds fresh per-tick
//! readers, so no pointer chain survives from one tick to the next.
//!
//! ```ignore
//! let config = ReaderConfig::default();
//! let mut reader = DataReader::new(SystemProcesses, config)?;
//! let (tx, rx) = std::sync::mpsc::channel();
//! let control = ReaderControl::new();
//! let reason = reader.run(&control, tx)?;
//! ```

mod control;
mod event;
mod game;
mod game_loop;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::character::{Character, CharacterClass, CharacterTracker, Difficulty};
use crate::config::{ReadFlag, ReaderConfig};
use crate::error::{Error, Result};
use crate::item::{
    BodyLocation, InventoryReader, ItemReader, ItemRecord, ItemUnit, all, is_equipped,
};
use crate::layout::{self, VersionLayout};
use crate::process::{AddressingMode, ProcessProvider, ProcessTarget, ReadMemory};
use crate::quest::{completed_count, read_quest_buffer};
use crate::skills::{SkillLevels, SkillReader};
use crate::stats::{StatId, StatMap, StatReader, stat_value};

pub use control::{ReaderControl, StopReason};

/// Consecutive unreadable resolutions before the handle is reopened
pub const MAX_FAILED_RESOLVES: u32 = 10;
pub use event::{CollectSink, DataReadEvent, EventSink, FnSink, ReaderEvent};
pub use game::{GameInfo, resolve_game};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Detached,
    Attaching,
    AttachedNoGame,
    AttachedInGame,
}

/// What one tick achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No process to read from
    Detached,
    /// Attached, but no game is loaded
    NoGame,
    /// A data-read event was emitted
    InGame,
    /// The game was found but the pipeline failed; nothing was emitted
    Failed,
}

/// Queues a layout change for the next tick boundary.
///
/// Clones share the same slot, so the handle can be given to another thread
/// while the loop runs.
#[derive(Debug, Clone, Default)]
pub struct LayoutSwitch {
    pending: Arc<Mutex<Option<&'static VersionLayout>>>,
}

impl LayoutSwitch {
    /// Validate `version` now and apply it at the start of the next tick
    pub fn request(&self, version: &str) -> Result<()> {
        let layout = layout::for_version(version)?;
        *self.slot() = Some(layout);
        Ok(())
    }

    fn take(&self) -> Option<&'static VersionLayout> {
        self.slot().take()
    }

    fn slot(&self) -> MutexGuard<'_, Option<&'static VersionLayout>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct DataReader<P: ProcessProvider> {
    provider: P,
    config: ReaderConfig,
    target: ProcessTarget,
    layout: &'static VersionLayout,
    switch: LayoutSwitch,
    memory: Option<P::Memory>,
    state: ReaderState,
    tracker: CharacterTracker,
    current_name: Option<String>,
    current_difficulty: Difficulty,
    quest_buffers: BTreeMap<Difficulty, Vec<u16>>,
    failed_resolves: u32,
}

impl<P: ProcessProvider> DataReader<P> {
    /// Fails with [`Error::UnknownVersion`](crate::Error::UnknownVersion) when the configured version has no layout
    pub fn new(provider: P, config: ReaderConfig) -> Result<Self> {
        let layout = layout::for_version(&config.game_version)?;
        info!(
            "Reader configured for {} ({} in {}), polling every {}ms",
            layout.version, config.module_name, config.process_name, config.polling_rate_ms
        );

        Ok(Self {
            provider,
            target: config.target(),
            config,
            layout,
            switch: LayoutSwitch::default(),
            memory: None,
            state: ReaderState::Detached,
            tracker: CharacterTracker::new(),
            current_name: None,
            current_difficulty: Difficulty::Normal,
            quest_buffers: BTreeMap::new(),
            failed_resolves: 0,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Layout in effect for the current tick
    pub fn layout(&self) -> &'static VersionLayout {
        self.layout
    }

    /// Handle for queueing version switches from elsewhere
    pub fn layout_switch(&self) -> LayoutSwitch {
        self.switch.clone()
    }

    pub fn set_game_version(&self, version: &str) -> Result<()> {
        self.switch.request(version)
    }

    /// Character read on the last in-game tick
    pub fn current_character(&self) -> Option<&Character> {
        self.tracker.get(self.current_name.as_deref()?)
    }

    /// Most recently started character
    pub fn active_character(&self) -> Option<&Character> {
        self.tracker.active()
    }

    pub fn active_character_timestamp(&self) -> Option<DateTime<Utc>> {
        self.tracker.active_since()
    }

    /// Last quest buffer read for the current difficulty
    pub fn current_quest_buffer(&self) -> Option<&[u16]> {
        self.quest_buffers
            .get(&self.current_difficulty)
            .map(Vec::as_slice)
    }

    /// Decode the equipped items occupying any of `slots`
    pub fn read_items_in_slots(&self, slots: &[BodyLocation]) -> Result<Vec<ItemRecord>> {
        let Some(memory) = self.memory.as_ref() else {
            return Ok(Vec::new());
        };
        let Some(info) = resolve_game(memory, self.layout)? else {
            return Ok(Vec::new());
        };
        if !info.player.inventory.is_valid() {
            return Ok(Vec::new());
        }

        let items = ItemReader::new(memory, self.layout);
        let records = InventoryReader::new(memory)
            .enumerate(info.player.inventory, |item: &ItemUnit| {
                slots.contains(&item.body_location())
            })?
            .map(|item| items.record_of(&item))
            .collect();
        Ok(records)
    }

    /// Run one poll iteration without sleeping.
    ///
    /// Only a cancellation from the sink is returned as an error; every other
    /// failure is logged and reflected in the outcome.
    pub fn tick<S: EventSink>(&mut self, sink: &mut S) -> Result<TickOutcome> {
        if self.memory.as_ref().is_some_and(|memory| !memory.is_alive()) {
            info!("Game process exited, detaching");
            self.detach();
        }

        if self.memory.is_none() {
            self.state = ReaderState::Attaching;
            match self.provider.attach(&self.target) {
                Ok(memory) => {
                    info!("Attached to {}", self.target.process_name);
                    self.memory = Some(memory);
                    self.state = ReaderState::AttachedNoGame;
                }
                Err(e) => {
                    debug!("Attach failed: {}", e);
                    self.state = ReaderState::Detached;
                    return Ok(TickOutcome::Detached);
                }
            }
        }

        if let Some(next) = self.switch.take() {
            info!("Switching layout {} -> {}", self.layout.version, next.version);
            self.layout = next;
        }

        let Some(memory) = self.memory.as_ref() else {
            return Ok(TickOutcome::Detached);
        };

        let resolved = resolve_game(memory, self.layout);
        self.failed_resolves = match &resolved {
            Err(_) => self.failed_resolves + 1,
            Ok(_) => 0,
        };
        let info = match resolved {
            Ok(Some(info)) => info,
            Ok(None) => {
                self.enter_no_game();
                return Ok(TickOutcome::NoGame);
            }
            // A load screen can fail a read or two; a handle that keeps
            // failing gets reopened
            Err(e)
                if matches!(e, Error::ProcessMemoryReadDenied(_))
                    || self.failed_resolves >= MAX_FAILED_RESOLVES =>
            {
                warn!(
                    "Game memory unreadable after {} tries ({}), reattaching",
                    self.failed_resolves, e
                );
                self.detach();
                return Ok(TickOutcome::Detached);
            }
            Err(e) => {
                debug!("Game resolution failed: {}", e);
                self.enter_no_game();
                return Ok(TickOutcome::NoGame);
            }
        };
        self.state = ReaderState::AttachedInGame;

        let pipeline = Pipeline {
            memory,
            layout: self.layout,
            config: &self.config,
        };
        let snapshot = match pipeline.read(&info) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Tick failed: {}", e);
                return Ok(TickOutcome::Failed);
            }
        };

        let (observation, character) = self.tracker.observe(
            &info.player_data.name,
            snapshot.level,
            snapshot.experience,
        );
        character.class = CharacterClass::from_repr(info.player.class_id);
        character.update_mode(info.player.mode);
        character.apply_stats(snapshot.full_stats, snapshot.item_stats, snapshot.game_difficulty);
        character.completed_quests = snapshot.completed_quests;
        let character = character.clone();

        self.current_name = Some(character.name.clone());
        self.current_difficulty = snapshot.current_difficulty;
        self.quest_buffers = snapshot.quest_buffers.clone();

        if observation.brand_new {
            deliver(sink.on_character_created(&character))?;
        }

        let event = DataReadEvent {
            is_autosplit_character: self.tracker.is_active(&character),
            character,
            item_strings: snapshot.item_strings,
            current_area: snapshot.current_area,
            current_difficulty: snapshot.current_difficulty,
            item_ids: snapshot.item_ids,
            quest_buffers: snapshot.quest_buffers,
            inventory: snapshot.inventory,
            skill_levels: snapshot.skill_levels,
            timestamp: Utc::now(),
        };
        deliver(sink.on_data_read(&event))?;

        Ok(TickOutcome::InGame)
    }

    fn detach(&mut self) {
        self.memory = None;
        self.failed_resolves = 0;
        self.state = ReaderState::Detached;
    }

    fn enter_no_game(&mut self) {
        self.state = ReaderState::AttachedNoGame;
        self.tracker.mark_title_screen();
    }
}

/// Cancellation propagates; other sink failures only cost this event
fn deliver(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_cancellation() => Err(e),
        Err(e) => {
            warn!("Event handler failed: {}", e);
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

/// Values read in one tick, before identity tracking
struct Snapshot {
    level: u32,
    experience: u32,
    full_stats: StatMap,
    item_stats: StatMap,
    game_difficulty: Difficulty,
    current_difficulty: Difficulty,
    completed_quests: [u32; 3],
    quest_buffers: BTreeMap<Difficulty, Vec<u16>>,
    current_area: Option<u8>,
    item_strings: BTreeMap<BodyLocation, String>,
    item_ids: Vec<u32>,
    inventory: Vec<ItemRecord>,
    skill_levels: SkillLevels,
}

/// Per-tick read pipeline; built fresh every tick
struct Pipeline<'a, R: ReadMemory> {
    memory: &'a R,
    layout: &'static VersionLayout,
    config: &'a ReaderConfig,
}

impl<R: ReadMemory> Pipeline<'_, R> {
    fn enabled(&self, flag: ReadFlag) -> bool {
        self.config.read_flags.contains(flag)
    }

    fn read(&self, info: &GameInfo) -> Result<Snapshot> {
        let stats = StatReader::new(self.memory);
        let base = stats.stats_of(&info.player)?;
        let full = stats.full_stats_of(&info.player)?;
        let equipped = self.items(info, is_equipped);
        let item_stats = stats.item_stats_of(equipped.iter().map(|item| &item.unit));

        let game_difficulty = Difficulty::from_u8(info.game.difficulty).unwrap_or_default();
        let current_difficulty = if self.enabled(ReadFlag::CurrentDifficulty) {
            game_difficulty
        } else {
            Difficulty::Normal
        };

        let (completed_quests, quest_buffers) = if self.enabled(ReadFlag::QuestBuffers) {
            self.quests(info)
        } else {
            ([0; 3], BTreeMap::new())
        };

        let current_area = if self.enabled(ReadFlag::CurrentArea) {
            self.area()
        } else {
            None
        };

        let item_strings = if self.enabled(ReadFlag::EquippedItemStrings) {
            self.item_strings(&equipped)
        } else {
            BTreeMap::new()
        };

        let carried = if self.enabled(ReadFlag::InventoryItemIds)
            || self.enabled(ReadFlag::StructuredInventory)
        {
            self.items(info, all)
        } else {
            Vec::new()
        };
        let item_ids = if self.enabled(ReadFlag::InventoryItemIds) {
            self.item_ids(&carried)
        } else {
            Vec::new()
        };
        let inventory = if self.enabled(ReadFlag::StructuredInventory) {
            let items = ItemReader::new(self.memory, self.layout);
            carried.iter().map(|item| items.record_of(item)).collect()
        } else {
            Vec::new()
        };

        let skill_levels = if self.enabled(ReadFlag::SkillLevels) {
            SkillReader::new(self.memory)
                .skill_levels(&info.player)
                .unwrap_or_else(|e| {
                    debug!("Skill list unreadable: {}", e);
                    SkillLevels::new()
                })
        } else {
            SkillLevels::new()
        };

        Ok(Snapshot {
            level: stat_value(&base, StatId::LEVEL).max(0) as u32,
            experience: stat_value(&base, StatId::EXPERIENCE) as u32,
            full_stats: full,
            item_stats,
            game_difficulty,
            current_difficulty,
            completed_quests,
            quest_buffers,
            current_area,
            item_strings,
            item_ids,
            inventory,
            skill_levels,
        })
    }

    /// Player items matching `predicate`; an unreadable inventory is empty
    fn items(&self, info: &GameInfo, predicate: fn(&ItemUnit) -> bool) -> Vec<ItemUnit> {
        if !info.player.inventory.is_valid() {
            return Vec::new();
        }
        match InventoryReader::new(self.memory).enumerate(info.player.inventory, predicate) {
            Ok(items) => items.collect(),
            Err(e) => {
                debug!("Inventory unreadable: {}", e);
                Vec::new()
            }
        }
    }

    fn quests(&self, info: &GameInfo) -> ([u32; 3], BTreeMap<Difficulty, Vec<u16>>) {
        let mut counts = [0; 3];
        let mut buffers = BTreeMap::new();

        for (index, &array) in info.player_data.quests.iter().enumerate() {
            if array.is_null() {
                continue;
            }
            let Some(difficulty) = Difficulty::from_repr(index as u8) else {
                continue;
            };
            match read_quest_buffer(self.memory, array) {
                Ok(words) => {
                    counts[index] = completed_count(&words, &self.layout.quests);
                    buffers.insert(difficulty, words);
                }
                Err(e) => debug!("Quest buffer {} unreadable: {}", difficulty, e),
            }
        }

        (counts, buffers)
    }

    fn area(&self) -> Option<u8> {
        let address = self
            .memory
            .resolve(self.layout.addresses.area, AddressingMode::ModuleRelative);
        self.memory
            .read_u8(address)
            .inspect_err(|e| debug!("Area unreadable: {}", e))
            .ok()
    }

    fn item_strings(&self, equipped: &[ItemUnit]) -> BTreeMap<BodyLocation, String> {
        let items = ItemReader::new(self.memory, self.layout);
        let mut strings = BTreeMap::new();
        for item in equipped {
            match items.tooltip_of(item) {
                Ok(text) => {
                    strings.entry(item.body_location()).or_insert(text);
                }
                Err(e) => debug!("Skipping equipped item {}: {}", item.address, e),
            }
        }
        strings
    }

    fn item_ids(&self, carried: &[ItemUnit]) -> Vec<u32> {
        let inventory = InventoryReader::new(self.memory);
        let mut seen: HashSet<_> = carried.iter().map(|item| item.address).collect();
        let mut ids: Vec<u32> = carried.iter().map(ItemUnit::class_id).collect();
        for item in carried {
            for socketed in inventory.socketed_items_of(item) {
                // A socket chain can point back into the main chain
                if seen.insert(socketed.address) {
                    ids.push(socketed.class_id());
                }
            }
        }
        ids
    }
}

//! Characters and cross-tick identity
//!
//! The tracker keys characters by player name and decides every tick whether
//! the name belongs to the same playthrough, a new one, or one that was
//! deleted and recreated under the same name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};
use tracing::info;

use crate::stats::{StatId, StatMap, stat_value};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    FromRepr,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Difficulty {
    #[default]
    Normal = 0,
    Nightmare = 1,
    Hell = 2,
}

impl Difficulty {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }

    /// Resistance penalty applied in this difficulty
    pub fn resist_penalty(&self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Nightmare => 40,
            Self::Hell => 100,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, IntoStaticStr, Display,
)]
#[repr(u32)]
pub enum CharacterClass {
    Amazon = 0,
    Sorceress = 1,
    Necromancer = 2,
    Paladin = 3,
    Barbarian = 4,
    Druid = 5,
    Assassin = 6,
}

/// Animation mode of a player unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, Display)]
#[repr(u32)]
pub enum PlayerMode {
    Death = 0,
    Neutral = 1,
    Walk = 2,
    Run = 3,
    GetHit = 4,
    TownNeutral = 5,
    TownWalk = 6,
    Attack1 = 7,
    Attack2 = 8,
    Block = 9,
    Cast = 10,
    Throw = 11,
    Kick = 12,
    Skill1 = 13,
    Skill2 = 14,
    Skill3 = 15,
    Skill4 = 16,
    Dead = 17,
    Sequence = 18,
    KnockBack = 19,
}

impl PlayerMode {
    pub fn is_dying(&self) -> bool {
        matches!(self, Self::Death | Self::Dead)
    }
}

/// Resistances can never drop below this
const MIN_RESIST: i32 = -100;
/// Resistance cap before any maximum-resist bonus
const BASE_MAX_RESIST: i32 = 75;

/// Values derived from the player's stat lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub strength: i32,
    pub dexterity: i32,
    pub vitality: i32,
    pub energy: i32,
    pub life: i32,
    pub max_life: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub fire_resist: i32,
    pub cold_resist: i32,
    pub lightning_resist: i32,
    pub poison_resist: i32,
    pub faster_cast_rate: i32,
    pub faster_hit_recovery: i32,
    pub faster_run_walk: i32,
    pub increased_attack_speed: i32,
    pub magic_find: i32,
    pub gold: i32,
    pub stash_gold: i32,
    pub defense: i32,
}

impl CharacterStats {
    /// Derive displayed values from the full (modified) stat list
    pub fn derive(full: &StatMap, difficulty: Difficulty) -> Self {
        let get = |id| stat_value(full, id);
        let resist = |id, max_id| {
            let cap = BASE_MAX_RESIST + get(max_id);
            (get(id) - difficulty.resist_penalty()).clamp(MIN_RESIST, cap.max(MIN_RESIST))
        };

        Self {
            strength: get(StatId::STRENGTH),
            dexterity: get(StatId::DEXTERITY),
            vitality: get(StatId::VITALITY),
            energy: get(StatId::ENERGY),
            life: get(StatId::LIFE),
            max_life: get(StatId::MAX_LIFE),
            mana: get(StatId::MANA),
            max_mana: get(StatId::MAX_MANA),
            fire_resist: resist(StatId::FIRE_RESIST, StatId::MAX_FIRE_RESIST),
            cold_resist: resist(StatId::COLD_RESIST, StatId::MAX_COLD_RESIST),
            lightning_resist: resist(StatId::LIGHTNING_RESIST, StatId::MAX_LIGHTNING_RESIST),
            poison_resist: resist(StatId::POISON_RESIST, StatId::MAX_POISON_RESIST),
            faster_cast_rate: get(StatId::FASTER_CAST_RATE),
            faster_hit_recovery: get(StatId::FASTER_HIT_RECOVERY),
            faster_run_walk: get(StatId::FASTER_RUN_WALK),
            increased_attack_speed: get(StatId::INCREASED_ATTACK_SPEED),
            magic_find: get(StatId::MAGIC_FIND),
            gold: get(StatId::GOLD),
            stash_gold: get(StatId::STASH_GOLD),
            defense: get(StatId::DEFENSE),
        }
    }
}

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// One playthrough of a named character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Process-unique identity; a reset under the same name gets a new one
    pub serial: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub class: Option<CharacterClass>,
    pub level: u32,
    pub experience: u32,
    pub stats: CharacterStats,
    pub deaths: u32,
    /// Really completed quests per difficulty
    pub completed_quests: [u32; 3],
    pub player_stats: StatMap,
    pub item_stats: StatMap,
    #[serde(skip)]
    mode: Option<PlayerMode>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            created_at: Utc::now(),
            class: None,
            level: 0,
            experience: 0,
            stats: CharacterStats::default(),
            deaths: 0,
            completed_quests: [0; 3],
            player_stats: StatMap::new(),
            item_stats: StatMap::new(),
            mode: None,
        }
    }

    pub fn mode(&self) -> Option<PlayerMode> {
        self.mode
    }

    /// Track the unit mode; entering the death animation counts one death
    pub fn update_mode(&mut self, raw: u32) {
        let mode = PlayerMode::from_repr(raw);
        let was_dying = self.mode.is_some_and(|m| m.is_dying());
        if mode == Some(PlayerMode::Death) && !was_dying {
            self.deaths += 1;
            info!("{} died ({} deaths)", self.name, self.deaths);
        }
        self.mode = mode;
    }

    /// Replace both stat maps and everything derived from them
    pub fn apply_stats(&mut self, full: StatMap, items: StatMap, difficulty: Difficulty) {
        self.stats = CharacterStats::derive(&full, difficulty);
        self.player_stats = full;
        self.item_stats = items;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same playthrough as last tick
    Continued,
    /// First time this name is seen
    Appeared,
    /// Name seen before, but the old playthrough was discarded
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub transition: Transition,
    /// Level 1 with no experience: a playthrough that just started
    pub brand_new: bool,
}

/// Per-name identity state carried across ticks
#[derive(Debug, Default)]
pub struct CharacterTracker {
    characters: HashMap<String, Character>,
    was_in_title_screen: bool,
    active: Option<u64>,
    active_since: Option<DateTime<Utc>>,
}

impl CharacterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// No game was found this tick
    pub fn mark_title_screen(&mut self) {
        self.was_in_title_screen = true;
    }

    pub fn was_in_title_screen(&self) -> bool {
        self.was_in_title_screen
    }

    /// Feed this tick's identity fields and get the character they belong to
    pub fn observe(
        &mut self,
        name: &str,
        level: u32,
        experience: u32,
    ) -> (Observation, &mut Character) {
        let mut transition = Transition::Continued;

        if let Some(existing) = self.characters.get(name) {
            let fresh_after_title = self.was_in_title_screen && experience == 0;
            let lost_level_one_xp = existing.level == 1 && experience < existing.experience;
            let lost_level = level < existing.level;

            if fresh_after_title || lost_level_one_xp || lost_level {
                info!(
                    "Character {} reset (level {} -> {}, xp {} -> {})",
                    name, existing.level, level, existing.experience, experience
                );
                self.characters.remove(name);
                transition = Transition::Reset;
            }
        } else {
            transition = Transition::Appeared;
        }

        let brand_new = level == 1 && experience == 0;
        if transition != Transition::Continued {
            let character = Character::new(name);
            self.active = Some(character.serial);
            self.active_since = Some(character.created_at);
            if brand_new {
                info!("New character {} started", name);
            }
            self.characters.insert(name.to_string(), character);
        }

        self.was_in_title_screen = false;

        let character = self
            .characters
            .entry(name.to_string())
            .or_insert_with(|| Character::new(name));
        character.level = level;
        character.experience = experience;

        (
            Observation {
                transition,
                brand_new: brand_new && transition != Transition::Continued,
            },
            character,
        )
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.characters.get(name)
    }

    /// The most recently (re)started character
    pub fn is_active(&self, character: &Character) -> bool {
        self.active == Some(character.serial)
    }

    pub fn active(&self) -> Option<&Character> {
        let serial = self.active?;
        self.characters.values().find(|c| c.serial == serial)
    }

    pub fn active_since(&self) -> Option<DateTime<Utc>> {
        self.active_since
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

//! Inventory traversal and item presentation
//!
//! [`InventoryReader`] walks an inventory's item chain lazily and filters it
//! with a caller-supplied predicate. [`ItemReader`] turns a walked item into
//! names, property lines and a structured [`ItemRecord`].
//!
//! Both are cheap per-tick values; nothing here caches pointers between
//! ticks.

mod property;
mod reader;
mod text;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::error::{Error, Result};
use crate::process::{ReadMemory, RemoteAddress};
use crate::structs::offsets::inventory;
use crate::structs::{InventoryHeader, ItemData, Unit};

pub use property::{format_property, magical_properties};
pub use reader::ItemReader;
pub use text::StringTable;

#[cfg(test)]
pub(crate) use text::encode_wide;

/// Equipment slot an item occupies
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
#[strum(ascii_case_insensitive)]
pub enum BodyLocation {
    #[default]
    None = 0,
    Head = 1,
    Amulet = 2,
    BodyArmor = 3,
    PrimaryRight = 4,
    PrimaryLeft = 5,
    RingLeft = 6,
    RingRight = 7,
    Belt = 8,
    Boots = 9,
    Gloves = 10,
    SecondaryRight = 11,
    SecondaryLeft = 12,
}

impl BodyLocation {
    /// Unknown slot bytes are treated as not equipped
    pub fn from_u8(value: u8) -> Self {
        Self::from_repr(value).unwrap_or_default()
    }

    /// Every real slot, in slot order
    pub fn equipment_slots() -> impl Iterator<Item = Self> {
        Self::iter().filter(|slot| *slot != Self::None)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, IntoStaticStr, Display,
)]
#[repr(u32)]
pub enum ItemQuality {
    Inferior = 1,
    Normal = 2,
    Superior = 3,
    Magic = 4,
    Set = 5,
    Rare = 6,
    Unique = 7,
    Crafted = 8,
    Tempered = 9,
}

/// Where an item sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ItemContainer {
    Equipped,
    Inventory,
    Stash,
    Cube,
    Belt,
    Unknown,
}

impl ItemContainer {
    const PAGE_INVENTORY: u8 = 0;
    const PAGE_CUBE: u8 = 3;
    const PAGE_STASH: u8 = 4;
    const NODE_PAGE_BELT: u8 = 2;

    pub fn of(data: &ItemData) -> Self {
        if BodyLocation::from_u8(data.body_location) != BodyLocation::None {
            return Self::Equipped;
        }
        if data.node_page == Self::NODE_PAGE_BELT {
            return Self::Belt;
        }
        match data.page {
            Self::PAGE_INVENTORY => Self::Inventory,
            Self::PAGE_CUBE => Self::Cube,
            Self::PAGE_STASH => Self::Stash,
            _ => Self::Unknown,
        }
    }
}

/// An item unit together with its item data, as reached by a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemUnit {
    pub address: RemoteAddress,
    pub unit: Unit,
    pub data: ItemData,
}

impl ItemUnit {
    pub fn class_id(&self) -> u32 {
        self.unit.class_id
    }

    pub fn body_location(&self) -> BodyLocation {
        BodyLocation::from_u8(self.data.body_location)
    }

    pub fn quality(&self) -> Option<ItemQuality> {
        ItemQuality::from_repr(self.data.quality)
    }

    pub fn container(&self) -> ItemContainer {
        ItemContainer::of(&self.data)
    }
}

/// Fully decoded item for the structured inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub class_id: u32,
    pub base_name: String,
    pub display_name: String,
    pub body_location: BodyLocation,
    pub container: ItemContainer,
    pub quality: Option<ItemQuality>,
    pub ethereal: bool,
    pub properties: Vec<String>,
    pub sockets: Vec<ItemRecord>,
}

const CHARM_BASES: [&str; 3] = ["Small Charm", "Large Charm", "Grand Charm"];

/// Predicate: the item occupies an equipment slot
pub fn is_equipped(item: &ItemUnit) -> bool {
    item.body_location() != BodyLocation::None
}

fn is_charm_base(base_name: &str) -> bool {
    CHARM_BASES.contains(&base_name)
}

/// A charm base with at least one rolled property, sitting in the inventory
/// grid. Charms only apply their stats from the inventory, so stashed or
/// cubed ones do not count.
///
/// For use as an [`InventoryReader::enumerate`] predicate see
/// [`ItemReader::is_charm`].
pub fn is_charm(record: &ItemRecord) -> bool {
    record.container == ItemContainer::Inventory
        && is_charm_base(&record.base_name)
        && !record.properties.is_empty()
}

/// Predicate accepting every item
pub fn all(_: &ItemUnit) -> bool {
    true
}

/// Walks inventory item chains
pub struct InventoryReader<'a, R: ReadMemory> {
    reader: &'a R,
}

impl<'a, R: ReadMemory> InventoryReader<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Lazily walk the inventory at `root`, yielding items that match.
    ///
    /// Every call starts a fresh traversal. A header without the inventory
    /// signature is rejected up front; a broken link later in the chain ends
    /// the walk early.
    pub fn enumerate<F>(&self, root: RemoteAddress, predicate: F) -> Result<InventoryIter<'a, R, F>>
    where
        F: FnMut(&ItemUnit) -> bool,
    {
        let header: InventoryHeader = self.reader.read_struct(root)?;
        if !header.is_live() {
            return Err(Error::malformed(format!(
                "inventory {} has signature {:#x}",
                root, header.signature
            )));
        }
        Ok(InventoryIter {
            reader: self.reader,
            current: header.first_item,
            visited: HashSet::new(),
            predicate,
        })
    }

    /// Items socketed into `item`, walked through the item's own inventory
    pub fn socketed_items_of(&self, item: &ItemUnit) -> Vec<ItemUnit> {
        if !item.unit.inventory.is_valid() {
            return Vec::new();
        }
        match self.enumerate(item.unit.inventory, all) {
            Ok(iter) => iter.collect(),
            Err(e) => {
                debug!("No sockets readable for item {}: {}", item.address, e);
                Vec::new()
            }
        }
    }
}

/// Single-pass walk over one inventory chain
pub struct InventoryIter<'a, R: ReadMemory, F> {
    reader: &'a R,
    current: RemoteAddress,
    visited: HashSet<RemoteAddress>,
    predicate: F,
}

impl<R: ReadMemory, F> InventoryIter<'_, R, F> {
    fn read_item(&self, address: RemoteAddress) -> Result<ItemUnit> {
        let unit: Unit = self.reader.read_struct(address)?;
        let data: ItemData = self.reader.read_struct(unit.unit_data)?;
        Ok(ItemUnit { address, unit, data })
    }
}

impl<R, F> Iterator for InventoryIter<'_, R, F>
where
    R: ReadMemory,
    F: FnMut(&ItemUnit) -> bool,
{
    type Item = ItemUnit;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current.is_valid() {
            if self.visited.len() >= inventory::MAX_NODES {
                debug!("Inventory walk hit the {} node bound", inventory::MAX_NODES);
                return None;
            }
            let address = self.current;
            if !self.visited.insert(address) {
                debug!("Inventory chain loops back to {}", address);
                self.current = RemoteAddress::NULL;
                return None;
            }

            let item = match self.read_item(address) {
                Ok(item) => item,
                Err(e) => {
                    debug!("Inventory walk stopped at {}: {}", address, e);
                    self.current = RemoteAddress::NULL;
                    return None;
                }
            };
            self.current = item.data.next_item;

            if (self.predicate)(&item) {
                return Some(item);
            }
        }
        None
    }
}

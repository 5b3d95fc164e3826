use tracing::debug;

use crate::error::{Error, Result};
use crate::item::{
    InventoryReader, ItemContainer, ItemQuality, ItemRecord, ItemUnit, StringTable, is_charm_base,
    magical_properties,
};
use crate::layout::VersionLayout;
use crate::process::{AddressingMode, ReadMemory};
use crate::stats::StatReader;
use crate::structs::offsets::{data_tables, item_txt};

/// Presentation helpers for items reached through an inventory walk
pub struct ItemReader<'a, R: ReadMemory> {
    reader: &'a R,
    layout: &'a VersionLayout,
    strings: StringTable<'a, R>,
    stats: StatReader<'a, R>,
    inventory: InventoryReader<'a, R>,
}

impl<'a, R: ReadMemory> ItemReader<'a, R> {
    pub fn new(reader: &'a R, layout: &'a VersionLayout) -> Self {
        Self {
            reader,
            layout,
            strings: StringTable::new(reader, layout),
            stats: StatReader::new(reader),
            inventory: InventoryReader::new(reader),
        }
    }

    /// Localized name of the item's base type, from the items text table
    pub fn base_name_of(&self, item: &ItemUnit) -> Result<String> {
        let tables = self
            .reader
            .read_address(
                self.reader
                    .resolve(self.layout.addresses.data_tables, AddressingMode::ModuleRelative),
            )?
            .checked()
            .ok_or_else(|| Error::malformed("data tables are not loaded"))?;

        let rows = self
            .reader
            .read_address(tables.offset(data_tables::ITEMS_TXT as u64))?;
        let rows = rows.checked().ok_or(Error::InvalidAddress(rows.raw()))?;
        let count = self
            .reader
            .read_u32(tables.offset(data_tables::ITEMS_TXT_COUNT as u64))?;

        let class_id = item.class_id();
        if class_id >= count {
            return Err(Error::malformed(format!(
                "item class {} outside items table of {}",
                class_id, count
            )));
        }

        let row = rows.offset(u64::from(class_id) * item_txt::STRIDE);
        let name_id = self.reader.read_u16(row + item_txt::NAME_STRING as u64)?;
        self.strings.lookup(name_id)
    }

    /// Base name decorated with quality and ethereal markers
    pub fn display_name_of(&self, item: &ItemUnit) -> String {
        let base = self.base_name_of(item).unwrap_or_else(|e| {
            debug!("No base name for item class {}: {}", item.class_id(), e);
            format!("item #{}", item.class_id())
        });
        decorate_name(base, item)
    }

    pub fn magical_property_strings_of(&self, item: &ItemUnit) -> Result<Vec<String>> {
        let stats = self.stats.stats_of(&item.unit)?;
        Ok(magical_properties(&stats))
    }

    /// Unit-level counterpart of [`crate::item::is_charm`], usable as an
    /// enumerate predicate: `|item| items.is_charm(item)`
    pub fn is_charm(&self, item: &ItemUnit) -> bool {
        item.container() == ItemContainer::Inventory
            && self.base_name_of(item).is_ok_and(|name| is_charm_base(&name))
            && self
                .magical_property_strings_of(item)
                .is_ok_and(|properties| !properties.is_empty())
    }

    pub fn socketed_items_of(&self, item: &ItemUnit) -> Vec<ItemUnit> {
        self.inventory.socketed_items_of(item)
    }

    /// Tooltip text: the name line followed by indented property lines
    pub fn tooltip_of(&self, item: &ItemUnit) -> Result<String> {
        let properties = self.magical_property_strings_of(item)?;
        let mut text = self.display_name_of(item);
        text.push('\n');
        for line in properties {
            text.push_str("    ");
            text.push_str(&line);
            text.push('\n');
        }
        Ok(text)
    }

    /// Fully decoded record including socketed children
    pub fn record_of(&self, item: &ItemUnit) -> ItemRecord {
        let base_name = self.base_name_of(item).unwrap_or_default();
        let display_name = self.display_name_of(item);
        let properties = self.magical_property_strings_of(item).unwrap_or_else(|e| {
            debug!("No properties for item class {}: {}", item.class_id(), e);
            Vec::new()
        });
        let sockets = self
            .socketed_items_of(item)
            .iter()
            .map(|child| self.record_of(child))
            .collect();

        ItemRecord {
            class_id: item.class_id(),
            base_name,
            display_name,
            body_location: item.body_location(),
            container: item.container(),
            quality: item.quality(),
            ethereal: item.data.is_ethereal(),
            properties,
            sockets,
        }
    }
}

fn decorate_name(base: String, item: &ItemUnit) -> String {
    let mut name = base;
    match item.quality() {
        Some(ItemQuality::Normal) | None => {}
        Some(quality) => {
            let label: &'static str = quality.into();
            name.push_str(" [");
            name.push_str(label);
            name.push(']');
        }
    }
    if item.data.is_ethereal() {
        name.push_str(" (Ethereal)");
    }
    name
}

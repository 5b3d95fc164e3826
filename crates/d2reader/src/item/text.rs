use encoding_rs::UTF_16LE;

use crate::error::{Error, Result};
use crate::layout::{StringTableAddresses, VersionLayout};
use crate::process::{AddressingMode, ReadMemory};
use crate::structs::offsets::strings;

const CHUNK_CHARS: usize = 32;

/// Localized string lookup through the game's three string segments
pub struct StringTable<'a, R: ReadMemory> {
    reader: &'a R,
    layout: &'a VersionLayout,
}

impl<'a, R: ReadMemory> StringTable<'a, R> {
    pub fn new(reader: &'a R, layout: &'a VersionLayout) -> Self {
        Self { reader, layout }
    }

    /// Segment serving `id` and the id's index inside it
    fn segment(&self, id: u16) -> (&StringTableAddresses, u16) {
        let addresses = &self.layout.addresses;
        if id >= strings::EXPANSION_BASE {
            (&addresses.expansion_strings, id - strings::EXPANSION_BASE)
        } else if id >= strings::PATCH_BASE {
            (&addresses.patch_strings, id - strings::PATCH_BASE)
        } else {
            (&addresses.strings, id)
        }
    }

    pub fn lookup(&self, id: u16) -> Result<String> {
        let (segment, index) = self.segment(id);

        let indexer = self
            .reader
            .read_address(self.reader.resolve(segment.indexer, AddressingMode::ModuleRelative))?
            .checked()
            .ok_or_else(|| Error::malformed(format!("string indexer for id {} is unset", id)))?;
        let slot = self.reader.read_u16(indexer.offset(u64::from(index) * 2))?;

        let table = self
            .reader
            .read_address(self.reader.resolve(segment.addresses, AddressingMode::ModuleRelative))?
            .checked()
            .ok_or_else(|| Error::malformed(format!("string table for id {} is unset", id)))?;
        let text = self.reader.read_address(table.offset(u64::from(slot) * 4))?;
        let text = text.checked().ok_or(Error::InvalidAddress(text.raw()))?;

        self.read_wide_string(text.as_u64())
    }

    /// Read a NUL-terminated UTF-16 string in chunks. A chunk that would run
    /// past the end of a mapping is retried one code unit at a time.
    fn read_wide_string(&self, address: u64) -> Result<String> {
        let mut units: Vec<u8> = Vec::new();
        while units.len() < strings::MAX_CHARS * 2 {
            let at = address + units.len() as u64;
            let chunk = match self.reader.read_bytes(at, CHUNK_CHARS * 2) {
                Ok(chunk) => chunk,
                Err(_) => self.reader.read_bytes(at, 2)?,
            };
            match chunk.chunks_exact(2).position(|pair| pair == [0, 0]) {
                Some(end) => {
                    units.extend_from_slice(&chunk[..end * 2]);
                    break;
                }
                None => units.extend_from_slice(&chunk),
            }
        }
        units.truncate(strings::MAX_CHARS * 2);

        let (text, _) = UTF_16LE.decode_without_bom_handling(&units);
        Ok(text.into_owned())
    }
}

/// Encode `text` the way the string segments store it
#[cfg(test)]
pub(crate) fn encode_wide(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

//! Quest status buffers
//!
//! Each difficulty has one status buffer made of 16-bit words, one word per
//! quest slot. Which words are real quests and which bits mean "finished" are
//! part of the version layout ([`QuestRules`]).

use tracing::debug;

use crate::error::Result;
use crate::layout::QuestRules;
use crate::process::{AddressingMode, ReadMemory, RemoteAddress};
use crate::structs::QuestArray;

/// Reinterpret raw bytes as little-endian 16-bit words.
///
/// An odd trailing byte becomes the low byte of a final word whose high byte
/// is zero.
pub fn decode_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match *pair {
            [lo, hi] => u16::from_le_bytes([lo, hi]),
            [lo] => u16::from(lo),
            _ => 0,
        })
        .collect()
}

/// Number of quests actually finished.
///
/// Only the completion flag counts; a word that merely carries the
/// acknowledged flag (log entry seen) is not a finished quest.
pub fn completed_count(words: &[u16], rules: &QuestRules) -> u32 {
    rules
        .quest_words
        .iter()
        .filter_map(|&index| words.get(index))
        .filter(|&&word| word & rules.completed_flag != 0)
        .count() as u32
}

/// Read one difficulty's quest buffer through its array header
pub fn read_quest_buffer<R: ReadMemory>(reader: &R, array: RemoteAddress) -> Result<Vec<u16>> {
    let header: QuestArray = reader.read_struct(array)?;
    let len = header.checked_len()?;
    if len == 0 {
        return Ok(Vec::new());
    }

    let buffer = header.buffer.checked().ok_or_else(|| {
        debug!("Quest array {} has invalid buffer {}", array, header.buffer);
        crate::Error::InvalidAddress(header.buffer.raw())
    })?;
    let bytes = reader.read_bytes(reader.resolve(buffer.as_u64(), AddressingMode::Absolute), len)?;
    Ok(decode_words(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::V1_14D;
    use crate::process::MockMemoryBuilder;

    #[test]
    fn test_decode_even_length() {
        assert_eq!(decode_words(&[0x01, 0x00, 0x34, 0x12]), vec![0x0001, 0x1234]);
    }

    #[test]
    fn test_decode_odd_length_zero_extends() {
        let bytes = [0x01, 0x10, 0xAB];
        let words = decode_words(&bytes);
        assert_eq!(words.len(), bytes.len().div_ceil(2));
        assert_eq!(words[1], 0x00AB);
        assert_eq!(words[1] >> 8, 0);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let bytes: Vec<u8> = (0u8..=96).collect();
        assert_eq!(decode_words(&bytes), decode_words(&bytes));
        assert!(decode_words(&[]).is_empty());
    }

    #[test]
    fn test_completed_count_ignores_acknowledged_only() {
        let rules = V1_14D.quests;
        let mut words = vec![0u16; 48];
        words[1] = rules.completed_flag | rules.acknowledged_flag;
        words[2] = rules.acknowledged_flag;
        words[9] = rules.completed_flag;
        // Not a quest slot (act intro)
        words[0] = rules.completed_flag;
        assert_eq!(completed_count(&words, &rules), 2);
    }

    #[test]
    fn test_completed_count_short_buffer() {
        let rules = V1_14D.quests;
        let words = vec![rules.completed_flag; 4];
        assert_eq!(completed_count(&words, &rules), 3);
        assert_eq!(completed_count(&[], &rules), 0);
    }

    #[test]
    fn test_read_quest_buffer() {
        let reader = MockMemoryBuilder::new()
            .u32(0x1000, 0x2000)
            .u32(0x1004, 3)
            .bytes(0x2000, &[0x01, 0x00, 0x07])
            .build();
        let words = read_quest_buffer(&reader, RemoteAddress::new(0x1000)).unwrap();
        assert_eq!(words, vec![0x0001, 0x0007]);
    }

    #[test]
    fn test_read_quest_buffer_corrupt_length() {
        let reader = MockMemoryBuilder::new()
            .u32(0x1000, 0x2000)
            .u32(0x1004, 0x7FFF_FFFF)
            .build();
        assert!(matches!(
            read_quest_buffer(&reader, RemoteAddress::new(0x1000)),
            Err(crate::Error::MalformedLayout(_))
        ));
    }
}

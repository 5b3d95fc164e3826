use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::{Character, Difficulty};
use crate::error::{Error, Result};
use crate::item::{BodyLocation, ItemRecord};
use crate::skills::SkillLevels;

/// Everything read during one in-game tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReadEvent {
    pub character: Character,
    /// Tooltip text per equipped slot; the first item found for a slot wins
    pub item_strings: BTreeMap<BodyLocation, String>,
    /// `None` when disabled or unreadable
    pub current_area: Option<u8>,
    pub current_difficulty: Difficulty,
    /// Class ids of every carried item and its socketed children
    pub item_ids: Vec<u32>,
    pub is_autosplit_character: bool,
    pub quest_buffers: BTreeMap<Difficulty, Vec<u16>>,
    pub inventory: Vec<ItemRecord>,
    pub skill_levels: SkillLevels,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReaderEvent {
    CharacterCreated(Character),
    DataRead(Box<DataReadEvent>),
}

/// Receiver of reader events.
///
/// Handlers run on the polling thread; a slow handler delays the next tick.
/// Returning [`Error::Cancelled`] stops the loop.
pub trait EventSink {
    fn on_character_created(&mut self, character: &Character) -> Result<()>;

    fn on_data_read(&mut self, event: &DataReadEvent) -> Result<()>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_character_created(&mut self, character: &Character) -> Result<()> {
        (**self).on_character_created(character)
    }

    fn on_data_read(&mut self, event: &DataReadEvent) -> Result<()> {
        (**self).on_data_read(event)
    }
}

/// Forwards events to a channel; a dropped receiver cancels the reader
impl EventSink for Sender<ReaderEvent> {
    fn on_character_created(&mut self, character: &Character) -> Result<()> {
        self.send(ReaderEvent::CharacterCreated(character.clone()))
            .map_err(|_| Error::Cancelled)
    }

    fn on_data_read(&mut self, event: &DataReadEvent) -> Result<()> {
        self.send(ReaderEvent::DataRead(Box::new(event.clone())))
            .map_err(|_| Error::Cancelled)
    }
}

/// Adapts a closure into an [`EventSink`]
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ReaderEvent) -> Result<()>,
{
    fn on_character_created(&mut self, character: &Character) -> Result<()> {
        (self.0)(ReaderEvent::CharacterCreated(character.clone()))
    }

    fn on_data_read(&mut self, event: &DataReadEvent) -> Result<()> {
        (self.0)(ReaderEvent::DataRead(Box::new(event.clone())))
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<ReaderEvent>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> impl Iterator<Item = &Character> {
        self.events.iter().filter_map(|event| match event {
            ReaderEvent::CharacterCreated(character) => Some(character),
            ReaderEvent::DataRead(_) => None,
        })
    }

    pub fn data_reads(&self) -> impl Iterator<Item = &DataReadEvent> {
        self.events.iter().filter_map(|event| match event {
            ReaderEvent::DataRead(data) => Some(data.as_ref()),
            ReaderEvent::CharacterCreated(_) => None,
        })
    }
}

impl EventSink for CollectSink {
    fn on_character_created(&mut self, character: &Character) -> Result<()> {
        self.events
            .push(ReaderEvent::CharacterCreated(character.clone()));
        Ok(())
    }

    fn on_data_read(&mut self, event: &DataReadEvent) -> Result<()> {
        self.events
            .push(ReaderEvent::DataRead(Box::new(event.clone())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_sink_cancels_when_receiver_dropped() {
        let (mut tx, rx) = mpsc::channel::<ReaderEvent>();
        let hero = Character::new("Hero");
        tx.on_character_created(&hero).unwrap();
        assert!(matches!(
            rx.recv().unwrap(),
            ReaderEvent::CharacterCreated(c) if c.name == "Hero"
        ));

        drop(rx);
        assert!(matches!(
            tx.on_character_created(&hero),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_fn_sink() {
        let mut names = Vec::new();
        let mut sink = FnSink(|event: ReaderEvent| -> Result<()> {
            if let ReaderEvent::CharacterCreated(c) = event {
                names.push(c.name);
            }
            Ok(())
        });
        sink.on_character_created(&Character::new("A")).unwrap();
        sink.on_character_created(&Character::new("B")).unwrap();
        drop(sink);
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = ReaderEvent::CharacterCreated(Character::new("Hero"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "character_created");
        assert_eq!(json["name"], "Hero");
    }
}

//! Continuous polling mode.

use std::io::{self, Write};

use anyhow::Result;
use d2reader::prelude::*;
use owo_colors::OwoColorize;
use tracing::info;

use crate::input;

/// Poll the game until Ctrl+C, Esc or q
pub fn run(config: ReaderConfig, json: bool) -> Result<()> {
    let control = ReaderControl::new();
    let interrupt = control.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        interrupt.stop(StopReason::Interrupted);
    })?;

    let version = config.game_version.clone();
    let mut reader = DataReader::new(SystemProcesses, config)?;
    let _keyboard_handle =
        input::spawn_keyboard_monitor(control.clone(), reader.layout_switch(), &version);
    if !json {
        println!("Waiting for Diablo II... (Esc/q quit, r read now, v next version)");
    }

    let result = if json {
        reader.run(&control, FnSink(print_json))
    } else {
        let mut last = String::new();
        reader.run(
            &control,
            FnSink(move |event: ReaderEvent| -> d2reader::Result<()> {
                print_summary(&event, &mut last);
                Ok(())
            }),
        )
    };

    match result {
        Ok(reason) => {
            info!("Stopped: {}", reason);
            Ok(())
        }
        Err(Error::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// One event per line; a closed pipe stops the reader
fn print_json(event: ReaderEvent) -> d2reader::Result<()> {
    let line = serde_json::to_string(&event)?;
    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", line) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(Error::Cancelled),
        other => Ok(other?),
    }
}

fn print_summary(event: &ReaderEvent, last: &mut String) {
    match event {
        ReaderEvent::CharacterCreated(character) => {
            println!(
                "{} {} ({})",
                "New character:".green().bold(),
                character.name.bold(),
                class_name(character)
            );
        }
        ReaderEvent::DataRead(data) => {
            let line = summary_line(data);
            // Most ticks repeat the previous state
            if line != *last {
                println!("{}", line);
                *last = line;
            }
        }
    }
}

fn class_name(character: &Character) -> &'static str {
    character.class.map(<&'static str>::from).unwrap_or("Unknown")
}

fn summary_line(data: &DataReadEvent) -> String {
    let character = &data.character;
    let stats = &character.stats;
    let area = data
        .current_area
        .map(|area| area.to_string())
        .unwrap_or_else(|| "-".to_string());
    let quests: u32 = character.completed_quests.iter().sum();
    let marker = if data.is_autosplit_character { "*" } else { " " };

    format!(
        "{}{} {} L{} {} | area {} | quests {} | deaths {} | res {}/{}/{}/{}",
        marker.yellow(),
        character.name.bold(),
        class_name(character).dimmed(),
        character.level,
        data.current_difficulty.cyan(),
        area,
        quests,
        character.deaths.red(),
        stats.fire_resist,
        stats.cold_resist,
        stats.lightning_resist,
        stats.poison_resist,
    )
}

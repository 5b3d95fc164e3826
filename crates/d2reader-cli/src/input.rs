//! Interactive keys for `watch`
//!
//! | key            | effect                                   |
//! |----------------|------------------------------------------|
//! | Esc, q, Ctrl+C | stop the reader                          |
//! | r              | read now instead of waiting the interval |
//! | v              | switch to the next supported version     |

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use d2reader::{LayoutSwitch, ReaderControl, StopReason, layout};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Quit,
    Refresh,
    NextVersion,
}

fn command_for(event: &KeyEvent) -> Option<KeyCommand> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match event.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyCommand::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyCommand::Quit)
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyCommand::Refresh),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(KeyCommand::NextVersion),
        _ => None,
    }
}

/// Supported version after `current`, wrapping around
fn next_version(current: &str) -> Option<&'static str> {
    let versions: Vec<_> = layout::supported_versions().collect();
    let index = versions
        .iter()
        .position(|v| v.eq_ignore_ascii_case(current.trim()))
        .map_or(0, |i| (i + 1) % versions.len());
    versions.get(index).copied()
}

/// Drives a running reader from the keyboard
struct KeyboardControl {
    control: ReaderControl,
    switch: LayoutSwitch,
    version: String,
}

impl KeyboardControl {
    fn apply(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::Quit => self.control.stop(StopReason::UserQuit),
            KeyCommand::Refresh => self.control.poll_now(),
            KeyCommand::NextVersion => {
                let Some(next) = next_version(&self.version) else {
                    return;
                };
                match self.switch.request(next) {
                    Ok(()) => {
                        info!("Switching to game version {}", next);
                        self.version = next.to_string();
                        self.control.poll_now();
                    }
                    Err(e) => warn!("Version switch failed: {}", e),
                }
            }
        }
    }
}

/// Spawn the key listener. It exits once `control` has a stop reason, from
/// a key press or from anywhere else.
pub fn spawn_keyboard_monitor(
    control: ReaderControl,
    switch: LayoutSwitch,
    version: &str,
) -> JoinHandle<()> {
    let mut keys = KeyboardControl {
        control,
        switch,
        version: version.to_string(),
    };

    thread::spawn(move || {
        debug!("Keyboard monitor started");
        while keys.control.stop_reason().is_none() {
            if !event::poll(Duration::from_millis(100)).unwrap_or(false) {
                continue;
            }
            if let Ok(Event::Key(key_event)) = event::read()
                && let Some(command) = command_for(&key_event)
            {
                debug!("Key {:?} -> {:?}", key_event.code, command);
                keys.apply(command);
            }
        }
        debug!("Keyboard monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_commands() {
        assert_eq!(command_for(&key(KeyCode::Esc, KeyModifiers::NONE)), Some(KeyCommand::Quit));
        assert_eq!(
            command_for(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyCommand::Quit)
        );
        assert_eq!(
            command_for(&key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(KeyCommand::Refresh)
        );
        assert_eq!(
            command_for(&key(KeyCode::Char('V'), KeyModifiers::SHIFT)),
            Some(KeyCommand::NextVersion)
        );
        assert_eq!(command_for(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(command_for(&key(KeyCode::Enter, KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_next_version_wraps() {
        assert_eq!(next_version("1.14b"), Some("1.14c"));
        assert_eq!(next_version("1.14D"), Some("1.14b"));
        assert_eq!(next_version("unknown"), Some("1.14b"));
    }

    #[test]
    fn test_quit_key_stops_reader() {
        let control = ReaderControl::new();
        let mut keys = KeyboardControl {
            control: control.clone(),
            switch: LayoutSwitch::default(),
            version: "1.14d".to_string(),
        };

        keys.apply(KeyCommand::NextVersion);
        assert_eq!(keys.version, "1.14b");
        assert_eq!(control.stop_reason(), None);

        keys.apply(KeyCommand::Quit);
        assert_eq!(control.stop_reason(), Some(StopReason::UserQuit));
    }
}

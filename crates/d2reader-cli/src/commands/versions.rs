use d2reader::{ReaderConfig, layout};
use owo_colors::OwoColorize;

/// List the game versions with a known layout
pub fn run(config: &ReaderConfig) {
    for version in layout::supported_versions() {
        if version.eq_ignore_ascii_case(config.game_version.trim()) {
            println!("{} {}", version.green().bold(), "(configured)".dimmed());
        } else {
            println!("{}", version);
        }
    }
}

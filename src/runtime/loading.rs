use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::info;

use crate::config::Settings;
use crate::library::{MetadataLoader, Track};
use crate::ui;

use super::Tui;

/// Read metadata for every locator while showing progress.
///
/// Returns `None` if the user quits before the library is ready.
pub fn load_library(
    terminal: &mut Tui,
    settings: &Settings,
    locators: Vec<String>,
) -> Result<Option<Vec<Track>>, Box<dyn std::error::Error>> {
    let mut loader = MetadataLoader::spawn(locators, settings.library.clone());
    let tick = Duration::from_millis(settings.audio.tick_ms);

    loop {
        loader.poll();
        if let Some(tracks) = loader.take_tracks() {
            info!(count = tracks.len(), "library loaded");
            return Ok(Some(tracks));
        }

        let (loaded, total) = loader.progress();
        terminal.draw(|f| ui::draw_loading(f, settings, loaded, total))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    info!(loaded, total, "quit while loading library");
                    return Ok(None);
                }
            }
        }
    }
}

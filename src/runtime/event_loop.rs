use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{MediaBackend, PlaybackEngine};
use crate::config;
use crate::transport::{ControlCmd, TransportBridge};
use crate::ui::{self, View};

use super::Tui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: applies media events, keeps the media controls
/// in sync, draws, then handles external commands and keys. Returns `Ok(())`
/// when shutdown is requested.
pub fn run<B: MediaBackend>(
    terminal: &mut Tui,
    settings: &config::Settings,
    app: &mut App,
    engine: &mut PlaybackEngine<B>,
    bridge: &mut TransportBridge,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.audio.tick_ms);
    let mut state = EventLoopState::default();

    loop {
        engine.pump();
        bridge.sync(engine);
        app.follow(engine.session().current_index);

        let view = View {
            tracks: engine.tracks(),
            session: engine.session(),
            media_controls: bridge.is_active(),
        };
        terminal.draw(|f| ui::draw(f, app, &view, settings))?;

        // Media keys and the `p`/`h`/`l` keys all arrive here.
        while let Ok(cmd) = control_rx.try_recv() {
            if bridge.dispatch(cmd, engine) {
                info!("quit requested by media controls");
                return Ok(());
            }
            app.follow_playback_on();
        }

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, engine, control_tx, &mut state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `true` when the user asked to quit.
fn handle_key_event<B: MediaBackend>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    engine: &mut PlaybackEngine<B>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => {
            if app.has_tracks() {
                let is_playing_selected = engine.session().playing()
                    && engine.session().current_index == Some(app.selected);
                app.follow_playback_on();
                if !is_playing_selected {
                    if let Err(e) = engine.load_and_play(app.selected) {
                        warn!(error = %e, "could not start selected track");
                    }
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            // Behave like MPRIS PlayPause.
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Previous);
        }
        KeyCode::Char('L') => seek_by(engine, settings.audio.seek_step),
        KeyCode::Char('H') => seek_by(engine, -settings.audio.seek_step),
        KeyCode::Char(c @ '0'..='9') => {
            let tenths = f64::from(c as u8 - b'0');
            if let Err(e) = engine.seek_to(tenths / 10.0) {
                warn!(error = %e, "seek failed");
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = engine.session().volume + settings.audio.volume_step;
            engine.set_volume(v);
        }
        KeyCode::Char('-') => {
            let v = engine.session().volume - settings.audio.volume_step;
            engine.set_volume(v);
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}

fn seek_by<B: MediaBackend>(engine: &mut PlaybackEngine<B>, delta: f64) {
    if let Err(e) = engine.seek_by_fraction(delta) {
        warn!(error = %e, "seek failed");
    }
}

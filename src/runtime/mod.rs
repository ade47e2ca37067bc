use std::io::Stdout;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{PlaybackEngine, RodioBackend};
use crate::library::resolve_locators;
use crate::transport::{ControlCmd, TransportBridge};

mod event_loop;
mod loading;
mod logging;
mod settings;

pub(crate) type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();
    let log_path = logging::init(&settings.logging);
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }
    info!(log = ?log_path, "reprise starting");

    let locators = resolve_locators(&settings.library);
    // Open the device before taking over the terminal so the error stays readable.
    let backend = RodioBackend::open()?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let Some(tracks) = loading::load_library(&mut terminal, &settings, locators)? else {
            return Ok(());
        };

        let mut engine = PlaybackEngine::new(backend, tracks, settings.audio.initial_volume);
        let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
        let mut bridge = TransportBridge::probe(&settings.transport, control_tx.clone());
        let mut app = App::new(engine.tracks().len(), settings.ui.follow_playback);

        let result = event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut engine,
            &mut bridge,
            &control_tx,
            &control_rx,
        );

        engine.shutdown();
        bridge.sync(&engine);
        result
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("reprise exiting");
    run_result
}

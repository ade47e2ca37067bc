use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/reprise/config.toml` or `~/.config/reprise/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `REPRISE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub audio: AudioSettings,
    pub transport: TransportSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Explicit, ordered list of audio locators (paths or `file://` URIs).
    ///
    /// When empty, `root` is scanned instead.
    pub files: Vec<String>,
    /// Directory scanned for audio files when `files` is empty.
    pub root: PathBuf,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Artist shown when a file carries no artist tag (or fails to decode).
    pub unknown_artist: String,
    /// Album shown when a file carries no album tag (or fails to decode).
    pub unknown_album: String,
    /// Embedded pictures larger than this are skipped.
    pub max_artwork_bytes: usize,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            root: PathBuf::from("Music"),
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            unknown_artist: "Unknown Artist".to_string(),
            unknown_album: "Unknown Album".to_string(),
            max_artwork_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Volume applied to the first track, in `[0, 1]`.
    pub initial_volume: f32,
    /// Volume change per `+`/`-` key press.
    pub volume_step: f32,
    /// Relative seek per `H`/`L` key press, as a fraction of the track length.
    pub seek_step: f64,
    /// Event loop poll interval (milliseconds).
    pub tick_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            volume_step: 0.05,
            seek_step: 0.05,
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Set to false to never register with the desktop media controls.
    pub enabled: bool,
    /// Well-known D-Bus name requested on the session bus.
    pub bus_name: String,
    /// `Identity` reported to MPRIS clients.
    pub identity: String,
    /// How long to wait for the session bus before giving up (milliseconds).
    pub probe_timeout_ms: u64,
    /// Minimum position drift before a new position snapshot is published (milliseconds).
    pub position_threshold_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bus_name: "org.mpris.MediaPlayer2.reprise".to_string(),
            identity: "reprise".to_string(),
            probe_timeout_ms: 1000,
            position_threshold_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Whether the cursor jumps to the playing track whenever it changes.
    pub follow_playback: bool,
    /// Separator between elapsed and total time in the playback bar.
    pub time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ Your Playlist ~ ".to_string(),
            follow_playback: true,
            time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/reprise/reprise.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

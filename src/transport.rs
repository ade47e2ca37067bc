//! Two-way bridge between the playback engine and the desktop's media
//! controls.
//!
//! Outbound, [`TransportBridge::sync`] diffs the engine state against what
//! was last published and pushes only the changes. Inbound, surfaces send
//! [`ControlCmd`]s down a channel that the event loop hands to
//! [`TransportBridge::dispatch`], so commands always reach the engine's
//! current resource.

use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::{MediaBackend, PlaybackEngine, TransportState};
use crate::config::TransportSettings;
use crate::library::{Artwork, Track};

/// Commands an external surface can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Next,
    Previous,
    Play,
    Pause,
    PlayPause,
    Stop,
    Quit,
}

/// Coarse play state as media controls understand it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
    }
}

impl From<TransportState> for PlaybackStatus {
    fn from(state: TransportState) -> Self {
        match state {
            TransportState::Idle => PlaybackStatus::Stopped,
            TransportState::Playing => PlaybackStatus::Playing,
            // Not playing until the resource says so.
            TransportState::Loading | TransportState::Paused => PlaybackStatus::Paused,
        }
    }
}

/// Metadata of the current track, as published to a surface.
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub locator: String,
    pub artwork: Option<Artwork>,
    /// Tag-reported length, if any.
    pub length: Option<Duration>,
}

impl NowPlaying {
    pub fn from_track(index: usize, track: &Track) -> Self {
        Self {
            index,
            title: track.name.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            locator: track.locator.clone(),
            artwork: track.artwork.clone(),
            length: Some(track.duration).filter(|d| !d.is_zero()),
        }
    }
}

/// Playback speed reported alongside every position snapshot.
pub const PLAYBACK_RATE: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionSnapshot {
    pub duration: Duration,
    pub rate: f64,
    pub position: Duration,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("transport surface unavailable: {0}")]
    Unavailable(String),

    #[error("transport surface rejected update: {0}")]
    Rejected(String),

    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),
}

/// Something that displays now-playing information.
pub trait TransportSurface {
    /// `None` clears the display.
    fn publish_metadata(&mut self, now: Option<&NowPlaying>) -> Result<(), SurfaceError>;
    fn publish_position(&mut self, snapshot: PositionSnapshot) -> Result<(), SurfaceError>;
    fn publish_playback(&mut self, status: PlaybackStatus) -> Result<(), SurfaceError>;
}

/// Accepts and discards everything. Used when no surface is present.
pub struct NullSurface;

impl TransportSurface for NullSurface {
    fn publish_metadata(&mut self, _now: Option<&NowPlaying>) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn publish_position(&mut self, _snapshot: PositionSnapshot) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn publish_playback(&mut self, _status: PlaybackStatus) -> Result<(), SurfaceError> {
        Ok(())
    }
}

#[derive(Default)]
struct LastPublished {
    /// Outer `None`: nothing published yet.
    index: Option<Option<usize>>,
    status: Option<PlaybackStatus>,
    snapshot: Option<PositionSnapshot>,
}

pub struct TransportBridge {
    surface: Box<dyn TransportSurface>,
    active: bool,
    position_threshold: Duration,
    last: LastPublished,
}

impl TransportBridge {
    /// A bridge that never publishes anything.
    pub fn disabled() -> Self {
        Self {
            surface: Box::new(NullSurface),
            active: false,
            position_threshold: Duration::ZERO,
            last: LastPublished::default(),
        }
    }

    pub fn new(surface: Box<dyn TransportSurface>, position_threshold: Duration) -> Self {
        Self {
            surface,
            active: true,
            position_threshold,
            last: LastPublished::default(),
        }
    }

    /// Look for the desktop media controls once. Their absence is not an
    /// error: the returned bridge is simply disabled.
    pub fn probe(settings: &TransportSettings, tx: Sender<ControlCmd>) -> Self {
        if !settings.enabled {
            info!("media controls disabled in config");
            return Self::disabled();
        }
        match crate::mpris::spawn_mpris(settings, tx) {
            Ok(surface) => {
                info!(bus_name = %settings.bus_name, "registered with media controls");
                Self::new(
                    Box::new(surface),
                    Duration::from_millis(settings.position_threshold_ms),
                )
            }
            Err(e) => {
                info!(error = %e, "media controls unavailable, continuing without them");
                Self::disabled()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Publish whatever changed since the last call. Surface failures are
    /// logged and otherwise ignored.
    pub fn sync<B: MediaBackend>(&mut self, engine: &PlaybackEngine<B>) {
        if !self.active {
            return;
        }
        let session = engine.session();

        if self.last.index != Some(session.current_index) {
            let now = session
                .current_index
                .zip(engine.current_track())
                .map(|(index, track)| NowPlaying::from_track(index, track));
            self.last.index = Some(session.current_index);
            self.last.snapshot = None;
            if let Err(e) = self.surface.publish_metadata(now.as_ref()) {
                warn!(error = %e, "failed to publish track metadata");
            }
        }

        let status = PlaybackStatus::from(session.state);
        let status_changed = self.last.status != Some(status);
        if status_changed {
            self.last.status = Some(status);
            if let Err(e) = self.surface.publish_playback(status) {
                warn!(error = %e, "failed to publish playback status");
            }
        }

        let Some(duration) = session.duration else {
            return;
        };
        let snapshot = PositionSnapshot {
            duration,
            rate: PLAYBACK_RATE,
            position: session.position,
        };
        if status_changed || self.snapshot_is_stale(&snapshot) {
            // Recorded even when rejected, so a bad snapshot is not retried every tick.
            self.last.snapshot = Some(snapshot);
            if let Err(e) = self.surface.publish_position(snapshot) {
                debug!(error = %e, ?snapshot, "position snapshot rejected");
            }
        }
    }

    fn snapshot_is_stale(&self, next: &PositionSnapshot) -> bool {
        match &self.last.snapshot {
            None => true,
            Some(last) => {
                last.duration != next.duration
                    || last.rate != next.rate
                    || last.position.abs_diff(next.position) >= self.position_threshold
            }
        }
    }

    /// Apply an inbound command. Returns `true` when the session should end.
    pub fn dispatch<B: MediaBackend>(
        &self,
        cmd: ControlCmd,
        engine: &mut PlaybackEngine<B>,
    ) -> bool {
        debug!(?cmd, "external transport command");
        let result = match cmd {
            ControlCmd::Next => engine.next_track(),
            ControlCmd::Previous => engine.previous_track(),
            ControlCmd::Play => engine.resume(),
            ControlCmd::Pause | ControlCmd::Stop => {
                engine.suspend();
                Ok(())
            }
            ControlCmd::PlayPause => engine.toggle_play_pause(),
            ControlCmd::Quit => return true,
        };
        if let Err(e) = result {
            warn!(error = %e, ?cmd, "external command failed");
        }
        false
    }
}

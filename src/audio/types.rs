//! Audio-related small types and handles.
//!
//! This module defines the session state owned by the engine, the events a
//! bound media resource raises, and the playback error type.

use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;

/// Identifies one binding of a media resource. Bumped on every track switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// Output actually started (or resumed).
    Playing,
    /// Output actually stopped advancing.
    Paused,
    /// Current read position.
    TimeUpdate(Duration),
    /// Total length became known (or changed).
    DurationKnown(Duration),
    /// Reached the end of the stream.
    Ended,
    /// Decoding or output failed after the resource was bound.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: Generation,
    pub kind: MediaEventKind,
}

/// Handed to a resource at bind time; every event it raises carries the binding's generation.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: Sender<MediaEvent>,
}

impl EventSink {
    pub fn new(generation: Generation, tx: Sender<MediaEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn emit(&self, kind: MediaEventKind) {
        // The engine owns the receiver; if it is gone, so is anyone who cares.
        let _ = self.tx.send(MediaEvent {
            generation: self.generation,
            kind,
        });
    }
}

/// Coarse transport state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Nothing selected.
    #[default]
    Idle,
    /// Resource bound and playback requested, not yet confirmed.
    Loading,
    Playing,
    Paused,
}

/// Runtime playback information shared with the UI and the transport bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// Currently selected track index in the library (if any).
    pub current_index: Option<usize>,
    pub state: TransportState,
    /// Last reported read position of the bound resource.
    pub position: Duration,
    /// `None` until the bound resource reports a length.
    pub duration: Option<Duration>,
    /// Output volume in `[0, 1]`.
    pub volume: f32,
    /// Why the last start attempt (or the bound resource) failed, if it did.
    pub last_error: Option<String>,
}

impl PlaybackSession {
    pub fn new(volume: f32) -> Self {
        Self {
            current_index: None,
            state: TransportState::Idle,
            position: Duration::ZERO,
            duration: None,
            volume: clamp_volume(volume).unwrap_or(1.0),
            last_error: None,
        }
    }

    /// Whether playback is confirmed to be running.
    pub fn playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Progress through the current track in `[0, 1]`, or `None` while the length is unknown.
    pub fn progress(&self) -> Option<f64> {
        let total = self.duration.filter(|d| !d.is_zero())?;
        Some((self.position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Clamp into `[0, 1]`; `None` for NaN.
pub(crate) fn clamp_volume(v: f32) -> Option<f32> {
    if v.is_nan() { None } else { Some(v.clamp(0.0, 1.0)) }
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("track index {index} out of range (library has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no audio output device: {0}")]
    NoOutputDevice(String),

    #[error("failed to open {locator}: {source}")]
    Open {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {locator}: {reason}")]
    Decode { locator: String, reason: String },

    #[error("playback start rejected: {0}")]
    StartRejected(String),

    #[error("seek failed: {0}")]
    Seek(String),
}

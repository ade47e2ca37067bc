//! In-memory media backend for tests.
//!
//! Every binding is recorded together with its `EventSink`, so tests can
//! raise events on behalf of any resource, including abandoned ones.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use crate::library::Track;

use super::resource::{MediaBackend, MediaResource};
use super::types::{EventSink, MediaEventKind, PlaybackError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play(String),
    Pause(String),
    Seek(String, Duration),
    Volume(String, f32),
    Stop(String),
}

#[derive(Default)]
pub struct MockLog {
    pub binds: Vec<(String, EventSink)>,
    pub calls: Vec<Call>,
}

pub type SharedLog = Rc<RefCell<MockLog>>;

pub struct MockBackend {
    pub log: SharedLog,
    /// Locators whose bind fails (unreadable file).
    pub unbindable: HashSet<String>,
    /// Locators whose `play` request is refused.
    pub refuse_play: HashSet<String>,
    /// Confirm play/pause/seek immediately, like the rodio resource does.
    pub auto_confirm: bool,
}

impl MockBackend {
    pub fn new(auto_confirm: bool) -> (Self, SharedLog) {
        let log = SharedLog::default();
        (
            Self {
                log: log.clone(),
                unbindable: HashSet::new(),
                refuse_play: HashSet::new(),
                auto_confirm,
            },
            log,
        )
    }
}

impl MediaBackend for MockBackend {
    type Resource = MockResource;

    fn bind(&mut self, track: &Track, events: EventSink) -> Result<MockResource, PlaybackError> {
        if self.unbindable.contains(&track.locator) {
            return Err(PlaybackError::Decode {
                locator: track.locator.clone(),
                reason: "unsupported codec".to_string(),
            });
        }
        self.log
            .borrow_mut()
            .binds
            .push((track.locator.clone(), events.clone()));
        Ok(MockResource {
            locator: track.locator.clone(),
            events,
            log: self.log.clone(),
            refuse_play: self.refuse_play.contains(&track.locator),
            auto_confirm: self.auto_confirm,
        })
    }
}

pub struct MockResource {
    locator: String,
    events: EventSink,
    log: SharedLog,
    refuse_play: bool,
    auto_confirm: bool,
}

impl MediaResource for MockResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Play(self.locator.clone()));
        if self.refuse_play {
            return Err(PlaybackError::StartRejected("autoplay blocked".to_string()));
        }
        if self.auto_confirm {
            self.events.emit(MediaEventKind::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Pause(self.locator.clone()));
        if self.auto_confirm {
            self.events.emit(MediaEventKind::Paused);
        }
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Seek(self.locator.clone(), position));
        if self.auto_confirm {
            self.events.emit(MediaEventKind::TimeUpdate(position));
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Volume(self.locator.clone(), volume));
    }

    fn stop(&mut self) {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Stop(self.locator.clone()));
    }
}

pub fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            name: format!("Song {i}"),
            artist: format!("Artist {i}"),
            album: "Album".to_string(),
            locator: format!("/Music/song-{i}.mp3"),
            artwork: None,
            duration: Duration::from_secs(180),
        })
        .collect()
}

/// Raise `kind` on the `n`th binding ever made.
pub fn emit_on(log: &SharedLog, n: usize, kind: MediaEventKind) {
    let sink = log.borrow().binds[n].1.clone();
    sink.emit(kind);
}

/// Raise `kind` on the most recent binding.
pub fn emit_latest(log: &SharedLog, kind: MediaEventKind) {
    let n = log.borrow().binds.len() - 1;
    emit_on(log, n, kind);
}

//! The playback engine: sole owner of the bound media resource and of the
//! session state derived from it.
//!
//! Commands (`load_and_play`, `toggle_play_pause`, ...) only *request* things
//! from the resource. `playing`, `position` and `duration` change exclusively
//! in [`PlaybackEngine::pump`], when the resource's own events are applied.
//! Each binding gets a fresh [`Generation`]; events carrying any other
//! generation come from an abandoned resource and are dropped.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::library::Track;

use super::resource::{MediaBackend, MediaResource};
use super::types::{
    EventSink, Generation, MediaEvent, MediaEventKind, PlaybackError, PlaybackSession,
    TransportState, clamp_volume,
};

pub struct PlaybackEngine<B: MediaBackend> {
    backend: B,
    tracks: Vec<Track>,
    session: PlaybackSession,
    resource: Option<B::Resource>,
    generation: Generation,
    events_tx: Sender<MediaEvent>,
    events_rx: Receiver<MediaEvent>,
}

impl<B: MediaBackend> PlaybackEngine<B> {
    pub fn new(backend: B, tracks: Vec<Track>, volume: f32) -> Self {
        let (events_tx, events_rx) = mpsc::channel::<MediaEvent>();
        Self {
            backend,
            tracks,
            session: PlaybackSession::new(volume),
            resource: None,
            generation: Generation::default(),
            events_tx,
            events_rx,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.current_index.and_then(|i| self.tracks.get(i))
    }

    /// Generation of the currently bound resource.
    #[cfg(test)]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Switch to `index` and ask the new resource to start.
    ///
    /// A start failure leaves the track selected but paused, with the reason
    /// in `last_error`; the error is also returned for the caller to log.
    pub fn load_and_play(&mut self, index: usize) -> Result<(), PlaybackError> {
        let len = self.tracks.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        self.detach();
        self.generation = self.generation.next();
        self.session.current_index = Some(index);
        self.session.state = TransportState::Loading;
        self.session.position = Default::default();
        self.session.duration = None;
        self.session.last_error = None;

        info!(index, name = %self.tracks[index].name, "loading track");

        let events = EventSink::new(self.generation, self.events_tx.clone());
        let mut resource = match self.backend.bind(&self.tracks[index], events) {
            Ok(r) => r,
            Err(e) => return Err(self.record_start_failure(e)),
        };
        resource.set_volume(self.session.volume);
        let started = resource.play();
        self.resource = Some(resource);
        started.map_err(|e| self.record_start_failure(e))
    }

    /// Pause when playing, otherwise resume. No-op with nothing selected.
    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        if self.session.current_index.is_none() {
            return Ok(());
        }
        if self.session.playing() {
            self.suspend();
            Ok(())
        } else {
            self.resume()
        }
    }

    /// Ask the bound resource to play. Re-binds the selected track if its
    /// previous start attempt never produced a resource.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let Some(index) = self.session.current_index else {
            return Ok(());
        };
        match self.resource.as_mut() {
            Some(resource) => {
                let started = resource.play();
                started.map_err(|e| self.record_start_failure(e))
            }
            None => self.load_and_play(index),
        }
    }

    /// Ask the bound resource to pause.
    pub fn suspend(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.pause();
        }
    }

    pub fn next_track(&mut self) -> Result<(), PlaybackError> {
        let Some(current) = self.session.current_index else {
            return Ok(());
        };
        let len = self.tracks.len();
        if len == 0 {
            return Ok(());
        }
        self.load_and_play((current + 1) % len)
    }

    pub fn previous_track(&mut self) -> Result<(), PlaybackError> {
        let Some(current) = self.session.current_index else {
            return Ok(());
        };
        let len = self.tracks.len();
        if len == 0 {
            return Ok(());
        }
        self.load_and_play((current + len - 1) % len)
    }

    /// Seek to `fraction` of the track length. Out-of-range fractions are
    /// clamped to `[0, 1]`; NaN, an unbound resource or an unknown length make
    /// this a no-op.
    pub fn seek_to(&mut self, fraction: f64) -> Result<(), PlaybackError> {
        if fraction.is_nan() {
            return Ok(());
        }
        let Some(total) = self.session.duration.filter(|d| !d.is_zero()) else {
            return Ok(());
        };
        let Some(resource) = self.resource.as_mut() else {
            return Ok(());
        };
        resource.seek(total.mul_f64(fraction.clamp(0.0, 1.0)))
    }

    /// Seek relative to the current position, by `delta` of the track length.
    pub fn seek_by_fraction(&mut self, delta: f64) -> Result<(), PlaybackError> {
        match self.session.progress() {
            Some(current) => self.seek_to(current + delta),
            None => Ok(()),
        }
    }

    /// Clamp to `[0, 1]` and apply. NaN is ignored.
    pub fn set_volume(&mut self, fraction: f32) {
        let Some(volume) = clamp_volume(fraction) else {
            return;
        };
        self.session.volume = volume;
        if let Some(resource) = self.resource.as_mut() {
            resource.set_volume(volume);
        }
    }

    /// Poll the bound resource and apply every pending event.
    ///
    /// Returns how many events changed the session.
    pub fn pump(&mut self) -> usize {
        if let Some(resource) = self.resource.as_mut() {
            resource.poll();
        }

        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_event(&mut self, event: MediaEvent) -> bool {
        if event.generation != self.generation || self.resource.is_none() {
            debug!(?event, current = ?self.generation, "dropping stale media event");
            return false;
        }

        match event.kind {
            MediaEventKind::Playing => {
                self.session.state = TransportState::Playing;
                self.session.last_error = None;
            }
            MediaEventKind::Paused => {
                self.session.state = TransportState::Paused;
            }
            MediaEventKind::TimeUpdate(position) => {
                self.session.position = match self.session.duration {
                    Some(total) => position.min(total),
                    None => position,
                };
            }
            MediaEventKind::DurationKnown(total) => {
                self.session.duration = Some(total);
                self.session.position = self.session.position.min(total);
            }
            MediaEventKind::Ended => {
                debug!(index = ?self.session.current_index, "track ended, advancing");
                if let Err(e) = self.next_track() {
                    warn!(error = %e, "auto-advance failed");
                }
            }
            MediaEventKind::Failed(reason) => {
                warn!(%reason, "media resource failed");
                self.session.state = TransportState::Paused;
                self.session.last_error = Some(reason);
            }
        }
        true
    }

    fn record_start_failure(&mut self, e: PlaybackError) -> PlaybackError {
        warn!(error = %e, index = ?self.session.current_index, "playback start failed");
        self.session.state = TransportState::Paused;
        self.session.last_error = Some(e.to_string());
        e
    }

    /// Stop and drop the bound resource. Its queued events become stale once
    /// the generation moves on.
    fn detach(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.stop();
        }
    }

    /// Tear down the session: stop output and forget the selection.
    pub fn shutdown(&mut self) {
        self.detach();
        self.generation = self.generation.next();
        self.session.current_index = None;
        self.session.state = TransportState::Idle;
        self.session.position = Default::default();
        self.session.duration = None;
        info!("playback engine shut down");
    }
}

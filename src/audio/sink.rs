//! `rodio`-backed media resources.
//!
//! A `rodio::Sink` has no event stream of its own, so the resource raises
//! `Playing`/`Paused` when the corresponding command has been applied to the
//! sink and derives `TimeUpdate`/`Ended` from polling it.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::library::{Track, locator_path};

use super::resource::{MediaBackend, MediaResource};
use super::types::{EventSink, MediaEventKind, PlaybackError};

/// Owns the output stream; every bound sink mixes into it.
pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    /// Open the default output device.
    pub fn open() -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl MediaBackend for RodioBackend {
    type Resource = RodioResource;

    fn bind(&mut self, track: &Track, events: EventSink) -> Result<RodioResource, PlaybackError> {
        let file = File::open(locator_path(&track.locator)).map_err(|source| {
            PlaybackError::Open {
                locator: track.locator.clone(),
                source,
            }
        })?;

        let source = Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
            locator: track.locator.clone(),
            reason: e.to_string(),
        })?;

        // Trust the decoder first; the tag-derived length is only a fallback.
        let duration = source
            .total_duration()
            .or_else(|| Some(track.duration).filter(|d| !d.is_zero()));

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();

        if let Some(d) = duration {
            events.emit(MediaEventKind::DurationKnown(d));
        }

        debug!(locator = %track.locator, generation = ?events.generation(), "bound sink");
        Ok(RodioResource {
            sink,
            events,
            last_pos: None,
            ended: false,
        })
    }
}

pub struct RodioResource {
    sink: Sink,
    events: EventSink,
    last_pos: Option<Duration>,
    ended: bool,
}

impl MediaResource for RodioResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.ended {
            return Err(PlaybackError::StartRejected(
                "stream already reached its end".to_string(),
            ));
        }
        self.sink.play();
        self.events.emit(MediaEventKind::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.events.emit(MediaEventKind::Paused);
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))?;
        // Force a fresh TimeUpdate on the next poll.
        self.last_pos = None;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn poll(&mut self) {
        if self.ended {
            return;
        }
        if self.sink.empty() {
            self.ended = true;
            self.events.emit(MediaEventKind::Ended);
            return;
        }
        let pos = self.sink.get_pos();
        if self.last_pos != Some(pos) {
            self.last_pos = Some(pos);
            self.events.emit(MediaEventKind::TimeUpdate(pos));
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

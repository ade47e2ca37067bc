//! Turns locators into `Track`s, one at a time, on a background thread.
//!
//! A locator that cannot be fetched or decoded still yields a track (named
//! after its file, with placeholder artist/album and zero duration), so the
//! output is always one-to-one with the input and in the same order.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::LibrarySettings;

use super::decode::{LoftyDecoder, MetadataDecoder, RawMetadata};
use super::model::{Artwork, Track, name_from_locator};
use super::source::{ByteSource, FsSource};

const DEFAULT_ARTWORK_MIME: &str = "image/jpeg";

/// Build the track for a single locator, falling back to placeholders on any failure.
pub fn load_track(
    locator: &str,
    source: &dyn ByteSource,
    decoder: &dyn MetadataDecoder,
    settings: &LibrarySettings,
) -> Track {
    let decoded = source
        .fetch(locator)
        .and_then(|bytes| decoder.decode(&bytes));

    match decoded {
        Ok(meta) => track_from_metadata(locator, meta, settings),
        Err(e) => {
            warn!(%locator, error = %e, "failed to load metadata, using fallback");
            fallback_track(locator, settings)
        }
    }
}

fn track_from_metadata(locator: &str, meta: RawMetadata, settings: &LibrarySettings) -> Track {
    let artwork = meta.picture.and_then(|p| {
        if p.data.is_empty() {
            return None;
        }
        if p.data.len() > settings.max_artwork_bytes {
            warn!(
                %locator,
                size = p.data.len(),
                max = settings.max_artwork_bytes,
                "embedded artwork too large, skipping"
            );
            return None;
        }
        let mime = p
            .mime_type
            .unwrap_or_else(|| DEFAULT_ARTWORK_MIME.to_string());
        Some(Artwork::new(p.data, mime))
    });

    Track {
        name: meta.title.unwrap_or_else(|| name_from_locator(locator)),
        artist: meta
            .artist
            .unwrap_or_else(|| settings.unknown_artist.clone()),
        album: meta.album.unwrap_or_else(|| settings.unknown_album.clone()),
        locator: locator.to_string(),
        artwork,
        duration: meta.duration.unwrap_or_default(),
    }
}

fn fallback_track(locator: &str, settings: &LibrarySettings) -> Track {
    Track {
        name: name_from_locator(locator),
        artist: settings.unknown_artist.clone(),
        album: settings.unknown_album.clone(),
        locator: locator.to_string(),
        artwork: None,
        duration: Default::default(),
    }
}

enum LoadEvent {
    Loaded(usize, Track),
    Finished,
}

/// Loads a batch of locators on a worker thread and collects the results in order.
///
/// Call [`MetadataLoader::poll`] from the UI loop; the list becomes available
/// through [`MetadataLoader::take_tracks`] once every locator has resolved.
pub struct MetadataLoader {
    rx: Receiver<LoadEvent>,
    locators: Vec<String>,
    settings: LibrarySettings,
    slots: Vec<Option<Track>>,
    loaded: usize,
    finished: bool,
    join: Option<JoinHandle<()>>,
}

impl MetadataLoader {
    /// Start loading from the filesystem with the `lofty` decoder.
    pub fn spawn(locators: Vec<String>, settings: LibrarySettings) -> Self {
        Self::spawn_with(locators, FsSource, LoftyDecoder, settings)
    }

    pub fn spawn_with<S, D>(
        locators: Vec<String>,
        source: S,
        decoder: D,
        settings: LibrarySettings,
    ) -> Self
    where
        S: ByteSource + Send + 'static,
        D: MetadataDecoder + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<LoadEvent>();
        let total = locators.len();
        info!(total, "loading music library");

        let worker_locators = locators.clone();
        let worker_settings = settings.clone();
        let join = thread::spawn(move || {
            let (locators, settings) = (worker_locators, worker_settings);
            for (i, locator) in locators.iter().enumerate() {
                let track = load_track(locator, &source, &decoder, &settings);
                if tx.send(LoadEvent::Loaded(i, track)).is_err() {
                    debug!("loader receiver dropped, abandoning batch");
                    return;
                }
            }
            let _ = tx.send(LoadEvent::Finished);
        });

        Self {
            rx,
            locators,
            settings,
            slots: vec![None; total],
            loaded: 0,
            finished: false,
            join: Some(join),
        }
    }

    /// Drain whatever the worker has produced so far.
    pub fn poll(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(LoadEvent::Loaded(i, track)) => {
                    if let Some(slot) = self.slots.get_mut(i) {
                        if slot.replace(track).is_none() {
                            self.loaded += 1;
                        }
                    }
                }
                Ok(LoadEvent::Finished) => self.finished = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Worker is gone; whatever it delivered is all there will be.
                    self.finished = true;
                    break;
                }
            }
        }
    }

    /// Still waiting on at least one locator.
    pub fn is_loading(&self) -> bool {
        !self.finished
    }

    /// `(resolved, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.loaded, self.slots.len())
    }

    /// The ordered track list, once loading has completed.
    ///
    /// Returns `None` while loading is in progress.
    pub fn take_tracks(&mut self) -> Option<Vec<Track>> {
        if self.is_loading() {
            return None;
        }
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
        Some(self.collect_ordered())
    }

    /// Block until every locator has resolved.
    #[cfg(test)]
    pub fn wait(mut self) -> Vec<Track> {
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
        self.poll();
        self.finished = true;
        self.collect_ordered()
    }

    fn collect_ordered(&mut self) -> Vec<Track> {
        let slots = std::mem::take(&mut self.slots);
        slots
            .into_iter()
            .zip(&self.locators)
            .map(|(slot, locator)| {
                // Only reachable if the worker died mid-batch.
                slot.unwrap_or_else(|| fallback_track(locator, &self.settings))
            })
            .collect()
    }
}

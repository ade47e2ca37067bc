//! Application model type: `App`.
//!
//! The `App` struct holds the cursor over the track list and the view flags
//! used by the UI and runtime.

/// The main application model.
#[derive(Debug)]
pub struct App {
    pub selected: usize,
    track_count: usize,

    /// Cursor jumps to the playing track whenever it changes.
    pub follow_playback: bool,
    /// Last playing index seen by `follow`.
    followed: Option<usize>,

    pub metadata_window: bool,
}

impl App {
    /// Create a new `App` over a list of `track_count` tracks.
    pub fn new(track_count: usize, follow_playback: bool) -> Self {
        Self {
            selected: 0,
            track_count,
            follow_playback,
            followed: None,
            metadata_window: false,
        }
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        self.track_count > 0
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Observe the engine's current index. The cursor only moves when the
    /// playing track changes, so browsing is not undone on every tick.
    pub fn follow(&mut self, current: Option<usize>) {
        if current == self.followed {
            return;
        }
        self.followed = current;
        if let Some(idx) = current {
            if self.follow_playback {
                self.set_selected(idx);
            }
        }
    }

    /// Set the selected track index, clamped to the list.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx.min(self.track_count.saturating_sub(1));
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.track_count;
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + self.track_count - 1) % self.track_count;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.set_selected(self.track_count.saturating_sub(1));
    }
}

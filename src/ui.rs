//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::App;
use crate::audio::{PlaybackSession, TransportState};
use crate::config::Settings;
use crate::library::Track;

/// Everything the main screen reads besides the app model.
pub struct View<'a> {
    pub tracks: &'a [Track],
    pub session: &'a PlaybackSession,
    /// Whether desktop media controls are connected.
    pub media_controls: bool,
}

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_step: f64) -> String {
    let seek = format!("scrub -/+{:.0}%", seek_step * 100.0);
    [
        ("j/k", "up/down"),
        ("h/l", "prev/next song"),
        ("H/L", seek.as_str()),
        ("0-9", "jump to 0-90%"),
        ("enter", "play selected song"),
        ("space/p", "play/pause"),
        ("gg/G", "top/bottom"),
        ("+/-", "volume"),
        ("K", "metadata"),
        ("q", "quit"),
    ]
    .iter()
    .map(|(k, v)| format!("[{k}] {v}"))
    .collect::<Vec<String>>()
    .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Elapsed and total time; `--:--` while the length is unknown.
fn time_text(position: Duration, duration: Option<Duration>, separator: &str) -> String {
    let total = duration
        .filter(|d| !d.is_zero())
        .map(format_mmss)
        .unwrap_or_else(|| "--:--".to_string());
    format!("{}{separator}{total}", format_mmss(position))
}

fn state_text(state: TransportState) -> &'static str {
    match state {
        TransportState::Idle => "Stopped",
        TransportState::Loading => "Loading",
        TransportState::Playing => "Playing",
        TransportState::Paused => "Paused",
    }
}

/// Track length column: `-` for unknown.
fn length_text(d: Duration) -> String {
    if d.is_zero() {
        "-".to_string()
    } else {
        format_mmss(d)
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn header(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" reprise ")
            .title_alignment(Alignment::Center),
    )
}

/// Render the loading screen shown while track metadata is read.
pub fn draw_loading(frame: &mut Frame, settings: &Settings, loaded: usize, total: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(frame.area());
    frame.render_widget(header(&settings.ui.header_text), chunks[0]);

    let ratio = if total == 0 {
        1.0
    } else {
        loaded as f64 / total as f64
    };
    let gauge = Gauge::default()
        .block(Block::bordered().title(" loading library "))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{loaded}/{total} tracks"));
    frame.render_widget(gauge, chunks[1]);
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App, view: &View<'_>, settings: &Settings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());
    frame.render_widget(header(&settings.ui.header_text), chunks[0]);

    draw_status(frame, app, view, settings, chunks[1]);
    draw_tracks(frame, app, view, chunks[2]);

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        draw_metadata(frame, app, view, chunks[2]);
    }

    let footer = Paragraph::new(controls_text(settings.audio.seek_step))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_status(frame: &mut Frame, app: &App, view: &View<'_>, settings: &Settings, area: Rect) {
    let session = view.session;
    let block = Block::bordered().padding(LEFT_PAD).title(" status ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let mut parts: Vec<String> = Vec::new();
    parts.push(state_text(session.state).to_string());
    if let Some(track) = session.current_index.and_then(|i| view.tracks.get(i)) {
        parts.push(format!("{} - {}", track.artist, track.name));
    }
    parts.push(format!("Vol: {:.0}%", session.volume * 100.0));
    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }
    if view.media_controls {
        parts.push("MPRIS".to_string());
    }
    frame.render_widget(Paragraph::new(parts.join(" • ")), rows[0]);

    let gauge = Gauge::default()
        .ratio(session.progress().unwrap_or(0.0))
        .label(time_text(
            session.position,
            session.duration,
            &settings.ui.time_separator,
        ));
    frame.render_widget(gauge, rows[1]);

    if let Some(err) = &session.last_error {
        frame.render_widget(
            Paragraph::new(format!("Error: {err}")).style(Style::default().add_modifier(Modifier::BOLD)),
            rows[2],
        );
    }
}

fn draw_tracks(frame: &mut Frame, app: &App, view: &View<'_>, area: Rect) {
    // Center the selected item when possible by creating a visible window.
    // Important: only build ListItems for the visible window (avoid allocating the entire list).
    let total = view.tracks.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = app.selected.min(total.saturating_sub(1));
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let playing = view.session.current_index;
    let visible_items: Vec<ListItem> = view.tracks[start..end]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let i = start + offset;
            let marker = if playing == Some(i) { "♪" } else { " " };
            ListItem::new(format!(
                "{marker} {:>3}  {} - {}  [{}]  {}",
                i + 1,
                track.artist,
                track.name,
                track.album,
                length_text(track.duration)
            ))
        })
        .collect();

    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(" tracks "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_metadata(frame: &mut Frame, app: &App, view: &View<'_>, list_area: Rect) {
    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    let popup_area = centered_rect_sized(72, 9, list_area);
    frame.render_widget(Clear, popup_area);

    let meta = match view.tracks.get(app.selected) {
        Some(track) => {
            let artwork = track
                .artwork
                .as_ref()
                .map(|a| format!("{} ({} bytes)", a.mime_type(), a.data().len()))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nArtwork: {}\nPath: {}",
                track.name,
                track.artist,
                track.album,
                length_text(track.duration),
                artwork,
                track.locator
            )
        }
        None => "No track selected".to_string(),
    };
    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(LEFT_PAD)
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

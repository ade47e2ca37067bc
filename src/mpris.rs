//! MPRIS2 media controls over the D-Bus session bus.
//!
//! The D-Bus objects live on a dedicated thread. The engine side only ever
//! touches [`MprisSurface`], which writes into shared state and nudges the
//! thread to emit `PropertiesChanged`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_io::block_on;
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::config::TransportSettings;
use crate::transport::{
    ControlCmd, NowPlaying, PLAYBACK_RATE, PlaybackStatus, PositionSnapshot, SurfaceError,
    TransportSurface,
};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/track";

#[derive(Debug)]
struct SharedState {
    playback: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    rate: f64,
    track_id: Option<OwnedObjectPath>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            playback: PlaybackStatus::Stopped,
            title: None,
            artist: Vec::new(),
            album: None,
            url: None,
            art_url: None,
            length_micros: None,
            position_micros: 0,
            rate: PLAYBACK_RATE,
            track_id: None,
        }
    }
}

/// Which `PropertiesChanged` signal the bus thread should emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Change {
    Metadata,
    Playback,
}

pub struct MprisSurface {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Change>,
}

impl MprisSurface {
    fn lock(&self) -> Result<MutexGuard<'_, SharedState>, SurfaceError> {
        self.state
            .lock()
            .map_err(|_| SurfaceError::Unavailable("MPRIS state lock poisoned".to_string()))
    }

    fn notify(&self, change: Change) -> Result<(), SurfaceError> {
        self.notify
            .send(change)
            .map_err(|_| SurfaceError::Unavailable("MPRIS thread has stopped".to_string()))
    }
}

impl TransportSurface for MprisSurface {
    fn publish_metadata(&mut self, now: Option<&NowPlaying>) -> Result<(), SurfaceError> {
        {
            let mut s = self.lock()?;
            match now {
                Some(n) => {
                    s.title = Some(n.title.clone());
                    s.artist = vec![n.artist.clone()];
                    s.album = Some(n.album.clone());
                    s.url = Some(locator_url(&n.locator));
                    s.art_url = n.artwork.as_ref().map(|a| a.to_data_url());
                    s.length_micros = n.length.map(micros);
                    s.track_id = track_id(n.index);
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
            s.position_micros = 0;
        }
        self.notify(Change::Metadata)
    }

    fn publish_position(&mut self, snapshot: PositionSnapshot) -> Result<(), SurfaceError> {
        if snapshot.duration.is_zero() {
            return Err(SurfaceError::Rejected("track length is zero".to_string()));
        }
        if snapshot.position > snapshot.duration {
            return Err(SurfaceError::Rejected(format!(
                "position {:?} beyond length {:?}",
                snapshot.position, snapshot.duration
            )));
        }
        let mut s = self.lock()?;
        s.position_micros = micros(snapshot.position);
        s.rate = snapshot.rate;
        // The decoder's length beats the tag's.
        s.length_micros = Some(micros(snapshot.duration));
        // MPRIS clients poll Position; it never goes through PropertiesChanged.
        Ok(())
    }

    fn publish_playback(&mut self, status: PlaybackStatus) -> Result<(), SurfaceError> {
        self.lock()?.playback = status;
        self.notify(Change::Playback)
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

fn locator_url(locator: &str) -> String {
    if locator.contains("://") {
        locator.to_string()
    } else {
        format!("file://{locator}")
    }
}

fn track_id(index: usize) -> Option<OwnedObjectPath> {
    OwnedObjectPath::try_from(format!("{TRACK_PATH_PREFIX}/{index}")).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!(?cmd, "MPRIS command dropped, event loop is gone");
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Previous);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return PlaybackStatus::Stopped.as_str();
        };
        s.playback.as_str()
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.state.lock().map(|s| s.rate).unwrap_or(PLAYBACK_RATE)
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        PLAYBACK_RATE
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        PLAYBACK_RATE
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'static>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            put("xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.clone()));
        }
        if let Some(length) = s.length_micros {
            put("mpris:length", Value::from(length));
        }
        if let Some(art) = &s.art_url {
            put("mpris:artUrl", Value::from(art.clone()));
        }
        map
    }
}

/// Register on the session bus and start serving MPRIS.
///
/// Waits up to `probe_timeout_ms` for the bus; any failure means there are no
/// media controls in this environment.
pub fn spawn_mpris(
    settings: &TransportSettings,
    tx: Sender<ControlCmd>,
) -> Result<MprisSurface, SurfaceError> {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Change>();
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), SurfaceError>>(1);

    let bus_name = settings.bus_name.clone();
    let identity = settings.identity.clone();
    let state_for_thread = state.clone();

    thread::Builder::new()
        .name("mpris".to_string())
        .spawn(move || {
            let registered = block_on(register(&bus_name, identity, tx, state_for_thread));
            let connection = match registered {
                Ok(c) => {
                    let _ = ready_tx.send(Ok(()));
                    c
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            serve(&connection, notify_rx);
        })
        .map_err(|e| SurfaceError::Unavailable(e.to_string()))?;

    let timeout = Duration::from_millis(settings.probe_timeout_ms);
    match ready_rx.recv_timeout(timeout) {
        Ok(Ok(())) => Ok(MprisSurface {
            state,
            notify: notify_tx,
        }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(SurfaceError::Unavailable(format!(
            "session bus did not answer within {timeout:?}"
        ))),
    }
}

async fn register(
    bus_name: &str,
    identity: String,
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
) -> Result<Connection, SurfaceError> {
    let connection = Connection::session().await?;
    connection.request_name(bus_name).await?;

    let object_server = connection.object_server();
    object_server
        .at(
            OBJECT_PATH,
            RootIface {
                tx: tx.clone(),
                identity,
            },
        )
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    Ok(connection)
}

/// Emit change signals until the surface is dropped.
fn serve(connection: &Connection, notify_rx: Receiver<Change>) {
    while let Ok(change) = notify_rx.recv() {
        if let Err(e) = block_on(emit_change(connection, change)) {
            warn!(error = %e, ?change, "failed to emit MPRIS change signal");
        }
    }
    debug!("MPRIS surface dropped, leaving the bus");
}

async fn emit_change(connection: &Connection, change: Change) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let iface = iface_ref.get().await;
    let emitter = iface_ref.signal_emitter();
    match change {
        Change::Metadata => iface.metadata_changed(emitter).await,
        Change::Playback => iface.playback_status_changed(emitter).await,
    }
}

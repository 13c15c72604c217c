use std::collections::HashMap;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_io::block_on;
use tracing::{debug, info, warn};
use zbus::Connection;
use zbus::fdo::DBusProxy;
use zbus::proxy::CacheProperties;
use zvariant::OwnedValue;

use crate::config::LocalSettings;
use crate::status::LocalMedia;
use crate::worker::{Worker, wait_for_stop};

use super::metadata::media_from_metadata;

const BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const RETRY_DELAY: Duration = Duration::from_secs(5);
const JOIN_TIMEOUT: Duration = Duration::from_secs(3);

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Player {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn position(&self) -> zbus::Result<i64>;
}

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2 {
    #[zbus(property)]
    fn identity(&self) -> zbus::Result<String>;
}

/// Read side of the local bridge. `None` means nothing is available.
pub trait MediaSource: Send {
    fn current_media(&self) -> Option<LocalMedia>;
}

/// Bridge used when local players are disabled.
pub struct NoMedia;

impl MediaSource for NoMedia {
    fn current_media(&self) -> Option<LocalMedia> {
        None
    }
}

type Slot = Arc<Mutex<Option<LocalMedia>>>;

/// Cheap handle onto the bridge's latest snapshot.
#[derive(Clone)]
pub struct BridgeReader {
    snapshot: Slot,
}

impl MediaSource for BridgeReader {
    fn current_media(&self) -> Option<LocalMedia> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Owns the D-Bus reader thread.
pub struct MprisBridge {
    snapshot: Slot,
    ignored: Arc<Mutex<Vec<String>>>,
    worker: Option<Worker>,
}

impl MprisBridge {
    pub fn spawn(settings: &LocalSettings) -> std::io::Result<Self> {
        let snapshot: Slot = Arc::new(Mutex::new(None));
        let ignored = Arc::new(Mutex::new(settings.ignore_players.clone()));
        let refresh = Duration::from_millis(settings.refresh_ms.max(1));

        let thread_snapshot = snapshot.clone();
        let thread_ignored = ignored.clone();
        let worker = Worker::spawn("segue-mpris", move |stop_rx| {
            run_bridge(thread_snapshot, thread_ignored, refresh, stop_rx)
        })?;

        Ok(Self {
            snapshot,
            ignored,
            worker: Some(worker),
        })
    }

    pub fn reader(&self) -> BridgeReader {
        BridgeReader {
            snapshot: self.snapshot.clone(),
        }
    }

    /// Replace the ignore list; applies from the next refresh.
    pub fn set_ignored(&self, players: Vec<String>) {
        *self.ignored.lock().unwrap_or_else(PoisonError::into_inner) = players;
    }

    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop(JOIN_TIMEOUT);
        }
        publish(&self.snapshot, None);
    }
}

impl Drop for MprisBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn publish(slot: &Slot, media: Option<LocalMedia>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = media;
}

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn run_bridge(snapshot: Slot, ignored: Arc<Mutex<Vec<String>>>, refresh: Duration, stop_rx: Receiver<()>) {
    block_on(async {
        'connect: while !stop_requested(&stop_rx) {
            let conn = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "session bus unavailable; local players disabled for now");
                    publish(&snapshot, None);
                    if wait_for_stop(&stop_rx, RETRY_DELAY) {
                        break;
                    }
                    continue;
                }
            };
            info!("reading local players from the session bus");

            loop {
                let skip = ignored.lock().unwrap_or_else(PoisonError::into_inner).clone();
                match read_active(&conn, &skip).await {
                    Ok(media) => publish(&snapshot, media),
                    Err(e) => {
                        warn!(error = %e, "listing bus names failed; reconnecting");
                        publish(&snapshot, None);
                        if wait_for_stop(&stop_rx, RETRY_DELAY) {
                            break 'connect;
                        }
                        continue 'connect;
                    }
                }
                if wait_for_stop(&stop_rx, refresh) {
                    break 'connect;
                }
            }
        }
    });
    publish(&snapshot, None);
    debug!("mpris bridge stopped");
}

/// Player bus names in bus order, minus ignored ones.
///
/// An entry in `ignored` matches when the name after the MPRIS prefix starts
/// with it, ignoring case, so `"firefox"` also covers `firefox.instance_1_42`.
pub(super) fn player_bus_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    ignored: &[String],
) -> Vec<String> {
    names
        .into_iter()
        .filter_map(|name| name.strip_prefix(BUS_PREFIX).map(|suffix| (name, suffix)))
        .filter(|(_, suffix)| {
            let suffix = suffix.to_ascii_lowercase();
            !ignored
                .iter()
                .map(|i| i.trim().to_ascii_lowercase())
                .any(|i| !i.is_empty() && suffix.starts_with(&i))
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// The first playing player, else the first one reporting a title.
async fn read_active(conn: &Connection, ignored: &[String]) -> zbus::Result<Option<LocalMedia>> {
    let dbus = DBusProxy::new(conn).await?;
    let names = dbus.list_names().await?;
    let players = player_bus_names(names.iter().map(|n| n.as_str()), ignored);

    let mut fallback = None;
    for bus_name in &players {
        match read_player(conn, bus_name).await {
            Ok(Some((media, playing))) => {
                if playing {
                    return Ok(Some(media));
                }
                fallback.get_or_insert(media);
            }
            Ok(None) => {}
            Err(e) => debug!(player = %bus_name, error = %e, "skipping player"),
        }
    }
    Ok(fallback)
}

async fn read_player(conn: &Connection, bus_name: &str) -> zbus::Result<Option<(LocalMedia, bool)>> {
    let player = PlayerProxy::builder(conn)
        .destination(bus_name)?
        .cache_properties(CacheProperties::No)
        .build()
        .await?;

    let metadata = player.metadata().await?;
    let status = player.playback_status().await.unwrap_or_default();
    // Not every player implements Position.
    let position = player.position().await.ok();

    let root = MediaPlayer2Proxy::builder(conn)
        .destination(bus_name)?
        .cache_properties(CacheProperties::No)
        .build()
        .await?;
    let name = match root.identity().await {
        Ok(identity) if !identity.trim().is_empty() => identity,
        _ => bus_name.trim_start_matches(BUS_PREFIX).to_string(),
    };

    let playing = status.eq_ignore_ascii_case("playing");
    Ok(media_from_metadata(&name, &status, position, &metadata).map(|m| (m, playing)))
}

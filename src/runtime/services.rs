use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{LocalSettings, RelaySettings, Settings};
use crate::fusion::SnapshotStore;
use crate::mpris::{MediaSource, MprisBridge, NoMedia};
use crate::poller::{Poller, PollerConfig};
use crate::relay::RelayServer;
use crate::render::TickDriver;

/// Everything running in the background, plus the tick driver that reads it.
pub struct Services {
    settings: Settings,
    poller: Poller,
    bridge: Option<MprisBridge>,
    relay: Option<RelayServer>,
    pub driver: TickDriver,
}

impl Services {
    pub fn start(settings: &Settings) -> Self {
        let store = Arc::new(SnapshotStore::new());

        let relay = start_relay(&settings.relay);
        let (bridge, source) = start_bridge(&settings.local);

        let mut poller = Poller::new(store.clone(), PollerConfig::from(&settings.poll));
        poller.start();

        let driver = TickDriver::new(source, store, settings.display.clone());

        Self {
            settings: settings.clone(),
            poller,
            bridge,
            relay,
            driver,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.settings.display.tick_ms.max(1))
    }

    pub fn relay_addr(&self) -> Option<SocketAddr> {
        self.relay.as_ref().map(RelayServer::local_addr)
    }

    /// Apply reloaded settings to the running services.
    pub fn apply(&mut self, settings: Settings) {
        if settings.display != self.settings.display {
            self.driver.set_display(settings.display.clone());
        }

        self.poller.reconfigure(PollerConfig::from(&settings.poll));

        let old = &self.settings.local;
        let new = &settings.local;
        if new.enabled != old.enabled || new.refresh_ms != old.refresh_ms {
            if let Some(mut bridge) = self.bridge.take() {
                bridge.stop();
            }
            let (bridge, source) = start_bridge(new);
            self.bridge = bridge;
            self.driver.set_source(source);
        } else if new.ignore_players != old.ignore_players {
            if let Some(bridge) = &self.bridge {
                bridge.set_ignored(new.ignore_players.clone());
            }
        }

        if settings.relay != self.settings.relay {
            if let Some(mut relay) = self.relay.take() {
                relay.stop();
            }
            self.relay = start_relay(&settings.relay);
        }

        if settings.output != self.settings.output || settings.logging != self.settings.logging {
            info!("output and logging changes apply after a restart");
        }

        self.settings = settings;
    }

    /// Stop the poller, the bridge and the relay, in that order.
    pub fn stop(&mut self) {
        self.poller.stop();
        if let Some(mut bridge) = self.bridge.take() {
            bridge.stop();
        }
        if let Some(mut relay) = self.relay.take() {
            relay.stop();
        }
    }
}

fn start_bridge(local: &LocalSettings) -> (Option<MprisBridge>, Box<dyn MediaSource>) {
    if !local.enabled {
        info!("local players disabled");
        return (None, Box::new(NoMedia));
    }
    match MprisBridge::spawn(local) {
        Ok(bridge) => {
            let reader = bridge.reader();
            (Some(bridge), Box::new(reader))
        }
        Err(e) => {
            warn!(error = %e, "failed to start the MPRIS bridge; local players disabled");
            (None, Box::new(NoMedia))
        }
    }
}

fn start_relay(relay: &RelaySettings) -> Option<RelayServer> {
    if !relay.enabled {
        return None;
    }
    match RelayServer::spawn(relay) {
        Ok(server) => Some(server),
        Err(e) => {
            warn!(bind = %relay.bind, port = relay.port, error = %e, "image relay disabled");
            None
        }
    }
}

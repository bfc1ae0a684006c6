use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::Result;
use crate::api::config::WipiConfig;
use crate::api::models::{
    ConnectReport, HubRecord, InterfaceStatus, Reporter, ScanReport, Traffic,
};
use crate::control::{ControlClient, HostProbe, SystemHost, WpaCli};
use crate::core::cleanup::clear_all;
use crate::core::connection::ConnectionManager;
use crate::core::scan::scan_networks;
use crate::core::status::read_status;
use crate::core::traffic::read_traffic;
use crate::monitoring::events::hub_set_changed;
use crate::monitoring::reachability::{ReachabilityTracker, probe};
use crate::monitoring::WipiEvent;
use crate::types::constants::defaults;

/// High-level interface to the wireless link of a single interface.
///
/// `Wipi` owns the latest [`InterfaceStatus`] and scan results, refreshes
/// them on request, and publishes a [`WipiEvent`] whenever something
/// observable changes.
///
/// # Creating an Instance
///
/// ```no_run
/// use wipi::{Wipi, WipiConfig};
///
/// # async fn example() -> wipi::Result<()> {
/// let wipi = Wipi::new(WipiConfig::default());
/// let hubs = wipi.refresh_all().await?;
/// for hub in &hubs {
///     println!("{} {} dBm {}", hub.ssid, hub.signal_level, hub.security);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Switching Networks
///
/// ```no_run
/// use wipi::{Wipi, WipiConfig};
///
/// # async fn example() -> wipi::Result<()> {
/// let wipi = Wipi::new(WipiConfig::default());
/// let report = wipi
///     .connect("MyNetwork", "password123", &|msg: &str| println!("{msg}"))
///     .await?;
///
/// if !report.outcome.is_connected() {
///     eprintln!("{}", report.outcome);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Concurrency
///
/// All methods take `&self`; share an instance with `Arc`. Operations that
/// mutate the credential store ([`connect`](Self::connect) and
/// [`clear_all_connections`](Self::clear_all_connections)) are serialized,
/// so a second call waits for the first to reach a terminal state.
pub struct Wipi<C = WpaCli, H = SystemHost> {
    config: WipiConfig,
    client: C,
    host: H,
    status: RwLock<InterfaceStatus>,
    scan: RwLock<ScanReport>,
    reachability: Mutex<ReachabilityTracker>,
    store_lock: Mutex<()>,
    events: broadcast::Sender<WipiEvent>,
}

impl Wipi {
    /// Creates an instance driving `wpa_cli` and the host tools named in `config`.
    pub fn new(config: WipiConfig) -> Self {
        let client = WpaCli::new(&config);
        let host = SystemHost::new(&config);
        Self::with_backends(config, client, host)
    }
}

impl<C, H> Wipi<C, H>
where
    C: ControlClient,
    H: HostProbe,
{
    /// Creates an instance over custom backends.
    pub fn with_backends(config: WipiConfig, client: C, host: H) -> Self {
        let (events, _) = broadcast::channel(defaults::EVENT_CAPACITY);
        Self {
            config,
            client,
            host,
            status: RwLock::new(InterfaceStatus::default()),
            scan: RwLock::new(ScanReport::default()),
            reachability: Mutex::new(ReachabilityTracker::default()),
            store_lock: Mutex::new(()),
            events,
        }
    }

    pub fn config(&self) -> &WipiConfig {
        &self.config
    }

    /// Subscribes to change notifications.
    ///
    /// Only events sent after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<WipiEvent> {
        self.events.subscribe()
    }

    /// Last status snapshot.
    pub async fn status(&self) -> InterfaceStatus {
        self.status.read().await.clone()
    }

    /// Last hub list, one record per SSID, strongest first.
    pub async fn hubs(&self) -> Vec<HubRecord> {
        self.scan.read().await.hubs.clone()
    }

    /// Every record from the last scan, ordered by SSID.
    pub async fn details(&self) -> Vec<HubRecord> {
        self.scan.read().await.details.clone()
    }

    /// Refreshes the status and, when associated, reachability, then the hub list.
    ///
    /// Returns the new hub list.
    pub async fn refresh_all(&self) -> Result<Vec<HubRecord>> {
        let status = self.refresh_status().await;
        if status.associated {
            self.check_internet_reachability(&self.config.probe_target)
                .await;
        }
        self.refresh_hubs().await
    }

    /// Reads a new status snapshot and replaces the cached one.
    ///
    /// Sends [`WipiEvent::StatusChanged`] when the link identity changed.
    pub async fn refresh_status(&self) -> InterfaceStatus {
        let mut fresh = read_status(&self.host, &self.config.interface).await;

        let changed = {
            let mut current = self.status.write().await;
            // Read under the status guard so a concurrent probe cannot be overwritten.
            fresh.internet_reachable = self.reachability.lock().await.last();
            let changed = !current.same_link(&fresh);
            *current = fresh.clone();
            changed
        };

        if changed {
            info!(
                "Status changed: associated={} ssid={:?} ip={:?}",
                fresh.associated, fresh.connected_ssid, fresh.ip_address
            );
            self.emit(WipiEvent::StatusChanged(fresh.clone()));
        }
        fresh
    }

    /// Scans and replaces the cached hub and detail lists.
    ///
    /// Sends [`WipiEvent::HubListChanged`] when the set of SSIDs differs from
    /// the previous scan.
    pub async fn refresh_hubs(&self) -> Result<Vec<HubRecord>> {
        let report = scan_networks(&self.client).await?;
        let hubs = report.hubs.clone();

        let changed = {
            let mut cached = self.scan.write().await;
            let changed = hub_set_changed(&cached.hubs, &report.hubs);
            *cached = report;
            changed
        };

        if changed {
            debug!("Hub list changed: {} networks", hubs.len());
            self.emit(WipiEvent::HubListChanged(hubs.clone()));
        }
        Ok(hubs)
    }

    /// Probes `target` once and returns whether it answered.
    ///
    /// Never fails; a probe that cannot run counts as unreachable. Sends
    /// [`WipiEvent::ReachabilityChanged`] only when the result differs from
    /// the previous probe.
    pub async fn check_internet_reachability(&self, target: &str) -> bool {
        let reachable = probe(&self.host, target).await;

        let changed = self.reachability.lock().await.update(reachable, target);
        if changed {
            let mut current = self.status.write().await;
            let mut next = current.clone();
            next.internet_reachable = Some(reachable);
            *current = next;
            drop(current);

            self.emit(WipiEvent::ReachabilityChanged(reachable));
        }
        reachable
    }

    /// Switches to `ssid`, rolling back to the previous network on failure.
    ///
    /// Progress is sent to `reporter` as it happens. Returns `Err` only when
    /// the credentials are rejected before anything is written; every other
    /// result, including a rollback, is described by the report. Status and
    /// hub list are refreshed afterwards.
    pub async fn connect(
        &self,
        ssid: &str,
        psk: &str,
        reporter: &dyn Reporter,
    ) -> Result<ConnectReport> {
        let report = {
            let _guard = self.store_lock.lock().await;
            ConnectionManager::new(&self.client, &self.host, reporter)
                .connect(ssid, psk)
                .await?
        };

        if let Err(e) = self.refresh_all().await {
            warn!("Refresh after connection change failed: {e}");
        }
        Ok(report)
    }

    /// Removes every saved network and returns how many were removed.
    pub async fn clear_all_connections(&self, reporter: &dyn Reporter) -> Result<usize> {
        let removed = {
            let _guard = self.store_lock.lock().await;
            clear_all(&self.client, reporter).await?
        };
        self.refresh_status().await;
        Ok(removed)
    }

    /// Byte counters of `interface` since boot.
    pub async fn get_traffic(&self, interface: &str) -> Result<Traffic> {
        read_traffic(&self.host, interface).await
    }

    /// Refreshes forever: hubs and status every `hub_every`, reachability
    /// every `reach_every`.
    ///
    /// Intended to run in a background task or under `select!` with a
    /// shutdown signal. Scan failures are logged and retried on the next tick.
    pub async fn monitor(&self, hub_every: Duration, reach_every: Duration) {
        let mut hub_tick = tokio::time::interval(hub_every);
        let mut reach_tick = tokio::time::interval(reach_every);

        loop {
            tokio::select! {
                _ = hub_tick.tick() => {
                    self.refresh_status().await;
                    if let Err(e) = self.refresh_hubs().await {
                        warn!("Hub refresh failed: {e}");
                    }
                }
                _ = reach_tick.tick() => {
                    self.check_internet_reachability(&self.config.probe_target).await;
                }
            }
        }
    }

    fn emit(&self, event: WipiEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for event");
        }
    }
}

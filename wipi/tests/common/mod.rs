//! In-memory stand-ins for the supplicant and host tools.
//!
//! Both fakes write to a shared [`Journal`] so tests can assert on the
//! exact order of commands across the two seams.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wipi::{CommandReply, ConnectionError, ControlClient, HostProbe, Result, Wipi, WipiConfig};

pub const IWCONFIG_IDLE: &str = "wlan0     IEEE 802.11  ESSID:off/any  \n          Mode:Managed  Access Point: Not-Associated   Tx-Power=31 dBm   \n";

pub fn iwconfig_associated(ssid: &str, signal: i32) -> String {
    format!(
        "wlan0     IEEE 802.11  ESSID:\"{ssid}\"  \n          Mode:Managed  Frequency:2.437 GHz  Access Point: 11:22:33:44:55:66   \n          Link Quality=70/70  Signal level={signal} dBm  \n"
    )
}

pub const IP_LINK: &str = "3: wlan0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500\n    link/ether b8:27:eb:01:02:03 brd ff:ff:ff:ff:ff:ff\n    RX: bytes  packets  errors  dropped overrun mcast\n    2048       20       0       0       0       0\n    TX: bytes  packets  errors  dropped carrier collsns\n    1024       10       0       0       0       0\n";

/// Ordered record of every command either fake received.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone)]
pub struct StoredNetwork {
    pub id: u32,
    pub ssid: String,
    pub flags: String,
}

#[derive(Default)]
struct SupplicantState {
    networks: Vec<StoredNetwork>,
    next_id: u32,
    replies: HashMap<String, VecDeque<String>>,
    scan_results: String,
    unreachable: Vec<String>,
}

/// Credential store and association commands, kept in memory.
#[derive(Clone, Default)]
pub struct FakeSupplicant {
    state: Arc<Mutex<SupplicantState>>,
    journal: Journal,
}

impl FakeSupplicant {
    pub fn new(journal: &Journal) -> Self {
        Self {
            state: Arc::default(),
            journal: journal.clone(),
        }
    }

    /// Seeds the store with `(ssid, flags)` entries, ids from 0.
    pub fn with_networks(self, networks: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for (ssid, flags) in networks {
                let id = state.next_id;
                state.next_id += 1;
                state.networks.push(StoredNetwork {
                    id,
                    ssid: ssid.to_string(),
                    flags: flags.to_string(),
                });
            }
        }
        self
    }

    /// Queues replies for `cmd`; once drained the command answers `OK`.
    pub fn reply(self, cmd: &str, replies: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(cmd.to_string())
            .or_default()
            .extend(replies.iter().map(|r| r.to_string()));
        self
    }

    /// Makes `cmd` fail as if `wpa_cli` could not reach the supplicant.
    pub fn unreachable(self, cmd: &str) -> Self {
        self.state.lock().unwrap().unreachable.push(cmd.to_string());
        self
    }

    pub fn set_scan_results(&self, text: &str) {
        self.state.lock().unwrap().scan_results = text.to_string();
    }

    pub fn networks(&self) -> Vec<StoredNetwork> {
        self.state.lock().unwrap().networks.clone()
    }

    fn enter(&self, entry: String, cmd: &str) -> Result<()> {
        self.journal.push(entry);
        if self.state.lock().unwrap().unreachable.iter().any(|c| c == cmd) {
            return Err(ConnectionError::CommandFailed {
                cmd: format!("wpa_cli {cmd}"),
                code: Some(255),
                stderr: "Failed to connect to non-global ctrl_ifname".into(),
            });
        }
        Ok(())
    }

    fn status_reply(&self, cmd: &str) -> CommandReply {
        let queued = self
            .state
            .lock()
            .unwrap()
            .replies
            .get_mut(cmd)
            .and_then(VecDeque::pop_front);
        CommandReply::from_output(queued.as_deref().unwrap_or("OK"))
    }
}

#[async_trait]
impl ControlClient for FakeSupplicant {
    async fn list_networks(&self) -> Result<String> {
        self.enter("list_networks".into(), "list_networks")?;
        let state = self.state.lock().unwrap();
        let mut out = String::from("network id / ssid / bssid / flags\n");
        for n in &state.networks {
            out.push_str(&format!("{}\t{}\tany\t{}\n", n.id, n.ssid, n.flags));
        }
        Ok(out)
    }

    async fn add_network(&self) -> Result<u32> {
        self.enter("add_network".into(), "add_network")?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.networks.push(StoredNetwork {
            id,
            ssid: String::new(),
            flags: "[DISABLED]".into(),
        });
        Ok(id)
    }

    async fn set_network(&self, id: u32, field: &str, value: &str) -> Result<CommandReply> {
        self.enter(format!("set_network {id} {field} {value}"), "set_network")?;
        let reply = self.status_reply(&format!("set_network {field}"));
        if reply.is_ok() && field == "ssid" {
            let mut state = self.state.lock().unwrap();
            if let Some(n) = state.networks.iter_mut().find(|n| n.id == id) {
                n.ssid = value.trim_matches('"').to_string();
            }
        }
        Ok(reply)
    }

    async fn select_network(&self, id: u32) -> Result<CommandReply> {
        self.enter(format!("select_network {id}"), "select_network")?;
        let mut state = self.state.lock().unwrap();
        for n in state.networks.iter_mut() {
            n.flags = if n.id == id { "[CURRENT]" } else { "[DISABLED]" }.into();
        }
        Ok(CommandReply::Ok)
    }

    async fn remove_network(&self, id: u32) -> Result<CommandReply> {
        self.enter(format!("remove_network {id}"), "remove_network")?;
        self.state.lock().unwrap().networks.retain(|n| n.id != id);
        Ok(CommandReply::Ok)
    }

    async fn save_config(&self) -> Result<CommandReply> {
        self.enter("save_config".into(), "save_config")?;
        Ok(self.status_reply("save_config"))
    }

    async fn reconfigure(&self) -> Result<CommandReply> {
        self.enter("reconfigure".into(), "reconfigure")?;
        Ok(self.status_reply("reconfigure"))
    }

    async fn reassociate(&self) -> Result<CommandReply> {
        self.enter("reassociate".into(), "reassociate")?;
        Ok(self.status_reply("reassociate"))
    }

    async fn scan(&self) -> Result<CommandReply> {
        self.enter("scan".into(), "scan")?;
        Ok(self.status_reply("scan"))
    }

    async fn scan_results(&self) -> Result<String> {
        self.enter("scan_results".into(), "scan_results")?;
        Ok(self.state.lock().unwrap().scan_results.clone())
    }
}

#[derive(Default)]
struct HostState {
    iwconfig: Option<String>,
    addresses: VecDeque<String>,
    fallback_address: String,
    pings: VecDeque<Result<bool>>,
    link: String,
    iwconfig_delay: Duration,
}

/// Host tools with scripted answers.
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
    journal: Journal,
}

impl FakeHost {
    pub fn new(journal: &Journal) -> Self {
        let host = Self {
            state: Arc::default(),
            journal: journal.clone(),
        };
        host.state.lock().unwrap().link = IP_LINK.to_string();
        host
    }

    /// Answers for successive address reads; after they run out every read
    /// returns `fallback`.
    pub fn with_addresses(self, addresses: &[&str], fallback: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.addresses = addresses.iter().map(|a| format!("{a}\n")).collect();
            state.fallback_address = fallback.to_string();
        }
        self
    }

    pub fn set_iwconfig(&self, text: Option<&str>) {
        self.state.lock().unwrap().iwconfig = text.map(str::to_string);
    }

    pub fn queue_pings(&self, results: Vec<Result<bool>>) {
        self.state.lock().unwrap().pings.extend(results);
    }

    /// Makes every link report take `delay` to arrive.
    pub fn set_iwconfig_delay(&self, delay: Duration) {
        self.state.lock().unwrap().iwconfig_delay = delay;
    }
}

#[async_trait]
impl HostProbe for FakeHost {
    async fn iwconfig(&self, interface: &str) -> Result<String> {
        self.journal.push(format!("iwconfig {interface}"));
        let delay = self.state.lock().unwrap().iwconfig_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.state.lock().unwrap().iwconfig.clone() {
            Some(text) => Ok(text),
            None => Err(ConnectionError::CommandFailed {
                cmd: format!("iwconfig {interface}"),
                code: Some(237),
                stderr: format!("{interface}: No such device"),
            }),
        }
    }

    async fn ip_addresses(&self) -> Result<String> {
        self.journal.push("hostname -I");
        let mut state = self.state.lock().unwrap();
        let next = state.addresses.pop_front();
        Ok(next.unwrap_or_else(|| format!("{}\n", state.fallback_address)))
    }

    async fn hostname(&self) -> Result<String> {
        self.journal.push("hostname");
        Ok("raspberrypi\n".into())
    }

    async fn link_show(&self, interface: &str) -> Result<String> {
        self.journal.push(format!("ip addr show {interface}"));
        Ok(self.state.lock().unwrap().link.clone())
    }

    async fn link_stats(&self, interface: &str) -> Result<String> {
        self.journal.push(format!("ip -s link show {interface}"));
        Ok(self.state.lock().unwrap().link.clone())
    }

    async fn ping(&self, target: &str) -> Result<bool> {
        self.journal.push(format!("ping {target}"));
        self.state
            .lock()
            .unwrap()
            .pings
            .pop_front()
            .unwrap_or(Ok(false))
    }
}

/// Collects reporter messages.
#[derive(Clone, Default)]
pub struct Messages(Arc<Mutex<Vec<String>>>);

impl Messages {
    pub fn reporter(&self) -> impl Fn(&str) + Send + Sync + use<> {
        let inner = self.0.clone();
        move |msg: &str| inner.lock().unwrap().push(msg.to_string())
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.all().iter().any(|m| m == needle)
    }
}

pub fn facade(supplicant: &FakeSupplicant, host: &FakeHost) -> Wipi<FakeSupplicant, FakeHost> {
    Wipi::with_backends(WipiConfig::default(), supplicant.clone(), host.clone())
}

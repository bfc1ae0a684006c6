use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::constants::{defaults, timeouts};

/// Runtime configuration for [`Wipi`](crate::Wipi).
///
/// Every field has a default suited to a Raspberry Pi running Raspbian, so
/// a config file only needs to name what differs. Missing keys fall back
/// to the defaults below.
///
/// # Examples
///
/// ```rust
/// use wipi::WipiConfig;
///
/// let config = WipiConfig::default()
///     .with_interface("wlan1")
///     .with_probe_target("1.1.1.1");
///
/// assert_eq!(config.interface, "wlan1");
/// ```
///
/// Loading from TOML:
///
/// ```rust
/// use wipi::WipiConfig;
///
/// let config: WipiConfig = toml::from_str(r#"
///     interface = "wlan1"
///     command_timeout_secs = 20
/// "#).unwrap();
///
/// assert_eq!(config.probe_target, "google.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipiConfig {
    /// Wireless interface passed to `wpa_cli -i` and the host tools.
    pub interface: String,
    /// Host pinged by the reachability probe.
    pub probe_target: String,
    /// Path to `wpa_cli`.
    pub wpa_cli: PathBuf,
    /// Path to `iwconfig`.
    pub iwconfig: PathBuf,
    /// Path to `ip`.
    pub ip: PathBuf,
    /// Path to `hostname`.
    pub hostname: PathBuf,
    /// Path to `ping`.
    pub ping: PathBuf,
    /// Upper bound on any single external command.
    pub command_timeout_secs: u64,
}

impl Default for WipiConfig {
    /// Defaults:
    /// - `interface`: `wlan0`
    /// - `probe_target`: `google.com`
    /// - tool paths: the Raspbian locations under `/sbin` and `/bin`
    /// - `command_timeout_secs`: 10
    fn default() -> Self {
        Self {
            interface: defaults::INTERFACE.to_string(),
            probe_target: defaults::PROBE_TARGET.to_string(),
            wpa_cli: PathBuf::from(defaults::WPA_CLI),
            iwconfig: PathBuf::from(defaults::IWCONFIG),
            ip: PathBuf::from(defaults::IP),
            hostname: PathBuf::from(defaults::HOSTNAME),
            ping: PathBuf::from(defaults::PING),
            command_timeout_secs: timeouts::COMMAND_TIMEOUT_SECS,
        }
    }
}

impl WipiConfig {
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    #[must_use]
    pub fn with_probe_target(mut self, target: impl Into<String>) -> Self {
        self.probe_target = target.into();
        self
    }

    #[must_use]
    pub fn with_wpa_cli(mut self, path: impl Into<PathBuf>) -> Self {
        self.wpa_cli = path.into();
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Upper bound on any single external command.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

//! Constants for the wpa_supplicant control surface and host tools.
//!
//! These values mirror what `wpa_cli`, `iwconfig` and `ip` print, plus the
//! fixed timings the radio and DHCP client need between steps.

/// Replies returned by `wpa_cli` for status commands.
pub mod reply {
    pub const OK: &str = "OK";
    pub const FAIL: &str = "FAIL";
}

/// Flag tokens found in the fourth column of `list_networks`.
pub mod network_flag {
    pub const CURRENT: &str = "[CURRENT]";
    pub const DISABLED: &str = "[DISABLED]";
    pub const TEMP_DISABLED: &str = "[TEMP-DISABLED]";
    pub const P2P_PERSISTENT: &str = "[P2P-PERSISTENT]";
}

/// Auth-suite tokens matched against scan result flags, strongest first.
pub mod auth_suite {
    pub const WPA2_EAP: &str = "WPA2-EAP";
    pub const WPA2_PSK: &str = "WPA2-PSK";
    pub const WPA_PSK: &str = "WPA-PSK";
}

/// Labels located in `iwconfig` and `ip addr` output.
pub mod status_label {
    pub const NOT_ASSOCIATED: &str = "Not-Associated";
    pub const AD_HOC: &str = "Ad-Hoc";
    pub const ESSID: &str = "ESSID:\"";
    pub const ACCESS_POINT: &str = "Access Point:";
    pub const LINK_QUALITY: &str = "Link Quality=";
    pub const SIGNAL_LEVEL: &str = "Signal level=";
    pub const LINK_ETHER: &str = "link/ether ";
    pub const RX_HEADER: &str = "RX:";
    pub const TX_HEADER: &str = "TX:";
}

/// WPA passphrase and SSID limits, as enforced by `wpa_passphrase`.
pub mod credential {
    pub const MIN_PSK_LEN: usize = 8;
    pub const MAX_PSK_LEN: usize = 63;
    pub const MAX_SSID_BYTES: usize = 32;
    pub const PBKDF2_ROUNDS: u32 = 4096;
    pub const PSK_BYTES: usize = 32;
}

/// Timeout and delay constants
pub mod timeouts {
    use std::time::Duration;

    pub const ADDRESS_POLL_INTERVAL_SECS: u64 = 6;
    pub const SCAN_SETTLE_SECS: u64 = 2;
    pub const COMMAND_TIMEOUT_SECS: u64 = 10;
    pub const PING_DEADLINE_SECS: u64 = 5;

    pub fn address_poll_interval() -> Duration {
        Duration::from_secs(ADDRESS_POLL_INTERVAL_SECS)
    }

    pub fn scan_settle() -> Duration {
        Duration::from_secs(SCAN_SETTLE_SECS)
    }
}

/// Retry count constants
pub mod retries {
    pub const ADDRESS_POLL_ATTEMPTS: u32 = 5;
}

/// Defaults for the host environment.
pub mod defaults {
    pub const INTERFACE: &str = "wlan0";
    pub const PROBE_TARGET: &str = "google.com";
    pub const WPA_CLI: &str = "/sbin/wpa_cli";
    pub const IWCONFIG: &str = "/sbin/iwconfig";
    pub const IP: &str = "/bin/ip";
    pub const HOSTNAME: &str = "/bin/hostname";
    pub const PING: &str = "/bin/ping";
    pub const EVENT_CAPACITY: usize = 32;
}

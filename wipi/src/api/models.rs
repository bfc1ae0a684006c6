use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

use crate::types::constants::{auth_suite, network_flag, reply};

/// Snapshot of the wireless interface.
///
/// Produced whole by every status refresh; fields are never patched one by
/// one. Empty strings mean "not known" (for example the link fields while
/// not associated, or an address that could not be resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    /// Whether the interface is associated with an access point.
    pub associated: bool,
    /// Link quality as printed by `iwconfig`, e.g. `"70/70"`.
    pub link_quality: String,
    /// Signal level as printed by `iwconfig`, e.g. `"-39"`.
    pub signal_level: String,
    /// SSID of the access point we are associated with.
    pub connected_ssid: String,
    /// MAC address of the access point we are associated with.
    pub connected_bssid: String,
    /// Addresses reported by `hostname -I`.
    pub ip_address: String,
    /// Hardware address of the interface.
    pub mac_address: String,
    /// Host name of this machine.
    pub host_name: String,
    /// Result of the last reachability probe, `None` before the first probe.
    pub internet_reachable: Option<bool>,
}

impl InterfaceStatus {
    /// Returns `true` when `other` describes the same link as `self`.
    ///
    /// Signal level and link quality fluctuate between every poll, so they
    /// are not part of the comparison.
    pub fn same_link(&self, other: &InterfaceStatus) -> bool {
        self.associated == other.associated
            && self.connected_ssid == other.connected_ssid
            && self.connected_bssid == other.connected_bssid
            && self.ip_address == other.ip_address
    }
}

/// Security classification of a scanned access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Security {
    /// WPA2 Enterprise (802.1X).
    Wpa2Eap,
    /// WPA2 Personal.
    Wpa2Psk,
    /// WPA Personal.
    WpaPsk,
    /// Open, WEP or anything not recognised.
    Low,
}

impl Security {
    /// Classifies a `scan_results` flags column.
    ///
    /// Tokens are checked strongest first, so `[WPA-PSK-CCMP][WPA2-PSK-CCMP]`
    /// is reported as WPA2-PSK.
    pub fn from_flags(flags: &str) -> Self {
        if flags.contains(auth_suite::WPA2_EAP) {
            Self::Wpa2Eap
        } else if flags.contains(auth_suite::WPA2_PSK) {
            Self::Wpa2Psk
        } else if flags.contains(auth_suite::WPA_PSK) {
            Self::WpaPsk
        } else {
            Self::Low
        }
    }
}

impl Display for Security {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wpa2Eap => write!(f, "WPA2-EAP"),
            Self::Wpa2Psk => write!(f, "WPA2-PSK"),
            Self::WpaPsk => write!(f, "WPA-PSK"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// One access point as seen in a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubRecord {
    /// Network name; empty for hidden networks.
    pub ssid: String,
    /// MAC address of the access point.
    pub bssid: String,
    /// Operating frequency in MHz.
    pub frequency: u32,
    /// Signal level in dBm.
    pub signal_level: i32,
    /// Security classification.
    pub security: Security,
}

/// Result of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// One record per SSID, strongest signal first.
    pub hubs: Vec<HubRecord>,
    /// Every parsed record, sorted case-insensitively by SSID.
    pub details: Vec<HubRecord>,
}

bitflags! {
    /// Flags column of a `list_networks` row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NetworkFlags: u8 {
        const CURRENT = 0b0001;
        const DISABLED = 0b0010;
        const TEMP_DISABLED = 0b0100;
        const P2P_PERSISTENT = 0b1000;
    }
}

impl NetworkFlags {
    /// Parses a flags field such as `[DISABLED][P2P-PERSISTENT]`.
    pub fn from_field(field: &str) -> Self {
        let mut flags = Self::empty();
        if field.contains(network_flag::CURRENT) {
            flags |= Self::CURRENT;
        }
        if field.contains(network_flag::DISABLED) {
            flags |= Self::DISABLED;
        }
        if field.contains(network_flag::TEMP_DISABLED) {
            flags |= Self::TEMP_DISABLED;
        }
        if field.contains(network_flag::P2P_PERSISTENT) {
            flags |= Self::P2P_PERSISTENT;
        }
        flags
    }
}

/// Coarse status of a credential store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Current,
    Disabled,
    None,
}

/// One network block in the credential store, as listed by the supplicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    /// Store-assigned id; stable until the entry is removed.
    pub id: u32,
    pub ssid: String,
    /// Pinned BSSID, usually `any`.
    pub bssid: String,
    pub flags: NetworkFlags,
}

impl NetworkEntry {
    pub fn status(&self) -> EntryStatus {
        if self.flags.contains(NetworkFlags::CURRENT) {
            EntryStatus::Current
        } else if self.flags.contains(NetworkFlags::DISABLED) {
            EntryStatus::Disabled
        } else {
            EntryStatus::None
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.status() == EntryStatus::Disabled
    }
}

/// Reply to a control-client status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Ok,
    Fail(String),
}

impl CommandReply {
    /// Classifies raw command output. Anything other than a bare `OK` is a failure.
    pub fn from_output(output: &str) -> Self {
        let trimmed = output.trim();
        if trimmed == reply::OK {
            Self::Ok
        } else if trimmed.is_empty() {
            Self::Fail(reply::FAIL.to_string())
        } else {
            Self::Fail(trimmed.to_string())
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl Display for CommandReply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "{}", reply::OK),
            Self::Fail(text) => write!(f, "{text}"),
        }
    }
}

/// Byte counters of an interface since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// States of a connection-change operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    Idle,
    CredentialWrite,
    Reassociating,
    AwaitingAddress,
    Connected,
    RollingBack,
    RolledBack,
    RollbackFailed,
    /// Writing the new entry failed; nothing was selected.
    Aborted,
}

impl ConnectState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Connected | Self::RolledBack | Self::RollbackFailed | Self::Aborted
        )
    }
}

impl Display for ConnectState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::CredentialWrite => write!(f, "writing credentials"),
            Self::Reassociating => write!(f, "reassociating"),
            Self::AwaitingAddress => write!(f, "awaiting address"),
            Self::Connected => write!(f, "connected"),
            Self::RollingBack => write!(f, "rolling back"),
            Self::RolledBack => write!(f, "rolled back"),
            Self::RollbackFailed => write!(f, "rollback failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// How a connection-change operation ended.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// The new network is up and holds `address`.
    Connected { address: String },
    /// The new network failed with `cause`; the previous one was restored
    /// and holds `address`.
    RolledBack {
        address: String,
        cause: ConnectionError,
    },
    /// The new network failed with `cause` and restoring the previous one
    /// failed as well. `rollback` is always [`ConnectionError::RollbackFailed`].
    RollbackFailed {
        cause: ConnectionError,
        rollback: ConnectionError,
    },
    /// The new network failed with `cause` and no previous network existed.
    NoBackup { cause: ConnectionError },
    /// Writing the new entry failed; nothing was selected.
    Aborted(ConnectionError),
}

impl ConnectOutcome {
    /// Returns `true` only when the requested network is up.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Address held after the operation, if any network is up.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Connected { address } | Self::RolledBack { address, .. } => Some(address.as_str()),
            _ => None,
        }
    }

    /// Converts the outcome into the address of the requested network, or
    /// the error that best describes why it is not up.
    ///
    /// A rolled back change yields its original cause; a missing backup
    /// yields [`ConnectionError::NoBackup`].
    pub fn into_result(self) -> Result<String, ConnectionError> {
        match self {
            Self::Connected { address } => Ok(address),
            Self::RolledBack { cause, .. } => Err(cause),
            Self::RollbackFailed { rollback, .. } => Err(rollback),
            Self::NoBackup { .. } => Err(ConnectionError::NoBackup),
            Self::Aborted(e) => Err(e),
        }
    }
}

impl Display for ConnectOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected { address } => write!(f, "connected ({address})"),
            Self::RolledBack { address, cause } => {
                write!(f, "rolled back to previous network ({address}) after: {cause}")
            }
            Self::RollbackFailed { cause, rollback } => write!(f, "{rollback} after: {cause}"),
            Self::NoBackup { cause } => write!(f, "no backup network after: {cause}"),
            Self::Aborted(e) => write!(f, "aborted: {e}"),
        }
    }
}

/// Summary of one connection-change operation.
#[derive(Debug)]
pub struct ConnectReport {
    pub ssid: String,
    /// Id of the entry created for the new network, if one was allocated.
    pub network_id: Option<u32>,
    /// Id of the entry that was current before the change.
    pub prior_current_id: Option<u32>,
    /// Every state the operation passed through, in order.
    pub states: Vec<ConnectState>,
    pub outcome: ConnectOutcome,
}

impl ConnectReport {
    /// The last state reached.
    pub fn final_state(&self) -> ConnectState {
        self.states.last().copied().unwrap_or(ConnectState::Idle)
    }

    pub fn passed_through(&self, state: ConnectState) -> bool {
        self.states.contains(&state)
    }
}

/// Receives human-readable progress messages during long operations.
///
/// Any `Fn(&str)` closure is a reporter:
///
/// ```rust
/// use wipi::Reporter;
///
/// let print = |msg: &str| println!("{msg}");
/// print.report("Waiting for IP Address...");
/// ```
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> Reporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Errors that can occur while driving the supplicant or the host tools.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The pre-shared key is shorter than the WPA minimum. Nothing was changed.
    #[error("pre-shared key too short: {len} characters, at least 8 required")]
    WeakCredential { len: usize },

    /// The SSID or passphrase cannot be used by the supplicant. Nothing was changed.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Adding the network entry or setting one of its fields failed.
    #[error("failed to write network credentials: {0}")]
    CredentialWrite(String),

    /// `reconfigure` or `reassociate` did not answer `OK`.
    #[error("reassociation failed: {0}")]
    Reassociation(String),

    /// No address was acquired within the polling budget.
    #[error("no IP address after {attempts} attempts")]
    AddressTimeout { attempts: u32 },

    /// Restoring the previous network did not bring the link back.
    #[error("rollback to previous network failed: {0}")]
    RollbackFailed(Box<ConnectionError>),

    /// No disabled entry was found to roll back to.
    #[error("no backup network configuration exists")]
    NoBackup,

    /// Triggering a scan or reading its results failed.
    #[error("scan failed: {0}")]
    ScanFailed(Box<ConnectionError>),

    /// The reachability probe could not be run. Callers of
    /// [`Wipi::check_internet_reachability`](crate::Wipi::check_internet_reachability)
    /// see this as unreachable.
    #[error("reachability probe failed: {0}")]
    ProbeFailed(String),

    /// The control client answered `FAIL` (or something else unexpected).
    #[error("`{cmd}` rejected: {reply}")]
    CommandRejected { cmd: String, reply: String },

    /// A host command exited unsuccessfully.
    #[error("`{cmd}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A host command did not finish in time.
    #[error("`{cmd}` timed out after {after:?}")]
    CommandTimeout { cmd: String, after: Duration },

    /// Command output did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Spawning a command failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

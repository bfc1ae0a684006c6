//! Adapters over the external programs wipi drives.
//!
//! Two seams are exposed as traits so the engine can be exercised without
//! a radio:
//!
//! - [`ControlClient`] speaks to the supplicant's credential store and
//!   association logic (`wpa_cli` in production).
//! - [`HostProbe`] reads link state and addresses from the host
//!   (`iwconfig`, `hostname`, `ip`, `ping`).
//!
//! Raw text is returned where the output is a table; the core modules own
//! the parsing.

use async_trait::async_trait;

use crate::Result;
use crate::api::models::CommandReply;

pub(crate) mod command;
mod host;
mod wpa_cli;

pub use host::SystemHost;
pub use wpa_cli::WpaCli;

/// Command surface of the supplicant.
///
/// Status commands return `Ok(CommandReply::Fail(..))` when the supplicant
/// answered but refused, and `Err` when it could not be reached at all.
#[async_trait]
pub trait ControlClient: Send + Sync {
    /// Raw `list_networks` table.
    async fn list_networks(&self) -> Result<String>;

    /// Allocates a new, empty network entry and returns its id.
    async fn add_network(&self) -> Result<u32>;

    /// Sets `field` of entry `id`. String values must already carry their quotes.
    async fn set_network(&self, id: u32, field: &str, value: &str) -> Result<CommandReply>;

    /// Enables entry `id` and disables every other entry.
    async fn select_network(&self, id: u32) -> Result<CommandReply>;

    async fn remove_network(&self, id: u32) -> Result<CommandReply>;

    /// Persists the in-memory store to the configuration file.
    async fn save_config(&self) -> Result<CommandReply>;

    /// Reloads the configuration file.
    async fn reconfigure(&self) -> Result<CommandReply>;

    /// Forces a new association attempt.
    async fn reassociate(&self) -> Result<CommandReply>;

    /// Starts a scan. Results become available some time later.
    async fn scan(&self) -> Result<CommandReply>;

    /// Raw `scan_results` table.
    async fn scan_results(&self) -> Result<String>;
}

/// Read-only view of the host network state.
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Wireless extension report for `interface`.
    async fn iwconfig(&self, interface: &str) -> Result<String>;

    /// Every address assigned to the host, space separated.
    async fn ip_addresses(&self) -> Result<String>;

    async fn hostname(&self) -> Result<String>;

    /// Address report for `interface`, including the hardware address.
    async fn link_show(&self, interface: &str) -> Result<String>;

    /// Link statistics for `interface`, including byte counters.
    async fn link_stats(&self, interface: &str) -> Result<String>;

    /// Sends a single echo request; `Ok(false)` when no reply came back and
    /// [`ConnectionError::ProbeFailed`](crate::ConnectionError::ProbeFailed)
    /// when the probe could not be run.
    async fn ping(&self, target: &str) -> Result<bool>;
}

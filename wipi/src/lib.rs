//! A Rust library for managing Wi-Fi on headless Linux devices via wpa_supplicant.
//!
//! This crate provides an async API for the operations a headless device
//! (typically a Raspberry Pi) needs to join and keep a wireless network:
//!
//! - Reading the association status, addresses and signal of the interface
//! - Scanning for access points, deduplicated per SSID
//! - Switching to a new WPA-PSK network, with automatic rollback to the
//!   previous network when the new one never yields an address
//! - Clearing saved networks and reading traffic counters
//!
//! # Example
//!
//! ```no_run
//! use wipi::{Wipi, WipiConfig};
//!
//! # async fn example() -> wipi::Result<()> {
//! let wipi = Wipi::new(WipiConfig::default());
//!
//! // Scan for access points
//! for hub in wipi.refresh_all().await? {
//!     println!("{} ({} dBm, {})", hub.ssid, hub.signal_level, hub.security);
//! }
//!
//! // Switch networks; progress goes to the closure
//! let report = wipi
//!     .connect("MyNetwork", "password123", &|msg: &str| println!("{msg}"))
//!     .await?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Operations return `Result<T, ConnectionError>`. Connection changes are the
//! exception to the usual shape: a change that fails and is rolled back is a
//! normal outcome, reported through [`ConnectOutcome`] rather than as an
//! error. Only credentials rejected up front (a passphrase shorter than
//! 8 characters, an oversized SSID) are returned as `Err`.
//!
//! # Polling
//!
//! wpa_supplicant offers no event for "DHCP lease acquired", so after a
//! reassociation the host address list is polled every 6 seconds, up to
//! 5 times. Scans wait 2 seconds between the trigger and reading results.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:
//!
//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod control;
pub mod monitoring;

// Re-exported public API
pub use api::config::WipiConfig;
pub use api::models::{
    CommandReply, ConnectOutcome, ConnectReport, ConnectState, ConnectionError, EntryStatus,
    HubRecord, InterfaceStatus, NetworkEntry, NetworkFlags, Reporter, ScanReport, Security,
    Traffic,
};
pub use api::wipi::Wipi;
pub use control::{ControlClient, HostProbe, SystemHost, WpaCli};
pub use monitoring::WipiEvent;

/// A specialized `Result` type for wipi operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;

//! Change tracking for status, hub list and internet reachability.
//!
//! Changes are published as [`WipiEvent`]s on a broadcast channel obtained
//! from [`Wipi::subscribe`](crate::Wipi::subscribe).

pub(crate) mod events;
pub(crate) mod reachability;

pub use events::WipiEvent;

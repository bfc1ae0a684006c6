use std::collections::BTreeSet;

use crate::api::models::{HubRecord, InterfaceStatus};

/// Change notifications published by [`Wipi`](crate::Wipi).
///
/// Each variant is sent only when the observed state actually changed, never
/// on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WipiEvent {
    /// The link identity changed (association, SSID, BSSID or address).
    StatusChanged(InterfaceStatus),
    /// The set of visible SSIDs changed. Carries the new hub list.
    HubListChanged(Vec<HubRecord>),
    /// Internet reachability flipped.
    ReachabilityChanged(bool),
}

/// Returns `true` when the two hub lists cover different SSID sets.
///
/// Ordering and signal levels are ignored.
pub(crate) fn hub_set_changed(old: &[HubRecord], new: &[HubRecord]) -> bool {
    ssid_set(old) != ssid_set(new)
}

fn ssid_set(hubs: &[HubRecord]) -> BTreeSet<&str> {
    hubs.iter().map(|h| h.ssid.as_str()).collect()
}

//! Internet reachability probing.

use log::{info, warn};

use crate::control::HostProbe;

/// Sends one probe to `target`.
///
/// A probe that cannot be run counts as unreachable.
pub(crate) async fn probe(host: &dyn HostProbe, target: &str) -> bool {
    match host.ping(target).await {
        Ok(reachable) => reachable,
        Err(e) => {
            warn!("Reachability probe to {target} failed: {e}");
            false
        }
    }
}

/// Remembers the last probe result and reports transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReachabilityTracker {
    last: Option<bool>,
}

impl ReachabilityTracker {
    pub(crate) fn last(&self) -> Option<bool> {
        self.last
    }

    /// Records `reachable` and returns `true` if it differs from the
    /// previous result. The first result always counts as a change.
    pub(crate) fn update(&mut self, reachable: bool, target: &str) -> bool {
        if self.last == Some(reachable) {
            return false;
        }
        self.last = Some(reachable);
        if reachable {
            info!("Internet connection OKAY to {target}");
        } else {
            warn!("Internet connection not reachable to {target}");
        }
        true
    }
}

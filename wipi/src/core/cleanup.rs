//! Credential store maintenance.

use log::{debug, info, warn};

use crate::Result;
use crate::api::models::{NetworkEntry, Reporter};
use crate::control::ControlClient;
use crate::util::parse::parse_network_list;

/// Reads and parses the current credential store.
pub(crate) async fn list_entries(client: &dyn ControlClient) -> Result<Vec<NetworkEntry>> {
    let raw = client.list_networks().await?;
    Ok(parse_network_list(&raw))
}

/// Removes every entry from the credential store.
///
/// The store is saved once at the end, and only when something was
/// removed. Returns the number of entries found.
pub(crate) async fn clear_all(client: &dyn ControlClient, reporter: &dyn Reporter) -> Result<usize> {
    let entries = list_entries(client).await?;

    for entry in &entries {
        let msg = format!("Removing network {} = {}", entry.id, entry.ssid);
        info!("{msg}");
        reporter.report(&msg);
        remove(client, entry).await;
    }

    if !entries.is_empty() {
        reporter.report("Saving changes to wpa_supplicant");
        save(client).await;
    }

    let msg = format!("Removed {} network(s).", entries.len());
    info!("{msg}");
    reporter.report(&msg);
    Ok(entries.len())
}

/// Removes every entry flagged `[DISABLED]`.
///
/// Run after a connection change settles, when the disabled entries are the
/// leftovers of earlier selections. Saves once if anything was removed.
pub(crate) async fn prune_disabled(client: &dyn ControlClient) -> Result<usize> {
    let disabled: Vec<NetworkEntry> = list_entries(client)
        .await?
        .into_iter()
        .filter(NetworkEntry::is_disabled)
        .collect();

    for entry in &disabled {
        remove(client, entry).await;
    }

    if disabled.is_empty() {
        debug!("No disabled networks to remove");
    } else {
        info!("Removed {} disabled network(s), saving", disabled.len());
        save(client).await;
    }
    Ok(disabled.len())
}

async fn remove(client: &dyn ControlClient, entry: &NetworkEntry) {
    match client.remove_network(entry.id).await {
        Ok(reply) if reply.is_ok() => debug!("Removed network {}", entry.id),
        Ok(reply) => warn!("remove_network {} answered {reply}", entry.id),
        Err(e) => warn!("remove_network {} failed: {e}", entry.id),
    }
}

async fn save(client: &dyn ControlClient) {
    match client.save_config().await {
        Ok(reply) if reply.is_ok() => {}
        Ok(reply) => warn!("save_config answered {reply}"),
        Err(e) => warn!("save_config failed: {e}"),
    }
}

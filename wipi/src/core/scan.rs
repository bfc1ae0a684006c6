//! Wi-Fi scanning and hub list aggregation.
//!
//! A scan cycle triggers the radio, waits for it to settle, then reads the
//! result table. Results are reported twice: a hub list with one record per
//! SSID (strongest signal wins) ordered by signal, and a detail list with
//! every record ordered by name.

use log::{debug, warn};
use std::collections::HashMap;

use crate::Result;
use crate::api::models::{ConnectionError, HubRecord, ScanReport};
use crate::control::ControlClient;
use crate::types::constants::timeouts;
use crate::util::parse::parse_scan_results;

/// Runs one scan cycle.
///
/// A scan request the supplicant refuses (for example `FAIL-BUSY` while a
/// scan is already running) is not fatal: the previous results are still
/// readable. Only an unreachable supplicant fails the cycle.
pub(crate) async fn scan_networks(client: &dyn ControlClient) -> Result<ScanReport> {
    let reply = client
        .scan()
        .await
        .map_err(|e| ConnectionError::ScanFailed(Box::new(e)))?;
    if !reply.is_ok() {
        warn!("Scan request answered {reply}, reading cached results");
    }

    tokio::time::sleep(timeouts::scan_settle()).await;

    let raw = client
        .scan_results()
        .await
        .map_err(|e| ConnectionError::ScanFailed(Box::new(e)))?;

    let report = build_report(parse_scan_results(&raw));
    debug!(
        "Scan found {} records, {} unique SSIDs",
        report.details.len(),
        report.hubs.len()
    );
    Ok(report)
}

/// Orders and deduplicates parsed scan records.
pub(crate) fn build_report(records: Vec<HubRecord>) -> ScanReport {
    let mut hubs = strongest_per_ssid(&records);
    hubs.sort_by(|a, b| b.signal_level.cmp(&a.signal_level));

    let mut details = records;
    details.sort_by_cached_key(|r| r.ssid.to_lowercase());

    ScanReport { hubs, details }
}

/// Keeps one record per SSID, the one with the highest signal.
///
/// The surviving record takes the position where its SSID was first seen,
/// so equal signals keep scan order after the stable sort.
fn strongest_per_ssid(records: &[HubRecord]) -> Vec<HubRecord> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut hubs: Vec<HubRecord> = Vec::new();

    for record in records {
        match index.get(record.ssid.as_str()) {
            Some(&slot) => {
                if record.signal_level > hubs[slot].signal_level {
                    hubs[slot] = record.clone();
                }
            }
            None => {
                index.insert(record.ssid.as_str(), hubs.len());
                hubs.push(record.clone());
            }
        }
    }

    hubs
}

//! Parsers for the text printed by `wpa_cli` and the host tools.
//!
//! Every parser is tolerant: lines that do not have the expected shape are
//! skipped instead of failing the whole read, because the tools mix headers,
//! warnings and data on stdout.

use log::debug;

use crate::api::models::{HubRecord, NetworkEntry, NetworkFlags, Security, Traffic};
use crate::types::constants::status_label;
use crate::{ConnectionError, Result};

/// Returns the text following `label`, up to (not including) `delim`.
///
/// Without a delimiter in the remaining text the value runs to the end.
pub(crate) fn value_after<'a>(text: &'a str, label: &str, delim: char) -> Option<&'a str> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let end = rest.find(delim).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Returns the first line of `text`, trimmed.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

/// Parses `list_networks` output into credential store entries.
///
/// Rows are tab separated: `id / ssid / bssid / flags`. The header and any
/// row without a numeric id are skipped; the flags column may be absent.
pub(crate) fn parse_network_list(text: &str) -> Vec<NetworkEntry> {
    text.lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let id = cols.next()?.trim().parse::<u32>().ok()?;
            let ssid = cols.next().unwrap_or_default().to_string();
            let bssid = cols.next().unwrap_or_default().trim().to_string();
            let flags = NetworkFlags::from_field(cols.next().unwrap_or_default());
            Some(NetworkEntry {
                id,
                ssid,
                bssid,
                flags,
            })
        })
        .collect()
}

/// Parses `scan_results` output into hub records.
///
/// Rows are tab separated: `bssid / frequency / signal level / flags / ssid`.
/// Only lines containing a `:` (the BSSID) are considered, and rows with a
/// non-numeric signal are dropped.
pub(crate) fn parse_scan_results(text: &str) -> Vec<HubRecord> {
    text.lines()
        .filter(|line| line.contains(':'))
        .filter_map(|line| {
            let cols: Vec<&str> = line.splitn(5, '\t').collect();
            if cols.len() < 5 {
                debug!("Skipping short scan row: {line:?}");
                return None;
            }
            let signal_level = match cols[2].trim().parse::<i32>() {
                Ok(level) => level,
                Err(_) => {
                    debug!("Skipping scan row with bad signal: {line:?}");
                    return None;
                }
            };
            Some(HubRecord {
                ssid: cols[4].to_string(),
                bssid: cols[0].trim().to_string(),
                frequency: cols[1].trim().parse().unwrap_or(0),
                signal_level,
                security: Security::from_flags(cols[3]),
            })
        })
        .collect()
}

/// Link fields extracted from `iwconfig` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LinkInfo {
    pub associated: bool,
    pub ssid: String,
    pub bssid: String,
    pub link_quality: String,
    pub signal_level: String,
}

/// Parses `iwconfig <iface>` output.
///
/// `Not-Associated` or `Ad-Hoc` anywhere in the output means there is no
/// infrastructure link, and every other field is left empty.
pub(crate) fn parse_iwconfig(text: &str) -> LinkInfo {
    if text.contains(status_label::NOT_ASSOCIATED) || text.contains(status_label::AD_HOC) {
        return LinkInfo::default();
    }

    let field = |label: &str, delim: char| {
        value_after(text, label, delim)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    LinkInfo {
        associated: true,
        ssid: field(status_label::ESSID, '"'),
        bssid: field(status_label::ACCESS_POINT, '\n'),
        link_quality: field(status_label::LINK_QUALITY, ' '),
        signal_level: field(status_label::SIGNAL_LEVEL, ' '),
    }
}

/// Extracts the hardware address from `ip addr show <iface>` output.
pub(crate) fn parse_mac(text: &str) -> Option<String> {
    value_after(text, status_label::LINK_ETHER, ' ')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses byte counters from `ip -s link show <iface>` output.
///
/// The byte count is the first token of the line following each
/// `RX:`/`TX:` header.
pub(crate) fn parse_traffic(text: &str) -> Result<Traffic> {
    Ok(Traffic {
        rx_bytes: counter_after(text, status_label::RX_HEADER)?,
        tx_bytes: counter_after(text, status_label::TX_HEADER)?,
    })
}

fn counter_after(text: &str, header: &str) -> Result<u64> {
    let mut lines = text.lines();
    lines
        .by_ref()
        .find(|line| line.trim_start().starts_with(header))
        .ok_or_else(|| ConnectionError::Parse(format!("missing {header} header")))?;

    let token = lines
        .next()
        .and_then(|line| line.split_whitespace().next())
        .ok_or_else(|| ConnectionError::Parse(format!("missing counters after {header}")))?;

    token
        .parse::<u64>()
        .map_err(|e| ConnectionError::Parse(format!("bad {header} byte count {token:?}: {e}")))
}

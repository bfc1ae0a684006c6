//! Interface status snapshot.

use log::{debug, warn};

use crate::Result;
use crate::api::models::InterfaceStatus;
use crate::control::HostProbe;
use crate::util::parse::{first_line, parse_iwconfig, parse_mac, LinkInfo};

/// Reads a full status snapshot for `interface`.
///
/// Never fails: an unreadable link report counts as not associated, and the
/// address fields are left empty when their tools fail. Reachability is not
/// probed here and is left as `None`.
pub(crate) async fn read_status(host: &dyn HostProbe, interface: &str) -> InterfaceStatus {
    let link = match host.iwconfig(interface).await {
        Ok(out) => parse_iwconfig(&out),
        Err(e) => {
            warn!("Treating {interface} as not associated: {e}");
            LinkInfo::default()
        }
    };
    if !link.associated {
        debug!("802.11x not associated");
    }

    let (ip, name, link_show) = futures::join!(
        host.ip_addresses(),
        host.hostname(),
        host.link_show(interface)
    );

    InterfaceStatus {
        associated: link.associated,
        link_quality: link.link_quality,
        signal_level: link.signal_level,
        connected_ssid: link.ssid,
        connected_bssid: link.bssid,
        ip_address: best_effort("address list", ip, |out| first_line(out).to_string()),
        host_name: best_effort("host name", name, |out| first_line(out).to_string()),
        mac_address: best_effort("hardware address", link_show, |out| {
            parse_mac(out).unwrap_or_default()
        }),
        internet_reachable: None,
    }
}

fn best_effort(what: &str, result: Result<String>, f: impl FnOnce(&str) -> String) -> String {
    match result {
        Ok(out) => f(&out),
        Err(e) => {
            debug!("Could not read {what}: {e}");
            String::new()
        }
    }
}

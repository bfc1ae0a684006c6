//! Interface byte counters.

use log::debug;

use crate::Result;
use crate::api::models::Traffic;
use crate::control::HostProbe;
use crate::util::parse::parse_traffic;

/// Reads received and transmitted byte counts for `interface`.
pub(crate) async fn read_traffic(host: &dyn HostProbe, interface: &str) -> Result<Traffic> {
    let raw = host.link_stats(interface).await?;
    let traffic = parse_traffic(&raw)?;
    debug!(
        "{interface}: RX bytes = {} TX bytes = {}",
        traffic.rx_bytes, traffic.tx_bytes
    );
    Ok(traffic)
}

//! Address acquisition polling.
//!
//! After a reassociation the DHCP client needs a few seconds to lease an
//! address. There is no event to wait on, so the host address list is
//! polled on a fixed interval with a bounded number of attempts.

use log::debug;

use crate::api::models::{ConnectionError, Reporter};
use crate::control::HostProbe;
use crate::types::constants::{retries, timeouts};
use crate::util::parse::first_line;
use crate::Result;

/// Waits for the host to hold an address.
///
/// Each attempt sleeps for the poll interval before looking, so the first
/// check happens one interval after the call. A failed read counts as no
/// address. Returns the first non-empty address line, or
/// [`ConnectionError::AddressTimeout`] once every attempt is spent.
pub(crate) async fn wait_for_address(
    host: &dyn HostProbe,
    reporter: &dyn Reporter,
) -> Result<String> {
    let attempts = retries::ADDRESS_POLL_ATTEMPTS;

    for attempt in 1..=attempts {
        tokio::time::sleep(timeouts::address_poll_interval()).await;

        let address = match host.ip_addresses().await {
            Ok(out) => first_line(&out).to_string(),
            Err(e) => {
                debug!("Address read failed on attempt {attempt}: {e}");
                String::new()
            }
        };
        debug!("Attempt {attempt}/{attempts}: address {address:?}");

        if !address.is_empty() {
            return Ok(address);
        }

        let remaining = u64::from(attempts - attempt);
        if remaining > 0 {
            reporter.report(&format!(
                "{} seconds until IP timeout.",
                remaining * timeouts::ADDRESS_POLL_INTERVAL_SECS
            ));
        }
    }

    Err(ConnectionError::AddressTimeout { attempts })
}

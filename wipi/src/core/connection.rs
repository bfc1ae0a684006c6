//! Rollback-safe network switching.
//!
//! A connection change writes a new entry into the credential store,
//! selects it, and waits for an address. If the new network never comes up
//! the previously working entry is restored, so a headless device cannot be
//! stranded by a typo in a passphrase.
//!
//! ```text
//! Idle -> CredentialWrite -> Reassociating -> AwaitingAddress -> Connected
//!              |                   |                |
//!              v                   +-------+--------+
//!           Aborted                        |
//!                                          v
//!                                     RollingBack -> RolledBack
//!                                          |
//!                                          +------> RollbackFailed
//! ```

use log::{debug, info, warn};

use crate::Result;
use crate::api::models::{
    CommandReply, ConnectOutcome, ConnectReport, ConnectState, ConnectionError, NetworkEntry,
    NetworkFlags, Reporter,
};
use crate::control::{ControlClient, HostProbe};
use crate::core::cleanup::{list_entries, prune_disabled};
use crate::core::credentials::{derive_psk, quote, validate};
use crate::core::state_wait::wait_for_address;

/// Drives one connection change from validation to a terminal state.
pub(crate) struct ConnectionManager<'a> {
    client: &'a dyn ControlClient,
    host: &'a dyn HostProbe,
    reporter: &'a dyn Reporter,
    states: Vec<ConnectState>,
}

impl<'a> ConnectionManager<'a> {
    pub(crate) fn new(
        client: &'a dyn ControlClient,
        host: &'a dyn HostProbe,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            client,
            host,
            reporter,
            states: vec![ConnectState::Idle],
        }
    }

    /// Switches to `ssid` using `passphrase`.
    ///
    /// Only invalid credentials are returned as `Err`, and in that case the
    /// store has not been touched. Every other failure ends in a terminal
    /// state described by the report's outcome.
    pub(crate) async fn connect(mut self, ssid: &str, passphrase: &str) -> Result<ConnectReport> {
        if let Err(e) = validate(ssid, passphrase) {
            warn!("Refusing to connect to {ssid:?}: {e}");
            self.say(&format!("ERROR {e}"));
            return Err(e);
        }

        let prior_current_id = self.current_entry_id().await;

        self.enter(ConnectState::CredentialWrite);
        let network_id = match self.write_entry(ssid, passphrase).await {
            Ok(id) => id,
            Err((id, e)) => {
                self.enter(ConnectState::Aborted);
                self.say(&format!("Failed to write network settings: {e}"));
                return Ok(self.finish(ssid, id, prior_current_id, ConnectOutcome::Aborted(e)));
            }
        };

        let outcome = match self.verify(false).await {
            Ok(address) => {
                self.enter(ConnectState::Connected);
                self.say(&format!("Received IP ==>{address}<=="));
                self.say("New 802.11x connection established!");
                self.prune().await;
                ConnectOutcome::Connected { address }
            }
            Err(cause) => self.rollback(network_id, cause).await,
        };

        Ok(self.finish(ssid, Some(network_id), prior_current_id, outcome))
    }

    /// Adds the entry for `ssid`, then selects and persists it.
    ///
    /// On failure the id of a partially written entry is returned with the
    /// error; it is left in place.
    async fn write_entry(
        &mut self,
        ssid: &str,
        passphrase: &str,
    ) -> std::result::Result<u32, (Option<u32>, ConnectionError)> {
        let id = self
            .client
            .add_network()
            .await
            .map_err(|e| (None, ConnectionError::CredentialWrite(e.to_string())))?;
        debug!("Allocated network entry {id} for {ssid:?}");

        let psk = derive_psk(ssid, passphrase);
        for (field, value) in [("ssid", quote(ssid)), ("psk", psk)] {
            match self.client.set_network(id, field, &value).await {
                Ok(CommandReply::Ok) => {}
                Ok(CommandReply::Fail(text)) => {
                    return Err((
                        Some(id),
                        ConnectionError::CredentialWrite(format!("set_network {field}: {text}")),
                    ));
                }
                Err(e) => {
                    return Err((
                        Some(id),
                        ConnectionError::CredentialWrite(format!("set_network {field}: {e}")),
                    ));
                }
            }
        }

        self.select_and_save(id).await;
        Ok(id)
    }

    /// Reconfigures, reassociates and waits for an address.
    async fn verify(&mut self, rolling_back: bool) -> Result<String> {
        self.say("Verifying 802.11x settings…");

        self.enter_unless(rolling_back, ConnectState::Reassociating);
        self.expect_ok("reconfigure", self.client.reconfigure().await, rolling_back)?;
        self.expect_ok("reassociate", self.client.reassociate().await, rolling_back)?;

        self.enter_unless(rolling_back, ConnectState::AwaitingAddress);
        self.say("Waiting for IP Address...");
        let address = wait_for_address(self.host, self.reporter).await;
        if address.is_err() {
            self.say("Error getting IP address");
        }
        address
    }

    /// Restores the first disabled entry that is not the one just written.
    async fn rollback(&mut self, new_id: u32, cause: ConnectionError) -> ConnectOutcome {
        warn!("Connection attempt failed: {cause}");
        self.enter(ConnectState::RollingBack);

        let backup = match list_entries(self.client).await {
            Ok(entries) => find_backup(&entries, new_id),
            Err(e) => {
                self.enter(ConnectState::RollbackFailed);
                self.say(&format!("Unable to read network list: {e}"));
                return ConnectOutcome::RollbackFailed {
                    cause,
                    rollback: ConnectionError::RollbackFailed(Box::new(e)),
                };
            }
        };

        let Some(backup) = backup else {
            self.enter(ConnectState::RollbackFailed);
            self.say("No 802.11x backup exist");
            return ConnectOutcome::NoBackup { cause };
        };

        info!("Found backup network, activating network number = {backup}");
        self.select_and_save(backup).await;
        self.say("Backup network configuration found and selected.");

        match self.verify(true).await {
            Ok(address) => {
                self.enter(ConnectState::RolledBack);
                self.say(&format!("Received IP ==>{address}<=="));
                self.say("Rollback to previous 802.11x config successful.");
                self.say("Failed to connect to new 802.11x network.");
                self.prune().await;
                ConnectOutcome::RolledBack { address, cause }
            }
            Err(rollback) => {
                self.enter(ConnectState::RollbackFailed);
                self.say("Rolling Back to previous 802.11 config Failed!");
                ConnectOutcome::RollbackFailed {
                    cause,
                    rollback: ConnectionError::RollbackFailed(Box::new(rollback)),
                }
            }
        }
    }

    async fn select_and_save(&self, id: u32) {
        for (cmd, result) in [
            ("select_network", self.client.select_network(id).await),
            ("save_config", self.client.save_config().await),
        ] {
            match result {
                Ok(reply) if reply.is_ok() => debug!("{cmd} {id}: {reply}"),
                Ok(reply) => warn!("{cmd} {id} answered {reply}"),
                Err(e) => warn!("{cmd} {id} failed: {e}"),
            }
        }
    }

    fn expect_ok(
        &self,
        cmd: &str,
        result: Result<CommandReply>,
        rolling_back: bool,
    ) -> Result<()> {
        let reply = result.map_err(|e| ConnectionError::Reassociation(format!("{cmd}: {e}")))?;
        if !rolling_back {
            self.say(&format!("802.11x {cmd} result = {reply}"));
        }
        match reply {
            CommandReply::Ok => Ok(()),
            CommandReply::Fail(text) => Err(ConnectionError::Reassociation(format!("{cmd}: {text}"))),
        }
    }

    async fn current_entry_id(&self) -> Option<u32> {
        match list_entries(self.client).await {
            Ok(entries) => entries
                .iter()
                .find(|e| e.flags.contains(NetworkFlags::CURRENT))
                .map(|e| e.id),
            Err(e) => {
                warn!("Could not read network list before connecting: {e}");
                None
            }
        }
    }

    async fn prune(&self) {
        if let Err(e) = prune_disabled(self.client).await {
            warn!("Failed to remove disabled networks: {e}");
        }
    }

    fn enter(&mut self, state: ConnectState) {
        info!("Connection state: {state}");
        self.states.push(state);
    }

    /// The reduced rollback cycle does not revisit the forward states.
    fn enter_unless(&mut self, rolling_back: bool, state: ConnectState) {
        if !rolling_back {
            self.enter(state);
        }
    }

    fn say(&self, message: &str) {
        info!("{message}");
        self.reporter.report(message);
    }

    fn finish(
        self,
        ssid: &str,
        network_id: Option<u32>,
        prior_current_id: Option<u32>,
        outcome: ConnectOutcome,
    ) -> ConnectReport {
        debug_assert!(
            self.states.last().is_some_and(ConnectState::is_terminal),
            "connection change ended in a non-terminal state"
        );
        info!("Connection change to {ssid:?} finished: {outcome}");
        ConnectReport {
            ssid: ssid.to_string(),
            network_id,
            prior_current_id,
            states: self.states,
            outcome,
        }
    }
}

/// First `[DISABLED]` entry in store order, skipping `new_id`.
fn find_backup(entries: &[NetworkEntry], new_id: u32) -> Option<u32> {
    entries
        .iter()
        .find(|e| e.is_disabled() && e.id != new_id)
        .map(|e| e.id)
}

//! Connection change scenarios: success, rollback and the failure paths.

mod common;

use common::{FakeHost, FakeSupplicant, Journal, Messages, facade};
use std::time::Duration;
use tokio::time::Instant;
use wipi::{ConnectOutcome, ConnectState, ConnectionError};

const HOME_PSK: &str = "correct horse battery";

#[tokio::test(start_paused = true)]
async fn address_on_third_attempt_connects_without_rollback() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[("home", "[CURRENT]")]);
    let host = FakeHost::new(&journal).with_addresses(&["", "", "192.168.1.50"], "192.168.1.50");
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();

    let start = Instant::now();
    let report = wipi
        .connect("office", HOME_PSK, &messages.reporter())
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(18));
    assert!(matches!(
        report.outcome,
        ConnectOutcome::Connected { ref address } if address == "192.168.1.50"
    ));
    assert_eq!(
        report.states,
        [
            ConnectState::Idle,
            ConnectState::CredentialWrite,
            ConnectState::Reassociating,
            ConnectState::AwaitingAddress,
            ConnectState::Connected,
        ]
    );
    assert!(!report.passed_through(ConnectState::RollingBack));
    assert_eq!(report.network_id, Some(1));
    assert_eq!(report.prior_current_id, Some(0));

    assert!(messages.contains("24 seconds until IP timeout."));
    assert!(messages.contains("18 seconds until IP timeout."));
    assert!(!messages.contains("12 seconds until IP timeout."));
    assert!(messages.contains("New 802.11x connection established!"));

    // The old entry was disabled by the selection and then pruned.
    let networks = supplicant.networks();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].ssid, "office");
    assert_eq!(networks[0].flags, "[CURRENT]");
}

#[tokio::test(start_paused = true)]
async fn credentials_written_in_order_with_derived_key() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal);
    let host = FakeHost::new(&journal).with_addresses(&["10.0.0.2"], "10.0.0.2");
    let wipi = facade(&supplicant, &host);

    wipi.connect("IEEE", "password", &|_: &str| {}).await.unwrap();

    let reads = ["list_networks", "hostname", "ip ", "iwconfig", "scan"];
    let entries = journal.entries();
    let writes: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|e| !reads.iter().any(|r| e.starts_with(r)))
        .collect();
    assert_eq!(
        writes,
        [
            "add_network",
            "set_network 0 ssid \"IEEE\"",
            "set_network 0 psk f42c6fc52df0ebef9ebb4b90b38a5f902e83fe1b135a70e23aed762e9710a12e",
            "select_network 0",
            "save_config",
            "reconfigure",
            "reassociate",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn weak_psk_touches_nothing() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[("home", "[CURRENT]")]);
    let host = FakeHost::new(&journal);
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();

    let err = wipi
        .connect("office", "short", &messages.reporter())
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectionError::WeakCredential { len: 5 }));
    assert!(journal.entries().is_empty());
    assert_eq!(supplicant.networks().len(), 1);
    assert_eq!(messages.all().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reassociate_failure_rolls_back_without_polling() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal)
        .with_networks(&[("home", "[CURRENT]")])
        .reply("reassociate", &["FAIL"]);
    let host = FakeHost::new(&journal).with_addresses(&[], "192.168.1.7");
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();

    let report = wipi
        .connect("office", HOME_PSK, &messages.reporter())
        .await
        .unwrap();

    assert!(!report.passed_through(ConnectState::AwaitingAddress));
    assert_eq!(
        &report.states[report.states.len() - 2..],
        [ConnectState::RollingBack, ConnectState::RolledBack]
    );
    match &report.outcome {
        ConnectOutcome::RolledBack { address, cause } => {
            assert_eq!(address, "192.168.1.7");
            assert!(matches!(cause, ConnectionError::Reassociation(_)));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Nothing polled the address between the refused reassociate and the
    // rollback looking for a backup.
    let entries = journal.entries();
    let refused = entries.iter().position(|e| e == "reassociate").unwrap();
    assert_eq!(entries[refused + 1], "list_networks");

    assert!(messages.contains("Rollback to previous 802.11x config successful."));
    assert!(messages.contains("Failed to connect to new 802.11x network."));

    // The failed entry is pruned; the restored one is current again.
    let networks = supplicant.networks();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].ssid, "home");
    assert_eq!(networks[0].flags, "[CURRENT]");
}

#[tokio::test(start_paused = true)]
async fn address_timeout_rolls_back_to_first_disabled_entry() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[
        ("home", "[CURRENT]"),
        ("old", "[DISABLED]"),
    ]);
    // Five empty reads for the new network, then the restored one leases.
    let host = FakeHost::new(&journal)
        .with_addresses(&["", "", "", "", "", "", "192.168.1.7"], "192.168.1.7");
    let wipi = facade(&supplicant, &host);

    let start = Instant::now();
    let report = wipi
        .connect("office", HOME_PSK, &|_: &str| {})
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(42));
    match &report.outcome {
        ConnectOutcome::RolledBack { cause, .. } => {
            assert!(matches!(cause, ConnectionError::AddressTimeout { attempts: 5 }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // "home" (id 0) is the first disabled entry after the new one was selected.
    assert!(journal.entries().contains(&"select_network 0".to_string()));
    assert_eq!(report.final_state(), ConnectState::RolledBack);
}

#[tokio::test(start_paused = true)]
async fn rollback_without_address_fails() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[("home", "[CURRENT]")]);
    let host = FakeHost::new(&journal).with_addresses(&[], "");
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();

    let start = Instant::now();
    let report = wipi
        .connect("office", HOME_PSK, &messages.reporter())
        .await
        .unwrap();

    // Two full polling cycles, one for each network.
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(report.final_state(), ConnectState::RollbackFailed);
    match &report.outcome {
        ConnectOutcome::RollbackFailed {
            cause: ConnectionError::AddressTimeout { .. },
            rollback: ConnectionError::RollbackFailed(inner),
        } => assert!(matches!(**inner, ConnectionError::AddressTimeout { .. })),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(messages.contains("Rolling Back to previous 802.11 config Failed!"));

    // No cleanup after a failed rollback: both entries are still stored.
    assert_eq!(supplicant.networks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn no_backup_reports_and_stops() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).reply("reconfigure", &["FAIL"]);
    let host = FakeHost::new(&journal);
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();

    let report = wipi
        .connect("office", HOME_PSK, &messages.reporter())
        .await
        .unwrap();

    assert_eq!(report.final_state(), ConnectState::RollbackFailed);
    assert!(report.final_state().is_terminal());
    assert_eq!(report.prior_current_id, None);
    assert!(matches!(
        report.outcome.into_result(),
        Err(ConnectionError::NoBackup)
    ));
    assert!(messages.contains("No 802.11x backup exist"));
    assert_eq!(journal.count("reconfigure"), 1);
    assert_eq!(journal.count("select_network"), 1);
}

#[tokio::test(start_paused = true)]
async fn credential_write_failure_aborts_before_selecting() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal)
        .with_networks(&[("home", "[CURRENT]")])
        .reply("set_network psk", &["FAIL"]);
    let host = FakeHost::new(&journal);
    let wipi = facade(&supplicant, &host);

    let report = wipi
        .connect("office", HOME_PSK, &|_: &str| {})
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        ConnectOutcome::Aborted(ConnectionError::CredentialWrite(_))
    ));
    assert_eq!(report.final_state(), ConnectState::Aborted);
    assert!(report.final_state().is_terminal());
    assert!(report.passed_through(ConnectState::CredentialWrite));
    assert!(!report.passed_through(ConnectState::Reassociating));
    assert_eq!(report.network_id, Some(1));
    assert_eq!(journal.count("select_network"), 0);
    assert_eq!(journal.count("reconfigure"), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_supplicant_aborts_connect() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).unreachable("add_network");
    let host = FakeHost::new(&journal);
    let wipi = facade(&supplicant, &host);

    let report = wipi
        .connect("office", HOME_PSK, &|_: &str| {})
        .await
        .unwrap();

    assert!(matches!(report.outcome, ConnectOutcome::Aborted(_)));
    assert_eq!(report.final_state(), ConnectState::Aborted);
    assert_eq!(report.network_id, None);
}

fn positions(entries: &[String], entry: &str) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.as_str() == entry)
        .map(|(i, _)| i)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn concurrent_connects_run_one_after_the_other() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[("home", "[CURRENT]")]);
    let host = FakeHost::new(&journal).with_addresses(&[], "192.168.1.50");
    let wipi = facade(&supplicant, &host);

    let (first, second) = tokio::join!(
        wipi.connect("one", HOME_PSK, &|_: &str| {}),
        wipi.connect("two", HOME_PSK, &|_: &str| {}),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first.outcome.is_connected());
    assert!(second.outcome.is_connected());

    let entries = journal.entries();
    let adds = positions(&entries, "add_network");
    let reassociations = positions(&entries, "reassociate");
    assert_eq!(adds.len(), 2);
    assert_eq!(reassociations.len(), 2);

    // The second change starts only after the first has reassociated and
    // pruned the entry it replaced.
    let first_prune = positions(&entries, "remove_network 0");
    assert_eq!(first_prune.len(), 1);
    assert!(adds[1] > reassociations[0]);
    assert!(adds[1] > first_prune[0]);

    let networks = supplicant.networks();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].ssid, "two");
    assert_eq!(networks[0].flags, "[CURRENT]");
}

#[tokio::test(start_paused = true)]
async fn clear_waits_for_running_connect() {
    let journal = Journal::default();
    let supplicant = FakeSupplicant::new(&journal).with_networks(&[("home", "[CURRENT]")]);
    let host = FakeHost::new(&journal).with_addresses(&[], "192.168.1.50");
    let wipi = facade(&supplicant, &host);
    let messages = Messages::default();
    let reporter = messages.reporter();

    let (report, removed) = tokio::join!(
        wipi.connect("office", HOME_PSK, &|_: &str| {}),
        wipi.clear_all_connections(&reporter),
    );
    assert!(report.unwrap().outcome.is_connected());

    // Clearing saw the store as the finished change left it: only the new
    // entry, with the old one already pruned.
    assert_eq!(removed.unwrap(), 1);
    assert!(messages.contains("Removing network 1 = office"));
    assert!(!messages.contains("Removing network 0 = home"));
    assert!(supplicant.networks().is_empty());

    let entries = journal.entries();
    let reassociate = positions(&entries, "reassociate");
    let clear_removal = positions(&entries, "remove_network 1");
    assert_eq!(clear_removal.len(), 1);
    assert!(clear_removal[0] > reassociate[0]);
}

//! WPA-Personal credential checks and key derivation.
//!
//! The supplicant is handed the derived 256-bit key rather than the
//! passphrase, the same value `wpa_passphrase` prints:
//! `PBKDF2(HMAC-SHA1, passphrase, ssid, 4096, 256)`.

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

use crate::types::constants::credential;
use crate::{ConnectionError, Result};

/// Checks that `ssid` and `passphrase` can be written to the store.
///
/// A short passphrase is reported as [`ConnectionError::WeakCredential`];
/// every other problem as [`ConnectionError::InvalidCredential`].
pub(crate) fn validate(ssid: &str, passphrase: &str) -> Result<()> {
    let len = passphrase.chars().count();
    if len < credential::MIN_PSK_LEN {
        return Err(ConnectionError::WeakCredential { len });
    }
    if len > credential::MAX_PSK_LEN {
        return Err(ConnectionError::InvalidCredential(format!(
            "passphrase is {len} characters, at most {} allowed",
            credential::MAX_PSK_LEN
        )));
    }
    if !passphrase.chars().all(|c| (' '..='~').contains(&c)) {
        return Err(ConnectionError::InvalidCredential(
            "passphrase must be printable ASCII".into(),
        ));
    }

    if ssid.is_empty() {
        return Err(ConnectionError::InvalidCredential("SSID is empty".into()));
    }
    if ssid.len() > credential::MAX_SSID_BYTES {
        return Err(ConnectionError::InvalidCredential(format!(
            "SSID is {} bytes, at most {} allowed",
            ssid.len(),
            credential::MAX_SSID_BYTES
        )));
    }
    if ssid.chars().any(char::is_control) {
        return Err(ConnectionError::InvalidCredential(
            "SSID contains control characters".into(),
        ));
    }

    Ok(())
}

/// Derives the 64 hex digit pre-shared key for `ssid`.
pub(crate) fn derive_psk(ssid: &str, passphrase: &str) -> String {
    let mut key = [0u8; credential::PSK_BYTES];
    pbkdf2_hmac::<Sha1>(
        passphrase.as_bytes(),
        ssid.as_bytes(),
        credential::PBKDF2_ROUNDS,
        &mut key,
    );
    key.iter().map(|b| format!("{b:02x}")).collect()
}

/// Wraps an SSID in the double quotes the supplicant expects for string fields.
pub(crate) fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

//! OS keyring bootstrap for the store encryption key.
//!
//! Keeps the 32-byte [`StoreKey`] in the operating system's credential
//! store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The vault engine itself never derives this key; it is generated once
//! at enrollment and handed to [`crate::store::SealedFileStore`] on
//! every open.  If the keyring is unavailable the error is returned and
//! the caller decides how to obtain a key instead.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::{Result, VaultError};
use crate::store::StoreKey;

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "passvault";

/// Load the store key for `vault_id`, generating and enrolling a fresh
/// one when none is stored yet.
///
/// `vault_id` should be stable for a given vault (e.g. the canonical
/// store file path) so the same key is found on every open.
pub fn load_or_create_store_key(vault_id: &str) -> Result<StoreKey> {
    let entry = keyring::Entry::new(SERVICE_NAME, vault_id)
        .map_err(|e| VaultError::StoreUnavailable(format!("keyring entry: {e}")))?;

    match entry.get_password() {
        Ok(encoded) => decode_key(&encoded),
        Err(keyring::Error::NoEntry) => {
            let key = StoreKey::generate()?;
            entry
                .set_password(&BASE64.encode(key.as_bytes()))
                .map_err(|e| {
                    VaultError::StoreUnavailable(format!("keyring store key write: {e}"))
                })?;
            Ok(key)
        }
        Err(e) => Err(VaultError::StoreUnavailable(format!(
            "keyring read: {e}"
        ))),
    }
}

/// Remove the stored key for `vault_id`.  Absent entries are fine.
pub fn delete_store_key(vault_id: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE_NAME, vault_id)
        .map_err(|e| VaultError::StoreUnavailable(format!("keyring entry: {e}")))?;

    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(VaultError::StoreUnavailable(format!(
            "keyring delete: {e}"
        ))),
    }
}

/// Decode a base64 keyring payload into a 32-byte key.
fn decode_key(encoded: &str) -> Result<StoreKey> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| VaultError::StoreCorrupt(format!("keyring store key base64: {e}")))?;

    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| VaultError::StoreCorrupt("keyring store key is not 32 bytes".into()))?;

    Ok(StoreKey::new(bytes))
}

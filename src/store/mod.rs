//! Encrypted key-value persistence behind the vault.
//!
//! This module provides:
//! - The [`SecretStore`] trait — the only abstraction in the crate that
//!   touches durable storage
//! - The well-known entry names the rest of the engine writes under
//! - [`MemoryStore`], a plain in-process store for tests and ephemeral use
//! - [`SealedFileStore`], the on-disk AES-256-GCM store (`sealed`)

pub mod sealed;

pub use sealed::{SealedFileStore, StoreKey};

use std::collections::HashMap;

use crate::errors::Result;

/// Entry holding the hex-encoded SHA-256 digest of the master passphrase.
pub const KEY_MASTER_HASH: &str = "master_pwd";

/// Entry flagging that a master passphrase has ever been set.
pub const KEY_INITIALIZED: &str = "first_run";

/// Entry holding the JSON snapshot of all credential records.
pub const KEY_RECORDS: &str = "passwords";

/// Encrypted-at-rest key-value persistence.
///
/// The engine stores three independent entries (see the `KEY_*`
/// constants) and always overwrites a whole entry at a time — there is
/// no partial-write path.
pub trait SecretStore: Send {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The write is durable before this returns; there is no async
    /// flush window.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch the value stored under `key`.
    ///
    /// `Ok(None)` means the key was never written.  A value that is
    /// present but cannot be opened (tampering, wrong store key) is
    /// `Err(VaultError::StoreCorrupt)` — absent and corrupt are
    /// distinct conditions and callers must not conflate them.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Plain in-process store.
///
/// Holds entries unencrypted in memory and forgets them on drop.  Meant
/// for tests and for callers that want a purely ephemeral session; use
/// [`SealedFileStore`] for anything durable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}

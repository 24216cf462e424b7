//! Master-passphrase lifecycle and session unlock state.
//!
//! `AuthGate` gates access to the vault: it persists a one-way digest of
//! the master passphrase and tracks whether the current session has been
//! unlocked.  The digest controls *access gating only* — the key that
//! encrypts the store is managed independently by the host's key
//! storage, which is why rotating the passphrase never re-encrypts any
//! records.

use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{Result, VaultError};
use crate::store::{SecretStore, KEY_INITIALIZED, KEY_MASTER_HASH};

/// Minimum master passphrase length callers are expected to enforce
/// before calling [`AuthGate::set_master_passphrase`] or
/// [`AuthGate::rotate`].  The gate itself applies no strength policy.
pub const MIN_MASTER_PASSPHRASE_LEN: usize = 4;

/// Stored value of the initialization flag.
const INITIALIZED_FLAG: &[u8] = b"true";

/// Session unlock state.
///
/// Session-scoped and held inside the gate — only the passphrase digest
/// and the initialization flag ever persist; there is no durable
/// "unlocked" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No master passphrase has ever been set.
    Uninitialized,
    /// A passphrase is set but has not been verified this session.
    Locked,
    /// The passphrase was verified, or an external authenticator
    /// asserted the unlock.
    Unlocked,
}

/// A platform authenticator (e.g. a biometric prompt) the presentation
/// layer implements and consults before calling
/// [`AuthGate::unlock_via_external_assertion`].
///
/// The gate performs no cryptographic binding between the assertion and
/// the store key — this is a convenience unlock path, not a second
/// factor.
pub trait AlternateAuthenticator {
    /// Returns `true` once the platform has positively identified the
    /// user.
    fn assert_user_presence(&self) -> bool;
}

/// The component governing master-passphrase lifecycle and unlock state.
pub struct AuthGate<S: SecretStore> {
    /// Shared handle to the backing store (also held by the service).
    store: Arc<Mutex<S>>,

    /// Current session state.  Interior mutability so the gate can be
    /// shared behind an `Arc` with the service layer.
    state: Mutex<AuthState>,
}

impl<S: SecretStore> AuthGate<S> {
    /// Build a gate over `store`, reading the initialization flag to
    /// decide the starting state (`Uninitialized` or `Locked`).
    pub fn new(store: Arc<Mutex<S>>) -> Result<Self> {
        let initialized = {
            let guard = lock_ignoring_poison(&store);
            guard.get(KEY_INITIALIZED)?.is_some()
        };
        let state = if initialized {
            AuthState::Locked
        } else {
            AuthState::Uninitialized
        };

        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    /// Current session state.
    pub fn state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` when the session is unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.state() == AuthState::Unlocked
    }

    /// Returns `true` once a master passphrase has ever been set.
    ///
    /// Reads the persisted flag rather than the session state, so a
    /// fresh gate over an enrolled store answers correctly.
    pub fn is_initialized(&self) -> Result<bool> {
        let guard = lock_ignoring_poison(&self.store);
        Ok(guard.get(KEY_INITIALIZED)?.is_some())
    }

    /// Set (or replace) the master passphrase and unlock the session.
    ///
    /// Persists the hex SHA-256 digest and the initialization flag.
    /// Length and confirmation checks are the caller's job (see
    /// [`MIN_MASTER_PASSPHRASE_LEN`]); the gate accepts any string.
    pub fn set_master_passphrase(&self, passphrase: &str) -> Result<()> {
        let digest = digest_passphrase(passphrase);

        {
            let mut guard = lock_ignoring_poison(&self.store);
            guard.put(KEY_MASTER_HASH, digest.as_bytes())?;
            guard.put(KEY_INITIALIZED, INITIALIZED_FLAG)?;
        }

        self.set_state(AuthState::Unlocked);
        Ok(())
    }

    /// Check `passphrase` against the stored digest.
    ///
    /// A mismatch is an expected outcome, so it returns `Ok(false)`
    /// rather than an error, and leaves the session state untouched.
    /// A match transitions to `Unlocked`.  With no passphrase set the
    /// answer is always `false`.
    pub fn verify(&self, passphrase: &str) -> Result<bool> {
        let stored = {
            let guard = lock_ignoring_poison(&self.store);
            guard.get(KEY_MASTER_HASH)?
        };

        let Some(stored) = stored else {
            return Ok(false);
        };

        let candidate = digest_passphrase(passphrase);
        // Constant-time compare; ct_eq is false for mismatched lengths.
        let matches: bool = stored.ct_eq(candidate.as_bytes()).into();

        if matches {
            self.set_state(AuthState::Unlocked);
        }
        Ok(matches)
    }

    /// Re-lock the session.  No-op when uninitialized.
    pub fn lock(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == AuthState::Unlocked {
            *state = AuthState::Locked;
        }
    }

    /// Unlock without a passphrase check.
    ///
    /// The caller is trusted to have already obtained a platform-level
    /// assertion (see [`AlternateAuthenticator`]).  The gate does not
    /// talk to any sensor API itself.
    pub fn unlock_via_external_assertion(&self) {
        self.set_state(AuthState::Unlocked);
    }

    /// Replace the master passphrase.
    ///
    /// Fails with `WrongPassphrase` when `old` does not verify, leaving
    /// the stored digest untouched.  On success behaves exactly like
    /// [`Self::set_master_passphrase`] with `new`.
    pub fn rotate(&self, old: &str, new: &str) -> Result<()> {
        if !self.verify(old)? {
            return Err(VaultError::WrongPassphrase);
        }
        self.set_master_passphrase(new)
    }

    fn set_state(&self, next: AuthState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Hex-encoded SHA-256 digest of a passphrase.
///
/// Unsalted by design: the digest gates access only and is unrelated to
/// the store encryption key.
fn digest_passphrase(passphrase: &str) -> String {
    hex::encode(Sha256::digest(passphrase.as_bytes()))
}

/// Lock a shared store, recovering the guard if a previous holder
/// panicked.  Store state is always internally consistent because every
/// entry is written whole.
fn lock_ignoring_poison<S>(store: &Arc<Mutex<S>>) -> std::sync::MutexGuard<'_, S> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_hex_sha256() {
        // SHA-256("abcd"), independently computed.
        assert_eq!(
            digest_passphrase("abcd"),
            "88d4266fd4e6338d13b845fcf289579d209c897823b9217da3e161936f031589"
        );
    }
}

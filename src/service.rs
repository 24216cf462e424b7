//! High-level CRUD and query operations over the vault.
//!
//! `VaultService` owns the session: it shares one store handle with its
//! [`AuthGate`], refuses every record operation until the gate is
//! unlocked, and serializes each whole read-modify-write cycle behind a
//! single mutex so concurrent mutations cannot lose updates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthGate;
use crate::errors::{Result, VaultError};
use crate::interchange;
use crate::record::CredentialRecord;
use crate::store::{SecretStore, KEY_RECORDS};

/// Total orders for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// By title, case-insensitive ascending.
    #[default]
    Alphabetical,
    /// Newest creation timestamp first.
    MostRecent,
    /// Oldest creation timestamp first.
    Oldest,
}

/// The main vault handle.  Create one with [`VaultService::open`], then
/// unlock through [`VaultService::auth`] and use the record methods.
pub struct VaultService<S: SecretStore> {
    /// Shared store handle.  Every mutating operation holds this lock
    /// for its full read-modify-write cycle.
    store: Arc<Mutex<S>>,

    /// The passphrase gate sharing the same store.
    auth: Arc<AuthGate<S>>,
}

impl<S: SecretStore> VaultService<S> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open a session over `store`.
    ///
    /// The vault starts empty on a store that has never held records;
    /// nothing is written until the first mutation.
    pub fn open(store: S) -> Result<Self> {
        let store = Arc::new(Mutex::new(store));
        let auth = Arc::new(AuthGate::new(Arc::clone(&store))?);
        Ok(Self { store, auth })
    }

    /// The gate governing this session's unlock state.
    pub fn auth(&self) -> &AuthGate<S> {
        &self.auth
    }

    // ------------------------------------------------------------------
    // Record operations (all require an unlocked session)
    // ------------------------------------------------------------------

    /// Return the full vault snapshot in persisted order.
    pub fn list(&self) -> Result<Vec<CredentialRecord>> {
        self.require_unlocked()?;
        let guard = self.store_guard();
        load_snapshot(&*guard)
    }

    /// Append a record and persist the whole snapshot.
    ///
    /// `title` and `password` must be non-empty.  A record arriving with
    /// an empty `id` gets a fresh one assigned; an id already present in
    /// the vault is rejected, keeping ids unique.  Returns the stored
    /// copy (with its assigned id).
    pub fn add(&self, mut record: CredentialRecord) -> Result<CredentialRecord> {
        self.require_unlocked()?;

        if record.title.is_empty() {
            return Err(VaultError::Validation("title must not be empty".into()));
        }
        if record.password.is_empty() {
            return Err(VaultError::Validation("password must not be empty".into()));
        }

        let mut guard = self.store_guard();
        let mut records = load_snapshot(&*guard)?;

        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        } else if records.iter().any(|r| r.id == record.id) {
            return Err(VaultError::Validation(format!(
                "a record with id '{}' already exists",
                record.id
            )));
        }

        records.push(record.clone());
        persist_snapshot(&mut *guard, &records)?;
        Ok(record)
    }

    /// Replace the record sharing `record.id`, preserving its sequence
    /// position and original creation timestamp.
    ///
    /// Fails with `NotFound` when no record has that id, leaving the
    /// vault unchanged.
    pub fn update(&self, record: CredentialRecord) -> Result<CredentialRecord> {
        self.require_unlocked()?;

        let mut guard = self.store_guard();
        let mut records = load_snapshot(&*guard)?;

        let Some(index) = records.iter().position(|r| r.id == record.id) else {
            return Err(VaultError::NotFound(record.id));
        };

        let mut stored = record;
        stored.created_at = records[index].created_at;
        stored.updated_at = Utc::now();

        records[index] = stored.clone();
        persist_snapshot(&mut *guard, &records)?;
        Ok(stored)
    }

    /// Remove every record matching `id` and persist.
    ///
    /// Idempotent: deleting an id that is not present is a no-op, not
    /// an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.require_unlocked()?;

        let mut guard = self.store_guard();
        let mut records = load_snapshot(&*guard)?;
        records.retain(|r| r.id != id);
        persist_snapshot(&mut *guard, &records)
    }

    /// Filter then sort, without touching the stored vault.
    ///
    /// Filtering is a case-insensitive substring match against `title`,
    /// `username`, and `url` (any of them); an empty `search` matches
    /// everything.
    pub fn query(&self, search: &str, sort: SortOrder) -> Result<Vec<CredentialRecord>> {
        self.require_unlocked()?;

        let mut records = {
            let guard = self.store_guard();
            load_snapshot(&*guard)?
        };

        if !search.is_empty() {
            let needle = search.to_lowercase();
            records.retain(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.username.to_lowercase().contains(&needle)
                    || r.url.to_lowercase().contains(&needle)
            });
        }

        match sort {
            SortOrder::Alphabetical => records.sort_by_key(|r| r.title.to_lowercase()),
            SortOrder::MostRecent => records.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
            SortOrder::Oldest => records.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }

        Ok(records)
    }

    /// Overwrite the snapshot with an empty vault.
    pub fn erase_all(&self) -> Result<()> {
        self.require_unlocked()?;
        let mut guard = self.store_guard();
        persist_snapshot(&mut *guard, &[])
    }

    // ------------------------------------------------------------------
    // Backup / restore
    // ------------------------------------------------------------------

    /// Render the current vault in the plaintext interchange format.
    pub fn export(&self) -> Result<String> {
        let records = self.list()?;
        Ok(interchange::export(&records))
    }

    /// Parse `text` and append every well-formed line to the vault.
    ///
    /// Additive merge: existing records are kept, nothing is
    /// deduplicated, and malformed lines are skipped silently.  Returns
    /// the number of records imported.
    pub fn import(&self, text: &str) -> Result<usize> {
        self.require_unlocked()?;

        let imported = interchange::import(text);
        let count = imported.len();

        let mut guard = self.store_guard();
        let mut records = load_snapshot(&*guard)?;
        records.extend(imported);
        persist_snapshot(&mut *guard, &records)?;

        Ok(count)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_unlocked(&self) -> Result<()> {
        if self.auth.is_unlocked() {
            Ok(())
        } else {
            Err(VaultError::Locked)
        }
    }

    fn store_guard(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deserialize the persisted snapshot; a never-written entry is an
/// empty vault.
fn load_snapshot<S: SecretStore>(store: &S) -> Result<Vec<CredentialRecord>> {
    match store.get(KEY_RECORDS)? {
        None => Ok(Vec::new()),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| VaultError::Serialization(format!("records snapshot: {e}"))),
    }
}

/// Serialize and persist the whole snapshot (whole-vault overwrite).
fn persist_snapshot<S: SecretStore>(store: &mut S, records: &[CredentialRecord]) -> Result<()> {
    let bytes = serde_json::to_vec(records)
        .map_err(|e| VaultError::Serialization(format!("records snapshot: {e}")))?;
    store.put(KEY_RECORDS, &bytes)
}

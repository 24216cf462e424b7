//! The credential record stored in a vault.
//!
//! Records are value objects: everything crosses component boundaries as
//! an owned copy, so the list handed to a caller never aliases the
//! persisted snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single stored login credential.
///
/// Identity and equality are both governed by `id` — two records are the
/// same record exactly when their ids match, whatever the other fields
/// say.  Ids are random, generated once at creation, and never reused
/// within a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Opaque unique identifier, assigned at creation and immutable.
    pub id: String,

    /// Display name.  Must be non-empty when a record enters the vault
    /// through [`crate::service::VaultService::add`].
    pub title: String,

    /// Login name.  May be empty.
    pub username: String,

    /// The secret payload.
    pub password: String,

    /// Site URL, free-form.  May be empty.
    #[serde(default)]
    pub url: String,

    /// Free-text notes.  May be empty.
    #[serde(default)]
    pub notes: String,

    /// When this record was first created.
    pub created_at: DateTime<Utc>,

    /// When this record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Build a new record with a fresh random id and current timestamps.
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            username: username.into(),
            password: password.into(),
            url: url.into(),
            notes: notes.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl PartialEq for CredentialRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CredentialRecord {}

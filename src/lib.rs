//! PassVault — an encrypted personal credential vault engine.
//!
//! The engine stores login secrets (title, username, password, URL,
//! notes) encrypted at rest behind a single master passphrase, with an
//! externally-asserted unlock shortcut for platform authenticators.
//! Presentation (screens, prompts, clipboard, biometric UI) lives
//! outside this crate and drives the engine through [`VaultService`].
//!
//! A session looks like this:
//!
//! ```no_run
//! use passvault::{CredentialRecord, MemoryStore, SortOrder, VaultService};
//!
//! # fn main() -> passvault::Result<()> {
//! let vault = VaultService::open(MemoryStore::new())?;
//!
//! vault.auth().set_master_passphrase("correct horse")?;
//! vault.add(CredentialRecord::new("Bank", "alice", "hunter2", "", ""))?;
//!
//! for record in vault.query("bank", SortOrder::Alphabetical)? {
//!     println!("{}", record.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod errors;
pub mod generator;
pub mod interchange;
pub mod record;
pub mod service;
pub mod store;

#[cfg(feature = "keyring-store")]
pub mod keyring;

// Re-export the most commonly used items.
pub use auth::{AlternateAuthenticator, AuthGate, AuthState, MIN_MASTER_PASSPHRASE_LEN};
pub use errors::{Result, VaultError};
pub use generator::{generate_password, DEFAULT_PASSWORD_LENGTH};
pub use record::CredentialRecord;
pub use service::{SortOrder, VaultService};
pub use store::{MemoryStore, SealedFileStore, SecretStore, StoreKey};

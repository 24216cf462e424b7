//! Sealed on-disk key-value store.
//!
//! A store file has this layout:
//!
//! ```text
//! [PVLT: 4 bytes][version: 1 byte][entries JSON]
//! ```
//!
//! The entries JSON is a map from entry name to the base64-encoded
//! sealed value.  Each value is sealed independently with AES-256-GCM:
//!
//! ```text
//! [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//! ```
//!
//! The entry name is bound in as additional authenticated data, so a
//! ciphertext copied under a different name fails to open.  The store
//! never derives its own key: the 32-byte [`StoreKey`] comes from the
//! host's platform key storage (see the `keyring-store` feature) and is
//! handed in at open time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::TryRngCore;
use zeroize::Zeroize;

use super::SecretStore;
use crate::errors::{Result, VaultError};

/// Magic bytes at the start of every store file.
const MAGIC: &[u8; 4] = b"PVLT";

/// Current file format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version).
const PREFIX_LEN: usize = 5;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the store encryption key in bytes (256 bits).
const KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// StoreKey
// ---------------------------------------------------------------------------

/// A wrapper around the 32-byte store encryption key that zeroes its
/// memory when dropped.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct StoreKey {
    bytes: [u8; KEY_LEN],
}

impl StoreKey {
    /// Wrap raw key bytes obtained from the host's key storage.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key from the OS CSPRNG.
    ///
    /// Used once at enrollment; the host is responsible for keeping the
    /// generated key in platform key storage afterwards.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| VaultError::StoreUnavailable(format!("OS RNG failed: {e}")))?;
        Ok(Self { bytes })
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

// ---------------------------------------------------------------------------
// SealedFileStore
// ---------------------------------------------------------------------------

/// File-backed [`SecretStore`] with every entry sealed under a host
/// provided [`StoreKey`].
pub struct SealedFileStore {
    /// Path to the store file on disk.
    path: PathBuf,

    /// The sealing key (zeroized on drop).
    key: StoreKey,

    /// In-memory map of entry name -> sealed bytes, exactly as on disk.
    /// BTreeMap so the serialized file is deterministic.
    entries: BTreeMap<String, Vec<u8>>,
}

impl std::fmt::Debug for SealedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedFileStore")
            .field("path", &self.path)
            .field("key", &"<redacted>")
            .field("entries", &self.entries.keys())
            .finish()
    }
}

impl SealedFileStore {
    /// Open the store at `path`, creating an empty one if no file
    /// exists yet.
    ///
    /// A present but unparsable file is `StoreCorrupt` — it is never
    /// silently replaced with an empty store.
    pub fn open(path: &Path, key: StoreKey) -> Result<Self> {
        let entries = if path.exists() {
            let data = fs::read(path)
                .map_err(|e| VaultError::StoreUnavailable(format!("read {path:?}: {e}")))?;
            parse_envelope(&data)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            key,
            entries,
        })
    }

    /// Serialize all entries and write the file atomically.
    ///
    /// Writes to a temp file in the same directory, then renames it over
    /// the target path so readers never see a half-written file.
    fn save(&self) -> Result<()> {
        let encoded: BTreeMap<&String, String> = self
            .entries
            .iter()
            .map(|(name, sealed)| (name, BASE64.encode(sealed)))
            .collect();
        let body = serde_json::to_vec(&encoded)
            .map_err(|e| VaultError::Serialization(format!("store entries: {e}")))?;

        let mut buf = Vec::with_capacity(PREFIX_LEN + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(CURRENT_VERSION);
        buf.extend_from_slice(&body);

        let parent = self.path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        fs::write(&tmp_path, &buf)
            .map_err(|e| VaultError::StoreUnavailable(format!("write {tmp_path:?}: {e}")))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| VaultError::StoreUnavailable(format!("rename into place: {e}")))?;

        Ok(())
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStore for SealedFileStore {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let sealed = seal(&self.key, key, value)?;
        self.entries.insert(key.to_string(), sealed);
        self.save()
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(sealed) => open_sealed(&self.key, key, sealed).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// Sealing primitives
// ---------------------------------------------------------------------------

/// Seal `plaintext` under `key`, binding `name` as AAD.
///
/// Returns the nonce prepended to the ciphertext.
fn seal(key: &StoreKey, name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::StoreUnavailable(format!("invalid store key: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let payload = Payload {
        msg: plaintext,
        aad: name.as_bytes(),
    };
    let ciphertext = cipher
        .encrypt(&nonce, payload)
        .map_err(|e| VaultError::StoreUnavailable(format!("seal failed: {e}")))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a value produced by [`seal`].
///
/// Any authentication failure is reported as `StoreCorrupt` — never as
/// an absent value.
fn open_sealed(key: &StoreKey, name: &str, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(VaultError::StoreCorrupt(format!(
            "entry '{name}' is shorter than a nonce"
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::StoreCorrupt(format!("invalid store key: {e}")))?;

    let payload = Payload {
        msg: ciphertext,
        aad: name.as_bytes(),
    };
    cipher
        .decrypt(nonce, payload)
        .map_err(|_| VaultError::StoreCorrupt(format!("entry '{name}' failed authentication")))
}

/// Parse a store file into its sealed entries.
fn parse_envelope(data: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    if data.len() < PREFIX_LEN {
        return Err(VaultError::StoreCorrupt(
            "file too small to be a valid store".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(VaultError::StoreCorrupt("missing PVLT magic bytes".into()));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(VaultError::StoreCorrupt(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let encoded: BTreeMap<String, String> = serde_json::from_slice(&data[PREFIX_LEN..])
        .map_err(|e| VaultError::StoreCorrupt(format!("entries JSON: {e}")))?;

    let mut entries = BTreeMap::new();
    for (name, value) in encoded {
        let sealed = BASE64
            .decode(&value)
            .map_err(|e| VaultError::StoreCorrupt(format!("entry '{name}' base64: {e}")))?;
        entries.insert(name, sealed);
    }
    Ok(entries)
}

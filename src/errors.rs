use thiserror::Error;

/// All errors that can occur in PassVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Record errors ---
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No record with id '{0}'")]
    NotFound(String),

    // --- Auth errors ---
    #[error("Wrong master passphrase")]
    WrongPassphrase,

    #[error("Vault is locked — unlock it before accessing records")]
    Locked,

    // --- Store errors ---
    #[error("Store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, VaultError>;

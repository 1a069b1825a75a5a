//! Error types for the envelope layer.

use thiserror::Error;

/// Errors that can occur while sealing, opening or wrapping.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Encryption failed.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// A wrapped key could not be opened with the given secret.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// The authentication tag did not verify; no plaintext is released.
    #[error("authentication failed: ciphertext or tag has been altered, or the key is wrong")]
    AuthenticationError,

    /// The manifest has no entry for the requested recipient.
    #[error("no wrapped key for recipient {0}")]
    UnknownRecipient(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;

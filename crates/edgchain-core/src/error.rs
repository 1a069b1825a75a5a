//! Error types for EDGChain Core.

use thiserror::Error;

/// Errors raised by core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid content identifier: {0}")]
    InvalidCid(String),

    #[error("unsupported multihash function 0x{code:x}, expected sha2-256")]
    UnsupportedHash { code: u64 },

    #[error("invalid digest length: expected 32, got {0}")]
    InvalidDigestLength(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

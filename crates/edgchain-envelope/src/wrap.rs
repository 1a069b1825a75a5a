//! Per-recipient DEK wrapping via X25519 key agreement.
//!
//! Each recipient gets its own [`WrappedDek`]: an ephemeral X25519 public
//! key plus the DEK encrypted under a key derived from the ECDH secret.

use serde::{Deserialize, Serialize};

use crate::crypto::{
    ephemeral_wrap_key, AuthTag, DataKey, Nonce, X25519PublicKey, X25519StaticSecret,
};
use crate::error::{EnvelopeError, Result};

/// A DEK encrypted for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedDek {
    /// Recipient this key was wrapped for.
    pub recipient: X25519PublicKey,

    /// Ephemeral X25519 public key (sender's side of ECDH).
    pub ephemeral_public: X25519PublicKey,

    /// Nonce used for the wrap.
    pub nonce: Nonce,

    /// The encrypted DEK.
    pub encrypted_key: [u8; 32],

    /// Tag over `encrypted_key`.
    pub tag: AuthTag,
}

impl WrappedDek {
    /// Wrap `dek` so only the holder of `recipient`'s secret can unwrap it.
    pub fn wrap(dek: &DataKey, recipient: &X25519PublicKey) -> Result<Self> {
        let (ephemeral_public, wrap_key) = ephemeral_wrap_key(recipient);

        let nonce = Nonce::generate();
        let mut encrypted_key = *dek.as_bytes();
        let tag = wrap_key.seal_in_place(&nonce, &mut encrypted_key)?;

        Ok(Self {
            recipient: *recipient,
            ephemeral_public,
            nonce,
            encrypted_key,
            tag,
        })
    }

    /// Recover the DEK with the recipient's secret key.
    ///
    /// Fails with `DecryptionError` for the wrong secret or corrupted bytes.
    pub fn unwrap(&self, secret: &X25519StaticSecret) -> Result<DataKey> {
        let wrap_key = secret.wrap_key_from(&self.ephemeral_public);

        let mut key_bytes = self.encrypted_key;
        wrap_key
            .open_in_place(&self.nonce, &mut key_bytes, &self.tag)
            .map_err(|_| {
                EnvelopeError::DecryptionError(format!(
                    "wrapped key for {:?} did not open",
                    self.recipient
                ))
            })?;

        Ok(DataKey::from_bytes(key_bytes))
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| EnvelopeError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    ///
    /// Undecodable bytes are reported as `DecryptionError`, since a wrapped
    /// key that cannot be parsed cannot be opened either.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| EnvelopeError::DecryptionError(format!("malformed wrapped key: {}", e)))
    }
}

/// Wrap `dek` for a recipient.
pub fn wrap_dek(dek: &DataKey, recipient: &X25519PublicKey) -> Result<WrappedDek> {
    WrappedDek::wrap(dek, recipient)
}

/// Unwrap a DEK with the recipient's secret key.
pub fn unwrap_dek(wrapped: &WrappedDek, secret: &X25519StaticSecret) -> Result<DataKey> {
    wrapped.unwrap(secret)
}

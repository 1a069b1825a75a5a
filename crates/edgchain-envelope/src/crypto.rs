//! Key material for envelope encryption.
//!
//! Provides X25519 key agreement, the per-version data key (DEK) and the
//! nonce and tag types of ChaCha20-Poly1305.

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305, Key, Nonce as ChaChaNonce, Tag,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{EnvelopeError, Result};

/// Domain separation string for wrap-key derivation.
const WRAP_KEY_CONTEXT: &str = "edgchain-envelope-v1 dek-wrap";

/// A recipient's X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn dalek(&self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519PublicKey({})", &self.to_hex()[..16])
    }
}

/// A recipient's long-lived X25519 secret.
#[derive(Clone)]
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Deterministic secret from 32 seed bytes.
    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self(StaticSecret::from(seed))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(*PublicKey::from(&self.0).as_bytes())
    }

    /// Recipient side: the wrap key agreed with a sender's ephemeral key.
    pub fn wrap_key_from(&self, ephemeral_public: &X25519PublicKey) -> DataKey {
        let shared = self.0.diffie_hellman(&ephemeral_public.dalek());
        derive_wrap_key(shared.as_bytes(), ephemeral_public, &self.public_key())
    }
}

impl fmt::Debug for X25519StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519StaticSecret(pub={:?})", self.public_key())
    }
}

/// Sender side: a one-time ephemeral public key and the wrap key it agrees
/// with `recipient`. The ephemeral secret is dropped before returning.
pub fn ephemeral_wrap_key(recipient: &X25519PublicKey) -> (X25519PublicKey, DataKey) {
    let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
    let ephemeral_public = X25519PublicKey(*PublicKey::from(&secret).as_bytes());
    let shared = secret.diffie_hellman(&recipient.dalek());
    let key = derive_wrap_key(shared.as_bytes(), &ephemeral_public, recipient);
    (ephemeral_public, key)
}

/// BLAKE3 KDF over the ECDH output, bound to both public halves.
fn derive_wrap_key(
    shared: &[u8; 32],
    ephemeral_public: &X25519PublicKey,
    recipient_public: &X25519PublicKey,
) -> DataKey {
    let mut hasher = blake3::Hasher::new_derive_key(WRAP_KEY_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral_public.as_bytes());
    hasher.update(recipient_public.as_bytes());
    DataKey(*hasher.finalize().as_bytes())
}

/// A 256-bit ChaCha20-Poly1305 key.
///
/// Used as the per-version DEK and as the derived wrap key. Deliberately
/// not `Clone`: a DEK encrypts exactly one patch.
pub struct DataKey([u8; 32]);

impl DataKey {
    /// Generate a new uniformly random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Encrypt in place, returning the detached tag.
    pub(crate) fn seal_in_place(&self, nonce: &Nonce, buffer: &mut [u8]) -> Result<AuthTag> {
        let tag = self
            .cipher()
            .encrypt_in_place_detached(ChaChaNonce::from_slice(&nonce.0), b"", buffer)
            .map_err(|e| EnvelopeError::EncryptionError(e.to_string()))?;

        let mut out = [0u8; 16];
        out.copy_from_slice(tag.as_slice());
        Ok(AuthTag(out))
    }

    /// Verify the tag and decrypt in place.
    ///
    /// On failure the buffer contents are unspecified and must be discarded.
    pub(crate) fn open_in_place(
        &self,
        nonce: &Nonce,
        buffer: &mut [u8],
        tag: &AuthTag,
    ) -> Result<()> {
        self.cipher()
            .decrypt_in_place_detached(
                ChaChaNonce::from_slice(&nonce.0),
                b"",
                buffer,
                Tag::from_slice(&tag.0),
            )
            .map_err(|_| EnvelopeError::AuthenticationError)
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey(..)")
    }
}

/// ChaCha20-Poly1305 nonce (96 bits). Always random; never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub [u8; 12]);

impl Nonce {
    pub fn generate() -> Self {
        let mut nonce = Self([0; 12]);
        rand::thread_rng().fill_bytes(&mut nonce.0);
        nonce
    }

    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Detached Poly1305 tag (128 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTag(pub [u8; 16]);

impl AuthTag {
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

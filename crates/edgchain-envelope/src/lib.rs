//! # EDGChain Envelope
//!
//! Envelope encryption for version patches.
//!
//! ## Encryption Model
//!
//! Every version uses a two-layer key model:
//!
//! 1. **DEK**: a fresh random ChaCha20-Poly1305 key that encrypts one patch
//! 2. **Wrapped DEKs**: the DEK is wrapped once per recipient via X25519 ECDH
//!
//! The [`VersionManifest`] records where the ciphertext and each wrapped DEK
//! live in the content store, so a recipient needs only their secret key
//! and the manifest digest to recover the patch.
//!
//! ## Usage
//!
//! ```rust
//! use edgchain_envelope::{
//!     decrypt_patch, encrypt_patch, generate_dek, unwrap_dek, wrap_dek, X25519StaticSecret,
//! };
//!
//! let recipient = X25519StaticSecret::generate();
//! let dek = generate_dek();
//!
//! let sealed = encrypt_patch(b"patch bytes", &dek).unwrap();
//! let wrapped = wrap_dek(&dek, &recipient.public_key()).unwrap();
//!
//! let dek = unwrap_dek(&wrapped, &recipient).unwrap();
//! let patch = decrypt_patch(&sealed.ciphertext, &sealed.nonce, &sealed.tag, &dek).unwrap();
//! assert_eq!(patch, b"patch bytes");
//! ```

pub mod crypto;
pub mod error;
pub mod manifest;
pub mod seal;
pub mod wrap;

pub use crypto::{
    ephemeral_wrap_key, AuthTag, DataKey, Nonce, X25519PublicKey, X25519StaticSecret,
};
pub use error::{EnvelopeError, Result};
pub use manifest::{EncryptionFormat, RecipientEntry, VersionManifest};
pub use seal::{decrypt_patch, encrypt_patch, generate_dek, SealedPatch};
pub use wrap::{unwrap_dek, wrap_dek, WrappedDek};

//! Version manifest: the document tying a commit to its encrypted patch.
//!
//! The manifest is stored in the content store next to the blobs it points
//! at. It holds only digests and public parameters, never key material.

use edgchain_core::Digest;
use serde::{Deserialize, Serialize};

use crate::crypto::{AuthTag, Nonce, X25519PublicKey};
use crate::error::{EnvelopeError, Result};

/// Format identifier for sealed patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncryptionFormat {
    /// ChaCha20-Poly1305, detached tag, DEK wrapped with X25519 + BLAKE3.
    ChaCha20Poly1305X25519 = 1,
}

/// One recipient's wrapped DEK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientEntry {
    pub recipient: X25519PublicKey,
    /// Digest of the CBOR-encoded `WrappedDek` blob.
    pub wrapped_dek: Digest,
}

/// Everything needed to locate and open one version's patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub format: EncryptionFormat,
    /// Digest of the patch ciphertext blob.
    pub patch: Digest,
    pub nonce: Nonce,
    pub tag: AuthTag,
    /// Sorted by recipient key.
    pub recipients: Vec<RecipientEntry>,
}

impl VersionManifest {
    /// Build a manifest. Recipients are sorted and deduplicated.
    pub fn new(
        patch: Digest,
        nonce: Nonce,
        tag: AuthTag,
        mut recipients: Vec<RecipientEntry>,
    ) -> Self {
        recipients.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        recipients.dedup_by(|a, b| a.recipient == b.recipient);
        Self {
            format: EncryptionFormat::ChaCha20Poly1305X25519,
            patch,
            nonce,
            tag,
            recipients,
        }
    }

    /// Find the wrapped-DEK entry for a recipient.
    pub fn find_recipient(&self, recipient: &X25519PublicKey) -> Option<&RecipientEntry> {
        self.recipients
            .binary_search_by(|e| e.recipient.cmp(recipient))
            .ok()
            .map(|i| &self.recipients[i])
    }

    /// Like [`find_recipient`](Self::find_recipient), but an error when absent.
    pub fn require_recipient(&self, recipient: &X25519PublicKey) -> Result<&RecipientEntry> {
        self.find_recipient(recipient)
            .ok_or_else(|| EnvelopeError::UnknownRecipient(recipient.to_hex()))
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
    /// Recipients must be strictly increasing, as [`new`](Self::new) leaves
    /// them; lookups rely on it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let manifest: Self = ciborium::from_reader(bytes)
            .map_err(|e| EnvelopeError::SerializationError(e.to_string()))?;

        if manifest
            .recipients
            .windows(2)
            .any(|pair| pair[0].recipient >= pair[1].recipient)
        {
            return Err(EnvelopeError::SerializationError(
                "manifest recipients are unsorted or repeated".into(),
            ));
        }
        Ok(manifest)
    }

    /// Content digest of the encoded manifest.
    pub fn digest(&self) -> Result<Digest> {
        Ok(Digest::of(&self.to_bytes()?))
    }
}

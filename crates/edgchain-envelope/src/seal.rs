//! Patch encryption under a per-version DEK.

use crate::crypto::{AuthTag, DataKey, Nonce};
use crate::error::Result;

/// Generate a fresh DEK for one version.
pub fn generate_dek() -> DataKey {
    DataKey::generate()
}

/// Ciphertext of one patch, with its nonce and detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPatch {
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
    pub tag: AuthTag,
}

/// Encrypt patch bytes under `dek` with a fresh random nonce.
pub fn encrypt_patch(patch: &[u8], dek: &DataKey) -> Result<SealedPatch> {
    let nonce = Nonce::generate();
    let mut ciphertext = patch.to_vec();
    let tag = dek.seal_in_place(&nonce, &mut ciphertext)?;

    Ok(SealedPatch {
        ciphertext,
        nonce,
        tag,
    })
}

/// Decrypt patch bytes, verifying the tag first.
///
/// Fails with `AuthenticationError` if the ciphertext, nonce, tag or key is
/// wrong. Nothing is returned on failure.
pub fn decrypt_patch(
    ciphertext: &[u8],
    nonce: &Nonce,
    tag: &AuthTag,
    dek: &DataKey,
) -> Result<Vec<u8>> {
    let mut buffer = ciphertext.to_vec();
    dek.open_in_place(nonce, &mut buffer, tag)?;
    Ok(buffer)
}

impl SealedPatch {
    /// Decrypt this sealed patch.
    pub fn open(&self, dek: &DataKey) -> Result<Vec<u8>> {
        decrypt_patch(&self.ciphertext, &self.nonce, &self.tag, dek)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnvelopeError;
    use proptest::prelude::*;

    #[test]
    fn test_roundtrip() {
        let dek = generate_dek();
        let sealed = encrypt_patch(b"diff --git a/main.py b/main.py", &dek).unwrap();

        assert_eq!(sealed.ciphertext.len(), 30);
        assert_eq!(sealed.open(&dek).unwrap(), b"diff --git a/main.py b/main.py");
    }

    #[test]
    fn test_empty_patch() {
        let dek = generate_dek();
        let sealed = encrypt_patch(b"", &dek).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert!(sealed.open(&dek).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_dek_is_authentication_error() {
        let sealed = encrypt_patch(b"secret", &generate_dek()).unwrap();
        assert!(matches!(
            sealed.open(&generate_dek()),
            Err(EnvelopeError::AuthenticationError)
        ));
    }

    #[test]
    fn test_flipped_tag_bit_is_rejected() {
        let dek = generate_dek();
        let mut sealed = encrypt_patch(b"secret", &dek).unwrap();
        sealed.tag.0[0] ^= 0x01;

        assert!(matches!(
            sealed.open(&dek),
            Err(EnvelopeError::AuthenticationError)
        ));
    }

    #[test]
    fn test_wrong_nonce_is_rejected() {
        let dek = generate_dek();
        let sealed = encrypt_patch(b"secret", &dek).unwrap();

        let result = decrypt_patch(&sealed.ciphertext, &Nonce::generate(), &sealed.tag, &dek);
        assert!(matches!(result, Err(EnvelopeError::AuthenticationError)));
    }

    #[test]
    fn test_same_plaintext_encrypts_differently() {
        let dek = DataKey::from_bytes([9; 32]);
        let a = encrypt_patch(b"same", &dek).unwrap();
        let b = encrypt_patch(b"same", &dek).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    proptest! {
        #[test]
        fn prop_tampered_ciphertext_never_decrypts(
            data in prop::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
        ) {
            let dek = generate_dek();
            let mut sealed = encrypt_patch(&data, &dek).unwrap();
            let i = index.index(sealed.ciphertext.len());
            sealed.ciphertext[i] ^= 0x80;

            prop_assert!(matches!(sealed.open(&dek), Err(EnvelopeError::AuthenticationError)));
        }
    }
}

//! Strong type definitions for EDGChain identifiers.
//!
//! Every identifier is a 32-byte digest, but projects, commits and raw
//! blob digests are distinct newtypes so they cannot be mixed up at
//! compile time.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::cid::{cid_to_digest, digest_to_cid};
use crate::error::{CoreError, Result};

macro_rules! digest_newtype {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self> {
                let bytes = hex::decode(s)?;
                Self::from_slice(&bytes)
            }

            /// Parse from a slice that must be exactly 32 bytes long.
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| CoreError::InvalidDigestLength(bytes.len()))?;
                Ok(Self(arr))
            }

            /// Encode as a base58 CIDv0 (`Qm...`) string.
            pub fn to_cid(&self) -> Result<String> {
                digest_to_cid(&self.0)
            }

            /// Decode from a content identifier string.
            ///
            /// The multihash must use SHA-256 with a 32-byte payload.
            pub fn from_cid(cid: &str) -> Result<Self> {
                cid_to_digest(cid).map(Self)
            }

            /// The zero identifier (sentinel).
            pub const ZERO: Self = Self([0u8; 32]);
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.to_hex()[..16])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }
    };
}

digest_newtype!(
    /// A SHA-256 digest of arbitrary bytes.
    ///
    /// This is the address of a blob in the content store.
    Digest,
    "Digest"
);

digest_newtype!(
    /// Identifier of a project in the commit registry.
    ProjectId,
    "ProjectId"
);

digest_newtype!(
    /// Identifier of a commit: the content digest of the snapshot it produces.
    CommitId,
    "CommitId"
);

impl Digest {
    /// Compute the SHA-256 digest of the given data.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl ProjectId {
    /// Derive a project identifier from a human-readable name.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"edgchain-project-v1:");
        hasher.update(name.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl From<Digest> for CommitId {
    fn from(d: Digest) -> Self {
        Self(d.0)
    }
}

impl From<Digest> for ProjectId {
    fn from(d: Digest) -> Self {
        Self(d.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_hex_roundtrip() {
        let d = Digest::of(b"hello");
        let recovered = Digest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, recovered);
    }

    #[test]
    fn test_digest_known_value() {
        // sha256("abc")
        assert_eq!(
            Digest::of(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = CommitId::from_slice(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDigestLength(31)));
    }

    #[test]
    fn test_display_and_debug() {
        let id = CommitId::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", id), "abababababababab");
        assert!(format!("{:?}", id).starts_with("CommitId("));
    }

    #[test]
    fn test_project_id_from_name_is_stable() {
        assert_eq!(ProjectId::from_name("edg"), ProjectId::from_name("edg"));
        assert_ne!(ProjectId::from_name("edg"), ProjectId::from_name("edh"));
    }
}

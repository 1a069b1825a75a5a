//! Mapping between raw 32-byte digests and content identifiers.
//!
//! The registry stores bare SHA-256 digests. Clients usually hold IPFS
//! style identifiers instead: a base58-encoded multihash (`Qm...`, CIDv0)
//! or a multibase CIDv1. Decoding extracts the multihash payload after
//! checking that the hash function is SHA-256 and the payload is 32 bytes.
//! Encoding wraps a digest into a SHA-256 multihash and renders it as a
//! CIDv0 string.

use ::cid::multihash::Multihash;
use ::cid::Cid;

use crate::error::{CoreError, Result};

/// Multihash code for sha2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Decode a content identifier string into its raw SHA-256 digest.
pub fn cid_to_digest(cid: &str) -> Result<[u8; 32]> {
    let parsed = Cid::try_from(cid).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
    let mh = parsed.hash();

    if mh.code() != SHA2_256_CODE {
        return Err(CoreError::UnsupportedHash { code: mh.code() });
    }

    let digest = mh.digest();
    digest
        .try_into()
        .map_err(|_| CoreError::InvalidDigestLength(digest.len()))
}

/// Encode a raw SHA-256 digest as a base58 CIDv0 string.
pub fn digest_to_cid(digest: &[u8; 32]) -> Result<String> {
    let mh = Multihash::<64>::wrap(SHA2_256_CODE, digest)
        .map_err(|e| CoreError::InvalidCid(e.to_string()))?;
    let cid = Cid::new_v0(mh).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
    Ok(cid.to_string())
}

//! # EDGChain Core
//!
//! Pure primitives shared by every EDGChain crate: 32-byte digests,
//! project and commit identifiers, Ed25519 identities, and the mapping
//! between raw digests and base58 multihash content identifiers.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Digest`] - SHA-256 content digest of arbitrary bytes
//! - [`ProjectId`] - Identifier of a project in the commit registry
//! - [`CommitId`] - Content digest of the snapshot produced by a commit
//! - [`Identity`] - Ed25519 public key of a registry participant
//! - [`Keypair`] - Signing key for registry transactions
//!
//! ## Content Identifiers
//!
//! Digests interoperate with IPFS-style CIDs. See [`cid`].

pub mod cid;
pub mod crypto;
pub mod error;
pub mod types;

pub use crate::cid::{cid_to_digest, digest_to_cid, SHA2_256_CODE};
pub use crypto::{Identity, Keypair, Signature};
pub use error::{CoreError, Result};
pub use types::{CommitId, Digest, ProjectId};

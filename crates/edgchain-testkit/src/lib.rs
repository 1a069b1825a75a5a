//! # EDGChain Testkit
//!
//! Testing utilities for EDGChain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: CID mappings and snapshot commit ids with known values
//! - **Generators**: Proptest strategies for keypairs, paths and snapshot histories
//! - **Fixtures**: Participants, a shared registry and store, demo snapshots
//!
//! ## Golden Vectors
//!
//! ```rust
//! use edgchain_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use edgchain_testkit::fixtures::{demo_v1, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let genesis = demo_v1();
//! assert_eq!(fixture.recipients().len(), 2);
//! assert_eq!(genesis.len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{demo_project_id, demo_v1, demo_v2, demo_v3, Participant, TestFixture};
pub use vectors::{
    cid_vectors, export_vectors_json, snapshot_vectors, verify_all_vectors, CidVector,
    SnapshotVector,
};

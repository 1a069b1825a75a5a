//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use edgchain_core::{Identity, Keypair, ProjectId};
use edgchain_envelope::{X25519PublicKey, X25519StaticSecret};
use edgchain_patch::Snapshot;
use edgchain_registry::Registry;
use edgchain_store::MemoryStore;

/// A registry participant: signing identity plus envelope key.
#[derive(Debug, Clone)]
pub struct Participant {
    pub keypair: Keypair,
    pub key: X25519StaticSecret,
}

impl Participant {
    /// Deterministic participant; distinct seeds give distinct keys.
    pub fn from_seed(seed: u8) -> Self {
        let mut key_seed = [seed; 32];
        key_seed[0] ^= 0x5a;
        Self {
            keypair: Keypair::from_seed(&[seed; 32]),
            key: X25519StaticSecret::from_bytes(key_seed),
        }
    }

    /// Random participant.
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::generate(),
            key: X25519StaticSecret::generate(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.keypair.identity()
    }

    pub fn public_key(&self) -> X25519PublicKey {
        self.key.public_key()
    }
}

/// A shared registry and in-memory store with three participants.
pub struct TestFixture {
    pub owner: Participant,
    pub contributor: Participant,
    pub outsider: Participant,
    pub registry: Arc<Registry>,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            owner: Participant::from_seed(1),
            contributor: Participant::from_seed(2),
            outsider: Participant::from_seed(3),
            registry: Arc::new(Registry::default()),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Envelope keys of owner and contributor.
    pub fn recipients(&self) -> Vec<X25519PublicKey> {
        vec![self.owner.public_key(), self.contributor.public_key()]
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Project id used by the demo scenario.
pub fn demo_project_id() -> ProjectId {
    ProjectId::from_name("edgchain-demo")
}

fn text_snapshot(files: &[(&str, &str)]) -> Snapshot {
    Snapshot::from_files(files.iter().map(|(path, content)| (*path, content.as_bytes())))
        .expect("fixture paths are valid")
}

/// First demo version.
pub fn demo_v1() -> Snapshot {
    text_snapshot(DEMO_V1)
}

/// Second demo version: both files edited.
pub fn demo_v2() -> Snapshot {
    text_snapshot(DEMO_V2)
}

/// Third demo version.
pub fn demo_v3() -> Snapshot {
    text_snapshot(DEMO_V3)
}

pub(crate) const DEMO_V1: &[(&str, &str)] = &[
    ("main.py", "print('Version 1')\n"),
    ("README.md", "# EDGChain\nInitial version"),
];

pub(crate) const DEMO_V2: &[(&str, &str)] = &[
    ("main.py", "print('Version 2')\n"),
    ("README.md", "# EDGChain\nUpdated version\nWith more info"),
];

pub(crate) const DEMO_V3: &[(&str, &str)] = &[
    ("main.py", "print('Final Version')\nprint('EDGChain running')"),
    ("README.md", "# EDGChain\nUpdated again\n"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_are_distinct() {
        let f = TestFixture::new();
        assert_ne!(f.owner.identity(), f.contributor.identity());
        assert_ne!(f.owner.public_key(), f.outsider.public_key());
    }

    #[test]
    fn test_participant_deterministic() {
        let a = Participant::from_seed(7);
        let b = Participant::from_seed(7);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_demo_versions_differ() {
        assert_ne!(demo_v1(), demo_v2());
        assert_ne!(demo_v2(), demo_v3());
        assert_eq!(demo_v1().len(), 2);
    }
}

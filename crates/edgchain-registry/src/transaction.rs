//! Signed registry transactions.
//!
//! A [`Transaction`] is a mutation plus the caller's identity, a random
//! nonce and an Ed25519 signature over both. The registry accepts a given
//! transaction at most once.
//!
//! Signed message: `b"edgchain-tx-v1" || CBOR(caller, nonce, mutation)`.

use edgchain_core::{CommitId, Digest, Identity, Keypair, ProjectId, Signature};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Domain separation prefix for transaction signatures.
const TX_DOMAIN: &[u8] = b"edgchain-tx-v1";

/// A registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    CreateProject {
        id: ProjectId,
        genesis_cid: CommitId,
        envelope: Option<Digest>,
    },
    AddOwner {
        id: ProjectId,
        user: Identity,
    },
    RemoveOwner {
        id: ProjectId,
        user: Identity,
    },
    AddContributor {
        id: ProjectId,
        user: Identity,
    },
    RemoveContributor {
        id: ProjectId,
        user: Identity,
    },
    CommitData {
        id: ProjectId,
        cid: CommitId,
        parent_cid: CommitId,
        envelope: Option<Digest>,
    },
}

#[derive(Serialize)]
struct SignedBody<'a> {
    caller: &'a Identity,
    nonce: &'a [u8; 16],
    mutation: &'a Mutation,
}

/// A mutation signed by its caller.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub caller: Identity,
    pub nonce: [u8; 16],
    pub mutation: Mutation,
    pub signature: Signature,
}

impl Transaction {
    /// Sign a mutation with a fresh random nonce.
    pub fn sign(keypair: &Keypair, mutation: Mutation) -> Result<Self> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let caller = keypair.identity();
        let message = signed_message(&caller, &nonce, &mutation)?;
        let signature = keypair.sign(&message);

        Ok(Self {
            caller,
            nonce,
            mutation,
            signature,
        })
    }

    /// Check the signature against the caller identity.
    pub fn verify(&self) -> Result<()> {
        let message = signed_message(&self.caller, &self.nonce, &self.mutation)?;
        self.caller
            .verify(&message, &self.signature)
            .map_err(|_| RegistryError::InvalidSignature)
    }

    /// Digest identifying this transaction, used for replay detection.
    pub fn id(&self) -> Result<Digest> {
        let mut message = signed_message(&self.caller, &self.nonce, &self.mutation)?;
        message.extend_from_slice(self.signature.as_bytes());
        Ok(Digest::of(&message))
    }
}

fn signed_message(caller: &Identity, nonce: &[u8; 16], mutation: &Mutation) -> Result<Vec<u8>> {
    let mut buf = TX_DOMAIN.to_vec();
    ciborium::into_writer(
        &SignedBody {
            caller,
            nonce,
            mutation,
        },
        &mut buf,
    )
    .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
    Ok(buf)
}

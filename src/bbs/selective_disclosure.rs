// src/bbs/selective_disclosure.rs
//! Selective Disclosure (BBS+) Adapter.
//!
//! An alternative to the zk-circuit path: proves that a chosen subset of a
//! credential's attributes was signed by the issuer, without revealing the
//! rest. Every proof carries a fresh 32-byte `proof_challenge` drawn from the
//! OS CSPRNG, whatever backend is plugged in.

use log::{debug, info, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::bbs::backend::{BbsBackend, BbsProofRequest};
use crate::errors::{BackendError, ProofError, ProofResult};
use crate::models::credential::{BbsPublicKey, Credential};
use crate::models::proof::BbsProof;

/// Builds and checks BBS+ disclosure proofs over credentials.
#[derive(Clone)]
pub struct SelectiveDisclosure {
    backend: Arc<dyn BbsBackend>,
}

fn issuer_key(encoded: &str) -> ProofResult<BbsPublicKey> {
    BbsPublicKey::from_hex(encoded).map_err(|e| ProofError::Backend(BackendError::KeyMismatch(e)))
}

impl SelectiveDisclosure {
    pub fn new(backend: Arc<dyn BbsBackend>) -> Self {
        SelectiveDisclosure { backend }
    }

    /// Creates a proof of knowledge disclosing `reveal_indices` of `credential`.
    ///
    /// # Arguments
    /// * `credential` - Credential carrying a BBS+ signature
    /// * `reveal_indices` - Attribute indices to disclose; indices past the
    ///   credential's attributes are dropped
    ///
    /// # Errors
    /// [`ProofError::Backend`] if the issuer key is malformed or the backend
    /// refuses the request.
    pub fn selective_disclose(&self, credential: &Credential, reveal_indices: &[usize]) -> ProofResult<BbsProof> {
        let public_key = issuer_key(&credential.issuer_public_key)?;

        let mut revealed_indices = Vec::with_capacity(reveal_indices.len());
        for &index in reveal_indices {
            if index < credential.attributes.len() && !revealed_indices.contains(&index) {
                revealed_indices.push(index);
            } else {
                debug!("dropping disclosure index {}", index);
            }
        }

        let mut nonce = [0u8; 32];
        OsRng.fill_bytes(&mut nonce);

        let request = BbsProofRequest {
            signature: &credential.bbs_signature,
            public_key: &public_key,
            messages: &credential.attributes,
            revealed: &revealed_indices,
            nonce: &nonce,
        };
        let proof = self.backend.prove(&request).map_err(ProofError::Backend)?;

        let revealed_attributes: BTreeMap<usize, String> = revealed_indices
            .iter()
            .map(|&i| (i, credential.attributes[i].clone()))
            .collect();
        info!("BBS+ disclosure created for {} attributes", revealed_indices.len());

        Ok(BbsProof {
            proof,
            revealed_indices,
            revealed_attributes,
            proof_challenge: ethers_core::utils::hex::encode(nonce),
            issuer_public_key: public_key.to_hex(),
        })
    }

    /// Verifies a disclosure produced by [`Self::selective_disclose`].
    ///
    /// # Returns
    /// `Ok(false)` when the proof does not match the disclosed values, nonce or
    /// key, or when `revealed_attributes` holds any index the proof does not
    /// cover.
    pub fn verify_disclosure(&self, disclosure: &BbsProof) -> ProofResult<bool> {
        let public_key = issuer_key(&disclosure.issuer_public_key)?;

        let nonce_bytes = ethers_core::utils::hex::decode(&disclosure.proof_challenge)
            .map_err(|e| ProofError::Backend(BackendError::Serialization(e.to_string())))?;
        let nonce: [u8; 32] = nonce_bytes.try_into().map_err(|_| {
            ProofError::Backend(BackendError::Serialization("proof challenge must be 32 bytes".into()))
        })?;

        let proven: BTreeSet<usize> = disclosure.revealed_indices.iter().copied().collect();
        if proven.len() != disclosure.revealed_indices.len()
            || !disclosure.revealed_attributes.keys().eq(proven.iter())
        {
            warn!("disclosure attributes do not match the proven index set");
            return Ok(false);
        }

        let mut revealed = Vec::with_capacity(disclosure.revealed_indices.len());
        for index in &disclosure.revealed_indices {
            match disclosure.revealed_attributes.get(index) {
                Some(value) => revealed.push((*index, value.clone())),
                None => return Ok(false),
            }
        }

        self.backend
            .verify(&public_key, &disclosure.proof, &revealed, &nonce)
            .map_err(ProofError::Backend)
    }
}

// src/models/proof.rs
//! Proof artifacts exchanged between holder and verifier.
//!
//! None of these are persisted; a bundle is produced per verification request.

use ethers_core::types::Signature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::serialization::base64_bytes;

/// Opaque succinct proof produced by a [`ZkBackend`](crate::zkp::backend::ZkBackend).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZkProof(#[serde(with = "base64_bytes")] pub Vec<u8>);

/// Verification material for the credential circuit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZkVerificationKey(#[serde(with = "base64_bytes")] pub Vec<u8>);

/// Output of a credential proof.
///
/// `revealed_attributes` only holds indices that were requested AND whose
/// public signal is non-zero. `issuer_signature` is copied from the
/// credential and attests the credential-hash signal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof: ZkProof,
    pub public_signals: Vec<String>,
    pub revealed_attributes: BTreeMap<usize, String>,
    pub issuer_signature: Signature,
}

/// Output of a BBS+ selective disclosure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BbsProof {
    #[serde(with = "base64_bytes")]
    pub proof: Vec<u8>,

    /// Disclosed indices in request order
    pub revealed_indices: Vec<usize>,

    /// Disclosed attribute values keyed by index
    pub revealed_attributes: BTreeMap<usize, String>,

    /// Hex encoding of the 32-byte nonce bound into `proof`
    pub proof_challenge: String,

    /// Hex encoding of the issuer public key the proof was made against
    pub issuer_public_key: String,
}

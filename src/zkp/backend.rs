// src/zkp/backend.rs
//! Capability interface for the zk-proof backend.
//!
//! The proof engine depends only on [`ZkBackend`]; the arkworks Groth16
//! implementation lives in [`crate::zkp::groth16_backend`] and tests
//! substitute their own.

use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::models::credential::MAX_ATTRIBUTES;
use crate::models::proof::{ZkProof, ZkVerificationKey};

/// Private and public inputs fed to the credential circuit.
///
/// All scalars are decimal field-element strings; the backend owns their
/// circuit-specific encoding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialWitness {
    pub credential_hash: String,
    pub user_secret: String,
    pub attributes: [String; MAX_ATTRIBUTES],
    pub attribute_flags: [u8; MAX_ATTRIBUTES],
    pub challenge: String,
    pub issuer_public_key: String,
    pub schema_hash: String,
}

/// Opaque prove/verify primitive.
pub trait ZkBackend: Send + Sync {
    /// Produces a proof and its public signals from a witness.
    fn prove(&self, witness: &CredentialWitness) -> Result<(ZkProof, Vec<String>), BackendError>;

    /// Checks a proof against public signals.
    ///
    /// Returns `Ok(false)` for a well-formed proof that does not verify and
    /// `Err` only when the inputs cannot be evaluated at all.
    fn verify(
        &self,
        verification_key: &ZkVerificationKey,
        public_signals: &[String],
        proof: &ZkProof,
    ) -> Result<bool, BackendError>;
}

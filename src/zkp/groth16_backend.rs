// src/zkp/groth16_backend.rs
//! Groth16 implementation of [`ZkBackend`] over BN254.
//!
//! Proofs and keys travel as compressed arkworks encodings. Key generation
//! here is a local circuit-specific setup and is only suitable for development
//! and tests; production keys come from a ceremony and are loaded with
//! [`Groth16Backend::from_proving_key_bytes`].

use ark_bn254::{Bn254, Fr as Bn254Fr};
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use log::{debug, warn};
use rand::rngs::OsRng;

use crate::errors::BackendError;
use crate::models::credential::MAX_ATTRIBUTES;
use crate::models::proof::{ZkProof, ZkVerificationKey};
use crate::utils::crypto::issuer_key_field;
use crate::utils::serialization::{decimal_to_fr, fr_to_decimal};
use crate::zkp::backend::{CredentialWitness, ZkBackend};
use crate::zkp::circuit::CredentialCircuit;

/// Groth16 prover holding the circuit's proving key.
pub struct Groth16Backend {
    proving_key: ProvingKey<Bn254>,
}

impl Groth16Backend {
    /// Runs a fresh circuit-specific setup with OS randomness.
    ///
    /// # Returns
    /// The backend and the matching verification key.
    pub fn setup() -> Result<(Self, ZkVerificationKey), BackendError> {
        warn!("generating Groth16 keys locally; not for production use");
        let mut rng = OsRng;
        let (pk, vk) = Groth16::<Bn254>::setup(CredentialCircuit::blank(), &mut rng)
            .map_err(|e| BackendError::Prover(format!("setup failed: {}", e)))?;

        let verification_key = ZkVerificationKey(serialize_compressed(&vk)?);
        Ok((Groth16Backend { proving_key: pk }, verification_key))
    }

    /// Restores a backend from a compressed proving key.
    pub fn from_proving_key_bytes(bytes: &[u8]) -> Result<Self, BackendError> {
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| BackendError::KeyMismatch(format!("proving key: {}", e)))?;
        Ok(Groth16Backend { proving_key })
    }

    /// Compressed encoding of the proving key, for caching between runs.
    pub fn proving_key_bytes(&self) -> Result<Vec<u8>, BackendError> {
        serialize_compressed(&self.proving_key)
    }
}

fn serialize_compressed<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    value
        .serialize_compressed(&mut bytes)
        .map_err(|e| BackendError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn witness_scalar(label: &str, value: &str) -> Result<Bn254Fr, BackendError> {
    decimal_to_fr(value).map_err(|e| BackendError::MalformedWitness(format!("{}: {}", label, e)))
}

impl ZkBackend for Groth16Backend {
    fn prove(&self, witness: &CredentialWitness) -> Result<(ZkProof, Vec<String>), BackendError> {
        let credential_hash = witness_scalar("credentialHash", &witness.credential_hash)?;
        let user_secret = witness_scalar("userSecret", &witness.user_secret)?;
        let challenge = witness_scalar("challenge", &witness.challenge)?;
        let schema_hash = witness_scalar("schemaHash", &witness.schema_hash)?;

        let mut attributes = [Bn254Fr::from(0u64); MAX_ATTRIBUTES];
        for (slot, value) in attributes.iter_mut().zip(&witness.attributes) {
            *slot = witness_scalar("attributes", value)?;
        }
        let mut flags = [Bn254Fr::from(0u64); MAX_ATTRIBUTES];
        for (slot, flag) in flags.iter_mut().zip(witness.attribute_flags) {
            if flag > 1 {
                return Err(BackendError::MalformedWitness(format!("attribute flag {} is not a bit", flag)));
            }
            *slot = Bn254Fr::from(flag as u64);
        }

        let circuit = CredentialCircuit::assign(
            user_secret,
            attributes,
            flags,
            challenge,
            issuer_key_field(&witness.issuer_public_key),
            schema_hash,
        );
        // An unsatisfiable witness must never reach the prover
        if circuit.credential_hash != Some(credential_hash) {
            return Err(BackendError::MalformedWitness(
                "credential hash does not match the credential contents".into(),
            ));
        }
        let public_inputs = circuit
            .public_inputs()
            .ok_or_else(|| BackendError::MalformedWitness("circuit left unassigned".into()))?;

        let mut rng = OsRng;
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut rng)
            .map_err(|e| BackendError::Prover(e.to_string()))?;
        debug!("groth16 proof generated with {} public inputs", public_inputs.len());

        let public_signals = public_inputs.iter().map(fr_to_decimal).collect();
        Ok((ZkProof(serialize_compressed(&proof)?), public_signals))
    }

    fn verify(
        &self,
        verification_key: &ZkVerificationKey,
        public_signals: &[String],
        proof: &ZkProof,
    ) -> Result<bool, BackendError> {
        verify_groth16(verification_key, public_signals, proof)
    }
}

/// Verifies without a proving key; what a verifier-only deployment calls.
pub fn verify_groth16(
    verification_key: &ZkVerificationKey,
    public_signals: &[String],
    proof: &ZkProof,
) -> Result<bool, BackendError> {
    let vk = VerifyingKey::<Bn254>::deserialize_compressed(&verification_key.0[..])
        .map_err(|e| BackendError::KeyMismatch(format!("verification key: {}", e)))?;

    if vk.gamma_abc_g1.len() != public_signals.len() + 1 {
        return Err(BackendError::KeyMismatch(format!(
            "verification key expects {} public inputs, got {}",
            vk.gamma_abc_g1.len().saturating_sub(1),
            public_signals.len()
        )));
    }

    let proof = match Proof::<Bn254>::deserialize_compressed(&proof.0[..]) {
        Ok(proof) => proof,
        Err(e) => {
            // Bytes that are not a curve point cannot be a valid proof
            debug!("proof bytes rejected: {}", e);
            return Ok(false);
        }
    };

    let inputs = public_signals
        .iter()
        .map(|signal| decimal_to_fr(signal).map_err(|e| BackendError::MalformedWitness(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Groth16::<Bn254>::verify(&vk, &inputs, &proof).map_err(|e| BackendError::Prover(e.to_string()))
}

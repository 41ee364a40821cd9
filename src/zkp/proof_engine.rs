// src/zkp/proof_engine.rs
//! Credential Proof Engine.
//!
//! Builds the circuit witness from a credential and a reveal set, delegates
//! to the configured [`ZkBackend`], and reconstructs the disclosed attributes
//! from the resulting public signals.
//!
//! ## Challenge binding
//! [`ProofEngine::verify_credential_proof`] is the single place where the
//! verifier's challenge is compared against the challenge signal of the
//! proof. Callers do not repeat the check.

use ark_bn254::Fr as Bn254Fr;
use ark_ff::PrimeField;
use log::{debug, info, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

use crate::errors::{ProofError, ProofResult};
use crate::models::credential::Credential;
use crate::models::proof::{ProofBundle, ZkProof, ZkVerificationKey};
use crate::utils::serialization::{decimal_to_fr, fr_to_decimal};
use crate::zkp::attribute_codec::{decode_revealed, encode_flags, pad_attributes, SignalLayout};
use crate::zkp::backend::{CredentialWitness, ZkBackend};

/// Generates a fresh verifier challenge as a decimal field element.
pub fn fresh_challenge() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    fr_to_decimal(&Bn254Fr::from_be_bytes_mod_order(&bytes))
}

/// Proof engine bound to one backend, verification key and signal layout.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct ProofEngine {
    backend: Arc<dyn ZkBackend>,
    verification_key: Option<ZkVerificationKey>,
    layout: SignalLayout,
}

impl ProofEngine {
    /// Creates an engine using the default signal layout.
    ///
    /// # Arguments
    /// * `backend` - Opaque prove/verify primitive
    /// * `verification_key` - Key used by [`Self::verify_credential_proof`];
    ///   a prover-only engine may pass `None`
    pub fn new(backend: Arc<dyn ZkBackend>, verification_key: Option<ZkVerificationKey>) -> Self {
        ProofEngine {
            backend,
            verification_key,
            layout: SignalLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: SignalLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &SignalLayout {
        &self.layout
    }

    /// Proves possession of `credential`, disclosing the attributes at `reveal_indices`.
    ///
    /// # Arguments
    /// * `credential` - Holder's credential (at most 10 attributes)
    /// * `reveal_indices` - Attribute indices to disclose; indices `>= 10` are ignored
    /// * `challenge` - Verifier-supplied nonce, bound into the proof
    ///
    /// # Errors
    /// - [`ProofError::Codec`] if the credential has more than 10 attributes
    /// - [`ProofError::Generation`] if the backend rejects the witness, e.g.
    ///   when `credential.hash` does not match its contents
    pub fn generate_credential_proof(
        &self,
        credential: &Credential,
        reveal_indices: &[usize],
        challenge: &str,
    ) -> ProofResult<ProofBundle> {
        let witness = CredentialWitness {
            credential_hash: credential.hash.clone(),
            user_secret: credential.user_secret.clone(),
            attributes: pad_attributes(&credential.attributes)?,
            attribute_flags: encode_flags(reveal_indices),
            challenge: challenge.to_string(),
            issuer_public_key: credential.issuer_public_key.clone(),
            schema_hash: credential.schema_hash.clone(),
        };

        let (proof, public_signals) = self.backend.prove(&witness).map_err(ProofError::Generation)?;
        if public_signals.len() != self.layout.len {
            return Err(ProofError::MalformedSignals {
                expected: self.layout.len,
                found: public_signals.len(),
            });
        }

        let revealed_attributes = decode_revealed(&public_signals, reveal_indices, &self.layout);
        info!(
            "credential proof generated: {} of {} requested attributes revealed",
            revealed_attributes.len(),
            reveal_indices.len()
        );

        Ok(ProofBundle {
            proof,
            public_signals,
            revealed_attributes,
            issuer_signature: credential.issuer_signature,
        })
    }

    /// Verifies a credential proof against the verifier's own challenge.
    ///
    /// # Returns
    /// - `Ok(true)` if the proof verifies and carries `challenge`
    /// - `Ok(false)` if the proof is well-formed but invalid, or was made for
    ///   another challenge
    ///
    /// # Errors
    /// - [`ProofError::MissingVerificationKey`] if the engine has no key
    /// - [`ProofError::MalformedSignals`] for a wrong-shape signal vector
    /// - [`ProofError::Codec`] if `challenge` or a signal is not a field element
    /// - [`ProofError::Backend`] if the backend cannot evaluate the inputs
    pub fn verify_credential_proof(
        &self,
        proof: &ZkProof,
        public_signals: &[String],
        challenge: &str,
    ) -> ProofResult<bool> {
        let verification_key = self
            .verification_key
            .as_ref()
            .ok_or(ProofError::MissingVerificationKey)?;

        if public_signals.len() != self.layout.len {
            return Err(ProofError::MalformedSignals {
                expected: self.layout.len,
                found: public_signals.len(),
            });
        }

        let expected = decimal_to_fr(challenge)?;
        let embedded = decimal_to_fr(&public_signals[self.layout.challenge_index])?;
        if expected != embedded {
            warn!("credential proof rejected: challenge mismatch");
            return Ok(false);
        }

        let valid = self
            .backend
            .verify(verification_key, public_signals, proof)
            .map_err(ProofError::Backend)?;
        debug!("credential proof verification result: {}", valid);
        Ok(valid)
    }

    /// [`Self::generate_credential_proof`] on tokio's blocking pool.
    pub async fn generate_credential_proof_async(
        &self,
        credential: Credential,
        reveal_indices: Vec<usize>,
        challenge: String,
    ) -> ProofResult<ProofBundle> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            engine.generate_credential_proof(&credential, &reveal_indices, &challenge)
        })
        .await
        .map_err(|e| ProofError::TaskAborted(e.to_string()))?
    }

    /// [`Self::verify_credential_proof`] on tokio's blocking pool.
    pub async fn verify_credential_proof_async(
        &self,
        proof: ZkProof,
        public_signals: Vec<String>,
        challenge: String,
    ) -> ProofResult<bool> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            engine.verify_credential_proof(&proof, &public_signals, &challenge)
        })
        .await
        .map_err(|e| ProofError::TaskAborted(e.to_string()))?
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::BackendError;
    use crate::models::credential::BbsSignature;
    use crate::services::credential_issuer::attestation_digest;
    use crate::wallet::key_management::KeyManager;
    use crate::zkp::groth16_backend::Groth16Backend;
    use crate::zkp::poseidon::credential_hash;
    use ark_ff::Field;
    use once_cell::sync::Lazy;
    use std::collections::BTreeMap;

    /// Groth16 setup is slow; tests share one key pair.
    static SHARED_GROTH16: Lazy<(Arc<Groth16Backend>, ZkVerificationKey)> = Lazy::new(|| {
        let (backend, vk) = Groth16Backend::setup().expect("groth16 setup");
        (Arc::new(backend), vk)
    });

    pub(crate) fn shared_groth16() -> (Arc<Groth16Backend>, ZkVerificationKey) {
        SHARED_GROTH16.clone()
    }

    pub(crate) fn groth16_engine() -> ProofEngine {
        let (backend, vk) = shared_groth16();
        ProofEngine::new(backend, Some(vk))
    }

    const HOLDER_SECRET: &str = "31337424242";

    /// Credential with a consistent hash, attested by a throwaway issuer key.
    pub(crate) fn sample_credential(attributes: &[&str]) -> Credential {
        let attributes: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();
        let issuer_public_key = "02a1b2c3".to_string();
        // oversized attribute lists still build, so the engine's own check can fire
        let hash = credential_hash(HOLDER_SECRET, &attributes, &issuer_public_key, "4242")
            .unwrap_or_else(|_| "0".into());
        let issuer_signature = KeyManager::new()
            .sign_digest(&attestation_digest(&hash).unwrap())
            .unwrap();
        Credential {
            hash,
            user_secret: HOLDER_SECRET.into(),
            attributes,
            issuer_public_key,
            schema_hash: "4242".into(),
            bbs_signature: BbsSignature(vec![1, 2, 3]),
            issuer_signature,
        }
    }

    struct FailingBackend;

    impl ZkBackend for FailingBackend {
        fn prove(&self, _: &CredentialWitness) -> Result<(ZkProof, Vec<String>), BackendError> {
            Err(BackendError::KeyMismatch("proving key does not match circuit".into()))
        }

        fn verify(&self, _: &ZkVerificationKey, _: &[String], _: &ZkProof) -> Result<bool, BackendError> {
            Err(BackendError::KeyMismatch("verification key corrupted".into()))
        }
    }

    #[test]
    fn end_to_end_reveals_requested_attributes() {
        let engine = groth16_engine();
        let credential = sample_credential(&["100", "101", "102", "103", "104"]);
        let challenge = fresh_challenge();

        let bundle = engine
            .generate_credential_proof(&credential, &[1, 3], &challenge)
            .unwrap();

        let expected: BTreeMap<usize, String> =
            [(1, "101".to_string()), (3, "103".to_string())].into_iter().collect();
        assert_eq!(bundle.revealed_attributes, expected);
        assert!(engine
            .verify_credential_proof(&bundle.proof, &bundle.public_signals, &challenge)
            .unwrap());
    }

    #[test]
    fn tampered_signal_verifies_false() {
        let engine = groth16_engine();
        let credential = sample_credential(&["100", "101", "102", "103", "104"]);
        let challenge = fresh_challenge();
        let bundle = engine
            .generate_credential_proof(&credential, &[1, 3], &challenge)
            .unwrap();

        let mut tampered = bundle.public_signals.clone();
        tampered[2] = "555".into();
        assert_eq!(
            engine
                .verify_credential_proof(&bundle.proof, &tampered, &challenge)
                .unwrap(),
            false
        );
    }

    #[test]
    fn replayed_proof_fails_under_new_challenge() {
        let engine = groth16_engine();
        let credential = sample_credential(&["7"]);
        let challenge = fresh_challenge();
        let bundle = engine
            .generate_credential_proof(&credential, &[0], &challenge)
            .unwrap();

        let other = fresh_challenge();
        assert!(!engine
            .verify_credential_proof(&bundle.proof, &bundle.public_signals, &other)
            .unwrap());

        // rewriting the challenge signal breaks the proof itself
        let mut rewritten = bundle.public_signals.clone();
        rewritten[engine.layout().challenge_index] = other.clone();
        assert!(!engine
            .verify_credential_proof(&bundle.proof, &rewritten, &other)
            .unwrap());
    }

    #[test]
    fn zero_attribute_looks_unrevealed() {
        let engine = groth16_engine();
        let credential = sample_credential(&["0", "5"]);
        let bundle = engine
            .generate_credential_proof(&credential, &[0, 1], &fresh_challenge())
            .unwrap();
        assert_eq!(bundle.revealed_attributes.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn malformed_inputs_are_errors_not_false() {
        let engine = groth16_engine();
        let challenge = fresh_challenge();
        let bundle = engine
            .generate_credential_proof(&sample_credential(&["1"]), &[0], &challenge)
            .unwrap();

        let short = &bundle.public_signals[..5];
        assert!(matches!(
            engine.verify_credential_proof(&bundle.proof, short, &challenge),
            Err(ProofError::MalformedSignals { expected: 15, found: 5 })
        ));

        let mut garbage = bundle.public_signals.clone();
        garbage[3] = "abc".into();
        assert!(matches!(
            engine.verify_credential_proof(&bundle.proof, &garbage, &challenge),
            Err(ProofError::Backend(_))
        ));

        let (backend, _) = shared_groth16();
        let keyless = ProofEngine::new(backend, None);
        assert!(matches!(
            keyless.verify_credential_proof(&bundle.proof, &bundle.public_signals, &challenge),
            Err(ProofError::MissingVerificationKey)
        ));
    }

    #[test]
    fn backend_failures_surface_as_generation_errors() {
        let engine = ProofEngine::new(Arc::new(FailingBackend), Some(ZkVerificationKey(vec![0])));
        let result = engine.generate_credential_proof(&sample_credential(&["1"]), &[0], "1");
        assert!(matches!(result, Err(ProofError::Generation(BackendError::KeyMismatch(_)))));

        let too_many: Vec<&str> = vec!["1"; 11];
        let result = engine.generate_credential_proof(&sample_credential(&too_many), &[0], "1");
        assert!(matches!(result, Err(ProofError::Codec(_))));
    }

    #[test]
    fn malformed_witness_is_a_generation_error() {
        let engine = groth16_engine();
        let mut credential = sample_credential(&["1"]);
        credential.user_secret = "not-a-scalar".into();
        assert!(matches!(
            engine.generate_credential_proof(&credential, &[0], "1"),
            Err(ProofError::Generation(BackendError::MalformedWitness(_)))
        ));
    }

    #[test]
    fn public_signals_do_not_leak_the_holder_secret() {
        let engine = groth16_engine();
        let credential = sample_credential(&["18", "276"]);
        let secret = decimal_to_fr(HOLDER_SECRET).unwrap();

        let (c1, c2) = (fresh_challenge(), fresh_challenge());
        let first = engine.generate_credential_proof(&credential, &[0], &c1).unwrap();
        let second = engine.generate_credential_proof(&credential, &[0], &c2).unwrap();

        let tag_index = engine.layout().presentation_tag_index;
        let signal = |bundle: &ProofBundle, i: usize| decimal_to_fr(&bundle.public_signals[i]).unwrap();
        let (t1, t2) = (signal(&first, tag_index), signal(&second, tag_index));
        let (x1, x2) = (decimal_to_fr(&c1).unwrap(), decimal_to_fr(&c2).unwrap());

        // a tag linear in the challenge would give the secret away here
        let slope = (t1 - t2) * (x1 - x2).inverse().unwrap();
        assert_ne!(slope, secret);
        assert_ne!(t1, t2);
        for bundle in [&first, &second] {
            assert!(bundle.public_signals.iter().all(|s| *s != HOLDER_SECRET));
        }
        assert_eq!(first.issuer_signature, credential.issuer_signature);
    }

    #[test]
    fn credential_hash_must_match_contents() {
        let engine = groth16_engine();
        let mut credential = sample_credential(&["18"]);
        credential.attributes[0] = "999999".into();
        assert!(matches!(
            engine.generate_credential_proof(&credential, &[0], &fresh_challenge()),
            Err(ProofError::Generation(BackendError::MalformedWitness(_)))
        ));

        let mut stolen = sample_credential(&["18"]);
        stolen.user_secret = "1".into();
        assert!(matches!(
            engine.generate_credential_proof(&stolen, &[0], &fresh_challenge()),
            Err(ProofError::Generation(BackendError::MalformedWitness(_)))
        ));
    }

    #[tokio::test]
    async fn async_variants_match_blocking_behaviour() {
        let engine = groth16_engine();
        let challenge = fresh_challenge();
        let bundle = engine
            .generate_credential_proof_async(sample_credential(&["3", "4"]), vec![1], challenge.clone())
            .await
            .unwrap();
        assert_eq!(bundle.revealed_attributes.get(&1).map(String::as_str), Some("4"));

        let valid = engine
            .verify_credential_proof_async(bundle.proof, bundle.public_signals, challenge)
            .await
            .unwrap();
        assert!(valid);
    }
}

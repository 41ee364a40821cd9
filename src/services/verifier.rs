// src/services/verifier.rs
//! Presentation verification service.
//!
//! Checks a holder's proof cryptographically and against the registry: the
//! issuer DID must be active, must list the issuer key the proof was made
//! against, and its controller must have attested the credential hash the
//! proof commits to.
//!
//! The credential-hash signal is the same in every presentation of one
//! credential, so zk presentations of a credential are linkable to each
//! other. BBS+ disclosures are the unlinkable alternative.

use log::{debug, warn};
use std::sync::Arc;

use crate::bbs::selective_disclosure::SelectiveDisclosure;
use crate::contracts::did_registry::DIDRegistry;
use crate::errors::{PresentationError, ProofError};
use crate::models::credential::ZERO_SENTINEL;
use crate::models::did::DIDDocument;
use crate::models::proof::{BbsProof, ProofBundle};
use crate::services::credential_issuer::attestation_digest;
use crate::utils::crypto::issuer_key_field;
use crate::utils::serialization::fr_to_decimal;
use crate::wallet::key_management::recover_signer;
use crate::zkp::attribute_codec::disclosed_attributes;
use crate::zkp::proof_engine::ProofEngine;

/// Verifier bound to a registry and the proof mechanisms it accepts.
pub struct Verifier {
    registry: Arc<DIDRegistry>,
    engine: ProofEngine,
    disclosure: Option<SelectiveDisclosure>,
}

impl Verifier {
    /// Constructs a new Verifier instance.
    ///
    /// # Arguments
    /// * `registry` - Registry resolving issuer DIDs
    /// * `engine` - Proof engine holding the circuit's verification key
    pub fn new(registry: Arc<DIDRegistry>, engine: ProofEngine) -> Self {
        Verifier {
            registry,
            engine,
            disclosure: None,
        }
    }

    /// Also accept BBS+ disclosures.
    pub fn with_disclosure(mut self, disclosure: SelectiveDisclosure) -> Self {
        self.disclosure = Some(disclosure);
        self
    }

    /// Resolves an issuer DID, treating a deactivated one as untrusted.
    fn trusted_issuer(&self, issuer_did: &str) -> Result<Option<DIDDocument>, PresentationError> {
        let document = self.registry.get_did_document(issuer_did)?;
        if !document.active {
            warn!("issuer {} is deactivated", issuer_did);
            return Ok(None);
        }
        Ok(Some(document))
    }

    /// Verifies a zk credential presentation issued under `issuer_did`.
    ///
    /// # Returns
    /// - `Ok(true)` if the proof verifies for `challenge`, the issuer DID is
    ///   active and lists the key the proof commits to, the DID's controller
    ///   signed the credential hash, and `revealed_attributes` is exactly the
    ///   set of non-zero attribute signals
    /// - `Ok(false)` if any of those checks says no
    ///
    /// # Errors
    /// - [`PresentationError::Registry`] if the issuer DID does not exist
    /// - [`PresentationError::Proof`] if the proof cannot be evaluated
    pub fn verify_presentation(
        &self,
        issuer_did: &str,
        bundle: &ProofBundle,
        challenge: &str,
    ) -> Result<bool, PresentationError> {
        let Some(issuer) = self.trusted_issuer(issuer_did)? else {
            return Ok(false);
        };

        if !self
            .engine
            .verify_credential_proof(&bundle.proof, &bundle.public_signals, challenge)?
        {
            return Ok(false);
        }

        let layout = self.engine.layout();
        let issuer_signal = &bundle.public_signals[layout.issuer_key_index];
        let anchored = issuer
            .verification_methods
            .iter()
            .any(|method| fr_to_decimal(&issuer_key_field(method)) == *issuer_signal);
        if !anchored {
            warn!("proof issuer key is not a verification method of {}", issuer_did);
            return Ok(false);
        }

        let digest = attestation_digest(&bundle.public_signals[layout.credential_hash_index])
            .map_err(ProofError::from)?;
        if recover_signer(&digest, &bundle.issuer_signature) != Some(issuer.controller) {
            warn!("credential hash is not attested by the controller of {}", issuer_did);
            return Ok(false);
        }

        if bundle.revealed_attributes.values().any(|value| value == ZERO_SENTINEL) {
            warn!("revealed attributes claim a zero value");
            return Ok(false);
        }
        if bundle.revealed_attributes != disclosed_attributes(&bundle.public_signals, layout) {
            warn!("revealed attributes do not match the public signals");
            return Ok(false);
        }

        debug!("presentation accepted for issuer {}", issuer_did);
        Ok(true)
    }

    /// Verifies a BBS+ disclosure issued under `issuer_did`.
    ///
    /// # Errors
    /// [`PresentationError::DisclosureUnsupported`] if no adapter was configured.
    pub fn verify_disclosure(&self, issuer_did: &str, disclosure: &BbsProof) -> Result<bool, PresentationError> {
        let adapter = self
            .disclosure
            .as_ref()
            .ok_or(PresentationError::DisclosureUnsupported)?;
        let Some(issuer) = self.trusted_issuer(issuer_did)? else {
            return Ok(false);
        };

        if !issuer.has_verification_method(&disclosure.issuer_public_key) {
            warn!("disclosure key is not a verification method of {}", issuer_did);
            return Ok(false);
        }
        Ok(adapter.verify_disclosure(disclosure)?)
    }
}

// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Issues BBS+-signed credentials and publishes the issuer's public key as a
//! verification method of the issuer's DID, which is the trust anchor
//! verifiers cross-check proofs against.
//!
//! Each credential's Poseidon hash is also attested with an ECDSA signature
//! by the identity controlling the issuer DID, so a zk presentation can be
//! traced to that DID without revealing hidden attributes.

use ark_ff::{BigInteger, PrimeField};
use ethers_core::types::H256;
use log::info;
use std::sync::Arc;

use crate::bbs::backend::BbsBackend;
use crate::contracts::did_registry::DIDRegistry;
use crate::errors::{CodecError, ProofError, ProofResult, RegistryResult};
use crate::models::credential::Credential;
use crate::models::did::DIDDocument;
use crate::utils::crypto::hash_data;
use crate::utils::serialization::decimal_to_fr;
use crate::wallet::key_management::KeyManager;
use crate::zkp::poseidon::credential_hash;

const ATTESTATION_DOMAIN: &[u8] = b"credential-attestation:";

/// Digest the issuer signs for a credential hash (decimal field element).
///
/// # Errors
/// [`CodecError::InvalidFieldElement`] if `credential_hash` is not canonical.
pub fn attestation_digest(credential_hash: &str) -> Result<[u8; 32], CodecError> {
    let value = decimal_to_fr(credential_hash)?;
    let mut message = ATTESTATION_DOMAIN.to_vec();
    message.extend(value.into_bigint().to_bytes_be());
    Ok(hash_data(&message))
}

/// Service issuing credentials under one DID.
#[derive(Clone)]
pub struct CredentialIssuer {
    /// Identity that controls the issuer DID
    key_manager: KeyManager,

    /// Signing backend holding the issuer's BBS+ key
    bbs: Arc<dyn BbsBackend>,

    did: String,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer instance
    ///
    /// # Arguments
    /// * `key_manager` - Identity key of the issuer, used as registry caller
    /// * `bbs` - BBS+ backend signing with the issuer's key
    /// * `did` - DID the issuer registers and signs under
    pub fn new(key_manager: KeyManager, bbs: Arc<dyn BbsBackend>, did: impl Into<String>) -> Self {
        CredentialIssuer {
            key_manager,
            bbs,
            did: did.into(),
        }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Hex encoding of the issuer's BBS+ public key.
    pub fn issuer_public_key(&self) -> String {
        self.bbs.public_key().to_hex()
    }

    /// Registers the issuer DID with the BBS+ public key as its verification method.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateId`](crate::errors::RegistryError::DuplicateId)
    /// if the DID is already registered.
    pub fn register_did(&self, registry: &DIDRegistry, services: Vec<String>) -> RegistryResult<DIDDocument> {
        let public_key = self.issuer_public_key();
        let data_hash = H256::from(hash_data(public_key.as_bytes()));
        registry.create_did(self.key_manager.address(), &self.did, vec![public_key], services, data_hash)
    }

    /// Publishes a rotated key set for the issuer DID.
    pub fn rotate_verification_methods(
        &self,
        registry: &DIDRegistry,
        verification_methods: Vec<String>,
        services: Vec<String>,
    ) -> RegistryResult<DIDDocument> {
        let data_hash = H256::from(hash_data(verification_methods.join(",").as_bytes()));
        registry.update_did(self.key_manager.address(), &self.did, verification_methods, services, data_hash)
    }

    /// Issues a credential over `attributes`.
    ///
    /// # Arguments
    /// * `user_secret` - Holder secret (decimal field element); only its
    ///   Poseidon binding enters the credential hash, and the issuer keeps no copy
    /// * `attributes` - Up to 10 decimal field elements
    /// * `schema_hash` - Schema digest (decimal field element)
    ///
    /// # Errors
    /// - [`ProofError::Codec`] for too many attributes or non-field values
    /// - [`ProofError::Backend`] if BBS+ signing fails
    /// - [`ProofError::Attestation`] if the hash cannot be signed
    pub fn issue_credential(
        &self,
        user_secret: &str,
        attributes: Vec<String>,
        schema_hash: &str,
    ) -> ProofResult<Credential> {
        let issuer_public_key = self.issuer_public_key();
        let hash = credential_hash(user_secret, &attributes, &issuer_public_key, schema_hash)?;
        let issuer_signature = self
            .key_manager
            .sign_digest(&attestation_digest(&hash)?)
            .map_err(ProofError::Attestation)?;
        let bbs_signature = self.bbs.sign(&attributes).map_err(ProofError::Backend)?;

        info!("credential issued by {} with {} attributes", self.did, attributes.len());
        Ok(Credential {
            hash,
            user_secret: user_secret.to_string(),
            attributes,
            issuer_public_key,
            schema_hash: schema_hash.to_string(),
            bbs_signature,
            issuer_signature,
        })
    }
}

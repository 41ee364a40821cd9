// src/models/credential.rs
//! Credential data model for zero-knowledge and BBS+ presentations.
//!
//! A credential carries up to [`MAX_ATTRIBUTES`] attribute values encoded as
//! BN254 field elements (decimal strings), so the same record can feed both the
//! credential circuit and a BBS+ signature over the attribute vector.

use ethers_core::types::Signature;
use serde::{Deserialize, Serialize};

use crate::utils::serialization::base64_bytes;

/// Number of attribute slots in the credential circuit.
pub const MAX_ATTRIBUTES: usize = 10;

/// Value occupying an unused attribute slot and marking an unrevealed signal.
///
/// A revealed attribute whose value is itself `0` reads the same as a hidden
/// or absent one.
pub const ZERO_SENTINEL: &str = "0";

/// A credential held by its subject.
///
/// Immutable once issued; changing any attribute means re-issuance.
///
/// # Fields
/// - `hash`: Poseidon digest of the attributes, issuer key, schema and the
///   holder's secret binding (see [`crate::zkp::poseidon`])
/// - `user_secret`: scalar known only to the holder
/// - `attributes`: at most 10 values, padded with `"0"` when proving
/// - `issuer_public_key`: hex encoding of the issuer's BBS+ public key
/// - `schema_hash`: digest identifying the attribute schema
/// - `bbs_signature`: issuer signature over the attribute vector
/// - `issuer_signature`: ECDSA attestation of `hash` by the identity
///   controlling the issuer's DID
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub hash: String,
    pub user_secret: String,
    pub attributes: Vec<String>,
    pub issuer_public_key: String,
    pub schema_hash: String,
    pub bbs_signature: BbsSignature,
    pub issuer_signature: Signature,
}

/// Opaque BBS+ signature binding a credential's attributes to its issuer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BbsSignature(#[serde(with = "base64_bytes")] pub Vec<u8>);

/// Public key of a BBS+ issuer.
///
/// Deliberately a different type from
/// [`ZkVerificationKey`](crate::models::proof::ZkVerificationKey): one cannot
/// be passed where the other is expected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BbsPublicKey(#[serde(with = "base64_bytes")] pub Vec<u8>);

impl BbsPublicKey {
    /// Hex form used in `Credential::issuer_public_key` and DID verification methods.
    pub fn to_hex(&self) -> String {
        ethers_core::utils::hex::encode(&self.0)
    }

    /// Parses the hex form stored on a credential.
    pub fn from_hex(encoded: &str) -> Result<Self, String> {
        ethers_core::utils::hex::decode(encoded.trim_start_matches("0x"))
            .map(BbsPublicKey)
            .map_err(|e| format!("issuer public key is not hex: {}", e))
    }
}

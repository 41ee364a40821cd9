// src/models/did.rs
//! Decentralized Identifier (DID) data model implementation.
//!
//! Defines the registry's record for a DID following the
//! [DID Core Specification](https://www.w3.org/TR/did-core/) loosely: the
//! document lists verification methods and services, and carries the
//! ownership and liveness state the registry enforces.

use chrono::{DateTime, Utc};
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};

/// A DID Document as stored by the registry.
///
/// # Invariants
/// - `id` is unique for the lifetime of the registry
/// - `controller` is set at creation and never reassigned
/// - `active` starts `true` and can only move to `false`
///
/// # DID Format
/// The `id` field should follow DID syntax, though the registry accepts any
/// string of any length:
/// ```text
/// did:<method>:<method-specific-id>
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DIDDocument {
    /// The complete DID string identifier
    /// Example: "did:example:123456789abcdefghi"
    pub id: String,

    /// Identity allowed to mutate this document
    pub controller: Address,

    /// Verification method descriptors, in registration order (may be empty)
    pub verification_methods: Vec<String>,

    /// Service descriptors, in registration order (may be empty)
    pub services: Vec<String>,

    /// Digest of the off-registry document content
    pub data_hash: H256,

    /// Liveness flag; `false` once deactivated
    pub active: bool,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl DIDDocument {
    /// Whether `key` is listed among the document's verification methods.
    pub fn has_verification_method(&self, key: &str) -> bool {
        self.verification_methods.iter().any(|method| method == key)
    }
}

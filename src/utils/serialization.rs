// src/utils/serialization.rs
//! Serialization utilities for the DID system.
//!
//! Provides serialization and deserialization functions for:
//! - JSON data structures
//! - BN254 field elements as canonical decimal strings
//! - Opaque byte blobs (proofs, keys) as base64 inside JSON

use ark_bn254::Fr as Bn254Fr;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json;
use std::str::FromStr;

use crate::errors::CodecError;

/// Serializes a value to a JSON string.
///
/// # Arguments
/// * `data` - The value to serialize (must implement `Serialize`)
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
///
/// # Arguments
/// * `data` - JSON string to deserialize
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if deserialization fails
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Renders a field element as its canonical decimal string ("0" for zero).
pub fn fr_to_decimal(value: &Bn254Fr) -> String {
    BigUint::from(value.into_bigint()).to_string()
}

/// Parses a canonical decimal string into a field element.
///
/// Values at or above the field modulus are rejected rather than reduced, so
/// two distinct strings never decode to the same element.
///
/// # Errors
/// [`CodecError::InvalidFieldElement`] for non-decimal input or out-of-range values.
pub fn decimal_to_fr(value: &str) -> Result<Bn254Fr, CodecError> {
    let trimmed = value.trim();
    let big = BigUint::from_str(trimmed).map_err(|e| CodecError::InvalidFieldElement {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    let modulus: BigUint = Bn254Fr::MODULUS.into();
    if big >= modulus {
        return Err(CodecError::InvalidFieldElement {
            value: value.to_string(),
            reason: "value exceeds the BN254 scalar field".into(),
        });
    }
    Ok(Bn254Fr::from(big))
}

/// Serde adapter storing `Vec<u8>` as a base64 string.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::decode(encoded).map_err(serde::de::Error::custom)
    }
}

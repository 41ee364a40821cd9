// src/utils/crypto.rs
//! Cryptographic utilities optimized for blockchain compatibility.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for all hashing, and
//! maps digests into the BN254 scalar field when a value has to enter the
//! credential circuit.

use ark_bn254::Fr as Bn254Fr;
use ark_ff::PrimeField;
use ethers_core::utils::keccak256;

use crate::utils::serialization::fr_to_decimal;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Hashes arbitrary bytes into a BN254 scalar.
///
/// The Keccak-256 digest is read big-endian and reduced modulo the field order.
pub fn hash_to_field(data: &[u8]) -> Bn254Fr {
    Bn254Fr::from_be_bytes_mod_order(&hash_data(data))
}

/// Field digest of an issuer key.
///
/// Issuer keys are hex strings of arbitrary length; the credential circuit
/// sees this digest of the lowercase hex without any `0x` prefix.
pub fn issuer_key_field(issuer_public_key: &str) -> Bn254Fr {
    hash_to_field(issuer_public_key.trim_start_matches("0x").to_lowercase().as_bytes())
}

/// Encodes a free-text attribute (a name, a country code, ...) as a decimal
/// field element suitable for a credential attribute slot.
///
/// # Example
/// ```
/// use did_proofs::utils::crypto::encode_text_attribute;
/// let value = encode_text_attribute("NL");
/// assert_ne!(value, "0");
/// ```
pub fn encode_text_attribute(text: &str) -> String {
    fr_to_decimal(&hash_to_field(text.as_bytes()))
}

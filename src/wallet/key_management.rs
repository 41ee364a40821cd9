// src/wallet/key_management.rs
//! Identity key management for registry participants.
//!
//! Registry callers are identified by Ethereum-style addresses derived from a
//! secp256k1 key (via `k256`), the same way a ledger identifies transaction
//! senders.

use ethers_core::types::{Address, Signature, H256, U256};
use ethers_core::utils::keccak256;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand::rngs::OsRng;

/// Holds one secp256k1 identity key.
///
/// # Security Notes
/// - The secret key is a private field; only [`KeyManager::secret_bytes`]
///   hands out a copy, for persisting the identity
/// - Keys are generated from the OS random source
#[derive(Clone)]
pub struct KeyManager {
    /// Private key
    secret_key: SecretKey,
    /// Derived public key for verification
    pub public_key: PublicKey,
}

impl KeyManager {
    /// Generates a new KeyManager with a fresh key.
    pub fn new() -> Self {
        let secret_key = SecretKey::random(&mut OsRng);
        let public_key = secret_key.public_key();
        KeyManager { secret_key, public_key }
    }

    /// Restores a KeyManager from a 32-byte big-endian secret scalar.
    ///
    /// # Errors
    /// Returns a message if the bytes are not a valid non-zero scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, String> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| format!("invalid secret key: {}", e))?;
        let public_key = secret_key.public_key();
        Ok(KeyManager { secret_key, public_key })
    }

    /// Ethereum address of this identity: the last 20 bytes of the
    /// Keccak-256 hash of the uncompressed public key (without its prefix).
    pub fn address(&self) -> Address {
        address_of(&self.public_key)
    }

    /// Secret scalar bytes, for persisting the identity.
    pub fn secret_bytes(&self) -> Vec<u8> {
        self.secret_key.to_bytes().to_vec()
    }

    /// Signs a 32-byte digest with deterministic ECDSA (RFC 6979).
    ///
    /// The signature is recoverable: [`recover_signer`] yields this
    /// identity's [`address`](Self::address).
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, String> {
        let signing_key = SigningKey::from(&self.secret_key);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| format!("failed to sign digest: {}", e))?;

        let bytes = signature.to_bytes();
        Ok(Signature {
            r: U256::from_big_endian(&bytes[..32]),
            s: U256::from_big_endian(&bytes[32..]),
            v: u64::from(recovery_id.to_byte()) + 27,
        })
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the address that identifies `public_key` as a registry caller.
pub fn address_of(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Address that produced `signature` over `digest`, if it recovers at all.
pub fn recover_signer(digest: &[u8; 32], signature: &Signature) -> Option<Address> {
    signature.recover(H256::from(*digest)).ok()
}

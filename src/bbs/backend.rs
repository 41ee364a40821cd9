// src/bbs/backend.rs
//! Capability interface for a BBS+ signature backend.
//!
//! The scheme's internals stay behind this trait; the disclosure adapter and
//! the issuer service only ever see [`BbsBackend`].

use crate::errors::BackendError;
use crate::models::credential::{BbsPublicKey, BbsSignature};

/// Inputs to a BBS+ proof of knowledge.
#[derive(Debug, Clone)]
pub struct BbsProofRequest<'a> {
    pub signature: &'a BbsSignature,
    pub public_key: &'a BbsPublicKey,
    /// Full signed message vector, held by the prover only
    pub messages: &'a [String],
    /// Indices of `messages` to disclose
    pub revealed: &'a [usize],
    /// 32-byte proof-binding nonce
    pub nonce: &'a [u8; 32],
}

/// Opaque BBS+ sign/prove/verify primitive.
pub trait BbsBackend: Send + Sync {
    /// Public key of the issuer this backend signs for.
    fn public_key(&self) -> BbsPublicKey;

    /// Signs a message vector with the issuer's secret key.
    fn sign(&self, messages: &[String]) -> Result<BbsSignature, BackendError>;

    /// Produces a proof of knowledge of a signature over `messages` that
    /// discloses only `request.revealed`.
    fn prove(&self, request: &BbsProofRequest<'_>) -> Result<Vec<u8>, BackendError>;

    /// Checks a proof against the disclosed messages and nonce.
    ///
    /// `Ok(false)` for a well-formed proof that does not verify.
    fn verify(
        &self,
        public_key: &BbsPublicKey,
        proof: &[u8],
        revealed: &[(usize, String)],
        nonce: &[u8; 32],
    ) -> Result<bool, BackendError>;
}

#[cfg(test)]
pub(crate) mod tests {
    //! Keyed-hash stand-in for a BBS+ backend. Exercises the adapter's
    //! plumbing only; it has none of the scheme's security properties.

    use super::*;
    use crate::utils::crypto::hash_data;

    pub(crate) struct HashBbsBackend {
        secret: [u8; 32],
    }

    impl HashBbsBackend {
        pub(crate) fn new(seed: &str) -> Self {
            HashBbsBackend {
                secret: hash_data(seed.as_bytes()),
            }
        }

        fn key_bytes(&self) -> Vec<u8> {
            hash_data(&self.secret).to_vec()
        }

        fn mac(&self, label: &[u8], parts: &[&[u8]]) -> Vec<u8> {
            let mut buffer = self.key_bytes();
            buffer.extend_from_slice(label);
            for part in parts {
                buffer.extend_from_slice(&(part.len() as u64).to_be_bytes());
                buffer.extend_from_slice(part);
            }
            hash_data(&buffer).to_vec()
        }

        fn disclosure_tag(&self, revealed: &[(usize, String)], nonce: &[u8; 32]) -> Vec<u8> {
            let mut parts: Vec<Vec<u8>> = vec![nonce.to_vec()];
            for (index, value) in revealed {
                parts.push((*index as u64).to_be_bytes().to_vec());
                parts.push(value.as_bytes().to_vec());
            }
            let borrowed: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
            self.mac(b"proof", &borrowed)
        }
    }

    impl BbsBackend for HashBbsBackend {
        fn public_key(&self) -> BbsPublicKey {
            BbsPublicKey(self.key_bytes())
        }

        fn sign(&self, messages: &[String]) -> Result<BbsSignature, BackendError> {
            let parts: Vec<&[u8]> = messages.iter().map(|m| m.as_bytes()).collect();
            Ok(BbsSignature(self.mac(b"sign", &parts)))
        }

        fn prove(&self, request: &BbsProofRequest<'_>) -> Result<Vec<u8>, BackendError> {
            if request.public_key != &self.public_key() {
                return Err(BackendError::KeyMismatch("unknown issuer key".into()));
            }
            if self.sign(request.messages)? != *request.signature {
                return Err(BackendError::MalformedWitness("signature does not cover messages".into()));
            }
            let revealed: Vec<(usize, String)> = request
                .revealed
                .iter()
                .filter_map(|&i| request.messages.get(i).map(|m| (i, m.clone())))
                .collect();
            Ok(self.disclosure_tag(&revealed, request.nonce))
        }

        fn verify(
            &self,
            public_key: &BbsPublicKey,
            proof: &[u8],
            revealed: &[(usize, String)],
            nonce: &[u8; 32],
        ) -> Result<bool, BackendError> {
            if public_key != &self.public_key() {
                return Err(BackendError::KeyMismatch("unknown issuer key".into()));
            }
            Ok(proof == self.disclosure_tag(revealed, nonce).as_slice())
        }
    }
}

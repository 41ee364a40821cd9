// src/lib.rs

//! # Credential Proofs and DID Registry
//!
//! Privacy-preserving proofs of credential possession with selective
//! attribute disclosure, plus a registry of decentralized identifiers with
//! controller-owned lifecycle state.
//!
//! ## Architecture Overview
//! 1. **Proof Layer**: `zkp` (attribute codec, Groth16 backend, proof engine)
//!    and `bbs` (BBS+ selective disclosure adapter)
//! 2. **Registry Layer**: `contracts` (DID state machine and events) persisted
//!    through `storage`
//! 3. **Services Layer**: credential issuance and presentation verification,
//!    with the registry as the issuer trust anchor
//! 4. **Cryptography Layer**: identity keys (`wallet`) and hashing (`utils`)
//!
//! ## Environment Variables
//! See [`config`] for the `DIDPROOF__*` settings.

pub mod bbs;        // BBS+ selective disclosure
pub mod config;     // Layered settings
pub mod contracts;  // DID registry state machine
pub mod errors;     // Error taxonomy
pub mod models;     // Data structures
pub mod services;   // Issuer and verifier
pub mod storage;    // Ledger snapshot persistence
pub mod utils;      // Helper functions
pub mod wallet;     // Identity key operations
pub mod zkp;        // Zero-knowledge proof engine

/// Initialises `env_logger` with `default_level` unless `RUST_LOG` is set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already initialised");
    }
}

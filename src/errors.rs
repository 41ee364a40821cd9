// src/errors.rs
//! Error taxonomy for the registry and proof subsystems.
//!
//! Registry errors are security-relevant and always surface verbatim to the
//! caller. Proof errors distinguish "the system could not evaluate the proof"
//! (an `Err`) from "the proof says no" (`Ok(false)` from the verify calls).

use thiserror::Error;

/// Failures of the DID registry state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A document with this id already exists, in any lifecycle state.
    #[error("DID already exists: {0}")]
    DuplicateId(String),

    /// No document was ever created under this id.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// The caller lacks the privilege required for the operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),
}

/// Failures of the fixed-width attribute encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A credential carried more attributes than the circuit has slots.
    #[error("credential has {found} attributes, at most {max} are supported")]
    TooManyAttributes { found: usize, max: usize },

    /// A value could not be read as a canonical field element.
    #[error("invalid field element {value:?}: {reason}")]
    InvalidFieldElement { value: String, reason: String },
}

/// Failures reported by an opaque proving backend (zk or BBS+).
///
/// The proof engine and disclosure adapter wrap these without reinterpreting them.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("malformed witness: {0}")]
    MalformedWitness(String),

    #[error("key material mismatch: {0}")]
    KeyMismatch(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("prover failed: {0}")]
    Prover(String),
}

/// Failures of the proof subsystem.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The prove primitive failed; nothing was produced.
    #[error("proof generation failed: {0}")]
    Generation(#[source] BackendError),

    /// The verify (or BBS+) primitive could not evaluate its inputs.
    #[error("proof backend failed: {0}")]
    Backend(#[source] BackendError),

    /// Public signals do not match the expected layout.
    #[error("malformed public signals: expected {expected} entries, got {found}")]
    MalformedSignals { expected: usize, found: usize },

    #[error("no verification key configured")]
    MissingVerificationKey,

    /// The issuer could not sign the credential hash.
    #[error("credential attestation failed: {0}")]
    Attestation(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The blocking task running the primitive was cancelled or panicked.
    #[error("proof task aborted: {0}")]
    TaskAborted(String),
}

/// Failures while loading or saving a registry snapshot.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures while checking a presentation against the registry.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("no BBS+ disclosure support configured")]
    DisclosureUnsupported,
}

pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ProofResult<T> = Result<T, ProofError>;

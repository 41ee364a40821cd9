// src/services/mod.rs
//! Issuer and verifier services built on the proof and registry layers.

pub mod credential_issuer;
pub mod verifier;

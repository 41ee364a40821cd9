// src/zkp/mod.rs
//! Zero-knowledge credential proofs: attribute encoding, the backend
//! interface, Poseidon digests, the Groth16 reference backend and the proof
//! engine.

pub mod attribute_codec;
pub mod backend;
pub mod circuit;
pub mod groth16_backend;
pub mod poseidon;
pub mod proof_engine;

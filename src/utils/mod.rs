// src/utils/mod.rs
//! Hashing and encoding helpers shared by every layer.

pub mod crypto;
pub mod serialization;

// src/wallet/mod.rs
//! Participant key material.

pub mod key_management;

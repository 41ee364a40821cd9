// src/contracts/mod.rs
//! DID registry state machine and its event stream.

pub mod did_registry;
pub mod events;

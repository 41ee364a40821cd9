// src/storage/mod.rs
//! Persistent storage for registry state.

pub mod ledger_snapshot;

// src/models/mod.rs
//! Data structures shared across the proof and registry layers.

pub mod credential;
pub mod did;
pub mod proof;

// src/bbs/mod.rs
//! BBS+ selective disclosure, independent of the zk-circuit path.

pub mod backend;
pub mod selective_disclosure;

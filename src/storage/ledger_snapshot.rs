// src/storage/ledger_snapshot.rs
//! File-backed persistence for registry state.
//!
//! Stands in for the ledger: the registry's full snapshot (documents, admin
//! set, event log) is written as JSON and reloaded at startup.
//!
//! # Features
//! - Atomic replacement: data is written to a sibling temp file, then renamed
//! - A missing file means "fresh deployment", not an error

use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::contracts::did_registry::{DIDRegistry, RegistrySnapshot};
use crate::errors::LedgerError;
use crate::utils::serialization::{deserialize, serialize};
use ethers_core::types::Address;

/// JSON snapshot store at a fixed path.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes `value` and atomically replaces the stored file.
    pub fn store_json<T: Serialize>(&self, value: &T) -> Result<(), LedgerError> {
        let json = serialize(value)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        fs::write(&staging, json.as_bytes())?;
        fs::rename(&staging, &self.path)?;
        debug!("ledger snapshot written to {}", self.path.display());
        Ok(())
    }

    /// Reads the stored file, or `None` if nothing was stored yet.
    pub fn retrieve_json<T: DeserializeOwned>(&self) -> Result<Option<T>, LedgerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(deserialize(&json)?))
    }

    /// Persists the registry's current state.
    pub fn save_registry(&self, registry: &DIDRegistry) -> Result<(), LedgerError> {
        self.store_json(&registry.snapshot())
    }

    /// Loads the registry, or deploys a fresh one owned by `deployer` if no
    /// snapshot exists yet.
    pub fn load_registry(&self, deployer: Address) -> Result<DIDRegistry, LedgerError> {
        match self.retrieve_json::<RegistrySnapshot>()? {
            Some(snapshot) => {
                info!(
                    "loaded registry snapshot with {} DIDs from {}",
                    snapshot.documents.len(),
                    self.path.display()
                );
                Ok(DIDRegistry::from_snapshot(snapshot))
            }
            None => Ok(DIDRegistry::new(deployer)),
        }
    }
}

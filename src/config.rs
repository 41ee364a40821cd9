// src/config.rs
//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional config file, then
//! environment variables prefixed `DIDPROOF__` (nested keys also use `__`, e.g.
//! `DIDPROOF__REGISTRY__SNAPSHOT_PATH`). A `.env` file is loaded first if present.
//!
//! ## Keys
//! - `log_level`: default filter for `env_logger` (default `info`)
//! - `registry.snapshot_path`: JSON ledger snapshot (default `registry.json`)
//! - `zk.verification_key_path`: base64-encoded Groth16 verification key
//! - `zk.signal_layout_version`: public-signal layout version (default `1`)

use anyhow::{anyhow, Context};
use config::{Config, Environment, File};
use dotenv::dotenv;
use ethers_core::types::Address;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::contracts::did_registry::DIDRegistry;
use crate::contracts::events::LogEventSink;
use crate::models::proof::ZkVerificationKey;
use crate::storage::ledger_snapshot::LedgerStore;
use crate::zkp::attribute_codec::SignalLayout;
use crate::zkp::backend::ZkBackend;
use crate::zkp::proof_engine::ProofEngine;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: String,
    pub registry: RegistrySettings,
    pub zk: ZkSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZkSettings {
    pub verification_key_path: Option<String>,
    pub signal_layout_version: u32,
}

impl Settings {
    /// Loads settings from defaults, `config_file` (if given and present) and
    /// the environment.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Settings> {
        dotenv().ok();

        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("registry.snapshot_path", "registry.json")?
            .set_default("zk.signal_layout_version", 1)?;
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .add_source(Environment::with_prefix("DIDPROOF").separator("__"))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Initialises `env_logger` at `log_level`; `RUST_LOG` still wins.
    pub fn init_logging(&self) {
        crate::init_logging(&self.log_level);
    }

    /// Public-signal layout selected by `zk.signal_layout_version`.
    pub fn signal_layout(&self) -> anyhow::Result<SignalLayout> {
        SignalLayout::for_version(self.zk.signal_layout_version)
            .ok_or_else(|| anyhow!("unknown signal layout version {}", self.zk.signal_layout_version))
    }

    /// Reads the verification key file, if one is configured.
    pub fn load_verification_key(&self) -> anyhow::Result<Option<ZkVerificationKey>> {
        let Some(path) = &self.zk.verification_key_path else {
            return Ok(None);
        };
        let encoded = fs::read_to_string(path)
            .with_context(|| format!("cannot read verification key {}", path))?;
        let bytes = base64::decode(encoded.trim())
            .with_context(|| format!("verification key {} is not base64", path))?;
        Ok(Some(ZkVerificationKey(bytes)))
    }

    /// Builds a proof engine over `backend` with the configured key and layout.
    pub fn proof_engine(&self, backend: Arc<dyn ZkBackend>) -> anyhow::Result<ProofEngine> {
        Ok(ProofEngine::new(backend, self.load_verification_key()?).with_layout(self.signal_layout()?))
    }

    /// Opens the ledger snapshot and loads (or deploys) the registry, with
    /// registry events forwarded to the logger.
    pub fn open_registry(&self, deployer: Address) -> anyhow::Result<(LedgerStore, DIDRegistry)> {
        let store = LedgerStore::new(&self.registry.snapshot_path);
        let registry = store
            .load_registry(deployer)
            .with_context(|| format!("cannot load registry from {}", self.registry.snapshot_path))?
            .with_event_sink(Arc::new(LogEventSink));
        Ok((store, registry))
    }
}

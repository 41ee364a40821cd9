// src/contracts/events.rs
//! Append-only events emitted by the DID registry.

use ethers_core::types::{Address, H256};
use log::info;
use serde::{Deserialize, Serialize};

/// A committed registry state change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    DIDCreated { id: String, controller: Address },
    DIDUpdated { id: String, data_hash: H256 },
    DIDDeactivated { id: String },
    AdminAdded { admin: Address },
}

/// Receiver for registry events, e.g. a ledger's event log.
///
/// Called while the registry's write lock is held, once per committed
/// mutation and in log order. Implementations must not call back into the
/// registry.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RegistryEvent);
}

/// Sink that writes each event to the `log` facade.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::DIDCreated { id, controller } => {
                info!("DIDCreated id={} controller={:?}", id, controller)
            }
            RegistryEvent::DIDUpdated { id, data_hash } => {
                info!("DIDUpdated id={} dataHash={:?}", id, data_hash)
            }
            RegistryEvent::DIDDeactivated { id } => info!("DIDDeactivated id={}", id),
            RegistryEvent::AdminAdded { admin } => info!("AdminAdded admin={:?}", admin),
        }
    }
}

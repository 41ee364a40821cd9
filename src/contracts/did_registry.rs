// src/contracts/did_registry.rs
//! DID Registry state machine.
//!
//! Owns every DID document and the admin set, and enforces:
//! - ids are unique forever; creating an existing id fails, whatever its state
//! - only a document's controller may update or deactivate it
//! - deactivation is terminal: a deactivated document accepts no further
//!   mutation from anyone, the controller included
//! - only admins may add admins; the deployer is the first admin
//!
//! Lifecycle per id: `nonexistent -> active -> deactivated`.
//!
//! ## Concurrency
//! All state sits behind one `RwLock`. Each mutation holds the write lock for
//! its whole read-modify-write, including delivery of its event to the
//! attached [`EventSink`], so sinks observe events in log order. Reads share
//! the read lock.

use chrono::Utc;
use ethers_core::types::{Address, H256};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::contracts::events::{EventSink, RegistryEvent};
use crate::errors::{RegistryError, RegistryResult};
use crate::models::did::DIDDocument;

/// Complete registry state, as persisted by the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub documents: BTreeMap<String, DIDDocument>,
    pub admins: BTreeSet<Address>,
    pub events: Vec<RegistryEvent>,
}

/// In-process DID registry.
pub struct DIDRegistry {
    state: RwLock<RegistrySnapshot>,
    sink: Option<Arc<dyn EventSink>>,
}

impl DIDRegistry {
    /// Creates an empty registry whose only admin is `deployer`.
    pub fn new(deployer: Address) -> Self {
        let mut snapshot = RegistrySnapshot::default();
        snapshot.admins.insert(deployer);
        info!("DID registry initialised, deployer {:?}", deployer);
        Self::from_snapshot(snapshot)
    }

    /// Restores a registry from persisted state.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        DIDRegistry {
            state: RwLock::new(snapshot),
            sink: None,
        }
    }

    /// Forwards every committed event to `sink` as well as the internal log.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Consistent copy of the whole state, for persistence.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistrySnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistrySnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `event` to the log and forwards it to the sink. Callers hold the
    /// write guard for `state`.
    fn record(&self, state: &mut RegistrySnapshot, event: RegistryEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(&event);
        }
        state.events.push(event);
    }

    /// Registers a new DID controlled by `caller`.
    ///
    /// # Arguments
    /// * `caller` - Identity submitting the call; becomes the controller
    /// * `id` - DID string, any length
    /// * `verification_methods` / `services` - Initial descriptors (may be empty)
    /// * `data_hash` - Digest of the document content
    ///
    /// # Errors
    /// [`RegistryError::DuplicateId`] if `id` was ever created; state is unchanged.
    pub fn create_did(
        &self,
        caller: Address,
        id: &str,
        verification_methods: Vec<String>,
        services: Vec<String>,
        data_hash: H256,
    ) -> RegistryResult<DIDDocument> {
        let document = {
            let mut state = self.write();
            if state.documents.contains_key(id) {
                warn!("rejected duplicate DID {}", id);
                return Err(RegistryError::DuplicateId(id.to_string()));
            }

            let now = Utc::now();
            let document = DIDDocument {
                id: id.to_string(),
                controller: caller,
                verification_methods,
                services,
                data_hash,
                active: true,
                created: now,
                updated: now,
            };
            state.documents.insert(id.to_string(), document.clone());
            self.record(
                &mut state,
                RegistryEvent::DIDCreated {
                    id: id.to_string(),
                    controller: caller,
                },
            );
            document
        };

        info!("DID created: {} controller {:?}", id, caller);
        Ok(document)
    }

    /// Replaces a DID's verification methods, services and data hash.
    ///
    /// Controller and `active` are left untouched.
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] if `id` was never created
    /// - [`RegistryError::NotAuthorized`] if `caller` is not the controller, or
    ///   the DID is deactivated
    pub fn update_did(
        &self,
        caller: Address,
        id: &str,
        verification_methods: Vec<String>,
        services: Vec<String>,
        data_hash: H256,
    ) -> RegistryResult<DIDDocument> {
        let document = {
            let mut state = self.write();
            let document = state
                .documents
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            authorize_mutation(document, caller)?;

            document.verification_methods = verification_methods;
            document.services = services;
            document.data_hash = data_hash;
            document.updated = Utc::now();
            let document = document.clone();

            self.record(
                &mut state,
                RegistryEvent::DIDUpdated {
                    id: id.to_string(),
                    data_hash,
                },
            );
            document
        };

        debug!("DID updated: {} dataHash {:?}", id, data_hash);
        Ok(document)
    }

    /// Permanently deactivates a DID.
    ///
    /// # Errors
    /// Same as [`Self::update_did`]; deactivating twice is `NotAuthorized`.
    pub fn deactivate_did(&self, caller: Address, id: &str) -> RegistryResult<DIDDocument> {
        let document = {
            let mut state = self.write();
            let document = state
                .documents
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            authorize_mutation(document, caller)?;

            document.active = false;
            document.updated = Utc::now();
            let document = document.clone();

            self.record(&mut state, RegistryEvent::DIDDeactivated { id: id.to_string() });
            document
        };

        info!("DID deactivated: {}", id);
        Ok(document)
    }

    /// Liveness of `id`: `true` only while it exists and is active.
    pub fn verify_did(&self, id: &str) -> bool {
        self.read().documents.get(id).map(|doc| doc.active).unwrap_or(false)
    }

    /// Resolves `id` to its current document, active or not.
    pub fn get_did_document(&self, id: &str) -> RegistryResult<DIDDocument> {
        self.read()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Grants admin privilege to `identity`. Adding an existing admin is a no-op.
    ///
    /// # Errors
    /// [`RegistryError::NotAuthorized`] if `caller` is not an admin.
    pub fn add_admin(&self, caller: Address, identity: Address) -> RegistryResult<()> {
        {
            let mut state = self.write();
            if !state.admins.contains(&caller) {
                warn!("non-admin {:?} attempted to add admin {:?}", caller, identity);
                return Err(RegistryError::NotAuthorized("admin access required".into()));
            }
            if !state.admins.insert(identity) {
                return Ok(());
            }
            self.record(&mut state, RegistryEvent::AdminAdded { admin: identity });
        }

        info!("admin added: {:?}", identity);
        Ok(())
    }

    pub fn is_admin(&self, identity: Address) -> bool {
        self.read().admins.contains(&identity)
    }

    /// Ids of every DID `controller` created, in id order.
    pub fn dids_controlled_by(&self, controller: Address) -> Vec<String> {
        self.read()
            .documents
            .values()
            .filter(|doc| doc.controller == controller)
            .map(|doc| doc.id.clone())
            .collect()
    }

    pub fn did_count(&self) -> usize {
        self.read().documents.len()
    }

    /// Every event committed so far, oldest first.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.read().events.clone()
    }
}

fn authorize_mutation(document: &DIDDocument, caller: Address) -> RegistryResult<()> {
    if document.controller != caller {
        warn!("caller {:?} is not controller of {}", caller, document.id);
        return Err(RegistryError::NotAuthorized(format!(
            "{:?} does not control {}",
            caller, document.id
        )));
    }
    if !document.active {
        return Err(RegistryError::NotAuthorized(format!("{} is deactivated", document.id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::events::LogEventSink;
    use ethers_core::utils::keccak256;
    use std::sync::Mutex;
    use std::thread;

    fn owner() -> Address {
        Address::from_low_u64_be(1)
    }
    fn user1() -> Address {
        Address::from_low_u64_be(2)
    }
    fn user2() -> Address {
        Address::from_low_u64_be(3)
    }

    fn hash_of(text: &str) -> H256 {
        H256::from(keccak256(text.as_bytes()))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn create(registry: &DIDRegistry, caller: Address, id: &str) -> RegistryResult<DIDDocument> {
        registry.create_did(caller, id, strings(&["key1"]), strings(&["service1"]), hash_of("test"))
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<RegistryEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: &RegistryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn deployer_is_admin() {
        let registry = DIDRegistry::new(owner());
        assert!(registry.is_admin(owner()));
        assert!(!registry.is_admin(user1()));
    }

    #[test]
    fn create_sets_controller_and_emits_event() {
        let sink = Arc::new(RecordingSink::default());
        let registry = DIDRegistry::new(owner()).with_event_sink(sink.clone());
        let id = "did:example:123456789";

        let doc = registry
            .create_did(user1(), id, strings(&["key1", "key2"]), strings(&["service1"]), hash_of("test data"))
            .unwrap();
        assert_eq!(doc.controller, user1());
        assert!(doc.active);

        let stored = registry.get_did_document(id).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.verification_methods[0], "key1");

        let expected = RegistryEvent::DIDCreated {
            id: id.into(),
            controller: user1(),
        };
        assert_eq!(registry.events(), vec![expected.clone()]);
        assert_eq!(*sink.0.lock().unwrap(), vec![expected]);
    }

    #[test]
    fn duplicate_create_is_rejected_without_side_effects() {
        let registry = DIDRegistry::new(owner());
        create(&registry, user1(), "did:example:duplicate").unwrap();
        let before = registry.snapshot();

        for caller in [user1(), user2(), owner()] {
            let err = registry
                .create_did(caller, "did:example:duplicate", vec![], vec![], hash_of("other"))
                .unwrap_err();
            assert_eq!(err, RegistryError::DuplicateId("did:example:duplicate".into()));
        }
        assert_eq!(registry.snapshot(), before);

        registry.deactivate_did(user1(), "did:example:duplicate").unwrap();
        assert!(matches!(
            create(&registry, user2(), "did:example:duplicate"),
            Err(RegistryError::DuplicateId(_))
        ));
    }

    #[test]
    fn controller_may_update() {
        let registry = DIDRegistry::new(owner());
        let created = create(&registry, user1(), "did:example:update-test").unwrap();

        let new_hash = hash_of("updated");
        let doc = registry
            .update_did(
                user1(),
                "did:example:update-test",
                strings(&["key1", "key2"]),
                strings(&["service1", "service2"]),
                new_hash,
            )
            .unwrap();
        assert_eq!(doc.verification_methods.len(), 2);
        assert_eq!(doc.services.len(), 2);
        assert_eq!(doc.controller, user1());
        assert!(doc.active);
        assert_eq!(doc.created, created.created);
        assert_eq!(
            registry.events().last(),
            Some(&RegistryEvent::DIDUpdated {
                id: "did:example:update-test".into(),
                data_hash: new_hash,
            })
        );
    }

    #[test]
    fn non_controller_cannot_update_or_deactivate() {
        let registry = DIDRegistry::new(owner());
        create(&registry, user1(), "did:example:123").unwrap();
        let before = registry.get_did_document("did:example:123").unwrap();

        let err = registry
            .update_did(user2(), "did:example:123", strings(&["malicious-key"]), vec![], hash_of("malicious"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotAuthorized(_)));

        // admins get no special mutation rights either
        assert!(matches!(
            registry.deactivate_did(owner(), "did:example:123"),
            Err(RegistryError::NotAuthorized(_))
        ));
        assert_eq!(registry.get_did_document("did:example:123").unwrap(), before);
    }

    #[test]
    fn missing_did_is_not_found() {
        let registry = DIDRegistry::new(owner());
        assert_eq!(
            registry.update_did(user1(), "did:example:ghost", vec![], vec![], H256::zero()),
            Err(RegistryError::NotFound("did:example:ghost".into()))
        );
        assert!(matches!(
            registry.deactivate_did(user1(), "did:example:ghost"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.get_did_document("did:example:ghost"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn liveness_follows_lifecycle() {
        let registry = DIDRegistry::new(owner());
        let id = "did:example:deactivated";
        assert!(!registry.verify_did(id));

        create(&registry, user1(), id).unwrap();
        assert!(registry.verify_did(id));

        let doc = registry.deactivate_did(user1(), id).unwrap();
        assert!(!doc.active);
        assert!(!registry.verify_did(id));

        // deactivation is terminal for everyone, controller included
        assert!(matches!(
            registry.deactivate_did(user1(), id),
            Err(RegistryError::NotAuthorized(_))
        ));
        assert!(matches!(
            registry.update_did(user1(), id, vec![], vec![], hash_of("revive")),
            Err(RegistryError::NotAuthorized(_))
        ));
        assert!(!registry.verify_did(id));
        assert_eq!(registry.get_did_document(id).unwrap().controller, user1());
    }

    #[test]
    fn admin_management() {
        let registry = DIDRegistry::new(owner());
        assert!(matches!(
            registry.add_admin(user1(), user2()),
            Err(RegistryError::NotAuthorized(_))
        ));
        assert!(!registry.is_admin(user2()));

        registry.add_admin(owner(), user1()).unwrap();
        assert!(registry.is_admin(user1()));
        let after_first = registry.snapshot();

        registry.add_admin(owner(), user1()).unwrap();
        assert_eq!(registry.snapshot(), after_first);

        // new admins can extend the set themselves
        registry.add_admin(user1(), user2()).unwrap();
        assert!(registry.is_admin(user2()));
    }

    #[test]
    fn edge_case_documents() {
        let registry = DIDRegistry::new(owner());
        let doc = registry
            .create_did(user1(), "did:example:empty-methods", vec![], strings(&["service1"]), hash_of("empty"))
            .unwrap();
        assert!(doc.verification_methods.is_empty());
        assert!(doc.active);

        let long_id = format!("did:example:{}", "a".repeat(100));
        create(&registry, user1(), &long_id).unwrap();
        assert!(registry.verify_did(&long_id));

        create(&registry, user1(), "did:example:user1-second").unwrap();
        assert_eq!(registry.dids_controlled_by(user1()).len(), 3);
        assert!(registry.dids_controlled_by(user2()).is_empty());
        assert_eq!(registry.did_count(), 3);
    }

    #[test]
    fn concurrent_creates_admit_exactly_one_winner() {
        let registry = Arc::new(DIDRegistry::new(owner()));
        let handles: Vec<_> = (0..16u64)
            .map(|n| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || create(&registry, Address::from_low_u64_be(100 + n), "did:example:race"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(
            registry.get_did_document("did:example:race").unwrap().controller,
            winners[0].controller
        );
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn snapshot_restores_state() {
        let registry = DIDRegistry::new(owner());
        create(&registry, user1(), "did:example:persisted").unwrap();
        registry.add_admin(owner(), user2()).unwrap();

        let restored = DIDRegistry::from_snapshot(registry.snapshot());
        assert!(restored.verify_did("did:example:persisted"));
        assert!(restored.is_admin(user2()));
        assert_eq!(restored.events(), registry.events());
    }

    #[test]
    fn sink_sees_events_in_log_order_under_contention() {
        let sink = Arc::new(RecordingSink::default());
        let registry = Arc::new(DIDRegistry::new(owner()).with_event_sink(sink.clone()));
        let handles: Vec<_> = (0..8u64)
            .map(|n| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let caller = Address::from_low_u64_be(200 + n);
                    let id = format!("did:example:worker-{}", n);
                    create(&registry, caller, &id).unwrap();
                    for round in 0..10 {
                        registry
                            .update_did(caller, &id, vec![], vec![], hash_of(&format!("{}-{}", n, round)))
                            .unwrap();
                    }
                    registry.deactivate_did(caller, &id).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let delivered = sink.0.lock().unwrap().clone();
        assert_eq!(delivered.len(), 8 * 12);
        assert_eq!(delivered, registry.events());
    }

    #[test]
    fn log_sink_accepts_every_event_kind() {
        crate::init_logging("debug");
        let registry = DIDRegistry::new(owner()).with_event_sink(Arc::new(LogEventSink));
        create(&registry, user1(), "did:example:logged").unwrap();
        registry
            .update_did(user1(), "did:example:logged", vec![], vec![], hash_of("v2"))
            .unwrap();
        registry.deactivate_did(user1(), "did:example:logged").unwrap();
        registry.add_admin(owner(), user2()).unwrap();
        assert_eq!(registry.events().len(), 4);
    }
}

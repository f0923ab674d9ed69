//! Session: the lifetime of one tracker run.
//!
//! Load-once / save-once semantics:
//!   1. `open` loads every collection (failures -> empty collection, logged)
//!   2. loaded state is checked against the invariants (warn only)
//!   3. the engine handles all operations in memory
//!   4. `save_all` writes every collection; one failure does not stop the rest
//!
//! A collection that could not be read is never written back: its file
//! stays as found and `save_all` reports it as failed.

use std::rc::Rc;

use tracing::{debug, info, warn};

use maint_engine::domain::{Asset, Department, Material, Order, Technician, TrackerConstants};
use maint_engine::engine::MaintenanceEngine;
use maint_engine::hashing::canonical_hash;
use maint_engine::invariants::validate_invariants;
use maint_engine::ports::{ActivityLog, Clock};
use maint_engine::state::{Collections, Counters, TrackerState};
use maint_engine::store::Keyed;

use crate::codec::CollectionFile;
use crate::collection_store::{BinaryFile, CollectionPort};
use crate::config::StorageConfig;

/// One persistence port per collection.
pub struct Ports {
    pub departments: Box<dyn CollectionPort<Department>>,
    pub assets: Box<dyn CollectionPort<Asset>>,
    pub technicians: Box<dyn CollectionPort<Technician>>,
    pub orders: Box<dyn CollectionPort<Order>>,
    pub materials: Box<dyn CollectionPort<Material>>,
}

impl Ports {
    /// Flat binary files laid out as configured.
    pub fn files(storage: &StorageConfig) -> Self {
        Self {
            departments: Box::new(BinaryFile::new(storage.path(&storage.departments_file))),
            assets: Box::new(BinaryFile::new(storage.path(&storage.assets_file))),
            technicians: Box::new(BinaryFile::new(storage.path(&storage.technicians_file))),
            orders: Box::new(BinaryFile::new(storage.path(&storage.orders_file))),
            materials: Box::new(BinaryFile::new(storage.path(&storage.materials_file))),
        }
    }
}

/// Outcome of `save_all`, one entry per collection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SaveReport {
    pub saved: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Session {
    engine: MaintenanceEngine,
    ports: Ports,
    log: Rc<dyn ActivityLog>,
    unreadable: Vec<&'static str>,
}

impl Session {
    pub fn open(ports: Ports, clock: Box<dyn Clock>, log: Rc<dyn ActivityLog>) -> Self {
        let mut unreadable = Vec::new();
        let departments = load_one(ports.departments.as_ref(), log.as_ref(), &mut unreadable);
        let assets = load_one(ports.assets.as_ref(), log.as_ref(), &mut unreadable);
        let technicians = load_one(ports.technicians.as_ref(), log.as_ref(), &mut unreadable);
        let orders = load_one(ports.orders.as_ref(), log.as_ref(), &mut unreadable);
        let materials = load_one(ports.materials.as_ref(), log.as_ref(), &mut unreadable);

        let counters = Counters {
            available_assets: assets.counter.unwrap_or(0),
            active_departments: 0,
            active_technicians: technicians.counter.unwrap_or(0),
            open_orders: orders.counter.unwrap_or(0),
        };
        let state = TrackerState::from_collections(
            Collections {
                departments: departments.records,
                assets: assets.records,
                technicians: technicians.records,
                orders: orders.records,
                materials: materials.records,
            },
            counters,
            TrackerConstants::default(),
        );

        if let Err(violation) = validate_invariants(&state) {
            warn!(%violation, "loaded data violates an invariant");
            log.append(&format!("Warning: loaded data: {}", violation));
        }
        log_fingerprint("loaded", &state);
        info!(
            departments = state.departments.len(),
            assets = state.assets.len(),
            technicians = state.technicians.len(),
            orders = state.orders.len(),
            materials = state.materials.len(),
            "session opened"
        );

        let engine = MaintenanceEngine::new(state, clock, Box::new(Rc::clone(&log)));
        Self { engine, ports, log, unreadable }
    }

    /// Collections whose files failed to load and will not be overwritten.
    pub fn unreadable(&self) -> &[&'static str] {
        &self.unreadable
    }

    pub fn engine(&self) -> &MaintenanceEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MaintenanceEngine {
        &mut self.engine
    }

    pub fn state(&self) -> &TrackerState {
        self.engine.state()
    }

    /// Write every collection with its header counter.
    pub fn save_all(&self) -> SaveReport {
        let state = self.engine.state();
        log_fingerprint("saving", state);

        let mut report = SaveReport::default();
        self.save_one(self.ports.departments.as_ref(), state.departments.records(), 0, &mut report);
        self.save_one(
            self.ports.assets.as_ref(),
            state.assets.records(),
            state.counters.available_assets,
            &mut report,
        );
        self.save_one(
            self.ports.technicians.as_ref(),
            state.technicians.records(),
            state.counters.active_technicians,
            &mut report,
        );
        self.save_one(
            self.ports.orders.as_ref(),
            state.orders.records(),
            state.counters.open_orders,
            &mut report,
        );
        self.save_one(self.ports.materials.as_ref(), state.materials.records(), 0, &mut report);
        report
    }

    fn save_one<T: Keyed>(
        &self,
        port: &dyn CollectionPort<T>,
        records: &[T],
        counter: i32,
        report: &mut SaveReport,
    ) {
        if self.unreadable.contains(&T::COLLECTION) {
            warn!(collection = T::COLLECTION, "not saved, its file could not be read");
            self.log.append(&format!(
                "Error: {} not saved, its file could not be read at start",
                T::COLLECTION
            ));
            report
                .failed
                .push((T::COLLECTION, "file could not be read at start".to_string()));
            return;
        }
        match port.save(records, counter) {
            Ok(()) => {
                debug!(collection = T::COLLECTION, records = records.len(), "collection saved");
                report.saved.push(T::COLLECTION);
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "save failed");
                self.log.append(&format!("Error: could not save {}: {}", T::COLLECTION, e));
                report.failed.push((T::COLLECTION, e.to_string()));
            }
        }
    }
}

fn load_one<T: Keyed>(
    port: &dyn CollectionPort<T>,
    log: &dyn ActivityLog,
    unreadable: &mut Vec<&'static str>,
) -> CollectionFile<T> {
    match port.load() {
        Ok(file) => {
            debug!(collection = T::COLLECTION, records = file.records.len(), "collection loaded");
            file
        }
        Err(e) => {
            warn!(collection = T::COLLECTION, error = %e, "load failed, starting empty");
            log.append(&format!("Error: could not load {}: {}", T::COLLECTION, e));
            unreadable.push(T::COLLECTION);
            CollectionFile::empty()
        }
    }
}

fn log_fingerprint(stage: &str, state: &TrackerState) {
    match canonical_hash(state) {
        Ok(hash) => debug!(stage, %hash, "state fingerprint"),
        Err(e) => warn!(stage, error = %e, "state fingerprint unavailable"),
    }
}

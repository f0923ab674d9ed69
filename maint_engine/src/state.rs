/// Maintenance tracker: State Construction
///
/// The whole in-memory snapshot: five stores, the running counters and
/// the constants. Cloned by the engine before every mutation.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Activity, Asset, Department, Material, Order, Technician, TrackerConstants,
};
use crate::store::Store;

/// Running counters kept alongside the collections.
///
/// Three of them are persisted in the collection file headers, so they
/// are carried as stored values rather than recomputed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub available_assets: i32,
    pub active_departments: i32,
    pub active_technicians: i32,
    pub open_orders: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub departments: Store<Department>,
    pub assets: Store<Asset>,
    pub technicians: Store<Technician>,
    pub orders: Store<Order>,
    pub materials: Store<Material>,
    pub counters: Counters,
    pub constants: TrackerConstants,
}

/// Collections as loaded from (or about to be written to) persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub departments: Vec<Department>,
    pub assets: Vec<Asset>,
    pub technicians: Vec<Technician>,
    pub orders: Vec<Order>,
    pub materials: Vec<Material>,
}

/// Create a fresh, empty state.
pub fn create_initial_state(constants: Option<TrackerConstants>) -> TrackerState {
    let constants = constants.unwrap_or_default();
    let step = constants.growth_step;
    TrackerState {
        departments: Store::new(step),
        assets: Store::new(step),
        technicians: Store::new(step),
        orders: Store::new(step),
        materials: Store::new(step),
        counters: Counters::default(),
        constants,
    }
}

impl TrackerState {
    /// Rebuild a state from loaded collections and their stored counters.
    ///
    /// The department counter has no stored header and is recounted.
    pub fn from_collections(
        collections: Collections,
        counters: Counters,
        constants: TrackerConstants,
    ) -> Self {
        let step = constants.growth_step;
        let active_departments = collections
            .departments
            .iter()
            .filter(|d| d.activity == Activity::Active)
            .count();
        Self {
            departments: Store::from_records(collections.departments, step),
            assets: Store::from_records(collections.assets, step),
            technicians: Store::from_records(collections.technicians, step),
            orders: Store::from_records(collections.orders, step),
            materials: Store::from_records(collections.materials, step),
            counters: Counters {
                active_departments: i32::try_from(active_departments).unwrap_or(i32::MAX),
                ..counters
            },
            constants,
        }
    }

    pub fn to_collections(&self) -> Collections {
        Collections {
            departments: self.departments.records().to_vec(),
            assets: self.assets.records().to_vec(),
            technicians: self.technicians.records().to_vec(),
            orders: self.orders.records().to_vec(),
            materials: self.materials.records().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_empty() {
        let state = create_initial_state(None);
        assert!(state.assets.is_empty());
        assert!(state.orders.is_empty());
        assert_eq!(state.counters, Counters::default());
        assert_eq!(state.constants.first_id, 10);
    }

    #[test]
    fn test_from_collections_recounts_departments() {
        let collections = Collections {
            departments: vec![
                Department {
                    id: 10,
                    name: Some("Ops".into()),
                    responsible: None,
                    contact: None,
                    activity: Activity::Active,
                },
                Department {
                    id: 11,
                    name: Some("Old".into()),
                    responsible: None,
                    contact: None,
                    activity: Activity::Inactive,
                },
            ],
            ..Collections::default()
        };
        let stored = Counters {
            available_assets: 3,
            active_departments: 99,
            active_technicians: 2,
            open_orders: 1,
        };
        let state = TrackerState::from_collections(collections, stored, TrackerConstants::default());
        assert_eq!(state.counters.active_departments, 1);
        assert_eq!(state.counters.available_assets, 3);
        assert_eq!(state.departments.find(11), Some(1));
        assert_eq!(state.to_collections().departments.len(), 2);
    }
}

/// Maintenance tracker: Lookup Layer
///
/// Identifier resolution with each collection's relevance filter.
/// All lookups return a store position, or `None` when nothing relevant
/// matches. Callers check any further state themselves.

use crate::domain::{Activity, AssetState, OrderState};
use crate::state::TrackerState;

/// Asset by id, ignoring decommissioned assets.
pub fn find_asset(state: &TrackerState, id: i32) -> Option<usize> {
    state
        .assets
        .find_where(id, |a| a.state != AssetState::Decommissioned)
}

/// Order by id, only while Pending or in Execution.
pub fn find_open_order(state: &TrackerState, id: i32) -> Option<usize> {
    state.orders.find_where(id, |o| o.state.is_open())
}

/// Order by id in any state.
pub fn find_order(state: &TrackerState, id: i32) -> Option<usize> {
    state.orders.find(id)
}

/// Technician by id. Inactive technicians are still found.
pub fn find_technician(state: &TrackerState, id: i32) -> Option<usize> {
    state.technicians.find(id)
}

/// Department by id. Inactive departments are still found.
pub fn find_department(state: &TrackerState, id: i32) -> Option<usize> {
    state.departments.find(id)
}

pub fn find_active_department(state: &TrackerState, id: i32) -> Option<usize> {
    state
        .departments
        .find_where(id, |d| d.activity == Activity::Active)
}

pub fn has_operational_asset(state: &TrackerState) -> bool {
    state.assets.iter().any(|a| a.state == AssetState::Operational)
}

pub fn has_active_department(state: &TrackerState) -> bool {
    state
        .departments
        .iter()
        .any(|d| d.activity == Activity::Active)
}

/// Orders in Execution currently assigned to a technician.
pub fn execution_load(state: &TrackerState, technician_id: i32) -> usize {
    state
        .orders
        .iter()
        .filter(|o| o.state == OrderState::Execution && o.technician_id == Some(technician_id))
        .count()
}

/// Orders of any state linked to an asset.
pub fn orders_for_asset(state: &TrackerState, asset_id: i32) -> usize {
    state.orders.iter().filter(|o| o.asset_id == asset_id).count()
}

/// Maintenance tracker: Invariant Checks
///
/// Every check returns `Err(InvariantViolation)` on the first failure.
/// The engine runs `validate_touched` after each order transition; the
/// runtime runs `validate_invariants` once after loading from disk and
/// only reports what it finds.

use crate::domain::{Order, OrderState};
use crate::error::InvariantViolation;
use crate::lookup::execution_load;
use crate::state::TrackerState;
use crate::store::{Keyed, Store};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all checks over the whole state.
pub fn validate_invariants(state: &TrackerState) -> Result<(), InvariantViolation> {
    check_unique_ids(&state.departments)?;
    check_unique_ids(&state.assets)?;
    check_unique_ids(&state.technicians)?;
    check_unique_ids(&state.orders)?;
    for order in &state.orders {
        check_order_timestamps(order)?;
    }
    for technician in &state.technicians {
        check_occupancy(state, technician.id)?;
    }
    Ok(())
}

/// Checks limited to one order and the technician it names.
pub fn validate_touched(state: &TrackerState, order_pos: usize) -> Result<(), InvariantViolation> {
    let order = state.orders.get(order_pos).ok_or_else(|| {
        InvariantViolation::new("order_position", format!("no order at position {}", order_pos))
    })?;
    check_order_timestamps(order)?;
    if let Some(technician_id) = order.technician_id {
        check_occupancy(state, technician_id)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Start is unset exactly while Pending; end is set exactly when closed.
pub fn check_order_timestamps(order: &Order) -> Result<(), InvariantViolation> {
    let pending = order.state == OrderState::Pending;
    if pending == order.started.is_some() {
        return Err(InvariantViolation::new(
            "order_start_time",
            format!(
                "order {} is {} but its start time is {}",
                order.id,
                order.state,
                if order.started.is_some() { "set" } else { "unset" }
            ),
        ));
    }
    if order.state.is_terminal() != order.ended.is_some() {
        return Err(InvariantViolation::new(
            "order_end_time",
            format!(
                "order {} is {} but its end time is {}",
                order.id,
                order.state,
                if order.ended.is_some() { "set" } else { "unset" }
            ),
        ));
    }
    Ok(())
}

/// No technician holds more Execution orders than the cap.
pub fn check_occupancy(state: &TrackerState, technician_id: i32) -> Result<(), InvariantViolation> {
    let load = execution_load(state, technician_id);
    let cap = usize::try_from(state.constants.occupancy_cap).unwrap_or(0);
    if load > cap {
        return Err(InvariantViolation::new(
            "occupancy_cap",
            format!(
                "technician {} has {} orders in execution (cap {})",
                technician_id, load, cap
            ),
        ));
    }
    Ok(())
}

pub fn check_unique_ids<T: Keyed>(store: &Store<T>) -> Result<(), InvariantViolation> {
    match store.duplicate_keys().first() {
        Some(key) => Err(InvariantViolation::new(
            "unique_ids",
            format!("{} identifier {} appears more than once", T::COLLECTION, key),
        )),
        None => Ok(()),
    }
}

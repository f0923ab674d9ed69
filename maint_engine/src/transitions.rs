/// Maintenance tracker: Order Transitions
///
/// Planning is pure: `plan_creation` and `plan_advance` read the state and
/// return the new order plus the effects it has on linked records.
/// `apply_transition` then writes everything into a state the caller owns.
/// The engine always applies to a clone, so a rejected plan or a failed
/// apply never reaches the committed state.
///
/// Transition table:
///   (create)              -> Pending     asset Operational -> InMaintenance
///   Pending   + Assign    -> Execution   technician Busy, materials attached
///   Execution + Cancel    -> Cancelled   asset -> Operational
///   Execution + Conclude  -> Concluded   technician -> Active, asset -> Operational
///   Concluded / Cancelled                rejected, no change

use crate::arithmetic::adjust_counter;
use crate::commands::{validate_material, MaterialDraft, NewOrder, OrderCommand};
use crate::domain::{
    AssetState, MaintenanceType, Material, Order, OrderState, TechnicianState, Timestamp,
};
use crate::error::{EngineError, TransitionError};
use crate::lookup::{
    execution_load, find_asset, find_open_order, find_order, find_technician,
    has_operational_asset,
};
use crate::reports::order_cost;
use crate::state::TrackerState;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// A single change to a record linked to the order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetAssetState { position: usize, state: AssetState },
    SetTechnician {
        position: usize,
        state: TechnicianState,
        order_id: Option<i32>,
    },
    /// Corrective work finished on an asset: count it and book its cost.
    ChargeCorrective { position: usize, cost: f32 },
    AttachMaterial(Material),
    AvailableAssets(i32),
    OpenOrders(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Store position of the order, `None` for a new one.
    pub position: Option<usize>,
    pub order: Order,
    pub effects: Vec<Effect>,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Plan a new Pending order on an operational asset.
pub fn plan_creation(state: &TrackerState, cmd: &NewOrder) -> Result<Transition, TransitionError> {
    if !has_operational_asset(state) {
        return Err(TransitionError::NoOperationalAssets);
    }
    let asset_pos = find_asset(state, cmd.asset_id)
        .ok_or(TransitionError::AssetNotFound(cmd.asset_id))?;
    let asset = &state.assets.records()[asset_pos];
    if asset.state != AssetState::Operational {
        return Err(TransitionError::AssetUnavailable {
            id: asset.id,
            state: asset.state,
        });
    }

    let order = Order {
        id: state.orders.next_id(state.constants.first_id)?,
        asset_id: asset.id,
        department_id: asset.department_id,
        technician_id: None,
        state: OrderState::Pending,
        priority: cmd.priority,
        kind: cmd.kind,
        started: None,
        ended: None,
    };

    Ok(Transition {
        position: None,
        order,
        effects: vec![
            Effect::SetAssetState {
                position: asset_pos,
                state: AssetState::InMaintenance,
            },
            Effect::AvailableAssets(-1),
            Effect::OpenOrders(1),
        ],
    })
}

/// Check that a technician may take one more order.
///
/// Busy technicians are accepted as long as they are under the cap.
pub fn check_assignable(state: &TrackerState, technician_id: i32) -> Result<usize, TransitionError> {
    let pos = find_technician(state, technician_id)
        .ok_or(TransitionError::TechnicianNotFound(technician_id))?;
    if state.technicians.records()[pos].state == TechnicianState::Inactive {
        return Err(TransitionError::TechnicianInactive(technician_id));
    }
    let load = execution_load(state, technician_id);
    let cap = usize::try_from(state.constants.occupancy_cap).unwrap_or(0);
    if load >= cap {
        return Err(TransitionError::TechnicianAtCapacity {
            id: technician_id,
            load,
        });
    }
    Ok(pos)
}

/// Plan the next step of an open order.
pub fn plan_advance(
    state: &TrackerState,
    order_id: i32,
    command: &OrderCommand,
    now: Timestamp,
) -> Result<Transition, TransitionError> {
    let position = match find_open_order(state, order_id) {
        Some(pos) => pos,
        None => {
            return Err(match find_order(state, order_id) {
                Some(pos) => TransitionError::OrderClosed {
                    id: order_id,
                    state: state.orders.records()[pos].state,
                },
                None => TransitionError::OrderNotFound(order_id),
            })
        }
    };
    let current = &state.orders.records()[position];

    match (current.state, command) {
        (OrderState::Pending, OrderCommand::Assign { technician_id, materials }) => {
            plan_assign(state, position, current, *technician_id, materials, now)
        }
        (OrderState::Execution, OrderCommand::Cancel) => Ok(plan_close(
            state,
            position,
            current,
            OrderState::Cancelled,
            now,
        )),
        (OrderState::Execution, OrderCommand::Conclude) => Ok(plan_close(
            state,
            position,
            current,
            OrderState::Concluded,
            now,
        )),
        (order_state, cmd) => Err(TransitionError::CommandMismatch {
            id: order_id,
            state: order_state,
            command: cmd.name(),
        }),
    }
}

fn plan_assign(
    state: &TrackerState,
    position: usize,
    current: &Order,
    technician_id: i32,
    materials: &[MaterialDraft],
    now: Timestamp,
) -> Result<Transition, TransitionError> {
    let tech_pos = check_assignable(state, technician_id)?;
    for draft in materials {
        validate_material(draft).map_err(TransitionError::InvalidMaterial)?;
    }

    let mut order = current.clone();
    order.technician_id = Some(technician_id);
    order.state = OrderState::Execution;
    order.started = Some(now);

    let mut effects = vec![Effect::SetTechnician {
        position: tech_pos,
        state: TechnicianState::Busy,
        order_id: Some(order.id),
    }];
    effects.extend(materials.iter().map(|d| {
        Effect::AttachMaterial(Material {
            name: Some(d.name.clone()),
            unit_cost: d.unit_cost,
            quantity: d.quantity,
            order_id: order.id,
        })
    }));

    Ok(Transition {
        position: Some(position),
        order,
        effects,
    })
}

/// Cancel and Conclude share the asset release. Only Conclude frees the
/// technician and books corrective work on the asset.
fn plan_close(
    state: &TrackerState,
    position: usize,
    current: &Order,
    outcome: OrderState,
    now: Timestamp,
) -> Transition {
    let mut order = current.clone();
    order.state = outcome;
    order.ended = Some(now);

    let mut effects = Vec::new();
    let asset_pos = find_asset(state, order.asset_id);

    if outcome == OrderState::Concluded {
        let tech_pos = order
            .technician_id
            .and_then(|tid| find_technician(state, tid));
        if let Some(tech_pos) = tech_pos {
            let technician = &state.technicians.records()[tech_pos];
            let order_id = if technician.order_id == Some(order.id) {
                None
            } else {
                technician.order_id
            };
            effects.push(Effect::SetTechnician {
                position: tech_pos,
                state: TechnicianState::Active,
                order_id,
            });
        }
        if let (Some(asset_pos), MaintenanceType::Corrective) = (asset_pos, order.kind) {
            effects.push(Effect::ChargeCorrective {
                position: asset_pos,
                cost: order_cost(state, order.id),
            });
        }
    }

    if let Some(asset_pos) = asset_pos {
        effects.push(Effect::SetAssetState {
            position: asset_pos,
            state: AssetState::Operational,
        });
        effects.push(Effect::AvailableAssets(1));
    }
    effects.push(Effect::OpenOrders(-1));

    Transition {
        position: Some(position),
        order,
        effects,
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Write a planned transition into `state`. Returns the order's position.
///
/// May fail part-way on allocation; callers apply to a scratch copy.
pub fn apply_transition(state: &mut TrackerState, transition: Transition) -> Result<usize, EngineError> {
    for effect in transition.effects {
        apply_effect(state, effect)?;
    }
    match transition.position {
        Some(pos) => {
            if let Some(slot) = state.orders.get_mut(pos) {
                *slot = transition.order;
            }
            Ok(pos)
        }
        None => Ok(state.orders.insert(transition.order)?),
    }
}

fn apply_effect(state: &mut TrackerState, effect: Effect) -> Result<(), EngineError> {
    match effect {
        Effect::SetAssetState { position, state: next } => {
            if let Some(asset) = state.assets.get_mut(position) {
                asset.state = next;
            }
        }
        Effect::SetTechnician { position, state: next, order_id } => {
            if let Some(tech) = state.technicians.get_mut(position) {
                tech.state = next;
                tech.order_id = order_id;
            }
        }
        Effect::ChargeCorrective { position, cost } => {
            if let Some(asset) = state.assets.get_mut(position) {
                asset.corrective_count = asset.corrective_count.saturating_add(1);
                asset.accrued_cost += cost;
            }
        }
        Effect::AttachMaterial(material) => {
            state.materials.insert(material)?;
        }
        Effect::AvailableAssets(delta) => {
            state.counters.available_assets = adjust_counter(state.counters.available_assets, delta);
        }
        Effect::OpenOrders(delta) => {
            state.counters.open_orders = adjust_counter(state.counters.open_orders, delta);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;
    use crate::state::create_initial_state;

    const NOW: Timestamp = Timestamp { day: 2, month: 3, year: 2024, hour: 9, minute: 0, second: 0 };

    fn make_test_state() -> TrackerState {
        let mut state = create_initial_state(None);
        state
            .assets
            .insert(Asset {
                id: 10,
                name: Some("Forklift".into()),
                category: AssetCategory::Vehicle,
                location: Some("Dock".into()),
                acquired: CalendarDate { day: 1, month: 1, year: 2023 },
                decommissioned: None,
                state: AssetState::Operational,
                corrective_count: 0,
                accrued_cost: 0.0,
                unit_cost: 1000.0,
                department_id: 20,
            })
            .unwrap();
        state
            .technicians
            .insert(Technician {
                id: 10,
                name: Some("Rui".into()),
                specialty: Specialty::Mechanic,
                state: TechnicianState::Active,
                order_id: None,
            })
            .unwrap();
        state.counters.available_assets = 1;
        state.counters.active_technicians = 1;
        state
    }

    fn new_order() -> NewOrder {
        NewOrder {
            asset_id: 10,
            priority: Priority::High,
            kind: MaintenanceType::Corrective,
        }
    }

    #[test]
    fn test_creation_copies_department_and_reserves_asset() {
        let mut state = make_test_state();
        let plan = plan_creation(&state, &new_order()).unwrap();
        assert_eq!(plan.order.id, 10);
        assert_eq!(plan.order.department_id, 20);
        assert_eq!(plan.order.state, OrderState::Pending);
        apply_transition(&mut state, plan).unwrap();
        assert_eq!(state.assets.records()[0].state, AssetState::InMaintenance);
        assert_eq!(state.counters.available_assets, 0);
        assert_eq!(state.counters.open_orders, 1);
    }

    #[test]
    fn test_creation_rejects_busy_asset() {
        let mut state = make_test_state();
        let plan = plan_creation(&state, &new_order()).unwrap();
        apply_transition(&mut state, plan).unwrap();
        let err = plan_creation(&state, &new_order()).unwrap_err();
        assert_eq!(err, TransitionError::NoOperationalAssets);
    }

    #[test]
    fn test_assign_then_conclude_charges_corrective_work() {
        let mut state = make_test_state();
        let plan = plan_creation(&state, &new_order()).unwrap();
        apply_transition(&mut state, plan).unwrap();

        let assign = OrderCommand::Assign {
            technician_id: 10,
            materials: vec![MaterialDraft { name: "Belt".into(), unit_cost: 12.5, quantity: 2 }],
        };
        let plan = plan_advance(&state, 10, &assign, NOW).unwrap();
        apply_transition(&mut state, plan).unwrap();
        assert_eq!(state.orders.records()[0].state, OrderState::Execution);
        assert_eq!(state.orders.records()[0].started, Some(NOW));
        assert_eq!(state.technicians.records()[0].state, TechnicianState::Busy);
        assert_eq!(state.technicians.records()[0].order_id, Some(10));
        assert_eq!(state.materials.len(), 1);

        let plan = plan_advance(&state, 10, &OrderCommand::Conclude, NOW).unwrap();
        apply_transition(&mut state, plan).unwrap();
        let asset = &state.assets.records()[0];
        assert_eq!(asset.state, AssetState::Operational);
        assert_eq!(asset.corrective_count, 1);
        assert_eq!(asset.accrued_cost, 25.0);
        assert_eq!(state.technicians.records()[0].state, TechnicianState::Active);
        assert_eq!(state.technicians.records()[0].order_id, None);
        assert_eq!(state.counters.available_assets, 1);
        assert_eq!(state.counters.open_orders, 0);
    }

    #[test]
    fn test_cancel_leaves_technician_busy() {
        let mut state = make_test_state();
        let plan = plan_creation(&state, &new_order()).unwrap();
        apply_transition(&mut state, plan).unwrap();
        let assign = OrderCommand::Assign { technician_id: 10, materials: vec![] };
        let plan = plan_advance(&state, 10, &assign, NOW).unwrap();
        apply_transition(&mut state, plan).unwrap();

        let plan = plan_advance(&state, 10, &OrderCommand::Cancel, NOW).unwrap();
        apply_transition(&mut state, plan).unwrap();
        assert_eq!(state.orders.records()[0].state, OrderState::Cancelled);
        assert_eq!(state.technicians.records()[0].state, TechnicianState::Busy);
        assert_eq!(state.assets.records()[0].state, AssetState::Operational);
        assert_eq!(state.assets.records()[0].corrective_count, 0);
    }

    #[test]
    fn test_wrong_command_for_state() {
        let mut state = make_test_state();
        let plan = plan_creation(&state, &new_order()).unwrap();
        apply_transition(&mut state, plan).unwrap();
        let err = plan_advance(&state, 10, &OrderCommand::Conclude, NOW).unwrap_err();
        assert!(matches!(err, TransitionError::CommandMismatch { id: 10, .. }));
    }

    #[test]
    fn test_missing_order() {
        let state = make_test_state();
        let err = plan_advance(&state, 99, &OrderCommand::Cancel, NOW).unwrap_err();
        assert_eq!(err, TransitionError::OrderNotFound(99));
    }

    #[test]
    fn test_inactive_technician_rejected() {
        let mut state = make_test_state();
        state.technicians.get_mut(0).unwrap().state = TechnicianState::Inactive;
        assert_eq!(
            check_assignable(&state, 10).unwrap_err(),
            TransitionError::TechnicianInactive(10)
        );
        assert_eq!(
            check_assignable(&state, 11).unwrap_err(),
            TransitionError::TechnicianNotFound(11)
        );
    }
}

/// Maintenance tracker: Engine
///
/// Top-level orchestrator. Delegates order planning to transitions and
/// checks the touched records via invariants.
///
/// Every mutating operation follows the same sequence:
///   1. Clone the committed state
///   2. Validate input and apply the change to the clone
///   3. Check the touched records
///   4. Swap the clone in, or drop it and return the error

use tracing::{debug, error, info};

use crate::commands::{
    validate_department_name, validate_material, validate_person_name, DepartmentUpdate,
    MaterialDraft, NewAsset, NewDepartment, NewOrder, NewTechnician, OrderCommand,
};
use crate::domain::{
    Activity, Asset, AssetState, CalendarDate, Department, Material, OrderState, Technician,
    TechnicianState, Timestamp,
};
use crate::error::{EngineError, TransitionError};
use crate::invariants::validate_touched;
use crate::lookup::{
    execution_load, find_active_department, find_asset, find_department, find_technician,
    has_active_department,
};
use crate::ports::{ActivityLog, Clock};
use crate::state::TrackerState;
use crate::transitions::{apply_transition, check_assignable, plan_advance, plan_creation};

/// Stateful engine owning the tracker state and its collaborators.
pub struct MaintenanceEngine {
    state: TrackerState,
    clock: Box<dyn Clock>,
    log: Box<dyn ActivityLog>,
}

impl MaintenanceEngine {
    pub fn new(state: TrackerState, clock: Box<dyn Clock>, log: Box<dyn ActivityLog>) -> Self {
        Self { state, clock, log }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn into_state(self) -> TrackerState {
        self.state
    }

    fn today(&self) -> CalendarDate {
        CalendarDate::from(self.clock.now().date())
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::from(self.clock.now())
    }

    /// Run `op` against a scratch copy and keep it only on success.
    fn commit<R, F>(&mut self, action: &str, op: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut TrackerState) -> Result<R, EngineError>,
    {
        let mut next = self.state.clone();
        match op(&mut next) {
            Ok(result) => {
                self.state = next;
                Ok(result)
            }
            Err(err) => {
                self.record_failure(action, &err);
                Err(err)
            }
        }
    }

    fn record_failure(&self, action: &str, err: &EngineError) {
        match err {
            EngineError::Capacity(_)
            | EngineError::Invariant(_)
            | EngineError::Transition(TransitionError::Capacity(_)) => {
                error!(action, %err, "operation aborted");
                self.log.append(&format!("Error: {} aborted: {}", action, err));
            }
            _ => {
                debug!(action, %err, "operation rejected");
                self.log.append(&format!("Warning: {} rejected: {}", action, err));
            }
        }
    }

    fn record_success(&self, message: String) {
        info!("{}", message);
        self.log.append(&format!("Info: {}", message));
    }

    // -----------------------------------------------------------------------
    // Departments
    // -----------------------------------------------------------------------

    pub fn create_department(&mut self, cmd: NewDepartment) -> Result<i32, EngineError> {
        let id = self.commit("create department", |next| {
            validate_department_name(&cmd.name)?;
            validate_person_name(&cmd.responsible)?;
            cmd.contact.validate()?;
            let id = next.departments.next_id(next.constants.first_id)?;
            next.departments.insert(Department {
                id,
                name: Some(cmd.name),
                responsible: Some(cmd.responsible),
                contact: Some(cmd.contact.into_string()),
                activity: Activity::Active,
            })?;
            next.counters.active_departments += 1;
            Ok(id)
        })?;
        self.record_success(format!("department {} created", id));
        Ok(id)
    }

    pub fn update_department(&mut self, id: i32, update: DepartmentUpdate) -> Result<(), EngineError> {
        self.commit("update department", |next| {
            let pos = find_department(next, id).ok_or(EngineError::DepartmentNotFound(id))?;
            let field = match &update {
                DepartmentUpdate::Name(name) => validate_department_name(name),
                DepartmentUpdate::Responsible(name) => validate_person_name(name),
                DepartmentUpdate::Contact(contact) => contact.validate(),
            };
            field?;
            if let Some(dept) = next.departments.get_mut(pos) {
                match update {
                    DepartmentUpdate::Name(name) => dept.name = Some(name),
                    DepartmentUpdate::Responsible(name) => dept.responsible = Some(name),
                    DepartmentUpdate::Contact(contact) => dept.contact = Some(contact.into_string()),
                }
            }
            Ok(())
        })?;
        self.record_success(format!("department {} updated", id));
        Ok(())
    }

    /// Soft-deactivate a department. Its assets are left as they are.
    pub fn deactivate_department(&mut self, id: i32) -> Result<(), EngineError> {
        self.commit("deactivate department", |next| {
            let pos = find_department(next, id).ok_or(EngineError::DepartmentNotFound(id))?;
            let dept = next
                .departments
                .get_mut(pos)
                .ok_or(EngineError::DepartmentNotFound(id))?;
            if dept.activity == Activity::Inactive {
                return Err(EngineError::AlreadyInactive { kind: "department", id });
            }
            dept.activity = Activity::Inactive;
            next.counters.active_departments -= 1;
            Ok(())
        })?;
        self.record_success(format!("department {} deactivated", id));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assets
    // -----------------------------------------------------------------------

    pub fn create_asset(&mut self, cmd: NewAsset) -> Result<i32, EngineError> {
        let acquired = self.today();
        let id = self.commit("create asset", |next| {
            if !has_active_department(next) {
                return Err(EngineError::NoActiveDepartments);
            }
            if find_active_department(next, cmd.department_id).is_none() {
                return Err(match find_department(next, cmd.department_id) {
                    Some(_) => EngineError::DepartmentInactive(cmd.department_id),
                    None => EngineError::DepartmentNotFound(cmd.department_id),
                });
            }
            if cmd.name.trim().is_empty() {
                return Err(EngineError::Invalid {
                    field: "asset name",
                    reason: "must not be empty",
                });
            }
            if !cmd.unit_cost.is_finite() || cmd.unit_cost < 0.0 {
                return Err(EngineError::Invalid {
                    field: "unit cost",
                    reason: "must be a non-negative amount",
                });
            }
            let id = next.assets.next_id(next.constants.first_id)?;
            next.assets.insert(Asset {
                id,
                name: Some(cmd.name),
                category: cmd.category,
                location: Some(cmd.location),
                acquired,
                decommissioned: None,
                state: AssetState::Operational,
                corrective_count: 0,
                accrued_cost: 0.0,
                unit_cost: cmd.unit_cost,
                department_id: cmd.department_id,
            })?;
            next.counters.available_assets += 1;
            Ok(id)
        })?;
        self.record_success(format!("asset {} created", id));
        Ok(id)
    }

    /// Retire an asset for good. Assets under maintenance are refused.
    pub fn decommission_asset(&mut self, id: i32) -> Result<(), EngineError> {
        let today = self.today();
        self.commit("decommission asset", |next| {
            let pos = find_asset(next, id).ok_or(EngineError::AssetNotFound(id))?;
            let asset = next.assets.get_mut(pos).ok_or(EngineError::AssetNotFound(id))?;
            if asset.state == AssetState::InMaintenance {
                return Err(EngineError::AssetInMaintenance(id));
            }
            let was_available = asset.state == AssetState::Operational;
            asset.state = AssetState::Decommissioned;
            asset.decommissioned = Some(today);
            if was_available {
                next.counters.available_assets -= 1;
            }
            Ok(())
        })?;
        self.record_success(format!("asset {} decommissioned", id));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Technicians
    // -----------------------------------------------------------------------

    pub fn create_technician(&mut self, cmd: NewTechnician) -> Result<i32, EngineError> {
        let id = self.commit("create technician", |next| {
            validate_person_name(&cmd.name)?;
            let id = next.technicians.next_id(next.constants.first_id)?;
            next.technicians.insert(Technician {
                id,
                name: Some(cmd.name),
                specialty: cmd.specialty,
                state: TechnicianState::Active,
                order_id: None,
            })?;
            next.counters.active_technicians += 1;
            Ok(id)
        })?;
        self.record_success(format!("technician {} created", id));
        Ok(id)
    }

    /// Refused while the technician still holds any order in execution,
    /// whatever their recorded state says.
    pub fn deactivate_technician(&mut self, id: i32) -> Result<(), EngineError> {
        self.commit("deactivate technician", |next| {
            let pos = find_technician(next, id).ok_or(EngineError::TechnicianNotFound(id))?;
            let load = execution_load(next, id);
            let tech = next
                .technicians
                .get_mut(pos)
                .ok_or(EngineError::TechnicianNotFound(id))?;
            match tech.state {
                TechnicianState::Inactive => {
                    return Err(EngineError::AlreadyInactive { kind: "technician", id })
                }
                TechnicianState::Busy => return Err(EngineError::TechnicianBusy(id)),
                TechnicianState::Active if load > 0 => return Err(EngineError::TechnicianBusy(id)),
                TechnicianState::Active => tech.state = TechnicianState::Inactive,
            }
            next.counters.active_technicians -= 1;
            Ok(())
        })?;
        self.record_success(format!("technician {} deactivated", id));
        Ok(())
    }

    /// Read-only check used before collecting materials for an assignment.
    pub fn check_technician(&self, technician_id: i32) -> Result<(), TransitionError> {
        check_assignable(&self.state, technician_id).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    pub fn create_order(&mut self, cmd: NewOrder) -> Result<i32, EngineError> {
        let id = self.commit("create order", |next| {
            let plan = plan_creation(next, &cmd)?;
            let id = plan.order.id;
            let pos = apply_transition(next, plan)?;
            validate_touched(next, pos)?;
            Ok(id)
        })?;
        self.record_success(format!("order {} created for asset {}", id, cmd.asset_id));
        Ok(id)
    }

    /// Move an open order one step. Returns the state it ended up in.
    pub fn advance_order(&mut self, order_id: i32, command: OrderCommand) -> Result<OrderState, EngineError> {
        let now = self.timestamp();
        let reached = self.commit("advance order", |next| {
            let plan = plan_advance(next, order_id, &command, now)?;
            let reached = plan.order.state;
            let pos = apply_transition(next, plan)?;
            validate_touched(next, pos)?;
            Ok(reached)
        })?;
        self.record_success(format!("order {} is now {}", order_id, reached));
        Ok(reached)
    }

    /// Attach a material line to an order id, open or not.
    pub fn add_material(&mut self, order_id: i32, draft: MaterialDraft) -> Result<(), EngineError> {
        self.commit("add material", |next| {
            validate_material(&draft).map_err(TransitionError::InvalidMaterial)?;
            next.materials.insert(Material {
                name: Some(draft.name),
                unit_cost: draft.unit_cost,
                quantity: draft.quantity,
                order_id,
            })?;
            Ok(())
        })?;
        self.record_success(format!("material added to order {}", order_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use chrono::NaiveDate;

    use crate::commands::Contact;
    use crate::domain::{AssetCategory, MaintenanceType, Priority, Specialty, TrackerConstants};
    use crate::error::CapacityError;
    use crate::ports::{ManualClock, MemoryLog};
    use crate::state::{create_initial_state, Collections, Counters};

    fn engine_with(state: TrackerState) -> (MaintenanceEngine, Rc<MemoryLog>) {
        let start = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let log = Rc::new(MemoryLog::new());
        let engine = MaintenanceEngine::new(
            state,
            Box::new(ManualClock::new(start)),
            Box::new(Rc::clone(&log)),
        );
        (engine, log)
    }

    fn make_engine() -> (MaintenanceEngine, Rc<MemoryLog>) {
        engine_with(create_initial_state(None))
    }

    fn department() -> NewDepartment {
        NewDepartment {
            name: "Logistics".into(),
            responsible: "Marta".into(),
            contact: Contact::Phone("912345678".into()),
        }
    }

    fn asset(department_id: i32) -> NewAsset {
        NewAsset {
            name: "Forklift".into(),
            category: AssetCategory::Vehicle,
            location: "Dock".into(),
            unit_cost: 1500.0,
            department_id,
        }
    }

    #[test]
    fn test_create_department_assigns_first_id() {
        let (mut engine, log) = make_engine();
        assert_eq!(engine.create_department(department()).unwrap(), 10);
        assert_eq!(engine.create_department(department()).unwrap(), 11);
        assert_eq!(engine.state().counters.active_departments, 2);
        assert_eq!(log.lines()[0], "Info: department 10 created");
    }

    #[test]
    fn test_rejected_operation_leaves_state_untouched() {
        let (mut engine, log) = make_engine();
        let before = engine.state().clone();
        let bad = NewDepartment { name: "IT".into(), ..department() };
        assert!(engine.create_department(bad).is_err());
        assert_eq!(engine.state(), &before);
        assert!(log.lines()[0].starts_with("Warning: create department rejected"));
    }

    #[test]
    fn test_asset_needs_active_department() {
        let (mut engine, _) = make_engine();
        assert_eq!(engine.create_asset(asset(10)), Err(EngineError::NoActiveDepartments));
        let dept = engine.create_department(department()).unwrap();
        engine.create_department(department()).unwrap();
        engine.deactivate_department(dept).unwrap();
        assert_eq!(engine.create_asset(asset(dept)), Err(EngineError::DepartmentInactive(dept)));
        assert_eq!(engine.create_asset(asset(99)), Err(EngineError::DepartmentNotFound(99)));
    }

    #[test]
    fn test_new_asset_stamped_today() {
        let (mut engine, _) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        let id = engine.create_asset(asset(dept)).unwrap();
        let stored = &engine.state().assets.records()[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.acquired, CalendarDate { day: 6, month: 5, year: 2024 });
        assert_eq!(engine.state().counters.available_assets, 1);
    }

    #[test]
    fn test_deactivating_department_keeps_assets() {
        let (mut engine, _) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        engine.create_asset(asset(dept)).unwrap();
        engine.deactivate_department(dept).unwrap();
        assert_eq!(engine.state().assets.records()[0].state, AssetState::Operational);
        assert_eq!(
            engine.deactivate_department(dept),
            Err(EngineError::AlreadyInactive { kind: "department", id: dept })
        );
    }

    #[test]
    fn test_decommission_rules() {
        let (mut engine, _) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        let a = engine.create_asset(asset(dept)).unwrap();
        let b = engine.create_asset(asset(dept)).unwrap();
        engine
            .create_order(NewOrder { asset_id: a, priority: Priority::Low, kind: MaintenanceType::Preventive })
            .unwrap();
        assert_eq!(engine.decommission_asset(a), Err(EngineError::AssetInMaintenance(a)));
        engine.decommission_asset(b).unwrap();
        assert_eq!(engine.state().counters.available_assets, 0);
        assert_eq!(engine.decommission_asset(b), Err(EngineError::AssetNotFound(b)));
    }

    #[test]
    fn test_busy_technician_cannot_be_deactivated() {
        let (mut engine, _) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        let a = engine.create_asset(asset(dept)).unwrap();
        let tech = engine
            .create_technician(NewTechnician { name: "Joana".into(), specialty: Specialty::Mechanic })
            .unwrap();
        let order = engine
            .create_order(NewOrder { asset_id: a, priority: Priority::High, kind: MaintenanceType::Corrective })
            .unwrap();
        engine
            .advance_order(order, OrderCommand::Assign { technician_id: tech, materials: vec![] })
            .unwrap();
        assert_eq!(engine.deactivate_technician(tech), Err(EngineError::TechnicianBusy(tech)));
    }

    #[test]
    fn test_technician_with_execution_orders_cannot_be_deactivated() {
        let (mut engine, log) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        let a = engine.create_asset(asset(dept)).unwrap();
        let b = engine.create_asset(asset(dept)).unwrap();
        let tech = engine
            .create_technician(NewTechnician { name: "Joana".into(), specialty: Specialty::Mechanic })
            .unwrap();
        let first = engine
            .create_order(NewOrder { asset_id: a, priority: Priority::High, kind: MaintenanceType::Corrective })
            .unwrap();
        let second = engine
            .create_order(NewOrder { asset_id: b, priority: Priority::Low, kind: MaintenanceType::Preventive })
            .unwrap();
        for order in [first, second] {
            engine
                .advance_order(order, OrderCommand::Assign { technician_id: tech, materials: vec![] })
                .unwrap();
        }
        engine.advance_order(first, OrderCommand::Conclude).unwrap();
        assert_eq!(engine.state().technicians.records()[0].state, TechnicianState::Active);

        let before = engine.state().clone();
        assert_eq!(engine.deactivate_technician(tech), Err(EngineError::TechnicianBusy(tech)));
        assert_eq!(engine.state(), &before);
        assert!(log
            .lines()
            .last()
            .unwrap()
            .starts_with("Warning: deactivate technician rejected"));

        engine.advance_order(second, OrderCommand::Conclude).unwrap();
        engine.deactivate_technician(tech).unwrap();
        assert_eq!(engine.state().counters.active_technicians, 0);
    }

    #[test]
    fn test_store_that_cannot_grow_aborts_create() {
        let constants = TrackerConstants { growth_step: usize::MAX, ..Default::default() };
        let (mut engine, log) = engine_with(create_initial_state(Some(constants)));
        let before = engine.state().clone();
        let err = engine.create_department(department()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Capacity(CapacityError { collection: "departments", len: 0 })
        );
        assert_eq!(engine.state(), &before);
        assert!(engine.state().departments.is_empty());
        assert_eq!(engine.state().counters.active_departments, 0);
        assert_eq!(log.lines().len(), 1);
        assert!(log.lines()[0].starts_with("Error: create department aborted"));
    }

    #[test]
    fn test_exhausted_identifiers_abort_instead_of_reusing() {
        let last = Department {
            id: i32::MAX,
            name: Some("Archive".into()),
            responsible: Some("Rui".into()),
            contact: Some("912345678".into()),
            activity: Activity::Active,
        };
        let state = TrackerState::from_collections(
            Collections { departments: vec![last], ..Default::default() },
            Counters::default(),
            TrackerConstants::default(),
        );
        let (mut engine, log) = engine_with(state);
        let err = engine.create_department(department()).unwrap_err();
        assert!(matches!(err, EngineError::Capacity(CapacityError { collection: "departments", .. })));
        assert_eq!(engine.state().departments.len(), 1);
        assert!(log.lines()[0].starts_with("Error: create department aborted"));
    }

    #[test]
    fn test_terminal_order_is_rejected() {
        let (mut engine, _) = make_engine();
        let dept = engine.create_department(department()).unwrap();
        let a = engine.create_asset(asset(dept)).unwrap();
        let tech = engine
            .create_technician(NewTechnician { name: "Joana".into(), specialty: Specialty::Mechanic })
            .unwrap();
        let order = engine
            .create_order(NewOrder { asset_id: a, priority: Priority::High, kind: MaintenanceType::Preventive })
            .unwrap();
        engine
            .advance_order(order, OrderCommand::Assign { technician_id: tech, materials: vec![] })
            .unwrap();
        assert_eq!(engine.advance_order(order, OrderCommand::Conclude).unwrap(), OrderState::Concluded);
        let err = engine.advance_order(order, OrderCommand::Cancel).unwrap_err();
        assert_eq!(
            err,
            EngineError::Transition(TransitionError::OrderClosed { id: order, state: OrderState::Concluded })
        );
    }

    #[test]
    fn test_add_material_validates_line() {
        let (mut engine, _) = make_engine();
        let bad = MaterialDraft { name: "Oil".into(), unit_cost: 1.0, quantity: 0 };
        assert!(engine.add_material(10, bad).is_err());
        let good = MaterialDraft { name: "Oil".into(), unit_cost: 1.0, quantity: 2 };
        engine.add_material(10, good).unwrap();
        assert_eq!(engine.state().materials.positions(10).len(), 1);
    }
}

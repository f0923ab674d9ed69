//! Menu flows: turn console input into engine operations.
//!
//! Field-level rejections re-prompt in place. Engine rejections end the
//! single operation with a message and return to the menu.

use std::fmt::Display;
use std::path::Path;

use maint_engine::commands::{
    Contact, DepartmentUpdate, MaterialDraft, NewAsset, NewDepartment, NewOrder, NewTechnician,
    OrderCommand,
};
use maint_engine::domain::{
    Activity, AssetCategory, AssetState, MaintenanceType, Order, OrderState, Priority, Specialty,
    Technician, TechnicianState,
};
use maint_engine::error::EngineError;
use maint_engine::lookup::{
    find_active_department, find_asset, find_department, find_open_order, find_order,
    has_active_department, has_operational_asset,
};
use maint_engine::reports;
use maint_engine::transitions::check_assignable;

use crate::activity_log::read_log;
use crate::console::{ConsoleError, Prompter};
use crate::render;
use crate::session::Session;

const MAIN_MENU: &str = "\n===== Asset Maintenance =====\n\
1 - Departments\n\
2 - Assets\n\
3 - Technicians\n\
4 - Maintenance orders\n\
5 - Reports\n\
6 - View activity log\n\
0 - Save and exit";

const DEPARTMENT_MENU: &str = "\n--- Departments ---\n\
1 - Create\n\
2 - List\n\
3 - Update\n\
4 - Deactivate\n\
0 - Back";

const ASSET_MENU: &str = "\n--- Assets ---\n\
1 - Create\n\
2 - List\n\
3 - List by department\n\
4 - Search by name\n\
5 - Decommission\n\
0 - Back";

const TECHNICIAN_MENU: &str = "\n--- Technicians ---\n\
1 - Create\n\
2 - List\n\
3 - List by state\n\
4 - List by specialty\n\
5 - Deactivate\n\
0 - Back";

const ORDER_MENU: &str = "\n--- Maintenance orders ---\n\
1 - Create\n\
2 - Manage (advance state)\n\
3 - List\n\
4 - List by state\n\
5 - List by priority\n\
6 - List by type\n\
0 - Back";

const REPORT_MENU: &str = "\n--- Reports ---\n\
1 - Assets\n\
2 - Departments\n\
3 - Technicians\n\
4 - Orders\n\
5 - Instability alerts\n\
6 - Incidents by location\n\
0 - Back";

/// Run the main menu until the user picks exit or input ends.
pub fn run<P: Prompter>(session: &mut Session, io: &mut P, log_path: &Path) -> Result<(), ConsoleError> {
    loop {
        io.say(MAIN_MENU)?;
        match io.read_int_in_range(0, 6, "Option:")? {
            1 => departments(session, io)?,
            2 => assets(session, io)?,
            3 => technicians(session, io)?,
            4 => orders(session, io)?,
            5 => report_menu(session, io)?,
            6 => view_log(io, log_path)?,
            _ => return Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Numbered pick from a list of enum values.
fn choose<P: Prompter, E: Copy + Display>(io: &mut P, title: &str, options: &[E]) -> Result<E, ConsoleError> {
    io.say(title)?;
    for (i, option) in options.iter().enumerate() {
        io.say(&format!("{} - {}", i + 1, option))?;
    }
    let max = i32::try_from(options.len()).unwrap_or(i32::MAX);
    let pick = io.read_int_in_range(1, max, "Option:")?;
    let index = usize::try_from(pick - 1).unwrap_or(0);
    Ok(options[index])
}

fn report<P: Prompter, T>(io: &mut P, result: Result<T, EngineError>, done: impl FnOnce(T) -> String) -> Result<(), ConsoleError> {
    match result {
        Ok(value) => io.say(&done(value)),
        Err(e) => io.say(&format!("Operation not completed: {}.", e)),
    }
}

fn say_lines<P: Prompter>(io: &mut P, lines: Vec<String>, empty: &str) -> Result<(), ConsoleError> {
    if lines.is_empty() {
        return io.say(empty);
    }
    for line in lines {
        io.say(&line)?;
    }
    Ok(())
}

fn read_contact<P: Prompter>(io: &mut P) -> Result<Contact, ConsoleError> {
    io.say("Contact type:\n1 - Phone\n2 - E-mail")?;
    Ok(match io.read_int_in_range(1, 2, "Option:")? {
        1 => Contact::Phone(io.read_phone("Phone (9 digits):")?),
        _ => Contact::Email(io.read_email("E-mail:")?),
    })
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

fn departments<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    io.say(DEPARTMENT_MENU)?;
    match io.read_int_in_range(0, 4, "Option:")? {
        1 => {
            let name = io.read_min_length(3, "Department name:")?;
            let responsible = io.read_validated_name("Responsible:")?;
            let contact = read_contact(io)?;
            let result = session.engine_mut().create_department(NewDepartment {
                name,
                responsible,
                contact,
            });
            report(io, result, |id| format!("Department {} created.", id))?;
        }
        2 => {
            let lines = session.state().departments.iter().map(render::department_line).collect();
            say_lines(io, lines, "No departments registered.")?;
        }
        3 => {
            let id = io.read_positive_int("Department id:")?;
            if find_department(session.state(), id).is_none() {
                io.say("Department not found.")?;
            } else {
                io.say("Field to change:\n1 - Name\n2 - Responsible\n3 - Contact")?;
                let update = match io.read_int_in_range(1, 3, "Option:")? {
                    1 => DepartmentUpdate::Name(io.read_min_length(3, "New name:")?),
                    2 => DepartmentUpdate::Responsible(io.read_validated_name("New responsible:")?),
                    _ => DepartmentUpdate::Contact(read_contact(io)?),
                };
                let result = session.engine_mut().update_department(id, update);
                report(io, result, |()| format!("Department {} updated.", id))?;
            }
        }
        4 => {
            let id = io.read_positive_int("Department id:")?;
            let result = session.engine_mut().deactivate_department(id);
            report(io, result, |()| format!("Department {} deactivated.", id))?;
        }
        _ => return Ok(()),
    }
    io.pause()
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

fn assets<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    io.say(ASSET_MENU)?;
    match io.read_int_in_range(0, 5, "Option:")? {
        1 => create_asset(session, io)?,
        2 => {
            let lines = session.state().assets.iter().map(render::asset_line).collect();
            say_lines(io, lines, "No assets registered.")?;
        }
        3 => {
            let groups = reports::assets_by_department(session.state());
            if groups.is_empty() {
                io.say("No departments registered.")?;
            }
            for (dept, assets) in groups {
                io.say(&format!("== {}", render::department_line(dept)))?;
                let lines = assets.into_iter().map(render::asset_line).collect();
                say_lines(io, lines, "   (no assets)")?;
            }
        }
        4 => {
            let term = io.read_dynamic_string("Name starts with:")?;
            let lines = reports::search_assets_by_name(session.state(), &term)
                .into_iter()
                .map(render::asset_line)
                .collect();
            say_lines(io, lines, "No asset matches.")?;
        }
        5 => {
            let id = io.read_positive_int("Asset id:")?;
            let result = session.engine_mut().decommission_asset(id);
            report(io, result, |()| format!("Asset {} decommissioned.", id))?;
        }
        _ => return Ok(()),
    }
    io.pause()
}

fn create_asset<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    if !has_active_department(session.state()) {
        return io.say("Create an active department first.");
    }
    let name = io.read_dynamic_string("Asset name:")?;
    let category = choose(io, "Category:", AssetCategory::ALL)?;
    let location = io.read_dynamic_string("Location:")?;
    let unit_cost = io.read_non_negative_amount("Unit cost:")?;
    for dept in session
        .state()
        .departments
        .iter()
        .filter(|d| d.activity == Activity::Active)
    {
        io.say(&render::department_line(dept))?;
    }
    let department_id = loop {
        let id = io.read_positive_int("Department id:")?;
        if find_active_department(session.state(), id).is_some() {
            break id;
        }
        io.say("No active department with that id.")?;
    };
    let result = session.engine_mut().create_asset(NewAsset {
        name,
        category,
        location,
        unit_cost,
        department_id,
    });
    report(io, result, |id| format!("Asset {} created.", id))
}

// ---------------------------------------------------------------------------
// Technicians
// ---------------------------------------------------------------------------

fn technician_lines(session: &Session, filter: impl Fn(&Technician) -> bool) -> Vec<String> {
    let state = session.state();
    state
        .technicians
        .iter()
        .filter(|&t| filter(t))
        .map(|t| render::technician_line(t, reports::occupancy_rate(state, t.id)))
        .collect()
}

fn technicians<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    io.say(TECHNICIAN_MENU)?;
    match io.read_int_in_range(0, 5, "Option:")? {
        1 => {
            let name = io.read_validated_name("Technician name:")?;
            let specialty = choose(io, "Specialty:", Specialty::ALL)?;
            let result = session
                .engine_mut()
                .create_technician(NewTechnician { name, specialty });
            report(io, result, |id| format!("Technician {} created.", id))?;
        }
        2 => say_lines(io, technician_lines(session, |_| true), "No technicians registered.")?,
        3 => {
            let wanted = choose(io, "State:", TechnicianState::ALL)?;
            say_lines(io, technician_lines(session, |t| t.state == wanted), "No technician in that state.")?;
        }
        4 => {
            let wanted = choose(io, "Specialty:", Specialty::ALL)?;
            say_lines(
                io,
                technician_lines(session, |t| t.specialty == wanted),
                "No technician with that specialty.",
            )?;
        }
        5 => {
            let id = io.read_positive_int("Technician id:")?;
            let result = session.engine_mut().deactivate_technician(id);
            report(io, result, |()| format!("Technician {} deactivated.", id))?;
        }
        _ => return Ok(()),
    }
    io.pause()
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

fn order_lines<'a>(session: &Session, orders: impl IntoIterator<Item = &'a Order>) -> Vec<String> {
    orders
        .into_iter()
        .map(|o| render::order_line(o, reports::order_cost(session.state(), o.id)))
        .collect()
}

fn orders<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    io.say(ORDER_MENU)?;
    match io.read_int_in_range(0, 6, "Option:")? {
        1 => create_order(session, io)?,
        2 => manage_order(session, io)?,
        3 => {
            let lines = order_lines(session, session.state().orders.iter());
            say_lines(io, lines, "No orders registered.")?;
        }
        4 => {
            let wanted = choose(io, "State:", OrderState::ALL)?;
            let lines = order_lines(session, reports::orders_in_state(session.state(), wanted));
            say_lines(io, lines, "No orders in that state.")?;
        }
        5 => {
            let wanted = choose(io, "Priority:", Priority::ALL)?;
            let lines = order_lines(session, reports::orders_with_priority(session.state(), wanted));
            say_lines(io, lines, "No orders with that priority.")?;
        }
        6 => {
            let wanted = choose(io, "Type:", MaintenanceType::ALL)?;
            let lines = order_lines(session, reports::orders_of_kind(session.state(), wanted));
            say_lines(io, lines, "No orders of that type.")?;
        }
        _ => return Ok(()),
    }
    io.pause()
}

fn create_order<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    if !has_operational_asset(session.state()) {
        return io.say("No operational asset is available for maintenance.");
    }
    for asset in session
        .state()
        .assets
        .iter()
        .filter(|a| a.state == AssetState::Operational)
    {
        io.say(&render::asset_line(asset))?;
    }
    let asset_id = loop {
        let id = io.read_positive_int("Asset id:")?;
        let state = session.state();
        let operational = find_asset(state, id)
            .and_then(|pos| state.assets.get(pos))
            .is_some_and(|a| a.state == AssetState::Operational);
        if operational {
            break id;
        }
        io.say("That asset is not operational.")?;
    };
    let priority = choose(io, "Priority:", Priority::ALL)?;
    let kind = choose(io, "Maintenance type:", MaintenanceType::ALL)?;
    let result = session.engine_mut().create_order(NewOrder {
        asset_id,
        priority,
        kind,
    });
    report(io, result, |id| format!("Order {} created.", id))
}

fn manage_order<P: Prompter>(session: &mut Session, io: &mut P) -> Result<(), ConsoleError> {
    let id = io.read_positive_int("Order id:")?;
    let state = session.state();
    let pos = match find_open_order(state, id) {
        Some(pos) => pos,
        None => {
            return match find_order(state, id).and_then(|pos| state.orders.get(pos)) {
                Some(order) => io.say(&format!("Order {} is already {}; nothing to do.", id, order.state)),
                None => io.say("Order not found."),
            };
        }
    };
    let current = state.orders.get(pos).map(|o| o.state);

    let command = match current {
        Some(OrderState::Pending) => match assignment(session, io)? {
            Some(command) => command,
            None => return Ok(()),
        },
        Some(OrderState::Execution) => {
            io.say("1 - Conclude\n2 - Cancel")?;
            match io.read_int_in_range(1, 2, "Option:")? {
                1 => OrderCommand::Conclude,
                _ => OrderCommand::Cancel,
            }
        }
        _ => return io.say("Order is closed; nothing to do."),
    };
    let result = session.engine_mut().advance_order(id, command);
    report(io, result, |reached| format!("Order {} is now {}.", id, reached))
}

/// Technician pick and material lines for a Pending order.
fn assignment<P: Prompter>(session: &Session, io: &mut P) -> Result<Option<OrderCommand>, ConsoleError> {
    let state = session.state();
    if !state
        .technicians
        .iter()
        .any(|t| check_assignable(state, t.id).is_ok())
    {
        io.say("No technician can take this order right now.")?;
        return Ok(None);
    }
    for t in &state.technicians {
        io.say(&render::technician_line(t, reports::occupancy_rate(state, t.id)))?;
    }
    let technician_id = loop {
        let id = io.read_positive_int("Technician id:")?;
        match session.engine().check_technician(id) {
            Ok(()) => break id,
            Err(e) => io.say(&format!("Cannot assign: {}.", e))?,
        }
    };

    let mut materials = Vec::new();
    loop {
        let name = io.read_dynamic_string("Material name:")?;
        let unit_cost = io.read_non_negative_amount("Unit cost:")?;
        let quantity = io.read_positive_int("Quantity:")?;
        materials.push(MaterialDraft {
            name,
            unit_cost,
            quantity,
        });
        if !io.read_yes_no("Add another material? (yes/no)")? {
            break;
        }
    }
    Ok(Some(OrderCommand::Assign {
        technician_id,
        materials,
    }))
}

// ---------------------------------------------------------------------------
// Reports and log
// ---------------------------------------------------------------------------

fn report_menu<P: Prompter>(session: &Session, io: &mut P) -> Result<(), ConsoleError> {
    io.say(REPORT_MENU)?;
    let state = session.state();
    let text = match io.read_int_in_range(0, 6, "Option:")? {
        1 => render::asset_report(&reports::asset_report(state)),
        2 => render::department_report(&reports::department_report(state)),
        3 => render::technician_report(&reports::technician_report(state)),
        4 => render::order_report(&reports::order_report(state)),
        5 => render::instability_report(&reports::instability_alerts(state)),
        6 => render::location_report(&reports::incidents_by_location(state)),
        _ => return Ok(()),
    };
    io.say(text.trim_end())?;
    io.pause()
}

fn view_log<P: Prompter>(io: &mut P, log_path: &Path) -> Result<(), ConsoleError> {
    match read_log(log_path)? {
        Some(text) if !text.is_empty() => io.say(text.trim_end())?,
        _ => io.say("The activity log is empty.")?,
    }
    io.pause()
}

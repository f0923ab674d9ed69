//! Text rendering of records and reports for the console.
//!
//! Pure functions from engine values to display strings.

use std::fmt::{Display, Write};

use maint_engine::domain::{text_or_blank, Asset, Department, Order, Technician};
use maint_engine::reports::{
    AssetReport, DepartmentReport, InstabilityAlert, LocationIncidents, OrderReport,
    TechnicianReport,
};

pub const NOT_AVAILABLE: &str = "n/a";

pub fn department_line(d: &Department) -> String {
    format!(
        "[{}] {} | responsible: {} | contact: {} | {}",
        d.id,
        text_or_blank(&d.name),
        text_or_blank(&d.responsible),
        text_or_blank(&d.contact),
        d.activity
    )
}

pub fn asset_line(a: &Asset) -> String {
    let mut line = format!(
        "[{}] {} | {} | {} | {} | dept {} | acquired {} | unit {:.2} | accrued {:.2} | corrective {}",
        a.id,
        text_or_blank(&a.name),
        a.category,
        text_or_blank(&a.location),
        a.state,
        a.department_id,
        a.acquired,
        a.unit_cost,
        a.accrued_cost,
        a.corrective_count
    );
    if let Some(date) = a.decommissioned {
        let _ = write!(line, " | decommissioned {}", date);
    }
    line
}

pub fn technician_line(t: &Technician, occupancy_percent: i32) -> String {
    let order = t
        .order_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    format!(
        "[{}] {} | {} | {} | order {} | occupancy {}%",
        t.id,
        text_or_blank(&t.name),
        t.specialty,
        t.state,
        order,
        occupancy_percent
    )
}

pub fn order_line(o: &Order, cost: f32) -> String {
    let technician = o
        .technician_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let started = o.started.map_or_else(|| "-".to_string(), |t| t.to_string());
    let ended = o.ended.map_or_else(|| "-".to_string(), |t| t.to_string());
    format!(
        "[{}] asset {} | dept {} | technician {} | {} | {} | {} | start {} | end {} | cost {:.2}",
        o.id, o.asset_id, o.department_id, technician, o.state, o.priority, o.kind, started, ended, cost
    )
}

/// Whole seconds as `Hh MMm SSs`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as i64;
    format!("{}h {:02}m {:02}s", total / 3600, (total % 3600) / 60, total % 60)
}

fn tally_lines<K: Display>(out: &mut String, title: &str, counts: &[(K, usize)]) {
    let _ = writeln!(out, "{}:", title);
    for (key, count) in counts {
        let _ = writeln!(out, "  {}: {}", key, count);
    }
}

pub fn asset_report(r: &AssetReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total assets: {}", r.total);
    let _ = writeln!(out, "Available for maintenance: {}", r.available);
    tally_lines(&mut out, "By state", &r.by_state);
    tally_lines(&mut out, "By category", &r.by_category);
    match &r.most_corrective {
        Some(leader) => {
            let _ = writeln!(
                out,
                "Most corrective maintenance: [{}] {} ({} times)",
                leader.asset_id,
                text_or_blank(&leader.name),
                leader.corrective_count
            );
        }
        None => {
            let _ = writeln!(out, "Most corrective maintenance: {}", NOT_AVAILABLE);
        }
    }
    out
}

pub fn department_report(r: &DepartmentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Departments: {} ({} active, {} inactive)",
        r.total, r.active, r.inactive
    );
    let _ = writeln!(out, "Assets per department:");
    for (id, name, count) in &r.assets_per_department {
        let _ = writeln!(out, "  [{}] {}: {}", id, text_or_blank(name), count);
    }
    match &r.most_urgent {
        Some(u) => {
            let _ = writeln!(
                out,
                "Most urgent department: [{}] {} (score {})",
                u.department_id,
                text_or_blank(&u.name),
                u.score
            );
        }
        None => {
            let _ = writeln!(out, "Most urgent department: {}", NOT_AVAILABLE);
        }
    }
    out
}

pub fn technician_report(r: &TechnicianReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Technicians: {}", r.total);
    tally_lines(&mut out, "By state", &r.by_state);
    tally_lines(&mut out, "By specialty", &r.by_specialty);
    let _ = writeln!(out, "Performance ranking (concluded orders):");
    for entry in &r.ranking {
        let _ = writeln!(
            out,
            "  {}. [{}] {}: {}",
            entry.rank,
            entry.technician_id,
            text_or_blank(&entry.name),
            entry.concluded
        );
    }
    out
}

pub fn order_report(r: &OrderReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Orders: {} ({} open)", r.total, r.open);
    tally_lines(&mut out, "By priority", &r.by_priority);
    tally_lines(&mut out, "By state", &r.by_state);
    tally_lines(&mut out, "By type", &r.by_kind);
    let _ = writeln!(
        out,
        "Average resolution time: {}",
        format_duration(r.average_resolution_seconds)
    );
    out
}

pub fn instability_report(alerts: &[InstabilityAlert]) -> String {
    if alerts.is_empty() {
        return "No unstable assets.\n".to_string();
    }
    let mut out = String::new();
    for a in alerts {
        let _ = writeln!(
            out,
            "UNSTABLE: [{}] {} with {} orders",
            a.asset_id,
            text_or_blank(&a.name),
            a.orders
        );
    }
    out
}

pub fn location_report(buckets: &[LocationIncidents]) -> String {
    if buckets.is_empty() {
        return "No incidents recorded.\n".to_string();
    }
    let mut out = String::new();
    for b in buckets {
        let _ = writeln!(out, "{}: {} incidents", b.location, b.incidents);
    }
    out
}

/// Maintenance tracker: Reports
///
/// Read-only aggregation over a state snapshot. Nothing here is cached;
/// every figure is recomputed from the stores on request.

use serde::Serialize;

use crate::arithmetic::occupancy_percent;
use crate::domain::{
    Activity, Asset, AssetCategory, AssetState, Department, MaintenanceType, Order, OrderState,
    Priority, Specialty, Technician, TechnicianState,
};
use crate::lookup::{execution_load, orders_for_asset};
use crate::state::TrackerState;

/// Bucket for assets with no location text.
pub const NO_LOCATION: &str = "no location";

// ---------------------------------------------------------------------------
// Per-order and per-technician figures
// ---------------------------------------------------------------------------

/// Sum of unit cost x quantity over the order's material lines.
pub fn order_cost(state: &TrackerState, order_id: i32) -> f32 {
    state
        .materials
        .positions(order_id)
        .iter()
        .filter_map(|&pos| state.materials.get(pos))
        .map(|m| m.line_cost())
        .sum()
}

pub fn occupancy_rate(state: &TrackerState, technician_id: i32) -> i32 {
    occupancy_percent(
        execution_load(state, technician_id),
        state.constants.occupancy_cap,
    )
}

/// Mean seconds from start to end over concluded orders.
///
/// Orders with an unset year, an impossible date or a negative span are
/// left out. Returns 0 when no order qualifies.
pub fn average_resolution_seconds(state: &TrackerState) -> f64 {
    let spans: Vec<i64> = state
        .orders
        .iter()
        .filter(|o| o.state == OrderState::Concluded)
        .filter_map(resolution_seconds)
        .collect();
    if spans.is_empty() {
        return 0.0;
    }
    spans.iter().sum::<i64>() as f64 / spans.len() as f64
}

fn resolution_seconds(order: &Order) -> Option<i64> {
    let (start, end) = (order.started?, order.ended?);
    if start.year == 0 || end.year == 0 {
        return None;
    }
    let delta = end.to_epoch_seconds()? - start.to_epoch_seconds()?;
    (delta >= 0).then_some(delta)
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

fn tally<K, I>(keys: &[K], values: I) -> Vec<(K, usize)>
where
    K: Copy + PartialEq,
    I: IntoIterator<Item = K>,
{
    let mut counts: Vec<(K, usize)> = keys.iter().map(|k| (*k, 0)).collect();
    for value in values {
        if let Some(slot) = counts.iter_mut().find(|(k, _)| *k == value) {
            slot.1 += 1;
        }
    }
    counts
}

pub fn asset_state_counts(state: &TrackerState) -> Vec<(AssetState, usize)> {
    tally(AssetState::ALL, state.assets.iter().map(|a| a.state))
}

pub fn asset_category_counts(state: &TrackerState) -> Vec<(AssetCategory, usize)> {
    tally(AssetCategory::ALL, state.assets.iter().map(|a| a.category))
}

pub fn order_state_counts(state: &TrackerState) -> Vec<(OrderState, usize)> {
    tally(OrderState::ALL, state.orders.iter().map(|o| o.state))
}

pub fn order_priority_counts(state: &TrackerState) -> Vec<(Priority, usize)> {
    tally(Priority::ALL, state.orders.iter().map(|o| o.priority))
}

pub fn order_kind_counts(state: &TrackerState) -> Vec<(MaintenanceType, usize)> {
    tally(MaintenanceType::ALL, state.orders.iter().map(|o| o.kind))
}

pub fn technician_specialty_counts(state: &TrackerState) -> Vec<(Specialty, usize)> {
    tally(Specialty::ALL, state.technicians.iter().map(|t| t.specialty))
}

pub fn technician_state_counts(state: &TrackerState) -> Vec<(TechnicianState, usize)> {
    tally(TechnicianState::ALL, state.technicians.iter().map(|t| t.state))
}

// ---------------------------------------------------------------------------
// Rankings and alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgencyScore {
    pub department_id: i32,
    pub name: Option<String>,
    pub score: i64,
}

/// Priority-weighted order total per department, in store order.
pub fn department_urgency_scores(state: &TrackerState) -> Vec<UrgencyScore> {
    state
        .departments
        .iter()
        .map(|d| UrgencyScore {
            department_id: d.id,
            name: d.name.clone(),
            score: state
                .orders
                .iter()
                .filter(|o| o.department_id == d.id)
                .map(|o| state.constants.weight(o.priority))
                .sum(),
        })
        .collect()
}

/// Highest urgency score; the earlier department wins a tie.
///
/// `None` when there are no orders or no department scores above zero.
pub fn most_urgent_department(state: &TrackerState) -> Option<UrgencyScore> {
    if state.orders.is_empty() {
        return None;
    }
    let mut best: Option<UrgencyScore> = None;
    for score in department_urgency_scores(state) {
        let current = best.as_ref().map_or(0, |b| b.score);
        if score.score > current {
            best = Some(score);
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstabilityAlert {
    pub asset_id: i32,
    pub name: Option<String>,
    pub orders: usize,
}

/// Assets whose total order count reaches the instability threshold.
pub fn instability_alerts(state: &TrackerState) -> Vec<InstabilityAlert> {
    state
        .assets
        .iter()
        .filter_map(|a| {
            let orders = orders_for_asset(state, a.id);
            (orders >= state.constants.instability_threshold).then(|| InstabilityAlert {
                asset_id: a.id,
                name: a.name.clone(),
                orders,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationIncidents {
    pub location: String,
    pub incidents: usize,
}

/// Order totals grouped by exact asset location, in first-seen order.
pub fn incidents_by_location(state: &TrackerState) -> Vec<LocationIncidents> {
    let mut buckets: Vec<LocationIncidents> = Vec::new();
    for asset in &state.assets {
        let incidents = orders_for_asset(state, asset.id);
        if incidents == 0 {
            continue;
        }
        let location = asset
            .location
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(NO_LOCATION);
        match buckets.iter_mut().find(|b| b.location == location) {
            Some(bucket) => bucket.incidents += incidents,
            None => buckets.push(LocationIncidents {
                location: location.to_string(),
                incidents,
            }),
        }
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub technician_id: i32,
    pub name: Option<String>,
    pub concluded: usize,
}

/// Technicians by concluded orders, most first. Rank starts at 1.
pub fn technician_ranking(state: &TrackerState) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = state
        .technicians
        .iter()
        .map(|t| RankEntry {
            rank: 0,
            technician_id: t.id,
            name: t.name.clone(),
            concluded: state
                .orders
                .iter()
                .filter(|o| o.state == OrderState::Concluded && o.technician_id == Some(t.id))
                .count(),
        })
        .collect();
    entries.sort_by(|a, b| b.concluded.cmp(&a.concluded));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectiveLeader {
    pub asset_id: i32,
    pub name: Option<String>,
    pub corrective_count: i32,
}

/// Asset with the highest corrective counter, `None` if every counter is 0.
pub fn most_corrective_asset(state: &TrackerState) -> Option<CorrectiveLeader> {
    let mut best: Option<&Asset> = None;
    for asset in &state.assets {
        if asset.corrective_count > best.map_or(0, |b| b.corrective_count) {
            best = Some(asset);
        }
    }
    best.map(|a| CorrectiveLeader {
        asset_id: a.id,
        name: a.name.clone(),
        corrective_count: a.corrective_count,
    })
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

pub fn orders_in_state(state: &TrackerState, wanted: OrderState) -> Vec<&Order> {
    state.orders.iter().filter(|o| o.state == wanted).collect()
}

pub fn orders_with_priority(state: &TrackerState, wanted: Priority) -> Vec<&Order> {
    state.orders.iter().filter(|o| o.priority == wanted).collect()
}

pub fn orders_of_kind(state: &TrackerState, wanted: MaintenanceType) -> Vec<&Order> {
    state.orders.iter().filter(|o| o.kind == wanted).collect()
}

pub fn technicians_in_state(state: &TrackerState, wanted: TechnicianState) -> Vec<&Technician> {
    state.technicians.iter().filter(|t| t.state == wanted).collect()
}

pub fn technicians_with_specialty(state: &TrackerState, wanted: Specialty) -> Vec<&Technician> {
    state.technicians.iter().filter(|t| t.specialty == wanted).collect()
}

/// Every department with the assets that name it, in store order.
pub fn assets_by_department(state: &TrackerState) -> Vec<(&Department, Vec<&Asset>)> {
    state
        .departments
        .iter()
        .map(|d| {
            let assets = state.assets.iter().filter(|a| a.department_id == d.id).collect();
            (d, assets)
        })
        .collect()
}

/// Assets whose name starts with `prefix`, ignoring case.
pub fn search_assets_by_name<'a>(state: &'a TrackerState, prefix: &str) -> Vec<&'a Asset> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let prefix = prefix.to_lowercase();
    state
        .assets
        .iter()
        .filter(|a| {
            a.name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().starts_with(&prefix))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Composite reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    pub total: usize,
    pub available: i32,
    pub by_state: Vec<(AssetState, usize)>,
    pub by_category: Vec<(AssetCategory, usize)>,
    pub most_corrective: Option<CorrectiveLeader>,
}

pub fn asset_report(state: &TrackerState) -> AssetReport {
    AssetReport {
        total: state.assets.len(),
        available: state.counters.available_assets,
        by_state: asset_state_counts(state),
        by_category: asset_category_counts(state),
        most_corrective: most_corrective_asset(state),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentReport {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// (department id, name, asset count)
    pub assets_per_department: Vec<(i32, Option<String>, usize)>,
    pub most_urgent: Option<UrgencyScore>,
}

pub fn department_report(state: &TrackerState) -> DepartmentReport {
    let active = state
        .departments
        .iter()
        .filter(|d| d.activity == Activity::Active)
        .count();
    DepartmentReport {
        total: state.departments.len(),
        active,
        inactive: state.departments.len() - active,
        assets_per_department: assets_by_department(state)
            .into_iter()
            .map(|(d, assets)| (d.id, d.name.clone(), assets.len()))
            .collect(),
        most_urgent: most_urgent_department(state),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianReport {
    pub total: usize,
    pub by_state: Vec<(TechnicianState, usize)>,
    pub by_specialty: Vec<(Specialty, usize)>,
    pub ranking: Vec<RankEntry>,
}

pub fn technician_report(state: &TrackerState) -> TechnicianReport {
    TechnicianReport {
        total: state.technicians.len(),
        by_state: technician_state_counts(state),
        by_specialty: technician_specialty_counts(state),
        ranking: technician_ranking(state),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReport {
    pub total: usize,
    pub open: i32,
    pub by_priority: Vec<(Priority, usize)>,
    pub by_state: Vec<(OrderState, usize)>,
    pub by_kind: Vec<(MaintenanceType, usize)>,
    pub average_resolution_seconds: f64,
}

pub fn order_report(state: &TrackerState) -> OrderReport {
    OrderReport {
        total: state.orders.len(),
        open: state.counters.open_orders,
        by_priority: order_priority_counts(state),
        by_state: order_state_counts(state),
        by_kind: order_kind_counts(state),
        average_resolution_seconds: average_resolution_seconds(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;
    use crate::state::create_initial_state;

    fn asset(id: i32, name: &str, location: Option<&str>) -> Asset {
        Asset {
            id,
            name: Some(name.to_string()),
            category: AssetCategory::ItEquipment,
            location: location.map(str::to_string),
            acquired: CalendarDate { day: 1, month: 1, year: 2024 },
            decommissioned: None,
            state: AssetState::Operational,
            corrective_count: 0,
            accrued_cost: 0.0,
            unit_cost: 1.0,
            department_id: 10,
        }
    }

    fn department(id: i32) -> Department {
        Department {
            id,
            name: Some(format!("Dept {}", id)),
            responsible: None,
            contact: None,
            activity: Activity::Active,
        }
    }

    fn order(id: i32, asset_id: i32, department_id: i32, priority: Priority) -> Order {
        Order {
            id,
            asset_id,
            department_id,
            technician_id: None,
            state: OrderState::Pending,
            priority,
            kind: MaintenanceType::Preventive,
            started: None,
            ended: None,
        }
    }

    fn ts(hour: i32, minute: i32, second: i32) -> Timestamp {
        Timestamp { day: 1, month: 1, year: 2024, hour, minute, second }
    }

    #[test]
    fn test_order_cost_sums_lines() {
        let mut state = create_initial_state(None);
        for (unit_cost, quantity, order_id) in [(10.0, 3, 10), (5.5, 2, 10), (99.0, 1, 11)] {
            state
                .materials
                .insert(Material { name: Some("m".into()), unit_cost, quantity, order_id })
                .unwrap();
        }
        assert_eq!(order_cost(&state, 10), 41.0);
        assert_eq!(order_cost(&state, 12), 0.0);
    }

    #[test]
    fn test_occupancy_rate_truncates() {
        let mut state = create_initial_state(None);
        for id in 10..14 {
            let mut o = order(id, 10, 10, Priority::Low);
            o.state = OrderState::Execution;
            o.technician_id = Some(7);
            o.started = Some(ts(8, 0, 0));
            state.orders.insert(o).unwrap();
        }
        assert_eq!(occupancy_rate(&state, 7), 0);
        let mut fifth = order(14, 10, 10, Priority::Low);
        fifth.state = OrderState::Execution;
        fifth.technician_id = Some(7);
        fifth.started = Some(ts(8, 0, 0));
        state.orders.insert(fifth).unwrap();
        assert_eq!(occupancy_rate(&state, 7), 100);
    }

    #[test]
    fn test_average_resolution_skips_unset_years() {
        let mut state = create_initial_state(None);
        let mut done = order(10, 10, 10, Priority::Low);
        done.state = OrderState::Concluded;
        done.started = Some(ts(10, 0, 0));
        done.ended = Some(ts(10, 5, 30));
        state.orders.insert(done.clone()).unwrap();

        let mut unset = done.clone();
        unset.id = 11;
        unset.started = Some(Timestamp { year: 0, ..ts(10, 0, 0) });
        state.orders.insert(unset).unwrap();

        let mut backwards = done;
        backwards.id = 12;
        backwards.started = Some(ts(11, 0, 0));
        state.orders.insert(backwards).unwrap();

        assert_eq!(average_resolution_seconds(&state), 330.0);
    }

    #[test]
    fn test_average_resolution_empty_is_zero() {
        assert_eq!(average_resolution_seconds(&create_initial_state(None)), 0.0);
    }

    #[test]
    fn test_most_urgent_department_weights_and_ties() {
        let mut state = create_initial_state(None);
        assert_eq!(most_urgent_department(&state), None);
        state.departments.insert(department(10)).unwrap();
        state.departments.insert(department(11)).unwrap();
        state.orders.insert(order(10, 10, 10, Priority::High)).unwrap();
        state.orders.insert(order(11, 10, 11, Priority::Medium)).unwrap();
        state.orders.insert(order(12, 10, 11, Priority::Low)).unwrap();
        state.orders.insert(order(13, 10, 11, Priority::Low)).unwrap();
        let best = most_urgent_department(&state).unwrap();
        assert_eq!(best.department_id, 10);
        assert_eq!(best.score, 5);

        let scores = department_urgency_scores(&state);
        assert_eq!(scores[1].score, 5);
    }

    #[test]
    fn test_instability_threshold() {
        let mut state = create_initial_state(None);
        state.assets.insert(asset(10, "Press", None)).unwrap();
        state.assets.insert(asset(11, "Lathe", None)).unwrap();
        for id in 10..15 {
            state.orders.insert(order(id, 10, 10, Priority::Low)).unwrap();
        }
        state.orders.insert(order(15, 11, 10, Priority::Low)).unwrap();
        let alerts = instability_alerts(&state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].asset_id, 10);
        assert_eq!(alerts[0].orders, 5);
    }

    #[test]
    fn test_incidents_by_location() {
        let mut state = create_initial_state(None);
        state.assets.insert(asset(10, "A", Some("Lab"))).unwrap();
        state.assets.insert(asset(11, "B", None)).unwrap();
        state.assets.insert(asset(12, "C", Some("lab"))).unwrap();
        state.assets.insert(asset(13, "D", Some("Lab"))).unwrap();
        state.assets.insert(asset(14, "E", Some(""))).unwrap();
        state.assets.insert(asset(15, "F", Some("Yard"))).unwrap();
        for (id, asset_id) in [(10, 10), (11, 10), (12, 11), (13, 12), (14, 13), (15, 14)] {
            state.orders.insert(order(id, asset_id, 10, Priority::Low)).unwrap();
        }
        let buckets = incidents_by_location(&state);
        let flat: Vec<(&str, usize)> =
            buckets.iter().map(|b| (b.location.as_str(), b.incidents)).collect();
        assert_eq!(flat, vec![("Lab", 3), (NO_LOCATION, 2), ("lab", 1)]);
    }

    #[test]
    fn test_ranking_orders_by_concluded() {
        let mut state = create_initial_state(None);
        for id in [10, 11] {
            state
                .technicians
                .insert(Technician {
                    id,
                    name: Some(format!("Tech {}", id)),
                    specialty: Specialty::It,
                    state: TechnicianState::Active,
                    order_id: None,
                })
                .unwrap();
        }
        let mut done = order(10, 10, 10, Priority::Low);
        done.state = OrderState::Concluded;
        done.technician_id = Some(11);
        state.orders.insert(done).unwrap();
        let ranking = technician_ranking(&state);
        assert_eq!(ranking[0].technician_id, 11);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].concluded, 1);
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn test_most_corrective_needs_nonzero() {
        let mut state = create_initial_state(None);
        state.assets.insert(asset(10, "A", None)).unwrap();
        assert_eq!(most_corrective_asset(&state), None);
        state.assets.get_mut(0).unwrap().corrective_count = 2;
        assert_eq!(most_corrective_asset(&state).unwrap().asset_id, 10);
    }

    #[test]
    fn test_name_prefix_search_ignores_case() {
        let mut state = create_initial_state(None);
        state.assets.insert(asset(10, "Printer", None)).unwrap();
        state.assets.insert(asset(11, "Projector", None)).unwrap();
        state.assets.insert(asset(12, "Drill", None)).unwrap();
        assert_eq!(search_assets_by_name(&state, "pr").len(), 2);
        assert_eq!(search_assets_by_name(&state, "PRI").len(), 1);
        assert!(search_assets_by_name(&state, "").is_empty());
    }
}

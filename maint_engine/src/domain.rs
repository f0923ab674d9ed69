/// Maintenance tracker: Domain Types
///
/// Records for the five collections, their coded enums, calendar values
/// and the tracker-wide constants.
///
/// Every enum carries a stable integer code. The codes are what the
/// binary collection files store, so they must never be renumbered.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::UnknownCode;

// ---------------------------------------------------------------------------
// Coded enums
// ---------------------------------------------------------------------------

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $kind:literal {
            $($variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl TryFrom<i32> for $name {
            type Error = UnknownCode;

            fn try_from(code: i32) -> Result<Self, Self::Error> {
                $name::from_code(code).ok_or(UnknownCode { kind: $kind, code })
            }
        }
    };
}

coded_enum! {
    AssetCategory: "asset category" {
        Vehicle = 1 => "Vehicle",
        ItEquipment = 2 => "IT equipment",
        Furniture = 3 => "Furniture",
        Tool = 4 => "Tool",
        Other = 5 => "Other",
    }
}

coded_enum! {
    /// Lifecycle of an asset. Decommissioned is final.
    AssetState: "asset state" {
        Operational = 0 => "Operational",
        InMaintenance = 1 => "In maintenance",
        Decommissioned = 2 => "Decommissioned",
        Inactive = 3 => "Inactive",
    }
}

coded_enum! {
    /// Soft-deactivation flag of a department.
    Activity: "department activity" {
        Active = 1 => "Active",
        Inactive = 2 => "Inactive",
    }
}

coded_enum! {
    Specialty: "specialty" {
        It = 1 => "IT",
        Mechanic = 2 => "Mechanic",
        Electrician = 3 => "Electrician",
        GeneralMaintenance = 4 => "General maintenance",
        Other = 5 => "Other",
    }
}

coded_enum! {
    TechnicianState: "technician state" {
        Active = 0 => "Active",
        Busy = 1 => "Busy",
        Inactive = 2 => "Inactive",
    }
}

coded_enum! {
    /// Work-order state. Concluded and Cancelled are terminal.
    OrderState: "order state" {
        Pending = 0 => "Pending",
        Execution = 1 => "In execution",
        Concluded = 2 => "Concluded",
        Cancelled = 3 => "Cancelled",
    }
}

coded_enum! {
    Priority: "priority" {
        Low = 1 => "Low",
        Medium = 2 => "Medium",
        High = 3 => "High",
    }
}

coded_enum! {
    MaintenanceType: "maintenance type" {
        Preventive = 1 => "Preventive",
        Corrective = 2 => "Corrective",
    }
}

impl OrderState {
    pub fn is_open(self) -> bool {
        matches!(self, OrderState::Pending | OrderState::Execution)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

// ---------------------------------------------------------------------------
// Calendar values
// ---------------------------------------------------------------------------

/// Day/month/year triple as entered or captured. Not validated on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            day: date.day() as i32,
            month: date.month() as i32,
            year: date.year(),
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day, self.month, self.year)
    }
}

/// Wall-clock instant with second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl Timestamp {
    /// Seconds since the Unix epoch, reading the fields as UTC.
    ///
    /// Returns `None` when the fields do not form a real calendar instant.
    pub fn to_epoch_seconds(&self) -> Option<i64> {
        let date = NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        let instant = date.and_hms_opt(
            u32::try_from(self.hour).ok()?,
            u32::try_from(self.minute).ok()?,
            u32::try_from(self.second).ok()?,
        )?;
        Some(instant.and_utc().timestamp())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(instant: NaiveDateTime) -> Self {
        Self {
            day: instant.day() as i32,
            month: instant.month() as i32,
            year: instant.year(),
            hour: instant.hour() as i32,
            minute: instant.minute() as i32,
            second: instant.second() as i32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04} {:02}:{:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute, self.second
        )
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------
//
// Text fields are `Option<String>`: a record loaded from disk may carry an
// absent string, and absent must survive a save/load cycle distinct from "".

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i32,
    pub name: Option<String>,
    pub responsible: Option<String>,
    /// Phone or e-mail; which one is not recorded.
    pub contact: Option<String>,
    pub activity: Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i32,
    pub name: Option<String>,
    pub category: AssetCategory,
    pub location: Option<String>,
    pub acquired: CalendarDate,
    pub decommissioned: Option<CalendarDate>,
    pub state: AssetState,
    pub corrective_count: i32,
    pub accrued_cost: f32,
    pub unit_cost: f32,
    /// Checked against the department store once, at creation.
    pub department_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: i32,
    pub name: Option<String>,
    pub specialty: Specialty,
    pub state: TechnicianState,
    /// Last order this technician was assigned to, while it runs.
    pub order_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i32,
    pub asset_id: i32,
    /// Copied from the asset at creation and never re-derived.
    pub department_id: i32,
    pub technician_id: Option<i32>,
    pub state: OrderState,
    pub priority: Priority,
    pub kind: MaintenanceType,
    pub started: Option<Timestamp>,
    pub ended: Option<Timestamp>,
}

/// One consumed material line. `order_id` is never checked against orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    pub unit_cost: f32,
    pub quantity: i32,
    pub order_id: i32,
}

impl Material {
    pub fn line_cost(&self) -> f32 {
        self.unit_cost * self.quantity as f32
    }
}

/// Render an optional text field for display.
pub fn text_or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Thresholds and policy numbers shared by the engine and the reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConstants {
    /// Maximum concurrent Execution orders per technician.
    pub occupancy_cap: i32,
    /// Total linked orders at which an asset is reported unstable.
    pub instability_threshold: usize,
    /// Identifier handed out by an empty store.
    pub first_id: i32,
    /// Records added to a store's capacity each time it fills up.
    pub growth_step: usize,
    pub weight_low: i64,
    pub weight_medium: i64,
    pub weight_high: i64,
}

impl Default for TrackerConstants {
    fn default() -> Self {
        Self {
            occupancy_cap: 5,
            instability_threshold: 5,
            first_id: 10,
            growth_step: 5,
            weight_low: 1,
            weight_medium: 3,
            weight_high: 5,
        }
    }
}

impl TrackerConstants {
    /// Urgency weight of a priority.
    pub fn weight(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Low => self.weight_low,
            Priority::Medium => self.weight_medium,
            Priority::High => self.weight_high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_file_format() {
        assert_eq!(AssetState::Operational.code(), 0);
        assert_eq!(AssetState::Inactive.code(), 3);
        assert_eq!(Activity::Active.code(), 1);
        assert_eq!(TechnicianState::Inactive.code(), 2);
        assert_eq!(OrderState::Cancelled.code(), 3);
        assert_eq!(Priority::High.code(), 3);
        assert_eq!(MaintenanceType::Corrective.code(), 2);
        assert_eq!(AssetCategory::Other.code(), 5);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = OrderState::try_from(7).unwrap_err();
        assert_eq!(err.kind, "order state");
        assert_eq!(err.code, 7);
        assert_eq!(Activity::from_code(0), None);
    }

    #[test]
    fn test_every_variant_round_trips_its_code() {
        for s in Specialty::ALL {
            assert_eq!(Specialty::from_code(s.code()), Some(*s));
        }
    }

    #[test]
    fn test_open_states() {
        assert!(OrderState::Pending.is_open());
        assert!(OrderState::Execution.is_open());
        assert!(OrderState::Concluded.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
    }

    #[test]
    fn test_epoch_seconds_difference() {
        let start = Timestamp { day: 1, month: 1, year: 2024, hour: 10, minute: 0, second: 0 };
        let end = Timestamp { day: 1, month: 1, year: 2024, hour: 10, minute: 5, second: 30 };
        let delta = end.to_epoch_seconds().unwrap() - start.to_epoch_seconds().unwrap();
        assert_eq!(delta, 330);
    }

    #[test]
    fn test_epoch_seconds_rejects_impossible_date() {
        let bad = Timestamp { day: 31, month: 2, year: 2024, hour: 0, minute: 0, second: 0 };
        assert_eq!(bad.to_epoch_seconds(), None);
    }

    #[test]
    fn test_default_weights() {
        let c = TrackerConstants::default();
        assert_eq!(c.weight(Priority::Low), 1);
        assert_eq!(c.weight(Priority::Medium), 3);
        assert_eq!(c.weight(Priority::High), 5);
    }
}

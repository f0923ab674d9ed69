/// Maintenance tracker: Commands
///
/// Inputs accepted by the engine, plus the field rules the console
/// re-prompts on. Commands are plain values; nothing here touches state.

use serde::{Deserialize, Serialize};

use crate::domain::{AssetCategory, MaintenanceType, Priority, Specialty};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub asset_id: i32,
    pub priority: Priority,
    pub kind: MaintenanceType,
}

/// A material line before it is attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDraft {
    pub name: String,
    pub unit_cost: f32,
    pub quantity: i32,
}

/// What to do with an open order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderCommand {
    /// Pending -> Execution.
    Assign {
        technician_id: i32,
        materials: Vec<MaterialDraft>,
    },
    /// Execution -> Cancelled.
    Cancel,
    /// Execution -> Concluded.
    Conclude,
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::Assign { .. } => "assign",
            OrderCommand::Cancel => "cancel",
            OrderCommand::Conclude => "conclude",
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    Phone(String),
    Email(String),
}

impl Contact {
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Contact::Phone(p) if is_valid_phone(p) => Ok(()),
            Contact::Phone(_) => Err(EngineError::Invalid {
                field: "phone",
                reason: "must be exactly 9 digits",
            }),
            Contact::Email(e) if is_valid_email(e) => Ok(()),
            Contact::Email(_) => Err(EngineError::Invalid {
                field: "email",
                reason: "needs exactly one '@' and at least one '.'",
            }),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Contact::Phone(s) | Contact::Email(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub responsible: String,
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentUpdate {
    Name(String),
    Responsible(String),
    Contact(Contact),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub category: AssetCategory,
    pub location: String,
    pub unit_cost: f32,
    pub department_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTechnician {
    pub name: String,
    pub specialty: Specialty,
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 9 && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    email.matches('@').count() == 1 && email.contains('.')
}

/// At least three characters.
pub fn validate_department_name(name: &str) -> Result<(), EngineError> {
    if name.chars().count() < 3 {
        return Err(EngineError::Invalid {
            field: "department name",
            reason: "must have at least 3 characters",
        });
    }
    Ok(())
}

/// At least three characters, leading uppercase letter, no digits.
pub fn validate_person_name(name: &str) -> Result<(), EngineError> {
    let invalid = |reason| EngineError::Invalid { field: "name", reason };
    if name.chars().count() < 3 {
        return Err(invalid("must have at least 3 characters"));
    }
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return Err(invalid("must start with an uppercase letter"));
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("must not contain digits"));
    }
    Ok(())
}

pub fn validate_material(draft: &MaterialDraft) -> Result<(), String> {
    if draft.name.trim().is_empty() {
        return Err("material name is empty".to_string());
    }
    if !draft.unit_cost.is_finite() || draft.unit_cost < 0.0 {
        return Err(format!("unit cost {} is not a non-negative amount", draft.unit_cost));
    }
    if draft.quantity <= 0 {
        return Err(format!("quantity {} is not positive", draft.quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rule() {
        assert!(is_valid_phone("912345678"));
        assert!(!is_valid_phone("91234567"));
        assert!(!is_valid_phone("91234567a"));
    }

    #[test]
    fn test_email_rule() {
        assert!(is_valid_email("ops@example.pt"));
        assert!(!is_valid_email("ops@@example.pt"));
        assert!(!is_valid_email("ops@example"));
        assert!(!is_valid_email("ops.example.pt"));
    }

    #[test]
    fn test_contact_validation() {
        assert!(Contact::Phone("912345678".into()).validate().is_ok());
        assert!(Contact::Email("bad".into()).validate().is_err());
    }

    #[test]
    fn test_person_name_rules() {
        assert!(validate_person_name("Ana").is_ok());
        assert!(validate_person_name("Al").is_err());
        assert!(validate_person_name("ana").is_err());
        assert!(validate_person_name("Ana2").is_err());
    }

    #[test]
    fn test_department_name_rule() {
        assert!(validate_department_name("IT").is_err());
        assert!(validate_department_name("Ops").is_ok());
    }

    #[test]
    fn test_material_rules() {
        let ok = MaterialDraft { name: "Oil".into(), unit_cost: 2.5, quantity: 2 };
        assert!(validate_material(&ok).is_ok());
        let zero = MaterialDraft { quantity: 0, ..ok.clone() };
        assert!(validate_material(&zero).is_err());
        let negative = MaterialDraft { unit_cost: -1.0, ..ok };
        assert!(validate_material(&negative).is_err());
    }
}

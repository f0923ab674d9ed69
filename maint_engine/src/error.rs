/// Maintenance tracker: Error Types
///
/// Referential misses and rule rejections are values, never panics.
/// The console layer decides whether to re-prompt or abort.

use thiserror::Error;

use crate::domain::{AssetState, OrderState};

/// A stored integer did not match any variant of a coded enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i32,
}

/// A store could not grow to take one more record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot grow {collection} beyond {len} records")]
pub struct CapacityError {
    pub collection: &'static str,
    pub len: usize,
}

/// A state check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violation [{rule}]: {detail}")]
pub struct InvariantViolation {
    pub rule: &'static str,
    pub detail: String,
}

impl InvariantViolation {
    pub fn new(rule: &'static str, detail: impl Into<String>) -> Self {
        Self { rule, detail: detail.into() }
    }
}

/// Rejections raised by the order lifecycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("no asset is currently operational")]
    NoOperationalAssets,
    #[error("asset {0} not found")]
    AssetNotFound(i32),
    #[error("asset {id} is {state}, not operational")]
    AssetUnavailable { id: i32, state: AssetState },
    #[error("open order {0} not found")]
    OrderNotFound(i32),
    #[error("order {id} is already {state}")]
    OrderClosed { id: i32, state: OrderState },
    #[error("{command} is not allowed while order {id} is {state}")]
    CommandMismatch {
        id: i32,
        state: OrderState,
        command: &'static str,
    },
    #[error("technician {0} not found")]
    TechnicianNotFound(i32),
    #[error("technician {0} is inactive")]
    TechnicianInactive(i32),
    #[error("technician {id} already has {load} orders in execution")]
    TechnicianAtCapacity { id: i32, load: usize },
    #[error("invalid material line: {0}")]
    InvalidMaterial(String),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Everything an engine operation can reject with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("no active department exists")]
    NoActiveDepartments,
    #[error("department {0} not found")]
    DepartmentNotFound(i32),
    #[error("department {0} is inactive")]
    DepartmentInactive(i32),
    #[error("asset {0} not found")]
    AssetNotFound(i32),
    #[error("asset {0} is under maintenance")]
    AssetInMaintenance(i32),
    #[error("technician {0} not found")]
    TechnicianNotFound(i32),
    #[error("technician {0} is busy")]
    TechnicianBusy(i32),
    #[error("{kind} {id} is already inactive")]
    AlreadyInactive { kind: &'static str, id: i32 },
}

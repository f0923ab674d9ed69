#![forbid(unsafe_code)]

//! Maintenance tracker kernel.
//!
//! Entity stores, the work-order lifecycle and the reports built on top.
//! No file or console I/O happens here; the clock and the activity log
//! are injected through `ports`.

pub mod arithmetic;
pub mod domain;
pub mod error;
pub mod store;
pub mod state;
pub mod lookup;
pub mod commands;
pub mod transitions;
pub mod invariants;
pub mod reports;
pub mod hashing;
pub mod ports;
pub mod engine;

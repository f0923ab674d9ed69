#![forbid(unsafe_code)]

//! Maintenance tracker runtime.
//!
//! Binary collection files, the activity log file, console prompting,
//! menus and configuration around the `maint_engine` kernel.
//!
//! No domain rules live here; every mutation goes through the engine.

pub mod codec;
pub mod collection_store;
pub mod config;
pub mod activity_log;
pub mod diagnostics;
pub mod session;
pub mod console;
pub mod render;
pub mod menu;

//! `maint`: terminal asset-maintenance tracker.
//!
//! Loads every collection at start, runs the menus, saves at exit.

use std::io;
use std::rc::Rc;

use anyhow::Context;

use maint_engine::ports::{ActivityLog, SystemClock};
use maint_runtime::activity_log::FileActivityLog;
use maint_runtime::config::TrackerConfig;
use maint_runtime::console::{ConsoleError, ConsolePrompter};
use maint_runtime::diagnostics::init_tracing;
use maint_runtime::menu;
use maint_runtime::session::{Ports, Session};

fn main() -> anyhow::Result<()> {
    let config = TrackerConfig::load().context("reading maint.toml")?;
    std::fs::create_dir_all(&config.storage.data_dir)
        .with_context(|| format!("creating {}", config.storage.data_dir.display()))?;
    let _guard = init_tracing(&config).context("starting diagnostics")?;

    tracing::info!("maint v{} starting", env!("CARGO_PKG_VERSION"));

    let log_path = config.activity_log_path();
    let log: Rc<dyn ActivityLog> = Rc::new(FileActivityLog::new(&log_path));
    log.append("Info: session started");

    let mut session = Session::open(Ports::files(&config.storage), Box::new(SystemClock), Rc::clone(&log));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = ConsolePrompter::new(stdin.lock(), stdout.lock());
    let outcome = menu::run(&mut session, &mut console, &log_path);

    let report = session.save_all();
    if report.is_complete() {
        log.append("Info: session saved");
    } else {
        for (collection, error) in &report.failed {
            eprintln!("Could not save {}: {}", collection, error);
        }
    }

    match outcome {
        Ok(()) | Err(ConsoleError::InputClosed) => Ok(()),
        Err(e) => Err(e).context("console failure"),
    }
}

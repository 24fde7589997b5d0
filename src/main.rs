mod cli;
mod companion;
mod config;
mod error;
mod hardware;
mod logger;
mod modes;
mod pp_table;
mod sysfs;

use std::process::ExitCode;

use tracing::debug;

use cli::parse_args;
use companion::SignalledDaemon;
use config::Config;

fn main() -> ExitCode {
    // Invalid invocation: bail out before touching sysfs or signalling anything
    let mode = match parse_args() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    logger::init();

    let config = Config::default();
    let mut daemon = SignalledDaemon::new(config.daemon_name.as_str());

    // Per-device failures are already on stderr; they never change the exit status
    let report = modes::run(&config, mode, &mut daemon);
    debug!(
        gate_active = report.gate_active,
        actions = report.outcomes.len(),
        failed = report.outcomes.iter().filter(|o| !o.succeeded()).count(),
        "{mode:?} run finished"
    );

    ExitCode::SUCCESS
}

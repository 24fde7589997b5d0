//! Pausing and resuming the CoreCtrl helper around the SMU reset.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;

/// Something that must hold still while clocks are reset.
pub trait CompanionDaemon {
    fn pause(&mut self);
    fn resume(&mut self);
}

/// Signals every process with the given name, like `killall`. A daemon that
/// isn't running is not an error.
#[derive(Debug, Clone)]
pub struct SignalledDaemon {
    name: String,
}

impl SignalledDaemon {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Processes whose name is exactly `self.name`; prefixes don't match.
    fn matching_pids(&self) -> Vec<Pid> {
        let refresh = RefreshKind::new().with_processes(ProcessRefreshKind::new());
        let sys = System::new_with_specifics(refresh);

        sys.processes_by_exact_name(&self.name)
            .map(|process| Pid::from_raw(process.pid().as_u32() as i32))
            .collect()
    }

    fn signal_all(&self, signal: Signal) {
        let mut delivered = 0;
        for pid in self.matching_pids() {
            match kill(pid, signal) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Failed to send {signal} to {} ({pid}): {e}", self.name),
            }
        }

        debug!("Sent {signal} to {delivered} {} process(es)", self.name);
    }
}

impl CompanionDaemon for SignalledDaemon {
    fn pause(&mut self) {
        self.signal_all(Signal::SIGSTOP);
    }

    fn resume(&mut self) {
        self.signal_all(Signal::SIGCONT);
    }
}

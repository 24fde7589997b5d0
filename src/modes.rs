use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::companion::CompanionDaemon;
use crate::config::Config;
use crate::hardware::eligible_cards;
use crate::sysfs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Invoked before the system sleeps
    Suspend,
    /// Invoked after the system wakes
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeParseError(String);

impl fmt::Display for ModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode '{}', expected suspend or resume", self.0)
    }
}

impl std::error::Error for ModeParseError {}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "suspend" => Ok(Mode::Suspend),
            "resume" => Ok(Mode::Resume),
            _ => Err(ModeParseError(name.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ResetClockVoltage,
    UploadPpTable,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ResetClockVoltage => f.write_str("Reset clock and voltage"),
            Action::UploadPpTable => f.write_str("PP table upload"),
        }
    }
}

#[derive(Debug)]
pub struct DeviceOutcome {
    pub card: String,
    pub action: Action,
    /// Failure reason, if any
    pub error: Option<String>,
}

impl DeviceOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for DeviceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(f, "{} succeeded for {}", self.action, self.card),
            Some(e) => write!(f, "{} failed for {}: {e}", self.action, self.card),
        }
    }
}

/// What one invocation did. Never affects the exit code.
#[derive(Debug, Default)]
pub struct RunReport {
    pub gate_active: bool,
    pub outcomes: Vec<DeviceOutcome>,
}

/// Apply `mode` to every eligible card.
///
/// The daemon is paused once, before the first reset, and resumed once,
/// after the last upload. Per-device failures are reported and the loop
/// moves on.
pub fn run(config: &Config, mode: Mode, daemon: &mut dyn CompanionDaemon) -> RunReport {
    let mut report = RunReport::default();

    if !sysfs::global_override_active(&config.feature_mask_path) {
        debug!("PP overdrive not enabled in ppfeaturemask, nothing to do");
        return report;
    }
    report.gate_active = true;

    let cards = match eligible_cards(&config.drm_class_dir) {
        Ok(cards) => cards,
        Err(e) => {
            warn!("Cannot list {}: {e}", config.drm_class_dir.display());
            return report;
        }
    };

    // Suspend: daemon already paused. Resume: some table was uploaded.
    let mut once = false;

    for card in cards {
        let pp_table = sysfs::fetch_pp_table(&card.device_dir);
        if pp_table.is_empty() {
            debug!("Skipping {}: cannot fetch PP table", card.name);
            continue;
        }

        let (action, result) = match mode {
            Mode::Suspend => {
                if !once {
                    daemon.pause();
                    once = true;
                }
                // Table only proves the device is readable; it is not needed here
                drop(pp_table);
                (Action::ResetClockVoltage, sysfs::reset_clock_voltage(&card.device_dir))
            }
            Mode::Resume => {
                let result = sysfs::upload_pp_table(&card.device_dir, &pp_table);
                once = true;
                (Action::UploadPpTable, result)
            }
        };

        let outcome = DeviceOutcome {
            card: card.name,
            action,
            error: result.err().map(|e| e.to_string()),
        };
        if outcome.succeeded() {
            info!("{outcome}");
        } else {
            warn!("{outcome}");
        }
        report.outcomes.push(outcome);
    }

    if mode == Mode::Resume && once {
        daemon.resume();
    }

    report
}

use std::ffi::OsString;

use clap::{Arg, Command};

use crate::error::CliError;
use crate::modes::Mode;

fn command() -> Command {
    Command::new("amdgpu-sleep-fix")
        .about("Keeps overridden AMD GPU PP tables in sync with the SMU across suspend/resume")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("mode")
                .value_name("MODE")
                .required(true)
                .value_parser(["suspend", "resume"])
                .help("suspend before sleeping, resume after waking"),
        )
}

pub fn parse_args() -> Result<Mode, CliError> {
    parse_args_from(std::env::args_os())
}

/// `args` includes the program name, as `std::env::args_os` does.
pub fn parse_args_from<I, T>(args: I) -> Result<Mode, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    // clap would also swallow a "--" separator; the sleep hook passes one token
    let count = args.len().saturating_sub(1);
    if count != 1 {
        return Err(CliError::ArgCount { count });
    }

    let matches = command().try_get_matches_from(args)?;
    let mode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or_default();

    mode.parse::<Mode>()
        .map_err(|e| CliError::Usage(command().error(clap::error::ErrorKind::InvalidValue, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_modes() {
        assert_eq!(parse_args_from(["prog", "suspend"]).unwrap(), Mode::Suspend);
        assert_eq!(parse_args_from(["prog", "resume"]).unwrap(), Mode::Resume);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        for bad in ["hibernate", "Suspend", "RESUME", "", "pre"] {
            assert!(
                matches!(parse_args_from(["prog", bad]), Err(CliError::Usage(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_wrong_argument_count() {
        assert!(matches!(
            parse_args_from(["prog"]),
            Err(CliError::ArgCount { count: 0 })
        ));
        assert!(matches!(
            parse_args_from(["prog", "suspend", "resume"]),
            Err(CliError::ArgCount { count: 2 })
        ));
        assert!(matches!(
            parse_args_from(["prog", "--", "suspend"]),
            Err(CliError::ArgCount { count: 2 })
        ));
    }

    #[test]
    fn test_help_and_version_are_not_modes() {
        assert!(parse_args_from(["prog", "--help"]).is_err());
        assert!(parse_args_from(["prog", "-h"]).is_err());
        assert!(parse_args_from(["prog", "--version"]).is_err());
    }
}

use std::process::ExitCode;

use crate::Error;

pub fn exit_code(err: &Error) -> ExitCode {
    match err {
        Error::ReadConfig { .. } => ExitCode::from(74),
        Error::ParseConfig { .. } => ExitCode::from(65),
        Error::InvalidConfig { .. } => ExitCode::from(65),
        Error::ExplicitConfigMissing { .. } => ExitCode::from(66),
        Error::ConfigDiscoveryFailed { .. } => ExitCode::from(66),
        Error::WorkingDirectoryUnavailable { .. } => ExitCode::from(70),
        Error::SkipDiscoveryRequiresConfig { .. } => ExitCode::from(64),
        Error::RuntimeUnreachable { .. } => ExitCode::from(69),
        Error::NetworkProvisionFailed { .. } => ExitCode::from(70),
        Error::StartIncomplete { .. } => ExitCode::FAILURE,
        Error::PromptFailed { .. } => ExitCode::from(74),
    }
}

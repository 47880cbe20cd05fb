//! Exit codes of the `content-check` binary.
//!
//! Lets schedulers and shell scripts act on the outcome without parsing JSON.

use crate::message::CheckResult;

/// Success - command completed; for `run`, the check is up.
pub const SUCCESS: i32 = 0;

/// Check ran but the target is down, or the check reported an error.
pub const DOWN: i32 = 1;

/// Usage error - invalid arguments or an unreadable check request.
pub const USAGE: i32 = 2;

/// Internal error - unexpected error occurred.
pub const INTERNAL: i32 = 7;

pub fn from_result(result: &CheckResult) -> i32 {
    if result.is_up() { SUCCESS } else { DOWN }
}

/// Convert an anyhow::Error from the CLI layer to an exit code.
pub fn from_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<crate::error::CliError>() {
        Some(
            crate::error::CliError::InputRead(_)
            | crate::error::CliError::InputParse(_)
            | crate::error::CliError::ConfigParse(_)
            | crate::error::CliError::ConfigInvalid(_),
        ) => USAGE,
        _ => INTERNAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::message::{CheckRequest, MainResult};
    use anyhow::anyhow;

    #[test]
    fn test_from_result_up() {
        let mut result = CheckResult::from_request(CheckRequest::default());
        result.main_result = MainResult::Up(40);
        assert_eq!(from_result(&result), SUCCESS);
    }

    #[test]
    fn test_from_result_down() {
        let result = CheckResult::from_request(CheckRequest::default());
        assert_eq!(from_result(&result), DOWN);
    }

    #[test]
    fn test_from_result_error_is_down() {
        let mut result = CheckResult::from_request(CheckRequest::default());
        result.main_result = MainResult::Up(40);
        result.error = "connection refused".to_string();
        assert_eq!(from_result(&result), DOWN);
    }

    #[test]
    fn test_from_error_usage() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = anyhow::Error::from(CliError::InputParse(parse));
        assert_eq!(from_error(&err), USAGE);
    }

    #[test]
    fn test_from_error_bad_config_is_usage() {
        let err = anyhow::Error::from(CliError::ConfigInvalid("defaults.port".to_string()));
        assert_eq!(from_error(&err), USAGE);
    }

    #[test]
    fn test_from_error_internal() {
        let err = anyhow!("Something went wrong");
        assert_eq!(from_error(&err), INTERNAL);
    }
}

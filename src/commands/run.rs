use crate::checker::Checker;
use crate::cli::RunArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::exit_codes;
use crate::message::CheckRequest;
use crate::output::print_result;
use anyhow::Result;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Execute the run command. Returns the process exit code.
pub async fn execute(ctx: &Context, args: RunArgs) -> Result<i32> {
    let request = read_request(args.input.as_deref())?;
    debug!(monitor_id = %request.monitor_id, "loaded check request");

    let mut checker = Checker::with_defaults(ctx.defaults().clone());
    let result = checker.check(request).await;

    let sent = args.show_request.then(|| checker.last_request());
    print_result(&result, sent.as_ref(), ctx.output_format())?;

    Ok(exit_codes::from_result(&result))
}

/// Read a check request from `input`, or stdin when it is `None` or `-`.
pub fn read_request(input: Option<&Path>) -> Result<CheckRequest, CliError> {
    let raw = match input {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).map_err(CliError::InputRead)?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(CliError::InputRead)?;
            buf
        }
    };
    parse_request(&raw)
}

pub fn parse_request(raw: &str) -> Result<CheckRequest, CliError> {
    serde_json::from_str(raw).map_err(CliError::InputParse)
}

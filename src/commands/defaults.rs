use crate::cli::OutputFormat;
use crate::config::Context;
use crate::output::{print_json, print_pretty_json};
use anyhow::Result;

/// Print the instance defaults checks are layered onto.
pub fn execute(ctx: &Context) -> Result<()> {
    match ctx.output_format() {
        OutputFormat::Json => print_json(ctx.defaults()),
        OutputFormat::Table | OutputFormat::Pretty => print_pretty_json(ctx.defaults()),
    }
}

use anyhow::Result;
use clap::Parser;
use http_content_check::cli::{Cli, Commands};
use http_content_check::{commands, config, exit_codes, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code(exit_codes::from_error(&e))
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Load config with CLI overrides
    let mut ctx = config::Context::load(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        ctx.set_format(format);
    }

    match cli.command {
        Commands::Run(args) => commands::run::execute(&ctx, args).await,
        Commands::Defaults => {
            commands::defaults::execute(&ctx)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Completion { shell } => {
            commands::completion::generate_completions(shell)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}

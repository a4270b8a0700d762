//! wsctl binary entrypoint.

use std::io;
use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wsctl_cli::cli::{build_command, parse_matches, GlobalArgs, Invocation};
use wsctl_cli::commands::invoke::{exit_code, read_pipeline};
use wsctl_cli::commands::{InvokeCommand, OperationsCommand};
use wsctl_cli::confirm::PromptConfirmer;
use wsctl_cli::{CliError, HttpWorkspacesClient, OutputFormat, Settings, WsctlConfig};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = build_command().get_matches();
    let (globals, invocation) = match parse_matches(&matches) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(globals, invocation)) {
        Ok(code) => code,
        Err(e) => {
            debug!(kind = e.kind(), local = e.is_local(), "invocation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(globals: GlobalArgs, invocation: Invocation) -> Result<ExitCode, CliError> {
    let config = WsctlConfig::load(globals.config.as_deref())?;
    let settings = Settings::resolve(config, &globals)?;

    match invocation {
        Invocation::Operations { filter } => {
            let format = OutputFormat::new(settings.format);
            OperationsCommand::new(filter).execute(&mut io::stdout().lock(), &format)?;
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Operation(request) => {
            request.preflight()?;
            let pipeline = if request.stdin {
                Some(read_pipeline(io::stdin().lock())?)
            } else {
                None
            };

            let client = HttpWorkspacesClient::from_settings(&settings).await?;
            debug!(endpoint = %client.endpoint(), operation = request.op.name, "invoking");

            let cancel = CancellationToken::new();
            let ctrl_c = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                }
            });

            let result = InvokeCommand::new(settings)
                .execute(
                    &client,
                    &PromptConfirmer,
                    cancel,
                    request,
                    pipeline,
                    io::stdout(),
                    io::stderr(),
                )
                .await;
            ctrl_c.abort();

            Ok(exit_code(&result?))
        }
    }
}

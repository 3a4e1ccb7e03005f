//! autoship - provision a VM and deploy a web application onto it

use std::process::ExitCode;

use autoship_cli::application::context::RunContext;
use autoship_cli::application::services::pipeline::failed_stage;
use autoship_cli::cli::Cli;
use autoship_cli::output::json;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let run = RunContext::new();
    let token = run.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; stopping after the current step (press Ctrl-C again to abort)");
            token.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    match cli.run(&run).await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            if json_mode {
                let code = failed_stage(&e).map_or("error", |s| s.tag());
                match json::format_error(&message, code) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("Error: {message}"),
                }
            } else {
                eprintln!("Error: {message}");
            }
            ExitCode::FAILURE
        }
    }
}

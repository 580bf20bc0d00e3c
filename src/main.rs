// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use mech::{
    cli::{ApiArgs, Cli, Command, GlobalArgs},
    client::ConstellixClient,
    commands::{self, SyncRequest},
    constants::ENV_LOG_FORMAT,
    resource::ResourceKind,
};
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    if cli.global.no_color {
        colored::control::set_override(false);
    }

    let result = tokio::runtime::Builder::new_multi_thread()
        .thread_name("mech")
        .enable_all()
        .build()
        .context("unable to start the async runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err}");
            for cause in err.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

// Format: timestamp file:line LEVEL message
//
// Respects RUST_LOG if set, otherwise the level selected by -v / --debug.
// RUST_LOG_FORMAT=json switches to JSON lines. Logs go to stderr so that
// YAML dumps on stdout stay clean.
fn init_tracing(global: &GlobalArgs) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(global.log_level()));

    let log_format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(!global.no_color)
                .compact()
                .init();
        }
    }
}

fn connect(api: &ApiArgs) -> Result<ConstellixClient> {
    let config = api.client_config()?;
    debug!(dns = %api.dns_api_url, sonar = %api.sonar_api_url, "Creating Constellix client");
    ConstellixClient::new(config).context("unable to create the Constellix client")
}

async fn run(cli: Cli) -> Result<()> {
    let color = !cli.global.no_color;

    match cli.command {
        Command::Discover(args) => {
            let client = connect(&args.api)?;
            let dump = commands::discover(&client, args.target, args.domain.as_deref()).await?;
            match args.output {
                Some(path) => std::fs::write(&path, dump)
                    .with_context(|| format!("unable to write {}", path.display()))?,
                None => print!("{dump}"),
            }
        }
        Command::Sync(args) => {
            let client = connect(&args.api)?;
            let request = SyncRequest {
                config: args.config,
                apply: args.doit,
                allow_delete: args.remove,
                only: args.only,
                color,
            };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            commands::sync(&client, &request, &mut out).await?;
            out.flush()?;
        }
        Command::Status(args) => {
            let client = connect(&args.api)?;
            let kinds = match args.kind {
                Some(kind) => vec![ResourceKind::from(kind)],
                None => vec![ResourceKind::HttpCheck, ResourceKind::TcpCheck],
            };
            println!("{}", commands::status(&client, &kinds, color).await?);
        }
        Command::Completions(args) => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(args.shell, &mut command, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

//! FlashDefender Control - CLI client for flashdefenderd
//!
//! Talks to the daemon over HTTP, or runs the scan in-process with --direct.

use anyhow::Result;
use clap::Parser;
use flashdefender_common::{HttpConnector, PipelineSettings};
use flashdefenderctl::cli::{Cli, Commands, DEFAULT_LOG_FILTER};
use flashdefenderctl::client::{DaemonClient, ProcessReply};
use flashdefenderctl::{direct, output};
use owo_colors::OwoColorize;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns whether the command succeeded
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::TestConnection { connection } => {
            let client = DaemonClient::new(&cli.daemon)?;
            let (_, response) = client
                .test_connection(&connection.to_test_request())
                .await?;
            if cli.json {
                print_json(&response)?;
            } else {
                println!("{}", output::render_connection(&response));
            }
            Ok(response.success)
        }

        Commands::ProcessDns {
            connection,
            default_dns,
            dns_to_delete,
            direct,
        } => {
            let request = connection.to_process_request(&default_dns, &dns_to_delete);
            let reply = if direct {
                let settings = PipelineSettings::default();
                let connector = HttpConnector::new(settings.request_timeout);
                direct::process_dns(&connector, &request, settings).await?
            } else {
                DaemonClient::new(&cli.daemon)?.process_dns(&request).await?
            };

            match &reply {
                ProcessReply::Finished(report) if cli.json => print_json(report)?,
                ProcessReply::Finished(report) => print!("{}", output::render_report(report)),
                ProcessReply::Refused { error, .. } if cli.json => print_json(error)?,
                ProcessReply::Refused { status, error } => {
                    eprintln!("{}", output::render_error(*status, error))
                }
            }
            Ok(reply.is_finished())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "[ERROR]".bright_red(), e);
            std::process::exit(1);
        }
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use virtstate::config::{ConnectionConfig, ModuleArgs};
use virtstate::error::VirtError;
use virtstate::kubernetes::create_client;
use virtstate::reconcilers::{execute, ModuleName};
use virtstate::types::{FailureOutput, ModuleOutput};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Reconcile KubeVirt resources to a declared state
#[derive(Debug, Parser)]
#[command(name = "virtstate", version)]
struct Cli {
    /// Module to run
    #[arg(value_enum)]
    module: ModuleName,

    /// JSON or YAML file with the module parameters
    args_file: PathBuf,

    #[arg(long, value_enum, default_value = "text", env = "VIRTSTATE_LOG_FORMAT")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli).await {
        Ok(output) => {
            info!("Module {:?} finished, changed={}", cli.module, output.changed);
            emit(&output)
        }
        Err(err) => {
            error!("Module {:?} failed: {:#}", cli.module, err);
            let failure = match err.downcast_ref::<VirtError>() {
                Some(virt) => FailureOutput::from(virt),
                None => FailureOutput::from_message(format!("{:#}", err)),
            };
            emit(&failure);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ModuleOutput> {
    let args = ModuleArgs::from_file(&cli.args_file)?;
    debug!("Loaded arguments from {}", cli.args_file.display());

    let connection = ConnectionConfig::from_args(&args)?;
    let client = create_client(&connection).await?;

    Ok(execute(cli.module, client, &args).await?)
}

/// Stdout carries only the result document
fn emit<T: Serialize>(document: &T) -> ExitCode {
    match serde_json::to_string(document) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

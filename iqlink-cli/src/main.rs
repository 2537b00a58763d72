//! `iqlink` — command-line host for iqlink-core.
//!
//! ```text
//! iqlink validate <file|->
//! iqlink pretty <file|->
//! iqlink source <config-file> <name>
//! iqlink stream [--config <file>] [--blocks N]
//! iqlink info
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

mod args;
mod run_stream;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use args::Command;
use iqlink_core::{control, json, kernels};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("iqlink: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let command = args::parse(std::env::args().skip(1)).map_err(anyhow::Error::msg)?;

    match command {
        Command::Help => {
            println!("{}", args::USAGE);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { input } => {
            let text = read_input(&input)?;
            if json::is_valid_json(&text) {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Pretty { input } => {
            let text = read_input(&input)?;
            match json::pretty_print(&text) {
                Ok(pretty) => {
                    println!("{pretty}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Source { config, name } => {
            let text = read_input(&config)?;
            match control::source_entry(&text, &name)? {
                Some(entry) => {
                    println!("{entry}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("source '{name}' not found");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Stream { config, blocks } => {
            let config = match config {
                Some(path) => iqlink_core::PumpConfig::from_json(&read_input(&path)?)?,
                None => iqlink_core::PumpConfig::default(),
            };
            let report = run_stream::run(config, blocks)?;
            println!("{}", json::to_json_text(&report, true)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Info => {
            println!("iqlink {}", env!("CARGO_PKG_VERSION"));
            println!("kernel backend: {}", kernels::BACKEND);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Read a file, or stdin for `-`.
fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("failed to read {path}"))
}

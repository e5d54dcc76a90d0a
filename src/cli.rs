//! # gislack CLI Interface (Module)
//!
//! Command-line parsing, subcommand routing and the single place where results are printed.
//! All request building, dispatch and decoding lives in `gislack-core`; this module only turns
//! arguments into typed operations and hands them over.
//!
//! ## Features
//! - [`Cli`] and [`Commands`] define the user-facing surface (`gist`, `slack`, `doublesubmit`,
//!   `auth`, `json`).
//! - `json --json '{"command": ..., "options": {...}}'` feeds the same argument structs from a
//!   JSON document, for callers driving gislack from other programs.
//! - [`run`] is the async entrypoint shared by `main` and the integration tests.
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::commands::auth::{auth, AuthMode};
use crate::commands::double_submit::double_submit;
use crate::commands::gist::gist;
use crate::commands::slack::slack;
use crate::options::{AuthArgs, DoubleSubmitArgs, GistArgs, SlackArgs};

/// CLI for gislack: submit files to GitHub Gist and Slack.
#[derive(Parser, Debug)]
#[clap(
    name = "gislack",
    version,
    about = "Submits files to GitHub Gist and Slack, one at a time or both at once"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submits files to gist.
    #[clap(visible_alias = "g")]
    Gist(GistArgs),
    /// Submits files to slack.
    #[clap(visible_alias = "s")]
    Slack(SlackArgs),
    /// Submits a file to both gist and slack.
    #[clap(visible_alias = "d")]
    Doublesubmit(DoubleSubmitArgs),
    /// Retrieves access tokens for gist and slack.
    #[clap(visible_alias = "a")]
    Auth(AuthArgs),
    /// Submission control using JSON data.
    #[clap(visible_alias = "j")]
    Json {
        /// Value is JSON data: {"command": "...", "options": {...}}
        #[clap(long)]
        json: String,
    },
}

/// A JSON control document.
#[derive(Debug, Deserialize)]
pub struct JsonControl {
    pub command: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppCheck {
    appcheck: bool,
}

fn options_as<T: DeserializeOwned>(options: Value) -> Result<T> {
    let options = match options {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(options).context("JSON options do not match the command")
}

async fn run_json(document: &str) -> Result<String> {
    let control: JsonControl = serde_json::from_str(document)
        .context("JSON Format error. Please confirm inputted JSON again.")?;
    tracing::info!(command = %control.command, "Routing JSON control document");
    match control.command.as_str() {
        "gist" => gist(options_as(control.options)?).await,
        "slack" => slack(options_as(control.options)?).await,
        "doublesubmit" => double_submit(options_as(control.options)?).await,
        "auth" => auth(options_as(control.options)?, AuthMode::ShowUrl).await,
        "appcheck" => {
            let check: AppCheck = options_as(control.options)?;
            Ok(if check.appcheck { "ok".to_string() } else { String::new() })
        }
        other => Err(anyhow!("'{other}' is not a gislack command")),
    }
}

/// Runs one command and returns what it prints.
pub async fn execute(command: Commands) -> Result<String> {
    match command {
        Commands::Gist(args) => gist(args).await,
        Commands::Slack(args) => slack(args).await,
        Commands::Doublesubmit(args) => double_submit(args).await,
        Commands::Auth(args) => auth(args, AuthMode::Interactive).await,
        Commands::Json { json } => run_json(&json).await,
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match execute(cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            tracing::info!("Command completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            Err(e)
        }
    }
}

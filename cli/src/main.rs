//! Print a CircleCI workflow as JSON.
//!
//! ```text
//! CIRCLECI_SESSION_TOKEN=... get-circle-workflow -workflow-id <id> [-v]
//! CIRCLECI_TOKEN=... get-circle-workflow --api rest -workflow-id <id>
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use circleci_core::{CancellationToken, QueryClient, RestClient, Workflow};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Api {
    /// Query API, transit+json, session cookie
    Query,
    /// REST v2, JSON, API token cookie
    Rest,
}

#[derive(Debug, Parser)]
#[command(name = "get-circle-workflow", about = "Print a CircleCI workflow as JSON")]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'v')]
    verbose: bool,

    /// Workflow id
    #[arg(long = "workflow-id", default_value = "", allow_hyphen_values = true)]
    workflow_id: String,

    /// Which API to query
    #[arg(long, value_enum, default_value_t = Api::Query)]
    api: Api,

    /// Override the API root
    #[arg(long = "base-url")]
    base_url: Option<String>,

    #[arg(long, env = "CIRCLECI_SESSION_TOKEN", hide_env_values = true, default_value = "")]
    session_token: String,

    #[arg(long, env = "CIRCLECI_TOKEN", hide_env_values = true, default_value = "")]
    token: String,
}

/// Long flags accepted with a single dash, Go style.
const LONG_FLAGS: &[&str] = &["workflow-id", "api", "base-url", "session-token", "token", "help"];

/// Long flags given with a single dash (`-workflow-id`) are rewritten to the
/// double-dash form clap expects. Anything else, including values and short
/// flag clusters, is passed through.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut seen_terminator = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || seen_terminator {
                return arg;
            }
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s == "--" {
                seen_terminator = true;
                return arg;
            }
            let Some(rest) = s.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
                return arg;
            };
            let name = rest.split('=').next().unwrap_or(rest);
            if LONG_FLAGS.contains(&name) {
                return OsString::from(format!("-{s}"));
            }
            arg
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn fetch(cli: &Cli, cancel: &CancellationToken) -> Result<Workflow> {
    tracing::debug!(api = ?cli.api, workflow_id = %cli.workflow_id, "fetching workflow");
    let workflow = match cli.api {
        Api::Query => {
            let mut builder = QueryClient::builder().session_token(&cli.session_token);
            if let Some(url) = &cli.base_url {
                builder = builder.base_url(url);
            }
            if cli.verbose {
                builder = builder.debug_logging();
            }
            builder.build().get_workflow(cancel, &cli.workflow_id).await?
        }
        Api::Rest => {
            let mut builder = RestClient::builder().token(&cli.token);
            if let Some(url) = &cli.base_url {
                builder = builder.base_url(url);
            }
            if cli.verbose {
                builder = builder.debug_logging();
            }
            builder.build().get_workflow(cancel, &cli.workflow_id).await?
        }
    };
    Ok(workflow)
}

async fn run(cli: Cli) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let workflow = fetch(&cli, &cancel).await.context("issue getting workflow")?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &workflow).context("writing workflow")?;
    writeln!(stdout).context("writing workflow")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

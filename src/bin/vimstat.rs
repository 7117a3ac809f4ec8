#![forbid(unsafe_code)]

//! Reads Vimeo links from stdin and prints their view, like and comment
//! counts, either as labelled text or as HTML table rows.
//!
//! ```text
//! vimstat [--html] < url-file
//! ```

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::process;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vimstat::config::{self, FetcherKind, RuntimeConfig};
use vimstat::driver;
use vimstat::fetch::{HttpFetcher, PageFetcher, WgetFetcher};
use vimstat::format::OutputFormat;

const LOG_ENV_VAR: &str = "VIMSTAT_LOG";
const HELP_HINT: &str = "Try `--help' for more information.";

/// What the command line asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invocation {
    Help,
    Run { format: OutputFormat },
}

#[derive(Debug, Error, PartialEq, Eq)]
enum ArgError {
    #[error("Invalid argument: {0}")]
    Invalid(String),
}

impl Invocation {
    #[cfg(test)]
    fn from_slice(values: &[&str]) -> Result<Self, ArgError> {
        Self::from_args(values.iter().map(|value| value.to_string()))
    }

    /// Flags are handled left to right; the first `--help` or unknown
    /// argument decides the outcome.
    fn from_args<I>(iter: I) -> Result<Self, ArgError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut format = OutputFormat::Text;
        for arg in iter {
            match arg.as_str() {
                "--help" => return Ok(Invocation::Help),
                "--html" => format = OutputFormat::Html,
                _ => return Err(ArgError::Invalid(arg)),
            }
        }
        Ok(Invocation::Run { format })
    }
}

fn usage(program_name: &str) -> String {
    format!(
        "Usage: {program_name} [OPTIONS].. < url-file\n\
         \n\
         Possible options:\n  \
         --help    output this message and exit\n  \
         --html    output as html <table> row\n"
    )
}

fn build_fetcher(config: &RuntimeConfig) -> Box<dyn PageFetcher> {
    match config.fetcher {
        FetcherKind::Http => Box::new(HttpFetcher::new(config.timeout, &config.user_agent)),
        FetcherKind::Wget => Box::new(WgetFetcher::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Outcome of the checks that run before any input is read.
#[derive(Debug, PartialEq, Eq)]
enum Startup {
    Help(String),
    Run { format: OutputFormat },
    Fatal { message: String, code: i32 },
}

/// Capability check first, then flags, so `--help` is unreachable when a
/// required tool is missing.
fn startup<I>(program_name: &str, args: I, fetcher: &dyn PageFetcher) -> Startup
where
    I: IntoIterator<Item = String>,
{
    if let Err(err) = fetcher.ensure_available() {
        return Startup::Fatal {
            message: format!("{err:#}"),
            code: 1,
        };
    }

    match Invocation::from_args(args) {
        Ok(Invocation::Help) => Startup::Help(usage(program_name)),
        Ok(Invocation::Run { format }) => Startup::Run { format },
        Err(err) => Startup::Fatal {
            message: format!("{err}\n{HELP_HINT}"),
            code: 1,
        },
    }
}

/// Single-line diagnostic for a config that could not be loaded.
fn config_failure(err: anyhow::Error) -> String {
    format!("{:#}", err.context("loading vimstat configuration"))
}

fn exit_fatal(message: &str, code: i32) -> ! {
    eprintln!("{message}");
    process::exit(code);
}

/// Loads the config, checks the fetcher can run, parses flags, then streams
/// stdin through the pipeline.
fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args();
    let program_name = args.next().unwrap_or_else(|| "vimstat".to_string());

    let config = match config::load_runtime_config() {
        Ok(config) => config,
        Err(err) => exit_fatal(&config_failure(err), 1),
    };
    debug!(?config, "configuration loaded");

    let fetcher = build_fetcher(&config);
    let format = match startup(&program_name, args, &*fetcher) {
        Startup::Help(text) => {
            print!("{text}");
            return Ok(());
        }
        Startup::Run { format } => format,
        Startup::Fatal { message, code } => exit_fatal(&message, code),
    };

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let summary = driver::run(
        stdin,
        &mut stdout,
        &mut stderr,
        &fetcher,
        format,
        config.mode,
    )
    .context("processing input")?;
    debug!(?summary, "input exhausted");

    Ok(())
}

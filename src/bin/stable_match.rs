//! Command-line front end: load a preference file, match, print pairs.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stable_match::report::{self, DEFAULT_SEPARATOR};
use stable_match::{
    load_path, Engine, Error, Format, Instance, Matching, PreferenceStore, Proposal, ProposalEvent,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stable-match",
    about = "Compute the proposer-optimal stable matching for a preference file",
    version
)]
struct Cli {
    /// Preference file to read
    #[arg(default_value = "program1data.txt")]
    path: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Text separator between proposer and responder names
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    separator: String,

    /// Print every proposal event to stderr
    #[arg(long)]
    trace: bool,

    /// Re-check the result for blocking pairs before printing
    #[arg(long)]
    verify: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries the matching; logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

/// Load the configured file and match it, writing the report to `out`.
///
/// `Ok(false)` means `--verify` found a blocking pair and nothing was written.
fn run<W: Write>(cli: &Cli, out: W) -> Result<bool, Error> {
    let instance = load_path(&cli.path)?;
    info!(n = instance.len(), path = %cli.path.display(), "instance loaded");
    match_instance(cli, instance, out)
}

fn match_instance<W: Write>(cli: &Cli, instance: Instance, out: W) -> Result<bool, Error> {
    let proposers = instance.proposers().to_vec();
    let responders = instance.responders().to_vec();

    let mut engine = Engine::new(instance);
    let matching = if cli.trace {
        engine.run_with(|event| eprintln!("{}", trace_line(event, &proposers, &responders)))?
    } else {
        engine.run()?
    };

    let stats = engine.stats();
    info!(
        proposals = stats.proposals,
        accepted = stats.accepted,
        replaced = stats.replaced,
        rejected = stats.rejected,
        passes = stats.passes,
        "matching complete"
    );

    if cli.verify && !verify(&matching, engine.store()) {
        return Ok(false);
    }

    report::write(&matching, out, cli.format, &cli.separator)?;
    Ok(true)
}

/// True if no pair would rather have each other than their partners.
fn verify(matching: &Matching, store: &PreferenceStore) -> bool {
    match matching.blocking_pair(store) {
        Some((p, r)) => {
            error!(proposer = p, responder = r, "result is not stable");
            false
        }
        None => {
            info!("no blocking pairs");
            true
        }
    }
}

/// One named line per proposal event
fn trace_line(event: &ProposalEvent, proposers: &[String], responders: &[String]) -> String {
    let Proposal { proposer, responder } = event.proposal();
    let head = format!("{} -> {}", proposers[proposer], responders[responder]);

    match event {
        ProposalEvent::Replaced { displaced, .. } => {
            format!("{}: held, {} released", head, proposers[*displaced])
        }
        _ if event.is_held() => format!("{}: held", head),
        _ => format!("{}: rejected", head),
    }
}

/// 0 on success, 1 on any error, 2 when verification fails
fn exit_status(outcome: &Result<bool, Error>) -> u8 {
    match outcome {
        Ok(true) => 0,
        Ok(false) => 2,
        Err(_) => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let outcome = run(&cli, io::stdout().lock());
    if let Err(err) = &outcome {
        eprintln!("error: {}", err);
    }
    ExitCode::from(exit_status(&outcome))
}

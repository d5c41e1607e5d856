mod process;
mod prover;
mod rustyline_helper;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use atty::Stream;
use clap::{ArgAction, Parser, Subcommand};
use hott::Session;
use log::LevelFilter;

use crate::process::{print_outcome, print_report};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// remove syntax highlighting
    #[arg(long, global = true)]
    no_color: bool,

    /// raise the log verbosity, once per occurrence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// type-check a file of terms, one per line
    Check { file: PathBuf },

    /// normalize a term
    Eval {
        #[arg(required = true)]
        expr: Vec<String>,
    },

    /// print the type of a term
    Synth {
        #[arg(required = true)]
        expr: Vec<String>,
    },

    /// run a .htt proof script
    Script { file: PathBuf },

    /// prove theorems interactively
    Prove,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn read(file: &PathBuf) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("no such file or directory: {}", file.display()))
}

/// Checks every non-empty line of a file.
fn check(session: &Session, file: &PathBuf) -> anyhow::Result<bool> {
    let contents = read(file)?;
    let mut success = true;
    for (ix, line) in contents.lines().enumerate() {
        let text = line.split(" --").next().unwrap_or_default().trim();
        if text.is_empty() || text.starts_with("--") {
            continue;
        }
        let outcome = session
            .synth(text)
            .map(|(term, ty)| format!("{term} : {ty}"))
            .map_err(|err| err.within(ix + 1));
        success &= outcome.is_ok();
        print_outcome(&file.display().to_string(), outcome.map_err(Into::into));
    }
    Ok(success)
}

fn run(args: Args) -> anyhow::Result<bool> {
    let mut session = Session::new()?;

    match args.command {
        Command::Check { ref file } => check(&session, file),
        Command::Eval { ref expr } => {
            let outcome = session.eval(&expr.join(" ")).map(|term| term.to_string());
            let success = outcome.is_ok();
            print_outcome("<command line>", outcome.map_err(Into::into));
            Ok(success)
        },
        Command::Synth { ref expr } => {
            let outcome = session.synth(&expr.join(" ")).map(|(_, ty)| ty.to_string());
            let success = outcome.is_ok();
            print_outcome("<command line>", outcome.map_err(Into::into));
            Ok(success)
        },
        Command::Script { ref file } => {
            let contents = read(file)?;
            let report = hott::run_script(&mut session, &contents, &file.display().to_string());
            print_report(&report);
            Ok(report.success())
        },
        Command::Prove => {
            // check if we are in a terminal
            if atty::isnt(Stream::Stdin) {
                anyhow::bail!("interactive proofs need a terminal");
            }
            prover::repl(session, !args.no_color)?;
            Ok(true)
        },
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);
    if args.no_color || atty::isnt(Stream::Stdout) {
        colored::control::set_override(false);
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("hott: {err:#}");
            ExitCode::FAILURE
        },
    }
}

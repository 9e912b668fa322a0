//! `jiffy`: check and normalize JSON Expressions.
//!
//! Usage:
//!   jiffy check     [--allow OP,...] [--max-depth N] [FILE]
//!   jiffy normalize [--allow OP,...] [--max-depth N] [--pretty] [FILE]
//!
//! The expression is read from FILE, or from stdin when FILE is omitted.

use clap::{Args, Parser, Subcommand, ValueHint};
use jiffy::cli::{self, CliError, CliOptions};
use jiffy::DEFAULT_MAX_DEPTH;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jiffy",
    version,
    about = "Check and normalize JSON Expressions",
    long_about = None,
    after_help = r#"EXAMPLES
  $ echo '["gt", ["get", "count"], 42]' | jiffy check
  $ jiffy normalize --pretty rule.json
  $ jiffy check --allow all,get,gt,lt rule.json"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an expression and report whether it is valid
    Check(CommonArgs),
    /// Decode an expression and print it in canonical form
    Normalize {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, help = "Indent the output")]
        pretty: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated operators to accept (default: any)"
    )]
    allow: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, help = "Maximum expression nesting depth")]
    max_depth: usize,
    #[arg(help = "Expression file (default: stdin)", value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
}

impl CommonArgs {
    fn options(&self, pretty: bool) -> CliOptions {
        CliOptions {
            allow: self.allow.clone(),
            max_depth: self.max_depth,
            pretty,
        }
    }
}

fn main() {
    init_tracing();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    match args.command {
        Command::Check(common) => {
            let input = cli::read_input(common.file.as_deref())?;
            cli::check(&input, &common.options(false))?;
            stdout.write_all(b"ok\n")?;
        }
        Command::Normalize { common, pretty } => {
            let input = cli::read_input(common.file.as_deref())?;
            let out = cli::normalize(&input, &common.options(pretty))?;
            stdout.write_all(&out)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

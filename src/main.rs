use clap::{ArgAction, Parser};
use nestlex::config::load_tokenizer;

use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

/// Prints the tokens of a text scanned with a TOML grammar.
#[derive(Debug, Parser)]
#[command(name = "nestlex", version)]
struct Cli {
    /// Grammar file
    grammar: PathBuf,

    /// Input file, stdin when omitted
    input: Option<PathBuf>,

    /// Drop leading whitespace before every token
    #[arg(short, long)]
    skip_whitespace: bool,

    /// Log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let tokenizer = load_tokenizer(&cli.grammar)?;

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            source
        }
    };

    let mut stream = tokenizer.tokenize(source);
    let mut out = io::stdout().lock();
    for token in stream.tokens(cli.skip_whitespace) {
        writeln!(out, "{}", token?)?;
    }

    Ok(())
}

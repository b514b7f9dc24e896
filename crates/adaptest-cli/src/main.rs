//! adaptest CLI: run and check adaptive tests from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one adaptive test with a virtual test-taker
    Simulate {
        /// Test configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Question bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// True ability of the simulated test-taker, on the difficulty scale
        #[arg(long, allow_negative_numbers = true)]
        ability: i32,

        /// Random seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Also write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a test configuration and optionally a question bank
    Validate {
        /// Test configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Question bank file or directory
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Create a starter config and an example question bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            bank,
            ability,
            seed,
            format,
            output,
        } => commands::simulate::execute(config, bank, ability, seed, format, output),
        Commands::Validate { config, bank } => commands::validate::execute(config, bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

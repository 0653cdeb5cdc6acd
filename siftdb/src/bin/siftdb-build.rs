//! Command line tool to build and inspect pepsift sequence database indexes ahead of time,
//! so the first search does not pay for the scan.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use siftdb::{DatabaseError, DecoyStyle, SequenceDatabase};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the binary index for a FASTA database
    Build {
        /// The FASTA file to index
        database: PathBuf,

        /// Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    /// Print the entry count and size maxima of an indexed database
    Stats {
        /// The FASTA file to inspect
        database: PathBuf,

        /// Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    /// Write a decoy variant of a database as a new FASTA file
    Decoy {
        /// The source FASTA file
        database: PathBuf,

        /// The decoy FASTA file to write
        #[arg(short = 'o', long = "output", required = true)]
        output: PathBuf,

        /// Shuffle the sequences instead of reversing them
        #[arg(long = "shuffle", default_value_t = false)]
        shuffle: bool,

        /// The seed for --shuffle, the same seed reproduces the same decoys
        #[arg(long = "seed", default_value_t = 0)]
        seed: u64,

        /// Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
        .module(module_path!())
        .module("siftdb")
        .quiet(false)
        .verbosity(log_max_level)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

fn run(cli: &Cli) -> Result<(), DatabaseError> {
    match &cli.command {
        Commands::Build { database, .. } => {
            let db = SequenceDatabase::open(database, true)?;
            log::info!(
                "{}: {} entries ready",
                database.display(),
                db.entry_count()
            );
        }
        Commands::Stats { database, .. } => {
            let db = SequenceDatabase::open(database, true)?;
            println!("entries:            {}", db.entry_count());
            println!("longest comment:    {} bytes", db.index().max_comment_len());
            println!("longest sequence:   {} bytes", db.index().max_sequence_len());
        }
        Commands::Decoy {
            database,
            output,
            shuffle,
            seed,
            ..
        } => {
            let db = SequenceDatabase::open(database, true)?;
            let style = if *shuffle {
                DecoyStyle::Shuffled { seed: *seed }
            } else {
                DecoyStyle::Reversed
            };
            let written = db.write_decoy(output, style)?;
            log::info!("{}: {written} decoy entries", output.display());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Commands::Build { verbose, .. }
        | Commands::Stats { verbose, .. }
        | Commands::Decoy { verbose, .. } => *verbose,
    };
    init_log(if verbose { 3 } else { 2 });

    if let Err(error) = run(&cli) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

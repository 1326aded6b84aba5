use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Plasma child chain transaction tool")]
pub(crate) struct Opts {
    /// Chain id signatures are bound to
    #[arg(long, env = "PLASMA_CHAIN_ID", default_value = "1", global = true)]
    pub chain_id: u64,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Generate a new secret key
    GenKey,
    /// Print the address controlled by a key
    Address {
        #[arg(long, env = "PLASMA_KEY_FILE")]
        key_file: PathBuf,
    },
    /// Sign a JSON transaction
    Sign {
        #[arg(long)]
        tx: PathBuf,

        /// Key of the first input's owner
        #[arg(long, env = "PLASMA_KEY_FILE")]
        key_file: PathBuf,

        /// Key of the second input's owner, if different
        #[arg(long)]
        key2_file: Option<PathBuf>,
    },
    /// Check signatures of a JSON transaction
    Verify {
        #[arg(long)]
        tx: PathBuf,
    },
    /// Convert a JSON transaction to hex wire encoding
    Encode {
        #[arg(long)]
        tx: PathBuf,
    },
    /// Convert hex wire encoding to a JSON transaction
    Decode { hex: String },
}

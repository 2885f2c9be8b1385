pub mod import;
pub mod init;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "momo-ledger",
    about = "Turns MTN MoMo SMS backup exports into a normalized transaction ledger."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the ledger database.
    Init {
        /// Path for ledger data (default: ~/Documents/momo-ledger)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import an SMS backup XML file and classify its notifications.
    Import {
        /// Path to the SMS backup XML file
        file: String,
        /// Override the recognized sender address (default: M-Money)
        #[arg(long)]
        address: Option<String>,
    },
}

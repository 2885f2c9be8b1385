mod classifier;
mod cli;
mod db;
mod error;
mod extract;
mod importer;
mod models;
mod patterns;
mod resolver;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file, address } => cli::import::run(&file, address.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

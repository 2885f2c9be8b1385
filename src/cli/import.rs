use std::path::PathBuf;

use colored::Colorize;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::import_file;
use crate::settings::{get_data_dir, load_settings};

pub fn run(file: &str, address: Option<&str>) -> Result<()> {
    let file_path = PathBuf::from(file);
    let mut settings = load_settings();
    if let Some(address) = address {
        settings.channel_address = address.to_string();
    }

    let data_dir = get_data_dir();
    let conn = get_connection(&data_dir.join("momo-ledger.db"))?;

    let summary = import_file(&conn, &file_path, &settings)?;

    if summary.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!(
        "{} messages from {}: {} {}, {} {}, {} skipped",
        summary.total,
        settings.channel_address,
        summary.parsed,
        "parsed".green(),
        summary.failed,
        "failed".red(),
        summary.skipped,
    );
    for (pattern, count) in &summary.by_type {
        println!("  {pattern}: {count}");
    }

    Ok(())
}

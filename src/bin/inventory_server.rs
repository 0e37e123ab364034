use std::{fs, path::PathBuf, process::exit};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vehicle_search_assistant::{settings::Settings, store::Inventory, vehicle::Vehicle, web};

#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// JSON array of vehicles to add; records already stored are skipped.
    #[arg(long, value_name = "JSON_PATH")]
    import: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(ret) => ret,
        Err(error) => {
            eprintln!("Problem while loading settings. {error}");
            exit(1);
        }
    };

    let inventory = match open_inventory(&settings, args.import.as_deref()) {
        Ok(ret) => ret,
        Err(error) => {
            eprintln!("Problem while preparing the inventory. {error:#}");
            exit(1);
        }
    };

    web::serve(inventory, settings.server.address).await;
}

fn open_inventory(settings: &Settings, import: Option<&std::path::Path>) -> Result<Inventory> {
    let inventory = Inventory::connect(&settings.server.db_path)?;

    if let Some(path) = import {
        let data = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let vehicles: Vec<Vehicle> = serde_json::from_str(&data)
            .with_context(|| format!("{} is not a JSON array of vehicles", path.display()))?;
        let total = vehicles.len();
        let added = inventory.import(vehicles)?;
        info!(
            "Imported {added} of {total} vehicles from {}; inventory holds {}",
            path.display(),
            inventory.len()
        );
    }

    Ok(inventory)
}

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use cities_border::errors::Result;
use cities_border::etl::build_store::BuildBorderStoreEtl;
use cities_border::etl::Etl;
use cities_border::store;

#[derive(Deserialize)]
pub struct UserConfig {
    /// OSM XML extract, optionally `.xz` compressed. Without it nothing is built.
    pub data_path: Option<String>,
    pub store_path: String,
    #[serde(default)]
    pub append: bool,
}

/// Build a border store from an OSM extract and look regions up in it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Name of the region to look up
    #[arg(short, long)]
    search: Option<String>,

    /// Skip building the store and only search it
    #[arg(short = 'S', long)]
    search_only: bool,

    /// Append to the store instead of replacing it
    #[arg(short, long)]
    append: bool,
}

fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();
    let args = Args::parse();

    let user_config = load_user_config(&args.config)?;
    let store_path = Path::new(&user_config.store_path);

    if !args.search_only {
        if let Some(data_path) = &user_config.data_path {
            let append = args.append || user_config.append;
            let mut etl = BuildBorderStoreEtl::new(Path::new(data_path), store_path, append);
            etl.process()?;
        }
    }

    if let Some(name) = &args.search {
        info!(region = name.as_str(); "Searching border store");
        let mut reader = store::StoreFileReader::open(store_path)?;
        let found = store::lookup::find(&mut reader, name)?;
        reader.close();
        match found {
            None => warn!(region = name.as_str(); "Region not found"),
            Some(border) if border.is_empty() => {
                warn!(region = name.as_str(); "Region has an empty border")
            },
            Some(border) => {
                for coordinate in border {
                    println!("{}", coordinate);
                }
            },
        }
    }

    Ok(())
}

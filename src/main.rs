use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};

use topoview::config_loader::{self, ViewCliOverrides};
use topoview::discovery::SnapshotSource;
use topoview::geo::Projection;
use topoview::positions::{JsonFilePositionStore, MemoryPositionStore, PositionStore};
use topoview::topology::EntityCollection;

/// Lay out router topology entities from a discovery snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Discovery snapshot JSON (router id -> entity attribute rows)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Path to the view configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Saved positions JSON file (overrides the configuration)
    #[arg(short, long)]
    positions: Option<String>,

    /// Write positions back to the positions file
    #[arg(long)]
    save: bool,

    /// Also print each entity's tooltip
    #[arg(long)]
    tooltips: bool,
}

fn open_store(path: Option<&str>) -> Result<Box<dyn PositionStoreFlush>> {
    match path {
        Some(path) => {
            let store = JsonFilePositionStore::open(Path::new(path))
                .wrap_err_with(|| format!("Failed to open position store '{}'", path))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemoryPositionStore::new())),
    }
}

/// A position store that may need writing out before exit
trait PositionStoreFlush: PositionStore {
    fn flush_to_disk(&self) -> Result<()>;
}

impl PositionStoreFlush for JsonFilePositionStore {
    fn flush_to_disk(&self) -> Result<()> {
        self.flush().wrap_err("Failed to write position store")
    }
}

impl PositionStoreFlush for MemoryPositionStore {
    fn flush_to_disk(&self) -> Result<()> {
        warn!("No positions file configured; positions were not persisted");
        Ok(())
    }
}

/// Start logging; returns whether RUST_LOG picked the filter
fn init_logging() -> bool {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    // The filter stays open; the global max level gates records
    env_logger::Builder::from_env(Env::default().default_filter_or("trace")).init();
    if !from_env {
        log::set_max_level(LevelFilter::Info);
    }
    from_env
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging, RUST_LOG wins over the configured level
    let level_from_env = init_logging();

    let mut config = config_loader::load_or_default(args.config.as_deref())?;
    config_loader::apply_overrides(
        &mut config,
        &ViewCliOverrides {
            positions: args.positions.clone(),
            ..Default::default()
        },
    )?;

    if !level_from_env {
        match config.level_filter() {
            Some(level) => log::set_max_level(level),
            None => warn!("Ignoring log_level '{}': not a level name", config.log_level()),
        }
    }

    info!("Snapshot file: {:?}", args.snapshot);

    let source = SnapshotSource::from_json_file(&args.snapshot)
        .wrap_err_with(|| format!("Failed to load snapshot '{}'", args.snapshot.display()))?;
    let mut store = open_store(config.positions.as_deref())?;
    let projection = config.projection();
    let projection = projection.as_ref().map(|p| p as &dyn Projection);

    let mut collection = EntityCollection::new();
    let animate = collection.initialize(source.snapshot(), &*store, config.view.width, config.view.height)?;
    collection.set_xy(projection);

    info!(
        "Placed {} entities on a {}x{} canvas (animate: {})",
        collection.len(),
        config.view.width,
        config.view.height,
        animate
    );

    let count = collection.len();
    for entity in &collection {
        println!(
            "{:>3} {:<24} {:<16} {:<20} r={:<3} charge={:<8.1} ({:.0}, {:.0}){}",
            entity.sequence_index,
            entity.name,
            entity.node_type.as_str(),
            entity.title(),
            entity.radius(),
            EntityCollection::charge(entity, count),
            entity.x,
            entity.y,
            if entity.fixed { " fixed" } else { "" }
        );
        if args.tooltips {
            match entity.tool_tip(&source).await {
                Ok(tip) => {
                    for line in tip.to_string().lines() {
                        println!("      {}", line);
                    }
                }
                Err(e) => warn!("No tooltip for {}: {}", entity.name, e),
            }
        }
    }

    if args.save {
        collection.save_lon_lat(projection, None);
        collection.save_positions(&mut *store, None)?;
        store.flush_to_disk()?;
    }

    Ok(())
}

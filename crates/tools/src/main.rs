use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::{Builder, Env};
use housegen::{ArchetypeCatalog, CellKind, GenerationConfig, GridPos, MapGenerator, NullSink};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Layout seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Generation settings (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Room archetype catalog (TOML); the built-in house set when omitted
    #[arg(short, long)]
    archetypes: Option<PathBuf>,
    /// Write the finished layout as JSON
    #[arg(short, long)]
    export: Option<PathBuf>,
    /// Print an ASCII plan of one floor
    #[arg(long)]
    ascii: Option<u32>,
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GenerationConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => GenerationConfig::default(),
    };
    let catalog = match &args.archetypes {
        Some(path) => ArchetypeCatalog::load(path)
            .with_context(|| format!("Failed to load archetypes: {}", path.display()))?,
        None => ArchetypeCatalog::house(),
    };

    let mut generator = MapGenerator::new(config, catalog).context("Configuration rejected")?;
    let summary = generator
        .generate(args.seed, &mut NullSink)
        .with_context(|| format!("Generation failed for seed {}", args.seed))?;

    println!("Seed: {}", summary.seed);
    println!("Rooms: {} ({} dropped)", summary.rooms, summary.dropped_rooms);
    println!("Corridors: {}", summary.corridors);
    println!("Hallway cells: {}", summary.hallway_cells);
    println!("Fingerprint: {:016x}", summary.fingerprint);

    if let Some(floor) = args.ascii {
        if floor >= generator.config().floor_count {
            bail!("Floor {floor} does not exist; the map has {}", generator.config().floor_count);
        }
        print!("{}", ascii_plan(&generator, floor));
    }

    if let Some(path) = &args.export {
        let snapshot = generator.snapshot().context("Generator is not ready")?;
        let json = snapshot.to_json().context("Failed to serialize layout")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write layout: {}", path.display()))?;
        info!("layout written to {}", path.display());
    }

    Ok(())
}

fn ascii_plan(generator: &MapGenerator, floor: u32) -> String {
    let grid = generator.grid();
    let dims = grid.dims();
    let y = floor as i32 * generator.config().cells_per_floor();
    let mut plan = String::with_capacity(((dims.x + 1) * dims.z) as usize);
    for z in (0..dims.z).rev() {
        for x in 0..dims.x {
            let kind = grid.kind(GridPos::new(x, y, z)).unwrap_or_default();
            plan.push(match kind {
                CellKind::Empty => ' ',
                CellKind::Room => '#',
                CellKind::Hallway => '.',
                CellKind::Door => '+',
                CellKind::Stairs => '%',
            });
        }
        plan.push('\n');
    }
    plan
}

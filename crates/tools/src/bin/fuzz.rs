use std::collections::{BTreeSet, VecDeque};

use anyhow::{Result, bail};
use clap::Parser;
use housegen::{
    ArchetypeCatalog, CellKind, GenerationConfig, GridPos, MapGenerator, NullSink,
    mapgen::SpatialGrid,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    runs: u32,
    /// Print the report as JSON instead of plain lines
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Failure {
    seed: u64,
    floors: u32,
    reason: String,
}

#[derive(Default, Serialize)]
struct FuzzReport {
    runs: u32,
    rooms: usize,
    dropped_rooms: usize,
    corridors: usize,
    failures: Vec<Failure>,
}

fn choose<T: Copy>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p]
}

fn reachable_corridors(grid: &SpatialGrid, start: GridPos) -> BTreeSet<GridPos> {
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        for next in grid.neighbors(pos) {
            if next.y == pos.y
                && grid.kind(next).is_some_and(CellKind::is_corridor)
                && seen.insert(next)
            {
                queue.push_back(next);
            }
        }
    }
    seen
}

fn check_invariants(generator: &MapGenerator) -> Option<String> {
    let buffer = generator.config().separation_buffer_cells();
    let rooms: Vec<_> = generator.rooms().collect();
    for (i, a) in rooms.iter().enumerate() {
        if let Some(b) = rooms[i + 1..].iter().find(|b| a.overlaps(b, buffer)) {
            return Some(format!("room at {:?} overlaps room at {:?}", a.position, b.position));
        }
    }
    if !rooms.is_empty() && rooms.iter().filter(|room| room.is_main).count() != 1 {
        return Some("main room count is not exactly one".to_string());
    }

    let grid = generator.grid();
    let cells_per_floor = generator.config().cells_per_floor();
    for floor in 0..generator.config().floor_count as i32 {
        let doors: Vec<GridPos> = grid
            .layer(floor * cells_per_floor)
            .filter(|cell| cell.kind == CellKind::Door)
            .map(|cell| cell.pos)
            .collect();
        let Some(&first) = doors.first() else {
            continue;
        };
        let reach = reachable_corridors(grid, first);
        if let Some(cut) = doors.iter().find(|&door| !reach.contains(door)) {
            return Some(format!("door {cut:?} on floor {floor} is unreachable"));
        }
    }
    None
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.json {
        println!("Starting layout fuzz on seed {} for {} runs...", args.seed, args.runs);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut report = FuzzReport::default();

    for run in 0..args.runs {
        let seed = rng.next_u64();
        let floors = choose(&mut rng, &[1_u32, 1, 2, 3]);
        let cycle_chance = choose(&mut rng, &[0.0, 0.125, 0.25, 0.5]);
        let config = GenerationConfig {
            floor_count: floors,
            rooms_per_floor: choose(&mut rng, &[3_u32, 5, 8]),
            cycle_chance,
            ..GenerationConfig::default()
        };
        let mut generator = MapGenerator::new(config, ArchetypeCatalog::house())?;

        let reason = match generator.generate(seed, &mut NullSink) {
            Ok(summary) => {
                report.rooms += summary.rooms;
                report.dropped_rooms += summary.dropped_rooms;
                report.corridors += summary.corridors;
                check_invariants(&generator)
            }
            Err(err) => Some(err.to_string()),
        };
        if let Some(reason) = reason {
            if !args.json {
                println!("Run {run}: seed {seed} failed: {reason}");
            }
            report.failures.push(Failure { seed, floors, reason });
        }
        report.runs += 1;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Finished {} runs: {} rooms placed, {} dropped, {} corridors",
            report.runs, report.rooms, report.dropped_rooms, report.corridors
        );
    }
    if !report.failures.is_empty() {
        bail!("{} of {} runs broke a layout invariant", report.failures.len(), report.runs);
    }
    Ok(())
}

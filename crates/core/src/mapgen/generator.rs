//! High-level generation orchestration: placement, grid marking, per-floor
//! routing, hallway realization, and geometry hand-off.

mod pipeline;
mod queries;

use std::time::Instant;

use log::{debug, info, warn};
use rand_chacha::ChaCha8Rng;

use crate::config::{ArchetypeCatalog, GenerationConfig};
use crate::error::{ConfigError, GenerationError};
use crate::types::{CellKind, GridPos};

use super::geometry::{MaterializeContext, SpawnSink, materialize};
use super::grid::SpatialGrid;
use super::model::{
    FloorRouting, GenerationState, GenerationSummary, LayoutSnapshot, cells_of_kind,
    layout_fingerprint,
};
use super::pathfinding::PathSearch;
use super::placement::{PlacementContext, place_rooms};
use super::rooms::RoomSet;
use super::routing::route;
use super::seed::{layout_rng, query_rng};

/// Owns one layout at a time. `generate` discards whatever the previous run
/// left behind; queries read the current layout once the state is `Ready`.
#[derive(Debug)]
pub struct MapGenerator {
    config: GenerationConfig,
    catalog: ArchetypeCatalog,
    state: GenerationState,
    trace: Vec<GenerationState>,
    seed: u64,
    grid: SpatialGrid,
    rooms: RoomSet,
    dropped_rooms: usize,
    floors: Vec<FloorRouting>,
    hallways: Vec<GridPos>,
    summary: Option<GenerationSummary>,
    query_rng: ChaCha8Rng,
    #[cfg(test)]
    after_marking: Option<fn(&mut SpatialGrid)>,
}

impl MapGenerator {
    pub fn new(config: GenerationConfig, catalog: ArchetypeCatalog) -> Result<Self, ConfigError> {
        config.validate(&catalog)?;
        let grid = SpatialGrid::new(config.world_size(), config.cell_radius, config.center);
        Ok(Self {
            config,
            catalog,
            state: GenerationState::Idle,
            trace: vec![GenerationState::Idle],
            seed: 0,
            grid,
            rooms: RoomSet::new(),
            dropped_rooms: 0,
            floors: Vec::new(),
            hallways: Vec::new(),
            summary: None,
            query_rng: query_rng(0),
            #[cfg(test)]
            after_marking: None,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Every state entered by the latest `generate` call, starting at `Idle`.
    pub fn state_trace(&self) -> &[GenerationState] {
        &self.trace
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn is_ready(&self) -> bool {
        self.state == GenerationState::Ready
    }

    /// Runs the whole pipeline for `seed`. On failure the generator is left
    /// `Idle` with no rooms, hallways, or routing.
    pub fn generate(
        &mut self,
        seed: u64,
        sink: &mut dyn SpawnSink,
    ) -> Result<GenerationSummary, GenerationError> {
        let started = Instant::now();
        self.reset(seed);

        match self.run(sink, started) {
            Ok(summary) => {
                sink.generation_finished(&summary);
                Ok(summary)
            }
            Err(err) => {
                warn!("generation aborted for seed {seed}: {err}");
                self.reset(seed);
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        sink: &mut dyn SpawnSink,
        started: Instant,
    ) -> Result<GenerationSummary, GenerationError> {
        let mut rng = layout_rng(self.seed);

        let context = PlacementContext {
            config: &self.config,
            catalog: &self.catalog,
            dims: self.grid.dims(),
        };
        let placement = place_rooms(&context, &mut rng);
        self.rooms = placement.rooms;
        self.dropped_rooms = placement.dropped;
        self.advance(GenerationState::RoomsPlaced);

        pipeline::mark_rooms(&mut self.grid, &self.rooms);
        #[cfg(test)]
        if let Some(hook) = self.after_marking {
            hook(&mut self.grid);
        }
        self.advance(GenerationState::GridMarked);

        let mut search = PathSearch::new(&self.grid);
        for floor in 0..self.config.floor_count {
            let y = floor as i32 * self.config.cells_per_floor();
            let (door_points, triangulation) = pipeline::triangulate_floor(&self.grid, y);
            self.advance(GenerationState::Triangulated(floor));

            let routing = route(&triangulation.edges, self.config.cycle_chance, &mut rng);
            self.advance(GenerationState::Routed(floor));

            let realized =
                pipeline::realize_floor(&mut self.grid, &mut search, floor, y, &routing)?;
            self.hallways.extend(realized);
            self.floors.push(FloorRouting {
                floor,
                door_points,
                candidates: triangulation.edges,
                routing,
            });
        }
        self.advance(GenerationState::HallwaysRealized);

        let prefabs = materialize(
            &MaterializeContext {
                grid: &self.grid,
                rooms: &self.rooms,
                geometry: self.config.geometry,
                floor_count: self.config.floor_count,
                cells_per_floor: self.config.cells_per_floor(),
            },
            sink,
        );
        self.advance(GenerationState::GeometryMaterialized);

        let summary = GenerationSummary {
            seed: self.seed,
            floors: self.config.floor_count,
            rooms: self.rooms.len(),
            dropped_rooms: self.dropped_rooms,
            corridors: self.floors.iter().map(|floor| floor.routing.len()).sum(),
            hallway_cells: self.hallways.len(),
            door_cells: cells_of_kind(&self.grid, CellKind::Door).len(),
            prefabs,
            fingerprint: layout_fingerprint(&self.grid),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.summary = Some(summary.clone());
        self.advance(GenerationState::Ready);
        info!(
            "generated seed {} in {} ms: {} rooms ({} dropped), {} corridors, {} hallway cells",
            summary.seed,
            summary.elapsed_ms,
            summary.rooms,
            summary.dropped_rooms,
            summary.corridors,
            summary.hallway_cells
        );
        Ok(summary)
    }

    fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.state = GenerationState::Idle;
        self.trace.clear();
        self.trace.push(GenerationState::Idle);
        self.grid =
            SpatialGrid::new(self.config.world_size(), self.config.cell_radius, self.config.center);
        self.rooms.clear();
        self.dropped_rooms = 0;
        self.floors.clear();
        self.hallways.clear();
        self.summary = None;
        self.query_rng = query_rng(seed);
    }

    fn advance(&mut self, next: GenerationState) {
        debug!("pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.trace.push(next);
    }

    pub fn summary(&self) -> Option<&GenerationSummary> {
        self.summary.as_ref()
    }

    pub fn fingerprint(&self) -> u64 {
        layout_fingerprint(&self.grid)
    }

    pub fn snapshot(&self) -> Option<LayoutSnapshot> {
        self.is_ready().then(|| LayoutSnapshot {
            seed: self.seed,
            dims: self.grid.dims(),
            cell_radius: self.grid.cell_radius(),
            rooms: self.rooms.iter().map(|(_, room)| room.clone()).collect(),
            floors: self.floors.clone(),
            hallways: self.hallways.clone(),
            doors: cells_of_kind(&self.grid, CellKind::Door),
            fingerprint: self.fingerprint(),
        })
    }
}

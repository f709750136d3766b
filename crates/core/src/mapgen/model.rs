//! Public data models for generated layouts, per-floor routing, and run summaries.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::grid::SpatialGrid;
use super::rooms::RoomFootprint;
use super::routing::Routing;
use super::triangulation::Edge;
use crate::types::{CellKind, GridPos, PlanPoint};

/// Pipeline position. `Triangulated` and `Routed` carry the floor being
/// processed; floors advance in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    Idle,
    RoomsPlaced,
    GridMarked,
    Triangulated(u32),
    Routed(u32),
    HallwaysRealized,
    GeometryMaterialized,
    Ready,
}

/// Door graph and selected corridors of one floor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorRouting {
    pub floor: u32,
    pub door_points: Vec<PlanPoint>,
    pub candidates: Vec<Edge>,
    pub routing: Routing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub seed: u64,
    pub floors: u32,
    pub rooms: usize,
    pub dropped_rooms: usize,
    pub corridors: usize,
    pub hallway_cells: usize,
    pub door_cells: usize,
    pub prefabs: usize,
    pub fingerprint: u64,
    pub elapsed_ms: u64,
}

/// Serializable copy of a finished layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub seed: u64,
    pub dims: GridPos,
    pub cell_radius: f32,
    pub rooms: Vec<RoomFootprint>,
    pub floors: Vec<FloorRouting>,
    pub hallways: Vec<GridPos>,
    pub doors: Vec<GridPos>,
    pub fingerprint: u64,
}

impl LayoutSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

pub fn layout_fingerprint(grid: &SpatialGrid) -> u64 {
    xxh3_64(&grid.canonical_bytes())
}

pub(crate) fn cells_of_kind(grid: &SpatialGrid, kind: CellKind) -> Vec<GridPos> {
    grid.cells().iter().filter(|cell| cell.kind == kind).map(|cell| cell.pos).collect()
}

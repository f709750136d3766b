//! Turns the marked grid into prefab spawn requests.
//!
//! This module exists so the generator can describe geometry without knowing
//! how it is rendered or instantiated. It does not own any spawned objects;
//! every request goes straight to the caller's `SpawnSink`.

use super::grid::SpatialGrid;
use super::model::GenerationSummary;
use super::rooms::RoomSet;
use crate::config::GeometryConfig;
use crate::types::{CellKind, GridPos, PrefabKind, Vec3};

const HORIZONTAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Receiver for prefab instantiation requests.
pub trait SpawnSink {
    fn spawn(&mut self, prefab: PrefabKind, position: Vec3, scale: Vec3);

    fn generation_finished(&mut self, _summary: &GenerationSummary) {}
}

/// Discards every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SpawnSink for NullSink {
    fn spawn(&mut self, _prefab: PrefabKind, _position: Vec3, _scale: Vec3) {}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRecord {
    pub prefab: PrefabKind,
    pub position: Vec3,
    pub scale: Vec3,
}

/// Keeps every request in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub spawns: Vec<SpawnRecord>,
    pub finished: Option<GenerationSummary>,
}

impl RecordingSink {
    pub fn count(&self, matches: impl Fn(&PrefabKind) -> bool) -> usize {
        self.spawns.iter().filter(|record| matches(&record.prefab)).count()
    }
}

impl SpawnSink for RecordingSink {
    fn spawn(&mut self, prefab: PrefabKind, position: Vec3, scale: Vec3) {
        self.spawns.push(SpawnRecord { prefab, position, scale });
    }

    fn generation_finished(&mut self, summary: &GenerationSummary) {
        self.finished = Some(summary.clone());
    }
}

pub struct MaterializeContext<'a> {
    pub grid: &'a SpatialGrid,
    pub rooms: &'a RoomSet,
    pub geometry: GeometryConfig,
    pub floor_count: u32,
    pub cells_per_floor: i32,
}

/// Emits room prefabs, then floor, ceiling and wall pieces for every corridor
/// cell. Returns the number of requests sent.
pub fn materialize(context: &MaterializeContext<'_>, sink: &mut dyn SpawnSink) -> usize {
    let mut emitted = 0;
    let mut emit = |prefab, position, scale| {
        sink.spawn(prefab, position, scale);
        emitted += 1;
    };

    let grid = context.grid;
    let diameter = grid.cell_diameter();
    let story_height = context.cells_per_floor as f32 * diameter;

    for (_, room) in context.rooms.iter() {
        let floor_center = room.world_floor_center(grid);
        let prefab = PrefabKind::Room { archetype: room.archetype, rotation: room.rotation };
        emit(prefab, floor_center, Vec3::ONE);
        if room.light {
            let light = Vec3::new(
                floor_center.x,
                floor_center.y + story_height - context.geometry.ceiling_thickness,
                floor_center.z,
            );
            emit(PrefabKind::Light, light, Vec3::ONE);
        }
    }

    for floor in 0..context.floor_count {
        let y = floor as i32 * context.cells_per_floor;
        for cell in grid.layer(y) {
            let walls_toward: fn(Option<CellKind>) -> bool = match cell.kind {
                CellKind::Hallway => hallway_wall_neighbor,
                CellKind::Door => door_wall_neighbor,
                _ => continue,
            };
            let bottom = cell.center.y - grid.cell_radius();
            let slab = Vec3::new(diameter, context.geometry.floor_thickness, diameter);
            emit(
                PrefabKind::Floor,
                Vec3::new(cell.center.x, bottom + slab.y / 2.0, cell.center.z),
                slab,
            );
            let ceiling = Vec3::new(diameter, context.geometry.ceiling_thickness, diameter);
            emit(
                PrefabKind::Ceiling,
                Vec3::new(cell.center.x, bottom + story_height - ceiling.y / 2.0, cell.center.z),
                ceiling,
            );

            for (dx, dz) in HORIZONTAL {
                if !walls_toward(grid.kind(cell.pos.offset(dx, 0, dz))) {
                    continue;
                }
                let (position, scale) =
                    wall_piece(grid, cell.pos, (dx, dz), story_height, context.geometry);
                emit(PrefabKind::Wall, position, scale);
            }
        }
    }

    emitted
}

fn hallway_wall_neighbor(kind: Option<CellKind>) -> bool {
    matches!(kind, None | Some(CellKind::Empty | CellKind::Room | CellKind::Stairs))
}

fn door_wall_neighbor(kind: Option<CellKind>) -> bool {
    matches!(kind, None | Some(CellKind::Empty))
}

/// Wall slab on the face of `pos` pointing at `(dx, dz)`, inset by half its thickness.
fn wall_piece(
    grid: &SpatialGrid,
    pos: GridPos,
    (dx, dz): (i32, i32),
    story_height: f32,
    geometry: GeometryConfig,
) -> (Vec3, Vec3) {
    let center = grid.cell_center(pos);
    let radius = grid.cell_radius();
    let diameter = grid.cell_diameter();
    let inset = radius - geometry.wall_thickness / 2.0;
    let position = Vec3::new(
        center.x + dx as f32 * inset,
        center.y - radius + story_height / 2.0,
        center.z + dz as f32 * inset,
    );
    let scale = if dx != 0 {
        Vec3::new(geometry.wall_thickness, story_height, diameter)
    } else {
        Vec3::new(diameter, story_height, geometry.wall_thickness)
    };
    (position, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_grid() -> SpatialGrid {
        let mut grid = SpatialGrid::new(Vec3::new(10.0, 4.0, 10.0), 1.0, Vec3::ZERO);
        for x in 1..4 {
            grid.promote(GridPos::new(x, 0, 2), CellKind::Hallway);
        }
        grid.promote(GridPos::new(0, 0, 2), CellKind::Door);
        grid.promote(GridPos::new(2, 0, 3), CellKind::Room);
        grid
    }

    fn context<'a>(grid: &'a SpatialGrid, rooms: &'a RoomSet) -> MaterializeContext<'a> {
        MaterializeContext {
            grid,
            rooms,
            geometry: GeometryConfig::default(),
            floor_count: 1,
            cells_per_floor: 2,
        }
    }

    #[test]
    fn corridor_cells_get_floor_and_ceiling_slabs() {
        let grid = corridor_grid();
        let rooms = RoomSet::new();
        let mut sink = RecordingSink::default();
        let emitted = materialize(&context(&grid, &rooms), &mut sink);

        assert_eq!(emitted, sink.spawns.len());
        assert_eq!(sink.count(|prefab| *prefab == PrefabKind::Floor), 4);
        assert_eq!(sink.count(|prefab| *prefab == PrefabKind::Ceiling), 4);

        let floor = sink.spawns.iter().find(|record| record.prefab == PrefabKind::Floor).unwrap();
        assert!((floor.position.y - (-2.0 + 0.05)).abs() < 1e-5);
        let ceiling =
            sink.spawns.iter().find(|record| record.prefab == PrefabKind::Ceiling).unwrap();
        assert!((ceiling.position.y - (2.0 - 0.05)).abs() < 1e-5);
    }

    #[test]
    fn walls_follow_neighbor_kinds() {
        let grid = corridor_grid();
        let rooms = RoomSet::new();
        let mut sink = RecordingSink::default();
        materialize(&context(&grid, &rooms), &mut sink);

        // Hallways (1..4, 2): two walls each along z, plus the open end at x = 4.
        // The door at x = 0 walls off its out-of-grid west side and both z sides.
        let walls = sink.count(|prefab| *prefab == PrefabKind::Wall);
        assert_eq!(walls, 6 + 1 + 3);

        let east_cap = sink
            .spawns
            .iter()
            .filter(|record| record.prefab == PrefabKind::Wall)
            .find(|record| record.position.x > 2.0)
            .unwrap();
        assert_eq!(east_cap.scale, Vec3::new(0.2, 4.0, 2.0));
    }

    #[test]
    fn null_sink_accepts_everything() {
        let grid = corridor_grid();
        let rooms = RoomSet::new();
        assert!(materialize(&context(&grid, &rooms), &mut NullSink) > 0);
    }
}

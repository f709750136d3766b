//! Grid-level stages of a generation run: room marking, door collection, and
//! corridor realization for one floor.

use std::collections::BTreeSet;

use log::debug;

use crate::error::GenerationError;
use crate::types::{CellKind, GridPos, PlanPoint};

use super::super::grid::SpatialGrid;
use super::super::pathfinding::{PathSearch, Traversal, realize_hallway};
use super::super::rooms::RoomSet;
use super::super::routing::Routing;
use super::super::triangulation::{PlanBounds, Triangulation, triangulate};

/// Claims room volumes first, then the door cells outside their walls.
pub(super) fn mark_rooms(grid: &mut SpatialGrid, rooms: &RoomSet) {
    for (_, room) in rooms.iter() {
        let kind = if room.is_stairs() { CellKind::Stairs } else { CellKind::Room };
        for cell in room.cells() {
            grid.promote(cell, kind);
        }
    }
    for (_, room) in rooms.iter() {
        for door in room.doors() {
            if !grid.promote(door, CellKind::Door) && grid.kind(door) != Some(CellKind::Door) {
                debug!("door {door:?} of {:?} room lands on an occupied cell", room.archetype.pool);
            }
        }
    }
}

/// Door points on layer `y` in index order, plus their triangulation.
pub(super) fn triangulate_floor(grid: &SpatialGrid, y: i32) -> (Vec<PlanPoint>, Triangulation) {
    let mut seen = BTreeSet::new();
    let door_points: Vec<PlanPoint> = grid
        .layer(y)
        .filter(|cell| cell.kind == CellKind::Door)
        .map(|cell| cell.pos.plan())
        .filter(|point| seen.insert(*point))
        .collect();

    let dims = grid.dims();
    let bounds =
        PlanBounds { min: PlanPoint::new(0, 0), max: PlanPoint::new(dims.x - 1, dims.z - 1) };
    let triangulation = triangulate(&door_points, bounds);
    (door_points, triangulation)
}

/// Carves every selected edge of `routing` on layer `y`. Returns the cells
/// promoted to `Hallway`, in carving order.
pub(super) fn realize_floor(
    grid: &mut SpatialGrid,
    search: &mut PathSearch,
    floor: u32,
    y: i32,
    routing: &Routing,
) -> Result<Vec<GridPos>, GenerationError> {
    let mut hallways = Vec::new();
    for edge in routing.selected() {
        let from = edge.a.on_layer(y);
        let to = edge.b.on_layer(y);
        let path = search
            .find_path(grid, from, to, Traversal::CORRIDOR)
            .ok_or(GenerationError::Disconnected { floor, from, to })?;
        hallways.extend(realize_hallway(grid, &path));
    }
    debug!("floor {floor}: {} corridors carved {} hallway cells", routing.len(), hallways.len());
    Ok(hallways)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoorAnchor, DoorSide, RoomArchetype};
    use crate::mapgen::rooms::RoomFootprint;
    use crate::mapgen::routing::route;
    use crate::mapgen::seed::layout_rng;
    use crate::types::{ArchetypeId, ArchetypePool, Rotation, Vec3};

    fn two_room_grid() -> (SpatialGrid, RoomSet) {
        let mut grid = SpatialGrid::new(Vec3::new(40.0, 2.0, 40.0), 1.0, Vec3::ZERO);
        let archetype = RoomArchetype::new(
            "box",
            3,
            3,
            vec![DoorAnchor::new(DoorSide::East, 1), DoorAnchor::new(DoorSide::North, 1)],
        );
        let id = ArchetypeId { pool: ArchetypePool::Regular, index: 0 };
        let mut rooms = RoomSet::new();
        for corner in [PlanPoint::new(3, 3), PlanPoint::new(12, 10)] {
            rooms.insert(RoomFootprint::new(id, &archetype, 0, Rotation::Deg0, corner, 1));
        }
        mark_rooms(&mut grid, &rooms);
        (grid, rooms)
    }

    #[test]
    fn marking_claims_room_cells_and_doors() {
        let (grid, rooms) = two_room_grid();
        for (_, room) in rooms.iter() {
            assert!(room.cells().all(|cell| grid.kind(cell) == Some(CellKind::Room)));
            assert!(room.doors().all(|door| grid.kind(door) == Some(CellKind::Door)));
        }
    }

    #[test]
    fn floor_doors_are_collected_once_in_index_order() {
        let (grid, _) = two_room_grid();
        let (points, triangulation) = triangulate_floor(&grid, 0);
        assert_eq!(
            points,
            vec![
                PlanPoint::new(6, 4),
                PlanPoint::new(4, 6),
                PlanPoint::new(15, 11),
                PlanPoint::new(13, 13)
            ]
        );
        assert!(!triangulation.edges.is_empty());
    }

    #[test]
    fn realized_corridors_never_enter_rooms() {
        let (mut grid, _) = two_room_grid();
        let (_, triangulation) = triangulate_floor(&grid, 0);
        let routing = route(&triangulation.edges, 1.0, &mut layout_rng(4));
        let mut search = PathSearch::new(&grid);

        let before = grid.cells().iter().filter(|cell| cell.kind == CellKind::Room).count();
        let carved = realize_floor(&mut grid, &mut search, 0, 0, &routing).unwrap();
        let after = grid.cells().iter().filter(|cell| cell.kind == CellKind::Room).count();

        assert_eq!(before, after);
        assert!(!carved.is_empty());
        assert!(carved.iter().all(|&pos| grid.kind(pos) == Some(CellKind::Hallway)));
    }

    #[test]
    fn sealed_door_reports_disconnection() {
        let (mut grid, _) = two_room_grid();
        let door = GridPos::new(6, 0, 4);
        for (dx, dz) in [(1, 0), (0, -1), (0, 1)] {
            grid.promote(door.offset(dx, 0, dz), CellKind::Room);
        }
        let (_, triangulation) = triangulate_floor(&grid, 0);
        let routing = route(&triangulation.edges, 0.0, &mut layout_rng(4));
        let mut search = PathSearch::new(&grid);

        let err = realize_floor(&mut grid, &mut search, 0, 0, &routing).unwrap_err();
        assert!(matches!(err, GenerationError::Disconnected { floor: 0, .. }));
    }
}

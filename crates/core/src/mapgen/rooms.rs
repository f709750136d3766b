//! Placed room footprints and the ordered arena that owns them.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use super::grid::SpatialGrid;
use crate::config::RoomArchetype;
use crate::types::{ArchetypeId, ArchetypePool, GridPos, PlanPoint, RoomId, Rotation, Vec3};

/// Axis-aligned block of cells claimed by one room. `position` is the min
/// corner; `size` is already rotated, and `size.y` covers every level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomFootprint {
    pub archetype: ArchetypeId,
    pub floor: u32,
    pub position: GridPos,
    pub size: GridPos,
    pub rotation: Rotation,
    pub is_main: bool,
    pub light: bool,
    door_offsets: Vec<GridPos>,
}

impl RoomFootprint {
    pub fn new(
        id: ArchetypeId,
        archetype: &RoomArchetype,
        floor: u32,
        rotation: Rotation,
        corner: PlanPoint,
        cells_per_floor: i32,
    ) -> Self {
        let turns = rotation.quarter_turns();
        let door_offsets = archetype
            .doors
            .iter()
            .map(|door| {
                let (lx, lz) = door.local_cell(archetype.width, archetype.depth);
                let (x, z) = rotate_local(lx, lz, archetype.width, archetype.depth, turns);
                GridPos::new(x, door.level * cells_per_floor, z)
            })
            .collect();
        let (width, depth) = if rotation.swaps_axes() {
            (archetype.depth, archetype.width)
        } else {
            (archetype.width, archetype.depth)
        };

        Self {
            archetype: id,
            floor,
            position: corner.on_layer(floor as i32 * cells_per_floor),
            size: GridPos::new(width, archetype.levels * cells_per_floor, depth),
            rotation,
            is_main: id.pool == ArchetypePool::Main,
            light: archetype.light,
            door_offsets,
        }
    }

    pub fn is_stairs(&self) -> bool {
        self.archetype.pool == ArchetypePool::Stairs
    }

    /// Exclusive max corner.
    pub fn max_corner(&self) -> GridPos {
        self.position.offset(self.size.x, self.size.y, self.size.z)
    }

    /// Door cells in grid coordinates, just outside the walls.
    pub fn doors(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.door_offsets.iter().map(|offset| self.position.offset(offset.x, offset.y, offset.z))
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        let min = self.position;
        let max = self.max_corner();
        (min.z..max.z).flat_map(move |z| {
            (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| GridPos::new(x, y, z)))
        })
    }

    pub fn contains_cell(&self, pos: GridPos) -> bool {
        let max = self.max_corner();
        (self.position.x..max.x).contains(&pos.x)
            && (self.position.y..max.y).contains(&pos.y)
            && (self.position.z..max.z).contains(&pos.z)
    }

    /// True when the footprints share a level and their plan rectangles are
    /// closer than `buffer` cells.
    pub fn overlaps(&self, other: &Self, buffer: i32) -> bool {
        let (a_min, a_max) = (self.position, self.max_corner());
        let (b_min, b_max) = (other.position, other.max_corner());
        a_min.y < b_max.y
            && b_min.y < a_max.y
            && a_min.x < b_max.x + buffer
            && b_min.x < a_max.x + buffer
            && a_min.z < b_max.z + buffer
            && b_min.z < a_max.z + buffer
    }

    pub fn plan_center(&self) -> (f64, f64) {
        (
            f64::from(self.position.x) + f64::from(self.size.x) / 2.0,
            f64::from(self.position.z) + f64::from(self.size.z) / 2.0,
        )
    }

    pub fn shift(&mut self, dx: i32, dz: i32) {
        self.position = self.position.offset(dx, 0, dz);
    }

    /// Keeps the plan rectangle within `[min, max)`.
    pub fn clamp_to(&mut self, min: PlanPoint, max: PlanPoint) {
        self.position.x = self.position.x.clamp(min.x, (max.x - self.size.x).max(min.x));
        self.position.z = self.position.z.clamp(min.z, (max.z - self.size.z).max(min.z));
    }

    /// World-space point at the middle of the room's floor slab.
    pub fn world_floor_center(&self, grid: &SpatialGrid) -> Vec3 {
        let (min, max) = self.world_bounds(grid);
        Vec3::new((min.x + max.x) / 2.0, min.y, (min.z + max.z) / 2.0)
    }

    pub fn world_bounds(&self, grid: &SpatialGrid) -> (Vec3, Vec3) {
        let origin = grid.world_bottom_left();
        let diameter = grid.cell_diameter();
        let corner = |pos: GridPos| {
            Vec3::new(
                origin.x + pos.x as f32 * diameter,
                origin.y + pos.y as f32 * diameter,
                origin.z + pos.z as f32 * diameter,
            )
        };
        (corner(self.position), corner(self.max_corner()))
    }

    pub fn contains_world(&self, grid: &SpatialGrid, point: Vec3) -> bool {
        let (min, max) = self.world_bounds(grid);
        (min.x..=max.x).contains(&point.x)
            && (min.y..=max.y).contains(&point.y)
            && (min.z..=max.z).contains(&point.z)
    }
}

/// Applies `turns` clockwise quarter turns to a local plan cell of a
/// `width` x `depth` footprint.
fn rotate_local(mut x: i32, mut z: i32, mut width: i32, mut depth: i32, turns: u8) -> (i32, i32) {
    for _ in 0..turns {
        (x, z) = (z, width - 1 - x);
        (width, depth) = (depth, width);
    }
    (x, z)
}

/// Rooms in placement order. Removal keeps the relative order of the rest.
#[derive(Clone, Debug, Default)]
pub struct RoomSet {
    rooms: SlotMap<RoomId, RoomFootprint>,
    order: Vec<RoomId>,
}

impl RoomSet {
    pub fn new() -> Self {
        Self { rooms: SlotMap::with_key(), order: Vec::new() }
    }

    pub fn insert(&mut self, room: RoomFootprint) -> RoomId {
        let id = self.rooms.insert(room);
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: RoomId) -> Option<RoomFootprint> {
        let room = self.rooms.remove(id)?;
        self.order.retain(|&other| other != id);
        Some(room)
    }

    pub fn get(&self, id: RoomId) -> Option<&RoomFootprint> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: RoomId) -> Option<&mut RoomFootprint> {
        self.rooms.get_mut(id)
    }

    pub fn ids(&self) -> &[RoomId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomId, &RoomFootprint)> + '_ {
        self.order.iter().map(|&id| (id, &self.rooms[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn main(&self) -> Option<&RoomFootprint> {
        self.iter().map(|(_, room)| room).find(|room| room.is_main)
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoorAnchor, DoorSide};

    fn regular(index: usize) -> ArchetypeId {
        ArchetypeId { pool: ArchetypePool::Regular, index }
    }

    fn bedroom() -> RoomArchetype {
        RoomArchetype::new(
            "bedroom",
            4,
            2,
            vec![DoorAnchor::new(DoorSide::West, 1), DoorAnchor::new(DoorSide::North, 3)],
        )
    }

    #[test]
    fn rotation_swaps_footprint_axes() {
        let archetype = bedroom();
        for rotation in Rotation::ALL {
            let room =
                RoomFootprint::new(regular(0), &archetype, 0, rotation, PlanPoint::new(5, 5), 2);
            let expected = if rotation.swaps_axes() { (2, 4) } else { (4, 2) };
            assert_eq!((room.size.x, room.size.z), expected, "{rotation:?}");
            assert_eq!(room.size.y, 2);
        }
    }

    #[test]
    fn doors_stay_adjacent_to_walls_under_rotation() {
        let archetype = bedroom();
        for rotation in Rotation::ALL {
            let room =
                RoomFootprint::new(regular(0), &archetype, 0, rotation, PlanPoint::new(5, 5), 2);
            assert_eq!(room.doors().count(), 2);
            for door in room.doors() {
                assert!(!room.contains_cell(door), "{rotation:?} door {door:?} inside room");
                let touching = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                    .into_iter()
                    .filter(|&(dx, dz)| room.contains_cell(door.offset(dx, 0, dz)))
                    .count();
                assert_eq!(touching, 1, "{rotation:?} door {door:?} should touch one wall");
            }
        }
    }

    #[test]
    fn quarter_turn_maps_west_door_to_north_side() {
        let room = RoomFootprint::new(
            regular(0),
            &bedroom(),
            0,
            Rotation::Deg90,
            PlanPoint::new(0, 0),
            1,
        );
        let doors: Vec<_> = room.doors().collect();
        // West door (-1, 1) on a 4x2 room lands above the rotated 2x4 footprint.
        assert_eq!(doors[0], GridPos::new(1, 0, 4));
    }

    #[test]
    fn upper_level_doors_sit_on_the_next_floor() {
        let archetype = RoomArchetype {
            name: "stairwell".to_string(),
            width: 3,
            depth: 5,
            levels: 2,
            doors: vec![DoorAnchor { side: DoorSide::North, offset: 1, level: 1 }],
            light: false,
        };
        let id = ArchetypeId { pool: ArchetypePool::Stairs, index: 0 };
        let room = RoomFootprint::new(id, &archetype, 1, Rotation::Deg0, PlanPoint::new(4, 4), 3);
        assert!(room.is_stairs());
        assert_eq!(room.position.y, 3);
        assert_eq!(room.size.y, 6);
        assert_eq!(room.doors().next(), Some(GridPos::new(5, 6, 9)));
    }

    #[test]
    fn overlap_honours_buffer_and_levels() {
        let archetype = RoomArchetype::new("box", 3, 3, Vec::new());
        let at = |x, floor| {
            let corner = PlanPoint::new(x, 0);
            RoomFootprint::new(regular(0), &archetype, floor, Rotation::Deg0, corner, 1)
        };
        assert!(at(0, 0).overlaps(&at(2, 0), 0));
        assert!(!at(0, 0).overlaps(&at(3, 0), 0));
        assert!(at(0, 0).overlaps(&at(3, 0), 1));
        assert!(!at(0, 0).overlaps(&at(4, 0), 1));
        assert!(!at(0, 0).overlaps(&at(0, 1), 2), "different floors never overlap");
    }

    #[test]
    fn clamp_keeps_room_inside_bounds() {
        let mut room =
            RoomFootprint::new(regular(0), &bedroom(), 0, Rotation::Deg0, PlanPoint::new(0, 0), 1);
        room.shift(-5, 40);
        room.clamp_to(PlanPoint::new(2, 2), PlanPoint::new(20, 20));
        assert_eq!(room.position, GridPos::new(2, 0, 18));
    }

    #[test]
    fn room_set_preserves_insertion_order_across_removals() {
        let archetype = RoomArchetype::new("box", 2, 2, Vec::new());
        let mut set = RoomSet::new();
        let ids: Vec<_> = (0..4)
            .map(|x| {
                set.insert(RoomFootprint::new(
                    regular(0),
                    &archetype,
                    0,
                    Rotation::Deg0,
                    PlanPoint::new(x * 4, 0),
                    1,
                ))
            })
            .collect();
        set.remove(ids[1]);
        let reinserted = set.insert(RoomFootprint::new(
            regular(0),
            &archetype,
            0,
            Rotation::Deg0,
            PlanPoint::new(40, 0),
            1,
        ));

        assert_eq!(set.ids(), &[ids[0], ids[2], ids[3], reinserted]);
        assert_eq!(set.len(), 4);
        assert!(set.get(ids[1]).is_none());
    }
}

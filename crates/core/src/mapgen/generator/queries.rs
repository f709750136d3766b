//! Read-side queries over a finished layout.
//!
//! Every query answers from the current run only and returns nothing (or the
//! zero vector for `door_nearest`) until the generator is `Ready`. Random
//! queries draw from a stream seeded separately from the layout, so asking
//! them never changes what a seed generates.

use crate::types::{CellKind, GridPos, Vec3};

use super::super::model::FloorRouting;
use super::super::rooms::RoomFootprint;
use super::super::seed::random_index;
use super::MapGenerator;

/// Spawn slots around the main room's center, in cell diameters.
const SPAWN_OFFSETS: [(f32, f32); 4] = [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];

const DOOR_TIE_EPSILON: f32 = 1e-4;

impl MapGenerator {
    pub fn rooms(&self) -> impl Iterator<Item = &RoomFootprint> + '_ {
        self.rooms.iter().map(|(_, room)| room)
    }

    pub fn main_room(&self) -> Option<&RoomFootprint> {
        self.rooms.main()
    }

    pub fn hallways(&self) -> &[GridPos] {
        &self.hallways
    }

    pub fn floor_routing(&self, floor: u32) -> Option<&FloorRouting> {
        self.floors.iter().find(|routing| routing.floor == floor)
    }

    /// Point just above the main room's floor for player `spawn_index`.
    /// Slots cycle every four players; a slot that would leave the room
    /// falls back to the room center.
    pub fn player_spawn_position(&self, spawn_index: usize) -> Option<Vec3> {
        if !self.is_ready() {
            return None;
        }
        let room = self.rooms.main()?;
        let center = room.world_floor_center(&self.grid);
        let lifted = Vec3::new(center.x, center.y + self.grid.cell_radius(), center.z);

        let (ox, oz) = SPAWN_OFFSETS[spawn_index % SPAWN_OFFSETS.len()];
        let diameter = self.grid.cell_diameter();
        let slot = Vec3::new(lifted.x + ox * diameter, lifted.y, lifted.z + oz * diameter);
        Some(if room.contains_world(&self.grid, slot) { slot } else { lifted })
    }

    /// Floor-level position of every hallway cell, in carving order. These
    /// points lie on the bottom face of the cell, so a world lookup may land
    /// on the layer below; lift by `cell_radius` to address the cell itself.
    pub fn hallway_positions(&self) -> Vec<Vec3> {
        if !self.is_ready() {
            return Vec::new();
        }
        self.hallways.iter().map(|&pos| self.floor_level(pos)).collect()
    }

    /// Floor-level point of a random hallway cell, as in `hallway_positions`.
    pub fn random_hallway_position(&mut self) -> Option<Vec3> {
        if !self.is_ready() || self.hallways.is_empty() {
            return None;
        }
        let pos = self.hallways[random_index(&mut self.query_rng, self.hallways.len())];
        Some(self.floor_level(pos))
    }

    /// Floor-level position of a random cell on the bottom layer of a random room.
    pub fn random_room_position(&mut self) -> Option<Vec3> {
        if !self.is_ready() || self.rooms.is_empty() {
            return None;
        }
        let id = self.rooms.ids()[random_index(&mut self.query_rng, self.rooms.len())];
        let room = self.rooms.get(id)?;
        let (position, size) = (room.position, room.size);
        let dx = random_index(&mut self.query_rng, size.x as usize) as i32;
        let dz = random_index(&mut self.query_rng, size.z as usize) as i32;
        Some(self.floor_level(position.offset(dx, 0, dz)))
    }

    /// First room, in placement order, whose volume contains `point`.
    pub fn room_containing(&self, point: Vec3) -> Option<&RoomFootprint> {
        if !self.is_ready() {
            return None;
        }
        self.rooms().find(|room| room.contains_world(&self.grid, point))
    }

    /// Center of a walkable cell at the door of the room around `target` that
    /// is closest to it: the door cell or a corridor cell beside it. Returns
    /// `Vec3::ZERO` when `target` is outside every room or the room has no doors.
    pub fn door_nearest(&mut self, target: Vec3) -> Vec3 {
        let doors: Vec<GridPos> = match self.room_containing(target) {
            Some(room) => room.doors().collect(),
            None => return Vec3::ZERO,
        };

        let distances: Vec<(GridPos, f32)> = doors
            .iter()
            .map(|&door| (door, self.grid.cell_center(door).distance(target)))
            .collect();
        let Some(best) = distances.iter().map(|&(_, distance)| distance).reduce(f32::min) else {
            return Vec3::ZERO;
        };
        let tied: Vec<GridPos> = distances
            .iter()
            .filter(|&&(_, distance)| distance - best <= DOOR_TIE_EPSILON)
            .map(|&(door, _)| door)
            .collect();
        let door = tied[random_index(&mut self.query_rng, tied.len())];

        let candidates: Vec<GridPos> = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .map(|(dx, dz)| door.offset(dx, 0, dz))
            .filter(|&pos| self.grid.kind(pos).is_some_and(CellKind::is_corridor))
            .collect();
        if candidates.is_empty() {
            return Vec3::ZERO;
        }
        let spot = candidates[random_index(&mut self.query_rng, candidates.len())];
        self.grid.cell_center(spot)
    }

    fn floor_level(&self, pos: GridPos) -> Vec3 {
        let center = self.grid.cell_center(pos);
        Vec3::new(center.x, center.y - self.grid.cell_radius(), center.z)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ArchetypeCatalog, GenerationConfig};
    use crate::mapgen::geometry::NullSink;
    use crate::mapgen::generator::MapGenerator;
    use crate::types::{CellKind, Vec3};

    fn ready(config: GenerationConfig, seed: u64) -> MapGenerator {
        let mut generator = MapGenerator::new(config, ArchetypeCatalog::house()).unwrap();
        generator.generate(seed, &mut NullSink).unwrap();
        generator
    }

    #[test]
    fn queries_are_empty_before_generation() {
        let mut generator =
            MapGenerator::new(GenerationConfig::default(), ArchetypeCatalog::house()).unwrap();
        assert!(generator.player_spawn_position(0).is_none());
        assert!(generator.random_hallway_position().is_none());
        assert!(generator.random_room_position().is_none());
        assert!(generator.hallway_positions().is_empty());
        assert!(generator.room_containing(Vec3::ZERO).is_none());
        assert_eq!(generator.door_nearest(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn every_spawn_slot_lands_in_the_main_room() {
        let config = GenerationConfig { rooms_per_floor: 4, ..GenerationConfig::default() };
        let generator = ready(config, 42);
        for index in 0..8 {
            let spawn = generator.player_spawn_position(index).unwrap();
            let room = generator.room_containing(spawn).unwrap();
            assert!(room.is_main, "slot {index} left the main room");
        }
        assert_ne!(generator.player_spawn_position(0), generator.player_spawn_position(1));
        assert_eq!(generator.player_spawn_position(0), generator.player_spawn_position(4));
    }

    #[test]
    fn random_positions_sit_on_hallway_and_room_floors() {
        let mut generator = ready(GenerationConfig::default(), 7);
        let radius = generator.grid().cell_radius();
        for _ in 0..32 {
            let spot = generator.random_hallway_position().unwrap();
            let lifted = Vec3::new(spot.x, spot.y + radius, spot.z);
            assert_eq!(generator.grid().cell_at_world(lifted).kind, CellKind::Hallway);

            let spot = generator.random_room_position().unwrap();
            let lifted = Vec3::new(spot.x, spot.y + radius, spot.z);
            assert!(generator.room_containing(lifted).is_some());
        }
    }

    #[test]
    fn random_queries_do_not_disturb_the_layout() {
        let mut generator = ready(GenerationConfig::default(), 19);
        let before = generator.fingerprint();
        for _ in 0..10 {
            generator.random_hallway_position();
            generator.random_room_position();
        }
        assert_eq!(generator.fingerprint(), before);
    }

    #[test]
    fn hallway_positions_match_hallway_cells() {
        let generator = ready(GenerationConfig::default(), 21);
        let positions = generator.hallway_positions();
        assert_eq!(positions.len(), generator.hallways().len());
        assert!(!positions.is_empty());
    }

    #[test]
    fn door_nearest_resolves_to_a_corridor_cell_on_every_floor() {
        let config = GenerationConfig {
            floor_count: 3,
            rooms_per_floor: 5,
            stair_chance: 0.5,
            ..GenerationConfig::default()
        };
        for seed in 0..10 {
            let mut generator = ready(config.clone(), seed);
            let radius = generator.grid().cell_radius();
            let targets: Vec<(u32, Vec3)> = generator
                .rooms()
                .map(|room| {
                    let center = room.world_floor_center(generator.grid());
                    (room.floor, Vec3::new(center.x, center.y + radius, center.z))
                })
                .collect();
            for (floor, target) in targets {
                let spot = generator.door_nearest(target);
                assert_ne!(spot, Vec3::ZERO, "seed {seed}: floor {floor}");
                let cell = generator.grid().cell_at_world(spot);
                assert!(
                    cell.kind.is_corridor(),
                    "seed {seed}: floor {floor} door spot {spot:?} resolves to {:?}",
                    cell.kind
                );
            }
        }
    }

    #[test]
    fn door_nearest_is_zero_outside_every_room() {
        let mut generator = ready(GenerationConfig::default(), 42);
        let outside = Vec3::new(-39.0, 0.5, -39.0);
        assert!(generator.room_containing(outside).is_none());
        assert_eq!(generator.door_nearest(outside), Vec3::ZERO);
    }
}

//! Room placement: random footprints per floor, iterative separation, then a
//! deterministic drop pass for anything still overlapping.

use log::{debug, warn};
use rand_chacha::ChaCha8Rng;

use super::rooms::{RoomFootprint, RoomSet};
use super::seed::{random_i32, random_index, roll};
use crate::config::{ArchetypeCatalog, BOUNDARY_MARGIN_CELLS, GenerationConfig};
use crate::types::{ArchetypeId, ArchetypePool, GridPos, PlanPoint, RoomId, Rotation};

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Inputs shared by every placement step.
pub struct PlacementContext<'a> {
    pub config: &'a GenerationConfig,
    pub catalog: &'a ArchetypeCatalog,
    pub dims: GridPos,
}

impl PlacementContext<'_> {
    fn plan_min(&self) -> PlanPoint {
        PlanPoint::new(BOUNDARY_MARGIN_CELLS, BOUNDARY_MARGIN_CELLS)
    }

    /// Exclusive upper plan bound.
    fn plan_max(&self) -> PlanPoint {
        PlanPoint::new(self.dims.x - BOUNDARY_MARGIN_CELLS, self.dims.z - BOUNDARY_MARGIN_CELLS)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Placement {
    pub rooms: RoomSet,
    /// Rooms removed because separation could not resolve them.
    pub dropped: usize,
}

/// Places every floor in order, separating after each one so later floors
/// can push against stairwells rising from below.
pub fn place_rooms(context: &PlacementContext<'_>, rng: &mut ChaCha8Rng) -> Placement {
    let config = context.config;
    let buffer = config.separation_buffer_cells();
    let mut rooms = RoomSet::new();
    let mut dropped = 0;

    for floor in 0..config.floor_count {
        let mut pity = 0_u32;
        for slot in 0..config.rooms_per_floor {
            let pool = choose_pool(context, floor, slot, &mut pity, rng);
            let room = random_footprint(context, pool, floor, rng);
            rooms.insert(room);
        }

        let iterations =
            separate_rooms(&mut rooms, buffer, context.plan_min(), context.plan_max(), config, rng);
        debug!("floor {floor}: separation settled after {iterations} iteration(s)");
        dropped += drop_overlapping(&mut rooms, buffer);
    }
    Placement { rooms, dropped }
}

fn choose_pool(
    context: &PlacementContext<'_>,
    floor: u32,
    slot: u32,
    pity: &mut u32,
    rng: &mut ChaCha8Rng,
) -> ArchetypePool {
    if floor == 0 && slot == 0 {
        return ArchetypePool::Main;
    }
    let config = context.config;
    let can_climb = floor + 1 < config.floor_count && !context.catalog.stairs.is_empty();
    if can_climb && (roll(rng, config.stair_chance) || *pity >= config.stair_pity) {
        *pity = 0;
        return ArchetypePool::Stairs;
    }
    *pity += 1;
    ArchetypePool::Regular
}

fn random_footprint(
    context: &PlacementContext<'_>,
    pool: ArchetypePool,
    floor: u32,
    rng: &mut ChaCha8Rng,
) -> RoomFootprint {
    let catalog = context.catalog;
    let pool_len = match pool {
        ArchetypePool::Main => 1,
        ArchetypePool::Regular => catalog.regular.len(),
        ArchetypePool::Stairs => catalog.stairs.len(),
    };
    let id = ArchetypeId { pool, index: random_index(rng, pool_len) };
    let archetype = catalog.get(id).unwrap_or(&catalog.main);
    let rotation = Rotation::ALL[random_index(rng, Rotation::ALL.len())];

    let (width, depth) = if rotation.swaps_axes() {
        (archetype.depth, archetype.width)
    } else {
        (archetype.width, archetype.depth)
    };
    let min = context.plan_min();
    let max = context.plan_max();
    let corner = PlanPoint::new(
        random_i32(rng, min.x, (max.x - width).max(min.x)),
        random_i32(rng, min.z, (max.z - depth).max(min.z)),
    );
    RoomFootprint::new(id, archetype, floor, rotation, corner, context.config.cells_per_floor())
}

/// Pushes every overlapping pair one cell apart along the line between their
/// centers until nothing overlaps or the iteration budget runs out. Returns
/// the number of sweeps performed.
pub fn separate_rooms(
    rooms: &mut RoomSet,
    buffer: i32,
    min: PlanPoint,
    max: PlanPoint,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) -> u32 {
    let ids: Vec<RoomId> = rooms.ids().to_vec();
    for iteration in 0..config.max_separation_iterations {
        let mut moved = false;
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let (Some(room_a), Some(room_b)) = (rooms.get(a), rooms.get(b)) else {
                    continue;
                };
                if !room_a.overlaps(room_b, buffer) {
                    continue;
                }
                moved = true;
                let (dx, dz) = push_direction(room_a.plan_center(), room_b.plan_center(), rng);
                if let Some(room) = rooms.get_mut(a) {
                    room.shift(-dx, -dz);
                    room.clamp_to(min, max);
                }
                if let Some(room) = rooms.get_mut(b) {
                    room.shift(dx, dz);
                    room.clamp_to(min, max);
                }
            }
        }
        if !moved {
            return iteration;
        }
    }
    config.max_separation_iterations
}

/// Unit cell step pointing from `from` towards `to`, rounded per axis.
/// Coincident centers pick a random cardinal direction.
fn push_direction(from: (f64, f64), to: (f64, f64), rng: &mut ChaCha8Rng) -> (i32, i32) {
    let (dx, dz) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dz);
    if length < 1e-9 {
        return CARDINALS[random_index(rng, CARDINALS.len())];
    }
    ((dx / length).round() as i32, (dz / length).round() as i32)
}

/// Removes rooms until no pair overlaps. The later room of the first
/// overlapping pair goes, unless it is the main room.
pub fn drop_overlapping(rooms: &mut RoomSet, buffer: i32) -> usize {
    let mut dropped = 0;
    while let Some((earlier, later)) = first_overlap(rooms, buffer) {
        let later_is_main = rooms.get(later).is_some_and(|room| room.is_main);
        let victim = if later_is_main { earlier } else { later };
        if let Some(room) = rooms.remove(victim) {
            warn!(
                "dropping {:?} room on floor {} at {:?}: still overlapping after separation",
                room.archetype.pool, room.floor, room.position
            );
            dropped += 1;
        }
    }
    dropped
}

fn first_overlap(rooms: &RoomSet, buffer: i32) -> Option<(RoomId, RoomId)> {
    let placed: Vec<(RoomId, &RoomFootprint)> = rooms.iter().collect();
    for (i, &(a, room_a)) in placed.iter().enumerate() {
        for &(b, room_b) in &placed[i + 1..] {
            if room_a.overlaps(room_b, buffer) {
                return Some((a, b));
            }
        }
    }
    None
}

//! A* search over the spatial grid, used to realize routed corridors.
//! Search buffers live on `PathSearch` so the many corridor queries of one run
//! reuse a single allocation. Searching never changes cell kinds; that is the
//! job of `realize_hallway`.

use std::collections::BTreeSet;

use crate::types::{CellKind, GridPos};

use super::grid::{SearchScratch, SpatialGrid};

const AXIS_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    index: usize,
}

/// Extra cost of entering a cell of each kind; `None` makes the kind impassable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Traversal {
    pub empty: Option<u32>,
    pub room: Option<u32>,
    pub hallway: Option<u32>,
    pub door: Option<u32>,
    pub stairs: Option<u32>,
    /// Restrict the search to the start cell's layer.
    pub confine_to_layer: bool,
}

impl Traversal {
    /// Reuse hallways, avoid cutting through rooms.
    pub const TERRAIN: Self = Self {
        empty: Some(5),
        room: Some(10),
        hallway: Some(1),
        door: Some(0),
        stairs: Some(10),
        confine_to_layer: false,
    };

    /// Terrain costs on one floor with room interiors closed off, so every
    /// realized corridor is made of hallway and door cells only.
    pub const CORRIDOR: Self =
        Self { room: None, stairs: None, confine_to_layer: true, ..Self::TERRAIN };

    fn surcharge(&self, kind: CellKind) -> Option<u32> {
        match kind {
            CellKind::Empty => self.empty,
            CellKind::Room => self.room,
            CellKind::Hallway => self.hallway,
            CellKind::Door => self.door,
            CellKind::Stairs => self.stairs,
        }
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::TERRAIN
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub start: GridPos,
    /// Cells after `start`, ending at the target.
    pub cells: Vec<GridPos>,
    /// Accumulated cost including terrain surcharges.
    pub cost: u32,
}

impl Path {
    /// Cost of the route without terrain surcharges.
    pub fn movement_cost(&self) -> u32 {
        let mut previous = self.start;
        let mut total = 0;
        for &pos in &self.cells {
            total += movement_cost(previous, pos);
            previous = pos;
        }
        total
    }
}

/// Octile distance on the plan plus a flat cost per layer. Also the A*
/// heuristic; it never overestimates since every step costs at least `AXIS_COST`.
pub fn movement_cost(a: GridPos, b: GridPos) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dz = a.z.abs_diff(b.z);
    let dy = a.y.abs_diff(b.y);
    let diagonal = dx.min(dz);
    DIAGONAL_COST * diagonal + AXIS_COST * (dx.max(dz) - diagonal) + AXIS_COST * dy
}

pub struct PathSearch {
    open: BTreeSet<OpenNode>,
    closed: Vec<bool>,
    touched: Vec<usize>,
    frontier: Vec<GridPos>,
}

impl PathSearch {
    pub fn new(grid: &SpatialGrid) -> Self {
        Self {
            open: BTreeSet::new(),
            closed: vec![false; grid.len()],
            touched: Vec::new(),
            frontier: Vec::with_capacity(6),
        }
    }

    pub fn find_path(
        &mut self,
        grid: &mut SpatialGrid,
        start: GridPos,
        target: GridPos,
        traversal: Traversal,
    ) -> Option<Path> {
        self.reset(grid);
        let start_index = grid.index_of(start)?;
        let target_index = grid.index_of(target)?;
        if start_index == target_index {
            return Some(Path { start, cells: Vec::new(), cost: 0 });
        }

        let h = movement_cost(start, target);
        grid.cell_at_index_mut(start_index).scratch = SearchScratch { g: 0, h, parent: None };
        self.touched.push(start_index);
        self.open.insert(OpenNode { f: h, h, index: start_index });

        while let Some(current) = self.open.pop_first() {
            if current.index == target_index {
                return Some(retrace(grid, start, start_index, target_index));
            }
            self.closed[current.index] = true;

            let (pos, current_g) = {
                let cell = grid.cell_at_index(current.index);
                (cell.pos, cell.scratch.g)
            };
            self.frontier.clear();
            self.frontier.extend(grid.neighbors(pos));

            for &next in &self.frontier {
                if traversal.confine_to_layer && next.y != start.y {
                    continue;
                }
                let Some(index) = grid.index_of(next) else {
                    continue;
                };
                if self.closed[index] {
                    continue;
                }
                let cell = grid.cell_at_index(index);
                let Some(surcharge) = traversal.surcharge(cell.kind) else {
                    continue;
                };
                let previous = cell.scratch;
                let tentative = current_g + movement_cost(pos, next) + surcharge;
                if tentative >= previous.g {
                    continue;
                }

                if previous.g == u32::MAX {
                    self.touched.push(index);
                } else {
                    let f = previous.g + previous.h;
                    self.open.remove(&OpenNode { f, h: previous.h, index });
                }
                let h = movement_cost(next, target);
                grid.cell_at_index_mut(index).scratch =
                    SearchScratch { g: tentative, h, parent: Some(current.index) };
                self.open.insert(OpenNode { f: tentative + h, h, index });
            }
        }
        None
    }

    fn reset(&mut self, grid: &mut SpatialGrid) {
        self.closed.resize(grid.len(), false);
        for &index in &self.touched {
            grid.cell_at_index_mut(index).scratch = SearchScratch::default();
            self.closed[index] = false;
        }
        self.touched.clear();
        self.open.clear();
    }
}

fn retrace(grid: &SpatialGrid, start: GridPos, start_index: usize, target_index: usize) -> Path {
    let cost = grid.cell_at_index(target_index).scratch.g;
    let mut cells = Vec::new();
    let mut index = target_index;
    while index != start_index {
        let cell = grid.cell_at_index(index);
        cells.push(cell.pos);
        match cell.scratch.parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    cells.reverse();
    Path { start, cells, cost }
}

/// Promotes the empty cells of `path` to hallway. Room, door, and stairs cells
/// keep their kind. Returns the cells that changed.
pub fn realize_hallway(grid: &mut SpatialGrid, path: &Path) -> Vec<GridPos> {
    path.cells.iter().copied().filter(|&pos| grid.promote(pos, CellKind::Hallway)).collect()
}

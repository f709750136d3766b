//! Dense 3D occupancy lattice shared by placement, routing, and materialization.

use crate::types::{CellKind, GridPos, Vec3};

const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] =
    [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)];

/// Per-cell A* bookkeeping, reset by `PathSearch` for every cell it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SearchScratch {
    pub(crate) g: u32,
    pub(crate) h: u32,
    pub(crate) parent: Option<usize>,
}

impl Default for SearchScratch {
    fn default() -> Self {
        Self { g: u32::MAX, h: 0, parent: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub pos: GridPos,
    pub center: Vec3,
    pub kind: CellKind,
    pub(crate) scratch: SearchScratch,
}

/// Fixed-size lattice of cells. Dimensions are computed once from the world
/// extent and never change; every world position resolves to exactly one cell.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    world_size: Vec3,
    center: Vec3,
    cell_radius: f32,
    dims: GridPos,
    cells: Vec<Cell>,
}

impl SpatialGrid {
    pub fn new(world_size: Vec3, cell_radius: f32, center: Vec3) -> Self {
        let diameter = cell_radius * 2.0;
        let dims = GridPos::new(
            axis_cells(world_size.x, diameter),
            axis_cells(world_size.y, diameter),
            axis_cells(world_size.z, diameter),
        );
        let bottom_left = Vec3::new(
            center.x - world_size.x / 2.0,
            center.y - world_size.y / 2.0,
            center.z - world_size.z / 2.0,
        );

        let mut cells = Vec::with_capacity((dims.x * dims.y * dims.z) as usize);
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let pos = GridPos::new(x, y, z);
                    cells.push(Cell {
                        pos,
                        center: cell_center(bottom_left, cell_radius, pos),
                        kind: CellKind::Empty,
                        scratch: SearchScratch::default(),
                    });
                }
            }
        }

        Self { world_size, center, cell_radius, dims, cells }
    }

    pub fn dims(&self) -> GridPos {
        self.dims
    }

    pub fn cell_radius(&self) -> f32 {
        self.cell_radius
    }

    pub fn cell_diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn world_bottom_left(&self) -> Vec3 {
        Vec3::new(
            self.center.x - self.world_size.x / 2.0,
            self.center.y - self.world_size.y / 2.0,
            self.center.z - self.world_size.z / 2.0,
        )
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        (0..self.dims.x).contains(&pos.x)
            && (0..self.dims.y).contains(&pos.y)
            && (0..self.dims.z).contains(&pos.z)
    }

    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        self.contains(pos).then(|| ((pos.z * self.dims.y + pos.y) * self.dims.x + pos.x) as usize)
    }

    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index_of(pos).map(|index| &self.cells[index])
    }

    pub fn kind(&self, pos: GridPos) -> Option<CellKind> {
        self.cell(pos).map(|cell| cell.kind)
    }

    pub(crate) fn cell_at_index(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_at_index_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// World-space center of `pos`, also defined for positions outside the grid.
    pub fn cell_center(&self, pos: GridPos) -> Vec3 {
        cell_center(self.world_bottom_left(), self.cell_radius, pos)
    }

    /// Clamped percentage lookup; positions outside the world snap to the
    /// nearest edge cell.
    pub fn world_to_grid(&self, world: Vec3) -> GridPos {
        GridPos::new(
            axis_index(world.x, self.center.x, self.world_size.x, self.dims.x),
            axis_index(world.y, self.center.y, self.world_size.y, self.dims.y),
            axis_index(world.z, self.center.z, self.world_size.z, self.dims.z),
        )
    }

    pub fn cell_at_world(&self, world: Vec3) -> &Cell {
        let pos = self.world_to_grid(world);
        &self.cells[((pos.z * self.dims.y + pos.y) * self.dims.x + pos.x) as usize]
    }

    /// Axis-aligned neighbors inside the grid; diagonals are never returned so
    /// corridors stay aligned with wall segments.
    pub fn neighbors(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy, dz)| pos.offset(dx, dy, dz))
            .filter(move |next| self.contains(*next))
    }

    pub fn set_cell_kind(&mut self, world: Vec3, kind: CellKind) {
        let pos = self.world_to_grid(world);
        if let Some(index) = self.index_of(pos) {
            self.cells[index].kind = kind;
        }
    }

    /// Marks an `Empty` cell as `kind`. Cells that already carry a kind are
    /// left alone; returns whether the cell changed.
    pub fn promote(&mut self, pos: GridPos, kind: CellKind) -> bool {
        match self.index_of(pos) {
            Some(index) if self.cells[index].kind == CellKind::Empty => {
                self.cells[index].kind = kind;
                true
            }
            _ => false,
        }
    }

    pub fn layer(&self, y: i32) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(move |cell| cell.pos.y == y)
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + self.cells.len());
        bytes.extend(self.dims.x.to_le_bytes());
        bytes.extend(self.dims.y.to_le_bytes());
        bytes.extend(self.dims.z.to_le_bytes());
        bytes.extend(self.cells.iter().map(|cell| cell.kind.code()));
        bytes
    }
}

fn axis_cells(extent: f32, diameter: f32) -> i32 {
    ((extent / diameter).round() as i32).max(1)
}

fn axis_index(value: f32, center: f32, extent: f32, count: i32) -> i32 {
    let percent =
        if extent > 0.0 { ((value - center + extent / 2.0) / extent).clamp(0.0, 1.0) } else { 0.0 };
    (((count - 1) as f32 * percent).round() as i32).clamp(0, count - 1)
}

fn cell_center(bottom_left: Vec3, radius: f32, pos: GridPos) -> Vec3 {
    let diameter = radius * 2.0;
    Vec3::new(
        bottom_left.x + pos.x as f32 * diameter + radius,
        bottom_left.y + pos.y as f32 * diameter + radius,
        bottom_left.z + pos.z as f32 * diameter + radius,
    )
}

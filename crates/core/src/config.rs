//! Generation settings and room archetypes.
//!
//! Both are plain `serde` structs so a run can be described in a TOML file.
//! `GenerationConfig::validate` rejects settings that would make placement or
//! routing impossible before any work is done.

use std::fs;
use std::iter;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ArchetypeId, ArchetypePool, Vec3};

/// Cells kept free between a room and the edge of the map.
pub const BOUNDARY_MARGIN_CELLS: i32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// World extent of the map. `y` is ignored; the vertical extent is always
    /// `floor_count * floor_height`.
    pub map_size: Vec3,
    pub center: Vec3,
    pub floor_count: u32,
    pub floor_height: f32,
    pub rooms_per_floor: u32,
    pub cell_radius: f32,
    pub separation_buffer: f32,
    pub max_separation_iterations: u32,
    pub cycle_chance: f64,
    pub stair_chance: f64,
    pub stair_pity: u32,
    pub geometry: GeometryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map_size: Vec3::new(80.0, 0.0, 80.0),
            center: Vec3::ZERO,
            floor_count: 1,
            floor_height: 4.0,
            rooms_per_floor: 6,
            cell_radius: 1.0,
            separation_buffer: 2.0,
            max_separation_iterations: 30,
            cycle_chance: 0.125,
            stair_chance: 0.1,
            stair_pity: 4,
            geometry: GeometryConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub wall_thickness: f32,
    pub floor_thickness: f32,
    pub ceiling_thickness: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self { wall_thickness: 0.2, floor_thickness: 0.1, ceiling_thickness: 0.1 }
    }
}

impl GenerationConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    pub fn cell_diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    /// Grid layers per floor; floor height is snapped to whole cells.
    pub fn cells_per_floor(&self) -> i32 {
        ((self.floor_height / self.cell_diameter()).round() as i32).max(1)
    }

    pub fn world_size(&self) -> Vec3 {
        let height = self.floor_count as f32 * self.cells_per_floor() as f32 * self.cell_diameter();
        Vec3::new(self.map_size.x, height, self.map_size.z)
    }

    pub fn separation_buffer_cells(&self) -> i32 {
        (self.separation_buffer / self.cell_diameter()).round() as i32
    }

    pub fn validate(&self, catalog: &ArchetypeCatalog) -> Result<(), ConfigError> {
        if !(self.cell_radius.is_finite() && self.cell_radius > 0.0) {
            return Err(invalid(format!("cell_radius must be positive, got {}", self.cell_radius)));
        }
        if self.floor_count == 0 {
            return Err(invalid("floor_count must be at least 1".to_string()));
        }
        if !(self.floor_height.is_finite() && self.floor_height > 0.0) {
            let height = self.floor_height;
            return Err(invalid(format!("floor_height must be positive, got {height}")));
        }
        let diameter = self.cell_diameter();
        let cells_x = (self.map_size.x / diameter).round() as i32;
        let cells_z = (self.map_size.z / diameter).round() as i32;
        if cells_x < 1 || cells_z < 1 {
            return Err(invalid(format!(
                "map_size {}x{} is smaller than one cell",
                self.map_size.x, self.map_size.z
            )));
        }
        if self.separation_buffer_cells() < 1 {
            return Err(invalid(format!(
                "separation_buffer {} must span at least one cell ({diameter})",
                self.separation_buffer
            )));
        }
        let chances = [("cycle_chance", self.cycle_chance), ("stair_chance", self.stair_chance)];
        for (name, chance) in chances {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(format!("{name} must be within [0, 1], got {chance}")));
            }
        }

        let multi_room = u64::from(self.rooms_per_floor) * u64::from(self.floor_count) > 1;
        if multi_room && catalog.regular.is_empty() {
            return Err(invalid("catalog needs at least one regular archetype".to_string()));
        }

        let usable = cells_x.min(cells_z) - 2 * BOUNDARY_MARGIN_CELLS;
        for (id, archetype) in catalog.iter() {
            archetype.validate()?;
            let expected_levels = if id.pool == ArchetypePool::Stairs { 2 } else { 1 };
            if archetype.levels != expected_levels {
                return Err(invalid(format!(
                    "archetype '{}' spans {} levels, expected {expected_levels}",
                    archetype.name, archetype.levels
                )));
            }
            if archetype.width.max(archetype.depth) > usable {
                return Err(invalid(format!(
                    "archetype '{}' ({}x{}) does not fit a {cells_x}x{cells_z} cell map",
                    archetype.name, archetype.width, archetype.depth
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorSide {
    North,
    South,
    East,
    West,
}

/// Door cell just outside a room wall, `offset` cells along that wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorAnchor {
    pub side: DoorSide,
    pub offset: i32,
    #[serde(default)]
    pub level: i32,
}

impl DoorAnchor {
    pub const fn new(side: DoorSide, offset: i32) -> Self {
        Self { side, offset, level: 0 }
    }

    /// Plan cell relative to the unrotated footprint's min corner.
    pub fn local_cell(&self, width: i32, depth: i32) -> (i32, i32) {
        match self.side {
            DoorSide::West => (-1, self.offset),
            DoorSide::East => (width, self.offset),
            DoorSide::South => (self.offset, -1),
            DoorSide::North => (self.offset, depth),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomArchetype {
    pub name: String,
    /// Footprint along x in cells, before rotation.
    pub width: i32,
    /// Footprint along z in cells, before rotation.
    pub depth: i32,
    #[serde(default = "default_levels")]
    pub levels: i32,
    #[serde(default)]
    pub doors: Vec<DoorAnchor>,
    #[serde(default)]
    pub light: bool,
}

fn default_levels() -> i32 {
    1
}

impl RoomArchetype {
    pub fn new(name: &str, width: i32, depth: i32, doors: Vec<DoorAnchor>) -> Self {
        Self { name: name.to_string(), width, depth, levels: 1, doors, light: true }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1 || self.depth < 1 {
            return Err(invalid(format!(
                "archetype '{}' has an empty footprint {}x{}",
                self.name, self.width, self.depth
            )));
        }
        for door in &self.doors {
            let wall_length = match door.side {
                DoorSide::West | DoorSide::East => self.depth,
                DoorSide::North | DoorSide::South => self.width,
            };
            if !(0..wall_length).contains(&door.offset) || !(0..self.levels).contains(&door.level) {
                return Err(invalid(format!(
                    "archetype '{}' has a door outside its walls: {door:?}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeCatalog {
    pub main: RoomArchetype,
    #[serde(default)]
    pub regular: Vec<RoomArchetype>,
    #[serde(default)]
    pub stairs: Vec<RoomArchetype>,
}

impl Default for ArchetypeCatalog {
    fn default() -> Self {
        Self::house()
    }
}

impl ArchetypeCatalog {
    /// Built-in set: an entrance hall, a handful of bedrooms and one stairwell.
    pub fn house() -> Self {
        use DoorSide::{East, North, South, West};

        let stairwell = RoomArchetype {
            name: "stairwell".to_string(),
            width: 3,
            depth: 5,
            levels: 2,
            doors: vec![DoorAnchor::new(South, 1), DoorAnchor { side: North, offset: 1, level: 1 }],
            light: false,
        };
        Self {
            main: RoomArchetype::new(
                "entrance_hall",
                6,
                6,
                vec![
                    DoorAnchor::new(North, 2),
                    DoorAnchor::new(South, 3),
                    DoorAnchor::new(East, 2),
                    DoorAnchor::new(West, 3),
                ],
            ),
            regular: vec![
                RoomArchetype::new(
                    "bedroom",
                    4,
                    5,
                    vec![DoorAnchor::new(West, 2), DoorAnchor::new(East, 1)],
                ),
                RoomArchetype::new("bathroom", 3, 3, vec![DoorAnchor::new(South, 1)]),
                RoomArchetype::new(
                    "study",
                    5,
                    4,
                    vec![DoorAnchor::new(North, 2), DoorAnchor::new(South, 1)],
                ),
                RoomArchetype::new(
                    "nursery",
                    4,
                    4,
                    vec![DoorAnchor::new(East, 1), DoorAnchor::new(North, 2)],
                ),
            ],
            stairs: vec![stairwell],
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    pub fn get(&self, id: ArchetypeId) -> Option<&RoomArchetype> {
        match id.pool {
            ArchetypePool::Main => (id.index == 0).then_some(&self.main),
            ArchetypePool::Regular => self.regular.get(id.index),
            ArchetypePool::Stairs => self.stairs.get(id.index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArchetypeId, &RoomArchetype)> {
        let main = iter::once((ArchetypeId { pool: ArchetypePool::Main, index: 0 }, &self.main));
        let regular = self.regular.iter().enumerate().map(|(index, archetype)| {
            (ArchetypeId { pool: ArchetypePool::Regular, index }, archetype)
        });
        let stairs = self.stairs.iter().enumerate().map(|(index, archetype)| {
            (ArchetypeId { pool: ArchetypePool::Stairs, index }, archetype)
        });
        main.chain(regular).chain(stairs)
    }
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    Ok(toml::from_str(&text)?)
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid_for_house_catalog() {
        let config = GenerationConfig::default();
        config.validate(&ArchetypeCatalog::house()).expect("defaults should validate");
    }

    #[test]
    fn vertical_extent_is_derived_from_floors() {
        let config = GenerationConfig {
            map_size: Vec3::new(40.0, 999.0, 30.0),
            floor_count: 3,
            floor_height: 4.0,
            cell_radius: 1.0,
            ..GenerationConfig::default()
        };
        assert_eq!(config.cells_per_floor(), 2);
        assert_eq!(config.world_size(), Vec3::new(40.0, 12.0, 30.0));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = GenerationConfig::from_toml_str(
            r#"
            floor_count = 2
            rooms_per_floor = 3
            cycle_chance = 0.0

            [geometry]
            wall_thickness = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.floor_count, 2);
        assert_eq!(config.rooms_per_floor, 3);
        assert_eq!(config.cycle_chance, 0.0);
        assert_eq!(config.geometry.wall_thickness, 0.5);
        assert_eq!(config.geometry.floor_thickness, GeometryConfig::default().floor_thickness);
        assert_eq!(config.max_separation_iterations, 30);
    }

    #[test]
    fn rejects_out_of_range_probabilities() {
        let config = GenerationConfig { cycle_chance: 1.5, ..GenerationConfig::default() };
        let err = config.validate(&ArchetypeCatalog::house()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("cycle_chance")));
    }

    #[test]
    fn rejects_buffer_smaller_than_a_cell() {
        let config = GenerationConfig { separation_buffer: 0.5, ..GenerationConfig::default() };
        assert!(config.validate(&ArchetypeCatalog::house()).is_err());
    }

    #[test]
    fn rejects_archetype_that_cannot_fit_the_map() {
        let config =
            GenerationConfig { map_size: Vec3::new(16.0, 0.0, 16.0), ..Default::default() };
        let err = config.validate(&ArchetypeCatalog::house()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("entrance_hall")));
    }

    #[test]
    fn rejects_door_beyond_wall_length() {
        let mut catalog = ArchetypeCatalog::house();
        catalog.regular[1].doors.push(DoorAnchor::new(DoorSide::East, 3));
        assert!(GenerationConfig::default().validate(&catalog).is_err());
    }

    #[test]
    fn single_room_maps_do_not_need_regular_archetypes() {
        let mut catalog = ArchetypeCatalog::house();
        catalog.regular.clear();
        let config = GenerationConfig { rooms_per_floor: 1, ..GenerationConfig::default() };
        config.validate(&catalog).unwrap();

        let config = GenerationConfig { rooms_per_floor: 2, ..GenerationConfig::default() };
        assert!(config.validate(&catalog).is_err());
    }

    #[test]
    fn door_local_cells_sit_outside_the_footprint() {
        assert_eq!(DoorAnchor::new(DoorSide::West, 2).local_cell(4, 5), (-1, 2));
        assert_eq!(DoorAnchor::new(DoorSide::East, 1).local_cell(4, 5), (4, 1));
        assert_eq!(DoorAnchor::new(DoorSide::South, 3).local_cell(4, 5), (3, -1));
        assert_eq!(DoorAnchor::new(DoorSide::North, 0).local_cell(4, 5), (0, 5));
    }

    #[test]
    fn catalog_loads_from_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rooms.toml");
        fs::write(
            &path,
            r#"
            [main]
            name = "foyer"
            width = 5
            depth = 5
            doors = [{ side = "north", offset = 2 }]

            [[regular]]
            name = "closet"
            width = 2
            depth = 3
            light = true
            doors = [{ side = "west", offset = 1 }]
            "#,
        )
        .unwrap();

        let catalog = ArchetypeCatalog::load(&path).unwrap();
        assert_eq!(catalog.main.name, "foyer");
        assert_eq!(catalog.main.levels, 1);
        assert_eq!(catalog.regular[0].doors[0].side, DoorSide::West);
        assert!(catalog.stairs.is_empty());
        GenerationConfig::default().validate(&catalog).unwrap();
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = GenerationConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { path: reported, .. } if reported == path));
    }
}

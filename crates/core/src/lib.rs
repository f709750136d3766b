pub mod config;
pub mod error;
pub mod mapgen;
pub mod types;

pub use config::{ArchetypeCatalog, DoorAnchor, DoorSide, GenerationConfig, RoomArchetype};
pub use error::{ConfigError, GenerationError};
pub use mapgen::{
    GenerationState, GenerationSummary, LayoutSnapshot, MapGenerator, NullSink, RecordingSink,
    RoomFootprint, SpawnSink, generate_layout,
};
pub use types::*;

//! Error types for configuration loading and generation runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::GridPos;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A corridor between two doors could not be routed through the grid. The
    /// run is aborted; retry with another seed.
    #[error("no corridor route on floor {floor} from {from:?} to {to:?}")]
    Disconnected { floor: u32, from: GridPos, to: GridPos },
}

//! Layered island terrain generation
//!
//! Re-exports modules for use by binaries and tools.

pub mod acre;
pub mod ascii;
pub mod catalog;
pub mod cliff_walk;
pub mod config;
pub mod direction;
pub mod error;
pub mod export;
pub mod floors;
pub mod generator;
pub mod islands;
pub mod leveler;
pub mod poisson;
pub mod rivers;
pub mod scatter;
pub mod slopes;
pub mod terrain;
pub mod tile;
pub mod tilemap;

pub use catalog::CliffCatalog;
pub use config::TerrainConfig;
pub use error::{GenerationError, Result};
pub use generator::{generate, Phase, TerrainGenerator};
pub use terrain::Terrain;

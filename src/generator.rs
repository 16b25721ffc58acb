//! Incremental terrain generation.
//!
//! Construction builds the acre grid, labels islands and routes rivers. After
//! that every call to [`TerrainGenerator::step`] advances the current cliff
//! walk by one placement or revert, so a viewer can watch rings being laid.
//! Once the last walk is finished the remaining passes run in one go.

use std::collections::VecDeque;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::acre::{acres_from_elevations, generate_acres, Acre};
use crate::catalog::CliffCatalog;
use crate::cliff_walk::{CliffWalker, WalkSummary};
use crate::config::TerrainConfig;
use crate::error::{GenerationError, Result};
use crate::floors::resolve_floors;
use crate::islands::{compute_cliff_flags, label_islands, needs_walk, Island};
use crate::leveler::level_terrain;
use crate::rivers::meta::compute_river_meta;
use crate::rivers::waterfalls::compose_waterfalls;
use crate::rivers::{paint_rivers, route_rivers};
use crate::scatter::{place_dirt_patches, scatter_decorations};
use crate::slopes::place_slopes;
use crate::terrain::Terrain;
use crate::tilemap::Tilemap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Islands,
    CliffWalks,
    Level,
    Floors,
    Rivers,
    Slopes,
    Scatter,
    Done,
}

pub struct TerrainGenerator {
    config: TerrainConfig,
    catalog: CliffCatalog,
    seed: u64,
    rng: ChaCha8Rng,
    terrain: Terrain,
    phase: Phase,
    /// Islands still waiting for their cliff walk, highest first.
    queue: VecDeque<u32>,
    walker: Option<CliffWalker>,
    walks: Vec<WalkSummary>,
}

impl TerrainGenerator {
    /// Start a run with randomly generated acres.
    pub fn new(config: TerrainConfig, catalog: CliffCatalog) -> Result<Self> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let acres = generate_acres(&config, &mut rng);
        Self::start(config, catalog, seed, rng, acres)
    }

    /// Start a run from fixed acre elevations, `rows[y][x]`. The grid size in
    /// `config` is replaced by the size of `rows`.
    pub fn from_elevations(mut config: TerrainConfig, catalog: CliffCatalog, rows: &[Vec<i32>]) -> Result<Self> {
        let width = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != width) {
            return Err(GenerationError::InvalidConfig("elevation rows differ in length".into()));
        }
        config.acres_x = width;
        config.acres_y = rows.len();
        config.validate()?;
        for (y, row) in rows.iter().enumerate() {
            for (x, &e) in row.iter().enumerate() {
                if e < config.min_elevation || e > config.max_elevation {
                    return Err(GenerationError::InvalidConfig(format!(
                        "acre ({}, {}) elevation {} is outside [{}, {}]",
                        x, y, e, config.min_elevation, config.max_elevation
                    )));
                }
            }
        }
        let seed = resolve_seed(config.seed);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Self::start(config, catalog, seed, rng, acres_from_elevations(rows))
    }

    fn start(
        config: TerrainConfig,
        catalog: CliffCatalog,
        seed: u64,
        rng: ChaCha8Rng,
        acres: Tilemap<Acre>,
    ) -> Result<Self> {
        info!(
            "Generating {}x{} acres ({}x{} tiles) with seed {}",
            acres.width,
            acres.height,
            acres.width * config.acre_size,
            acres.height * config.acre_size,
            seed
        );
        let terrain = Terrain::new(acres, config.acre_size);
        let mut generator = Self {
            config,
            catalog,
            seed,
            rng,
            terrain,
            phase: Phase::Islands,
            queue: VecDeque::new(),
            walker: None,
            walks: Vec::new(),
        };
        generator.run_pass()?;
        Ok(generator)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn into_terrain(self) -> Terrain {
        self.terrain
    }

    /// Summaries of the walks finished so far.
    pub fn walks(&self) -> &[WalkSummary] {
        &self.walks
    }

    pub fn current_walker(&self) -> Option<&CliffWalker> {
        self.walker.as_ref()
    }

    /// Islands still waiting for a walk.
    pub fn pending_walks(&self) -> usize {
        self.queue.len()
    }

    /// Advance by one cliff walk step, or finish the map once every walk is
    /// done. Returns `false` when there is nothing left to do.
    pub fn step(&mut self) -> Result<bool> {
        if self.phase != Phase::CliffWalks {
            if self.phase != Phase::Done {
                self.finish()?;
            }
            return Ok(false);
        }

        if self.walker.is_none() {
            let Some(id) = self.queue.pop_front() else {
                self.finish()?;
                return Ok(false);
            };
            let island = &self.terrain.islands[id as usize];
            let walker = CliffWalker::new(island, &self.terrain, &self.config, &mut self.rng)?;
            self.walker = Some(walker);
        }

        let Some(walker) = self.walker.as_mut() else {
            return Ok(true);
        };
        if walker.step(&mut self.terrain, &self.catalog, &self.config, &mut self.rng)? {
            return Ok(true);
        }

        let summary = walker.summary();
        info!(
            "Cliff walk for island {} (elevation {}) finished: {} tiles, {} reverts",
            summary.island, summary.elevation, summary.tiles, summary.reverts
        );
        for &(x, y) in &self.terrain.islands[summary.island as usize].acres {
            self.terrain.acres.get_mut(x, y).cliff_walked = true;
        }
        self.walks.push(summary);
        self.walker = None;

        if self.queue.is_empty() {
            self.finish()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Step until the map is complete.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        while self.phase != Phase::Done {
            self.run_pass()?;
        }
        info!(
            "Terrain done: {} cliff tiles, {} regions, {} slopes, {} waterfalls",
            self.terrain.cliff_count(),
            self.terrain.regions.len(),
            self.terrain.slopes.len(),
            self.terrain.waterfalls.len()
        );
        Ok(())
    }

    /// Run the pass for the current phase and move to the next one.
    fn run_pass(&mut self) -> Result<()> {
        self.phase = match self.phase {
            Phase::Islands => {
                self.prepare_islands()?;
                Phase::CliffWalks
            }
            Phase::CliffWalks => Phase::Level,
            Phase::Level => {
                self.terrain.regions = level_terrain(&mut self.terrain);
                Phase::Floors
            }
            Phase::Floors => {
                resolve_floors(&mut self.terrain);
                Phase::Rivers
            }
            Phase::Rivers => {
                self.terrain.waterfalls = compose_waterfalls(&mut self.terrain, &self.catalog);
                paint_rivers(&mut self.terrain, &self.config);
                compute_river_meta(&mut self.terrain);
                Phase::Slopes
            }
            Phase::Slopes => {
                self.terrain.slopes = place_slopes(&mut self.terrain, &self.catalog, &self.config);
                Phase::Scatter
            }
            Phase::Scatter => {
                self.terrain.decorations = scatter_decorations(&self.terrain, &self.config, &mut self.rng);
                self.terrain.dirt_patches = place_dirt_patches(&self.terrain, &self.config, &mut self.rng);
                Phase::Done
            }
            Phase::Done => Phase::Done,
        };
        debug!("Entering phase {:?}", self.phase);
        Ok(())
    }

    fn prepare_islands(&mut self) -> Result<()> {
        let terrain = &mut self.terrain;
        let beach_ring = self.config.beach_cliffs && terrain.acres.iter().any(|(_, _, a)| a.elevation > 0);

        let islands = label_islands(&mut terrain.acres);
        compute_cliff_flags(&mut terrain.acres, beach_ring)?;
        terrain.beach_ring = beach_ring;
        terrain.rivers = route_rivers(&mut terrain.acres, self.config.river_count, &mut self.rng);

        let mut order: Vec<&Island> =
            islands.iter().filter(|i| needs_walk(i, &terrain.acres, beach_ring)).collect();
        order.sort_by_key(|i| (std::cmp::Reverse(i.elevation), i.id));
        self.queue = order.iter().map(|i| i.id).collect();

        info!(
            "Found {} islands, {} need cliff walks; routed {} rivers",
            islands.len(),
            self.queue.len(),
            terrain.rivers.len()
        );
        terrain.islands = islands;
        Ok(())
    }
}

fn resolve_seed(seed: u64) -> u64 {
    if seed == 0 {
        rand::random()
    } else {
        seed
    }
}

/// Generate a complete map in one call.
pub fn generate(config: TerrainConfig, catalog: CliffCatalog) -> Result<Terrain> {
    let mut generator = TerrainGenerator::new(config, catalog)?;
    generator.run()?;
    Ok(generator.into_terrain())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_config() -> TerrainConfig {
        TerrainConfig {
            seed: 1,
            acres_x: 2,
            acres_y: 2,
            acre_size: 8,
            min_elevation: 0,
            max_elevation: 0,
            max_cliff_eat: 2,
            max_beach_eat: 2,
            river_count: 0,
            slope_length: 6,
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_flat_map_finishes_on_first_step() {
        let catalog = CliffCatalog::defaults().unwrap();
        let mut generator = TerrainGenerator::new(flat_config(), catalog).unwrap();
        assert_eq!(generator.phase(), Phase::CliffWalks);
        assert_eq!(generator.pending_walks(), 0);
        assert!(!generator.step().unwrap());
        assert!(generator.is_done());
        assert!(!generator.step().unwrap());
        assert_eq!(generator.terrain().cliff_count(), 0);
    }

    #[test]
    fn test_explicit_seed_is_kept() {
        let catalog = CliffCatalog::defaults().unwrap();
        let config = TerrainConfig { seed: 77, ..flat_config() };
        let generator = TerrainGenerator::new(config, catalog).unwrap();
        assert_eq!(generator.seed(), 77);
        assert_eq!(generator.terrain().islands.len(), 1);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let catalog = CliffCatalog::defaults().unwrap();
        let rows = vec![vec![1, 1], vec![0]];
        let config = TerrainConfig { max_elevation: 1, ..flat_config() };
        let result = TerrainGenerator::from_elevations(config, catalog, &rows);
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn test_out_of_range_elevation_is_rejected() {
        let catalog = CliffCatalog::defaults().unwrap();
        let rows = vec![vec![3], vec![0]];
        let config = TerrainConfig { max_elevation: 2, ..flat_config() };
        let result = TerrainGenerator::from_elevations(config, catalog, &rows);
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
    }
}

//! Generation parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Highest elevation the floor bitmask can address (bit 0 is elevation -1).
pub const MAX_SUPPORTED_ELEVATION: i32 = 30;

/// Every input the generator reads, with defaults tuned for a 7x6 acre island.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Random seed. 0 picks a fresh seed from the thread RNG.
    pub seed: u64,

    /// Acre grid width.
    pub acres_x: usize,
    /// Acre grid height.
    pub acres_y: usize,
    /// Tiles per acre edge.
    pub acre_size: usize,

    pub min_elevation: i32,
    pub max_elevation: i32,

    /// Closest a cliff may sit to the acre edge it guards, in tiles.
    pub min_cliff_eat: usize,
    /// Furthest a cliff may drift into its acre, in tiles.
    pub max_cliff_eat: usize,
    pub min_beach_eat: usize,
    pub max_beach_eat: usize,
    /// Chance per tile of turning while inside the eat band.
    pub cliff_turn_chance: f64,
    /// Reverts allowed per walk before the run is abandoned.
    pub max_cliff_reverts: usize,
    /// Number of texture variants a cliff pattern can pick from.
    pub max_cliff_variants: u8,
    /// Ring the elevation-0 island with beach cliffs.
    pub beach_cliffs: bool,

    pub river_count: usize,
    /// River band width in tiles.
    pub river_width: usize,

    /// Ramp footprint width (x extent) in tiles.
    pub slope_width: usize,
    /// Ramp footprint length (y extent) in tiles.
    pub slope_length: usize,

    /// Minimum spacing between decorations.
    pub decoration_spacing: f32,
    /// Candidate attempts per active point in the Poisson sampler.
    pub poisson_candidates: usize,
    /// Minimum spacing between dirt patch centers.
    pub dirt_spacing: f32,
    pub dirt_min_radius: f32,
    pub dirt_max_radius: f32,
    /// Dirt patches closer than this to a river tile are dropped.
    pub dirt_river_clearance: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            acres_x: 7,
            acres_y: 6,
            acre_size: 16,
            min_elevation: 0,
            max_elevation: 3,
            min_cliff_eat: 2,
            max_cliff_eat: 5,
            min_beach_eat: 2,
            max_beach_eat: 4,
            cliff_turn_chance: 0.3,
            max_cliff_reverts: 2000,
            max_cliff_variants: 3,
            beach_cliffs: true,
            river_count: 2,
            river_width: 4,
            slope_width: 3,
            slope_length: 8,
            decoration_spacing: 3.0,
            poisson_candidates: 30,
            dirt_spacing: 10.0,
            dirt_min_radius: 1.5,
            dirt_max_radius: 3.5,
            dirt_river_clearance: 2.0,
        }
    }
}

impl TerrainConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TerrainConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn map_width(&self) -> usize {
        self.acres_x * self.acre_size
    }

    pub fn map_height(&self) -> usize {
        self.acres_y * self.acre_size
    }

    /// Eat band for a walk at the given elevation.
    pub fn eat_range(&self, elevation: i32) -> (usize, usize) {
        if elevation <= 0 {
            (self.min_beach_eat, self.max_beach_eat)
        } else {
            (self.min_cliff_eat, self.max_cliff_eat)
        }
    }

    /// Reject configurations that cannot be satisfied instead of clamping them.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(GenerationError::InvalidConfig(msg));

        if self.acres_x == 0 || self.acres_y == 0 {
            return fail("acre grid must be at least 1x1".into());
        }
        if self.acre_size < 4 {
            return fail(format!("acre_size {} is below the minimum of 4", self.acre_size));
        }
        if self.min_elevation < 0 || self.min_elevation > self.max_elevation {
            return fail(format!(
                "elevation range [{}, {}] is empty or negative",
                self.min_elevation, self.max_elevation
            ));
        }
        if self.max_elevation > MAX_SUPPORTED_ELEVATION {
            return fail(format!(
                "max_elevation {} exceeds {}",
                self.max_elevation, MAX_SUPPORTED_ELEVATION
            ));
        }
        for (name, min, max) in [
            ("cliff", self.min_cliff_eat, self.max_cliff_eat),
            ("beach", self.min_beach_eat, self.max_beach_eat),
        ] {
            if min > max {
                return fail(format!("min_{name}_eat {min} is greater than max_{name}_eat {max}"));
            }
            // Both cliffs meeting at an acre corner need room to turn.
            if 2 * max + 2 > self.acre_size {
                return fail(format!(
                    "max_{name}_eat {max} leaves no interior in a {}-tile acre",
                    self.acre_size
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.cliff_turn_chance) {
            return fail(format!("cliff_turn_chance {} is not a probability", self.cliff_turn_chance));
        }
        if self.river_count > 0 && (self.river_width < 2 || self.river_width >= self.acre_size) {
            return fail(format!(
                "river_width {} must be in [2, {})",
                self.river_width, self.acre_size
            ));
        }
        if self.slope_width < 3 || self.slope_width > self.acre_size {
            return fail(format!("slope_width {} must be in [3, acre_size]", self.slope_width));
        }
        if self.slope_length < 3 || self.slope_length > self.acre_size {
            return fail(format!("slope_length {} must be in [3, acre_size]", self.slope_length));
        }
        if self.decoration_spacing <= 0.0 || self.dirt_spacing <= 0.0 {
            return fail("scatter spacing must be positive".into());
        }
        if self.dirt_min_radius > self.dirt_max_radius {
            return fail("dirt_min_radius is greater than dirt_max_radius".into());
        }
        Ok(())
    }
}

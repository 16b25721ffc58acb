//! Coarse acre grid and its elevation generation.

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::TerrainConfig;
use crate::tilemap::Tilemap;

/// Island index before labelling.
pub const NO_ISLAND: u32 = u32::MAX;

/// One cell of the coarse grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Acre {
    pub x: usize,
    pub y: usize,
    pub elevation: i32,
    /// Assigned once by island labelling.
    pub island: u32,

    pub has_west_cliff: bool,
    pub has_east_cliff: bool,
    pub has_south_cliff: bool,
    pub has_south_east_cliff: bool,
    pub has_south_west_cliff: bool,
    pub cliff_walked: bool,

    pub river_north: bool,
    pub river_west: bool,
    pub river_east: bool,
    pub river_south: bool,
    /// The western river leaves this acre (otherwise it enters).
    pub river_west_outflow: bool,
    /// The eastern river leaves this acre (otherwise it enters).
    pub river_east_outflow: bool,

    /// Waterfall tiles recorded by cliff walks, keyed by walk elevation and
    /// the direction the water drops.
    pub waterfalls: BTreeMap<(i32, (i32, i32)), Vec<usize>>,
}

impl Acre {
    pub fn new(x: usize, y: usize, elevation: i32) -> Self {
        Self {
            x,
            y,
            elevation,
            island: NO_ISLAND,
            has_west_cliff: false,
            has_east_cliff: false,
            has_south_cliff: false,
            has_south_east_cliff: false,
            has_south_west_cliff: false,
            cliff_walked: false,
            river_north: false,
            river_west: false,
            river_east: false,
            river_south: false,
            river_west_outflow: false,
            river_east_outflow: false,
            waterfalls: BTreeMap::new(),
        }
    }

    pub fn has_river(&self) -> bool {
        self.river_north || self.river_west || self.river_east || self.river_south
    }

    pub fn has_any_cliff(&self) -> bool {
        self.has_west_cliff || self.has_east_cliff || self.has_south_cliff
    }
}

/// Generate acre elevations.
///
/// The top two rows sit at the maximum elevation and the bottom row at the
/// minimum. Every row in between starts as a copy of the row above and has one
/// random contiguous span lowered by a level, so elevation never rises going
/// south.
pub fn generate_acres(config: &TerrainConfig, rng: &mut ChaCha8Rng) -> Tilemap<Acre> {
    let w = config.acres_x;
    let h = config.acres_y;
    let max = config.max_elevation;
    let min = config.min_elevation;

    let mut rows: Vec<Vec<i32>> = Vec::with_capacity(h);
    for y in 0..h {
        let row = if y < 2 {
            vec![max; w]
        } else {
            let mut row = rows[y - 1].clone();
            let start = rng.gen_range(0..w);
            let end = rng.gen_range(start..w);
            for value in row.iter_mut().take(end + 1).skip(start) {
                *value = (*value - 1).max(min);
            }
            row
        };
        rows.push(row);
    }
    if h > 0 {
        // The southern shore is always at the bottom of the range, even on
        // maps too short for the two fixed top rows.
        rows[h - 1] = vec![min; w];
    }

    Tilemap::from_fn(w, h, |x, y| Acre::new(x, y, rows[y][x]))
}

/// Build an acre grid from explicit elevations, row-major (`rows[y][x]`).
pub fn acres_from_elevations(rows: &[Vec<i32>]) -> Tilemap<Acre> {
    let h = rows.len();
    let w = rows.first().map_or(0, |r| r.len());
    Tilemap::from_fn(w, h, |x, y| Acre::new(x, y, rows[y][x]))
}

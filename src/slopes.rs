//! Ramp placement between vertically adjacent islands.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::catalog::CliffCatalog;
use crate::config::TerrainConfig;
use crate::terrain::Terrain;

/// A carved ramp. `x`, `y` is the top-left tile of the footprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slope {
    pub island: u32,
    pub lower_island: u32,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub length: usize,
}

/// Place at most one ramp per pair of islands that meet one level apart
/// along a south cliff, working from the highest layer down.
pub fn place_slopes(terrain: &mut Terrain, catalog: &CliffCatalog, config: &TerrainConfig) -> Vec<Slope> {
    let mut layers: Vec<i32> = terrain.acres.iter().map(|(_, _, a)| a.elevation).collect();
    layers.sort_unstable();
    layers.dedup();

    let mut slopes = Vec::new();
    let mut linked: BTreeSet<(u32, u32)> = BTreeSet::new();
    let mut missed: BTreeSet<(u32, u32)> = BTreeSet::new();

    for &elevation in layers.iter().rev() {
        for ay in 0..terrain.acres.height.saturating_sub(1) {
            for ax in 0..terrain.acres.width {
                let acre = terrain.acres.get(ax, ay);
                let south = terrain.acres.get(ax, ay + 1);
                if acre.elevation != elevation || south.elevation != elevation - 1 {
                    continue;
                }
                let pair = (acre.island, south.island);
                if linked.contains(&pair) {
                    continue;
                }
                match place_slope(terrain, catalog, config, ax, ay) {
                    Some(slope) => {
                        linked.insert(pair);
                        missed.remove(&pair);
                        slopes.push(slope);
                    }
                    None => {
                        missed.insert(pair);
                    }
                }
            }
        }
    }

    for (upper, lower) in &missed {
        debug!("No slope footprint between islands {} and {}", upper, lower);
    }
    info!("Placed {} slopes", slopes.len());
    slopes
}

/// Carve a ramp down the south edge of acre `(ax, ay)`. Returns `None` when
/// no footprint fits.
pub fn place_slope(
    terrain: &mut Terrain,
    catalog: &CliffCatalog,
    config: &TerrainConfig,
    ax: usize,
    ay: usize,
) -> Option<Slope> {
    let acre = terrain.acres.get(ax, ay);
    let elevation = acre.elevation;
    let island = acre.island;
    let lower_island = terrain.acres.get(ax, ay + 1).island;
    let (x0, y0, x1, y1) = terrain.acre_bounds(ax, ay);
    let width = config.slope_width as i32;
    let length = config.slope_length as i32;
    let center = (x0 + x1 + 1) as f32 / 2.0;

    let mut best: Option<(f32, i32, i32)> = None;
    for top in y0..=y1 {
        let bottom = top + length - 1;
        if bottom >= terrain.height() as i32 {
            break;
        }
        for left in x0..=(x1 - width + 1) {
            if !footprint_fits(terrain, left, top, width, length, elevation) {
                continue;
            }
            let distance = (left as f32 + width as f32 / 2.0 - center).abs();
            if best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, left, top));
            }
        }
    }
    let (_, left, top) = best?;
    carve(terrain, catalog, left, top, width, length, elevation);
    debug!(
        "Slope from island {} to {} at ({}, {})",
        island, lower_island, left, top
    );
    Some(Slope {
        island,
        lower_island,
        x: left as usize,
        y: top as usize,
        width: width as usize,
        length: length as usize,
    })
}

fn footprint_fits(terrain: &Terrain, left: i32, top: i32, width: i32, length: i32, elevation: i32) -> bool {
    let bottom = top + length - 1;
    for y in top..=bottom {
        for x in left..left + width {
            let Some(idx) = terrain.tiles.checked_index(x, y) else {
                return false;
            };
            let tile = terrain.tile(idx);
            if tile.slope || tile.is_river() || tile.waterfall {
                return false;
            }
            if y == top && !(tile.is_flat() && tile.elevation == elevation) {
                return false;
            }
            if y == bottom && !(tile.is_flat() && tile.elevation == elevation - 1) {
                return false;
            }
        }
    }
    true
}

fn carve(
    terrain: &mut Terrain,
    catalog: &CliffCatalog,
    left: i32,
    top: i32,
    width: i32,
    length: i32,
    elevation: i32,
) {
    let right = left + width - 1;
    let first = top + 1;
    let last = top + length - 2;
    let half = (first + last) / 2;
    let fallback = catalog.slope_fallback();

    // Side walls take their shape from the cliff the ramp cuts through.
    let edge_pattern = |terrain: &Terrain, x: i32| {
        (first..=last)
            .filter_map(|y| terrain.tiles.checked_index(x, y))
            .find_map(|idx| terrain.tile(idx).pattern.filter(|_| terrain.tile(idx).cliff))
    };
    let left_source = edge_pattern(terrain, left);
    let right_source = edge_pattern(terrain, right);

    for y in first..=last {
        for x in left..=right {
            let idx = terrain.tiles.index(x as usize, y as usize);
            if terrain.tile(idx).cliff {
                terrain.unlink_all(idx);
            }
            let source = if x == left { left_source } else { right_source };
            let t = terrain.tile_mut(idx);
            t.clear_cliff();
            t.slope = true;
            t.slope_edge1 = x == left;
            t.slope_edge2 = x == right;
            t.slope_higher = y <= half;
            t.slope_lower = y > half;
            t.slope_low_end = y == last;
            t.elevation = if y <= half { elevation } else { elevation - 1 };
            if x == left || x == right {
                let wall = if y == first {
                    source.and_then(|p| catalog.get(p).slope_higher)
                } else if y == last {
                    source.and_then(|p| catalog.get(p).slope_lower)
                } else {
                    None
                };
                t.slope_wall = if y == first || y == last { Some(wall.unwrap_or(fallback)) } else { None };
            }
        }
    }
}

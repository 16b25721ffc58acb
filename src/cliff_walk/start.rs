//! Choosing where a cliff walk begins.
//!
//! Islands are walked highest first, so the ground behind a new walk's start
//! is often already fenced by a higher ring. In that case the walk starts on
//! that ring's tile instead of on open ground, and the two rings share it.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::TerrainConfig;
use crate::direction::Dir;
use crate::error::{GenerationError, Result};
use crate::islands::Island;
use crate::terrain::Terrain;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Start {
    pub x: i32,
    pub y: i32,
    pub forward: Dir,
    pub lane: i32,
    /// Existing cliff tile the walk opens on.
    pub merge: Option<usize>,
    /// Acre the first straight run is counted from.
    pub acre: usize,
}

/// Pick the first tile and heading of a walk around `island`.
///
/// The walk opens on the island's leftmost column: at the top of its west
/// cliff heading south when the column's bottom acre has one, otherwise at the
/// bottom acre heading east.
pub fn select_start(
    island: &Island,
    terrain: &Terrain,
    config: &TerrainConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Start> {
    let Some(c0) = island.acres.iter().map(|&(x, _)| x).min() else {
        return Err(GenerationError::Consistency {
            x: 0,
            y: 0,
            message: format!("island {} has no acres", island.id),
        });
    };
    let rows: Vec<usize> = island
        .acres
        .iter()
        .filter(|&&(x, _)| x == c0)
        .map(|&(_, y)| y)
        .collect();
    let top = rows.iter().copied().min().unwrap_or(0);
    let bottom = rows.iter().copied().max().unwrap_or(0);

    let (min, max) = config.eat_range(island.elevation);
    let d = rng.gen_range(min..=max) as i32;
    let elevation = island.elevation;

    if terrain.acres.get(c0, bottom).has_west_cliff {
        let row = (top..=bottom)
            .find(|&r| terrain.acres.get(c0, r).has_west_cliff)
            .unwrap_or(bottom);
        let (x0, y0, _, _) = terrain.acre_bounds(c0, row);
        let plain = Start {
            x: x0 + d,
            y: y0,
            forward: Dir::South,
            lane: x0,
            merge: None,
            acre: terrain.acres.index(c0, row),
        };
        if row == 0 {
            return Ok(plain);
        }

        let north = terrain.acres.get(c0, row - 1);
        if north.elevation == elevation && c0 > 0 {
            // The west cliff begins below our own acre: pick up the higher
            // ring where it turns north around the north-west acre.
            let (_, _, _, ny1) = terrain.acre_bounds(c0 - 1, row - 1);
            if let Some(tile) = easternmost_cliff(terrain, island.id, c0 - 1, row - 1, config) {
                let (tx, ty) = position(terrain, tile);
                return Ok(Start {
                    x: tx,
                    y: ty,
                    forward: Dir::East,
                    lane: ny1,
                    merge: Some(tile),
                    acre: terrain.tile(tile).acre,
                });
            }
        } else if north.elevation > elevation {
            if let Some(tile) = cliff_above(terrain, island.id, c0, row - 1, x0 + d, config) {
                let (tx, ty) = position(terrain, tile);
                return Ok(Start {
                    x: tx,
                    y: ty,
                    forward: Dir::South,
                    lane: x0,
                    merge: Some(tile),
                    acre: terrain.tile(tile).acre,
                });
            }
        }
        return Ok(plain);
    }

    let (x0, _, _, y1) = terrain.acre_bounds(c0, bottom);
    if c0 > 0 && terrain.acres.get(c0 - 1, bottom).elevation > elevation {
        if let Some(tile) = easternmost_cliff(terrain, island.id, c0 - 1, bottom, config) {
            let (tx, ty) = position(terrain, tile);
            return Ok(Start {
                x: tx,
                y: ty,
                forward: Dir::East,
                lane: y1,
                merge: Some(tile),
                acre: terrain.tile(tile).acre,
            });
        }
    }
    Ok(Start {
        x: x0,
        y: y1 - d,
        forward: Dir::East,
        lane: y1,
        merge: None,
        acre: terrain.acres.index(c0, bottom),
    })
}

fn position(terrain: &Terrain, tile: usize) -> (i32, i32) {
    let (x, y) = terrain.tiles.position(tile);
    (x as i32, y as i32)
}

/// Rows near the bottom of an acre that another ring may run along.
fn bottom_rows(terrain: &Terrain, ax: usize, ay: usize, config: &TerrainConfig) -> (i32, i32) {
    let (_, y0, _, y1) = terrain.acre_bounds(ax, ay);
    let reach = config.max_cliff_eat.max(config.max_beach_eat) as i32;
    ((y1 - reach).max(y0), y1)
}

fn is_foreign_cliff(terrain: &Terrain, island: u32, x: i32, y: i32) -> Option<usize> {
    let idx = terrain.tiles.checked_index(x, y)?;
    let tile = terrain.tile(idx);
    (tile.cliff && tile.cliff_island != Some(island)).then_some(idx)
}

/// Easternmost foreign cliff tile in the bottom rows of an acre, lowest first
/// on ties. This is where a ring turns north up the acre's east side.
fn easternmost_cliff(
    terrain: &Terrain,
    island: u32,
    ax: usize,
    ay: usize,
    config: &TerrainConfig,
) -> Option<usize> {
    let (x0, _, x1, _) = terrain.acre_bounds(ax, ay);
    let (ry0, ry1) = bottom_rows(terrain, ax, ay, config);
    for x in (x0..=x1).rev() {
        for y in (ry0..=ry1).rev() {
            if let Some(idx) = is_foreign_cliff(terrain, island, x, y) {
                return Some(idx);
            }
        }
    }
    None
}

/// Foreign cliff tile in the bottom rows of the acre above the start, at or
/// east of column `from_x`, lowest first within a column.
fn cliff_above(
    terrain: &Terrain,
    island: u32,
    ax: usize,
    ay: usize,
    from_x: i32,
    config: &TerrainConfig,
) -> Option<usize> {
    let (_, _, x1, _) = terrain.acre_bounds(ax, ay);
    let (ry0, ry1) = bottom_rows(terrain, ax, ay, config);
    for x in from_x..=x1 {
        for y in (ry0..=ry1).rev() {
            if let Some(idx) = is_foreign_cliff(terrain, island, x, y) {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;
    use crate::islands::{compute_cliff_flags, label_islands};
    use rand::SeedableRng;

    fn setup(rows: &[Vec<i32>], beach: bool) -> (Terrain, TerrainConfig) {
        let config = TerrainConfig {
            acre_size: 8,
            min_cliff_eat: 1,
            max_cliff_eat: 2,
            min_beach_eat: 1,
            max_beach_eat: 2,
            ..TerrainConfig::default()
        };
        let mut acres = acres_from_elevations(rows);
        let islands = label_islands(&mut acres);
        compute_cliff_flags(&mut acres, beach).unwrap();
        let mut terrain = Terrain::new(acres, config.acre_size);
        terrain.islands = islands;
        (terrain, config)
    }

    #[test]
    fn test_island_without_west_cliff_starts_east_on_bottom_acre() {
        let (terrain, config) = setup(&[vec![1], vec![0]], false);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let start = select_start(&terrain.islands[0], &terrain, &config, &mut rng).unwrap();
        assert_eq!(start.forward, Dir::East);
        assert_eq!(start.x, 0);
        assert!((5..=6).contains(&start.y));
        assert_eq!(start.lane, 7);
        assert!(start.merge.is_none());
    }

    #[test]
    fn test_beach_walk_starts_on_higher_ring() {
        let (mut terrain, config) = setup(&[vec![1], vec![0]], true);
        // A stand-in for the higher ring along the bottom of the upper acre.
        for x in 0..8 {
            let idx = terrain.tiles.index(x, 6);
            let tile = terrain.tile_mut(idx);
            tile.cliff = true;
            tile.cliff_island = Some(0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let start = select_start(&terrain.islands[1], &terrain, &config, &mut rng).unwrap();
        assert_eq!(start.forward, Dir::South);
        assert_eq!(start.y, 6);
        assert!((1..=2).contains(&start.x));
        assert_eq!(start.merge, Some(terrain.tiles.index(start.x as usize, 6)));
    }
}

//! Flat-region leveling.
//!
//! After the cliff walks, tiles between rings still carry their acre's
//! elevation, which is wrong wherever a ring cut into an acre. Each 4-connected
//! region of non-cliff tiles is flattened to the lowest elevation it touches.

use std::collections::VecDeque;

use log::info;

use crate::terrain::Terrain;

/// A flat region found by the leveler.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: u32,
    pub elevation: i32,
    /// Touches the map edge at or below sea level.
    pub beach: bool,
    pub tiles: usize,
}

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Level every non-cliff region and record floors on the cliffs around it.
///
/// Off-map neighbors count as elevation -1 for tiles in sea-level acres once
/// the beach ring has been laid, which is what makes beaches slope to the sea.
pub fn level_terrain(terrain: &mut Terrain) -> Vec<Region> {
    let len = terrain.tiles.len();
    let mut stamp = vec![u32::MAX; len];
    let mut regions = Vec::new();

    for seed in 0..len {
        let tile = terrain.tile(seed);
        if tile.cliff || tile.leveled || stamp[seed] != u32::MAX {
            continue;
        }
        let id = regions.len() as u32;
        let mut members = Vec::new();
        let mut border = Vec::new();
        let mut min_elevation = tile.elevation;
        let mut touches_edge = false;

        let mut queue = VecDeque::new();
        stamp[seed] = id;
        queue.push_back(seed);

        while let Some(idx) = queue.pop_front() {
            members.push(idx);
            let (x, y) = terrain.tiles.position(idx);
            let here = terrain.tile(idx);
            min_elevation = min_elevation.min(here.elevation);

            for (dx, dy) in DIRS {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                let Some(n) = terrain.tiles.checked_index(nx, ny) else {
                    touches_edge = true;
                    if terrain.beach_ring && terrain.acre_of(idx).elevation == 0 {
                        min_elevation = min_elevation.min(-1);
                    }
                    continue;
                };
                if stamp[n] == id {
                    continue;
                }
                let neighbor = terrain.tile(n);
                // Cliffs bound the region but their level still counts, which
                // also settles a lone tile boxed in by cliffs.
                if neighbor.cliff {
                    min_elevation = min_elevation.min(neighbor.elevation);
                    stamp[n] = id;
                    border.push(n);
                } else if !neighbor.leveled {
                    stamp[n] = id;
                    queue.push_back(n);
                }
            }
        }

        let beach = touches_edge && min_elevation <= 0;
        for &idx in &members {
            let t = terrain.tile_mut(idx);
            t.elevation = min_elevation;
            t.leveled = true;
            t.beach = beach;
            t.region = Some(id);
        }
        for &idx in &border {
            let t = terrain.tile_mut(idx);
            t.add_possible_floor(min_elevation);
            t.beach_cliff |= beach;
        }
        regions.push(Region { id, elevation: min_elevation, beach, tiles: members.len() });
    }

    info!(
        "Leveled {} regions ({} beaches)",
        regions.len(),
        regions.iter().filter(|r| r.beach).count()
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;

    fn wall(terrain: &mut Terrain, y: usize, elevation: i32) {
        for x in 0..terrain.width() {
            let idx = terrain.tiles.index(x, y);
            let t = terrain.tile_mut(idx);
            t.cliff = true;
            t.elevation = elevation;
        }
    }

    #[test]
    fn test_region_takes_lowest_elevation() {
        // The wall sits inside the upper acre, so the strip below it mixes
        // elevation-2 and elevation-1 tiles.
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![2], vec![1]]), 4);
        wall(&mut terrain, 2, 2);
        let regions = level_terrain(&mut terrain);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].elevation, 2);
        assert_eq!(regions[1].elevation, 1);
        for x in 0..4 {
            assert_eq!(terrain.tiles.get(x, 3).elevation, 1);
            assert_eq!(terrain.tiles.get(x, 3).region, Some(1));
            assert!(terrain.tiles.get(x, 2).has_possible_floor(1));
            assert!(terrain.tiles.get(x, 2).has_possible_floor(2));
        }
    }

    #[test]
    fn test_sea_level_edge_makes_beach() {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1], vec![0]]), 4);
        terrain.beach_ring = true;
        wall(&mut terrain, 3, 1);
        let regions = level_terrain(&mut terrain);
        let low = &regions[1];
        assert!(low.beach);
        assert_eq!(low.elevation, -1);
        assert!(terrain.tiles.get(0, 5).beach);
        assert!(terrain.tiles.get(0, 3).beach_cliff);
        assert!(!regions[0].beach);
    }

    #[test]
    fn test_lone_tile_between_cliffs() {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![3]]), 4);
        for (x, y) in [(1, 0), (0, 1), (2, 1), (1, 2)] {
            let idx = terrain.tiles.index(x, y);
            let t = terrain.tile_mut(idx);
            t.cliff = true;
            t.elevation = 2;
        }
        level_terrain(&mut terrain);
        let lone = terrain.tiles.get(1, 1);
        assert_eq!(lone.elevation, 2);
        assert_ne!(lone.region, terrain.tiles.get(3, 3).region);
    }
}

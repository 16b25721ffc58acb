//! Turn the waterfall tiles flagged by the cliff walks into drop spans.

use log::{debug, info};

use crate::catalog::{CliffCatalog, RuleRef};
use crate::terrain::Terrain;

/// One continuous waterfall where a river leaves an acre over a cliff.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterfallSpan {
    pub acre: usize,
    /// Elevation of the walk that laid the cliff.
    pub elevation: i32,
    /// Level the water lands on.
    pub floor: i32,
    pub first: usize,
    pub last: usize,
    /// Direction the water drops.
    pub direction: (i32, i32),
    /// The cliff pattern at each end stops halfway across its tile, so the
    /// drop geometry has to be trimmed there.
    pub first_ends_in_middle: bool,
    pub last_ends_in_middle: bool,
}

/// Build spans from every acre's waterfall lists, one per walk elevation
/// and drop direction.
///
/// All span tiles become waterfall and river transition tiles. Inner tiles
/// lose their cliff so the river can be painted through them; the end tiles
/// keep theirs and anchor the drop on either side. The tile each span drops
/// onto is marked as a transition too.
pub fn compose_waterfalls(terrain: &mut Terrain, catalog: &CliffCatalog) -> Vec<WaterfallSpan> {
    let mut spans = Vec::new();

    for acre_idx in 0..terrain.acres.len() {
        let lists: Vec<((i32, (i32, i32)), Vec<usize>)> = terrain
            .acres
            .at(acre_idx)
            .waterfalls
            .iter()
            .map(|(&key, tiles)| (key, tiles.clone()))
            .collect();

        for ((elevation, direction), mut tiles) in lists {
            if tiles.is_empty() {
                continue;
            }
            // Lay the span out across the flow.
            if direction.0 != 0 {
                tiles.sort_by_key(|&t| (terrain.tile(t).y, terrain.tile(t).x));
            } else {
                tiles.sort_by_key(|&t| (terrain.tile(t).x, terrain.tile(t).y));
            }
            tiles.dedup();
            let (first, last) = (tiles[0], tiles[tiles.len() - 1]);

            let ends = |t: usize| {
                let tile = terrain.tile(t);
                tile.pattern
                    .map(|pattern| catalog.rule(RuleRef { pattern, rule: tile.cliff_rule }).ends_in_middle)
                    .unwrap_or(false)
            };
            let first_ends_in_middle = ends(first);
            let last_ends_in_middle = ends(last);
            let floor = terrain.tile(first).floor;

            for (i, &t) in tiles.iter().enumerate() {
                let inner = i > 0 && i + 1 < tiles.len();
                if inner {
                    terrain.unlink_all(t);
                }
                let tile = terrain.tile_mut(t);
                tile.waterfall = true;
                tile.river_transition = true;
                tile.river_dir = direction;
                if inner {
                    tile.cliff = false;
                }
                let (x, y) = (tile.x as i32 + direction.0, tile.y as i32 + direction.1);
                if let Some(below) = terrain.tiles.checked_index(x, y) {
                    terrain.tile_mut(below).river_transition = true;
                }
            }

            debug!(
                "Waterfall in acre {} at elevation {}: {} tiles dropping {:?}",
                acre_idx,
                elevation,
                tiles.len(),
                direction
            );
            spans.push(WaterfallSpan {
                acre: acre_idx,
                elevation,
                floor,
                first,
                last,
                direction,
                first_ends_in_middle,
                last_ends_in_middle,
            });
        }
    }

    info!("Composed {} waterfalls", spans.len());
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;

    #[test]
    fn test_span_opens_inner_tiles() {
        let catalog = CliffCatalog::defaults().unwrap();
        let wall_e = catalog.find("wall_e").unwrap();
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1], vec![0]]), 8);
        let row: Vec<usize> = (2..6).map(|x| terrain.tiles.index(x, 6)).collect();
        for &t in &row {
            let tile = terrain.tile_mut(t);
            tile.cliff = true;
            tile.pattern = Some(wall_e);
            tile.floor = 0;
        }
        for pair in row.windows(2) {
            terrain.link(pair[0], pair[1]);
        }
        let acre = terrain.acres.get_mut(0, 0);
        // Recorded out of order, as a reverted walk may leave them.
        acre.waterfalls.insert((1, (0, 1)), vec![row[2], row[0], row[3], row[1]]);

        let spans = compose_waterfalls(&mut terrain, &catalog);
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!((span.first, span.last), (row[0], row[3]));
        assert_eq!(span.floor, 0);
        assert!(!span.first_ends_in_middle);

        assert!(terrain.tile(row[0]).cliff);
        assert!(terrain.tile(row[3]).cliff);
        assert!(!terrain.tile(row[1]).cliff);
        assert!(terrain.tile(row[1]).connected_cliffs.is_empty());
        assert!(!terrain.tile(row[0]).connected_cliffs.contains(&row[1]));
        for &t in &row {
            assert!(terrain.tile(t).waterfall);
        }
        assert!(terrain.tiles.get(3, 7).river_transition);
    }

    #[test]
    fn test_crossings_with_different_directions_split() {
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1], vec![0]]), 8);
        let across: Vec<usize> = (2..5).map(|x| terrain.tiles.index(x, 6)).collect();
        let down: Vec<usize> = (2..5).map(|y| terrain.tiles.index(6, y)).collect();
        for &t in across.iter().chain(&down) {
            terrain.tile_mut(t).cliff = true;
        }
        let acre = terrain.acres.get_mut(0, 0);
        acre.waterfalls.insert((1, (0, 1)), across.clone());
        acre.waterfalls.insert((1, (1, 0)), down.clone());

        let spans = compose_waterfalls(&mut terrain, &catalog);
        assert_eq!(spans.len(), 2);
        let south = spans.iter().find(|s| s.direction == (0, 1)).unwrap();
        assert_eq!((south.first, south.last), (across[0], across[2]));
        let east = spans.iter().find(|s| s.direction == (1, 0)).unwrap();
        assert_eq!((east.first, east.last), (down[0], down[2]));
        assert_eq!(terrain.tile(down[1]).river_dir, (1, 0));
        assert!(!terrain.tile(across[1]).cliff);
    }

    #[test]
    fn test_empty_lists_are_skipped() {
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1]]), 8);
        terrain.acres.get_mut(0, 0).waterfalls.insert((1, (0, 1)), Vec::new());
        assert!(compose_waterfalls(&mut terrain, &catalog).is_empty());
        assert!(terrain.tiles.iter().all(|(_, _, t)| !t.waterfall));
    }
}

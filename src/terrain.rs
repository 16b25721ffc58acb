//! The shared terrain arena: acre and tile grids addressed by index.
//!
//! Back-references (tile to acre, cliff to cliff) are stored as indices so the
//! cliff walker's undo log never has to reason about aliasing.

use crate::acre::Acre;
use crate::islands::Island;
use crate::leveler::Region;
use crate::rivers::waterfalls::WaterfallSpan;
use crate::rivers::RiverPath;
use crate::scatter::{Decoration, DirtPatch};
use crate::slopes::Slope;
use crate::tile::Tile;
use crate::tilemap::Tilemap;

#[derive(Clone, Debug)]
pub struct Terrain {
    pub acre_size: usize,
    pub acres: Tilemap<Acre>,
    pub tiles: Tilemap<Tile>,
    pub islands: Vec<Island>,
    /// The elevation-0 island has been ringed by beach cliffs, so the map edge
    /// next to it counts as lower ground.
    pub beach_ring: bool,
    pub regions: Vec<Region>,
    pub rivers: Vec<RiverPath>,
    pub waterfalls: Vec<WaterfallSpan>,
    pub slopes: Vec<Slope>,
    pub decorations: Vec<Decoration>,
    pub dirt_patches: Vec<DirtPatch>,
}

impl Terrain {
    /// Expand an acre grid into tiles, each inheriting its acre's elevation.
    pub fn new(acres: Tilemap<Acre>, acre_size: usize) -> Self {
        let width = acres.width * acre_size;
        let height = acres.height * acre_size;
        let tiles = Tilemap::from_fn(width, height, |x, y| {
            let acre_idx = acres.index(x / acre_size, y / acre_size);
            Tile::new(x, y, acre_idx, acres.at(acre_idx).elevation)
        });
        Self {
            acre_size,
            acres,
            tiles,
            islands: Vec::new(),
            beach_ring: false,
            regions: Vec::new(),
            rivers: Vec::new(),
            waterfalls: Vec::new(),
            slopes: Vec::new(),
            decorations: Vec::new(),
            dirt_patches: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn tile(&self, idx: usize) -> &Tile {
        self.tiles.at(idx)
    }

    pub fn tile_mut(&mut self, idx: usize) -> &mut Tile {
        self.tiles.at_mut(idx)
    }

    /// Acre owning the tile at a signed position, `None` off the map.
    pub fn acre_at_tile(&self, x: i32, y: i32) -> Option<&Acre> {
        let idx = self.tiles.checked_index(x, y)?;
        Some(self.acres.at(self.tiles.at(idx).acre))
    }

    pub fn acre_of(&self, tile: usize) -> &Acre {
        self.acres.at(self.tiles.at(tile).acre)
    }

    /// Tile bounds `(x0, y0, x1, y1)` of an acre, inclusive.
    pub fn acre_bounds(&self, ax: usize, ay: usize) -> (i32, i32, i32, i32) {
        let s = self.acre_size as i32;
        let x0 = ax as i32 * s;
        let y0 = ay as i32 * s;
        (x0, y0, x0 + s - 1, y0 + s - 1)
    }

    /// Link two cliff tiles both ways.
    pub fn link(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        if !self.tiles.at(a).connected_cliffs.contains(&b) {
            self.tiles.at_mut(a).connected_cliffs.push(b);
        }
        if !self.tiles.at(b).connected_cliffs.contains(&a) {
            self.tiles.at_mut(b).connected_cliffs.push(a);
        }
    }

    /// Remove a link both ways.
    pub fn unlink(&mut self, a: usize, b: usize) {
        self.tiles.at_mut(a).connected_cliffs.retain(|&t| t != b);
        self.tiles.at_mut(b).connected_cliffs.retain(|&t| t != a);
    }

    /// Remove every link touching `tile`.
    pub fn unlink_all(&mut self, tile: usize) {
        let links = std::mem::take(&mut self.tiles.at_mut(tile).connected_cliffs);
        for other in links {
            self.tiles.at_mut(other).connected_cliffs.retain(|&t| t != tile);
        }
    }

    pub fn cliff_count(&self) -> usize {
        self.tiles.iter().filter(|(_, _, t)| t.cliff).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;

    #[test]
    fn test_tiles_inherit_acre_elevation() {
        let terrain = Terrain::new(acres_from_elevations(&[vec![2, 1], vec![0, 0]]), 4);
        assert_eq!(terrain.width(), 8);
        assert_eq!(terrain.tiles.get(5, 1).elevation, 1);
        assert_eq!(terrain.acre_at_tile(3, 7).map(|a| a.elevation), Some(0));
        assert!(terrain.acre_at_tile(8, 0).is_none());
        assert_eq!(terrain.acre_bounds(1, 1), (4, 4, 7, 7));
    }

    #[test]
    fn test_links_are_symmetric() {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1]]), 4);
        terrain.link(0, 1);
        terrain.link(1, 0);
        terrain.link(1, 2);
        assert_eq!(terrain.tile(1).connected_cliffs, vec![0, 2]);
        terrain.unlink_all(1);
        assert!(terrain.tile(0).connected_cliffs.is_empty());
        assert!(terrain.tile(2).connected_cliffs.is_empty());
    }
}

//! Fine-grid tile state.

use crate::catalog::PatternId;

/// A second cliff pattern stacked on a tile where two walks met.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeCliff {
    pub elevation: i32,
    pub pattern: PatternId,
}

/// One cell of the fine grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    /// Index of the owning acre in the acre grid.
    pub acre: usize,
    pub elevation: i32,
    /// Elevation of the surface a cliff tile stands on. Only meaningful once
    /// `floor_resolved` is set.
    pub floor: i32,
    pub floor_resolved: bool,

    pub cliff: bool,
    pub beach_cliff: bool,
    pub merge_cliff: bool,
    /// Island whose walk placed the cliff.
    pub cliff_island: Option<u32>,
    pub pattern: Option<PatternId>,
    /// Rule of `pattern` that placed this tile.
    pub cliff_rule: usize,
    pub cliff_variant: u8,
    /// The walk changed direction on this tile.
    pub cliff_corner: bool,
    pub merge_cliffs: Vec<MergeCliff>,
    /// Topologically adjacent cliff tiles, always symmetric.
    pub connected_cliffs: Vec<usize>,
    /// Bit `e + 1` is set when a flat region at elevation `e` borders this tile.
    pub possible_floors: u32,

    pub slope: bool,
    pub slope_edge1: bool,
    pub slope_edge2: bool,
    pub slope_higher: bool,
    pub slope_lower: bool,
    pub slope_low_end: bool,
    /// Ramp wall pattern on the ends of a slope's edge columns.
    pub slope_wall: Option<PatternId>,

    pub river: bool,
    pub river_edge: bool,
    pub river_transition: bool,
    pub waterfall: bool,
    /// Flow direction for river tiles, outward normal for river edges.
    pub river_dir: (i32, i32),
    /// Steps from a river tile to the nearest tile outside the water.
    pub river_bank_distance: u32,
    pub river_centerline_distance: f32,
    pub river_value: f32,
    /// Smoothed river value at the NW, NE, SW, SE corners.
    pub river_corners: [f32; 4],

    pub beach: bool,
    pub leveled: bool,
    /// Flat region the leveler assigned this tile to.
    pub region: Option<u32>,

    /// Reserved for the animation collaborator.
    pub modified: bool,
}

impl Tile {
    pub fn new(x: usize, y: usize, acre: usize, elevation: i32) -> Self {
        Self {
            x,
            y,
            acre,
            elevation,
            floor: elevation,
            floor_resolved: false,
            cliff: false,
            beach_cliff: false,
            merge_cliff: false,
            cliff_island: None,
            pattern: None,
            cliff_rule: 0,
            cliff_variant: 0,
            cliff_corner: false,
            merge_cliffs: Vec::new(),
            connected_cliffs: Vec::new(),
            possible_floors: 0,
            slope: false,
            slope_edge1: false,
            slope_edge2: false,
            slope_higher: false,
            slope_lower: false,
            slope_low_end: false,
            slope_wall: None,
            river: false,
            river_edge: false,
            river_transition: false,
            waterfall: false,
            river_dir: (0, 0),
            river_bank_distance: 0,
            river_centerline_distance: 0.0,
            river_value: 0.0,
            river_corners: [0.0; 4],
            beach: false,
            leveled: false,
            region: None,
            modified: false,
        }
    }

    /// Elevation a cliff is measured from: the lowest of its stacked patterns.
    pub fn effective_elevation(&self) -> i32 {
        self.merge_cliffs
            .iter()
            .map(|m| m.elevation)
            .fold(self.elevation, i32::min)
    }

    pub fn is_river(&self) -> bool {
        self.river || self.river_edge
    }

    /// Flat ground: not part of any cliff, slope or river.
    pub fn is_flat(&self) -> bool {
        !self.cliff && !self.slope && !self.is_river() && !self.waterfall
    }

    pub fn add_possible_floor(&mut self, elevation: i32) {
        if elevation >= -1 {
            self.possible_floors |= 1 << (elevation + 1);
        }
    }

    pub fn has_possible_floor(&self, elevation: i32) -> bool {
        elevation >= -1 && self.possible_floors & (1 << (elevation + 1)) != 0
    }

    /// Lowest recorded floor strictly below `limit`.
    pub fn lowest_floor_below(&self, limit: i32) -> Option<i32> {
        (-1..limit).find(|&e| self.has_possible_floor(e))
    }

    /// Drop all cliff state, as if no walk had touched the tile.
    pub fn clear_cliff(&mut self) {
        self.cliff = false;
        self.beach_cliff = false;
        self.merge_cliff = false;
        self.cliff_island = None;
        self.pattern = None;
        self.cliff_rule = 0;
        self.cliff_variant = 0;
        self.cliff_corner = false;
        self.merge_cliffs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_bits_include_beach_level() {
        let mut tile = Tile::new(0, 0, 0, 2);
        tile.add_possible_floor(-1);
        tile.add_possible_floor(2);
        assert!(tile.has_possible_floor(-1));
        assert!(!tile.has_possible_floor(0));
        assert_eq!(tile.lowest_floor_below(2), Some(-1));
        assert_eq!(tile.lowest_floor_below(-1), None);
    }

    #[test]
    fn test_effective_elevation_uses_lowest_merge() {
        let mut tile = Tile::new(0, 0, 0, 3);
        assert_eq!(tile.effective_elevation(), 3);
        tile.merge_cliffs.push(MergeCliff { elevation: 1, pattern: 0 });
        tile.merge_cliffs.push(MergeCliff { elevation: 2, pattern: 0 });
        assert_eq!(tile.effective_elevation(), 1);
    }
}

//! Walk cursor and undo records.
//!
//! Every mutation the walker makes goes through a [`WalkStep`], which keeps
//! exactly what it overwrote so `unapply` can put the terrain back.

use crate::catalog::{PatternId, RuleRef};
use crate::direction::Dir;
use crate::terrain::Terrain;
use crate::tile::{MergeCliff, Tile};

/// Where the walk is and how it is heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub x: i32,
    pub y: i32,
    pub tile: usize,
    pub forward: Dir,
    /// Acre edge the eat band is measured from: an x for south/north walks,
    /// a y for east walks.
    pub lane: i32,
    /// The walk has reached an acre at its own elevation.
    pub entered_own: bool,
    /// Acre in which the current straight run began.
    pub segment_acre: usize,
}

impl Cursor {
    /// Distance from the lane into the high side for a tile at `(x, y)`.
    pub fn depth_at(&self, x: i32, y: i32) -> i32 {
        match self.forward {
            Dir::South => x - self.lane,
            Dir::East => self.lane - y,
            Dir::North => self.lane - x,
            Dir::West => y - self.lane,
        }
    }
}

/// Cliff fields of a tile before a walk wrote over them.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedCliff {
    pub elevation: i32,
    pub cliff: bool,
    pub beach_cliff: bool,
    pub cliff_island: Option<u32>,
    pub pattern: Option<PatternId>,
    pub cliff_rule: usize,
    pub cliff_variant: u8,
    pub cliff_corner: bool,
}

impl SavedCliff {
    fn capture(terrain: &Terrain, tile: usize) -> Self {
        let t = terrain.tile(tile);
        Self {
            elevation: t.elevation,
            cliff: t.cliff,
            beach_cliff: t.beach_cliff,
            cliff_island: t.cliff_island,
            pattern: t.pattern,
            cliff_rule: t.cliff_rule,
            cliff_variant: t.cliff_variant,
            cliff_corner: t.cliff_corner,
        }
    }

    fn restore(&self, terrain: &mut Terrain, tile: usize) {
        let t = terrain.tile_mut(tile);
        t.elevation = self.elevation;
        t.cliff = self.cliff;
        t.beach_cliff = self.beach_cliff;
        t.cliff_island = self.cliff_island;
        t.pattern = self.pattern;
        t.cliff_rule = self.cliff_rule;
        t.cliff_variant = self.cliff_variant;
        t.cliff_corner = self.cliff_corner;
    }
}

/// A tile the walk passed through inside a river crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaterfallMark {
    pub acre: usize,
    pub direction: (i32, i32),
}

/// A change decided by the walker but not yet written.
#[derive(Clone, Debug)]
pub enum Placement {
    /// Lay a new cliff tile, linked to the previous one.
    Tile {
        tile: usize,
        rule: RuleRef,
        variant: u8,
        corner: bool,
        link_from: Option<usize>,
        waterfall: Option<WaterfallMark>,
    },
    /// Stack this walk's pattern onto an existing cliff tile.
    Merge {
        target: usize,
        pattern: PatternId,
        link_from: Option<usize>,
        /// Tiles already cleared ahead of the merge, as they were before,
        /// oldest first.
        detached: Vec<(usize, Tile)>,
    },
}

#[derive(Clone, Debug)]
enum Change {
    Placed {
        tile: usize,
        saved: SavedCliff,
        link: Option<usize>,
        waterfall: Option<WaterfallMark>,
    },
    Merged {
        target: usize,
        was_merge: bool,
        link: Option<usize>,
        link_existed: bool,
        detached: Vec<(usize, Tile)>,
    },
}

/// One applied walk step.
#[derive(Clone, Debug)]
pub struct WalkStep {
    pub before: Cursor,
    pub after: Cursor,
    /// Rules in the order they were tried from `before`.
    pub candidates: Vec<RuleRef>,
    /// Index into `candidates` of the rule that produced this step.
    pub chosen: usize,
    /// Pattern this step laid or stacked.
    pub pattern: PatternId,
    pub island: u32,
    pub elevation: i32,
    change: Change,
}

impl WalkStep {
    /// Write `placement` into the terrain and return the record that undoes it.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        terrain: &mut Terrain,
        placement: Placement,
        before: Cursor,
        after: Cursor,
        candidates: Vec<RuleRef>,
        chosen: usize,
        island: u32,
        elevation: i32,
        beach: bool,
    ) -> Self {
        let pattern = match &placement {
            Placement::Tile { rule, .. } => rule.pattern,
            Placement::Merge { pattern, .. } => *pattern,
        };
        let change = match placement {
            Placement::Tile { tile, rule, variant, corner, link_from, waterfall } => {
                let saved = SavedCliff::capture(terrain, tile);
                {
                    let t = terrain.tile_mut(tile);
                    t.elevation = elevation;
                    t.cliff = true;
                    t.beach_cliff = beach;
                    t.cliff_island = Some(island);
                    t.pattern = Some(rule.pattern);
                    t.cliff_rule = rule.rule;
                    t.cliff_variant = variant;
                    t.cliff_corner = corner;
                }
                if let Some(prev) = link_from {
                    terrain.link(prev, tile);
                }
                if let Some(mark) = waterfall {
                    let acre = terrain.acres.at_mut(mark.acre);
                    acre.waterfalls.entry((elevation, mark.direction)).or_default().push(tile);
                }
                Change::Placed { tile, saved, link: link_from, waterfall }
            }
            Placement::Merge { target, pattern, link_from, detached } => {
                let link_existed = link_from
                    .is_some_and(|prev| terrain.tile(prev).connected_cliffs.contains(&target));
                let t = terrain.tile_mut(target);
                let was_merge = t.merge_cliff;
                t.merge_cliff = true;
                t.merge_cliffs.push(MergeCliff { elevation, pattern });
                if let Some(prev) = link_from {
                    terrain.link(prev, target);
                }
                Change::Merged { target, was_merge, link: link_from, link_existed, detached }
            }
        };
        Self { before, after, candidates, chosen, pattern, island, elevation, change }
    }

    /// Tile this step wrote to.
    pub fn tile(&self) -> usize {
        match self.change {
            Change::Placed { tile, .. } => tile,
            Change::Merged { target, .. } => target,
        }
    }

    pub fn is_merge(&self) -> bool {
        matches!(self.change, Change::Merged { .. })
    }

    /// Exact inverse of [`WalkStep::apply`].
    pub fn unapply(&self, terrain: &mut Terrain) {
        match &self.change {
            Change::Placed { tile, saved, link, waterfall } => {
                if let Some(mark) = waterfall {
                    let key = (self.elevation, mark.direction);
                    let acre = terrain.acres.at_mut(mark.acre);
                    if let Some(list) = acre.waterfalls.get_mut(&key) {
                        list.pop();
                        if list.is_empty() {
                            acre.waterfalls.remove(&key);
                        }
                    }
                }
                if let Some(prev) = link {
                    terrain.unlink(*prev, *tile);
                }
                saved.restore(terrain, *tile);
            }
            Change::Merged { target, was_merge, link, link_existed, detached } => {
                if let Some(prev) = link {
                    if !link_existed {
                        terrain.unlink(*prev, *target);
                    }
                }
                let t = terrain.tile_mut(*target);
                t.merge_cliffs.pop();
                t.merge_cliff = *was_merge;
                // Newest first, so each tile ends on its oldest snapshot.
                for (idx, tile) in detached.iter().rev() {
                    *terrain.tile_mut(*idx) = tile.clone();
                }
            }
        }
    }
}

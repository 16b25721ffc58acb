//! Cliff walker: a backtracking automaton that lays a connected run of cliff
//! patterns along the lower boundary of one island.
//!
//! A walk heads south down the island's west cliff, east along its southern
//! cliffs and north up its east cliff, always keeping the low ground on its
//! right. It ends by closing onto an older ring once every flagged cliff edge
//! of the island has been walled, or by leaving the map through a pattern
//! that may terminate there. Every placement is recorded as a
//! [`WalkStep`]; when no rule fits, the last step is undone and the next rule
//! from that step's candidate list is tried.

mod start;
mod step;

use std::collections::HashSet;

pub use start::{select_start, Start};
pub use step::{Cursor, Placement, SavedCliff, WalkStep, WaterfallMark};

use log::{debug, trace};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::{CliffCatalog, RuleRef};
use crate::config::TerrainConfig;
use crate::direction::Dir;
use crate::error::{GenerationError, Result};
use crate::islands::Island;
use crate::rivers::band_flow;
use crate::terrain::Terrain;
use crate::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkPhase {
    FirstStep,
    Walking,
    Done,
}

/// Statistics of a finished walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkSummary {
    pub island: u32,
    pub elevation: i32,
    pub steps: usize,
    pub reverts: usize,
    /// Steps left on the stack, the first included.
    pub tiles: usize,
}

/// Candidates still to try from a cursor, resumed after a revert.
#[derive(Clone, Debug)]
struct Pending {
    cursor: Cursor,
    candidates: Vec<RuleRef>,
    next: usize,
}

enum Verdict {
    Reject,
    Accept { x: i32, y: i32, tile: usize },
    /// Close the ring onto an existing cliff tile.
    Close(usize),
}

pub struct CliffWalker {
    island: u32,
    elevation: i32,
    /// Member acres of the island.
    acres: Vec<(usize, usize)>,
    band: (i32, i32),
    start: Start,
    phase: WalkPhase,
    stack: Vec<WalkStep>,
    pending: Option<Pending>,
    steps: usize,
    reverts: usize,
    max_reverts: usize,
    max_steps: usize,
}

impl CliffWalker {
    /// Prepare a walk around `island`. The start is chosen now, so every
    /// higher walk must already be finished.
    pub fn new(
        island: &Island,
        terrain: &Terrain,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self> {
        let start = select_start(island, terrain, config, rng)?;
        let (min, max) = config.eat_range(island.elevation);
        debug!(
            "Cliff walk for island {} (elevation {}) starts at ({}, {}) heading {:?}{}",
            island.id,
            island.elevation,
            start.x,
            start.y,
            start.forward,
            if start.merge.is_some() { " on an existing ring" } else { "" }
        );
        Ok(Self {
            island: island.id,
            elevation: island.elevation,
            acres: island.acres.clone(),
            band: (min as i32, max as i32),
            start,
            phase: WalkPhase::FirstStep,
            stack: Vec::new(),
            pending: None,
            steps: 0,
            reverts: 0,
            max_reverts: config.max_cliff_reverts,
            max_steps: terrain.tiles.len() * 2 + config.max_cliff_reverts,
        })
    }

    pub fn island(&self) -> u32 {
        self.island
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub fn phase(&self) -> WalkPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == WalkPhase::Done
    }

    /// Cursor after the most recent step.
    pub fn cursor(&self) -> Option<Cursor> {
        self.stack.last().map(|s| s.after)
    }

    pub fn steps(&self) -> &[WalkStep] {
        &self.stack
    }

    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            island: self.island,
            elevation: self.elevation,
            steps: self.steps,
            reverts: self.reverts,
            tiles: self.stack.len(),
        }
    }

    /// Advance by one placement or one revert. Returns `false` once the walk
    /// is complete.
    pub fn step(
        &mut self,
        terrain: &mut Terrain,
        catalog: &CliffCatalog,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
    ) -> Result<bool> {
        match self.phase {
            WalkPhase::Done => return Ok(false),
            WalkPhase::FirstStep => {
                self.first_step(terrain, catalog, config, rng);
                self.phase = WalkPhase::Walking;
            }
            WalkPhase::Walking => self.walk_step(terrain, catalog, config, rng)?,
        }
        Ok(!self.is_done())
    }

    /// Step until the walk is complete.
    pub fn run(
        &mut self,
        terrain: &mut Terrain,
        catalog: &CliffCatalog,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
    ) -> Result<WalkSummary> {
        while self.step(terrain, catalog, config, rng)? {}
        Ok(self.summary())
    }

    /// Undo every step, newest first, leaving the terrain as it was before the walk.
    pub fn rewind(&mut self, terrain: &mut Terrain) {
        while let Some(step) = self.stack.pop() {
            step.unapply(terrain);
        }
        self.pending = None;
        self.phase = WalkPhase::FirstStep;
    }

    fn first_step(
        &mut self,
        terrain: &mut Terrain,
        catalog: &CliffCatalog,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
    ) {
        let start = self.start;
        let pattern = catalog.initial_pattern(start.forward);
        let rule = catalog
            .get(pattern)
            .rules
            .iter()
            .position(|r| r.direction == start.forward)
            .unwrap_or(0);
        let tile = terrain.tiles.index(start.x as usize, start.y as usize);
        let cursor = Cursor {
            x: start.x,
            y: start.y,
            tile,
            forward: start.forward,
            lane: start.lane,
            entered_own: terrain.acre_of(tile).elevation == self.elevation,
            segment_acre: start.acre,
        };

        let placement = match start.merge {
            Some(target) => {
                let detached = detach_stale_chain(terrain, target, self.elevation, self.island);
                if !detached.is_empty() {
                    debug!("Island {} detached a stale cliff chain ahead of its merge start", self.island);
                }
                Placement::Merge { target, pattern, link_from: None, detached }
            }
            None => Placement::Tile {
                tile,
                rule: RuleRef { pattern, rule },
                variant: self.variant(config, rng),
                corner: false,
                link_from: None,
                waterfall: self.waterfall_mark(terrain, config, tile),
            },
        };
        let step = WalkStep::apply(
            terrain,
            placement,
            cursor,
            cursor,
            Vec::new(),
            0,
            self.island,
            self.elevation,
            self.elevation <= 0,
        );
        self.stack.push(step);
    }

    fn walk_step(
        &mut self,
        terrain: &mut Terrain,
        catalog: &CliffCatalog,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(GenerationError::NoSolution { island: self.island, reverts: self.reverts });
        }

        let mut pending = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let Some(cursor) = self.cursor() else {
                    return Err(GenerationError::StackExhausted { island: self.island });
                };
                let candidates = self.order_candidates(terrain, catalog, &cursor, rng);
                Pending { cursor, candidates, next: 0 }
            }
        };
        let cursor = pending.cursor;

        while pending.next < pending.candidates.len() {
            let chosen = pending.next;
            pending.next += 1;
            let rule = pending.candidates[chosen];

            match self.judge(terrain, catalog, &cursor, rule) {
                Verdict::Reject => continue,
                Verdict::Close(_) if !self.walls_complete(terrain) => {
                    trace!("Island {} skipped a closure with cliff edges still open", self.island);
                    continue;
                }
                Verdict::Accept { x, y, tile } => {
                    let after = self.advance(terrain, config, rng, &cursor, x, y, tile);
                    let placement = Placement::Tile {
                        tile,
                        rule,
                        variant: self.variant(config, rng),
                        corner: after.forward != cursor.forward,
                        link_from: Some(cursor.tile),
                        waterfall: self.waterfall_mark(terrain, config, tile),
                    };
                    let step = WalkStep::apply(
                        terrain,
                        placement,
                        cursor,
                        after,
                        pending.candidates,
                        chosen,
                        self.island,
                        self.elevation,
                        self.elevation <= 0,
                    );
                    self.stack.push(step);
                    return Ok(());
                }
                Verdict::Close(target) => {
                    let (tx, ty) = terrain.tiles.position(target);
                    let after = Cursor { x: tx as i32, y: ty as i32, tile: target, ..cursor };
                    let placement = Placement::Merge {
                        target,
                        pattern: rule.pattern,
                        link_from: Some(cursor.tile),
                        detached: Vec::new(),
                    };
                    let step = WalkStep::apply(
                        terrain,
                        placement,
                        cursor,
                        after,
                        pending.candidates,
                        chosen,
                        self.island,
                        self.elevation,
                        self.elevation <= 0,
                    );
                    self.stack.push(step);
                    self.phase = WalkPhase::Done;
                    debug!(
                        "Island {} ring closed onto tile ({}, {}) after {} steps",
                        self.island, tx, ty, self.steps
                    );
                    return Ok(());
                }
            }
        }

        let runs_off_map = pending.candidates.iter().any(|&rule| {
            let [dx, dy] = catalog.rule(rule).offset;
            !terrain.tiles.in_bounds(cursor.x + dx, cursor.y + dy)
        });
        if runs_off_map {
            let pattern = self.stack.last().map(|s| s.pattern);
            let legal_end = self.elevation <= 0
                || pattern.is_some_and(|p| catalog.get(p).is_end_tile);
            if legal_end {
                self.phase = WalkPhase::Done;
                debug!(
                    "Island {} walk left the map at ({}, {}) after {} steps",
                    self.island, cursor.x, cursor.y, self.steps
                );
                return Ok(());
            }
        }

        self.revert(terrain)
    }

    fn revert(&mut self, terrain: &mut Terrain) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(GenerationError::StackExhausted { island: self.island });
        }
        let Some(step) = self.stack.pop() else {
            return Err(GenerationError::StackExhausted { island: self.island });
        };
        step.unapply(terrain);
        self.reverts += 1;
        trace!(
            "Island {} reverted ({}, {}), {} reverts so far",
            self.island,
            step.after.x,
            step.after.y,
            self.reverts
        );
        if self.reverts > self.max_reverts {
            return Err(GenerationError::NoSolution { island: self.island, reverts: self.reverts });
        }
        self.pending = Some(Pending {
            cursor: step.before,
            candidates: step.candidates,
            next: step.chosen + 1,
        });
        Ok(())
    }

    /// Rules for the current heading in the order they will be tried.
    ///
    /// The base order is a random rotation of the catalog order. Before the
    /// walk reaches its own ground it steers toward the eat band; next to a
    /// higher island it bends inward so it meets that island's ring.
    fn order_candidates(
        &self,
        terrain: &Terrain,
        catalog: &CliffCatalog,
        cursor: &Cursor,
        rng: &mut ChaCha8Rng,
    ) -> Vec<RuleRef> {
        let mut rules = catalog.rules_for(cursor.forward);
        if rules.is_empty() {
            return rules;
        }
        let offset = rng.gen_range(0..rules.len());
        rules.rotate_left(offset);

        let (fx, fy) = cursor.forward.vector();
        let straight = [fx, fy];
        let (min, max) = self.band;

        if !cursor.entered_own {
            rules.sort_by_key(|&r| {
                let [dx, dy] = catalog.rule(r).offset;
                let depth = cursor.depth_at(cursor.x + dx, cursor.y + dy);
                let miss = (min - depth).max(depth - max).max(0);
                (miss, [dx, dy] != straight)
            });
            return rules;
        }

        let here = terrain.acre_of(cursor.tile).elevation;
        let ahead = terrain.acre_at_tile(cursor.x + fx, cursor.y + fy).map(|a| a.elevation);
        let junction = here > self.elevation || ahead.is_some_and(|e| e > self.elevation);
        if junction {
            let inward = match cursor.forward {
                Dir::East => Some([1, -1]),
                Dir::North => Some([-1, -1]),
                _ => None,
            };
            rules.sort_by_key(|&r| {
                let offset = catalog.rule(r).offset;
                if Some(offset) == inward {
                    0
                } else if offset == straight {
                    1
                } else {
                    2
                }
            });
        }
        rules
    }

    fn is_own(&self, terrain: &Terrain, tile: usize) -> bool {
        let t = terrain.tile(tile);
        (t.cliff && t.cliff_island == Some(self.island)) || self.start.merge == Some(tile)
    }

    /// A cliff tile this walk did not lay, the ring it started on included.
    fn foreign_cliff(&self, terrain: &Terrain, x: i32, y: i32) -> Option<usize> {
        let idx = terrain.tiles.checked_index(x, y)?;
        let tile = terrain.tile(idx);
        (tile.cliff && tile.cliff_island != Some(self.island)).then_some(idx)
    }

    /// Every flagged cliff edge of the island has a tile of this walk laid
    /// along it: a west edge by a south heading, a south edge by an east
    /// heading and an east edge by a north heading.
    fn walls_complete(&self, terrain: &Terrain) -> bool {
        let mut walled = HashSet::new();
        for step in self.stack.iter().filter(|s| !s.is_merge()) {
            let acre = terrain.tile(step.tile()).acre;
            walled.insert((acre, step.before.forward));
            walled.insert((acre, step.after.forward));
        }
        self.acres.iter().all(|&(ax, ay)| {
            let idx = terrain.acres.index(ax, ay);
            let acre = terrain.acres.at(idx);
            (!acre.has_west_cliff || walled.contains(&(idx, Dir::South)))
                && (!acre.has_south_cliff || walled.contains(&(idx, Dir::East)))
                && (!acre.has_east_cliff || walled.contains(&(idx, Dir::North)))
        })
    }

    fn judge(&self, terrain: &Terrain, catalog: &CliffCatalog, cursor: &Cursor, rule: RuleRef) -> Verdict {
        let [dx, dy] = catalog.rule(rule).offset;
        let (x, y) = (cursor.x + dx, cursor.y + dy);
        let Some(idx) = terrain.tiles.checked_index(x, y) else {
            return Verdict::Reject;
        };
        let acre_elevation = terrain.acre_of(idx).elevation;
        if acre_elevation < self.elevation || self.is_own(terrain, idx) {
            return Verdict::Reject;
        }

        let tile = terrain.tile(idx);
        if tile.cliff {
            // Before reaching its own ground the walk is still leaving the
            // ring it started on and must not close back onto it.
            if !cursor.entered_own {
                return Verdict::Reject;
            }
            let accepts = tile
                .pattern
                .is_some_and(|p| catalog.get(p).accepts_merge(tile.cliff_rule, cursor.forward));
            return if accepts { Verdict::Close(idx) } else { Verdict::Reject };
        }

        if dx != 0 && dy != 0 && cursor.entered_own {
            // A diagonal slipping between two cliff tiles crosses their ring.
            let beside = self.foreign_cliff(terrain, cursor.x + dx, cursor.y);
            let ahead = self.foreign_cliff(terrain, cursor.x, cursor.y + dy);
            if let (Some(beside), Some(ahead)) = (beside, ahead) {
                let target = if cursor.forward == Dir::East { beside } else { ahead };
                return Verdict::Close(target);
            }
        }

        if acre_elevation == self.elevation {
            let depth = cursor.depth_at(x, y);
            if depth < self.band.0 || depth > self.band.1 {
                return Verdict::Reject;
            }
        }
        Verdict::Accept { x, y, tile: idx }
    }

    /// Cursor on a newly accepted tile, turned if the acre it lies in asks for it.
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        terrain: &Terrain,
        config: &TerrainConfig,
        rng: &mut ChaCha8Rng,
        cursor: &Cursor,
        x: i32,
        y: i32,
        tile: usize,
    ) -> Cursor {
        let mut next = Cursor { x, y, tile, ..*cursor };
        let acre_idx = terrain.tile(tile).acre;
        let acre = terrain.acres.at(acre_idx);
        if acre.elevation != self.elevation {
            return next;
        }
        next.entered_own = true;

        let (min, max) = self.band;
        let (x0, _, x1, y1) = terrain.acre_bounds(acre.x, acre.y);
        let chance = config.cliff_turn_chance;
        let mut turn_to = |dir: Dir, lane: i32| {
            next.forward = dir;
            next.lane = lane;
            next.segment_acre = acre_idx;
        };

        match cursor.forward {
            Dir::South => {
                if acre.has_south_cliff {
                    let dist = y1 - y;
                    if should_turn(rng, chance, dist <= min, dist <= max) {
                        turn_to(Dir::East, y1);
                    }
                }
            }
            Dir::East => {
                if !acre.has_south_cliff {
                    if acre_idx != cursor.segment_acre {
                        let progress = x - x0;
                        if should_turn(rng, chance, progress >= max, progress >= min) {
                            turn_to(Dir::South, x0);
                        }
                    }
                } else if acre.has_east_cliff {
                    let dist = x1 - x;
                    if should_turn(rng, chance, dist <= min, dist <= max) {
                        turn_to(Dir::North, x1);
                    }
                }
            }
            Dir::North => {
                if !acre.has_east_cliff && acre_idx != cursor.segment_acre {
                    let progress = y1 - y;
                    if should_turn(rng, chance, progress >= max, progress >= min) {
                        turn_to(Dir::East, y1);
                    }
                }
            }
            Dir::West => {}
        }
        next
    }

    fn variant(&self, config: &TerrainConfig, rng: &mut ChaCha8Rng) -> u8 {
        rng.gen_range(0..config.max_cliff_variants.max(1))
    }

    /// Waterfall bookkeeping for a tile laid inside a river band of its
    /// acre. The water drops the way the band flows.
    fn waterfall_mark(&self, terrain: &Terrain, config: &TerrainConfig, tile: usize) -> Option<WaterfallMark> {
        if config.river_count == 0 {
            return None;
        }
        let t = terrain.tile(tile);
        let acre = terrain.acres.at(t.acre);
        band_flow(terrain, acre, config.river_width, t.x as i32, t.y as i32)
            .map(|direction| WaterfallMark { acre: t.acre, direction })
    }
}

fn should_turn(rng: &mut ChaCha8Rng, chance: f64, forced: bool, allowed: bool) -> bool {
    forced || (allowed && rng.gen_bool(chance))
}

/// Clear a chain of plain cliff tiles that another walk left inside this
/// island's acres, following links away from `start`. Returns a snapshot of
/// every tile touched, oldest first, so the merge step can restore them.
fn detach_stale_chain(terrain: &mut Terrain, start: usize, elevation: i32, island: u32) -> Vec<(usize, Tile)> {
    let mut snapshots = Vec::new();
    let links = terrain.tile(start).connected_cliffs.clone();
    for first in links {
        let mut prev = start;
        let mut current = first;
        loop {
            let tile = terrain.tile(current);
            let acre = terrain.acre_of(current);
            let stale = tile.cliff
                && !tile.merge_cliff
                && tile.cliff_island != Some(island)
                && acre.island == island
                && acre.elevation == elevation;
            if !stale {
                break;
            }
            let next = tile.connected_cliffs.iter().copied().find(|&t| t != prev);
            snapshots.push((current, tile.clone()));
            for &other in &tile.connected_cliffs {
                snapshots.push((other, terrain.tile(other).clone()));
            }
            terrain.unlink_all(current);
            let t = terrain.tile_mut(current);
            t.clear_cliff();
            t.elevation = elevation;
            match next {
                Some(next) => {
                    prev = current;
                    current = next;
                }
                None => break,
            }
        }
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;
    use crate::islands::{compute_cliff_flags, label_islands};
    use crate::rivers::paint_rivers;
    use crate::rivers::waterfalls::compose_waterfalls;
    use rand::SeedableRng;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            acre_size: 8,
            min_cliff_eat: 1,
            max_cliff_eat: 2,
            min_beach_eat: 1,
            max_beach_eat: 2,
            river_count: 0,
            ..TerrainConfig::default()
        }
    }

    fn terrain_for(rows: &[Vec<i32>], beach: bool, config: &TerrainConfig) -> Terrain {
        let mut acres = acres_from_elevations(rows);
        let islands = label_islands(&mut acres);
        compute_cliff_flags(&mut acres, beach).unwrap();
        let mut terrain = Terrain::new(acres, config.acre_size);
        terrain.islands = islands;
        terrain.beach_ring = beach;
        terrain
    }

    #[test]
    fn test_walk_along_single_south_cliff() {
        let config = small_config();
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![1, 1], vec![0, 0]], false, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let island = terrain.islands[0].clone();

        let mut walker = CliffWalker::new(&island, &terrain, &config, &mut rng).unwrap();
        let summary = walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();
        assert!(walker.is_done());
        assert_eq!(summary.reverts, 0);
        // One tile per column across both acres.
        assert_eq!(summary.tiles, 16);
        for (x, y, tile) in terrain.tiles.iter() {
            if tile.cliff {
                assert!((5..=6).contains(&y), "cliff at ({}, {}) outside the eat band", x, y);
                assert_eq!(tile.elevation, 1);
            }
        }
    }

    #[test]
    fn test_links_are_symmetric_after_walk() {
        let config = small_config();
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![1], vec![0]], true, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for island in terrain.islands.clone() {
            let mut walker = CliffWalker::new(&island, &terrain, &config, &mut rng).unwrap();
            walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();
        }
        for (idx, tile) in terrain.tiles.iter().map(|(x, y, t)| (terrain.tiles.index(x, y), t)) {
            for &other in &tile.connected_cliffs {
                assert!(terrain.tile(other).connected_cliffs.contains(&idx));
            }
        }
    }

    #[test]
    fn test_rewind_restores_terrain() {
        let config = small_config();
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![1], vec![0]], true, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let higher = terrain.islands[0].clone();
        let mut walker = CliffWalker::new(&higher, &terrain, &config, &mut rng).unwrap();
        walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();

        let before = terrain.tiles.clone();
        let beach = terrain.islands[1].clone();
        let mut walker = CliffWalker::new(&beach, &terrain, &config, &mut rng).unwrap();
        walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();
        assert!(terrain.tiles.iter().any(|(_, _, t)| t.beach_cliff));

        walker.rewind(&mut terrain);
        for (x, y, tile) in before.iter() {
            assert_eq!(terrain.tiles.get(x, y), tile);
        }
    }

    #[test]
    fn test_beach_ring_closes_onto_higher_ring() {
        let config = small_config();
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![1], vec![0]], true, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for island in terrain.islands.clone() {
            let mut walker = CliffWalker::new(&island, &terrain, &config, &mut rng).unwrap();
            let summary = walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();
            assert_eq!(summary.reverts, 0);
            if island.elevation == 0 {
                let last = walker.steps().last().unwrap();
                assert!(last.is_merge());
            }
        }
        let merges = terrain.tiles.iter().filter(|(_, _, t)| t.merge_cliff).count();
        assert_eq!(merges, 2);
    }

    /// Mark `tiles` as a linked ring laid by `island`.
    fn lay_ring(terrain: &mut Terrain, tiles: &[(usize, usize)], island: u32) -> Vec<usize> {
        let idx: Vec<usize> = tiles.iter().map(|&(x, y)| terrain.tiles.index(x, y)).collect();
        for &t in &idx {
            let tile = terrain.tile_mut(t);
            tile.cliff = true;
            tile.cliff_island = Some(island);
            tile.pattern = Some(0);
        }
        for pair in idx.windows(2) {
            terrain.link(pair[0], pair[1]);
        }
        idx
    }

    #[test]
    fn test_detach_keeps_other_island_ring() {
        // Two elevation-1 islands touching only at a corner.
        let mut acres = acres_from_elevations(&[vec![1, 0], vec![0, 1]]);
        label_islands(&mut acres);
        let mut terrain = Terrain::new(acres, 8);
        let west = terrain.acres.get(0, 0).island;
        let east = terrain.acres.get(1, 1).island;
        assert_ne!(west, east);

        let ring = lay_ring(&mut terrain, &[(7, 7), (8, 8), (9, 8), (10, 8)], east);
        let detached = detach_stale_chain(&mut terrain, ring[0], 1, west);
        assert!(detached.is_empty());
        for &t in &ring {
            assert!(terrain.tile(t).cliff);
        }
        assert_eq!(terrain.tile(ring[1]).connected_cliffs.len(), 2);

        // Leftovers of another walk inside the island's own acre do go.
        let stale = lay_ring(&mut terrain, &[(6, 6), (5, 6), (4, 6)], east);
        terrain.link(ring[0], stale[0]);
        let detached = detach_stale_chain(&mut terrain, ring[0], 1, west);
        assert!(!detached.is_empty());
        for &t in &stale {
            assert!(!terrain.tile(t).cliff);
            assert!(terrain.tile(t).connected_cliffs.is_empty());
        }
        assert!(terrain.tile(ring[1]).cliff);
    }

    #[test]
    fn test_rewind_restores_tiles_detached_at_merge_start() {
        let config = small_config();
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![1, 1], vec![0, 0]], false, &config);
        let island = terrain.islands.iter().find(|i| i.elevation == 1).unwrap().clone();
        let ring = lay_ring(&mut terrain, &[(0, 5), (1, 5), (2, 5), (3, 5)], island.id + 7);
        let before = terrain.tiles.clone();

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut walker = CliffWalker::new(&island, &terrain, &config, &mut rng).unwrap();
        walker.start = Start {
            x: 0,
            y: 5,
            forward: Dir::East,
            lane: 7,
            merge: Some(ring[0]),
            acre: 0,
        };
        walker.step(&mut terrain, &catalog, &config, &mut rng).unwrap();
        assert!(walker.steps()[0].is_merge());
        assert!(terrain.tile(ring[0]).merge_cliff);
        for &t in &ring[1..] {
            assert!(!terrain.tile(t).cliff);
        }

        walker.rewind(&mut terrain);
        for (x, y, tile) in before.iter() {
            assert_eq!(terrain.tiles.get(x, y), tile, "tile ({}, {}) not restored", x, y);
        }
    }

    #[test]
    fn test_rivers_crossing_a_turning_cliff_become_waterfalls() {
        let config = TerrainConfig { acre_size: 16, river_count: 2, river_width: 4, ..small_config() };
        let catalog = CliffCatalog::defaults().unwrap();
        let mut terrain = terrain_for(&[vec![0, 1, 1], vec![0, 0, 0]], false, &config);
        // One river leaves west over the west cliff, the other south over
        // the south cliff, so the ring is crossed before and after it turns.
        let acre = terrain.acres.get_mut(1, 0);
        acre.river_north = true;
        acre.river_west = true;
        acre.river_west_outflow = true;
        let acre = terrain.acres.get_mut(0, 0);
        acre.river_east = true;
        acre.river_south = true;
        terrain.acres.get_mut(0, 1).river_north = true;
        terrain.acres.get_mut(2, 0).river_north = true;
        terrain.acres.get_mut(2, 0).river_south = true;
        terrain.acres.get_mut(2, 1).river_north = true;

        let island = terrain.islands.iter().find(|i| i.elevation == 1).unwrap().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut walker = CliffWalker::new(&island, &terrain, &config, &mut rng).unwrap();
        walker.run(&mut terrain, &catalog, &config, &mut rng).unwrap();

        let mut crossings = 0;
        for (x, y, tile) in terrain.tiles.iter() {
            if tile.cliff_island != Some(island.id) {
                continue;
            }
            let acre = terrain.acres.at(tile.acre);
            if let Some(flow) = band_flow(&terrain, acre, config.river_width, x as i32, y as i32) {
                let idx = terrain.tiles.index(x, y);
                let list = acre.waterfalls.get(&(1, flow));
                assert!(list.is_some_and(|l| l.contains(&idx)), "({}, {}) crosses the river unmarked", x, y);
                crossings += 1;
            }
        }
        assert!(crossings >= 8);
        assert!(terrain.acres.get(1, 0).waterfalls.contains_key(&(1, (-1, 0))));
        assert!(terrain.acres.get(2, 0).waterfalls.contains_key(&(1, (0, 1))));

        let spans = compose_waterfalls(&mut terrain, &catalog);
        assert_eq!(spans.len(), 2);
        paint_rivers(&mut terrain, &config);
        for (x, y, tile) in terrain.tiles.iter() {
            if !tile.river {
                continue;
            }
            let (dx, dy) = tile.river_dir;
            if let Some(next) = terrain.tiles.get_checked(x as i32 + dx, y as i32 + dy) {
                assert!(!next.cliff || next.waterfall, "({}, {}) flows into a dry cliff", x, y);
            }
        }
    }
}

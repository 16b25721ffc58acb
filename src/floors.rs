//! Cliff floor resolution.
//!
//! A cliff tile's floor is the level of the ground at its foot. Tiles beside a
//! leveled region know it directly from `possible_floors`; the rest (corners,
//! tiles squeezed between two rings) borrow it from a neighbor on the same
//! ring through the cliff link graph.

use std::collections::{HashSet, VecDeque};

use log::info;

use crate::terrain::Terrain;

/// Resolve `floor` for every cliff tile that does not have one yet.
pub fn resolve_floors(terrain: &mut Terrain) {
    let mut resolved = 0;
    for idx in 0..terrain.tiles.len() {
        let tile = terrain.tile(idx);
        if !tile.cliff || tile.floor_resolved {
            continue;
        }
        let floor = find_floor(terrain, idx);
        let t = terrain.tile_mut(idx);
        t.floor = floor;
        t.floor_resolved = true;
        resolved += 1;
    }
    info!("Resolved floors for {} cliff tiles", resolved);
}

/// Breadth-first search over linked cliffs for a floor below `start`'s
/// effective elevation.
fn find_floor(terrain: &Terrain, start: usize) -> i32 {
    let target = terrain.tile(start).effective_elevation();
    let mut fallback: Option<i32> = None;
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(idx) = queue.pop_front() {
        let tile = terrain.tile(idx);
        if tile.effective_elevation() == target {
            if let Some(floor) = tile.lowest_floor_below(target) {
                return floor;
            }
        }
        for merge in &tile.merge_cliffs {
            if merge.elevation < target {
                fallback = Some(fallback.map_or(merge.elevation, |f| f.max(merge.elevation)));
            }
        }
        for &next in &tile.connected_cliffs {
            if terrain.tile(next).cliff && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    fallback.unwrap_or(target - 1)
}

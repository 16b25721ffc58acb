//! Per-tile river shading values.

use std::collections::VecDeque;

use log::info;

use crate::terrain::Terrain;

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Centerline distance of river tiles no centerline propagation reaches.
const UNREACHED: f32 = 1.0;

/// Fill `river_bank_distance`, `river_centerline_distance`, `river_value`
/// and `river_corners` for every tile.
pub fn compute_river_meta(terrain: &mut Terrain) {
    let len = terrain.tiles.len();
    let is_river: Vec<bool> = (0..len).map(|i| terrain.tile(i).is_river()).collect();
    if !is_river.iter().any(|&r| r) {
        return;
    }

    let bank = bank_distance(terrain, &is_river);
    let centerline: Vec<f32> = centerline_distance(terrain, &is_river, &bank)
        .into_iter()
        .zip(&is_river)
        .map(|(d, &river)| if river { d.unwrap_or(UNREACHED) } else { 0.0 })
        .collect();

    let mut values = vec![0.0f32; len];
    for idx in 0..len {
        if !is_river[idx] {
            continue;
        }
        let cd = bank[idx] as f32;
        let cl = centerline[idx];
        values[idx] = if cd + cl > 0.0 { cd / (cd + cl) } else { 0.0 };
    }

    for idx in 0..len {
        let (x, y) = terrain.tiles.position(idx);
        let own = values[idx];
        let at = |dx: i32, dy: i32| {
            terrain
                .tiles
                .checked_index(x as i32 + dx, y as i32 + dy)
                .map_or(own, |n| values[n])
        };
        let (n, e, s, w) = (at(0, -1), at(1, 0), at(0, 1), at(-1, 0));
        let corners = [
            (2.0 * own + w + n) / 4.0,
            (2.0 * own + e + n) / 4.0,
            (2.0 * own + w + s) / 4.0,
            (2.0 * own + e + s) / 4.0,
        ];
        let t = terrain.tile_mut(idx);
        t.river_bank_distance = bank[idx];
        t.river_centerline_distance = centerline[idx];
        t.river_value = values[idx];
        t.river_corners = corners;
    }
    info!("Computed river metadata for {} tiles", is_river.iter().filter(|&&r| r).count());
}

/// Distance from each river tile to the wall of its channel: the nearest
/// tile that is not water, cliff or dry land alike. Non-river tiles are 0.
fn bank_distance(terrain: &Terrain, is_river: &[bool]) -> Vec<u32> {
    let mut dist = vec![u32::MAX; is_river.len()];
    let mut queue = VecDeque::new();
    for (idx, &river) in is_river.iter().enumerate() {
        if !river {
            dist[idx] = 0;
            queue.push_back(idx);
        }
    }
    while let Some(idx) = queue.pop_front() {
        let (x, y) = terrain.tiles.position(idx);
        for (dx, dy) in DIRS {
            let Some(n) = terrain.tiles.checked_index(x as i32 + dx, y as i32 + dy) else {
                continue;
            };
            if dist[n] == u32::MAX {
                dist[n] = dist[idx] + 1;
                queue.push_back(n);
            }
        }
    }
    // A map that is river from edge to edge has no bank at all.
    for d in dist.iter_mut() {
        if *d == u32::MAX {
            *d = 0;
        }
    }
    dist
}

/// Normalized position along each river's centerline, spread to the rest of
/// the river by breadth-first propagation.
fn centerline_distance(terrain: &Terrain, is_river: &[bool], bank: &[u32]) -> Vec<Option<f32>> {
    let mut out: Vec<Option<f32>> = vec![None; is_river.len()];
    let mut queue = VecDeque::new();

    for river in &terrain.rivers {
        let (Some((sx, sy)), Some((mx, my))) = (river.source(), river.mouth()) else {
            continue;
        };
        let half = terrain.acre_size as i32 / 2;
        let (x0, y0, _, _) = terrain.acre_bounds(sx, sy);
        let (mx0, my0, _, my1) = terrain.acre_bounds(mx, my);
        let target = if river.confluence { (mx0 + half, my0 + half) } else { (mx0 + half, my1) };
        let Some(start) = nearest_river_tile(terrain, is_river, sx, sy, (x0 + half, y0)) else {
            continue;
        };

        let path = walk_centerline(terrain, is_river, bank, start, target);
        let span = (path.len().max(2) - 1) as f32;
        for (i, &idx) in path.iter().enumerate() {
            let d = i as f32 / span;
            if out[idx].map_or(true, |old| d < old) {
                out[idx] = Some(d);
                queue.push_back(idx);
            }
        }
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = terrain.tiles.position(idx);
        for (dx, dy) in DIRS {
            let Some(n) = terrain.tiles.checked_index(x as i32 + dx, y as i32 + dy) else {
                continue;
            };
            if is_river[n] && out[n].is_none() {
                out[n] = out[idx];
                queue.push_back(n);
            }
        }
    }
    out
}

fn nearest_river_tile(terrain: &Terrain, is_river: &[bool], ax: usize, ay: usize, point: (i32, i32)) -> Option<usize> {
    let (x0, y0, x1, y1) = terrain.acre_bounds(ax, ay);
    let mut best: Option<(i32, usize)> = None;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let idx = terrain.tiles.index(x as usize, y as usize);
            if !is_river[idx] {
                continue;
            }
            let d = (x - point.0).abs() + (y - point.1).abs();
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, idx));
            }
        }
    }
    best.map(|(_, idx)| idx)
}

/// Greedy walk toward `target`, always stepping to the unvisited river
/// neighbor furthest from the banks.
fn walk_centerline(terrain: &Terrain, is_river: &[bool], bank: &[u32], start: usize, target: (i32, i32)) -> Vec<usize> {
    let mut visited = vec![false; is_river.len()];
    let mut path = vec![start];
    visited[start] = true;
    let mut current = start;

    loop {
        let (x, y) = terrain.tiles.position(current);
        if (x as i32, y as i32) == target {
            break;
        }
        let next = DIRS
            .iter()
            .filter_map(|&(dx, dy)| {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                let n = terrain.tiles.checked_index(nx, ny)?;
                (is_river[n] && !visited[n]).then_some((n, nx, ny))
            })
            .max_by(|a, b| {
                let da = (a.1 - target.0).abs() + (a.2 - target.1).abs();
                let db = (b.1 - target.0).abs() + (b.2 - target.1).abs();
                bank[a.0].cmp(&bank[b.0]).then(db.cmp(&da))
            });
        let Some((n, _, _)) = next else {
            break;
        };
        visited[n] = true;
        path.push(n);
        current = n;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;
    use crate::rivers::RiverPath;

    fn straight_river() -> Terrain {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![0]]), 8);
        for y in 0..8 {
            for x in 2..6 {
                let idx = terrain.tiles.index(x, y);
                let t = terrain.tile_mut(idx);
                if x == 2 || x == 5 {
                    t.river_edge = true;
                } else {
                    t.river = true;
                }
            }
        }
        terrain.rivers.push(RiverPath { acres: vec![(0, 0)], confluence: false });
        terrain
    }

    #[test]
    fn test_centerline_runs_down_the_middle() {
        let mut terrain = straight_river();
        compute_river_meta(&mut terrain);
        assert_eq!(terrain.tiles.get(2, 4).river_bank_distance, 1);
        assert_eq!(terrain.tiles.get(4, 4).river_bank_distance, 2);
        assert_eq!(terrain.tiles.get(4, 0).river_centerline_distance, 0.0);
        assert_eq!(terrain.tiles.get(4, 7).river_centerline_distance, 1.0);
        assert_eq!(terrain.tiles.get(3, 7).river_centerline_distance, 1.0);
        assert_eq!(terrain.tiles.get(4, 0).river_value, 1.0);
        assert!((terrain.tiles.get(4, 7).river_value - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_banks_stay_dry_and_corners_blend() {
        let mut terrain = straight_river();
        compute_river_meta(&mut terrain);
        let bank = terrain.tiles.get(1, 3);
        assert_eq!(bank.river_value, 0.0);
        assert_eq!(terrain.tiles.get(4, 0).river_corners[0], 1.0);
        let edge = terrain.tiles.get(2, 3);
        // West of the edge is dry land, so its western corners are damped.
        assert!(edge.river_corners[0] < edge.river_value);
        assert!(edge.river_corners[1] > edge.river_corners[0]);
    }

    #[test]
    fn test_unreached_river_uses_far_centerline() {
        let mut terrain = straight_river();
        // A pond no river path runs through.
        let pond = terrain.tiles.index(7, 7);
        terrain.tile_mut(pond).river = true;
        compute_river_meta(&mut terrain);

        let tile = terrain.tiles.get(7, 7);
        assert_eq!(tile.river_centerline_distance, 1.0);
        assert_eq!(tile.river_bank_distance, 1);
        assert!((tile.river_value - 0.5).abs() < 1e-6);
        assert_eq!(terrain.tiles.get(1, 0).river_centerline_distance, 0.0);
    }

    #[test]
    fn test_bank_distance_needs_no_cliffs() {
        let mut terrain = straight_river();
        compute_river_meta(&mut terrain);
        assert_eq!(terrain.cliff_count(), 0);
        assert_eq!(terrain.tiles.get(3, 2).river_bank_distance, 2);
        assert_eq!(terrain.tiles.get(5, 2).river_bank_distance, 1);

        // A cliff beside the channel is a wall like any other dry tile.
        let mut terrain = straight_river();
        let idx = terrain.tiles.index(1, 2);
        terrain.tile_mut(idx).cliff = true;
        compute_river_meta(&mut terrain);
        assert_eq!(terrain.tiles.get(2, 2).river_bank_distance, 1);
        assert_eq!(terrain.tiles.get(1, 2).river_bank_distance, 0);
    }
}

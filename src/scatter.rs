//! Scatter layouts for the instancing collaborator: decorations, dirt patches
//! and beach collision heights.

use std::collections::BTreeMap;

use log::info;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::TerrainConfig;
use crate::poisson::poisson_disk;
use crate::terrain::Terrain;

/// Decoration meshes a point can pick from.
pub const DECORATION_VARIANTS: u8 = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct Decoration {
    pub x: f32,
    pub y: f32,
    /// Tile the point falls in.
    pub tile: usize,
    pub variant: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirtPatch {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

fn tile_at(terrain: &Terrain, p: (f32, f32)) -> usize {
    let x = (p.0 as usize).min(terrain.width() - 1);
    let y = (p.1 as usize).min(terrain.height() - 1);
    terrain.tiles.index(x, y)
}

/// Poisson-spaced decorations on open ground.
pub fn scatter_decorations(terrain: &Terrain, config: &TerrainConfig, rng: &mut ChaCha8Rng) -> Vec<Decoration> {
    let points = poisson_disk(
        terrain.width() as f32,
        terrain.height() as f32,
        config.decoration_spacing,
        config.poisson_candidates,
        rng,
    );
    let mut decorations = Vec::new();
    for p in points {
        let tile = tile_at(terrain, p);
        let t = terrain.tile(tile);
        if !t.is_flat() || t.beach {
            continue;
        }
        decorations.push(Decoration { x: p.0, y: p.1, tile, variant: rng.gen_range(0..DECORATION_VARIANTS) });
    }
    info!("Scattered {} decorations", decorations.len());
    decorations
}

/// Poisson-spaced dirt patches, kept clear of rivers and off cliffs.
pub fn place_dirt_patches(terrain: &Terrain, config: &TerrainConfig, rng: &mut ChaCha8Rng) -> Vec<DirtPatch> {
    let points = poisson_disk(
        terrain.width() as f32,
        terrain.height() as f32,
        config.dirt_spacing,
        config.poisson_candidates,
        rng,
    );
    let clearance = config.dirt_river_clearance;
    let reach = clearance.ceil() as i32 + 1;

    let mut patches = Vec::new();
    for p in points {
        let t = terrain.tile(tile_at(terrain, p));
        if t.cliff || t.waterfall {
            continue;
        }
        let (px, py) = (p.0 as i32, p.1 as i32);
        let near_river = (py - reach..=py + reach).any(|y| {
            (px - reach..=px + reach).any(|x| {
                terrain.tiles.get_checked(x, y).is_some_and(|n| {
                    let (dx, dy) = (x as f32 + 0.5 - p.0, y as f32 + 0.5 - p.1);
                    n.is_river() && (dx * dx + dy * dy).sqrt() < clearance
                })
            })
        });
        if near_river {
            continue;
        }
        let radius = rng.gen_range(config.dirt_min_radius..=config.dirt_max_radius);
        patches.push(DirtPatch { x: p.0, y: p.1, radius });
    }
    info!("Placed {} dirt patches", patches.len());
    patches
}

/// Collision heights for every beach tile, grouped by beach region in
/// row-major order. Beaches rise from their region level toward the next
/// level up as they move away from the map edge.
pub fn beach_height_samples(terrain: &Terrain, config: &TerrainConfig) -> BTreeMap<u32, Vec<f32>> {
    let (w, h) = (terrain.width(), terrain.height());
    let ramp = (config.max_beach_eat + 1) as f32;
    let mut samples: BTreeMap<u32, Vec<f32>> = BTreeMap::new();
    for (x, y, tile) in terrain.tiles.iter() {
        let (true, Some(region)) = (tile.beach, tile.region) else {
            continue;
        };
        let edge = x.min(y).min(w - 1 - x).min(h - 1 - y) as f32;
        samples
            .entry(region)
            .or_default()
            .push(tile.elevation as f32 + (edge / ramp).min(1.0));
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;
    use rand::SeedableRng;

    fn river_terrain() -> Terrain {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![1, 1], vec![1, 1]]), 16);
        for y in 0..32 {
            let idx = terrain.tiles.index(16, y);
            terrain.tile_mut(idx).river = true;
        }
        terrain
    }

    #[test]
    fn test_decorations_avoid_rivers() {
        let terrain = river_terrain();
        let config = TerrainConfig { decoration_spacing: 2.0, ..TerrainConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let decorations = scatter_decorations(&terrain, &config, &mut rng);
        assert!(!decorations.is_empty());
        for d in &decorations {
            assert!(terrain.tile(d.tile).is_flat());
            assert!(d.variant < DECORATION_VARIANTS);
        }
    }

    #[test]
    fn test_dirt_keeps_clear_of_rivers() {
        let terrain = river_terrain();
        let config = TerrainConfig { dirt_spacing: 3.0, dirt_river_clearance: 2.0, ..TerrainConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let patches = place_dirt_patches(&terrain, &config, &mut rng);
        assert!(!patches.is_empty());
        for patch in &patches {
            let nearest = (0..32)
                .map(|y| ((patch.x - 16.5).powi(2) + (patch.y - y as f32 - 0.5).powi(2)).sqrt())
                .fold(f32::INFINITY, f32::min);
            assert!(nearest >= 2.0);
            assert!(patch.radius >= config.dirt_min_radius && patch.radius <= config.dirt_max_radius);
        }
    }

    #[test]
    fn test_beach_heights_rise_inland() {
        let mut terrain = Terrain::new(acres_from_elevations(&[vec![0]]), 8);
        for idx in 0..terrain.tiles.len() {
            let t = terrain.tile_mut(idx);
            t.beach = true;
            t.region = Some(0);
            t.elevation = -1;
        }
        let config = TerrainConfig { max_beach_eat: 4, ..TerrainConfig::default() };
        let samples = beach_height_samples(&terrain, &config);
        let heights = &samples[&0];
        assert_eq!(heights.len(), 64);
        assert_eq!(heights[0], -1.0);
        assert!((heights[3 * 8 + 3] - -0.4).abs() < 1e-6);
    }
}

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::Result;
use crate::terrain::Terrain;
use crate::tile::Tile;

/// Export the tile grid as a colored PNG, `scale` pixels per tile.
pub fn export_png(terrain: &Terrain, path: &Path, scale: u32) -> Result<()> {
    let scale = scale.max(1);
    let max_elevation = terrain
        .tiles
        .iter()
        .map(|(_, _, t)| t.elevation)
        .max()
        .unwrap_or(0)
        .max(1);

    let mut img: RgbImage = ImageBuffer::new(terrain.width() as u32 * scale, terrain.height() as u32 * scale);
    for (x, y, tile) in terrain.tiles.iter() {
        let color = tile_color(tile, max_elevation);
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(x as u32 * scale + dx, y as u32 * scale + dy, Rgb(color));
            }
        }
    }
    for decoration in &terrain.decorations {
        let px = ((decoration.x * scale as f32) as u32).min(img.width() - 1);
        let py = ((decoration.y * scale as f32) as u32).min(img.height() - 1);
        img.put_pixel(px, py, Rgb([24, 70, 24]));
    }

    img.save(path)?;
    Ok(())
}

/// Color for one tile: green ramp by elevation with feature overrides.
pub fn tile_color(tile: &Tile, max_elevation: i32) -> [u8; 3] {
    if tile.waterfall {
        return [220, 240, 255];
    }
    if tile.river {
        return [40, 110, 200];
    }
    if tile.river_edge {
        return [90, 150, 215];
    }
    if tile.cliff {
        return if tile.beach_cliff { [150, 130, 100] } else { [95, 85, 75] };
    }
    if tile.slope {
        return [170, 150, 110];
    }
    if tile.beach {
        return [230, 215, 160];
    }
    let t = (tile.elevation.max(0) as f32 / max_elevation as f32).clamp(0.0, 1.0);
    lerp([70, 150, 60], [200, 220, 150], t)
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_override_elevation() {
        let mut tile = Tile::new(0, 0, 0, 2);
        let ground = tile_color(&tile, 2);
        assert_eq!(ground, [200, 220, 150]);
        tile.cliff = true;
        assert_eq!(tile_color(&tile, 2), [95, 85, 75]);
        tile.waterfall = true;
        assert_eq!(tile_color(&tile, 2), [220, 240, 255]);
    }
}

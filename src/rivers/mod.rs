//! Rivers: acre routing, tile painting, waterfalls and shading metadata.

pub mod meta;
pub mod routing;
pub mod waterfalls;

pub use routing::{route_rivers, RiverPath};

use log::info;

use crate::acre::Acre;
use crate::config::TerrainConfig;
use crate::terrain::Terrain;

/// One rectangle of river inside an acre and the way its water runs.
#[derive(Clone, Copy, Debug)]
struct Arm {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    flow: (i32, i32),
}

impl Arm {
    fn contains(&self, x: i32, y: i32) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

/// River rectangles of an acre: one arm per active side, reaching from that
/// side to the centre square, and the centre square itself. The square
/// drains toward the side the river leaves by.
fn acre_arms(terrain: &Terrain, acre: &Acre, width: i32) -> Vec<Arm> {
    if !acre.has_river() {
        return Vec::new();
    }
    let size = terrain.acre_size as i32;
    let (x0, y0, x1, y1) = terrain.acre_bounds(acre.x, acre.y);
    let bx = x0 + size / 2 - width / 2;
    let by = y0 + size / 2 - width / 2;
    let (bx1, by1) = (bx + width - 1, by + width - 1);

    let outflow = if acre.river_south {
        (0, 1)
    } else if acre.river_west && acre.river_west_outflow {
        (-1, 0)
    } else if acre.river_east && acre.river_east_outflow {
        (1, 0)
    } else {
        (0, 1)
    };

    let mut arms = vec![Arm { x0: bx, y0: by, x1: bx1, y1: by1, flow: outflow }];
    if acre.river_north {
        arms.push(Arm { x0: bx, y0, x1: bx1, y1: by - 1, flow: (0, 1) });
    }
    if acre.river_south {
        arms.push(Arm { x0: bx, y0: by1 + 1, x1: bx1, y1, flow: (0, 1) });
    }
    if acre.river_west {
        let flow = if acre.river_west_outflow { (-1, 0) } else { (1, 0) };
        arms.push(Arm { x0, y0: by, x1: bx - 1, y1: by1, flow });
    }
    if acre.river_east {
        let flow = if acre.river_east_outflow { (1, 0) } else { (-1, 0) };
        arms.push(Arm { x0: bx1 + 1, y0: by, x1, y1: by1, flow });
    }
    arms
}

/// Direction water runs at `(x, y)` when that tile lies in one of `acre`'s
/// river bands.
pub fn band_flow(terrain: &Terrain, acre: &Acre, width: usize, x: i32, y: i32) -> Option<(i32, i32)> {
    acre_arms(terrain, acre, width as i32)
        .into_iter()
        .find(|arm| arm.contains(x, y))
        .map(|arm| arm.flow)
}

/// Expand acre river flags into river tiles.
///
/// Each active side of an acre gets a band `river_width` tiles wide, centered
/// on the acre midline and reaching from that side to the acre center. A
/// band tile with a neighbor outside every band is a river edge facing that
/// neighbor; the rest are open water carrying their band's flow. Cliff tiles
/// are never painted; waterfall composition has already opened the ones a
/// river flows through.
pub fn paint_rivers(terrain: &mut Terrain, config: &TerrainConfig) {
    if config.river_count == 0 {
        return;
    }
    let width = config.river_width as i32;

    let mut flow: Vec<Option<(i32, i32)>> = vec![None; terrain.tiles.len()];
    for (_, _, acre) in terrain.acres.iter() {
        for arm in acre_arms(terrain, acre, width) {
            for y in arm.y0..=arm.y1 {
                for x in arm.x0..=arm.x1 {
                    flow[terrain.tiles.index(x as usize, y as usize)] = Some(arm.flow);
                }
            }
        }
    }

    let mut painted = 0;
    for (idx, band) in flow.iter().enumerate() {
        let Some(band) = *band else {
            continue;
        };
        let (x, y) = terrain.tiles.position(idx);
        let outward = [(-1, 0), (1, 0), (0, -1), (0, 1)].into_iter().find(|&(dx, dy)| {
            terrain
                .tiles
                .checked_index(x as i32 + dx, y as i32 + dy)
                .is_some_and(|n| flow[n].is_none())
        });
        let t = terrain.tile_mut(idx);
        if t.cliff {
            continue;
        }
        match outward {
            Some(dir) => {
                t.river_edge = true;
                t.river_dir = dir;
            }
            None => {
                t.river = true;
                t.river_dir = band;
            }
        }
        painted += 1;
    }
    info!("Painted {} river tiles", painted);
}

//! Acre-level river routing.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::acre::Acre;
use crate::tilemap::Tilemap;

/// Acres a river passes through, source first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiverPath {
    pub acres: Vec<(usize, usize)>,
    /// The river ends by joining another one instead of leaving the map.
    pub confluence: bool,
}

impl RiverPath {
    pub fn source(&self) -> Option<(usize, usize)> {
        self.acres.first().copied()
    }

    pub fn mouth(&self) -> Option<(usize, usize)> {
        self.acres.last().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    West,
    East,
    South,
}

/// Route up to `count` rivers from the top row to the bottom edge, setting
/// the river flags on every acre they cross.
pub fn route_rivers(acres: &mut Tilemap<Acre>, count: usize, rng: &mut ChaCha8Rng) -> Vec<RiverPath> {
    let mut rivers = Vec::new();
    for _ in 0..count {
        let sources: Vec<usize> = (0..acres.width).filter(|&x| !acres.get(x, 0).has_river()).collect();
        let Some(&sx) = sources.choose(rng) else {
            debug!("No free source acre left for river {}", rivers.len());
            break;
        };
        rivers.push(route_river(acres, sx, rng));
    }
    rivers
}

fn route_river(acres: &mut Tilemap<Acre>, sx: usize, rng: &mut ChaCha8Rng) -> RiverPath {
    let (mut x, mut y) = (sx, 0);
    acres.get_mut(x, y).river_north = true;
    let mut path = vec![(x, y)];

    loop {
        let choice = match rng.gen_range(0..3) {
            0 => Move::West,
            1 => Move::East,
            _ => Move::South,
        };
        let lateral = match choice {
            Move::West if x > 0 => Some(x - 1),
            Move::East if x + 1 < acres.width => Some(x + 1),
            _ => None,
        };
        let here = acres.get(x, y).elevation;
        let lateral = lateral.filter(|&nx| {
            let n = acres.get(nx, y);
            n.elevation <= here && !n.has_river()
        });

        if let Some(nx) = lateral {
            if nx < x {
                let a = acres.get_mut(x, y);
                a.river_west = true;
                a.river_west_outflow = true;
                acres.get_mut(nx, y).river_east = true;
            } else {
                let a = acres.get_mut(x, y);
                a.river_east = true;
                a.river_east_outflow = true;
                acres.get_mut(nx, y).river_west = true;
            }
            x = nx;
            path.push((x, y));
            continue;
        }

        acres.get_mut(x, y).river_south = true;
        if y + 1 >= acres.height {
            return RiverPath { acres: path, confluence: false };
        }
        y += 1;
        let joins = acres.get(x, y).has_river();
        acres.get_mut(x, y).river_north = true;
        path.push((x, y));
        if joins {
            return RiverPath { acres: path, confluence: true };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;
    use rand::SeedableRng;

    #[test]
    fn test_river_reaches_bottom_and_never_climbs() {
        let rows = vec![vec![3, 3, 3, 3], vec![3, 2, 2, 3], vec![2, 1, 1, 1], vec![0, 0, 0, 0]];
        for seed in 0..30 {
            let mut acres = acres_from_elevations(&rows);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rivers = route_rivers(&mut acres, 1, &mut rng);
            let path = &rivers[0].acres;
            assert_eq!(path[0].1, 0);
            assert!(acres.get(path[0].0, 0).river_north);
            let (mx, my) = *path.last().unwrap();
            assert_eq!(my, 3);
            assert!(acres.get(mx, my).river_south);
            for pair in path.windows(2) {
                let a = acres.get(pair[0].0, pair[0].1).elevation;
                let b = acres.get(pair[1].0, pair[1].1).elevation;
                assert!(b <= a);
            }
        }
    }

    #[test]
    fn test_lateral_flags_are_symmetric() {
        let mut acres = acres_from_elevations(&[vec![1, 1, 1], vec![0, 0, 0]]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        route_rivers(&mut acres, 3, &mut rng);
        for y in 0..acres.height {
            for x in 0..acres.width - 1 {
                assert_eq!(acres.get(x, y).river_east, acres.get(x + 1, y).river_west);
            }
        }
    }

    #[test]
    fn test_second_river_may_join_first() {
        let mut acres = acres_from_elevations(&[vec![1, 1], vec![0, 0], vec![0, 0]]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let rivers = route_rivers(&mut acres, 3, &mut rng);
        assert!(rivers.len() <= 2);
        assert!(!rivers[0].confluence);
    }
}

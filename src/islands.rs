//! Island labelling and per-acre cliff orientation.
//!
//! An island is a maximal 4-connected set of acres at one elevation. Labels are
//! handed out layer by layer from the highest elevation down, so a lower index
//! always means an island that is at least as high.

use std::collections::VecDeque;

use crate::acre::{Acre, NO_ISLAND};
use crate::error::{GenerationError, Result};
use crate::tilemap::Tilemap;

#[derive(Clone, Debug, PartialEq)]
pub struct Island {
    pub id: u32,
    pub elevation: i32,
    /// Member acres in flood-fill order.
    pub acres: Vec<(usize, usize)>,
}

/// Assign island indices to every acre and return the islands found.
pub fn label_islands(acres: &mut Tilemap<Acre>) -> Vec<Island> {
    let mut elevations: Vec<i32> = acres.iter().map(|(_, _, a)| a.elevation).collect();
    elevations.sort_unstable();
    elevations.dedup();

    let mut islands = Vec::new();
    for &layer in elevations.iter().rev() {
        for y in 0..acres.height {
            for x in 0..acres.width {
                let acre = acres.get(x, y);
                if acre.elevation != layer || acre.island != NO_ISLAND {
                    continue;
                }

                let id = islands.len() as u32;
                let mut island = Island { id, elevation: layer, acres: Vec::new() };
                let mut queue = VecDeque::new();
                acres.get_mut(x, y).island = id;
                queue.push_back((x, y));

                while let Some((cx, cy)) = queue.pop_front() {
                    island.acres.push((cx, cy));
                    for (nx, ny) in acres.neighbors(cx, cy) {
                        let n = acres.get(nx, ny);
                        if n.elevation == layer && n.island == NO_ISLAND {
                            acres.get_mut(nx, ny).island = id;
                            queue.push_back((nx, ny));
                        }
                    }
                }
                islands.push(island);
            }
        }
    }
    islands
}

/// Set the cliff orientation flags of every acre.
///
/// A missing neighbor counts as lower ground only for elevation-0 acres when
/// `beach_edges` is set; everywhere else the map edge is not a cliff.
///
/// Fails on a north neighbor lower than the acre, or a diagonal configuration
/// that would require one. Both mean the elevation step broke its contract.
pub fn compute_cliff_flags(acres: &mut Tilemap<Acre>, beach_edges: bool) -> Result<()> {
    let elevation = |acres: &Tilemap<Acre>, x: i32, y: i32| acres.get_checked(x, y).map(|a| a.elevation);

    for y in 0..acres.height {
        for x in 0..acres.width {
            let (xi, yi) = (x as i32, y as i32);
            let here = acres.get(x, y).elevation;

            if let Some(north) = elevation(acres, xi, yi - 1) {
                if north < here {
                    return Err(GenerationError::Consistency {
                        x,
                        y,
                        message: format!("north neighbor at {} is lower than {}", north, here),
                    });
                }
            }
            for dx in [-1, 1] {
                let diagonal = elevation(acres, xi + dx, yi - 1);
                let side = elevation(acres, xi + dx, yi);
                if let (Some(diagonal), Some(side)) = (diagonal, side) {
                    if diagonal < here && side >= here {
                        return Err(GenerationError::Consistency {
                            x,
                            y,
                            message: format!(
                                "diagonal north neighbor at {} is lower than {} but its south is {}",
                                diagonal, here, side
                            ),
                        });
                    }
                }
            }

            let edge_is_cliff = beach_edges && here == 0;
            let lower = |e: Option<i32>| match e {
                Some(e) => e < here,
                None => edge_is_cliff,
            };
            let diagonal_lower = |e: Option<i32>| e.is_some_and(|e| e < here);

            let west = lower(elevation(acres, xi - 1, yi));
            let east = lower(elevation(acres, xi + 1, yi));
            let south = lower(elevation(acres, xi, yi + 1));
            let south_east = diagonal_lower(elevation(acres, xi + 1, yi + 1));
            let south_west = diagonal_lower(elevation(acres, xi - 1, yi + 1));

            let acre = acres.get_mut(x, y);
            acre.has_west_cliff = west;
            acre.has_east_cliff = east;
            acre.has_south_cliff = south;
            acre.has_south_east_cliff = south_east;
            acre.has_south_west_cliff = south_west;
        }
    }
    Ok(())
}

/// Whether an island needs a cliff ring at all.
pub fn needs_walk(island: &Island, acres: &Tilemap<Acre>, beach_edges: bool) -> bool {
    if island.elevation == 0 && !beach_edges {
        return false;
    }
    island
        .acres
        .iter()
        .any(|&(x, y)| acres.get(x, y).has_any_cliff())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acre::acres_from_elevations;

    #[test]
    fn test_islands_partition_acres() {
        let mut acres = acres_from_elevations(&[
            vec![2, 2, 2],
            vec![1, 2, 1],
            vec![0, 0, 0],
        ]);
        let islands = label_islands(&mut acres);
        // The two 1-acres are not 4-adjacent.
        assert_eq!(islands.len(), 4);
        assert_eq!(islands[0].elevation, 2);
        assert_eq!(islands[0].acres.len(), 4);
        assert_ne!(acres.get(0, 1).island, acres.get(2, 1).island);
        let total: usize = islands.iter().map(|i| i.acres.len()).sum();
        assert_eq!(total, 9);
        for (_, _, acre) in acres.iter() {
            assert_ne!(acre.island, NO_ISLAND);
        }
    }

    #[test]
    fn test_cliff_flags_follow_lower_neighbors() {
        let mut acres = acres_from_elevations(&[
            vec![2, 2, 2],
            vec![1, 2, 1],
            vec![0, 0, 0],
        ]);
        compute_cliff_flags(&mut acres, true).unwrap();
        let centre = acres.get(1, 1);
        assert!(centre.has_west_cliff && centre.has_east_cliff && centre.has_south_cliff);
        assert!(centre.has_south_west_cliff && centre.has_south_east_cliff);
        let top_left = acres.get(0, 0);
        assert!(!top_left.has_west_cliff);
        assert!(top_left.has_south_cliff);
        let bottom = acres.get(0, 2);
        assert!(bottom.has_west_cliff && bottom.has_south_cliff && !bottom.has_east_cliff);
    }

    #[test]
    fn test_edges_are_not_cliffs_without_beach() {
        let mut acres = acres_from_elevations(&[vec![0, 0], vec![0, 0]]);
        compute_cliff_flags(&mut acres, false).unwrap();
        assert!(acres.iter().all(|(_, _, a)| !a.has_any_cliff()));
    }

    #[test]
    fn test_lower_north_neighbor_is_fatal() {
        let mut acres = acres_from_elevations(&[vec![1, 2], vec![2, 2], vec![0, 0]]);
        let err = compute_cliff_flags(&mut acres, true).unwrap_err();
        assert!(matches!(err, GenerationError::Consistency { x: 0, y: 1, .. }));
    }
}

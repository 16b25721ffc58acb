/// A 2D grid stored row-major. Unlike a world map this does not wrap:
/// anything past an edge is simply "no neighbor".
#[derive(Clone, Debug)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T> Tilemap<T> {
    /// Build a map from a generator called once per cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Flat index of a cell. Callers must pass in-bounds coordinates.
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Inverse of [`Tilemap::index`].
    pub fn position(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Index of a signed position, or `None` when it falls off the map.
    pub fn checked_index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(self.index(x as usize, y as usize))
        } else {
            None
        }
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    /// Sentinel lookup: out-of-bounds positions return `None` instead of panicking.
    pub fn get_checked(&self, x: i32, y: i32) -> Option<&T> {
        self.checked_index(x, y).map(|idx| &self.data[idx])
    }

    pub fn at(&self, idx: usize) -> &T {
        &self.data[idx]
    }

    pub fn at_mut(&mut self, idx: usize) -> &mut T {
        &mut self.data[idx]
    }

    /// 4-connected neighbors that exist on the map.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);
        if x > 0 {
            result.push((x - 1, y));
        }
        if x + 1 < self.width {
            result.push((x + 1, y));
        }
        if y > 0 {
            result.push((x, y - 1));
        }
        if y + 1 < self.height {
            result.push((x, y + 1));
        }
        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| (idx % width, idx / width, val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_do_not_wrap() {
        let map = Tilemap::from_fn(3, 3, |_, _| 0u8);
        assert_eq!(map.neighbors(0, 0), vec![(1, 0), (0, 1)]);
        assert_eq!(map.neighbors(1, 1).len(), 4);
        assert_eq!(map.neighbors(2, 2), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_checked_lookup_returns_none_off_map() {
        let map = Tilemap::from_fn(4, 2, |x, y| x + y * 10);
        assert_eq!(map.get_checked(-1, 0), None);
        assert_eq!(map.get_checked(4, 1), None);
        assert_eq!(map.get_checked(3, 1), Some(&13));
        assert_eq!(map.position(map.index(2, 1)), (2, 1));
    }
}

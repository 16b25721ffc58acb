//! Poisson-disk sampling (Bridson's algorithm).

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Sample points in `[0, width] x [0, height]` no closer than `radius` to
/// each other, trying `candidates` annulus points around each active sample
/// before retiring it.
///
/// Returns an empty set for a non-positive area or radius.
pub fn poisson_disk(width: f32, height: f32, radius: f32, candidates: usize, rng: &mut ChaCha8Rng) -> Vec<(f32, f32)> {
    if !(width > 0.0 && height > 0.0 && radius > 0.0) || candidates == 0 {
        return Vec::new();
    }

    let cell = radius / std::f32::consts::SQRT_2;
    let cols = (width / cell).ceil() as usize + 1;
    let rows = (height / cell).ceil() as usize + 1;
    let mut grid: Vec<Option<usize>> = vec![None; cols * rows];
    let cell_of = |p: (f32, f32)| {
        let cx = ((p.0 / cell) as usize).min(cols - 1);
        let cy = ((p.1 / cell) as usize).min(rows - 1);
        (cx, cy)
    };

    let mut points = Vec::new();
    let mut active = Vec::new();

    let first = (rng.gen_range(0.0..width), rng.gen_range(0.0..height));
    let (cx, cy) = cell_of(first);
    grid[cy * cols + cx] = Some(0);
    points.push(first);
    active.push(0);

    while !active.is_empty() {
        let slot = rng.gen_range(0..active.len());
        let origin = points[active[slot]];
        let mut found = false;

        for _ in 0..candidates {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let dist = rng.gen_range(radius..2.0 * radius);
            let p = (origin.0 + dist * angle.cos(), origin.1 + dist * angle.sin());
            if p.0 < 0.0 || p.1 < 0.0 || p.0 > width || p.1 > height {
                continue;
            }
            let (cx, cy) = cell_of(p);
            let clear = (cy.saturating_sub(2)..=(cy + 2).min(rows - 1)).all(|ny| {
                (cx.saturating_sub(2)..=(cx + 2).min(cols - 1)).all(|nx| match grid[ny * cols + nx] {
                    Some(other) => {
                        let q: (f32, f32) = points[other];
                        let (dx, dy) = (q.0 - p.0, q.1 - p.1);
                        dx * dx + dy * dy >= radius * radius
                    }
                    None => true,
                })
            });
            if clear {
                grid[cy * cols + cx] = Some(points.len());
                active.push(points.len());
                points.push(p);
                found = true;
                break;
            }
        }

        if !found {
            active.swap_remove(slot);
        }
    }
    points
}

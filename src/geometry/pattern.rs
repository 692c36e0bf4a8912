//! Procedural patterns.

use alloc::vec::Vec;

use crate::config::GridCirclesConfig;

use super::path::Path;
use super::Point;

/// Centres of a grid of circles, in visiting order.
///
/// Columns and rows are `floor(area / cell)`; centres sit in the middle of
/// each cell. With `snake`, odd rows run right to left.
pub fn grid_centers(config: &GridCirclesConfig) -> Vec<Point> {
    let [ox, oy] = config.origin;
    let [w, h] = config.area;
    let cell = config.cell;
    if !(cell > 0.0) {
        return Vec::new();
    }

    let nx = libm::floor(w / cell) as usize;
    let ny = libm::floor(h / cell) as usize;
    let mut centers = Vec::with_capacity(nx * ny);

    for j in 0..ny {
        let reversed = config.snake && j % 2 == 1;
        for k in 0..nx {
            let i = if reversed { nx - 1 - k } else { k };
            centers.push(Point::new(
                ox + cell / 2.0 + i as f64 * cell,
                oy + cell / 2.0 + j as f64 * cell,
            ));
        }
    }
    centers
}

/// One full circle per grid cell, each starting at `(cx + r, cy)`.
pub fn grid_circles(config: &GridCirclesConfig) -> Vec<Path> {
    let r = config.circle_d / 2.0;
    grid_centers(config)
        .into_iter()
        .map(|c| Path::circle(c, r, config.cw))
        .collect()
}

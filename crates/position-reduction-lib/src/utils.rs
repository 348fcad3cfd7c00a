//! Utility functions for spherical distances and significance detection

use crate::NavigationPosition;
use geo::Point;

/// Earth's radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Haversine distance between two points in meters (x = longitude, y = latitude)
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` to `to` in radians
#[inline]
pub fn initial_bearing(from: Point<f64>, to: Point<f64>) -> f64 {
    let lat1 = from.y().to_radians();
    let lat2 = to.y().to_radians();
    let delta_lon = (to.x() - from.x()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    y.atan2(x)
}

/// Signed cross-track distance in meters of `point` from the great circle through `a` and `b`
///
/// Positive on the right of the direction `a -> b`, negative on the left.
pub fn orthogonal_distance(point: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    let distance_a_to_point = haversine_distance(a, point);
    let course_a_to_point = initial_bearing(a, point);
    let course_a_to_b = initial_bearing(a, b);

    ((distance_a_to_point / EARTH_RADIUS_M).sin() * (course_a_to_point - course_a_to_b).sin())
        .asin()
        * EARTH_RADIUS_M
}

/// Indices of the positions that matter for the shape of the line, in ascending order
///
/// Douglas-Peucker with the spherical cross-track distance: a position is kept if it
/// is farther than `threshold` meters from the line between the kept positions around
/// it. The first and last index are always kept. Positions without coordinates never
/// become significant on their own.
pub fn significant_indices<P: NavigationPosition>(positions: &[P], threshold: f64) -> Vec<usize> {
    let len = positions.len();
    if len <= 2 {
        return (0..len).collect();
    }

    let mut keep = vec![false; len];
    keep[0] = true;
    keep[len - 1] = true;

    // Explicit stack: GPS tracks easily exceed safe recursion depth
    let mut stack = vec![(0, len - 1)];
    while let Some((from, to)) = stack.pop() {
        let (Some(a), Some(b)) = (positions[from].point(), positions[to].point()) else {
            continue;
        };

        let mut maximum_distance = 0.0;
        let mut maximum_distance_index = None;
        for (index, position) in positions.iter().enumerate().take(to).skip(from + 1) {
            let Some(point) = position.point() else {
                continue;
            };
            let distance = orthogonal_distance(point, a, b).abs();
            if distance > maximum_distance {
                maximum_distance = distance;
                maximum_distance_index = Some(index);
            }
        }

        match maximum_distance_index {
            Some(index) if maximum_distance > threshold => {
                keep[index] = true;
                stack.push((from, index));
                stack.push((index, to));
            }
            _ => {}
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

//! Minimum-distance filtering via spatial hash grids.
//!
//! Both filters stream their input in order and keep a point only when no
//! previously kept point lies within the requested distance. Cell size
//! equals the distance, so only the immediate neighbor cells need checking
//! (27 in 3D, 9 in 2D). Earlier points always win, which keeps the result
//! stable for a fixed input order.

use std::collections::HashMap;

use crate::point::Point3;

#[inline]
fn cell_of(value: f64, size: f64) -> i64 {
    (value / size).floor() as i64
}

/// Keeps the subset of `points` whose pairwise 3D distance is at least
/// `min_dist`. A non-positive distance keeps everything.
pub fn filter_min_dist_3d(points: &[Point3], min_dist: f64) -> Vec<Point3> {
    if min_dist <= 0.0 || points.len() < 2 {
        return points.to_vec();
    }
    let size = min_dist;
    let dist_sq = min_dist * min_dist;
    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    let mut kept: Vec<Point3> = Vec::with_capacity(points.len());

    'next: for p in points {
        let (cx, cy, cz) = (cell_of(p.x, size), cell_of(p.y, size), cell_of(p.z, size));
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &idx in bucket {
                            let q = kept[idx];
                            let d = (p.x - q.x) * (p.x - q.x)
                                + (p.y - q.y) * (p.y - q.y)
                                + (p.z - q.z) * (p.z - q.z);
                            if d < dist_sq {
                                continue 'next;
                            }
                        }
                    }
                }
            }
        }
        grid.entry((cx, cy, cz)).or_default().push(kept.len());
        kept.push(*p);
    }
    kept
}

/// Screen-space variant over `(x, y, payload-index)` triples.
///
/// Returns the indices of the kept entries, in input order. Used after
/// projection to thin overlapping pixels without touching world geometry.
pub fn filter_min_dist_2d(positions: &[(f64, f64)], min_dist: f64) -> Vec<usize> {
    if min_dist <= 0.0 || positions.len() < 2 {
        return (0..positions.len()).collect();
    }
    let size = min_dist;
    let dist_sq = min_dist * min_dist;
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut kept: Vec<usize> = Vec::with_capacity(positions.len());

    'next: for (index, &(x, y)) in positions.iter().enumerate() {
        let (cx, cy) = (cell_of(x, size), cell_of(y, size));
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = grid.get(&(cx + dx, cy + dy)) {
                    for &kept_index in bucket {
                        let (qx, qy) = positions[kept_index];
                        let d = (x - qx) * (x - qx) + (y - qy) * (y - qy);
                        if d < dist_sq {
                            continue 'next;
                        }
                    }
                }
            }
        }
        grid.entry((cx, cy)).or_default().push(index);
        kept.push(index);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_is_a_no_op() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        assert_eq!(filter_min_dist_3d(&pts, 0.0).len(), 3);
    }

    #[test]
    fn close_pairs_keep_the_earlier_point() {
        let pts = vec![
            Point3::with_seed(0.0, 0.0, 0.0, 1),
            Point3::with_seed(0.05, 0.0, 0.0, 2),
            Point3::with_seed(5.0, 0.0, 0.0, 3),
        ];
        let kept = filter_min_dist_3d(&pts, 0.1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].seed, 1);
        assert_eq!(kept[1].seed, 3);
    }

    #[test]
    fn result_respects_the_minimum_distance() {
        // Dense line of points 0.01 apart, filtered to 0.1.
        let pts: Vec<Point3> = (0..200)
            .map(|i| Point3::with_seed(i as f64 * 0.01, 0.0, 0.0, i))
            .collect();
        let kept = filter_min_dist_3d(&pts, 0.1);
        for pair in kept.windows(2) {
            assert!((pair[1].x - pair[0].x) >= 0.1 - 1e-12);
        }
    }

    #[test]
    fn neighbor_cells_are_checked_across_boundaries() {
        // Two points in adjacent grid cells but closer than the distance.
        let pts = vec![
            Point3::new(0.099, 0.0, 0.0),
            Point3::new(0.101, 0.0, 0.0),
        ];
        assert_eq!(filter_min_dist_3d(&pts, 0.1).len(), 1);
    }

    #[test]
    fn screen_filter_returns_indices_in_order() {
        let positions = vec![(0.0, 0.0), (0.5, 0.0), (10.0, 10.0), (10.4, 10.0)];
        let kept = filter_min_dist_2d(&positions, 1.0);
        assert_eq!(kept, vec![0, 2]);
    }
}

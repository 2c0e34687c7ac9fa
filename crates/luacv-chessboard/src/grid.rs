//! Grid graph over corner candidates.
//!
//! 1. Estimate the spacing as the median nearest-neighbour distance.
//! 2. Estimate the grid axis from the nearest-neighbour directions,
//!    averaged in quadruple-angle space (the axis is defined modulo 90°).
//! 3. For each corner keep at most one neighbour per direction
//!    (right/down/left/up) whose distance and direction fit the grid.
//! 4. Keep symmetric edges only, take the largest connected component and
//!    BFS integer coordinates over it.

use std::collections::{HashMap, VecDeque};
use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::{Point2, Vector2};

use crate::params::ChessboardParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NeighborDirection {
    Right,
    Down,
    Left,
    Up,
}

impl NeighborDirection {
    const ALL: [NeighborDirection; 4] = [
        NeighborDirection::Right,
        NeighborDirection::Down,
        NeighborDirection::Left,
        NeighborDirection::Up,
    ];

    fn from_quadrant(k: i32) -> Self {
        Self::ALL[k.rem_euclid(4) as usize]
    }

    fn opposite(self) -> Self {
        match self {
            NeighborDirection::Right => NeighborDirection::Left,
            NeighborDirection::Left => NeighborDirection::Right,
            NeighborDirection::Down => NeighborDirection::Up,
            NeighborDirection::Up => NeighborDirection::Down,
        }
    }

    fn step(self) -> (i32, i32) {
        match self {
            NeighborDirection::Right => (1, 0),
            NeighborDirection::Left => (-1, 0),
            NeighborDirection::Up => (0, -1),
            NeighborDirection::Down => (0, 1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeNeighbor {
    pub direction: NeighborDirection,
    pub index: usize,
    pub distance: f32,
    pub score: f32,
}

fn nearest_distances(points: &[Point2<f32>]) -> Vec<(usize, f32)> {
    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, q)| (j, (q - p).norm()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
        })
        .collect()
}

/// Median nearest-neighbour distance, ignoring pairs closer than
/// `min_spacing`.
pub fn estimate_spacing(points: &[Point2<f32>], min_spacing: f32) -> Option<f32> {
    let mut dists: Vec<f32> = nearest_distances(points)
        .into_iter()
        .map(|(_, d)| d)
        .filter(|d| *d >= min_spacing)
        .collect();
    if dists.is_empty() {
        return None;
    }
    dists.sort_by(f32::total_cmp);
    Some(dists[dists.len() / 2])
}

/// Dominant grid axis angle in `(-π/4, π/4]`.
pub fn estimate_axis(points: &[Point2<f32>]) -> Option<f32> {
    let mut sum = Vector2::<f32>::zeros();
    for (i, (j, _)) in nearest_distances(points).into_iter().enumerate() {
        let v = points[j] - points[i];
        let four_theta = 4.0 * v.y.atan2(v.x);
        sum += Vector2::new(four_theta.cos(), four_theta.sin());
    }
    if sum.norm_squared() < 1e-6 {
        return None;
    }
    Some(0.25 * sum.y.atan2(sum.x))
}

/// Keep at most one neighbor per direction, choosing the lowest-score candidate.
fn select_neighbors(candidates: Vec<NodeNeighbor>) -> Vec<NodeNeighbor> {
    let mut best: [Option<NodeNeighbor>; 4] = [None, None, None, None];

    for candidate in candidates {
        let slot = &mut best[candidate.direction as usize];
        let replace = match slot {
            None => true,
            Some(current) => {
                candidate.score < current.score
                    || (candidate.score == current.score && candidate.distance < current.distance)
            }
        };
        if replace {
            *slot = Some(candidate);
        }
    }

    best.into_iter().flatten().collect()
}

pub struct GridGraph {
    pub neighbors: Vec<Vec<NodeNeighbor>>,
}

impl GridGraph {
    pub fn new(points: &[Point2<f32>], spacing: f32, axis: f32, params: &ChessboardParams) -> Self {
        let min_d = (1.0 - params.spacing_tolerance) * spacing;
        let max_d = (1.0 + params.spacing_tolerance) * spacing;
        let tol = params.orientation_tolerance_deg.to_radians();

        let mut neighbors: Vec<Vec<NodeNeighbor>> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let candidates = points
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .filter_map(|(j, q)| {
                        let v = q - p;
                        let distance = v.norm();
                        if distance < min_d || distance > max_d {
                            return None;
                        }
                        // Angle relative to the grid axis, in (-π, π].
                        let mut phi = v.y.atan2(v.x) - axis;
                        phi = (phi + PI).rem_euclid(2.0 * PI) - PI;
                        let k = (phi / FRAC_PI_2).round();
                        let deviation = (phi - k * FRAC_PI_2).abs();
                        if deviation > tol {
                            return None;
                        }
                        Some(NodeNeighbor {
                            direction: NeighborDirection::from_quadrant(k as i32),
                            index: j,
                            distance,
                            score: deviation + (distance - spacing).abs() / spacing,
                        })
                    })
                    .collect();
                select_neighbors(candidates)
            })
            .collect();

        // Drop one-sided edges.
        let snapshot: Vec<Vec<(usize, NeighborDirection)>> = neighbors
            .iter()
            .map(|list| list.iter().map(|n| (n.index, n.direction)).collect())
            .collect();
        for (i, list) in neighbors.iter_mut().enumerate() {
            list.retain(|n| snapshot[n.index].contains(&(i, n.direction.opposite())));
        }

        Self { neighbors }
    }

    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.neighbors.len()];
        let mut components = Vec::new();

        for start in 0..self.neighbors.len() {
            if visited[start] {
                continue;
            }

            let mut component = Vec::new();
            let mut stack = vec![start];

            while let Some(node) = stack.pop() {
                if visited[node] {
                    continue;
                }
                visited[node] = true;
                component.push(node);

                for neighbor in &self.neighbors[node] {
                    if !visited[neighbor.index] {
                        stack.push(neighbor.index);
                    }
                }
            }

            components.push(component);
        }

        components
    }

    /// Integer `(i, j)` for every node of `component`, shifted so the
    /// minimum is `(0, 0)`. `None` if two paths disagree about a node or two
    /// nodes land on the same cell.
    pub fn assign_grid_coordinates(&self, component: &[usize]) -> Option<HashMap<usize, (i32, i32)>> {
        let start = *component.first()?;
        let mut coords: HashMap<usize, (i32, i32)> = HashMap::with_capacity(component.len());
        let mut queue = VecDeque::from([(start, (0, 0))]);

        while let Some((node, ij)) = queue.pop_front() {
            if let Some(seen) = coords.get(&node) {
                if *seen != ij {
                    log::debug!("grid conflict at node {node}: {seen:?} vs {ij:?}");
                    return None;
                }
                continue;
            }
            coords.insert(node, ij);
            for neighbor in &self.neighbors[node] {
                let (di, dj) = neighbor.direction.step();
                queue.push_back((neighbor.index, (ij.0 + di, ij.1 + dj)));
            }
        }

        let min_i = coords.values().map(|c| c.0).min()?;
        let min_j = coords.values().map(|c| c.1).min()?;
        for c in coords.values_mut() {
            *c = (c.0 - min_i, c.1 - min_j);
        }

        let mut cells: Vec<(i32, i32)> = coords.values().copied().collect();
        cells.sort_unstable();
        cells.dedup();
        if cells.len() != coords.len() {
            log::debug!("grid has {} nodes on {} cells", coords.len(), cells.len());
            return None;
        }
        Some(coords)
    }
}

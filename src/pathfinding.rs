use crate::grid::Grid;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

type Cell = (i32, i32);

#[derive(Clone, Copy, PartialEq, Eq)]
struct ScoredNode {
    node: Cell,
    cost: u32,
}

// BinaryHeap is a max-heap, so we reverse the ordering for min-heap behavior.
// Equal costs fall back to the coordinates so expansion order is stable.
impl Ord for ScoredNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for ScoredNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest 4-directional path from `start` to `goal` using Dijkstra's
/// algorithm with unit edge weights.
///
/// The search only considers free cells inside the square of half-width
/// `radius` around `start`, plus the two endpoints themselves (the goal is
/// usually occupied by whoever is being chased). Returns the path including
/// both endpoints, or None if the goal is unreachable within the radius.
pub fn route(grid: &Grid, start: Cell, goal: Cell, radius: i32) -> Option<Vec<Cell>> {
    puffin::profile_function!();

    if !grid.in_bounds(start.0, start.1) || !grid.in_bounds(goal.0, goal.1) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut nodes: HashSet<Cell> = grid
        .cells_in_radius(start.0, start.1, radius)
        .filter(|&(r, c)| grid.is_free(r, c))
        .collect();
    nodes.insert(start);
    nodes.insert(goal);

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut dist: HashMap<Cell, u32> = HashMap::new();

    dist.insert(start, 0);
    open_set.push(ScoredNode {
        node: start,
        cost: 0,
    });

    while let Some(current) = open_set.pop() {
        if current.node == goal {
            return Some(reconstruct_path(&came_from, current.node));
        }

        // Stale entry, a shorter way here was already expanded
        if current.cost > *dist.get(&current.node).unwrap_or(&u32::MAX) {
            continue;
        }

        for neighbor in grid.neighbors(current.node.0, current.node.1) {
            if !nodes.contains(&neighbor) {
                continue;
            }

            let tentative = current.cost + 1;
            if tentative < *dist.get(&neighbor).unwrap_or(&u32::MAX) {
                came_from.insert(neighbor, current.node);
                dist.insert(neighbor, tentative);
                open_set.push(ScoredNode {
                    node: neighbor,
                    cost: tentative,
                });
            }
        }
    }

    None
}

/// The first step of the route toward `goal`, if there is one.
pub fn next_step_toward(grid: &Grid, start: Cell, goal: Cell, radius: i32) -> Option<Cell> {
    route(grid, start, goal, radius).and_then(|path| path.get(1).copied())
}

/// Reconstruct the path from came_from map, start included
fn reconstruct_path(came_from: &HashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

//! A* search over the hex board.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use circles_core::HexCoord;

use crate::grid::HexGrid;

/// Frontier entry ordered so the heap pops the lowest `f` first and, among
/// equal `f`, the entry discovered first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierNode {
    estimate: u32,
    sequence: u64,
    cost: u32,
    coord: HexCoord,
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reports whether a search may step onto `coord`.
///
/// Empty hexes are always enterable. The target may additionally hold a unit
/// or structure so paths can end against something the hero interacts with.
fn is_enterable(grid: &HexGrid, coord: HexCoord, target: HexCoord) -> bool {
    grid.occupancy(coord).is_some_and(|occupancy| {
        occupancy.is_empty() || (coord == target && occupancy.is_interactive())
    })
}

/// Shortest path from `source` to `target`.
///
/// The returned sequence starts adjacent to `source` (which is excluded) and
/// ends at `target`. An empty sequence means no route exists; asking for a
/// path from a hex to itself also yields an empty sequence.
#[must_use]
pub fn find_path(grid: &HexGrid, source: HexCoord, target: HexCoord) -> Vec<HexCoord> {
    if source == target || !grid.contains(source) || !grid.contains(target) {
        return Vec::new();
    }

    let mut frontier = BinaryHeap::new();
    let mut best_cost: HashMap<HexCoord, u32> = HashMap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut sequence: u64 = 0;

    let _ = best_cost.insert(source, 0);
    frontier.push(FrontierNode {
        estimate: source.distance(target),
        sequence,
        cost: 0,
        coord: source,
    });

    let mut reached = false;
    while let Some(node) = frontier.pop() {
        if node.coord == target {
            reached = true;
            break;
        }

        if best_cost
            .get(&node.coord)
            .is_some_and(|&known| known < node.cost)
        {
            continue;
        }

        let next_cost = node.cost + 1;
        for neighbor in grid.neighbors(node.coord) {
            if !is_enterable(grid, neighbor, target) {
                continue;
            }
            if best_cost
                .get(&neighbor)
                .is_some_and(|&known| known <= next_cost)
            {
                continue;
            }

            let _ = best_cost.insert(neighbor, next_cost);
            let _ = came_from.insert(neighbor, node.coord);
            sequence += 1;
            frontier.push(FrontierNode {
                estimate: next_cost + neighbor.distance(target),
                sequence,
                cost: next_cost,
                coord: neighbor,
            });
        }
    }

    if !reached {
        return Vec::new();
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(&previous) = came_from.get(&current) {
        if previous == source {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

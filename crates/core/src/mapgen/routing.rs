//! Corridor selection: minimum spanning tree over the triangulation plus a
//! random share of the remaining edges to create loops.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::seed::roll;
use super::triangulation::Edge;
use crate::types::PlanPoint;

/// Corridors chosen for one floor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    pub tree: Vec<Edge>,
    /// Non-tree edges kept by the cycle roll.
    pub extra: Vec<Edge>,
}

impl Routing {
    pub fn selected(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.tree.iter().chain(&self.extra)
    }

    pub fn len(&self) -> usize {
        self.tree.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.extra.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    edge: Edge,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the lightest edge; ties fall back to endpoints.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .edge
            .weight
            .total_cmp(&self.edge.weight)
            .then_with(|| other.edge.key().cmp(&self.edge.key()))
    }
}

/// Prim's algorithm. Every component of the input graph gets its own tree,
/// grown from its smallest vertex, so a disconnected input yields a forest.
pub fn minimum_spanning_tree(edges: &[Edge]) -> Vec<Edge> {
    let mut adjacency: BTreeMap<PlanPoint, Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        if edge.a == edge.b {
            continue;
        }
        adjacency.entry(edge.a).or_default().push(*edge);
        adjacency.entry(edge.b).or_default().push(*edge);
    }

    let mut visited = BTreeSet::new();
    let mut tree = Vec::new();
    let roots: Vec<PlanPoint> = adjacency.keys().copied().collect();
    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        let mut frontier: BinaryHeap<Frontier> =
            adjacency[&root].iter().map(|&edge| Frontier { edge }).collect();

        while let Some(Frontier { edge }) = frontier.pop() {
            let next = match (visited.contains(&edge.a), visited.contains(&edge.b)) {
                (true, false) => edge.b,
                (false, true) => edge.a,
                _ => continue,
            };
            visited.insert(next);
            tree.push(edge);
            for &candidate in &adjacency[&next] {
                let other = if candidate.a == next { candidate.b } else { candidate.a };
                if !visited.contains(&other) {
                    frontier.push(Frontier { edge: candidate });
                }
            }
        }
    }
    tree
}

/// Spanning tree plus each remaining edge with probability `cycle_chance`.
/// Remaining edges are rolled in ascending endpoint order, one draw each.
pub fn route(edges: &[Edge], cycle_chance: f64, rng: &mut ChaCha8Rng) -> Routing {
    let tree = minimum_spanning_tree(edges);
    let in_tree: BTreeSet<_> = tree.iter().map(Edge::key).collect();

    let mut remaining: Vec<Edge> = edges
        .iter()
        .filter(|edge| edge.a != edge.b && !in_tree.contains(&edge.key()))
        .copied()
        .collect();
    remaining.sort_by(|a, b| a.key().cmp(&b.key()));
    remaining.dedup_by_key(|edge| edge.key());

    let extra = remaining.into_iter().filter(|_| roll(rng, cycle_chance)).collect();
    Routing { tree, extra }
}

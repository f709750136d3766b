//! Delaunay triangulation of one floor's door points.
//!
//! Incremental Bowyer–Watson over integer plan coordinates. The in-circle and
//! orientation predicates are evaluated exactly in `i128`, so cocircular door
//! layouts (common on a lattice) triangulate the same way on every platform.
//! Inputs with fewer than three distinct points, or with all points on one
//! line, are handled without triangles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::PlanPoint;

/// Candidate or selected corridor between two door points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: PlanPoint,
    pub b: PlanPoint,
    pub weight: f64,
}

impl Edge {
    /// Endpoints are stored in ascending order so `(a, b)` and `(b, a)` compare equal.
    pub fn new(a: PlanPoint, b: PlanPoint) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { a, b, weight: a.distance(b) }
    }

    pub fn key(&self) -> (PlanPoint, PlanPoint) {
        (self.a, self.b)
    }
}

/// Axis-aligned plan rectangle of a floor, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanBounds {
    pub min: PlanPoint,
    pub max: PlanPoint,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangulation {
    pub points: Vec<PlanPoint>,
    pub triangles: Vec<[PlanPoint; 3]>,
    pub edges: Vec<Edge>,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    vertices: [usize; 3],
}

pub fn triangulate(points: &[PlanPoint], bounds: PlanBounds) -> Triangulation {
    let unique: BTreeSet<PlanPoint> = points.iter().copied().collect();
    let points: Vec<PlanPoint> = unique.into_iter().collect();

    match points.len() {
        0 | 1 => return Triangulation { points, ..Triangulation::default() },
        2 => {
            let edges = vec![Edge::new(points[0], points[1])];
            return Triangulation { points, triangles: Vec::new(), edges };
        }
        _ => {}
    }

    if points.iter().all(|&p| orientation(points[0], points[1], p) == 0) {
        // Sorted order is the order along the line.
        let edges = points.windows(2).map(|w| Edge::new(w[0], w[1])).collect();
        return Triangulation { points, triangles: Vec::new(), edges };
    }

    let (vertices, triangles) = bowyer_watson(&points, bounds);
    let real = points.len();
    let kept: Vec<Triangle> =
        triangles.into_iter().filter(|t| t.vertices.iter().all(|&v| v < real)).collect();

    let mut index_pairs = BTreeSet::new();
    for triangle in &kept {
        let [a, b, c] = triangle.vertices;
        for (u, v) in [(a, b), (b, c), (c, a)] {
            index_pairs.insert((u.min(v), u.max(v)));
        }
    }
    bridge_components(&points, &mut index_pairs);

    let edges = index_pairs.into_iter().map(|(u, v)| Edge::new(points[u], points[v])).collect();
    let triangles = kept
        .iter()
        .map(|t| [vertices[t.vertices[0]], vertices[t.vertices[1]], vertices[t.vertices[2]]])
        .collect();
    Triangulation { points, triangles, edges }
}

fn bowyer_watson(points: &[PlanPoint], bounds: PlanBounds) -> (Vec<PlanPoint>, Vec<Triangle>) {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0).min(bounds.min.x);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0).max(bounds.max.x);
    let min_z = points.iter().map(|p| p.z).min().unwrap_or(0).min(bounds.min.z);
    let max_z = points.iter().map(|p| p.z).max().unwrap_or(0).max(bounds.max.z);
    let span = (max_x - min_x).max(max_z - min_z).max(1);
    let mid_x = (min_x + max_x) / 2;
    let mid_z = (min_z + max_z) / 2;

    let mut vertices = points.to_vec();
    let super_start = vertices.len();
    vertices.push(PlanPoint::new(mid_x - 100 * span, mid_z - 100 * span));
    vertices.push(PlanPoint::new(mid_x + 100 * span, mid_z - 100 * span));
    vertices.push(PlanPoint::new(mid_x, mid_z + 100 * span));

    let mut triangles =
        vec![ccw_triangle(&vertices, [super_start, super_start + 1, super_start + 2])];

    for point_index in 0..points.len() {
        let point = vertices[point_index];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| in_circumcircle(&vertices, t, point));
        triangles = good;

        let mut edge_uses: BTreeMap<(usize, usize), u32> = BTreeMap::new();
        for triangle in &bad {
            let [a, b, c] = triangle.vertices;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_uses.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        for ((u, v), uses) in edge_uses {
            if uses != 1 {
                continue;
            }
            if orientation(vertices[u], vertices[v], point) == 0 {
                continue;
            }
            triangles.push(ccw_triangle(&vertices, [u, v, point_index]));
        }
    }

    (vertices, triangles)
}

/// Joins components left apart by missing hull triangles using their closest
/// point pair. Only reachable for near-degenerate inputs.
fn bridge_components(points: &[PlanPoint], pairs: &mut BTreeSet<(usize, usize)>) {
    loop {
        let component = components(points.len(), pairs);
        let Some(&first) = component.first() else {
            return;
        };
        if component.iter().all(|&c| c == first) {
            return;
        }

        let mut best: Option<(i64, usize, usize)> = None;
        for u in 0..points.len() {
            for v in 0..points.len() {
                if component[u] != first || component[v] == first {
                    continue;
                }
                let dx = i64::from(points[u].x - points[v].x);
                let dz = i64::from(points[u].z - points[v].z);
                let candidate = (dx * dx + dz * dz, u.min(v), u.max(v));
                if best.is_none_or(|current| candidate < current) {
                    best = Some(candidate);
                }
            }
        }
        match best {
            Some((_, u, v)) => {
                pairs.insert((u, v));
            }
            None => return,
        }
    }
}

fn components(count: usize, pairs: &BTreeSet<(usize, usize)>) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..count).collect();
    fn find(parent: &mut [usize], mut node: usize) -> usize {
        while parent[node] != node {
            parent[node] = parent[parent[node]];
            node = parent[node];
        }
        node
    }
    for &(u, v) in pairs {
        let root_u = find(&mut parent, u);
        let root_v = find(&mut parent, v);
        if root_u != root_v {
            parent[root_u.max(root_v)] = root_u.min(root_v);
        }
    }
    (0..count).map(|node| find(&mut parent, node)).collect()
}

fn ccw_triangle(vertices: &[PlanPoint], [a, b, c]: [usize; 3]) -> Triangle {
    if orientation(vertices[a], vertices[b], vertices[c]) < 0 {
        Triangle { vertices: [a, c, b] }
    } else {
        Triangle { vertices: [a, b, c] }
    }
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
fn orientation(a: PlanPoint, b: PlanPoint, c: PlanPoint) -> i128 {
    let abx = i128::from(b.x - a.x);
    let abz = i128::from(b.z - a.z);
    let acx = i128::from(c.x - a.x);
    let acz = i128::from(c.z - a.z);
    abx * acz - abz * acx
}

fn in_circumcircle(vertices: &[PlanPoint], triangle: &Triangle, point: PlanPoint) -> bool {
    let [a, b, c] = triangle.vertices.map(|index| vertices[index]);
    let (adx, adz) = (i128::from(a.x - point.x), i128::from(a.z - point.z));
    let (bdx, bdz) = (i128::from(b.x - point.x), i128::from(b.z - point.z));
    let (cdx, cdz) = (i128::from(c.x - point.x), i128::from(c.z - point.z));
    let det = (adx * adx + adz * adz) * (bdx * cdz - cdx * bdz)
        - (bdx * bdx + bdz * bdz) * (adx * cdz - cdx * adz)
        + (cdx * cdx + cdz * cdz) * (adx * bdz - bdx * adz);
    det > 0
}

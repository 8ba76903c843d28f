use tracing::debug;

use crate::{errors::IndexError, metric::Metric};

/// Result of a nearest-neighbour query: position in the input point set and
/// the metric distance to the query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

struct Node {
    start: usize,
    end: usize,
    centroid: [f64; 2],
    radius: f64,
    children: Option<(usize, usize)>,
}

/// Ball tree over `[lat, lon]` points.
///
/// Every node stores the centroid of its points and the largest metric
/// distance from that centroid to any of them, so a whole node can be skipped
/// once `distance(query, centroid) - radius` exceeds the best match so far.
/// Nodes holding more than `leaf_size` points are split at the median of the
/// coordinate with the largest spread.
///
/// The tree keeps its own copy of the points; `Neighbor::index` refers to
/// their order as passed to [`BallTree::new`].
pub struct BallTree {
    points: Vec<[f64; 2]>,
    order: Vec<usize>,
    nodes: Vec<Node>,
    leaf_size: usize,
    metric: Metric,
}

impl BallTree {
    pub fn new(points: Vec<[f64; 2]>, leaf_size: usize, metric: Metric) -> Result<Self, IndexError> {
        if leaf_size == 0 {
            return Err(IndexError::InvalidLeafSize);
        }
        if let Metric::Minkowski(p) = metric {
            if !p.is_finite() || p < 1.0 {
                return Err(IndexError::InvalidMinkowskiPower(p));
            }
        }
        if points.is_empty() {
            return Err(IndexError::EmptyPointSet);
        }
        if let Some((index, p)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(IndexError::NonFiniteCoordinate {
                index,
                lat: p[0],
                lon: p[1],
            });
        }

        let mut tree = Self {
            order: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / leaf_size + 1),
            points,
            leaf_size,
            metric,
        };
        tree.build_node(0, tree.points.len());
        debug!(
            points = tree.points.len(),
            nodes = tree.nodes.len(),
            leaf_size,
            metric = %metric,
            "ball tree built"
        );
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn point(&self, index: usize) -> Option<&[f64; 2]> {
        self.points.get(index)
    }

    /// Find the single closest point to `query`.
    ///
    /// Among equidistant points the first one reached by the depth-first
    /// traversal is kept, which depends on how the tree happened to split.
    pub fn query_nearest(&self, query: &[f64; 2]) -> Result<Neighbor, IndexError> {
        if !(query[0].is_finite() && query[1].is_finite()) {
            return Err(IndexError::NonFiniteQuery {
                lat: query[0],
                lon: query[1],
            });
        }
        let first = self.order[0];
        let mut best = Neighbor {
            index: first,
            distance: self.metric.distance(query, &self.points[first]),
        };
        self.search(0, query, &mut best);
        Ok(best)
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let members = &self.order[start..end];
        let centroid = centroid(&self.points, members);
        let radius = members
            .iter()
            .map(|&i| self.metric.distance(&centroid, &self.points[i]))
            .fold(0.0, f64::max);

        let id = self.nodes.len();
        self.nodes.push(Node {
            start,
            end,
            centroid,
            radius,
            children: None,
        });

        if end - start > self.leaf_size {
            let axis = widest_axis(&self.points, members);
            let mid = start + (end - start) / 2;
            let points = &self.points;
            self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
                points[a][axis].total_cmp(&points[b][axis])
            });
            let left = self.build_node(start, mid);
            let right = self.build_node(mid, end);
            self.nodes[id].children = Some((left, right));
        }
        id
    }

    fn lower_bound(&self, node: usize, query: &[f64; 2]) -> f64 {
        let node = &self.nodes[node];
        (self.metric.distance(query, &node.centroid) - node.radius).max(0.0)
    }

    fn search(&self, node: usize, query: &[f64; 2], best: &mut Neighbor) {
        let current = &self.nodes[node];
        match current.children {
            None => {
                for &i in &self.order[current.start..current.end] {
                    let distance = self.metric.distance(query, &self.points[i]);
                    if distance < best.distance {
                        *best = Neighbor { index: i, distance };
                    }
                }
            }
            Some((left, right)) => {
                let left_bound = self.lower_bound(left, query);
                let right_bound = self.lower_bound(right, query);
                let (near, near_bound, far, far_bound) = if left_bound <= right_bound {
                    (left, left_bound, right, right_bound)
                } else {
                    (right, right_bound, left, left_bound)
                };
                if near_bound < best.distance {
                    self.search(near, query, best);
                }
                if far_bound < best.distance {
                    self.search(far, query, best);
                }
            }
        }
    }
}

fn centroid(points: &[[f64; 2]], members: &[usize]) -> [f64; 2] {
    let n = members.len() as f64;
    let (sum_a, sum_b) = members.iter().fold((0.0, 0.0), |(a, b), &i| {
        (a + points[i][0], b + points[i][1])
    });
    [sum_a / n, sum_b / n]
}

fn widest_axis(points: &[[f64; 2]], members: &[usize]) -> usize {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for &i in members {
        for axis in 0..2 {
            min[axis] = min[axis].min(points[i][axis]);
            max[axis] = max[axis].max(points[i][axis]);
        }
    }
    if max[1] - min[1] > max[0] - min[0] {
        1
    } else {
        0
    }
}

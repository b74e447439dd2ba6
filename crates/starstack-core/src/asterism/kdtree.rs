//! Exact nearest-neighbour index over fixed-dimension points.

/// A k-d tree over `D`-dimensional points.
///
/// Built once with median splits, queried many times. Queries return the
/// exact nearest point; among equidistant points the lowest index wins.
#[derive(Debug)]
pub struct KdTree<const D: usize> {
    nodes: Vec<KdNode>,
    points: Vec<[f64; D]>,
    root: Option<usize>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    split_dim: usize,
}

impl<const D: usize> KdTree<D> {
    pub fn build(points: &[[f64; D]]) -> Self {
        let points_vec = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = Self::build_recursive(&points_vec, &mut indices, 0, &mut nodes);

        Self {
            nodes,
            points: points_vec,
            root,
        }
    }

    fn build_recursive(
        points: &[[f64; D]],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % D;
        indices.sort_by(|&a, &b| {
            points[a][split_dim]
                .total_cmp(&points[b][split_dim])
                .then(a.cmp(&b))
        });

        let median = indices.len() / 2;
        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);
        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest point to `query` as `(index, euclidean_distance)`.
    pub fn nearest(&self, query: &[f64; D]) -> Option<(usize, f64)> {
        let root = self.root?;
        let mut best = (usize::MAX, f64::INFINITY);
        self.nearest_recursive(root, query, &mut best);
        Some((best.0, best.1.sqrt()))
    }

    fn nearest_recursive(&self, node_idx: usize, query: &[f64; D], best: &mut (usize, f64)) {
        let node = &self.nodes[node_idx];
        let point = &self.points[node.point_idx];

        let dist_sq = distance_squared(query, point);
        if dist_sq < best.1 || (dist_sq == best.1 && node.point_idx < best.0) {
            *best = (node.point_idx, dist_sq);
        }

        let diff = query[node.split_dim] - point[node.split_dim];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(first_idx) = first {
            self.nearest_recursive(first_idx, query, best);
        }

        // `<=` keeps equidistant candidates on the far side reachable for the
        // lowest-index tie break.
        if let Some(second_idx) = second {
            if diff * diff <= best.1 {
                self.nearest_recursive(second_idx, query, best);
            }
        }
    }
}

#[inline]
fn distance_squared<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

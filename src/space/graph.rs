use rand::seq::IndexedRandom;
use rand::RngCore;

use crate::model::MapType;

use super::TransportSpace;

/// Node label in a graph space.
pub type NodeId = u64;

const NO_PRED: usize = usize::MAX;

/// Weighted graph over integer node labels, directed or undirected, with
/// constant velocity. All-pairs shortest paths are precomputed at
/// construction (Floyd-Warshall with predecessors), so `d`/`t` are O(1)
/// lookups and interpolation walks the predecessor chain.
///
/// Directed graphs give an asymmetric metric, which the rest of the engine
/// tolerates.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<NodeId>,
    index: MapType<NodeId, usize>,
    dist: Vec<f64>,
    pred: Vec<usize>,
    velocity: f64,
}

impl Graph {
    pub fn undirected(
        nodes: Vec<NodeId>,
        edges: &[(NodeId, NodeId, f64)],
        velocity: f64,
    ) -> anyhow::Result<Self> {
        Self::build(nodes, edges, velocity, false)
    }

    pub fn directed(
        nodes: Vec<NodeId>,
        edges: &[(NodeId, NodeId, f64)],
        velocity: f64,
    ) -> anyhow::Result<Self> {
        Self::build(nodes, edges, velocity, true)
    }

    fn build(
        nodes: Vec<NodeId>,
        edges: &[(NodeId, NodeId, f64)],
        velocity: f64,
        directed: bool,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!nodes.is_empty(), "a graph space needs at least one node");
        anyhow::ensure!(velocity > 0.0, "velocity must be positive");

        let index: MapType<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        anyhow::ensure!(index.len() == nodes.len(), "duplicate node labels");

        let n = nodes.len();
        let mut dist = vec![f64::INFINITY; n * n];
        let mut pred = vec![NO_PRED; n * n];
        for i in 0..n {
            dist[i * n + i] = 0.0;
        }
        for &(u, v, w) in edges {
            anyhow::ensure!(w >= 0.0, "negative edge weight {} on ({}, {})", w, u, v);
            let (ui, vi) = match (index.get(&u), index.get(&v)) {
                (Some(&ui), Some(&vi)) => (ui, vi),
                _ => anyhow::bail!("edge ({}, {}) references an unknown node", u, v),
            };
            if w < dist[ui * n + vi] {
                dist[ui * n + vi] = w;
                pred[ui * n + vi] = ui;
            }
            if !directed && w < dist[vi * n + ui] {
                dist[vi * n + ui] = w;
                pred[vi * n + ui] = vi;
            }
        }

        for k in 0..n {
            for i in 0..n {
                let dik = dist[i * n + k];
                if !dik.is_finite() {
                    continue;
                }
                for j in 0..n {
                    let through = dik + dist[k * n + j];
                    if through < dist[i * n + j] {
                        dist[i * n + j] = through;
                        pred[i * n + j] = pred[k * n + j];
                    }
                }
            }
        }

        Ok(Self {
            nodes,
            index,
            dist,
            pred,
            velocity,
        })
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn idx(&self, node: &NodeId) -> usize {
        *self
            .index
            .get(node)
            .unwrap_or_else(|| panic!("location {} is not a node of this graph", node))
    }

    fn dist_idx(&self, ui: usize, vi: usize) -> f64 {
        self.dist[ui * self.nodes.len() + vi]
    }

    /// Shortest-path node sequence from `u` to `v`, inclusive.
    pub fn shortest_path(&self, u: NodeId, v: NodeId) -> Vec<NodeId> {
        let (ui, vi) = (self.idx(&u), self.idx(&v));
        let mut seq = vec![v];
        let mut cur = vi;
        while cur != ui {
            cur = self.pred[ui * self.nodes.len() + cur];
            assert!(cur != NO_PRED, "no path from {} to {}", u, v);
            seq.push(self.nodes[cur]);
        }
        seq.reverse();
        seq
    }
}

impl TransportSpace for Graph {
    type Loc = NodeId;

    fn d(&self, u: &NodeId, v: &NodeId) -> f64 {
        self.dist_idx(self.idx(u), self.idx(v))
    }

    fn t(&self, u: &NodeId, v: &NodeId) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_time(&self, u: &NodeId, v: &NodeId, time_to_dest: f64) -> (NodeId, f64) {
        let (next_node, jump_dist) = self.interp_dist(u, v, time_to_dest * self.velocity);
        (next_node, jump_dist / self.velocity)
    }

    fn interp_dist(&self, u: &NodeId, v: &NodeId, dist_to_dest: f64) -> (NodeId, f64) {
        if u == v {
            return (*v, 0.0);
        }
        let n = self.nodes.len();
        let (ui, vi) = (self.idx(u), self.idx(v));
        assert!(
            self.dist_idx(ui, vi).is_finite(),
            "no path from {} to {}",
            u,
            v
        );

        // Walk the shortest path backwards from v until the predecessor is
        // at least dist_to_dest away from the destination.
        let mut next_node = vi;
        let mut predecessor = vi;
        let mut predecessor_dist = 0.0;
        while next_node != ui {
            predecessor = self.pred[ui * n + next_node];
            predecessor_dist = self.dist_idx(predecessor, vi);
            if predecessor_dist >= dist_to_dest {
                break;
            }
            next_node = predecessor;
        }

        if predecessor_dist > dist_to_dest {
            // mid-edge: location resolves to next_node after the residual jump
            (
                self.nodes[next_node],
                dist_to_dest - self.dist_idx(next_node, vi),
            )
        } else {
            (self.nodes[predecessor], 0.0)
        }
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> NodeId {
        *self
            .nodes
            .choose(rng)
            .expect("a graph space always has nodes")
    }

    fn contains(&self, loc: &NodeId) -> bool {
        self.index.contains_key(loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Graph {
        // 0 -- 1 -- 2 -- 3, unit edges
        Graph::undirected(
            vec![0, 1, 2, 3],
            &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn shortest_path_distances() {
        let g = line_graph();
        assert_eq!(g.d(&0, &3), 3.0);
        assert_eq!(g.d(&3, &0), 3.0);
        assert_eq!(g.d(&2, &2), 0.0);
        assert_eq!(g.shortest_path(0, 3), vec![0, 1, 2, 3]);
    }

    #[test]
    fn directed_graph_is_asymmetric() {
        let g = Graph::directed(vec![0, 1], &[(0, 1, 1.0)], 1.0).unwrap();
        assert_eq!(g.d(&0, &1), 1.0);
        assert!(g.d(&1, &0).is_infinite());
    }

    #[test]
    fn interp_time_reports_the_jump() {
        let g = line_graph();
        // 1.5 time units from node 3: between nodes 1 and 2, resolving to
        // node 2 after half a time unit.
        let (node, jump) = g.interp_time(&0, &3, 1.5);
        assert_eq!(node, 2);
        assert!((jump - 0.5).abs() < 1e-12);

        // exactly on a node: zero jump
        let (node, jump) = g.interp_time(&0, &3, 1.0);
        assert_eq!(node, 2);
        assert_eq!(jump, 0.0);
    }

    #[test]
    fn interp_with_velocity_scales_jumps() {
        let g = Graph::undirected(vec![0, 1], &[(0, 1, 2.0)], 2.0).unwrap();
        assert_eq!(g.t(&0, &1), 1.0);
        let (node, jump) = g.interp_time(&0, &1, 0.25);
        assert_eq!(node, 1);
        assert!((jump - 0.25).abs() < 1e-12);
    }

    #[test]
    fn parallel_edges_keep_the_lighter_one() {
        let g = Graph::undirected(vec![0, 1], &[(0, 1, 3.0), (0, 1, 1.0)], 1.0).unwrap();
        assert_eq!(g.d(&0, &1), 1.0);
    }

    #[test]
    fn contains_checks_membership() {
        let g = line_graph();
        assert!(g.contains(&0));
        assert!(!g.contains(&17));
    }

    #[test]
    fn unknown_edge_node_is_rejected() {
        assert!(Graph::undirected(vec![0, 1], &[(0, 7, 1.0)], 1.0).is_err());
    }
}

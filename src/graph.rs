//! The road network on which emergency vehicles are routed.
//!
//! A [`Graph`] is an immutable snapshot: regenerating capacities produces a new graph, so any
//! optimisation already running against the old one is unaffected.
use crate::error::{RoutingError, RoutingResult};
use crate::id::define_id_type;
use crate::units::{Distance, Flow};
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::{dijkstra, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

define_id_type! {NodeID}

/// The key of an edge: the ordered pair of its endpoints
pub type EdgeKey = (NodeID, NodeID);

/// A directed road segment
#[derive(PartialEq, Debug, Clone)]
pub struct Edge {
    /// The node the edge leaves
    pub from: NodeID,
    /// The node the edge enters
    pub to: NodeID,
    /// Length of the road segment
    pub distance: Distance,
    /// Ceiling on the total flow of all commodities crossing the edge
    pub capacity: Flow,
}

impl Edge {
    /// Create a new [`Edge`]
    pub fn new(from: NodeID, to: NodeID, distance: Distance, capacity: Flow) -> Self {
        Self {
            from,
            to,
            distance,
            capacity,
        }
    }

    /// The key for this edge
    pub fn key(&self) -> EdgeKey {
        (self.from.clone(), self.to.clone())
    }
}

/// A directed road network with per-edge capacities.
///
/// Nodes and edges are stored in sorted order (by node ID and by `(from, to)` respectively) so
/// that anything iterating over the graph does so deterministically.
#[derive(PartialEq, Debug, Clone)]
pub struct Graph {
    nodes: IndexSet<NodeID>,
    edges: IndexMap<EdgeKey, Edge>,
    /// Indices of outgoing edges for each node, ordered by destination node
    outgoing: Vec<Vec<usize>>,
    /// Indices of incoming edges for each node, ordered by source node
    incoming: Vec<Vec<usize>>,
}

/// Check that a single edge is well formed
fn check_edge(nodes: &IndexSet<NodeID>, edge: &Edge) -> RoutingResult<()> {
    for endpoint in [&edge.from, &edge.to] {
        if !nodes.contains(endpoint) {
            return Err(RoutingError::InvalidGraph(format!(
                "Edge {} -> {} refers to unknown node {endpoint}",
                edge.from, edge.to
            )));
        }
    }

    if edge.from == edge.to {
        return Err(RoutingError::InvalidGraph(format!(
            "Edge {} -> {} is a self-loop",
            edge.from, edge.to
        )));
    }

    if !(edge.capacity.is_finite() && edge.capacity > Flow(0.0)) {
        return Err(RoutingError::InvalidGraph(format!(
            "Edge {} -> {} must have a finite capacity greater than zero (got {})",
            edge.from, edge.to, edge.capacity
        )));
    }

    if !(edge.distance.is_finite() && edge.distance >= Distance(0.0)) {
        return Err(RoutingError::InvalidGraph(format!(
            "Edge {} -> {} must have a finite, non-negative distance (got {})",
            edge.from, edge.to, edge.distance
        )));
    }

    Ok(())
}

impl Graph {
    /// Create a new [`Graph`] from a set of nodes and a list of edges.
    ///
    /// # Arguments
    ///
    /// * `nodes` - The nodes of the network. Repeated IDs are collapsed.
    /// * `edges` - The directed edges of the network
    ///
    /// # Returns
    ///
    /// The graph, or [`RoutingError::InvalidGraph`] if an edge refers to an unknown node, is a
    /// self-loop, has a non-positive capacity, has a negative distance or duplicates another edge.
    pub fn new<N, E>(nodes: N, edges: E) -> RoutingResult<Self>
    where
        N: IntoIterator<Item = NodeID>,
        E: IntoIterator<Item = Edge>,
    {
        let mut nodes: IndexSet<NodeID> = nodes.into_iter().collect();
        nodes.sort();

        let mut edge_map = IndexMap::new();
        for edge in edges {
            check_edge(&nodes, &edge)?;
            if let Some(existing) = edge_map.insert(edge.key(), edge) {
                return Err(RoutingError::InvalidGraph(format!(
                    "Duplicate edge {} -> {}",
                    existing.from, existing.to
                )));
            }
        }
        edge_map.sort_keys();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (idx, edge) in edge_map.values().enumerate() {
            // Unwraps are safe: endpoints were checked above
            outgoing[nodes.get_index_of(&edge.from).unwrap()].push(idx);
            incoming[nodes.get_index_of(&edge.to).unwrap()].push(idx);
        }

        // Edges are sorted by (from, to), so outgoing lists are already ordered by destination.
        // Incoming lists need sorting by source.
        for edge_indices in &mut incoming {
            edge_indices.sort_by(|a, b| edge_map[*a].from.cmp(&edge_map[*b].from));
        }

        Ok(Self {
            nodes,
            edges: edge_map,
            outgoing,
            incoming,
        })
    }

    /// Iterate over the node IDs in sorted order
    pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeID> {
        self.nodes.iter()
    }

    /// Iterate over the edges in sorted `(from, to)` order
    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node, returning the graph's copy of its ID
    pub fn get_node(&self, id: &str) -> Option<&NodeID> {
        self.nodes.get(id)
    }

    /// Whether the node is part of the graph
    pub fn contains_node(&self, id: &NodeID) -> bool {
        self.nodes.contains(id)
    }

    /// Position of the node in the sorted node list
    pub(crate) fn node_index(&self, id: &NodeID) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Look up the edge from `from` to `to`
    pub fn get_edge(&self, from: &NodeID, to: &NodeID) -> Option<&Edge> {
        self.edges.get(&(from.clone(), to.clone()))
    }

    /// Look up the capacity of the edge from `from` to `to`
    pub fn capacity(&self, from: &NodeID, to: &NodeID) -> Option<Flow> {
        self.get_edge(from, to).map(|edge| edge.capacity)
    }

    /// Get an edge by its position in the sorted edge list
    pub(crate) fn edge_at(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    /// Iterate over the edges leaving `node`, ordered by destination node.
    ///
    /// Yields nothing if the node is unknown.
    pub fn outgoing_edges(&self, node: &NodeID) -> impl Iterator<Item = &Edge> {
        self.outgoing_edge_indices(node)
            .iter()
            .map(|idx| &self.edges[*idx])
    }

    /// Iterate over the edges entering `node`, ordered by source node.
    ///
    /// Yields nothing if the node is unknown.
    pub fn incoming_edges(&self, node: &NodeID) -> impl Iterator<Item = &Edge> {
        self.incoming_edge_indices(node)
            .iter()
            .map(|idx| &self.edges[*idx])
    }

    /// Positions (in the sorted edge list) of the edges leaving `node`
    pub(crate) fn outgoing_edge_indices(&self, node: &NodeID) -> &[usize] {
        self.node_index(node)
            .map_or(&[][..], |idx| self.outgoing[idx].as_slice())
    }

    /// Positions (in the sorted edge list) of the edges entering `node`
    pub(crate) fn incoming_edge_indices(&self, node: &NodeID) -> &[usize] {
        self.node_index(node)
            .map_or(&[][..], |idx| self.incoming[idx].as_slice())
    }

    /// Create a copy of this graph with some capacities replaced.
    ///
    /// The existing graph is left untouched.
    ///
    /// # Arguments
    ///
    /// * `capacities` - New capacities, keyed by edge. Edges not present keep their capacity.
    ///
    /// # Returns
    ///
    /// The new graph, or an error if a key doesn't match an edge or a capacity is invalid.
    pub fn with_capacities(&self, capacities: &HashMap<EdgeKey, Flow>) -> RoutingResult<Self> {
        if let Some((from, to)) = capacities.keys().find(|key| !self.edges.contains_key(*key)) {
            return Err(RoutingError::InvalidGraph(format!(
                "Cannot set capacity of unknown edge {from} -> {to}"
            )));
        }

        let edges = self.edges.values().map(|edge| {
            let capacity = capacities
                .get(&(edge.from.clone(), edge.to.clone()))
                .copied()
                .unwrap_or(edge.capacity);
            Edge {
                capacity,
                ..edge.clone()
            }
        });

        Graph::new(self.nodes.iter().cloned(), edges)
    }

    /// Build a petgraph representation, with edge weights equal to distances.
    ///
    /// Node `i` of the returned graph corresponds to the `i`th node in sorted order.
    fn to_petgraph(&self) -> DiGraph<(), f64> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for _ in &self.nodes {
            graph.add_node(());
        }
        for (idx, edges) in self.outgoing.iter().enumerate() {
            for edge in edges.iter().map(|e| &self.edges[*e]) {
                let to = self.nodes.get_index_of(&edge.to).unwrap();
                graph.add_edge(NodeIndex::new(idx), NodeIndex::new(to), edge.distance.value());
            }
        }

        graph
    }

    /// Whether there is any directed path from `origin` to `destination`, ignoring capacities
    pub fn has_path(&self, origin: &NodeID, destination: &NodeID) -> bool {
        let (Some(from), Some(to)) = (self.node_index(origin), self.node_index(destination)) else {
            return false;
        };

        has_path_connecting(
            &self.to_petgraph(),
            NodeIndex::new(from),
            NodeIndex::new(to),
            None,
        )
    }

    /// The length of the shortest path from `origin` to `destination`, ignoring capacities.
    ///
    /// Returns `None` if there is no such path.
    pub fn shortest_distance(&self, origin: &NodeID, destination: &NodeID) -> Option<Distance> {
        let from = self.node_index(origin)?;
        let to = NodeIndex::new(self.node_index(destination)?);
        let distances = dijkstra(&self.to_petgraph(), NodeIndex::new(from), Some(to), |edge| {
            *edge.weight()
        });

        distances.get(&to).map(|d| Distance(*d))
    }
}

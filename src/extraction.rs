//! Code for turning solved flow variables into routes for each commodity.
//!
//! The LP may split a commodity's flow across several parallel paths. Paths are traced greedily:
//! from the origin, repeatedly follow the outgoing edge carrying the most remaining flow until the
//! destination is reached, then remove the flow carried by that path and start again. Flow going
//! round a cycle is cancelled as it is found. The first path found is the primary route and any
//! others are secondary fragments.
use crate::commodity::{AmbulanceType, Commodity, CommodityID, Priority};
use crate::graph::{EdgeKey, Graph, NodeID};
use crate::optimisation::Formulation;
use crate::units::{Dimensionless, Distance, Flow, Money};
use indexmap::IndexMap;

/// The flow of a single commodity along each edge it uses, in sorted edge order
pub type FlowAssignment = IndexMap<EdgeKey, Flow>;

/// A path from a commodity's origin to its destination, with the flow it carries
#[derive(PartialEq, Debug, Clone)]
pub struct PathFragment {
    /// The nodes visited, starting at the origin and ending at the destination
    pub nodes: Vec<NodeID>,
    /// Flow carried along the path
    pub flow: Flow,
    /// Total length of the path
    pub distance: Distance,
}

/// Whether a commodity's desired flow was fully accounted for by traced paths
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum RouteStatus {
    /// The traced paths carry the whole desired flow
    Routed,
    /// Some of the desired flow could not be traced along a path
    PartiallyRouted {
        /// The amount of flow not accounted for
        residual: Flow,
    },
}

/// The routing result for one commodity
#[derive(PartialEq, Debug, Clone)]
pub struct CommodityRoute {
    /// The commodity routed
    pub commodity: CommodityID,
    /// Priority of the commodity
    pub priority: Priority,
    /// Ambulance type serving the commodity
    pub ambulance_type: AmbulanceType,
    /// Flow the commodity needs to carry
    pub desired_flow: Flow,
    /// Whether the commodity's flow was fully traced
    pub status: RouteStatus,
    /// Traced paths: the primary path first, followed by any secondary fragments
    pub paths: Vec<PathFragment>,
    /// Total flow carried by the traced paths
    pub routed_flow: Flow,
    /// Flow of this commodity along each edge with non-negligible flow
    pub flows: FlowAssignment,
    /// Weighted cost of this commodity's flows, i.e. its share of the objective
    pub cost: Money,
}

impl CommodityRoute {
    /// The path carrying the most flow, if any path could be traced
    pub fn primary_path(&self) -> Option<&PathFragment> {
        self.paths.first()
    }

    /// Paths other than the primary one, in the order they were traced
    pub fn secondary_paths(&self) -> &[PathFragment] {
        self.paths.get(1..).unwrap_or_default()
    }

    /// Length of the primary path
    pub fn distance(&self) -> Option<Distance> {
        self.primary_path().map(|path| path.distance)
    }
}

/// The total flow through an edge compared with its capacity
#[derive(PartialEq, Debug, Clone)]
pub struct EdgeUtilisation {
    /// The edge
    pub edge: EdgeKey,
    /// Summed flow of all commodities
    pub flow: Flow,
    /// Capacity of the edge
    pub capacity: Flow,
    /// Flow as a fraction of capacity
    pub utilisation: Dimensionless,
}

impl EdgeUtilisation {
    /// Whether the edge is (to within `tolerance`) at full capacity
    pub fn is_saturated(&self, tolerance: f64) -> bool {
        self.utilisation.value() >= 1.0 - tolerance
    }
}

/// Pick the outgoing edge of `node` with the largest residual flow.
///
/// Edges are ordered by destination node, so on a tie (to within `tolerance`) the edge to the
/// smallest node ID wins.
fn next_edge(graph: &Graph, node: &NodeID, residual: &[f64], tolerance: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &edge in graph.outgoing_edge_indices(node) {
        if residual[edge] <= tolerance {
            continue;
        }

        if best.is_none_or(|best| residual[edge] > residual[best] + tolerance) {
            best = Some(edge);
        }
    }

    best
}

/// Trace a single path from the origin along the edges with the most residual flow.
///
/// Flow circulating round a cycle does not reach the destination, so when the walk returns to a
/// node already on the path the cycle's flow is cancelled and the walk resumes from that node. When
/// the walk reaches a node with no usable outgoing flow, the edge leading there is discarded and
/// the walk steps back. Both cases empty at least one edge.
///
/// Returns the edges of the path, or `None` if no flow leaving the origin reaches the destination.
fn trace_path(
    graph: &Graph,
    origin: &NodeID,
    destination: &NodeID,
    residual: &mut [f64],
    tolerance: f64,
) -> Option<Vec<usize>> {
    // nodes[i] -> nodes[i + 1] is edges[i]
    let mut nodes = vec![origin.clone()];
    let mut edges: Vec<usize> = Vec::new();

    loop {
        let node = nodes.last()?.clone();
        if node == *destination {
            return Some(edges);
        }

        let Some(edge) = next_edge(graph, &node, residual, tolerance) else {
            // Dead end
            let last = edges.pop()?;
            residual[last] = 0.0;
            nodes.pop();
            continue;
        };

        let to = &graph.edge_at(edge).to;
        if let Some(pos) = nodes.iter().position(|visited| visited == to) {
            let mut cycle = edges.split_off(pos);
            cycle.push(edge);
            let circulating = cycle
                .iter()
                .map(|edge| residual[*edge])
                .fold(f64::INFINITY, f64::min);
            for edge in cycle {
                residual[edge] -= circulating;
            }
            nodes.truncate(pos + 1);
        } else {
            nodes.push(to.clone());
            edges.push(edge);
        }
    }
}

/// Decompose one commodity's edge flows into paths.
///
/// # Arguments
///
/// * `graph` - The road network
/// * `commodity` - The commodity whose flows are traced
/// * `edge_flows` - Flow of the commodity along each edge, in sorted edge order
/// * `tolerance` - Flows at or below this value are treated as zero
///
/// # Returns
///
/// The traced paths, primary first, and the flow they carry in total.
pub fn trace_paths(
    graph: &Graph,
    commodity: &Commodity,
    edge_flows: &[f64],
    tolerance: f64,
) -> (Vec<PathFragment>, Flow) {
    let desired = commodity.desired_flow().value();
    let mut residual: Vec<f64> = edge_flows.iter().map(|flow| flow.max(0.0)).collect();
    let mut routed = 0.0;
    let mut paths = Vec::new();

    // Each iteration either routes all remaining flow or empties at least one edge
    while routed < desired - tolerance {
        let Some(edges) = trace_path(
            graph,
            commodity.origin(),
            commodity.destination(),
            &mut residual,
            tolerance,
        ) else {
            break;
        };

        let bottleneck = edges
            .iter()
            .map(|edge| residual[*edge])
            .fold(desired - routed, f64::min);
        for edge in &edges {
            residual[*edge] -= bottleneck;
        }
        routed += bottleneck;

        let mut nodes = vec![commodity.origin().clone()];
        nodes.extend(edges.iter().map(|edge| graph.edge_at(*edge).to.clone()));
        let distance = edges
            .iter()
            .map(|edge| graph.edge_at(*edge).distance)
            .fold(Distance(0.0), |acc, d| acc + d);

        paths.push(PathFragment {
            nodes,
            flow: Flow(bottleneck),
            distance,
        });
    }

    (paths, Flow(routed))
}

/// Build the route for every commodity from the solved variable values.
///
/// # Arguments
///
/// * `graph` - The road network
/// * `commodities` - The commodities, in the order they were formulated
/// * `formulation` - The program that was solved
/// * `values` - The solved value of each variable, in column order
/// * `tolerance` - Numerical tolerance for tracing and for deciding whether a route is complete
pub fn extract_routes(
    graph: &Graph,
    commodities: &[Commodity],
    formulation: &Formulation,
    values: &[f64],
    tolerance: f64,
) -> Vec<CommodityRoute> {
    let definitions = formulation.program.variables();
    commodities
        .iter()
        .enumerate()
        .map(|(commodity_idx, commodity)| {
            let mut edge_flows = Vec::with_capacity(graph.edge_count());
            let mut flows = FlowAssignment::new();
            let mut cost = Money(0.0);
            for (edge_idx, edge) in graph.iter_edges().enumerate() {
                let var = formulation.variables.get(commodity_idx, edge_idx);
                let value = values[var.index()].max(0.0);
                edge_flows.push(value);
                cost += Money(value * definitions[var.index()].coefficient);
                if value > tolerance {
                    flows.insert(edge.key(), Flow(value));
                }
            }

            let (paths, routed_flow) = trace_paths(graph, commodity, &edge_flows, tolerance);
            let shortfall = commodity.desired_flow() - routed_flow;
            let status = if shortfall.value() <= tolerance {
                RouteStatus::Routed
            } else {
                RouteStatus::PartiallyRouted {
                    residual: shortfall,
                }
            };

            CommodityRoute {
                commodity: commodity.id().clone(),
                priority: commodity.priority(),
                ambulance_type: commodity.ambulance_type(),
                desired_flow: commodity.desired_flow(),
                status,
                paths,
                routed_flow,
                flows,
                cost,
            }
        })
        .collect()
}

/// Sum the flow of all commodities along each edge and compare it with the edge's capacity.
///
/// Edges are returned in sorted order, including those with no flow.
pub fn calculate_edge_utilisation(
    graph: &Graph,
    num_commodities: usize,
    formulation: &Formulation,
    values: &[f64],
) -> Vec<EdgeUtilisation> {
    graph
        .iter_edges()
        .enumerate()
        .map(|(edge_idx, edge)| {
            let flow: f64 = (0..num_commodities)
                .map(|commodity| values[formulation.variables.get(commodity, edge_idx).index()])
                .map(|value| value.max(0.0))
                .sum();

            EdgeUtilisation {
                edge: edge.key(),
                flow: Flow(flow),
                capacity: edge.capacity,
                utilisation: Flow(flow) / edge.capacity,
            }
        })
        .collect()
}

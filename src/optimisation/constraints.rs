//! Code for adding constraints to the routing problem.
use super::VariableMap;
use crate::commodity::Commodity;
use crate::graph::Graph;
use crate::solver::LinearProgram;

/// Add flow conservation constraints.
///
/// For every commodity at every node, outflow minus inflow equals the commodity's desired flow at
/// its origin, minus the desired flow at its destination and zero elsewhere. This forces the whole
/// desired flow to travel from origin to destination.
///
/// Rows for nodes without incident edges are skipped unless the node is one of the commodity's
/// endpoints, in which case the empty row makes the problem infeasible.
pub fn add_flow_conservation_constraints(
    program: &mut LinearProgram,
    variables: &VariableMap,
    graph: &Graph,
    commodities: &[Commodity],
) {
    let mut terms = Vec::new();
    for (commodity_idx, commodity) in commodities.iter().enumerate() {
        let desired_flow = commodity.desired_flow().value();

        for node in graph.iter_nodes() {
            // Outflow
            terms.extend(
                graph
                    .outgoing_edge_indices(node)
                    .iter()
                    .map(|edge| (variables.get(commodity_idx, *edge), 1.0)),
            );

            // Inflow
            terms.extend(
                graph
                    .incoming_edge_indices(node)
                    .iter()
                    .map(|edge| (variables.get(commodity_idx, *edge), -1.0)),
            );

            let rhs = if node == commodity.origin() {
                desired_flow
            } else if node == commodity.destination() {
                -desired_flow
            } else {
                0.0
            };

            let is_endpoint = node == commodity.origin() || node == commodity.destination();
            if terms.is_empty() && !is_endpoint {
                continue;
            }

            program.add_constraint(rhs..=rhs, terms.drain(..));
        }
    }
}

/// Add edge capacity constraints.
///
/// The flows of all commodities along an edge must together not exceed its capacity. This is the
/// constraint coupling the commodities together.
pub fn add_capacity_constraints(
    program: &mut LinearProgram,
    variables: &VariableMap,
    graph: &Graph,
    num_commodities: usize,
) {
    if num_commodities == 0 {
        return;
    }

    for (edge_idx, edge) in graph.iter_edges().enumerate() {
        let terms = (0..num_commodities).map(|commodity| (variables.get(commodity, edge_idx), 1.0));
        program.add_constraint(0.0..=edge.capacity.value(), terms);
    }
}

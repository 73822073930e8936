//! Human-readable summaries of routing results, written to the log.
use crate::commodity::Commodity;
use crate::extraction::{CommodityRoute, PathFragment, RouteStatus};
use crate::graph::Graph;
use crate::routing::{RoutingOutcome, RoutingSolution};
use itertools::Itertools;
use log::{debug, error, info, warn};

/// Format a path as `A -> B -> C`
pub fn format_path(path: &PathFragment) -> String {
    path.nodes.iter().join(" -> ")
}

/// Describe the route for a single commodity on one line
pub fn describe_route(route: &CommodityRoute) -> String {
    let status = match route.status {
        RouteStatus::Routed => "routed".to_string(),
        RouteStatus::PartiallyRouted { residual } => {
            format!("partially routed ({residual} unrouted)")
        }
    };
    let path = route
        .primary_path()
        .map_or_else(|| "none".to_string(), format_path);
    let distance = route
        .distance()
        .map_or_else(|| "-".to_string(), |d| d.to_string());

    format!(
        "{} [{}, {} ambulance]: {status}; path {path}; distance {distance}; flow {} of {}; cost {}",
        route.commodity,
        route.priority,
        route.ambulance_type,
        route.routed_flow,
        route.desired_flow,
        route.cost
    )
}

/// Log a summary of every route and of edge utilisation
fn log_solution(solution: &RoutingSolution, graph: &Graph, commodities: &[Commodity]) {
    info!("Objective value: {}", solution.objective);

    for route in &solution.routes {
        info!("{}", describe_route(route));
        let shortest = commodities
            .iter()
            .find(|commodity| commodity.id() == &route.commodity)
            .and_then(|commodity| {
                graph.shortest_distance(commodity.origin(), commodity.destination())
            });
        if let Some(shortest) = shortest {
            debug!("  shortest possible distance for {}: {shortest}", route.commodity);
        }
        for fragment in route.secondary_paths() {
            info!(
                "  secondary path {} carrying {}",
                format_path(fragment),
                fragment.flow
            );
        }
    }

    for edge in solution.edges.iter().filter(|edge| edge.flow.value() > 0.0) {
        info!(
            "Edge {} -> {}: flow {} of {} ({:.1}%)",
            edge.edge.0,
            edge.edge.1,
            edge.flow,
            edge.capacity,
            edge.utilisation.value() * 100.0
        );
    }
    info!("{} edge(s) at full capacity", solution.saturated_edge_count);
}

/// Log a summary of the outcome of an optimisation run on the given graph and commodities
pub fn log_outcome(outcome: &RoutingOutcome, graph: &Graph, commodities: &[Commodity]) {
    match outcome {
        RoutingOutcome::Optimal(solution) => log_solution(solution, graph, commodities),
        RoutingOutcome::Infeasible { .. } => {
            warn!("No feasible routing under current capacities. Try regenerating capacities.");
        }
        RoutingOutcome::Unbounded => error!("No routes produced: problem is unbounded"),
    }
}

//! Functionality for running a single routing optimisation.
//!
//! One call to [`optimise_routes`] takes an immutable graph and commodity list, formulates and
//! solves the multi-commodity flow problem and returns a fresh result. Nothing is shared between
//! calls.
use crate::commodity::{Commodity, check_commodities};
use crate::error::RoutingResult;
use crate::extraction::{
    CommodityRoute, EdgeUtilisation, RouteStatus, calculate_edge_utilisation, extract_routes,
};
use crate::graph::Graph;
use crate::optimisation::formulate;
use crate::parameters::ModelParameters;
use crate::solver::{Solver, SolverOutcome};
use crate::units::Money;
use itertools::Itertools;
use log::{error, info, warn};

/// The result of a successful optimisation
#[derive(PartialEq, Debug, Clone)]
pub struct RoutingSolution {
    /// Value of the objective function: the total weighted cost of all flows
    pub objective: Money,
    /// Route for each commodity, in the order the commodities were given
    pub routes: Vec<CommodityRoute>,
    /// Total flow and utilisation of every edge, in sorted edge order
    pub edges: Vec<EdgeUtilisation>,
    /// Number of edges at full capacity
    pub saturated_edge_count: usize,
}

impl RoutingSolution {
    /// Look up the route for a commodity by ID
    pub fn route(&self, commodity: &str) -> Option<&CommodityRoute> {
        self.routes.iter().find(|route| &*route.commodity.0 == commodity)
    }

    /// Iterate over the routes which could not be fully traced
    pub fn iter_partially_routed(&self) -> impl Iterator<Item = &CommodityRoute> {
        self.routes
            .iter()
            .filter(|route| matches!(route.status, RouteStatus::PartiallyRouted { .. }))
    }
}

/// The outcome of an optimisation run
#[derive(PartialEq, Debug, Clone)]
pub enum RoutingOutcome {
    /// All commodities were routed at minimum cost
    Optimal(RoutingSolution),
    /// No routing satisfies every capacity and conservation constraint
    Infeasible {
        /// Extra information about the cause, if known
        diagnostic: Option<String>,
    },
    /// The problem is unbounded, which indicates a defect in the formulation
    Unbounded,
}

/// Describe commodities whose destination can't be reached from their origin at all
fn describe_unreachable(graph: &Graph, commodities: &[Commodity]) -> Option<String> {
    let unreachable = commodities
        .iter()
        .filter(|commodity| !graph.has_path(commodity.origin(), commodity.destination()))
        .map(|commodity| {
            format!(
                "{} ({} -> {})",
                commodity.id(),
                commodity.origin(),
                commodity.destination()
            )
        })
        .join(", ");

    (!unreachable.is_empty()).then(|| format!("No path exists for commodities: {unreachable}"))
}

/// Route every commodity across the graph at minimum total weighted cost.
///
/// # Arguments
///
/// * `graph` - The road network
/// * `commodities` - The emergency requests to route
/// * `parameters` - Model parameters (priority weights and tolerance are used here)
/// * `solver` - The LP backend
///
/// # Returns
///
/// An error if the commodities are invalid for the graph, otherwise the outcome of the run.
/// Infeasibility and unboundedness are outcomes, not errors.
pub fn optimise_routes(
    graph: &Graph,
    commodities: &[Commodity],
    parameters: &ModelParameters,
    solver: &dyn Solver,
) -> RoutingResult<RoutingOutcome> {
    check_commodities(graph, commodities)?;

    // A commodity with no path at all can never be routed, whatever the capacities
    if let Some(diagnostic) = describe_unreachable(graph, commodities) {
        warn!("Routing is infeasible: {diagnostic}");
        return Ok(RoutingOutcome::Infeasible {
            diagnostic: Some(diagnostic),
        });
    }

    let formulation = formulate(graph, commodities, &parameters.priority_weights);
    let outcome = match solver.solve(&formulation.program) {
        SolverOutcome::Optimal(values) => {
            let tolerance = parameters.tolerance.value();
            let routes = extract_routes(graph, commodities, &formulation, &values, tolerance);
            let edges = calculate_edge_utilisation(graph, commodities.len(), &formulation, &values);
            let saturated_edge_count = edges
                .iter()
                .filter(|edge| edge.is_saturated(tolerance))
                .count();
            let solution = RoutingSolution {
                objective: Money(formulation.program.objective_value(&values)),
                routes,
                edges,
                saturated_edge_count,
            };

            info!(
                "Found optimal routing for {} commodities with objective {}",
                commodities.len(),
                solution.objective
            );
            for route in solution.iter_partially_routed() {
                if let RouteStatus::PartiallyRouted { residual } = route.status {
                    warn!(
                        "Commodity {} was only partially routed ({residual} unrouted)",
                        route.commodity
                    );
                }
            }

            RoutingOutcome::Optimal(solution)
        }
        SolverOutcome::Infeasible { diagnostic } => {
            match &diagnostic {
                Some(diagnostic) => warn!("Routing is infeasible: {diagnostic}"),
                None => warn!("Routing is infeasible under current capacities"),
            }
            RoutingOutcome::Infeasible { diagnostic }
        }
        SolverOutcome::Unbounded => {
            error!("Routing problem is unbounded. This indicates a bug in the formulation.");
            RoutingOutcome::Unbounded
        }
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::Priority;
    use crate::fixture::{assert_error, commodity, diamond_graph, edge, parameters};
    use crate::graph::NodeID;
    use crate::solver::{HighsSolver, LinearProgram};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    /// A solver which always returns the same outcome
    struct FixedSolver(SolverOutcome);

    impl Solver for FixedSolver {
        fn solve(&self, _program: &LinearProgram) -> SolverOutcome {
            self.0.clone()
        }
    }

    #[rstest]
    fn test_optimise_routes_no_commodities(diamond_graph: Graph, parameters: ModelParameters) {
        let outcome =
            optimise_routes(&diamond_graph, &[], &parameters, &HighsSolver::default()).unwrap();
        let RoutingOutcome::Optimal(solution) = outcome else {
            panic!("Expected optimal outcome");
        };
        assert_eq!(solution.objective, Money(0.0));
        assert!(solution.routes.is_empty());
        assert_eq!(solution.saturated_edge_count, 0);
    }

    #[rstest]
    fn test_optimise_routes_single(diamond_graph: Graph, parameters: ModelParameters) {
        let commodities = [commodity(
            &diamond_graph,
            "c1",
            "O",
            "D",
            10.0,
            Priority::Mild,
            100.0,
        )];
        let outcome = optimise_routes(
            &diamond_graph,
            &commodities,
            &parameters,
            &HighsSolver::default(),
        )
        .unwrap();
        let RoutingOutcome::Optimal(solution) = outcome else {
            panic!("Expected optimal outcome");
        };

        // 10 flow * 100 cost * 1.0 weight * 2 distance
        assert_approx_eq!(f64, solution.objective.value(), 2000.0, epsilon = 1e-6);
        let route = solution.route("c1").unwrap();
        assert_eq!(route.status, RouteStatus::Routed);
        let path: Vec<_> = route.primary_path().unwrap().nodes.iter().map(|n| &*n.0).collect();
        assert_eq!(path, ["O", "A", "D"]);
    }

    #[rstest]
    fn test_optimise_routes_unreachable(parameters: ModelParameters) {
        let graph = Graph::new(
            ["O", "A", "Z"].map(NodeID::new),
            [edge("O", "A", 1.0, 10.0)],
        )
        .unwrap();
        let commodities = [
            commodity(&graph, "c1", "O", "A", 1.0, Priority::Mild, 100.0),
            commodity(&graph, "c2", "O", "Z", 1.0, Priority::Critical, 500.0),
        ];
        let outcome =
            optimise_routes(&graph, &commodities, &parameters, &HighsSolver::default()).unwrap();
        assert_eq!(
            outcome,
            RoutingOutcome::Infeasible {
                diagnostic: Some("No path exists for commodities: c2 (O -> Z)".into())
            }
        );
    }

    #[rstest]
    fn test_optimise_routes_invalid_commodity(diamond_graph: Graph, parameters: ModelParameters) {
        let c1 = commodity(&diamond_graph, "c1", "O", "D", 1.0, Priority::Mild, 100.0);
        let commodities = [c1.clone(), c1];
        assert_error!(
            optimise_routes(
                &diamond_graph,
                &commodities,
                &parameters,
                &HighsSolver::default()
            ),
            "Invalid commodity: Duplicate commodity ID c1"
        );
    }

    #[rstest]
    #[case(SolverOutcome::Unbounded, RoutingOutcome::Unbounded)]
    #[case(
        SolverOutcome::Infeasible { diagnostic: Some("oops".into()) },
        RoutingOutcome::Infeasible { diagnostic: Some("oops".into()) }
    )]
    fn test_optimise_routes_solver_outcome(
        diamond_graph: Graph,
        parameters: ModelParameters,
        #[case] solver_outcome: SolverOutcome,
        #[case] expected: RoutingOutcome,
    ) {
        let commodities = [commodity(
            &diamond_graph,
            "c1",
            "O",
            "D",
            1.0,
            Priority::Mild,
            100.0,
        )];
        let solver = FixedSolver(solver_outcome);
        let outcome = optimise_routes(&diamond_graph, &commodities, &parameters, &solver).unwrap();
        assert_eq!(outcome, expected);
    }

    #[rstest]
    fn test_optimise_routes_partially_routed(diamond_graph: Graph, parameters: ModelParameters) {
        let commodities = [commodity(
            &diamond_graph,
            "c1",
            "O",
            "D",
            10.0,
            Priority::Mild,
            100.0,
        )];

        // Flow leaves the origin but is never delivered
        let solver = FixedSolver(SolverOutcome::Optimal(vec![0.0, 0.0, 10.0, 0.0]));
        let outcome = optimise_routes(&diamond_graph, &commodities, &parameters, &solver).unwrap();
        let RoutingOutcome::Optimal(solution) = outcome else {
            panic!("Expected optimal outcome");
        };
        assert_eq!(solution.iter_partially_routed().count(), 1);
    }
}

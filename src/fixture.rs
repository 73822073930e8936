//! Fixtures for tests

use crate::commodity::{Commodity, Priority};
use crate::graph::{Edge, Graph, NodeID};
use crate::parameters::ModelParameters;
use crate::units::{Distance, Flow, MoneyPerFlowPerDistance};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_error;

/// Create an edge with the given distance and capacity
pub fn edge(from: &str, to: &str, distance: f64, capacity: f64) -> Edge {
    Edge::new(from.into(), to.into(), Distance(distance), Flow(capacity))
}

/// Build a graph whose nodes are the endpoints of the given edges
pub fn graph_from_edges(edges: Vec<Edge>) -> Graph {
    let nodes: Vec<NodeID> = edges
        .iter()
        .flat_map(|edge| [edge.from.clone(), edge.to.clone()])
        .collect();
    Graph::new(nodes, edges).unwrap()
}

/// A diamond with a short route O-A-D, whose second leg is scarce, and a long detour O-B-D
#[fixture]
pub fn diamond_graph() -> Graph {
    graph_from_edges(vec![
        edge("O", "A", 1.0, 100.0),
        edge("A", "D", 1.0, 30.0),
        edge("O", "B", 5.0, 100.0),
        edge("B", "D", 5.0, 100.0),
    ])
}

/// Create a commodity on `graph`
pub fn commodity(
    graph: &Graph,
    id: &str,
    origin: &str,
    destination: &str,
    desired_flow: f64,
    priority: Priority,
    unit_cost: f64,
) -> Commodity {
    Commodity::new(
        graph,
        id.into(),
        origin.into(),
        destination.into(),
        Flow(desired_flow),
        priority,
        MoneyPerFlowPerDistance(unit_cost),
    )
    .unwrap()
}

#[fixture]
pub fn parameters() -> ModelParameters {
    ModelParameters::default()
}

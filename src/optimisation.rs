//! Code for formulating the multi-commodity flow problem as a linear program.
//!
//! There is one non-negative variable `x[k,e]` for every commodity `k` and edge `e`, giving the
//! flow of `k` along `e`. The objective is to minimise
//!
//! sum over (k,e) of `x[k,e] * distance(e) * unit_cost(k) * weight(priority(k))`
//!
//! subject to flow conservation for each commodity at each node and to the capacity of each edge
//! being shared between all commodities.
use crate::commodity::Commodity;
use crate::graph::Graph;
use crate::parameters::PriorityWeights;
use crate::solver::{LinearProgram, Variable};
use crate::units::MoneyPerFlow;
use indexmap::IndexMap;
use log::debug;

pub mod constraints;
use constraints::{add_capacity_constraints, add_flow_conservation_constraints};

/// A key for a [`VariableMap`]: positions of the commodity in the commodity list and of the edge
/// in the graph's sorted edge list
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub struct VariableMapKey {
    /// Index of the commodity
    pub commodity: usize,
    /// Index of the edge
    pub edge: usize,
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]): by commodity, then by edge.
///
/// We use this data structure for two things:
///
/// 1. In order to define constraints for the optimisation
/// 2. To keep track of the commodity and edge that each variable corresponds to, for when we are
///    reading the results of the optimisation.
#[derive(Default, Debug)]
pub struct VariableMap(IndexMap<VariableMapKey, Variable>);

impl VariableMap {
    /// Get the [`Variable`] corresponding to the given commodity and edge
    pub fn get(&self, commodity: usize, edge: usize) -> Variable {
        *self
            .0
            .get(&VariableMapKey { commodity, edge })
            .expect("No variable found for given params")
    }

    /// Iterate over the keys and variables in the map
    pub fn iter(&self) -> impl Iterator<Item = (&VariableMapKey, &Variable)> {
        self.0.iter()
    }

    /// Number of variables in the map
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A linear program for routing commodities, together with the meaning of its variables
#[derive(Debug)]
pub struct Formulation {
    /// The program to be solved
    pub program: LinearProgram,
    /// Which commodity and edge each variable represents
    pub variables: VariableMap,
}

/// Calculate the objective coefficient for routing one unit of a commodity along an edge.
///
/// Higher-priority commodities have their cost scaled by a smaller weight.
pub fn calculate_cost_coefficient(
    graph: &Graph,
    commodity: &Commodity,
    edge: usize,
    weights: &PriorityWeights,
) -> MoneyPerFlow {
    let distance = graph.edge_at(edge).distance;
    distance * commodity.unit_cost() * weights.weight(commodity.priority())
}

/// Add a flow variable for every (commodity, edge) pair.
///
/// # Returns
///
/// A [`VariableMap`] with the problem's variables as values.
fn add_variables(
    program: &mut LinearProgram,
    graph: &Graph,
    commodities: &[Commodity],
    weights: &PriorityWeights,
) -> VariableMap {
    let mut variables = VariableMap::default();

    for (commodity_idx, commodity) in commodities.iter().enumerate() {
        for edge_idx in 0..graph.edge_count() {
            let coeff = calculate_cost_coefficient(graph, commodity, edge_idx, weights);
            let var = program.add_variable(coeff.value(), 0.0..=f64::INFINITY);

            let key = VariableMapKey {
                commodity: commodity_idx,
                edge: edge_idx,
            };
            let existing = variables.0.insert(key, var).is_some();
            assert!(!existing, "Duplicate entry for var");
        }
    }

    variables
}

/// Formulate the routing problem for the given graph and commodities.
///
/// Commodities are assumed to have been validated against `graph`. If either the graph has no
/// edges or there are no commodities, the resulting program has no variables.
///
/// # Arguments
///
/// * `graph` - The road network
/// * `commodities` - The emergency requests to route
/// * `weights` - Cost multipliers for each priority class
pub fn formulate(
    graph: &Graph,
    commodities: &[Commodity],
    weights: &PriorityWeights,
) -> Formulation {
    let mut program = LinearProgram::default();
    let variables = add_variables(&mut program, graph, commodities, weights);

    add_flow_conservation_constraints(&mut program, &variables, graph, commodities);
    add_capacity_constraints(&mut program, &variables, graph, commodities.len());

    debug!(
        "Formulated routing problem: {} variables, {} constraints",
        program.num_variables(),
        program.num_constraints()
    );

    Formulation { program, variables }
}

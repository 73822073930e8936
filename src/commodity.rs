//! Emergency routing requests.
//!
//! Each [`Commodity`] is one ambulance-to-emergency assignment: it must carry its desired flow from
//! its origin to its destination, competing with the other commodities for edge capacity.
use crate::error::{RoutingError, RoutingResult};
use crate::graph::{Graph, NodeID};
use crate::id::define_id_type;
use crate::units::{Flow, MoneyPerFlowPerDistance};
use serde::Deserialize;
use std::collections::HashSet;
use strum::{Display, EnumIter};

define_id_type! {CommodityID}

/// How urgent an emergency is.
///
/// Variants are ordered so that `Critical > Moderate > Mild`.
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    /// A minor emergency
    Mild,
    /// An emergency of medium severity
    Moderate,
    /// A life-threatening emergency
    Critical,
}

/// The kind of ambulance dispatched, which determines operational cost
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AmbulanceType {
    /// Basic life support
    Basic,
    /// Intermediate life support
    Intermediate,
    /// Advanced life support
    Advanced,
}

impl Priority {
    /// The ambulance type dispatched for emergencies of this priority
    pub fn ambulance_type(self) -> AmbulanceType {
        match self {
            Priority::Mild => AmbulanceType::Basic,
            Priority::Moderate => AmbulanceType::Intermediate,
            Priority::Critical => AmbulanceType::Advanced,
        }
    }
}

/// A single emergency routing request
#[derive(PartialEq, Debug, Clone)]
pub struct Commodity {
    id: CommodityID,
    origin: NodeID,
    destination: NodeID,
    desired_flow: Flow,
    priority: Priority,
    unit_cost: MoneyPerFlowPerDistance,
}

impl Commodity {
    /// Create a new [`Commodity`], checking it against the graph it will be routed on.
    ///
    /// # Arguments
    ///
    /// * `graph` - The road network
    /// * `id` - Identifier for the request
    /// * `origin` - The ambulance base
    /// * `destination` - The emergency location
    /// * `desired_flow` - The speed/volume the route must carry
    /// * `priority` - Severity of the emergency
    /// * `unit_cost` - Operational cost per unit flow per unit distance
    ///
    /// # Returns
    ///
    /// The commodity or [`RoutingError::InvalidCommodity`] if it is malformed.
    pub fn new(
        graph: &Graph,
        id: CommodityID,
        origin: NodeID,
        destination: NodeID,
        desired_flow: Flow,
        priority: Priority,
        unit_cost: MoneyPerFlowPerDistance,
    ) -> RoutingResult<Self> {
        let commodity = Self {
            id,
            origin,
            destination,
            desired_flow,
            priority,
            unit_cost,
        };
        commodity.check_valid_for_graph(graph)?;

        Ok(commodity)
    }

    /// Check that the commodity's endpoints exist in `graph` and that its values are sensible
    pub fn check_valid_for_graph(&self, graph: &Graph) -> RoutingResult<()> {
        let invalid = |msg: String| Err(RoutingError::InvalidCommodity(msg));

        for (name, node) in [("Origin", &self.origin), ("Destination", &self.destination)] {
            if !graph.contains_node(node) {
                return invalid(format!("{name} {node} of {} is not in the graph", self.id));
            }
        }

        if self.origin == self.destination {
            return invalid(format!(
                "Origin and destination of {} are the same ({})",
                self.id, self.origin
            ));
        }

        if !(self.desired_flow.is_finite() && self.desired_flow > Flow(0.0)) {
            return invalid(format!(
                "Desired flow of {} must be a finite number greater than zero (got {})",
                self.id, self.desired_flow
            ));
        }

        if !(self.unit_cost.is_finite() && self.unit_cost > MoneyPerFlowPerDistance(0.0)) {
            return invalid(format!(
                "Unit cost of {} must be a finite number greater than zero (got {})",
                self.id, self.unit_cost
            ));
        }

        Ok(())
    }

    /// Identifier for the request
    pub fn id(&self) -> &CommodityID {
        &self.id
    }

    /// The ambulance base
    pub fn origin(&self) -> &NodeID {
        &self.origin
    }

    /// The emergency location
    pub fn destination(&self) -> &NodeID {
        &self.destination
    }

    /// The speed/volume the route must carry
    pub fn desired_flow(&self) -> Flow {
        self.desired_flow
    }

    /// Severity of the emergency
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Operational cost per unit flow per unit distance
    pub fn unit_cost(&self) -> MoneyPerFlowPerDistance {
        self.unit_cost
    }

    /// The type of ambulance serving this request
    pub fn ambulance_type(&self) -> AmbulanceType {
        self.priority.ambulance_type()
    }
}

/// Check a whole list of commodities against `graph`, including that their IDs are unique
pub fn check_commodities(graph: &Graph, commodities: &[Commodity]) -> RoutingResult<()> {
    let mut seen = HashSet::new();
    for commodity in commodities {
        commodity.check_valid_for_graph(graph)?;
        if !seen.insert(commodity.id()) {
            return Err(RoutingError::InvalidCommodity(format!(
                "Duplicate commodity ID {}",
                commodity.id()
            )));
        }
    }

    Ok(())
}

//! Random generation of edge capacities and desired flows within user-configured bounds.
//!
//! Nothing here mutates an existing graph: regenerating capacities yields a new [`Graph`].
use crate::commodity::Priority;
use crate::error::RoutingResult;
use crate::graph::Graph;
use crate::parameters::{Bounds, ModelParameters};
use crate::units::Flow;
use log::debug;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;

/// The ranges from which capacities and desired flows are drawn.
///
/// Generation never panics: an empty or non-finite range yields its lower bound. Bounds read from a
/// model file are checked by [`ModelParameters::validate`].
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct GenerationBounds {
    /// Range for desired flows (R_min, R_max)
    pub flow: Bounds,
    /// Range for edge capacities (C_min, C_max)
    pub capacity: Bounds,
}

impl From<&ModelParameters> for GenerationBounds {
    fn from(params: &ModelParameters) -> Self {
        Self {
            flow: params.flow_bounds,
            capacity: params.capacity_bounds,
        }
    }
}

/// Draw a value uniformly from `[min, max]`, or return `min` if the range is empty or infinite
fn sample_uniform<R: Rng>(rng: &mut R, min: f64, max: f64) -> Flow {
    let finite = min.is_finite() && max.is_finite();
    if !finite || max.partial_cmp(&min) != Some(Ordering::Greater) {
        return Flow(min);
    }

    Flow(rng.random_range(min..=max))
}

/// Draw a capacity uniformly from the capacity bounds
pub fn generate_capacity<R: Rng>(bounds: &GenerationBounds, rng: &mut R) -> Flow {
    sample_uniform(rng, bounds.capacity.min.value(), bounds.capacity.max.value())
}

/// Create a new graph with every capacity redrawn from the capacity bounds.
///
/// Edges are visited in sorted order, so the result depends only on the graph and the state of
/// `rng`. Fails if the bounds produce a non-positive capacity.
pub fn regenerate_capacities<R: Rng>(
    graph: &Graph,
    bounds: &GenerationBounds,
    rng: &mut R,
) -> RoutingResult<Graph> {
    let capacities: HashMap<_, _> = graph
        .iter_edges()
        .map(|edge| (edge.key(), generate_capacity(bounds, rng)))
        .collect();
    debug!(
        "Regenerated {} capacities in [{}, {}]",
        capacities.len(),
        bounds.capacity.min,
        bounds.capacity.max
    );

    graph.with_capacities(&capacities)
}

/// The sub-range of the flow bounds from which desired flows are drawn for each priority.
///
/// Critical emergencies need the highest flows and mild ones the lowest. Sub-ranges are clamped
/// to the flow bounds, and `lower <= upper` holds whenever the bounds are not NaN.
pub fn desired_flow_range(priority: Priority, bounds: &GenerationBounds) -> (f64, f64) {
    let r_min = bounds.flow.min.value();
    let r_max = bounds.flow.max.value();
    let span = r_max - r_min;
    let (lower, upper) = match priority {
        Priority::Critical => (r_max * 0.8, r_max),
        Priority::Moderate => (r_min + span * 0.4, r_max * 0.9),
        Priority::Mild => (r_min, r_min + span * 0.6),
    };

    // Not `f64::clamp`, which panics if r_min > r_max
    let lower = lower.max(r_min).min(r_max);
    let upper = upper.min(r_max).max(lower);
    (lower, upper)
}

/// Draw a desired flow for an emergency of the given priority
pub fn generate_desired_flow<R: Rng>(
    priority: Priority,
    bounds: &GenerationBounds,
    rng: &mut R,
) -> Flow {
    let (lower, upper) = desired_flow_range(priority, bounds);
    sample_uniform(rng, lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::diamond_graph;
    use float_cmp::assert_approx_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};
    use strum::IntoEnumIterator;

    #[fixture]
    fn bounds() -> GenerationBounds {
        GenerationBounds {
            flow: Bounds::new(15.0, 35.0),
            capacity: Bounds::new(40.0, 80.0),
        }
    }

    #[rstest]
    fn test_regenerate_capacities(diamond_graph: Graph, bounds: GenerationBounds) {
        let mut rng = StdRng::seed_from_u64(1);
        let new_graph = regenerate_capacities(&diamond_graph, &bounds, &mut rng).unwrap();

        assert_eq!(new_graph.edge_count(), diamond_graph.edge_count());
        for edge in new_graph.iter_edges() {
            assert!(bounds.capacity.contains(edge.capacity));
            let old = diamond_graph.get_edge(&edge.from, &edge.to).unwrap();
            assert_eq!(edge.distance, old.distance);
        }

        // Original graph is untouched
        assert_eq!(
            diamond_graph.capacity(&"A".into(), &"D".into()),
            Some(Flow(30.0))
        );
    }

    #[rstest]
    fn test_regenerate_capacities_deterministic(diamond_graph: Graph, bounds: GenerationBounds) {
        let regenerate = |seed| {
            regenerate_capacities(&diamond_graph, &bounds, &mut StdRng::seed_from_u64(seed))
                .unwrap()
        };
        let graph1 = regenerate(7);
        let graph2 = regenerate(7);
        assert_eq!(graph1, graph2);
    }

    #[rstest]
    fn test_generate_capacity_degenerate_range(bounds: GenerationBounds) {
        let bounds = GenerationBounds {
            capacity: Bounds::new(50.0, 50.0),
            ..bounds
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generate_capacity(&bounds, &mut rng), Flow(50.0));
    }

    #[rstest]
    #[case(Priority::Critical, 28.0, 35.0)]
    #[case(Priority::Moderate, 23.0, 31.5)]
    #[case(Priority::Mild, 15.0, 27.0)]
    fn test_desired_flow_range(
        bounds: GenerationBounds,
        #[case] priority: Priority,
        #[case] lower: f64,
        #[case] upper: f64,
    ) {
        let (l, u) = desired_flow_range(priority, &bounds);
        assert_approx_eq!(f64, l, lower, epsilon = 1e-10);
        assert_approx_eq!(f64, u, upper, epsilon = 1e-10);
    }

    #[test]
    fn test_desired_flow_range_clamped() {
        // With a narrow range, 0.8 * max falls below min and must be clamped
        let bounds = GenerationBounds {
            flow: Bounds::new(30.0, 32.0),
            capacity: Bounds::new(1.0, 2.0),
        };
        for priority in Priority::iter() {
            let (lower, upper) = desired_flow_range(priority, &bounds);
            assert!(30.0 <= lower && lower <= upper && upper <= 32.0);
        }
    }

    #[rstest]
    #[case(Bounds::new(35.0, 15.0), 35.0)]
    #[case(Bounds::new(15.0, f64::INFINITY), 15.0)]
    #[case(Bounds::new(f64::NAN, 35.0), f64::NAN)]
    fn test_generate_with_bad_bounds(#[case] range: Bounds, #[case] capacity: f64) {
        // Bounds that were never validated do not cause a panic
        let bounds = GenerationBounds {
            flow: range,
            capacity: range,
        };
        let mut rng = StdRng::seed_from_u64(5);
        for priority in Priority::iter() {
            let (lower, upper) = desired_flow_range(priority, &bounds);
            assert!(lower <= upper);
            generate_desired_flow(priority, &bounds, &mut rng);
        }

        let generated = generate_capacity(&bounds, &mut rng).value();
        if capacity.is_nan() {
            assert!(generated.is_nan());
        } else {
            assert_eq!(generated, capacity);
        }
    }

    #[rstest]
    fn test_generate_desired_flow(bounds: GenerationBounds) {
        let mut rng = StdRng::seed_from_u64(11);
        for priority in Priority::iter() {
            for _ in 0..20 {
                let flow = generate_desired_flow(priority, &bounds, &mut rng);
                let (lower, upper) = desired_flow_range(priority, &bounds);
                assert!(lower <= flow.value() && flow.value() <= upper);
            }
        }
    }
}

//! Code for reading the road network from a CSV file.
use super::{input_err_msg, read_csv};
use crate::generate::{GenerationBounds, generate_capacity, regenerate_capacities};
use crate::graph::{Edge, Graph, NodeID};
use crate::units::{Distance, Flow};
use anyhow::{Context, Result, ensure};
use log::info;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;

const EDGES_FILE_NAME: &str = "edges.csv";

/// A row of the edges file
#[derive(PartialEq, Debug, Deserialize)]
struct EdgeRaw {
    from: String,
    to: String,
    distance: Distance,
    capacity: Option<Flow>,
}

/// Read the road network from the edges file in `model_dir`.
///
/// Nodes are the endpoints of every edge, plus `extra_nodes` (e.g. emergency locations which may
/// not be on any road). Blank capacities are drawn from `bounds`, as are all capacities if
/// `regenerate` is set.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario files
/// * `extra_nodes` - Nodes to include even if no edge touches them
/// * `bounds` - Ranges for generated values
/// * `regenerate` - Whether to redraw every capacity
/// * `rng` - Source of randomness for generated capacities
pub fn read_graph<I, R>(
    model_dir: &Path,
    extra_nodes: I,
    bounds: &GenerationBounds,
    regenerate: bool,
    rng: &mut R,
) -> Result<Graph>
where
    I: IntoIterator<Item = NodeID>,
    R: Rng,
{
    let file_path = model_dir.join(EDGES_FILE_NAME);
    let edges_csv = read_csv(&file_path)?;
    let graph = read_graph_from_iter(edges_csv, extra_nodes, bounds, rng)
        .with_context(|| input_err_msg(&file_path))?;

    if !regenerate {
        return Ok(graph);
    }

    info!("Regenerating all edge capacities");
    Ok(regenerate_capacities(&graph, bounds, rng)?)
}

fn read_graph_from_iter<E, I, R>(
    iter: E,
    extra_nodes: I,
    bounds: &GenerationBounds,
    rng: &mut R,
) -> Result<Graph>
where
    E: Iterator<Item = EdgeRaw>,
    I: IntoIterator<Item = NodeID>,
    R: Rng,
{
    let mut nodes: Vec<NodeID> = extra_nodes.into_iter().collect();
    let mut edges = Vec::new();
    for record in iter {
        ensure!(
            !record.from.is_empty() && !record.to.is_empty(),
            "Edge endpoints cannot be empty"
        );

        let capacity = record
            .capacity
            .unwrap_or_else(|| generate_capacity(bounds, rng));
        let edge = Edge::new(
            record.from.into(),
            record.to.into(),
            record.distance,
            capacity,
        );
        nodes.extend([edge.from.clone(), edge.to.clone()]);
        edges.push(edge);
    }

    Ok(Graph::new(nodes, edges)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Bounds;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;

    #[fixture]
    fn bounds() -> GenerationBounds {
        GenerationBounds {
            flow: Bounds::new(15.0, 35.0),
            capacity: Bounds::new(40.0, 80.0),
        }
    }

    fn edge_raw(from: &str, to: &str, distance: f64, capacity: Option<f64>) -> EdgeRaw {
        EdgeRaw {
            from: from.into(),
            to: to.into(),
            distance: Distance(distance),
            capacity: capacity.map(Flow),
        }
    }

    #[rstest]
    fn test_read_graph_from_iter(bounds: GenerationBounds) {
        let edges = [
            edge_raw("B", "A", 2.0, Some(10.0)),
            edge_raw("A", "B", 2.0, None),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let graph = read_graph_from_iter(
            edges.into_iter(),
            [NodeID::new("C")],
            &bounds,
            &mut rng,
        )
        .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.capacity(&"B".into(), &"A".into()), Some(Flow(10.0)));
        let generated = graph.capacity(&"A".into(), &"B".into()).unwrap();
        assert!(bounds.capacity.contains(generated));
    }

    #[rstest]
    fn test_read_graph_from_iter_invalid(bounds: GenerationBounds) {
        let mut rng = StdRng::seed_from_u64(0);
        let edges = [edge_raw("A", "B", 1.0, Some(0.0))];
        let err = read_graph_from_iter(edges.into_iter(), [], &bounds, &mut rng).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid graph: Edge A -> B must have a finite capacity greater than zero (got 0)"
        );

        let edges = [edge_raw("", "B", 1.0, Some(1.0))];
        assert!(read_graph_from_iter(edges.into_iter(), [], &bounds, &mut rng).is_err());
    }

    #[rstest]
    fn test_read_graph(bounds: GenerationBounds) {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(EDGES_FILE_NAME)).unwrap();
            writeln!(file, "from,to,distance,capacity\nO,A,1.5,20\nA,D,2,30").unwrap();
        }

        let mut rng = StdRng::seed_from_u64(0);
        let graph = read_graph(dir.path(), [], &bounds, false, &mut rng).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.get_edge(&"O".into(), &"A".into()).unwrap().distance,
            Distance(1.5)
        );

        let graph = read_graph(dir.path(), [], &bounds, true, &mut rng).unwrap();
        assert!(
            graph
                .iter_edges()
                .all(|edge| bounds.capacity.contains(edge.capacity))
        );
    }

    #[rstest]
    fn test_read_graph_bad_file(bounds: GenerationBounds) {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(EDGES_FILE_NAME)).unwrap();
            writeln!(file, "from,to,distance,capacity\nO,O,1,20").unwrap();
        }

        let mut rng = StdRng::seed_from_u64(0);
        let err = read_graph(dir.path(), [], &bounds, false, &mut rng).unwrap_err();
        assert_eq!(
            err.to_string(),
            input_err_msg(dir.path().join(EDGES_FILE_NAME))
        );
    }
}

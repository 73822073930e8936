//! Common routines for handling input data.
use crate::commodity::Commodity;
use crate::generate::GenerationBounds;
use crate::graph::{Graph, NodeID};
use crate::parameters::ModelParameters;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod commodity;
use commodity::{build_commodities, read_commodity_records};
pub mod graph;
use graph::read_graph;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Options controlling how a scenario is loaded
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadOptions {
    /// Redraw every edge capacity, ignoring those given in the edges file
    pub regenerate_capacities: bool,
    /// Seed for random generation, overriding the one in the model file
    pub seed: Option<u64>,
}

/// A road network and set of emergencies, ready to be optimised
#[derive(Debug)]
pub struct Scenario {
    /// The road network
    pub graph: Graph,
    /// The emergencies to route
    pub commodities: Vec<Commodity>,
    /// Model parameters
    pub parameters: ModelParameters,
}

/// Create the random number generator for a run.
///
/// A seed given on the command line takes precedence over the one in the model file. With neither,
/// the generator is seeded from the OS.
fn create_rng(options: &LoadOptions, parameters: &ModelParameters) -> StdRng {
    match options.seed.or(parameters.seed) {
        Some(seed) => {
            info!("Using random seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    }
}

/// Load a scenario from the specified directory.
///
/// Missing capacities and desired flows are generated from the bounds in the model file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario files
/// * `options` - How to treat generated values
///
/// # Returns
///
/// The scenario or an error if any file is missing or invalid.
pub fn load_scenario<P: AsRef<Path>>(model_dir: P, options: &LoadOptions) -> Result<Scenario> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let bounds = GenerationBounds::from(&parameters);
    let mut rng = create_rng(options, &parameters);

    let records = read_commodity_records(model_dir)?;
    let endpoints = records
        .iter()
        .flat_map(|record| [record.origin.as_str(), record.destination.as_str()])
        .map(NodeID::new);
    let graph = read_graph(
        model_dir,
        endpoints,
        &bounds,
        options.regenerate_capacities,
        &mut rng,
    )?;
    let commodities = build_commodities(model_dir, &graph, records, &parameters, &mut rng)?;
    info!(
        "Loaded scenario with {} nodes, {} edges and {} commodities",
        graph.node_count(),
        graph.edge_count(),
        commodities.len()
    );

    Ok(Scenario {
        graph,
        commodities,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\n world ,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // File with no data (only column headers)
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_csv_bad_value() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,minus one\n");
        let err = read_csv::<Record>(&file_path).err().unwrap();
        assert_eq!(err.to_string(), input_err_msg(&file_path));
    }

    #[test]
    fn test_read_toml() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Settings {
            value: u32,
        }

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "value = 1").unwrap();
        }
        assert_eq!(
            read_toml::<Settings>(&file_path).unwrap(),
            Settings { value: 1 }
        );

        // Invalid TOML
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "value = \"hello\"").unwrap();
        }
        assert!(read_toml::<Settings>(&file_path).is_err());
    }

    fn create_scenario(dir_path: &Path, edges: &str, commodities: &str) {
        let mut file = File::create(dir_path.join("edges.csv")).unwrap();
        writeln!(file, "{edges}").unwrap();
        let mut file = File::create(dir_path.join("commodities.csv")).unwrap();
        writeln!(file, "{commodities}").unwrap();
    }

    #[test]
    fn test_load_scenario() {
        let dir = tempdir().unwrap();
        create_scenario(
            dir.path(),
            "from,to,distance,capacity\nO,A,1,100\nA,D,1,\nO,D,3,50",
            "id,origin,destination,priority,desired_flow\nc1,O,D,critical,\nc2,A,D,mild,10",
        );

        let options = LoadOptions {
            seed: Some(5),
            ..LoadOptions::default()
        };
        let scenario = load_scenario(dir.path(), &options).unwrap();
        assert_eq!(scenario.graph.node_count(), 3);
        assert_eq!(scenario.graph.edge_count(), 3);
        assert_eq!(scenario.commodities.len(), 2);

        // Blank capacity is generated within bounds
        let capacity = scenario
            .graph
            .capacity(&"A".into(), &"D".into())
            .unwrap();
        assert!(scenario.parameters.capacity_bounds.contains(capacity));

        // Loading again with the same seed gives the same scenario
        let again = load_scenario(dir.path(), &options).unwrap();
        assert_eq!(again.graph, scenario.graph);
        assert_eq!(again.commodities, scenario.commodities);
    }

    #[test]
    fn test_load_scenario_regenerate_capacities() {
        let dir = tempdir().unwrap();
        create_scenario(
            dir.path(),
            "from,to,distance,capacity\nO,A,1,1000\nA,D,1,1000",
            "id,origin,destination,priority,desired_flow\nc1,O,D,moderate,20",
        );

        let options = LoadOptions {
            regenerate_capacities: true,
            seed: Some(1),
        };
        let scenario = load_scenario(dir.path(), &options).unwrap();
        for edge in scenario.graph.iter_edges() {
            assert!(scenario.parameters.capacity_bounds.contains(edge.capacity));
        }
    }

    #[test]
    fn test_load_scenario_isolated_endpoint() {
        // Commodity endpoints not on any edge still become nodes
        let dir = tempdir().unwrap();
        create_scenario(
            dir.path(),
            "from,to,distance,capacity\nO,A,1,100",
            "id,origin,destination,priority,desired_flow\nc1,O,Z,mild,10",
        );

        let scenario = load_scenario(dir.path(), &LoadOptions::default()).unwrap();
        assert!(scenario.graph.contains_node(&"Z".into()));
    }

    #[test]
    fn test_load_scenario_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_scenario(dir.path(), &LoadOptions::default()).is_err());
    }
}

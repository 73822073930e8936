//! Code for reading emergency requests from a CSV file.
use super::{input_err_msg, read_csv};
use crate::commodity::{Commodity, Priority, check_commodities};
use crate::generate::{GenerationBounds, generate_desired_flow};
use crate::graph::Graph;
use crate::parameters::ModelParameters;
use crate::units::Flow;
use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::path::Path;

const COMMODITIES_FILE_NAME: &str = "commodities.csv";

/// A row of the commodities file
#[derive(PartialEq, Debug, Deserialize)]
pub struct CommodityRecord {
    /// Identifier for the request
    pub id: String,
    /// The ambulance base
    pub origin: String,
    /// The emergency location
    pub destination: String,
    /// Severity of the emergency
    pub priority: Priority,
    /// Desired flow. Generated if absent.
    pub desired_flow: Option<Flow>,
}

/// Read the rows of the commodities file in `model_dir`
pub fn read_commodity_records(model_dir: &Path) -> Result<Vec<CommodityRecord>> {
    let file_path = model_dir.join(COMMODITIES_FILE_NAME);
    Ok(read_csv(&file_path)?.collect())
}

/// Create commodities from the rows of the commodities file.
///
/// Unit costs come from the ambulance type for each priority. Blank desired flows are drawn from
/// the flow bounds for the commodity's priority.
pub fn build_commodities<R: Rng>(
    model_dir: &Path,
    graph: &Graph,
    records: Vec<CommodityRecord>,
    parameters: &ModelParameters,
    rng: &mut R,
) -> Result<Vec<Commodity>> {
    let file_path = model_dir.join(COMMODITIES_FILE_NAME);
    build_commodities_from_iter(graph, records.into_iter(), parameters, rng)
        .with_context(|| input_err_msg(&file_path))
}

fn build_commodities_from_iter<I, R>(
    graph: &Graph,
    iter: I,
    parameters: &ModelParameters,
    rng: &mut R,
) -> Result<Vec<Commodity>>
where
    I: Iterator<Item = CommodityRecord>,
    R: Rng,
{
    let bounds = GenerationBounds::from(parameters);
    let commodities = iter
        .map(|record| {
            let desired_flow = record
                .desired_flow
                .unwrap_or_else(|| generate_desired_flow(record.priority, &bounds, rng));

            Commodity::new(
                graph,
                record.id.into(),
                record.origin.into(),
                record.destination.into(),
                desired_flow,
                record.priority,
                parameters.unit_cost(record.priority),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    check_commodities(graph, &commodities)?;

    Ok(commodities)
}

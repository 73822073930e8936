//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::commodity::{AmbulanceType, Priority};
use crate::input::{input_err_msg, read_toml};
use crate::units::{Dimensionless, Flow, MoneyPerFlowPerDistance};
use anyhow::{Context, Result, ensure};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

define_unit_param_default!(default_critical_weight, Dimensionless, 0.6);
define_unit_param_default!(default_moderate_weight, Dimensionless, 0.8);
define_unit_param_default!(default_tolerance, Dimensionless, 1e-6);
define_unit_param_default!(default_basic_cost, MoneyPerFlowPerDistance, 100.0);
define_unit_param_default!(default_intermediate_cost, MoneyPerFlowPerDistance, 250.0);
define_unit_param_default!(default_advanced_cost, MoneyPerFlowPerDistance, 500.0);

fn default_time_limit() -> f64 {
    60.0
}

fn default_flow_bounds() -> Bounds {
    Bounds {
        min: Flow(15.0),
        max: Flow(35.0),
    }
}

fn default_capacity_bounds() -> Bounds {
    Bounds {
        min: Flow(40.0),
        max: Flow(80.0),
    }
}

/// An inclusive range of flow values
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct Bounds {
    /// Lower bound
    pub min: Flow,
    /// Upper bound
    pub max: Flow,
}

impl Bounds {
    /// Create a new [`Bounds`]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Flow(min),
            max: Flow(max),
        }
    }

    /// Whether `value` lies within the bounds
    pub fn contains(&self, value: Flow) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Operational cost per unit flow per unit distance for each ambulance type
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct AmbulanceCosts {
    /// Cost for a basic ambulance (mild emergencies)
    #[serde(default = "default_basic_cost")]
    pub basic: MoneyPerFlowPerDistance,
    /// Cost for an intermediate ambulance (moderate emergencies)
    #[serde(default = "default_intermediate_cost")]
    pub intermediate: MoneyPerFlowPerDistance,
    /// Cost for an advanced ambulance (critical emergencies)
    #[serde(default = "default_advanced_cost")]
    pub advanced: MoneyPerFlowPerDistance,
}

impl Default for AmbulanceCosts {
    fn default() -> Self {
        Self {
            basic: default_basic_cost(),
            intermediate: default_intermediate_cost(),
            advanced: default_advanced_cost(),
        }
    }
}

impl AmbulanceCosts {
    /// The unit cost for the given ambulance type
    pub fn unit_cost(&self, ambulance_type: AmbulanceType) -> MoneyPerFlowPerDistance {
        match ambulance_type {
            AmbulanceType::Basic => self.basic,
            AmbulanceType::Intermediate => self.intermediate,
            AmbulanceType::Advanced => self.advanced,
        }
    }
}

/// Multipliers applied to the cost of each priority class in the objective.
///
/// The weight for mild emergencies is always 1.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct PriorityWeights {
    /// Weight for moderate emergencies
    #[serde(default = "default_moderate_weight")]
    pub moderate: Dimensionless,
    /// Weight for critical emergencies
    #[serde(default = "default_critical_weight")]
    pub critical: Dimensionless,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            moderate: default_moderate_weight(),
            critical: default_critical_weight(),
        }
    }
}

impl PriorityWeights {
    /// The weight for the given priority
    pub fn weight(&self, priority: Priority) -> Dimensionless {
        match priority {
            Priority::Mild => Dimensionless(1.0),
            Priority::Moderate => self.moderate,
            Priority::Critical => self.critical,
        }
    }
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// Range for generated desired flows (R_min, R_max)
    #[serde(default = "default_flow_bounds")]
    pub flow_bounds: Bounds,
    /// Range for generated edge capacities (C_min, C_max)
    #[serde(default = "default_capacity_bounds")]
    pub capacity_bounds: Bounds,
    /// Unit cost of each ambulance type
    #[serde(default)]
    pub ambulance_costs: AmbulanceCosts,
    /// Cost multipliers for each priority class
    #[serde(default)]
    pub priority_weights: PriorityWeights,
    /// Numerical tolerance used when tracing routes and reporting utilisation
    #[serde(default = "default_tolerance")]
    pub tolerance: Dimensionless,
    /// Seed for generating capacities and flows. Drawn from the OS if absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Maximum time in seconds the solver may spend on a run
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            flow_bounds: default_flow_bounds(),
            capacity_bounds: default_capacity_bounds(),
            ambulance_costs: AmbulanceCosts::default(),
            priority_weights: PriorityWeights::default(),
            tolerance: default_tolerance(),
            seed: None,
            time_limit: default_time_limit(),
        }
    }
}

/// Check that a pair of bounds is valid
fn check_bounds(name: &str, bounds: &Bounds) -> Result<()> {
    ensure!(
        bounds.min.is_finite() && bounds.min > Flow(0.0),
        "{name}.min must be a finite number greater than zero"
    );
    ensure!(
        bounds.max.is_finite() && bounds.max >= bounds.min,
        "{name}.max must be a finite number no less than {name}.min"
    );

    Ok(())
}

/// Check that every ambulance cost is positive
fn check_ambulance_costs(costs: &AmbulanceCosts) -> Result<()> {
    for ambulance_type in AmbulanceType::iter() {
        let cost = costs.unit_cost(ambulance_type);
        ensure!(
            cost.is_finite() && cost > MoneyPerFlowPerDistance(0.0),
            "ambulance_costs.{ambulance_type} must be a finite number greater than zero"
        );
    }

    Ok(())
}

/// Check that priority weights strictly decrease with priority, starting below 1
fn check_priority_weights(weights: &PriorityWeights) -> Result<()> {
    ensure!(
        weights.critical > Dimensionless(0.0)
            && weights.critical < weights.moderate
            && weights.moderate < Dimensionless(1.0),
        "priority_weights must satisfy 0 < critical < moderate < 1"
    );

    Ok(())
}

/// Check the `tolerance` parameter is valid
fn check_tolerance(value: Dimensionless) -> Result<()> {
    ensure!(
        value.is_finite() && value > Dimensionless(0.0),
        "tolerance must be a finite number greater than zero"
    );

    Ok(())
}

/// Check the `time_limit` parameter is valid. An infinite limit means no limit.
fn check_time_limit(value: f64) -> Result<()> {
    ensure!(value > 0.0, "time_limit must be greater than zero");

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// If the file is not present, default values are used.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing the scenario files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        if !file_path.is_file() {
            info!(
                "No {MODEL_PARAMETERS_FILE_NAME} found in {}; using default parameters",
                model_dir.as_ref().display()
            );
            return Ok(ModelParameters::default());
        }

        let model_params: ModelParameters = read_toml(&file_path)?;
        model_params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        check_bounds("flow_bounds", &self.flow_bounds)?;
        check_bounds("capacity_bounds", &self.capacity_bounds)?;
        check_ambulance_costs(&self.ambulance_costs)?;
        check_priority_weights(&self.priority_weights)?;
        check_tolerance(self.tolerance)?;
        check_time_limit(self.time_limit)?;

        if !self.weighted_costs_increase_with_priority() {
            warn!(
                "Weighted unit costs (ambulance cost x priority weight) do not increase with \
                priority. Critical emergencies will not be favoured when capacity is scarce."
            );
        }

        Ok(())
    }

    /// The cost per unit flow per unit distance for a commodity of the given priority, before
    /// priority weighting
    pub fn unit_cost(&self, priority: Priority) -> MoneyPerFlowPerDistance {
        self.ambulance_costs.unit_cost(priority.ambulance_type())
    }

    /// Whether `unit_cost * weight` strictly increases from mild through to critical
    fn weighted_costs_increase_with_priority(&self) -> bool {
        let weighted: Vec<_> = Priority::iter()
            .map(|priority| self.unit_cost(priority) * self.priority_weights.weight(priority))
            .collect();

        weighted.windows(2).all(|pair| pair[0] < pair[1])
    }
}

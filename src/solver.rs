//! Provides data structures for linear programs and an adapter for solving them.
//!
//! The routing core describes its problem as a [`LinearProgram`] independent of any solver
//! library. Any backend implementing [`Solver`] can then be plugged in; [`HighsSolver`] is the
//! default.
use highs::{HighsModelStatus, RowProblem, Sense};
use log::{Level, debug, log_enabled};
use std::ops::RangeInclusive;

/// A decision variable in a [`LinearProgram`].
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// The position of the variable's column in the program
    pub fn index(self) -> usize {
        self.0
    }
}

/// The definition of a variable to be optimised.
///
/// The coefficient is the multiplying factor in the objective function to minimise, i.e. the c in:
///
/// f = c1*x1 + c2*x2 + ...
///
/// with x1, x2... taking values between min and max.
#[derive(PartialEq, Debug, Clone)]
pub struct VariableDefinition {
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value (may be infinite)
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub coefficient: f64,
}

/// A constraint for an optimisation.
///
/// Each constraint adds an inequality to the problem of the form:
///
/// min <= a1*x1 + a2*x2 + ... <= max
///
/// Terms for variables not listed have a coefficient of zero.
#[derive(PartialEq, Debug, Clone)]
pub struct Constraint {
    /// The minimum value for the constraint (may be negative infinity)
    pub min: f64,
    /// The maximum value for the constraint (may be infinity)
    pub max: f64,
    /// Sparse coefficients for the variables in the constraint
    pub terms: Vec<(Variable, f64)>,
}

impl Constraint {
    /// Whether the constraint is satisfied by the given values, to within `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs: f64 = self
            .terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum();

        lhs >= self.min - tolerance && lhs <= self.max + tolerance
    }
}

/// A linear program to be minimised
#[derive(PartialEq, Debug, Clone, Default)]
pub struct LinearProgram {
    variables: Vec<VariableDefinition>,
    constraints: Vec<Constraint>,
}

impl LinearProgram {
    /// Add a variable with the given objective coefficient and bounds
    pub fn add_variable(&mut self, coefficient: f64, bounds: RangeInclusive<f64>) -> Variable {
        self.variables.push(VariableDefinition {
            min: *bounds.start(),
            max: *bounds.end(),
            coefficient,
        });

        Variable(self.variables.len() - 1)
    }

    /// Add a constraint requiring the weighted sum of `terms` to lie within `bounds`
    pub fn add_constraint<I>(&mut self, bounds: RangeInclusive<f64>, terms: I)
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        self.constraints.push(Constraint {
            min: *bounds.start(),
            max: *bounds.end(),
            terms: terms.into_iter().collect(),
        });
    }

    /// The variables of the program, in column order
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    /// The constraints of the program, in row order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Evaluate the objective function for the given variable values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(def, value)| def.coefficient * value)
            .sum()
    }
}

/// The outcome of solving a [`LinearProgram`]
#[derive(PartialEq, Debug, Clone)]
pub enum SolverOutcome {
    /// An optimal solution was found. Contains the value of each variable in column order.
    Optimal(Vec<f64>),
    /// No assignment satisfies every constraint. Other failures of the solver are also reported
    /// this way, with a diagnostic attached.
    Infeasible {
        /// Extra information about why no solution was returned
        diagnostic: Option<String>,
    },
    /// The objective can be decreased without limit
    Unbounded,
}

/// A linear programming backend
pub trait Solver {
    /// Minimise the program's objective subject to its constraints
    fn solve(&self, program: &LinearProgram) -> SolverOutcome;
}

/// Solve a program with no variables: optimal if every (empty) constraint admits zero
fn solve_without_variables(program: &LinearProgram) -> SolverOutcome {
    if program.constraints.iter().all(|c| c.min <= 0.0 && 0.0 <= c.max) {
        SolverOutcome::Optimal(Vec::new())
    } else {
        SolverOutcome::Infeasible {
            diagnostic: Some("Constraint with no variables cannot be satisfied".into()),
        }
    }
}

/// Solves programs with the HiGHS solver.
///
/// A fresh HiGHS model is created for every call, so no state is shared between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighsSolver {
    /// Maximum solve time in seconds
    time_limit: f64,
}

impl Default for HighsSolver {
    /// A solver with no time limit
    fn default() -> Self {
        Self::new(f64::INFINITY)
    }
}

impl HighsSolver {
    /// Create a solver which gives up after `time_limit` seconds
    pub fn new(time_limit: f64) -> Self {
        Self { time_limit }
    }
}

/// Map a HiGHS status other than `Optimal` to an outcome.
///
/// Statuses which are neither infeasible nor unbounded (e.g. a reached time limit) are treated as
/// infeasible, with the status given as a diagnostic.
fn unsolved_outcome(status: HighsModelStatus) -> SolverOutcome {
    match status {
        HighsModelStatus::Infeasible => SolverOutcome::Infeasible { diagnostic: None },
        HighsModelStatus::Unbounded => SolverOutcome::Unbounded,
        status => SolverOutcome::Infeasible {
            diagnostic: Some(format!("HiGHS returned status {status:?}")),
        },
    }
}

impl Solver for HighsSolver {
    fn solve(&self, program: &LinearProgram) -> SolverOutcome {
        if program.variables.is_empty() {
            return solve_without_variables(program);
        }

        let mut problem = RowProblem::default();
        let columns: Vec<_> = program
            .variables
            .iter()
            .map(|def| problem.add_column(def.coefficient, def.min..=def.max))
            .collect();
        for constraint in &program.constraints {
            problem.add_row(
                constraint.min..=constraint.max,
                constraint
                    .terms
                    .iter()
                    .map(|(var, coeff)| (columns[var.index()], *coeff)),
            );
        }

        let mut model = problem.optimise(Sense::Minimise);
        enable_highs_logging(&mut model);
        if self.time_limit.is_finite() {
            model.set_option("time_limit", self.time_limit);
        }

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => {
                return SolverOutcome::Infeasible {
                    diagnostic: Some(format!("HiGHS failed to run: {status:?}")),
                };
            }
        };

        let status = solved.status();
        debug!("HiGHS finished with status {status:?}");
        match status {
            HighsModelStatus::Optimal => {
                SolverOutcome::Optimal(solved.get_solution().columns().to_vec())
            }
            status => unsolved_outcome(status),
        }
    }
}

/// Let HiGHS write to the console, but only if the most verbose log level is enabled
fn enable_highs_logging(model: &mut highs::Model) {
    let enabled = log_enabled!(Level::Trace);
    model.set_option("output_flag", enabled);
    model.set_option("log_to_console", enabled);
}

//! Catastrophe models and their runnable instances.
//!
//! A `ModelDescriptor` is the immutable description of one catastrophe (its
//! name, parameter/variable signature, equation arity and the two functions
//! that carry its mathematics). An `Instance` binds concrete values to a
//! descriptor and owns the equation state and output grid of one sweep.

use crate::cache::CacheKey;
use crate::equation::{DerivativeFn, Equation, EquationScalar, EquationState, ModelKind};
use crate::error::{CatastropheError, Result};
use crate::grid::{Point, PointGrid};
use crate::registry::{fabricate, Model};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl Parameter {
    /// A parameter held at `value` for the whole sweep.
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            current: value,
            min: value,
            max: value,
            steps: 0,
        }
    }

    /// A parameter swept over `steps` points starting at `min`.
    pub fn range(name: impl Into<String>, min: f64, max: f64, steps: usize) -> Self {
        Self {
            name: name.into(),
            current: min,
            min,
            max,
            steps,
        }
    }

    pub fn is_alterable(&self) -> bool {
        self.steps != 0 && self.min != self.max
    }

    pub fn step_size(&self) -> f64 {
        (self.max - self.min) / self.steps as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub current: f64,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            current: value,
        }
    }
}

/// Indices of the two swept parameters, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlterablePair {
    pub first: usize,
    pub second: usize,
}

impl AlterablePair {
    pub fn find(parameters: &[Parameter]) -> Result<Self> {
        let alterable: Vec<usize> = parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_alterable())
            .map(|(idx, _)| idx)
            .collect();
        match alterable.as_slice() {
            [first, second] => Ok(Self {
                first: *first,
                second: *second,
            }),
            _ => Err(CatastropheError::NoAlterablePair {
                found: alterable.len(),
            }),
        }
    }
}

/// How a descriptor expects parameters or variables to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// Bind by name, in this order.
    Named(Vec<String>),
    /// Take the first `n` supplied values as they come.
    Positional(usize),
}

impl Signature {
    /// Number of values the signature binds.
    pub fn count(&self) -> usize {
        match self {
            Signature::Named(names) => names.len(),
            Signature::Positional(count) => *count,
        }
    }
}

#[derive(Clone, Copy)]
pub enum ModelDerivative {
    Real(DerivativeFn<f64>),
    Complex(DerivativeFn<Complex64>),
}

/// Fills `instance.grid[i][j]`; may run any number of integration passes.
pub type CalculateFn = fn(instance: &mut Instance, i: usize, j: usize) -> Result<()>;

/// Builds an instance of `model` from caller-supplied bindings.
pub type FabricateFn =
    fn(model: &Arc<Model>, parameters: &[Parameter], variables: &[Variable]) -> Result<Instance>;

#[derive(Clone)]
pub struct ModelDescriptor {
    name: String,
    parameters: Signature,
    variables: Signature,
    num_equations: usize,
    derivative: ModelDerivative,
    calculate: CalculateFn,
    fabricate: FabricateFn,
}

impl ModelDescriptor {
    pub fn real(
        name: impl Into<String>,
        num_equations: usize,
        derivative: DerivativeFn<f64>,
        calculate: CalculateFn,
    ) -> Self {
        Self::with_derivative(name, num_equations, ModelDerivative::Real(derivative), calculate)
    }

    pub fn complex(
        name: impl Into<String>,
        num_equations: usize,
        derivative: DerivativeFn<Complex64>,
        calculate: CalculateFn,
    ) -> Self {
        Self::with_derivative(
            name,
            num_equations,
            ModelDerivative::Complex(derivative),
            calculate,
        )
    }

    fn with_derivative(
        name: impl Into<String>,
        num_equations: usize,
        derivative: ModelDerivative,
        calculate: CalculateFn,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: Signature::Positional(0),
            variables: Signature::Positional(0),
            num_equations,
            derivative,
            calculate,
            fabricate,
        }
    }

    pub fn with_parameter_names(mut self, names: &[&str]) -> Self {
        self.parameters = Signature::Named(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_variable_names(mut self, names: &[&str]) -> Self {
        self.variables = Signature::Named(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_positional_parameters(mut self, count: usize) -> Self {
        self.parameters = Signature::Positional(count);
        self
    }

    pub fn with_positional_variables(mut self, count: usize) -> Self {
        self.variables = Signature::Positional(count);
        self
    }

    pub fn with_fabricator(mut self, fabricate: FabricateFn) -> Self {
        self.fabricate = fabricate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        match self.derivative {
            ModelDerivative::Real(_) => ModelKind::Real,
            ModelDerivative::Complex(_) => ModelKind::Complex,
        }
    }

    pub fn parameters(&self) -> &Signature {
        &self.parameters
    }

    pub fn variables(&self) -> &Signature {
        &self.variables
    }

    pub fn num_equations(&self) -> usize {
        self.num_equations
    }

    pub fn derivative(&self) -> ModelDerivative {
        self.derivative
    }

    pub fn calculate(&self) -> CalculateFn {
        self.calculate
    }

    pub fn fabricator(&self) -> FabricateFn {
        self.fabricate
    }
}

impl std::fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("parameters", &self.parameters)
            .field("variables", &self.variables)
            .field("num_equations", &self.num_equations)
            .finish()
    }
}

/// Lifecycle of the sweep run on one instance. `Succeeded` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Partitioning,
    Running { workers: usize },
    Joining,
    Succeeded,
    Failed,
}

/// A model bound to concrete values, ready to be swept.
pub struct Instance {
    model: Arc<Model>,
    parameters: Vec<Parameter>,
    variables: Vec<Variable>,
    equation: Equation,
    grid: PointGrid,
    pair: AlterablePair,
    state: SweepState,
}

impl Instance {
    pub(crate) fn new(
        model: Arc<Model>,
        parameters: Vec<Parameter>,
        variables: Vec<Variable>,
        equation: Equation,
        grid: PointGrid,
        pair: AlterablePair,
    ) -> Self {
        Self {
            model,
            parameters,
            variables,
            equation,
            grid,
            pair,
            state: SweepState::Idle,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn name(&self) -> &str {
        self.model.descriptor().name()
    }

    pub fn kind(&self) -> ModelKind {
        self.equation.kind()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Current value of the parameter at `index`.
    #[inline]
    pub fn param(&self, index: usize) -> f64 {
        self.parameters[index].current
    }

    /// Current value of the variable at `index`.
    #[inline]
    pub fn var(&self, index: usize) -> f64 {
        self.variables[index].current
    }

    pub fn pair(&self) -> AlterablePair {
        self.pair
    }

    pub fn equation_mut<T: EquationScalar>(&mut self) -> Result<&mut EquationState<T>> {
        let expected = self.equation.kind().as_str();
        T::state_mut(&mut self.equation).ok_or(CatastropheError::EquationKindMismatch {
            expected,
            requested: T::KIND,
        })
    }

    /// Runs one integration pass of the equation state with its current
    /// function, initial vector and arity.
    pub fn integrate<T: EquationScalar>(&mut self, start: f64, end: f64, step: f64) -> Result<usize> {
        let expected = self.equation.kind().as_str();
        let state = T::state_mut(&mut self.equation).ok_or(
            CatastropheError::EquationKindMismatch {
                expected,
                requested: T::KIND,
            },
        )?;
        state.integrate(&self.parameters, &self.variables, start, end, step)
    }

    pub fn point(&self, i: usize, j: usize) -> Point {
        self.grid.get(i, j)
    }

    pub fn set_point(&mut self, i: usize, j: usize, point: Point) {
        self.grid.set(i, j, point);
    }

    pub fn sweep_state(&self) -> SweepState {
        self.state
    }

    /// The output grid, available only after a successful sweep.
    pub fn grid(&self) -> Option<&PointGrid> {
        (self.state == SweepState::Succeeded).then_some(&self.grid)
    }

    pub fn into_grid(self) -> Option<PointGrid> {
        (self.state == SweepState::Succeeded).then_some(self.grid)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            self.parameters.iter().map(|p| p.current),
            self.variables.iter().map(|v| v.current),
        )
    }

    pub(crate) fn set_sweep_state(&mut self, state: SweepState) {
        self.state = state;
    }

    pub(crate) fn parameter_mut(&mut self, index: usize) -> &mut Parameter {
        &mut self.parameters[index]
    }

    pub(crate) fn grid_mut(&mut self) -> &mut PointGrid {
        &mut self.grid
    }

    /// Releases the grid regardless of the sweep state.
    pub(crate) fn take_grid(self) -> PointGrid {
        self.grid
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.name())
            .field("kind", &self.kind())
            .field("parameters", &self.parameters)
            .field("variables", &self.variables)
            .field("pair", &self.pair)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alterable_requires_steps_and_distinct_bounds() {
        assert!(Parameter::range("a", 0.0, 1.0, 4).is_alterable());
        assert!(!Parameter::range("a", 1.0, 1.0, 4).is_alterable());
        assert!(!Parameter::range("a", 0.0, 1.0, 0).is_alterable());
        assert!(!Parameter::fixed("a", 2.0).is_alterable());
        assert_eq!(Parameter::range("a", 0.0, 1.0, 4).step_size(), 0.25);
    }

    #[test]
    fn pair_is_found_in_declaration_order() {
        let params = vec![
            Parameter::fixed("a", 1.0),
            Parameter::range("b", 0.0, 1.0, 2),
            Parameter::fixed("c", 1.0),
            Parameter::range("d", -1.0, 1.0, 3),
        ];
        let pair = AlterablePair::find(&params).expect("pair");
        assert_eq!(pair, AlterablePair { first: 1, second: 3 });
    }

    #[test]
    fn pair_rejects_wrong_alterable_counts() {
        let one = vec![Parameter::range("a", 0.0, 1.0, 2), Parameter::fixed("b", 0.0)];
        assert_eq!(
            AlterablePair::find(&one),
            Err(CatastropheError::NoAlterablePair { found: 1 })
        );
        let three = vec![
            Parameter::range("a", 0.0, 1.0, 2),
            Parameter::range("b", 0.0, 1.0, 2),
            Parameter::range("c", 0.0, 1.0, 2),
        ];
        assert_eq!(
            AlterablePair::find(&three),
            Err(CatastropheError::NoAlterablePair { found: 3 })
        );
        assert_eq!(
            AlterablePair::find(&[]),
            Err(CatastropheError::NoAlterablePair { found: 0 })
        );
    }
}

//! Equation state owned by an instance: the active derivative function, its
//! arity, the initial/result vectors and the model's scratch storage.

use crate::catastrophe::{Parameter, Variable};
use crate::config::MAX_EQUATIONS;
use crate::error::{CatastropheError, Result};
use crate::solvers::runge_kutta;
use crate::traits::{DynamicalSystem, StateScalar};
use crate::vector::{ModelStorage, StateVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Right-hand side of a model's ODE system. Must be a pure function of its
/// inputs and the read-only context.
pub type DerivativeFn<T> = fn(ctx: &DerivativeContext<'_, T>, t: f64, y: &[T], f: &mut [T]);

pub type RealEquation = EquationState<f64>;
pub type ComplexEquation = EquationState<Complex64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Real,
    Complex,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Real => f64::KIND,
            ModelKind::Complex => Complex64::KIND,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of an instance handed to derivative functions.
pub struct DerivativeContext<'a, T: StateScalar> {
    parameters: &'a [Parameter],
    variables: &'a [Variable],
    storage: &'a ModelStorage<T>,
}

impl<'a, T: StateScalar> DerivativeContext<'a, T> {
    pub fn new(
        parameters: &'a [Parameter],
        variables: &'a [Variable],
        storage: &'a ModelStorage<T>,
    ) -> Self {
        Self {
            parameters,
            variables,
            storage,
        }
    }

    /// Current value of the parameter bound at `index`.
    #[inline]
    pub fn param(&self, index: usize) -> f64 {
        self.parameters[index].current
    }

    /// Current value of the variable bound at `index`.
    #[inline]
    pub fn var(&self, index: usize) -> f64 {
        self.variables[index].current
    }

    #[inline]
    pub fn storage(&self, slot: usize) -> T {
        self.storage.get(slot)
    }
}

/// Adapts a derivative function and its context to `DynamicalSystem`.
struct BoundDerivative<'a, T: StateScalar> {
    function: DerivativeFn<T>,
    dimension: usize,
    context: DerivativeContext<'a, T>,
}

impl<T: StateScalar> DynamicalSystem<T> for BoundDerivative<'_, T> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn apply(&self, t: f64, x: &[T], out: &mut [T]) {
        (self.function)(&self.context, t, x, out);
    }
}

#[derive(Debug, Clone)]
pub struct EquationState<T: StateScalar> {
    function: DerivativeFn<T>,
    num_equations: usize,
    pub initial: StateVector<T>,
    pub result: StateVector<T>,
    pub storage: ModelStorage<T>,
}

impl<T: StateScalar> EquationState<T> {
    pub fn new(function: DerivativeFn<T>, num_equations: usize) -> Result<Self> {
        check_arity(num_equations)?;
        Ok(Self {
            function,
            num_equations,
            initial: StateVector::zeros(),
            result: StateVector::zeros(),
            storage: ModelStorage::new(),
        })
    }

    pub fn num_equations(&self) -> usize {
        self.num_equations
    }

    /// Changes the number of active equations for subsequent passes.
    pub fn set_num_equations(&mut self, num_equations: usize) -> Result<()> {
        check_arity(num_equations)?;
        self.num_equations = num_equations;
        Ok(())
    }

    pub fn set_function(&mut self, function: DerivativeFn<T>) {
        self.function = function;
    }

    /// Replaces the leading components of the initial vector; the tail is zeroed.
    pub fn set_initial(&mut self, values: &[T]) {
        self.initial = StateVector::from_slice(values);
    }

    #[inline]
    pub fn result(&self, index: usize) -> T {
        self.result[index]
    }

    /// Runs one integration pass with the currently installed function,
    /// writing `y(end)` into `result`.
    pub fn integrate(
        &mut self,
        parameters: &[Parameter],
        variables: &[Variable],
        start: f64,
        end: f64,
        step: f64,
    ) -> Result<usize> {
        let n = self.num_equations;
        let system = BoundDerivative {
            function: self.function,
            dimension: n,
            context: DerivativeContext::new(parameters, variables, &self.storage),
        };
        runge_kutta(
            &system,
            start,
            end,
            step,
            &self.initial.as_slice()[..n],
            &mut self.result.as_mut_slice()[..n],
        )
    }
}

fn check_arity(num_equations: usize) -> Result<()> {
    if num_equations > MAX_EQUATIONS {
        return Err(CatastropheError::CapacityExceeded {
            what: "equations",
            requested: num_equations,
            limit: MAX_EQUATIONS,
        });
    }
    Ok(())
}

/// Equation state of an instance, resolved once at fabrication time.
#[derive(Debug, Clone)]
pub enum Equation {
    Real(RealEquation),
    Complex(ComplexEquation),
}

impl Equation {
    pub fn kind(&self) -> ModelKind {
        match self {
            Equation::Real(_) => ModelKind::Real,
            Equation::Complex(_) => ModelKind::Complex,
        }
    }
}

/// Scalars that select one variant of `Equation`.
pub trait EquationScalar: StateScalar {
    fn state(equation: &Equation) -> Option<&EquationState<Self>>;
    fn state_mut(equation: &mut Equation) -> Option<&mut EquationState<Self>>;
}

impl EquationScalar for f64 {
    fn state(equation: &Equation) -> Option<&EquationState<f64>> {
        match equation {
            Equation::Real(state) => Some(state),
            Equation::Complex(_) => None,
        }
    }

    fn state_mut(equation: &mut Equation) -> Option<&mut EquationState<f64>> {
        match equation {
            Equation::Real(state) => Some(state),
            Equation::Complex(_) => None,
        }
    }
}

impl EquationScalar for Complex64 {
    fn state(equation: &Equation) -> Option<&EquationState<Complex64>> {
        match equation {
            Equation::Complex(state) => Some(state),
            Equation::Real(_) => None,
        }
    }

    fn state_mut(equation: &mut Equation) -> Option<&mut EquationState<Complex64>> {
        match equation {
            Equation::Complex(state) => Some(state),
            Equation::Real(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled_by_storage(ctx: &DerivativeContext<'_, f64>, _t: f64, y: &[f64], f: &mut [f64]) {
        f[0] = ctx.storage(0) * y[0];
    }

    fn constant_one(_ctx: &DerivativeContext<'_, f64>, _t: f64, _y: &[f64], f: &mut [f64]) {
        f[0] = 1.0;
        f[1] = 2.0;
    }

    #[test]
    fn arity_above_capacity_is_rejected() {
        let err = RealEquation::new(constant_one, MAX_EQUATIONS + 1).expect_err("must fail");
        assert!(matches!(err, CatastropheError::CapacityExceeded { .. }));
    }

    #[test]
    fn integrate_uses_installed_function_and_storage() {
        let mut equation = RealEquation::new(constant_one, 2).expect("equation");
        equation.set_initial(&[0.0, 0.0]);
        equation
            .integrate(&[], &[], 0.0, 1.0, 0.3)
            .expect("integration");
        assert!((equation.result(0) - 0.9).abs() < 1e-12);
        assert!((equation.result(1) - 1.8).abs() < 1e-12);

        equation.set_function(scaled_by_storage);
        equation.set_num_equations(1).expect("arity");
        equation.storage.set(0, 0.0);
        equation.set_initial(&[5.0]);
        equation
            .integrate(&[], &[], 0.0, 1.0, 0.1)
            .expect("integration");
        assert_eq!(equation.result(0), 5.0);
    }

    #[test]
    fn equation_scalar_selects_matching_variant() {
        let mut equation = Equation::Real(RealEquation::new(constant_one, 2).expect("equation"));
        assert_eq!(equation.kind(), ModelKind::Real);
        assert!(<f64 as EquationScalar>::state_mut(&mut equation).is_some());
        assert!(<Complex64 as EquationScalar>::state_mut(&mut equation).is_none());
    }
}

use num_complex::Complex64;
use num_traits::Zero;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul};

/// A trait for types that can be used as components of an equation state.
/// Implemented for `f64` (real models) and `Complex64` (complex models).
pub trait StateScalar:
    Copy
    + Debug
    + Zero
    + Add<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Human-readable name of the equation kind backed by this scalar.
    const KIND: &'static str;
}

impl StateScalar for f64 {
    const KIND: &'static str = "real";
}

impl StateScalar for Complex64 {
    const KIND: &'static str = "complex";
}

/// Represents a system of first-order ODEs `dy/dt = f(t, y)`.
pub trait DynamicalSystem<T: StateScalar> {
    /// Returns the number of active equations.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current value of the integration variable
    /// x: current state
    /// out: buffer to write dy/dt
    fn apply(&self, t: f64, x: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: StateScalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut f64, state: &mut [T], dt: f64);
}

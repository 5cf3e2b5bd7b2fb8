use crate::config::MAX_EQUATIONS;
use crate::error::{CatastropheError, Result};
use crate::traits::{DynamicalSystem, StateScalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver over fixed-capacity stack buffers.
pub struct RungeKutta<T: StateScalar> {
    k1: [T; MAX_EQUATIONS],
    k2: [T; MAX_EQUATIONS],
    k3: [T; MAX_EQUATIONS],
    k4: [T; MAX_EQUATIONS],
    tmp: [T; MAX_EQUATIONS],
}

impl<T: StateScalar> RungeKutta<T> {
    pub fn new() -> Self {
        let z = T::zero();
        Self {
            k1: [z; MAX_EQUATIONS],
            k2: [z; MAX_EQUATIONS],
            k3: [z; MAX_EQUATIONS],
            k4: [z; MAX_EQUATIONS],
            tmp: [z; MAX_EQUATIONS],
        }
    }
}

impl<T: StateScalar> Default for RungeKutta<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StateScalar> Steppable<T> for RungeKutta<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut f64, state: &mut [T], dt: f64) {
        let n = state.len();
        let t0 = *t;

        // k1 = dt * f(t, y)
        system.apply(t0, state, &mut self.k1[..n]);
        for i in 0..n {
            self.k1[i] = self.k1[i] * dt;
            self.tmp[i] = state[i] + self.k1[i] / 2.0;
        }

        // k2 = dt * f(t + dt/2, y + k1/2)
        system.apply(t0 + dt / 2.0, &self.tmp[..n], &mut self.k2[..n]);
        for i in 0..n {
            self.k2[i] = self.k2[i] * dt;
            self.tmp[i] = state[i] + self.k2[i] / 2.0;
        }

        // k3 = dt * f(t + dt/2, y + k2/2)
        system.apply(t0 + dt / 2.0, &self.tmp[..n], &mut self.k3[..n]);
        for i in 0..n {
            self.k3[i] = self.k3[i] * dt;
            self.tmp[i] = state[i] + self.k3[i];
        }

        // k4 = dt * f(t + dt, y + k3)
        system.apply(t0 + dt, &self.tmp[..n], &mut self.k4[..n]);

        // y_next = y + (k1 + 2k2 + 2k3 + k4) / 6
        for i in 0..n {
            self.k4[i] = self.k4[i] * dt;
            state[i] = state[i]
                + (self.k1[i] + self.k2[i] * 2.0 + self.k3[i] * 2.0 + self.k4[i]) / 6.0;
        }

        *t = t0 + dt;
    }
}

/// Integrates `system` from `start` towards `end` with the fixed step `step`,
/// reading the initial values from `initial` and writing the final state into
/// `result`. Returns the number of steps taken.
///
/// Steps are taken only while `t < end - step`, so a trailing sub-interval
/// shorter than `step` is never integrated: with `start = 0`, `end = 1` and
/// `step = 0.3` the result is the state at `t = 0.9`.
pub fn runge_kutta<T: StateScalar>(
    system: &impl DynamicalSystem<T>,
    start: f64,
    end: f64,
    step: f64,
    initial: &[T],
    result: &mut [T],
) -> Result<usize> {
    if !step.is_finite() || step <= 0.0 {
        return Err(CatastropheError::InvalidStep(step));
    }
    let n = system.dimension();
    if n > MAX_EQUATIONS {
        return Err(CatastropheError::CapacityExceeded {
            what: "equations",
            requested: n,
            limit: MAX_EQUATIONS,
        });
    }

    let mut y = [T::zero(); MAX_EQUATIONS];
    y[..n].copy_from_slice(&initial[..n]);

    let mut stepper = RungeKutta::<T>::new();
    let mut t = start;
    let mut steps = 0usize;
    while t < end - step {
        stepper.step(system, &mut t, &mut y[..n], step);
        steps += 1;
    }

    result[..n].copy_from_slice(&y[..n]);
    Ok(steps)
}

//! C3 catastrophe. Each point first integrates an Airy-type system whose
//! end values are staged in storage, then runs a one-component main pass
//! that reads them.

use super::{complex_point, GAMMA_1_3, GAMMA_2_3, LAMBDA_1, LAMBDA_2, LAMBDA_NAMES};
use crate::catastrophe::{Instance, ModelDescriptor};
use crate::equation::DerivativeContext;
use crate::error::Result;
use num_complex::Complex64;
use std::f64::consts::PI;

pub const NAME: &str = "Csub3";

/// Index of `k` among the bound variables.
pub const K: usize = 0;

const V: usize = 0;
const V1: usize = 1;

/// Storage slots filled by the Airy pass.
const AIRY: usize = 0;
const DAIRY: usize = 1;

const STEP: f64 = 0.01;

pub fn derivative(ctx: &DerivativeContext<'_, Complex64>, t: f64, y: &[Complex64], f: &mut [Complex64]) {
    let i = Complex64::i();
    let p1 = ctx.param(LAMBDA_1);
    let p2 = ctx.param(LAMBDA_2);
    let l1 = p1 * t;
    let l2 = p2 * t;

    let u01 = i * (i * ctx.storage(AIRY) - l2 * y[V]);
    let u02 = i * (3.0 * ctx.var(K) * i * (i * ctx.storage(DAIRY) - l2 * u01) - l1 * y[V]);

    f[V] = p1 * u01 + p2 * u02;
}

pub fn airy_derivative(
    ctx: &DerivativeContext<'_, Complex64>,
    t: f64,
    y: &[Complex64],
    f: &mut [Complex64],
) {
    let p1 = ctx.param(LAMBDA_1);
    let u11 = p1 * t / 3.0 * y[V];

    f[V] = p1 * y[V1];
    f[V1] = p1 * u11;
}

pub fn calculate(instance: &mut Instance, i: usize, j: usize) -> Result<()> {
    let k = instance.var(K);

    let inv_sqrt_3 = 1.0 / 3f64.sqrt();

    let equation = instance.equation_mut::<Complex64>()?;
    equation.set_num_equations(2)?;
    equation.set_function(airy_derivative);
    equation.set_initial(&[
        Complex64::new(inv_sqrt_3 * GAMMA_1_3, 0.0),
        Complex64::new(-inv_sqrt_3 * GAMMA_2_3, 0.0),
    ]);
    instance.integrate::<Complex64>(0.0, 1.0, STEP)?;

    let equation = instance.equation_mut::<Complex64>()?;
    let (airy, dairy) = (equation.result(V), equation.result(V1));
    equation.storage.set(AIRY, airy);
    equation.storage.set(DAIRY, dairy);

    equation.set_num_equations(1)?;
    equation.set_function(derivative);
    equation.set_initial(&[Complex64::new(PI * (1.0 - k / 3.0), 0.0)]);
    instance.integrate::<Complex64>(0.0, 1.0, STEP)?;

    let value = instance.equation_mut::<Complex64>()?.result(V);
    instance.set_point(i, j, complex_point(value));
    Ok(())
}

pub fn descriptor() -> ModelDescriptor {
    ModelDescriptor::complex(NAME, 2, derivative, calculate)
        .with_parameter_names(&LAMBDA_NAMES)
        .with_variable_names(&["k"])
}

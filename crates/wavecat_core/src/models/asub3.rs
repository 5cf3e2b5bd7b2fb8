//! Cusp catastrophe (A3) split into real and imaginary parts.
//!
//! The state holds `(Re V, Im V, Re V1, Im V1, Re V2, Im V2)` of the complex
//! formulation and is integrated with a ten times finer step.

use super::{GAMMA_1_4, GAMMA_3_4, LAMBDA_1, LAMBDA_2, LAMBDA_NAMES};
use crate::catastrophe::{Instance, ModelDescriptor};
use crate::equation::DerivativeContext;
use crate::error::Result;
use crate::grid::Point;
use std::f64::consts::PI;

/// Registered next to the complex `Asub3`, so the real formulation takes its
/// own name instead of shadowing it.
pub const NAME: &str = "Asub3_re";

const STEP: f64 = 0.001;

pub fn derivative(ctx: &DerivativeContext<'_, f64>, t: f64, y: &[f64], f: &mut [f64]) {
    let p1 = ctx.param(LAMBDA_1);
    let p2 = ctx.param(LAMBDA_2);
    let l1 = p1 * t;
    let l2 = p2 * t;

    let i21r = 0.25 * (l1 * y[0] + 2.0 * l2 * y[3]);
    let i21m = 0.25 * (l1 * y[1] - 2.0 * l2 * y[2]);
    let i22r = 0.25 * (y[1] + l1 * y[3] + 2.0 * l2 * y[5]);
    let i22m = 0.25 * (-y[0] - l1 * y[2] - 2.0 * l2 * y[4]);

    f[0] = p1 * y[2] + p2 * y[4];
    f[1] = p1 * y[3] + p2 * y[5];

    f[2] = -p1 * y[5] + p2 * i21r;
    f[3] = p1 * y[4] + p2 * i21m;

    f[4] = p1 * i21r + p2 * i22r;
    f[5] = p1 * i21m + p2 * i22m;
}

pub fn calculate(instance: &mut Instance, i: usize, j: usize) -> Result<()> {
    let (s8, c8) = (PI / 8.0).sin_cos();
    let (s38, c38) = (3.0 * PI / 8.0).sin_cos();

    instance.equation_mut::<f64>()?.set_initial(&[
        0.5 * GAMMA_1_4 * c8,
        0.5 * GAMMA_1_4 * s8,
        0.0,
        0.0,
        -0.5 * GAMMA_3_4 * s38,
        0.5 * GAMMA_3_4 * c38,
    ]);

    instance.integrate::<f64>(0.0, 1.0, STEP)?;

    let equation = instance.equation_mut::<f64>()?;
    let (re, im) = (equation.result(0), equation.result(1));
    let module = re.hypot(im);
    let phase = im.atan2(re).to_degrees();
    instance.set_point(i, j, Point::new(module, phase));
    Ok(())
}

/// Real A3 model. Phase is `atan2(Im V, Re V)` in degrees, the convention of
/// the complex models, so grids from `Asub3` and `Asub3_re` agree; grids
/// computed with `atan2(Re V, Im V)` differ by a reflection about 45 degrees.
pub fn descriptor() -> ModelDescriptor {
    ModelDescriptor::real(NAME, 6, derivative, calculate).with_parameter_names(&LAMBDA_NAMES)
}

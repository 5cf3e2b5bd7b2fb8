//! Cusp catastrophe (A3) as a three-component complex system.

use super::{complex_point, GAMMA_1_4, GAMMA_3_4, LAMBDA_1, LAMBDA_2, LAMBDA_NAMES};
use crate::catastrophe::{Instance, ModelDescriptor};
use crate::equation::DerivativeContext;
use crate::error::Result;
use num_complex::Complex64;
use std::f64::consts::PI;

pub const NAME: &str = "Asub3";

const V: usize = 0;
const V1: usize = 1;
const V2: usize = 2;

const STEP: f64 = 0.01;

pub fn derivative(ctx: &DerivativeContext<'_, Complex64>, t: f64, y: &[Complex64], f: &mut [Complex64]) {
    let i = Complex64::i();
    let p1 = ctx.param(LAMBDA_1);
    let p2 = ctx.param(LAMBDA_2);
    let l1 = p1 * t;
    let l2 = p2 * t;

    let i21 = 0.25 * (l1 * y[V] - 2.0 * i * l2 * y[V1]);
    let i22 = -0.25 * i * (y[V] + l1 * y[V1] + 2.0 * l2 * y[V2]);

    f[V] = p1 * y[V1] + p2 * y[V2];
    f[V1] = i * y[V2] * p1 + i21 * p2;
    f[V2] = p1 * i21 + p2 * i22;
}

pub fn calculate(instance: &mut Instance, i: usize, j: usize) -> Result<()> {
    let equation = instance.equation_mut::<Complex64>()?;
    equation.set_initial(&[
        0.5 * GAMMA_1_4 * Complex64::cis(PI / 8.0),
        Complex64::new(0.0, 0.0),
        0.5 * Complex64::i() * GAMMA_3_4 * Complex64::cis(3.0 * PI / 8.0),
    ]);

    instance.integrate::<Complex64>(0.0, 1.0, STEP)?;

    let value = instance.equation_mut::<Complex64>()?.result(V);
    instance.set_point(i, j, complex_point(value));
    Ok(())
}

pub fn descriptor() -> ModelDescriptor {
    ModelDescriptor::complex(NAME, 3, derivative, calculate).with_parameter_names(&LAMBDA_NAMES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catastrophe::Parameter;
    use crate::models::testing::{builtin_registry, fabricate};

    #[test]
    fn origin_reproduces_the_initial_value() {
        // With l1 = l2 = 0 every derivative vanishes.
        let registry = builtin_registry();
        let mut origin = registry
            .fabricate_by_name(
                NAME,
                &[Parameter::range("l1", 0.0, 1.0, 2), Parameter::range("l2", 0.0, 1.0, 2)],
                &[],
            )
            .expect("instance");
        calculate(&mut origin, 0, 0).expect("calculate");
        let point = origin.point(0, 0);
        assert!((point.module - 0.5 * GAMMA_1_4).abs() < 1e-12);
        assert!((point.phase - 22.5).abs() < 1e-9);
    }

    #[test]
    fn calculation_is_bit_reproducible() {
        let registry = builtin_registry();
        let mut first = fabricate(&registry, NAME, 4, 4);
        let mut second = fabricate(&registry, NAME, 4, 4);
        calculate(&mut first, 1, 2).expect("calculate");
        calculate(&mut second, 1, 2).expect("calculate");
        let (a, b) = (first.point(1, 2), second.point(1, 2));
        assert_eq!(a.module.to_bits(), b.module.to_bits());
        assert_eq!(a.phase.to_bits(), b.phase.to_bits());
    }
}

//! Built-in catastrophe models.
//!
//! Each model is a plain registration function; `register_builtin` installs
//! all of them in a fixed order so that name lookups are reproducible.

use crate::catastrophe::ModelDescriptor;
use crate::grid::Point;
use crate::registry::Registry;
use num_complex::Complex64;

pub mod asub3;
pub mod cmplx_asub3;
pub mod cmplx_bsub3;
pub mod cmplx_csub3;

/// Γ(1/4)
pub const GAMMA_1_4: f64 = 3.625609908;
/// Γ(3/4)
pub const GAMMA_3_4: f64 = 1.225416702;
/// Γ(1/3)
pub const GAMMA_1_3: f64 = 2.678938534;
/// Γ(2/3)
pub const GAMMA_2_3: f64 = 1.354117939;

/// Index of the first control parameter shared by every built-in model.
pub const LAMBDA_1: usize = 0;
/// Index of the second control parameter shared by every built-in model.
pub const LAMBDA_2: usize = 1;

pub(crate) const LAMBDA_NAMES: [&str; 2] = ["l1", "l2"];

/// Descriptors of every built-in model, in registration order.
pub fn builtin_descriptors() -> Vec<ModelDescriptor> {
    vec![
        cmplx_asub3::descriptor(),
        cmplx_bsub3::descriptor(),
        cmplx_csub3::descriptor(),
        asub3::descriptor(),
    ]
}

pub fn register_builtin(registry: &mut Registry) {
    for descriptor in builtin_descriptors() {
        registry.register(descriptor);
    }
}

/// Module and phase (in degrees) of a complex integral value.
pub(crate) fn complex_point(value: Complex64) -> Point {
    Point::new(value.norm(), value.arg().to_degrees())
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::config::SweepSettings;

    #[test]
    fn builtin_models_register_in_fixed_order() {
        let registry = builtin_registry();
        assert_eq!(registry.names(), vec!["Asub3", "Bsub3", "Csub3", "Asub3_re"]);
    }

    #[test]
    fn every_builtin_model_matches_between_sweep_modes() {
        let registry = builtin_registry();
        for name in ["Asub3", "Bsub3", "Csub3", "Asub3_re"] {
            let uncached = SweepSettings {
                use_cache: false,
                ..SweepSettings::sequential()
            };
            let expected = swept(&registry, name, uncached);
            for workers in [1, 2, 4, 8] {
                let grid = swept(&registry, name, SweepSettings::parallel(workers));
                assert_grids_close(&grid, &expected);
            }
            let cached = swept(&registry, name, SweepSettings::sequential());
            assert_grids_close(&cached, &expected);
        }
    }

    #[test]
    fn every_builtin_model_yields_finite_points() {
        let registry = builtin_registry();
        for name in registry.names() {
            let grid = swept(&registry, name, SweepSettings::sequential());
            for row in grid.rows() {
                for point in row {
                    assert!(point.module.is_finite() && point.module > 0.0, "{name}: {point:?}");
                    assert!((-180.0..=180.0).contains(&point.phase), "{name}: {point:?}");
                }
            }
        }
    }

    #[test]
    fn complex_point_reports_degrees() {
        let point = complex_point(Complex64::new(0.0, 2.0));
        assert_eq!(point.module, 2.0);
        assert!((point.phase - 90.0).abs() < 1e-12);
    }
}

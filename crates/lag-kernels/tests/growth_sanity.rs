use lag_kernels::growth::{Cosmology, GrowthSolver};

fn lcdm() -> GrowthSolver {
    GrowthSolver::new(Cosmology {
        omega_m: 0.31,
        omega_lambda: None,
        h: 0.68,
    })
    .unwrap()
}

#[test]
fn growth_factor_is_normalized_today() {
    let solver = lcdm();
    assert!((solver.growth_factor(0.0) - 1.0).abs() < 1e-9);
}

#[test]
fn growth_factor_decreases_with_redshift() {
    let solver = lcdm();
    let mut previous = solver.growth_factor(0.0);
    for z in [0.5, 1.0, 2.0, 5.0, 20.0] {
        let d = solver.growth_factor(z);
        assert!(d < previous, "D({z}) = {d} should be below {previous}");
        assert!(d > 0.0);
        previous = d;
    }
}

#[test]
fn matter_dominated_growth_scales_with_expansion() {
    // In an Einstein-de Sitter background D(a) ∝ a, so D(z) = 1/(1+z) and
    // f = 1 at any redshift.
    let solver = GrowthSolver::new(Cosmology {
        omega_m: 1.0,
        omega_lambda: Some(0.0),
        h: 0.7,
    })
    .unwrap();
    assert!((solver.growth_factor(1.0) - 0.5).abs() < 1e-3);
    assert!((solver.growth_factor(3.0) - 0.25).abs() < 1e-3);
    assert!((solver.growth_rate(0.5) - 1.0).abs() < 1e-2);
}

#[test]
fn lcdm_growth_rate_is_below_unity_today() {
    let solver = lcdm();
    let f0 = solver.growth_rate(0.0);
    assert!(f0 > 0.4 && f0 < 0.7, "f(0) = {f0} out of LCDM range");
    let f_high = solver.growth_rate(5.0);
    assert!(f_high > 0.9, "growth rate should approach 1 at high redshift");
}

#[test]
fn spectrum_rescaling_uses_the_squared_growth_ratio() {
    let solver = lcdm();
    let power = vec![10.0, 20.0, 30.0];
    let rescaled = solver.rescale_spectrum(&power, 99.0, 0.0);
    let ratio = solver.growth_factor(0.0) / solver.growth_factor(99.0);
    for (orig, out) in power.iter().zip(&rescaled) {
        assert!((out / orig - ratio * ratio).abs() < 1e-9);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let err = GrowthSolver::new(Cosmology {
        omega_m: -0.1,
        omega_lambda: None,
        h: 0.7,
    })
    .unwrap_err();
    assert_eq!(err.info().code, "omega-m");
}

//! Background cosmology and linear growth collaborator.
//!
//! The pipeline only consumes this module through its narrow interface:
//! scale-independent `D(z)` and `f(z)` for a parameter set, plus rescaling a
//! tabulated linear power spectrum between redshifts. `D` comes from the
//! standard matter-era growth integral
//! `D(a) ∝ E(a) ∫ da' / (a' E(a'))³` normalized to `D(a=1) = 1`, and
//! `f = dlnD / dlna` from a central difference.

use lag_core::errors::{ErrorInfo, LagError};
use serde::{Deserialize, Serialize};

fn default_omega_m() -> f64 {
    0.31
}

fn default_h() -> f64 {
    0.68
}

/// Background cosmological parameters consumed by the growth solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    /// Total matter density parameter today.
    #[serde(default = "default_omega_m")]
    pub omega_m: f64,
    /// Dark-energy density parameter today (flat universe when omitted).
    #[serde(default)]
    pub omega_lambda: Option<f64>,
    /// Dimensionless Hubble parameter.
    #[serde(default = "default_h")]
    pub h: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            omega_m: default_omega_m(),
            omega_lambda: None,
            h: default_h(),
        }
    }
}

impl Cosmology {
    fn omega_lambda(&self) -> f64 {
        self.omega_lambda.unwrap_or(1.0 - self.omega_m)
    }
}

/// Scale-independent linear growth solver.
#[derive(Debug, Clone)]
pub struct GrowthSolver {
    cosmo: Cosmology,
}

const INTEGRATION_STEPS: usize = 4096;
const A_FLOOR: f64 = 1.0e-6;

impl GrowthSolver {
    /// Builds a solver for the given parameter set.
    pub fn new(cosmo: Cosmology) -> Result<Self, LagError> {
        if cosmo.omega_m <= 0.0 {
            return Err(LagError::Growth(
                ErrorInfo::new("omega-m", "omega_m must be positive")
                    .with_context("omega_m", cosmo.omega_m.to_string()),
            ));
        }
        if cosmo.h <= 0.0 {
            return Err(LagError::Growth(
                ErrorInfo::new("hubble", "h must be positive")
                    .with_context("h", cosmo.h.to_string()),
            ));
        }
        Ok(Self { cosmo })
    }

    /// Dimensionless Hubble rate `E(a) = H(a)/H0`.
    fn e_of_a(&self, a: f64) -> f64 {
        let om = self.cosmo.omega_m;
        let ol = self.cosmo.omega_lambda();
        let ok = 1.0 - om - ol;
        (om / (a * a * a) + ok / (a * a) + ol).sqrt()
    }

    /// Unnormalized growth integral, trapezoid rule on a log-spaced grid.
    fn growth_unnormalized(&self, a: f64) -> f64 {
        let log_lo = A_FLOOR.ln();
        let log_hi = a.ln();
        let step = (log_hi - log_lo) / INTEGRATION_STEPS as f64;
        let integrand = |log_a: f64| {
            let ai = log_a.exp();
            let denom = ai * self.e_of_a(ai);
            // d a' = a' d(ln a'), so the log-space integrand gains one power.
            ai / (denom * denom * denom)
        };
        let mut sum = 0.5 * (integrand(log_lo) + integrand(log_hi));
        for i in 1..INTEGRATION_STEPS {
            sum += integrand(log_lo + i as f64 * step);
        }
        self.e_of_a(a) * sum * step
    }

    /// Linear growth factor `D(z)`, normalized so `D(0) = 1`.
    pub fn growth_factor(&self, z: f64) -> f64 {
        let a = 1.0 / (1.0 + z);
        self.growth_unnormalized(a) / self.growth_unnormalized(1.0)
    }

    /// Linear growth rate `f(z) = dlnD/dlna`.
    pub fn growth_rate(&self, z: f64) -> f64 {
        let a = 1.0 / (1.0 + z);
        let eps = 1.0e-4;
        let hi = self.growth_unnormalized(a * (1.0 + eps)).ln();
        let lo = self.growth_unnormalized(a * (1.0 - eps)).ln();
        (hi - lo) / ((1.0 + eps).ln() - (1.0 - eps).ln())
    }

    /// Rescales a tabulated power spectrum from `z_from` to `z_to` by the
    /// squared growth ratio (the scale-independent fallback when no target
    /// spectrum is tabulated).
    pub fn rescale_spectrum(&self, power: &[f64], z_from: f64, z_to: f64) -> Vec<f64> {
        let ratio = self.growth_factor(z_to) / self.growth_factor(z_from);
        let ratio_sq = ratio * ratio;
        power.iter().map(|p| p * ratio_sq).collect()
    }
}

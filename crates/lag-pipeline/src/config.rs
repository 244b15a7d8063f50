use std::path::PathBuf;

use lag_core::errors::{ErrorInfo, LagError};
use lag_kernels::growth::Cosmology;
use serde::{Deserialize, Serialize};

/// Source format of the initial-conditions fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IcFormat {
    /// A lag-store container holding `delta` (and `dx`/`dy`/`dz` for the
    /// surrogate branch); `icdir` is the container file itself.
    #[default]
    Container,
    /// A directory with one raw little-endian `f32` file per field
    /// (`linear_density.f32`), row-major over the full mesh.
    Raw,
}

/// YAML-configurable parameters governing a field-derivation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Mesh resolution of the input density field (fields are derived at
    /// this resolution).
    pub nmesh_in: usize,
    /// Mesh resolution used by downstream advection/painting consumers.
    #[serde(default)]
    pub nmesh_out: Option<usize>,
    /// Comoving box side length.
    pub lbox: f64,
    /// Redshift of the initial conditions.
    #[serde(default = "default_z_ic")]
    pub z_ic: f64,
    /// Target redshift for growth rescaling, when applicable.
    #[serde(default)]
    pub z_target: Option<f64>,
    /// Redshift-space-distortion flag carried for downstream consumers.
    #[serde(default)]
    pub rsd: bool,
    /// Whether to derive the reduced-variance smoothed surrogate fields.
    #[serde(default)]
    pub compute_cv_surrogate: bool,
    /// Explicit Gaussian cutoff for the surrogate branch; `~` selects the
    /// default `π·nmesh/Lbox`.
    #[serde(default)]
    pub surrogate_gaussian_cutoff: Option<f64>,
    /// Whether growth between `z_ic` and `z_target` is scale-dependent.
    #[serde(default)]
    pub scale_dependent_growth: bool,
    /// Two-column (wavenumber, power) table of the linear IC spectrum.
    #[serde(default)]
    pub p_lin_ic_file: Option<PathBuf>,
    /// Optional tabulated target spectrum on the same wavenumber grid; when
    /// absent the growth solver rescales the IC spectrum.
    #[serde(default)]
    pub p_lin_target_file: Option<PathBuf>,
    /// Background cosmology consumed by the growth solver.
    #[serde(default)]
    pub cosmology: Cosmology,
    /// Initial-conditions source format.
    #[serde(default)]
    pub ic_format: IcFormat,
    /// Initial-conditions location (file or directory, per `ic_format`).
    pub icdir: PathBuf,
    /// Output directory for containers, flattened fields, and manifests.
    #[serde(default)]
    pub outdir: Option<PathBuf>,
    /// Flatten the container into per-field array files after the run.
    #[serde(default)]
    pub flatten_outputs: bool,
}

fn default_z_ic() -> f64 {
    99.0
}

impl RunConfig {
    /// Parses a YAML configuration document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, LagError> {
        serde_yaml::from_str(contents).map_err(|err| {
            LagError::Config(
                ErrorInfo::new("config-parse", err.to_string())
                    .with_hint("see configs/fields.yaml for the expected keys"),
            )
        })
    }

    /// Checks cross-field consistency before a run starts.
    pub fn validate(&self) -> Result<(), LagError> {
        if self.nmesh_in == 0 {
            return Err(config_error("nmesh-in", "nmesh_in must be positive"));
        }
        if self.lbox <= 0.0 {
            return Err(config_error("lbox", "lbox must be positive"));
        }
        if let Some(kcut) = self.surrogate_gaussian_cutoff {
            if kcut <= 0.0 {
                return Err(config_error(
                    "gaussian-cutoff",
                    "surrogate_gaussian_cutoff must be positive when given",
                ));
            }
        }
        if self.scale_dependent_growth {
            if self.p_lin_ic_file.is_none() {
                return Err(config_error(
                    "p-lin-ic",
                    "scale_dependent_growth requires p_lin_ic_file",
                ));
            }
            if self.z_target.is_none() && self.p_lin_target_file.is_none() {
                return Err(config_error(
                    "z-target",
                    "scale_dependent_growth requires z_target or p_lin_target_file",
                ));
            }
        }
        if self.compute_cv_surrogate && self.ic_format == IcFormat::Raw {
            return Err(config_error(
                "surrogate-ics",
                "the surrogate branch needs displacement datasets, which only container ICs carry",
            ));
        }
        Ok(())
    }

    /// Mesh resolution consumed by downstream painting.
    pub fn nmesh_out(&self) -> usize {
        self.nmesh_out.unwrap_or(self.nmesh_in)
    }

    /// Basename of the persisted container, switching to the `_filt`
    /// variant in the surrogate branch.
    pub fn basename(&self) -> String {
        if self.compute_cv_surrogate {
            format!("lag_fields_filt_{}", self.nmesh_in)
        } else {
            format!("lag_fields_{}", self.nmesh_in)
        }
    }

    /// Resolved output directory (falls back to the current directory).
    pub fn outdir(&self) -> PathBuf {
        self.outdir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path of the shared field container for this run.
    pub fn container_path(&self) -> PathBuf {
        self.outdir().join(format!("{}.lagc", self.basename()))
    }
}

fn config_error(code: &str, message: &str) -> LagError {
    LagError::Config(ErrorInfo::new(code, message))
}

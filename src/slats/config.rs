//! Run parameters for the slat pipeline.

use crate::errors::{Result, SlatError};
use crate::float_types::{MM, Real};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User-facing parameters, lengths in the units their names carry.
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlatConfig {
    /// Slices along Y.
    pub slices_y: usize,
    /// Slices along X; derived from the aspect ratio when absent.
    pub slices_x: Option<usize>,
    pub material_thickness_mm: Real,
    /// Joint tolerance, also the minimum in-plane overlap of a real contact.
    pub clearance_mm: Real,
    /// Safety margin subtracted from the joint depth.
    pub slot_margin_mm: Real,
    /// Largest model extent after normalization.
    pub target_size_m: Real,
    /// Shift along X applied after scaling.
    pub offset_x_m: Real,
    /// Run the voxel re-tessellation pass while finishing.
    pub remesh: bool,
    /// Radius of the built-in test sphere.
    pub sphere_radius_m: Real,
}

impl Default for SlatConfig {
    fn default() -> Self {
        SlatConfig {
            slices_y: 10,
            slices_x: None,
            material_thickness_mm: 3.0,
            clearance_mm: 0.05,
            slot_margin_mm: 0.05,
            target_size_m: 0.2,
            offset_x_m: 0.0,
            remesh: true,
            sphere_radius_m: 0.1,
        }
    }
}

impl SlatConfig {
    /// Load a TOML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SlatError::io(path, e))?;
        toml::from_str(&content).map_err(|e| {
            SlatError::Configuration(format!("cannot parse {}: {e}", path.display()))
        })
    }

    /// Material thickness in metres.
    pub fn thickness(&self) -> Real {
        self.material_thickness_mm * MM
    }

    /// Clearance in metres.
    pub fn clearance(&self) -> Real {
        self.clearance_mm * MM
    }

    /// Slot margin in metres.
    pub fn slot_margin(&self) -> Real {
        self.slot_margin_mm * MM
    }

    /// Voxel edge used by the re-tessellation pass.
    pub fn voxel_size(&self) -> Real {
        self.thickness() / 8.0
    }

    /// Reject parameter sets the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SlatError::Configuration(msg));

        if self.slices_y == 0 {
            return fail("slices_y must be at least 1".into());
        }
        if self.slices_x == Some(0) {
            return fail("slices_x must be at least 1 when given".into());
        }
        if !(self.material_thickness_mm.is_finite() && self.material_thickness_mm > 0.0) {
            return fail(format!(
                "material thickness must be positive, got {} mm",
                self.material_thickness_mm
            ));
        }
        if !(self.target_size_m.is_finite() && self.target_size_m > 0.0) {
            return fail(format!("target size must be positive, got {} m", self.target_size_m));
        }
        if !(self.clearance_mm.is_finite() && self.clearance_mm >= 0.0) {
            return fail(format!("clearance cannot be negative, got {} mm", self.clearance_mm));
        }
        if !(self.slot_margin_mm.is_finite() && self.slot_margin_mm >= 0.0) {
            return fail(format!(
                "slot margin cannot be negative, got {} mm",
                self.slot_margin_mm
            ));
        }
        if self.clearance_mm >= self.material_thickness_mm / 2.0 {
            return fail(format!(
                "clearance {} mm leaves no joint depth in {} mm material",
                self.clearance_mm, self.material_thickness_mm
            ));
        }
        if !self.offset_x_m.is_finite() {
            return fail("offset_x must be finite".into());
        }
        if !(self.sphere_radius_m.is_finite() && self.sphere_radius_m > 0.0) {
            return fail(format!("sphere radius must be positive, got {} m", self.sphere_radius_m));
        }
        Ok(())
    }
}

/// Where the input mesh comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMode {
    /// A mesh file on disk.
    File(PathBuf),
    /// A generated UV sphere of `sphere_radius_m`.
    TestSphere,
}

impl SourceMode {
    /// Pick the mode from the command line: exactly one must be requested.
    pub fn select(input: Option<PathBuf>, test_sphere: bool) -> Result<Self> {
        match (input, test_sphere) {
            (Some(path), false) => Ok(SourceMode::File(path)),
            (None, true) => Ok(SourceMode::TestSphere),
            (None, false) => Err(SlatError::Configuration(
                "no input: pass a mesh file or --test-sphere".into(),
            )),
            (Some(_), true) => Err(SlatError::Configuration(
                "a mesh file and --test-sphere are mutually exclusive".into(),
            )),
        }
    }

    /// Base name used for the assembly and output file.
    pub fn base_name(&self) -> String {
        match self {
            SourceMode::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string()),
            SourceMode::TestSphere => "TestSphere".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = SlatConfig::default();
        config.validate().expect("defaults");
        assert_relative_eq!(config.thickness(), 0.003);
        assert_relative_eq!(config.voxel_size(), 0.000375);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SlatConfig = toml::from_str("slices_y = 6\nremesh = false\n").expect("toml");
        assert_eq!(config.slices_y, 6);
        assert!(!config.remesh);
        assert_relative_eq!(config.material_thickness_mm, 3.0);
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        let cases = [
            SlatConfig { slices_y: 0, ..Default::default() },
            SlatConfig { slices_x: Some(0), ..Default::default() },
            SlatConfig { material_thickness_mm: 0.0, ..Default::default() },
            SlatConfig { target_size_m: -1.0, ..Default::default() },
            SlatConfig { clearance_mm: -0.1, ..Default::default() },
            SlatConfig { slot_margin_mm: -0.1, ..Default::default() },
            SlatConfig { clearance_mm: 1.5, ..Default::default() },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(SlatError::Configuration(_))), "{config:?}");
        }
    }

    #[test]
    fn mode_selection() {
        assert_eq!(SourceMode::select(None, true).expect("sphere"), SourceMode::TestSphere);
        assert!(SourceMode::select(None, false).is_err());
        assert!(SourceMode::select(Some("a.obj".into()), true).is_err());
        let mode = SourceMode::select(Some("dir/Bunny.obj".into()), false).expect("file");
        assert_eq!(mode.base_name(), "Bunny");
    }
}

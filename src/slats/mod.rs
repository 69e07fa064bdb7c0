//! The slat pipeline: from a closed mesh to a set of interlocking flat slats.
//!
//! Stages run strictly in order, each consuming only what the previous one
//! produced:
//!
//! normalize → slice X → slice Y → trim Y → trim X → cut joints → filter → finish
//!
//! Failures of a single boolean are logged and recorded in the
//! [`PipelineReport`]; only whole-run preconditions (configuration, input
//! file, degenerate model, nothing left to export) abort with an error.

pub mod config;
pub mod extrude;
pub mod filter;
pub mod finish;
pub mod joints;
pub mod normalize;
pub mod overlap;
pub mod piece;
pub mod slicer;
pub mod trim;

pub use config::{SlatConfig, SourceMode};
pub use finish::Assembly;
pub use joints::{JointParams, JointRecord};
pub use piece::{Axis, Piece, PieceId};

use crate::errors::{Result, SlatError};
use crate::io::{self, MeshFormat};
use crate::kernel::{BspKernel, GeometryKernel, SlatMesh};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Segments and stacks of the built-in test sphere.
const SPHERE_SEGMENTS: usize = 32;
const SPHERE_STACKS: usize = 16;

/// Recovered failures collected over a run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn record(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Piece counts after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub extruded_x: usize,
    pub extruded_y: usize,
    pub trimmed: usize,
    pub jointed: usize,
    pub filtered: usize,
    pub finished: usize,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub slices_x: usize,
    pub slices_y: usize,
    pub counts: StageCounts,
    pub joints: Vec<JointRecord>,
    pub warnings: Vec<String>,
    pub output_path: Option<PathBuf>,
    pub vertex_count: usize,
    pub face_count: usize,
}

impl PipelineReport {
    pub fn complete_joints(&self) -> usize {
        self.joints.iter().filter(|j| j.is_complete()).count()
    }
}

/// Result of processing one model.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub assembly: Assembly,
    /// The finished pieces, before merging and rotation.
    pub pieces: Vec<Piece>,
    pub report: PipelineReport,
}

/// Where and how to write the assembly.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Defaults to the input file's directory, or the working directory.
    pub output_dir: Option<PathBuf>,
    /// Defaults to the input file's format, or OBJ.
    pub format: Option<MeshFormat>,
}

/// Runs the stages on a [`GeometryKernel`].
#[derive(Debug, Clone)]
pub struct SlatPipeline<K: GeometryKernel = BspKernel> {
    kernel: K,
    config: SlatConfig,
}

impl SlatPipeline<BspKernel> {
    /// Pipeline on the default BSP kernel. Fails on an invalid configuration.
    pub fn new(config: SlatConfig) -> Result<Self> {
        Self::with_kernel(BspKernel::default(), config)
    }
}

impl<K: GeometryKernel> SlatPipeline<K> {
    pub fn with_kernel(kernel: K, config: SlatConfig) -> Result<Self> {
        config.validate()?;
        Ok(SlatPipeline { kernel, config })
    }

    pub const fn config(&self) -> &SlatConfig {
        &self.config
    }

    pub const fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Load (or generate) the input model.
    pub fn load_source(&self, mode: &SourceMode) -> Result<SlatMesh> {
        match mode {
            SourceMode::File(path) => io::import_mesh(path),
            SourceMode::TestSphere => Ok(SlatMesh::sphere(
                self.config.sphere_radius_m,
                SPHERE_SEGMENTS,
                SPHERE_STACKS,
                None,
            )),
        }
    }

    /// Load the source, process it and write `<base>_Joined.<ext>`.
    ///
    /// The output format is checked before any geometry work starts.
    #[instrument(skip(self), fields(base = %mode.base_name()))]
    pub fn run(&self, mode: &SourceMode, output: &OutputOptions) -> Result<PipelineOutput> {
        let base = mode.base_name();
        let path = output_path(mode, output, &base)?;

        let source = self.load_source(mode)?;
        let mut result = self.process_mesh(&source, &base)?;

        io::export_mesh(&result.assembly.mesh, &result.assembly.name, &path)?;
        info!(path = %path.display(), "assembly written");
        result.report.output_path = Some(path);
        Ok(result)
    }

    /// Run every stage on `source` without touching the filesystem.
    #[instrument(skip(self, source), fields(polygons = source.polygons.len()))]
    pub fn process_mesh(&self, source: &SlatMesh, base_name: &str) -> Result<PipelineOutput> {
        let config = &self.config;
        let thickness = config.thickness();
        let clearance = config.clearance();
        let mut diagnostics = Diagnostics::default();
        let mut report = PipelineReport::default();

        let model = normalize::normalize(source, config.target_size_m, config.offset_x_m)?;

        report.slices_y = config.slices_y;
        report.slices_x = config
            .slices_x
            .unwrap_or_else(|| slicer::derive_slices_x(config.slices_y, &model.extents));
        info!(slices_x = report.slices_x, slices_y = report.slices_y, "slice counts");

        let x_slices = slicer::slice_axis(
            &self.kernel,
            &model.mesh,
            Axis::X,
            report.slices_x,
            thickness,
            &mut diagnostics,
        );
        let x_pieces = extrude::extrude_slices(&self.kernel, &x_slices, thickness, &mut diagnostics);
        drop(x_slices);

        let y_slices = slicer::slice_axis(
            &self.kernel,
            &model.mesh,
            Axis::Y,
            report.slices_y,
            thickness,
            &mut diagnostics,
        );
        let y_pieces = extrude::extrude_slices(&self.kernel, &y_slices, thickness, &mut diagnostics);
        drop(y_slices);
        report.counts.extruded_x = x_pieces.len();
        report.counts.extruded_y = y_pieces.len();

        let (mut x_pieces, mut y_pieces) = trim::trim_pieces(
            &self.kernel,
            x_pieces,
            y_pieces,
            thickness,
            clearance,
            &mut diagnostics,
        );
        report.counts.trimmed = x_pieces.len() + y_pieces.len();

        let params = JointParams {
            thickness,
            clearance,
            slot_margin: config.slot_margin(),
        };
        report.joints = joints::cut_joints(
            &self.kernel,
            &mut x_pieces,
            &mut y_pieces,
            &params,
            &mut diagnostics,
        );
        let mut pieces = x_pieces;
        pieces.append(&mut y_pieces);
        report.counts.jointed = pieces.len();

        let pieces = filter::remove_floating(pieces, thickness, clearance);
        report.counts.filtered = pieces.len();
        if pieces.is_empty() {
            return Err(SlatError::EmptyResult(format!(
                "no connected pieces of {base_name} remain after filtering"
            )));
        }

        let voxel = config.remesh.then(|| config.voxel_size());
        let pieces = finish::finish_pieces(&self.kernel, pieces, voxel, &mut diagnostics);
        report.counts.finished = pieces.len();

        let assembly = finish::assemble(&pieces, base_name)?;
        report.vertex_count = assembly.vertex_count;
        report.face_count = assembly.face_count;
        report.warnings = diagnostics.warnings;

        info!(
            pieces = pieces.len(),
            joints = report.joints.len(),
            complete_joints = report.complete_joints(),
            warnings = report.warnings.len(),
            "pipeline finished"
        );
        Ok(PipelineOutput {
            assembly,
            pieces,
            report,
        })
    }
}

/// `<dir>/<base>_Joined.<ext>` for a run, rejecting formats this build
/// cannot write.
pub fn output_path(mode: &SourceMode, options: &OutputOptions, base: &str) -> Result<PathBuf> {
    let input = match mode {
        SourceMode::File(path) => Some(path.as_path()),
        SourceMode::TestSphere => None,
    };

    let format = match (options.format, input) {
        (Some(format), _) => format,
        (None, Some(path)) => MeshFormat::for_path(path)?,
        (None, None) => MeshFormat::Obj,
    };
    if !format.is_available() {
        return Err(SlatError::Configuration(format!(
            "no export support for .{}",
            format.extension()
        )));
    }

    let dir = options
        .output_dir
        .clone()
        .or_else(|| input.and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_default();
    Ok(dir.join(format!("{base}_Joined.{}", format.extension())))
}

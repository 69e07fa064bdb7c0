//! Turns a closed 3D mesh into a set of flat, interlocking slats: a
//! slot-together cross-lamination sized for a target dimension and cut from
//! material of fixed thickness.
//!
//! The model is normalized, sliced along X and Y with boolean intersections
//! against thin slabs, and every cross-section is extruded into a slat.
//! Slats are trimmed to where perpendicular slats hold them, notched with
//! half-depth lap joints at every real crossing, filtered for floating
//! pieces, cleaned up and merged into one exportable assembly.
//!
//! Geometry runs on polygon soups with [BSP](mesh::bsp) tree booleans, behind
//! the [`GeometryKernel`](kernel::GeometryKernel) capability trait.
//!
//! # Features
//! #### Default
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//! - **cli**: the `slatcut` command-line binary
//!
//! #### Optional
//! - **parallel**: sample voxel fields on rayon's thread pool

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod io;
pub mod kernel;
pub mod mesh;
pub mod slats;
pub mod traits;

pub use errors::{Result, SlatError};
pub use kernel::{BspKernel, GeometryKernel, SlatMesh};
pub use slats::{OutputOptions, PipelineOutput, PipelineReport, SlatConfig, SlatPipeline, SourceMode};
pub use traits::CSGOps;

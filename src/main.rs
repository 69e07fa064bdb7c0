//! slatcut command line

use anyhow::{Context, Result, bail};
use clap::Parser;
use slatcut::io::MeshFormat;
use slatcut::{OutputOptions, SlatConfig, SlatPipeline, SourceMode};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slatcut")]
#[command(about = "Cut a closed mesh into interlocking flat slats", long_about = None)]
struct Cli {
    /// Input mesh (.obj, or .stl with the stl-io feature)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Process a generated UV sphere instead of a file
    #[arg(long)]
    test_sphere: bool,

    /// TOML file with run parameters; flags below override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of slices along Y
    #[arg(long)]
    slices_y: Option<usize>,

    /// Number of slices along X (derived from the aspect ratio by default)
    #[arg(long)]
    slices_x: Option<usize>,

    /// Material thickness in millimetres
    #[arg(long)]
    thickness_mm: Option<f64>,

    /// Joint clearance in millimetres
    #[arg(long)]
    clearance_mm: Option<f64>,

    /// Slot depth safety margin in millimetres
    #[arg(long)]
    slot_margin_mm: Option<f64>,

    /// Largest model extent after normalization, in metres
    #[arg(long)]
    target_size: Option<f64>,

    /// Shift along X after scaling, in metres
    #[arg(long)]
    offset_x: Option<f64>,

    /// Skip voxel re-tessellation of the finished slats
    #[arg(long)]
    no_remesh: bool,

    /// Directory for the output file
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format (obj, stl); defaults to the input's format
    #[arg(short, long)]
    format: Option<String>,

    /// Write the log to a file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<SlatConfig> {
        let mut config = match &self.config {
            Some(path) => SlatConfig::from_file(path)?,
            None => SlatConfig::default(),
        };

        if let Some(n) = self.slices_y {
            config.slices_y = n;
        }
        if self.slices_x.is_some() {
            config.slices_x = self.slices_x;
        }
        if let Some(t) = self.thickness_mm {
            config.material_thickness_mm = t;
        }
        if let Some(c) = self.clearance_mm {
            config.clearance_mm = c;
        }
        if let Some(m) = self.slot_margin_mm {
            config.slot_margin_mm = m;
        }
        if let Some(size) = self.target_size {
            config.target_size_m = size;
        }
        if let Some(offset) = self.offset_x {
            config.offset_x_m = offset;
        }
        if self.no_remesh {
            config.remesh = false;
        }
        Ok(config)
    }

    fn output(&self) -> Result<OutputOptions> {
        let format = match self.format.as_deref() {
            Some(name) => match MeshFormat::from_extension(name) {
                Some(format) => Some(format),
                None => bail!("unknown output format `{name}` (expected obj or stl)"),
            },
            None => None,
        };
        Ok(OutputOptions {
            output_dir: self.output_dir.clone(),
            format,
        })
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        },
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mode = SourceMode::select(cli.input.clone(), cli.test_sphere)?;
    let pipeline = SlatPipeline::new(cli.config()?)?;
    let output = pipeline.run(&mode, &cli.output()?)?;

    let report = &output.report;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if let Some(path) = &report.output_path {
        println!("{}", path.display());
    }
    eprintln!(
        "{} slats ({} x {} slices), {}/{} joints complete, {} vertices, {} faces",
        report.counts.finished,
        report.slices_x,
        report.slices_y,
        report.complete_joints(),
        report.joints.len(),
        report.vertex_count,
        report.face_count,
    );
    Ok(())
}

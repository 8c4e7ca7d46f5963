//! Launch parameter parsing for the viewer.
//!
//! Parameters are parsed from command-line arguments using clap. Anything set
//! here overrides the configuration file.

use std::path::PathBuf;

use clap::Parser;

/// Default number of simulated frames.
const DEFAULT_FRAMES: u32 = 240;
/// Default vertical field of view in degrees.
const DEFAULT_FOV: f64 = 60.0;
/// Default viewport height in pixels.
const DEFAULT_VIEWPORT_HEIGHT: f64 = 1080.0;

/// Launch parameters for the viewer.
#[derive(Debug, Clone)]
pub struct LaunchParams {
    /// RON file holding a [`crate::settings::Settings`].
    pub config: Option<PathBuf>,
    /// Number of frames to simulate.
    pub frames: u32,
    /// Vertical field of view in degrees.
    pub fov: f64,
    /// Viewport height in pixels.
    pub viewport_height: f64,
    /// Flight altitude override, in world units.
    pub altitude: Option<f64>,
    /// Subdivision threshold override, in pixels.
    pub threshold: Option<f64>,
    /// Deepest level override.
    pub max_level: Option<u32>,
    /// Disable seam stitching.
    pub no_stitching: bool,
    /// Run without an elevation source; tiles stay flat.
    pub flat: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            config: None,
            frames: DEFAULT_FRAMES,
            fov: DEFAULT_FOV,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            altitude: None,
            threshold: None,
            max_level: None,
            no_stitching: false,
            flat: false,
        }
    }
}

#[derive(Parser)]
#[command(about = "Fly over a procedural terrain and log LOD statistics")]
struct CliArgs {
    /// Settings file (RON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: u32,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = DEFAULT_FOV)]
    fov: f64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT)]
    viewport_height: f64,

    /// Flight altitude above the terrain origin.
    #[arg(long)]
    altitude: Option<f64>,

    /// Screen-space error threshold in pixels.
    #[arg(long)]
    threshold: Option<f64>,

    /// Deepest tile level.
    #[arg(long)]
    max_level: Option<u32>,

    /// Disable seam stitching.
    #[arg(long)]
    no_stitching: bool,

    /// Run without elevation data.
    #[arg(long)]
    flat: bool,
}

impl From<CliArgs> for LaunchParams {
    fn from(args: CliArgs) -> Self {
        Self {
            config: args.config,
            frames: args.frames,
            fov: args.fov,
            viewport_height: args.viewport_height,
            altitude: args.altitude,
            threshold: args.threshold,
            max_level: args.max_level,
            no_stitching: args.no_stitching,
            flat: args.flat,
        }
    }
}

/// Parse launch parameters from CLI args.
pub fn parse() -> LaunchParams {
    CliArgs::parse().into()
}

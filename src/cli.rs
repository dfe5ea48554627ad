//! Command-line options shared by the `framecast` and `preview` binaries.

use clap::Args;
use std::path::PathBuf;

use crate::{imaging::Detail, logging::LoggingConfig, settings::RenderSettings};

/// Scene, extraction and logging options.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Wall preset (wall01 … wall21)
    #[arg(long, default_value = "wall06")]
    pub preset: String,

    /// Directory holding `<preset>.png` wall textures
    #[arg(long, value_name = "DIR", default_value = "./walls")]
    pub wall_dir: PathBuf,

    /// Raster precision multiplier (>= 1)
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f32,

    /// Sphere radius in source pixels
    #[arg(long, default_value_t = 4.0)]
    pub radius: f32,

    /// Honeycomb lattice spacing in source pixels
    #[arg(long, default_value_t = 5.0)]
    pub coarse: f32,

    /// Close-up of each source: `SCALE,X0,Y0` (e.g. `2,0.1,0.1`)
    #[arg(long, value_name = "SCALE,X0,Y0", value_parser = parse_detail)]
    pub detail: Option<Detail>,

    /// Seed for the frame-bevel jitter
    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,

    /// Log filter in `env_logger` syntax (overrides RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Source photographs, rendered in the given order
    #[arg(value_name = "IMAGE")]
    pub sources: Vec<PathBuf>,
}

impl RenderArgs {
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            radius: self.radius,
            coarse: self.coarse,
            zoom: self.zoom,
            detail: self.detail,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..Default::default()
        }
    }

    pub fn wall_path(&self) -> PathBuf {
        self.wall_dir.join(format!("{}.png", self.preset))
    }
}

fn parse_detail(s: &str) -> Result<Detail, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [scale, x0, y0] => Ok(Detail { scale, x0, y0 }),
        _ => Err(format!("expected SCALE,X0,Y0, got `{s}`")),
    }
}

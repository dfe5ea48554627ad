//! Batch renderer: one framed, relit PNG per source photograph.
//!
//! ```bash
//! cargo run --release -- \
//!     --preset wall06 --wall-dir ./walls --out-dir ./out \
//!     photo1.png photo2.jpg
//! ```

use anyhow::Context;
use clap::Parser;
use std::{fs, path::PathBuf, time::Instant};

use framecast::{
    Engine, SceneParameters,
    cli::RenderArgs,
    disk::{DiskSource, PngDir},
    logging::init_logging,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    #[command(flatten)]
    render: RenderArgs,

    /// Directory receiving `frame_NNNN.png`
    #[arg(long, value_name = "DIR", default_value = "./frames")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.render.logging());

    // ─────────── scene & output ────────────
    let scene = SceneParameters::from_preset(&opts.render.preset, opts.render.zoom)?;
    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("creating {}", opts.out_dir.display()))?;

    let source = DiskSource {
        wall: opts.render.wall_path(),
        sources: opts.render.sources.clone(),
    };
    let mut engine = Engine::software(
        scene,
        opts.render.settings(),
        source,
        PngDir::new(&opts.out_dir),
    )?;

    // ─────────── run ────────────
    let t0 = Instant::now();
    let frames = engine.run()?;
    log::info!(
        "{frames} frame(s) in {:.1} s -> {}",
        t0.elapsed().as_secs_f64(),
        engine.sink.dir().display()
    );
    Ok(())
}

//! Interactive preview: renders the sources one by one and shows each
//! composited frame. `Space`/`→` advances, `Esc` quits.
//!
//! ```bash
//! cargo run --release --bin preview -- --preset wall04 photo.png
//! ```

use clap::Parser;
use image::RgbaImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use framecast::{
    Engine, FrameSink, Phase, SceneParameters, cli::RenderArgs, disk::DiskSource,
    logging::init_logging,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    #[command(flatten)]
    render: RenderArgs,

    /// Window scale divisor (2 shows the canvas at half size)
    #[arg(long, default_value_t = 1)]
    shrink: usize,
}

/// Keeps the latest frame as `0x00RRGGBB` for minifb.
#[derive(Default)]
struct Latest {
    fb: Vec<u32>,
    w: usize,
    h: usize,
}

impl FrameSink for Latest {
    fn submit(&mut self, _index: usize, frame: &RgbaImage) -> Result<(), image::ImageError> {
        (self.w, self.h) = (frame.width() as usize, frame.height() as usize);
        self.fb.clear();
        self.fb.extend(
            frame
                .pixels()
                .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32),
        );
        Ok(())
    }
}

/// Nearest-neighbour shrink of a packed frame buffer.
fn shrink(fb: &[u32], w: usize, h: usize, by: usize) -> (Vec<u32>, usize, usize) {
    let by = by.max(1);
    let (sw, sh) = (w / by, h / by);
    let mut out = Vec::with_capacity(sw * sh);
    for y in 0..sh {
        for x in 0..sw {
            out.push(fb[x * by + y * by * w]);
        }
    }
    (out, sw, sh)
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.render.logging());

    let scene = SceneParameters::from_preset(&opts.render.preset, opts.render.zoom)?;
    let source = DiskSource {
        wall: opts.render.wall_path(),
        sources: opts.render.sources.clone(),
    };
    let mut engine = Engine::software(
        scene,
        opts.render.settings(),
        source,
        Latest::default(),
    )?;

    // wall + selection, then the first frame
    while !matches!(engine.phase(), Phase::ExtractPoints | Phase::Done) {
        engine.step()?;
    }

    let by = opts.shrink.max(1);
    let (cw, ch) = (
        engine.renderer.scene().cx / by,
        engine.renderer.scene().cy / by,
    );
    let mut win = Window::new("framecast preview", cw, ch, WindowOptions::default())?;
    win.set_target_fps(30);

    let mut advance = true;
    while win.is_open() && !win.is_key_down(Key::Escape) {
        if advance && engine.phase() != Phase::Done {
            // run until the next frame has been handed to the sink
            loop {
                let phase = engine.step()?;
                if phase != Phase::Render {
                    break;
                }
            }
            if let Some(line) = engine.progress.latest() {
                win.set_title(&format!("framecast preview  {line}"));
            }
            advance = false;
        }

        if win.is_key_pressed(Key::Space, KeyRepeat::No)
            || win.is_key_pressed(Key::Right, KeyRepeat::No)
        {
            advance = true;
        }

        let sink = &engine.sink;
        if sink.fb.is_empty() {
            win.update();
        } else {
            let (fb, w, h) = shrink(&sink.fb, sink.w, sink.h, by);
            win.update_with_buffer(&fb, w, h)?;
        }
    }
    Ok(())
}

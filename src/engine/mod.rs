//! Frame pipeline driver.
//!
//! ```text
//! LoadWall ─> PickSources ─┬─> ExtractPoints ─> Render ─┐
//!                          │        ^                   │ more frames
//!                          │        └───────────────────┘
//!                          └─> Done <── last frame ─────┘
//! ```
//!
//! Each call to [`Engine::step`] runs exactly one phase to completion, so a
//! host with its own event loop can interleave steps with UI work. Decoding,
//! encoding and storage stay behind [`FrameSource`] and [`FrameSink`].

mod progress;

pub use progress::{PROGRESS_LINES, ProgressLog};

use image::RgbaImage;
use log::{debug, warn};
use thiserror::Error;

use crate::{
    cloud::{Extractor, Point},
    imaging::{self, ImagingError, apply_vignette, crop_to_frame},
    renderer::{RenderError, Renderer, RendererExt, Software},
    scene::{SceneParameters, WallTexture},
    settings::{RenderSettings, SettingsError},
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not read {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: image::ImageError,
    },

    #[error("could not store frame {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Supplies decoded pixels: the wall once, then the picked sources.
pub trait FrameSource {
    fn wall(&mut self) -> Result<RgbaImage, image::ImageError>;

    /// Let the user (or the command line) choose the source images.
    /// Returns how many were picked; zero ends the run quietly.
    fn pick(&mut self) -> usize;

    fn frame(&mut self, index: usize) -> Result<RgbaImage, image::ImageError>;
}

/// Receives every finished frame, in order.
pub trait FrameSink {
    fn submit(&mut self, index: usize, frame: &RgbaImage) -> Result<(), image::ImageError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    LoadWall,
    PickSources,
    ExtractPoints,
    Render,
    Done,
}

pub struct Engine<S: FrameSource, K: FrameSink, R: Renderer = Software> {
    pub renderer: R,
    pub source: S,
    pub sink: K,
    pub progress: ProgressLog,
    scene: SceneParameters,
    settings: RenderSettings,
    extractor: Extractor,
    phase: Phase,
    wall: Option<WallTexture>,
    points: Vec<Point>,
    frames: usize,
    frame: usize,
}

impl<S: FrameSource, K: FrameSink> Engine<S, K, Software> {
    /// Engine on the CPU backend; allocates the render context up front.
    pub fn software(
        scene: SceneParameters,
        settings: RenderSettings,
        source: S,
        sink: K,
    ) -> Result<Self, EngineError> {
        settings.validate(&scene)?;
        let renderer = Software::new(scene.clone(), &settings)?;
        Self::new(renderer, scene, settings, source, sink)
    }
}

impl<S: FrameSource, K: FrameSink, R: Renderer> Engine<S, K, R> {
    /// Fails when `settings` do not suit `scene`; see
    /// [`RenderSettings::validate`].
    pub fn new(
        renderer: R,
        scene: SceneParameters,
        settings: RenderSettings,
        source: S,
        sink: K,
    ) -> Result<Self, EngineError> {
        settings.validate(&scene)?;
        Ok(Self {
            extractor: Extractor::new(&settings),
            renderer,
            source,
            sink,
            progress: ProgressLog::default(),
            scene,
            settings,
            phase: Phase::LoadWall,
            wall: None,
            points: Vec::new(),
            frames: 0,
            frame: 0,
        })
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of frames picked for this run.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Points extracted for the frame about to render (or just rendered).
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Drive the pipeline to [`Phase::Done`]; returns the frames written.
    pub fn run(&mut self) -> Result<usize, EngineError> {
        while self.step()? != Phase::Done {}
        Ok(self.frame)
    }

    /// Run the current phase and move to the next one.
    ///
    /// An error leaves the phase unchanged; a caller may retry or give up.
    pub fn step(&mut self) -> Result<Phase, EngineError> {
        self.phase = match self.phase {
            Phase::LoadWall => self.load_wall()?,
            Phase::PickSources => self.pick_sources(),
            Phase::ExtractPoints => self.extract_points()?,
            Phase::Render => self.render()?,
            Phase::Done => Phase::Done,
        };
        Ok(self.phase)
    }

    /* 1. wall ---------------------------------------------------------*/
    fn load_wall(&mut self) -> Result<Phase, EngineError> {
        let src = self.source.wall().map_err(|source| EngineError::Decode {
            what: format!("wall `{}`", self.scene.preset),
            source,
        })?;
        let (w, h) = (self.scene.cx0 + self.scene.cx, self.scene.cy0 + self.scene.cy);
        self.wall = Some(WallTexture::fit(&src, w, h)?);
        debug!("wall {}x{} fitted to {w}x{h}", src.width(), src.height());
        Ok(Phase::PickSources)
    }

    /* 2. selection ----------------------------------------------------*/
    fn pick_sources(&mut self) -> Phase {
        self.frames = self.source.pick();
        self.frame = 0;
        if self.frames == 0 {
            warn!("no source images picked");
            return Phase::Done;
        }
        self.progress.push(format!("> Read {} image", self.frames));
        Phase::ExtractPoints
    }

    /* 3. point cloud --------------------------------------------------*/
    fn extract_points(&mut self) -> Result<Phase, EngineError> {
        let index = self.frame;
        let mut src = self.source.frame(index).map_err(|source| EngineError::Decode {
            what: format!("source frame {index}"),
            source,
        })?;
        if let Some(d) = self.settings.detail {
            src = imaging::detail(&src, d)?;
        }
        let (fw, fh) = self.scene.frame_source_size();
        let mut pixels = crop_to_frame(&src, fw, fh)?;
        apply_vignette(&mut pixels);

        let report = self.extractor.extract(&pixels, &self.scene, &mut self.points);
        self.progress
            .push(format!("> mesh vertex {}", report.lattice_vertices));
        self.progress
            .push(format!("> remesh vertex {}", report.remeshed_vertices));
        self.progress.push(format!("> things {}", report.points));
        Ok(Phase::Render)
    }

    /* 4. render + emit ------------------------------------------------*/
    fn render(&mut self) -> Result<Phase, EngineError> {
        let index = self.frame;
        let Some(wall) = self.wall.as_ref() else {
            // Only reachable if a caller skipped LoadWall; start over.
            return Ok(Phase::LoadWall);
        };
        let sink = &mut self.sink;
        self.renderer
            .draw_frame(wall, &self.points, |canvas| sink.submit(index, canvas))?
            .map_err(|source| EngineError::Encode { index, source })?;
        self.progress.push(format!("> Saved frame {index}"));

        self.frame += 1;
        if self.frame >= self.frames {
            self.progress.push("> Done");
            Ok(Phase::Done)
        } else {
            Ok(Phase::ExtractPoints)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// In-memory decoder: a flat wall and a list of generated sources.
    struct Memory {
        wall: RgbaImage,
        sources: Vec<RgbaImage>,
        broken: Option<usize>,
    }

    impl FrameSource for Memory {
        fn wall(&mut self) -> Result<RgbaImage, image::ImageError> {
            Ok(self.wall.clone())
        }

        fn pick(&mut self) -> usize {
            self.sources.len()
        }

        fn frame(&mut self, index: usize) -> Result<RgbaImage, image::ImageError> {
            if self.broken == Some(index) {
                return Err(image::ImageError::IoError(std::io::Error::other("truncated")));
            }
            Ok(self.sources[index].clone())
        }
    }

    #[derive(Default)]
    struct Collect(Vec<(usize, (u32, u32))>);

    impl FrameSink for Collect {
        fn submit(&mut self, index: usize, frame: &RgbaImage) -> Result<(), image::ImageError> {
            self.0.push((index, frame.dimensions()));
            Ok(())
        }
    }

    fn memory(n: usize) -> Memory {
        Memory {
            wall: RgbaImage::from_pixel(64, 36, Rgba([120, 110, 100, 255])),
            sources: (0..n)
                .map(|i| {
                    RgbaImage::from_fn(80, 90, |x, y| {
                        Rgba([(x * 3) as u8, (y * 2) as u8, (i * 50) as u8, 255])
                    })
                })
                .collect(),
            broken: None,
        }
    }

    fn engine(src: Memory) -> Engine<Memory, Collect> {
        let scene = SceneParameters::from_preset("wall20", 1.0).unwrap();
        Engine::software(scene, RenderSettings::default(), src, Collect::default()).unwrap()
    }

    #[test]
    fn empty_selection_finishes_without_frames() {
        let mut e = engine(memory(0));
        assert_eq!(e.run().unwrap(), 0);
        assert_eq!(e.phase(), Phase::Done);
        assert!(e.sink.0.is_empty());
        assert!(e.progress.is_empty());
    }

    #[test]
    fn phases_follow_the_pipeline() {
        let mut e = engine(memory(2));
        let mut seen = vec![e.phase()];
        while e.phase() != Phase::Done {
            seen.push(e.step().unwrap());
        }
        use Phase::*;
        assert_eq!(
            seen,
            [LoadWall, PickSources, ExtractPoints, Render, ExtractPoints, Render, Done]
        );
    }

    #[test]
    fn every_frame_reaches_the_sink_at_canvas_size() {
        let mut e = engine(memory(3));
        assert_eq!(e.run().unwrap(), 3);
        let size = (1365, 768);
        assert_eq!(e.sink.0, [(0, size), (1, size), (2, size)]);
        assert!(!e.points().is_empty());
    }

    #[test]
    fn progress_reports_each_stage_newest_first() {
        let mut e = engine(memory(1));
        e.run().unwrap();
        let lines: Vec<_> = e.progress.lines().collect();
        assert_eq!(lines[0], "> Done");
        assert_eq!(lines[1], "> Saved frame 0");
        assert!(lines[2].starts_with("> things "));
        assert!(lines[3].starts_with("> remesh vertex "));
        assert!(lines[4].starts_with("> mesh vertex "));
        assert_eq!(lines[5], "> Read 1 image");
    }

    #[test]
    fn unusable_settings_are_refused_up_front() {
        let scene = SceneParameters::from_preset("wall20", 1.0).unwrap();
        let zero = RenderSettings {
            coarse: 0.0,
            ..Default::default()
        };
        let err = Engine::software(scene.clone(), zero, memory(1), Collect::default());
        assert!(matches!(
            err,
            Err(EngineError::Settings(SettingsError::BadCoarse(_)))
        ));

        let zoomed = RenderSettings {
            zoom: 2.0,
            ..Default::default()
        };
        let err = Engine::software(scene, zoomed, memory(1), Collect::default());
        assert!(matches!(
            err,
            Err(EngineError::Settings(SettingsError::ZoomMismatch { .. }))
        ));
    }

    #[test]
    fn decode_failure_keeps_the_phase() {
        let mut src = memory(2);
        src.broken = Some(1);
        let mut e = engine(src);
        let err = e.run().unwrap_err();
        assert!(matches!(err, EngineError::Decode { .. }));
        assert_eq!(e.phase(), Phase::ExtractPoints);
        assert_eq!(e.sink.0.len(), 1);
    }
}

//! Photograph → relit point-cloud composition inside a virtual picture frame.
//!
//! Data flow for one output frame:
//!
//! ```text
//! SceneParameters ─┐
//! source image ────┴─> imaging ─> cloud (points) ─> renderer ─> RgbaImage
//!                                                    (reset → spheres →
//!                                                     lights → shadows)
//! ```
//!
//! The [`engine`] module drives these phases; decoding, encoding and the
//! host UI sit behind its collaborator traits.

pub mod cli;
pub mod cloud;
pub mod disk;
pub mod engine;
pub mod imaging;
pub mod logging;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use cloud::{ExtractReport, Extractor, Point};
pub use engine::{Engine, EngineError, FrameSink, FrameSource, Phase, ProgressLog};
pub use renderer::{RenderError, Renderer, RendererExt, Software};
pub use scene::{SceneError, SceneParameters, Viewpoint, WallTexture};
pub use settings::{RenderSettings, SettingsError};

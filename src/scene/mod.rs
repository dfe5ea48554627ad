mod params;
mod viewpoint;
mod wall;

pub use params::{DEPTH_UNITS, SceneError, SceneParameters, preset_names};
pub use viewpoint::Viewpoint;
pub use wall::WallTexture;

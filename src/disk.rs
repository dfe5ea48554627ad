//! File-system collaborators: decode with `image::open`, write PNG frames.

use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

use crate::engine::{FrameSink, FrameSource};

/// Wall texture plus the source photographs, decoded on demand.
#[derive(Debug, Clone)]
pub struct DiskSource {
    pub wall: PathBuf,
    pub sources: Vec<PathBuf>,
}

impl FrameSource for DiskSource {
    fn wall(&mut self) -> Result<RgbaImage, image::ImageError> {
        Ok(image::open(&self.wall)?.to_rgba8())
    }

    fn pick(&mut self) -> usize {
        self.sources.len()
    }

    fn frame(&mut self, index: usize) -> Result<RgbaImage, image::ImageError> {
        Ok(image::open(&self.sources[index])?.to_rgba8())
    }
}

/// `frame_0000.png`, `frame_0001.png`, …
pub fn frame_name(index: usize) -> String {
    format!("frame_{index:04}.png")
}

/// Writes every submitted frame as a PNG into `dir`.
#[derive(Debug, Clone)]
pub struct PngDir {
    dir: PathBuf,
}

impl PngDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for PngDir {
    fn submit(&mut self, index: usize, frame: &RgbaImage) -> Result<(), image::ImageError> {
        frame.save_with_format(self.dir.join(frame_name(index)), ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn frames_are_numbered_with_four_digits() {
        assert_eq!(frame_name(0), "frame_0000.png");
        assert_eq!(frame_name(123), "frame_0123.png");
    }

    #[test]
    fn saved_frame_decodes_back() {
        let dir = std::env::temp_dir().join(format!("framecast-disk-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let img = RgbaImage::from_pixel(5, 3, Rgba([10, 20, 30, 255]));
        PngDir::new(&dir).submit(7, &img).unwrap();

        let mut src = DiskSource {
            wall: dir.join("frame_0007.png"),
            sources: vec![dir.join("frame_0007.png")],
        };
        assert_eq!(src.pick(), 1);
        assert_eq!(src.frame(0).unwrap(), img);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut src = DiskSource {
            wall: PathBuf::from("/nonexistent/wall06.png"),
            sources: Vec::new(),
        };
        assert!(src.wall().is_err());
        assert_eq!(src.pick(), 0);
    }
}

//! Ordered image-sequence frame source.
//!
//! The input "video" is a directory of still images sorted by file name
//! (for example the output of `ffmpeg -i clip.mp4 frames/%05d.png`).
use crate::image::io::load_rgb_image;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

pub const FRAME_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(Clone, Debug)]
pub struct Frame {
    /// Zero-based position in the sequence.
    pub index: usize,
    pub path: PathBuf,
    pub image: RgbImage,
}

#[derive(Clone, Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl ImageSequence {
    /// List the image files of `dir`, sorted by file name.
    pub fn open(dir: &Path) -> Result<Self, String> {
        let entries = fs::read_dir(dir)
            .map_err(|e| format!("Failed to read frames directory {}: {e}", dir.display()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to list {}: {e}", dir.display()))?;
            let path = entry.path();
            if path.is_file() && has_frame_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Iterator for ImageSequence {
    type Item = Result<Frame, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let path = self.paths.get(index)?.clone();
        self.next += 1;
        Some(load_rgb_image(&path).map(|image| Frame { index, path, image }))
    }
}

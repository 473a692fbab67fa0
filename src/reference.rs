//! The persisted result of a session: `sample.json` plus the chosen frame,
//! its visualization and the dewarped crop.
use crate::dewarp::dewarp;
use crate::image::io::{save_rgb_image, write_json_file};
use crate::types::Quad;
use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const RECORD_FILE: &str = "sample.json";
pub const LOG_FILE: &str = "create_reference.log";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub x_len: u32,
    pub y_len: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<[f32; 2]> for Point {
    fn from(p: [f32; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectCoords {
    pub top_left: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
    pub top_right: Point,
}

impl From<&Quad> for ObjectCoords {
    fn from(q: &Quad) -> Self {
        Self {
            top_left: q.top_left.into(),
            bottom_left: q.bottom_left.into(),
            bottom_right: q.bottom_right.into(),
            top_right: q.top_right.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub target_image_shape: Shape,
    pub input_video_shape: Shape,
    pub reference_frame_id: usize,
    pub object_coord_in_ref_frame: ObjectCoords,
}

impl ReferenceRecord {
    pub fn new(target: (u32, u32), frame: (u32, u32), frame_id: usize, quad: &Quad) -> Self {
        Self {
            target_image_shape: Shape {
                x_len: target.0,
                y_len: target.1,
            },
            input_video_shape: Shape {
                x_len: frame.0,
                y_len: frame.1,
            },
            reference_frame_id: frame_id,
            object_coord_in_ref_frame: quad.into(),
        }
    }
}

/// File layout of the output directory.
#[derive(Clone, Debug)]
pub struct OutputPaths {
    dir: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record(&self) -> PathBuf {
        self.dir.join(RECORD_FILE)
    }

    pub fn log(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn extracted(&self, frame_id: usize) -> PathBuf {
        self.dir
            .join(format!("reference_frame_{frame_id:02}_extracted.png"))
    }

    pub fn extracted_viz(&self, frame_id: usize) -> PathBuf {
        self.dir
            .join(format!("reference_frame_{frame_id:02}_extracted_viz.png"))
    }

    pub fn dewarped(&self, frame_id: usize) -> PathBuf {
        self.dir
            .join(format!("reference_frame_{frame_id:02}_dewarped.png"))
    }
}

/// Frame picked by the user together with the quad found on it.
pub struct Selection<'a> {
    pub frame_id: usize,
    pub frame: &'a RgbImage,
    pub visualization: &'a RgbImage,
    pub quad: Quad,
}

/// Write the record and the three images for `selection`.
///
/// `target` is the size of the reference image and of the dewarped output.
pub fn save_reference(
    paths: &OutputPaths,
    target: (u32, u32),
    selection: &Selection<'_>,
) -> Result<ReferenceRecord, String> {
    let record = ReferenceRecord::new(
        target,
        selection.frame.dimensions(),
        selection.frame_id,
        &selection.quad,
    );
    let record_path = paths.record();
    write_json_file(&record_path, &record)?;
    debug!("Reference record written to {}", record_path.display());

    save_rgb_image(selection.frame, &paths.extracted(selection.frame_id))?;
    save_rgb_image(selection.visualization, &paths.extracted_viz(selection.frame_id))?;

    let dewarped_path = paths.dewarped(selection.frame_id);
    let dewarped = dewarp(selection.frame, &selection.quad, target.0, target.1).ok_or_else(|| {
        format!(
            "Failed to dewarp frame {} for {}: degenerate quad",
            selection.frame_id,
            dewarped_path.display()
        )
    })?;
    save_rgb_image(&dewarped, &dewarped_path)?;
    debug!("Dewarped frame written to {}", dewarped_path.display());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_expected_keys() {
        let quad = Quad::from_corners([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]]);
        let record = ReferenceRecord::new((100, 80), (640, 480), 3, &quad);
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["target_image_shape"]["x_len"], 100);
        assert_eq!(json["input_video_shape"]["y_len"], 480);
        assert_eq!(json["reference_frame_id"], 3);
        assert_eq!(json["object_coord_in_ref_frame"]["bottom_right"]["x"], 5.0);
        assert_eq!(json["object_coord_in_ref_frame"]["top_right"]["y"], 8.0);
    }

    #[test]
    fn artifact_names_are_zero_padded() {
        let paths = OutputPaths::new(Path::new("out"));
        assert_eq!(paths.extracted(7), Path::new("out/reference_frame_07_extracted.png"));
        assert_eq!(paths.extracted_viz(123), Path::new("out/reference_frame_123_extracted_viz.png"));
        assert_eq!(paths.dewarped(0), Path::new("out/reference_frame_00_dewarped.png"));
        assert_eq!(paths.record(), Path::new("out/sample.json"));
    }
}

//! Two `minifb` windows: the reference ("Ground truth") and the annotated
//! current frame ("Tracker output"), plus the key handling used to pick a frame.
use image::RgbImage;
use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};

pub const GROUND_TRUTH_TITLE: &str = "Ground truth";
pub const OUTPUT_TITLE: &str = "Tracker output";

/// Window refresh rate while waiting for a key; `update_with_buffer` sleeps to hold it.
const TARGET_FPS: usize = 50;

/// What the user asked for after looking at a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserAction {
    /// Advance to the next frame.
    Next,
    /// Keep the current frame, save and quit.
    Quit,
}

/// 0RGB packed pixels as expected by `minifb`.
pub fn to_argb_buffer(img: &RgbImage) -> Vec<u32> {
    img.pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
        })
        .collect()
}

struct Pane {
    window: Window,
    buffer: Vec<u32>,
    size: (usize, usize),
}

impl Pane {
    fn open(title: &str, img: &RgbImage) -> Result<Self, String> {
        let size = (img.width() as usize, img.height() as usize);
        let mut window = Window::new(
            title,
            size.0,
            size.1,
            WindowOptions {
                resize: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| format!("Failed to open window '{title}': {e}"))?;
        window.set_target_fps(TARGET_FPS);
        let mut pane = Self {
            window,
            buffer: Vec::new(),
            size,
        };
        pane.set_image(img);
        Ok(pane)
    }

    fn set_image(&mut self, img: &RgbImage) {
        self.size = (img.width() as usize, img.height() as usize);
        self.buffer = to_argb_buffer(img);
    }

    fn refresh(&mut self) -> Result<(), String> {
        self.window
            .update_with_buffer(&self.buffer, self.size.0, self.size.1)
            .map_err(|e| format!("Failed to update window: {e}"))
    }
}

pub struct Viewer {
    ground_truth: Pane,
    output: Pane,
}

impl Viewer {
    pub fn open(reference: &RgbImage, first_frame: &RgbImage) -> Result<Self, String> {
        Ok(Self {
            ground_truth: Pane::open(GROUND_TRUTH_TITLE, reference)?,
            output: Pane::open(OUTPUT_TITLE, first_frame)?,
        })
    }

    pub fn show(&mut self, annotated: &RgbImage) {
        self.output.set_image(annotated);
    }

    /// Keep both windows alive until `Space`, `Q`/`Esc` or a window is closed.
    pub fn wait_for_action(&mut self) -> Result<UserAction, String> {
        loop {
            self.output.refresh()?;
            self.ground_truth.refresh()?;
            if !self.output.window.is_open() || !self.ground_truth.window.is_open() {
                return Ok(UserAction::Quit);
            }
            let win = &self.output.window;
            if win.is_key_pressed(Key::Q, KeyRepeat::No) || win.is_key_pressed(Key::Escape, KeyRepeat::No) {
                return Ok(UserAction::Quit);
            }
            if win.is_key_pressed(Key::Space, KeyRepeat::No) {
                return Ok(UserAction::Next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn pixels_are_packed_as_0rgb() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([0x12, 0x34, 0x56]));
        assert_eq!(to_argb_buffer(&img), vec![0, 0x0012_3456]);
    }
}

//! Visualization of a tracker decision on a copy of the frame.
use crate::types::{Quad, TrackOutput};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};

pub const ACCEPT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CORNER_COLOR: Rgb<u8> = Rgb([64, 255, 64]);
pub const REJECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const QUAD_THICKNESS: i32 = 2;
const CORNER_RADIUS: i32 = 4;
const REJECT_RADIUS: i32 = 20;
const REJECT_THICKNESS: i32 = 10;

/// Closed polyline through the quad corners, `QUAD_THICKNESS` pixels wide.
pub fn draw_quad(canvas: &mut RgbImage, quad: &Quad, color: Rgb<u8>) {
    let c = quad.corners();
    for i in 0..4 {
        let [x0, y0] = c[i];
        let [x1, y1] = c[(i + 1) % 4];
        for dy in 0..QUAD_THICKNESS {
            for dx in 0..QUAD_THICKNESS {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(canvas, (x0 + ox, y0 + oy), (x1 + ox, y1 + oy), color);
            }
        }
    }
    for [x, y] in c {
        draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), CORNER_RADIUS, CORNER_COLOR);
    }
}

/// Thick ring centred on the frame.
pub fn draw_reject_marker(canvas: &mut RgbImage) {
    let center = ((canvas.width() / 2) as i32, (canvas.height() / 2) as i32);
    let half = REJECT_THICKNESS / 2;
    for r in (REJECT_RADIUS - half)..=(REJECT_RADIUS + half) {
        draw_hollow_circle_mut(canvas, center, r, REJECT_COLOR);
    }
}

/// Copy of `frame` annotated with the decision in `output`.
pub fn render(frame: &RgbImage, output: &TrackOutput) -> RgbImage {
    let mut canvas = frame.clone();
    match (&output.quad, output.rejected) {
        (Some(quad), false) => draw_quad(&mut canvas, quad, ACCEPT_COLOR),
        _ => draw_reject_marker(&mut canvas),
    }
    canvas
}

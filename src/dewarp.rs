//! Perspective rectification of the tracked quad onto the reference rectangle.
use crate::types::Quad;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Quads enclosing less than this many square pixels are not warped.
const MIN_QUAD_AREA: f32 = 1.0;

/// Target corners of a `width × height` output, in tl, bl, br, tr order.
pub fn target_corners(width: u32, height: u32) -> [[f32; 2]; 4] {
    let (w, h) = (width.saturating_sub(1) as f32, height.saturating_sub(1) as f32);
    [[0.0, 0.0], [0.0, h], [w, h], [w, 0.0]]
}

/// Copy of `frame` with a one-pixel replicated border on every side.
fn pad_replicate(frame: &RgbImage) -> RgbImage {
    let (w, h) = frame.dimensions();
    RgbImage::from_fn(w + 2, h + 2, |x, y| {
        let sx = x.saturating_sub(1).min(w - 1);
        let sy = y.saturating_sub(1).min(h - 1);
        *frame.get_pixel(sx, sy)
    })
}

/// Warp the region of `frame` bounded by `quad` onto a `width × height`
/// image with bilinear sampling. Samples up to one pixel past the frame
/// edge take the edge value; farther ones are black.
///
/// Returns `None` when the quad is degenerate.
pub fn dewarp(frame: &RgbImage, quad: &Quad, width: u32, height: u32) -> Option<RgbImage> {
    if width == 0 || height == 0 || !(quad.signed_area().abs() >= MIN_QUAD_AREA) {
        return None;
    }
    if frame.width() == 0 || frame.height() == 0 {
        return None;
    }
    // Bilinear lookups on the last row/column need a right/bottom neighbour.
    let padded = pad_replicate(frame);
    let src = quad.corners().map(|[x, y]| (x + 1.0, y + 1.0));
    let dst = target_corners(width, height).map(|[x, y]| (x, y));
    let projection = Projection::from_control_points(src, dst)?;
    let mut out = RgbImage::new(width, height);
    warp_into(
        &padded,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 100]))
    }

    fn assert_close(a: &Rgb<u8>, b: &Rgb<u8>) {
        for c in 0..3 {
            assert!((a.0[c] as i32 - b.0[c] as i32).abs() <= 1, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn identity_quad_reproduces_the_frame() {
        let frame = gradient(40, 30);
        let quad = Quad::from_corners(target_corners(40, 30));
        let out = dewarp(&frame, &quad, 40, 30).unwrap();
        for (a, b) in out.pixels().zip(frame.pixels()) {
            assert_close(a, b);
        }
    }

    #[test]
    fn last_row_and_column_keep_edge_values() {
        let frame = gradient(40, 30);
        let quad = Quad::from_corners(target_corners(40, 30));
        let out = dewarp(&frame, &quad, 40, 30).unwrap();
        assert_close(out.get_pixel(39, 0), frame.get_pixel(39, 0));
        assert_close(out.get_pixel(0, 29), frame.get_pixel(0, 29));
        assert_close(out.get_pixel(39, 29), frame.get_pixel(39, 29));
    }

    #[test]
    fn samples_far_outside_the_frame_are_black() {
        let frame = gradient(20, 20);
        let quad = Quad::from_corners([[-10.0, 0.0], [-10.0, 19.0], [9.0, 19.0], [9.0, 0.0]]);
        let out = dewarp(&frame, &quad, 20, 20).unwrap();
        assert_eq!(out.get_pixel(0, 10).0, [0, 0, 0]);
        assert_close(out.get_pixel(19, 10), frame.get_pixel(9, 10));
    }

    #[test]
    fn sub_rectangle_is_cropped_and_scaled() {
        let frame = gradient(60, 60);
        // 2× smaller crop starting at (10, 20).
        let quad = Quad::from_corners([[10.0, 20.0], [10.0, 38.0], [28.0, 38.0], [28.0, 20.0]]);
        let out = dewarp(&frame, &quad, 10, 10).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        let tl = out.get_pixel(0, 0).0;
        assert!((tl[0] as i32 - 40).abs() <= 2 && (tl[1] as i32 - 80).abs() <= 2);
    }

    #[test]
    fn collapsed_quad_is_rejected() {
        let frame = gradient(10, 10);
        let quad = Quad::from_corners([[1.0, 1.0]; 4]);
        assert!(dewarp(&frame, &quad, 5, 5).is_none());
    }
}

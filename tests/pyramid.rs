use doc_reference::image::ImageF32;
use doc_reference::pyramid::{multi_pyr_down, LevelScaling};

fn blob(w: usize, h: usize, cx: f32, cy: f32, sigma: f32) -> ImageF32 {
    let mut img = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
            img.set(x, y, (-d2 / (2.0 * sigma * sigma)).exp());
        }
    }
    img
}

fn centroid(img: &ImageF32) -> [f32; 2] {
    let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
    for y in 0..img.h {
        for x in 0..img.w {
            let v = img.get(x, y);
            sx += v * x as f32;
            sy += v * y as f32;
            sw += v;
        }
    }
    [sx / sw, sy / sw]
}

#[test]
fn downsampled_position_lifts_back_within_one_pixel() {
    let (cx, cy) = (83.0, 57.0);
    let full = blob(160, 120, cx, cy, 6.0);
    for levels in 1..=3 {
        let down = multi_pyr_down(&full, levels);
        let scaling = LevelScaling::dyadic(levels);
        let [x, y] = scaling.to_full(centroid(&down));
        assert!(
            (x - cx).abs() <= 1.0 && (y - cy).abs() <= 1.0,
            "levels={levels}: lifted ({x:.2}, {y:.2})"
        );
    }
}

#[test]
fn level_scaling_round_trips() {
    let scaling = LevelScaling::dyadic(2);
    assert_eq!(scaling.scale_to_full, 4.0);
    let p = [13.25, 7.5];
    assert_eq!(scaling.to_full(scaling.from_full(p)), p);
}

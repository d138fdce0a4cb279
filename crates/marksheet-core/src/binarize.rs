//! Ink/background binarization.
//!
//! Classifies every pixel of an RGBA page buffer as ink or background.
//! Printed mark-sheet forms carry pink/red guide lines around the bubbles;
//! a color-cast test runs *before* the brightness threshold so those lines
//! always read as background. Without that ordering a dark-enough guide
//! line would be counted as a filled bubble.

use image::{GrayImage, Luma, RgbaImage};

/// Binary-buffer value for an ink pixel.
pub const INK: u8 = 0;
/// Binary-buffer value for a background pixel.
pub const BACKGROUND: u8 = 255;

// Pink guide-line cast: high red, moderate-to-high green, low blue, with
// red exceeding blue by a margin. Tuned against scanned forms.
const CAST_MIN_R: u8 = 180;
const CAST_MIN_G: u8 = 120;
const CAST_MAX_B: u8 = 160;
const CAST_MIN_R_MINUS_B: i16 = 30;

/// True if the pixel belongs to a printed pink/red guide line.
fn is_guide_cast(r: u8, g: u8, b: u8) -> bool {
    r > CAST_MIN_R && g > CAST_MIN_G && b < CAST_MAX_B && (r as i16 - b as i16) > CAST_MIN_R_MINUS_B
}

/// Rec. 601 luma.
fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Binarize an RGBA page buffer.
///
/// Guide-cast pixels become [`BACKGROUND`] unconditionally; every other
/// pixel is [`INK`] iff its luma falls below `threshold`. Alpha is ignored.
/// Pure and total: any buffer and any threshold produce a same-sized
/// 0/255 grayscale buffer.
pub fn binarize(buffer: &RgbaImage, threshold: u8) -> GrayImage {
    let (w, h) = buffer.dimensions();
    let mut out = GrayImage::new(w, h);

    for (x, y, px) in buffer.enumerate_pixels() {
        let [r, g, b, _] = px.0;
        let val = if is_guide_cast(r, g, b) {
            BACKGROUND
        } else if luma(r, g, b) < threshold as f32 {
            INK
        } else {
            BACKGROUND
        };
        out.put_pixel(x, y, Luma([val]));
    }

    out
}

/// Classify a binary-buffer sample as ink.
///
/// The midpoint split keeps this total over buffers that were not produced
/// by [`binarize`] (e.g. a raw grayscale scan passed straight through).
pub fn is_ink(sample: u8) -> bool {
    sample < 128
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(rgba))
    }

    #[test]
    fn dark_pixels_become_ink() {
        let img = solid(4, 4, [20, 20, 20, 255]);
        let bin = binarize(&img, 128);
        assert!(bin.pixels().all(|p| p.0[0] == INK));
    }

    #[test]
    fn bright_pixels_become_background() {
        let img = solid(4, 4, [240, 240, 240, 255]);
        let bin = binarize(&img, 128);
        assert!(bin.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn pink_guide_lines_are_suppressed() {
        // A saturated pink that is dark enough to pass a high threshold.
        let img = solid(4, 4, [220, 140, 120, 255]);
        // luma ≈ 161, well below threshold 200: only the cast test saves it.
        let bin = binarize(&img, 200);
        assert!(bin.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn grayish_pixel_is_not_mistaken_for_guide_cast() {
        // Near-neutral gray: fails the R-B margin, so the luma rule applies.
        let img = solid(2, 2, [185, 185, 185, 255]);
        let bin = binarize(&img, 200);
        assert!(bin.pixels().all(|p| p.0[0] == INK));
    }

    #[test]
    fn alpha_is_irrelevant() {
        let opaque = binarize(&solid(2, 2, [10, 10, 10, 255]), 128);
        let transparent = binarize(&solid(2, 2, [10, 10, 10, 0]), 128);
        assert_eq!(opaque.as_raw(), transparent.as_raw());
    }

    #[test]
    fn binarize_is_idempotent() {
        let mut img = RgbaImage::new(8, 8);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let v = ((x * 37 + y * 91) % 256) as u8;
            *px = Rgba([v, v.wrapping_add(40), v.wrapping_mul(3), 255]);
        }

        for threshold in [0u8, 1, 128, 200, 255] {
            let once = binarize(&img, threshold);
            let as_rgba = RgbaImage::from_fn(8, 8, |x, y| {
                let v = once.get_pixel(x, y).0[0];
                Rgba([v, v, v, 255])
            });
            let twice = binarize(&as_rgba, threshold);
            assert_eq!(once.as_raw(), twice.as_raw(), "threshold {}", threshold);
        }
    }
}

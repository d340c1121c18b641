//! Grayscale conversion.
//!
//! Pure pixel transform, kept free of capture and storage concerns so it
//! can be tested without a display. BT.709 luma weights in 16-bit fixed
//! point; already-gray input passes through bit-for-bit, so applying the
//! transform twice equals applying it once.

use crate::capture::RasterImage;

// BT.709 luma weights scaled by 65536. The three sum to exactly 65536,
// which is what makes the transform idempotent.
const WEIGHT_R: u32 = 13933;
const WEIGHT_G: u32 = 46871;
const WEIGHT_B: u32 = 4732;

/// Collapse every pixel to its BT.709 luma, keeping alpha untouched.
pub fn to_grayscale(image: RasterImage) -> RasterImage {
    let mut rgba = image.into_rgba8();
    for px in rgba.pixels_mut() {
        let y = luma(px.0[0], px.0[1], px.0[2]);
        px.0[0] = y;
        px.0[1] = y;
        px.0[2] = y;
    }
    RasterImage::from_rgba8(rgba)
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = WEIGHT_R * r as u32 + WEIGHT_G * g as u32 + WEIGHT_B * b as u32;
    ((weighted + 32768) >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    fn raster_of(pixels: &[[u8; 4]], width: u32, height: u32) -> RasterImage {
        assert_eq!(pixels.len() as u32, width * height);
        let mut img = RgbaImage::new(width, height);
        for (i, px) in pixels.iter().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            img.put_pixel(x, y, Rgba(*px));
        }
        RasterImage::from_rgba8(img)
    }

    // ── Single pixels ──

    #[test]
    fn black_and_white_are_fixed_points() {
        let out = to_grayscale(raster_of(&[[0, 0, 0, 255], [255, 255, 255, 255]], 2, 1));
        assert_eq!(out.data(), &[0, 0, 0, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn primaries_weigh_green_heaviest() {
        let out = to_grayscale(raster_of(
            &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]],
            3,
            1,
        ));
        let d = out.data();
        let (red_y, green_y, blue_y) = (d[0], d[4], d[8]);
        assert_eq!((red_y, green_y, blue_y), (54, 182, 18));
        assert!(green_y > red_y && red_y > blue_y);
    }

    #[test]
    fn alpha_is_preserved() {
        let out = to_grayscale(raster_of(&[[10, 200, 30, 0], [10, 200, 30, 77]], 2, 1));
        let d = out.data();
        assert_eq!(d[3], 0);
        assert_eq!(d[7], 77);
    }

    #[test]
    fn dimensions_are_preserved() {
        let out = to_grayscale(raster_of(&[[1, 2, 3, 4]; 12], 4, 3));
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.data().len(), 4 * 3 * 4);
    }

    // ── Whole-buffer properties ──

    proptest! {
        #[test]
        fn every_pixel_ends_up_gray(bytes in proptest::collection::vec(any::<u8>(), 16 * 4)) {
            let img = RgbaImage::from_raw(4, 4, bytes).unwrap();
            let out = to_grayscale(RasterImage::from_rgba8(img));
            for px in out.data().chunks_exact(4) {
                prop_assert_eq!(px[0], px[1]);
                prop_assert_eq!(px[1], px[2]);
            }
        }

        #[test]
        fn converting_twice_equals_converting_once(bytes in proptest::collection::vec(any::<u8>(), 16 * 4)) {
            let img = RgbaImage::from_raw(4, 4, bytes).unwrap();
            let once = to_grayscale(RasterImage::from_rgba8(img));
            let twice = to_grayscale(RasterImage::from_rgba8(once.clone().into_rgba8()));
            prop_assert_eq!(once.data(), twice.data());
        }
    }
}

//! Causal neighbour prediction residuals
//!
//! Each pixel is predicted from the mean of the already-scanned neighbours
//! left, upper-left, above and upper-right of it, in raster order. The
//! encoding residual wraps modulo 256 so that [`reconstruct_from_residual`]
//! recovers the source exactly.

use crate::io::configuration::RESIDUAL_OFFSET;
use image::{GrayImage, Luma};

const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

fn intensity(image: &GrayImage, x: i64, y: i64) -> Option<u8> {
    let x = u32::try_from(x).ok()?;
    let y = u32::try_from(y).ok()?;
    image.get_pixel_checked(x, y).map(|&Luma([value])| value)
}

/// Mean of the in-bounds causal neighbours of `(x, y)`, or 0 with none
pub fn prediction(image: &GrayImage, x: u32, y: u32) -> f64 {
    let (sum, count) = NEIGHBOURS
        .iter()
        .filter_map(|&(dx, dy)| intensity(image, i64::from(x) + dx, i64::from(y) + dy))
        .fold((0.0, 0usize), |(sum, count), value| {
            (sum + f64::from(value), count + 1)
        });
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Residual shifted by 128 and clamped, for viewing
pub fn residual_for_display(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = f64::from(intensity(image, x.into(), y.into()).unwrap_or(0));
        let shifted = pixel - prediction(image, x, y) + RESIDUAL_OFFSET;
        Luma([shifted.round().clamp(0.0, 255.0) as u8])
    })
}

/// Residual against the floored prediction, wrapped modulo 256
pub fn residual_for_encoding(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = intensity(image, x.into(), y.into()).unwrap_or(0);
        let predicted = prediction(image, x, y).floor() as u8;
        Luma([pixel.wrapping_sub(predicted)])
    })
}

/// Invert [`residual_for_encoding`], predicting from reconstructed pixels
pub fn reconstruct_from_residual(residual: &GrayImage) -> GrayImage {
    let (width, height) = residual.dimensions();
    let mut image = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let offset = intensity(residual, x.into(), y.into()).unwrap_or(0);
            let predicted = prediction(&image, x, y).floor() as u8;
            image.put_pixel(x, y, Luma([predicted.wrapping_add(offset)]));
        }
    }
    image
}

//! Sub-pixel sampling, quadrant swaps and intensity histograms

use crate::io::error::{Result, invalid_input, invalid_parameter};
use image::{GrayImage, Luma};

fn intensity(image: &GrayImage, x: u32, y: u32) -> f64 {
    image
        .get_pixel_checked(x, y)
        .map_or(0.0, |&Luma([value])| f64::from(value))
}

/// Intensity at a fractional position by bilinear interpolation
///
/// Along the right or bottom edge only one axis can be interpolated; the
/// bottom-right corner returns the pixel itself.
///
/// # Errors
///
/// Returns an error if `(x, y)` is not finite or lies outside the image
pub fn bilinear_interpolate(image: &GrayImage, x: f64, y: f64) -> Result<f64> {
    let (width, height) = image.dimensions();
    let inside = |value: f64, extent: u32| {
        value.is_finite() && value >= 0.0 && value <= f64::from(extent) - 1.0
    };
    if width == 0 || height == 0 || !inside(x, width) || !inside(y, height) {
        return Err(invalid_input(&format!(
            "({x}, {y}) lies outside the {width}x{height} image"
        )));
    }

    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = x1 + 1;
    let y2 = y1 + 1;
    let dx = x - f64::from(x1);
    let dy = y - f64::from(y1);

    let f11 = intensity(image, x1, y1);
    let past_right = x2 >= width;
    let past_bottom = y2 >= height;

    let value = match (past_right, past_bottom) {
        (true, true) => f11,
        (false, true) => dx.mul_add(intensity(image, x2, y1) - f11, f11),
        (true, false) => dy.mul_add(intensity(image, x1, y2) - f11, f11),
        (false, false) => {
            let f12 = intensity(image, x1, y2);
            let f21 = intensity(image, x2, y1);
            let f22 = intensity(image, x2, y2);
            f11 * (1.0 - dx) * (1.0 - dy)
                + f12 * (1.0 - dx) * dy
                + f21 * dx * (1.0 - dy)
                + f22 * dx * dy
        }
    };
    Ok(value)
}

/// Swap quadrants, moving index `(i, j)` by half the width and height
///
/// Applying this to every pixel of a Fourier spectrum moves the zero
/// frequency to the centre.
///
/// # Errors
///
/// Returns an error if `(i, j)` is outside `width` x `height`
pub fn flip_indices(i: usize, j: usize, width: usize, height: usize) -> Result<(usize, usize)> {
    if i >= width || j >= height {
        return Err(invalid_input(&format!(
            "({i}, {j}) lies outside {width}x{height}"
        )));
    }
    Ok(((i + width / 2) % width, (j + height / 2) % height))
}

/// One bin of an equal-width histogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    /// Midpoint of the bin
    pub center: f64,
    /// Number of values in the bin
    pub count: usize,
    /// Width of the bin
    pub width: f64,
}

/// Equal-width histogram over `[min, max]` of `values`
///
/// The maximum falls into the last bin. When every value is equal each bin
/// is one unit wide, starting at that value.
///
/// # Errors
///
/// Returns an error if `values` is empty, contains a non-finite number, or
/// `bins` is zero
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(invalid_parameter("bins", &bins, &"must be at least 1"));
    }
    if values.is_empty() {
        return Err(invalid_input(&"cannot build a histogram of no values"));
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(invalid_input(&"histogram values must be finite"));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut counts = vec![0usize; bins];
    for value in values {
        let bin = (((value - min) / width).floor() as usize).min(bins - 1);
        if let Some(count) = counts.get_mut(bin) {
            *count += 1;
        }
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            center: (index as f64 + 0.5).mul_add(width, min),
            count,
            width,
        })
        .collect())
}

/// Histogram of the grey levels of `image`
///
/// # Errors
///
/// Returns an error if the image is empty or `bins` is zero
pub fn image_histogram(image: &GrayImage, bins: usize) -> Result<Vec<HistogramBin>> {
    let values: Vec<f64> = image
        .pixels()
        .map(|&Luma([value])| f64::from(value))
        .collect();
    histogram(&values, bins)
}

//! Kernel convolution and the edge filters built on it

use crate::io::configuration::SOBEL_SCALE;
use crate::io::error::{Result, invalid_parameter};
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array2, arr2};

/// Horizontal Sobel kernel
pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Vertical Sobel kernel
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Four-neighbour Laplace kernel
pub const LAPLACE: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// Convert a greyscale image to a `[row, col]` array of intensities
pub fn image_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut array = Array2::zeros((height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let [value] = pixel.0;
        if let Some(cell) = array.get_mut([y as usize, x as usize]) {
            *cell = f64::from(value);
        }
    }
    array
}

/// Convert a `[row, col]` array to a greyscale image, clamping to 0..=255 and
/// rounding
pub fn array_to_image(array: &Array2<f64>) -> GrayImage {
    let (rows, cols) = array.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = array.get([y as usize, x as usize]).copied().unwrap_or(0.0);
        Luma([crop(value, 0.0, 255.0).round() as u8])
    })
}

/// Clamp `value` into `[low, high]`
pub fn crop(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Two-dimensional convolution with zero padding, divided by `scale`
///
/// The kernel is flipped, as in a true convolution, and the output has the
/// same shape as `array`, centred on the full convolution.
///
/// # Errors
///
/// Returns an error if the kernel is empty or `scale` is zero or not finite
pub fn convolve_2d(array: &Array2<f64>, kernel: &Array2<f64>, scale: f64) -> Result<Array2<f64>> {
    if kernel.is_empty() {
        return Err(invalid_parameter("kernel", &"[]", &"kernel must not be empty"));
    }
    if scale == 0.0 || !scale.is_finite() {
        return Err(invalid_parameter(
            "scale",
            &scale,
            &"must be finite and non-zero",
        ));
    }

    let (rows, cols) = array.dim();
    let (kernel_rows, kernel_cols) = kernel.dim();
    let row_offset = (kernel_rows as isize - 1) / 2;
    let col_offset = (kernel_cols as isize - 1) / 2;

    let mut result = Array2::zeros((rows, cols));
    for ((row, col), cell) in result.indexed_iter_mut() {
        let mut sum = 0.0;
        for ((m, n), weight) in kernel.indexed_iter() {
            let source_row = row as isize + row_offset - m as isize;
            let source_col = col as isize + col_offset - n as isize;
            if source_row < 0 || source_col < 0 {
                continue;
            }
            if let Some(value) = array.get([source_row as usize, source_col as usize]) {
                sum += value * weight;
            }
        }
        *cell = sum / scale;
    }
    Ok(result)
}

/// Linearly map the range of `array` onto `[low, high]`
///
/// A constant array maps entirely to `low`.
pub fn scale_array(array: &Array2<f64>, low: f64, high: f64) -> Array2<f64> {
    let min = array.iter().copied().fold(f64::INFINITY, f64::min);
    let max = array.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if array.is_empty() || range == 0.0 || !range.is_finite() {
        return Array2::from_elem(array.dim(), low);
    }
    let factor = (high - low) / range;
    array.mapv(|value| (value - min).mul_add(factor, low))
}

fn sobel_components(image: &GrayImage) -> Result<(Array2<f64>, Array2<f64>)> {
    let array = image_to_array(image);
    let gradient_x = convolve_2d(&array, &arr2(&SOBEL_X), SOBEL_SCALE)?;
    let gradient_y = convolve_2d(&array, &arr2(&SOBEL_Y), SOBEL_SCALE)?;
    Ok((gradient_x, gradient_y))
}

/// Sobel gradient magnitude, cropped to 0..=255 and stretched to fill it
///
/// # Errors
///
/// Returns an error if the convolution fails
pub fn gradient_magnitude(image: &GrayImage) -> Result<GrayImage> {
    let (gradient_x, gradient_y) = sobel_components(image)?;
    let mut magnitude = gradient_x;
    magnitude.zip_mut_with(&gradient_y, |gx, &gy| *gx = crop(gx.hypot(gy), 0.0, 255.0));
    Ok(array_to_image(&scale_array(&magnitude, 0.0, 255.0)))
}

/// Sobel gradient direction, `atan2(gy, gx)` stretched to 0..=255
///
/// # Errors
///
/// Returns an error if the convolution fails
pub fn gradient_direction(image: &GrayImage) -> Result<GrayImage> {
    let (gradient_x, gradient_y) = sobel_components(image)?;
    let mut direction = gradient_y;
    direction.zip_mut_with(&gradient_x, |gy, &gx| *gy = gy.atan2(gx));
    Ok(array_to_image(&scale_array(&direction, 0.0, 255.0)))
}

/// Raw Laplacian response
///
/// # Errors
///
/// Returns an error if the convolution fails
pub fn laplacian_array(image: &GrayImage) -> Result<Array2<f64>> {
    convolve_2d(&image_to_array(image), &arr2(&LAPLACE), SOBEL_SCALE)
}

/// Laplacian response stretched to 0..=255
///
/// # Errors
///
/// Returns an error if the convolution fails
pub fn laplacian_image(image: &GrayImage) -> Result<GrayImage> {
    let laplacian = laplacian_array(image)?;
    Ok(array_to_image(&scale_array(&laplacian, 0.0, 255.0)))
}

/// Per-pixel maximum of the gradient magnitudes of the three colour channels
///
/// # Errors
///
/// Returns an error if the convolution fails
pub fn color_gradient_magnitude(image: &RgbImage) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    let channel = |index: usize| {
        GrayImage::from_fn(width, height, |x, y| {
            let value = image
                .get_pixel_checked(x, y)
                .and_then(|pixel| pixel.0.get(index).copied())
                .unwrap_or(0);
            Luma([value])
        })
    };

    let mut combined = gradient_magnitude(&channel(0))?;
    for index in 1..3 {
        let magnitude = gradient_magnitude(&channel(index))?;
        for (lighter, other) in combined.pixels_mut().zip(magnitude.pixels()) {
            let [a] = lighter.0;
            let [b] = other.0;
            *lighter = Luma([a.max(b)]);
        }
    }
    Ok(combined)
}

/// Binary threshold: pixels above `value` become 255, the rest 0
pub fn threshold(image: &GrayImage, value: u8) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let [intensity] = pixel.0;
        *pixel = Luma([if intensity > value { 255 } else { 0 }]);
    }
    output
}

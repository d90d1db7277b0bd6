//! Tests for causal prediction residuals

#[cfg(test)]
mod tests {
    use grabbag::filters::residual::{
        prediction, reconstruct_from_residual, residual_for_display, residual_for_encoding,
    };
    use image::{GrayImage, Luma};

    // Tests predictions use only in-bounds causal neighbours
    // Verified by including the pixel below in the mean
    #[test]
    fn test_prediction_neighbours() {
        let image = GrayImage::from_raw(3, 2, vec![10, 20, 30, 40, 50, 60]).unwrap();
        assert!(prediction(&image, 0, 0).abs() < f64::EPSILON);
        assert!((prediction(&image, 1, 0) - 10.0).abs() < f64::EPSILON);
        assert!((prediction(&image, 0, 1) - 15.0).abs() < f64::EPSILON);
        assert!((prediction(&image, 1, 1) - 25.0).abs() < f64::EPSILON);
        assert!((prediction(&image, 2, 1) - 100.0 / 3.0).abs() < 1e-12);
    }

    // Tests display residuals centre on 128 for a flat image
    // Verified by omitting the offset
    #[test]
    fn test_display_flat_image() {
        let image = GrayImage::from_pixel(4, 3, Luma([100]));
        let residual = residual_for_display(&image);
        assert_eq!(residual.get_pixel(0, 0), &Luma([228]));
        assert_eq!(residual.get_pixel(2, 2), &Luma([128]));
        assert_eq!(residual.get_pixel(3, 0), &Luma([128]));
    }

    // Tests display residuals clamp at both ends
    // Verified by wrapping instead of clamping
    #[test]
    fn test_display_clamps() {
        let image = GrayImage::from_raw(2, 1, vec![255, 0]).unwrap();
        let residual = residual_for_display(&image);
        assert_eq!(residual.get_pixel(0, 0), &Luma([255]));
        assert_eq!(residual.get_pixel(1, 0), &Luma([0]));
    }

    // Tests encoding residuals wrap modulo 256
    // Verified by saturating the subtraction
    #[test]
    fn test_encoding_wraps() {
        let image = GrayImage::from_raw(2, 1, vec![200, 0]).unwrap();
        let residual = residual_for_encoding(&image);
        assert_eq!(residual.get_pixel(0, 0), &Luma([200]));
        assert_eq!(residual.get_pixel(1, 0), &Luma([56]));
    }

    // Tests reconstruction recovers the source image exactly
    // Verified by predicting from the residual instead of the rebuilt pixels
    #[test]
    fn test_reconstruction_is_exact() {
        let image = GrayImage::from_fn(9, 7, |x, y| {
            Luma([((x * 37 + y * 91 + x * y * 13) % 256) as u8])
        });
        let residual = residual_for_encoding(&image);
        assert_eq!(reconstruct_from_residual(&residual), image);
    }
}

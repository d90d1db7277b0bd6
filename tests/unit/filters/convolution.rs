//! Tests for kernel convolution and edge filters

#[cfg(test)]
mod tests {
    use grabbag::ToolError;
    use grabbag::filters::convolution::{
        SOBEL_X, array_to_image, color_gradient_magnitude, convolve_2d, crop,
        gradient_direction, gradient_magnitude, image_to_array, laplacian_array, laplacian_image,
        scale_array, threshold,
    };
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use ndarray::{Array2, arr2};

    fn ramp(width: u32, height: u32, step: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([x as u8 * step]))
    }

    // Tests arrays are indexed by row then column
    // Verified by swapping x and y when filling the array
    #[test]
    fn test_image_to_array_layout() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * y + x) as u8]));
        let array = image_to_array(&image);
        assert_eq!(array.dim(), (2, 3));
        assert_eq!(array.get([1, 2]), Some(&12.0));
        assert_eq!(array.get([0, 1]), Some(&1.0));
    }

    // Tests arrays are clamped and rounded on the way back to pixels
    // Verified by truncating instead of rounding
    #[test]
    fn test_array_to_image_clamps() {
        let array = arr2(&[[-5.0, 12.6], [300.0, 127.4]]);
        let image = array_to_image(&array);
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0), &Luma([0]));
        assert_eq!(image.get_pixel(1, 0), &Luma([13]));
        assert_eq!(image.get_pixel(0, 1), &Luma([255]));
        assert_eq!(image.get_pixel(1, 1), &Luma([127]));
    }

    // Tests crop clamps to both bounds
    // Verified by swapping min and max
    #[test]
    fn test_crop() {
        assert!((crop(-1.0, 0.0, 10.0) - 0.0).abs() < f64::EPSILON);
        assert!((crop(11.0, 0.0, 10.0) - 10.0).abs() < f64::EPSILON);
        assert!((crop(4.5, 0.0, 10.0) - 4.5).abs() < f64::EPSILON);
    }

    // Tests convolving an impulse reproduces the kernel unflipped
    // Verified by correlating instead of convolving
    #[test]
    fn test_convolve_impulse() {
        let mut impulse = Array2::zeros((5, 5));
        if let Some(centre) = impulse.get_mut([2, 2]) {
            *centre = 1.0;
        }
        let kernel = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let result = convolve_2d(&impulse, &kernel, 1.0).unwrap();

        assert_eq!(result.dim(), (5, 5));
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(result.get([row + 1, col + 1]), kernel.get([row, col]));
            }
        }
        assert_eq!(result.get([0, 0]), Some(&0.0));
    }

    // Tests the horizontal Sobel response of a ramp inside the image
    // Verified by dividing by the kernel weight sum instead of the scale
    #[test]
    fn test_convolve_sobel_on_ramp() {
        let array = image_to_array(&ramp(5, 5, 10));
        let result = convolve_2d(&array, &arr2(&SOBEL_X), 8.0).unwrap();
        for row in 1..4 {
            for col in 1..4 {
                let value = result.get([row, col]).copied().unwrap();
                assert!((value + 10.0).abs() < 1e-12, "({row}, {col}) = {value}");
            }
        }
    }

    // Tests invalid kernels and scales
    // Verified by dividing by a zero scale
    #[test]
    fn test_convolve_validation() {
        let array = Array2::zeros((3, 3));
        assert!(matches!(
            convolve_2d(&array, &Array2::zeros((0, 0)), 1.0),
            Err(ToolError::InvalidParameter { .. })
        ));
        assert!(convolve_2d(&array, &arr2(&SOBEL_X), 0.0).is_err());
        assert!(convolve_2d(&array, &arr2(&SOBEL_X), f64::NAN).is_err());
    }

    // Tests linear rescaling onto an offset range
    // Verified by omitting the lower bound from the mapping
    #[test]
    fn test_scale_array() {
        let array = arr2(&[[1.0, 3.0, 5.0]]);
        let unit = scale_array(&array, 0.0, 1.0);
        assert_eq!(unit, arr2(&[[0.0, 0.5, 1.0]]));

        let offset = scale_array(&array, 10.0, 20.0);
        assert_eq!(offset, arr2(&[[10.0, 15.0, 20.0]]));

        let constant = scale_array(&arr2(&[[7.0, 7.0]]), 2.0, 9.0);
        assert_eq!(constant, arr2(&[[2.0, 2.0]]));
    }

    // Tests the gradient magnitude lights up the step edge
    // Verified by skipping the final stretch to 0..=255
    #[test]
    fn test_gradient_magnitude_step_edge() {
        let image = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 0 } else { 200 }]));
        let magnitude = gradient_magnitude(&image).unwrap();
        assert_eq!(magnitude.dimensions(), (8, 8));
        assert_eq!(magnitude.pixels().map(|&Luma([v])| v).max(), Some(255));
        assert_eq!(magnitude.pixels().map(|&Luma([v])| v).min(), Some(0));
        let Luma([flat]) = *magnitude.get_pixel(1, 4);
        let Luma([edge]) = *magnitude.get_pixel(4, 4);
        assert!(flat < edge);
    }

    // Tests a blank image has no gradient anywhere
    // Verified by mapping a constant array to the upper bound
    #[test]
    fn test_gradient_blank_image() {
        let image = GrayImage::new(6, 4);
        assert!(gradient_magnitude(&image).unwrap().pixels().all(|&Luma([v])| v == 0));
        assert!(gradient_direction(&image).unwrap().pixels().all(|&Luma([v])| v == 0));
        assert!(laplacian_image(&image).unwrap().pixels().all(|&Luma([v])| v == 0));
    }

    // Tests the Laplacian vanishes on the interior of a linear ramp
    // Verified by using a centre weight of -8
    #[test]
    fn test_laplacian_of_ramp() {
        let laplacian = laplacian_array(&ramp(6, 6, 20)).unwrap();
        for row in 1..5 {
            for col in 1..5 {
                let value = laplacian.get([row, col]).copied().unwrap();
                assert!(value.abs() < 1e-12, "({row}, {col}) = {value}");
            }
        }
    }

    // Tests the colour gradient takes the strongest channel
    // Verified by averaging the channels
    #[test]
    fn test_color_gradient_uses_strongest_channel() {
        let colour = RgbImage::from_fn(8, 8, |x, _| Rgb([if x < 4 { 0 } else { 200 }, 0, 0]));
        let red = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 0 } else { 200 }]));
        assert_eq!(
            color_gradient_magnitude(&colour).unwrap(),
            gradient_magnitude(&red).unwrap()
        );
    }

    // Tests thresholding is strictly above the cut
    // Verified by using greater-or-equal
    #[test]
    fn test_threshold() {
        let image = GrayImage::from_raw(3, 1, vec![127, 128, 129]).unwrap();
        let binary = threshold(&image, 128);
        assert_eq!(binary.into_raw(), vec![0, 0, 255]);
    }
}

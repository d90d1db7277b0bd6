//! Greyscale image filters over `ndarray` arrays and `image` buffers

/// Convolution kernels, gradients, Laplacian and thresholding
pub mod convolution;
/// Neighbour-prediction residual images
pub mod residual;
/// Interpolation, index flipping and histograms
pub mod sampling;

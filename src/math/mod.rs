//! Mathematical utilities shared across the toolbox

/// Log-space arithmetic, error function and random draws
pub mod probability;
/// Log-gamma and related special functions
pub mod special;
/// Small dense vector type
pub mod vector;

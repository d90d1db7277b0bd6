//! Text processing utilities

/// Beta Code to Greek transliteration
pub mod betacode;
/// Bracketed parse trees
pub mod tree;

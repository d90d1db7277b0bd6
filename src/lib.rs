//! A grab bag of small utilities: Metropolis-Hastings sampling over a graph
//! of random variables, permutation tests and counters, greyscale image
//! filters, Beta Code transliteration and bracketed tree parsing.
//!
//! The modules are independent of one another apart from the shared math
//! helpers, error type and file helpers under [`io`].

#![forbid(unsafe_code)]

/// Statistics, permutation tests, counters and batch logs
pub mod analysis;
/// Convolution, residual and sampling filters for greyscale images
pub mod filters;
/// Input/output, configuration, logging and error handling
pub mod io;
/// Special functions, probability helpers and dense vectors
pub mod math;
/// Metropolis-Hastings node graph and sampler
pub mod mcmc;
/// Beta Code and parse tree utilities
pub mod text;

pub use io::error::{Result, ToolError};

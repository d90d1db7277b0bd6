//! Metropolis-Hastings sampling over a graph of conditional distributions

/// Densities with resolved parameters
pub mod density;
/// Node arena, likelihoods and single-site updates
pub mod model;
/// Node, distribution and function types
pub mod node;
/// Sweeping sampler and trace summaries
pub mod sampler;

//! Toolbox constants and runtime configuration defaults

// Sampler settings
/// Standard deviation of the random-walk proposal for new nodes
pub const DEFAULT_SAMPLE_STDDEV: f64 = 0.2;
/// Number of samples between progress log messages
pub const DEFAULT_OUTPUT_RATE: usize = 500;
/// Samples kept by the `sample` subcommand
pub const DEFAULT_NUM_SAMPLES: usize = 5_000;
/// Sweeps discarded before samples are kept
pub const DEFAULT_BURN_IN: usize = 500;

// Numerics
/// Below this log-ratio the smaller term of a log-sum is dropped
pub const LOG_SUM_CUTOFF: f64 = -50.0;
/// Shuffles per data point when no sample count is given
pub const PERMUTATION_SAMPLES_PER_ITEM: usize = 25;
// 2^30 sign patterns is already minutes of work
/// Largest paired sample enumerated exactly
pub const MAX_PAIRED_PERMUTATION_ITEMS: usize = 30;

// Image filters
/// Normalisation applied to Sobel and Laplace responses
pub const SOBEL_SCALE: f64 = 8.0;
/// Grey level that represents a zero residual in display images
pub const RESIDUAL_OFFSET: f64 = 128.0;
/// Default number of histogram buckets
pub const DEFAULT_HISTOGRAM_BINS: usize = 32;
/// Default cutoff for the threshold filter
pub const DEFAULT_THRESHOLD: u8 = 128;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

// Default values for configurable parameters
/// Fixed seed for reproducible runs
pub const DEFAULT_SEED: u64 = 42;

// Output settings
/// Separator between the input stem and the filter name in output files
pub const FILTERED_SUFFIX_SEPARATOR: &str = "_";
/// Field separator for TSV files
pub const TSV_SEPARATOR: char = '\t';

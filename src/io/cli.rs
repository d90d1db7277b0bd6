//! Command-line interface: one subcommand per utility

use crate::analysis::statistics::{
    entropy, h_index, mean_permutation_test, paired_permutation_test,
};
use crate::filters::convolution::{
    color_gradient_magnitude, gradient_direction, gradient_magnitude, laplacian_image, threshold,
};
use crate::filters::residual::{reconstruct_from_residual, residual_for_display, residual_for_encoding};
use crate::filters::sampling::image_histogram;
use crate::io::configuration::{
    DEFAULT_BURN_IN, DEFAULT_HISTOGRAM_BINS, DEFAULT_NUM_SAMPLES, DEFAULT_OUTPUT_RATE,
    DEFAULT_SEED, DEFAULT_THRESHOLD, FILTERED_SUFFIX_SEPARATOR, TSV_SEPARATOR,
};
use crate::io::error::{Result, WithPath, invalid_input};
use crate::io::image::{load_gray, load_rgb, save_gray};
use crate::io::logging::Verbosity;
use crate::io::progress::{ProgressManager, sampling_bar};
use crate::io::tsv::{create_dirs_and_open, read_dict_from_tsv, read_numbers, write_rows};
use crate::mcmc::model::{NormalPrior, normal_model};
use crate::mcmc::sampler::{Sampler, posterior_summary};
use crate::text::betacode::convert_reader;
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::GrayImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "grabbag")]
#[command(author, version, about = "A grab bag of text, image and statistics utilities")]
/// Command-line arguments shared by every subcommand
pub struct Cli {
    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Report per-step detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Utility to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging verbosity selected by the flags
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Available utilities
#[derive(Subcommand)]
pub enum Command {
    /// Transliterate a Beta Code file into Greek
    Betacode(BetacodeArgs),
    /// Apply an image filter to a PNG file or a directory of them
    Filter(FilterArgs),
    /// Write the grey-level histogram of an image as TSV
    Histogram(HistogramArgs),
    /// Permutation test for a difference in means
    Permutation(PermutationArgs),
    /// Entropy and h-index of a key/probability table
    Entropy(EntropyArgs),
    /// Sample the mean and variance of normally distributed data
    Sample(SampleArgs),
}

/// Arguments for `betacode`
#[derive(Args)]
pub struct BetacodeArgs {
    /// Beta Code input file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Write Greek here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Image filters selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterKind {
    /// Sobel gradient magnitude
    Sobel,
    /// Sobel gradient direction
    Direction,
    /// Laplacian
    Laplacian,
    /// Maximum gradient magnitude over the colour channels
    ColorSobel,
    /// Binary threshold
    Threshold,
    /// Prediction residual for viewing
    Residual,
    /// Reconstruct an image from its encoded residual
    Unresidual,
}

impl FilterKind {
    /// Name appended to output file stems
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Sobel => "sobel",
            Self::Direction => "direction",
            Self::Laplacian => "laplacian",
            Self::ColorSobel => "color-sobel",
            Self::Threshold => "threshold",
            Self::Residual => "residual",
            Self::Unresidual => "unresidual",
        }
    }
}

/// Arguments for `filter`
#[derive(Args)]
pub struct FilterArgs {
    /// Input PNG file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Filter to apply
    #[arg(short, long, value_enum)]
    pub kind: FilterKind,

    /// Cutoff for the threshold filter
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u8,

    /// Write the encodable residual instead of the display one
    #[arg(short, long)]
    pub encode: bool,

    /// Process files even if output exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl FilterArgs {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }
}

/// Arguments for `histogram`
#[derive(Args)]
pub struct HistogramArgs {
    /// Image to summarise
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Number of equal-width bins
    #[arg(short, long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,

    /// Write rows here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `permutation`
#[derive(Args)]
pub struct PermutationArgs {
    /// First sample, one number per line
    #[arg(value_name = "FILE_A")]
    pub first: PathBuf,

    /// Second sample, one number per line
    #[arg(value_name = "FILE_B")]
    pub second: PathBuf,

    /// Run the exact paired test instead of random relabelling
    #[arg(short, long)]
    pub paired: bool,

    /// Number of shuffles (defaults to 25 per data point)
    #[arg(long)]
    pub samples: Option<usize>,

    /// Random seed for reproducible shuffles
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

/// Arguments for `entropy`
#[derive(Args)]
pub struct EntropyArgs {
    /// TSV of `key<TAB>probability` rows
    #[arg(value_name = "TSV")]
    pub table: PathBuf,
}

/// Arguments for `sample`
#[derive(Args)]
pub struct SampleArgs {
    /// Observations, one number per line
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Samples to keep
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_SAMPLES)]
    pub samples: usize,

    /// Sweeps discarded before keeping samples
    #[arg(short, long, default_value_t = DEFAULT_BURN_IN)]
    pub burn_in: usize,

    /// Random seed for reproducible chains
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Log every this many sweeps
    #[arg(long, default_value_t = DEFAULT_OUTPUT_RATE)]
    pub output_rate: usize,

    /// TSV file for the kept samples
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Run the selected subcommand
///
/// # Errors
///
/// Returns the first error raised by the subcommand
pub fn run(cli: Cli) -> Result<()> {
    let show_progress = cli.should_show_progress();
    match cli.command {
        Command::Betacode(args) => run_betacode(&args),
        Command::Filter(args) => FileProcessor::new(args, show_progress).process(),
        Command::Histogram(args) => run_histogram(&args),
        Command::Permutation(args) => run_permutation(&args),
        Command::Entropy(args) => run_entropy(&args),
        Command::Sample(args) => run_sample(&args, show_progress),
    }
}

fn run_betacode(args: &BetacodeArgs) -> Result<()> {
    let input = File::open(&args.input).with_path(&args.input, "open")?;
    let reader = BufReader::new(input);
    let lines = match &args.output {
        Some(path) => {
            let mut writer = create_dirs_and_open(path)?;
            let lines = convert_reader(reader, &mut writer)?;
            writer.flush().with_path(path, "write")?;
            lines
        }
        None => convert_reader(reader, &mut std::io::stdout().lock())?,
    };
    info!(lines, "Converted {}", args.input.display());
    Ok(())
}

fn run_histogram(args: &HistogramArgs) -> Result<()> {
    let image = load_gray(&args.image)?;
    let bins = image_histogram(&image, args.bins)?;
    let rows = bins
        .iter()
        .map(|bin| [bin.center.to_string(), bin.count.to_string(), bin.width.to_string()]);
    match &args.output {
        Some(path) => write_rows(path, rows),
        None => {
            let mut stdout = std::io::stdout().lock();
            for row in rows {
                writeln!(stdout, "{}", row.join(&TSV_SEPARATOR.to_string()))?;
            }
            Ok(())
        }
    }
}

fn run_permutation(args: &PermutationArgs) -> Result<()> {
    let first = read_numbers(&args.first)?;
    let second = read_numbers(&args.second)?;
    let p_value = if args.paired {
        paired_permutation_test(&first, &second, None)?
    } else {
        let mut rng = StdRng::seed_from_u64(args.seed);
        mean_permutation_test(&first, &second, args.samples, &mut rng)?
    };
    writeln!(std::io::stdout().lock(), "{p_value}")?;
    Ok(())
}

fn run_entropy(args: &EntropyArgs) -> Result<()> {
    let table = read_dict_from_tsv(&args.table, TSV_SEPARATOR)?;
    let mut entries: Vec<(&String, &String)> = table.iter().collect();
    entries.sort();
    let distribution = entries
        .into_iter()
        .map(|(key, value)| {
            value.trim().parse::<f64>().map_err(|error| {
                invalid_input(&format!("probability for '{key}' is '{value}': {error}"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let total: f64 = distribution.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        warn!(total, "Probabilities do not sum to one");
    }
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "entropy\t{}", entropy(&distribution))?;
    writeln!(stdout, "h_index\t{}", h_index(&distribution))?;
    Ok(())
}

fn run_sample(args: &SampleArgs, show_progress: bool) -> Result<()> {
    let data = read_numbers(&args.data)?;
    let built = normal_model(&data, NormalPrior::default())?;
    let nodes = vec![built.mean, built.variance];
    let rng = StdRng::seed_from_u64(args.seed);
    let mut sampler = Sampler::new(built.model, nodes, rng)?.with_output_rate(args.output_rate)?;

    let total = args.burn_in + args.samples;
    let bar = show_progress.then(|| sampling_bar(total));
    let mut kept = Vec::with_capacity(args.samples);
    for sweep in 0..total {
        let sample = sampler.try_next()?;
        if sweep >= args.burn_in {
            kept.push(sample);
        }
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let names = [built.mean, built.variance]
        .into_iter()
        .map(|id| -> Result<String> { Ok(sampler.model().node(id)?.name().to_string()) })
        .collect::<Result<Vec<String>>>()?;
    let rows = std::iter::once(names).chain(
        kept.iter()
            .map(|sample| sample.values().map(|value| value.to_string()).collect()),
    );
    write_rows(&args.output, rows)?;

    if kept.is_empty() {
        warn!("No samples kept; skipping the posterior summary");
    } else {
        for id in [built.mean, built.variance] {
            let node = sampler.model().node(id)?;
            let summary = posterior_summary(&kept, node.name())?;
            info!(
                node = node.name(),
                mean = summary.mean,
                variance = summary.variance,
                min = summary.min,
                max = summary.max,
                acceptance = node.stats().acceptance_rate(),
                "Posterior summary"
            );
        }
    }
    info!(samples = kept.len(), "Wrote {}", args.output.display());
    Ok(())
}

/// Batch filtering of PNG files with progress tracking
pub struct FileProcessor {
    args: FilterArgs,
    progress_manager: Option<ProgressManager>,
}

// Load, filter and save
const FILTER_STEPS: usize = 3;

impl FileProcessor {
    /// Create a processor for the given filter arguments
    pub fn new(args: FilterArgs, show_progress: bool) -> Self {
        let progress_manager = show_progress.then(ProgressManager::new);
        Self {
            args,
            progress_manager,
        }
    }

    /// Filter every selected file
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid or a file fails to process
    pub fn process(&mut self) -> Result<()> {
        let files = self.collect_files()?;
        if files.is_empty() {
            info!("Nothing to process");
            return Ok(());
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }
        for (index, file) in files.iter().enumerate() {
            self.process_file(file, index)?;
        }
        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }
        info!(files = files.len(), kind = self.args.kind.suffix(), "Filtering complete");
        Ok(())
    }

    /// Files under the target that would be processed, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a PNG file nor a directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.args.target;
        if target.is_file() {
            if !is_png(target) {
                return Err(invalid_input(&"Target file must be a PNG image"));
            }
            return Ok(if self.should_process_file(target) {
                vec![target.clone()]
            } else {
                Vec::new()
            });
        }
        if !target.is_dir() {
            return Err(invalid_input(&"Target must be a PNG file or directory"));
        }

        let suffix = self.output_suffix();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(target).with_path(target, "read directory")? {
            let path = entry.with_path(target, "read directory")?.path();
            let is_own_output = path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy().ends_with(&suffix));
            if is_png(&path) && !is_own_output && self.should_process_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.args.skip_existing() {
            return true;
        }
        let output_path = self.output_path(input_path);
        if output_path.exists() {
            info!("Skipping: {} (output exists)", input_path.display());
            false
        } else {
            true
        }
    }

    fn process_file(&mut self, input_path: &Path, index: usize) -> Result<()> {
        let output_path = self.output_path(input_path);
        if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path, FILTER_STEPS);
        }

        let filtered = match self.args.kind {
            FilterKind::Sobel => gradient_magnitude(&self.load_input(input_path, index)?)?,
            FilterKind::Direction => gradient_direction(&self.load_input(input_path, index)?)?,
            FilterKind::Laplacian => laplacian_image(&self.load_input(input_path, index)?)?,
            FilterKind::ColorSobel => {
                let image = load_rgb(input_path)?;
                self.step(index, 1);
                color_gradient_magnitude(&image)?
            }
            FilterKind::Threshold => {
                threshold(&self.load_input(input_path, index)?, self.args.threshold)
            }
            FilterKind::Residual => {
                let image = self.load_input(input_path, index)?;
                if self.args.encode {
                    residual_for_encoding(&image)
                } else {
                    residual_for_display(&image)
                }
            }
            FilterKind::Unresidual => {
                reconstruct_from_residual(&self.load_input(input_path, index)?)
            }
        };
        self.step(index, 2);

        save_gray(&filtered, &output_path)?;
        debug!("Wrote {}", output_path.display());
        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file(index);
        }
        Ok(())
    }

    fn load_input(&mut self, input_path: &Path, index: usize) -> Result<GrayImage> {
        let image = load_gray(input_path)?;
        self.step(index, 1);
        Ok(image)
    }

    fn step(&mut self, index: usize, step: usize) {
        if let Some(ref mut pm) = self.progress_manager {
            pm.update_step(index, step);
        }
    }

    fn output_suffix(&self) -> String {
        format!("{FILTERED_SUFFIX_SEPARATOR}{}", self.args.kind.suffix())
    }

    /// Output path for `input_path`: `<stem>_<kind>.png` beside the input
    pub fn output_path(&self, input_path: &Path) -> PathBuf {
        let stem = input_path.file_stem().unwrap_or_default();
        let output_name = format!("{}{}.png", stem.to_string_lossy(), self.output_suffix());
        input_path.with_file_name(output_name)
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("png"))
}

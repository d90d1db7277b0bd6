//! Sweeping samplers over a model and summaries of their traces

use crate::io::configuration::DEFAULT_OUTPUT_RATE;
use crate::io::error::{Result, ToolError, invalid_input, invalid_parameter};
use crate::mcmc::model::Model;
use crate::mcmc::node::NodeId;
use rand::Rng;
use tracing::{debug, info};

/// Values of the swept nodes after one sweep, in sweep order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    values: Vec<(String, f64)>,
}

impl Sample {
    /// Value recorded for the named node
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|&(_, value)| value)
    }

    /// Node names in sweep order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// Recorded values in sweep order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(|&(_, value)| value)
    }

    /// Number of recorded nodes
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was recorded
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Sample {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Repeatedly sweeps a fixed list of nodes with single-site updates
///
/// As an iterator it never ends on its own; use `take` or [`Sampler::run`].
/// The iterator stops at the first error, which is then available from
/// [`Sampler::last_error`].
pub struct Sampler<R: Rng> {
    model: Model,
    nodes: Vec<NodeId>,
    rng: R,
    output_rate: usize,
    iteration: usize,
    last_error: Option<ToolError>,
}

impl<R: Rng> Sampler<R> {
    /// Create a sampler that sweeps `nodes` in the given order
    ///
    /// # Errors
    ///
    /// Returns an error if no nodes are given or one does not exist in the
    /// model
    pub fn new(model: Model, nodes: Vec<NodeId>, rng: R) -> Result<Self> {
        if nodes.is_empty() {
            return Err(invalid_input(&"a sampler needs at least one node"));
        }
        for &id in &nodes {
            model.node(id)?;
        }
        info!(nodes = nodes.len(), "Starting the sampler");
        Ok(Self {
            model,
            nodes,
            rng,
            output_rate: DEFAULT_OUTPUT_RATE,
            iteration: 0,
            last_error: None,
        })
    }

    /// Log progress every `rate` samples instead of the default
    ///
    /// # Errors
    ///
    /// Returns an error if `rate` is zero
    pub fn with_output_rate(mut self, rate: usize) -> Result<Self> {
        if rate == 0 {
            return Err(invalid_parameter(
                "output_rate",
                &rate,
                &"must be at least 1",
            ));
        }
        self.output_rate = rate;
        Ok(self)
    }

    /// Sweep every node once and record the result
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be updated
    pub fn try_next(&mut self) -> Result<Sample> {
        self.iteration += 1;
        if self.iteration % self.output_rate == 0 {
            info!(iteration = self.iteration, "Yielding the {}th sample", self.iteration);
        }

        let mut values = Vec::with_capacity(self.nodes.len());
        for &id in &self.nodes {
            let value = self.model.sample_node(id, &mut self.rng)?;
            values.push((self.model.node(id)?.name().to_string(), value));
        }
        Ok(Sample { values })
    }

    /// Discard `burn_in` sweeps, then collect `count` samples
    ///
    /// # Errors
    ///
    /// Returns the first error raised while sweeping
    pub fn run(&mut self, count: usize, burn_in: usize) -> Result<Vec<Sample>> {
        for _ in 0..burn_in {
            self.try_next()?;
        }
        debug!(burn_in, "Burn-in complete");
        (0..count).map(|_| self.try_next()).collect()
    }

    /// Number of sweeps performed so far
    pub const fn iteration(&self) -> usize {
        self.iteration
    }

    /// The model in its current state
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Error that stopped iteration, if any
    pub const fn last_error(&self) -> Option<&ToolError> {
        self.last_error.as_ref()
    }

    /// Give back the model
    pub fn into_model(self) -> Model {
        self.model
    }
}

impl<R: Rng> Iterator for Sampler<R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.last_error.is_some() {
            return None;
        }
        match self.try_next() {
            Ok(sample) => Some(sample),
            Err(error) => {
                self.last_error = Some(error);
                None
            }
        }
    }
}

/// Moments and range of one node's trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSummary {
    /// Number of samples summarised
    pub count: usize,
    /// Sample mean
    pub mean: f64,
    /// Unbiased sample variance (zero for a single sample)
    pub variance: f64,
    /// Smallest sampled value
    pub min: f64,
    /// Largest sampled value
    pub max: f64,
}

/// Summarise the trace of the named node
///
/// # Errors
///
/// Returns an error if there are no samples or a sample lacks the node
pub fn posterior_summary(samples: &[Sample], name: &str) -> Result<TraceSummary> {
    let trace = samples
        .iter()
        .map(|sample| {
            sample
                .get(name)
                .ok_or_else(|| invalid_input(&format!("sample has no value for '{name}'")))
        })
        .collect::<Result<Vec<f64>>>()?;
    if trace.is_empty() {
        return Err(invalid_input(&"cannot summarise an empty trace"));
    }

    let count = trace.len();
    let mean = trace.iter().sum::<f64>() / count as f64;
    let variance = if count > 1 {
        trace.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64
    } else {
        0.0
    };
    let min = trace.iter().copied().fold(f64::INFINITY, f64::min);
    let max = trace.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(TraceSummary {
        count,
        mean,
        variance,
        min,
        max,
    })
}

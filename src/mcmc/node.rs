//! Node types for the Metropolis-Hastings graph
//!
//! Nodes live in an arena owned by [`crate::mcmc::model::Model`] and refer to
//! one another by [`NodeId`]. Parent references are fixed when a node is
//! built; child references are back-edges appended as later nodes are wired
//! in, so the graph is acyclic by construction.

use crate::io::configuration::DEFAULT_SAMPLE_STDDEV;
use std::collections::HashMap;
use std::fmt;

/// Index of a node inside its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the model's arena
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Conditional distribution of a stochastic node given its parents
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// Normal with the given mean and variance
    Normal {
        /// Node holding the mean
        mean: NodeId,
        /// Node holding the variance
        variance: NodeId,
    },
    /// Normal truncated to the positive half-line
    NonNegativeNormal {
        /// Node holding the untruncated mean
        mean: NodeId,
        /// Node holding the untruncated variance
        variance: NodeId,
    },
    /// Gamma in shape/rate form
    Gamma {
        /// Node holding the shape
        shape: NodeId,
        /// Node holding the rate (inverse scale)
        inv_scale: NodeId,
    },
    /// Inverse gamma in shape/scale form
    InvGamma {
        /// Node holding the shape
        shape: NodeId,
        /// Node holding the scale
        scale: NodeId,
    },
    /// Poisson counts
    Poisson {
        /// Node holding the rate
        rate: NodeId,
    },
    /// Beta on the unit interval
    Beta {
        /// Node holding the first shape parameter
        alpha: NodeId,
        /// Node holding the second shape parameter
        beta: NodeId,
    },
    /// Single 0/1 trial
    Bernoulli {
        /// Node holding the success probability
        p: NodeId,
    },
    /// 0/1 trial whose success probability is chosen by binary parents
    ///
    /// `table` maps the parents' values, in `parents` order, to the node that
    /// holds the success probability for that case.
    ConditionalBernoulli {
        /// Binary parents consulted for the case
        parents: Vec<NodeId>,
        /// Success probability node per parent case
        table: HashMap<Vec<bool>, NodeId>,
    },
    /// Count of successes out of a number of trials
    Binomial {
        /// Node holding the number of trials
        trials: NodeId,
        /// Node holding the success probability
        p: NodeId,
    },
}

impl Distribution {
    /// Every node this distribution reads, in a stable order
    pub fn parents(&self) -> Vec<NodeId> {
        match self {
            Self::Normal { mean, variance } | Self::NonNegativeNormal { mean, variance } => {
                vec![*mean, *variance]
            }
            Self::Gamma { shape, inv_scale } => vec![*shape, *inv_scale],
            Self::InvGamma { shape, scale } => vec![*shape, *scale],
            Self::Poisson { rate } => vec![*rate],
            Self::Beta { alpha, beta } => vec![*alpha, *beta],
            Self::Bernoulli { p } => vec![*p],
            Self::ConditionalBernoulli { parents, table } => {
                let mut probabilities: Vec<NodeId> = table.values().copied().collect();
                probabilities.sort_unstable();
                probabilities.dedup();
                let mut all = parents.clone();
                all.extend(probabilities.into_iter().filter(|id| !parents.contains(id)));
                all
            }
            Self::Binomial { trials, p } => vec![*trials, *p],
        }
    }

    /// Binary nodes are updated with an exact Gibbs flip instead of a random walk
    pub const fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::Bernoulli { .. } | Self::ConditionalBernoulli { .. }
        )
    }

    /// Integer-valued nodes round their random-walk proposals
    pub const fn is_discrete(&self) -> bool {
        matches!(self, Self::Poisson { .. } | Self::Binomial { .. })
    }

    /// Short name used in log messages and errors
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::NonNegativeNormal { .. } => "non-negative normal",
            Self::Gamma { .. } => "gamma",
            Self::InvGamma { .. } => "inverse gamma",
            Self::Poisson { .. } => "poisson",
            Self::Beta { .. } => "beta",
            Self::Bernoulli { .. } => "bernoulli",
            Self::ConditionalBernoulli { .. } => "conditional bernoulli",
            Self::Binomial { .. } => "binomial",
        }
    }
}

/// Function nodes combine their parents' values deterministically
///
/// They usually stand in for a single parameter of one downstream node, so
/// they are expected to have exactly one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deterministic {
    /// Value of `choices[selector]`
    Selector {
        /// Candidate nodes
        choices: Vec<NodeId>,
        /// Node whose value indexes into `choices`
        selector: NodeId,
    },
    /// Sum of the parents
    Adder {
        /// Summed nodes
        parents: Vec<NodeId>,
    },
    /// Product of the parents
    Multiplier {
        /// Multiplied nodes
        parents: Vec<NodeId>,
    },
    /// `base` raised to `exponent`
    Exponent {
        /// Node holding the base
        base: NodeId,
        /// Node holding the exponent
        exponent: NodeId,
    },
}

impl Deterministic {
    /// Every node this function reads
    pub fn parents(&self) -> Vec<NodeId> {
        match self {
            Self::Selector { choices, selector } => {
                let mut all = choices.clone();
                all.push(*selector);
                all
            }
            Self::Adder { parents } | Self::Multiplier { parents } => parents.clone(),
            Self::Exponent { base, exponent } => vec![*base, *exponent],
        }
    }
}

/// What a node is and how its value is obtained
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Fixed value with no distribution
    Constant,
    /// Random variable with a conditional distribution
    Stochastic(Distribution),
    /// Value derived from parents on demand
    Function(Deterministic),
}

/// Per-node record of proposal outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceStats {
    /// Updates attempted
    pub proposed: usize,
    /// Updates that moved to the proposed value
    pub accepted: usize,
    /// Proposals rejected without evaluation because they left the support
    pub out_of_support: usize,
}

impl AcceptanceStats {
    /// Fraction of attempted updates that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.proposed as f64
    }
}

/// A single vertex of the graph
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) value: f64,
    pub(crate) observed: bool,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
    pub(crate) proposal_stddev: f64,
    pub(crate) stats: AcceptanceStats,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, value: f64, observed: bool, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            value,
            observed,
            kind,
            children: Vec::new(),
            proposal_stddev: DEFAULT_SAMPLE_STDDEV,
            stats: AcceptanceStats::default(),
        }
    }

    /// Name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the node's value is fixed data
    pub const fn is_observed(&self) -> bool {
        self.observed
    }

    /// Node kind and distribution
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Nodes that read this node, in the order they were built
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Nodes this node reads
    pub fn parents(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Constant => Vec::new(),
            NodeKind::Stochastic(distribution) => distribution.parents(),
            NodeKind::Function(function) => function.parents(),
        }
    }

    /// Standard deviation of the random-walk proposal
    pub const fn proposal_stddev(&self) -> f64 {
        self.proposal_stddev
    }

    /// Proposal outcomes so far
    pub const fn stats(&self) -> AcceptanceStats {
        self.stats
    }
}

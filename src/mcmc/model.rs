//! The node arena, conditional likelihoods and single-site updates

use crate::io::error::{Result, ToolError, invalid_input, invalid_parameter, model_error};
use crate::math::probability::{log_sum, normal_draw, uniform_log};
use crate::mcmc::density::Density;
use crate::mcmc::node::{Deterministic, Distribution, Node, NodeId, NodeKind};
use rand::Rng;
use std::collections::HashMap;

/// Boxed density function over a node's support
pub type DensityFn = Box<dyn Fn(f64) -> f64>;

/// A directed graph of random variables
///
/// Nodes are added parents-first; every builder registers the new node as a
/// child of each node it reads.
#[derive(Debug, Clone, Default)]
pub struct Model {
    nodes: Vec<Node>,
}

impl Model {
    /// Create an empty model
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes in the model
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the model has no nodes
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over node ids in construction order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Borrow a node
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this model
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| model_error(&id.to_string(), &"no such node in this model"))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| model_error(&id.to_string(), &"no such node in this model"))
    }

    /// Look up a node by name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    fn insert(&mut self, node: Node) -> Result<NodeId> {
        let id = NodeId(self.nodes.len());
        let parents = node.parents();
        for parent in &parents {
            if parent.0 >= self.nodes.len() {
                return Err(model_error(
                    &node.name,
                    &format!("parent {parent} does not exist"),
                ));
            }
        }
        self.nodes.push(node);
        for parent in parents {
            self.node_mut(parent)?.children.push(id);
        }
        Ok(id)
    }

    /// Add a node with a fixed value
    ///
    /// # Errors
    ///
    /// Construction of a constant cannot fail; the result type keeps the
    /// builders uniform
    pub fn constant(&mut self, name: &str, value: f64) -> Result<NodeId> {
        self.insert(Node::new(name, value, true, NodeKind::Constant))
    }

    /// Add a random variable
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter node does not exist
    pub fn stochastic(
        &mut self,
        name: &str,
        initial: f64,
        distribution: Distribution,
        observed: bool,
    ) -> Result<NodeId> {
        self.insert(Node::new(
            name,
            initial,
            observed,
            NodeKind::Stochastic(distribution),
        ))
    }

    /// Add a deterministic function of other nodes
    ///
    /// # Errors
    ///
    /// Returns an error if any input node does not exist
    pub fn function(&mut self, name: &str, function: Deterministic) -> Result<NodeId> {
        self.insert(Node::new(name, f64::NAN, false, NodeKind::Function(function)))
    }

    /// Add a normal node
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn normal(
        &mut self,
        name: &str,
        initial: f64,
        mean: NodeId,
        variance: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(name, initial, Distribution::Normal { mean, variance }, observed)
    }

    /// Add a normal node restricted to positive values
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn non_negative_normal(
        &mut self,
        name: &str,
        initial: f64,
        mean: NodeId,
        variance: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(
            name,
            initial,
            Distribution::NonNegativeNormal { mean, variance },
            observed,
        )
    }

    /// Add a gamma node in shape/rate form
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn gamma(
        &mut self,
        name: &str,
        initial: f64,
        shape: NodeId,
        inv_scale: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(
            name,
            initial,
            Distribution::Gamma { shape, inv_scale },
            observed,
        )
    }

    /// Add an inverse gamma node in shape/scale form
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn inv_gamma(
        &mut self,
        name: &str,
        initial: f64,
        shape: NodeId,
        scale: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(
            name,
            initial,
            Distribution::InvGamma { shape, scale },
            observed,
        )
    }

    /// Add a Poisson node
    ///
    /// # Errors
    ///
    /// Returns an error if the rate node does not exist
    pub fn poisson(
        &mut self,
        name: &str,
        initial: f64,
        rate: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(name, initial, Distribution::Poisson { rate }, observed)
    }

    /// Add a beta node
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn beta(
        &mut self,
        name: &str,
        initial: f64,
        alpha: NodeId,
        beta: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(name, initial, Distribution::Beta { alpha, beta }, observed)
    }

    /// Add a Bernoulli node
    ///
    /// # Errors
    ///
    /// Returns an error if the probability node does not exist
    pub fn bernoulli(
        &mut self,
        name: &str,
        initial: f64,
        p: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(name, initial, Distribution::Bernoulli { p }, observed)
    }

    /// Add a Bernoulli node whose probability depends on binary parents
    ///
    /// # Errors
    ///
    /// Returns an error if a parent or probability node does not exist, or if
    /// a table key does not have one entry per parent
    pub fn conditional_bernoulli(
        &mut self,
        name: &str,
        initial: f64,
        parents: Vec<NodeId>,
        table: HashMap<Vec<bool>, NodeId>,
        observed: bool,
    ) -> Result<NodeId> {
        if let Some(key) = table.keys().find(|key| key.len() != parents.len()) {
            return Err(model_error(
                name,
                &format!(
                    "table case {key:?} does not match {} parents",
                    parents.len()
                ),
            ));
        }
        self.stochastic(
            name,
            initial,
            Distribution::ConditionalBernoulli { parents, table },
            observed,
        )
    }

    /// Add a binomial node
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter node does not exist
    pub fn binomial(
        &mut self,
        name: &str,
        initial: f64,
        trials: NodeId,
        p: NodeId,
        observed: bool,
    ) -> Result<NodeId> {
        self.stochastic(name, initial, Distribution::Binomial { trials, p }, observed)
    }

    /// Add a node that takes the value of one of several choices
    ///
    /// # Errors
    ///
    /// Returns an error if a choice or the selector does not exist
    pub fn selector(
        &mut self,
        name: &str,
        choices: Vec<NodeId>,
        selector: NodeId,
    ) -> Result<NodeId> {
        self.function(name, Deterministic::Selector { choices, selector })
    }

    /// Add a node holding the sum of its parents
    ///
    /// # Errors
    ///
    /// Returns an error if a parent does not exist
    pub fn adder(&mut self, name: &str, parents: Vec<NodeId>) -> Result<NodeId> {
        self.function(name, Deterministic::Adder { parents })
    }

    /// Add a node holding the product of its parents
    ///
    /// # Errors
    ///
    /// Returns an error if a parent does not exist
    pub fn multiplier(&mut self, name: &str, parents: Vec<NodeId>) -> Result<NodeId> {
        self.function(name, Deterministic::Multiplier { parents })
    }

    /// Add a node holding `base` raised to `exponent`
    ///
    /// # Errors
    ///
    /// Returns an error if either input does not exist
    pub fn exponent(&mut self, name: &str, base: NodeId, exponent: NodeId) -> Result<NodeId> {
        self.function(name, Deterministic::Exponent { base, exponent })
    }

    /// Current value of a node, derived on demand for function nodes
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or a selector index is out
    /// of range
    pub fn value(&self, id: NodeId) -> Result<f64> {
        let node = self.node(id)?;
        let NodeKind::Function(function) = &node.kind else {
            return Ok(node.value);
        };
        match function {
            Deterministic::Selector { choices, selector } => {
                let index = self.value(*selector)?;
                let choice = (index.fract() == 0.0 && index >= 0.0)
                    .then(|| choices.get(index as usize))
                    .flatten()
                    .ok_or_else(|| {
                        model_error(
                            &node.name,
                            &format!("selector value {index} is not a valid choice index"),
                        )
                    })?;
                self.value(*choice)
            }
            Deterministic::Adder { parents } => parents
                .iter()
                .try_fold(0.0, |total, &parent| -> Result<f64> {
                    Ok(total + self.value(parent)?)
                }),
            Deterministic::Multiplier { parents } => parents
                .iter()
                .try_fold(1.0, |total, &parent| -> Result<f64> {
                    Ok(total * self.value(parent)?)
                }),
            Deterministic::Exponent { base, exponent } => {
                Ok(self.value(*base)?.powf(self.value(*exponent)?))
            }
        }
    }

    /// Overwrite a node's value
    ///
    /// Observed nodes may be set, which is how data is loaded after
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns an error for function nodes, whose values are derived
    pub fn set_value(&mut self, id: NodeId, value: f64) -> Result<()> {
        let node = self.node_mut(id)?;
        if matches!(node.kind, NodeKind::Function(_)) {
            return Err(model_error(
                &node.name,
                &"function node values are derived from their parents",
            ));
        }
        node.value = value;
        Ok(())
    }

    /// Set the standard deviation of a node's random-walk proposal
    ///
    /// # Errors
    ///
    /// Returns an error if the deviation is not positive and finite
    pub fn set_proposal_stddev(&mut self, id: NodeId, stddev: f64) -> Result<()> {
        if !(stddev.is_finite() && stddev > 0.0) {
            return Err(invalid_parameter(
                "proposal_stddev",
                &stddev,
                &"must be positive and finite",
            ));
        }
        self.node_mut(id)?.proposal_stddev = stddev;
        Ok(())
    }

    /// Read a distribution's parameters out of the graph
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be evaluated or a conditional
    /// table has no entry for the parents' current values
    pub fn resolve(&self, name: &str, distribution: &Distribution) -> Result<Density> {
        Ok(match distribution {
            Distribution::Normal { mean, variance } => Density::Normal {
                mean: self.value(*mean)?,
                variance: self.value(*variance)?,
            },
            Distribution::NonNegativeNormal { mean, variance } => Density::NonNegativeNormal {
                mean: self.value(*mean)?,
                variance: self.value(*variance)?,
            },
            Distribution::Gamma { shape, inv_scale } => Density::Gamma {
                shape: self.value(*shape)?,
                inv_scale: self.value(*inv_scale)?,
            },
            Distribution::InvGamma { shape, scale } => Density::InvGamma {
                shape: self.value(*shape)?,
                scale: self.value(*scale)?,
            },
            Distribution::Poisson { rate } => Density::Poisson {
                rate: self.value(*rate)?,
            },
            Distribution::Beta { alpha, beta } => Density::Beta {
                alpha: self.value(*alpha)?,
                beta: self.value(*beta)?,
            },
            Distribution::Bernoulli { p } => Density::Bernoulli {
                p: self.value(*p)?,
            },
            Distribution::ConditionalBernoulli { parents, table } => {
                let case = parents
                    .iter()
                    .map(|&parent| match self.value(parent)? {
                        v if v == 1.0 => Ok(true),
                        v if v == 0.0 => Ok(false),
                        v => Err(model_error(
                            name,
                            &format!("parent {parent} has non-binary value {v}"),
                        )),
                    })
                    .collect::<Result<Vec<bool>>>()?;
                let p = table.get(&case).ok_or_else(|| {
                    model_error(
                        name,
                        &format!(
                            "{} table has no probability for parent case {case:?}",
                            distribution.label()
                        ),
                    )
                })?;
                Density::Bernoulli {
                    p: self.value(*p)?,
                }
            }
            Distribution::Binomial { trials, p } => Density::Binomial {
                trials: self.value(*trials)?,
                p: self.value(*p)?,
            },
        })
    }

    /// Log probability of a node's value given its parents
    ///
    /// Constants contribute nothing. A function node reports the conditional
    /// of its single child, since that is where its value is consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if a function node does not have exactly one child or
    /// a parameter cannot be evaluated
    pub fn log_conditional(&self, id: NodeId) -> Result<f64> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Constant => Ok(0.0),
            NodeKind::Function(_) => match node.children.as_slice() {
                [child] => self.log_conditional(*child),
                children => Err(model_error(
                    &node.name,
                    &format!(
                        "function nodes need exactly one child, found {}",
                        children.len()
                    ),
                )),
            },
            NodeKind::Stochastic(distribution) => Ok(self
                .resolve(&node.name, distribution)?
                .ln_pdf(node.value)),
        }
    }

    /// Log conditional of a node plus the log conditionals of its children
    ///
    /// Up to a constant this is the log of the node's full conditional, which
    /// is all a single-site update needs.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Model::log_conditional`]
    pub fn log_likelihood(&self, id: NodeId) -> Result<f64> {
        let node = self.node(id)?;
        node.children
            .iter()
            .try_fold(self.log_conditional(id)?, |total, &child| -> Result<f64> {
                Ok(total + self.log_conditional(child)?)
            })
    }

    fn distribution(&self, id: NodeId) -> Result<(&Node, &Distribution)> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Stochastic(distribution) => Ok((node, distribution)),
            NodeKind::Constant | NodeKind::Function(_) => Err(model_error(
                &node.name,
                &"only stochastic nodes have a distribution",
            )),
        }
    }

    /// Whether `candidate` is outside the node's support
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not stochastic or its parameters
    /// cannot be evaluated
    pub fn outside_support(&self, id: NodeId, candidate: f64) -> Result<bool> {
        let (node, distribution) = self.distribution(id)?;
        Ok(self
            .resolve(&node.name, distribution)?
            .outside_support(candidate))
    }

    /// Draw a random-walk candidate around the node's current value
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not stochastic
    pub fn propose<R: Rng + ?Sized>(&self, id: NodeId, rng: &mut R) -> Result<f64> {
        let (node, distribution) = self.distribution(id)?;
        let candidate = normal_draw(rng, node.value, node.proposal_stddev);
        Ok(if distribution.is_discrete() {
            candidate.round()
        } else {
            candidate
        })
    }

    /// The node's conditional density at the parents' current values
    ///
    /// The parameters are captured when this is called; later updates to the
    /// graph do not affect the returned function.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not stochastic or its parameters
    /// cannot be evaluated
    pub fn density(&self, id: NodeId) -> Result<DensityFn> {
        let (node, distribution) = self.distribution(id)?;
        let density = self.resolve(&node.name, distribution)?;
        Ok(Box::new(move |x| density.pdf(x)))
    }

    /// Update one node and return its new value
    ///
    /// Observed nodes are returned unchanged. Binary nodes are redrawn from
    /// their exact full conditional; everything else takes one
    /// Metropolis-Hastings step with a symmetric random-walk proposal.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not stochastic or a likelihood cannot
    /// be evaluated
    pub fn sample_node<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Result<f64> {
        let (observed, current, binary, label) = {
            let (node, distribution) = self.distribution(id)?;
            (
                node.observed,
                node.value,
                distribution.is_binary(),
                distribution.label(),
            )
        };
        if observed {
            return Ok(current);
        }
        if binary {
            return self.gibbs_flip(id, current, label, rng);
        }

        let candidate = self.propose(id, rng)?;
        let out_of_support = self.outside_support(id, candidate)?;
        self.node_mut(id)?.stats.proposed += 1;
        if out_of_support {
            self.node_mut(id)?.stats.out_of_support += 1;
            return Ok(current);
        }

        let old_log_lh = self.log_likelihood(id)?;
        let new_log_lh = self.log_likelihood_at(id, candidate, current)?;

        // Written so that a NaN ratio rejects
        let accept = uniform_log(rng) <= new_log_lh - old_log_lh;
        let node = self.node_mut(id)?;
        if accept {
            node.stats.accepted += 1;
        } else {
            node.value = current;
        }
        Ok(node.value)
    }

    // Log-likelihood with the node set to `value`; `current` is put back if
    // the evaluation fails
    fn log_likelihood_at(&mut self, id: NodeId, value: f64, current: f64) -> Result<f64> {
        self.node_mut(id)?.value = value;
        let log_lh = self.log_likelihood(id);
        if log_lh.is_err() {
            self.node_mut(id)?.value = current;
        }
        log_lh
    }

    fn gibbs_flip<R: Rng + ?Sized>(
        &mut self,
        id: NodeId,
        current: f64,
        label: &str,
        rng: &mut R,
    ) -> Result<f64> {
        let log_p = self.log_likelihood_at(id, 1.0, current)?;
        let log_q = self.log_likelihood_at(id, 0.0, current)?;

        let total = log_sum(log_p, log_q);
        if total == f64::NEG_INFINITY || total.is_nan() {
            let node = self.node_mut(id)?;
            node.value = current;
            return Err(ToolError::Model {
                node: node.name.clone(),
                reason: format!("both states of this {label} node have zero probability"),
            });
        }

        let value = if uniform_log(rng) < log_p - total {
            1.0
        } else {
            0.0
        };
        let node = self.node_mut(id)?;
        node.value = value;
        node.stats.proposed += 1;
        node.stats.accepted += 1;
        Ok(value)
    }
}

/// Normal data with unknown mean and variance under conjugate-style priors
#[derive(Debug, Clone)]
pub struct NormalModel {
    /// The assembled graph
    pub model: Model,
    /// Node for the unknown mean
    pub mean: NodeId,
    /// Node for the unknown variance
    pub variance: NodeId,
}

/// Prior settings for [`normal_model`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalPrior {
    /// Prior mean of the unknown mean
    pub mean: f64,
    /// Prior variance of the unknown mean
    pub mean_variance: f64,
    /// Inverse gamma shape for the unknown variance
    pub shape: f64,
    /// Inverse gamma scale for the unknown variance
    pub scale: f64,
}

impl Default for NormalPrior {
    fn default() -> Self {
        Self {
            mean: 0.0,
            mean_variance: 1_000.0,
            shape: 2.0,
            scale: 1.0,
        }
    }
}

/// Build the graph `x_i ~ N(mu, s2)`, `mu ~ N(m0, v0)`, `s2 ~ InvGamma(a, b)`
///
/// The unknowns start at the sample mean and sample variance of the data.
///
/// # Errors
///
/// Returns an error if `data` is empty
pub fn normal_model(data: &[f64], prior: NormalPrior) -> Result<NormalModel> {
    if data.is_empty() {
        return Err(invalid_input(
            &"cannot build a model without observations",
        ));
    }
    let n = data.len() as f64;
    let sample_mean = data.iter().sum::<f64>() / n;
    let sample_variance = if data.len() > 1 {
        data.iter().map(|x| (x - sample_mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        1.0
    };

    let mut model = Model::new();
    let prior_mean = model.constant("prior_mean", prior.mean)?;
    let prior_variance = model.constant("prior_variance", prior.mean_variance)?;
    let shape = model.constant("shape", prior.shape)?;
    let scale = model.constant("scale", prior.scale)?;
    let mean = model.normal("mean", sample_mean, prior_mean, prior_variance, false)?;
    let variance = model.inv_gamma(
        "variance",
        sample_variance.max(f64::MIN_POSITIVE),
        shape,
        scale,
        false,
    )?;
    for (i, &x) in data.iter().enumerate() {
        model.normal(&format!("x{i}"), x, mean, variance, true)?;
    }

    Ok(NormalModel {
        model,
        mean,
        variance,
    })
}

//! Tests for graph construction, likelihoods and single-site updates

#[cfg(test)]
mod tests {
    use grabbag::ToolError;
    use grabbag::mcmc::model::{Model, NormalPrior, normal_model};
    use grabbag::mcmc::node::NodeKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn standard_normal_model() -> (Model, grabbag::mcmc::node::NodeId) {
        let mut model = Model::new();
        let mean = model.constant("mean", 0.0).unwrap();
        let variance = model.constant("variance", 1.0).unwrap();
        let x = model.normal("x", 0.0, mean, variance, false).unwrap();
        (model, x)
    }

    // Tests children are appended in construction order
    // Verified by inserting new children at the front
    #[test]
    fn test_children_in_construction_order() {
        let mut model = Model::new();
        let mean = model.constant("mean", 0.0).unwrap();
        let variance = model.constant("variance", 1.0).unwrap();
        let a = model.normal("a", 0.0, mean, variance, true).unwrap();
        let b = model.normal("b", 0.0, mean, variance, true).unwrap();
        let c = model.normal("c", 0.0, mean, variance, true).unwrap();

        assert_eq!(model.node(mean).unwrap().children(), &[a, b, c]);
        assert_eq!(model.node(variance).unwrap().children(), &[a, b, c]);
        assert!(model.node(c).unwrap().children().is_empty());
        assert_eq!(model.len(), 5);
        assert_eq!(model.find("b"), Some(b));
        assert_eq!(model.find("missing"), None);
    }

    // Tests a builder rejects a parent from outside the model
    // Verified by skipping the parent existence check
    #[test]
    fn test_missing_parent_rejected() {
        let mut large = Model::new();
        for i in 0..4 {
            large.constant(&format!("c{i}"), 0.0).unwrap();
        }
        let foreign = large.find("c3").unwrap();

        let mut model = Model::new();
        let mean = model.constant("mean", 0.0).unwrap();
        let result = model.normal("x", 0.0, mean, foreign, false);
        assert!(matches!(result, Err(ToolError::Model { .. })));
        assert_eq!(model.len(), 1);
        assert!(model.node(mean).unwrap().children().is_empty());
    }

    // Tests deterministic node values
    // Verified by evaluating the exponent as base times exponent
    #[test]
    fn test_function_values() {
        let mut model = Model::new();
        let two = model.constant("two", 2.0).unwrap();
        let three = model.constant("three", 3.0).unwrap();
        let index = model.constant("index", 1.0).unwrap();

        let sum = model.adder("sum", vec![two, three]).unwrap();
        let product = model.multiplier("product", vec![two, three, sum]).unwrap();
        let power = model.exponent("power", two, three).unwrap();
        let chosen = model.selector("chosen", vec![two, three], index).unwrap();

        assert!((model.value(sum).unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((model.value(product).unwrap() - 30.0).abs() < f64::EPSILON);
        assert!((model.value(power).unwrap() - 8.0).abs() < f64::EPSILON);
        assert!((model.value(chosen).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!(matches!(model.node(sum).unwrap().kind(), NodeKind::Function(_)));
    }

    // Tests selector values that are not valid indices
    // Verified by truncating fractional selector values
    #[test]
    fn test_selector_invalid_index() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let index = model.constant("index", 2.0).unwrap();
        let chosen = model.selector("chosen", vec![a], index).unwrap();
        assert!(model.value(chosen).is_err());

        model.set_value(index, 0.5).unwrap();
        assert!(model.value(chosen).is_err());

        model.set_value(index, 0.0).unwrap();
        assert!((model.value(chosen).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    // Tests function values cannot be assigned
    // Verified by writing the value field on function nodes
    #[test]
    fn test_set_value_on_function_fails() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let sum = model.adder("sum", vec![a]).unwrap();
        assert!(matches!(
            model.set_value(sum, 4.0),
            Err(ToolError::Model { .. })
        ));
    }

    // Tests proposal deviation validation
    // Verified by accepting zero
    #[test]
    fn test_set_proposal_stddev() {
        let (mut model, x) = standard_normal_model();
        assert!(model.set_proposal_stddev(x, 0.0).is_err());
        assert!(model.set_proposal_stddev(x, -1.0).is_err());
        assert!(model.set_proposal_stddev(x, f64::INFINITY).is_err());
        model.set_proposal_stddev(x, 1.5).unwrap();
        assert!((model.node(x).unwrap().proposal_stddev() - 1.5).abs() < f64::EPSILON);
    }

    // Tests log conditionals for constants and stochastic nodes
    // Verified by returning the value itself for constants
    #[test]
    fn test_log_conditional() {
        let (model, x) = standard_normal_model();
        let mean = model.find("mean").unwrap();
        assert!(model.log_conditional(mean).unwrap().abs() < f64::EPSILON);

        let expected = -0.5 * (2.0 * std::f64::consts::PI).ln();
        assert!((model.log_conditional(x).unwrap() - expected).abs() < 1e-12);
    }

    // Tests a function node defers to its only child
    // Verified by returning zero for function nodes
    #[test]
    fn test_function_log_conditional_uses_child() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let b = model.constant("b", 2.0).unwrap();
        let rate = model.adder("rate", vec![a, b]).unwrap();
        let count = model.poisson("count", 2.0, rate, true).unwrap();

        let child = model.log_conditional(count).unwrap();
        assert!((model.log_conditional(rate).unwrap() - child).abs() < f64::EPSILON);

        model.poisson("second", 1.0, rate, true).unwrap();
        assert!(matches!(
            model.log_conditional(rate),
            Err(ToolError::Model { .. })
        ));
    }

    // Tests a function node without children is an error
    // Verified by treating a childless function as zero
    #[test]
    fn test_childless_function_log_conditional() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let sum = model.adder("sum", vec![a]).unwrap();
        assert!(model.log_conditional(sum).is_err());
    }

    // Tests the log likelihood adds the children's conditionals
    // Verified by omitting the node's own conditional
    #[test]
    fn test_log_likelihood_sums_children() {
        let mut model = Model::new();
        let zero = model.constant("zero", 0.0).unwrap();
        let one = model.constant("one", 1.0).unwrap();
        let mean = model.normal("mean", 0.5, zero, one, false).unwrap();
        let y1 = model.normal("y1", 1.0, mean, one, true).unwrap();
        let y2 = model.normal("y2", -1.0, mean, one, true).unwrap();

        let expected = model.log_conditional(mean).unwrap()
            + model.log_conditional(y1).unwrap()
            + model.log_conditional(y2).unwrap();
        assert!((model.log_likelihood(mean).unwrap() - expected).abs() < 1e-12);
    }

    // Tests conditional Bernoulli table lookup
    // Verified by reversing the parent order in the lookup key
    #[test]
    fn test_conditional_bernoulli_lookup() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let b = model.constant("b", 0.0).unwrap();
        let p_tf = model.constant("p_tf", 0.9).unwrap();
        let p_ft = model.constant("p_ft", 0.2).unwrap();
        let table = HashMap::from([(vec![true, false], p_tf), (vec![false, true], p_ft)]);
        let y = model
            .conditional_bernoulli("y", 1.0, vec![a, b], table, true)
            .unwrap();

        assert!((model.log_conditional(y).unwrap() - 0.9_f64.ln()).abs() < 1e-12);

        model.set_value(a, 0.0).unwrap();
        model.set_value(b, 1.0).unwrap();
        assert!((model.log_conditional(y).unwrap() - 0.2_f64.ln()).abs() < 1e-12);

        model.set_value(b, 0.0).unwrap();
        assert!(model.log_conditional(y).is_err());

        model.set_value(b, 0.5).unwrap();
        assert!(model.log_conditional(y).is_err());
        assert!(model.node(p_tf).unwrap().children().contains(&y));
    }

    // Tests table keys must have one entry per parent
    // Verified by checking only the first key
    #[test]
    fn test_conditional_bernoulli_key_length() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let p = model.constant("p", 0.5).unwrap();
        let table = HashMap::from([(vec![true], p), (vec![true, false], p)]);
        assert!(
            model
                .conditional_bernoulli("y", 0.0, vec![a], table, false)
                .is_err()
        );
    }

    // Tests the density closure captures the parameters at call time
    // Verified by reading parent values lazily inside the closure
    #[test]
    fn test_density_snapshot() {
        let (mut model, x) = standard_normal_model();
        let density = model.density(x).unwrap();
        let mean = model.find("mean").unwrap();
        model.set_value(mean, 10.0).unwrap();

        let peak = 1.0 / (2.0 * std::f64::consts::PI).sqrt();
        assert!((density(0.0) - peak).abs() < 1e-12);
        assert!(model.density(mean).is_err());
    }

    // Tests observed nodes are never updated
    // Verified by sampling observed nodes like latent ones
    #[test]
    fn test_observed_node_unchanged() {
        let mut model = Model::new();
        let mean = model.constant("mean", 0.0).unwrap();
        let variance = model.constant("variance", 1.0).unwrap();
        let x = model.normal("x", 3.25, mean, variance, true).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            assert_eq!(model.sample_node(x, &mut rng).unwrap().to_bits(), 3.25_f64.to_bits());
        }
        assert_eq!(model.node(x).unwrap().stats().proposed, 0);
    }

    // Tests constants and functions cannot be sampled
    // Verified by returning the current value for non-stochastic nodes
    #[test]
    fn test_sample_non_stochastic_fails() {
        let mut model = Model::new();
        let a = model.constant("a", 1.0).unwrap();
        let sum = model.adder("sum", vec![a]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(model.sample_node(a, &mut rng).is_err());
        assert!(model.sample_node(sum, &mut rng).is_err());
        assert!(model.propose(a, &mut rng).is_err());
    }

    // Tests out-of-support proposals keep the value bit-identical
    // Verified by evaluating the likelihood at the rejected candidate
    #[test]
    fn test_out_of_support_rejection() {
        let mut model = Model::new();
        let shape = model.constant("shape", 2.0).unwrap();
        let rate = model.constant("rate", 1.0).unwrap();
        let g = model.gamma("g", 0.001, shape, rate, false).unwrap();
        model.set_proposal_stddev(g, 100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let mut last = model.value(g).unwrap();
        for _ in 0..200 {
            let before = model.value(g).unwrap();
            let after = model.sample_node(g, &mut rng).unwrap();
            assert!(after > 0.0);
            if after.to_bits() != before.to_bits() {
                last = after;
            }
        }
        let stats = model.node(g).unwrap().stats();
        assert_eq!(stats.proposed, 200);
        assert!(stats.out_of_support > 0);
        assert!(stats.accepted + stats.out_of_support <= stats.proposed);
        assert!(last > 0.0);
    }

    // Tests discrete proposals are rounded to integers
    // Verified by drawing a continuous candidate for Poisson nodes
    #[test]
    fn test_discrete_proposals_are_integers() {
        let mut model = Model::new();
        let rate = model.constant("rate", 4.0).unwrap();
        let k = model.poisson("k", 4.0, rate, false).unwrap();
        model.set_proposal_stddev(k, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let candidate = model.propose(k, &mut rng).unwrap();
            assert_eq!(candidate.fract(), 0.0);
            let value = model.sample_node(k, &mut rng).unwrap();
            assert_eq!(value.fract(), 0.0);
            assert!(value >= 0.0);
        }
    }

    // Tests a certain Bernoulli always flips to one
    // Verified by comparing against ln q instead of ln p
    #[test]
    fn test_gibbs_flip_certain() {
        let mut model = Model::new();
        let p = model.constant("p", 1.0).unwrap();
        let z = model.bernoulli("z", 0.0, p, false).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            assert!((model.sample_node(z, &mut rng).unwrap() - 1.0).abs() < f64::EPSILON);
        }
        let stats = model.node(z).unwrap().stats();
        assert_eq!(stats.proposed, 50);
        assert_eq!(stats.accepted, 50);
    }

    // Tests Gibbs flips follow the Bernoulli probability
    // Verified by using the probability of zero as the probability of one
    #[test]
    fn test_gibbs_flip_frequency() {
        let mut model = Model::new();
        let p = model.constant("p", 0.3).unwrap();
        let z = model.bernoulli("z", 0.0, p, false).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let draws = 20_000;
        let ones = (0..draws)
            .map(|_| model.sample_node(z, &mut rng).unwrap())
            .filter(|&value| value == 1.0)
            .count();
        let frequency = ones as f64 / f64::from(draws);
        assert!((frequency - 0.3).abs() < 0.02, "frequency was {frequency}");
    }

    // Tests a Gibbs flip with no possible state is an error
    // Verified by defaulting to zero when both states are impossible
    #[test]
    fn test_gibbs_flip_impossible() {
        let mut model = Model::new();
        let one = model.constant("one", 1.0).unwrap();
        let z = model.bernoulli("z", 1.0, one, false).unwrap();
        let table = HashMap::from([(vec![true], one), (vec![false], one)]);
        model
            .conditional_bernoulli("y", 0.0, vec![z], table, true)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            model.sample_node(z, &mut rng),
            Err(ToolError::Model { .. })
        ));
        assert_eq!(model.value(z).unwrap().to_bits(), 1.0f64.to_bits());
    }

    // Tests likelihood rejections leave the value bit-identical
    // Verified by keeping the candidate on rejection
    #[test]
    fn test_likelihood_rejection_restores_value() {
        let (mut model, x) = standard_normal_model();
        model.set_value(x, 0.123_456_789).unwrap();
        model.set_proposal_stddev(x, 3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        let mut rejections = 0;
        for _ in 0..300 {
            let before = model.value(x).unwrap();
            let accepted_before = model.node(x).unwrap().stats().accepted;
            let after = model.sample_node(x, &mut rng).unwrap();
            if model.node(x).unwrap().stats().accepted == accepted_before {
                rejections += 1;
                assert_eq!(after.to_bits(), before.to_bits());
                assert_eq!(model.value(x).unwrap().to_bits(), before.to_bits());
            }
        }
        assert!(rejections > 0);
    }

    // Tests a failed Metropolis step puts the previous value back
    // Verified by leaving the failing candidate in place
    #[test]
    fn test_failed_step_restores_value() {
        let mut model = Model::new();
        let rate = model.constant("rate", 1.0).unwrap();
        let low = model.constant("low", -1.0).unwrap();
        let high = model.constant("high", 1.0).unwrap();
        let variance = model.constant("variance", 1.0).unwrap();
        let k = model.poisson("k", 0.0, rate, false).unwrap();
        let chosen = model.selector("chosen", vec![low, high], k).unwrap();
        model.normal("y", 0.5, chosen, variance, true).unwrap();
        model.set_proposal_stddev(k, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let mut failures = 0;
        for _ in 0..100 {
            let before = model.value(k).unwrap();
            if model.sample_node(k, &mut rng).is_err() {
                failures += 1;
                assert_eq!(model.value(k).unwrap().to_bits(), before.to_bits());
            }
            assert!(model.value(chosen).is_ok());
        }
        assert!(failures > 0);
    }

    // Tests a failed Gibbs flip puts the previous state back
    // Verified by leaving the node at zero after the failed lookup
    #[test]
    fn test_failed_gibbs_flip_restores_value() {
        let mut model = Model::new();
        let half = model.constant("half", 0.5).unwrap();
        let z = model.bernoulli("z", 1.0, half, false).unwrap();
        let table = HashMap::from([(vec![true], half)]);
        model
            .conditional_bernoulli("y", 1.0, vec![z], table, true)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        match model.sample_node(z, &mut rng) {
            Err(ToolError::Model { reason, .. }) => {
                assert!(reason.contains("conditional bernoulli"), "{reason}");
            }
            other => panic!("expected a missing table entry, got {other:?}"),
        }
        assert_eq!(model.value(z).unwrap().to_bits(), 1.0f64.to_bits());
        assert_eq!(model.node(z).unwrap().stats().proposed, 0);
    }

    // Tests the normal model layout and starting values
    // Verified by starting the variance at the population variance
    #[test]
    fn test_normal_model_construction() {
        let data = [1.0, 2.0, 3.0, 6.0];
        let built = normal_model(&data, NormalPrior::default()).unwrap();
        let model = &built.model;

        assert_eq!(model.len(), 6 + data.len());
        assert!((model.value(built.mean).unwrap() - 3.0).abs() < 1e-12);
        assert!((model.value(built.variance).unwrap() - 14.0 / 3.0).abs() < 1e-12);
        assert_eq!(model.find("x3").map(|id| model.value(id).unwrap()), Some(6.0));
        assert!(model.node(model.find("x0").unwrap()).unwrap().is_observed());
        assert_eq!(model.node(built.mean).unwrap().children().len(), data.len());
    }

    // Tests the normal model needs data and handles a single point
    // Verified by dividing by n - 1 for one observation
    #[test]
    fn test_normal_model_edge_cases() {
        assert!(matches!(
            normal_model(&[], NormalPrior::default()),
            Err(ToolError::InvalidInput { .. })
        ));
        let built = normal_model(&[4.0], NormalPrior::default()).unwrap();
        assert!((built.model.value(built.variance).unwrap() - 1.0).abs() < f64::EPSILON);
    }
}

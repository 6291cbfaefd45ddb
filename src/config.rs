//! Tunable parameters for genome mutation, speciation and reproduction.

use serde::{Deserialize, Serialize};

use crate::error::{NeatError, Result};

/// Configuration for genome creation, mutation and speciation.
///
/// The defaults reproduce the reference dynamics: 80% weight mutation, 5% new
/// connection, 1% new node, a compatibility threshold of 3.0 and a staleness
/// limit of 15 generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Number of input nodes (excluding bias).
    pub num_inputs: usize,
    /// Number of output nodes.
    pub num_outputs: usize,
    /// Probability that a mutation call perturbs every synapse weight.
    pub weight_mutation_prob: f64,
    /// Per-synapse probability of replacing the weight instead of nudging it.
    pub weight_replace_prob: f64,
    /// Divisor applied to the unit Gaussian sample when nudging a weight.
    pub weight_perturb_divisor: f64,
    /// Probability that a mutation call adds a connection.
    pub add_connection_prob: f64,
    /// Probability that a mutation call splits a synapse with a new node.
    pub add_node_prob: f64,
    /// Probability that breeding uses crossover rather than a plain clone.
    pub crossover_prob: f64,
    /// Probability that a matching gene disabled in either parent stays disabled.
    pub inherit_disabled_prob: f64,
    /// Coefficient for excess and disjoint genes in the compatibility measure.
    pub excess_coeff: f64,
    /// Coefficient for the average weight difference of matching genes.
    pub weight_diff_coeff: f64,
    /// Genomes closer than this to a champion join its species.
    pub compatibility_threshold: f64,
    /// Synapse count below which the excess normalizer stays at 1.
    pub large_genome_offset: usize,
    /// Weight difference reported when two genomes share no genes.
    pub no_match_penalty: f64,
    /// Species that have not improved for this many generations are removed.
    pub staleness_threshold: usize,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            num_inputs: 1,
            num_outputs: 1,
            weight_mutation_prob: 0.8,
            weight_replace_prob: 0.1,
            weight_perturb_divisor: 50.0,
            add_connection_prob: 0.05,
            add_node_prob: 0.01,
            crossover_prob: 0.75,
            inherit_disabled_prob: 0.75,
            excess_coeff: 1.0,
            weight_diff_coeff: 0.5,
            compatibility_threshold: 3.0,
            large_genome_offset: 10,
            no_match_penalty: 100.0,
            staleness_threshold: 15,
        }
    }
}

impl NeatConfig {
    /// Create a config with the default rates for the given network shape.
    #[must_use]
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Default::default()
        }
    }

    /// Config with raised structural mutation rates, useful for small demos.
    #[must_use]
    pub fn exploratory(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            add_connection_prob: 0.3,
            add_node_prob: 0.1,
            ..Self::new(num_inputs, num_outputs)
        }
    }

    /// Check that the network shape is usable and every probability is in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.num_inputs == 0 {
            return Err(NeatError::InvalidConfig("num_inputs must be non-zero".into()));
        }
        if self.num_outputs == 0 {
            return Err(NeatError::InvalidConfig(
                "num_outputs must be non-zero".into(),
            ));
        }

        let probabilities = [
            ("weight_mutation_prob", self.weight_mutation_prob),
            ("weight_replace_prob", self.weight_replace_prob),
            ("add_connection_prob", self.add_connection_prob),
            ("add_node_prob", self.add_node_prob),
            ("crossover_prob", self.crossover_prob),
            ("inherit_disabled_prob", self.inherit_disabled_prob),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(NeatError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(self.weight_perturb_divisor > 0.0) {
            return Err(NeatError::InvalidConfig(
                "weight_perturb_divisor must be positive".into(),
            ));
        }
        if !(self.compatibility_threshold > 0.0) {
            return Err(NeatError::InvalidConfig(
                "compatibility_threshold must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(NeatConfig::default().validate().is_ok());
        assert!(NeatConfig::exploratory(4, 2).validate().is_ok());
    }

    #[test]
    fn test_zero_outputs_rejected() {
        let config = NeatConfig::new(3, 0);
        assert!(matches!(
            config.validate(),
            Err(NeatError::InvalidConfig(msg)) if msg.contains("num_outputs")
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let config = NeatConfig {
            add_node_prob: 1.5,
            ..NeatConfig::new(2, 1)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("add_node_prob"));
    }
}

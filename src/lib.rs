//! # NEAT Pilot
//!
//! A NeuroEvolution of Augmenting Topologies (NEAT) engine for evolving the
//! controllers of simulated agents (cars, creatures, game bots).
//!
//! ## Features
//!
//! - **Lineage-Tracked Innovation**: a shared [`InnovationHistory`] reuses an
//!   innovation number only when the same connection is grown from the same
//!   starting synapse set, so identical mutations line up during crossover
//! - **Arena-Graph Model**: `SlotMap` storage for nodes and synapses; the
//!   network is evaluated layer by layer without any node-to-node pointers
//! - **Speciation**: agents cluster around persistent champions, stale and
//!   weak species die out, and offspring are allotted by average fitness
//! - **Host Boundary**: the simulation plugs in through [`AgentHost`], which
//!   creates entities, senses inputs, applies outputs and scores agents
//!
//! ## Quick Start
//!
//! ```rust
//! use neat_pilot::{Agent, AgentHost, EntityId, EntityRegistry, Generation, NeatConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! // A host whose entities live for ten ticks and score their first output
//! struct Walker {
//!     steps: EntityRegistry<u32>,
//! }
//!
//! impl AgentHost for Walker {
//!     fn create(&mut self) -> EntityId {
//!         self.steps.insert(0)
//!     }
//!     fn fitness(&self, agent: &Agent) -> f64 {
//!         agent.score.max(0.0) + 0.01
//!     }
//!     fn sense(&self, entity: EntityId) -> Vec<f64> {
//!         let steps = self.steps.get(entity).copied().unwrap_or(0);
//!         vec![f64::from(steps) / 10.0]
//!     }
//!     fn act(&mut self, entity: EntityId, outputs: &[f64], agent: &mut Agent) {
//!         agent.score += outputs[0];
//!         if let Some(steps) = self.steps.get_mut(entity) {
//!             *steps += 1;
//!             if *steps >= 10 {
//!                 agent.finish();
//!             }
//!         }
//!     }
//! }
//!
//! let mut host = Walker { steps: EntityRegistry::new() };
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut generation = Generation::new(NeatConfig::new(1, 1), 20).unwrap();
//! generation.populate(&mut host, &mut rng).unwrap();
//!
//! for _ in 0..3 {
//!     while !generation.is_finished() {
//!         generation.tick(&mut host).unwrap();
//!     }
//!     generation.natural_selection(&mut host, &mut rng).unwrap();
//!     host.steps.retain_only(generation.entities());
//! }
//!
//! assert_eq!(generation.agents().len(), 20);
//! assert_eq!(generation.number(), 4);
//! ```
//!
//! ## Architecture
//!
//! ### Innovation History
//!
//! Every synapse carries an innovation number. When a genome grows a synapse
//! it asks the history, passing the numbers it already holds. A recorded
//! number is returned only if the endpoints and that whole set match;
//! otherwise a new number is allocated from 1000 upwards.
//!
//! ### Layered Evaluation
//!
//! Inputs and bias sit on layer 0, outputs on the last layer. Synapses always
//! run from a lower layer to a higher one. Splitting a synapse places the new
//! node one layer above its source and shifts the rest of the network up if
//! that layer was taken, which keeps a single layer-ordered pass sufficient.
//!
//! ### Generation Cycle
//!
//! `tick` has every live agent sense, think and act. Once the host has
//! finished them all, `natural_selection` scores, speciates, culls and breeds
//! a new population of exactly the same size.

pub mod agent;
pub mod config;
pub mod error;
pub mod gene;
pub mod generation;
pub mod genome;
pub mod host;
pub mod innovation;
pub mod network;
pub mod species;

// Re-exports for convenience
pub use agent::Agent;
pub use config::NeatConfig;
pub use error::{NeatError, Result};
pub use gene::{sigmoid, Node, NodeId, NodeKind, Synapse, SynapseId};
pub use generation::{Generation, Phase};
pub use genome::Genome;
pub use host::{AgentHost, EntityId, EntityRegistry};
pub use innovation::{InnovationHistory, InnovationRecord, FIRST_INNOVATION};
pub use species::{compatibility, Species, SpeciesPool};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_serialization_roundtrip() {
        let mut history = InnovationHistory::new();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut genome = Genome::new(NeatConfig::new(3, 2));
        genome.fully_connect(&mut history, &mut rng);

        // Add some structure
        genome.add_node(&mut history, &mut rng).unwrap();

        // Serialize
        let json = serde_json::to_string(&genome).expect("Serialization failed");

        // Deserialize
        let mut restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        // Verify structure preserved
        assert_eq!(genome.nodes.len(), restored.nodes.len());
        assert_eq!(genome.synapses.len(), restored.synapses.len());
        assert_eq!(genome.input_ids.len(), restored.input_ids.len());
        assert_eq!(genome.output_ids.len(), restored.output_ids.len());
        assert_eq!(genome.layers, restored.layers);
        assert_eq!(genome.config, restored.config);

        // The evaluation order is transient and must be rebuilt
        assert!(restored.network().is_empty());
        genome.generate_network();
        restored.generate_network();
        let inputs = [0.2, -0.4, 0.9];
        assert_eq!(
            genome.feed_forward(&inputs).unwrap(),
            restored.feed_forward(&inputs).unwrap()
        );
    }

    #[test]
    fn test_history_roundtrip() {
        let mut history = InnovationHistory::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut genome = Genome::new(NeatConfig::new(2, 1));
        genome.fully_connect(&mut history, &mut rng);

        let json = serde_json::to_string(&history).expect("Serialization failed");
        let mut restored: InnovationHistory =
            serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored.records(), history.records());

        // A restored history keeps handing out the same numbers
        let snapshot: Vec<u64> = Vec::new();
        assert_eq!(
            restored.innovation_for(0, 2, snapshot.clone()),
            history.innovation_for(0, 2, snapshot)
        );
    }

    #[test]
    fn test_config_missing_from_json_uses_default() {
        let mut history = InnovationHistory::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut genome = Genome::new(NeatConfig::default());
        genome.fully_connect(&mut history, &mut rng);

        let mut value = serde_json::to_value(&genome).expect("Serialization failed");
        value
            .as_object_mut()
            .expect("genome serializes as an object")
            .remove("config");
        let restored: Genome = serde_json::from_value(value).expect("Deserialization failed");

        assert_eq!(restored.config, NeatConfig::default());
    }
}

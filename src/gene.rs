//! Gene types for NEAT genomes.
//!
//! This module defines the building blocks of an evolvable network:
//! - [`Node`]: a typed, layered neuron
//! - [`Synapse`]: a weighted link between two nodes carrying an innovation number

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena key of a node within one genome.
    ///
    /// Keys are preserved when a genome is cloned, so a synapse copied along
    /// with its genome keeps pointing at the matching node.
    pub struct NodeId;

    /// Arena key of a synapse within one genome.
    pub struct SynapseId;
}

/// The role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Receives a sensory value directly; no activation applied.
    Input,
    /// Produces one network output.
    Output,
    /// Internal node added by splitting a synapse.
    Hidden,
    /// Always outputs 1.0.
    Bias,
}

/// Standard logistic function.
#[inline]
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A neuron in the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable integer identity, unique within a genome and copied on clone.
    pub number: u32,
    /// Layer index; 0 holds the inputs and the bias.
    pub layer: u32,
    /// Role of the node.
    pub kind: NodeKind,
    /// Weighted sum accumulated from incoming synapses during one evaluation.
    #[serde(skip)]
    pub input: f64,
    /// Value produced by the last evaluation.
    #[serde(skip)]
    pub output: f64,
    /// Outgoing synapses, rebuilt from the synapse arena before evaluation.
    #[serde(skip)]
    pub outgoing: Vec<SynapseId>,
}

impl Node {
    /// Create a node with empty evaluation state.
    #[must_use]
    pub fn new(number: u32, layer: u32, kind: NodeKind) -> Self {
        Self {
            number,
            layer,
            kind,
            input: 0.0,
            output: 0.0,
            outgoing: Vec::new(),
        }
    }

    /// Reset the input accumulator.
    pub fn clear_input(&mut self) {
        self.input = 0.0;
    }

    /// Value this node emits for an accumulated input.
    ///
    /// Nodes on layer 0 pass their preset output through untouched.
    #[inline]
    #[must_use]
    pub fn activate(&self) -> f64 {
        if self.layer == 0 {
            self.output
        } else {
            sigmoid(self.input)
        }
    }
}

/// A weighted link between two nodes.
///
/// Synapses are identified across genomes by their innovation number, which
/// is handed out by an [`InnovationHistory`](crate::innovation::InnovationHistory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    /// Innovation number used to align genes during crossover.
    pub innovation: u64,
    /// Source node.
    pub from: NodeId,
    /// Target node.
    pub to: NodeId,
    /// Connection weight.
    pub weight: f64,
    /// Disabled synapses are skipped during evaluation but kept for crossover.
    pub enabled: bool,
}

impl Synapse {
    /// Create a new enabled synapse.
    #[must_use]
    pub fn new(innovation: u64, from: NodeId, to: NodeId, weight: f64) -> Self {
        Self {
            innovation,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Whether this synapse is disabled.
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }
}

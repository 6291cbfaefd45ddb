//! Layered feed-forward evaluation of a [`Genome`].
//!
//! Before evaluation the genome rebuilds every node's outgoing synapse list
//! from the synapse arena and orders nodes by layer. Evaluation then engages
//! each node in that order: a node computes its output from the accumulated
//! input and pushes `weight * output` into the targets of its enabled synapses.
//! Since every synapse runs from a lower layer to a higher one, a node's
//! accumulator is complete by the time it is engaged.

use crate::error::{NeatError, Result};
use crate::gene::NodeId;
use crate::genome::Genome;

impl Genome {
    /// Rebuild each node's outgoing synapse list from the synapse arena.
    pub fn connect_nodes(&mut self) {
        for node in self.nodes.values_mut() {
            node.outgoing.clear();
        }
        for (id, synapse) in &self.synapses {
            if let Some(node) = self.nodes.get_mut(synapse.from) {
                node.outgoing.push(id);
            }
        }
    }

    /// Rebuild adjacency and the layer-by-layer evaluation order.
    ///
    /// Within a layer nodes keep their insertion order.
    pub fn generate_network(&mut self) {
        self.connect_nodes();

        self.network.clear();
        for layer in 0..self.layers {
            self.network.extend(
                self.nodes
                    .iter()
                    .filter(|(_, n)| n.layer == layer)
                    .map(|(id, _)| id),
            );
        }
    }

    /// Evaluation order built by the last [`generate_network`](Self::generate_network).
    #[must_use]
    pub fn network(&self) -> &[NodeId] {
        &self.network
    }

    /// Whether a synapse, enabled or not, links `a` and `b`.
    ///
    /// The node on the lower layer is treated as the source. Nodes on the same
    /// layer are never connected. Relies on the adjacency built by
    /// [`connect_nodes`](Self::connect_nodes).
    #[must_use]
    pub fn connected_to(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(node_a), Some(node_b)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        if node_a.layer == node_b.layer {
            return false;
        }

        let (source, target) = if node_a.layer < node_b.layer {
            (node_a, b)
        } else {
            (node_b, a)
        };
        source
            .outgoing
            .iter()
            .filter_map(|&id| self.synapses.get(id))
            .any(|synapse| synapse.to == target)
    }

    /// Fire one node: compute its output and feed its enabled synapses.
    ///
    /// The node's own accumulator is left untouched.
    pub fn engage(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let output = node.activate();
        node.output = output;

        for i in 0..self.nodes[id].outgoing.len() {
            let synapse = &self.synapses[self.nodes[id].outgoing[i]];
            if !synapse.enabled {
                continue;
            }
            let (target, weight) = (synapse.to, synapse.weight);
            if let Some(target) = self.nodes.get_mut(target) {
                target.input += weight * output;
            }
        }
    }

    /// Run the network on one input vector.
    ///
    /// Inputs are written straight to the input nodes, the bias node emits 1,
    /// and outputs come back in output-node creation order. Accumulators are
    /// cleared afterwards so repeated calls with the same inputs agree.
    ///
    /// # Errors
    ///
    /// - [`NeatError::InvalidInput`] if `inputs` has the wrong length.
    /// - [`NeatError::UninitializedNetwork`] if the genome has no synapses or
    ///   [`generate_network`](Self::generate_network) has not been called.
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.input_ids.len() {
            return Err(NeatError::InvalidInput {
                expected: self.input_ids.len(),
                actual: inputs.len(),
            });
        }
        if self.synapses.is_empty() {
            return Err(NeatError::UninitializedNetwork("no synapses"));
        }
        if self.network.is_empty() {
            return Err(NeatError::UninitializedNetwork("no evaluation order"));
        }

        for (&id, &value) in self.input_ids.iter().zip(inputs) {
            self.nodes[id].output = value;
        }
        self.nodes[self.bias_id].output = 1.0;

        let order = std::mem::take(&mut self.network);
        for &id in &order {
            self.engage(id);
        }
        self.network = order;

        let outputs = self
            .output_ids
            .iter()
            .map(|&id| self.nodes[id].output)
            .collect();

        for node in self.nodes.values_mut() {
            node.clear_input();
        }

        Ok(outputs)
    }
}

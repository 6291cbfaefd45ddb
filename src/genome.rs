//! Genome implementation with arena-allocated nodes and synapses.
//!
//! A [`Genome`] owns its nodes and synapses in SlotMap arenas. Synapses refer
//! to nodes by arena key, and nodes find their outgoing synapses through a
//! transient adjacency list rebuilt by [`Genome::connect_nodes`]. No node ever
//! holds a reference to another node.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::NeatConfig;
use crate::error::{NeatError, Result};
use crate::gene::{Node, NodeId, NodeKind, Synapse, SynapseId};
use crate::innovation::InnovationHistory;

/// Layer count of a freshly created genome: inputs and bias, then outputs.
pub const INITIAL_LAYERS: u32 = 2;

/// The evolvable description of one agent's network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// Arena storage for nodes.
    pub nodes: SlotMap<NodeId, Node>,
    /// Arena storage for synapses.
    pub synapses: SlotMap<SynapseId, Synapse>,
    /// Input nodes, in creation order.
    pub input_ids: Vec<NodeId>,
    /// Output nodes, in creation order.
    pub output_ids: Vec<NodeId>,
    /// The bias node.
    pub bias_id: NodeId,
    /// Number of layers; grows when a node split collides with a layer.
    pub layers: u32,
    /// Number given to the next node created in this genome.
    pub next_node: u32,
    /// Evaluation order built by `generate_network`.
    #[serde(skip)]
    pub(crate) network: Vec<NodeId>,
    /// Configuration used for this genome.
    #[serde(default)]
    pub config: NeatConfig,
}

impl Genome {
    /// Create a genome with input, output and bias nodes but no synapses.
    ///
    /// Inputs are numbered first, then outputs, then the bias node.
    #[must_use]
    pub fn new(config: NeatConfig) -> Self {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let mut next_node = 0;

        let input_ids: Vec<NodeId> = (0..config.num_inputs)
            .map(|_| {
                let id = nodes.insert(Node::new(next_node, 0, NodeKind::Input));
                next_node += 1;
                id
            })
            .collect();

        let output_ids: Vec<NodeId> = (0..config.num_outputs)
            .map(|_| {
                let id = nodes.insert(Node::new(next_node, 1, NodeKind::Output));
                next_node += 1;
                id
            })
            .collect();

        let bias_id = nodes.insert(Node::new(next_node, 0, NodeKind::Bias));
        next_node += 1;

        Self {
            nodes,
            synapses: SlotMap::with_key(),
            input_ids,
            output_ids,
            bias_id,
            layers: INITIAL_LAYERS,
            next_node,
            network: Vec::new(),
            config,
        }
    }

    /// Declared number of inputs.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.input_ids.len()
    }

    /// Declared number of outputs.
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.output_ids.len()
    }

    /// Find a node by its number.
    #[must_use]
    pub fn find_node(&self, number: u32) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.number == number)
            .map(|(id, _)| id)
    }

    /// Find a synapse by its innovation number.
    #[must_use]
    pub fn find_synapse(&self, innovation: u64) -> Option<SynapseId> {
        self.synapses
            .iter()
            .find(|(_, s)| s.innovation == innovation)
            .map(|(id, _)| id)
    }

    /// Innovation numbers of every synapse, in insertion order.
    pub fn innovations(&self) -> impl Iterator<Item = u64> + '_ {
        self.synapses.values().map(|s| s.innovation)
    }

    /// Number of enabled synapses.
    #[must_use]
    pub fn num_enabled_synapses(&self) -> usize {
        self.synapses.values().filter(|s| s.enabled).count()
    }

    /// Whether some synapse already runs from `from` to `to`.
    fn has_synapse(&self, from: NodeId, to: NodeId) -> bool {
        self.synapses
            .values()
            .any(|s| s.from == from && s.to == to)
    }

    /// Insert a synapse, numbering it through the shared history.
    fn create_synapse(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        history: &mut InnovationHistory,
    ) -> SynapseId {
        let innovation = history.innovation_for(
            self.nodes[from].number,
            self.nodes[to].number,
            self.synapses.values().map(|s| s.innovation),
        );
        self.synapses
            .insert(Synapse::new(innovation, from, to, weight))
    }

    /// Connect every input and the bias node to every output.
    ///
    /// Pairs that are already connected are skipped.
    pub fn fully_connect<R: Rng>(&mut self, history: &mut InnovationHistory, rng: &mut R) {
        let sources: Vec<NodeId> = self
            .input_ids
            .iter()
            .copied()
            .chain(std::iter::once(self.bias_id))
            .collect();
        let outputs = self.output_ids.clone();

        for &from in &sources {
            for &to in &outputs {
                if self.has_synapse(from, to) {
                    continue;
                }
                let weight = rng.random_range(-1.0..=1.0);
                self.create_synapse(from, to, weight, history);
            }
        }

        self.connect_nodes();
    }

    /// Whether the genome holds as many synapses as its layer structure allows.
    ///
    /// Each layer can feed every node in all later layers, so the ceiling is
    /// the sum over layers of `nodes_in_layer * nodes_in_front`.
    #[must_use]
    pub fn is_fully_connected(&self) -> bool {
        let layer_slots = self
            .nodes
            .values()
            .map(|n| n.layer as usize + 1)
            .max()
            .unwrap_or(0)
            .max(self.layers as usize);
        let mut nodes_in_layers = vec![0usize; layer_slots];
        for node in self.nodes.values() {
            nodes_in_layers[node.layer as usize] += 1;
        }

        let mut nodes_in_front = self.nodes.len();
        let mut max_synapses = 0;
        for count in nodes_in_layers {
            nodes_in_front -= count;
            max_synapses += count * nodes_in_front;
        }

        self.synapses.len() >= max_synapses
    }

    /// Mutate weights and, rarely, the structure.
    ///
    /// A genome without synapses always gains a connection. Otherwise each
    /// operator fires on its own coin flip.
    ///
    /// # Errors
    ///
    /// Propagates [`NeatError::ExhaustedConnectionCandidates`] from
    /// [`add_connection`](Self::add_connection).
    pub fn mutate<R: Rng>(&mut self, history: &mut InnovationHistory, rng: &mut R) -> Result<()> {
        if self.synapses.is_empty() {
            self.add_connection(history, rng)?;
            return Ok(());
        }

        if rng.random::<f64>() < self.config.weight_mutation_prob {
            self.mutate_weights(rng);
        }
        if rng.random::<f64>() < self.config.add_connection_prob {
            self.add_connection(history, rng)?;
        }
        if rng.random::<f64>() < self.config.add_node_prob {
            self.add_node(history, rng)?;
        }

        Ok(())
    }

    /// Replace or nudge every synapse weight.
    fn mutate_weights<R: Rng>(&mut self, rng: &mut R) {
        let replace_prob = self.config.weight_replace_prob;
        let divisor = self.config.weight_perturb_divisor;

        for synapse in self.synapses.values_mut() {
            if rng.random::<f64>() < replace_prob {
                synapse.weight = rng.random_range(-1.0..=1.0);
            } else {
                let nudge: f64 = rng.sample(StandardNormal);
                synapse.weight = (synapse.weight + nudge / divisor).clamp(-1.0, 1.0);
            }
        }
    }

    /// Add a synapse between two random unconnected nodes on different layers.
    ///
    /// Returns `Ok(None)` when the genome is already fully connected. The new
    /// synapse always runs from the lower layer to the higher one.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::ExhaustedConnectionCandidates`] if no valid pair
    /// exists even though the synapse count is below the ceiling.
    pub fn add_connection<R: Rng>(
        &mut self,
        history: &mut InnovationHistory,
        rng: &mut R,
    ) -> Result<Option<SynapseId>> {
        if self.is_fully_connected() {
            return Ok(None);
        }

        self.connect_nodes();
        let ids: Vec<NodeId> = self.nodes.keys().collect();
        let can_connect =
            |g: &Self, a: NodeId, b: NodeId| g.nodes[a].layer != g.nodes[b].layer && !g.connected_to(a, b);

        let mut pair = None;
        let max_attempts = ids.len() * ids.len() * 4;
        for _ in 0..max_attempts {
            let picked: Vec<NodeId> = ids.choose_multiple(rng, 2).copied().collect();
            if let [a, b] = picked[..] {
                if can_connect(self, a, b) {
                    pair = Some((a, b));
                    break;
                }
            }
        }

        if pair.is_none() {
            let candidates: Vec<(NodeId, NodeId)> = ids
                .iter()
                .flat_map(|&a| ids.iter().map(move |&b| (a, b)))
                .filter(|&(a, b)| self.nodes[a].layer < self.nodes[b].layer)
                .filter(|&(a, b)| can_connect(self, a, b))
                .collect();
            pair = candidates.choose(rng).copied();
        }

        let (mut from, mut to) = pair.ok_or(NeatError::ExhaustedConnectionCandidates)?;
        if self.nodes[from].layer > self.nodes[to].layer {
            std::mem::swap(&mut from, &mut to);
        }

        let weight = rng.random_range(-1.0..=1.0);
        let id = self.create_synapse(from, to, weight, history);
        self.connect_nodes();
        Ok(Some(id))
    }

    /// Split a random synapse with a new hidden node.
    ///
    /// The split synapse is disabled and replaced by `source -> new` (weight 1),
    /// `new -> target` (the old weight) and `bias -> new` (weight 0). The new
    /// node sits one layer above the source; when that is the target's layer,
    /// every other node on or above it moves up one layer and the genome gains
    /// a layer.
    ///
    /// Synapses leaving the bias node are never split. Returns `Ok(None)` when
    /// there is nothing to split.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`add_connection`](Self::add_connection) when
    /// the genome has no synapses yet.
    pub fn add_node<R: Rng>(
        &mut self,
        history: &mut InnovationHistory,
        rng: &mut R,
    ) -> Result<Option<NodeId>> {
        if self.synapses.is_empty() {
            self.add_connection(history, rng)?;
            return Ok(None);
        }

        let bias_id = self.bias_id;
        let candidates: Vec<SynapseId> = self
            .synapses
            .iter()
            .filter(|(_, s)| s.from != bias_id)
            .map(|(id, _)| id)
            .collect();
        let Some(&split_id) = candidates.choose(rng) else {
            return Ok(None);
        };

        let split = &mut self.synapses[split_id];
        split.enabled = false;
        let (from, to, weight) = (split.from, split.to, split.weight);

        let layer = self.nodes[from].layer + 1;
        let new_id = self
            .nodes
            .insert(Node::new(self.next_node, layer, NodeKind::Hidden));
        self.next_node += 1;

        self.create_synapse(from, new_id, 1.0, history);
        self.create_synapse(new_id, to, weight, history);
        self.create_synapse(bias_id, new_id, 0.0, history);

        if layer == self.nodes[to].layer {
            for (id, node) in &mut self.nodes {
                if id != new_id && node.layer >= layer {
                    node.layer += 1;
                }
            }
            self.layers += 1;
        }

        self.connect_nodes();
        Ok(Some(new_id))
    }

    /// Breed a child with `parent`, treating `self` as the fitter parent.
    ///
    /// Matching genes (same innovation number) come from either parent at
    /// random; disjoint and excess genes come from `self`. The child carries
    /// exactly as many synapses as `self` and a copy of all of its nodes.
    #[must_use]
    pub fn crossover<R: Rng>(&self, parent: &Genome, rng: &mut R) -> Genome {
        let mut child = Genome {
            nodes: self.nodes.clone(),
            synapses: SlotMap::with_key(),
            input_ids: self.input_ids.clone(),
            output_ids: self.output_ids.clone(),
            bias_id: self.bias_id,
            layers: self.layers,
            next_node: self.next_node,
            network: Vec::new(),
            config: self.config.clone(),
        };

        let child_nodes: HashMap<u32, NodeId> =
            child.nodes.iter().map(|(id, n)| (n.number, id)).collect();
        let parent_genes: HashMap<u64, &Synapse> = parent
            .synapses
            .values()
            .map(|s| (s.innovation, s))
            .collect();

        for own in self.synapses.values() {
            let gene = match parent_genes.get(&own.innovation) {
                Some(&theirs) => {
                    let enabled = if own.is_disabled() || theirs.is_disabled() {
                        rng.random::<f64>() >= self.config.inherit_disabled_prob
                    } else {
                        true
                    };

                    // Endpoints of the parent's copy are remapped by node number.
                    let remapped = child_nodes
                        .get(&parent.nodes[theirs.from].number)
                        .zip(child_nodes.get(&parent.nodes[theirs.to].number));
                    let chosen = match remapped {
                        Some((&from, &to)) if !rng.random::<bool>() => Synapse {
                            from,
                            to,
                            ..theirs.clone()
                        },
                        _ => own.clone(),
                    };

                    Synapse { enabled, ..chosen }
                }
                None => own.clone(),
            };
            child.synapses.insert(gene);
        }

        child.connect_nodes();
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn connected_genome(inputs: usize, outputs: usize) -> (Genome, InnovationHistory) {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(inputs, outputs));
        genome.fully_connect(&mut history, &mut test_rng());
        (genome, history)
    }

    #[test]
    fn test_new_genome_layout() {
        let genome = Genome::new(NeatConfig::new(3, 2));

        assert_eq!(genome.num_inputs(), 3);
        assert_eq!(genome.num_outputs(), 2);
        assert_eq!(genome.nodes.len(), 6);
        assert_eq!(genome.synapses.len(), 0);
        assert_eq!(genome.layers, 2);
        assert_eq!(genome.next_node, 6);

        let numbers: Vec<u32> = genome.input_ids.iter().map(|&id| genome.nodes[id].number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(genome.nodes[genome.output_ids[0]].number, 3);
        assert_eq!(genome.nodes[genome.bias_id].number, 5);
        assert_eq!(genome.nodes[genome.bias_id].layer, 0);
    }

    #[test]
    fn test_fully_connect() {
        let (genome, history) = connected_genome(2, 2);

        // 2 inputs * 2 outputs + bias * 2 outputs
        assert_eq!(genome.synapses.len(), 6);
        assert_eq!(history.len(), 6);
        assert!(genome.is_fully_connected());
    }

    #[test]
    fn test_fully_connect_is_idempotent() {
        let (mut genome, mut history) = connected_genome(2, 1);
        genome.fully_connect(&mut history, &mut test_rng());
        assert_eq!(genome.synapses.len(), 3);
    }

    #[test]
    fn test_add_connection_on_fully_connected_is_noop() {
        let (mut genome, mut history) = connected_genome(2, 1);
        let added = genome.add_connection(&mut history, &mut test_rng()).unwrap();
        assert!(added.is_none());
        assert_eq!(genome.synapses.len(), 3);
    }

    #[test]
    fn test_add_connection_orders_by_layer() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(2, 1));
        let mut rng = test_rng();

        let id = genome.add_connection(&mut history, &mut rng).unwrap().unwrap();
        let synapse = &genome.synapses[id];
        assert!(genome.nodes[synapse.from].layer < genome.nodes[synapse.to].layer);
        assert!(genome.connected_to(synapse.from, synapse.to));
        assert!(genome.connected_to(synapse.to, synapse.from));
    }

    #[test]
    fn test_add_connection_fills_genome() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(3, 2));
        let mut rng = test_rng();

        while !genome.is_fully_connected() {
            genome.add_connection(&mut history, &mut rng).unwrap();
        }
        // 4 layer-0 nodes feeding 2 outputs
        assert_eq!(genome.synapses.len(), 8);
    }

    #[test]
    fn test_add_node_splits_synapse() {
        let (mut genome, mut history) = connected_genome(2, 1);
        let mut rng = test_rng();

        let new_id = genome.add_node(&mut history, &mut rng).unwrap().unwrap();

        assert_eq!(genome.nodes.len(), 5);
        assert_eq!(genome.synapses.len(), 6);
        assert_eq!(genome.num_enabled_synapses(), 5);
        assert_eq!(genome.nodes[new_id].kind, NodeKind::Hidden);
        assert_eq!(genome.nodes[new_id].number, 4);
        assert_eq!(genome.next_node, 5);

        let disabled: Vec<&Synapse> = genome.synapses.values().filter(|s| !s.enabled).collect();
        assert_eq!(disabled.len(), 1);
        assert_ne!(disabled[0].from, genome.bias_id);
    }

    #[test]
    fn test_add_node_wires_expected_weights() {
        let (mut genome, mut history) = connected_genome(1, 1);
        let mut rng = test_rng();
        let input = genome.input_ids[0];
        let output = genome.output_ids[0];
        let old_weight = genome.synapses.values().find(|s| s.from == input).unwrap().weight;

        let new_id = genome.add_node(&mut history, &mut rng).unwrap().unwrap();

        let weight_of = |from: NodeId, to: NodeId| {
            genome
                .synapses
                .values()
                .find(|s| s.from == from && s.to == to)
                .map(|s| s.weight)
        };
        assert_eq!(weight_of(input, new_id), Some(1.0));
        assert_eq!(weight_of(new_id, output), Some(old_weight));
        assert_eq!(weight_of(genome.bias_id, new_id), Some(0.0));
    }

    #[test]
    fn test_add_node_layer_shift() {
        let (mut genome, mut history) = connected_genome(2, 1);
        let mut rng = test_rng();
        let before: HashMap<u32, u32> = genome.nodes.values().map(|n| (n.number, n.layer)).collect();

        let new_id = genome.add_node(&mut history, &mut rng).unwrap().unwrap();

        assert_eq!(genome.layers, 3);
        assert_eq!(genome.nodes[new_id].layer, 1);
        for node in genome.nodes.values() {
            if let Some(&old) = before.get(&node.number) {
                let expected = if old >= 1 { old + 1 } else { old };
                assert_eq!(node.layer, expected, "node {} moved incorrectly", node.number);
            }
        }
        for synapse in genome.synapses.values() {
            assert_ne!(synapse.from, synapse.to);
            assert!(genome.nodes[synapse.from].layer < genome.nodes[synapse.to].layer);
        }
    }

    #[test]
    fn test_add_node_without_synapses_adds_connection() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(2, 1));
        let added = genome.add_node(&mut history, &mut test_rng()).unwrap();

        assert!(added.is_none());
        assert_eq!(genome.synapses.len(), 1);
        assert_eq!(genome.nodes.len(), 4);
    }

    #[test]
    fn test_add_node_only_bias_synapses_is_noop() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(1, 1));
        let (bias, out) = (genome.bias_id, genome.output_ids[0]);
        genome.create_synapse(bias, out, 0.3, &mut history);

        let added = genome.add_node(&mut history, &mut test_rng()).unwrap();
        assert!(added.is_none());
        assert_eq!(genome.synapses.len(), 1);
        assert!(genome.synapses.values().all(|s| s.enabled));
    }

    #[test]
    fn test_mutate_empty_genome_forces_connection() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig::new(2, 2));
        genome.mutate(&mut history, &mut test_rng()).unwrap();
        assert_eq!(genome.synapses.len(), 1);
    }

    #[test]
    fn test_weight_mutation_stays_clamped() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig {
            weight_mutation_prob: 1.0,
            add_connection_prob: 0.0,
            add_node_prob: 0.0,
            weight_perturb_divisor: 0.5,
            ..NeatConfig::new(3, 2)
        });
        let mut rng = test_rng();
        genome.fully_connect(&mut history, &mut rng);

        for _ in 0..200 {
            genome.mutate(&mut history, &mut rng).unwrap();
        }
        assert!(genome
            .synapses
            .values()
            .all(|s| (-1.0..=1.0).contains(&s.weight)));
        assert_eq!(genome.synapses.len(), 8);
    }

    #[test]
    fn test_structural_mutation_keeps_layers_consistent() {
        let mut history = InnovationHistory::new();
        let mut genome = Genome::new(NeatConfig {
            add_connection_prob: 0.5,
            add_node_prob: 0.5,
            ..NeatConfig::new(3, 2)
        });
        let mut rng = test_rng();
        genome.fully_connect(&mut history, &mut rng);

        for _ in 0..100 {
            genome.mutate(&mut history, &mut rng).unwrap();
        }

        assert!(genome.nodes.values().all(|n| n.layer < genome.layers));
        for synapse in genome.synapses.values() {
            assert!(genome.nodes[synapse.from].layer < genome.nodes[synapse.to].layer);
        }
        let numbers: std::collections::HashSet<u32> = genome.nodes.values().map(|n| n.number).collect();
        assert_eq!(numbers.len(), genome.nodes.len());
    }

    #[test]
    fn test_clone_preserves_structure() {
        let (mut genome, mut history) = connected_genome(2, 1);
        let mut rng = test_rng();
        genome.add_node(&mut history, &mut rng).unwrap();
        let records = history.len();

        let copy = genome.clone();
        assert_eq!(copy.nodes.len(), genome.nodes.len());
        assert_eq!(copy.layers, genome.layers);
        assert_eq!(copy.next_node, genome.next_node);
        assert_eq!(copy.bias_id, genome.bias_id);
        for (a, b) in genome.synapses.values().zip(copy.synapses.values()) {
            assert_eq!(a.innovation, b.innovation);
            assert_eq!(a.weight, b.weight);
            assert_eq!(a.enabled, b.enabled);
            assert_eq!(genome.nodes[a.from].number, copy.nodes[b.from].number);
        }
        assert_eq!(history.len(), records);
    }

    #[test]
    fn test_crossover_keeps_caller_gene_count() {
        let mut history = InnovationHistory::new();
        let mut rng = test_rng();
        let config = NeatConfig::new(3, 2);

        let mut fitter = Genome::new(config.clone());
        fitter.fully_connect(&mut history, &mut rng);
        let mut other = Genome::new(config);
        other.fully_connect(&mut history, &mut rng);

        fitter.add_node(&mut history, &mut rng).unwrap();
        other.add_node(&mut history, &mut rng).unwrap();
        other.add_node(&mut history, &mut rng).unwrap();

        let child = fitter.crossover(&other, &mut rng);
        assert_eq!(child.synapses.len(), fitter.synapses.len());
        assert_eq!(child.nodes.len(), fitter.nodes.len());

        let expected: Vec<u64> = fitter.innovations().collect();
        let actual: Vec<u64> = child.innovations().collect();
        assert_eq!(actual, expected);

        for synapse in child.synapses.values() {
            assert!(child.nodes.contains_key(synapse.from));
            assert!(child.nodes.contains_key(synapse.to));
        }
    }

    #[test]
    fn test_crossover_disjoint_genes_keep_enabled_state() {
        let (mut fitter, mut history) = connected_genome(2, 1);
        let mut rng = test_rng();
        let other = Genome::new(NeatConfig::new(2, 1));

        fitter.add_node(&mut history, &mut rng).unwrap();
        let child = fitter.crossover(&other, &mut rng);

        for (a, b) in fitter.synapses.values().zip(child.synapses.values()) {
            assert_eq!(a.enabled, b.enabled);
            assert_eq!(a.weight, b.weight);
        }
    }

    #[test]
    fn test_crossover_disabled_matching_genes_mostly_stay_disabled() {
        let (mut fitter, _) = connected_genome(3, 2);
        let other = fitter.clone();
        for synapse in fitter.synapses.values_mut() {
            synapse.enabled = false;
        }

        let mut rng = test_rng();
        let mut disabled = 0usize;
        let mut total = 0usize;
        for _ in 0..500 {
            let child = fitter.crossover(&other, &mut rng);
            total += child.synapses.len();
            disabled += child.synapses.values().filter(|s| s.is_disabled()).count();
        }

        // 8 matching genes per child, each disabled with probability 0.75
        let fraction = disabled as f64 / total as f64;
        assert_eq!(total, 4000);
        assert!(
            (0.7..=0.8).contains(&fraction),
            "disabled fraction {} too far from 0.75",
            fraction
        );
    }

    #[test]
    fn test_crossover_disabled_in_other_parent_only() {
        let (fitter, _) = connected_genome(3, 2);
        let mut other = fitter.clone();
        for synapse in other.synapses.values_mut() {
            synapse.enabled = false;
        }

        let mut rng = test_rng();
        let disabled: usize = (0..500)
            .map(|_| {
                let child = fitter.crossover(&other, &mut rng);
                child.synapses.values().filter(|s| s.is_disabled()).count()
            })
            .sum();

        let fraction = disabled as f64 / 4000.0;
        assert!((0.7..=0.8).contains(&fraction), "fraction {}", fraction);
    }

    #[test]
    fn test_weight_mutation_mostly_nudges() {
        let (mut genome, _) = connected_genome(10, 10);
        let mut rng = test_rng();
        let mut replaced = 0usize;
        let mut nudged = 0usize;
        let mut total = 0usize;

        for _ in 0..20 {
            for synapse in genome.synapses.values_mut() {
                synapse.weight = 0.5;
            }
            genome.mutate_weights(&mut rng);

            for synapse in genome.synapses.values() {
                let delta = (synapse.weight - 0.5).abs();
                total += 1;
                // A nudge is N(0, 1) / 50, so 0.1 is five standard deviations
                if delta > 0.1 {
                    replaced += 1;
                } else if delta > 0.0 {
                    nudged += 1;
                }
            }
        }

        // 10% are replaced; 9 in 10 of those land more than 0.1 away
        let replaced_fraction = replaced as f64 / total as f64;
        assert_eq!(total, 2200);
        assert!(
            (0.06..=0.12).contains(&replaced_fraction),
            "replaced fraction {}",
            replaced_fraction
        );
        assert!(nudged as f64 / total as f64 > 0.85);
    }

    #[test]
    fn test_crossover_matching_genes_take_either_weight() {
        let (fitter, _) = connected_genome(2, 1);
        let mut other = fitter.clone();
        for synapse in other.synapses.values_mut() {
            synapse.weight = 0.123;
        }

        let mut rng = test_rng();
        let child = fitter.crossover(&other, &mut rng);
        for (own, gene) in fitter.synapses.values().zip(child.synapses.values()) {
            assert!(gene.weight == own.weight || gene.weight == 0.123);
            assert!(gene.enabled);
        }
    }
}

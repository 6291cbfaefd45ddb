//! An agent pairs a genome with its fitness record and its host entity.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::error::Result;
use crate::genome::Genome;
use crate::host::{AgentHost, EntityId};

/// One controller in a population.
///
/// The agent's life runs as `look -> think -> update` once per tick until the
/// host marks it finished. Cloning an `Agent` with [`Clone`] produces a
/// detached snapshot that still names the same entity; use
/// [`replicate`](Self::replicate) to obtain a new agent wired to a new entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// The agent's network.
    pub genome: Genome,
    /// The controlled entity.
    pub entity: EntityId,
    /// Fitness assigned by the host at the end of a generation.
    pub fitness: f64,
    /// Running score maintained by the host.
    pub score: f64,
    /// Generation in which the agent was last recorded as the best.
    pub generation: usize,
    /// Best score this lineage has reached.
    pub best_score: f64,
    lifespan: u64,
    finished: bool,
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

impl Agent {
    /// Create an agent with an unconnected genome.
    #[must_use]
    pub fn new(entity: EntityId, config: &NeatConfig) -> Self {
        Self::with_genome(entity, Genome::new(config.clone()))
    }

    fn with_genome(entity: EntityId, genome: Genome) -> Self {
        Self {
            genome,
            entity,
            fitness: 0.0,
            score: 0.0,
            generation: 0,
            best_score: 0.0,
            lifespan: 0,
            finished: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Store the sensory inputs for the next [`think`](Self::think).
    pub fn look(&mut self, inputs: Vec<f64>) {
        self.inputs = inputs;
    }

    /// Feed the last inputs through the network.
    ///
    /// # Errors
    ///
    /// Propagates feed-forward errors, e.g. when the host supplied the wrong
    /// number of inputs.
    pub fn think(&mut self) -> Result<&[f64]> {
        self.outputs = self.genome.feed_forward(&self.inputs)?;
        Ok(&self.outputs)
    }

    /// Advance the lifespan by one tick.
    pub fn update(&mut self) {
        self.lifespan += 1;
    }

    /// Mark the agent as done for this generation.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Whether the host has finished this agent.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the agent is still being simulated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.finished
    }

    /// Ticks lived so far.
    #[must_use]
    pub fn lifespan(&self) -> u64 {
        self.lifespan
    }

    /// Inputs given to the last [`look`](Self::look).
    #[must_use]
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Outputs of the last [`think`](Self::think).
    #[must_use]
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// Copy this agent onto a new host entity.
    ///
    /// The genome, fitness, generation and best score carry over; the
    /// lifespan, score and finished flag start fresh.
    pub fn replicate<H: AgentHost>(&self, host: &mut H) -> Agent {
        let mut genome = self.genome.clone();
        genome.generate_network();

        let mut agent = Self::with_genome(host.replicate(self.entity), genome);
        agent.fitness = self.fitness;
        agent.generation = self.generation;
        agent.best_score = self.best_score;
        agent
    }

    /// Breed with `parent` onto a new host entity, `self` being the fitter one.
    pub fn crossover<H: AgentHost, R: Rng>(
        &self,
        parent: &Agent,
        host: &mut H,
        rng: &mut R,
    ) -> Agent {
        let mut genome = self.genome.crossover(&parent.genome, rng);
        genome.generate_network();
        Self::with_genome(host.replicate(self.entity), genome)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Agent {:?} - Score: {} - Fitness: {}",
            self.entity, self.score, self.fitness
        )
    }
}

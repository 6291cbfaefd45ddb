//! The generational cycle.
//!
//! A [`Generation`] owns the population, the innovation history and the
//! species pool. The host drives it tick by tick; once every agent is
//! finished, [`Generation::natural_selection`] scores, speciates, culls and
//! breeds the next population in one step.

use log::info;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::agent::Agent;
use crate::config::NeatConfig;
use crate::error::{NeatError, Result};
use crate::host::{AgentHost, EntityId};
use crate::innovation::InnovationHistory;
use crate::species::SpeciesPool;

/// Where a generation is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Agents are being simulated by the host.
    Running,
    /// Fitness is being collected from the host.
    EvaluatingFitness,
    /// Agents are being assigned to species.
    Speciating,
    /// Species are being trimmed and removed.
    Culling,
    /// The next population is being bred.
    Reproducing,
}

/// A population and the bookkeeping for its evolution.
#[derive(Debug)]
pub struct Generation {
    number: usize,
    population_size: usize,
    config: NeatConfig,
    agents: Vec<Agent>,
    history: InnovationHistory,
    species: SpeciesPool,
    phase: Phase,
    evolving: bool,
    best_agent: Option<Agent>,
    best_score: f64,
}

impl Generation {
    /// Create an empty generation for `population_size` agents.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] if the config is invalid or the
    /// population size is zero.
    pub fn new(config: NeatConfig, population_size: usize) -> Result<Self> {
        config.validate()?;
        if population_size == 0 {
            return Err(NeatError::InvalidConfig(
                "population size must be at least 1".into(),
            ));
        }

        Ok(Self {
            number: 1,
            population_size,
            species: SpeciesPool::new(config.clone()),
            config,
            agents: Vec::with_capacity(population_size),
            history: InnovationHistory::new(),
            phase: Phase::Running,
            evolving: true,
            best_agent: None,
            best_score: 0.0,
        })
    }

    /// Fill the population with fresh agents from the host and build their
    /// networks.
    ///
    /// # Errors
    ///
    /// Propagates mutation errors from [`generate_network`](Self::generate_network).
    pub fn populate<H: AgentHost, R: Rng>(&mut self, host: &mut H, rng: &mut R) -> Result<()> {
        self.agents = (0..self.population_size)
            .map(|_| Agent::new(host.create(), &self.config))
            .collect();
        self.phase = Phase::Running;
        self.generate_network(rng)
    }

    /// Fully connect, mutate and compile every agent's genome.
    ///
    /// # Errors
    ///
    /// Propagates mutation errors.
    pub fn generate_network<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        for agent in &mut self.agents {
            agent.genome.fully_connect(&mut self.history, rng);
            agent.genome.mutate(&mut self.history, rng)?;
            agent.genome.generate_network();
        }
        Ok(())
    }

    /// Run one simulation tick for every live agent.
    ///
    /// All live agents sense before any of them acts, so no decision in this
    /// tick sees another agent's move from the same tick.
    ///
    /// # Errors
    ///
    /// Propagates feed-forward errors, e.g. when the host senses the wrong
    /// number of inputs.
    pub fn tick<H: AgentHost>(&mut self, host: &mut H) -> Result<()> {
        let live: Vec<usize> = (0..self.agents.len())
            .filter(|&i| self.agents[i].is_alive())
            .collect();

        let senses: Vec<Vec<f64>> = live
            .iter()
            .map(|&i| host.sense(self.agents[i].entity))
            .collect();
        for (&i, inputs) in live.iter().zip(senses) {
            self.agents[i].look(inputs);
        }

        #[cfg(feature = "parallel")]
        self.agents
            .par_iter_mut()
            .filter(|agent| agent.is_alive())
            .try_for_each(|agent| agent.think().map(|_| ()))?;

        #[cfg(not(feature = "parallel"))]
        for agent in self.agents.iter_mut().filter(|agent| agent.is_alive()) {
            agent.think()?;
        }

        for &i in &live {
            let agent = &mut self.agents[i];
            let outputs = agent.outputs().to_vec();
            host.act(agent.entity, &outputs, agent);
            agent.update();
        }

        Ok(())
    }

    /// Whether every agent has been finished by the host.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.agents.iter().all(Agent::is_finished)
    }

    /// Finish every agent so the next check triggers selection.
    pub fn finish_all(&mut self) {
        for agent in &mut self.agents {
            agent.finish();
        }
    }

    /// Ask the host for every agent's fitness.
    pub fn set_fitness<H: AgentHost>(&mut self, host: &H) {
        for agent in &mut self.agents {
            agent.fitness = host.fitness(agent);
        }
    }

    /// Score the population and replace it with the next generation.
    ///
    /// The next population holds every surviving species' champion, offspring
    /// in proportion to each species' share of the average fitness, and
    /// padding (the previous best, then offspring of the leading species) up
    /// to exactly the population size.
    ///
    /// With evolution switched off (see [`set_evolving`](Self::set_evolving))
    /// only the fitness is collected and the population is left as it is.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::EmptySpeciesPool`] if no species with positive
    /// fitness survives, and propagates mutation errors. The phase reported by
    /// [`phase`](Self::phase) tells where the cycle stopped.
    pub fn natural_selection<H: AgentHost, R: Rng>(
        &mut self,
        host: &mut H,
        rng: &mut R,
    ) -> Result<()> {
        self.phase = Phase::EvaluatingFitness;
        self.set_fitness(host);
        if !self.evolving {
            self.phase = Phase::Running;
            return Ok(());
        }

        let previous_best = self
            .agents
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .cloned()
            .ok_or(NeatError::EmptySpeciesPool)?;

        self.phase = Phase::Speciating;
        self.species.separate(&self.agents);
        self.species.sort(&self.agents);

        self.phase = Phase::Culling;
        self.species.cull();
        self.record_best_agent();
        self.species.kill_stale();
        self.species.kill_bad(&self.agents, self.agents.len());

        self.phase = Phase::Reproducing;
        let fitness_average_sum = self.species.fitness_average_sum(&self.agents);
        if self.species.is_empty() || !(fitness_average_sum > 0.0) {
            return Err(NeatError::EmptySpeciesPool);
        }

        info!(
            "Generation: {} - Agents: {} - Mutations: {} - Species: {}",
            self.number,
            self.agents.len(),
            self.history.len(),
            self.species.len()
        );

        let target = self.agents.len();
        let mut children = Vec::with_capacity(target);
        for species in self.species.iter() {
            children.push(species.champion.replicate(host));

            let share = species.fitness_average(&self.agents) / fitness_average_sum;
            let extra = ((share * target as f64).floor() as usize).saturating_sub(1);
            for _ in 0..extra {
                children.push(species.make_baby(
                    &self.agents,
                    &self.config,
                    &mut self.history,
                    host,
                    rng,
                )?);
            }
        }
        children.truncate(target);

        if children.len() < target {
            children.push(previous_best.replicate(host));
        }
        if let Some(leader) = self.species.first() {
            while children.len() < target {
                children.push(leader.make_baby(
                    &self.agents,
                    &self.config,
                    &mut self.history,
                    host,
                    rng,
                )?);
            }
        }

        self.number += 1;
        self.agents = children;
        self.species.clear_members();
        for agent in &mut self.agents {
            agent.genome.generate_network();
        }
        self.phase = Phase::Running;
        Ok(())
    }

    /// Keep a snapshot of the leading agent if it beat the best score so far.
    fn record_best_agent(&mut self) {
        let Some(index) = self.species.first().and_then(|s| s.members.first().copied()) else {
            return;
        };

        let agent = &mut self.agents[index];
        agent.generation = self.number;
        if self.best_score >= agent.score {
            return;
        }

        if let Some(old) = &self.best_agent {
            info!(
                "Old best agent => Score: {} - Fitness: {}",
                self.best_score, old.fitness
            );
        }
        info!(
            "New best agent => Score: {} - Fitness: {}",
            agent.score, agent.fitness
        );

        self.best_score = agent.score;
        self.best_agent = Some(agent.clone());
    }

    /// Generation counter, starting at 1.
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    /// Target population size.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Switch breeding on or off for subsequent selections.
    pub fn set_evolving(&mut self, evolving: bool) {
        self.evolving = evolving;
    }

    /// Whether natural selection breeds a new population.
    #[must_use]
    pub fn is_evolving(&self) -> bool {
        self.evolving
    }

    /// Current phase of the cycle.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current population.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The current population, mutably (hosts update scores through this).
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Handles of the entities driven by the current population.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.agents.iter().map(|a| a.entity)
    }

    /// Replace the population with host-built agents.
    pub fn set_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
    }

    /// The shared innovation history.
    #[must_use]
    pub fn history(&self) -> &InnovationHistory {
        &self.history
    }

    /// Species surviving the last selection.
    ///
    /// Only champions and staleness carry over between cycles; member lists
    /// are empty until the next selection rebuilds them.
    #[must_use]
    pub fn species(&self) -> &SpeciesPool {
        &self.species
    }

    /// Snapshot of the best agent seen so far.
    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        self.best_agent.as_ref()
    }

    /// Best score seen so far.
    #[must_use]
    pub fn best_score(&self) -> f64 {
        self.best_score
    }
}

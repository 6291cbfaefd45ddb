//! Speciation: clustering agents around champions and breeding within clusters.
//!
//! A [`Species`] remembers a champion snapshot and how long it has gone
//! without improving. Its members are indices into the generation's agent
//! list and are rebuilt every cycle by [`SpeciesPool::separate`].

use std::collections::HashMap;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::agent::Agent;
use crate::config::NeatConfig;
use crate::error::Result;
use crate::genome::Genome;
use crate::host::AgentHost;
use crate::innovation::InnovationHistory;

/// Genes present in only one of the two genomes.
#[must_use]
pub fn excess_and_disjoint(a: &Genome, b: &Genome) -> usize {
    let theirs: HashMap<u64, f64> = b.synapses.values().map(|s| (s.innovation, s.weight)).collect();
    let matching = a.innovations().filter(|inn| theirs.contains_key(inn)).count();
    a.synapses.len() + b.synapses.len() - 2 * matching
}

/// Mean absolute weight difference over matching genes.
///
/// Zero when either genome has no synapses, `no_match_penalty` when both have
/// synapses but none match.
#[must_use]
pub fn average_weight_diff(a: &Genome, b: &Genome, no_match_penalty: f64) -> f64 {
    if a.synapses.is_empty() || b.synapses.is_empty() {
        return 0.0;
    }

    let theirs: HashMap<u64, f64> = b.synapses.values().map(|s| (s.innovation, s.weight)).collect();
    let (matching, total_diff) = a
        .synapses
        .values()
        .filter_map(|s| theirs.get(&s.innovation).map(|w| (s.weight - w).abs()))
        .fold((0usize, 0.0), |(n, sum), diff| (n + 1, sum + diff));

    if matching == 0 {
        no_match_penalty
    } else {
        total_diff / matching as f64
    }
}

/// Compatibility of `candidate` measured against `champion`.
///
/// The excess normalizer only looks at the candidate's size, so the measure
/// is not symmetric.
#[must_use]
pub fn compatibility(candidate: &Genome, champion: &Genome, config: &NeatConfig) -> f64 {
    let excess = excess_and_disjoint(candidate, champion) as f64;
    let weight_diff = average_weight_diff(candidate, champion, config.no_match_penalty);
    let normalizer = (candidate.synapses.len() as f64 - config.large_genome_offset as f64).max(1.0);

    config.excess_coeff * excess / normalizer + config.weight_diff_coeff * weight_diff
}

/// A cluster of compatible agents.
#[derive(Debug, Clone)]
pub struct Species {
    /// Snapshot of the best agent this species has produced.
    pub champion: Agent,
    /// Generations since the champion last improved.
    pub staleness: usize,
    /// Indices of this generation's members, best first after sorting.
    ///
    /// Empty between cycles: the list is rebuilt by
    /// [`SpeciesPool::separate`] and cleared once the population is replaced.
    pub members: Vec<usize>,
}

impl Species {
    /// Found a species around `agents[founder]`.
    #[must_use]
    pub fn new(founder: usize, agents: &[Agent]) -> Self {
        Self {
            champion: agents[founder].clone(),
            staleness: 0,
            members: vec![founder],
        }
    }

    /// Whether `genome` is close enough to the champion to join.
    #[must_use]
    pub fn is_compatible(&self, genome: &Genome, config: &NeatConfig) -> bool {
        compatibility(genome, &self.champion.genome, config) < config.compatibility_threshold
    }

    /// Total fitness of the members.
    #[must_use]
    pub fn fitness_sum(&self, agents: &[Agent]) -> f64 {
        self.members.iter().map(|&i| agents[i].fitness).sum()
    }

    /// Mean fitness of the members, 0 for an empty species.
    #[must_use]
    pub fn fitness_average(&self, agents: &[Agent]) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.fitness_sum(agents) / self.members.len() as f64
    }

    /// Highest member fitness.
    #[must_use]
    pub fn best_fitness(&self, agents: &[Agent]) -> f64 {
        self.members
            .iter()
            .map(|&i| agents[i].fitness)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Order members best first and update champion and staleness.
    pub fn sort(&mut self, agents: &[Agent]) {
        self.members
            .sort_by(|&a, &b| agents[b].fitness.total_cmp(&agents[a].fitness));

        match self.members.first() {
            Some(&top) if agents[top].fitness > self.champion.fitness => {
                self.champion = agents[top].clone();
                self.staleness = 0;
            }
            _ => self.staleness += 1,
        }
    }

    /// Keep the better half of a species with more than two members.
    pub fn cull(&mut self) {
        if self.members.len() <= 2 {
            return;
        }
        self.members.truncate(self.members.len() / 2);
    }

    /// Pick a member with probability proportional to fitness.
    ///
    /// Members are visited in shuffled order. Falls back to the top member
    /// when the roulette lands nowhere (e.g. every fitness is zero).
    ///
    /// # Panics
    ///
    /// Panics if the species has no members.
    pub fn select_parent<R: Rng>(&self, agents: &[Agent], rng: &mut R) -> usize {
        let sum = self.fitness_sum(agents);
        let mut target = if sum > 0.0 {
            rng.random_range(0.0..=sum)
        } else {
            0.0
        };

        let mut order = self.members.clone();
        order.shuffle(rng);
        for index in order {
            let fitness = agents[index].fitness;
            if target < fitness {
                return index;
            }
            target -= fitness;
        }

        self.members[0]
    }

    /// Produce one offspring for the next generation.
    ///
    /// Crossover between two selected parents (the fitter one leading) or a
    /// plain copy of one, followed by mutation.
    ///
    /// # Errors
    ///
    /// Propagates mutation errors.
    pub fn make_baby<H: AgentHost, R: Rng>(
        &self,
        agents: &[Agent],
        config: &NeatConfig,
        history: &mut InnovationHistory,
        host: &mut H,
        rng: &mut R,
    ) -> Result<Agent> {
        let mut baby = if rng.random::<f64>() < config.crossover_prob {
            let a = &agents[self.select_parent(agents, rng)];
            let b = &agents[self.select_parent(agents, rng)];
            let (fitter, other) = if a.fitness >= b.fitness { (a, b) } else { (b, a) };
            fitter.crossover(other, host, rng)
        } else {
            agents[self.select_parent(agents, rng)].replicate(host)
        };

        baby.genome.mutate(history, rng)?;
        Ok(baby)
    }
}

/// All species of a run.
///
/// Champions and staleness persist from one generation to the next; member
/// lists are rebuilt every cycle.
#[derive(Debug, Clone)]
pub struct SpeciesPool {
    species: Vec<Species>,
    config: NeatConfig,
}

impl SpeciesPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(config: NeatConfig) -> Self {
        Self {
            species: Vec::new(),
            config,
        }
    }

    /// Assign every agent to the first compatible species, founding new
    /// species as needed. Species that attract nobody are dropped.
    pub fn separate(&mut self, agents: &[Agent]) {
        for species in &mut self.species {
            species.members.clear();
        }

        let config = &self.config;
        for (index, agent) in agents.iter().enumerate() {
            match self
                .species
                .iter_mut()
                .find(|s| s.is_compatible(&agent.genome, config))
            {
                Some(species) => species.members.push(index),
                None => self.species.push(Species::new(index, agents)),
            }
        }

        self.species.retain(|s| !s.members.is_empty());
    }

    /// Sort members within each species, then species by their best member.
    pub fn sort(&mut self, agents: &[Agent]) {
        for species in &mut self.species {
            species.sort(agents);
        }
        self.species
            .sort_by(|a, b| b.best_fitness(agents).total_cmp(&a.best_fitness(agents)));
    }

    /// Halve every species with more than two members.
    pub fn cull(&mut self) {
        for species in &mut self.species {
            species.cull();
        }
    }

    /// Drop species that have stopped improving.
    ///
    /// This can empty the pool; reproduction reports that as
    /// [`NeatError::EmptySpeciesPool`](crate::error::NeatError::EmptySpeciesPool).
    pub fn kill_stale(&mut self) {
        let threshold = self.config.staleness_threshold;
        let before = self.species.len();
        self.species.retain(|s| s.staleness < threshold);
        debug!("Removed {} stale species", before - self.species.len());
    }

    /// Drop species too weak to earn a single offspring slot.
    pub fn kill_bad(&mut self, agents: &[Agent], population_size: usize) {
        let sum = self.fitness_average_sum(agents);
        if !(sum > 0.0) {
            return;
        }

        let before = self.species.len();
        self.species
            .retain(|s| s.fitness_average(agents) / sum * population_size as f64 >= 1.0);
        debug!("Removed {} weak species", before - self.species.len());
    }

    /// Sum of the species' average fitness.
    #[must_use]
    pub fn fitness_average_sum(&self, agents: &[Agent]) -> f64 {
        self.species.iter().map(|s| s.fitness_average(agents)).sum()
    }

    /// Forget every member list, keeping champions and staleness.
    ///
    /// Members index into one particular population, so they are cleared once
    /// that population has been replaced.
    pub fn clear_members(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }
    }

    /// The leading species.
    #[must_use]
    pub fn first(&self) -> Option<&Species> {
        self.species.first()
    }

    /// Iterate over species, best first after [`sort`](Self::sort).
    pub fn iter(&self) -> std::slice::Iter<'_, Species> {
        self.species.iter()
    }

    /// Iterate mutably over species.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Species> {
        self.species.iter_mut()
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether there are no species.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

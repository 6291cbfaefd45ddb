//! XOR example driving a NEAT generation through an `AgentHost`.
//!
//! Each entity is an XOR exam: on every tick the agent sees one row of the
//! truth table and its answer is graded. After four ticks the exam is over
//! and the agent's fitness is the squared accuracy.
//!
//! Run with: `RUST_LOG=info cargo run --example xor`

use neat_pilot::{Agent, AgentHost, EntityId, EntityRegistry, Generation, NeatConfig, NeatError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// XOR truth table.
const CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Progress of one exam.
#[derive(Debug, Default)]
struct Exam {
    row: usize,
    error: f64,
}

/// Hosts one exam per agent.
struct XorHost {
    exams: EntityRegistry<Exam>,
}

impl AgentHost for XorHost {
    fn create(&mut self) -> EntityId {
        self.exams.insert(Exam::default())
    }

    fn fitness(&self, agent: &Agent) -> f64 {
        // Max possible error is 4.0 (all wrong)
        let error = self.exams.get(agent.entity).map_or(4.0, |e| e.error);
        (4.0 - error).powi(2)
    }

    fn sense(&self, entity: EntityId) -> Vec<f64> {
        let row = self.exams.get(entity).map_or(0, |e| e.row);
        CASES[row % CASES.len()].0.to_vec()
    }

    fn act(&mut self, entity: EntityId, outputs: &[f64], agent: &mut Agent) {
        let Some(exam) = self.exams.get_mut(entity) else {
            agent.finish();
            return;
        };

        let expected = CASES[exam.row].1;
        exam.error += (outputs[0] - expected).powi(2);
        exam.row += 1;
        agent.score = 4.0 - exam.error;

        if exam.row == CASES.len() {
            agent.finish();
        }
    }
}

fn main() -> neat_pilot::Result<()> {
    env_logger::init();

    println!("NEAT XOR Example");
    println!("================\n");

    // Configuration
    let config = NeatConfig {
        add_connection_prob: 0.1,
        add_node_prob: 0.05,
        ..NeatConfig::new(2, 1)
    };

    let population_size = 150;
    let generations = 100;
    let seed = 42;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut host = XorHost {
        exams: EntityRegistry::new(),
    };
    let mut generation = Generation::new(config, population_size)?;
    generation.populate(&mut host, &mut rng)?;

    println!("Population: {}", population_size);
    println!("Generations: {}", generations);
    println!();

    let mut solution_generation = None;

    // Evolution loop
    for _ in 0..generations {
        while !generation.is_finished() {
            generation.tick(&mut host)?;
        }

        let best_score = generation
            .agents()
            .iter()
            .map(|a| a.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let number = generation.number();

        // Check for solution (score >= 3.9 is close enough)
        if best_score >= 3.9 && solution_generation.is_none() {
            solution_generation = Some(number);
        }

        match generation.natural_selection(&mut host, &mut rng) {
            Ok(()) => {}
            Err(NeatError::EmptySpeciesPool) => {
                // No species survived; start over from fresh genomes
                println!("Gen {:3}: species pool exhausted, repopulating", number);
                generation.populate(&mut host, &mut rng)?;
            }
            Err(e) => return Err(e),
        }
        host.exams.retain_only(generation.entities());

        // Print progress every 10 generations
        if number % 10 == 0 {
            println!(
                "Gen {:3}: best={:.4}, species={}, innovations={}",
                number,
                best_score,
                generation.species().len(),
                generation.history().len()
            );
        }
    }

    println!();

    let Some(champion) = generation.best_agent() else {
        println!("No agent ever scored above zero.");
        return Ok(());
    };

    println!("Evolution Complete!");
    println!("==================");
    println!("Best score: {:.4}", champion.score);
    println!("Recorded in generation: {}", champion.generation);
    println!("Nodes: {}", champion.genome.nodes.len());
    println!("Synapses: {}", champion.genome.num_enabled_synapses());
    println!("Layers: {}", champion.genome.layers);

    if let Some(gen) = solution_generation {
        println!("Solution found at generation: {}", gen);
    }

    // Test the champion
    println!("\nChampion XOR outputs:");
    let mut genome = champion.genome.clone();
    genome.generate_network();

    for (inputs, expected) in &CASES {
        let output = genome.feed_forward(inputs)?[0];
        let rounded = if output > 0.5 { 1.0 } else { 0.0 };
        let status = if (rounded - expected).abs() < 0.1 {
            "✓"
        } else {
            "✗"
        };
        println!(
            "  {} XOR {} = {:.4} (expected {}) {}",
            inputs[0] as i32, inputs[1] as i32, output, *expected as i32, status
        );
    }

    Ok(())
}

mod network;
mod persistence;

use network::{NetworkBuilder, RealTimeNetwork};
use persistence::RonPersistence;

use neuroevo::mutations::{
    ActivationResponseMutation, AddConnectionMutation, AddNeuronMutation, WeightMutation,
};
use neuroevo::reproduction::{CloneReproduction, CrossoverReproduction};
use neuroevo::{
    AnyOf, BoxError, DynamicThresholdSpeciator, Evolver, EvolverConfig, FitnessFunction,
    FitnessTarget, GenerationLimit, GeneticConfig, InMemoryPersistence, NaturalSelection, Organism,
    PopulationConfig, ReportingLevel,
};

use clap::Parser;
use log::{error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Deserialize;

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process;

const ERROR_MARGIN: f64 = 0.3;
const PERFECT_SCORE: f64 = 16.0;

/// Bias input first, then the two operands.
const CASES: [([f64; 3], f64); 4] = [
    ([1.0, 0.0, 0.0], 0.0),
    ([1.0, 0.0, 1.0], 1.0),
    ([1.0, 1.0, 0.0], 1.0),
    ([1.0, 1.0, 1.0], 0.0),
];

fn evaluate_xor(network: &mut RealTimeNetwork) -> f64 {
    let mut error = 0.0;
    for (input, expected) in CASES.iter() {
        let case_error = (network.evaluate_at(input)[0] - expected).abs();
        if case_error >= ERROR_MARGIN {
            error += case_error;
        }
    }
    (4.0 - error).powf(2.0)
}

struct XorFitness;

impl FitnessFunction<RealTimeNetwork> for XorFitness {
    fn evaluate(
        &mut self,
        subjects: &[(&Organism, RealTimeNetwork)],
    ) -> Result<Vec<f64>, BoxError> {
        Ok(subjects
            .par_iter()
            .map(|(_, network)| evaluate_xor(&mut network.clone()))
            .collect())
    }
}

/// Evolves networks computing XOR.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON settings file; defaults are used when omitted
    settings: Option<PathBuf>,
}

/// Run settings, read from a RON file when one is given.
/// Missing fields keep their defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct Settings {
    population: PopulationConfig,
    genetics: GeneticConfig,
    selection: NaturalSelection,
    speciation: DynamicThresholdSpeciator,
    add_connection: AddConnectionMutation,
    add_neuron: AddNeuronMutation,
    weight: WeightMutation,
    activation_response: ActivationResponseMutation,
    crossover: CrossoverReproduction,
    clone: CloneReproduction,
    generations: u64,
    seed: u64,
    /// Directory to store the run in. A run already stored
    /// there is resumed.
    output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            population: PopulationConfig::default(),
            genetics: GeneticConfig {
                input_count: NonZeroUsize::MIN.saturating_add(2),
                output_count: NonZeroUsize::MIN,
                ..GeneticConfig::default()
            },
            selection: NaturalSelection::default(),
            speciation: DynamicThresholdSpeciator::default(),
            add_connection: AddConnectionMutation::default(),
            add_neuron: AddNeuronMutation::default(),
            weight: WeightMutation::default(),
            activation_response: ActivationResponseMutation::default(),
            crossover: CrossoverReproduction::default(),
            clone: CloneReproduction::default(),
            generations: 100,
            seed: 0,
            output: None,
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings, BoxError> {
    Ok(ron::from_str(&fs::read_to_string(path)?)?)
}

fn run(settings: Settings) -> Result<(), BoxError> {
    if settings.genetics.input_count.get() != 3 || settings.genetics.output_count.get() != 1 {
        return Err("xor networks need 3 inputs and 1 output".into());
    }
    let persistence: Box<dyn neuroevo::Persistence> = match &settings.output {
        Some(directory) => Box::new(RonPersistence::open(directory)?),
        None => Box::new(InMemoryPersistence::new()),
    };
    let config = EvolverConfig {
        mutation_operators: vec![
            Box::new(settings.add_connection),
            Box::new(settings.add_neuron),
            Box::new(settings.weight),
            Box::new(settings.activation_response),
        ],
        reproduction_operators: vec![Box::new(settings.crossover), Box::new(settings.clone)],
        selector: Box::new(settings.selection),
        speciator: Box::new(settings.speciation),
        persistence,
        termination: Box::new(AnyOf(vec![
            Box::new(GenerationLimit(settings.generations)),
            Box::new(FitnessTarget(PERFECT_SCORE)),
        ])),
        reporting_level: Some(ReportingLevel::NoOrganisms),
        ..EvolverConfig::new(
            settings.population,
            settings.genetics,
            Box::new(ChaCha8Rng::seed_from_u64(settings.seed)),
            Box::new(XorFitness),
            Box::new(NetworkBuilder),
        )
    };

    let mut evolver = Evolver::new(config)?;
    let champion = evolver.run()?;
    let fitness = evolver.fitness_scores().peek_fitness(champion.id())?;
    if let Some(log) = evolver.logger().and_then(|logger| logger.last()) {
        println!("{}", log);
    }
    println!(
        "Champion after {} generations, fitness {:.3} ({} species, threshold {:.2}):\n{}",
        evolver.generation().number(),
        fitness,
        evolver.generation().species().len(),
        evolver.speciation_threshold(),
        champion
    );
    let mut network = RealTimeNetwork::new(&champion);
    for (input, expected) in CASES.iter() {
        info!(
            "{} xor {} = {:.3} (expected {})",
            input[1],
            input[2],
            network.evaluate_at(input)[0],
            expected
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let settings = match args.settings {
        Some(path) => match load_settings(&path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("could not read settings from {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Err(e) = run(settings) {
        error!("{}", e);
        process::exit(1);
    }
}

use neuroevo::{BoxError, FitnessScores, Generation, Innovations, Persistence};

use log::debug;
use ron::ser::PrettyConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::fs;
use std::path::{Path, PathBuf};

/// Stores a run as RON files in a directory: the latest
/// registry and fitness scores, and one file per generation.
#[derive(Clone, Debug)]
pub struct RonPersistence {
    directory: PathBuf,
}

impl RonPersistence {
    /// Uses `directory`, creating it if missing.
    pub fn open(directory: impl Into<PathBuf>) -> Result<RonPersistence, BoxError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(RonPersistence { directory })
    }

    fn generation_path(&self, number: u64) -> PathBuf {
        self.directory.join(format!("generation-{}.ron", number))
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<T, BoxError> {
        Ok(ron::from_str(&fs::read_to_string(path)?)?)
    }

    fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), BoxError> {
        fs::write(path, ron::ser::to_string_pretty(value, PrettyConfig::new())?)?;
        Ok(())
    }
}

impl Persistence for RonPersistence {
    fn load_innovations(&mut self) -> Result<Innovations, BoxError> {
        Self::read(&self.directory.join("innovations.ron"))
    }

    fn load_generation(
        &mut self,
        number: u64,
        innovations: &Innovations,
    ) -> Result<Generation, BoxError> {
        let generation: Generation = Self::read(&self.generation_path(number))?;
        if let Some(gene) = generation
            .genes()
            .find(|gene| innovations.gene(gene.innovation()).is_none())
        {
            return Err(format!(
                "gene {} of generation {} is not in the registry",
                gene.innovation(),
                number
            )
            .into());
        }
        Ok(generation)
    }

    fn load_fitness_scores(&mut self) -> Result<FitnessScores, BoxError> {
        Self::read(&self.directory.join("fitness.ron"))
    }

    fn add_generation(
        &mut self,
        innovations: &Innovations,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> Result<(), BoxError> {
        Self::write(&self.generation_path(generation.number()), generation)?;
        Self::write(&self.directory.join("innovations.ron"), innovations)?;
        Self::write(&self.directory.join("fitness.ron"), fitness)?;
        debug!(
            "stored generation {} in {}",
            generation.number(),
            self.directory.display()
        );
        Ok(())
    }

    /// Counts consecutively numbered generation files from 0.
    fn generation_count(&self) -> Result<u64, BoxError> {
        let mut count = 0;
        while self.generation_path(count).is_file() {
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevo::{Gene, NeuronGene, Organism, OrganismId};
    use tempfile::TempDir;

    #[test]
    fn round_trip() {
        let directory = TempDir::new().unwrap();
        let mut persistence = RonPersistence::open(directory.path().join("run")).unwrap();
        assert_eq!(persistence.generation_count().unwrap(), 0);

        let genes = vec![
            Gene::from(NeuronGene::input(1, 1.0)),
            Gene::from(NeuronGene::output(2, 1.0)),
        ];
        let organism = Organism::from_genes(OrganismId(3), genes.clone(), vec![]).unwrap();
        let generation = Generation::new(0, vec![], vec![organism], 3).unwrap();
        let mut innovations = Innovations::new();
        innovations.register_all(genes).unwrap();
        let mut fitness = FitnessScores::new(4);
        fitness.set_fitness(OrganismId(3), 9.0).unwrap();
        persistence
            .add_generation(&innovations, &generation, &fitness)
            .unwrap();

        assert_eq!(persistence.generation_count().unwrap(), 1);
        let innovations = persistence.load_innovations().unwrap();
        assert_eq!(innovations.len(), 2);
        let loaded = persistence.load_generation(0, &innovations).unwrap();
        assert_eq!(loaded.organisms()[0].id(), OrganismId(3));
        let fitness = persistence.load_fitness_scores().unwrap();
        assert_eq!(fitness.peek_fitness(OrganismId(3)), Ok(9.0));
        assert_eq!(fitness.capacity(), 4);
    }

    #[test]
    fn malformed_generation_is_rejected() {
        let directory = TempDir::new().unwrap();
        let mut persistence = RonPersistence::open(directory.path()).unwrap();
        let innovations = Innovations::new();
        fs::write(
            directory.path().join("generation-0.ron"),
            "(number: 0, species: [], organisms: [(id: (3), genes: [], specie: None, ancestry: [])], last_innovation: 3)",
        )
        .unwrap();
        assert_eq!(persistence.generation_count().unwrap(), 1);
        assert!(persistence.load_generation(0, &innovations).is_err());
    }
}

use crate::fitness::FitnessScores;
use crate::genomics::{Organism, OrganismId};
use crate::populations::PopulationError;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// Specie identifier, unique within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpecieId(pub u64);

impl fmt::Display for SpecieId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Species are collections of reproductively compatible
/// organisms. Membership is determined by the genetic
/// distance to a _representative_, which is always one
/// of the specie's current members.
///
/// Members are stored by id; the organisms themselves live
/// in the generation, and each holds a back-reference to its
/// specie which the specie keeps consistent.
///
/// A specie stagnates for every generation in which its
/// best fitness does not improve on the best seen so far.
///
/// A specie left without members is dead. Dead species are
/// dropped from the generation rather than kept with a flag,
/// so every stored specie is alive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Specie {
    id: SpecieId,
    members: Vec<OrganismId>,
    representative: OrganismId,
    age: usize,
    best_fitness: Option<f64>,
    stagnation: usize,
}

impl Specie {
    /// Creates a new specie with `representative`
    /// as its first and only member.
    pub fn new(id: SpecieId, representative: &mut Organism) -> Specie {
        representative.set_specie(Some(id));
        Specie {
            id,
            members: vec![representative.id()],
            representative: representative.id(),
            age: 0,
            best_fitness: None,
            stagnation: 0,
        }
    }

    pub fn id(&self) -> SpecieId {
        self.id
    }

    /// Member ids, in order of assignment.
    pub fn members(&self) -> &[OrganismId] {
        &self.members
    }

    pub fn representative(&self) -> OrganismId {
        self.representative
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A specie without members is dead, and
    /// is removed from its generation.
    pub fn is_dead(&self) -> bool {
        self.is_empty()
    }

    pub fn contains(&self, organism: OrganismId) -> bool {
        self.members.contains(&organism)
    }

    /// Number of generations the specie has been through.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Best fitness among the specie's members in any
    /// generation, if they were ever scored.
    pub fn best_fitness(&self) -> Option<f64> {
        self.best_fitness
    }

    /// Number of consecutive generations
    /// without fitness improvement.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Adds `organism` as a member and points its
    /// back-reference to this specie.
    pub fn add(&mut self, organism: &mut Organism) {
        organism.set_specie(Some(self.id));
        if !self.contains(organism.id()) {
            self.members.push(organism.id());
        }
    }

    /// Removes every member not in `survivors`, clearing the
    /// back-references of the removed organisms found in
    /// `organisms`. If the representative was removed, the
    /// first remaining member takes its place.
    pub fn cull(
        &mut self,
        survivors: &HashSet<OrganismId, RandomState>,
        organisms: &mut [Organism],
    ) -> Result<(), PopulationError> {
        let (kept, culled): (Vec<OrganismId>, Vec<OrganismId>) = self
            .members
            .iter()
            .copied()
            .partition(|id| survivors.contains(id));
        for organism in organisms.iter_mut().filter(|o| culled.contains(&o.id())) {
            if organism.specie() == Some(self.id) {
                organism.set_specie(None);
            }
        }
        self.members = kept;
        if !self.members.is_empty() && !self.contains(self.representative) {
            self.reassign_representative()?;
        }
        Ok(())
    }

    /// Makes the first member the specie's representative.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySpecie`] if the specie has no members.
    ///
    /// [`EmptySpecie`]: PopulationError::EmptySpecie
    pub fn reassign_representative(&mut self) -> Result<OrganismId, PopulationError> {
        let first = *self
            .members
            .first()
            .ok_or(PopulationError::EmptySpecie(self.id))?;
        self.representative = first;
        Ok(first)
    }

    /// Returns the fittest member, the earliest on ties.
    pub fn champion(&self, fitness: &FitnessScores) -> Result<Option<OrganismId>, PopulationError> {
        let mut champion: Option<(OrganismId, f64)> = None;
        for &member in &self.members {
            let score = fitness.peek_fitness(member)?;
            if champion.map_or(true, |(_, best)| score > best) {
                champion = Some((member, score));
            }
        }
        Ok(champion.map(|(id, _)| id))
    }

    /// Sum of the members' fitness scores.
    pub fn fitness_sum(&self, fitness: &FitnessScores) -> Result<f64, PopulationError> {
        let mut sum = 0.0;
        for &member in &self.members {
            sum += fitness.peek_fitness(member)?;
        }
        Ok(sum)
    }

    /// Drops every member while keeping the representative as the
    /// anchor for the next clustering pass.
    pub(crate) fn clear_members(&mut self) {
        self.members.clear();
    }

    pub(crate) fn start_generation(&mut self) {
        self.age += 1;
    }

    /// Updates the stagnation counter from the
    /// best fitness of the current members.
    pub(crate) fn update_stagnation(&mut self, fitness: &FitnessScores) -> Result<(), PopulationError> {
        let best = match self.champion(fitness)? {
            Some(champion) => fitness.peek_fitness(champion)?,
            None => return Ok(()),
        };
        if self.best_fitness.map_or(true, |previous| best > previous) {
            self.best_fitness = Some(best);
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Gene, NeuronGene};

    fn organism(id: u64) -> Organism {
        Organism::from_genes(
            OrganismId(id),
            vec![
                Gene::from(NeuronGene::input(1, 1.0)),
                Gene::from(NeuronGene::output(2, 1.0)),
            ],
            vec![],
        )
        .unwrap()
    }

    fn populated(ids: &[u64]) -> (Specie, Vec<Organism>) {
        let mut organisms: Vec<Organism> = ids.iter().map(|&id| organism(id)).collect();
        let mut specie = Specie::new(SpecieId(100), &mut organisms[0]);
        for organism in organisms.iter_mut().skip(1) {
            specie.add(organism);
        }
        (specie, organisms)
    }

    #[test]
    fn membership_is_mutual() {
        let (specie, organisms) = populated(&[1, 2, 3]);
        assert_eq!(specie.members(), &[OrganismId(1), OrganismId(2), OrganismId(3)]);
        assert_eq!(specie.representative(), OrganismId(1));
        assert!(organisms.iter().all(|o| o.specie() == Some(SpecieId(100))));
    }

    #[test]
    fn cull_reanchors_representative() {
        let (mut specie, mut organisms) = populated(&[1, 2, 3]);
        let survivors: HashSet<OrganismId, RandomState> =
            [OrganismId(3), OrganismId(2)].into_iter().collect();
        specie.cull(&survivors, &mut organisms).unwrap();

        assert_eq!(specie.members(), &[OrganismId(2), OrganismId(3)]);
        assert_eq!(specie.representative(), OrganismId(2));
        assert_eq!(organisms[0].specie(), None);
        assert_eq!(organisms[1].specie(), Some(SpecieId(100)));
    }

    #[test]
    fn cull_everything_kills() {
        let (mut specie, mut organisms) = populated(&[1, 2]);
        assert!(!specie.is_dead());
        specie.cull(&HashSet::default(), &mut organisms).unwrap();
        assert!(specie.is_empty());
        assert!(specie.is_dead());
        assert!(organisms.iter().all(|o| o.specie().is_none()));
        assert_eq!(
            specie.reassign_representative(),
            Err(PopulationError::EmptySpecie(SpecieId(100)))
        );
    }

    #[test]
    fn stagnation_tracking() {
        let (mut specie, _) = populated(&[1, 2]);
        let mut fitness = FitnessScores::new(10);
        fitness.set_fitness(OrganismId(1), 1.0).unwrap();
        fitness.set_fitness(OrganismId(2), 3.0).unwrap();

        specie.update_stagnation(&fitness).unwrap();
        assert_eq!(specie.best_fitness(), Some(3.0));
        assert_eq!(specie.time_stagnated(), 0);

        fitness.set_fitness(OrganismId(2), 2.0).unwrap();
        specie.update_stagnation(&fitness).unwrap();
        specie.update_stagnation(&fitness).unwrap();
        assert_eq!(specie.time_stagnated(), 2);

        fitness.set_fitness(OrganismId(1), 4.0).unwrap();
        specie.update_stagnation(&fitness).unwrap();
        assert_eq!(specie.time_stagnated(), 0);
        assert_eq!(specie.champion(&fitness).unwrap(), Some(OrganismId(1)));
        assert_eq!(specie.fitness_sum(&fitness).unwrap(), 6.0);
    }

    #[test]
    fn champion_ties_favor_earliest() {
        let (specie, _) = populated(&[1, 2]);
        let mut fitness = FitnessScores::new(10);
        fitness.set_fitness(OrganismId(2), 1.0).unwrap();
        fitness.set_fitness(OrganismId(1), 1.0).unwrap();
        assert_eq!(specie.champion(&fitness).unwrap(), Some(OrganismId(1)));
    }
}

use crate::genomics::OrganismId;
use crate::Innovation;

use thiserror::Error;

/// Errors arising from organism construction,
/// structural mutation and the innovation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomicsError {
    /// A gene was registered under an id already
    /// holding a structurally different gene.
    #[error("innovation {0} is already registered with different content")]
    ConflictingInnovation(Innovation),
    #[error("organism {0} has no input neurons")]
    MissingInputs(OrganismId),
    #[error("organism {0} has no output neurons")]
    MissingOutputs(OrganismId),
    #[error("connection {connection} of organism {organism} references absent neuron {neuron}")]
    DanglingConnection {
        organism: OrganismId,
        connection: Innovation,
        neuron: Innovation,
    },
    #[error("gene {1} is already present in organism {0}")]
    DuplicateGene(OrganismId, Innovation),
}

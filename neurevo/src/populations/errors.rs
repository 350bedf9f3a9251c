use crate::EmptyCollectionError;

use std::error::Error;
use std::fmt;
use std::io;

/// An error type indicating a failure during a
/// population's generational turnover.
#[derive(Debug)]
pub enum EvolutionError {
    /// Writing a champion checkpoint failed.
    Checkpoint(io::Error),
    /// Reproduction had no individuals to draw parents from.
    EmptyPopulation(EmptyCollectionError),
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkpoint(e) => write!(f, "champion checkpoint failed: {}", e),
            Self::EmptyPopulation(e) => write!(f, "reproduction failed: {}", e),
        }
    }
}

impl Error for EvolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Checkpoint(e) => Some(e),
            Self::EmptyPopulation(e) => Some(e),
        }
    }
}

impl From<io::Error> for EvolutionError {
    fn from(e: io::Error) -> EvolutionError {
        EvolutionError::Checkpoint(e)
    }
}

impl From<EmptyCollectionError> for EvolutionError {
    fn from(e: EmptyCollectionError) -> EvolutionError {
        EvolutionError::EmptyPopulation(e)
    }
}

use crate::NodeId;

use std::error::Error;
use std::fmt;
use std::io;

/// An error type indicating that a genome was
/// evaluated with an invalid input vector.
#[derive(Debug, PartialEq, Eq)]
pub enum EvaluationError {
    /// The input vector's length did not match the
    /// genome's input-node count.
    InvalidInputLength {
        /// The genome's input-node count.
        expected: usize,
        /// The passed vector's length.
        actual: usize,
    },
}

/// An error type indicating that a connection being
/// inserted would violate the genome's structural
/// invariants.
#[derive(Debug, PartialEq, Eq)]
pub enum StructureError {
    /// A connection with the same `(from, to)` pair already exists.
    DuplicateConnection(NodeId, NodeId),
    /// One or both endpoints do not exist in the genome.
    UnknownEndpoint(NodeId, NodeId),
    /// The connection's target is an input node.
    InputTarget(NodeId),
    /// The connection's endpoints are the same node.
    SelfLoop(NodeId),
    /// The connection would complete a directed cycle
    /// through already-existing connections.
    WouldCycle(NodeId, NodeId),
}

/// An error type indicating that a persisted genome
/// could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    /// The underlying reader failed.
    Io(io::Error),
    /// A record held an unknown activation code.
    UnknownActivationCode(i32),
    /// A count or id field was negative.
    NegativeField(&'static str),
    /// Two node records shared an id.
    DuplicateNode(NodeId),
    /// A node id was not below the stored next-id counter.
    IdOutOfRange(NodeId),
    /// A node record was flagged as both input and hidden.
    InvalidNodeFlags(NodeId),
    /// Two connection records shared a `(from, to)` pair.
    DuplicateConnection(NodeId, NodeId),
    /// A connection record referenced a missing node.
    UnknownEndpoint(NodeId, NodeId),
    /// A connection record terminated at an input node.
    InputTarget(NodeId, NodeId),
    /// An input node record held a nonzero bias.
    InputBias(NodeId),
    /// The node records' neighbour lists did not agree
    /// with the connection records.
    AdjacencyMismatch(NodeId, NodeId),
    /// The number of input-flagged nodes did not match the header.
    InputCountMismatch(usize, usize),
    /// The number of output nodes did not match the header.
    OutputCountMismatch(usize, usize),
    /// The stored connections contain a directed cycle.
    CyclicTopology,
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInputLength { expected, actual } => write!(
                f,
                "evaluation with {} inputs on genome with {} input nodes",
                actual, expected
            ),
        }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateConnection(from, to) => write!(
                f,
                "connection insertion shadows existing connection {} -> {}",
                from, to
            ),
            Self::UnknownEndpoint(from, to) => write!(
                f,
                "connection insertion between nonexistant endpoint(s) {} -> {}",
                from, to
            ),
            Self::InputTarget(to) => {
                write!(f, "connection insertion targeting input node {}", to)
            }
            Self::SelfLoop(id) => write!(f, "connection insertion looping node {} to itself", id),
            Self::WouldCycle(from, to) => write!(
                f,
                "connection insertion {} -> {} would complete a cycle",
                from, to
            ),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "genome read failed: {}", e),
            Self::UnknownActivationCode(code) => write!(f, "unknown activation code {}", code),
            Self::NegativeField(field) => write!(f, "negative value in field {}", field),
            Self::DuplicateNode(id) => write!(f, "duplicate node record with id {}", id),
            Self::IdOutOfRange(id) => {
                write!(f, "node id {} not below the stored next-id counter", id)
            }
            Self::InvalidNodeFlags(id) => {
                write!(f, "node record {} flagged as both input and hidden", id)
            }
            Self::DuplicateConnection(from, to) => {
                write!(f, "duplicate connection record {} -> {}", from, to)
            }
            Self::UnknownEndpoint(from, to) => write!(
                f,
                "connection record between nonexistant endpoint(s) {} -> {}",
                from, to
            ),
            Self::InputTarget(from, to) => write!(
                f,
                "connection record {} -> {} targets an input node",
                from, to
            ),
            Self::InputBias(id) => {
                write!(f, "input node record {} holds a nonzero bias", id)
            }
            Self::AdjacencyMismatch(from, to) => write!(
                f,
                "neighbour lists disagree with connection records over {} -> {}",
                from, to
            ),
            Self::InputCountMismatch(expected, actual) => write!(
                f,
                "header declares {} input nodes but records hold {}",
                expected, actual
            ),
            Self::OutputCountMismatch(expected, actual) => write!(
                f,
                "header declares {} output nodes but records hold {}",
                expected, actual
            ),
            Self::CyclicTopology => write!(f, "stored connections contain a directed cycle"),
        }
    }
}

impl Error for EvaluationError {}
impl Error for StructureError {}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> LoadError {
        LoadError::Io(e)
    }
}

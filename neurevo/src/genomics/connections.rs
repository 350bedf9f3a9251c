use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Connections are the weighted directed edges of a genome's
/// network. Their identity is the ordered `(from, to)` pair of
/// node ids; a genome holds at most one connection per pair.
///
/// Disabled connections keep their place in the genome (and in
/// crossover gene alignment) but contribute nothing during
/// evaluation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    from: NodeId,
    to: NodeId,
    weight: f64,
    enabled: bool,
}

impl Connection {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::Connection;
    ///
    /// let connection = Connection::new(3, 9, 2.0);
    ///
    /// assert_eq!(connection.from(), 3);
    /// assert_eq!(connection.to(), 9);
    /// assert_eq!(connection.weight(), 2.0);
    /// assert!(connection.enabled());
    /// ```
    pub fn new(from: NodeId, to: NodeId, weight: f64) -> Connection {
        Connection {
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Returns the id of the connection's source node.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Returns the id of the connection's target node.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Returns the connection's identity key.
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the connection is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the connection's enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.from,
            self.to,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

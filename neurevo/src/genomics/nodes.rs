use crate::NodeId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// The activation function applied to a node's
/// summed input when the genome is evaluated.
///
/// The set is closed: evaluation dispatches through
/// a `match`, keeping the hot path free of virtual calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    // x
    Identity,
    // 1 / (1 + exp(-x))
    Sigmoid,
    // max(0, x)
    ReLU,
    // tanh(x)
    Tanh,
}

impl Activation {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::Activation;
    ///
    /// assert_eq!(Activation::Identity.apply(-3.0), -3.0);
    /// assert_eq!(Activation::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(Activation::Tanh.apply(0.0), 0.0);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::ReLU => x.max(0.0),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Returns the activation's code in the persisted genome layout.
    pub(crate) fn code(self) -> i32 {
        match self {
            Activation::Identity => 0,
            Activation::Sigmoid => 1,
            Activation::ReLU => 2,
            Activation::Tanh => 3,
        }
    }

    /// Returns the activation matching a persisted code.
    pub(crate) fn from_code(code: i32) -> Option<Activation> {
        match code {
            0 => Some(Activation::Identity),
            1 => Some(Activation::Sigmoid),
            2 => Some(Activation::ReLU),
            3 => Some(Activation::Tanh),
            _ => None,
        }
    }
}

/// A NodeKind indicates the role of a node
/// within its genome's network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Input nodes. Values are set directly during
    /// evaluation, and biases are always zero.
    Input,
    /// Hidden nodes, created and removed by structural mutation.
    Hidden,
    /// Output nodes.
    Output,
}

/// Nodes are the computational elements of genomes,
/// between which connections are created.
///
/// Adjacency is kept as sets of neighbouring node *ids*,
/// never references: the genome's tables are the single
/// owner of all nodes and connections.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    bias: f64,
    activation: Activation,
    incoming: HashSet<NodeId, RandomState>,
    outgoing: HashSet<NodeId, RandomState>,
}

impl Node {
    /// Generates a new node with the passed parameters
    /// and a zero bias.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Node, NodeKind};
    ///
    /// let node = Node::new(5, NodeKind::Hidden, Activation::Sigmoid);
    ///
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.bias(), 0.0);
    /// ```
    pub fn new(id: NodeId, kind: NodeKind, activation: Activation) -> Node {
        Node {
            id,
            kind,
            bias: 0.0,
            activation,
            incoming: HashSet::default(),
            outgoing: HashSet::default(),
        }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node's bias.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub(crate) fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    /// Returns the node's activation function.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub(crate) fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    /// Returns an iterator over the ids of nodes with a
    /// connection into this node.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn incoming(&self) -> impl Iterator<Item = &NodeId> {
        self.incoming.iter()
    }

    /// Returns an iterator over the ids of nodes this
    /// node has a connection into.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn outgoing(&self) -> impl Iterator<Item = &NodeId> {
        self.outgoing.iter()
    }

    pub(crate) fn add_incoming(&mut self, from: NodeId) {
        self.incoming.insert(from);
    }

    pub(crate) fn add_outgoing(&mut self, to: NodeId) {
        self.outgoing.insert(to);
    }

    pub(crate) fn remove_incoming(&mut self, from: NodeId) {
        self.incoming.remove(&from);
    }

    pub(crate) fn remove_outgoing(&mut self, to: NodeId) {
        self.outgoing.remove(&to);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, {:?}, {:.3}, IN: {:?}, OUT: {:?}]",
            self.id, self.kind, self.activation, self.bias, self.incoming, self.outgoing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_codes_round_trip() {
        for activation in [
            Activation::Identity,
            Activation::Sigmoid,
            Activation::ReLU,
            Activation::Tanh,
        ] {
            assert_eq!(Activation::from_code(activation.code()), Some(activation));
        }
        assert_eq!(Activation::from_code(4), None);
        assert_eq!(Activation::from_code(-1), None);
    }

    #[test]
    fn activation_outputs_finite() {
        for activation in [
            Activation::Identity,
            Activation::Sigmoid,
            Activation::ReLU,
            Activation::Tanh,
        ] {
            for x in [-100.0, -1.0, 0.0, 1.0, 100.0] {
                assert!(activation.apply(x).is_finite());
            }
        }
    }

    #[test]
    fn adjacency_updates() {
        let mut node = Node::new(3, NodeKind::Hidden, Activation::Tanh);
        node.add_incoming(0);
        node.add_incoming(1);
        node.add_outgoing(5);

        assert_eq!(node.incoming().count(), 2);
        assert_eq!(node.outgoing().count(), 1);

        node.remove_incoming(0);
        node.remove_outgoing(5);

        assert_eq!(node.incoming().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(node.outgoing().count(), 0);
    }
}

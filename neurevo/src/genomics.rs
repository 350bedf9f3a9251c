//! Genomes are the focus of evolution. Each genome is a mutable,
//! cycle-free directed graph of computational nodes and weighted
//! connections, evaluated directly as a feed-forward network.
//! Genomes can be progressively mutated, thus adding complexity
//! and functionality.
//!
//! Gene identity is positional: nodes are identified by their id,
//! connections by their `(from, to)` pair. Matching ids in two
//! genomes align the genes during crossover and compatibility
//! measurement.

mod config;
mod connections;
mod errors;
mod nodes;
mod serial;

pub use config::GeneticConfig;
pub use connections::Connection;
pub use errors::{EvaluationError, LoadError, StructureError};
pub use nodes::{Activation, Node, NodeKind};

use crate::NodeId;

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::hash_map::HashMap;
use std::collections::HashSet;
use std::fmt;

/// A mutable collection of nodes and connections forming a
/// directed acyclic network.
///
/// The genome is the single owner of its node and connection
/// tables; all node-to-node relationships are id-based lookups
/// into those tables. Node ids are assigned monotonically and
/// never reused, so removal cannot leave dangling references.
///
/// Supports Serde for convenient genome saving and loading, in
/// addition to the fixed-width binary layout of [`save`]/[`load`].
///
/// [`save`]: Genome::save
/// [`load`]: Genome::load
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    nodes: HashMap<NodeId, Node, RandomState>,
    connections: HashMap<(NodeId, NodeId), Connection, RandomState>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    next_id: NodeId,
    fitness: f64,
}

impl Genome {
    /// Creates a new fully-connected genome with the specified
    /// configuration: `input_count` input nodes, `output_count`
    /// output nodes, and one enabled connection from every input
    /// to every output with a fresh init-distribution weight.
    ///
    /// Input nodes take ids `0..input_count` and keep a zero bias
    /// and the `Identity` activation; output nodes follow with
    /// sampled biases and the configured output activation.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{GeneticConfig, Genome, NodeKind};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     init_stdev: 1.0,
    ///     value_min: -5.0,
    ///     value_max: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config, &mut SmallRng::seed_from_u64(0));
    ///
    /// // As configured, the genome has 3 inputs + 2 outputs.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Input).count(), 3);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Output).count(), 2);
    ///
    /// // And a connection for every input-output pair.
    /// assert_eq!(genome.connections().count(), 3 * 2);
    ///
    /// // All weights lie within the configured clamp bounds.
    /// assert!(genome.connections().all(|c| c.weight().abs() <= 5.0));
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut impl Rng) -> Genome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let mut genome = Genome {
            nodes: HashMap::default(),
            connections: HashMap::default(),
            inputs: Vec::with_capacity(input_count),
            outputs: Vec::with_capacity(output_count),
            next_id: 0,
            fitness: 0.0,
        };

        for _ in 0..input_count {
            let id = genome.allocate_id();
            genome
                .nodes
                .insert(id, Node::new(id, NodeKind::Input, Activation::Identity));
            genome.inputs.push(id);
        }

        for _ in 0..output_count {
            let id = genome.allocate_id();
            let mut node = Node::new(id, NodeKind::Output, config.output_activation);
            node.set_bias(config.sample_init(rng));
            genome.nodes.insert(id, node);
            genome.outputs.push(id);
        }

        for i in 0..input_count {
            for o in 0..output_count {
                genome.insert_connection_unchecked(
                    i as NodeId,
                    (input_count + o) as NodeId,
                    config.sample_init(rng),
                );
            }
        }

        genome
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Computes the network's output vector for the passed input
    /// vector, one entry per output node in fixed output-id order.
    ///
    /// Every non-input node's value is
    /// `activation(Σ upstream_value × weight + bias)` over its
    /// enabled incoming connections; disabled connections
    /// contribute nothing. Each node is computed at most once per
    /// call, and no state survives the call.
    ///
    /// # Errors
    /// Returns an error if the input vector's length does not
    /// match the genome's input-node count.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{GeneticConfig, Genome};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = Genome::new(&config, &mut SmallRng::seed_from_u64(0));
    ///
    /// // Zero-valued init distribution: all weights and biases
    /// // are 0, so the Identity output always reads 0.
    /// assert_eq!(genome.evaluate(&[0.3, -4.0]).unwrap(), vec![0.0]);
    ///
    /// // Wrong input length is an error.
    /// assert!(genome.evaluate(&[1.0]).is_err());
    /// ```
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        if inputs.len() != self.inputs.len() {
            return Err(EvaluationError::InvalidInputLength {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }

        let mut values: HashMap<NodeId, f64, RandomState> = self
            .inputs
            .iter()
            .copied()
            .zip(inputs.iter().copied())
            .collect();

        for &output in &self.outputs {
            self.resolve(output, &mut values);
        }

        Ok(self.outputs.iter().map(|id| values[id]).collect())
    }

    /// Resolves `target`'s value into `values`, first resolving all
    /// transitively upstream nodes that are not yet memoized.
    ///
    /// Uses an explicit stack rather than recursion, so evaluation
    /// depth is bounded by heap and not by the call stack.
    fn resolve(&self, target: NodeId, values: &mut HashMap<NodeId, f64, RandomState>) {
        let mut stack = vec![target];
        while let Some(&id) = stack.last() {
            if values.contains_key(&id) {
                stack.pop();
                continue;
            }
            let node = &self.nodes[&id];
            let unresolved: Vec<NodeId> = node
                .incoming()
                .filter(|from| !values.contains_key(from))
                .copied()
                .collect();
            if unresolved.is_empty() {
                let sum: f64 = node
                    .incoming()
                    .map(|&from| {
                        let connection = &self.connections[&(from, id)];
                        if connection.enabled() {
                            values[&from] * connection.weight()
                        } else {
                            0.0
                        }
                    })
                    .sum();
                values.insert(id, node.activation().apply(sum + node.bias()));
                stack.pop();
            } else {
                stack.extend(unresolved);
            }
        }
    }

    /// Inserts a new enabled connection into the genome.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    /// Returns an error if either endpoint does not exist, the
    /// endpoints are the same node, the target is an input node,
    /// a connection with the same endpoints already exists, or the
    /// connection would complete a directed cycle.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, GeneticConfig, Genome};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = SmallRng::seed_from_u64(0);
    /// let mut genome = Genome::new(&GeneticConfig::zero(), &mut rng);
    /// let hidden = genome.add_hidden_node(Activation::Sigmoid);
    ///
    /// assert!(genome.insert_connection(0, hidden, 0.5).is_ok());
    /// assert!(genome.insert_connection(hidden, 1, -1.0).is_ok());
    ///
    /// // 1 -> hidden would complete a cycle through hidden -> 1.
    /// assert!(genome.insert_connection(1, hidden, 1.0).is_err());
    /// ```
    pub fn insert_connection(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
    ) -> Result<&mut Connection, StructureError> {
        self.check_connection_viability(from, to)?;
        Ok(self.insert_connection_unchecked(from, to, weight))
    }

    /// Inserts a new connection, updating both endpoints'
    /// adjacency sets. Assumes viability has been checked.
    fn insert_connection_unchecked(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
    ) -> &mut Connection {
        self.nodes.get_mut(&from).unwrap().add_outgoing(to);
        self.nodes.get_mut(&to).unwrap().add_incoming(from);
        self.connections
            .entry((from, to))
            .or_insert_with(|| Connection::new(from, to, weight))
    }

    /// Checks whether a connection between `from` and `to` would
    /// violate the genome's structural invariants.
    fn check_connection_viability(&self, from: NodeId, to: NodeId) -> Result<(), StructureError> {
        use StructureError::*;
        if !(self.nodes.contains_key(&from) && self.nodes.contains_key(&to)) {
            Err(UnknownEndpoint(from, to))
        } else if from == to {
            Err(SelfLoop(from))
        } else if self.nodes[&to].kind() == NodeKind::Input {
            Err(InputTarget(to))
        } else if self.connections.contains_key(&(from, to)) {
            Err(DuplicateConnection(from, to))
        } else if self.creates_cycle(from, to) {
            Err(WouldCycle(from, to))
        } else {
            Ok(())
        }
    }

    /// Returns whether adding `from -> to` would complete a
    /// directed cycle, by searching for a path from `to` back to
    /// `from` over existing outgoing connections.
    fn creates_cycle(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited: HashSet<NodeId, RandomState> = HashSet::default();
        let mut stack = vec![to];
        while let Some(id) = stack.pop() {
            if id == from {
                return true;
            }
            if visited.insert(id) {
                stack.extend(self.nodes[&id].outgoing().copied());
            }
        }
        false
    }

    /// Removes the connection with the passed endpoints, updating
    /// both endpoints' adjacency sets before the record is dropped.
    ///
    /// Returns `None` if no such connection exists.
    pub fn remove_connection(&mut self, from: NodeId, to: NodeId) -> Option<Connection> {
        let connection = self.connections.remove(&(from, to))?;
        self.nodes.get_mut(&from).unwrap().remove_outgoing(to);
        self.nodes.get_mut(&to).unwrap().remove_incoming(from);
        Some(connection)
    }

    /// Adds a new hidden node with the passed activation, a zero
    /// bias, and a freshly allocated id. Returns the new node's id.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, GeneticConfig, Genome, NodeKind};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = SmallRng::seed_from_u64(0);
    /// let mut genome = Genome::new(&GeneticConfig::zero(), &mut rng);
    ///
    /// let hidden = genome.add_hidden_node(Activation::Tanh);
    ///
    /// assert_eq!(genome.node(hidden).unwrap().kind(), NodeKind::Hidden);
    /// assert_eq!(genome.next_id(), hidden + 1);
    /// ```
    pub fn add_hidden_node(&mut self, activation: Activation) -> NodeId {
        let id = self.allocate_id();
        self.nodes
            .insert(id, Node::new(id, NodeKind::Hidden, activation));
        id
    }

    /// Removes the node with the passed id, deleting every
    /// connection incident to it in either direction.
    ///
    /// Returns `None` without modifying the genome if the node
    /// does not exist or is not hidden.
    pub fn remove_hidden_node(&mut self, id: NodeId) -> Option<Node> {
        match self.nodes.get(&id) {
            Some(node) if node.kind() == NodeKind::Hidden => {}
            _ => return None,
        }
        let incoming: Vec<NodeId> = self.nodes[&id].incoming().copied().collect();
        let outgoing: Vec<NodeId> = self.nodes[&id].outgoing().copied().collect();
        for from in incoming {
            self.remove_connection(from, id);
        }
        for to in outgoing {
            self.remove_connection(id, to);
        }
        self.nodes.remove(&id)
    }

    /// Induces a mutation pass over the genome: every bias and
    /// weight takes an independent chance of being perturbed or
    /// replaced, every connection takes an independent chance of
    /// being toggled, and each structural mutation takes its own
    /// configured chance of being applied.
    ///
    /// A structural mutation whose precondition fails (the picked
    /// pair would form a cycle, the picked node is not hidden, the
    /// genome holds no connections) is silently skipped.
    pub fn mutate(&mut self, rng: &mut impl Rng, config: &GeneticConfig) {
        self.mutate_biases(rng, config);
        self.mutate_weights(rng, config);
        if rng.gen::<f64>() < config.connection_addition_mutation_chance {
            let _ = self.mutate_add_connection(rng, config);
        }
        if rng.gen::<f64>() < config.connection_removal_mutation_chance {
            let _ = self.mutate_remove_connection(rng);
        }
        if rng.gen::<f64>() < config.node_addition_mutation_chance {
            let _ = self.mutate_add_node(rng, config);
        }
        if rng.gen::<f64>() < config.node_removal_mutation_chance {
            let _ = self.mutate_remove_node(rng);
        }
    }

    /// Induces a _bias mutation_ over every hidden and output
    /// node: with probability [`mutation_rate`], the bias is
    /// either replaced with a fresh init-distribution sample
    /// (probability [`replace_rate`]) or perturbed with Gaussian
    /// noise of [`mutation_power`], clamped either way.
    ///
    /// Input-node biases are never touched.
    ///
    /// [`mutation_rate`]: GeneticConfig::mutation_rate
    /// [`replace_rate`]: GeneticConfig::replace_rate
    /// [`mutation_power`]: GeneticConfig::mutation_power
    pub fn mutate_biases(&mut self, rng: &mut impl Rng, config: &GeneticConfig) {
        for node in self.nodes.values_mut() {
            if node.kind() == NodeKind::Input {
                continue;
            }
            if rng.gen::<f64>() < config.mutation_rate {
                let bias = if rng.gen::<f64>() < config.replace_rate {
                    config.sample_init(rng)
                } else {
                    config.perturb(rng, node.bias())
                };
                node.set_bias(bias);
            }
        }
    }

    /// Induces a _weight mutation_ over every connection, enabled
    /// or not, under the same perturb/replace policy as
    /// [`mutate_biases`]. Independently, each connection's enabled
    /// flag is flipped with probability [`toggle_chance`].
    ///
    /// [`mutate_biases`]: Genome::mutate_biases
    /// [`toggle_chance`]: GeneticConfig::toggle_chance
    pub fn mutate_weights(&mut self, rng: &mut impl Rng, config: &GeneticConfig) {
        for connection in self.connections.values_mut() {
            if rng.gen::<f64>() < config.mutation_rate {
                let weight = if rng.gen::<f64>() < config.replace_rate {
                    config.sample_init(rng)
                } else {
                    config.perturb(rng, connection.weight())
                };
                connection.set_weight(weight);
            }
            if rng.gen::<f64>() < config.toggle_chance {
                let enabled = !connection.enabled();
                connection.set_enabled(enabled);
            }
        }
    }

    /// Induces a _connection-addition mutation_: picks two nodes
    /// uniformly at random; if a connection between them already
    /// exists it is re-enabled, otherwise a new enabled connection
    /// with a fresh init-distribution weight is inserted.
    ///
    /// Returns the affected connection's key, or `None` for a
    /// silently skipped pick (self-loop, input-node target, or a
    /// pair that would complete a cycle).
    pub fn mutate_add_connection(
        &mut self,
        rng: &mut impl Rng,
        config: &GeneticConfig,
    ) -> Option<(NodeId, NodeId)> {
        let from = *self.nodes.keys().choose(rng)?;
        let to = *self.nodes.keys().choose(rng)?;

        if let Some(connection) = self.connections.get_mut(&(from, to)) {
            connection.set_enabled(true);
            return Some((from, to));
        }
        if self.check_connection_viability(from, to).is_err() {
            return None;
        }
        let weight = config.sample_init(rng);
        self.insert_connection_unchecked(from, to, weight);
        Some((from, to))
    }

    /// Induces a _connection-removal mutation_: picks an existing
    /// connection uniformly at random and deletes it, updating both
    /// endpoints' adjacency sets.
    ///
    /// Returns the removed connection, or `None` if the genome
    /// holds no connections.
    pub fn mutate_remove_connection(&mut self, rng: &mut impl Rng) -> Option<Connection> {
        let (from, to) = *self.connections.keys().choose(rng)?;
        self.remove_connection(from, to)
    }

    /// Induces a _node-addition mutation_: picks an existing
    /// connection uniformly at random, disables it, and splices a
    /// new hidden node into its place. The connection into the new
    /// node carries weight 1.0; the connection out of it carries
    /// the old connection's weight. The new node's activation is
    /// drawn from [`activation_types`] (`Sigmoid` if empty).
    ///
    /// Returns the new node's id, or `None` if the genome holds
    /// no connections.
    ///
    /// [`activation_types`]: GeneticConfig::activation_types
    pub fn mutate_add_node(
        &mut self,
        rng: &mut impl Rng,
        config: &GeneticConfig,
    ) -> Option<NodeId> {
        let (from, to) = *self.connections.keys().choose(rng)?;

        let split = self.connections.get_mut(&(from, to)).unwrap();
        let weight = split.weight();
        split.set_enabled(false);

        let activation = *config
            .activation_types
            .choose(rng)
            .unwrap_or(&Activation::Sigmoid);
        let id = self.add_hidden_node(activation);
        self.insert_connection_unchecked(from, id, 1.0);
        self.insert_connection_unchecked(id, to, weight);
        Some(id)
    }

    /// Induces a _node-removal mutation_: picks a node uniformly
    /// at random and, if it is hidden, deletes it along with every
    /// incident connection.
    ///
    /// Returns the removed node, or `None` for a silently skipped
    /// non-hidden pick.
    pub fn mutate_remove_node(&mut self, rng: &mut impl Rng) -> Option<Node> {
        let id = *self.nodes.keys().choose(rng)?;
        self.remove_hidden_node(id)
    }

    /// Combines the genome with an `other` genome and returns
    /// their _child_ genome.
    ///
    /// The child takes its structure from the fitter parent (ties
    /// favour `self`): exactly the fitter parent's node ids and
    /// connection keys. For genes present in both parents, each
    /// attribute (bias and activation for nodes, weight and
    /// enabled flag for connections) is copied from a uniformly
    /// random parent, independently per attribute. Genes private
    /// to the fitter parent are copied verbatim.
    ///
    /// The child's tables, input/output caches and next-id counter
    /// are rebuilt from the resulting gene sets; no storage is
    /// shared with either parent. The child's fitness is 0.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{GeneticConfig, Genome};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = SmallRng::seed_from_u64(0);
    /// let genome = Genome::new(&GeneticConfig::zero(), &mut rng);
    ///
    /// // A genome crossed with itself reproduces its structure.
    /// let child = genome.crossover(&genome, &mut rng);
    /// assert_eq!(child.nodes().count(), genome.nodes().count());
    /// assert_eq!(child.connections().count(), genome.connections().count());
    /// ```
    pub fn crossover(&self, other: &Genome, rng: &mut impl Rng) -> Genome {
        let (fitter, weaker) = if self.fitness >= other.fitness {
            (self, other)
        } else {
            (other, self)
        };

        let mut nodes: HashMap<NodeId, Node, RandomState> = HashMap::default();
        for (id, node) in &fitter.nodes {
            let mut child = Node::new(*id, node.kind(), node.activation());
            child.set_bias(node.bias());
            if let Some(counterpart) = weaker.nodes.get(id) {
                if rng.gen::<bool>() {
                    child.set_bias(counterpart.bias());
                }
                if rng.gen::<bool>() {
                    child.set_activation(counterpart.activation());
                }
            }
            nodes.insert(*id, child);
        }

        let mut connections: HashMap<(NodeId, NodeId), Connection, RandomState> =
            HashMap::default();
        for (key, connection) in &fitter.connections {
            let mut child = connection.clone();
            if let Some(counterpart) = weaker.connections.get(key) {
                if rng.gen::<bool>() {
                    child.set_weight(counterpart.weight());
                }
                if rng.gen::<bool>() {
                    child.set_enabled(counterpart.enabled());
                }
            }
            nodes.get_mut(&key.0).unwrap().add_outgoing(key.1);
            nodes.get_mut(&key.1).unwrap().add_incoming(key.0);
            connections.insert(*key, child);
        }

        let mut inputs: Vec<NodeId> = nodes
            .values()
            .filter(|n| n.kind() == NodeKind::Input)
            .map(Node::id)
            .collect();
        let mut outputs: Vec<NodeId> = nodes
            .values()
            .filter(|n| n.kind() == NodeKind::Output)
            .map(Node::id)
            .collect();
        inputs.sort_unstable();
        outputs.sort_unstable();
        let next_id = nodes.keys().copied().max().map_or(0, |id| id + 1);

        Genome {
            nodes,
            connections,
            inputs,
            outputs,
            next_id,
            fitness: 0.0,
        }
    }

    /// Calculates the _compatibility distance_ between `self` and
    /// `other`:
    ///
    /// `disjoint_factor × D / N + weight_factor × avgW`
    ///
    /// where `D` is the number of connection keys present in
    /// exactly one genome, `avgW` the mean absolute weight
    /// difference over shared keys (0 when none are shared), and
    /// `N` the larger connection count, floored to 1 below 20.
    ///
    /// Symmetric in both arguments, and 0 for two copies of the
    /// same genome.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{GeneticConfig, Genome};
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     disjoint_factor: 1.0,
    ///     weight_factor: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut rng = SmallRng::seed_from_u64(0);
    /// let genome = Genome::new(&config, &mut rng);
    ///
    /// assert_eq!(genome.compatibility_distance(&genome, &config), 0.0);
    /// ```
    pub fn compatibility_distance(&self, other: &Genome, config: &GeneticConfig) -> f64 {
        let keys_self: HashSet<(NodeId, NodeId), RandomState> =
            self.connections.keys().copied().collect();
        let keys_other: HashSet<(NodeId, NodeId), RandomState> =
            other.connections.keys().copied().collect();

        let common: Vec<(NodeId, NodeId)> = keys_self.intersection(&keys_other).copied().collect();
        let disjoint = keys_self.len() + keys_other.len() - 2 * common.len();

        let average_weight_diff = if common.is_empty() {
            0.0
        } else {
            common
                .iter()
                .map(|key| (self.connections[key].weight() - other.connections[key].weight()).abs())
                .sum::<f64>()
                / common.len() as f64
        };

        let n = keys_self.len().max(keys_other.len());
        let n = if n < 20 { 1 } else { n };

        config.disjoint_factor * disjoint as f64 / n as f64
            + config.weight_factor * average_weight_diff
    }

    /// Returns whether the genome's input and output counts match
    /// the passed configuration.
    pub fn conforms_to(&self, config: &GeneticConfig) -> bool {
        self.inputs.len() == config.input_count.get()
            && self.outputs.len() == config.output_count.get()
    }

    /// Returns an iterator over the genome's nodes.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connections.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the node with the passed id, if present.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the connection with the passed endpoints, if present.
    pub fn connection(&self, from: NodeId, to: NodeId) -> Option<&Connection> {
        self.connections.get(&(from, to))
    }

    /// Returns a mutable reference to the connection with the
    /// passed endpoints, if present.
    pub fn connection_mut(&mut self, from: NodeId, to: NodeId) -> Option<&mut Connection> {
        self.connections.get_mut(&(from, to))
    }

    /// Returns the genome's input-node ids, in evaluation order.
    pub fn input_ids(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Returns the genome's output-node ids, in evaluation order.
    pub fn output_ids(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Returns the genome's next-id counter.
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Sets the genome's fitness to the value passed.
    /// Fitness should be a non-negative quantity.
    pub fn set_fitness(&mut self, fitness: f64) {
        assert!(fitness >= 0.0, "fitness set to a negative value");
        self.fitness = fitness;
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        let mut connections: Vec<&Connection> = self.connections.values().collect();
        nodes.sort_unstable_by_key(|n| n.id());
        connections.sort_unstable_by_key(|c| c.key());
        f.debug_struct("Genome")
            .field("Nodes", &nodes)
            .field("Connections", &connections)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn test_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            activation_types: vec![Activation::Sigmoid, Activation::Tanh, Activation::ReLU],
            output_activation: Activation::Identity,
            init_mean: 0.0,
            init_stdev: 1.0,
            value_min: -3.0,
            value_max: 3.0,
            mutation_rate: 0.5,
            mutation_power: 0.5,
            replace_rate: 0.2,
            toggle_chance: 0.05,
            connection_addition_mutation_chance: 0.5,
            connection_removal_mutation_chance: 0.3,
            node_addition_mutation_chance: 0.5,
            node_removal_mutation_chance: 0.3,
            disjoint_factor: 1.0,
            weight_factor: 0.4,
        }
    }

    /// Zero-valued init distribution: every weight and bias is 0.
    fn zero_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            output_activation: Activation::Identity,
            value_min: -3.0,
            value_max: 3.0,
            ..GeneticConfig::zero()
        }
    }

    /// Checks the genome's structural invariants: endpoint
    /// existence, adjacency agreement, id bounds, input biases,
    /// and acyclicity by exhaustive reachability.
    fn assert_consistent(genome: &Genome) {
        for connection in genome.connections() {
            let (from, to) = connection.key();
            assert_ne!(from, to);
            let source = genome.node(from).expect("missing source node");
            let target = genome.node(to).expect("missing target node");
            assert!(source.outgoing().any(|&id| id == to));
            assert!(target.incoming().any(|&id| id == from));
            assert_ne!(target.kind(), NodeKind::Input);
        }
        for node in genome.nodes() {
            assert!(node.id() < genome.next_id());
            if node.kind() == NodeKind::Input {
                assert_eq!(node.bias(), 0.0);
            }
            for &from in node.incoming() {
                assert!(genome.connection(from, node.id()).is_some());
            }
            for &to in node.outgoing() {
                assert!(genome.connection(node.id(), to).is_some());
            }
            // No directed path from the node back to itself.
            let mut stack: Vec<NodeId> = node.outgoing().copied().collect();
            let mut visited = std::collections::HashSet::new();
            while let Some(id) = stack.pop() {
                assert_ne!(id, node.id(), "cycle through node {}", node.id());
                if visited.insert(id) {
                    stack.extend(genome.node(id).unwrap().outgoing().copied());
                }
            }
        }
    }

    #[test]
    fn new_fully_connected() {
        let mut rng = SmallRng::seed_from_u64(1);
        for input_count in 1..6 {
            for output_count in 1..6 {
                let config = test_config(input_count, output_count);
                let genome = Genome::new(&config, &mut rng);

                assert_eq!(genome.nodes.len(), input_count + output_count);
                assert_eq!(genome.connections.len(), input_count * output_count);
                assert_eq!(
                    genome.input_ids(),
                    (0..input_count as NodeId).collect::<Vec<_>>()
                );
                assert_eq!(
                    genome.output_ids(),
                    (input_count as NodeId..(input_count + output_count) as NodeId)
                        .collect::<Vec<_>>()
                );
                assert_eq!(genome.next_id(), (input_count + output_count) as NodeId);
                assert!(genome.connections().all(|c| c.enabled()));
                assert!(genome.connections().all(|c| c.weight().abs() <= 3.0));
                assert_consistent(&genome);
            }
        }
    }

    #[test]
    fn evaluate_zero_network_outputs_zero() {
        let mut rng = SmallRng::seed_from_u64(2);
        let genome = Genome::new(&zero_config(2, 1), &mut rng);

        for (x, y) in [(0.0, 0.0), (1.0, -1.0), (100.0, 42.0), (-0.5, 0.25)] {
            assert_eq!(genome.evaluate(&[x, y]).unwrap(), vec![0.0]);
        }
    }

    #[test]
    fn evaluate_weighted_sum() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut genome = Genome::new(&zero_config(2, 1), &mut rng);
        genome.connection_mut(0, 2).unwrap().set_weight(0.5);
        genome.connection_mut(1, 2).unwrap().set_weight(0.25);
        genome.nodes.get_mut(&2).unwrap().set_bias(0.1);

        let outputs = genome.evaluate(&[1.0, 2.0]).unwrap();
        assert!((outputs[0] - 1.1).abs() < 1e-12);

        // Disabled connections contribute nothing.
        genome.connection_mut(1, 2).unwrap().set_enabled(false);
        let outputs = genome.evaluate(&[1.0, 2.0]).unwrap();
        assert!((outputs[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn evaluate_wrong_input_length() {
        let mut rng = SmallRng::seed_from_u64(4);
        let genome = Genome::new(&zero_config(3, 2), &mut rng);

        assert_eq!(
            genome.evaluate(&[1.0, 2.0]),
            Err(EvaluationError::InvalidInputLength {
                expected: 3,
                actual: 2
            })
        );
        assert!(genome.evaluate(&[1.0, 2.0, 3.0, 4.0]).is_err());
    }

    #[test]
    fn evaluate_correct_length_and_finite_after_mutation() {
        let config = test_config(4, 3);
        for seed in 0..5 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut genome = Genome::new(&config, &mut rng);
            for _ in 0..50 {
                genome.mutate(&mut rng, &config);
            }
            let outputs = genome.evaluate(&[0.1, -0.2, 0.3, -0.4]).unwrap();
            assert_eq!(outputs.len(), 3);
            assert!(outputs.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn mutation_sequences_preserve_invariants() {
        let config = test_config(3, 2);
        for seed in 0..5 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut genome = Genome::new(&config, &mut rng);
            for _ in 0..200 {
                genome.mutate(&mut rng, &config);
            }
            assert_consistent(&genome);
            assert!(genome
                .connections()
                .all(|c| (-3.0..=3.0).contains(&c.weight())));
            assert!(genome.nodes().all(|n| (-3.0..=3.0).contains(&n.bias())));
            assert_eq!(genome.input_ids().len(), 3);
            assert_eq!(genome.output_ids().len(), 2);
        }
    }

    #[test]
    fn add_node_mutation_splices_connection() {
        let mut rng = SmallRng::seed_from_u64(5);
        let config = zero_config(1, 1);
        let mut genome = Genome::new(&config, &mut rng);
        genome.connection_mut(0, 1).unwrap().set_weight(0.7);

        let id = genome.mutate_add_node(&mut rng, &config).unwrap();

        let split = genome.connection(0, 1).unwrap();
        assert!(!split.enabled());
        assert_eq!(split.weight(), 0.7);

        let incoming = genome.connection(0, id).unwrap();
        assert!(incoming.enabled());
        assert_eq!(incoming.weight(), 1.0);

        let outgoing = genome.connection(id, 1).unwrap();
        assert!(outgoing.enabled());
        assert_eq!(outgoing.weight(), 0.7);

        assert_eq!(genome.node(id).unwrap().kind(), NodeKind::Hidden);
        assert_eq!(genome.connections.len(), 3);
        assert_consistent(&genome);
    }

    #[test]
    fn remove_node_mutation_removes_incident_connections() {
        let mut rng = SmallRng::seed_from_u64(6);
        let config = zero_config(2, 1);
        let mut genome = Genome::new(&config, &mut rng);
        let hidden = genome.add_hidden_node(Activation::Sigmoid);
        genome.insert_connection(0, hidden, 0.5).unwrap();
        genome.insert_connection(1, hidden, -0.5).unwrap();
        genome.insert_connection(hidden, 2, 1.0).unwrap();

        let before: HashSet<(NodeId, NodeId)> =
            genome.connections.keys().copied().collect();
        assert_eq!(before.len(), 5);

        let removed = genome.remove_hidden_node(hidden).unwrap();
        assert_eq!(removed.id(), hidden);

        let after: HashSet<(NodeId, NodeId)> = genome.connections.keys().copied().collect();
        let expected: HashSet<(NodeId, NodeId)> = before
            .into_iter()
            .filter(|&(from, to)| from != hidden && to != hidden)
            .collect();
        assert_eq!(after, expected);
        assert_eq!(after.len(), 2);
        assert!(genome.node(hidden).is_none());
        assert_consistent(&genome);
    }

    #[test]
    fn remove_node_mutation_skips_non_hidden() {
        let mut rng = SmallRng::seed_from_u64(7);
        let config = zero_config(1, 1);
        let mut genome = Genome::new(&config, &mut rng);

        // Only input and output nodes exist: the pick can never be hidden.
        for _ in 0..20 {
            assert!(genome.mutate_remove_node(&mut rng).is_none());
        }
        assert_eq!(genome.nodes.len(), 2);
        assert_eq!(genome.connections.len(), 1);
    }

    #[test]
    fn add_connection_mutation_reenables_existing() {
        let mut rng = SmallRng::seed_from_u64(8);
        let config = zero_config(1, 1);
        let mut genome = Genome::new(&config, &mut rng);
        genome.connection_mut(0, 1).unwrap().set_enabled(false);

        // The only viable pick is (0, 1); all others silently skip.
        let mut reenabled = None;
        for _ in 0..200 {
            if let Some(key) = genome.mutate_add_connection(&mut rng, &config) {
                reenabled = Some(key);
                break;
            }
        }
        assert_eq!(reenabled, Some((0, 1)));
        assert!(genome.connection(0, 1).unwrap().enabled());
        assert_eq!(genome.connections.len(), 1);
    }

    #[test]
    fn insert_connection_rejects_invalid() {
        let mut rng = SmallRng::seed_from_u64(9);
        let config = zero_config(1, 1);
        let mut genome = Genome::new(&config, &mut rng);
        let hidden = genome.add_hidden_node(Activation::Tanh);
        genome.insert_connection(0, hidden, 0.5).unwrap();
        genome.insert_connection(hidden, 1, 0.5).unwrap();

        assert_eq!(
            genome.insert_connection(0, 1, 1.0),
            Err(StructureError::DuplicateConnection(0, 1))
        );
        assert_eq!(
            genome.insert_connection(99, 1, 1.0),
            Err(StructureError::UnknownEndpoint(99, 1))
        );
        assert_eq!(
            genome.insert_connection(1, 0, 1.0),
            Err(StructureError::InputTarget(0))
        );
        assert_eq!(
            genome.insert_connection(hidden, hidden, 1.0),
            Err(StructureError::SelfLoop(hidden))
        );
        assert_eq!(
            genome.insert_connection(1, hidden, 1.0),
            Err(StructureError::WouldCycle(1, hidden))
        );
        assert_consistent(&genome);
    }

    #[test]
    fn remove_connection_updates_adjacency() {
        let mut rng = SmallRng::seed_from_u64(10);
        let mut genome = Genome::new(&zero_config(2, 1), &mut rng);

        let removed = genome.remove_connection(0, 2).unwrap();
        assert_eq!(removed.key(), (0, 2));
        assert!(genome.node(0).unwrap().outgoing().next().is_none());
        assert!(genome.node(2).unwrap().incoming().all(|&id| id != 0));
        assert!(genome.remove_connection(0, 2).is_none());
        assert_consistent(&genome);
    }

    #[test]
    fn crossover_with_self_reproduces_structure() {
        let config = test_config(3, 2);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut genome = Genome::new(&config, &mut rng);
        for _ in 0..30 {
            genome.mutate(&mut rng, &config);
        }
        genome.set_fitness(5.0);

        let child = genome.crossover(&genome, &mut rng);
        assert_eq!(child.nodes, genome.nodes);
        assert_eq!(child.connections, genome.connections);
        assert_eq!(child.inputs, genome.inputs);
        assert_eq!(child.outputs, genome.outputs);
        assert_eq!(child.fitness, 0.0);
    }

    #[test]
    fn crossover_takes_structure_from_fitter_parent() {
        let config = test_config(2, 2);
        let mut rng = SmallRng::seed_from_u64(12);
        let mut fitter = Genome::new(&config, &mut rng);
        let mut weaker = Genome::new(&config, &mut rng);
        for _ in 0..20 {
            fitter.mutate(&mut rng, &config);
            weaker.mutate(&mut rng, &config);
        }
        fitter.set_fitness(10.0);
        weaker.set_fitness(1.0);

        let child = weaker.crossover(&fitter, &mut rng);
        let child_nodes: HashSet<NodeId> = child.nodes.keys().copied().collect();
        let fitter_nodes: HashSet<NodeId> = fitter.nodes.keys().copied().collect();
        let child_keys: HashSet<(NodeId, NodeId)> = child.connections.keys().copied().collect();
        let fitter_keys: HashSet<(NodeId, NodeId)> = fitter.connections.keys().copied().collect();
        assert_eq!(child_nodes, fitter_nodes);
        assert_eq!(child_keys, fitter_keys);
        assert_consistent(&child);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let config = test_config(3, 2);
        let mut rng = SmallRng::seed_from_u64(13);
        let mut a = Genome::new(&config, &mut rng);
        let mut b = Genome::new(&config, &mut rng);
        for _ in 0..25 {
            a.mutate(&mut rng, &config);
            b.mutate(&mut rng, &config);
        }

        assert_eq!(a.compatibility_distance(&a, &config), 0.0);
        assert_eq!(b.compatibility_distance(&b, &config), 0.0);
        assert_eq!(
            a.compatibility_distance(&b, &config),
            b.compatibility_distance(&a, &config)
        );
        assert!(a.compatibility_distance(&b, &config) >= 0.0);
    }

    #[test]
    fn distance_counts_disjoint_and_weight_difference() {
        let config = GeneticConfig {
            disjoint_factor: 1.0,
            weight_factor: 0.5,
            ..zero_config(2, 1)
        };
        let mut rng = SmallRng::seed_from_u64(14);
        let mut a = Genome::new(&config, &mut rng);
        let b = Genome::new(&config, &mut rng);

        // Identical keys, zero weight difference.
        assert_eq!(a.compatibility_distance(&b, &config), 0.0);

        // Common connection with weight difference 1.0.
        a.connection_mut(0, 2).unwrap().set_weight(1.0);
        assert_eq!(a.compatibility_distance(&b, &config), 0.5 * (1.0 / 2.0));

        // One disjoint connection on a's side; N floors to 1 below 20.
        let hidden = a.add_hidden_node(Activation::Sigmoid);
        a.insert_connection(hidden, 2, 0.0).unwrap();
        assert_eq!(
            a.compatibility_distance(&b, &config),
            1.0 * 1.0 + 0.5 * (1.0 / 2.0)
        );
    }

    #[test]
    fn ron_round_trip() {
        let config = test_config(2, 2);
        let mut rng = SmallRng::seed_from_u64(15);
        let mut genome = Genome::new(&config, &mut rng);
        for _ in 0..20 {
            genome.mutate(&mut rng, &config);
        }
        genome.set_fitness(3.5);

        let serialized = ron::to_string(&genome).unwrap();
        let deserialized: Genome = ron::from_str(&serialized).unwrap();
        assert_eq!(genome, deserialized);
    }
}

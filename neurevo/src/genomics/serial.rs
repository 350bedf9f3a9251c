//! Fixed-width binary persistence for genomes.
//!
//! All fields are little-endian. The layout is a header
//! (input count, output count, next-id counter as `i32`s, then
//! the fitness as an `f64`), a `u64`-counted list of node
//! records, and a `u64`-counted list of connection records.
//! Each node record carries its id, bias, kind flags, activation
//! code and both `u64`-counted neighbour-id lists; each
//! connection record carries its weight, endpoints and enabled
//! flag.
//!
//! Loading rebuilds the genome's tables and caches from the
//! records and validates every structural invariant before
//! returning, so a loaded genome is never in a state the mutation
//! operators could not have produced.

use crate::genomics::{Activation, Connection, Genome, LoadError, Node, NodeKind};
use crate::NodeId;

use ahash::RandomState;

use std::collections::hash_map::HashMap;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

impl Genome {
    /// Writes the genome to `writer` in the fixed-width binary
    /// layout. Records are emitted in ascending id/key order, so
    /// saving the same genome twice produces identical bytes.
    ///
    /// # Errors
    /// Propagates any error from the underlying writer.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_i32(writer, self.inputs.len() as i32)?;
        write_i32(writer, self.outputs.len() as i32)?;
        write_i32(writer, self.next_id as i32)?;
        write_f64(writer, self.fitness)?;

        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_unstable_by_key(|n| n.id());
        write_u64(writer, nodes.len() as u64)?;
        for node in nodes {
            write_i32(writer, node.id() as i32)?;
            write_f64(writer, node.bias())?;
            write_bool(writer, node.kind() == NodeKind::Hidden)?;
            write_bool(writer, node.kind() == NodeKind::Input)?;
            write_i32(writer, node.activation().code())?;
            write_id_list(writer, node.incoming())?;
            write_id_list(writer, node.outgoing())?;
        }

        let mut connections: Vec<&Connection> = self.connections.values().collect();
        connections.sort_unstable_by_key(|c| c.key());
        write_u64(writer, connections.len() as u64)?;
        for connection in connections {
            write_f64(writer, connection.weight())?;
            write_i32(writer, connection.from() as i32)?;
            write_i32(writer, connection.to() as i32)?;
            write_bool(writer, connection.enabled())?;
        }

        Ok(())
    }

    /// Reads a genome from `writer`'s counterpart layout (see
    /// [`save`]) and validates it: node ids must be unique and
    /// below the stored next-id counter, connection endpoints must
    /// exist, no connection may terminate at an input node,
    /// input biases must be zero, neighbour lists must agree
    /// exactly with the connection records, input/output counts
    /// must match the header, and the topology must be acyclic.
    ///
    /// # Errors
    /// Returns an error if the reader fails (including a
    /// truncated stream) or any validation fails.
    ///
    /// [`save`]: Genome::save
    pub fn load<R: Read>(reader: &mut R) -> Result<Genome, LoadError> {
        let input_count = read_count(reader, "input_count")?;
        let output_count = read_count(reader, "output_count")?;
        let next_id = read_count(reader, "next_id")? as NodeId;
        let fitness = read_f64(reader)?;

        let mut nodes: HashMap<NodeId, Node, RandomState> = HashMap::default();
        let node_count = read_u64(reader)?;
        for _ in 0..node_count {
            let id = read_count(reader, "node id")? as NodeId;
            let bias = read_f64(reader)?;
            let hidden = read_bool(reader)?;
            let input = read_bool(reader)?;
            let code = read_i32(reader)?;
            let incoming = read_id_list(reader)?;
            let outgoing = read_id_list(reader)?;

            if id >= next_id {
                return Err(LoadError::IdOutOfRange(id));
            }
            let kind = match (input, hidden) {
                (true, true) => return Err(LoadError::InvalidNodeFlags(id)),
                (true, false) => NodeKind::Input,
                (false, true) => NodeKind::Hidden,
                (false, false) => NodeKind::Output,
            };
            let activation =
                Activation::from_code(code).ok_or(LoadError::UnknownActivationCode(code))?;
            if kind == NodeKind::Input && bias != 0.0 {
                return Err(LoadError::InputBias(id));
            }

            let mut node = Node::new(id, kind, activation);
            node.set_bias(bias);
            for from in incoming {
                node.add_incoming(from);
            }
            for to in outgoing {
                node.add_outgoing(to);
            }
            if nodes.insert(id, node).is_some() {
                return Err(LoadError::DuplicateNode(id));
            }
        }

        let mut connections: HashMap<(NodeId, NodeId), Connection, RandomState> =
            HashMap::default();
        let connection_count = read_u64(reader)?;
        for _ in 0..connection_count {
            let weight = read_f64(reader)?;
            let from = read_count(reader, "connection from")? as NodeId;
            let to = read_count(reader, "connection to")? as NodeId;
            let enabled = read_bool(reader)?;

            if !(nodes.contains_key(&from) && nodes.contains_key(&to)) {
                return Err(LoadError::UnknownEndpoint(from, to));
            }
            if nodes[&to].kind() == NodeKind::Input {
                return Err(LoadError::InputTarget(from, to));
            }
            let mut connection = Connection::new(from, to, weight);
            connection.set_enabled(enabled);
            if connections.insert((from, to), connection).is_some() {
                return Err(LoadError::DuplicateConnection(from, to));
            }
        }

        // Neighbour lists and connection records must describe the
        // same edge set, in both directions.
        for key in connections.keys() {
            let (from, to) = *key;
            if !nodes[&from].outgoing().any(|&id| id == to)
                || !nodes[&to].incoming().any(|&id| id == from)
            {
                return Err(LoadError::AdjacencyMismatch(from, to));
            }
        }
        for node in nodes.values() {
            for &from in node.incoming() {
                if !connections.contains_key(&(from, node.id())) {
                    return Err(LoadError::AdjacencyMismatch(from, node.id()));
                }
            }
            for &to in node.outgoing() {
                if !connections.contains_key(&(node.id(), to)) {
                    return Err(LoadError::AdjacencyMismatch(node.id(), to));
                }
            }
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
        if inputs.len() != input_count {
            return Err(LoadError::InputCountMismatch(input_count, inputs.len()));
        }
        if outputs.len() != output_count {
            return Err(LoadError::OutputCountMismatch(output_count, outputs.len()));
        }

        if is_cyclic(&nodes) {
            return Err(LoadError::CyclicTopology);
        }

        Ok(Genome {
            nodes,
            connections,
            inputs,
            outputs,
            next_id,
            fitness,
        })
    }
}

/// Kahn's algorithm over the incoming-neighbour sets; if
/// processing cannot consume every node, a cycle remains.
fn is_cyclic(nodes: &HashMap<NodeId, Node, RandomState>) -> bool {
    let mut in_degrees: HashMap<NodeId, usize, RandomState> = nodes
        .values()
        .map(|n| (n.id(), n.incoming().count()))
        .collect();
    let mut ready: VecDeque<NodeId> = in_degrees
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut processed = 0;
    while let Some(id) = ready.pop_front() {
        processed += 1;
        for &to in nodes[&id].outgoing() {
            let degree = in_degrees.get_mut(&to).unwrap();
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(to);
            }
        }
    }
    processed != nodes.len()
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_f64<W: Write>(writer: &mut W, value: f64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    writer.write_all(&[value as u8])
}

fn write_id_list<'a, W: Write>(
    writer: &mut W,
    ids: impl Iterator<Item = &'a NodeId>,
) -> io::Result<()> {
    let mut ids: Vec<NodeId> = ids.copied().collect();
    ids.sort_unstable();
    write_u64(writer, ids.len() as u64)?;
    for id in ids {
        write_i32(writer, id as i32)?;
    }
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, LoadError> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(i32::from_le_bytes(buffer))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, LoadError> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64, LoadError> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer)?;
    Ok(f64::from_le_bytes(buffer))
}

fn read_bool<R: Read>(reader: &mut R) -> Result<bool, LoadError> {
    let mut buffer = [0u8; 1];
    reader.read_exact(&mut buffer)?;
    Ok(buffer[0] != 0)
}

/// Reads an `i32` that must be non-negative.
fn read_count<R: Read>(reader: &mut R, field: &'static str) -> Result<usize, LoadError> {
    let value = read_i32(reader)?;
    if value < 0 {
        return Err(LoadError::NegativeField(field));
    }
    Ok(value as usize)
}

fn read_id_list<R: Read>(reader: &mut R) -> Result<Vec<NodeId>, LoadError> {
    let count = read_u64(reader)?;
    (0..count)
        .map(|_| Ok(read_count(reader, "neighbour id")? as NodeId))
        .collect()
}

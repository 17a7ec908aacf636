// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The table transform graph.
//!
//! Nodes, ports and control flow edges live in arenas owned by
//! [`TableTransformGraph`] and refer to each other by id. Data dependencies
//! are not stored as edges; they follow from the access classes a port reads
//! and the node producing that class.

mod build;

use std::{
	collections::HashSet,
	fmt::{Display, Formatter},
	sync::Arc,
};

use smallvec::SmallVec;
use tablecap_core::{
	MapperFactory, ObserverFactory, Result, RowFilterFactory, RowRange, SinkSpec, SourceSpec, TableTransform, Type,
	internal_err, return_internal_error,
};
use tracing::instrument;

use crate::access::{AccessId, AccessTable};

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct NodeId(pub usize);

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "n{}", self.0)
	}
}

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct PortId(pub usize);

impl Display for PortId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "p{}", self.0)
	}
}

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct EdgeId(pub usize);

/// What a node does, with its per-kind payload.
///
/// Column lists stored here run parallel to the output accesses of the node
/// and shrink with them when outputs are pruned.
#[derive(Debug, Clone)]
pub enum NodeKind {
	Source {
		spec: SourceSpec,
		/// Schema column index of every output.
		columns: Vec<usize>,
	},
	Missing {
		/// Type of every output.
		types: Vec<Type>,
	},
	Slice {
		range: RowRange,
	},
	Map {
		factory: Arc<dyn MapperFactory>,
		/// Factory output index of every output.
		columns: Vec<usize>,
	},
	RowFilter {
		factory: Arc<dyn RowFilterFactory>,
	},
	RowIndex {
		offset: u64,
	},
	Append,
	Concatenate,
	Observer {
		factory: Arc<dyn ObserverFactory>,
	},
}

impl NodeKind {
	pub fn name(&self) -> &'static str {
		match self {
			NodeKind::Source {
				..
			} => "SOURCE",
			NodeKind::Missing {
				..
			} => "MISSING",
			NodeKind::Slice {
				..
			} => "SLICE",
			NodeKind::Map {
				..
			} => "MAP",
			NodeKind::RowFilter {
				..
			} => "ROWFILTER",
			NodeKind::RowIndex {
				..
			} => "ROWINDEX",
			NodeKind::Append => "APPEND",
			NodeKind::Concatenate => "CONCATENATE",
			NodeKind::Observer {
				..
			} => "OBSERVER",
		}
	}

	/// Nodes that start a branch when sequentialized.
	///
	/// Their inputs each form a branch of their own; every other node is
	/// placed inside the branch of its consumer.
	pub fn is_branch_node(&self) -> bool {
		matches!(
			self,
			NodeKind::Source {
				..
			} | NodeKind::Missing {
				..
			} | NodeKind::Append | NodeKind::Concatenate
		)
	}
}

#[derive(Debug, Clone)]
pub struct Node {
	kind: NodeKind,
	inputs: SmallVec<[PortId; 2]>,
	output: PortId,
}

impl Node {
	pub fn kind(&self) -> &NodeKind {
		&self.kind
	}

	pub fn inputs(&self) -> &[PortId] {
		&self.inputs
	}

	pub fn output(&self) -> PortId {
		self.output
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PortOwner {
	Input {
		node: NodeId,
		index: usize,
	},
	Output(NodeId),
	/// An intermediate table of the transform tree during construction.
	Table,
	/// The final table handed to the consumer or sink.
	Terminal,
}

#[derive(Debug, Clone)]
pub struct Port {
	owner: PortOwner,
	accesses: Vec<AccessId>,
	edges: SmallVec<[EdgeId; 2]>,
}

impl Port {
	pub fn owner(&self) -> PortOwner {
		self.owner
	}

	pub fn accesses(&self) -> &[AccessId] {
		&self.accesses
	}

	pub fn edges(&self) -> &[EdgeId] {
		&self.edges
	}
}

/// Links a consuming port (`from`) to the output port (`to`) it depends on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlFlowEdge {
	pub from: PortId,
	pub to: PortId,
}

/// Identifies the producer of an access class: a node and the position of
/// the class among the node's current outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Producer {
	pub node: NodeId,
	pub slot: usize,
}

/// Graph of the nodes, ports and control flow edges of one compilation.
///
/// Cloning yields an independent deep copy: ids stay valid in both copies.
#[derive(Debug, Clone)]
pub struct TableTransformGraph {
	accesses: AccessTable,
	nodes: Vec<Node>,
	ports: Vec<Port>,
	edges: Vec<ControlFlowEdge>,
	terminal: PortId,
	sink: Option<SinkSpec>,
}

impl TableTransformGraph {
	/// Builds the graph of a transform tree ending in a consumer.
	#[instrument(name = "plan::graph::new", level = "debug", skip_all)]
	pub fn new(transform: &Arc<TableTransform>) -> Result<Self> {
		build::GraphBuilder::new().build(transform, None)
	}

	/// Builds the graph of a transform tree written into `sink`.
	#[instrument(name = "plan::graph::materialize", level = "debug", skip_all, fields(sink = %sink.id))]
	pub fn materialize(transform: &Arc<TableTransform>, sink: SinkSpec) -> Result<Self> {
		build::GraphBuilder::new().build(transform, Some(sink))
	}

	fn empty() -> Self {
		Self {
			accesses: AccessTable::new(),
			nodes: Vec::new(),
			ports: Vec::new(),
			edges: Vec::new(),
			terminal: PortId(0),
			sink: None,
		}
	}

	pub fn accesses(&self) -> &AccessTable {
		&self.accesses
	}

	pub(crate) fn accesses_mut(&mut self) -> &mut AccessTable {
		&mut self.accesses
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub fn port(&self, id: PortId) -> &Port {
		&self.ports[id.0]
	}

	pub fn edge(&self, id: EdgeId) -> ControlFlowEdge {
		self.edges[id.0]
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
		(0..self.nodes.len()).map(NodeId)
	}

	pub fn terminal(&self) -> PortId {
		self.terminal
	}

	pub fn sink(&self) -> Option<&SinkSpec> {
		self.sink.as_ref()
	}

	pub(crate) fn add_node(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		let output = self.add_port(PortOwner::Output(id), Vec::new());
		self.nodes.push(Node {
			kind,
			inputs: SmallVec::new(),
			output,
		});
		id
	}

	pub(crate) fn add_input(&mut self, node: NodeId, accesses: Vec<AccessId>) -> PortId {
		let index = self.nodes[node.0].inputs.len();
		let port = self.add_port(
			PortOwner::Input {
				node,
				index,
			},
			accesses,
		);
		self.nodes[node.0].inputs.push(port);
		port
	}

	pub(crate) fn add_port(&mut self, owner: PortOwner, accesses: Vec<AccessId>) -> PortId {
		let id = PortId(self.ports.len());
		self.ports.push(Port {
			owner,
			accesses,
			edges: SmallVec::new(),
		});
		id
	}

	pub(crate) fn node_kind_mut(&mut self, node: NodeId) -> &mut NodeKind {
		&mut self.nodes[node.0].kind
	}

	pub(crate) fn port_accesses_mut(&mut self, port: PortId) -> &mut Vec<AccessId> {
		&mut self.ports[port.0].accesses
	}

	/// Adds a control flow edge from the consuming port `from` to the output
	/// port `to`.
	pub(crate) fn link(&mut self, from: PortId, to: PortId) -> EdgeId {
		let id = EdgeId(self.edges.len());
		self.edges.push(ControlFlowEdge {
			from,
			to,
		});
		self.ports[from.0].edges.push(id);
		self.ports[to.0].edges.push(id);
		id
	}

	/// Removes `edge` from both of its ports.
	pub(crate) fn unlink(&mut self, edge: EdgeId) {
		let ControlFlowEdge {
			from,
			to,
		} = self.edges[edge.0];
		self.ports[from.0].edges.retain(|e| *e != edge);
		self.ports[to.0].edges.retain(|e| *e != edge);
	}

	/// Moves the consuming end of `edge` to `port`.
	pub(crate) fn relink_from(&mut self, edge: EdgeId, port: PortId) {
		let old = self.edges[edge.0].from;
		self.ports[old.0].edges.retain(|e| *e != edge);
		self.edges[edge.0].from = port;
		self.ports[port.0].edges.push(edge);
	}

	/// Moves the producing end of `edge` to `port`.
	pub(crate) fn relink_to(&mut self, edge: EdgeId, port: PortId) {
		let old = self.edges[edge.0].to;
		self.ports[old.0].edges.retain(|e| *e != edge);
		self.edges[edge.0].to = port;
		self.ports[port.0].edges.push(edge);
	}

	/// The output port a consuming port depends on.
	pub fn control_target(&self, port: PortId) -> Result<PortId> {
		let p = &self.ports[port.0];
		if matches!(p.owner, PortOwner::Output(_)) {
			return_internal_error!("{} is an output port and has no control target", port);
		}
		match p.edges.as_slice() {
			[edge] => Ok(self.edges[edge.0].to),
			edges => internal_err!("{} has {} control flow edges, expected exactly one", port, edges.len()),
		}
	}

	/// The node a consuming port depends on for control flow.
	pub fn control_node(&self, port: PortId) -> Result<NodeId> {
		let target = self.control_target(port)?;
		self.output_owner(target)
	}

	pub fn output_owner(&self, port: PortId) -> Result<NodeId> {
		match self.ports[port.0].owner {
			PortOwner::Output(node) => Ok(node),
			owner => internal_err!("{} is owned by {:?}, expected a node output", port, owner),
		}
	}

	/// Resolves the producer of the class `access` belongs to.
	pub fn producer(&self, access: AccessId) -> Result<Producer> {
		let root = self.accesses.find(access);
		let Some(node) = self.accesses.producer(root) else {
			return_internal_error!("{} has no producer", access);
		};
		let output = &self.ports[self.nodes[node.0].output.0];
		match output.accesses.iter().position(|a| *a == root) {
			Some(slot) => Ok(Producer {
				node,
				slot,
			}),
			None => internal_err!("{} is produced by {} but not among its outputs", root, node),
		}
	}

	/// Nodes `node` depends on directly: producers of the accesses its input
	/// ports read, then the control nodes of its inputs.
	pub fn dependencies(&self, node: NodeId) -> Result<SmallVec<[NodeId; 4]>> {
		let mut result = SmallVec::new();
		for &input in &self.nodes[node.0].inputs {
			self.port_dependencies(input, &mut result)?;
		}
		Ok(result)
	}

	/// Appends the nodes a consuming port depends on to `result`, data
	/// producers first.
	pub fn port_dependencies(&self, port: PortId, result: &mut SmallVec<[NodeId; 4]>) -> Result<()> {
		let port = &self.ports[port.0];
		for &access in &port.accesses {
			let producer = self.producer(access)?.node;
			if !result.contains(&producer) {
				result.push(producer);
			}
		}
		for &edge in &port.edges {
			let node = self.output_owner(self.edges[edge.0].to)?;
			if !result.contains(&node) {
				result.push(node);
			}
		}
		Ok(())
	}

	/// All nodes the terminal depends on, in depth-first discovery order.
	pub fn reachable_nodes(&self) -> Result<Vec<NodeId>> {
		let mut roots = SmallVec::new();
		self.port_dependencies(self.terminal, &mut roots)?;

		let mut seen = HashSet::new();
		let mut order = Vec::new();
		let mut stack: Vec<NodeId> = roots.into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			if !seen.insert(node) {
				continue;
			}
			order.push(node);
			for dependency in self.dependencies(node)?.into_iter().rev() {
				if !seen.contains(&dependency) {
					stack.push(dependency);
				}
			}
		}
		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use tablecap_core::{Schema, SourceId, SourceProperties};

	use super::*;

	fn source_node(graph: &mut TableTransformGraph) -> NodeId {
		let spec = SourceSpec::new(SourceId::generate(), Schema::new([Type::Int8]), SourceProperties::default());
		let node = graph.add_node(NodeKind::Source {
			spec,
			columns: vec![0],
		});
		let access = graph.accesses.create(Type::Int8, Some(node));
		let output = graph.node(node).output();
		graph.port_accesses_mut(output).push(access);
		node
	}

	#[test]
	fn test_link_and_control_target() {
		let mut graph = TableTransformGraph::empty();
		let source = source_node(&mut graph);
		let slice = graph.add_node(NodeKind::Slice {
			range: RowRange::ALL,
		});
		let input = graph.add_input(slice, vec![]);
		graph.link(input, graph.node(source).output());

		assert_eq!(graph.control_node(input).unwrap(), source);
		assert_eq!(graph.port(graph.node(source).output()).edges().len(), 1);
	}

	#[test]
	fn test_relink_moves_edge() {
		let mut graph = TableTransformGraph::empty();
		let first = source_node(&mut graph);
		let second = source_node(&mut graph);
		let table = graph.add_port(PortOwner::Table, vec![]);
		let edge = graph.link(table, graph.node(first).output());

		graph.relink_to(edge, graph.node(second).output());

		assert!(graph.port(graph.node(first).output()).edges().is_empty());
		assert_eq!(graph.control_node(table).unwrap(), second);
	}

	#[test]
	fn test_control_target_requires_single_edge() {
		let mut graph = TableTransformGraph::empty();
		let table = graph.add_port(PortOwner::Table, vec![]);
		assert!(graph.control_target(table).is_err());
	}

	#[test]
	fn test_producer_slot() {
		let mut graph = TableTransformGraph::empty();
		let source = source_node(&mut graph);
		let output = graph.node(source).output();
		let second = graph.accesses.create(Type::Utf8, Some(source));
		graph.port_accesses_mut(output).push(second);
		let alias = graph.accesses.alias(&[second]).unwrap()[0];

		assert_eq!(
			graph.producer(alias).unwrap(),
			Producer {
				node: source,
				slot: 1
			}
		);
	}

	#[test]
	fn test_clone_is_independent() {
		let mut graph = TableTransformGraph::empty();
		let source = source_node(&mut graph);
		let copy = graph.clone();

		let table = graph.add_port(PortOwner::Table, vec![]);
		graph.link(table, graph.node(source).output());

		assert_eq!(graph.port(graph.node(source).output()).edges().len(), 1);
		assert!(copy.port(copy.node(source).output()).edges().is_empty());
	}
}

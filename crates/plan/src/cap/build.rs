// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use indexmap::IndexMap;
use tablecap_core::{Result, Schema, SourceId, return_internal_error};
use tracing::{debug, instrument};

use super::{CapAccessId, CapNode, CursorAssemblyPlan};
use crate::{
	access::AccessId,
	branch::{Branch, BranchGraph, BranchNode},
	graph::{NodeId, NodeKind, TableTransformGraph},
	properties::TableTransformGraphProperties,
};

/// Where the nodes of one emitted branch ended up.
struct BranchScope {
	indices: HashMap<NodeId, usize>,
	/// Index of the node whose rows the branch delivers.
	last: usize,
}

/// Flattens a [`BranchGraph`] into a [`CursorAssemblyPlan`].
///
/// Every branch is emitted with the branches of its head first, then its
/// head, then its inner nodes, so that all references point backwards. A
/// branch node shared by several branches is emitted once per branch; each
/// copy gets its own cursor at runtime.
pub(crate) struct CapBuilder<'a> {
	graph: &'a TableTransformGraph,
	properties: &'a TableTransformGraphProperties,
	nodes: Vec<CapNode>,
	schemas: IndexMap<SourceId, Schema>,
}

impl<'a> CapBuilder<'a> {
	pub(crate) fn new(graph: &'a TableTransformGraph, properties: &'a TableTransformGraphProperties) -> Self {
		Self {
			graph,
			properties,
			nodes: Vec::new(),
			schemas: IndexMap::new(),
		}
	}

	#[instrument(name = "plan::cap::build", level = "debug", skip_all)]
	pub(crate) fn build(mut self, branches: &BranchGraph) -> Result<CursorAssemblyPlan> {
		let scope = self.append_branch(branches.root())?;

		let terminal = self.graph.terminal();
		let inputs = self.resolve_all(self.graph.port(terminal).accesses(), &scope)?;
		let predecessor = scope.last;
		let node = match self.graph.sink() {
			Some(sink) => {
				self.schemas.insert(sink.id, sink.schema.clone());
				CapNode::Materialize {
					sink: sink.id,
					inputs,
					predecessor,
				}
			}
			None => CapNode::Consumer {
				inputs,
				predecessor,
			},
		};
		self.nodes.push(node);

		debug!(nodes = self.nodes.len(), sources = self.schemas.len(), "built cursor assembly plan");
		Ok(CursorAssemblyPlan::new(
			self.nodes,
			self.properties.cursor_type(),
			self.properties.num_rows(),
			self.schemas,
		))
	}

	fn append_branch(&mut self, branch: &Branch) -> Result<BranchScope> {
		let head = self.append_branch_node(branch.head())?;
		let mut scope = BranchScope {
			indices: HashMap::from([(branch.head().node(), head)]),
			last: head,
		};

		for inner in branch.inner() {
			let node = self.graph.node(inner.node());
			let predecessor = scope.last;
			let cap = match node.kind() {
				NodeKind::Slice {
					range,
				} => CapNode::Slice {
					predecessor,
					from: range.from(),
					to: range.to(),
				},
				NodeKind::RowIndex {
					offset,
				} => CapNode::RowIndex {
					predecessor,
					offset: *offset,
				},
				NodeKind::RowFilter {
					factory,
				} => CapNode::RowFilter {
					inputs: self.resolve_input(inner.node(), &scope)?,
					predecessor,
					factory: factory.clone(),
				},
				NodeKind::Observer {
					factory,
				} => CapNode::Observer {
					inputs: self.resolve_input(inner.node(), &scope)?,
					predecessor,
					factory: factory.clone(),
				},
				NodeKind::Map {
					factory,
					columns,
				} => CapNode::Map {
					inputs: self.resolve_input(inner.node(), &scope)?,
					predecessor,
					columns: columns.clone(),
					factory: factory.clone(),
				},
				kind => {
					return_internal_error!("{} {} scheduled inside a branch", kind.name(), inner.node());
				}
			};

			let index = self.push(cap);
			scope.indices.insert(inner.node(), index);
			scope.last = index;
		}

		Ok(scope)
	}

	fn append_branch_node(&mut self, head: &BranchNode) -> Result<usize> {
		let node = self.graph.node(head.node());
		let cap = match node.kind() {
			NodeKind::Source {
				spec,
				columns,
			} => {
				self.schemas.insert(spec.id, spec.schema.clone());
				CapNode::Source {
					id: spec.id,
					columns: columns.clone(),
					range: spec.range,
				}
			}
			NodeKind::Missing {
				types,
			} => CapNode::Missing {
				types: types.clone(),
			},
			NodeKind::Append => {
				let mut inputs = Vec::new();
				let mut predecessors = Vec::new();
				let mut predecessor_outputs = Vec::new();
				let mut predecessor_sizes = Vec::new();

				for (port, branch) in node.inputs().iter().zip(head.branches()) {
					let scope = self.append_branch(branch)?;
					let resolved = self.resolve_all(self.graph.port(*port).accesses(), &scope)?;
					predecessor_outputs.push((inputs.len()..inputs.len() + resolved.len()).collect());
					inputs.extend(resolved);
					predecessors.push(scope.last);
					predecessor_sizes.push(self.properties.port(self.graph, *port)?.num_rows);
				}

				CapNode::Append {
					inputs,
					predecessors,
					predecessor_outputs,
					predecessor_sizes,
				}
			}
			NodeKind::Concatenate => {
				let mut inputs = Vec::new();
				let mut predecessors = Vec::new();
				let mut predecessor_sizes = Vec::new();

				for (port, branch) in node.inputs().iter().zip(head.branches()) {
					let scope = self.append_branch(branch)?;
					inputs.push(self.resolve_all(self.graph.port(*port).accesses(), &scope)?);
					predecessors.push(scope.last);
					predecessor_sizes.push(self.properties.port(self.graph, *port)?.num_rows);
				}

				CapNode::Concatenate {
					inputs,
					predecessors,
					predecessor_sizes,
				}
			}
			kind => {
				return_internal_error!("{} {} cannot head a branch", kind.name(), head.node());
			}
		};
		Ok(self.push(cap))
	}

	fn push(&mut self, node: CapNode) -> usize {
		self.nodes.push(node);
		self.nodes.len() - 1
	}

	fn resolve_input(&self, node: NodeId, scope: &BranchScope) -> Result<Vec<CapAccessId>> {
		match self.graph.node(node).inputs() {
			[input] => self.resolve_all(self.graph.port(*input).accesses(), scope),
			inputs => {
				return_internal_error!("{} has {} input ports, expected one", node, inputs.len());
			}
		}
	}

	fn resolve_all(&self, accesses: &[AccessId], scope: &BranchScope) -> Result<Vec<CapAccessId>> {
		accesses.iter().map(|access| self.resolve(*access, scope)).collect()
	}

	fn resolve(&self, access: AccessId, scope: &BranchScope) -> Result<CapAccessId> {
		let producer = self.graph.producer(access)?;
		match scope.indices.get(&producer.node) {
			Some(index) => Ok(CapAccessId::new(*index, producer.slot)),
			None => {
				return_internal_error!("{} is produced by {} outside of its branch", access, producer.node);
			}
		}
	}
}

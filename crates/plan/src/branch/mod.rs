// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Splitting a graph into linear branches.
//!
//! A branch is everything one consuming port needs between itself and the
//! next branch node (SOURCE, MISSING, APPEND or CONCATENATE): the branch node
//! at its head, followed by the slices, maps, row filters, row indexes and
//! observers in between, in an order satisfying all of their dependencies.
//! Each input of a branch node roots a branch of its own.

mod policy;

use std::{
	collections::{HashMap, HashSet},
	rc::Rc,
};

pub use policy::{FirstEligible, FiltersFirst, OrderingPolicy};
use smallvec::SmallVec;
use tablecap_core::{Result, return_internal_error};
use tracing::{instrument, trace};

use crate::graph::{NodeId, PortId, TableTransformGraph};

#[derive(Debug)]
pub struct BranchNode {
	node: NodeId,
	branches: Vec<Rc<Branch>>,
}

impl BranchNode {
	pub fn node(&self) -> NodeId {
		self.node
	}

	/// One branch per input port, in input order.
	pub fn branches(&self) -> &[Rc<Branch>] {
		&self.branches
	}
}

#[derive(Debug, Clone)]
pub struct InnerNode {
	node: NodeId,
	dependencies: SmallVec<[NodeId; 4]>,
}

impl InnerNode {
	pub fn node(&self) -> NodeId {
		self.node
	}

	/// Nodes that must run before this one: producers of its inputs and its
	/// control target.
	pub fn dependencies(&self) -> &[NodeId] {
		&self.dependencies
	}
}

#[derive(Debug)]
pub struct Branch {
	port: PortId,
	head: Rc<BranchNode>,
	inner: Vec<InnerNode>,
}

impl Branch {
	/// The consuming port this branch feeds.
	pub fn port(&self) -> PortId {
		self.port
	}

	pub fn head(&self) -> &Rc<BranchNode> {
		&self.head
	}

	/// Inner nodes in execution order.
	pub fn inner(&self) -> &[InnerNode] {
		&self.inner
	}
}

#[derive(Debug)]
pub struct BranchGraph {
	root: Rc<Branch>,
}

impl BranchGraph {
	#[instrument(name = "plan::branch", level = "debug", skip_all)]
	pub fn new(graph: &TableTransformGraph, policy: &dyn OrderingPolicy) -> Result<Self> {
		let mut builder = BranchGraphBuilder {
			graph,
			policy,
			heads: HashMap::new(),
		};
		let root = builder.branch(graph.terminal())?;
		Ok(Self {
			root,
		})
	}

	/// The branch feeding the terminal.
	pub fn root(&self) -> &Rc<Branch> {
		&self.root
	}
}

struct BranchGraphBuilder<'a> {
	graph: &'a TableTransformGraph,
	policy: &'a dyn OrderingPolicy,
	heads: HashMap<NodeId, Rc<BranchNode>>,
}

impl BranchGraphBuilder<'_> {
	fn branch(&mut self, port: PortId) -> Result<Rc<Branch>> {
		let mut dependencies = SmallVec::new();
		self.graph.port_dependencies(port, &mut dependencies)?;

		let mut discovery = Discovery::default();
		for dependency in dependencies {
			self.discover(dependency, &mut discovery)?;
		}

		let Some(head) = discovery.head else {
			return_internal_error!("branch of {} reaches no branch node", port);
		};
		let head = self.branch_node(head)?;
		let inner = self.sequentialize(head.node, discovery.order)?;

		trace!(port = %port, head = %head.node, inner = inner.len(), "built branch");
		Ok(Rc::new(Branch {
			port,
			head,
			inner,
		}))
	}

	fn branch_node(&mut self, node: NodeId) -> Result<Rc<BranchNode>> {
		if let Some(head) = self.heads.get(&node) {
			return Ok(head.clone());
		}

		let mut branches = Vec::new();
		for input in self.graph.node(node).inputs() {
			branches.push(self.branch(*input)?);
		}

		let head = Rc::new(BranchNode {
			node,
			branches,
		});
		self.heads.insert(node, head.clone());
		Ok(head)
	}

	/// Depth-first post-order walk over the inner nodes `node` leads to.
	fn discover(&self, node: NodeId, discovery: &mut Discovery) -> Result<()> {
		if self.graph.node(node).kind().is_branch_node() {
			match discovery.head {
				Some(head) if head != node => {
					return_internal_error!("branch reaches both {} and {}", head, node);
				}
				_ => discovery.head = Some(node),
			}
			return Ok(());
		}

		if !discovery.seen.insert(node) {
			return Ok(());
		}

		let dependencies = self.graph.dependencies(node)?;
		for dependency in &dependencies {
			self.discover(*dependency, discovery)?;
		}
		discovery.order.push(InnerNode {
			node,
			dependencies,
		});
		Ok(())
	}

	/// Orders `nodes` so that each follows all of its dependencies, letting
	/// the policy pick among the eligible ones.
	fn sequentialize(&self, head: NodeId, mut nodes: Vec<InnerNode>) -> Result<Vec<InnerNode>> {
		let mut scheduled = HashSet::from([head]);
		let mut result = Vec::with_capacity(nodes.len());

		while !nodes.is_empty() {
			let eligible: Vec<usize> = nodes
				.iter()
				.enumerate()
				.filter(|(_, inner)| inner.dependencies.iter().all(|d| scheduled.contains(d)))
				.map(|(index, _)| index)
				.collect();
			if eligible.is_empty() {
				return_internal_error!("{} inner nodes have unsatisfiable dependencies", nodes.len());
			}

			let candidates: Vec<&InnerNode> = eligible.iter().map(|index| &nodes[*index]).collect();
			let choice = self.policy.select(self.graph, &candidates);
			let Some(index) = eligible.get(choice).copied() else {
				return_internal_error!("ordering policy chose {} of {} eligible nodes", choice, eligible.len());
			};

			let inner = nodes.remove(index);
			scheduled.insert(inner.node);
			result.push(inner);
		}

		Ok(result)
	}
}

#[derive(Default)]
struct Discovery {
	head: Option<NodeId>,
	seen: HashSet<NodeId>,
	order: Vec<InnerNode>,
}

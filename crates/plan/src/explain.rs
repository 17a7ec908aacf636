// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Human readable renderings of plans and graphs.

use std::{
	collections::HashSet,
	fmt::{Display, Formatter},
};

use smallvec::SmallVec;
use tablecap_core::Result;

use crate::{
	cap::{CapAccessId, CapNode, CursorAssemblyPlan},
	graph::{NodeId, NodeKind, TableTransformGraph},
};

impl Display for CapAccessId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.producer, self.slot)
	}
}

struct List<'a, T>(&'a [T]);

impl<T: Display> Display for List<'_, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("[")?;
		for (index, item) in self.0.iter().enumerate() {
			if index > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}", item)?;
		}
		f.write_str("]")
	}
}

struct Size(Option<u64>);

impl Display for Size {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.0 {
			Some(num_rows) => write!(f, "{}", num_rows),
			None => f.write_str("?"),
		}
	}
}

impl Display for CapNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			CapNode::Source {
				id,
				columns,
				range,
			} => write!(f, "SOURCE {} columns={} rows={}", id, List(columns), range),
			CapNode::Missing {
				types,
			} => write!(f, "MISSING types={}", List(types)),
			CapNode::Slice {
				predecessor,
				from,
				to,
			} => write!(f, "SLICE pred={} from={} to={}", predecessor, from, to),
			CapNode::RowFilter {
				inputs,
				predecessor,
				..
			} => write!(f, "ROWFILTER pred={} inputs={}", predecessor, List(inputs)),
			CapNode::RowIndex {
				predecessor,
				offset,
			} => write!(f, "ROWINDEX pred={} offset={}", predecessor, offset),
			CapNode::Map {
				inputs,
				predecessor,
				columns,
				..
			} => write!(f, "MAP pred={} inputs={} outputs={}", predecessor, List(inputs), List(columns)),
			CapNode::Observer {
				inputs,
				predecessor,
				..
			} => write!(f, "OBSERVER pred={} inputs={}", predecessor, List(inputs)),
			CapNode::Append {
				inputs,
				predecessors,
				predecessor_outputs,
				predecessor_sizes,
			} => {
				write!(f, "APPEND preds={} inputs={} outputs=[", List(predecessors), List(inputs))?;
				for (index, outputs) in predecessor_outputs.iter().enumerate() {
					if index > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", List(outputs))?;
				}
				let sizes: Vec<Size> = predecessor_sizes.iter().map(|s| Size(*s)).collect();
				write!(f, "] sizes={}", List(&sizes))
			}
			CapNode::Concatenate {
				inputs,
				predecessors,
				predecessor_sizes,
			} => {
				write!(f, "CONCATENATE preds={} inputs=[", List(predecessors))?;
				for (index, inputs) in inputs.iter().enumerate() {
					if index > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", List(inputs))?;
				}
				let sizes: Vec<Size> = predecessor_sizes.iter().map(|s| Size(*s)).collect();
				write!(f, "] sizes={}", List(&sizes))
			}
			CapNode::Consumer {
				inputs,
				predecessor,
			} => write!(f, "CONSUMER pred={} inputs={}", predecessor, List(inputs)),
			CapNode::Materialize {
				sink,
				inputs,
				predecessor,
			} => write!(f, "MATERIALIZE {} pred={} inputs={}", sink, predecessor, List(inputs)),
		}
	}
}

impl Display for CursorAssemblyPlan {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "cursor: {}, rows: {}", self.cursor_type(), Size(self.num_rows()))?;
		for (index, node) in self.nodes().iter().enumerate() {
			writeln!(f, "{:>3}: {}", index, node)?;
		}
		Ok(())
	}
}

/// One line per plan node, preceded by the plan's cursor type and row count.
pub fn explain_cap(plan: &CursorAssemblyPlan) -> String {
	plan.to_string()
}

/// Renders the nodes the terminal depends on as a tree.
///
/// Children of a node are the nodes it depends on, data producers first.
/// A node reached a second time is only named.
pub fn explain_graph(graph: &TableTransformGraph) -> Result<String> {
	let terminal = graph.port(graph.terminal());
	let mut output = match graph.sink() {
		Some(sink) => format!("MATERIALIZE {} [{} column(s)]\n", sink.id, terminal.accesses().len()),
		None => format!("CONSUMER [{} column(s)]\n", terminal.accesses().len()),
	};

	let mut roots = SmallVec::new();
	graph.port_dependencies(graph.terminal(), &mut roots)?;

	let mut seen = HashSet::new();
	for (index, node) in roots.iter().enumerate() {
		render_node(graph, *node, "", index == roots.len() - 1, &mut seen, &mut output)?;
	}
	Ok(output)
}

fn render_node(
	graph: &TableTransformGraph,
	node: NodeId,
	prefix: &str,
	is_last: bool,
	seen: &mut HashSet<NodeId>,
	output: &mut String,
) -> Result<()> {
	let branch = if is_last {
		"└──"
	} else {
		"├──"
	};
	let label = node_label(graph, node);

	if !seen.insert(node) {
		output.push_str(&format!("{}{} {} (see above)\n", prefix, branch, label));
		return Ok(());
	}
	output.push_str(&format!("{}{} {}\n", prefix, branch, label));

	let child_prefix = format!(
		"{}{}",
		prefix,
		if is_last {
			"    "
		} else {
			"│   "
		}
	);
	let dependencies = graph.dependencies(node)?;
	for (index, dependency) in dependencies.iter().enumerate() {
		render_node(graph, *dependency, &child_prefix, index == dependencies.len() - 1, seen, output)?;
	}
	Ok(())
}

fn node_label(graph: &TableTransformGraph, node: NodeId) -> String {
	let kind = graph.node(node).kind();
	let detail = match kind {
		NodeKind::Source {
			spec,
			columns,
		} => format!(" {} columns={} rows={}", spec.id, List(columns), spec.range),
		NodeKind::Missing {
			types,
		} => format!(" types={}", List(types)),
		NodeKind::Slice {
			range,
		} => format!(" rows={}", range),
		NodeKind::Map {
			columns,
			..
		} => format!(" outputs={}", List(columns)),
		NodeKind::RowIndex {
			offset,
		} => format!(" offset={}", offset),
		NodeKind::RowFilter {
			..
		}
		| NodeKind::Append
		| NodeKind::Concatenate
		| NodeKind::Observer {
			..
		} => String::new(),
	};
	let accesses = graph.port(graph.node(node).output()).accesses();
	if accesses.is_empty() {
		format!("{}{} {}", kind.name(), detail, node)
	} else {
		format!("{}{} {} -> {}", kind.name(), detail, node, List(accesses))
	}
}

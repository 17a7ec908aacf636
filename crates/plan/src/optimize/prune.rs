// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use tablecap_core::{Result, return_internal_error};
use tracing::{debug, instrument};

use crate::{
	access::AccessId,
	graph::{NodeId, NodeKind, TableTransformGraph},
};

enum Work {
	Access(AccessId),
	Node(NodeId),
}

/// Removes every node output nothing downstream of the terminal needs.
///
/// An output is needed when the terminal reads it, when a reached map, row
/// filter or observer reads it, or when it feeds a needed output of an append
/// or concatenate. Nodes reached through control flow are kept; only their
/// superfluous columns go away. Returns whether anything was removed.
#[instrument(name = "plan::optimize::prune_accesses", level = "debug", skip_all)]
pub fn prune_accesses(graph: &mut TableTransformGraph) -> Result<bool> {
	let required = collect_required(graph)?;

	let mut removed = 0;
	for node in graph.node_ids().collect::<Vec<_>>() {
		let output = graph.node(node).output();
		let keep: Vec<bool> = graph
			.port(output)
			.accesses()
			.iter()
			.map(|access| required.contains(&graph.accesses().find(*access)))
			.collect();
		if keep.iter().all(|k| *k) {
			continue;
		}

		removed += keep.iter().filter(|k| !**k).count();
		retain(graph.port_accesses_mut(output), &keep);

		match graph.node_kind_mut(node) {
			NodeKind::Source {
				columns,
				..
			} => retain(columns, &keep),
			NodeKind::Missing {
				types,
			} => retain(types, &keep),
			NodeKind::Map {
				columns,
				..
			} => retain(columns, &keep),
			NodeKind::Append => {
				let inputs = graph.node(node).inputs().to_vec();
				let mut offset = 0;
				for input in inputs {
					let accesses = graph.port_accesses_mut(input);
					let len = accesses.len();
					retain(accesses, &keep[offset..offset + len]);
					offset += len;
				}
			}
			NodeKind::Concatenate => {
				for input in graph.node(node).inputs().to_vec() {
					retain(graph.port_accesses_mut(input), &keep);
				}
			}
			NodeKind::RowIndex {
				..
			} => {}
			kind => {
				return_internal_error!("{} {} produces outputs", kind.name(), node);
			}
		}
	}

	debug!(removed, "pruned accesses");
	Ok(removed > 0)
}

fn collect_required(graph: &TableTransformGraph) -> Result<HashSet<AccessId>> {
	let mut required = HashSet::new();
	let mut visited = HashSet::new();

	let terminal = graph.port(graph.terminal());
	let mut work: Vec<Work> = terminal.accesses().iter().map(|access| Work::Access(*access)).collect();
	work.push(Work::Node(graph.control_node(graph.terminal())?));

	while let Some(item) = work.pop() {
		match item {
			Work::Access(access) => {
				let root = graph.accesses().find(access);
				if !required.insert(root) {
					continue;
				}
				let producer = graph.producer(root)?;
				work.push(Work::Node(producer.node));

				let node = graph.node(producer.node);
				match node.kind() {
					NodeKind::Append => {
						let mut slot = producer.slot;
						for input in node.inputs() {
							let accesses = graph.port(*input).accesses();
							if slot < accesses.len() {
								work.push(Work::Access(accesses[slot]));
								break;
							}
							slot -= accesses.len();
						}
					}
					NodeKind::Concatenate => {
						for input in node.inputs() {
							work.push(Work::Access(graph.port(*input).accesses()[producer.slot]));
						}
					}
					_ => {}
				}
			}
			Work::Node(node) => {
				if !visited.insert(node) {
					continue;
				}
				let node = graph.node(node);
				for input in node.inputs() {
					for edge in graph.port(*input).edges() {
						work.push(Work::Node(graph.output_owner(graph.edge(*edge).to)?));
					}
				}
				if matches!(
					node.kind(),
					NodeKind::Map { .. } | NodeKind::RowFilter { .. } | NodeKind::Observer { .. }
				) {
					for input in node.inputs() {
						for access in graph.port(*input).accesses() {
							work.push(Work::Access(*access));
						}
					}
				}
			}
		}
	}

	Ok(required)
}

fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
	let mut index = 0;
	values.retain(|_| {
		let result = keep[index];
		index += 1;
		result
	});
}

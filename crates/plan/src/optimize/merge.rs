// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tablecap_core::{Result, RowRange, SourceSpec};
use tracing::{debug, instrument};

use crate::graph::{NodeId, NodeKind, PortId, TableTransformGraph};

/// Merges one slice into the node controlling it.
///
/// A slice directly below a source that supports row ranges is folded into
/// the source's range; a slice directly below another slice is folded into
/// a single slice. Only predecessors consumed by nothing but the slice are
/// merged. The merged node replaces both originals, which remain in the
/// arena unreachable. Returns whether a merge happened.
#[instrument(name = "plan::optimize::merge_slices", level = "debug", skip_all)]
pub fn merge_slices(graph: &mut TableTransformGraph) -> Result<bool> {
	for slice in graph.reachable_nodes()? {
		let NodeKind::Slice {
			range,
		} = graph.node(slice).kind()
		else {
			continue;
		};
		let range = *range;

		let input = graph.node(slice).inputs()[0];
		let target = graph.control_target(input)?;
		if graph.port(target).edges().len() != 1 {
			continue;
		}

		let predecessor = graph.output_owner(target)?;
		match graph.node(predecessor).kind().clone() {
			NodeKind::Source {
				spec,
				columns,
			} if spec.properties.supports_row_range => {
				let merged = merge_into_source(graph, slice, predecessor, spec, columns, range)?;
				debug!(%slice, %predecessor, %merged, "merged slice into source");
				return Ok(true);
			}
			NodeKind::Slice {
				range: outer,
			} => {
				let merged = merge_into_slice(graph, slice, predecessor, outer.retain(range))?;
				debug!(%slice, %predecessor, %merged, "merged consecutive slices");
				return Ok(true);
			}
			_ => {}
		}
	}

	Ok(false)
}

fn merge_into_source(
	graph: &mut TableTransformGraph,
	slice: NodeId,
	source: NodeId,
	spec: SourceSpec,
	columns: Vec<usize>,
	range: RowRange,
) -> Result<NodeId> {
	let merged = graph.add_node(NodeKind::Source {
		spec: SourceSpec {
			range: spec.range.retain(range),
			..spec
		},
		columns,
	});

	let source_output = graph.node(source).output();
	let merged_output = graph.node(merged).output();
	let outputs = std::mem::take(graph.port_accesses_mut(source_output));
	for access in &outputs {
		graph.accesses_mut().set_producer(*access, merged)?;
	}
	*graph.port_accesses_mut(merged_output) = outputs;

	detach_slice(graph, slice, merged_output);
	Ok(merged)
}

fn merge_into_slice(graph: &mut TableTransformGraph, slice: NodeId, outer: NodeId, range: RowRange) -> Result<NodeId> {
	let merged = graph.add_node(NodeKind::Slice {
		range,
	});
	let merged_input = graph.add_input(merged, Vec::new());

	let outer_input = graph.node(outer).inputs()[0];
	for edge in graph.port(outer_input).edges().to_vec() {
		graph.relink_from(edge, merged_input);
	}

	let merged_output = graph.node(merged).output();
	detach_slice(graph, slice, merged_output);
	Ok(merged)
}

/// Hands the consumers of `slice` over to `replacement` and drops the edge
/// into the slice's predecessor.
fn detach_slice(graph: &mut TableTransformGraph, slice: NodeId, replacement: PortId) {
	let output = graph.node(slice).output();
	for edge in graph.port(output).edges().to_vec() {
		graph.relink_to(edge, replacement);
	}

	let input = graph.node(slice).inputs()[0];
	for edge in graph.port(input).edges().to_vec() {
		graph.unlink(edge);
	}
}

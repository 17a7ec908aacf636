// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Static row count and cursor capability of a graph.

use std::collections::HashMap;

use tablecap_core::{CursorType, Result, internal_err, return_internal_error};
use tracing::{debug, instrument};

use crate::graph::{NodeId, NodeKind, PortId, TableTransformGraph};

/// What the rows flowing out of one control node support.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeProperties {
	/// `None` when the row count is only known after execution.
	pub num_rows: Option<u64>,
	pub cursor_type: CursorType,
}

/// Properties of the table the terminal receives, folded over the control
/// flow of the graph.
#[derive(Debug, Clone)]
pub struct TableTransformGraphProperties {
	terminal: NodeProperties,
	nodes: HashMap<NodeId, NodeProperties>,
}

impl TableTransformGraphProperties {
	#[instrument(name = "plan::properties", level = "debug", skip_all)]
	pub fn new(graph: &TableTransformGraph) -> Result<Self> {
		let mut nodes = HashMap::new();
		let root = graph.control_node(graph.terminal())?;
		let terminal = fold(graph, root, &mut nodes)?;
		debug!(num_rows = ?terminal.num_rows, cursor_type = %terminal.cursor_type, "computed graph properties");
		Ok(Self {
			terminal,
			nodes,
		})
	}

	pub fn num_rows(&self) -> Option<u64> {
		self.terminal.num_rows
	}

	pub fn cursor_type(&self) -> CursorType {
		self.terminal.cursor_type
	}

	/// Properties of a control node the terminal depends on.
	pub fn node(&self, node: NodeId) -> Option<NodeProperties> {
		self.nodes.get(&node).copied()
	}

	/// Properties of the rows arriving at the consuming port `port`.
	pub fn port(&self, graph: &TableTransformGraph, port: PortId) -> Result<NodeProperties> {
		let node = graph.control_node(port)?;
		match self.node(node) {
			Some(properties) => Ok(properties),
			None => internal_err!("{} is not a control node of the terminal", node),
		}
	}
}

fn fold(graph: &TableTransformGraph, node: NodeId, memo: &mut HashMap<NodeId, NodeProperties>) -> Result<NodeProperties> {
	if let Some(properties) = memo.get(&node) {
		return Ok(*properties);
	}

	let mut preceding = Vec::with_capacity(graph.node(node).inputs().len());
	for input in graph.node(node).inputs() {
		if !graph.port(*input).edges().is_empty() {
			preceding.push(fold(graph, graph.control_node(*input)?, memo)?);
		}
	}

	let properties = match graph.node(node).kind() {
		NodeKind::Source {
			spec,
			..
		} => NodeProperties {
			num_rows: spec.properties.num_rows.map(|num_rows| spec.range.num_rows(num_rows)),
			cursor_type: spec.properties.cursor_type,
		},
		NodeKind::Missing {
			..
		} => NodeProperties {
			num_rows: Some(0),
			cursor_type: CursorType::RandomAccess,
		},
		NodeKind::RowFilter {
			..
		} => NodeProperties {
			num_rows: None,
			cursor_type: CursorType::Basic,
		},
		NodeKind::Slice {
			range,
		} => {
			let [predecessor] = preceding.as_slice() else {
				return_internal_error!("SLICE {} has {} control inputs", node, preceding.len());
			};
			NodeProperties {
				num_rows: predecessor.num_rows.map(|num_rows| range.num_rows(num_rows)),
				cursor_type: predecessor.cursor_type,
			}
		}
		NodeKind::RowIndex {
			..
		}
		| NodeKind::Observer {
			..
		}
		| NodeKind::Append => NodeProperties {
			num_rows: max_rows(&preceding),
			cursor_type: min_cursor_type(&preceding),
		},
		NodeKind::Concatenate => {
			let num_rows = preceding.iter().try_fold(0u64, |sum, p| p.num_rows.map(|n| sum.saturating_add(n)));
			let mut cursor_type = min_cursor_type(&preceding);
			// jumping to a row needs the sizes of all tables before the last
			let leading_unknown = preceding.iter().rev().skip(1).any(|p| p.num_rows.is_none());
			if cursor_type == CursorType::RandomAccess && leading_unknown {
				cursor_type = CursorType::Lookahead;
			}
			NodeProperties {
				num_rows,
				cursor_type,
			}
		}
		NodeKind::Map {
			..
		} => {
			return_internal_error!("MAP {} does not control any rows", node);
		}
	};

	memo.insert(node, properties);
	Ok(properties)
}

fn max_rows(preceding: &[NodeProperties]) -> Option<u64> {
	preceding.iter().try_fold(0u64, |max, p| p.num_rows.map(|n| max.max(n)))
}

fn min_cursor_type(preceding: &[NodeProperties]) -> CursorType {
	preceding.iter().map(|p| p.cursor_type).min().unwrap_or(CursorType::RandomAccess)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use tablecap_core::{RowRange, TableTransform, Type};
	use tablecap_testing::fixture::{self, AddOne, IsPositive};

	use super::*;

	fn properties(transform: &Arc<TableTransform>) -> TableTransformGraphProperties {
		let graph = TableTransformGraph::new(transform).unwrap();
		TableTransformGraphProperties::new(&graph).unwrap()
	}

	#[test]
	fn test_source() {
		let props = properties(&fixture::random_access_source([Type::Int8], 10));
		assert_eq!(props.num_rows(), Some(10));
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);

		let props = properties(&fixture::basic_source([Type::Int8]));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::Basic);
	}

	#[test]
	fn test_slice_clamps() {
		let source = fixture::random_access_source([Type::Int8], 10);
		assert_eq!(properties(&source.clone().slice(RowRange::new(2, 5).unwrap())).num_rows(), Some(3));
		assert_eq!(properties(&source.clone().slice(RowRange::new(8, 20).unwrap())).num_rows(), Some(2));
		assert_eq!(properties(&source.slice(RowRange::new(12, 20).unwrap())).num_rows(), Some(0));
	}

	#[test]
	fn test_slice_of_unsized_source() {
		let props = properties(&fixture::random_access_unsized_source([Type::Int8]).slice(RowRange::new(2, 5).unwrap()));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);

		let props = properties(&fixture::basic_source([Type::Int8]).slice(RowRange::new(0, 1).unwrap()));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::Basic);
	}

	#[test]
	fn test_slice_keeps_lookahead() {
		let props = properties(&fixture::lookahead_source([Type::Int8], 10).slice(RowRange::new(1, 4).unwrap()));
		assert_eq!(props.num_rows(), Some(3));
		assert_eq!(props.cursor_type(), CursorType::Lookahead);
	}

	#[test]
	fn test_filter_is_basic_and_unknown() {
		let transform = fixture::random_access_source([Type::Int8], 10).filter([0], Arc::new(IsPositive));
		let props = properties(&transform);
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::Basic);
	}

	#[test]
	fn test_map_and_select_are_transparent() {
		let transform = fixture::random_access_source([Type::Int8], 7).map([0], Arc::new(AddOne)).select([0]);
		let props = properties(&transform);
		assert_eq!(props.num_rows(), Some(7));
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);
	}

	#[test]
	fn test_append_takes_max_and_min() {
		let left = fixture::random_access_source([Type::Int8], 7);
		let right = fixture::lookahead_source([Type::Int8], 9);
		let props = properties(&TableTransform::append([left, right]));
		assert_eq!(props.num_rows(), Some(9));
		assert_eq!(props.cursor_type(), CursorType::Lookahead);
	}

	#[test]
	fn test_append_with_missing() {
		let left = fixture::random_access_source([Type::Int8], 4);
		let props = properties(&TableTransform::append([left, TableTransform::missing([Type::Utf8])]));
		assert_eq!(props.num_rows(), Some(4));
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);
	}

	#[test]
	fn test_concatenate_sums() {
		let top = fixture::random_access_source([Type::Int8], 3);
		let bottom = fixture::random_access_source([Type::Int8], 4);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.num_rows(), Some(7));
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);
	}

	#[test]
	fn test_concatenate_takes_min_cursor_type() {
		let top = fixture::random_access_source([Type::Int8], 3);
		let bottom = fixture::lookahead_source([Type::Int8], 4);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.num_rows(), Some(7));
		assert_eq!(props.cursor_type(), CursorType::Lookahead);

		let top = fixture::lookahead_source([Type::Int8], 3);
		let bottom = fixture::random_access_source([Type::Int8], 4);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.cursor_type(), CursorType::Lookahead);
	}

	#[test]
	fn test_concatenate_unknown_leading_size() {
		let top = fixture::random_access_source([Type::Int8], 3).filter([0], Arc::new(IsPositive));
		let bottom = fixture::random_access_source([Type::Int8], 4);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::Basic);

		let top = fixture::random_access_unsized_source([Type::Int8]);
		let bottom = fixture::random_access_source([Type::Int8], 4);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::Lookahead);
	}

	#[test]
	fn test_concatenate_unknown_trailing_size() {
		let top = fixture::random_access_source([Type::Int8], 3);
		let bottom = fixture::random_access_unsized_source([Type::Int8]);
		let props = properties(&TableTransform::concatenate([top, bottom]));
		assert_eq!(props.num_rows(), None);
		assert_eq!(props.cursor_type(), CursorType::RandomAccess);
	}

	#[test]
	fn test_row_index_and_observer_pass_through() {
		let transform = fixture::lookahead_source([Type::Int8], 5)
			.row_index(0)
			.observe([0], fixture::Columns::observer([Type::Int8]));
		let props = properties(&transform);
		assert_eq!(props.num_rows(), Some(5));
		assert_eq!(props.cursor_type(), CursorType::Lookahead);
	}

	#[test]
	fn test_port_properties() {
		let transform = fixture::random_access_source([Type::Int8], 10).slice(RowRange::new(0, 4).unwrap());
		let graph = TableTransformGraph::new(&transform).unwrap();
		let props = TableTransformGraphProperties::new(&graph).unwrap();

		let slice = graph.control_node(graph.terminal()).unwrap();
		let input = graph.node(slice).inputs()[0];
		assert_eq!(props.port(&graph, input).unwrap().num_rows, Some(10));
		assert_eq!(props.port(&graph, graph.terminal()).unwrap().num_rows, Some(4));
	}
}

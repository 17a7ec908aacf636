// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The cursor assembly plan.
//!
//! A flat list of [`CapNode`]s a cursor runtime instantiates front to back.
//! Nodes refer to earlier nodes only, by index: their row predecessor(s) and
//! the producers of the columns they read.

mod build;

use std::sync::Arc;

pub(crate) use build::CapBuilder;
use indexmap::IndexMap;
use tablecap_core::{
	CursorType, MapperFactory, ObserverFactory, Result, RowFilterFactory, RowRange, Schema, SourceId, Type,
	return_internal_error,
};

/// A column of the plan: output `slot` of the node at index `producer`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CapAccessId {
	pub producer: usize,
	pub slot: usize,
}

impl CapAccessId {
	pub fn new(producer: usize, slot: usize) -> Self {
		Self {
			producer,
			slot,
		}
	}
}

#[derive(Debug, Clone)]
pub enum CapNode {
	Source {
		id: SourceId,
		/// Schema columns read, in output order.
		columns: Vec<usize>,
		range: RowRange,
	},
	Missing {
		types: Vec<Type>,
	},
	Slice {
		predecessor: usize,
		from: u64,
		to: u64,
	},
	RowFilter {
		inputs: Vec<CapAccessId>,
		predecessor: usize,
		factory: Arc<dyn RowFilterFactory>,
	},
	RowIndex {
		predecessor: usize,
		offset: u64,
	},
	Map {
		inputs: Vec<CapAccessId>,
		predecessor: usize,
		/// Factory outputs produced, in output order.
		columns: Vec<usize>,
		factory: Arc<dyn MapperFactory>,
	},
	Observer {
		inputs: Vec<CapAccessId>,
		predecessor: usize,
		factory: Arc<dyn ObserverFactory>,
	},
	/// Joins its predecessors row by row. Shorter predecessors are padded
	/// with missing values.
	Append {
		/// Inputs of all predecessors, concatenated.
		inputs: Vec<CapAccessId>,
		predecessors: Vec<usize>,
		/// Output slots filled by each predecessor.
		predecessor_outputs: Vec<Vec<usize>>,
		/// Row count of each predecessor if known at plan time.
		predecessor_sizes: Vec<Option<u64>>,
	},
	/// Stacks the rows of its predecessors.
	Concatenate {
		/// Inputs of each predecessor, all of the same width.
		inputs: Vec<Vec<CapAccessId>>,
		predecessors: Vec<usize>,
		predecessor_sizes: Vec<Option<u64>>,
	},
	Consumer {
		inputs: Vec<CapAccessId>,
		predecessor: usize,
	},
	Materialize {
		sink: SourceId,
		inputs: Vec<CapAccessId>,
		predecessor: usize,
	},
}

impl CapNode {
	pub fn name(&self) -> &'static str {
		match self {
			CapNode::Source {
				..
			} => "SOURCE",
			CapNode::Missing {
				..
			} => "MISSING",
			CapNode::Slice {
				..
			} => "SLICE",
			CapNode::RowFilter {
				..
			} => "ROWFILTER",
			CapNode::RowIndex {
				..
			} => "ROWINDEX",
			CapNode::Map {
				..
			} => "MAP",
			CapNode::Observer {
				..
			} => "OBSERVER",
			CapNode::Append {
				..
			} => "APPEND",
			CapNode::Concatenate {
				..
			} => "CONCATENATE",
			CapNode::Consumer {
				..
			} => "CONSUMER",
			CapNode::Materialize {
				..
			} => "MATERIALIZE",
		}
	}

	/// Indexes of the nodes whose rows this node advances with.
	pub fn predecessors(&self) -> Vec<usize> {
		match self {
			CapNode::Source {
				..
			}
			| CapNode::Missing {
				..
			} => vec![],
			CapNode::Slice {
				predecessor,
				..
			}
			| CapNode::RowFilter {
				predecessor,
				..
			}
			| CapNode::RowIndex {
				predecessor,
				..
			}
			| CapNode::Map {
				predecessor,
				..
			}
			| CapNode::Observer {
				predecessor,
				..
			}
			| CapNode::Consumer {
				predecessor,
				..
			}
			| CapNode::Materialize {
				predecessor,
				..
			} => vec![*predecessor],
			CapNode::Append {
				predecessors,
				..
			}
			| CapNode::Concatenate {
				predecessors,
				..
			} => predecessors.clone(),
		}
	}

	/// All columns this node reads.
	pub fn inputs(&self) -> Vec<CapAccessId> {
		match self {
			CapNode::Source {
				..
			}
			| CapNode::Missing {
				..
			}
			| CapNode::Slice {
				..
			}
			| CapNode::RowIndex {
				..
			} => vec![],
			CapNode::RowFilter {
				inputs,
				..
			}
			| CapNode::Map {
				inputs,
				..
			}
			| CapNode::Observer {
				inputs,
				..
			}
			| CapNode::Append {
				inputs,
				..
			}
			| CapNode::Consumer {
				inputs,
				..
			}
			| CapNode::Materialize {
				inputs,
				..
			} => inputs.clone(),
			CapNode::Concatenate {
				inputs,
				..
			} => inputs.iter().flatten().copied().collect(),
		}
	}

	/// Number of columns this node produces.
	pub fn num_outputs(&self) -> usize {
		match self {
			CapNode::Source {
				columns,
				..
			} => columns.len(),
			CapNode::Missing {
				types,
			} => types.len(),
			CapNode::Map {
				columns,
				..
			} => columns.len(),
			CapNode::RowIndex {
				..
			} => 1,
			CapNode::Append {
				inputs,
				..
			} => inputs.len(),
			CapNode::Concatenate {
				inputs,
				..
			} => inputs.first().map_or(0, Vec::len),
			CapNode::Slice {
				..
			}
			| CapNode::RowFilter {
				..
			}
			| CapNode::Observer {
				..
			}
			| CapNode::Consumer {
				..
			}
			| CapNode::Materialize {
				..
			} => 0,
		}
	}
}

/// The result of compiling a transform tree.
#[derive(Debug, Clone)]
pub struct CursorAssemblyPlan {
	nodes: Vec<CapNode>,
	cursor_type: CursorType,
	num_rows: Option<u64>,
	schemas: IndexMap<SourceId, Schema>,
}

impl CursorAssemblyPlan {
	pub fn new(
		nodes: Vec<CapNode>,
		cursor_type: CursorType,
		num_rows: Option<u64>,
		schemas: IndexMap<SourceId, Schema>,
	) -> Self {
		Self {
			nodes,
			cursor_type,
			num_rows,
			schemas,
		}
	}

	/// Nodes in execution order; the last one is the consumer or sink.
	pub fn nodes(&self) -> &[CapNode] {
		&self.nodes
	}

	/// Access pattern the consumer can use on the result.
	pub fn cursor_type(&self) -> CursorType {
		self.cursor_type
	}

	/// Rows of the result, if known without executing the plan.
	pub fn num_rows(&self) -> Option<u64> {
		self.num_rows
	}

	/// Declared schemas of every source and sink the plan touches.
	pub fn schemas(&self) -> &IndexMap<SourceId, Schema> {
		&self.schemas
	}

	/// Checks that every node only refers to earlier nodes and to outputs
	/// they actually produce, and that the plan ends in a consumer or sink.
	pub fn validate(&self) -> Result<()> {
		for (index, node) in self.nodes.iter().enumerate() {
			for predecessor in node.predecessors() {
				if predecessor >= index {
					return_internal_error!(
						"{} at {} follows {} which is not an earlier node",
						node.name(),
						index,
						predecessor
					);
				}
			}
			for input in node.inputs() {
				if input.producer >= index {
					return_internal_error!(
						"{} at {} reads from {} which is not an earlier node",
						node.name(),
						index,
						input.producer
					);
				}
				let width = self.nodes[input.producer].num_outputs();
				if input.slot >= width {
					return_internal_error!(
						"{} at {} reads slot {} of {} which has {} output(s)",
						node.name(),
						index,
						input.slot,
						input.producer,
						width
					);
				}
			}
			if let CapNode::Source {
				id,
				..
			} = node && !self.schemas.contains_key(id)
			{
				return_internal_error!("source {} has no schema", id);
			}
		}

		match self.nodes.last() {
			Some(CapNode::Consumer {
				..
			})
			| Some(CapNode::Materialize {
				..
			}) => Ok(()),
			_ => {
				return_internal_error!("plan does not end in a consumer or sink");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn plan(nodes: Vec<CapNode>) -> CursorAssemblyPlan {
		let id = match &nodes[0] {
			CapNode::Source {
				id,
				..
			} => *id,
			_ => SourceId::generate(),
		};
		let mut schemas = IndexMap::new();
		schemas.insert(id, Schema::new([Type::Int8, Type::Int8]));
		CursorAssemblyPlan::new(nodes, CursorType::Basic, None, schemas)
	}

	fn source() -> CapNode {
		CapNode::Source {
			id: SourceId::generate(),
			columns: vec![0, 1],
			range: RowRange::ALL,
		}
	}

	#[test]
	fn test_valid_plan() {
		let plan = plan(vec![
			source(),
			CapNode::Slice {
				predecessor: 0,
				from: 0,
				to: 10,
			},
			CapNode::Consumer {
				inputs: vec![CapAccessId::new(0, 1)],
				predecessor: 1,
			},
		]);
		plan.validate().unwrap();
	}

	#[test]
	fn test_forward_reference_rejected() {
		let plan = plan(vec![
			source(),
			CapNode::Consumer {
				inputs: vec![CapAccessId::new(1, 0)],
				predecessor: 0,
			},
		]);
		assert_eq!(plan.validate().unwrap_err().code, "INTERNAL_ERROR");
	}

	#[test]
	fn test_slot_out_of_range_rejected() {
		let plan = plan(vec![
			source(),
			CapNode::Consumer {
				inputs: vec![CapAccessId::new(0, 2)],
				predecessor: 0,
			},
		]);
		assert!(plan.validate().is_err());
	}

	#[test]
	fn test_missing_terminal_rejected() {
		let plan = plan(vec![source()]);
		assert!(plan.validate().is_err());
	}

	#[test]
	fn test_concatenate_width() {
		let node = CapNode::Concatenate {
			inputs: vec![vec![CapAccessId::new(0, 0)], vec![CapAccessId::new(1, 0)]],
			predecessors: vec![0, 1],
			predecessor_sizes: vec![Some(1), None],
		};
		assert_eq!(node.num_outputs(), 1);
		assert_eq!(node.inputs().len(), 2);
		assert_eq!(node.predecessors(), vec![0, 1]);
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use tablecap_core::{
	Result, SinkSpec, SourceSpec, TableTransform, TransformSpec, Type,
	error::plan::PlanError,
	return_error,
	transform::TransformKind,
};
use tracing::{debug, instrument, trace};

use super::{NodeId, NodeKind, PortId, PortOwner, TableTransformGraph};
use crate::access::AccessId;

/// Translates a transform tree into a [`TableTransformGraph`].
///
/// Every intermediate table becomes a port owned by [`PortOwner::Table`]
/// holding the table's accesses and exactly one edge to the output port that
/// controls its rows. Consumers of a table copy that edge. Shared subtrees are
/// built once, keyed by the address of their transform.
pub(super) struct GraphBuilder {
	graph: TableTransformGraph,
	tables: HashMap<*const TableTransform, PortId>,
}

impl GraphBuilder {
	pub(super) fn new() -> Self {
		Self {
			graph: TableTransformGraph::empty(),
			tables: HashMap::new(),
		}
	}

	pub(super) fn build(
		mut self,
		transform: &Arc<TableTransform>,
		sink: Option<SinkSpec>,
	) -> Result<TableTransformGraph> {
		let table = self.build_table(transform)?;
		let accesses = self.graph.port(table).accesses().to_vec();

		if let Some(sink) = &sink {
			self.check_sink(sink, &accesses)?;
		}

		let target = self.graph.control_target(table)?;
		let terminal = self.graph.add_port(PortOwner::Terminal, accesses);
		self.graph.link(terminal, target);
		self.graph.terminal = terminal;
		self.graph.sink = sink;

		self.detach_tables();

		debug!(
			nodes = self.graph.node_count(),
			accesses = self.graph.accesses().len(),
			"built table transform graph"
		);
		Ok(self.graph)
	}

	fn build_table(&mut self, transform: &Arc<TableTransform>) -> Result<PortId> {
		let key = Arc::as_ptr(transform);
		if let Some(port) = self.tables.get(&key) {
			return Ok(*port);
		}

		let mut preceding = Vec::with_capacity(transform.preceding().len());
		for table in transform.preceding() {
			preceding.push(self.build_table(table)?);
		}

		let port = self.build_transform(transform.spec(), &preceding)?;
		trace!(kind = %transform.spec().kind(), port = %port, "built table");
		self.tables.insert(key, port);
		Ok(port)
	}

	#[instrument(name = "plan::graph::build_transform", level = "trace", skip_all, fields(kind = %spec.kind()))]
	fn build_transform(&mut self, spec: &TransformSpec, preceding: &[PortId]) -> Result<PortId> {
		let kind = spec.kind();
		match spec {
			TransformSpec::Source(spec) => {
				expect_preceding(kind, preceding, 0)?;
				self.build_source(spec)
			}
			TransformSpec::Missing {
				types,
			} => {
				expect_preceding(kind, preceding, 0)?;
				let node = self.graph.add_node(NodeKind::Missing {
					types: types.clone(),
				});
				let outputs = self.produce(node, types.iter().copied());
				self.node_table(node, outputs)
			}
			TransformSpec::Slice {
				range,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let node = self.graph.add_node(NodeKind::Slice {
					range: *range,
				});
				self.control_input(node, table, Vec::new())?;
				let outputs = self.pass_through(table)?;
				self.node_table(node, outputs)
			}
			TransformSpec::RowIndex {
				offset,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let node = self.graph.add_node(NodeKind::RowIndex {
					offset: *offset,
				});
				self.control_input(node, table, Vec::new())?;
				let mut outputs = self.pass_through(table)?;
				outputs.extend(self.produce(node, [Type::Uint8]));
				self.node_table(node, outputs)
			}
			TransformSpec::RowFilter {
				columns,
				factory,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let inputs = self.select(kind, table, columns)?;
				self.check_types(kind, &inputs, factory.input_types())?;
				let node = self.graph.add_node(NodeKind::RowFilter {
					factory: factory.clone(),
				});
				self.control_input(node, table, inputs)?;
				let outputs = self.pass_through(table)?;
				self.node_table(node, outputs)
			}
			TransformSpec::Observer {
				columns,
				factory,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let inputs = self.select(kind, table, columns)?;
				self.check_types(kind, &inputs, factory.input_types())?;
				let node = self.graph.add_node(NodeKind::Observer {
					factory: factory.clone(),
				});
				self.control_input(node, table, inputs)?;
				let outputs = self.pass_through(table)?;
				self.node_table(node, outputs)
			}
			TransformSpec::Map {
				columns,
				factory,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let inputs = self.select(kind, table, columns)?;
				self.check_types(kind, &inputs, factory.input_types())?;
				let output_types = factory.output_types();
				let node = self.graph.add_node(NodeKind::Map {
					factory: factory.clone(),
					columns: (0..output_types.len()).collect(),
				});
				// a map only computes values, the rows stay those of its input
				self.graph.add_input(node, inputs);
				let outputs = self.produce(node, output_types.iter().copied());
				self.relabel(table, outputs)
			}
			TransformSpec::SelectColumns {
				columns,
			} => {
				let table = expect_preceding(kind, preceding, 1)?[0];
				let selected = self.select(kind, table, columns)?;
				self.relabel(table, selected)
			}
			TransformSpec::Append => {
				expect_at_least_one(kind, preceding)?;
				self.build_append(preceding)
			}
			TransformSpec::Concatenate => {
				expect_at_least_one(kind, preceding)?;
				self.build_concatenate(preceding)
			}
		}
	}

	fn build_source(&mut self, spec: &SourceSpec) -> Result<PortId> {
		let node = self.graph.add_node(NodeKind::Source {
			spec: spec.clone(),
			columns: (0..spec.schema.len()).collect(),
		});
		let outputs = self.produce(node, spec.schema.types().iter().copied());
		self.node_table(node, outputs)
	}

	fn build_append(&mut self, preceding: &[PortId]) -> Result<PortId> {
		let mut targets = Vec::with_capacity(preceding.len());
		for &table in preceding {
			targets.push(self.graph.control_target(table)?);
		}

		// tables advancing in lockstep already share their rows
		if targets.iter().all(|target| *target == targets[0]) {
			let mut columns = Vec::new();
			for &table in preceding {
				columns.extend_from_slice(self.graph.port(table).accesses());
			}
			return self.relabel(preceding[0], columns);
		}

		let node = self.graph.add_node(NodeKind::Append);
		let mut types = Vec::new();
		for &table in preceding {
			let inputs = self.pass_through(table)?;
			types.extend(inputs.iter().map(|access| self.graph.accesses().get_type(*access)));
			self.control_input(node, table, inputs)?;
		}
		let outputs = self.produce(node, types);
		self.node_table(node, outputs)
	}

	fn build_concatenate(&mut self, preceding: &[PortId]) -> Result<PortId> {
		let types = self.types_of(self.graph.port(preceding[0]).accesses());

		for (index, &table) in preceding.iter().enumerate().skip(1) {
			let actual = self.types_of(self.graph.port(table).accesses());
			if actual.len() != types.len() {
				return_error!(PlanError::ConcatenateWidthMismatch {
					predecessor: index,
					expected: types.len(),
					actual: actual.len(),
				});
			}
			for (position, (expected, actual)) in types.iter().zip(actual).enumerate() {
				if *expected != actual {
					return_error!(PlanError::ColumnTypeMismatch {
						kind: TransformKind::Concatenate,
						position,
						expected: *expected,
						actual,
					});
				}
			}
		}

		let node = self.graph.add_node(NodeKind::Concatenate);
		for &table in preceding {
			let inputs = self.pass_through(table)?;
			self.control_input(node, table, inputs)?;
		}
		let outputs = self.produce(node, types);
		self.node_table(node, outputs)
	}

	/// Creates one output access per type, produced by `node`.
	fn produce(&mut self, node: NodeId, types: impl IntoIterator<Item = Type>) -> Vec<AccessId> {
		let outputs: Vec<AccessId> =
			types.into_iter().map(|ty| self.graph.accesses_mut().create(ty, Some(node))).collect();
		let port = self.graph.node(node).output();
		self.graph.port_accesses_mut(port).extend_from_slice(&outputs);
		outputs
	}

	/// Fresh accesses unioned with all columns of `table`.
	fn pass_through(&mut self, table: PortId) -> Result<Vec<AccessId>> {
		let columns = self.graph.port(table).accesses().to_vec();
		self.graph.accesses_mut().alias(&columns)
	}

	/// Fresh accesses unioned with the selected columns of `table`.
	fn select(&mut self, kind: TransformKind, table: PortId, columns: &[usize]) -> Result<Vec<AccessId>> {
		let accesses = self.graph.port(table).accesses();
		let mut selected = Vec::with_capacity(columns.len());
		for &column in columns {
			match accesses.get(column) {
				Some(access) => selected.push(*access),
				None => return_error!(PlanError::ColumnOutOfRange {
					kind,
					column,
					width: accesses.len(),
				}),
			}
		}
		self.graph.accesses_mut().alias(&selected)
	}

	/// Adds an input port to `node` reading `inputs` whose rows are
	/// controlled by whatever controls `table`.
	fn control_input(&mut self, node: NodeId, table: PortId, inputs: Vec<AccessId>) -> Result<PortId> {
		let target = self.graph.control_target(table)?;
		let port = self.graph.add_input(node, inputs);
		self.graph.link(port, target);
		Ok(port)
	}

	/// A table holding `accesses` whose rows are those of `node`.
	fn node_table(&mut self, node: NodeId, accesses: Vec<AccessId>) -> Result<PortId> {
		let port = self.graph.add_port(PortOwner::Table, accesses);
		self.graph.link(port, self.graph.node(node).output());
		Ok(port)
	}

	/// A table holding `accesses` whose rows are those of `table`.
	fn relabel(&mut self, table: PortId, accesses: Vec<AccessId>) -> Result<PortId> {
		let target = self.graph.control_target(table)?;
		let port = self.graph.add_port(PortOwner::Table, accesses);
		self.graph.link(port, target);
		Ok(port)
	}

	fn check_types(&self, kind: TransformKind, inputs: &[AccessId], expected: &[Type]) -> Result<()> {
		if inputs.len() != expected.len() {
			return_error!(PlanError::FactoryArityMismatch {
				kind,
				expected: expected.len(),
				actual: inputs.len(),
			});
		}
		for (position, (access, expected)) in inputs.iter().zip(expected).enumerate() {
			let actual = self.graph.accesses().get_type(*access);
			if actual != *expected {
				return_error!(PlanError::ColumnTypeMismatch {
					kind,
					position,
					expected: *expected,
					actual,
				});
			}
		}
		Ok(())
	}

	fn check_sink(&self, sink: &SinkSpec, accesses: &[AccessId]) -> Result<()> {
		let expected = sink.schema.types();
		if expected.len() != accesses.len() {
			return_error!(PlanError::SinkWidthMismatch {
				sink: sink.id,
				expected: expected.len(),
				actual: accesses.len(),
			});
		}
		for (position, (expected, access)) in expected.iter().zip(accesses).enumerate() {
			let actual = self.graph.accesses().get_type(*access);
			if actual != *expected {
				return_error!(PlanError::SinkColumnTypeMismatch {
					sink: sink.id,
					position,
					expected: *expected,
					actual,
				});
			}
		}
		Ok(())
	}

	fn types_of(&self, accesses: &[AccessId]) -> Vec<Type> {
		accesses.iter().map(|access| self.graph.accesses().get_type(*access)).collect()
	}

	/// Drops the edges of intermediate tables so that every output port only
	/// lists the edges of its actual consumers.
	fn detach_tables(&mut self) {
		let tables: Vec<PortId> = self.tables.values().copied().collect();
		for table in tables {
			let edges = self.graph.port(table).edges().to_vec();
			for edge in edges {
				self.graph.unlink(edge);
			}
		}
	}
}

fn expect_preceding(kind: TransformKind, preceding: &[PortId], expected: usize) -> Result<&[PortId]> {
	if preceding.len() != expected {
		return_error!(PlanError::PredecessorCount {
			kind,
			expected: expected.to_string(),
			actual: preceding.len(),
		});
	}
	Ok(preceding)
}

fn expect_at_least_one(kind: TransformKind, preceding: &[PortId]) -> Result<()> {
	if preceding.is_empty() {
		return_error!(PlanError::PredecessorCount {
			kind,
			expected: "at least 1".to_string(),
			actual: 0,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use tablecap_core::{RowRange, Schema, SourceId, SourceProperties};
	use tablecap_testing::fixture::{AddOne, Columns, IsPositive};

	use super::*;

	fn source(types: impl IntoIterator<Item = Type>) -> Arc<TableTransform> {
		TableTransform::source(SourceSpec::new(SourceId::generate(), Schema::new(types), SourceProperties::default()))
	}

	fn terminal_producers(graph: &TableTransformGraph) -> Vec<NodeId> {
		graph.port(graph.terminal())
			.accesses()
			.iter()
			.map(|access| graph.producer(*access).unwrap().node)
			.collect()
	}

	#[test]
	fn test_source_only() {
		let graph = TableTransformGraph::new(&source([Type::Int8, Type::Utf8])).unwrap();

		assert_eq!(graph.node_count(), 1);
		let terminal = graph.port(graph.terminal());
		assert_eq!(terminal.accesses().len(), 2);
		assert_eq!(graph.control_node(graph.terminal()).unwrap(), NodeId(0));
		assert_eq!(terminal_producers(&graph), vec![NodeId(0), NodeId(0)]);
	}

	#[test]
	fn test_slice_chain() {
		let transform = source([Type::Int8]).slice(RowRange::new(1, 5).unwrap());
		let graph = TableTransformGraph::new(&transform).unwrap();

		let slice = graph.control_node(graph.terminal()).unwrap();
		assert!(matches!(graph.node(slice).kind(), NodeKind::Slice { .. }));
		let input = graph.node(slice).inputs()[0];
		assert_eq!(graph.control_node(input).unwrap(), NodeId(0));
		// sliced values still originate from the source
		assert_eq!(terminal_producers(&graph), vec![NodeId(0)]);
	}

	#[test]
	fn test_map_has_no_control_flow() {
		let transform = source([Type::Int8]).map([0], Arc::new(AddOne));
		let graph = TableTransformGraph::new(&transform).unwrap();

		let map = terminal_producers(&graph)[0];
		assert!(matches!(graph.node(map).kind(), NodeKind::Map { .. }));
		assert!(graph.port(graph.node(map).inputs()[0]).edges().is_empty());
		assert_eq!(graph.control_node(graph.terminal()).unwrap(), NodeId(0));
	}

	#[test]
	fn test_select_relabels() {
		let transform = source([Type::Int8, Type::Utf8, Type::Boolean]).select([2, 0]);
		let graph = TableTransformGraph::new(&transform).unwrap();

		assert_eq!(graph.node_count(), 1);
		let terminal = graph.port(graph.terminal()).accesses();
		assert_eq!(graph.producer(terminal[0]).unwrap().slot, 2);
		assert_eq!(graph.producer(terminal[1]).unwrap().slot, 0);
	}

	#[test]
	fn test_select_out_of_range() {
		let transform = source([Type::Int8]).select([1]);
		let err = TableTransformGraph::new(&transform).unwrap_err();
		assert_eq!(err.code, "PLAN_002");
	}

	#[test]
	fn test_filter_type_mismatch() {
		let transform = source([Type::Utf8]).filter([0], Arc::new(IsPositive));
		let err = TableTransformGraph::new(&transform).unwrap_err();
		assert_eq!(err.code, "PLAN_004");
	}

	#[test]
	fn test_map_arity_mismatch() {
		let transform = source([Type::Int8, Type::Int8]).map([0, 1], Arc::new(AddOne));
		let err = TableTransformGraph::new(&transform).unwrap_err();
		assert_eq!(err.code, "PLAN_003");
	}

	#[test]
	fn test_append_of_same_rows_is_relabel() {
		let src = source([Type::Int8]);
		let transform = TableTransform::append([src.clone(), src.map([0], Arc::new(AddOne))]);
		let graph = TableTransformGraph::new(&transform).unwrap();

		assert!(graph.node_ids().all(|node| !matches!(graph.node(node).kind(), NodeKind::Append)));
		assert_eq!(graph.control_node(graph.terminal()).unwrap(), NodeId(0));
	}

	#[test]
	fn test_append_of_different_rows() {
		let left = source([Type::Int8]);
		let right = source([Type::Utf8]);
		let graph = TableTransformGraph::new(&TableTransform::append([left, right])).unwrap();

		let append = graph.control_node(graph.terminal()).unwrap();
		assert!(matches!(graph.node(append).kind(), NodeKind::Append));
		assert_eq!(graph.node(append).inputs().len(), 2);
		assert_eq!(terminal_producers(&graph), vec![append, append]);
	}

	#[test]
	fn test_concatenate_width_mismatch() {
		let transform = TableTransform::concatenate([source([Type::Int8]), source([Type::Int8, Type::Int8])]);
		let err = TableTransformGraph::new(&transform).unwrap_err();
		assert_eq!(err.code, "PLAN_005");
	}

	#[test]
	fn test_concatenate_type_mismatch() {
		let transform = TableTransform::concatenate([source([Type::Int8]), source([Type::Utf8])]);
		let err = TableTransformGraph::new(&transform).unwrap_err();
		assert_eq!(err.code, "PLAN_004");
	}

	#[test]
	fn test_empty_append() {
		let err = TableTransformGraph::new(&TableTransform::append([])).unwrap_err();
		assert_eq!(err.code, "PLAN_001");
	}

	#[test]
	fn test_shared_subtree_built_once() {
		let src = source([Type::Int8]);
		let left = src.clone().slice(RowRange::new(0, 2).unwrap());
		let right = src.slice(RowRange::new(2, 4).unwrap());
		let graph = TableTransformGraph::new(&TableTransform::concatenate([left, right])).unwrap();

		let sources = graph
			.node_ids()
			.filter(|node| matches!(graph.node(*node).kind(), NodeKind::Source { .. }))
			.count();
		assert_eq!(sources, 1);
		// both slices consume the one source
		assert_eq!(graph.port(graph.node(NodeId(0)).output()).edges().len(), 2);
	}

	#[test]
	fn test_sink_schema_checked() {
		let transform = source([Type::Int8, Type::Utf8]);
		let sink = SinkSpec {
			id: SourceId::generate(),
			schema: Schema::new([Type::Int8]),
		};
		let err = TableTransformGraph::materialize(&transform, sink).unwrap_err();
		assert_eq!(err.code, "PLAN_006");

		let sink = SinkSpec {
			id: SourceId::generate(),
			schema: Schema::new([Type::Int8, Type::Boolean]),
		};
		let err = TableTransformGraph::materialize(&transform, sink).unwrap_err();
		assert_eq!(err.code, "PLAN_007");
	}

	#[test]
	fn test_row_index_adds_column() {
		let transform = source([Type::Utf8]).row_index(10);
		let graph = TableTransformGraph::new(&transform).unwrap();

		let terminal = graph.port(graph.terminal()).accesses();
		assert_eq!(terminal.len(), 2);
		assert_eq!(graph.accesses().get_type(terminal[1]), Type::Uint8);
		let row_index = graph.control_node(graph.terminal()).unwrap();
		assert_eq!(graph.producer(terminal[1]).unwrap().node, row_index);
	}

	#[test]
	fn test_observer_reads_selected_columns() {
		let transform = source([Type::Utf8, Type::Int8]).observe([1], Columns::observer([Type::Int8]));
		let graph = TableTransformGraph::new(&transform).unwrap();

		let observer = graph.control_node(graph.terminal()).unwrap();
		let input = graph.port(graph.node(observer).inputs()[0]);
		assert_eq!(input.accesses().len(), 1);
		assert_eq!(graph.producer(input.accesses()[0]).unwrap().slot, 1);
	}
}

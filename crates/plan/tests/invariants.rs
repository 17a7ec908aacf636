// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use tablecap_core::{RowRange, TableTransform, Type};
use tablecap_plan::{
	CapNode, Compiler, TableTransformGraph, TableTransformGraphProperties, compile, optimize, prune_accesses,
};
use tablecap_testing::fixture::{self, AddOne, Columns, IsPositive};

fn range(from: u64, to: u64) -> RowRange {
	RowRange::new(from, to).unwrap()
}

fn trees() -> Vec<Arc<TableTransform>> {
	let a = fixture::random_access_source([Type::Int8, Type::Utf8], 20);
	let b = fixture::ranged_source([Type::Int8, Type::Boolean], 50);
	let c = fixture::basic_source([Type::Int8]);

	let a_mapped = TableTransform::append([a.clone(), a.clone().map([0], Arc::new(AddOne))]);
	let b_sliced = b.clone().slice(range(5, 30)).slice(range(2, 10));
	let c_filtered = c.clone().filter([0], Arc::new(IsPositive)).row_index(0);

	vec![
		a_mapped.clone().slice(range(1, 3)).select([1, 2]),
		TableTransform::append([a_mapped.clone(), b_sliced.clone()]).select([2, 4]),
		TableTransform::concatenate([a_mapped.clone().select([0]), b_sliced.clone().select([0]), c.clone()]),
		TableTransform::append([c_filtered.clone(), TableTransform::missing([Type::Utf8])]),
		TableTransform::concatenate([c_filtered.clone().select([0]), c_filtered.select([1]).map(
			[0],
			Columns::mapper([Type::Uint8], [Type::Int8]),
		)]),
		a.clone().observe([1], Columns::observer([Type::Utf8])).slice(range(0, 5)).row_index(10),
		TableTransform::append([
			b.clone().slice(range(0, 10)),
			TableTransform::concatenate([a.select([0]), b.select([0])]),
		]),
	]
}

#[test]
fn test_every_plan_is_topologically_sound() {
	for transform in trees() {
		for compiler in [Compiler::default(), Compiler::builder().optimize(false).build()] {
			let plan = compiler.compile(&transform).unwrap();
			plan.validate().unwrap();

			for (index, node) in plan.nodes().iter().enumerate() {
				assert!(node.predecessors().iter().all(|p| *p < index), "{}", node);
				assert!(node.inputs().iter().all(|i| i.producer < index), "{}", node);
			}
		}
	}
}

#[test]
fn test_terminal_accesses_resolve_to_producers() {
	for transform in trees() {
		let graph = TableTransformGraph::new(&transform).unwrap();
		for access in graph.port(graph.terminal()).accesses() {
			let producer = graph.producer(*access).unwrap();
			let outputs = graph.port(graph.node(producer.node).output()).accesses();
			assert!(graph.accesses().same_class(outputs[producer.slot], *access));
		}
	}
}

#[test]
fn test_prune_reaches_fixpoint_in_one_pass() {
	for transform in trees() {
		let mut graph = TableTransformGraph::new(&transform).unwrap();
		prune_accesses(&mut graph).unwrap();
		assert!(!prune_accesses(&mut graph).unwrap());
	}
}

#[test]
fn test_optimizing_preserves_properties() {
	for transform in trees() {
		let graph = TableTransformGraph::new(&transform).unwrap();
		let before = TableTransformGraphProperties::new(&graph).unwrap();

		let mut optimized = graph.clone();
		optimize(&mut optimized).unwrap();
		let after = TableTransformGraphProperties::new(&optimized).unwrap();

		assert_eq!(before.num_rows(), after.num_rows());
		assert_eq!(before.cursor_type(), after.cursor_type());
	}
}

#[test]
fn test_slice_fusion_matches_sequential_slicing() {
	let ranges = [range(0, 10), range(3, 7), range(5, 100), range(0, 0), range(40, 60), RowRange::ALL];

	for outer in ranges {
		for inner in ranges {
			let transform = fixture::ranged_source([Type::Int8], 50).slice(outer).slice(inner);
			let fused = compile(&transform).unwrap();
			let sliced = Compiler::builder().optimize(false).build().compile(&transform).unwrap();

			assert_eq!(fused.nodes().len(), 2);
			let CapNode::Source {
				range: merged,
				..
			} = &fused.nodes()[0]
			else {
				panic!("expected a source");
			};
			assert_eq!(*merged, outer.retain(inner));
			assert_eq!(fused.num_rows(), sliced.num_rows(), "{} then {}", outer, inner);

			let expected = (0..50u64)
				.filter(|row| *row >= outer.from() && *row < outer.to())
				.enumerate()
				.filter(|(position, _)| (*position as u64) >= inner.from() && (*position as u64) < inner.to())
				.count() as u64;
			assert_eq!(fused.num_rows(), Some(expected), "{} then {}", outer, inner);
		}
	}
}

#[test]
fn test_cap_reads_only_produced_columns() {
	for transform in trees() {
		let plan = compile(&transform).unwrap();
		for node in plan.nodes() {
			for input in node.inputs() {
				assert!(input.slot < plan.nodes()[input.producer].num_outputs(), "{}", node);
			}
		}
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Rendered plans checked against `tests/goldenfiles`.
//!
//! Run with `UPDATE_GOLDENFILES=1` to rewrite the expected output.

use std::{io::Write, sync::Arc};

use goldenfile::Mint;
use tablecap_core::{
	CursorType, RowRange, Schema, SinkSpec, SourceId, SourceProperties, SourceSpec, TableTransform, Type,
};
use tablecap_plan::{Compiler, CursorAssemblyPlan, compile, explain_cap};
use tablecap_testing::fixture::{AddOne, IsPositive};
use uuid::Uuid;

fn id(n: u128) -> SourceId {
	SourceId::from(Uuid::from_u128(n))
}

fn source(n: u128, types: impl IntoIterator<Item = Type>, num_rows: u64) -> Arc<TableTransform> {
	TableTransform::source(SourceSpec::new(
		id(n),
		Schema::new(types),
		SourceProperties {
			num_rows: Some(num_rows),
			cursor_type: CursorType::RandomAccess,
			supports_row_range: false,
		},
	))
}

fn range(from: u64, to: u64) -> RowRange {
	RowRange::new(from, to).unwrap()
}

fn check(name: &str, plan: &CursorAssemblyPlan) {
	plan.validate().unwrap();
	let mut mint = Mint::new("tests/goldenfiles");
	let mut file = mint.new_goldenfile(format!("{}.txt", name)).unwrap();
	write!(file, "{}", explain_cap(plan)).unwrap();
}

#[test]
fn test_map_slice() {
	let source = source(1, [Type::Int8, Type::Utf8], 10);
	let with_c = TableTransform::append([source.clone(), source.map([0], Arc::new(AddOne))]);
	let plan = compile(&with_c.slice(range(1, 3)).select([1, 2])).unwrap();
	check("map_slice", &plan);
}

#[test]
fn test_append_of_different_rows() {
	let left = source(1, [Type::Int8], 5).slice(range(0, 3));
	let right = source(2, [Type::Utf8], 4);
	let plan = compile(&TableTransform::append([left, right])).unwrap();
	check("append_of_different_rows", &plan);
}

#[test]
fn test_concatenate_shared_source() {
	let source = source(1, [Type::Int8], 10);
	let transform = TableTransform::concatenate([source.clone().slice(range(0, 2)), source.slice(range(5, 7))]);
	let plan = compile(&transform).unwrap();
	check("concatenate_shared_source", &plan);
}

#[test]
fn test_filter_and_row_index() {
	let source = source(1, [Type::Int8, Type::Utf8], 10);
	let transform = source.filter([0], Arc::new(IsPositive)).row_index(1).select([1, 2]);
	let plan = compile(&transform).unwrap();
	check("filter_and_row_index", &plan);
}

#[test]
fn test_materialize() {
	let source = source(1, [Type::Int8, Type::Utf8], 2);
	let sink = SinkSpec {
		id: id(9),
		schema: Schema::new([Type::Utf8]),
	};
	let plan = Compiler::default().compile_materialize(&source.select([1]), sink).unwrap();
	check("materialize", &plan);
}

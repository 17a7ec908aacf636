// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sources and factories for building transform trees in tests.

use std::sync::Arc;

use tablecap_core::{
	CursorType, MapperFactory, ObserverFactory, RowFilter, RowFilterFactory, RowMapper, RowObserver, Schema,
	SinkSpec, SourceId, SourceProperties, SourceSpec, TableTransform, Type, Value,
};

pub fn source(types: impl IntoIterator<Item = Type>, properties: SourceProperties) -> Arc<TableTransform> {
	TableTransform::source(SourceSpec::new(SourceId::generate(), Schema::new(types), properties))
}

/// Forward-only source of unknown size.
pub fn basic_source(types: impl IntoIterator<Item = Type>) -> Arc<TableTransform> {
	source(types, SourceProperties::default())
}

pub fn lookahead_source(types: impl IntoIterator<Item = Type>, num_rows: u64) -> Arc<TableTransform> {
	source(
		types,
		SourceProperties {
			num_rows: Some(num_rows),
			cursor_type: CursorType::Lookahead,
			supports_row_range: false,
		},
	)
}

pub fn random_access_source(types: impl IntoIterator<Item = Type>, num_rows: u64) -> Arc<TableTransform> {
	source(
		types,
		SourceProperties {
			num_rows: Some(num_rows),
			cursor_type: CursorType::RandomAccess,
			supports_row_range: false,
		},
	)
}

pub fn random_access_unsized_source(types: impl IntoIterator<Item = Type>) -> Arc<TableTransform> {
	source(
		types,
		SourceProperties {
			num_rows: None,
			cursor_type: CursorType::RandomAccess,
			supports_row_range: false,
		},
	)
}

/// Random access source that can restrict itself to a row range.
pub fn ranged_source(types: impl IntoIterator<Item = Type>, num_rows: u64) -> Arc<TableTransform> {
	source(
		types,
		SourceProperties {
			num_rows: Some(num_rows),
			cursor_type: CursorType::RandomAccess,
			supports_row_range: true,
		},
	)
}

pub fn sink(types: impl IntoIterator<Item = Type>) -> SinkSpec {
	SinkSpec {
		id: SourceId::generate(),
		schema: Schema::new(types),
	}
}

/// Maps an `INT8` column to its successor.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddOne;

impl MapperFactory for AddOne {
	fn input_types(&self) -> &[Type] {
		&[Type::Int8]
	}

	fn output_types(&self) -> &[Type] {
		&[Type::Int8]
	}

	fn create_mapper(&self) -> Box<dyn RowMapper> {
		Box::new(AddOne)
	}
}

impl RowMapper for AddOne {
	fn map(&mut self, inputs: &[Value], outputs: &mut [Value]) {
		outputs[0] = match inputs[0] {
			Value::Int8(value) => Value::Int8(value + 1),
			_ => Value::Undefined,
		};
	}
}

/// Passes rows whose `INT8` column is greater than zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct IsPositive;

impl RowFilterFactory for IsPositive {
	fn input_types(&self) -> &[Type] {
		&[Type::Int8]
	}

	fn create_filter(&self) -> Box<dyn RowFilter> {
		Box::new(IsPositive)
	}
}

impl RowFilter for IsPositive {
	fn test(&mut self, inputs: &[Value]) -> bool {
		matches!(inputs[0], Value::Int8(value) if value > 0)
	}
}

/// A factory of any shape that computes nothing.
///
/// As a mapper it emits undefined values, as a filter it passes every row
/// and as an observer it ignores what it sees.
#[derive(Debug, Clone)]
pub struct Columns {
	inputs: Vec<Type>,
	outputs: Vec<Type>,
}

impl Columns {
	pub fn mapper(inputs: impl IntoIterator<Item = Type>, outputs: impl IntoIterator<Item = Type>) -> Arc<Self> {
		Arc::new(Self {
			inputs: inputs.into_iter().collect(),
			outputs: outputs.into_iter().collect(),
		})
	}

	pub fn filter(inputs: impl IntoIterator<Item = Type>) -> Arc<Self> {
		Self::mapper(inputs, Vec::<Type>::new())
	}

	pub fn observer(inputs: impl IntoIterator<Item = Type>) -> Arc<Self> {
		Self::mapper(inputs, Vec::<Type>::new())
	}
}

impl MapperFactory for Columns {
	fn input_types(&self) -> &[Type] {
		&self.inputs
	}

	fn output_types(&self) -> &[Type] {
		&self.outputs
	}

	fn create_mapper(&self) -> Box<dyn RowMapper> {
		Box::new(Nothing)
	}
}

impl RowFilterFactory for Columns {
	fn input_types(&self) -> &[Type] {
		&self.inputs
	}

	fn create_filter(&self) -> Box<dyn RowFilter> {
		Box::new(Nothing)
	}
}

impl ObserverFactory for Columns {
	fn input_types(&self) -> &[Type] {
		&self.inputs
	}

	fn create_observer(&self) -> Box<dyn RowObserver> {
		Box::new(Nothing)
	}
}

struct Nothing;

impl RowMapper for Nothing {
	fn map(&mut self, _inputs: &[Value], outputs: &mut [Value]) {
		outputs.fill(Value::Undefined);
	}
}

impl RowFilter for Nothing {
	fn test(&mut self, _inputs: &[Value]) -> bool {
		true
	}
}

impl RowObserver for Nothing {
	fn observe(&mut self, _inputs: &[Value]) {}
}

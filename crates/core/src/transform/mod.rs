// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Declarative table transforms.
//!
//! A [`TableTransform`] is an immutable node of a transform tree: one
//! [`TransformSpec`] plus the transforms producing its input tables. Subtrees
//! may be shared between parents through the `Arc`; the compiler builds a
//! shared subtree only once.

use std::{
	fmt,
	fmt::{Display, Formatter},
	sync::Arc,
};

use crate::{
	interface::{
		cursor::CursorType,
		factory::{MapperFactory, ObserverFactory, RowFilterFactory},
		range::RowRange,
		schema::{Schema, SourceId},
	},
	value::Type,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TransformKind {
	Source,
	Missing,
	Slice,
	Map,
	RowFilter,
	RowIndex,
	Append,
	Concatenate,
	Observer,
	SelectColumns,
}

impl Display for TransformKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			TransformKind::Source => f.write_str("SOURCE"),
			TransformKind::Missing => f.write_str("MISSING"),
			TransformKind::Slice => f.write_str("SLICE"),
			TransformKind::Map => f.write_str("MAP"),
			TransformKind::RowFilter => f.write_str("ROWFILTER"),
			TransformKind::RowIndex => f.write_str("ROWINDEX"),
			TransformKind::Append => f.write_str("APPEND"),
			TransformKind::Concatenate => f.write_str("CONCATENATE"),
			TransformKind::Observer => f.write_str("OBSERVER"),
			TransformKind::SelectColumns => f.write_str("SELECT"),
		}
	}
}

/// What the provider of a source declares about it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SourceProperties {
	/// Total number of rows, if known ahead of execution.
	pub num_rows: Option<u64>,
	pub cursor_type: CursorType,
	/// Whether the source can itself skip to a row range.
	pub supports_row_range: bool,
}

impl Default for SourceProperties {
	fn default() -> Self {
		Self {
			num_rows: None,
			cursor_type: CursorType::Basic,
			supports_row_range: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
	pub id: SourceId,
	pub schema: Schema,
	/// Rows of the source that are read.
	pub range: RowRange,
	pub properties: SourceProperties,
}

impl SourceSpec {
	pub fn new(id: SourceId, schema: Schema, properties: SourceProperties) -> Self {
		Self {
			id,
			schema,
			range: RowRange::ALL,
			properties,
		}
	}
}

/// Target of a materializing plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
	pub id: SourceId,
	pub schema: Schema,
}

#[derive(Debug, Clone)]
pub enum TransformSpec {
	Source(SourceSpec),
	/// A table without rows whose columns are all missing values.
	///
	/// Appending it pads the other tables with missing columns.
	Missing {
		types: Vec<Type>,
	},
	Slice {
		range: RowRange,
	},
	Map {
		columns: Vec<usize>,
		factory: Arc<dyn MapperFactory>,
	},
	RowFilter {
		columns: Vec<usize>,
		factory: Arc<dyn RowFilterFactory>,
	},
	/// Appends a column holding the row position, starting at `offset`.
	RowIndex {
		offset: u64,
	},
	Append,
	Concatenate,
	Observer {
		columns: Vec<usize>,
		factory: Arc<dyn ObserverFactory>,
	},
	SelectColumns {
		columns: Vec<usize>,
	},
}

impl TransformSpec {
	pub fn kind(&self) -> TransformKind {
		match self {
			TransformSpec::Source(_) => TransformKind::Source,
			TransformSpec::Missing {
				..
			} => TransformKind::Missing,
			TransformSpec::Slice {
				..
			} => TransformKind::Slice,
			TransformSpec::Map {
				..
			} => TransformKind::Map,
			TransformSpec::RowFilter {
				..
			} => TransformKind::RowFilter,
			TransformSpec::RowIndex {
				..
			} => TransformKind::RowIndex,
			TransformSpec::Append => TransformKind::Append,
			TransformSpec::Concatenate => TransformKind::Concatenate,
			TransformSpec::Observer {
				..
			} => TransformKind::Observer,
			TransformSpec::SelectColumns {
				..
			} => TransformKind::SelectColumns,
		}
	}
}

#[derive(Debug)]
pub struct TableTransform {
	spec: TransformSpec,
	preceding: Vec<Arc<TableTransform>>,
}

impl TableTransform {
	pub fn new(spec: TransformSpec, preceding: Vec<Arc<TableTransform>>) -> Arc<Self> {
		Arc::new(Self {
			spec,
			preceding,
		})
	}

	pub fn source(spec: SourceSpec) -> Arc<Self> {
		Self::new(TransformSpec::Source(spec), vec![])
	}

	pub fn missing(types: impl IntoIterator<Item = Type>) -> Arc<Self> {
		Self::new(
			TransformSpec::Missing {
				types: types.into_iter().collect(),
			},
			vec![],
		)
	}

	pub fn append(tables: impl IntoIterator<Item = Arc<TableTransform>>) -> Arc<Self> {
		Self::new(TransformSpec::Append, tables.into_iter().collect())
	}

	pub fn concatenate(tables: impl IntoIterator<Item = Arc<TableTransform>>) -> Arc<Self> {
		Self::new(TransformSpec::Concatenate, tables.into_iter().collect())
	}

	pub fn spec(&self) -> &TransformSpec {
		&self.spec
	}

	pub fn preceding(&self) -> &[Arc<TableTransform>] {
		&self.preceding
	}

	pub fn slice(self: Arc<Self>, range: RowRange) -> Arc<Self> {
		Self::new(
			TransformSpec::Slice {
				range,
			},
			vec![self],
		)
	}

	pub fn map(self: Arc<Self>, columns: impl Into<Vec<usize>>, factory: Arc<dyn MapperFactory>) -> Arc<Self> {
		Self::new(
			TransformSpec::Map {
				columns: columns.into(),
				factory,
			},
			vec![self],
		)
	}

	pub fn filter(self: Arc<Self>, columns: impl Into<Vec<usize>>, factory: Arc<dyn RowFilterFactory>) -> Arc<Self> {
		Self::new(
			TransformSpec::RowFilter {
				columns: columns.into(),
				factory,
			},
			vec![self],
		)
	}

	pub fn row_index(self: Arc<Self>, offset: u64) -> Arc<Self> {
		Self::new(
			TransformSpec::RowIndex {
				offset,
			},
			vec![self],
		)
	}

	pub fn observe(self: Arc<Self>, columns: impl Into<Vec<usize>>, factory: Arc<dyn ObserverFactory>) -> Arc<Self> {
		Self::new(
			TransformSpec::Observer {
				columns: columns.into(),
				factory,
			},
			vec![self],
		)
	}

	pub fn select(self: Arc<Self>, columns: impl Into<Vec<usize>>) -> Arc<Self> {
		Self::new(
			TransformSpec::SelectColumns {
				columns: columns.into(),
			},
			vec![self],
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn source() -> Arc<TableTransform> {
		TableTransform::source(SourceSpec::new(
			SourceId::generate(),
			Schema::new([Type::Int8, Type::Utf8]),
			SourceProperties::default(),
		))
	}

	#[test]
	fn test_builder_chains_preceding() {
		let src = source();
		let sliced = src.clone().slice(RowRange::new(1, 3).unwrap()).select([1]);

		assert_eq!(sliced.spec().kind(), TransformKind::SelectColumns);
		let slice = &sliced.preceding()[0];
		assert_eq!(slice.spec().kind(), TransformKind::Slice);
		assert!(Arc::ptr_eq(&slice.preceding()[0], &src));
	}

	#[test]
	fn test_append_keeps_order() {
		let a = source();
		let b = TableTransform::missing([Type::Boolean]);
		let appended = TableTransform::append([a.clone(), b.clone()]);

		assert_eq!(appended.preceding().len(), 2);
		assert!(Arc::ptr_eq(&appended.preceding()[0], &a));
		assert!(Arc::ptr_eq(&appended.preceding()[1], &b));
	}

	#[test]
	fn test_kind_display() {
		assert_eq!(TransformKind::RowFilter.to_string(), "ROWFILTER");
		assert_eq!(TransformKind::SelectColumns.to_string(), "SELECT");
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared vocabulary of the tablecap plan compiler.
//!
//! This crate holds everything the compiler and its callers agree on: the
//! transform spec tree handed to the compiler, the opaque per-row factories,
//! value and schema descriptors, and the diagnostic based error type.

pub mod error;
pub mod interface;
pub mod transform;
pub mod value;

pub use error::{Error, Result, diagnostic::Diagnostic};
pub use interface::{
	cursor::CursorType,
	factory::{MapperFactory, ObserverFactory, RowFilter, RowFilterFactory, RowMapper, RowObserver},
	range::RowRange,
	schema::{Schema, SourceId},
};
pub use transform::{SinkSpec, SourceProperties, SourceSpec, TableTransform, TransformSpec};
pub use value::{Type, Value};

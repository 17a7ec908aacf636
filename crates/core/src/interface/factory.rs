// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per-row computations supplied by the caller.
//!
//! The compiler stores these factories in the plan and checks their declared
//! column types against the table they are applied to. It never creates or
//! calls the row level objects; that is up to the cursor runtime executing
//! the plan.

use std::fmt::Debug;

use crate::value::{Type, Value};

/// Computes output values from the input values of one row.
pub trait RowMapper: Send {
	/// `outputs` has one slot per declared output type of the factory.
	fn map(&mut self, inputs: &[Value], outputs: &mut [Value]);
}

pub trait MapperFactory: Debug + Send + Sync {
	fn input_types(&self) -> &[Type];

	fn output_types(&self) -> &[Type];

	fn create_mapper(&self) -> Box<dyn RowMapper>;
}

/// Decides whether a row passes.
pub trait RowFilter: Send {
	fn test(&mut self, inputs: &[Value]) -> bool;
}

pub trait RowFilterFactory: Debug + Send + Sync {
	fn input_types(&self) -> &[Type];

	fn create_filter(&self) -> Box<dyn RowFilter>;
}

/// Sees every row that passes through it.
pub trait RowObserver: Send {
	fn observe(&mut self, inputs: &[Value]);

	/// Called once when the cursor owning this observer is closed.
	fn close(&mut self) {}
}

pub trait ObserverFactory: Debug + Send + Sync {
	fn input_types(&self) -> &[Type];

	fn create_observer(&self) -> Box<dyn RowObserver>;
}

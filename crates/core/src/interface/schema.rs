// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::Deref,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Type;

/// Identifies a data source or a materialization sink.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Deref for SourceId {
	type Target = Uuid;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl From<Uuid> for SourceId {
	fn from(value: Uuid) -> Self {
		Self(value)
	}
}

impl From<SourceId> for Uuid {
	fn from(value: SourceId) -> Self {
		value.0
	}
}

impl Display for SourceId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// Column types of a table, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
	columns: Vec<Type>,
}

impl Schema {
	pub fn new(columns: impl IntoIterator<Item = Type>) -> Self {
		Self {
			columns: columns.into_iter().collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn column(&self, index: usize) -> Option<Type> {
		self.columns.get(index).copied()
	}

	pub fn types(&self) -> &[Type] {
		&self.columns
	}
}

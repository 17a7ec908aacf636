// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Result, error::plan::PlanError, return_error};

/// A range of row positions, inclusive at `from` and exclusive at `to`.
///
/// `to == u64::MAX` stands for "until the end of the table".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
	from: u64,
	to: u64,
}

impl RowRange {
	/// Every row.
	pub const ALL: RowRange = RowRange {
		from: 0,
		to: u64::MAX,
	};

	pub fn new(from: u64, to: u64) -> Result<Self> {
		if from > to {
			return_error!(PlanError::InvalidRowRange {
				from,
				to
			});
		}
		Ok(Self {
			from,
			to,
		})
	}

	pub fn from(&self) -> u64 {
		self.from
	}

	pub fn to(&self) -> u64 {
		self.to
	}

	pub fn is_all(&self) -> bool {
		*self == Self::ALL
	}

	/// Selects `range` out of the rows selected by `self`.
	///
	/// `range` is relative to the rows of `self`, so applying `self` and then
	/// `range` selects exactly the rows of the returned range.
	pub fn retain(&self, range: RowRange) -> RowRange {
		let from = self.from.saturating_add(range.from).min(self.to);
		let to = self.from.saturating_add(range.to).min(self.to);
		RowRange {
			from,
			to,
		}
	}

	/// Number of rows this range selects from a table with `num_rows` rows.
	pub fn num_rows(&self, num_rows: u64) -> u64 {
		num_rows.min(self.to).saturating_sub(self.from)
	}
}

impl Default for RowRange {
	fn default() -> Self {
		Self::ALL
	}
}

impl Display for RowRange {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if self.to == u64::MAX {
			write!(f, "[{}, ∞)", self.from)
		} else {
			write!(f, "[{}, {})", self.from, self.to)
		}
	}
}

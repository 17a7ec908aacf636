// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Addressing modes a cursor supports, ordered from weakest to strongest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CursorType {
	/// Forward iteration only.
	Basic,
	/// Forward iteration with the ability to peek at the next row.
	Lookahead,
	/// Positioning at arbitrary row indices.
	RandomAccess,
}

impl CursorType {
	pub fn supports_lookahead(&self) -> bool {
		*self >= CursorType::Lookahead
	}

	pub fn supports_random_access(&self) -> bool {
		*self == CursorType::RandomAccess
	}
}

impl Display for CursorType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			CursorType::Basic => f.write_str("BASIC"),
			CursorType::Lookahead => f.write_str("LOOKAHEAD"),
			CursorType::RandomAccess => f.write_str("RANDOMACCESS"),
		}
	}
}

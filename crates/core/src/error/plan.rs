// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{Error, IntoDiagnostic, diagnostic::Diagnostic};
use crate::{interface::schema::SourceId, transform::TransformKind, value::Type};

/// Shape or type incompatibilities detected while building a plan graph.
///
/// These are reported for the whole compilation; no partial plan exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
	#[error("{kind} expects {expected} preceding transform(s), got {actual}")]
	PredecessorCount {
		kind: TransformKind,
		expected: String,
		actual: usize,
	},

	#[error("{kind} selects column {column} but its input has {width} column(s)")]
	ColumnOutOfRange {
		kind: TransformKind,
		column: usize,
		width: usize,
	},

	#[error("{kind} factory expects {expected} input column(s), got {actual}")]
	FactoryArityMismatch {
		kind: TransformKind,
		expected: usize,
		actual: usize,
	},

	#[error("{kind} input {position} has type {actual}, expected {expected}")]
	ColumnTypeMismatch {
		kind: TransformKind,
		position: usize,
		expected: Type,
		actual: Type,
	},

	#[error("CONCATENATE input {predecessor} has {actual} column(s), expected {expected}")]
	ConcatenateWidthMismatch {
		predecessor: usize,
		expected: usize,
		actual: usize,
	},

	#[error("sink {sink} declares {expected} column(s), the table has {actual}")]
	SinkWidthMismatch {
		sink: SourceId,
		expected: usize,
		actual: usize,
	},

	#[error("sink {sink} column {position} has type {expected}, the table provides {actual}")]
	SinkColumnTypeMismatch {
		sink: SourceId,
		position: usize,
		expected: Type,
		actual: Type,
	},

	#[error("row range [{from}, {to}) is inverted")]
	InvalidRowRange {
		from: u64,
		to: u64,
	},
}

impl From<PlanError> for Error {
	fn from(err: PlanError) -> Self {
		Error(err.into_diagnostic())
	}
}

impl IntoDiagnostic for PlanError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			PlanError::PredecessorCount {
				kind,
				..
			} => Diagnostic {
				code: "PLAN_001".to_string(),
				message,
				label: Some(format!("wrong number of inputs for {}", kind)),
				help: Some("Every transform except SOURCE and MISSING needs its preceding transforms"
					.to_string()),
				notes: vec![
					"SLICE, MAP, ROWFILTER, ROWINDEX, OBSERVER and SELECT take exactly one input".to_string(),
					"APPEND and CONCATENATE take one or more inputs".to_string(),
				],
			},

			PlanError::ColumnOutOfRange {
				..
			} => Diagnostic {
				code: "PLAN_002".to_string(),
				message,
				label: Some("column index out of range".to_string()),
				help: Some("Column selections index into the columns of the preceding table".to_string()),
				notes: vec![],
			},

			PlanError::FactoryArityMismatch {
				..
			} => Diagnostic {
				code: "PLAN_003".to_string(),
				message,
				label: Some("factory arity does not match the column selection".to_string()),
				help: Some("Select exactly one column per declared factory input".to_string()),
				notes: vec![],
			},

			PlanError::ColumnTypeMismatch {
				..
			} => Diagnostic {
				code: "PLAN_004".to_string(),
				message,
				label: Some("incompatible column type".to_string()),
				help: Some("Cast the column upstream or adjust the factory's declared input types"
					.to_string()),
				notes: vec![],
			},

			PlanError::ConcatenateWidthMismatch {
				..
			} => Diagnostic {
				code: "PLAN_005".to_string(),
				message,
				label: Some("tables of different width cannot be concatenated".to_string()),
				help: Some("Select the same columns from every concatenated table".to_string()),
				notes: vec!["CONCATENATE stacks rows; every input must have the same columns".to_string()],
			},

			PlanError::SinkWidthMismatch {
				..
			} => Diagnostic {
				code: "PLAN_006".to_string(),
				message,
				label: Some("sink schema does not match the table".to_string()),
				help: Some("Select the sink's columns before materializing".to_string()),
				notes: vec![],
			},

			PlanError::SinkColumnTypeMismatch {
				..
			} => Diagnostic {
				code: "PLAN_007".to_string(),
				message,
				label: Some("sink column type does not match the table".to_string()),
				help: None,
				notes: vec![],
			},

			PlanError::InvalidRowRange {
				..
			} => Diagnostic {
				code: "PLAN_008".to_string(),
				message,
				label: Some("`from` must not exceed `to`".to_string()),
				help: Some("Row ranges are inclusive at `from` and exclusive at `to`".to_string()),
				notes: vec![],
			},
		}
	}
}

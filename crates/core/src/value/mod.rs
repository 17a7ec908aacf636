// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Column type descriptor.
///
/// The compiler only compares types for equality; it never interprets them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
	Boolean,
	Int4,
	Int8,
	Uint8,
	Float4,
	Float8,
	Utf8,
	Blob,
	Uuid,
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Boolean => f.write_str("BOOL"),
			Type::Int4 => f.write_str("INT4"),
			Type::Int8 => f.write_str("INT8"),
			Type::Uint8 => f.write_str("UINT8"),
			Type::Float4 => f.write_str("FLOAT4"),
			Type::Float8 => f.write_str("FLOAT8"),
			Type::Utf8 => f.write_str("UTF8"),
			Type::Blob => f.write_str("BLOB"),
			Type::Uuid => f.write_str("UUID"),
		}
	}
}

/// A single cell handed to the runtime factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// A missing value.
	Undefined,
	Boolean(bool),
	Int4(i32),
	Int8(i64),
	Uint8(u64),
	Float4(f32),
	Float8(f64),
	Utf8(String),
	Blob(Vec<u8>),
	Uuid(Uuid),
}

impl Value {
	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	/// The type of this value, `None` for [`Value::Undefined`].
	pub fn get_type(&self) -> Option<Type> {
		match self {
			Value::Undefined => None,
			Value::Boolean(_) => Some(Type::Boolean),
			Value::Int4(_) => Some(Type::Int4),
			Value::Int8(_) => Some(Type::Int8),
			Value::Uint8(_) => Some(Type::Uint8),
			Value::Float4(_) => Some(Type::Float4),
			Value::Float8(_) => Some(Type::Float8),
			Value::Utf8(_) => Some(Type::Utf8),
			Value::Blob(_) => Some(Type::Blob),
			Value::Uuid(_) => Some(Type::Uuid),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Boolean(v) => Display::fmt(v, f),
			Value::Int4(v) => Display::fmt(v, f),
			Value::Int8(v) => Display::fmt(v, f),
			Value::Uint8(v) => Display::fmt(v, f),
			Value::Float4(v) => Display::fmt(v, f),
			Value::Float8(v) => Display::fmt(v, f),
			Value::Utf8(v) => f.write_str(v),
			Value::Blob(v) => write!(f, "0x{}", v.iter().map(|b| format!("{:02x}", b)).collect::<String>()),
			Value::Uuid(v) => Display::fmt(v, f),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_value_type() {
		assert_eq!(Value::Int8(1).get_type(), Some(Type::Int8));
		assert_eq!(Value::Undefined.get_type(), None);
		assert!(Value::Undefined.is_undefined());
		assert_eq!(Value::Uuid(Uuid::nil()).get_type(), Some(Type::Uuid));
	}

	#[test]
	fn test_display() {
		assert_eq!(Type::Uint8.to_string(), "UINT8");
		assert_eq!(Value::Blob(vec![0xde, 0xad]).to_string(), "0xdead");
	}
}

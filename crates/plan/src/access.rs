// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Column accesses and their equivalence classes.
//!
//! Every column a node reads or writes is referenced through an [`AccessId`].
//! Accesses that denote the same column values are unioned into one class.
//! A class has at most one producer, the node whose output creates the values;
//! everybody else reading the class is a consumer.

use std::{
	cell::Cell,
	fmt::{Display, Formatter},
};

use tablecap_core::{Result, Type, return_internal_error};

use crate::graph::NodeId;

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct AccessId(pub usize);

impl Display for AccessId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "a{}", self.0)
	}
}

#[derive(Debug, Clone)]
struct AccessRecord {
	parent: Cell<usize>,
	size: usize,
	ty: Type,
	producer: Option<NodeId>,
}

/// Union-find arena over all accesses of one graph.
///
/// Lookups compress paths in place, which is why [`AccessTable::find`] only
/// needs a shared reference.
#[derive(Debug, Clone, Default)]
pub struct AccessTable {
	records: Vec<AccessRecord>,
}

impl AccessTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a new singleton class.
	pub fn create(&mut self, ty: Type, producer: Option<NodeId>) -> AccessId {
		let id = self.records.len();
		self.records.push(AccessRecord {
			parent: Cell::new(id),
			size: 1,
			ty,
			producer,
		});
		AccessId(id)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Representative of the class `id` belongs to.
	pub fn find(&self, id: AccessId) -> AccessId {
		let mut root = id.0;
		while self.records[root].parent.get() != root {
			root = self.records[root].parent.get();
		}

		let mut current = id.0;
		while current != root {
			let next = self.records[current].parent.get();
			self.records[current].parent.set(root);
			current = next;
		}

		AccessId(root)
	}

	pub fn same_class(&self, left: AccessId, right: AccessId) -> bool {
		self.find(left) == self.find(right)
	}

	/// Merges the classes of `left` and `right`.
	///
	/// If one class has a producer its root becomes the representative of the
	/// merged class. Merging two produced classes would give the values two
	/// origins and is rejected.
	pub fn union(&mut self, left: AccessId, right: AccessId) -> Result<AccessId> {
		let left = self.find(left);
		let right = self.find(right);
		if left == right {
			return Ok(left);
		}

		let (root, child) =
			match (self.records[left.0].producer, self.records[right.0].producer) {
				(Some(l), Some(r)) => {
					return_internal_error!(
						"cannot union {} produced by {} with {} produced by {}",
						left,
						l,
						right,
						r
					);
				}
				(Some(_), None) => (left, right),
				(None, Some(_)) => (right, left),
				(None, None) => {
					if self.records[left.0].size >= self.records[right.0].size {
						(left, right)
					} else {
						(right, left)
					}
				}
			};

		self.records[child.0].parent.set(root.0);
		self.records[root.0].size += self.records[child.0].size;
		Ok(root)
	}

	/// Creates one fresh access per entry of `ids`, each unioned with its
	/// counterpart.
	pub fn alias(&mut self, ids: &[AccessId]) -> Result<Vec<AccessId>> {
		let mut result = Vec::with_capacity(ids.len());
		for &id in ids {
			let alias = self.create(self.get_type(id), None);
			self.union(alias, id)?;
			result.push(alias);
		}
		Ok(result)
	}

	pub fn get_type(&self, id: AccessId) -> Type {
		self.records[id.0].ty
	}

	/// Node producing the values of the class `id` belongs to.
	pub fn producer(&self, id: AccessId) -> Option<NodeId> {
		self.records[self.find(id).0].producer
	}

	/// Hands the class rooted at `root` over to another producer.
	pub fn set_producer(&mut self, root: AccessId, node: NodeId) -> Result<()> {
		if self.find(root) != root {
			return_internal_error!("{} is not the representative of its class", root);
		}
		if self.records[root.0].producer.is_none() {
			return_internal_error!("{} has no producer to replace", root);
		}
		self.records[root.0].producer = Some(node);
		Ok(())
	}
}

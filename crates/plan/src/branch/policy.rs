// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Debug;

use super::InnerNode;
use crate::graph::{NodeKind, TableTransformGraph};

/// Chooses which node of a branch is scheduled next.
///
/// The branch offers only nodes whose dependencies are already scheduled, in
/// discovery order, so any choice yields a valid order.
pub trait OrderingPolicy: Debug + Send + Sync {
	/// Returns an index into `eligible`, which is never empty.
	fn select(&self, graph: &TableTransformGraph, eligible: &[&InnerNode]) -> usize;
}

/// Schedules nodes in the order they were discovered.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstEligible;

impl OrderingPolicy for FirstEligible {
	fn select(&self, _graph: &TableTransformGraph, _eligible: &[&InnerNode]) -> usize {
		0
	}
}

/// Schedules slices and row filters as early as their dependencies allow, so
/// that maps are only evaluated for rows that survive them.
#[derive(Debug, Default, Clone, Copy)]
pub struct FiltersFirst;

impl OrderingPolicy for FiltersFirst {
	fn select(&self, graph: &TableTransformGraph, eligible: &[&InnerNode]) -> usize {
		eligible.iter()
			.position(|inner| {
				matches!(graph.node(inner.node()).kind(), NodeKind::Slice { .. } | NodeKind::RowFilter { .. })
			})
			.unwrap_or(0)
	}
}

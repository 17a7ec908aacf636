// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Graph rewrites applied before sequentializing.

mod merge;
mod prune;

pub use merge::merge_slices;
pub use prune::prune_accesses;
use tablecap_core::Result;
use tracing::{debug, instrument};

use crate::graph::TableTransformGraph;

/// Prunes unused accesses once, then merges slices until nothing changes.
///
/// Every merge removes one reachable slice, so the merge loop terminates.
#[instrument(name = "plan::optimize", level = "debug", skip_all)]
pub fn optimize(graph: &mut TableTransformGraph) -> Result<()> {
	prune_accesses(graph)?;

	let mut merges = 0;
	while merge_slices(graph)? {
		merges += 1;
	}

	debug!(merges, "optimized graph");
	Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compiles table transform trees into cursor assembly plans.
//!
//! Compilation runs in stages:
//!
//! 1. [`TableTransformGraph`] turns the transform tree into nodes and ports
//!    whose column accesses are grouped into equivalence classes.
//! 2. [`optimize`] prunes columns nobody reads and folds slices into their
//!    predecessors.
//! 3. [`TableTransformGraphProperties`] derives the row count and cursor type
//!    of the result.
//! 4. [`BranchGraph`] splits the graph into linear branches and orders the
//!    nodes of each.
//! 5. The branches are flattened into a [`CursorAssemblyPlan`].
//!
//! [`Compiler`] runs all stages.

pub mod access;
pub mod branch;
pub mod cap;
pub mod compiler;
pub mod explain;
pub mod graph;
pub mod optimize;
pub mod properties;

pub use access::{AccessId, AccessTable};
pub use branch::{Branch, BranchGraph, BranchNode, FiltersFirst, FirstEligible, InnerNode, OrderingPolicy};
pub use cap::{CapAccessId, CapNode, CursorAssemblyPlan};
pub use compiler::{Compiler, CompilerBuilder, CompilerConfig, compile};
pub use explain::{explain_cap, explain_graph};
pub use graph::{NodeId, NodeKind, PortId, TableTransformGraph};
pub use optimize::{merge_slices, optimize, prune_accesses};
pub use properties::{NodeProperties, TableTransformGraphProperties};

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Entry point turning transform trees into cursor assembly plans.

use std::sync::Arc;

use tablecap_core::{Result, SinkSpec, TableTransform};
use tracing::{debug, instrument};

use crate::{
	branch::{BranchGraph, FirstEligible, OrderingPolicy},
	cap::{CapBuilder, CursorAssemblyPlan},
	graph::TableTransformGraph,
	optimize::optimize,
	properties::TableTransformGraphProperties,
};

pub struct CompilerBuilder {
	optimize: Option<bool>,
	ordering_policy: Option<Arc<dyn OrderingPolicy>>,
}

impl Default for CompilerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl CompilerBuilder {
	/// Create a new CompilerBuilder with default settings
	pub fn new() -> Self {
		Self {
			optimize: None,
			ordering_policy: None,
		}
	}

	/// Whether to prune unused accesses and merge slices before
	/// sequentializing. Defaults to true.
	pub fn optimize(mut self, optimize: bool) -> Self {
		self.optimize = Some(optimize);
		self
	}

	/// Set the policy ordering the nodes within a branch.
	/// Defaults to [`FirstEligible`].
	pub fn ordering_policy(mut self, policy: impl OrderingPolicy + 'static) -> Self {
		self.ordering_policy = Some(Arc::new(policy));
		self
	}

	pub fn build_config(self) -> CompilerConfig {
		CompilerConfig {
			optimize: self.optimize.unwrap_or(true),
			ordering_policy: self.ordering_policy.unwrap_or_else(|| Arc::new(FirstEligible)),
		}
	}

	pub fn build(self) -> Compiler {
		Compiler {
			config: self.build_config(),
		}
	}
}

/// Configuration for the Compiler
#[derive(Debug, Clone)]
pub struct CompilerConfig {
	pub optimize: bool,
	pub ordering_policy: Arc<dyn OrderingPolicy>,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		CompilerBuilder::new().build_config()
	}
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
	config: CompilerConfig,
}

impl Compiler {
	pub fn new(config: CompilerConfig) -> Self {
		Self {
			config,
		}
	}

	pub fn builder() -> CompilerBuilder {
		CompilerBuilder::new()
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	/// Compiles a plan delivering the rows of `transform` to a consumer.
	#[instrument(name = "plan::compile", level = "debug", skip_all)]
	pub fn compile(&self, transform: &Arc<TableTransform>) -> Result<CursorAssemblyPlan> {
		let graph = TableTransformGraph::new(transform)?;
		self.compile_graph(graph)
	}

	/// Compiles a plan writing the rows of `transform` into `sink`.
	#[instrument(name = "plan::compile_materialize", level = "debug", skip_all, fields(sink = %sink.id))]
	pub fn compile_materialize(&self, transform: &Arc<TableTransform>, sink: SinkSpec) -> Result<CursorAssemblyPlan> {
		let graph = TableTransformGraph::materialize(transform, sink)?;
		self.compile_graph(graph)
	}

	/// Compiles an already built graph. The graph is consumed since the
	/// optimizer rewrites it; clone it first to keep the original.
	pub fn compile_graph(&self, mut graph: TableTransformGraph) -> Result<CursorAssemblyPlan> {
		if self.config.optimize {
			optimize(&mut graph)?;
		}

		let properties = TableTransformGraphProperties::new(&graph)?;
		let branches = BranchGraph::new(&graph, self.config.ordering_policy.as_ref())?;
		let plan = CapBuilder::new(&graph, &properties).build(&branches)?;

		debug!(
			nodes = plan.nodes().len(),
			cursor_type = %plan.cursor_type(),
			num_rows = ?plan.num_rows(),
			"compiled plan"
		);
		Ok(plan)
	}
}

/// Compiles `transform` with the default configuration.
pub fn compile(transform: &Arc<TableTransform>) -> Result<CursorAssemblyPlan> {
	Compiler::default().compile(transform)
}

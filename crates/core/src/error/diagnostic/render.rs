// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use super::Diagnostic;

pub trait DiagnosticRenderer {
	fn render(&self, diagnostic: &Diagnostic) -> String;
}

pub struct DefaultRenderer;

impl DiagnosticRenderer for DefaultRenderer {
	fn render(&self, d: &Diagnostic) -> String {
		let mut output = String::new();

		let _ = writeln!(output, "error[{}]: {}", d.code, d.message);

		if let Some(label) = &d.label {
			let _ = writeln!(output, "  = {}", label);
		}

		if let Some(help) = &d.help {
			let _ = writeln!(output, "\nhelp: {}", help);
		}

		for note in &d.notes {
			let _ = writeln!(output, "\nnote: {}", note);
		}

		output
	}
}

impl DefaultRenderer {
	pub fn render_string(diagnostic: &Diagnostic) -> String {
		DefaultRenderer.render(diagnostic)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn diagnostic(code: &str, message: &str) -> Diagnostic {
		Diagnostic {
			code: code.to_string(),
			message: message.to_string(),
			label: None,
			help: None,
			notes: vec![],
		}
	}

	#[test]
	fn test_render_header_and_help() {
		let mut d = diagnostic("PLAN_001", "bad input");
		d.help = Some("fix it".to_string());
		d.notes.push("first note".to_string());

		let out = DefaultRenderer::render_string(&d);
		assert!(out.starts_with("error[PLAN_001]: bad input"));
		assert!(out.contains("help: fix it"));
		assert!(out.contains("note: first note"));
	}

	#[test]
	fn test_render_label() {
		let mut d = diagnostic("PLAN_002", "column 3 missing");
		d.label = Some("column index out of range".to_string());

		let out = DefaultRenderer::render_string(&d);
		assert_eq!(out, "error[PLAN_002]: column 3 missing\n  = column index out of range\n");
	}
}

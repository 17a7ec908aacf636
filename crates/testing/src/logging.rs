// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing_subscriber::EnvFilter;

/// Installs a subscriber writing to the test harness output.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Calling it more
/// than once is fine; only the first call installs anything.
pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_test_writer().try_init();
}

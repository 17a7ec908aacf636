// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod cursor;
pub mod factory;
pub mod range;
pub mod schema;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for factory configuration and dispatch.

use thiserror::Error;

/// Result type for factory operations.
pub type Result<T> = std::result::Result<T, FactoryError>;

/// Caller misuse surfaced while configuring or running a factory.
///
/// Validation failures and action errors are not represented here; those are
/// delivered to the failure handler instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FactoryError {
	#[error("no success handler configured")]
	MissingSuccessHandler,

	#[error("no failure handler configured")]
	MissingFailureHandler,

	#[error("callback handler has no target")]
	MissingTarget,

	#[error("callback handler dispatched without bound arguments")]
	ArgumentsNotBound,

	#[error("invalid action: {0} (expected \"new\" or \"edit\")")]
	InvalidAction(String),

	#[error("invalid interface: {0} (expected \"web\" or \"api\")")]
	InvalidInterface(String),

	#[error("invalid validation rule: {0}")]
	InvalidRule(String),
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Contract between a factory and whatever validates its arguments.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::args::ArgumentBag;
use crate::errors::ErrorBag;
use crate::rules::RuleSet;

/// Checks argument data against a rule set.
///
/// Implementations are stateless from the factory's point of view; the
/// factory passes everything needed on each call.
pub trait Validator: Send + Sync {
	fn check(
		&self,
		data: &ArgumentBag,
		rules: &RuleSet,
		messages: &MessageMap,
	) -> ValidationOutcome;
}

impl<F> Validator for F
where
	F: Fn(&ArgumentBag, &RuleSet, &MessageMap) -> ValidationOutcome + Send + Sync,
{
	fn check(
		&self,
		data: &ArgumentBag,
		rules: &RuleSet,
		messages: &MessageMap,
	) -> ValidationOutcome {
		self(data, rules, messages)
	}
}

/// Result of one validator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
	errors: ErrorBag,
}

impl ValidationOutcome {
	pub fn passed_outcome() -> Self {
		Self::default()
	}

	pub fn from_errors(errors: ErrorBag) -> Self {
		Self { errors }
	}

	pub fn passed(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn failed(&self) -> bool {
		!self.passed()
	}

	pub fn errors(&self) -> &ErrorBag {
		&self.errors
	}

	pub fn into_errors(self) -> ErrorBag {
		self.errors
	}
}

/// Custom messages, keyed either `field.rule` or `rule`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageMap {
	messages: BTreeMap<String, String>,
}

impl MessageMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
		self.insert(key, message);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
		self.messages.insert(key.into(), message.into());
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.messages.get(key).map(String::as_str)
	}

	/// Message for `rule` on `field`, preferring the field-specific key.
	pub fn lookup(&self, field: &str, rule: &str) -> Option<&str> {
		self
			.get(&format!("{field}.{rule}"))
			.or_else(|| self.get(rule))
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MessageMap {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut map = Self::new();
		for (k, v) in iter {
			map.insert(k, v);
		}
		map
	}
}

/// Arguments failed validation. Carries the messages so a failure handler
/// can render them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub struct ValidationError {
	errors: ErrorBag,
}

impl ValidationError {
	pub fn new(errors: ErrorBag) -> Self {
		Self { errors }
	}

	pub fn errors(&self) -> &ErrorBag {
		&self.errors
	}

	pub fn into_errors(self) -> ErrorBag {
		self.errors
	}

	/// Field to messages map as a JSON object.
	pub fn to_json(&self) -> Value {
		serde_json::to_value(&self.errors).unwrap_or(Value::Null)
	}
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "validation failed: {}", self.to_json())
	}
}

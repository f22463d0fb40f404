// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field-keyed validation messages.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Validation messages grouped by field, in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBag {
	messages: BTreeMap<String, Vec<String>>,
}

impl ErrorBag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self
			.messages
			.entry(field.into())
			.or_default()
			.push(message.into());
	}

	/// Messages recorded for `field`, empty when it has none.
	pub fn get(&self, field: &str) -> &[String] {
		self
			.messages
			.get(field)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn first(&self, field: &str) -> Option<&str> {
		self.get(field).first().map(String::as_str)
	}

	pub fn has(&self, field: &str) -> bool {
		!self.get(field).is_empty()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	/// Number of fields with at least one message.
	pub fn len(&self) -> usize {
		self.messages.len()
	}

	/// Total number of messages across all fields.
	pub fn count(&self) -> usize {
		self.messages.values().map(Vec::len).sum()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.messages.keys().map(String::as_str)
	}

	/// Every message, field by field.
	pub fn all(&self) -> Vec<&str> {
		self
			.messages
			.values()
			.flat_map(|msgs| msgs.iter().map(String::as_str))
			.collect()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
		self.messages.iter()
	}

	pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
		self.messages
	}
}

impl From<BTreeMap<String, Vec<String>>> for ErrorBag {
	fn from(mut messages: BTreeMap<String, Vec<String>>) -> Self {
		messages.retain(|_, msgs| !msgs.is_empty());
		Self { messages }
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key/value argument bags fed into a factory.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FactoryError, Result};

/// Key used in [`ControlArgs`] to select between creating and editing.
pub const ACTION_KEY: &str = "action";
/// Key used in [`ControlArgs`] to carry the identifier of the edited model.
pub const ID_KEY: &str = "id";

/// Mapping from argument name to an arbitrary JSON value.
///
/// Keys are unique. Ordering is irrelevant to the factory; a `BTreeMap` keeps
/// iteration deterministic for logs and error output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgumentBag {
	values: BTreeMap<String, Value>,
}

impl ArgumentBag {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds every incoming entry whose key is not already present.
	///
	/// Existing values win. Mirrors a collection union.
	pub fn union<I, K>(&mut self, incoming: I)
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		for (key, value) in incoming {
			self.values.entry(key.into()).or_insert(value);
		}
	}

	/// Adds every incoming entry, replacing existing values with the same key.
	pub fn merge<I, K>(&mut self, incoming: I)
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		for (key, value) in incoming {
			self.values.insert(key.into(), value);
		}
	}

	/// Unconditionally sets `key`, returning the previous value if any.
	pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.values.insert(key.into(), value.into())
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.values.remove(key)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
		self.values.iter()
	}

	/// Borrow the underlying map.
	pub fn all(&self) -> &BTreeMap<String, Value> {
		&self.values
	}

	/// Render the bag as a JSON object.
	pub fn to_json(&self) -> Value {
		Value::Object(
			self
				.values
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
		)
	}
}

impl<K: Into<String>> FromIterator<(K, Value)> for ArgumentBag {
	fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
		let mut bag = Self::new();
		bag.merge(iter);
		bag
	}
}

impl<'a> IntoIterator for &'a ArgumentBag {
	type Item = (&'a String, &'a Value);
	type IntoIter = btree_map::Iter<'a, String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.iter()
	}
}

impl IntoIterator for ArgumentBag {
	type Item = (String, Value);
	type IntoIter = btree_map::IntoIter<String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.into_iter()
	}
}

/// Whether the factory should create a new model or edit an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
	#[default]
	New,
	Edit,
}

impl ActionMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			ActionMode::New => "new",
			ActionMode::Edit => "edit",
		}
	}
}

impl fmt::Display for ActionMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ActionMode {
	type Err = FactoryError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"new" => Ok(ActionMode::New),
			"edit" => Ok(ActionMode::Edit),
			other => Err(FactoryError::InvalidAction(other.to_string())),
		}
	}
}

/// Control arguments steering the factory rather than feeding the model.
///
/// Starts out as `{action: "new", id: null}`. Bulk updates merge, so
/// callers can replace the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlArgs {
	bag: ArgumentBag,
}

impl Default for ControlArgs {
	fn default() -> Self {
		let mut bag = ArgumentBag::new();
		bag.put(ACTION_KEY, ActionMode::New.as_str());
		bag.put(ID_KEY, Value::Null);
		Self { bag }
	}
}

impl ControlArgs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merge `incoming` into the control arguments; incoming keys win.
	pub fn merge<I, K>(&mut self, incoming: I)
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		self.bag.merge(incoming);
	}

	pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.bag.put(key, value)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.bag.get(key)
	}

	/// The requested action. A missing or null `action` means [`ActionMode::New`].
	pub fn action(&self) -> Result<ActionMode> {
		match self.bag.get(ACTION_KEY) {
			None | Some(Value::Null) => Ok(ActionMode::New),
			Some(Value::String(s)) => s.parse(),
			Some(other) => Err(FactoryError::InvalidAction(other.to_string())),
		}
	}

	/// Whether the action is [`ActionMode::Edit`]. An unrecognised action
	/// counts as not editing; use [`action`](Self::action) to see the error.
	pub fn is_edit(&self) -> bool {
		matches!(self.action(), Ok(ActionMode::Edit))
	}

	/// Identifier of the target model; `None` when absent or null.
	pub fn id(&self) -> Option<&Value> {
		match self.bag.get(ID_KEY) {
			None | Some(Value::Null) => None,
			Some(v) => Some(v),
		}
	}

	pub fn bag(&self) -> &ArgumentBag {
		&self.bag
	}
}

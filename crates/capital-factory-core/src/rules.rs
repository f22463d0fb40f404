// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative validation rules and the validator that evaluates them.
//!
//! Rules are written in the familiar pipe-separated form, e.g.
//! `"required|string|max:255"`, and are evaluated per field against an
//! [`ArgumentBag`]:
//!
//! - `required` and `present` are always evaluated.
//! - Every other rule is skipped when the field is absent, when it is a blank
//!   string, or when it is null and the field is marked `nullable`.
//! - `min`, `max` and `between` measure numbers by value, arrays and objects
//!   by element count, and strings by character count (or by value when the
//!   field is also `numeric`/`integer` and the string parses as a number).

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::args::ArgumentBag;
use crate::error::{FactoryError, Result};
use crate::errors::ErrorBag;
use crate::validation::{MessageMap, ValidationOutcome, Validator};

/// A single validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
	Required,
	Nullable,
	Present,
	String,
	Integer,
	Numeric,
	Boolean,
	Array,
	Email,
	Min(f64),
	Max(f64),
	Between(f64, f64),
	In(Vec<String>),
	NotIn(Vec<String>),
	Same(String),
}

impl Rule {
	/// Rule name as used in rule strings and message keys.
	pub fn name(&self) -> &'static str {
		match self {
			Rule::Required => "required",
			Rule::Nullable => "nullable",
			Rule::Present => "present",
			Rule::String => "string",
			Rule::Integer => "integer",
			Rule::Numeric => "numeric",
			Rule::Boolean => "boolean",
			Rule::Array => "array",
			Rule::Email => "email",
			Rule::Min(_) => "min",
			Rule::Max(_) => "max",
			Rule::Between(..) => "between",
			Rule::In(_) => "in",
			Rule::NotIn(_) => "not_in",
			Rule::Same(_) => "same",
		}
	}

	/// Implicit rules run even when the field is missing.
	pub fn is_implicit(&self) -> bool {
		matches!(self, Rule::Required | Rule::Present)
	}

	/// Parse a pipe-separated rule string such as `"required|max:255"`.
	pub fn parse_list(spec: &str) -> Result<Vec<Rule>> {
		spec
			.split('|')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::parse)
			.collect()
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rule::Min(n) | Rule::Max(n) => write!(f, "{}:{}", self.name(), format_number(*n)),
			Rule::Between(a, b) => write!(f, "between:{},{}", format_number(*a), format_number(*b)),
			Rule::In(values) | Rule::NotIn(values) => {
				write!(f, "{}:{}", self.name(), values.join(","))
			}
			Rule::Same(other) => write!(f, "same:{other}"),
			_ => f.write_str(self.name()),
		}
	}
}

impl FromStr for Rule {
	type Err = FactoryError;

	fn from_str(s: &str) -> Result<Self> {
		let (name, params) = match s.split_once(':') {
			Some((name, params)) => (name.trim(), Some(params)),
			None => (s.trim(), None),
		};
		let invalid = || FactoryError::InvalidRule(s.to_string());
		let number = |p: &str| p.trim().parse::<f64>().map_err(|_| invalid());
		let list = |p: Option<&str>| -> Result<Vec<String>> {
			let values: Vec<String> = p
				.ok_or_else(invalid)?
				.split(',')
				.map(|v| v.trim().to_string())
				.collect();
			if values.iter().all(|v| v.is_empty()) {
				return Err(invalid());
			}
			Ok(values)
		};

		let rule = match (name, params) {
			("required", None) => Rule::Required,
			("nullable", None) => Rule::Nullable,
			("present", None) => Rule::Present,
			("string", None) => Rule::String,
			("integer", None) => Rule::Integer,
			("numeric", None) => Rule::Numeric,
			("boolean", None) => Rule::Boolean,
			("array", None) => Rule::Array,
			("email", None) => Rule::Email,
			("min", Some(p)) => Rule::Min(number(p)?),
			("max", Some(p)) => Rule::Max(number(p)?),
			("between", Some(p)) => {
				let (low, high) = p.split_once(',').ok_or_else(invalid)?;
				let (low, high) = (number(low)?, number(high)?);
				if low > high {
					return Err(invalid());
				}
				Rule::Between(low, high)
			}
			("in", p) => Rule::In(list(p)?),
			("not_in", p) => Rule::NotIn(list(p)?),
			("same", Some(p)) if !p.trim().is_empty() => Rule::Same(p.trim().to_string()),
			_ => return Err(invalid()),
		};
		Ok(rule)
	}
}

/// Rules keyed by the field they govern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
	rules: BTreeMap<String, Vec<Rule>>,
}

impl RuleSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder form: append `rules` to `field`.
	pub fn field(
		mut self,
		field: impl Into<String>,
		rules: impl IntoIterator<Item = Rule>,
	) -> Self {
		self.rules.entry(field.into()).or_default().extend(rules);
		self
	}

	/// Builder form taking a rule string.
	pub fn parse_field(self, field: impl Into<String>, spec: &str) -> Result<Self> {
		let rules = Rule::parse_list(spec)?;
		Ok(self.field(field, rules))
	}

	/// Build a rule set from `(field, "rule|rule")` pairs.
	pub fn from_specs<'a, I, K>(specs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, &'a str)>,
		K: Into<String>,
	{
		specs
			.into_iter()
			.try_fold(Self::new(), |set, (field, spec)| set.parse_field(field, spec))
	}

	pub fn add(&mut self, field: impl Into<String>, rule: Rule) {
		self.rules.entry(field.into()).or_default().push(rule);
	}

	pub fn get(&self, field: &str) -> &[Rule] {
		self
			.rules
			.get(field)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.rules.keys().map(String::as_str)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Rule>> {
		self.rules.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.values().all(Vec::is_empty)
	}

	/// Number of fields with rules.
	pub fn len(&self) -> usize {
		self.rules.len()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeKind {
	Numeric,
	String,
	Array,
}

/// Evaluates [`RuleSet`]s with English default messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
	pub fn new() -> Self {
		Self
	}
}

impl Validator for RuleValidator {
	fn check(
		&self,
		data: &ArgumentBag,
		rules: &RuleSet,
		messages: &MessageMap,
	) -> ValidationOutcome {
		let mut errors = ErrorBag::new();

		for (field, field_rules) in rules.iter() {
			let value = data.get(field);
			let nullable = field_rules.contains(&Rule::Nullable);
			let numeric = field_rules
				.iter()
				.any(|r| matches!(r, Rule::Numeric | Rule::Integer));

			for rule in field_rules {
				if !rule.is_implicit() {
					match value {
						None => continue,
						Some(Value::String(s)) if s.trim().is_empty() => continue,
						Some(Value::Null) if nullable => continue,
						_ => {}
					}
				}

				if !passes(rule, value, data, numeric) {
					errors.add(field.clone(), message_for(rule, field, value, numeric, messages));
				}
			}
		}

		debug!(
			fields = rules.len(),
			failed_fields = errors.len(),
			"evaluated validation rules"
		);

		ValidationOutcome::from_errors(errors)
	}
}

fn passes(rule: &Rule, value: Option<&Value>, data: &ArgumentBag, numeric: bool) -> bool {
	match rule {
		Rule::Required => value.is_some_and(is_filled),
		Rule::Present => value.is_some(),
		Rule::Nullable => true,
		Rule::String => value.is_some_and(Value::is_string),
		Rule::Integer => value.is_some_and(is_integer),
		Rule::Numeric => value.is_some_and(|v| as_number(v).is_some()),
		Rule::Boolean => value.is_some_and(is_boolean),
		Rule::Array => value.is_some_and(|v| v.is_array() || v.is_object()),
		Rule::Email => value.and_then(Value::as_str).is_some_and(is_email),
		Rule::Min(min) => size_of(value, numeric).is_some_and(|(size, _)| size >= *min),
		Rule::Max(max) => size_of(value, numeric).is_some_and(|(size, _)| size <= *max),
		Rule::Between(min, max) => {
			size_of(value, numeric).is_some_and(|(size, _)| size >= *min && size <= *max)
		}
		Rule::In(allowed) => value
			.and_then(scalar_string)
			.is_some_and(|s| allowed.iter().any(|a| *a == s)),
		Rule::NotIn(denied) => value
			.and_then(scalar_string)
			.is_some_and(|s| !denied.iter().any(|d| *d == s)),
		Rule::Same(other) => value == data.get(other),
	}
}

fn is_filled(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::String(s) => !s.trim().is_empty(),
		Value::Array(a) => !a.is_empty(),
		Value::Object(o) => !o.is_empty(),
		Value::Bool(_) | Value::Number(_) => true,
	}
}

fn is_integer(value: &Value) -> bool {
	match value {
		Value::Number(n) => n.is_i64() || n.is_u64(),
		Value::String(s) => s.trim().parse::<i64>().is_ok(),
		_ => false,
	}
}

fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
		_ => None,
	}
}

fn is_boolean(value: &Value) -> bool {
	match value {
		Value::Bool(_) => true,
		Value::Number(n) => matches!(n.as_i64(), Some(0 | 1)),
		Value::String(s) => matches!(s.as_str(), "0" | "1"),
		_ => false,
	}
}

fn is_email(s: &str) -> bool {
	if s.chars().any(char::is_whitespace) {
		return false;
	}
	let Some((local, domain)) = s.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& domain
			.split_once('.')
			.is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn scalar_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn size_of(value: Option<&Value>, numeric: bool) -> Option<(f64, SizeKind)> {
	match value? {
		Value::Number(n) => n.as_f64().map(|n| (n, SizeKind::Numeric)),
		Value::String(s) => match (numeric, s.trim().parse::<f64>()) {
			(true, Ok(n)) => Some((n, SizeKind::Numeric)),
			_ => Some((s.chars().count() as f64, SizeKind::String)),
		},
		Value::Array(a) => Some((a.len() as f64, SizeKind::Array)),
		Value::Object(o) => Some((o.len() as f64, SizeKind::Array)),
		Value::Bool(_) | Value::Null => None,
	}
}

fn default_message(rule: &Rule, kind: SizeKind) -> &'static str {
	match (rule, kind) {
		(Rule::Required, _) => "The :attribute field is required.",
		(Rule::Present, _) => "The :attribute field must be present.",
		(Rule::Nullable, _) => "The :attribute field is invalid.",
		(Rule::String, _) => "The :attribute must be a string.",
		(Rule::Integer, _) => "The :attribute must be an integer.",
		(Rule::Numeric, _) => "The :attribute must be a number.",
		(Rule::Boolean, _) => "The :attribute field must be true or false.",
		(Rule::Array, _) => "The :attribute must be an array.",
		(Rule::Email, _) => "The :attribute must be a valid email address.",
		(Rule::Min(_), SizeKind::Numeric) => "The :attribute must be at least :min.",
		(Rule::Min(_), SizeKind::String) => "The :attribute must be at least :min characters.",
		(Rule::Min(_), SizeKind::Array) => "The :attribute must have at least :min items.",
		(Rule::Max(_), SizeKind::Numeric) => "The :attribute may not be greater than :max.",
		(Rule::Max(_), SizeKind::String) => {
			"The :attribute may not be greater than :max characters."
		}
		(Rule::Max(_), SizeKind::Array) => "The :attribute may not have more than :max items.",
		(Rule::Between(..), SizeKind::Numeric) => "The :attribute must be between :min and :max.",
		(Rule::Between(..), SizeKind::String) => {
			"The :attribute must be between :min and :max characters."
		}
		(Rule::Between(..), SizeKind::Array) => {
			"The :attribute must have between :min and :max items."
		}
		(Rule::In(_), _) | (Rule::NotIn(_), _) => "The selected :attribute is invalid.",
		(Rule::Same(_), _) => "The :attribute and :other must match.",
	}
}

fn message_for(
	rule: &Rule,
	field: &str,
	value: Option<&Value>,
	numeric: bool,
	messages: &MessageMap,
) -> String {
	let kind = size_of(value, numeric)
		.map(|(_, kind)| kind)
		.unwrap_or(SizeKind::String);
	let template = messages
		.lookup(field, rule.name())
		.unwrap_or_else(|| default_message(rule, kind));

	let mut message = template.replace(":attribute", &field.replace('_', " "));
	match rule {
		Rule::Min(n) => message = message.replace(":min", &format_number(*n)),
		Rule::Max(n) => message = message.replace(":max", &format_number(*n)),
		Rule::Between(low, high) => {
			message = message
				.replace(":min", &format_number(*low))
				.replace(":max", &format_number(*high));
		}
		Rule::In(values) | Rule::NotIn(values) => {
			message = message.replace(":values", &values.join(", "));
		}
		Rule::Same(other) => message = message.replace(":other", &other.replace('_', " ")),
		_ => {}
	}
	message
}

fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

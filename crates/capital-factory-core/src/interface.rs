// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FactoryError;

/// Surface a factory is serving. Handlers use it to pick a response shape;
/// the factory itself never branches on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceMode {
	#[default]
	Web,
	Api,
}

impl InterfaceMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			InterfaceMode::Web => "web",
			InterfaceMode::Api => "api",
		}
	}

	pub fn is_api(&self) -> bool {
		matches!(self, InterfaceMode::Api)
	}
}

impl fmt::Display for InterfaceMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for InterfaceMode {
	type Err = FactoryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"web" => Ok(InterfaceMode::Web),
			"api" => Ok(InterfaceMode::Api),
			_ => Err(FactoryError::InvalidInterface(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_web() {
		assert_eq!(InterfaceMode::default(), InterfaceMode::Web);
	}

	#[test]
	fn parses_case_insensitively() {
		assert_eq!("API".parse::<InterfaceMode>().unwrap(), InterfaceMode::Api);
		assert_eq!(" web ".parse::<InterfaceMode>().unwrap(), InterfaceMode::Web);
	}

	#[test]
	fn rejects_unknown() {
		assert_eq!(
			"cli".parse::<InterfaceMode>(),
			Err(FactoryError::InvalidInterface("cli".to_string()))
		);
	}

	#[test]
	fn serializes_snake_case() {
		assert_eq!(serde_json::to_string(&InterfaceMode::Api).unwrap(), "\"api\"");
	}
}

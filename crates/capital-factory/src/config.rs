// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Factory defaults loaded from TOML and environment overrides.
//!
//! ```toml
//! interface = "api"
//! validate = true
//! ```

use std::env::VarError;
use std::path::{Path, PathBuf};

use capital_factory_core::InterfaceMode;
use serde::{Deserialize, Serialize};

/// Overrides [`FactoryConfig::interface`].
pub const INTERFACE_ENV: &str = "CAPITAL_FACTORY_INTERFACE";
/// Overrides [`FactoryConfig::validate`].
pub const VALIDATE_ENV: &str = "CAPITAL_FACTORY_VALIDATE";

/// Errors that can occur while loading factory configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Environment variable could not be read
	#[error("Environment error: {0}")]
	Env(String),
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Defaults applied to factories built with
/// [`ModelFactory::from_config`](crate::ModelFactory::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
	pub interface: InterfaceMode,
	pub validate: bool,
}

impl Default for FactoryConfig {
	fn default() -> Self {
		Self {
			interface: InterfaceMode::Web,
			validate: true,
		}
	}
}

impl FactoryConfig {
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Self::parse(content, Path::new("<inline>"))
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path)?;
		let config = Self::parse(&content, path)?;
		tracing::debug!(
			path = %path.display(),
			interface = %config.interface,
			validate = config.validate,
			"loaded factory config"
		);
		Ok(config)
	}

	/// Apply `CAPITAL_FACTORY_*` environment overrides.
	///
	/// A variable that is set but not valid unicode is an error rather than
	/// being treated as unset.
	pub fn apply_env(self) -> Result<Self, ConfigError> {
		for key in [INTERFACE_ENV, VALIDATE_ENV] {
			env_value(key, std::env::var(key))?;
		}
		self.apply_overrides(|key| std::env::var(key).ok())
	}

	/// Apply overrides from `lookup`, which maps an environment variable name
	/// to its value.
	pub fn apply_overrides(
		mut self,
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<Self, ConfigError> {
		if let Some(value) = lookup(INTERFACE_ENV) {
			self.interface = value
				.parse::<InterfaceMode>()
				.map_err(|e| ConfigError::invalid_value(INTERFACE_ENV, e.to_string()))?;
		}

		if let Some(value) = lookup(VALIDATE_ENV) {
			self.validate = parse_bool(&value).ok_or_else(|| {
				ConfigError::invalid_value(VALIDATE_ENV, format!("not a boolean: {value}"))
			})?;
		}

		Ok(self)
	}

	fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

fn env_value(key: &str, var: Result<String, VarError>) -> Result<Option<String>, ConfigError> {
	match var {
		Ok(value) => Ok(Some(value)),
		Err(VarError::NotPresent) => Ok(None),
		Err(VarError::NotUnicode(raw)) => Err(ConfigError::Env(format!(
			"{key} is not valid unicode: {}",
			raw.to_string_lossy()
		))),
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn default_is_web_with_validation() {
		let config = FactoryConfig::default();
		assert_eq!(config.interface, InterfaceMode::Web);
		assert!(config.validate);
	}

	#[test]
	fn empty_toml_yields_defaults() {
		assert_eq!(FactoryConfig::from_toml_str("").unwrap(), FactoryConfig::default());
	}

	#[test]
	fn parses_toml_fields() {
		let config =
			FactoryConfig::from_toml_str("interface = \"api\"\nvalidate = false\n").unwrap();
		assert_eq!(config.interface, InterfaceMode::Api);
		assert!(!config.validate);
	}

	#[test]
	fn rejects_unknown_interface_in_toml() {
		let err = FactoryConfig::from_toml_str("interface = \"cli\"").unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn rejects_unknown_keys() {
		let err = FactoryConfig::from_toml_str("validation = false").unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "interface = \"api\"").unwrap();

		let config = FactoryConfig::load(file.path()).unwrap();
		assert_eq!(config.interface, InterfaceMode::Api);
		assert!(config.validate);
	}

	#[test]
	fn load_missing_file_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = FactoryConfig::load(dir.path().join("missing.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}

	#[test]
	fn overrides_replace_file_values() {
		let config = FactoryConfig::default()
			.apply_overrides(env(&[(INTERFACE_ENV, "API"), (VALIDATE_ENV, "off")]))
			.unwrap();
		assert_eq!(config.interface, InterfaceMode::Api);
		assert!(!config.validate);
	}

	#[test]
	fn absent_overrides_keep_values() {
		let base = FactoryConfig {
			interface: InterfaceMode::Api,
			validate: false,
		};
		assert_eq!(base.clone().apply_overrides(env(&[])).unwrap(), base);
	}

	#[test]
	fn invalid_overrides_are_rejected() {
		let err = FactoryConfig::default()
			.apply_overrides(env(&[(VALIDATE_ENV, "maybe")]))
			.unwrap_err();
		match err {
			ConfigError::InvalidValue { field, .. } => assert_eq!(field, VALIDATE_ENV),
			e => panic!("Expected InvalidValue, got: {:?}", e),
		}

		let err = FactoryConfig::default()
			.apply_overrides(env(&[(INTERFACE_ENV, "cli")]))
			.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn non_unicode_env_value_is_env_error() {
		let raw = std::ffi::OsString::from("caf\u{e9}");
		assert_eq!(
			env_value(VALIDATE_ENV, Ok("1".to_string())).unwrap(),
			Some("1".to_string())
		);
		assert_eq!(env_value(VALIDATE_ENV, Err(VarError::NotPresent)).unwrap(), None);

		let err = env_value(INTERFACE_ENV, Err(VarError::NotUnicode(raw))).unwrap_err();
		match err {
			ConfigError::Env(message) => assert!(message.starts_with(INTERFACE_ENV)),
			e => panic!("Expected Env, got: {:?}", e),
		}
	}
}

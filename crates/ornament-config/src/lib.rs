//! Configuration module for the ornament order service.
//!
//! Configuration is loaded from TOML. `${VAR}` and `${VAR:-default}` are
//! resolved from the environment before parsing, and the result is validated
//! before it is handed to the rest of the system.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

#[cfg(feature = "testing")]
pub mod builders {
	pub mod config;
}

use ornament_types::{FormSchema, FormVariant};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ornament order service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Which order page this instance serves.
	#[serde(default)]
	pub form: FormConfig,
	/// Price tiers.
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Whether the sale is accepting orders.
	#[serde(default)]
	pub sale: SaleConfig,
	/// Wizard session lifetime.
	#[serde(default)]
	pub sessions: SessionConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the HTTP API server.
	#[serde(default)]
	pub api: ApiConfig,
}

/// Order page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormConfig {
	/// Field and consent set to collect.
	#[serde(default)]
	pub variant: FormVariant,
	/// Page title.
	#[serde(default = "default_form_title")]
	pub title: String,
}

impl FormConfig {
	/// Builds the schema for the configured variant.
	pub fn schema(&self) -> FormSchema {
		self.variant.schema()
	}
}

impl Default for FormConfig {
	fn default() -> Self {
		Self {
			variant: FormVariant::default(),
			title: default_form_title(),
		}
	}
}

fn default_form_title() -> String {
	"Custom Ornament Order".to_string()
}

/// Price tiers: every full bundle costs `bundle_price_cents`, the remainder
/// is charged per unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	#[serde(default = "default_unit_price_cents")]
	pub unit_price_cents: u64,
	#[serde(default = "default_bundle_size")]
	pub bundle_size: u64,
	#[serde(default = "default_bundle_price_cents")]
	pub bundle_price_cents: u64,
	/// Portion of each ornament donated to charity; informational only.
	#[serde(default = "default_donation_per_unit_cents")]
	pub donation_per_unit_cents: u64,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			unit_price_cents: default_unit_price_cents(),
			bundle_size: default_bundle_size(),
			bundle_price_cents: default_bundle_price_cents(),
			donation_per_unit_cents: default_donation_per_unit_cents(),
		}
	}
}

fn default_unit_price_cents() -> u64 {
	600
}

fn default_bundle_size() -> u64 {
	4
}

fn default_bundle_price_cents() -> u64 {
	1800
}

fn default_donation_per_unit_cents() -> u64 {
	100
}

/// Sale window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaleConfig {
	/// When false, no new sessions are started and submissions are refused.
	#[serde(default = "default_sale_open")]
	pub open: bool,
	/// Notice shown instead of the form while the sale is closed.
	#[serde(default = "default_closed_message")]
	pub closed_message: String,
}

impl Default for SaleConfig {
	fn default() -> Self {
		Self {
			open: default_sale_open(),
			closed_message: default_closed_message(),
		}
	}
}

fn default_sale_open() -> bool {
	true
}

fn default_closed_message() -> String {
	"Thank you! Order forms are now closed.".to_string()
}

/// Wizard session lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
	/// Sessions untouched for this long are discarded.
	#[serde(default = "default_idle_timeout_seconds")]
	pub idle_timeout_seconds: u64,
	/// How often idle sessions are swept.
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			idle_timeout_seconds: default_idle_timeout_seconds(),
			cleanup_interval_seconds: default_cleanup_interval_seconds(),
		}
	}
}

fn default_idle_timeout_seconds() -> u64 {
	3600 // 1 hour
}

fn default_cleanup_interval_seconds() -> u64 {
	60
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration. Permissive when absent.
	pub cors: Option<CorsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
			cors: None,
		}
	}
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	64 * 1024 // 64KB
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// - Pricing tiers are positive and the bundle size is at least 1
	/// - Session timers are non-zero and the sweep runs at least daily
	/// - A primary storage implementation is named and configured
	/// - The API port is not 0
	fn validate(&self) -> Result<(), ConfigError> {
		if self.form.title.trim().is_empty() {
			return Err(ConfigError::Validation("Form title cannot be empty".into()));
		}

		if self.pricing.unit_price_cents == 0 {
			return Err(ConfigError::Validation(
				"pricing.unit_price_cents must be greater than 0".into(),
			));
		}
		if self.pricing.bundle_size == 0 {
			return Err(ConfigError::Validation(
				"pricing.bundle_size must be at least 1".into(),
			));
		}
		if self.pricing.bundle_price_cents == 0 {
			return Err(ConfigError::Validation(
				"pricing.bundle_price_cents must be greater than 0".into(),
			));
		}

		if self.sessions.idle_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"sessions.idle_timeout_seconds must be greater than 0".into(),
			));
		}
		if self.sessions.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"sessions.cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.sessions.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"sessions.cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		if self.api.port == 0 {
			return Err(ConfigError::Validation("api.port cannot be 0".into()));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("ORNAMENT_TEST_HOST", "localhost");
		std::env::set_var("ORNAMENT_TEST_PORT", "8080");

		let input = "bind = \"${ORNAMENT_TEST_HOST}:${ORNAMENT_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "bind = \"localhost:8080\"");

		std::env::remove_var("ORNAMENT_TEST_HOST");
		std::env::remove_var("ORNAMENT_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${ORNAMENT_MISSING_VAR:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${ORNAMENT_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("ORNAMENT_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_uses_defaults() {
		let config: Config = MINIMAL.parse().unwrap();

		assert_eq!(config.form.variant, FormVariant::Contact);
		assert_eq!(config.form.title, "Custom Ornament Order");
		assert_eq!(config.pricing.unit_price_cents, 600);
		assert_eq!(config.pricing.bundle_size, 4);
		assert_eq!(config.pricing.bundle_price_cents, 1800);
		assert!(config.sale.open);
		assert_eq!(config.api.port, 3000);
		assert!(config.api.cors.is_none());
	}

	#[test]
	fn test_full_config() {
		std::env::set_var("ORNAMENT_TEST_DATA_DIR", "/var/lib/ornaments");

		let config_str = r#"
[form]
variant = "classroom"
title = "Student Ornament Order"

[pricing]
unit_price_cents = 700
bundle_size = 5
bundle_price_cents = 2800
donation_per_unit_cents = 0

[sale]
open = false
closed_message = "See you next year"

[sessions]
idle_timeout_seconds = 900
cleanup_interval_seconds = 30

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "${ORNAMENT_TEST_DATA_DIR}"

[api]
host = "0.0.0.0"
port = 8080
[api.cors]
allowed_origins = ["https://ornaments.example.org"]
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.form.variant, FormVariant::Classroom);
		assert_eq!(config.form.schema().fields.len(), 8);
		assert_eq!(config.pricing.bundle_size, 5);
		assert!(!config.sale.open);
		assert_eq!(config.sessions.idle_timeout_seconds, 900);
		assert_eq!(
			config.storage.implementations["file"]
				.get("storage_path")
				.and_then(|v| v.as_str()),
			Some("/var/lib/ornaments")
		);
		assert_eq!(config.api.cors.unwrap().allowed_origins.len(), 1);

		std::env::remove_var("ORNAMENT_TEST_DATA_DIR");
	}

	#[test]
	fn test_unknown_variant_rejected() {
		let config_str = format!("[form]\nvariant = \"wholesale\"\n{}", MINIMAL);
		assert!(Config::from_str(&config_str).is_err());
	}

	#[test]
	fn test_missing_primary_storage_rejected() {
		let config_str = r#"
[storage]
primary = "file"
[storage.implementations.memory]
"#;
		let err = Config::from_str(config_str).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary storage 'file' not found in implementations"));
	}

	#[test]
	fn test_zero_bundle_size_rejected() {
		let config_str = format!("[pricing]\nbundle_size = 0\n{}", MINIMAL);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("bundle_size"));
	}

	#[test]
	fn test_cleanup_interval_bounds() {
		let config_str = format!("[sessions]\ncleanup_interval_seconds = 90000\n{}", MINIMAL);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("cleanup_interval_seconds"));
	}
}

//! Configuration builder for tests and local development.
//!
//! Produces a `Config` backed by in-memory storage with the standard
//! ornament pricing unless told otherwise.

use crate::{
	ApiConfig, Config, FormConfig, PricingConfig, SaleConfig, SessionConfig, StorageConfig,
};
use ornament_types::FormVariant;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	variant: FormVariant,
	pricing: PricingConfig,
	sale_open: bool,
	idle_timeout_seconds: u64,
	storage_primary: String,
	storage_config: toml::Value,
	api: ApiConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			variant: FormVariant::Contact,
			pricing: PricingConfig::default(),
			sale_open: true,
			idle_timeout_seconds: 3600,
			storage_primary: "memory".to_string(),
			storage_config: toml::Value::Table(toml::map::Map::new()),
			api: ApiConfig::default(),
		}
	}

	/// Sets the form variant.
	pub fn variant(mut self, variant: FormVariant) -> Self {
		self.variant = variant;
		self
	}

	/// Replaces the pricing tiers.
	pub fn pricing(mut self, pricing: PricingConfig) -> Self {
		self.pricing = pricing;
		self
	}

	/// Opens or closes the sale.
	pub fn sale_open(mut self, open: bool) -> Self {
		self.sale_open = open;
		self
	}

	pub fn idle_timeout_seconds(mut self, seconds: u64) -> Self {
		self.idle_timeout_seconds = seconds;
		self
	}

	/// Sets the primary storage implementation and its settings.
	pub fn storage(mut self, primary: &str, config: toml::Value) -> Self {
		self.storage_primary = primary.to_string();
		self.storage_config = config;
		self
	}

	pub fn api(mut self, api: ApiConfig) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		let mut implementations = HashMap::new();
		implementations.insert(self.storage_primary.clone(), self.storage_config);

		Config {
			form: FormConfig {
				variant: self.variant,
				..FormConfig::default()
			},
			pricing: self.pricing,
			sale: SaleConfig {
				open: self.sale_open,
				..SaleConfig::default()
			},
			sessions: SessionConfig {
				idle_timeout_seconds: self.idle_timeout_seconds,
				..SessionConfig::default()
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations,
			},
			api: self.api,
		}
	}
}

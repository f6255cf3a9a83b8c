//! Builder for the order engine.
//!
//! Resolves the configured storage backend through a map of factory
//! functions, then wires the order store, wizard and session registry on top
//! of it.

use crate::engine::OrderEngine;
use crate::price::PriceSchedule;
use crate::session::SessionRegistry;
use crate::wizard::Wizard;
use crate::writer::OrderStore;
use ornament_config::Config;
use ornament_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct EngineFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing an [`OrderEngine`].
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF>(self, factories: EngineFactories<SF>) -> Result<OrderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' not found in implementations",
					primary
				))
			})?;
		let factory = factories.storage_factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;

		let backend = match factory(storage_config) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				backend
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)));
			},
		};

		let storage = Arc::new(StorageService::new(backend));
		let orders = Arc::new(OrderStore::new(storage));

		let wizard = Arc::new(
			Wizard::new(
				self.config.form.schema(),
				PriceSchedule::from_config(&self.config.pricing),
				orders.clone(),
			)
			.with_sale_open(self.config.sale.open),
		);
		tracing::info!(
			component = "wizard",
			variant = self.config.form.variant.as_str(),
			sale_open = self.config.sale.open,
			"Loaded"
		);

		let sessions = Arc::new(SessionRegistry::new(
			wizard.clone(),
			Duration::from_secs(self.config.sessions.idle_timeout_seconds),
		));

		Ok(OrderEngine::new(self.config, wizard, sessions, orders))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ornament_config::builders::config::ConfigBuilder;
	use ornament_storage::StorageFactory;
	use ornament_types::FormVariant;

	fn factories() -> EngineFactories<StorageFactory> {
		EngineFactories {
			storage_factories: ornament_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[tokio::test]
	async fn test_build_with_memory_storage() {
		let config = ConfigBuilder::new().variant(FormVariant::Classroom).build();
		let engine = EngineBuilder::new(config).build(factories()).unwrap();

		assert_eq!(engine.wizard().schema().fields.len(), 8);
		assert_eq!(engine.sessions().active_count(), 0);
		let form = engine.form();
		assert_eq!(form.variant, "classroom");
		assert!(form.sale_open);
	}

	#[test]
	fn test_unknown_storage_rejected() {
		let config = ConfigBuilder::new()
			.storage("redis", toml::Value::Table(toml::map::Map::new()))
			.build();
		let err = EngineBuilder::new(config)
			.build(factories())
			.err()
			.unwrap();
		assert!(err.to_string().contains("Unknown storage implementation 'redis'"));
	}

	#[test]
	fn test_invalid_storage_settings_rejected() {
		let settings: toml::Value = toml::from_str("storage_path = \"\"").unwrap();
		let config = ConfigBuilder::new().storage("file", settings).build();
		let err = EngineBuilder::new(config)
			.build(factories())
			.err()
			.unwrap();
		assert!(err.to_string().contains("Failed to create storage implementation 'file'"));
	}

	#[tokio::test]
	async fn test_closed_sale_refuses_sessions() {
		let config = ConfigBuilder::new().sale_open(false).build();
		let engine = EngineBuilder::new(config).build(factories()).unwrap();

		assert!(engine.sessions().create().is_err());
		assert!(engine.form().closed_message.is_some());
	}
}

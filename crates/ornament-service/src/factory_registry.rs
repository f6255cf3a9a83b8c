//! Factory registry for pluggable implementations.
//!
//! Collects every storage backend the storage crate registers so the engine
//! can be built from configuration by implementation name.

use ornament_config::Config;
use ornament_core::{EngineBuilder, EngineFactories, OrderEngine};
use ornament_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Registry of implementation factories by name.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
		}
	}

	/// Register a storage implementation
	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();
		for (name, factory) in ornament_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}
		registry
	})
}

/// Builds the order engine using the registry and configuration.
///
/// Fails if the configuration names an implementation nobody registered.
pub fn build_engine_from_config(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let mut storage_factories = HashMap::new();
	for name in config.storage.implementations.keys() {
		match registry.storage.get(name) {
			Some(factory) => {
				storage_factories.insert(name.clone(), *factory);
			},
			None => {
				let mut available: Vec<_> = registry.storage.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown storage implementation '{}'. Available: [{}]",
					name,
					available.join(", ")
				)
				.into());
			},
		}
	}

	let engine = EngineBuilder::new(config).build(EngineFactories { storage_factories })?;
	Ok(engine)
}

#[cfg(test)]
mod tests {
	use super::*;
	use ornament_config::builders::config::ConfigBuilder;

	#[test]
	fn test_registry_has_storage_backends() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
	}

	#[tokio::test]
	async fn test_build_from_config() {
		let engine = build_engine_from_config(ConfigBuilder::new().build()).unwrap();
		assert!(engine.wizard().is_sale_open());
	}

	#[test]
	fn test_unknown_implementation_lists_available() {
		let config = ConfigBuilder::new()
			.storage("postgres", toml::Value::Table(toml::map::Map::new()))
			.build();
		let err = build_engine_from_config(config).err().unwrap().to_string();
		assert_eq!(
			err,
			"Unknown storage implementation 'postgres'. Available: [file, memory]"
		);
	}

	#[tokio::test]
	async fn test_build_with_file_storage() {
		let temp_dir = tempfile::tempdir().unwrap();
		let mut settings = toml::map::Map::new();
		settings.insert(
			"storage_path".to_string(),
			toml::Value::String(temp_dir.path().to_string_lossy().into_owned()),
		);
		let config = ConfigBuilder::new()
			.storage("file", toml::Value::Table(settings))
			.build();

		assert!(build_engine_from_config(config).is_ok());
	}
}

//! Main entry point for the ornament order service.
//!
//! Serves the three-step ornament order wizard over HTTP and writes
//! confirmed orders to the configured document store.

use clap::Parser;
use ornament_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args.config.to_string_lossy();
	let config = Config::from_file(&config_path).await?;
	tracing::info!(
		variant = config.form.variant.as_str(),
		storage = %config.storage.primary,
		"Loaded configuration [{}]",
		config_path
	);

	let engine = Arc::new(factory_registry::build_engine_from_config(config)?);
	let cleanup = engine.start_session_cleanup();

	let result = server::start_server(Arc::clone(&engine)).await;
	cleanup.abort();

	tracing::info!("Stopped order service");
	result
}

//! Main entry point for the storefront service.
//!
//! This binary wires the storefront together: it loads configuration,
//! builds the engine with the registered document-store and auth
//! implementations, opens the live order feed, and serves the HTTP API
//! the operator dashboard and the storefront clients talk to.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_config::Config;
use storefront_core::{StorefrontBuilder, StorefrontFactories};

mod apis;
mod server;

/// Command-line arguments for the storefront service.
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

/// Main entry point for the storefront service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with all registered implementations
/// 5. Runs the engine (and the API server, when enabled) until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started storefront");

	// Load configuration
	let config = Config::from_file_async(args.config.to_str().unwrap()).await?;
	tracing::info!("Loaded configuration [{}]", config.storefront.id);

	// Build the engine from the registered implementations.
	let factories = StorefrontFactories {
		storage_factories: storefront_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
		auth_factories: storefront_auth::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
	};
	let engine = StorefrontBuilder::new(config.clone()).build(factories).await?;
	let engine = Arc::new(engine);
	engine.initialize().await?;

	// Check if the API server should be started
	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);

	if api_enabled {
		let api_config = config.api.as_ref().unwrap().clone();
		let api_engine = Arc::clone(&engine);

		// Run the engine loop and the API server concurrently
		let engine_task = engine.run();
		let api_task = server::start_server(api_config, api_engine);

		tokio::select! {
			result = engine_task => {
				tracing::info!("Engine finished");
				result?;
			}
			result = api_task => {
				tracing::info!("API server finished");
				result?;
			}
		}
	} else {
		// Run only the engine
		tracing::info!("Starting engine only");
		engine.run().await?;
	}

	engine.shutdown().await?;
	tracing::info!("Stopped storefront");
	Ok(())
}

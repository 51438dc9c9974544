use anyhow::{Context, Result};
use clap::Parser;
use fleet_allocation::{AllocationService, StrategyRegistry};
use fleet_config::{ConfigLoader, FleetConfig};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod report;
mod snapshot;

use cli::{Args, Command};
use report::AllocationReport;
use snapshot::OrderInput;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = load_config(args.config.as_deref()).await?;

	let log_level = args
		.log_level
		.clone()
		.unwrap_or_else(|| config.engine.log_level.clone());
	setup_tracing(&log_level)?;

	match args.command {
		Command::Allocate {
			units,
			order,
			strategy,
			commit,
		} => run_allocate(config, &units, &order, strategy, commit).await,
		Command::Validate => validate_config(&config),
		Command::Strategies => {
			for name in StrategyRegistry::new().names() {
				println!("{}", name);
			}
			Ok(())
		}
	}
}

async fn load_config(path: Option<&Path>) -> Result<FleetConfig> {
	match path {
		Some(path) => ConfigLoader::new()
			.with_file(path)
			.load()
			.await
			.context("Failed to load configuration"),
		None => ConfigLoader::new()
			.load_defaults()
			.context("Failed to build default configuration"),
	}
}

async fn run_allocate(
	mut config: FleetConfig,
	units_path: &Path,
	order_path: &Path,
	strategy: Option<String>,
	commit: bool,
) -> Result<()> {
	if let Some(strategy) = strategy {
		config.allocation.strategy = strategy;
	}

	let registry = StrategyRegistry::new();
	let strategy = config
		.allocation
		.build_strategy(&registry)
		.context("Failed to build allocation strategy")?;
	let service = AllocationService::new(strategy, config.allocation.composition_policy());

	let mut units = snapshot::read_units(units_path).await?;
	let order = snapshot::read_order(order_path).await?;

	info!(
		engine = %config.engine.name,
		strategy = service.strategy_name(),
		order_id = order.id(),
		units = units.len(),
		"Running allocation"
	);

	let result = match &order {
		OrderInput::Demand(demand) => service.allocate(demand, &units),
		OrderInput::Items { id, items } => service.allocate_items(id, items, &units),
	};

	let mut report = AllocationReport::from_result(order.id(), result);
	if let AllocationReport::Allocated {
		plan,
		units: committed,
	} = &mut report
	{
		if commit {
			plan.commit(&mut units)
				.context("Failed to apply plan to snapshot")?;
			*committed = Some(units);
		}
	}

	println!("{}", serde_json::to_string_pretty(&report)?);

	if !report.is_allocated() {
		std::process::exit(2);
	}
	Ok(())
}

fn validate_config(config: &FleetConfig) -> Result<()> {
	ConfigLoader::validate_config(config).context("Configuration is invalid")?;

	info!("Configuration is valid");
	info!("Engine name: {}", config.engine.name);
	info!("Strategy: {}", config.allocation.strategy);
	info!(
		"Mixed-temperature orders allowed: {}",
		config.allocation.allow_mixed_temperature
	);

	for name in config.allocation.strategies.keys() {
		info!("  Strategy table: {}", name);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}

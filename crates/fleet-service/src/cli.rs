//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fleet-allocator")]
#[command(about = "Assigns delivery capacity to orders", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file (defaults are used when omitted)
	#[arg(short, long, env = "FLEET_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long, env = "FLEET_LOG_LEVEL")]
	pub log_level: Option<String>,

	/// Subcommand to execute
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Allocate one order against a unit snapshot
	#[command(about = "Run the configured strategy and print the plan or rejection as JSON")]
	Allocate {
		/// JSON file holding the capacity unit snapshot
		#[arg(long)]
		units: PathBuf,

		/// JSON file holding the order demand or its line items
		#[arg(long)]
		order: PathBuf,

		/// Use this strategy instead of the configured one
		#[arg(long)]
		strategy: Option<String>,

		/// Also print the snapshot with the plan applied
		#[arg(long)]
		commit: bool,
	},

	/// Validate configuration file
	#[command(about = "Validate the configuration and every strategy table")]
	Validate,

	/// List registered strategies
	#[command(about = "List the allocation strategies that can be configured")]
	Strategies,
}

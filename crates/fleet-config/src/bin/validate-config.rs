//! Configuration validation utility
//!
//! Usage: cargo run --bin validate-config config/local.toml

use std::env;
use std::process;

use fleet_config::ConfigLoader;

#[tokio::main]
async fn main() {
	let args: Vec<String> = env::args().collect();

	if args.len() != 2 {
		eprintln!("Usage: {} <config-file>", args[0]);
		process::exit(1);
	}

	let config_path = &args[1];

	println!("Validating configuration file: {}", config_path);

	match ConfigLoader::new().with_file(config_path).load().await {
		Ok(config) => {
			println!("✅ Configuration is valid!");
			println!("Engine name: {}", config.engine.name);
			println!("Strategy: {}", config.allocation.strategy);
			println!(
				"Mixed-temperature orders: {}",
				if config.allocation.allow_mixed_temperature {
					"allowed"
				} else {
					"rejected"
				}
			);
			println!(
				"Configured strategy tables: {:?}",
				config.allocation.strategies.keys().collect::<Vec<_>>()
			);
		}
		Err(e) => {
			eprintln!("❌ Configuration validation failed:");
			eprintln!("{}", e);
			process::exit(1);
		}
	}
}

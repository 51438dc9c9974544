//! Reading unit snapshots and orders from JSON files.

use anyhow::{Context, Result};
use fleet_types::{CapacityUnit, LineItem, OrderDemand};
use serde::Deserialize;
use std::path::Path;

/// Order as submitted on the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OrderInput {
	/// Already resolved weight and temperature requirement.
	Demand(OrderDemand),
	/// Catalog-resolved line items, composed before allocation.
	Items { id: String, items: Vec<LineItem> },
}

impl OrderInput {
	pub fn id(&self) -> &str {
		match self {
			Self::Demand(demand) => &demand.id,
			Self::Items { id, .. } => id,
		}
	}
}

/// A snapshot is either a bare array or an object with a `units` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
	List(Vec<CapacityUnit>),
	Wrapped { units: Vec<CapacityUnit> },
}

pub fn parse_units(contents: &str) -> Result<Vec<CapacityUnit>> {
	let snapshot: SnapshotFile =
		serde_json::from_str(contents).context("Failed to parse unit snapshot")?;
	Ok(match snapshot {
		SnapshotFile::List(units) | SnapshotFile::Wrapped { units } => units,
	})
}

pub fn parse_order(contents: &str) -> Result<OrderInput> {
	serde_json::from_str(contents).context("Failed to parse order")
}

pub async fn read_units(path: &Path) -> Result<Vec<CapacityUnit>> {
	let contents = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read unit snapshot: {:?}", path))?;
	parse_units(&contents)
}

pub async fn read_order(path: &Path) -> Result<OrderInput> {
	let contents = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read order: {:?}", path))?;
	parse_order(&contents)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_parse_units_both_shapes() {
		let bare = r#"[{"id": "a", "capacity_kg": 10, "is_cold_capable": true}]"#;
		let wrapped = r#"{"units": [{"id": "a", "capacity_kg": 10, "is_cold_capable": true}]}"#;

		let units = parse_units(bare).unwrap();
		assert_eq!(units, parse_units(wrapped).unwrap());
		assert_eq!(units[0].residual_kg, 10.0);
	}

	#[test]
	fn test_parse_order_shapes() {
		let demand = r#"{
			"id": "o-1",
			"total_weight_kg": 18.0,
			"requires_cold": true,
			"cold_weight_kg": 10.0,
			"non_cold_weight_kg": 8.0
		}"#;
		assert_eq!(
			parse_order(demand).unwrap(),
			OrderInput::Demand(OrderDemand::split("o-1", 10.0, 8.0))
		);

		let items = r#"{
			"id": "o-2",
			"items": [{"sku": "milk", "quantity": 2, "unit_weight_kg": 1.0, "requires_cold": true}]
		}"#;
		let order = parse_order(items).unwrap();
		assert_eq!(order.id(), "o-2");
		assert!(matches!(order, OrderInput::Items { ref items, .. } if items.len() == 1));

		assert!(parse_order(r#"{"id": "o-3"}"#).is_err());
	}

	#[tokio::test]
	async fn test_read_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(br#"[{"id": "van", "capacity_kg": 5, "is_powered": false}]"#)
			.unwrap();

		let units = read_units(file.path()).await.unwrap();
		assert!(!units[0].is_powered);

		assert!(read_order(Path::new("/no/such/order.json")).await.is_err());
	}
}

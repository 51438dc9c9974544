//! Compartment lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a vehicle compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentState {
	/// Empty and ready to be loaded.
	#[default]
	Available,
	/// Holds cargo for one or more orders, not yet departed.
	Assigned,
	/// On the road.
	InTransit,
	/// Cargo handed over, waiting to be released back to the pool.
	Delivered,
}

/// Events that move a compartment between lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentEvent {
	Assign,
	Depart,
	Deliver,
	Release,
}

/// Errors that can occur when driving the compartment lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
	/// The event is not allowed from the current state.
	#[error("Cannot apply {event:?} to a compartment in state {from:?}")]
	Invalid {
		from: CompartmentState,
		event: CompartmentEvent,
	},
}

impl CompartmentState {
	/// Whether a compartment in this state may receive further cargo.
	pub fn accepts_cargo(self) -> bool {
		matches!(self, Self::Available | Self::Assigned)
	}

	/// Applies an event, returning the next state.
	pub fn transition(self, event: CompartmentEvent) -> Result<Self, TransitionError> {
		use CompartmentEvent::*;
		use CompartmentState::*;

		match (self, event) {
			(Available, Assign) | (Assigned, Assign) => Ok(Assigned),
			(Assigned, Depart) => Ok(InTransit),
			(Assigned, Release) | (Delivered, Release) => Ok(Available),
			(InTransit, Deliver) => Ok(Delivered),
			(from, event) => Err(TransitionError::Invalid { from, event }),
		}
	}
}

impl std::fmt::Display for CompartmentState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let label = match self {
			Self::Available => "available",
			Self::Assigned => "assigned",
			Self::InTransit => "in_transit",
			Self::Delivered => "delivered",
		};
		write!(f, "{}", label)
	}
}

//! Shared data model for the fleet allocation engine.
//!
//! Every type in this crate is created fresh per allocation request and
//! discarded once the caller has acted on the result.

pub mod allocation;
pub mod capacity;
pub mod demand;
pub mod lifecycle;
pub mod rejection;
pub mod validation;
pub mod weight;

pub use allocation::*;
pub use capacity::*;
pub use demand::*;
pub use lifecycle::*;
pub use rejection::*;
pub use validation::*;
pub use weight::*;

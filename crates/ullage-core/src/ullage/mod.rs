//! Ullage tracking for the engines of every simulated vessel.
//!
//! [`UllageRegistry`] → [`UllageController`] (one per vessel) →
//! [`UllageSet`] (one per engine) → `UllageSimulator`.

mod controller;
mod registry;
mod set;

pub use controller::*;
pub use registry::*;
pub use set::*;

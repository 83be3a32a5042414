//! Generation - procedural creation of test and scenario vessels.

mod vessel;

pub use vessel::*;

//! Component definitions for the vehicle ECS world.
//!
//! Components are plain data attached to entities. A vehicle is an entity
//! carrying [`Vessel`]; each of its parts is an entity carrying [`Part`] plus
//! whatever modules the part has (resources, a tank, an engine).

mod engine;
mod part;
mod tank;
mod vessel;

pub use engine::*;
pub use part::*;
pub use tank::*;
pub use vessel::*;

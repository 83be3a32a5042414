//! Parts and the resources they store.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Part component - a physical piece of a vessel.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    /// Owning vessel entity.
    pub vessel: Entity,
    /// Part this one is attached to, `None` for the root.
    pub parent: Option<Entity>,
    /// Parts sharing a group can feed each other (fuel lines, stacks).
    pub crossfeed_group: u32,
    /// Mass without resources, tonnes.
    pub dry_mass: f64,
}

impl Part {
    pub fn new(name: impl Into<String>, vessel: Entity) -> Self {
        Self {
            name: name.into(),
            vessel,
            parent: None,
            crossfeed_group: 0,
            dry_mass: 0.0,
        }
    }

    pub fn attached_to(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_crossfeed_group(mut self, group: u32) -> Self {
        self.crossfeed_group = group;
        self
    }

    pub fn with_dry_mass(mut self, tonnes: f64) -> Self {
        self.dry_mass = tonnes;
        self
    }
}

/// A single stored resource inside a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStore {
    pub name: String,
    pub amount: f64,
    pub max_amount: f64,
    /// Tonnes per unit.
    pub density: f64,
    /// Whether the resource may currently flow out of the part.
    pub flow_enabled: bool,
    /// Whether the resource can be pumped to other parts.
    pub transfer_supports_pump: bool,
}

impl ResourceStore {
    pub fn new(name: impl Into<String>, amount: f64, max_amount: f64, density: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            max_amount,
            density,
            flow_enabled: true,
            transfer_supports_pump: true,
        }
    }

    pub fn mass(&self) -> f64 {
        self.amount * self.density
    }
}

/// Resources component - every resource a part stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub stores: Vec<ResourceStore>,
}

impl Resources {
    pub fn new(stores: Vec<ResourceStore>) -> Self {
        Self { stores }
    }

    pub fn get(&self, name: &str) -> Option<&ResourceStore> {
        self.stores.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ResourceStore> {
        self.stores.iter_mut().find(|s| s.name == name)
    }

    pub fn mass(&self) -> f64 {
        self.stores.iter().map(ResourceStore::mass).sum()
    }
}

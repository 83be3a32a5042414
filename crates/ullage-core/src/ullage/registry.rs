//! Vessel → controller lookup for one simulation session.

use std::collections::HashMap;

use hecs::Entity;

use crate::ullage::UllageController;

/// Controllers keyed by vessel entity.
///
/// Owned by the running [`FlightSimulation`](crate::simulation::FlightSimulation)
/// and emptied whenever the simulation leaves flight, so no controller
/// outlives its session.
#[derive(Debug, Default)]
pub struct UllageRegistry {
    controllers: HashMap<Entity, UllageController>,
}

impl UllageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller for `vessel`, created on first use.
    pub fn get(&mut self, vessel: Entity) -> &mut UllageController {
        self.controllers
            .entry(vessel)
            .or_insert_with(|| UllageController::new(vessel))
    }

    /// Controller for `vessel` if one exists.
    pub fn find(&self, vessel: Entity) -> Option<&UllageController> {
        self.controllers.get(&vessel)
    }

    pub fn find_mut(&mut self, vessel: Entity) -> Option<&mut UllageController> {
        self.controllers.get_mut(&vessel)
    }

    pub fn contains(&self, vessel: Entity) -> bool {
        self.controllers.contains_key(&vessel)
    }

    pub fn remove(&mut self, vessel: Entity) -> Option<UllageController> {
        self.controllers.remove(&vessel)
    }

    /// Drop controllers whose vessel fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.controllers.retain(|vessel, _| keep(*vessel));
    }

    /// Forget every controller.
    pub fn clear(&mut self) {
        self.controllers = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn vessels(&self) -> impl Iterator<Item = Entity> + '_ {
        self.controllers.keys().copied()
    }
}

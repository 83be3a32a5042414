//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for the snapshot. Entity references between parts are
//! stored as indices into the saved entity list and resolved on load. Each
//! engine's ullage state is written as an `Ullage` child of its engine node.

use std::collections::HashMap;
use std::io::{Read, Write};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use ullage_logic::{ConfigNode, UllageSettings};

use crate::components::*;
use crate::simulation::TimeWarp;
use crate::ullage::UllageSet;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

const ENGINE_NODE: &str = "ENGINE";

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Simulation time in seconds
    pub sim_time: f64,
    pub settings: UllageSettings,
    pub time_warp: TimeWarp,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// `Part` with its entity references replaced by save indices.
#[derive(Serialize, Deserialize, Clone)]
pub struct SerializablePart {
    pub name: String,
    pub vessel: u32,
    pub parent: Option<u32>,
    pub crossfeed_group: u32,
    pub dry_mass: f64,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    pub vessel: Option<Vessel>,
    pub part: Option<SerializablePart>,
    pub resources: Option<Resources>,
    pub fuel_tank: Option<FuelTank>,
    pub engine: Option<EngineModule>,
    /// Engine node holding the `Ullage` child, if the engine had a set.
    pub ullage: Option<ConfigNode>,
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let order: Vec<Entity> = world.iter().map(|e| e.entity()).collect();
    let index: HashMap<Entity, u32> = order
        .iter()
        .enumerate()
        .map(|(i, e)| (*e, i as u32))
        .collect();

    let mut entities = Vec::with_capacity(order.len());
    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();

        if let Some(c) = entity_ref.get::<&Vessel>() {
            se.vessel = Some((*c).clone());
        }
        let mut in_design = false;
        if let Some(c) = entity_ref.get::<&Part>() {
            in_design = world
                .get::<&Vessel>(c.vessel)
                .map(|v| v.in_design)
                .unwrap_or(false);
            match index.get(&c.vessel) {
                Some(&vessel) => {
                    se.part = Some(SerializablePart {
                        name: c.name.clone(),
                        vessel,
                        parent: c.parent.and_then(|p| index.get(&p).copied()),
                        crossfeed_group: c.crossfeed_group,
                        dry_mass: c.dry_mass,
                    });
                }
                None => log::warn!("part '{}' has no vessel, not saved", c.name),
            }
        }
        if let Some(c) = entity_ref.get::<&Resources>() {
            se.resources = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&FuelTank>() {
            se.fuel_tank = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&EngineModule>() {
            se.engine = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&UllageSet>() {
            let mut node = ConfigNode::new(ENGINE_NODE);
            c.save(&mut node, in_design);
            se.ullage = Some(node);
        }

        entities.push(se);
    }

    entities
}

/// Rebuild a world from serialized entities
fn deserialize_entities(world: &mut World, entities: Vec<SerializableEntity>) {
    // First pass reserves every entity so parts can point at any of them.
    let handles: Vec<Entity> = entities.iter().map(|_| world.spawn(())).collect();
    let resolve = |i: u32| handles.get(i as usize).copied();

    for (se, &entity) in entities.into_iter().zip(&handles) {
        if let Some(c) = se.vessel {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.part {
            match resolve(c.vessel) {
                Some(vessel) => {
                    let mut part = Part::new(c.name, vessel)
                        .with_crossfeed_group(c.crossfeed_group)
                        .with_dry_mass(c.dry_mass);
                    part.parent = c.parent.and_then(resolve);
                    let _ = world.insert_one(entity, part);
                }
                None => log::warn!("part '{}' references missing vessel {}", c.name, c.vessel),
            }
        }
        if let Some(c) = se.resources {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.fuel_tank {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.engine {
            let mut set = UllageSet::new(entity, &c);
            match &se.ullage {
                Some(node) => set.load(node),
                None => set.simulator_mut().reset(),
            }
            let _ = world.insert(entity, (c, set));
        }
    }
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(
    writer: W,
    world: &World,
    sim_time: f64,
    settings: &UllageSettings,
    time_warp: &TimeWarp,
) -> Result<(), SaveError> {
    let entities = serialize_entities(world);

    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        settings: *settings,
        time_warp: *time_warp,
        entities,
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    deserialize_entities(&mut world, save_data.entities);

    Ok(LoadedSimulation {
        world,
        sim_time: save_data.sim_time,
        settings: save_data.settings,
        time_warp: save_data.time_warp,
    })
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub sim_time: f64,
    pub settings: UllageSettings,
    pub time_warp: TimeWarp,
}

/// Errors that can occur during save/load
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_vessel, VesselConfig};
    use ullage_logic::UllageEnvelope;

    #[test]
    fn test_save_load_roundtrip() {
        let mut world = World::new();
        let layout = generate_vessel(&mut world, &VesselConfig::cryogenic().with_fill(0.5));
        let envelope = UllageEnvelope {
            height_min: 0.3,
            height_max: 0.8,
            radial_min: 0.1,
            radial_max: 0.6,
        };
        if let Ok(mut set) = world.get::<&mut UllageSet>(layout.engines[0]) {
            set.simulator_mut().set_envelope(envelope);
        }

        let mut buffer = Vec::new();
        save_simulation(&mut buffer, &world, 12.5, &UllageSettings::default(), &TimeWarp::default())
            .expect("Save failed");
        let loaded = load_simulation(&buffer[..]).expect("Load failed");

        assert_eq!(loaded.sim_time, 12.5);
        assert_eq!(loaded.world.len(), world.len());

        let mut query = loaded.world.query::<(&EngineModule, &UllageSet, &Part)>();
        let (_, (module, set, part)) = query.iter().next().expect("engine survived");
        assert_eq!(module.name, "Hydrolox Engine");
        assert_eq!(*set.simulator().envelope(), envelope);

        // The engine still hangs from the LOX tank of the same vessel.
        let parent = part.parent.expect("engine has a parent");
        let tank = loaded.world.get::<&Part>(parent).map(|p| p.name.clone()).ok();
        assert_eq!(tank.as_deref(), Some("LOX Tank"));
        assert!(loaded.world.get::<&Vessel>(part.vessel).is_ok());
    }

    #[test]
    fn test_design_vessel_loads_at_rest() {
        let mut world = World::new();
        let layout = generate_vessel(&mut world, &VesselConfig::default());
        if let Ok(mut vessel) = world.get::<&mut Vessel>(layout.vessel) {
            vessel.in_design = true;
        }
        if let Ok(mut set) = world.get::<&mut UllageSet>(layout.engines[0]) {
            set.simulator_mut().set_envelope(UllageEnvelope {
                height_min: 0.4,
                height_max: 0.6,
                radial_min: 0.2,
                radial_max: 0.3,
            });
        }

        let mut buffer = Vec::new();
        save_simulation(&mut buffer, &world, 0.0, &UllageSettings::default(), &TimeWarp::default())
            .expect("Save failed");
        let loaded = load_simulation(&buffer[..]).expect("Load failed");

        let mut query = loaded.world.query::<&UllageSet>();
        let (_, set) = query.iter().next().expect("engine survived");
        assert_eq!(*set.simulator().envelope(), UllageEnvelope::REST);
    }

    #[test]
    fn test_version_mismatch() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            sim_time: 0.0,
            settings: UllageSettings::default(),
            time_warp: TimeWarp::default(),
            entities: Vec::new(),
        };
        let buffer = bincode::serialize(&data).expect("serialize");
        let err = load_simulation(&buffer[..]).err();
        assert!(matches!(err, Some(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1));
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board and entity state for the Circles of Hell client.

mod entities;
mod grid;
pub mod pathfinding;

use std::collections::BTreeMap;

use circles_core::{
    wire::{ActionResponse, BoardData, GameSnapshot, OrderedEntries, StructureData, UnitData},
    EntityId, HexCoord, RenderCommand, StructureId, UnitId,
};
use thiserror::Error;
use tracing::{debug, warn};

pub use entities::{Hero, Structure, Unit};
pub use grid::{GridError, Hex, HexGrid};

/// Reasons a snapshot could not seed the world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Snapshots must state the board radius.
    #[error("snapshot board is missing its radius")]
    MissingRadius,
    /// The board listing is inconsistent with the radius.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The hero stands outside the board.
    #[error("hero position {0} lies outside the board")]
    HeroOffBoard(HexCoord),
    /// A unit stands outside the board.
    #[error("unit {unit} position {hex} lies outside the board")]
    UnitOffBoard {
        /// Offending unit.
        unit: UnitId,
        /// Its reported position.
        hex: HexCoord,
    },
    /// A structure is bound outside the board.
    #[error("structure {structure} position {hex} lies outside the board")]
    StructureOffBoard {
        /// Offending structure.
        structure: StructureId,
        /// Its reported position.
        hex: HexCoord,
    },
}

/// Aggregate of the board and every entity standing on it.
#[derive(Clone, Debug)]
pub struct GameState {
    grid: HexGrid,
    hero: Hero,
    units: BTreeMap<UnitId, Unit>,
    structures: BTreeMap<StructureId, Structure>,
}

impl GameState {
    /// Builds the world from the initial snapshot.
    ///
    /// Unlisted hexes stay empty. Tile directives for every listed non-empty
    /// hex and spawn directives for every entity are pushed into `out`.
    pub fn load(snapshot: &GameSnapshot, out: &mut Vec<RenderCommand>) -> Result<Self, LoadError> {
        let radius = snapshot.board.radius.ok_or(LoadError::MissingRadius)?;
        let mut grid = HexGrid::new(radius)?;
        for listed in &snapshot.board.hexes {
            let _ = grid.set_occupancy(listed.coord(), listed.slot, out)?;
        }

        let hero_data = &snapshot.hero;
        if !grid.contains(hero_data.position) {
            return Err(LoadError::HeroOffBoard(hero_data.position));
        }
        let hero = Hero::from_data(hero_data, &grid);
        out.push(RenderCommand::SpawnEntity {
            entity: EntityId::Hero,
            hex: hero.position(),
        });

        let mut units = BTreeMap::new();
        for (&id, data) in snapshot.units.iter() {
            if !grid.contains(data.position) {
                return Err(LoadError::UnitOffBoard {
                    unit: id,
                    hex: data.position,
                });
            }
            if id != data.pk {
                warn!(key = %id, pk = %data.pk, "unit entry keyed differently from its pk");
            }
            let unit = Unit::from_data(data, &grid);
            out.push(RenderCommand::SpawnEntity {
                entity: EntityId::Unit(unit.pk()),
                hex: unit.position(),
            });
            let _ = units.insert(unit.pk(), unit);
        }

        let mut structures = BTreeMap::new();
        for (&id, data) in snapshot.structures.iter() {
            if !grid.contains(data.position) {
                return Err(LoadError::StructureOffBoard {
                    structure: id,
                    hex: data.position,
                });
            }
            out.push(RenderCommand::SpawnEntity {
                entity: EntityId::Structure(id),
                hex: data.position,
            });
            let _ = structures.insert(id, Structure::from_data(id, data));
        }

        debug!(
            radius,
            units = units.len(),
            structures = structures.len(),
            "world loaded"
        );

        Ok(Self {
            grid,
            hero,
            units,
            structures,
        })
    }

    /// Applies an occupancy diff, skipping hexes outside the board.
    ///
    /// Returns the number of hexes whose occupancy changed.
    pub fn apply_board(&mut self, board: &BoardData, out: &mut Vec<RenderCommand>) -> usize {
        let mut changed = 0;
        for listed in &board.hexes {
            match self.grid.set_occupancy(listed.coord(), listed.slot, out) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(error) => warn!(%error, "skipping board entry"),
            }
        }
        changed
    }

    /// Lowers the health of an entity. Structures have no health.
    ///
    /// Returns whether an entity took the damage.
    pub fn apply_damage(&mut self, entity: EntityId, amount: i32) -> bool {
        match entity {
            EntityId::Hero => {
                self.hero.take_damage(amount);
                true
            }
            EntityId::Unit(id) => match self.units.get_mut(&id) {
                Some(unit) => {
                    unit.take_damage(amount);
                    true
                }
                None => false,
            },
            EntityId::Structure(_) => false,
        }
    }

    /// Moves an entity to another hex without touching occupancy.
    ///
    /// Occupancy is owned by the board diff of the same response. Returns
    /// whether the entity moved.
    pub fn relocate(
        &mut self,
        entity: EntityId,
        to: HexCoord,
        out: &mut Vec<RenderCommand>,
    ) -> bool {
        if !self.grid.contains(to) {
            warn!(?entity, %to, "refusing to relocate outside the board");
            return false;
        }
        let moved = match entity {
            EntityId::Hero => {
                self.hero.relocate(to);
                true
            }
            EntityId::Unit(id) => match self.units.get_mut(&id) {
                Some(unit) => {
                    unit.relocate(to);
                    true
                }
                None => false,
            },
            EntityId::Structure(_) => false,
        };
        if moved {
            out.push(RenderCommand::MoveEntity { entity, to });
        }
        moved
    }

    /// Overwrites entities from the authoritative payload of a response.
    ///
    /// Sections the response omits are kept, with their derived hex sets
    /// recomputed against the current board. Reported sections are complete:
    /// units and structures missing from them are removed.
    pub fn reconcile_entities(&mut self, response: &ActionResponse, out: &mut Vec<RenderCommand>) {
        let hero_before = self.hero.position();
        match &response.hero {
            Some(data) => self.hero.update(data, &self.grid),
            None => self.hero.refresh(&self.grid),
        }
        if self.hero.position() != hero_before {
            out.push(RenderCommand::MoveEntity {
                entity: EntityId::Hero,
                to: self.hero.position(),
            });
        }

        match &response.units {
            Some(reported) => self.reconcile_units(reported, out),
            None => {
                for unit in self.units.values_mut() {
                    unit.refresh(&self.grid);
                }
            }
        }

        if let Some(reported) = &response.structures {
            self.reconcile_structures(reported, out);
        }
    }

    fn reconcile_units(
        &mut self,
        reported: &OrderedEntries<UnitId, UnitData>,
        out: &mut Vec<RenderCommand>,
    ) {
        let mut next = BTreeMap::new();
        for (&key, data) in reported.iter() {
            if key != data.pk {
                warn!(%key, pk = %data.pk, "unit entry keyed differently from its pk");
            }
            let entity = EntityId::Unit(data.pk);
            let unit = match self.units.remove(&data.pk) {
                Some(mut unit) => {
                    let before = unit.position();
                    unit.update(data, &self.grid);
                    if unit.position() != before {
                        out.push(RenderCommand::MoveEntity {
                            entity,
                            to: unit.position(),
                        });
                    }
                    unit
                }
                None => {
                    let unit = Unit::from_data(data, &self.grid);
                    debug!(unit = %data.pk, hex = %data.position, "unit spawned");
                    out.push(RenderCommand::SpawnEntity {
                        entity,
                        hex: unit.position(),
                    });
                    unit
                }
            };
            let _ = next.insert(unit.pk(), unit);
        }

        for gone in std::mem::replace(&mut self.units, next).into_keys() {
            debug!(unit = %gone, "unit removed");
            out.push(RenderCommand::RemoveEntity {
                entity: EntityId::Unit(gone),
            });
        }
    }

    fn reconcile_structures(
        &mut self,
        reported: &OrderedEntries<StructureId, StructureData>,
        out: &mut Vec<RenderCommand>,
    ) {
        let mut next = BTreeMap::new();
        for (&id, data) in reported.iter() {
            let entity = EntityId::Structure(id);
            match self.structures.remove(&id) {
                Some(existing) if existing.position() != data.position => {
                    out.push(RenderCommand::MoveEntity {
                        entity,
                        to: data.position,
                    });
                }
                Some(_) => {}
                None => out.push(RenderCommand::SpawnEntity {
                    entity,
                    hex: data.position,
                }),
            }
            let _ = next.insert(id, Structure::from_data(id, data));
        }

        for gone in std::mem::replace(&mut self.structures, next).into_keys() {
            out.push(RenderCommand::RemoveEntity {
                entity: EntityId::Structure(gone),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use circles_core::{EntityId, HexCoord, StructureId, UnitId};

    use super::{GameState, Hero, HexGrid, Structure, Unit};

    /// Provides read-only access to the board.
    #[must_use]
    pub fn grid(state: &GameState) -> &HexGrid {
        &state.grid
    }

    /// Provides read-only access to the hero.
    #[must_use]
    pub fn hero(state: &GameState) -> &Hero {
        &state.hero
    }

    /// Looks up a unit by id.
    #[must_use]
    pub fn unit(state: &GameState, id: UnitId) -> Option<&Unit> {
        state.units.get(&id)
    }

    /// Iterator over the units ordered by id.
    pub fn units(state: &GameState) -> impl Iterator<Item = &Unit> {
        state.units.values()
    }

    /// Looks up a structure by id.
    #[must_use]
    pub fn structure(state: &GameState, id: StructureId) -> Option<&Structure> {
        state.structures.get(&id)
    }

    /// Iterator over the structures ordered by id.
    pub fn structures(state: &GameState) -> impl Iterator<Item = &Structure> {
        state.structures.values()
    }

    /// Entity currently positioned on the hex, if any.
    ///
    /// Resolution relies on entity positions rather than occupancy tags, since
    /// a response's board diff may already reflect the end of the turn.
    #[must_use]
    pub fn entity_at(state: &GameState, hex: HexCoord) -> Option<EntityId> {
        if state.hero.position() == hex {
            return Some(EntityId::Hero);
        }
        if let Some(unit) = state.units.values().find(|unit| unit.position() == hex) {
            return Some(EntityId::Unit(unit.pk()));
        }
        state
            .structures
            .values()
            .find(|structure| structure.position() == hex)
            .map(|structure| EntityId::Structure(structure.id()))
    }

    /// Hex the entity stands on.
    #[must_use]
    pub fn entity_position(state: &GameState, entity: EntityId) -> Option<HexCoord> {
        match entity {
            EntityId::Hero => Some(state.hero.position()),
            EntityId::Unit(id) => state.units.get(&id).map(Unit::position),
            EntityId::Structure(id) => state.structures.get(&id).map(Structure::position),
        }
    }

    /// Shortest walkable path between two hexes; empty when unreachable.
    #[must_use]
    pub fn find_path(state: &GameState, source: HexCoord, target: HexCoord) -> Vec<HexCoord> {
        super::pathfinding::find_path(&state.grid, source, target)
    }
}

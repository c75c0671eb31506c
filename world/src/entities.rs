//! Positioned actors tracked by the world.

use std::collections::{BTreeMap, BTreeSet};

use circles_core::{
    wire::{CombatStats, HeroData, SpellParams, StructureData, UnitData},
    ActionKind, HexCoord, Slot, StructureId, UnitId,
};

use crate::grid::HexGrid;

const HERO_ATTACKABLE: &[Slot] = &[Slot::Empty, Slot::Unit];
const UNIT_ATTACKABLE: &[Slot] = &[Slot::Empty, Slot::Hero];
const WALKABLE: &[Slot] = &[Slot::Empty];

/// Hexes reachable within `move_range`.
fn derive_moves(grid: &HexGrid, position: HexCoord, move_range: u32) -> BTreeSet<HexCoord> {
    grid.hexes_in_range(position, move_range, Some(WALKABLE))
        .into_iter()
        .collect()
}

fn supplied_or(
    supplied: Option<&Vec<HexCoord>>,
    derive: impl FnOnce() -> BTreeSet<HexCoord>,
) -> BTreeSet<HexCoord> {
    match supplied {
        Some(hexes) => hexes.iter().copied().collect(),
        None => derive(),
    }
}

/// The player's singleton hero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hero {
    position: HexCoord,
    stats: CombatStats,
    moves: BTreeSet<HexCoord>,
    attack_hexes: BTreeSet<HexCoord>,
    range_attack_hexes: BTreeSet<HexCoord>,
    spells: BTreeMap<String, SpellParams>,
}

impl Hero {
    pub(crate) fn from_data(data: &HeroData, grid: &HexGrid) -> Self {
        let mut hero = Self {
            position: data.position,
            stats: data.stats,
            moves: BTreeSet::new(),
            attack_hexes: BTreeSet::new(),
            range_attack_hexes: BTreeSet::new(),
            spells: BTreeMap::new(),
        };
        hero.update(data, grid);
        hero
    }

    /// Overwrites every field from an authoritative payload.
    pub(crate) fn update(&mut self, data: &HeroData, grid: &HexGrid) {
        self.position = data.position;
        self.stats = data.stats;
        self.spells = data.spells.clone();
        let attack_range = self.stats.attack_range;
        let ranged_band = attack_range.saturating_add(1);
        self.moves = supplied_or(data.moves.as_ref(), || {
            derive_moves(grid, data.position, data.stats.move_range)
        });
        self.attack_hexes = supplied_or(data.attack_hexes.as_ref(), || {
            grid.hexes_in_range(data.position, attack_range, Some(HERO_ATTACKABLE))
                .into_iter()
                .collect()
        });
        self.range_attack_hexes = supplied_or(data.range_attack_hexes.as_ref(), || {
            grid.hexes_at_distance(data.position, ranged_band, Some(HERO_ATTACKABLE))
                .into_iter()
                .collect()
        });
    }

    /// Recomputes the derived hex sets from the current board.
    pub(crate) fn refresh(&mut self, grid: &HexGrid) {
        let attack_range = self.stats.attack_range;
        let ranged_band = attack_range.saturating_add(1);
        self.moves = derive_moves(grid, self.position, self.stats.move_range);
        self.attack_hexes = grid
            .hexes_in_range(self.position, attack_range, Some(HERO_ATTACKABLE))
            .into_iter()
            .collect();
        self.range_attack_hexes = grid
            .hexes_at_distance(self.position, ranged_band, Some(HERO_ATTACKABLE))
            .into_iter()
            .collect();
    }

    pub(crate) fn relocate(&mut self, to: HexCoord) {
        self.position = to;
    }

    pub(crate) fn take_damage(&mut self, amount: i32) {
        self.stats.health = self.stats.health.saturating_sub(amount);
    }

    /// Hex the hero stands on.
    #[must_use]
    pub const fn position(&self) -> HexCoord {
        self.position
    }

    /// Combat statistics.
    #[must_use]
    pub const fn stats(&self) -> &CombatStats {
        &self.stats
    }

    /// Hexes the hero can walk to this turn.
    #[must_use]
    pub const fn moves(&self) -> &BTreeSet<HexCoord> {
        &self.moves
    }

    /// Hexes inside melee reach.
    #[must_use]
    pub const fn attack_hexes(&self) -> &BTreeSet<HexCoord> {
        &self.attack_hexes
    }

    /// Hexes one band beyond melee reach.
    #[must_use]
    pub const fn range_attack_hexes(&self) -> &BTreeSet<HexCoord> {
        &self.range_attack_hexes
    }

    /// Known spells keyed by code name.
    #[must_use]
    pub const fn spells(&self) -> &BTreeMap<String, SpellParams> {
        &self.spells
    }

    /// Parameters of a known spell.
    #[must_use]
    pub fn spell(&self, kind: ActionKind) -> Option<&SpellParams> {
        self.spells.get(kind.as_str())
    }

    /// Reports whether the hero may arm the action.
    ///
    /// Non-spell actions are always available.
    #[must_use]
    pub fn knows(&self, kind: ActionKind) -> bool {
        !kind.is_spell() || self.spell(kind).is_some()
    }
}

/// A hostile unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pk: UnitId,
    name: Option<String>,
    position: HexCoord,
    stats: CombatStats,
    moves: BTreeSet<HexCoord>,
    attack_hexes: BTreeSet<HexCoord>,
}

impl Unit {
    pub(crate) fn from_data(data: &UnitData, grid: &HexGrid) -> Self {
        let mut unit = Self {
            pk: data.pk,
            name: None,
            position: data.position,
            stats: data.stats,
            moves: BTreeSet::new(),
            attack_hexes: BTreeSet::new(),
        };
        unit.update(data, grid);
        unit
    }

    pub(crate) fn update(&mut self, data: &UnitData, grid: &HexGrid) {
        self.name = data.name.clone();
        self.position = data.position;
        self.stats = data.stats;
        self.moves = supplied_or(data.moves.as_ref(), || {
            derive_moves(grid, data.position, data.stats.move_range)
        });
        self.attack_hexes = supplied_or(data.attack_hexes.as_ref(), || {
            grid.hexes_in_range(data.position, data.stats.attack_range, Some(UNIT_ATTACKABLE))
                .into_iter()
                .collect()
        });
    }

    pub(crate) fn refresh(&mut self, grid: &HexGrid) {
        self.moves = derive_moves(grid, self.position, self.stats.move_range);
        self.attack_hexes = grid
            .hexes_in_range(self.position, self.stats.attack_range, Some(UNIT_ATTACKABLE))
            .into_iter()
            .collect();
    }

    pub(crate) fn relocate(&mut self, to: HexCoord) {
        self.position = to;
    }

    pub(crate) fn take_damage(&mut self, amount: i32) {
        self.stats.health = self.stats.health.saturating_sub(amount);
    }

    /// Stable external id.
    #[must_use]
    pub const fn pk(&self) -> UnitId {
        self.pk
    }

    /// Display name, when the server supplies one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Hex the unit stands on.
    #[must_use]
    pub const fn position(&self) -> HexCoord {
        self.position
    }

    /// Combat statistics.
    #[must_use]
    pub const fn stats(&self) -> &CombatStats {
        &self.stats
    }

    /// Hexes the unit can walk to.
    #[must_use]
    pub const fn moves(&self) -> &BTreeSet<HexCoord> {
        &self.moves
    }

    /// Hexes the unit threatens.
    #[must_use]
    pub const fn attack_hexes(&self) -> &BTreeSet<HexCoord> {
        &self.attack_hexes
    }
}

/// Non-combat object bound to a hex, such as an exit or a shop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    id: StructureId,
    position: HexCoord,
    code_name: String,
}

impl Structure {
    pub(crate) fn from_data(id: StructureId, data: &StructureData) -> Self {
        Self {
            id,
            position: data.position,
            code_name: data.code_name.clone(),
        }
    }

    /// Identifier of the structure.
    #[must_use]
    pub const fn id(&self) -> StructureId {
        self.id
    }

    /// Hex the structure is bound to.
    #[must_use]
    pub const fn position(&self) -> HexCoord {
        self.position
    }

    /// Kind of structure.
    #[must_use]
    pub fn code_name(&self) -> &str {
        &self.code_name
    }
}

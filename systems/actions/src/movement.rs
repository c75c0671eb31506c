//! The resting `move` action and its click law.

use std::collections::BTreeSet;

use circles_core::{ActionKind, ActionRequest, EntityId, HexCoord, TargetId, UnitId};
use circles_world::{query, GameState};
use tracing::debug;

use crate::{ActionContext, ActionDefinition, Intent, Scratch};

/// Walks the hero, and routes unit clicks to the attack band they fall in.
///
/// A click on a hex within `move_range` submits a move straight away. A click
/// further out previews a path; clicking the same destination again commits
/// to the reachable prefix of that path. Units within melee reach are
/// attacked, units one band further are shot at, and anything beyond falls
/// back to the path preview.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveDefinition;

impl MoveDefinition {
    fn click_hex(&self, ctx: &mut ActionContext<'_>, hex: HexCoord) -> Intent {
        let hero = query::hero(ctx.state);
        if hex == hero.position() {
            return Intent::Ignore;
        }
        if let Some(EntityId::Unit(unit)) = query::entity_at(ctx.state, hex) {
            return self.click_unit(ctx, unit);
        }
        if hero.position().distance(hex) <= hero.stats().move_range {
            return Intent::Submit(ActionRequest::at_hex(ActionKind::Move, hex));
        }
        self.long_path(ctx, hex)
    }

    fn click_unit(&self, ctx: &mut ActionContext<'_>, unit: UnitId) -> Intent {
        let Some(position) = query::unit(ctx.state, unit).map(|unit| unit.position()) else {
            return Intent::Ignore;
        };
        let hero = query::hero(ctx.state);
        let distance = hero.position().distance(position);
        let attack_range = hero.stats().attack_range;
        if distance <= attack_range {
            Intent::Submit(ActionRequest::against_unit(ActionKind::Attack, unit))
        } else if distance == attack_range.saturating_add(1) {
            Intent::Submit(ActionRequest::against_unit(ActionKind::RangeAttack, unit))
        } else {
            self.long_path(ctx, position)
        }
    }

    /// Commits to a previewed destination or previews a new one.
    fn long_path(&self, ctx: &mut ActionContext<'_>, destination: HexCoord) -> Intent {
        if let Scratch::Path(path) = &*ctx.scratch {
            if path.last() == Some(&destination) {
                return match reachable_hex(ctx.state, path) {
                    Some(hex) => Intent::Submit(ActionRequest::at_hex(ActionKind::Move, hex)),
                    None => Intent::Ignore,
                };
            }
        }

        let hero = query::hero(ctx.state).position();
        let path = query::find_path(ctx.state, hero, destination);
        if path.is_empty() {
            debug!(%destination, "no route for path preview");
            ctx.scratch.discard(ctx.out);
        } else {
            debug!(%destination, steps = path.len(), "path preview rebuilt");
            ctx.scratch.replace(Scratch::Path(path), ctx.out);
        }
        Intent::Preview
    }
}

/// Hex of the path nearest the hero, which the hero can always walk to.
///
/// Paths exclude the hero's own hex, so this is the first element. A path
/// whose first element is not empty (a unit standing next to the hero) has
/// no reachable hex.
fn reachable_hex(state: &GameState, path: &[HexCoord]) -> Option<HexCoord> {
    let grid = query::grid(state);
    path.first()
        .copied()
        .filter(|hex| grid.occupancy(*hex).is_some_and(|occupancy| occupancy.is_empty()))
}

impl ActionDefinition for MoveDefinition {
    fn kind(&self) -> ActionKind {
        ActionKind::Move
    }

    fn target_filter(&self, state: &GameState) -> BTreeSet<TargetId> {
        let hexes = query::grid(state).coords().map(TargetId::Hex);
        let units = query::units(state).map(|unit| TargetId::Entity(EntityId::Unit(unit.pk())));
        let structures = query::structures(state)
            .map(|structure| TargetId::Entity(EntityId::Structure(structure.id())));
        hexes.chain(units).chain(structures).collect()
    }

    fn relocates_actor(&self) -> bool {
        true
    }

    fn click(&self, ctx: &mut ActionContext<'_>, target: TargetId) -> Intent {
        match target {
            TargetId::Hex(hex) => self.click_hex(ctx, hex),
            TargetId::Entity(EntityId::Unit(unit)) => self.click_unit(ctx, unit),
            TargetId::Entity(EntityId::Structure(id)) => {
                match query::structure(ctx.state, id).map(|structure| structure.position()) {
                    Some(hex) => self.click_hex(ctx, hex),
                    None => Intent::Ignore,
                }
            }
            TargetId::Entity(EntityId::Hero) => Intent::Ignore,
        }
    }

    fn build_request(&self, state: &GameState, target: TargetId) -> Option<ActionRequest> {
        crate::target_hex(state, target).map(|hex| ActionRequest::at_hex(ActionKind::Move, hex))
    }
}

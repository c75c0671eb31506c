//! Melee and ranged strikes against units.

use std::collections::BTreeSet;

use circles_core::{ActionKind, ActionRequest, EntityId, Overlay, RenderCommand, TargetId};
use circles_world::{query, GameState};

use crate::{ActionContext, ActionDefinition, Scratch};

/// Distance band an attack reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackBand {
    /// Units on the hero's `attack_hexes`.
    Melee,
    /// Units on the hero's `range_attack_hexes`.
    Ranged,
}

/// Strike against a single unit inside one distance band.
#[derive(Clone, Copy, Debug)]
pub struct AttackDefinition {
    band: AttackBand,
}

impl AttackDefinition {
    /// Creates the attack for the provided band.
    #[must_use]
    pub const fn new(band: AttackBand) -> Self {
        Self { band }
    }

    /// Band the attack reaches.
    #[must_use]
    pub const fn band(&self) -> AttackBand {
        self.band
    }
}

impl ActionDefinition for AttackDefinition {
    fn kind(&self) -> ActionKind {
        match self.band {
            AttackBand::Melee => ActionKind::Attack,
            AttackBand::Ranged => ActionKind::RangeAttack,
        }
    }

    fn target_filter(&self, state: &GameState) -> BTreeSet<TargetId> {
        let hero = query::hero(state);
        let band = match self.band {
            AttackBand::Melee => hero.attack_hexes(),
            AttackBand::Ranged => hero.range_attack_hexes(),
        };
        query::units(state)
            .filter(|unit| band.contains(&unit.position()))
            .map(|unit| TargetId::Entity(EntityId::Unit(unit.pk())))
            .collect()
    }

    fn target_overlay(&self) -> Option<Overlay> {
        Some(Overlay::AttackTarget)
    }

    fn hover(&self, ctx: &mut ActionContext<'_>, target: TargetId) {
        let Some(hex) = crate::target_hex(ctx.state, target) else {
            return;
        };
        if *ctx.scratch == Scratch::Focus(hex) {
            return;
        }
        // Hand the previous focus back its target marker.
        self.leave(ctx, target);
        ctx.out.push(RenderCommand::HideOverlay {
            overlay: Overlay::AttackTarget,
            hexes: vec![hex],
        });
        ctx.scratch.replace(Scratch::Focus(hex), ctx.out);
    }

    fn leave(&self, ctx: &mut ActionContext<'_>, _target: TargetId) {
        if let Scratch::Focus(hex) = *ctx.scratch {
            ctx.scratch.discard(ctx.out);
            ctx.out.push(RenderCommand::ShowOverlay {
                overlay: Overlay::AttackTarget,
                hexes: vec![hex],
            });
        }
    }

    fn build_request(&self, _state: &GameState, target: TargetId) -> Option<ActionRequest> {
        match target {
            TargetId::Entity(EntityId::Unit(unit)) => {
                Some(ActionRequest::against_unit(self.kind(), unit))
            }
            _ => None,
        }
    }
}

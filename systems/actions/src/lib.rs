#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Catalog of player actions: targeting rules, request building and the
//! replay of authoritative action steps.
//!
//! Each action is an immutable [`ActionDefinition`] value. The controller
//! owns every piece of transient state (the legal target set and the
//! action's [`Scratch`]) and lends it to the definition through an
//! [`ActionContext`] whenever it forwards input.

mod attack;
mod movement;
mod spells;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use circles_core::{
    ActionKind, ActionRequest, ActionStep, EffectPayload, EntityId, HexCoord, Overlay,
    RenderCommand, TargetId,
};
use circles_world::{query, GameState};
use tracing::warn;

pub use attack::{AttackBand, AttackDefinition};
pub use movement::MoveDefinition;
pub use spells::{SpellDefinition, SpellShape};

/// Action-specific working data kept between input events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Scratch {
    /// Nothing is previewed.
    #[default]
    Idle,
    /// A movement path from the hero towards its last element.
    Path(Vec<HexCoord>),
    /// Hexes a hovered spell would affect.
    Preview(Vec<HexCoord>),
    /// Attack target under the pointer.
    Focus(HexCoord),
}

impl Scratch {
    /// Overlay layer and hexes currently drawn for the preview.
    fn drawn(&self) -> Option<(Overlay, &[HexCoord])> {
        match self {
            Self::Idle => None,
            Self::Path(path) => Some((Overlay::Path, path.as_slice())),
            Self::Preview(hexes) => Some((Overlay::Secondary, hexes.as_slice())),
            Self::Focus(hex) => Some((Overlay::FocusedAttackTarget, std::slice::from_ref(hex))),
        }
    }

    /// Hides whatever preview is drawn and forgets it.
    pub fn discard(&mut self, out: &mut Vec<RenderCommand>) {
        if let Some((overlay, hexes)) = self.drawn() {
            if !hexes.is_empty() {
                out.push(RenderCommand::HideOverlay {
                    overlay,
                    hexes: hexes.to_vec(),
                });
            }
        }
        *self = Self::Idle;
    }

    /// Replaces the current preview and draws the new one.
    pub fn replace(&mut self, next: Scratch, out: &mut Vec<RenderCommand>) {
        self.discard(out);
        if let Some((overlay, hexes)) = next.drawn() {
            if !hexes.is_empty() {
                out.push(RenderCommand::ShowOverlay {
                    overlay,
                    hexes: hexes.to_vec(),
                });
            }
        }
        *self = next;
    }
}

/// Borrowed view handed to a definition while it handles input.
#[derive(Debug)]
pub struct ActionContext<'a> {
    /// Current world state.
    pub state: &'a GameState,
    /// Legal targets computed when the action was armed.
    pub targets: &'a BTreeSet<TargetId>,
    /// The armed action's working data.
    pub scratch: &'a mut Scratch,
    /// Render directives produced while handling the event.
    pub out: &'a mut Vec<RenderCommand>,
}

/// What a click asks the controller to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Send the request to the server.
    Submit(ActionRequest),
    /// Only the local preview changed.
    Preview,
    /// The click had no effect.
    Ignore,
}

/// Targeting and resolution contract shared by every action.
pub trait ActionDefinition: fmt::Debug {
    /// Action this definition implements.
    fn kind(&self) -> ActionKind;

    /// Targets the action accepts in the provided state.
    fn target_filter(&self, state: &GameState) -> BTreeSet<TargetId>;

    /// Overlay the controller draws on every target's hex while the action
    /// is armed.
    fn target_overlay(&self) -> Option<Overlay> {
        None
    }

    /// Whether resolving a step moves the acting entity onto the step's hex.
    fn relocates_actor(&self) -> bool {
        false
    }

    /// Installs action-specific highlighting after the action is armed.
    fn activate(&self, _ctx: &mut ActionContext<'_>) {}

    /// Removes action-specific highlighting and clears the scratch data.
    fn deactivate(&self, ctx: &mut ActionContext<'_>) {
        ctx.scratch.discard(ctx.out);
    }

    /// Handles a click on one of the action's targets.
    fn click(&self, ctx: &mut ActionContext<'_>, target: TargetId) -> Intent {
        match self.build_request(ctx.state, target) {
            Some(request) => Intent::Submit(request),
            None => Intent::Ignore,
        }
    }

    /// Handles the pointer entering one of the action's targets.
    fn hover(&self, _ctx: &mut ActionContext<'_>, _target: TargetId) {}

    /// Handles the pointer leaving one of the action's targets.
    fn leave(&self, _ctx: &mut ActionContext<'_>, _target: TargetId) {}

    /// Request aimed at the target, if the target can be addressed.
    fn build_request(&self, state: &GameState, target: TargetId) -> Option<ActionRequest>;

    /// Applies authoritative steps performed by `actor`, strictly in order.
    fn resolve(
        &self,
        state: &mut GameState,
        actor: EntityId,
        steps: &[ActionStep],
        out: &mut Vec<RenderCommand>,
    ) {
        resolve_steps(self.kind(), self.relocates_actor(), state, actor, steps, out);
    }
}

/// Hex a target refers to.
#[must_use]
pub fn target_hex(state: &GameState, target: TargetId) -> Option<HexCoord> {
    match target {
        TargetId::Hex(hex) => Some(hex),
        TargetId::Entity(entity) => query::entity_position(state, entity),
    }
}

/// Replays steps against the world in array order.
///
/// Each step damages and then pushes whatever stands on its hex, moves the
/// actor when the action relocates it, and asks the renderer to play the
/// step's effect. Steps landing outside the board are skipped.
pub fn resolve_steps(
    action: ActionKind,
    relocates_actor: bool,
    state: &mut GameState,
    actor: EntityId,
    steps: &[ActionStep],
    out: &mut Vec<RenderCommand>,
) {
    for (sequence, step) in steps.iter().enumerate() {
        let hex = step.target_hex;
        if !query::grid(state).contains(hex) {
            warn!(%action, %hex, "skipping step outside the board");
            continue;
        }

        let struck = query::entity_at(state, hex).filter(|entity| *entity != actor);
        if let (Some(damage), Some(entity)) = (step.damage, struck) {
            let _ = state.apply_damage(entity, damage);
        }
        if let (Some(to), Some(entity)) = (step.pushed_to, struck) {
            let _ = state.relocate(entity, to, out);
        }
        if relocates_actor {
            let _ = state.relocate(actor, hex, out);
        }

        out.push(RenderCommand::PlayEffect {
            actor,
            action,
            target: hex,
            payload: EffectPayload {
                damage: step.damage,
                pushed_to: step.pushed_to,
                main_target: step.main_target,
                sequence,
            },
        });
    }
}

/// Lookup table of the armed-able actions.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    definitions: BTreeMap<ActionKind, Box<dyn ActionDefinition>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let _ = registry.register(Box::new(MoveDefinition));
        let _ = registry.register(Box::new(AttackDefinition::new(AttackBand::Melee)));
        let _ = registry.register(Box::new(AttackDefinition::new(AttackBand::Ranged)));
        let _ = registry.register(Box::new(SpellDefinition::path_of_fire()));
        let _ = registry.register(Box::new(SpellDefinition::shield_bash()));
        let _ = registry.register(Box::new(SpellDefinition::blink()));
        registry
    }

    /// Registers a definition, returning the one it replaces.
    pub fn register(
        &mut self,
        definition: Box<dyn ActionDefinition>,
    ) -> Option<Box<dyn ActionDefinition>> {
        self.definitions.insert(definition.kind(), definition)
    }

    /// Definition registered for the action.
    #[must_use]
    pub fn get(&self, kind: ActionKind) -> Option<&dyn ActionDefinition> {
        self.definitions.get(&kind).map(Box::as_ref)
    }

    /// Definition registered under a wire name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn ActionDefinition> {
        name.parse().ok().and_then(|kind| self.get(kind))
    }

    /// Actions in catalog order.
    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.definitions.keys().copied()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use circles_core::{wire::GameSnapshot, RenderCommand};
    use circles_world::GameState;
    use serde_json::{json, Value};

    /// Radius 4 board with the hero at the centre and `move_range` 1.
    pub(crate) fn state_with(hexes: Value, units: Value) -> GameState {
        state_with_move_range(1, hexes, units)
    }

    /// Radius 4 board with the hero at the centre.
    pub(crate) fn state_with_move_range(move_range: u32, hexes: Value, units: Value) -> GameState {
        let snapshot: GameSnapshot = serde_json::from_value(json!({
            "board": {"radius": 4, "hexes": hexes},
            "hero": {
                "position": "0;0", "health": 20, "damage": 4,
                "attack_range": 1, "move_range": move_range,
                "spells": {"path_of_fire": {}, "shield_bash": {}, "blink": {"radius": 2}}
            },
            "units": units
        }))
        .expect("snapshot fixture");
        let mut sink: Vec<RenderCommand> = Vec::new();
        GameState::load(&snapshot, &mut sink).expect("load")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circles_core::UnitId;
    use serde_json::json;

    #[test]
    fn standard_registry_covers_the_catalog() {
        let registry = ActionRegistry::standard();
        assert_eq!(registry.kinds().collect::<Vec<_>>(), ActionKind::ALL.to_vec());
        assert_eq!(
            registry.lookup("shield_bash").map(|d| d.kind()),
            Some(ActionKind::ShieldBash)
        );
        assert!(registry.lookup("fireball").is_none());
    }

    #[test]
    fn scratch_replacement_hides_previous_preview() {
        let mut scratch = Scratch::Idle;
        let mut out = Vec::new();
        scratch.replace(Scratch::Path(vec![HexCoord::new(1, 0)]), &mut out);
        scratch.replace(Scratch::Preview(vec![HexCoord::new(0, 1)]), &mut out);
        scratch.discard(&mut out);
        assert_eq!(
            out,
            vec![
                RenderCommand::ShowOverlay {
                    overlay: Overlay::Path,
                    hexes: vec![HexCoord::new(1, 0)],
                },
                RenderCommand::HideOverlay {
                    overlay: Overlay::Path,
                    hexes: vec![HexCoord::new(1, 0)],
                },
                RenderCommand::ShowOverlay {
                    overlay: Overlay::Secondary,
                    hexes: vec![HexCoord::new(0, 1)],
                },
                RenderCommand::HideOverlay {
                    overlay: Overlay::Secondary,
                    hexes: vec![HexCoord::new(0, 1)],
                },
            ]
        );
        assert_eq!(scratch, Scratch::Idle);
    }

    #[test]
    fn steps_apply_in_order_with_pushes() {
        let mut state = fixtures::state_with(
            json!([{"q": 0, "r": 0, "slot": "hero"}, {"q": 1, "r": 0, "slot": "unit:3"}]),
            json!({"3": {"pk": 3, "position": "1;0", "health": 10}}),
        );
        let steps = vec![
            ActionStep::at(HexCoord::new(1, 0))
                .with_damage(4)
                .with_push(HexCoord::new(2, 0))
                .as_main_target(),
            ActionStep::at(HexCoord::new(2, 0)).with_damage(3),
        ];
        let mut out = Vec::new();
        resolve_steps(
            ActionKind::ShieldBash,
            false,
            &mut state,
            EntityId::Hero,
            &steps,
            &mut out,
        );

        let unit = query::unit(&state, UnitId::new(3)).expect("unit");
        assert_eq!(unit.stats().health, 3, "second step must find the pushed unit");
        assert_eq!(unit.position(), HexCoord::new(2, 0));
        let sequences: Vec<usize> = out
            .iter()
            .filter_map(|command| match command {
                RenderCommand::PlayEffect { payload, .. } => Some(payload.sequence),
                _ => None,
            })
            .collect();
        assert_eq!(sequences, vec![0, 1]);
    }

    #[test]
    fn relocating_actions_walk_the_actor() {
        let mut state = fixtures::state_with(json!([{"q": 0, "r": 0, "slot": "hero"}]), json!({}));
        let steps = vec![
            ActionStep::at(HexCoord::new(1, 0)),
            ActionStep::at(HexCoord::new(2, 0)),
            ActionStep::at(HexCoord::new(7, 0)),
        ];
        let mut out = Vec::new();
        resolve_steps(ActionKind::Move, true, &mut state, EntityId::Hero, &steps, &mut out);
        assert_eq!(query::hero(&state).position(), HexCoord::new(2, 0));
        assert_eq!(
            out.iter()
                .filter(|command| matches!(command, RenderCommand::PlayEffect { .. }))
                .count(),
            2,
            "off-board steps are skipped"
        );
    }
}

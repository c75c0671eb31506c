#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! State machine that arms one action at a time, routes pointer input to it
//! and replays server responses into the world.

use std::collections::BTreeSet;

use circles_core::{
    wire::{ActionResponse, ActorActions},
    ActionKind, ActionOutcome, ActionRequest, EntityId, HexCoord, Overlay, RenderCommand, TargetId,
};
use circles_system_actions::{target_hex, ActionContext, ActionRegistry, Intent, Scratch};
use circles_world::{query, GameState};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons an action could not be armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// No definition is registered for the action.
    #[error("action `{0}` is not registered")]
    Unregistered(ActionKind),
    /// The hero does not know the spell.
    #[error("the hero does not know `{0}`")]
    UnknownSpell(ActionKind),
}

/// Everything the controller produced while handling one event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbox {
    /// Requests for the network client.
    pub requests: Vec<ActionRequest>,
    /// Directives for the renderer.
    pub render: Vec<RenderCommand>,
}

/// Generic target overlay installed when an action is armed.
#[derive(Clone, Debug, Default)]
struct TargetMarks {
    overlay: Option<Overlay>,
    hexes: Vec<HexCoord>,
}

/// Arms exactly one action at a time; `move` is the resting action.
#[derive(Debug)]
pub struct ActionController {
    registry: ActionRegistry,
    armed: ActionKind,
    targets: BTreeSet<TargetId>,
    marks: TargetMarks,
    scratch: Scratch,
    pending: Option<ActionRequest>,
}

impl ActionController {
    /// Creates a controller with `move` armed.
    pub fn new(
        registry: ActionRegistry,
        state: &GameState,
        out: &mut Vec<RenderCommand>,
    ) -> Result<Self, ControllerError> {
        if registry.get(ActionKind::Move).is_none() {
            return Err(ControllerError::Unregistered(ActionKind::Move));
        }
        let mut controller = Self {
            registry,
            armed: ActionKind::Move,
            targets: BTreeSet::new(),
            marks: TargetMarks::default(),
            scratch: Scratch::Idle,
            pending: None,
        };
        controller.activate(state, out);
        Ok(controller)
    }

    /// Action currently capturing input.
    #[must_use]
    pub const fn armed(&self) -> ActionKind {
        self.armed
    }

    /// Legal targets of the armed action.
    #[must_use]
    pub const fn targets(&self) -> &BTreeSet<TargetId> {
        &self.targets
    }

    /// Working data of the armed action.
    #[must_use]
    pub const fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// Request awaiting its response, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&ActionRequest> {
        self.pending.as_ref()
    }

    /// Arms another action.
    ///
    /// Re-arming the armed action does nothing. Otherwise the current action
    /// is torn down completely before the new one computes its targets and
    /// installs its highlighting.
    pub fn change_action(
        &mut self,
        state: &GameState,
        kind: ActionKind,
        out: &mut Vec<RenderCommand>,
    ) -> Result<(), ControllerError> {
        if kind == self.armed {
            return Ok(());
        }
        if self.registry.get(kind).is_none() {
            return Err(ControllerError::Unregistered(kind));
        }
        if !query::hero(state).knows(kind) {
            return Err(ControllerError::UnknownSpell(kind));
        }

        self.deactivate(state, out);
        debug!(from = %self.armed, to = %kind, "re-arming");
        self.armed = kind;
        self.activate(state, out);
        Ok(())
    }

    fn deactivate(&mut self, state: &GameState, out: &mut Vec<RenderCommand>) {
        if let Some(definition) = self.registry.get(self.armed) {
            let mut ctx = ActionContext {
                state,
                targets: &self.targets,
                scratch: &mut self.scratch,
                out,
            };
            definition.deactivate(&mut ctx);
        }
        self.common_deactivate(out);
    }

    /// Clears target bookkeeping that no single action owns.
    fn common_deactivate(&mut self, out: &mut Vec<RenderCommand>) {
        let marks = std::mem::take(&mut self.marks);
        if let Some(overlay) = marks.overlay {
            if !marks.hexes.is_empty() {
                out.push(RenderCommand::HideOverlay {
                    overlay,
                    hexes: marks.hexes,
                });
            }
        }
        self.targets.clear();
        self.scratch = Scratch::Idle;
    }

    fn activate(&mut self, state: &GameState, out: &mut Vec<RenderCommand>) {
        let Some(definition) = self.registry.get(self.armed) else {
            return;
        };
        self.targets = definition.target_filter(state);

        let overlay = definition.target_overlay();
        let hexes: BTreeSet<HexCoord> = self
            .targets
            .iter()
            .filter_map(|target| target_hex(state, *target))
            .collect();
        self.marks = TargetMarks {
            overlay,
            hexes: hexes.into_iter().collect(),
        };
        if let Some(overlay) = overlay {
            if !self.marks.hexes.is_empty() {
                out.push(RenderCommand::ShowOverlay {
                    overlay,
                    hexes: self.marks.hexes.clone(),
                });
            }
        }

        let mut ctx = ActionContext {
            state,
            targets: &self.targets,
            scratch: &mut self.scratch,
            out,
        };
        definition.activate(&mut ctx);
        debug!(action = %self.armed, targets = self.targets.len(), "armed");
    }

    /// Routes a click.
    ///
    /// A click outside the target set re-arms `move` when another action is
    /// armed and hands the click to it if `move` accepts the target.
    pub fn click(&mut self, state: &GameState, target: TargetId, out: &mut Outbox) {
        if !self.targets.contains(&target) {
            if self.armed == ActionKind::Move {
                debug!(?target, "click outside the target set ignored");
                return;
            }
            if let Err(error) = self.change_action(state, ActionKind::Move, &mut out.render) {
                warn!(%error, "unable to return to move");
                return;
            }
            if !self.targets.contains(&target) {
                return;
            }
        }

        let Some(definition) = self.registry.get(self.armed) else {
            return;
        };
        let mut ctx = ActionContext {
            state,
            targets: &self.targets,
            scratch: &mut self.scratch,
            out: &mut out.render,
        };
        if let Intent::Submit(request) = definition.click(&mut ctx, target) {
            self.submit(request, out);
        }
    }

    /// Routes the pointer entering a target.
    pub fn hover(&mut self, state: &GameState, target: TargetId, out: &mut Vec<RenderCommand>) {
        if !self.targets.contains(&target) {
            return;
        }
        if let Some(definition) = self.registry.get(self.armed) {
            let mut ctx = ActionContext {
                state,
                targets: &self.targets,
                scratch: &mut self.scratch,
                out,
            };
            definition.hover(&mut ctx, target);
        }
    }

    /// Routes the pointer leaving a target.
    pub fn leave(&mut self, state: &GameState, target: TargetId, out: &mut Vec<RenderCommand>) {
        if !self.targets.contains(&target) {
            return;
        }
        if let Some(definition) = self.registry.get(self.armed) {
            let mut ctx = ActionContext {
                state,
                targets: &self.targets,
                scratch: &mut self.scratch,
                out,
            };
            definition.leave(&mut ctx, target);
        }
    }

    fn submit(&mut self, request: ActionRequest, out: &mut Outbox) {
        if let Some(pending) = &self.pending {
            warn!(?request, ?pending, "request already in flight, dropping submission");
            return;
        }
        info!(action = %request.action, target = ?request.target, "submitting request");
        self.pending = Some(request);
        out.requests.push(request);
    }

    /// Applies the server's answer to the in-flight request.
    ///
    /// A failure never mutates the world. A success applies the board diff,
    /// then the hero's actions, then every unit's actions in the order the
    /// response lists them, then reconciles entities. Both paths end with
    /// `move` armed.
    pub fn handle_response(
        &mut self,
        state: &mut GameState,
        response: &ActionResponse,
        out: &mut Vec<RenderCommand>,
    ) {
        self.pending = None;
        self.scratch.discard(out);

        if !response.is_success() {
            info!("request rejected by the server");
            self.return_to_move(state, out);
            return;
        }

        let changed = state.apply_board(&response.board, out);
        self.resolve_actor(state, EntityId::Hero, &response.hero_actions, out);
        for (&unit, actions) in response.units_actions.iter() {
            self.resolve_actor(state, EntityId::Unit(unit), actions, out);
        }
        state.reconcile_entities(response, out);
        info!(changed, "response applied");

        if self.armed == ActionKind::Move {
            if let Some(definition) = self.registry.get(ActionKind::Move) {
                self.targets = definition.target_filter(state);
            }
        } else {
            self.return_to_move(state, out);
        }
    }

    fn return_to_move(&mut self, state: &GameState, out: &mut Vec<RenderCommand>) {
        if let Err(error) = self.change_action(state, ActionKind::Move, out) {
            warn!(%error, "unable to return to move");
        }
    }

    fn resolve_actor(
        &self,
        state: &mut GameState,
        actor: EntityId,
        actions: &ActorActions,
        out: &mut Vec<RenderCommand>,
    ) {
        for (name, steps) in actions.iter() {
            let Some(definition) = self.registry.lookup(name) else {
                warn!(action = %name, ?actor, "skipping unknown action");
                continue;
            };
            match ActionOutcome::from_steps(steps.clone()) {
                ActionOutcome::NoOp => debug!(action = %name, ?actor, "no-op action"),
                ActionOutcome::Resolved(steps) => {
                    debug!(action = %name, ?actor, steps = steps.len(), "resolving");
                    definition.resolve(state, actor, &steps, out);
                }
            }
        }
    }
}

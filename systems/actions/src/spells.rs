//! Spells the hero can cast.

use std::collections::BTreeSet;

use circles_core::{
    ActionKind, ActionRequest, EntityId, HexCoord, Occupancy, Overlay, Slot, TargetId,
};
use circles_world::{query, GameState};

use crate::{ActionContext, ActionDefinition, Scratch};

/// Geometry of a spell's targets and hover preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellShape {
    /// Directional ray from the hero through the hovered hex.
    Ray,
    /// Ring around the hovered hex, limited to the spell's own targets.
    Ring,
    /// Single landing hex for the caster.
    Blink,
}

impl SpellShape {
    const fn allowed_slots(self) -> &'static [Slot] {
        match self {
            Self::Ray => &[Slot::Empty, Slot::Unit],
            Self::Ring => &[Slot::Empty, Slot::Unit, Slot::Obstacle],
            Self::Blink => &[Slot::Empty],
        }
    }
}

/// Spell bound to a target disk around the hero.
#[derive(Clone, Copy, Debug)]
pub struct SpellDefinition {
    kind: ActionKind,
    shape: SpellShape,
    default_radius: u32,
    default_path_length: u32,
}

impl SpellDefinition {
    /// Creates a spell definition.
    #[must_use]
    pub const fn new(
        kind: ActionKind,
        shape: SpellShape,
        default_radius: u32,
        default_path_length: u32,
    ) -> Self {
        Self {
            kind,
            shape,
            default_radius,
            default_path_length,
        }
    }

    /// Fire ray travelling up to four hexes.
    #[must_use]
    pub const fn path_of_fire() -> Self {
        Self::new(ActionKind::PathOfFire, SpellShape::Ray, 1, 4)
    }

    /// Adjacent bash that may push what it strikes.
    #[must_use]
    pub const fn shield_bash() -> Self {
        Self::new(ActionKind::ShieldBash, SpellShape::Ring, 1, 0)
    }

    /// Teleport onto an empty hex.
    #[must_use]
    pub const fn blink() -> Self {
        Self::new(ActionKind::Blink, SpellShape::Blink, 3, 0)
    }

    /// Geometry of the spell.
    #[must_use]
    pub const fn shape(&self) -> SpellShape {
        self.shape
    }

    fn radius(&self, state: &GameState) -> Option<u32> {
        query::hero(state)
            .spell(self.kind)
            .map(|params| params.radius.unwrap_or(self.default_radius))
    }

    fn path_length(&self, state: &GameState) -> u32 {
        query::hero(state)
            .spell(self.kind)
            .and_then(|params| params.path_length)
            .unwrap_or(self.default_path_length)
    }

    fn preview(&self, ctx: &ActionContext<'_>, hovered: HexCoord) -> Vec<HexCoord> {
        let hero = query::hero(ctx.state).position();
        let grid = query::grid(ctx.state);
        match self.shape {
            SpellShape::Ray => {
                let (dq, dr) = (hovered.q() - hero.q(), hovered.r() - hero.r());
                if (dq, dr) == (0, 0) {
                    return Vec::new();
                }
                let length = i32::try_from(self.path_length(ctx.state)).unwrap_or(i32::MAX);
                let mut ray = Vec::new();
                for step in 1..=length {
                    let hex = hero.offset(dq * step, dr * step);
                    match grid.occupancy(hex) {
                        None | Some(Occupancy::Obstacle) => break,
                        Some(_) => ray.push(hex),
                    }
                }
                ray
            }
            SpellShape::Ring => grid
                .hexes_in_range(hovered, 1, None)
                .into_iter()
                .filter(|hex| *hex != hero && ctx.targets.contains(&TargetId::Hex(*hex)))
                .collect(),
            SpellShape::Blink => vec![hovered],
        }
    }
}

impl ActionDefinition for SpellDefinition {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    fn target_filter(&self, state: &GameState) -> BTreeSet<TargetId> {
        let Some(radius) = self.radius(state) else {
            return BTreeSet::new();
        };
        let grid = query::grid(state);
        let hero = query::hero(state).position();
        let mut targets = BTreeSet::new();
        for hex in grid.hexes_in_range(hero, radius, Some(self.shape.allowed_slots())) {
            let _ = targets.insert(TargetId::Hex(hex));
            if let Some(Occupancy::Unit(unit)) = grid.occupancy(hex) {
                let _ = targets.insert(TargetId::Entity(EntityId::Unit(unit)));
            }
        }
        targets
    }

    fn target_overlay(&self) -> Option<Overlay> {
        Some(Overlay::SpellTarget)
    }

    fn relocates_actor(&self) -> bool {
        self.shape == SpellShape::Blink
    }

    fn hover(&self, ctx: &mut ActionContext<'_>, target: TargetId) {
        let Some(hovered) = crate::target_hex(ctx.state, target) else {
            return;
        };
        let preview = self.preview(ctx, hovered);
        ctx.scratch.replace(Scratch::Preview(preview), ctx.out);
    }

    fn leave(&self, ctx: &mut ActionContext<'_>, _target: TargetId) {
        ctx.scratch.discard(ctx.out);
    }

    fn build_request(&self, state: &GameState, target: TargetId) -> Option<ActionRequest> {
        crate::target_hex(state, target).map(|hex| ActionRequest::at_hex(self.kind, hex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::state_with, Intent};
    use circles_core::{ActionStep, RenderCommand, UnitId};
    use serde_json::json;

    fn battlefield() -> GameState {
        state_with(
            json!([
                {"q": 0, "r": 0, "slot": "hero"},
                {"q": 1, "r": 0, "slot": "unit:1"},
                {"q": 3, "r": 0, "slot": "obstacle"},
                {"q": 0, "r": -1, "slot": "obstacle"}
            ]),
            json!({"1": {"pk": 1, "position": "1;0", "health": 9}}),
        )
    }

    struct Cast {
        state: GameState,
        targets: BTreeSet<TargetId>,
        scratch: Scratch,
        out: Vec<RenderCommand>,
    }

    impl Cast {
        fn new(spell: &SpellDefinition) -> Self {
            let state = battlefield();
            let targets = spell.target_filter(&state);
            Self {
                state,
                targets,
                scratch: Scratch::Idle,
                out: Vec::new(),
            }
        }

        fn context(&mut self) -> ActionContext<'_> {
            ActionContext {
                state: &self.state,
                targets: &self.targets,
                scratch: &mut self.scratch,
                out: &mut self.out,
            }
        }
    }

    #[test]
    fn fire_targets_skip_obstacles_and_include_units() {
        let spell = SpellDefinition::path_of_fire();
        let cast = Cast::new(&spell);
        assert!(cast.targets.contains(&TargetId::Hex(HexCoord::new(1, 0))));
        assert!(cast
            .targets
            .contains(&TargetId::Entity(EntityId::Unit(UnitId::new(1)))));
        assert!(!cast.targets.contains(&TargetId::Hex(HexCoord::new(0, -1))));
        assert!(!cast.targets.contains(&TargetId::Hex(HexCoord::new(0, 0))));
        assert_eq!(cast.targets.len(), 5 + 1, "five open hexes and one unit");
    }

    #[test]
    fn fire_ray_stops_before_first_obstacle() {
        let spell = SpellDefinition::path_of_fire();
        let mut cast = Cast::new(&spell);
        let mut ctx = cast.context();
        spell.hover(&mut ctx, TargetId::Hex(HexCoord::new(1, 0)));
        assert_eq!(
            cast.scratch,
            Scratch::Preview(vec![HexCoord::new(1, 0), HexCoord::new(2, 0)])
        );

        let mut ctx = cast.context();
        spell.hover(&mut ctx, TargetId::Hex(HexCoord::new(-1, 1)));
        assert_eq!(
            cast.scratch,
            Scratch::Preview(vec![
                HexCoord::new(-1, 1),
                HexCoord::new(-2, 2),
                HexCoord::new(-3, 3),
            ]),
            "the ray is cut at the board edge"
        );

        let mut ctx = cast.context();
        spell.leave(&mut ctx, TargetId::Hex(HexCoord::new(-1, 1)));
        assert_eq!(cast.scratch, Scratch::Idle);
    }

    #[test]
    fn bash_ring_is_limited_to_targets() {
        let spell = SpellDefinition::shield_bash();
        let mut cast = Cast::new(&spell);
        assert!(cast.targets.contains(&TargetId::Hex(HexCoord::new(0, -1))), "obstacles can be bashed");

        let mut ctx = cast.context();
        spell.hover(&mut ctx, TargetId::Entity(EntityId::Unit(UnitId::new(1))));
        let Scratch::Preview(ring) = &cast.scratch else {
            panic!("expected a ring preview");
        };
        let ring: BTreeSet<HexCoord> = ring.iter().copied().collect();
        assert_eq!(
            ring,
            BTreeSet::from([HexCoord::new(1, 0), HexCoord::new(1, -1), HexCoord::new(0, 1)])
        );
    }

    #[test]
    fn blink_lands_only_on_empty_hexes_and_moves_the_caster() {
        let spell = SpellDefinition::blink();
        let mut cast = Cast::new(&spell);
        assert!(!cast.targets.contains(&TargetId::Hex(HexCoord::new(1, 0))));
        assert!(!cast
            .targets
            .iter()
            .any(|target| matches!(target, TargetId::Entity(_))));
        assert!(cast
            .targets
            .iter()
            .all(|target| matches!(target, TargetId::Hex(hex) if hex.distance_from_center() <= 2)));

        let destination = TargetId::Hex(HexCoord::new(-2, 1));
        let mut ctx = cast.context();
        assert_eq!(
            spell.click(&mut ctx, destination),
            Intent::Submit(ActionRequest::at_hex(ActionKind::Blink, HexCoord::new(-2, 1)))
        );

        let mut out = Vec::new();
        spell.resolve(
            &mut cast.state,
            EntityId::Hero,
            &[ActionStep::at(HexCoord::new(-2, 1))],
            &mut out,
        );
        assert_eq!(query::hero(&cast.state).position(), HexCoord::new(-2, 1));
    }

    #[test]
    fn unknown_spells_have_no_targets() {
        let spell = SpellDefinition::new(ActionKind::Blink, SpellShape::Blink, 3, 0);
        let state = state_with(json!([]), json!({}));
        assert!(!spell.target_filter(&state).is_empty());

        let snapshot: circles_core::wire::GameSnapshot = serde_json::from_value(json!({
            "board": {"radius": 2},
            "hero": {"position": "0;0", "health": 5}
        }))
        .expect("snapshot");
        let mut sink = Vec::new();
        let unskilled = GameState::load(&snapshot, &mut sink).expect("load");
        assert!(spell.target_filter(&unskilled).is_empty());
    }
}

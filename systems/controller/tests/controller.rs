use circles_core::{
    wire::{ActionResponse, GameSnapshot},
    ActionKind, ActionRequest, EntityId, HexCoord, Occupancy, Overlay, RenderCommand, TargetId,
    UnitId,
};
use circles_system_actions::{ActionRegistry, Scratch};
use circles_system_controller::{ActionController, Outbox};
use circles_world::{query, GameState};
use serde_json::{json, Value};

fn load(value: Value) -> GameState {
    let snapshot: GameSnapshot = serde_json::from_value(value).expect("snapshot fixture");
    let mut sink = Vec::new();
    GameState::load(&snapshot, &mut sink).expect("load")
}

fn controller_for(state: &GameState) -> ActionController {
    let mut sink = Vec::new();
    ActionController::new(ActionRegistry::standard(), state, &mut sink).expect("controller")
}

fn hero_at_center() -> GameState {
    load(json!({
        "board": {"radius": 3, "hexes": [{"q": 0, "r": 0, "slot": "hero"}]},
        "hero": {
            "position": "0;0", "health": 20, "attack_range": 1, "move_range": 1,
            "spells": {"blink": {"radius": 2}}
        }
    }))
}

fn hex(q: i32, r: i32) -> TargetId {
    TargetId::Hex(HexCoord::new(q, r))
}

fn unit(pk: u32) -> TargetId {
    TargetId::Entity(EntityId::Unit(UnitId::new(pk)))
}

fn response(value: Value) -> ActionResponse {
    serde_json::from_value(value).expect("response fixture")
}

#[test]
fn adjacent_click_submits_move_without_preview() {
    let state = hero_at_center();
    let mut controller = controller_for(&state);
    let mut out = Outbox::default();

    controller.click(&state, hex(1, 0), &mut out);

    assert_eq!(out.requests.len(), 1);
    assert_eq!(
        serde_json::to_value(out.requests[0]).expect("serialize"),
        json!({"action": "move", "target": "1;0"})
    );
    assert_eq!(controller.scratch(), &Scratch::Idle, "no preview is built");
}

#[test]
fn distant_click_previews_and_second_click_commits() {
    let state = hero_at_center();
    let mut controller = controller_for(&state);
    let mut out = Outbox::default();

    controller.click(&state, hex(2, 0), &mut out);
    assert!(out.requests.is_empty(), "the first click only previews");
    assert_eq!(
        controller.scratch(),
        &Scratch::Path(vec![HexCoord::new(1, 0), HexCoord::new(2, 0)])
    );

    controller.click(&state, hex(2, 0), &mut out);
    assert_eq!(
        out.requests,
        vec![ActionRequest::at_hex(ActionKind::Move, HexCoord::new(1, 0))],
        "the second click commits to the reachable predecessor"
    );
}

#[test]
fn unit_clicks_pick_attack_band_by_distance() {
    let state = load(json!({
        "board": {"radius": 3, "hexes": [
            {"q": -1, "r": 0, "slot": "hero"},
            {"q": 0, "r": 0, "slot": "unit:1"},
            {"q": 1, "r": 0, "slot": "unit:2"},
            {"q": 2, "r": 0, "slot": "unit:3"}
        ]},
        "hero": {"position": "-1;0", "health": 20, "attack_range": 1, "move_range": 1},
        "units": {
            "1": {"pk": 1, "position": "0;0", "health": 5},
            "2": {"pk": 2, "position": "1;0", "health": 5},
            "3": {"pk": 3, "position": "2;0", "health": 5}
        }
    }));

    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller.click(&state, unit(1), &mut out);
    assert_eq!(
        out.requests,
        vec![ActionRequest::against_unit(ActionKind::Attack, UnitId::new(1))]
    );

    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller.click(&state, unit(2), &mut out);
    assert_eq!(
        serde_json::to_value(out.requests[0]).expect("serialize"),
        json!({"action": "range_attack", "target": 2})
    );

    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller.click(&state, unit(3), &mut out);
    assert!(out.requests.is_empty(), "distance 3 never attacks");
    assert!(matches!(controller.scratch(), Scratch::Path(path) if path.last() == Some(&HexCoord::new(2, 0))));
}

#[test]
fn failed_response_leaves_world_untouched() {
    let mut state = hero_at_center();
    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller.click(&state, hex(2, 0), &mut out);
    controller.click(&state, hex(2, 0), &mut out);
    assert!(controller.pending().is_some());

    let mut render = Vec::new();
    controller.handle_response(
        &mut state,
        &response(json!({
            "action_data": {"state": "failure"},
            "board": {"hexes": [{"q": 0, "r": 0, "slot": "empty"}, {"q": 1, "r": 0, "slot": "hero"}]},
            "hero": {"position": "1;0", "health": 1}
        })),
        &mut render,
    );

    assert_eq!(query::hero(&state).position(), HexCoord::new(0, 0));
    assert_eq!(query::hero(&state).stats().health, 20);
    assert_eq!(query::grid(&state).occupancy(HexCoord::new(0, 0)), Some(Occupancy::Hero));
    assert_eq!(controller.armed(), ActionKind::Move);
    assert_eq!(controller.scratch(), &Scratch::Idle, "the preview is discarded");
    assert!(controller.pending().is_none());
    assert_eq!(
        render,
        vec![RenderCommand::HideOverlay {
            overlay: Overlay::Path,
            hexes: vec![HexCoord::new(1, 0), HexCoord::new(2, 0)],
        }]
    );
}

#[test]
fn successful_response_applies_diff_steps_and_reconciliation() {
    let mut state = load(json!({
        "board": {"radius": 3, "hexes": [
            {"q": 0, "r": 0, "slot": "hero"},
            {"q": 2, "r": 0, "slot": "unit:5"}
        ]},
        "hero": {
            "position": "0;0", "health": 20, "attack_range": 1, "move_range": 1,
            "spells": {"blink": {"radius": 2}}
        },
        "units": {"5": {"pk": 5, "position": "2;0", "health": 8}}
    }));
    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller
        .change_action(&state, ActionKind::Blink, &mut out.render)
        .expect("arm blink");
    controller.click(&state, hex(-1, 0), &mut out);
    assert_eq!(
        out.requests,
        vec![ActionRequest::at_hex(ActionKind::Blink, HexCoord::new(-1, 0))]
    );

    let mut render = Vec::new();
    controller.handle_response(
        &mut state,
        &response(json!({
            "action_data": {"state": "success"},
            "board": {"hexes": [
                {"q": 0, "r": 0, "slot": "empty"},
                {"q": -1, "r": 0, "slot": "hero"},
                {"q": 2, "r": 0, "slot": "empty"},
                {"q": 1, "r": 0, "slot": "unit:5"}
            ]},
            "hero_actions": {"blink": [{"target_hex": "-1;0"}]},
            "units_actions": {"5": {
                "move": [{"target_hex": "1;0"}],
                "attack": [{"target_hex": "-1;0", "damage": 3}]
            }},
            "units": {"5": {"pk": 5, "position": "1;0", "health": 8}}
        })),
        &mut render,
    );

    let hero = query::hero(&state);
    assert_eq!(hero.position(), HexCoord::new(-1, 0), "blink relocates the caster");
    assert_eq!(hero.stats().health, 17, "the unit's attack lands after the hero moved");
    assert_eq!(
        query::unit(&state, UnitId::new(5)).map(|unit| unit.position()),
        Some(HexCoord::new(1, 0))
    );
    assert_eq!(controller.armed(), ActionKind::Move);
    assert!(controller.pending().is_none());
    assert!(controller.targets().contains(&hex(0, 0)));

    let effects: Vec<(EntityId, ActionKind)> = render
        .iter()
        .filter_map(|command| match command {
            RenderCommand::PlayEffect { actor, action, .. } => Some((*actor, *action)),
            _ => None,
        })
        .collect();
    assert_eq!(
        effects,
        vec![
            (EntityId::Hero, ActionKind::Blink),
            (EntityId::Unit(UnitId::new(5)), ActionKind::Move),
            (EntityId::Unit(UnitId::new(5)), ActionKind::Attack),
        ]
    );
    assert!(
        render.iter().any(|command| matches!(
            command,
            RenderCommand::HideOverlay { overlay: Overlay::SpellTarget, .. }
        )),
        "returning to move removes the spell overlay"
    );
}

#[test]
fn clicking_outside_spell_targets_returns_to_move() {
    let state = hero_at_center();
    let mut controller = controller_for(&state);
    let mut out = Outbox::default();
    controller
        .change_action(&state, ActionKind::Blink, &mut out.render)
        .expect("arm blink");
    assert!(!controller.targets().contains(&hex(0, 0)));

    controller.click(&state, hex(0, 0), &mut out);
    assert_eq!(controller.armed(), ActionKind::Move);
    assert!(out.requests.is_empty(), "the hero's own hex is ignored by move");

    controller
        .change_action(&state, ActionKind::Blink, &mut out.render)
        .expect("arm blink");
    controller.click(&state, hex(1, 0), &mut out);
    assert_eq!(controller.armed(), ActionKind::Blink, "targets stay with the spell");
    assert_eq!(
        out.requests,
        vec![ActionRequest::at_hex(ActionKind::Blink, HexCoord::new(1, 0))]
    );
}

#[test]
fn hover_outside_targets_is_ignored() {
    let state = hero_at_center();
    let mut controller = controller_for(&state);
    let mut render = Vec::new();
    controller
        .change_action(&state, ActionKind::Blink, &mut render)
        .expect("arm blink");
    render.clear();

    controller.hover(&state, hex(0, 0), &mut render);
    assert!(render.is_empty());

    controller.hover(&state, hex(0, 1), &mut render);
    assert_eq!(controller.scratch(), &Scratch::Preview(vec![HexCoord::new(0, 1)]));
    controller.leave(&state, hex(0, 1), &mut render);
    assert_eq!(controller.scratch(), &Scratch::Idle);
}

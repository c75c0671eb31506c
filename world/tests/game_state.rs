use circles_core::{
    wire::{ActionResponse, GameSnapshot},
    EntityId, HexCoord, Occupancy, RenderCommand, StructureId, TileState, UnitId,
};
use circles_world::{query, GameState, LoadError};
use serde_json::json;

fn snapshot() -> GameSnapshot {
    serde_json::from_value(json!({
        "board": {
            "radius": 3,
            "hexes": [
                {"q": 0, "r": 0, "slot": "hero"},
                {"q": 1, "r": 0, "slot": "unit:7"},
                {"q": -1, "r": 0, "slot": "obstacle"},
                {"q": 0, "r": -2, "slot": "structure:1"}
            ]
        },
        "hero": {
            "position": "0;0", "health": 30, "armor": 2, "damage": 6,
            "attack_range": 1, "move_range": 2,
            "spells": {"blink": {"radius": 3}}
        },
        "units": {
            "7": {"pk": 7, "name": "imp", "position": "1;0", "health": 10, "damage": 3}
        },
        "structures": {
            "1": {"position": "0;-2", "code_name": "exit"}
        }
    }))
    .expect("snapshot fixture")
}

fn response(value: serde_json::Value) -> ActionResponse {
    serde_json::from_value(value).expect("response fixture")
}

#[test]
fn load_builds_board_and_entities() {
    let mut out = Vec::new();
    let state = GameState::load(&snapshot(), &mut out).expect("load");

    let grid = query::grid(&state);
    assert_eq!(grid.len(), 19, "radius 3 board holds 19 hexes");
    assert_eq!(grid.occupancy(HexCoord::new(-1, 0)), Some(Occupancy::Obstacle));
    assert_eq!(grid.occupancy(HexCoord::new(1, 1)), Some(Occupancy::Empty));

    let unit = query::unit(&state, UnitId::new(7)).expect("unit loaded");
    assert_eq!(unit.name(), Some("imp"));
    assert_eq!(
        query::structure(&state, StructureId::new(1)).map(|s| s.code_name()),
        Some("exit")
    );
    assert_eq!(
        query::entity_at(&state, HexCoord::new(1, 0)),
        Some(EntityId::Unit(UnitId::new(7)))
    );

    assert!(out.contains(&RenderCommand::SpawnEntity {
        entity: EntityId::Hero,
        hex: HexCoord::new(0, 0),
    }));
    assert!(out.contains(&RenderCommand::SetTileState {
        hex: HexCoord::new(-1, 0),
        state: TileState::Obstacle,
    }));
}

#[test]
fn derived_sets_follow_occupancy_when_omitted() {
    let mut out = Vec::new();
    let state = GameState::load(&snapshot(), &mut out).expect("load");
    let hero = query::hero(&state);

    assert!(!hero.moves().contains(&HexCoord::new(-1, 0)), "obstacles are not moves");
    assert!(!hero.moves().contains(&HexCoord::new(1, 0)), "units are not moves");
    assert!(hero.moves().contains(&HexCoord::new(2, -1)));
    assert!(hero.attack_hexes().contains(&HexCoord::new(1, 0)));
    assert!(hero.range_attack_hexes().iter().all(|hex| hex.distance_from_center() == 2));
    assert!(hero.knows(circles_core::ActionKind::Blink));
    assert!(!hero.knows(circles_core::ActionKind::PathOfFire));
}

#[test]
fn listed_hex_outside_board_fails_load() {
    let mut snapshot = snapshot();
    snapshot.board.hexes.push(circles_core::wire::BoardHex {
        q: 3,
        r: 0,
        slot: Occupancy::Obstacle,
    });
    let mut out = Vec::new();
    assert!(matches!(
        GameState::load(&snapshot, &mut out),
        Err(LoadError::Grid(_))
    ));
}

#[test]
fn board_diff_applied_twice_matches_once() {
    let mut out = Vec::new();
    let mut state = GameState::load(&snapshot(), &mut out).expect("load");
    let diff = response(json!({
        "action_data": {"state": "success"},
        "board": {"hexes": [
            {"q": 0, "r": 0, "slot": "empty"},
            {"q": 0, "r": 1, "slot": "hero"},
            {"q": 9, "r": 9, "slot": "obstacle"}
        ]}
    }));

    let mut first = Vec::new();
    assert_eq!(state.apply_board(&diff.board, &mut first), 2);
    let after_first: Vec<_> = query::grid(&state).iter().copied().collect();

    let mut second = Vec::new();
    assert_eq!(state.apply_board(&diff.board, &mut second), 0);
    let after_second: Vec<_> = query::grid(&state).iter().copied().collect();

    assert_eq!(after_first, after_second, "second application must not change occupancy");
    assert!(second.is_empty(), "second application must not toggle tile classes");
    assert_eq!(first.len(), 2);
}

#[test]
fn reconciliation_spawns_moves_and_removes_units() {
    let mut out = Vec::new();
    let mut state = GameState::load(&snapshot(), &mut out).expect("load");
    let update = response(json!({
        "action_data": {"state": "success"},
        "hero": {"position": "0;1", "health": 28, "attack_range": 1, "move_range": 2},
        "units": {
            "8": {"pk": 8, "position": "-2;1", "health": 4}
        }
    }));

    let mut commands = Vec::new();
    state.reconcile_entities(&update, &mut commands);

    assert_eq!(query::hero(&state).position(), HexCoord::new(0, 1));
    assert_eq!(query::hero(&state).stats().health, 28);
    assert!(query::unit(&state, UnitId::new(7)).is_none(), "absent units are removed");
    assert!(query::unit(&state, UnitId::new(8)).is_some());
    assert!(
        query::structure(&state, StructureId::new(1)).is_some(),
        "unreported structures are kept"
    );
    assert_eq!(
        commands,
        vec![
            RenderCommand::MoveEntity {
                entity: EntityId::Hero,
                to: HexCoord::new(0, 1),
            },
            RenderCommand::SpawnEntity {
                entity: EntityId::Unit(UnitId::new(8)),
                hex: HexCoord::new(-2, 1),
            },
            RenderCommand::RemoveEntity {
                entity: EntityId::Unit(UnitId::new(7)),
            },
        ]
    );
}

#[test]
fn damage_and_relocation_touch_entities_only() {
    let mut out = Vec::new();
    let mut state = GameState::load(&snapshot(), &mut out).expect("load");
    let unit = EntityId::Unit(UnitId::new(7));

    assert!(state.apply_damage(unit, 4));
    assert_eq!(query::unit(&state, UnitId::new(7)).map(|u| u.stats().health), Some(6));
    assert!(!state.apply_damage(EntityId::Structure(StructureId::new(1)), 4));

    let mut commands = Vec::new();
    assert!(state.relocate(unit, HexCoord::new(2, 0), &mut commands));
    assert_eq!(query::entity_position(&state, unit), Some(HexCoord::new(2, 0)));
    assert_eq!(
        query::grid(&state).occupancy(HexCoord::new(1, 0)),
        Some(Occupancy::Unit(UnitId::new(7))),
        "occupancy is left to the board diff"
    );
    assert!(!state.relocate(unit, HexCoord::new(5, 0), &mut commands));
    assert_eq!(commands.len(), 1);
}

#[test]
fn unbounded_attack_range_loads_without_a_ranged_band() {
    let mut snapshot = snapshot();
    snapshot.hero.stats.attack_range = u32::MAX;
    let mut out = Vec::new();
    let state = GameState::load(&snapshot, &mut out).expect("load");

    let hero = query::hero(&state);
    assert!(
        hero.attack_hexes().contains(&HexCoord::new(1, 0)),
        "the adjacent unit is in melee range"
    );
    assert!(
        hero.range_attack_hexes().is_empty(),
        "nothing lies beyond an unbounded range"
    );
}

#[test]
fn reconciled_unit_is_keyed_by_its_pk() {
    let mut out = Vec::new();
    let mut state = GameState::load(&snapshot(), &mut out).expect("load");
    let update = response(json!({
        "action_data": {"state": "success"},
        "units": {
            "99": {"pk": 7, "position": "1;0", "health": 5}
        }
    }));

    let mut commands = Vec::new();
    state.reconcile_entities(&update, &mut commands);

    assert!(query::unit(&state, UnitId::new(99)).is_none(), "the map key is not an id");
    assert_eq!(
        query::unit(&state, UnitId::new(7)).map(|unit| unit.stats().health),
        Some(5),
        "the unit named by pk is updated in place"
    );
    assert!(commands.is_empty(), "an in-place update emits nothing");
}

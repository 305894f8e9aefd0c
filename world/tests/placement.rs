use lane_defence_core::{
    BuildingKind, CellIndex, Command, Event, JoinError, Phase, PlacementError, PlayerIndex,
    SessionId, GRID_CELLS,
};
use lane_defence_world::{self as world, query, Rules, World};

fn seated_world(starting_gold: u32) -> World {
    let mut world = World::new(
        SessionId::new("lane001"),
        Rules {
            starting_gold,
            ..Rules::default()
        },
    );
    let mut events = Vec::new();
    world::apply(&mut world, Command::Join { username: "ann".into() }, &mut events);
    world::apply(&mut world, Command::Join { username: "bob".into() }, &mut events);
    world::apply(&mut world, Command::StartMatch, &mut events);
    world
}

fn place(world: &mut World, player: PlayerIndex, cell: u16, kind: BuildingKind) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::PlaceBuilding { player, cell, kind }, &mut events);
    events
}

fn gold_of(world: &World, player: PlayerIndex) -> u32 {
    query::player_view(world)
        .iter()
        .find(|snapshot| snapshot.index == player)
        .map(|snapshot| snapshot.gold)
        .expect("player seated")
}

#[test]
fn second_join_moves_session_into_countdown() {
    let mut world = World::new(SessionId::new("lane001"), Rules::default());
    let mut events = Vec::new();

    world::apply(&mut world, Command::Join { username: "ann".into() }, &mut events);
    assert_eq!(query::phase(&world), Phase::Waiting);

    world::apply(&mut world, Command::Join { username: "bob".into() }, &mut events);

    assert_eq!(query::phase(&world), Phase::Starting);
    assert_eq!(
        events,
        vec![
            Event::PlayerJoined {
                player: PlayerIndex::First,
                username: "ann".into(),
            },
            Event::PlayerJoined {
                player: PlayerIndex::Second,
                username: "bob".into(),
            },
            Event::MatchStarting {
                players: vec!["ann".into(), "bob".into()],
            },
        ]
    );
}

#[test]
fn rejoining_is_idempotent() {
    let mut world = seated_world(0);
    let mut events = Vec::new();

    world::apply(&mut world, Command::Join { username: "bob".into() }, &mut events);

    assert_eq!(
        events,
        vec![Event::PlayerRejoined {
            player: PlayerIndex::Second,
            username: "bob".into(),
        }]
    );
    assert_eq!(query::snapshot(&world).players.len(), 2);
}

#[test]
fn strangers_are_refused_once_seats_fill_or_match_runs() {
    let mut world = World::new(SessionId::new("lane001"), Rules::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::Join { username: "ann".into() }, &mut events);
    world::apply(&mut world, Command::Join { username: "bob".into() }, &mut events);
    events.clear();

    world::apply(&mut world, Command::Join { username: "cid".into() }, &mut events);
    assert_eq!(
        events,
        vec![Event::JoinRejected {
            username: "cid".into(),
            reason: JoinError::Full,
        }]
    );

    events.clear();
    world::apply(&mut world, Command::StartMatch, &mut events);
    world::apply(&mut world, Command::Join { username: "cid".into() }, &mut events);
    assert_eq!(
        events.last(),
        Some(&Event::JoinRejected {
            username: "cid".into(),
            reason: JoinError::InProgress,
        })
    );
}

#[test]
fn accepted_placement_deducts_price_and_fills_cell() {
    let mut world = seated_world(15);

    let events = place(&mut world, PlayerIndex::First, 3, BuildingKind::Barracks);

    assert!(matches!(
        events.as_slice(),
        [Event::BuildingPlaced {
            kind: BuildingKind::Barracks,
            owner: PlayerIndex::First,
            ..
        }]
    ));
    assert_eq!(gold_of(&world, PlayerIndex::First), 0);
    let building = query::building_at(&world, CellIndex::new(3).expect("in grid"))
        .expect("barracks placed");
    assert_eq!(building.health, 10);
    assert_eq!(building.max_health, 10);
}

#[test]
fn unaffordable_placement_changes_nothing() {
    let mut world = seated_world(15);
    let _ = place(&mut world, PlayerIndex::First, 3, BuildingKind::Barracks);

    let events = place(&mut world, PlayerIndex::First, 4, BuildingKind::Barracks);

    assert_eq!(
        events,
        vec![Event::PlacementRejected {
            player: PlayerIndex::First,
            cell: 4,
            kind: BuildingKind::Barracks,
            reason: PlacementError::InsufficientGold,
        }]
    );
    assert_eq!(gold_of(&world, PlayerIndex::First), 0);
    assert!(query::building_at(&world, CellIndex::new(4).expect("in grid")).is_none());
    assert_eq!(query::building_count(&world), 1);
}

#[test]
fn placement_respects_territory_occupancy_and_bounds() {
    let mut world = seated_world(100);

    let cases = [
        (PlayerIndex::First, 8, PlacementError::WrongTerritory),
        (PlayerIndex::Second, 7, PlacementError::WrongTerritory),
        (PlayerIndex::Second, 300, PlacementError::OutOfBounds),
    ];
    for (player, cell, expected) in cases {
        let events = place(&mut world, player, cell, BuildingKind::DefenseWall);
        assert!(
            matches!(events.as_slice(), [Event::PlacementRejected { reason, .. }] if *reason == expected),
            "cell {cell} for {player:?} should be rejected with {expected:?}, got {events:?}",
        );
    }

    let _ = place(&mut world, PlayerIndex::Second, 8, BuildingKind::DefenseWall);
    let events = place(&mut world, PlayerIndex::Second, 8, BuildingKind::DefenseWall);
    assert!(matches!(
        events.as_slice(),
        [Event::PlacementRejected {
            reason: PlacementError::Occupied,
            ..
        }]
    ));
    assert_eq!(gold_of(&world, PlayerIndex::Second), 90);
    assert_eq!(query::snapshot(&world).grid.len(), GRID_CELLS);
}

#[test]
fn farms_raise_income_on_placement() {
    let mut world = seated_world(35);

    let _ = place(&mut world, PlayerIndex::Second, 200, BuildingKind::Farm);

    let second = query::player_view(&world)
        .into_vec()
        .into_iter()
        .find(|snapshot| snapshot.index == PlayerIndex::Second)
        .expect("seated");
    assert_eq!(second.gold, 0);
    assert_eq!(second.gold_per_tick, 2);
}

#[test]
fn placement_is_refused_after_close() {
    let mut world = seated_world(100);
    let mut events = Vec::new();
    world::apply(&mut world, Command::Close, &mut events);

    let events = place(&mut world, PlayerIndex::First, 0, BuildingKind::DefenseWall);

    assert!(matches!(
        events.as_slice(),
        [Event::PlacementRejected {
            reason: PlacementError::GameOver,
            ..
        }]
    ));
}

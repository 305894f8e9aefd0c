#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Lane Defence.
//!
//! A [`World`] is one match: two seats, the lane grid, the units walking it,
//! both bases and the lifecycle phase. Nothing outside this crate mutates it;
//! every change flows through [`apply`], which validates the command, updates
//! state and reports what happened as [`Event`] values.

mod buildings;
mod grid;
mod units;

use std::time::Duration;

use lane_defence_core::{
    BaseSnapshot, BuildingId, BuildingKind, CellIndex, Command, Event, JoinError, Occupant,
    Phase, PlacementError, PlayerIndex, SessionId, UnitId,
};

use crate::{buildings::BuildingRegistry, grid::Grid, units::UnitRoster};

const DEFAULT_BASE_HEALTH: i32 = 300;
const DEFAULT_GOLD_PER_TICK: u32 = 1;
const SEATS: usize = 2;

/// Economy and base numbers applied to every session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Gold granted to each player when they take a seat.
    pub starting_gold: u32,
    /// Gold-per-tick each player starts with before any building bonus.
    pub base_gold_per_tick: u32,
    /// Initial and maximum health of each base.
    pub base_health: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_gold: 0,
            base_gold_per_tick: DEFAULT_GOLD_PER_TICK,
            base_health: DEFAULT_BASE_HEALTH,
        }
    }
}

/// Represents the authoritative state of a single Lane Defence session.
#[derive(Debug)]
pub struct World {
    id: SessionId,
    rules: Rules,
    phase: Phase,
    players: Vec<Player>,
    grid: Grid,
    buildings: BuildingRegistry,
    units: UnitRoster,
    bases: [Base; SEATS],
    round: Option<Round>,
    rounds_resolved: u64,
    game_over: bool,
    closed: bool,
    elapsed: Duration,
}

impl World {
    /// Creates an empty session waiting for its first player.
    #[must_use]
    pub fn new(id: SessionId, rules: Rules) -> Self {
        Self {
            id,
            phase: Phase::Waiting,
            players: Vec::with_capacity(SEATS),
            grid: Grid::new(),
            buildings: BuildingRegistry::new(),
            units: UnitRoster::new(),
            bases: [
                Base::new(rules.base_health),
                Base::new(rules.base_health),
            ],
            round: None,
            rounds_resolved: 0,
            game_over: false,
            closed: false,
            elapsed: Duration::ZERO,
            rules,
        }
    }

    fn join(&mut self, username: String, out_events: &mut Vec<Event>) {
        if self.closed {
            out_events.push(Event::JoinRejected {
                username,
                reason: JoinError::NotFound,
            });
            return;
        }

        if let Some(player) = self.seat_of(&username) {
            out_events.push(Event::PlayerRejoined { player, username });
            return;
        }

        let refusal = match self.phase {
            Phase::Finished => Some(JoinError::Finished),
            Phase::InProgress => Some(JoinError::InProgress),
            Phase::Waiting | Phase::Starting if self.players.len() >= SEATS => {
                Some(JoinError::Full)
            }
            Phase::Waiting | Phase::Starting => None,
        };
        if let Some(reason) = refusal {
            out_events.push(Event::JoinRejected { username, reason });
            return;
        }

        let Some(player) = PlayerIndex::from_slot(self.players.len()) else {
            return;
        };
        self.players.push(Player {
            username: username.clone(),
            gold: self.rules.starting_gold,
            gold_per_tick: self.rules.base_gold_per_tick,
        });
        out_events.push(Event::PlayerJoined { player, username });

        if self.players.len() == SEATS && self.phase == Phase::Waiting {
            self.phase = Phase::Starting;
            out_events.push(Event::MatchStarting {
                players: self
                    .players
                    .iter()
                    .map(|player| player.username.clone())
                    .collect(),
            });
        }
    }

    fn seat_of(&self, username: &str) -> Option<PlayerIndex> {
        self.players
            .iter()
            .position(|player| player.username == username)
            .and_then(PlayerIndex::from_slot)
    }

    fn player_mut(&mut self, player: PlayerIndex) -> Option<&mut Player> {
        self.players.get_mut(player.slot())
    }

    fn place_building(
        &mut self,
        player: PlayerIndex,
        raw_cell: u16,
        kind: BuildingKind,
    ) -> Result<(BuildingId, CellIndex), PlacementError> {
        if self.game_over || self.closed {
            return Err(PlacementError::GameOver);
        }

        let price = kind.price();
        let gold = self
            .players
            .get(player.slot())
            .map(|seat| seat.gold)
            .ok_or(PlacementError::UnknownPlayer)?;
        let cell = CellIndex::new(raw_cell).ok_or(PlacementError::OutOfBounds)?;

        if !player.owns_column(cell.column()) {
            return Err(PlacementError::WrongTerritory);
        }
        if !self.grid.is_free(cell) {
            return Err(PlacementError::Occupied);
        }
        if gold < price {
            return Err(PlacementError::InsufficientGold);
        }

        let bonus = kind.spec().gold_per_tick;
        if let Some(seat) = self.player_mut(player) {
            seat.gold -= price;
            seat.gold_per_tick = seat.gold_per_tick.saturating_add(bonus);
        }
        let building = self.buildings.insert(kind, player, cell);
        self.grid.occupy(
            cell,
            Occupant {
                building,
                owner: player,
            },
        );
        Ok((building, cell))
    }

    fn spawn_unit(&mut self, building: BuildingId, out_events: &mut Vec<Event>) {
        if self.game_over || self.closed {
            return;
        }
        let Some(state) = self.buildings.get(building) else {
            return;
        };
        let Some(profile) = state.kind.spec().spawn else {
            return;
        };

        let (owner, cell) = (state.owner, state.cell);
        let unit = self.units.spawn(profile.unit, owner, cell);
        out_events.push(Event::UnitSpawned {
            unit,
            kind: profile.unit,
            cell,
            owner,
        });
    }

    fn repair_base(&mut self, building: BuildingId, out_events: &mut Vec<Event>) {
        if self.game_over || self.closed {
            return;
        }
        let Some(state) = self.buildings.get(building) else {
            return;
        };
        let Some(profile) = state.kind.spec().repair else {
            return;
        };

        let player = state.owner;
        let base = &mut self.bases[player.slot()];
        if base.health >= base.max_health {
            return;
        }
        base.health = base.max_health.min(base.health + profile.amount);
        out_events.push(Event::BaseRepaired {
            player,
            health: base.health,
        });
    }

    fn begin_round(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::InProgress || self.round.is_some() || self.closed {
            return;
        }

        self.units.normalise_health();
        let number = self.rounds_resolved + 1;
        self.round = Some(Round {
            number,
            fallen: Vec::new(),
        });
        out_events.push(Event::RoundStarted { round: number });
    }

    /// Damage dealt by a unit, provided a round is open and the unit still exists.
    fn striker(&self, attacker: UnitId) -> Option<(PlayerIndex, i32)> {
        if self.round.is_none() {
            return None;
        }
        self.units
            .get(attacker)
            .map(|unit| (unit.owner, unit.kind.damage()))
    }

    fn strike_building(
        &mut self,
        attacker: UnitId,
        building: BuildingId,
        out_events: &mut Vec<Event>,
    ) {
        let Some((side, damage)) = self.striker(attacker) else {
            return;
        };
        let Some(state) = self.buildings.get_mut(building) else {
            return;
        };
        if state.owner == side {
            return;
        }

        state.health -= damage;
        if state.health > 0 {
            out_events.push(Event::BuildingDamaged {
                building,
                attacker,
                health: state.health,
            });
            return;
        }

        let Some(fallen) = self.buildings.remove(building) else {
            return;
        };
        self.grid.vacate(fallen.cell);
        let bonus = fallen.kind.spec().gold_per_tick;
        if let Some(seat) = self.player_mut(fallen.owner) {
            seat.gold_per_tick = seat.gold_per_tick.saturating_sub(bonus);
        }
        out_events.push(Event::BuildingDestroyed {
            building,
            kind: fallen.kind,
            cell: fallen.cell,
            owner: fallen.owner,
        });
    }

    fn strike_units(&mut self, attacker: UnitId, targets: Vec<UnitId>, out_events: &mut Vec<Event>) {
        let Some((side, damage)) = self.striker(attacker) else {
            return;
        };

        for target in targets {
            let Some(unit) = self.units.get_mut(target) else {
                continue;
            };
            if unit.owner == side {
                continue;
            }

            let health = unit.take_damage(damage);
            out_events.push(Event::UnitDamaged {
                unit: target,
                attacker,
                health,
            });
            if health <= 0 {
                if let Some(round) = self.round.as_mut() {
                    if !round.fallen.contains(&target) {
                        round.fallen.push(target);
                    }
                }
            }
        }
    }

    fn strike_base(&mut self, attacker: UnitId, base: PlayerIndex, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }
        let Some((side, damage)) = self.striker(attacker) else {
            return;
        };
        if side == base {
            return;
        }

        let target = &mut self.bases[base.slot()];
        target.health -= damage;
        out_events.push(Event::BaseDamaged {
            player: base,
            attacker,
            health: target.health,
        });

        if target.health <= 0 {
            self.game_over = true;
            self.phase = Phase::Finished;
            out_events.push(Event::GameOver { winner: side });
        }
    }

    fn advance_unit(&mut self, id: UnitId, to: CellIndex, out_events: &mut Vec<Event>) {
        if self.round.is_none() {
            return;
        }
        let Some(owner) = self.units.get(id).map(|unit| unit.owner) else {
            return;
        };
        // Enemies never share a cell; the mover has to fight its way in.
        if self
            .units
            .iter()
            .any(|other| other.cell == to && other.owner != owner)
        {
            return;
        }
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };

        let from = unit.cell;
        unit.cell = to;
        out_events.push(Event::UnitAdvanced { unit: id, from, to });
    }

    fn conclude_round(&mut self, out_events: &mut Vec<Event>) {
        let Some(round) = self.round.take() else {
            return;
        };

        for id in round.fallen {
            if let Some(unit) = self.units.remove(id) {
                out_events.push(Event::UnitDestroyed {
                    unit: id,
                    cell: unit.cell,
                });
            }
        }
        self.rounds_resolved = round.number;
        out_events.push(Event::RoundConcluded {
            round: round.number,
        });
    }

    fn accrue_gold(&mut self, player: PlayerIndex, amount: u32, out_events: &mut Vec<Event>) {
        if self.phase != Phase::InProgress || self.closed {
            return;
        }
        let Some(seat) = self.player_mut(player) else {
            return;
        };

        seat.gold = seat.gold.saturating_add(amount);
        out_events.push(Event::GoldAccrued {
            player,
            amount,
            balance: seat.gold,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Join { username } => world.join(username, out_events),
        Command::StartMatch => {
            if world.phase == Phase::Starting && !world.closed {
                world.phase = Phase::InProgress;
                out_events.push(Event::MatchStarted);
            }
        }
        Command::Tick { dt } => {
            if world.closed {
                return;
            }
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceBuilding { player, cell, kind } => {
            match world.place_building(player, cell, kind) {
                Ok((building, cell)) => out_events.push(Event::BuildingPlaced {
                    building,
                    kind,
                    cell,
                    owner: player,
                }),
                Err(reason) => out_events.push(Event::PlacementRejected {
                    player,
                    cell,
                    kind,
                    reason,
                }),
            }
        }
        Command::SpawnUnit { building } => world.spawn_unit(building, out_events),
        Command::RepairBase { building } => world.repair_base(building, out_events),
        Command::BeginRound => world.begin_round(out_events),
        Command::StrikeBuilding { attacker, building } => {
            world.strike_building(attacker, building, out_events);
        }
        Command::StrikeUnits { attacker, targets } => {
            world.strike_units(attacker, targets, out_events);
        }
        Command::StrikeBase { attacker, base } => world.strike_base(attacker, base, out_events),
        Command::AdvanceUnit { unit, to } => world.advance_unit(unit, to, out_events),
        Command::ConcludeRound => world.conclude_round(out_events),
        Command::AccrueGold { player, amount } => world.accrue_gold(player, amount, out_events),
        Command::Close => {
            if !world.closed {
                world.closed = true;
                world.round = None;
                out_events.push(Event::SessionClosed);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use lane_defence_core::{
        BaseSnapshot, BuildingId, BuildingSnapshot, CellIndex, OccupancyView, Phase,
        PlayerIndex, PlayerSnapshot, PlayerView, SessionId, SessionSnapshot, UnitView,
    };

    /// Identifier of the session.
    #[must_use]
    pub fn session_id(world: &World) -> &SessionId {
        &world.id
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Reports whether a base fell.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Reports whether the session was torn down.
    #[must_use]
    pub fn is_closed(world: &World) -> bool {
        world.closed
    }

    /// Number of rounds resolved so far.
    #[must_use]
    pub fn rounds_resolved(world: &World) -> u64 {
        world.rounds_resolved
    }

    /// Total session time accumulated from ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Seat held by the provided username, if any.
    #[must_use]
    pub fn player_index(world: &World, username: &str) -> Option<PlayerIndex> {
        world.seat_of(username)
    }

    /// Captures a read-only view of the seated players.
    #[must_use]
    pub fn player_view(world: &World) -> PlayerView {
        PlayerView::from_snapshots(players(world))
    }

    /// Captures a read-only view of the units in evaluation order.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Number of units alive in the lane.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.units.len()
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView::new(world.grid.cells())
    }

    /// Number of buildings standing in the lane.
    #[must_use]
    pub fn building_count(world: &World) -> usize {
        world.buildings.len()
    }

    /// Snapshot of a single building, if it still stands.
    #[must_use]
    pub fn building(world: &World, id: BuildingId) -> Option<BuildingSnapshot> {
        world.buildings.get(id).map(|state| state.snapshot())
    }

    /// Snapshot of the building on the provided cell, if any.
    #[must_use]
    pub fn building_at(world: &World, cell: CellIndex) -> Option<BuildingSnapshot> {
        world
            .grid
            .occupant(cell)
            .and_then(|occupant| building(world, occupant.building))
    }

    /// Snapshot of the base defended by the provided player.
    #[must_use]
    pub fn base(world: &World, player: PlayerIndex) -> BaseSnapshot {
        world.bases[player.slot()].snapshot(player)
    }

    /// Captures the full session state for distribution.
    #[must_use]
    pub fn snapshot(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            id: world.id.clone(),
            phase: world.phase,
            round: world.rounds_resolved,
            players: players(world),
            grid: CellIndex::all()
                .map(|cell| building_at(world, cell))
                .collect(),
            units: unit_view(world).into_vec(),
            bases: PlayerIndex::ALL
                .into_iter()
                .map(|player| base(world, player))
                .collect(),
            game_over: world.game_over,
        }
    }

    fn players(world: &World) -> Vec<PlayerSnapshot> {
        world
            .players
            .iter()
            .enumerate()
            .filter_map(|(slot, player)| {
                PlayerIndex::from_slot(slot).map(|index| PlayerSnapshot {
                    index,
                    username: player.username.clone(),
                    gold: player.gold,
                    gold_per_tick: player.gold_per_tick,
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
struct Player {
    username: String,
    gold: u32,
    gold_per_tick: u32,
}

#[derive(Clone, Copy, Debug)]
struct Base {
    health: i32,
    max_health: i32,
}

impl Base {
    const fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
        }
    }

    fn snapshot(&self, owner: PlayerIndex) -> BaseSnapshot {
        BaseSnapshot {
            owner,
            health: self.health,
            max_health: self.max_health,
        }
    }
}

/// Bookkeeping for the round currently being resolved.
#[derive(Clone, Debug)]
struct Round {
    number: u64,
    /// Units whose health dropped to zero; removed together when the round concludes.
    fallen: Vec<UnitId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{UnitKind, GRID_CELLS};

    fn running_world() -> World {
        let mut world = World::new(SessionId::new("abc1234"), Rules::default());
        let mut events = Vec::new();
        apply(&mut world, Command::Join { username: "ann".into() }, &mut events);
        apply(&mut world, Command::Join { username: "bob".into() }, &mut events);
        apply(&mut world, Command::StartMatch, &mut events);
        world
    }

    #[test]
    fn new_world_has_full_grid_and_fresh_bases() {
        let world = World::new(SessionId::new("abc1234"), Rules::default());
        let snapshot = query::snapshot(&world);

        assert_eq!(snapshot.grid.len(), GRID_CELLS);
        assert_eq!(snapshot.phase, Phase::Waiting);
        assert!(snapshot
            .bases
            .iter()
            .all(|base| base.health == 300 && base.max_health == 300));
    }

    #[test]
    fn begin_round_defaults_missing_unit_health() {
        let mut world = running_world();
        let cell = CellIndex::new(2).expect("in grid");
        let unit = world.units.spawn(UnitKind::Mage, PlayerIndex::First, cell);
        world.units.clear_health(unit);

        let mut events = Vec::new();
        apply(&mut world, Command::BeginRound, &mut events);

        assert_eq!(events, vec![Event::RoundStarted { round: 1 }]);
        assert_eq!(world.units.get(unit).and_then(|unit| unit.health), Some(10));
    }

    #[test]
    fn rounds_do_not_open_twice() {
        let mut world = running_world();
        let mut events = Vec::new();
        apply(&mut world, Command::BeginRound, &mut events);
        apply(&mut world, Command::BeginRound, &mut events);
        assert_eq!(events.len(), 1);

        apply(&mut world, Command::ConcludeRound, &mut events);
        apply(&mut world, Command::BeginRound, &mut events);
        assert_eq!(events.last(), Some(&Event::RoundStarted { round: 2 }));
    }

    #[test]
    fn close_is_reported_once() {
        let mut world = running_world();
        let mut events = Vec::new();
        apply(&mut world, Command::Close, &mut events);
        apply(&mut world, Command::Close, &mut events);
        apply(&mut world, Command::Tick { dt: Duration::from_secs(1) }, &mut events);

        assert_eq!(events, vec![Event::SessionClosed]);
        assert!(query::is_closed(&world));
    }
}

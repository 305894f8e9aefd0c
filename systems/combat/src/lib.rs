#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves one round of lane movement and combat.
//!
//! When a round opens the system reads the units and the occupancy grid as
//! they stood at that instant and decides, unit by unit in `(cell, id)`
//! order, whether the unit strikes a building, strikes units, strikes the
//! enemy base, steps forward or holds. Units that step forward earlier in the
//! round are recorded as [`Arrivals`], so a later enemy heading for the same
//! cell finds them there and strikes instead of sharing the cell. Decisions
//! are emitted as commands and the batch always ends with
//! `Command::ConcludeRound`.

use lane_defence_core::{
    BuildingId, CellIndex, Command, Event, OccupancyView, PlayerIndex, UnitId, UnitSnapshot,
    UnitView,
};

/// Outcome chosen for a single unit in a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// The candidate cell lies outside the grid.
    Hold,
    /// An enemy building stands on the candidate cell.
    StrikeBuilding(BuildingId),
    /// Enemy units stand on the candidate cell.
    StrikeUnits(Vec<UnitId>),
    /// The candidate cell lies past the enemy's home edge.
    StrikeBase(PlayerIndex),
    /// The candidate cell is free to enter.
    Advance(CellIndex),
    /// The unit already stands in its lane-end column.
    Wait,
}

/// Units that stepped onto a new cell earlier in the current round.
#[derive(Clone, Debug, Default)]
pub struct Arrivals {
    entered: Vec<(CellIndex, UnitId, PlayerIndex)>,
}

impl Arrivals {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes that `unit` moved onto `cell`.
    pub fn record(&mut self, unit: &UnitSnapshot, cell: CellIndex) {
        self.entered.push((cell, unit.id, unit.owner));
    }

    /// Units of `owner` that moved onto `cell` this round.
    pub fn on_cell(
        &self,
        cell: CellIndex,
        owner: PlayerIndex,
    ) -> impl Iterator<Item = UnitId> + '_ {
        self.entered
            .iter()
            .filter(move |(entered, _, side)| *entered == cell && *side == owner)
            .map(|(_, id, _)| *id)
    }

    /// Forgets every arrival.
    pub fn clear(&mut self) {
        self.entered.clear();
    }
}

/// Decides what a unit does this round.
///
/// `units` and `occupancy` describe the round as it opened; `arrivals` holds
/// the moves already granted to units evaluated before this one.
#[must_use]
pub fn decide(
    unit: &UnitSnapshot,
    units: &UnitView,
    arrivals: &Arrivals,
    occupancy: OccupancyView<'_>,
) -> Action {
    let Some(candidate) = unit.cell.step(unit.owner) else {
        return Action::Hold;
    };

    if let Some(occupant) = occupancy.occupant(candidate) {
        if occupant.owner != unit.owner {
            return Action::StrikeBuilding(occupant.building);
        }
    }

    let enemy = unit.owner.opponent();
    let mut targets: Vec<UnitId> = units
        .on_cell(candidate)
        .filter(|other| other.owner == enemy)
        .map(|other| other.id)
        .chain(arrivals.on_cell(candidate, enemy))
        .collect();
    if !targets.is_empty() {
        targets.sort_unstable();
        targets.dedup();
        return Action::StrikeUnits(targets);
    }

    if candidate.column() == unit.owner.breach_column() {
        return Action::StrikeBase(unit.owner.opponent());
    }

    if unit.cell.column() == unit.owner.lane_end_column() {
        return Action::Wait;
    }

    Action::Advance(candidate)
}

/// Combat system that plans every unit's action when a round opens.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
    arrivals: Arrivals,
}

impl Combat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the strike and advance commands for each `Event::RoundStarted`.
    pub fn handle(
        &mut self,
        events: &[Event],
        units: &UnitView,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        let rounds = events
            .iter()
            .filter(|event| matches!(event, Event::RoundStarted { .. }))
            .count();

        for _ in 0..rounds {
            self.plan(units, occupancy, out);
        }
    }

    fn plan(&mut self, units: &UnitView, occupancy: OccupancyView<'_>, out: &mut Vec<Command>) {
        self.scratch.clear();
        self.arrivals.clear();

        for unit in units.iter() {
            let attacker = unit.id;
            match decide(unit, units, &self.arrivals, occupancy) {
                Action::StrikeBuilding(building) => {
                    self.scratch
                        .push(Command::StrikeBuilding { attacker, building });
                }
                Action::StrikeUnits(targets) => {
                    self.scratch.push(Command::StrikeUnits { attacker, targets });
                }
                Action::StrikeBase(base) => {
                    self.scratch.push(Command::StrikeBase { attacker, base });
                }
                Action::Advance(to) => {
                    self.arrivals.record(unit, to);
                    self.scratch.push(Command::AdvanceUnit { unit: attacker, to });
                }
                Action::Hold | Action::Wait => {}
            }
        }
        self.scratch.push(Command::ConcludeRound);

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{Occupant, UnitKind, GRID_CELLS};

    fn unit(id: u32, owner: PlayerIndex, cell: u16) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: UnitKind::Warrior,
            owner,
            cell: CellIndex::new(cell).expect("in grid"),
            health: Some(15),
            max_health: 15,
            damage: 3,
        }
    }

    fn empty_grid() -> Vec<Option<Occupant>> {
        vec![None; GRID_CELLS]
    }

    #[test]
    fn building_takes_priority_over_units() {
        let mut cells = empty_grid();
        cells[5] = Some(Occupant {
            building: BuildingId::new(3),
            owner: PlayerIndex::Second,
        });
        let units = UnitView::from_snapshots(vec![
            unit(0, PlayerIndex::First, 4),
            unit(1, PlayerIndex::Second, 5),
        ]);
        let attacker = units.iter().next().copied().expect("unit");

        let action = decide(&attacker, &units, &Arrivals::new(), OccupancyView::new(&cells));

        assert_eq!(action, Action::StrikeBuilding(BuildingId::new(3)));
    }

    #[test]
    fn own_buildings_are_walked_past() {
        let mut cells = empty_grid();
        cells[5] = Some(Occupant {
            building: BuildingId::new(3),
            owner: PlayerIndex::First,
        });
        let units = UnitView::from_snapshots(vec![unit(0, PlayerIndex::First, 4)]);
        let attacker = units.iter().next().copied().expect("unit");

        let action = decide(&attacker, &units, &Arrivals::new(), OccupancyView::new(&cells));

        assert_eq!(
            action,
            Action::Advance(CellIndex::new(5).expect("in grid"))
        );
    }

    #[test]
    fn every_enemy_on_the_candidate_cell_is_targeted() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![
            unit(7, PlayerIndex::Second, 21),
            unit(2, PlayerIndex::Second, 21),
            unit(4, PlayerIndex::First, 21),
            unit(9, PlayerIndex::First, 20),
        ]);
        let attacker = unit(9, PlayerIndex::First, 20);

        let action = decide(&attacker, &units, &Arrivals::new(), OccupancyView::new(&cells));

        assert_eq!(
            action,
            Action::StrikeUnits(vec![UnitId::new(2), UnitId::new(7)])
        );
    }

    #[test]
    fn stepping_past_the_lane_end_strikes_the_enemy_base() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![
            unit(0, PlayerIndex::First, 31),
            unit(1, PlayerIndex::Second, 48),
        ]);
        let first = unit(0, PlayerIndex::First, 31);
        let second = unit(1, PlayerIndex::Second, 48);

        assert_eq!(
            decide(&first, &units, &Arrivals::new(), OccupancyView::new(&cells)),
            Action::StrikeBase(PlayerIndex::Second)
        );
        assert_eq!(
            decide(&second, &units, &Arrivals::new(), OccupancyView::new(&cells)),
            Action::StrikeBase(PlayerIndex::First)
        );
    }

    #[test]
    fn grid_corners_hold_position() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(Vec::new());

        assert_eq!(
            decide(
                &unit(0, PlayerIndex::First, 255),
                &units,
                &Arrivals::new(),
                OccupancyView::new(&cells)
            ),
            Action::Hold
        );
        assert_eq!(
            decide(
                &unit(1, PlayerIndex::Second, 0),
                &units,
                &Arrivals::new(),
                OccupancyView::new(&cells)
            ),
            Action::Hold
        );
    }

    #[test]
    fn earlier_arrivals_block_the_cell_for_enemies() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![
            unit(0, PlayerIndex::First, 6),
            unit(1, PlayerIndex::Second, 8),
        ]);
        let first = unit(0, PlayerIndex::First, 6);
        let second = unit(1, PlayerIndex::Second, 8);
        let contested = CellIndex::new(7).expect("in grid");
        let mut arrivals = Arrivals::new();

        assert_eq!(
            decide(&first, &units, &arrivals, OccupancyView::new(&cells)),
            Action::Advance(contested)
        );
        arrivals.record(&first, contested);

        assert_eq!(
            decide(&second, &units, &arrivals, OccupancyView::new(&cells)),
            Action::StrikeUnits(vec![UnitId::new(0)])
        );
    }

    #[test]
    fn friendly_arrivals_do_not_block() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![
            unit(0, PlayerIndex::First, 6),
            unit(1, PlayerIndex::First, 8),
        ]);
        let follower = unit(2, PlayerIndex::First, 6);
        let mut arrivals = Arrivals::new();
        let leader = unit(0, PlayerIndex::First, 6);
        arrivals.record(&leader, CellIndex::new(7).expect("in grid"));

        assert_eq!(
            decide(&follower, &units, &arrivals, OccupancyView::new(&cells)),
            Action::Advance(CellIndex::new(7).expect("in grid"))
        );
    }

    #[test]
    fn planned_advances_never_collide_with_enemies() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![
            unit(0, PlayerIndex::First, 6),
            unit(1, PlayerIndex::Second, 8),
        ]);
        let mut system = Combat::new();
        let mut out = Vec::new();

        system.handle(
            &[Event::RoundStarted { round: 2 }],
            &units,
            OccupancyView::new(&cells),
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Command::AdvanceUnit {
                    unit: UnitId::new(0),
                    to: CellIndex::new(7).expect("in grid"),
                },
                Command::StrikeUnits {
                    attacker: UnitId::new(1),
                    targets: vec![UnitId::new(0)],
                },
                Command::ConcludeRound,
            ]
        );
    }

    #[test]
    fn round_batch_always_concludes() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(Vec::new());
        let mut system = Combat::new();
        let mut out = Vec::new();

        system.handle(
            &[Event::RoundStarted { round: 1 }],
            &units,
            OccupancyView::new(&cells),
            &mut out,
        );

        assert_eq!(out, vec![Command::ConcludeRound]);
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let cells = empty_grid();
        let units = UnitView::from_snapshots(vec![unit(0, PlayerIndex::First, 4)]);
        let mut system = Combat::new();
        let mut out = Vec::new();

        system.handle(
            &[Event::RoundConcluded { round: 1 }, Event::MatchStarted],
            &units,
            OccupancyView::new(&cells),
            &mut out,
        );

        assert!(out.is_empty());
    }
}

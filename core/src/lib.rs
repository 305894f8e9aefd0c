#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence engine.
//!
//! This crate defines the message surface that connects the session runtime,
//! the authoritative world, and pure systems. The runtime submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

pub mod catalog;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{
    BuildingKind, BuildingSpec, RepairProfile, SpawnProfile, UnitKind, UnitSpec, UnknownKind,
};

/// Number of columns in the lane grid.
pub const GRID_COLUMNS: u16 = 16;
/// Number of rows in the lane grid.
pub const GRID_ROWS: u16 = 16;
/// Total number of addressable cells.
pub const GRID_CELLS: usize = GRID_COLUMNS as usize * GRID_ROWS as usize;
/// First column that belongs to the second player's territory.
pub const TERRITORY_SPLIT: u16 = GRID_COLUMNS / 2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Adds a player to the session or reconnects an existing one.
    Join {
        /// Name the player is known by.
        username: String,
    },
    /// Ends the countdown and opens the match.
    StartMatch,
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a building on a single cell.
    PlaceBuilding {
        /// Player paying for the building.
        player: PlayerIndex,
        /// Raw cell index supplied by the player; validated by the world.
        cell: u16,
        /// Catalog kind to construct.
        kind: BuildingKind,
    },
    /// Requests that a spawner building trains one unit on its cell.
    SpawnUnit {
        /// Building performing the spawn.
        building: BuildingId,
    },
    /// Requests that a repair building heals its owner's base.
    RepairBase {
        /// Building performing the repair.
        building: BuildingId,
    },
    /// Opens a movement and combat round.
    BeginRound,
    /// A unit strikes the enemy building on its candidate cell.
    StrikeBuilding {
        /// Unit delivering the strike.
        attacker: UnitId,
        /// Building receiving the damage.
        building: BuildingId,
    },
    /// A unit strikes every listed enemy unit on its candidate cell.
    StrikeUnits {
        /// Unit delivering the strike.
        attacker: UnitId,
        /// Units receiving the damage.
        targets: Vec<UnitId>,
    },
    /// A unit strikes the opposing base.
    StrikeBase {
        /// Unit delivering the strike.
        attacker: UnitId,
        /// Owner of the base receiving the damage.
        base: PlayerIndex,
    },
    /// A unit steps into its candidate cell.
    AdvanceUnit {
        /// Unit that moves.
        unit: UnitId,
        /// Destination cell.
        to: CellIndex,
    },
    /// Closes the open round, removing units that fell during it.
    ConcludeRound,
    /// Credits gold to a player.
    AccrueGold {
        /// Player receiving the gold.
        player: PlayerIndex,
        /// Amount credited.
        amount: u32,
    },
    /// Tears the session down.
    Close,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new player took a seat.
    PlayerJoined {
        /// Seat assigned to the player.
        player: PlayerIndex,
        /// Name the player is known by.
        username: String,
    },
    /// A seated player reconnected.
    PlayerRejoined {
        /// Seat the player already holds.
        player: PlayerIndex,
        /// Name the player is known by.
        username: String,
    },
    /// A join request was refused.
    JoinRejected {
        /// Name supplied with the request.
        username: String,
        /// Why the request was refused.
        reason: JoinError,
    },
    /// Both seats are filled and the countdown began.
    MatchStarting {
        /// Usernames in seat order.
        players: Vec<String>,
    },
    /// The countdown elapsed and the match is running.
    MatchStarted,
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a building was placed.
    BuildingPlaced {
        /// Identifier assigned to the building by the world.
        building: BuildingId,
        /// Catalog kind of the building.
        kind: BuildingKind,
        /// Cell the building occupies.
        cell: CellIndex,
        /// Player owning the building.
        owner: PlayerIndex,
    },
    /// Reports that a placement request was rejected without side effects.
    PlacementRejected {
        /// Player that issued the request.
        player: PlayerIndex,
        /// Raw cell index provided in the request.
        cell: u16,
        /// Kind requested for placement.
        kind: BuildingKind,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a spawner trained a unit.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Catalog kind of the unit.
        kind: UnitKind,
        /// Cell the unit starts on.
        cell: CellIndex,
        /// Player owning the unit.
        owner: PlayerIndex,
    },
    /// A repair building restored base health.
    BaseRepaired {
        /// Owner of the repaired base.
        player: PlayerIndex,
        /// Base health after the repair.
        health: i32,
    },
    /// A movement and combat round opened.
    RoundStarted {
        /// One-based number of the round.
        round: u64,
    },
    /// A building lost health but still stands.
    BuildingDamaged {
        /// Building that was hit.
        building: BuildingId,
        /// Unit that delivered the strike.
        attacker: UnitId,
        /// Remaining health.
        health: i32,
    },
    /// A building fell and its cell was cleared.
    BuildingDestroyed {
        /// Building that fell.
        building: BuildingId,
        /// Catalog kind of the building.
        kind: BuildingKind,
        /// Cell the building occupied.
        cell: CellIndex,
        /// Player that owned the building.
        owner: PlayerIndex,
    },
    /// A unit lost health.
    UnitDamaged {
        /// Unit that was hit.
        unit: UnitId,
        /// Unit that delivered the strike.
        attacker: UnitId,
        /// Remaining health, possibly non-positive until the round concludes.
        health: i32,
    },
    /// Confirms that a unit moved between two cells.
    UnitAdvanced {
        /// Unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: CellIndex,
        /// Cell the unit occupies after moving.
        to: CellIndex,
    },
    /// A unit was removed at the end of a round.
    UnitDestroyed {
        /// Unit that was removed.
        unit: UnitId,
        /// Cell the unit occupied.
        cell: CellIndex,
    },
    /// A base lost health.
    BaseDamaged {
        /// Owner of the base.
        player: PlayerIndex,
        /// Unit that delivered the strike.
        attacker: UnitId,
        /// Remaining health.
        health: i32,
    },
    /// A movement and combat round closed.
    RoundConcluded {
        /// One-based number of the round.
        round: u64,
    },
    /// A player was credited gold.
    GoldAccrued {
        /// Player receiving the gold.
        player: PlayerIndex,
        /// Amount credited.
        amount: u32,
        /// Balance after the credit.
        balance: u32,
    },
    /// A base fell and the match is over.
    GameOver {
        /// Player whose unit destroyed the opposing base.
        winner: PlayerIndex,
    },
    /// The session was torn down.
    SessionClosed,
}

/// Seat held by a player for the whole match.
///
/// Serialised as the numeric seat (`0` or `1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerIndex {
    /// Seat 0, owns the western columns and advances toward increasing indices.
    First,
    /// Seat 1, owns the eastern columns and advances toward decreasing indices.
    Second,
}

impl PlayerIndex {
    /// Both seats in index order.
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// Converts a zero-based seat number into a player index.
    #[must_use]
    pub const fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::First),
            1 => Some(Self::Second),
            _ => None,
        }
    }

    /// Zero-based seat number.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Seat of the opposing player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Reports whether the column lies inside this player's territory.
    #[must_use]
    pub const fn owns_column(self, column: u16) -> bool {
        match self {
            Self::First => column < TERRITORY_SPLIT,
            Self::Second => column >= TERRITORY_SPLIT && column < GRID_COLUMNS,
        }
    }

    /// Last column this player's units may stand in before striking the enemy base.
    #[must_use]
    pub const fn lane_end_column(self) -> u16 {
        match self {
            Self::First => GRID_COLUMNS - 1,
            Self::Second => 0,
        }
    }

    /// Column of a candidate cell that lies past the enemy's home edge.
    ///
    /// The lane wraps linearly, so stepping forward from
    /// [`lane_end_column`](Self::lane_end_column) lands on this column.
    #[must_use]
    pub const fn breach_column(self) -> u16 {
        match self {
            Self::First => 0,
            Self::Second => GRID_COLUMNS - 1,
        }
    }
}

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot())
    }
}

impl From<PlayerIndex> for u8 {
    fn from(player: PlayerIndex) -> Self {
        match player {
            PlayerIndex::First => 0,
            PlayerIndex::Second => 1,
        }
    }
}

impl TryFrom<u8> for PlayerIndex {
    type Error = InvalidPlayer;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_slot(usize::from(value)).ok_or(InvalidPlayer(value))
    }
}

/// Reported when a seat number is neither 0 nor 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("player index {0} does not name a seat")]
pub struct InvalidPlayer(pub u8);

/// Location of a single grid cell expressed as a linear index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct CellIndex(u16);

impl CellIndex {
    /// Creates a cell index, rejecting values outside the grid.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if (value as usize) < GRID_CELLS {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Index usable for slice access.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn column(&self) -> u16 {
        self.0 % GRID_COLUMNS
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn row(&self) -> u16 {
        self.0 / GRID_COLUMNS
    }

    /// Next cell along the lane in the direction the player advances.
    ///
    /// Returns `None` when the step would leave the grid.
    #[must_use]
    pub const fn step(self, player: PlayerIndex) -> Option<Self> {
        match player {
            PlayerIndex::First => Self::new(self.0 + 1),
            PlayerIndex::Second => match self.0.checked_sub(1) {
                Some(value) => Self::new(value),
                None => None,
            },
        }
    }

    /// Iterator over every cell in ascending order.
    pub fn all() -> impl Iterator<Item = CellIndex> {
        (0..GRID_CELLS as u16).map(CellIndex)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CellIndex> for u16 {
    fn from(cell: CellIndex) -> Self {
        cell.0
    }
}

impl TryFrom<u16> for CellIndex {
    type Error = InvalidCell;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidCell(value))
    }
}

/// Reported when a raw cell index lies outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("cell index {0} lies outside the grid")]
pub struct InvalidCell(pub u16);

/// Unique identifier assigned to a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque identifier of a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the textual identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// One seat is filled and the session waits for an opponent.
    Waiting,
    /// Both seats are filled and the start countdown is running.
    Starting,
    /// The match is running.
    InProgress,
    /// A base fell.
    Finished,
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum PlacementError {
    /// The match already ended.
    #[error("the match is over")]
    GameOver,
    /// The acting username holds no seat in the session.
    #[error("player is not seated in this session")]
    UnknownPlayer,
    /// The requested kind is not in the catalog.
    #[error("building kind is not in the catalog")]
    UnknownBuilding,
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell lies in the opponent's territory.
    #[error("cell lies outside the player's territory")]
    WrongTerritory,
    /// The requested cell already holds a building.
    #[error("cell is already occupied")]
    Occupied,
    /// The player cannot afford the building.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Reasons a join request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum JoinError {
    /// No session carries the requested identifier.
    #[error("Game not found")]
    NotFound,
    /// Both seats are taken.
    #[error("Game is full")]
    Full,
    /// The match is already running.
    #[error("Game is in progress")]
    InProgress,
    /// The match already ended.
    #[error("Game is finished")]
    Finished,
}

impl JoinError {
    /// Coarse reason code reported to clients.
    #[must_use]
    pub const fn reason_code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Full | Self::InProgress | Self::Finished => "rejected",
        }
    }
}

/// Building and owner occupying a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Building standing on the cell.
    pub building: BuildingId,
    /// Player owning the building.
    pub owner: PlayerIndex,
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>]) -> Self {
        Self { cells }
    }

    /// Returns the building occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellIndex) -> Option<Occupant> {
        self.cells.get(cell.as_usize()).copied().flatten()
    }

    /// Reports whether the cell currently holds no building.
    #[must_use]
    pub fn is_free(&self, cell: CellIndex) -> bool {
        self.occupant(cell).is_none()
    }

    /// Returns an iterator over all cells.
    pub fn iter(&self) -> impl Iterator<Item = Option<Occupant>> + 'a {
        self.cells.iter().copied()
    }

    /// Number of cells covered by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the view covers no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Catalog kind of the unit.
    pub kind: UnitKind,
    /// Player owning the unit.
    pub owner: PlayerIndex,
    /// Grid cell currently occupied by the unit.
    pub cell: CellIndex,
    /// Current health; `None` until first initialised.
    pub health: Option<i32>,
    /// Health ceiling of the unit.
    pub max_health: i32,
    /// Damage dealt per strike.
    pub damage: i32,
}

/// Read-only snapshot describing all units within the lane.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view ordered by cell index, then by identifier.
    ///
    /// Identifiers grow monotonically, so ties resolve in spawn order.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.cell, snapshot.id));
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Units standing on the provided cell, in evaluation order.
    pub fn on_cell(&self, cell: CellIndex) -> impl Iterator<Item = &UnitSnapshot> {
        let start = self.snapshots.partition_point(|snapshot| snapshot.cell < cell);
        self.snapshots[start..]
            .iter()
            .take_while(move |snapshot| snapshot.cell == cell)
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a player's seat and economy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Seat held by the player.
    pub index: PlayerIndex,
    /// Name the player is known by.
    pub username: String,
    /// Current gold balance.
    pub gold: u32,
    /// Gold credited every session tick.
    pub gold_per_tick: u32,
}

/// Read-only snapshot describing every seated player.
#[derive(Clone, Debug, Default)]
pub struct PlayerView {
    snapshots: Vec<PlayerSnapshot>,
}

impl PlayerView {
    /// Creates a new player view ordered by seat.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlayerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.index);
        Self { snapshots }
    }

    /// Iterator over the captured players in seat order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PlayerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a building used in session snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    /// Identifier allocated to the building by the world.
    pub id: BuildingId,
    /// Catalog kind of the building.
    pub kind: BuildingKind,
    /// Player owning the building.
    pub owner: PlayerIndex,
    /// Current health.
    pub health: i32,
    /// Health ceiling.
    pub max_health: i32,
}

/// Immutable representation of a base used in session snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSnapshot {
    /// Player defending the base.
    pub owner: PlayerIndex,
    /// Current health.
    pub health: i32,
    /// Health ceiling.
    pub max_health: i32,
}

/// Full state of a session as distributed to its participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Identifier of the session.
    pub id: SessionId,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Number of movement and combat rounds resolved so far.
    pub round: u64,
    /// Seated players in seat order.
    pub players: Vec<PlayerSnapshot>,
    /// One entry per cell, `None` for empty cells.
    pub grid: Vec<Option<BuildingSnapshot>>,
    /// Units in evaluation order.
    pub units: Vec<UnitSnapshot>,
    /// Bases in seat order.
    pub bases: Vec<BaseSnapshot>,
    /// Set once a base fell.
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn column_and_row_follow_linear_layout() {
        let cell = CellIndex::new(37).expect("in grid");
        assert_eq!(cell.column(), 5);
        assert_eq!(cell.row(), 2);
        assert!(CellIndex::new(255).is_some());
        assert!(CellIndex::new(256).is_none());
        assert_eq!(CellIndex::all().count(), GRID_CELLS);
    }

    #[test]
    fn step_follows_owner_heading_and_stops_at_grid_bounds() {
        let cell = CellIndex::new(15).expect("in grid");
        assert_eq!(cell.step(PlayerIndex::First), CellIndex::new(16));
        assert_eq!(cell.step(PlayerIndex::Second), CellIndex::new(14));
        assert_eq!(
            CellIndex::new(255).expect("in grid").step(PlayerIndex::First),
            None
        );
        assert_eq!(
            CellIndex::new(0).expect("in grid").step(PlayerIndex::Second),
            None
        );
    }

    #[test]
    fn territory_splits_at_the_middle_column() {
        assert!(PlayerIndex::First.owns_column(7));
        assert!(!PlayerIndex::First.owns_column(8));
        assert!(PlayerIndex::Second.owns_column(8));
        assert!(!PlayerIndex::Second.owns_column(7));
        assert!(!PlayerIndex::Second.owns_column(16));
    }

    #[test]
    fn player_index_serialises_as_seat_number() {
        assert_eq!(serde_json::to_string(&PlayerIndex::Second).expect("json"), "1");
        assert!(serde_json::from_str::<PlayerIndex>("2").is_err());
    }

    #[test]
    fn cell_index_rejects_out_of_grid_values_on_decode() {
        assert!(serde_json::from_str::<CellIndex>("300").is_err());
        assert_eq!(
            serde_json::from_str::<CellIndex>("12").expect("json"),
            CellIndex::new(12).expect("in grid")
        );
    }

    #[test]
    fn unit_view_orders_by_cell_then_identifier() {
        let view = UnitView::from_snapshots(vec![
            unit(7, 20),
            unit(3, 20),
            unit(9, 4),
        ]);
        let order: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(order, vec![9, 3, 7]);

        let on_cell: Vec<u32> = view
            .on_cell(CellIndex::new(20).expect("in grid"))
            .map(|snapshot| snapshot.id.get())
            .collect();
        assert_eq!(on_cell, vec![3, 7]);
        assert_eq!(view.on_cell(CellIndex::new(5).expect("in grid")).count(), 0);
    }

    #[test]
    fn join_errors_collapse_into_two_reason_codes() {
        assert_eq!(JoinError::NotFound.reason_code(), "not_found");
        assert_eq!(JoinError::Full.reason_code(), "rejected");
        assert_eq!(JoinError::InProgress.reason_code(), "rejected");
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Occupied);
    }

    #[test]
    fn phase_round_trips_through_bincode() {
        assert_round_trip(&Phase::InProgress);
    }

    fn unit(id: u32, cell: u16) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: UnitKind::Warrior,
            owner: PlayerIndex::First,
            cell: CellIndex::new(cell).expect("in grid"),
            health: Some(15),
            max_health: 15,
            damage: 3,
        }
    }
}

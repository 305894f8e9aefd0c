//! Immutable catalog of building and unit kinds.
//!
//! Every kind is a plain enum variant; its numbers live in a constant spec
//! table and are looked up by id rather than copied onto instances.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Buildings a player may construct inside their own territory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    /// Cheap spawner that trains mages.
    MageTower,
    /// Spawner that trains warriors.
    Barracks,
    /// Inert, high-health blocker.
    DefenseWall,
    /// Raises its owner's gold income while standing.
    Farm,
    /// Heals its owner's base while standing.
    RepairStation,
    /// Expensive spawner that trains paladins.
    Castle,
}

impl BuildingKind {
    /// Every building kind in catalog order.
    pub const ALL: [Self; 6] = [
        Self::MageTower,
        Self::Barracks,
        Self::DefenseWall,
        Self::Farm,
        Self::RepairStation,
        Self::Castle,
    ];

    /// Stable identifier used on the wire.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MageTower => "mageTower",
            Self::Barracks => "barracks",
            Self::DefenseWall => "defenseWall",
            Self::Farm => "farm",
            Self::RepairStation => "repairStation",
            Self::Castle => "castle",
        }
    }

    /// Catalog entry describing the kind.
    #[must_use]
    pub const fn spec(self) -> &'static BuildingSpec {
        match self {
            Self::MageTower => &MAGE_TOWER,
            Self::Barracks => &BARRACKS,
            Self::DefenseWall => &DEFENSE_WALL,
            Self::Farm => &FARM,
            Self::RepairStation => &REPAIR_STATION,
            Self::Castle => &CASTLE,
        }
    }

    /// Gold deducted from the owner when the building is placed.
    #[must_use]
    pub const fn price(self) -> u32 {
        self.spec().price
    }

    /// Health a freshly placed building starts with.
    #[must_use]
    pub const fn max_health(self) -> i32 {
        self.spec().max_health
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BuildingKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == value)
            .ok_or_else(|| UnknownKind(value.to_owned()))
    }
}

/// Combatants trained by spawner buildings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    /// Fragile ranged caster.
    Mage,
    /// Baseline melee fighter.
    Warrior,
    /// Heavy melee fighter.
    Paladin,
}

impl UnitKind {
    /// Every unit kind in catalog order.
    pub const ALL: [Self; 3] = [Self::Mage, Self::Warrior, Self::Paladin];

    /// Stable identifier used on the wire.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Mage => "mage",
            Self::Warrior => "warrior",
            Self::Paladin => "paladin",
        }
    }

    /// Catalog entry describing the kind.
    #[must_use]
    pub const fn spec(self) -> &'static UnitSpec {
        match self {
            Self::Mage => &MAGE,
            Self::Warrior => &WARRIOR,
            Self::Paladin => &PALADIN,
        }
    }

    /// Health a freshly spawned unit starts with.
    #[must_use]
    pub const fn max_health(self) -> i32 {
        self.spec().max_health
    }

    /// Damage dealt by a single strike.
    #[must_use]
    pub const fn damage(self) -> i32 {
        self.spec().damage
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Capability set of a building kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildingSpec {
    /// Human readable name.
    pub name: &'static str,
    /// Gold cost of a single placement.
    pub price: u32,
    /// Health at placement time.
    pub max_health: i32,
    /// Periodic unit production, if the building trains units.
    pub spawn: Option<SpawnProfile>,
    /// Gold added to the owner's per-tick income while the building stands.
    pub gold_per_tick: u32,
    /// Periodic base healing, if the building repairs.
    pub repair: Option<RepairProfile>,
}

/// Periodic unit production attached to a building kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnProfile {
    /// Unit trained on every cycle.
    pub unit: UnitKind,
    /// Time between two consecutive spawns.
    pub interval: Duration,
}

/// Periodic base healing attached to a building kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepairProfile {
    /// Health restored to the owner's base per repair cycle.
    pub amount: i32,
}

/// Capability set of a unit kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSpec {
    /// Human readable name.
    pub name: &'static str,
    /// Health at spawn time.
    pub max_health: i32,
    /// Damage dealt per strike.
    pub damage: i32,
}

/// Reported when a kind identifier does not match any catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no catalog entry named '{0}'")]
pub struct UnknownKind(pub String);

const MAGE_TOWER: BuildingSpec = BuildingSpec {
    name: "Mage Tower",
    price: 25,
    max_health: 10,
    spawn: Some(SpawnProfile {
        unit: UnitKind::Mage,
        interval: Duration::from_millis(5_000),
    }),
    gold_per_tick: 0,
    repair: None,
};

const BARRACKS: BuildingSpec = BuildingSpec {
    name: "Barracks",
    price: 15,
    max_health: 10,
    spawn: Some(SpawnProfile {
        unit: UnitKind::Warrior,
        interval: Duration::from_millis(7_000),
    }),
    gold_per_tick: 0,
    repair: None,
};

const DEFENSE_WALL: BuildingSpec = BuildingSpec {
    name: "Defense Wall",
    price: 10,
    max_health: 350,
    spawn: None,
    gold_per_tick: 0,
    repair: None,
};

const FARM: BuildingSpec = BuildingSpec {
    name: "Farm",
    price: 35,
    max_health: 100,
    spawn: None,
    gold_per_tick: 1,
    repair: None,
};

const REPAIR_STATION: BuildingSpec = BuildingSpec {
    name: "Repair Station",
    price: 25,
    max_health: 50,
    spawn: None,
    gold_per_tick: 0,
    repair: Some(RepairProfile { amount: 1 }),
};

const CASTLE: BuildingSpec = BuildingSpec {
    name: "Castle",
    price: 100,
    max_health: 500,
    spawn: Some(SpawnProfile {
        unit: UnitKind::Paladin,
        interval: Duration::from_millis(10_000),
    }),
    gold_per_tick: 0,
    repair: None,
};

const MAGE: UnitSpec = UnitSpec {
    name: "Mage",
    max_health: 10,
    damage: 2,
};

const WARRIOR: UnitSpec = UnitSpec {
    name: "Warrior",
    max_health: 15,
    damage: 3,
};

const PALADIN: UnitSpec = UnitSpec {
    name: "Paladin",
    max_health: 35,
    damage: 6,
};

//! Roster of units walking the lane.

use lane_defence_core::{CellIndex, PlayerIndex, UnitId, UnitKind, UnitSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) owner: PlayerIndex,
    pub(crate) cell: CellIndex,
    /// `None` until first initialised; rounds default it to the kind's maximum.
    pub(crate) health: Option<i32>,
}

impl Unit {
    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            owner: self.owner,
            cell: self.cell,
            health: self.health,
            max_health: self.kind.max_health(),
            damage: self.kind.damage(),
        }
    }

    /// Subtracts damage, initialising missing health first, and returns what remains.
    pub(crate) fn take_damage(&mut self, damage: i32) -> i32 {
        let max_health = self.kind.max_health();
        let health = self.health.get_or_insert(max_health);
        *health -= damage;
        *health
    }
}

/// Units in insertion order with monotonically allocated identifiers.
#[derive(Debug)]
pub(crate) struct UnitRoster {
    units: Vec<Unit>,
    next_unit_id: UnitId,
}

impl UnitRoster {
    pub(crate) fn new() -> Self {
        Self {
            units: Vec::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    pub(crate) fn spawn(&mut self, kind: UnitKind, owner: PlayerIndex, cell: CellIndex) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().wrapping_add(1));
        self.units.push(Unit {
            id,
            kind,
            owner,
            cell,
            health: Some(kind.max_health()),
        });
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let position = self.units.iter().position(|unit| unit.id == id)?;
        Some(self.units.remove(position))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    /// Gives every unit with missing health its kind's maximum.
    pub(crate) fn normalise_health(&mut self) {
        for unit in &mut self.units {
            if unit.health.is_none() {
                unit.health = Some(unit.kind.max_health());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn clear_health(&mut self, id: UnitId) {
        if let Some(unit) = self.get_mut(id) {
            unit.health = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_units_start_at_full_health_in_insertion_order() {
        let mut roster = UnitRoster::new();
        let cell = CellIndex::new(10).expect("in grid");
        let first = roster.spawn(UnitKind::Mage, PlayerIndex::First, cell);
        let second = roster.spawn(UnitKind::Paladin, PlayerIndex::Second, cell);

        let ids: Vec<UnitId> = roster.iter().map(|unit| unit.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(roster.get(second).and_then(|unit| unit.health), Some(35));
    }

    #[test]
    fn missing_health_defaults_to_maximum_before_damage() {
        let mut roster = UnitRoster::new();
        let cell = CellIndex::new(10).expect("in grid");
        let id = roster.spawn(UnitKind::Warrior, PlayerIndex::First, cell);
        roster.clear_health(id);

        let remaining = roster.get_mut(id).expect("unit").take_damage(4);
        assert_eq!(remaining, 11);
    }

    #[test]
    fn normalise_only_touches_missing_health() {
        let mut roster = UnitRoster::new();
        let cell = CellIndex::new(10).expect("in grid");
        let hurt = roster.spawn(UnitKind::Warrior, PlayerIndex::First, cell);
        let blank = roster.spawn(UnitKind::Mage, PlayerIndex::First, cell);
        let _ = roster.get_mut(hurt).expect("unit").take_damage(5);
        roster.clear_health(blank);

        roster.normalise_health();

        assert_eq!(roster.get(hurt).and_then(|unit| unit.health), Some(10));
        assert_eq!(roster.get(blank).and_then(|unit| unit.health), Some(10));
    }
}

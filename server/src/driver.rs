//! Synchronous pump that couples one world with its systems.

use std::{collections::VecDeque, time::Duration};

use lane_defence_core::{Command, Event, SessionId, SessionSnapshot};
use lane_defence_system_combat::Combat;
use lane_defence_system_economy::Economy;
use lane_defence_system_scheduler::Scheduler;
use lane_defence_world::{self as world, query, World};

use crate::config::ServerConfig;

/// Owns one session's world together with the systems that react to it.
///
/// Every command runs to completion before the next queued command is
/// applied: the events it produces are handed to the scheduler, the combat
/// system and the economy system in that order, and whatever they emit is
/// resolved first. A round that falls due at the same instant as a spawn is
/// therefore fully resolved before the spawn lands.
#[derive(Debug)]
pub struct Driver {
    world: World,
    scheduler: Scheduler,
    combat: Combat,
    economy: Economy,
}

impl Driver {
    /// Creates a driver for a fresh session.
    #[must_use]
    pub fn new(id: SessionId, config: &ServerConfig) -> Self {
        Self {
            world: World::new(id, config.rules()),
            scheduler: Scheduler::new(config.scheduler()),
            combat: Combat::new(),
            economy: Economy::new(),
        }
    }

    /// Read-only access to the session state for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Full snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        query::snapshot(&self.world)
    }

    /// Time left until the next scheduled command, if any is queued.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }

    /// Applies a command and everything it triggers, returning the events in order.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        self.pump(command, &mut log);
        log
    }

    /// Advances session time, stopping at every scheduled deadline on the way.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        let mut log = Vec::new();
        let mut remaining = dt;

        loop {
            let step = match self.scheduler.time_until_next() {
                Some(next) if next <= remaining => next,
                _ => remaining,
            };
            self.pump(Command::Tick { dt: step }, &mut log);
            remaining = remaining.saturating_sub(step);

            if remaining.is_zero() || query::is_closed(&self.world) {
                break;
            }
        }

        log
    }

    fn pump(&mut self, command: Command, log: &mut Vec<Event>) {
        let mut pending = VecDeque::from([command]);

        while let Some(command) = pending.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            if events.is_empty() {
                continue;
            }

            let mut follow_up = Vec::new();
            self.scheduler.handle(&events, &mut follow_up);
            let units = query::unit_view(&self.world);
            self.combat.handle(
                &events,
                &units,
                query::occupancy_view(&self.world),
                &mut follow_up,
            );
            self.economy
                .handle(&events, &query::player_view(&self.world), &mut follow_up);

            log.extend(events);
            for command in follow_up.into_iter().rev() {
                pending.push_front(command);
            }
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic scheduling system that turns elapsed time into session commands.
//!
//! Every session owns exactly one [`Scheduler`]. It keeps a single
//! time-ordered queue holding the start countdown, the session tick and the
//! per-building spawn and repair cadences. Elapsed time arrives through
//! `Event::TimeAdvanced`; whatever falls due is emitted as commands in
//! deadline order, ties broken by the order in which the jobs were first
//! registered. Cancelling work is a removal from the queue.

use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    time::Duration,
};

use lane_defence_core::{BuildingId, BuildingKind, Command, Event};

const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1_000);
const DEFAULT_START_DELAY: Duration = Duration::from_millis(5_000);
const DEFAULT_REPAIR_PERIOD: Duration = Duration::from_millis(1_000);

/// Configuration parameters required to construct the scheduling system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    tick_period: Duration,
    start_delay: Duration,
    repair_period: Duration,
}

impl Config {
    /// Creates a new configuration using the provided cadences.
    #[must_use]
    pub const fn new(tick_period: Duration, start_delay: Duration, repair_period: Duration) -> Self {
        Self {
            tick_period,
            start_delay,
            repair_period,
        }
    }

    /// Period between two session ticks.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Countdown between the second join and the match start.
    #[must_use]
    pub const fn start_delay(&self) -> Duration {
        self.start_delay
    }

    /// Period between two repairs of a repair building.
    #[must_use]
    pub const fn repair_period(&self) -> Duration {
        self.repair_period
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD, DEFAULT_START_DELAY, DEFAULT_REPAIR_PERIOD)
    }
}

/// Work item held by the scheduling queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {
    /// One-shot end of the start countdown.
    StartMatch,
    /// Recurring session tick.
    Round,
    /// Recurring unit production of a spawner building.
    Spawn {
        /// Building that trains the unit.
        building: BuildingId,
    },
    /// Recurring base healing of a repair building.
    Repair {
        /// Building that performs the repair.
        building: BuildingId,
    },
}

impl Job {
    const fn building(self) -> Option<BuildingId> {
        match self {
            Self::Spawn { building } | Self::Repair { building } => Some(building),
            Self::StartMatch | Self::Round => None,
        }
    }

    const fn command(self) -> Command {
        match self {
            Self::StartMatch => Command::StartMatch,
            Self::Round => Command::BeginRound,
            Self::Spawn { building } => Command::SpawnUnit { building },
            Self::Repair { building } => Command::RepairBase { building },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Duration,
    sequence: u64,
    job: Job,
    /// Zero for one-shot jobs.
    period: Duration,
}

/// Pure system that owns every timer of one session.
#[derive(Debug)]
pub struct Scheduler {
    config: Config,
    clock: Duration,
    queue: BinaryHeap<Reverse<Entry>>,
    next_sequence: u64,
}

impl Scheduler {
    /// Creates a new scheduling system with an empty queue.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Duration::ZERO,
            queue: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Session time observed so far.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Number of jobs waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Jobs waiting in the queue in the order they will fire.
    #[must_use]
    pub fn pending_jobs(&self) -> Vec<Job> {
        let mut entries: Vec<Entry> = self.queue.iter().map(|Reverse(entry)| *entry).collect();
        entries.sort();
        entries.into_iter().map(|entry| entry.job).collect()
    }

    /// Time left until the earliest job falls due, if any is queued.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        self.queue
            .peek()
            .map(|Reverse(entry)| entry.due.saturating_sub(self.clock))
    }

    /// Consumes world events to maintain the queue and emit commands that fell due.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::MatchStarting { .. } => {
                    self.schedule(Job::StartMatch, self.config.start_delay, Duration::ZERO);
                }
                Event::MatchStarted => {
                    let period = self.config.tick_period;
                    self.schedule(Job::Round, period, period);
                }
                Event::BuildingPlaced { building, kind, .. } => self.register(*building, *kind),
                Event::BuildingDestroyed { building, .. } => self.cancel(*building),
                Event::GameOver { .. } | Event::SessionClosed => self.queue.clear(),
                Event::TimeAdvanced { dt } => {
                    self.clock = self.clock.saturating_add(*dt);
                    self.fire_due(out);
                }
                _ => {}
            }
        }
    }

    fn register(&mut self, building: BuildingId, kind: BuildingKind) {
        let spec = kind.spec();
        if let Some(spawn) = spec.spawn {
            self.schedule(Job::Spawn { building }, spawn.interval, spawn.interval);
        }
        if spec.repair.is_some() {
            let period = self.config.repair_period;
            self.schedule(Job::Repair { building }, period, period);
        }
    }

    fn cancel(&mut self, building: BuildingId) {
        self.queue
            .retain(|Reverse(entry)| entry.job.building() != Some(building));
    }

    fn schedule(&mut self, job: Job, delay: Duration, period: Duration) {
        let due = self.clock.saturating_add(delay);
        self.push(job, due, period);
    }

    fn push(&mut self, job: Job, due: Duration, period: Duration) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(Reverse(Entry {
            due,
            sequence,
            job,
            period,
        }));
    }

    fn fire_due(&mut self, out: &mut Vec<Command>) {
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.due > self.clock {
                break;
            }
            let _ = self.queue.pop();
            out.push(entry.job.command());

            if !entry.period.is_zero() {
                // Recurring jobs keep their sequence so ties stay in registration order.
                self.queue.push(Reverse(Entry {
                    due: entry.due.saturating_add(entry.period),
                    ..entry
                }));
            }
        }
    }
}

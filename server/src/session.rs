//! Per-session actor that serialises every mutation of one world.

use std::time::Duration;

use lane_defence_core::{
    BuildingKind, Command, Event, JoinError, PlacementError, SessionId, SessionSnapshot,
};
use lane_defence_world::query;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    config::ServerConfig,
    driver::Driver,
    notification::{self, Notification},
};

/// Requests accepted by a session actor.
#[derive(Debug)]
pub(crate) enum Request {
    Join {
        username: String,
        reply: oneshot::Sender<Result<SessionSnapshot, JoinError>>,
    },
    PlaceBuilding {
        username: String,
        cell: u16,
        kind: BuildingKind,
        reply: oneshot::Sender<Result<SessionSnapshot, PlacementError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Registry-side handle to a running session actor.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    pub(crate) requests: mpsc::Sender<Request>,
    pub(crate) notifications: broadcast::Sender<Notification>,
    pub(crate) task: JoinHandle<()>,
}

/// Spawns the actor task for a fresh session.
pub(crate) fn spawn(id: SessionId, config: &ServerConfig) -> SessionHandle {
    let (requests, inbox) = mpsc::channel(config.command_capacity);
    let (notifications, _) = broadcast::channel(config.notification_capacity);
    let actor = Actor {
        driver: Driver::new(id.clone(), config),
        id,
        inbox,
        notifications: notifications.clone(),
        clock: Instant::now(),
        lag_warning: Duration::from_millis(config.tick_period_ms),
    };
    let task = tokio::spawn(actor.run());

    SessionHandle {
        requests,
        notifications,
        task,
    }
}

struct Actor {
    id: SessionId,
    driver: Driver,
    inbox: mpsc::Receiver<Request>,
    notifications: broadcast::Sender<Notification>,
    /// Wall-clock instant the driver's session time was last synchronised to.
    clock: Instant,
    lag_warning: Duration,
}

impl Actor {
    async fn run(mut self) {
        loop {
            let deadline = self.driver.time_until_next().map(|wait| self.clock + wait);

            tokio::select! {
                biased;

                () = sleep_until(deadline) => {
                    if let Some(deadline) = deadline {
                        let lag = Instant::now().saturating_duration_since(deadline);
                        if lag > self.lag_warning {
                            warn!(session = %self.id, ?lag, "session fell behind its schedule");
                        }
                    }
                    self.catch_up();
                }
                request = self.inbox.recv() => {
                    let Some(request) = request else {
                        debug!(session = %self.id, "registry handle dropped");
                        break;
                    };
                    self.catch_up();
                    if self.handle(request) {
                        break;
                    }
                }
            }
        }
    }

    /// Brings session time up to the wall clock.
    ///
    /// Stops at every missed deadline so each tick is published with the
    /// state it produced, even when the task woke late.
    fn catch_up(&mut self) {
        let now = Instant::now();
        let mut remaining = now.saturating_duration_since(self.clock);
        self.clock = now;

        loop {
            let step = match self.driver.time_until_next() {
                Some(next) if next < remaining => next,
                _ => remaining,
            };
            let events = self.driver.advance(step);
            self.publish(&events);
            remaining -= step;

            if remaining.is_zero() || query::is_closed(self.driver.world()) {
                break;
            }
        }
    }

    /// Serves one request; returns `true` once the session is closed.
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Join { username, reply } => {
                let events = self.driver.submit(Command::Join { username });
                self.publish(&events);
                let _ = reply.send(self.join_outcome(&events));
            }
            Request::PlaceBuilding {
                username,
                cell,
                kind,
                reply,
            } => {
                let outcome = self.place_building(&username, cell, kind);
                let _ = reply.send(outcome);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.driver.snapshot());
            }
            Request::Close { reply } => {
                let events = self.driver.submit(Command::Close);
                self.publish(&events);
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn join_outcome(&self, events: &[Event]) -> Result<SessionSnapshot, JoinError> {
        for event in events {
            if let Event::JoinRejected { reason, .. } = event {
                return Err(*reason);
            }
        }
        Ok(self.driver.snapshot())
    }

    fn place_building(
        &mut self,
        username: &str,
        cell: u16,
        kind: BuildingKind,
    ) -> Result<SessionSnapshot, PlacementError> {
        let player = query::player_index(self.driver.world(), username)
            .ok_or(PlacementError::UnknownPlayer)?;
        let events = self
            .driver
            .submit(Command::PlaceBuilding { player, cell, kind });
        self.publish(&events);

        for event in &events {
            if let Event::PlacementRejected { reason, .. } = event {
                return Err(*reason);
            }
        }
        Ok(self.driver.snapshot())
    }

    fn publish(&self, events: &[Event]) {
        for event in events {
            log_event(&self.id, event);
        }

        let driver = &self.driver;
        for notice in notification::from_events(events, || driver.snapshot()) {
            // No subscribers is not an error.
            let _ = self.notifications.send(notice);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn log_event(id: &SessionId, event: &Event) {
    match event {
        Event::PlayerJoined { player, username } => {
            info!(session = %id, %player, %username, "player joined");
        }
        Event::PlayerRejoined { player, username } => {
            debug!(session = %id, %player, %username, "player reconnected");
        }
        Event::JoinRejected { username, reason } => {
            debug!(session = %id, %username, %reason, "join rejected");
        }
        Event::MatchStarting { players } => {
            info!(session = %id, ?players, "match starting");
        }
        Event::MatchStarted => info!(session = %id, "match started"),
        Event::PlacementRejected {
            player,
            cell,
            kind,
            reason,
        } => {
            debug!(session = %id, %player, cell, %kind, %reason, "placement rejected");
        }
        Event::BuildingDestroyed { building, cell, .. } => {
            debug!(session = %id, building = building.get(), %cell, "building destroyed, timers cancelled");
        }
        Event::GameOver { winner } => info!(session = %id, %winner, "game over"),
        Event::SessionClosed => info!(session = %id, "session closed"),
        _ => {}
    }
}

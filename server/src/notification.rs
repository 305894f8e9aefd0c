//! Outbound messages published to session subscribers.

use lane_defence_core::{Event, PlayerIndex, SessionSnapshot};
use serde::Serialize;

/// Message broadcast to everyone subscribed to a session.
///
/// Serialises as `{ "event": "<name>", "data": ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// Full session state after an accepted mutation or a session tick.
    GameUpdate(SessionSnapshot),
    /// Both seats are filled and the countdown began.
    GameStarting {
        /// Usernames in seat order.
        players: Vec<String>,
    },
    /// The countdown elapsed.
    GameStarted(SessionSnapshot),
    /// A base fell.
    GameOver {
        /// Seat whose unit destroyed the opposing base.
        winner: PlayerIndex,
    },
}

impl Notification {
    /// Name carried in the `event` field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GameUpdate(_) => "game_update",
            Self::GameStarting { .. } => "game_starting",
            Self::GameStarted(_) => "game_started",
            Self::GameOver { .. } => "game_over",
        }
    }
}

/// Derives the notifications owed to subscribers for a batch of world events.
///
/// Lifecycle notifications follow event order; a single trailing update
/// carries the resulting state when anything observable changed.
pub(crate) fn from_events(
    events: &[Event],
    snapshot: impl Fn() -> SessionSnapshot,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    for event in events {
        match event {
            Event::MatchStarting { players } => notifications.push(Notification::GameStarting {
                players: players.clone(),
            }),
            Event::MatchStarted => notifications.push(Notification::GameStarted(snapshot())),
            Event::GameOver { winner } => {
                notifications.push(Notification::GameOver { winner: *winner });
            }
            _ => {}
        }
    }

    if events.iter().any(changes_state) {
        notifications.push(Notification::GameUpdate(snapshot()));
    }

    notifications
}

fn changes_state(event: &Event) -> bool {
    !matches!(
        event,
        Event::TimeAdvanced { .. }
            | Event::JoinRejected { .. }
            | Event::PlacementRejected { .. }
            | Event::PlayerRejoined { .. }
            | Event::SessionClosed
    )
}

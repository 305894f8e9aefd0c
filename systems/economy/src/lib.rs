#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that credits each player's income once per concluded round.

use lane_defence_core::{Command, Event, PlayerView};

/// Economy system that turns concluded rounds into gold credits.
#[derive(Debug, Default)]
pub struct Economy;

impl Economy {
    /// Creates a new economy system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits one `Command::AccrueGold` per seated player for every concluded round.
    ///
    /// Players whose gold-per-tick rate is zero are skipped.
    pub fn handle(&mut self, events: &[Event], players: &PlayerView, out: &mut Vec<Command>) {
        for event in events {
            if !matches!(event, Event::RoundConcluded { .. }) {
                continue;
            }

            out.extend(
                players
                    .iter()
                    .filter(|player| player.gold_per_tick > 0)
                    .map(|player| Command::AccrueGold {
                        player: player.index,
                        amount: player.gold_per_tick,
                    }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{PlayerIndex, PlayerSnapshot};

    fn player(index: PlayerIndex, gold_per_tick: u32) -> PlayerSnapshot {
        PlayerSnapshot {
            index,
            username: format!("player{index}"),
            gold: 0,
            gold_per_tick,
        }
    }

    #[test]
    fn credits_every_player_in_seat_order() {
        let players = PlayerView::from_snapshots(vec![
            player(PlayerIndex::Second, 3),
            player(PlayerIndex::First, 1),
        ]);
        let mut out = Vec::new();

        Economy::new().handle(&[Event::RoundConcluded { round: 4 }], &players, &mut out);

        assert_eq!(
            out,
            vec![
                Command::AccrueGold {
                    player: PlayerIndex::First,
                    amount: 1,
                },
                Command::AccrueGold {
                    player: PlayerIndex::Second,
                    amount: 3,
                },
            ]
        );
    }

    #[test]
    fn idle_rates_and_other_events_emit_nothing() {
        let players = PlayerView::from_snapshots(vec![player(PlayerIndex::First, 0)]);
        let mut out = Vec::new();
        let mut economy = Economy::new();

        economy.handle(&[Event::RoundConcluded { round: 1 }], &players, &mut out);
        economy.handle(&[Event::RoundStarted { round: 2 }], &players, &mut out);

        assert!(out.is_empty());
    }
}

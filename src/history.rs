use itertools::Itertools;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

pub const HISTORY_DEPTH: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn index(self) -> u8 {
        match self {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
        }
    }
}

impl TryFrom<u64> for Move {
    type Error = UnknownCode;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Rock),
            1 => Ok(Move::Paper),
            2 => Ok(Move::Scissors),
            _ => Err(UnknownCode {
                kind: "move",
                code,
            }),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GameResult {
    PlayerWins,
    AiWins,
    Draw,
}

impl GameResult {
    pub fn label(self) -> &'static str {
        match self {
            GameResult::PlayerWins => "Player Wins",
            GameResult::AiWins => "AI Wins",
            GameResult::Draw => "Draw",
        }
    }
}

impl TryFrom<u64> for GameResult {
    type Error = UnknownCode;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GameResult::PlayerWins),
            1 => Ok(GameResult::AiWins),
            2 => Ok(GameResult::Draw),
            _ => Err(UnknownCode {
                kind: "result",
                code,
            }),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GameEvent {
    pub player_choice: Move,
    pub ai_choice: Move,
    pub result: GameResult,
    pub sequence_number: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub player_move: Move,
    pub ai_move: Move,
    pub result: GameResult,
    pub sequence_number: u64,
}

impl From<&GameEvent> for HistoryEntry {
    fn from(event: &GameEvent) -> Self {
        HistoryEntry {
            player_move: event.player_choice,
            ai_move: event.ai_choice,
            result: event.result,
            sequence_number: event.sequence_number,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundOutcome {
    pub player_move: Move,
    pub ai_move: Move,
    pub result: GameResult,
}

impl From<&GameEvent> for RoundOutcome {
    fn from(event: &GameEvent) -> Self {
        RoundOutcome {
            player_move: event.player_choice,
            ai_move: event.ai_choice,
            result: event.result,
        }
    }
}

/// Projects the full event log onto the bounded recent-games list: newest
/// first, deduplicated by sequence number, capped at [`HISTORY_DEPTH`].
pub fn reconcile(events: &[GameEvent]) -> Vec<HistoryEntry> {
    events
        .iter()
        .sorted_by(|a, b| b.sequence_number.cmp(&a.sequence_number))
        .unique_by(|event| event.sequence_number)
        .take(HISTORY_DEPTH)
        .map(HistoryEntry::from)
        .collect()
}

pub fn latest_event(events: &[GameEvent]) -> Option<&GameEvent> {
    events.iter().max_by_key(|event| event.sequence_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(seq: u64) -> GameEvent {
        GameEvent {
            player_choice: Move::try_from(seq % 3).unwrap(),
            ai_choice: Move::try_from((seq + 1) % 3).unwrap(),
            result: GameResult::try_from(seq % 3).unwrap(),
            sequence_number: seq,
        }
    }

    #[test]
    fn reconcile__keeps_five_newest_in_descending_order() {
        let events: Vec<_> = (1..=6).map(event).collect();

        let history = reconcile(&events);

        let sequences: Vec<_> =
            history.iter().map(|entry| entry.sequence_number).collect();
        assert_eq!(sequences, vec![6, 5, 4, 3, 2]);
    }

    #[test]
    fn reconcile__is_idempotent() {
        let events: Vec<_> = (0..10).map(event).collect();

        let first = reconcile(&events);
        let second = reconcile(&events);

        assert_eq!(first, second);
    }

    #[test]
    fn reconcile__deduplicates_by_sequence_number() {
        let mut events: Vec<_> = (1..=3).map(event).collect();
        events.push(event(2));
        events.push(event(2));

        let history = reconcile(&events);

        let sequences: Vec<_> =
            history.iter().map(|entry| entry.sequence_number).collect();
        assert_eq!(sequences, vec![3, 2, 1]);
    }

    #[test]
    fn reconcile__handles_unordered_input() {
        let events: Vec<_> = [4, 1, 9, 2, 7].into_iter().map(event).collect();

        let history = reconcile(&events);

        let sequences: Vec<_> =
            history.iter().map(|entry| entry.sequence_number).collect();
        assert_eq!(sequences, vec![9, 7, 4, 2, 1]);
    }

    #[test]
    fn reconcile__empty_log_yields_empty_history() {
        assert!(reconcile(&[]).is_empty());
    }

    #[test]
    fn latest_event__picks_highest_sequence_number() {
        let events: Vec<_> = [3, 8, 5].into_iter().map(event).collect();

        let latest = latest_event(&events).unwrap();

        assert_eq!(latest.sequence_number, 8);
    }

    #[test]
    fn move_codes__map_to_display_labels() {
        assert_eq!(Move::try_from(0).unwrap().label(), "Rock");
        assert_eq!(Move::try_from(1).unwrap().label(), "Paper");
        assert_eq!(Move::try_from(2).unwrap().label(), "Scissors");
        assert!(Move::try_from(3).is_err());
    }

    #[test]
    fn result_codes__map_to_display_labels() {
        assert_eq!(GameResult::try_from(0).unwrap().label(), "Player Wins");
        assert_eq!(GameResult::try_from(1).unwrap().label(), "AI Wins");
        assert_eq!(GameResult::try_from(2).unwrap().label(), "Draw");
        assert!(GameResult::try_from(3).is_err());
    }

    proptest! {
        #[test]
        fn reconcile__never_exceeds_depth_and_stays_sorted(
            seqs in proptest::collection::vec(0u64..1000, 0..40)
        ) {
            let events: Vec<_> = seqs.into_iter().map(event).collect();

            let history = reconcile(&events);

            prop_assert!(history.len() <= HISTORY_DEPTH);
            prop_assert!(
                history
                    .windows(2)
                    .all(|pair| pair[0].sequence_number > pair[1].sequence_number)
            );
            prop_assert_eq!(history.clone(), reconcile(&events));
        }
    }
}

use crate::types::{GameSnapshot, GameState};

/// The five screens plus the startup failure state. Transitions are
/// driven by authoritative snapshots, never by local guesses about what
/// an operation will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No room on this chain: create, join or quick-match.
    Lobby,
    /// Room exists, opponent seat still empty.
    Waiting,
    /// Both seats taken, fleets being placed.
    Placement,
    InGame,
    /// Terminal: winner modal over the final boards, updates stopped.
    Ended,
    /// Startup probe failed; only quitting works from here.
    InitError,
}

impl Phase {
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Lobby => "Lobby",
            Phase::Waiting => "Waiting for opponent",
            Phase::Placement => "Fleet placement",
            Phase::InGame => "Battle",
            Phase::Ended => "Game over",
            Phase::InitError => "Startup failed",
        }
    }
}

/// Which screen a snapshot calls for. The room owns the answer; a missing
/// room means the lobby.
pub fn phase_for(snap: &GameSnapshot) -> Phase {
    match &snap.room {
        None => Phase::Lobby,
        Some(room) => {
            if room.winner_chain_id.is_some() {
                return Phase::Ended;
            }
            match room.game_state {
                GameState::WaitingForPlayer => Phase::Waiting,
                GameState::PlacingBoards => Phase::Placement,
                GameState::InGame => Phase::InGame,
                GameState::Ended => Phase::Ended,
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;

/// Lifecycle of the room record on the host chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    WaitingForPlayer,
    PlacingBoards,
    InGame,
    Ended,
}

/// Everything the attacker is allowed to know about an enemy cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnemyCell {
    Unknown,
    Miss,
    Hit,
    Sunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: u32,
    pub col: u32,
}

impl Coord {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Row-major cell index into a `size * size` board vector.
pub fn cell_index(size: u32, row: u32, col: u32) -> usize {
    (row * size + col) as usize
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub chain_id: String,
    pub name: String,
    pub board_submitted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub host_chain_id: String,
    pub status: RoomStatus,
    pub game_state: GameState,
    pub players: Vec<PlayerInfo>,
    pub current_attacker: Option<String>,
    pub pending_attack: Option<Coord>,
    pub winner_chain_id: Option<String>,
}

impl Room {
    pub fn player(&self, chain_id: &str) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.chain_id == chain_id)
    }

    pub fn opponent(&self, chain_id: &str) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.chain_id != chain_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyCellView {
    pub row: u32,
    pub col: u32,
    pub ship_id: Option<u32>,
    pub attacked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipView {
    pub id: u32,
    pub cells: Vec<Coord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBoardView {
    pub size: u32,
    pub cells: Vec<MyCellView>,
    pub ships: Vec<ShipView>,
}

/// Attacker-side projection of the opponent board, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyBoardView {
    pub size: u32,
    pub cells: Vec<EnemyCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Axis {
    Horiz,
    Vert,
}

/// One ship as submitted to the chain: anchor cell plus extent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipPlacement {
    pub row: u32,
    pub col: u32,
    pub length: u32,
    pub axis: Axis,
}

/// One authoritative read of everything the client renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub room: Option<Room>,
    pub my_board: Option<MyBoardView>,
    pub enemy_view: Option<EnemyBoardView>,
    #[serde(default)]
    pub is_my_turn: bool,
    #[serde(default)]
    pub has_submitted_board: bool,
    pub last_notification: Option<String>,
}

/// Effectful chain operations issued through the action gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    CreateRoom,
    JoinRoom,
    SearchPlayer,
    SubmitBoard,
    StartGame,
    Attack(Coord),
    LeaveRoom,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::CreateRoom => "create room",
            ActionKind::JoinRoom => "join room",
            ActionKind::SearchPlayer => "search player",
            ActionKind::SubmitBoard => "submit board",
            ActionKind::StartGame => "start game",
            ActionKind::Attack(_) => "attack",
            ActionKind::LeaveRoom => "leave room",
        }
    }
}

/// Messages from spawned tasks into the single UI loop. Every variant
/// carries the view token captured at spawn time; stale tokens are
/// dropped without side effects.
#[derive(Debug)]
pub enum UiEvent {
    /// Remote state may have changed. Opaque: the only valid reaction is a re-fetch.
    Changed { token: u64 },
    /// The push channel died after connecting; the screen falls back to polling.
    FeedLost { token: u64 },
    SnapshotReady {
        token: u64,
        result: Result<GameSnapshot, GatewayError>,
    },
    ActionDone {
        token: u64,
        action: ActionKind,
        result: Result<(), GatewayError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&GameState::WaitingForPlayer).unwrap(),
            "\"WAITING_FOR_PLAYER\""
        );
        assert_eq!(serde_json::to_string(&EnemyCell::Sunk).unwrap(), "\"SUNK\"");
        assert_eq!(serde_json::to_string(&Axis::Horiz).unwrap(), "\"HORIZ\"");
        let tag: EnemyCell = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(tag, EnemyCell::Unknown);
    }

    #[test]
    fn room_fields_are_camel_case() {
        let json = r#"{
            "roomId": "r-1",
            "hostChainId": "aaaa",
            "status": "ACTIVE",
            "gameState": "IN_GAME",
            "players": [
                {"chainId": "aaaa", "name": "Ada", "boardSubmitted": true},
                {"chainId": "bbbb", "name": "Bob", "boardSubmitted": true}
            ],
            "currentAttacker": "aaaa",
            "pendingAttack": {"row": 3, "col": 4},
            "winnerChainId": null
        }"#;
        let room: Room = serde_json::from_str(json).unwrap();
        assert_eq!(room.game_state, GameState::InGame);
        assert_eq!(room.pending_attack, Some(Coord::new(3, 4)));
        assert_eq!(room.opponent("aaaa").unwrap().name, "Bob");
    }

    #[test]
    fn cell_index_is_row_major() {
        assert_eq!(cell_index(10, 0, 0), 0);
        assert_eq!(cell_index(10, 0, 9), 9);
        assert_eq!(cell_index(10, 1, 0), 10);
        assert_eq!(cell_index(10, 9, 9), 99);
    }
}

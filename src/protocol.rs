use crate::error::GameError;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    // Request/response: the handler answers on the same socket.
    CreateRoom {
        player_name: String,
    },
    JoinRoom {
        room_code: String,
        player_name: String,
    },
    Reconnect {
        room_code: String,
        player_id: PlayerId,
    },
    /// Lightweight existence probe used before showing the join form.
    CheckRoom {
        room_code: String,
    },
    // Fire-and-forget: precondition failures are silent no-ops.
    LeaveRoom {
        room_code: String,
        player_id: PlayerId,
    },
    StartGame {
        room_code: String,
    },
    SubmitAnswer {
        room_code: String,
        player_id: PlayerId,
        answer: String,
    },
    RetractAnswer {
        room_code: String,
        player_id: PlayerId,
    },
    SubmitVote {
        room_code: String,
        voter_id: PlayerId,
        target_id: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
        players: Vec<PlayerInfo>,
    },
    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
        players: Vec<PlayerInfo>,
    },
    /// Reconnect ack: everything a client needs to resume where it was.
    SessionRestored {
        room_code: RoomCode,
        player_id: PlayerId,
        phase: GamePhase,
        players: Vec<PlayerInfo>,
        has_submitted: bool,
        /// Role and prompt, present while a round is active.
        #[serde(skip_serializing_if = "Option::is_none")]
        round_info: Option<RoundInfo>,
    },
    RoomChecked {
        room_code: RoomCode,
        exists: bool,
    },
    /// Full roster, broadcast on any membership or host change.
    UpdatePlayers {
        players: Vec<PlayerInfo>,
    },
    /// Unicast, individualized: the impostor gets the impostor prompt.
    RoundStart {
        role: PlayerRole,
        question: String,
    },
    /// Ids of players who have submitted so far (no answer text yet).
    UpdateAnswerCount {
        submitted: Vec<PlayerId>,
    },
    /// Everyone answered: the full answer set is revealed for voting.
    StartVoting {
        answers: Vec<Answer>,
    },
    PhaseChanged {
        phase: GamePhase,
    },
    GameOver {
        impostor_caught: bool,
        impostor_name: String,
        real_question: String,
    },
    /// A round was aborted back to the lobby mid-flight.
    GameReset {
        message: String,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl From<&GameError> for ServerMessage {
    fn from(err: &GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Public roster entry. Never exposes the connection id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub score: u32,
    pub avatar_index: u8,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            is_host: p.is_host,
            score: p.score,
            avatar_index: p.avatar_index,
        }
    }
}

/// A player's own view of the active round, rebuilt on reconnect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundInfo {
    pub role: PlayerRole,
    pub question: String,
}

/// Roster snapshot in wire form.
pub fn roster(room: &Room) -> Vec<PlayerInfo> {
    room.players.iter().map(PlayerInfo::from).collect()
}

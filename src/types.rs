use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type ConnectionId = String;
pub type RoomCode = String;

/// Number of avatar icons the frontend can render (index 0..AVATAR_COUNT).
pub const AVATAR_COUNT: u8 = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Lobby,
    Writing,
    Voting,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerRole {
    Normal,
    Impostor,
}

/// A normal/impostor prompt pair. Everyone but the impostor sees `normal`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionPair {
    pub normal: String,
    pub impostor: String,
}

#[derive(Debug, Clone)]
pub struct Player {
    /// Durable identity, stable across reconnects.
    pub id: PlayerId,
    /// Ephemeral delivery address, rebound on every reconnect.
    pub connection_id: ConnectionId,
    pub name: String,
    pub is_host: bool,
    /// Reserved for future scoring; never mutated by the round logic.
    pub score: u32,
    pub avatar_index: u8,
}

/// A submitted answer. Name and avatar are snapshots taken at submission
/// time so roster changes don't rewrite what's already on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub player_id: PlayerId,
    pub name: String,
    pub text: String,
    pub avatar_index: u8,
}

/// One isolated game session. All round state lives here.
#[derive(Debug, Clone)]
pub struct Room {
    /// Canonical (uppercase) room code.
    pub code: RoomCode,
    /// Insertion order is significant: host migration promotes the first
    /// remaining player, and the impostor is picked by index.
    pub players: Vec<Player>,
    pub phase: GamePhase,
    /// At most one answer per player, in submission order.
    pub answers: Vec<Answer>,
    /// Voter -> target. Insertion order (first vote per voter) drives the
    /// deterministic tie-break in the tally.
    pub votes: IndexMap<PlayerId, PlayerId>,
    pub current_pair: Option<QuestionPair>,
    pub impostor_id: Option<PlayerId>,
}

impl Room {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            players: Vec::new(),
            phase: GamePhase::Lobby,
            answers: Vec::new(),
            votes: IndexMap::new(),
            current_pair: None,
            impostor_id: None,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn contains_player(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    pub fn is_round_active(&self) -> bool {
        matches!(self.phase, GamePhase::Writing | GamePhase::Voting)
    }

    pub fn has_answered(&self, player_id: &str) -> bool {
        self.answers.iter().any(|a| a.player_id == player_id)
    }

    /// Ids of players who have submitted, in submission order.
    pub fn submitted_ids(&self) -> Vec<PlayerId> {
        self.answers.iter().map(|a| a.player_id.clone()).collect()
    }

    /// Recompute a player's role and prompt from the round state. Not stored
    /// per player, so it can never drift from `impostor_id`/`current_pair`.
    pub fn role_and_question(&self, player_id: &str) -> Option<(PlayerRole, String)> {
        let pair = self.current_pair.as_ref()?;
        let impostor_id = self.impostor_id.as_ref()?;
        if impostor_id == player_id {
            Some((PlayerRole::Impostor, pair.impostor.clone()))
        } else {
            Some((PlayerRole::Normal, pair.normal.clone()))
        }
    }

    /// The impostor's current display name, or a placeholder once they're
    /// gone from the roster.
    pub fn impostor_name(&self) -> String {
        self.impostor_id
            .as_ref()
            .and_then(|id| self.player(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "The Impostor (left)".to_string())
    }

    /// The non-impostor prompt revealed at the end of a round.
    pub fn real_question(&self) -> String {
        self.current_pair
            .as_ref()
            .map(|pair| pair.normal.clone())
            .unwrap_or_default()
    }

    /// Drop all round-scoped state and return to the lobby.
    pub fn reset_round(&mut self) {
        self.phase = GamePhase::Lobby;
        self.answers.clear();
        self.votes.clear();
        self.current_pair = None;
        self.impostor_id = None;
    }
}

/// What a live connection is bound to, so a disconnect signal (which carries
/// nothing but the connection id) can be resolved to a room and player.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBinding {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
}

use crate::types::GamePhase;

/// Result type for room/round operations
pub type GameResult<T> = Result<T, GameError>;

/// Failures surfaced to clients on the request/response path. Fire-and-forget
/// operations swallow these as no-ops (there is no channel to report them on).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Player not found")]
    PlayerNotFound,

    #[error("Round is not in the {0:?} phase")]
    RoundNotActive(GamePhase),
}

impl GameError {
    /// Stable wire code for the `error` message.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "ROOM_NOT_FOUND",
            GameError::GameAlreadyStarted => "GAME_IN_PROGRESS",
            GameError::PlayerNotFound => "PLAYER_NOT_FOUND",
            GameError::RoundNotActive(_) => "ROUND_NOT_ACTIVE",
        }
    }
}

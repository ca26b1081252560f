//! WebSocket message dispatch
//!
//! Request/response messages return an ack for the socket task to send back.
//! Fire-and-forget messages mutate state, push any fallout through the
//! connection outboxes, and return `None` even when they no-op.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

fn malformed(msg: &str) -> ServerMessage {
    ServerMessage::Error {
        code: "PARSE_ERROR".to_string(),
        msg: msg.to_string(),
    }
}

/// Handle a client message and return the optional ack.
pub async fn handle_message(
    msg: ClientMessage,
    conn_id: &str,
    state: &AppState,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateRoom { player_name } => {
            let name = player_name.trim();
            if name.is_empty() {
                return Some(malformed("player_name must not be empty"));
            }
            Some(state.create_room(conn_id, name).await)
        }

        ClientMessage::JoinRoom {
            room_code,
            player_name,
        } => {
            let name = player_name.trim();
            if name.is_empty() {
                return Some(malformed("player_name must not be empty"));
            }
            match state.join_room(conn_id, &room_code, name).await {
                Ok(ack) => Some(ack),
                Err(e) => Some(ServerMessage::from(&e)),
            }
        }

        ClientMessage::Reconnect {
            room_code,
            player_id,
        } => match state.reconnect(conn_id, &room_code, &player_id).await {
            Ok(ack) => Some(ack),
            Err(e) => Some(ServerMessage::from(&e)),
        },

        ClientMessage::CheckRoom { room_code } => Some(state.check_room(&room_code).await),

        ClientMessage::LeaveRoom {
            room_code,
            player_id,
        } => {
            state.leave_room(&room_code, &player_id).await;
            None
        }

        ClientMessage::StartGame { room_code } => {
            state.start_round(&room_code).await;
            None
        }

        ClientMessage::SubmitAnswer {
            room_code,
            player_id,
            answer,
        } => {
            state.submit_answer(&room_code, &player_id, &answer).await;
            None
        }

        ClientMessage::RetractAnswer {
            room_code,
            player_id,
        } => {
            state.retract_answer(&room_code, &player_id).await;
            None
        }

        ClientMessage::SubmitVote {
            room_code,
            voter_id,
            target_id,
        } => {
            state.submit_vote(&room_code, &voter_id, &target_id).await;
            None
        }
    }
}

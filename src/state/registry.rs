use super::roster::new_player;
use super::AppState;
use crate::protocol::{roster, ServerMessage};
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;

/// Room codes avoid characters that read ambiguously when shouted across a
/// living room (no I/L/O/0/1).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// Canonical form for user-typed room codes.
pub(crate) fn normalize_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

/// Uniqueness comes from the retry loop, not the generator.
fn generate_room_code(rooms: &HashMap<RoomCode, Room>) -> RoomCode {
    let mut rng = rand::rng();
    loop {
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        if !rooms.contains_key(&code) {
            return code;
        }
    }
}

impl AppState {
    /// Open a new room with the caller as its host.
    pub async fn create_room(&self, conn_id: &str, player_name: &str) -> ServerMessage {
        let mut rooms = self.rooms.write().await;
        let code = generate_room_code(&rooms);
        let mut room = Room::new(code.clone());
        let player = new_player(conn_id, player_name, true);
        let player_id = player.id.clone();
        room.players.push(player);
        let players = roster(&room);
        rooms.insert(code.clone(), room);
        drop(rooms);

        self.bindings.write().await.insert(
            conn_id.to_string(),
            SessionBinding {
                room_code: code.clone(),
                player_id: player_id.clone(),
            },
        );

        tracing::info!("Room {} created by {}", code, player_name);
        ServerMessage::RoomCreated {
            room_code: code,
            player_id,
            players,
        }
    }

    pub async fn room_exists(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(&normalize_code(code))
    }

    /// Non-mutating existence probe, used before showing the join form.
    pub async fn check_room(&self, code: &str) -> ServerMessage {
        let code = normalize_code(code);
        let exists = self.rooms.read().await.contains_key(&code);
        ServerMessage::RoomChecked {
            room_code: code,
            exists,
        }
    }

    /// Remove a room outright. Idempotent.
    pub async fn destroy_room(&self, code: &str) {
        let code = normalize_code(code);
        if self.rooms.write().await.remove(&code).is_some() {
            tracing::info!("Room {} destroyed", code);
        }
    }
}

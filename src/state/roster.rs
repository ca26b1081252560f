use super::registry::normalize_code;
use super::{check_answers_complete, check_votes_complete, queue_room, AppState, Outbound};
use crate::error::{GameError, GameResult};
use crate::protocol::{roster, RoundInfo, ServerMessage};
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;

/// Fresh durable identity with a random avatar.
pub(crate) fn new_player(conn_id: &str, name: &str, is_host: bool) -> Player {
    let avatar_index = {
        let mut rng = rand::rng();
        rng.random_range(0..AVATAR_COUNT)
    };
    Player {
        id: ulid::Ulid::new().to_string(),
        connection_id: conn_id.to_string(),
        name: name.to_string(),
        is_host,
        score: 0,
        avatar_index,
    }
}

impl AppState {
    /// Join an open room. Only possible while the room sits in the lobby.
    pub async fn join_room(
        &self,
        conn_id: &str,
        code: &str,
        player_name: &str,
    ) -> GameResult<ServerMessage> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&code).ok_or(GameError::RoomNotFound)?;
        if room.phase != GamePhase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }

        let player = new_player(conn_id, player_name, room.players.is_empty());
        let player_id = player.id.clone();
        room.players.push(player);

        let players = roster(room);
        let mut out = Outbound::new();
        queue_room(
            room,
            &ServerMessage::UpdatePlayers {
                players: players.clone(),
            },
            &mut out,
        );
        drop(rooms);

        self.bindings.write().await.insert(
            conn_id.to_string(),
            SessionBinding {
                room_code: code.clone(),
                player_id: player_id.clone(),
            },
        );

        tracing::info!("{} joined room {}", player_name, code);
        self.deliver(out).await;
        Ok(ServerMessage::RoomJoined {
            room_code: code,
            player_id,
            players,
        })
    }

    /// Rebind a durable player id to a fresh connection and hand back
    /// everything the client needs to resume where it was.
    pub async fn reconnect(
        &self,
        conn_id: &str,
        code: &str,
        player_id: &str,
    ) -> GameResult<ServerMessage> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let mut bindings = self.bindings.write().await;
        let room = rooms.get_mut(&code).ok_or(GameError::RoomNotFound)?;
        let player = room.player_mut(player_id).ok_or(GameError::PlayerNotFound)?;

        let old_conn = std::mem::replace(&mut player.connection_id, conn_id.to_string());
        let name = player.name.clone();

        // Rebinding invalidates the old socket: its late close must not
        // resolve to this player any more.
        bindings.remove(&old_conn);
        bindings.insert(
            conn_id.to_string(),
            SessionBinding {
                room_code: code.clone(),
                player_id: player_id.to_string(),
            },
        );

        let has_submitted = room.has_answered(player_id);
        let round_info = if room.is_round_active() {
            room.role_and_question(player_id)
                .map(|(role, question)| RoundInfo { role, question })
        } else {
            None
        };

        let players = roster(room);
        let mut out = Outbound::new();
        queue_room(
            room,
            &ServerMessage::UpdatePlayers {
                players: players.clone(),
            },
            &mut out,
        );
        if room.phase == GamePhase::Voting {
            // Resume the voting screen with the already-revealed answers.
            out.push((
                conn_id.to_string(),
                ServerMessage::StartVoting {
                    answers: room.answers.clone(),
                },
            ));
        }
        let phase = room.phase.clone();
        drop(bindings);
        drop(rooms);

        tracing::info!("{} reconnected to room {}", name, code);
        self.deliver(out).await;
        Ok(ServerMessage::SessionRestored {
            room_code: code,
            player_id: player_id.to_string(),
            phase,
            players,
            has_submitted,
            round_info,
        })
    }

    /// Explicit departure. Precondition failures are silent no-ops.
    pub async fn leave_room(&self, code: &str, player_id: &str) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let mut bindings = self.bindings.write().await;
        let out = remove_player(&mut rooms, &mut bindings, &code, player_id);
        drop(bindings);
        drop(rooms);
        self.deliver(out).await;
    }

    /// A closed socket resolves through its session binding and is then
    /// treated exactly like an explicit leave. Unbound connections (never
    /// joined, already left, or superseded by a reconnect) are no-ops.
    pub async fn handle_disconnect(&self, conn_id: &str) {
        let mut rooms = self.rooms.write().await;
        let mut bindings = self.bindings.write().await;
        let Some(binding) = bindings.get(conn_id).cloned() else {
            return;
        };
        tracing::debug!(
            "Connection {} closed, removing player {} from room {}",
            conn_id,
            binding.player_id,
            binding.room_code
        );
        let out = remove_player(
            &mut rooms,
            &mut bindings,
            &binding.room_code,
            &binding.player_id,
        );
        drop(bindings);
        drop(rooms);
        self.deliver(out).await;
    }
}

/// The one removal routine shared by leave and disconnect.
///
/// Order matters: host migration first, then the mid-round policy, then the
/// roster broadcast so clients see the final shape of the room.
fn remove_player(
    rooms: &mut HashMap<RoomCode, Room>,
    bindings: &mut HashMap<ConnectionId, SessionBinding>,
    code: &str,
    player_id: &str,
) -> Outbound {
    let mut out = Outbound::new();
    let Some(room) = rooms.get_mut(code) else {
        return out;
    };
    let Some(idx) = room.players.iter().position(|p| p.id == player_id) else {
        return out;
    };
    let removed = room.players.remove(idx);
    bindings.remove(&removed.connection_id);
    tracing::info!("{} left room {}", removed.name, code);

    if room.players.is_empty() {
        rooms.remove(code);
        tracing::info!("Room {} is empty, destroying it", code);
        return out;
    }

    if removed.is_host {
        room.players[0].is_host = true;
    }

    if room.is_round_active() {
        if room.impostor_id.as_deref() == Some(player_id) {
            // The impostor fled. That settles the round on the spot.
            room.phase = GamePhase::Result;
            queue_room(
                room,
                &ServerMessage::GameOver {
                    impostor_caught: true,
                    impostor_name: format!("{} (fled)", removed.name),
                    real_question: room.real_question(),
                },
                &mut out,
            );
            queue_room(
                room,
                &ServerMessage::PhaseChanged {
                    phase: GamePhase::Result,
                },
                &mut out,
            );
        } else if room.players.len() < 2 {
            room.reset_round();
            queue_room(
                room,
                &ServerMessage::GameReset {
                    message: "Not enough players to keep playing. Back to the lobby.".to_string(),
                },
                &mut out,
            );
            queue_room(
                room,
                &ServerMessage::PhaseChanged {
                    phase: GamePhase::Lobby,
                },
                &mut out,
            );
        } else if room.phase == GamePhase::Writing {
            room.answers.retain(|a| a.player_id != player_id);
            queue_room(
                room,
                &ServerMessage::UpdateAnswerCount {
                    submitted: room.submitted_ids(),
                },
                &mut out,
            );
            check_answers_complete(room, &mut out);
        } else {
            room.votes.shift_remove(player_id);
            check_votes_complete(room, &mut out);
        }
    }

    queue_room(
        room,
        &ServerMessage::UpdatePlayers {
            players: roster(room),
        },
        &mut out,
    );
    out
}

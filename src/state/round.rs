use super::registry::normalize_code;
use super::{queue_room, AppState, Outbound};
use crate::protocol::ServerMessage;
use crate::types::*;
use rand::Rng;

/// Shown when the question bank has nothing to offer.
const PLACEHOLDER_PROMPT: &str = "(no question available)";

impl AppState {
    /// Kick off a round: wipe per-round state, pick an impostor, deal the
    /// prompts. Callable from the lobby and from a finished round, never
    /// while one is running. Precondition failures are silent no-ops.
    pub async fn start_round(&self, code: &str) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&code) else {
            tracing::debug!("start_round: room {} not found", code);
            return;
        };
        if room.players.len() < 2 {
            tracing::debug!("start_round: room {} has too few players", code);
            return;
        }
        if room.is_round_active() {
            tracing::debug!("start_round: room {} already has a round running", code);
            return;
        }

        room.answers.clear();
        room.votes.clear();

        let impostor_id = {
            let mut rng = rand::rng();
            let idx = rng.random_range(0..room.players.len());
            room.players[idx].id.clone()
        };
        room.impostor_id = Some(impostor_id);
        room.current_pair = Some(self.questions.next().unwrap_or_else(|| QuestionPair {
            normal: PLACEHOLDER_PROMPT.to_string(),
            impostor: PLACEHOLDER_PROMPT.to_string(),
        }));
        room.phase = GamePhase::Writing;

        let mut out = Outbound::new();
        for p in &room.players {
            if let Some((role, question)) = room.role_and_question(&p.id) {
                out.push((
                    p.connection_id.clone(),
                    ServerMessage::RoundStart { role, question },
                ));
            }
        }
        queue_room(
            room,
            &ServerMessage::PhaseChanged {
                phase: GamePhase::Writing,
            },
            &mut out,
        );

        tracing::info!(
            "Round started in room {} with {} players",
            code,
            room.players.len()
        );
        drop(rooms);
        self.deliver(out).await;
    }

    /// Record or replace a player's answer. When the last outstanding player
    /// submits, the room advances to voting and the answers are revealed.
    pub async fn submit_answer(&self, code: &str, player_id: &str, text: &str) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&code) else {
            return;
        };
        if room.phase != GamePhase::Writing {
            tracing::debug!("submit_answer: room {} is not collecting answers", code);
            return;
        }
        let Some(player) = room.player(player_id) else {
            return;
        };
        // Snapshot of the identifying fields: a later roster change must not
        // rewrite answers already on record.
        let (name, avatar_index) = (player.name.clone(), player.avatar_index);

        if let Some(answer) = room.answers.iter_mut().find(|a| a.player_id == player_id) {
            answer.text = text.to_string();
        } else {
            room.answers.push(Answer {
                player_id: player_id.to_string(),
                name,
                text: text.to_string(),
                avatar_index,
            });
        }

        let mut out = Outbound::new();
        queue_room(
            room,
            &ServerMessage::UpdateAnswerCount {
                submitted: room.submitted_ids(),
            },
            &mut out,
        );
        check_answers_complete(room, &mut out);
        drop(rooms);
        self.deliver(out).await;
    }

    /// Withdraw a pending answer so it can be rewritten before the round
    /// advances. Safe in any phase and idempotent.
    pub async fn retract_answer(&self, code: &str, player_id: &str) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&code) else {
            return;
        };
        room.answers.retain(|a| a.player_id != player_id);

        let mut out = Outbound::new();
        queue_room(
            room,
            &ServerMessage::UpdateAnswerCount {
                submitted: room.submitted_ids(),
            },
            &mut out,
        );
        drop(rooms);
        self.deliver(out).await;
    }
}

/// Advance to voting once every current player has an answer in. Departures
/// shrink the denominator, so this runs on removals as well as submissions.
pub(crate) fn check_answers_complete(room: &mut Room, out: &mut Outbound) {
    if room.phase != GamePhase::Writing || room.answers.len() < room.players.len() {
        return;
    }
    room.phase = GamePhase::Voting;
    queue_room(
        room,
        &ServerMessage::StartVoting {
            answers: room.answers.clone(),
        },
        out,
    );
    queue_room(
        room,
        &ServerMessage::PhaseChanged {
            phase: GamePhase::Voting,
        },
        out,
    );
}

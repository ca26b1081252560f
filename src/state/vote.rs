use super::registry::normalize_code;
use super::{queue_room, AppState, Outbound};
use crate::protocol::ServerMessage;
use crate::types::*;
use indexmap::IndexMap;

impl AppState {
    /// Record a ballot. A voter may change their mind any number of times
    /// before the tally runs; only the latest target counts.
    pub async fn submit_vote(&self, code: &str, voter_id: &str, target_id: &str) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&code) else {
            return;
        };
        if room.phase != GamePhase::Voting {
            tracing::debug!("submit_vote: room {} is not voting", code);
            return;
        }
        if !room.contains_player(voter_id) {
            return;
        }
        room.votes
            .insert(voter_id.to_string(), target_id.to_string());

        let mut out = Outbound::new();
        check_votes_complete(room, &mut out);
        drop(rooms);
        self.deliver(out).await;
    }
}

/// Run the tally once every current player has a ballot in. Votes from
/// players who since left stay stored but neither count nor block.
pub(crate) fn check_votes_complete(room: &mut Room, out: &mut Outbound) {
    if room.phase != GamePhase::Voting {
        return;
    }
    let valid = room
        .votes
        .keys()
        .filter(|voter| room.contains_player(voter))
        .count();
    if valid < room.players.len() {
        return;
    }
    let Some(winner) = winning_target(room) else {
        return;
    };

    let impostor_caught = room.impostor_id.as_deref() == Some(winner.as_str());
    room.phase = GamePhase::Result;
    tracing::info!(
        "Room {} round over: most voted {}, impostor caught: {}",
        room.code,
        winner,
        impostor_caught
    );
    queue_room(
        room,
        &ServerMessage::GameOver {
            impostor_caught,
            impostor_name: room.impostor_name(),
            real_question: room.real_question(),
        },
        out,
    );
    queue_room(
        room,
        &ServerMessage::PhaseChanged {
            phase: GamePhase::Result,
        },
        out,
    );
}

/// Count votes per target, scanning in first-vote order; a strictly greater
/// count is needed to displace the front-runner, so ties break toward the
/// target whose first vote arrived earliest.
pub(crate) fn winning_target(room: &Room) -> Option<PlayerId> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for (voter, target) in &room.votes {
        if room.contains_player(voter) {
            *counts.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (target, count) in &counts {
        if best.map_or(true, |(_, b)| *count > b) {
            best = Some((target, *count));
        }
    }
    best.map(|(target, _)| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_players(ids: &[&str]) -> Room {
        let mut room = Room::new("TEST1".to_string());
        for id in ids {
            room.players.push(Player {
                id: id.to_string(),
                connection_id: format!("conn-{}", id),
                name: id.to_uppercase(),
                is_host: room.players.is_empty(),
                score: 0,
                avatar_index: 0,
            });
        }
        room
    }

    #[test]
    fn majority_wins_regardless_of_vote_order() {
        let mut room = room_with_players(&["a", "b", "c"]);
        room.votes.insert("c".into(), "a".into());
        room.votes.insert("a".into(), "c".into());
        room.votes.insert("b".into(), "c".into());

        assert_eq!(winning_target(&room), Some("c".to_string()));
    }

    #[test]
    fn tie_goes_to_the_first_voted_target() {
        let mut room = room_with_players(&["a", "b"]);
        room.votes.insert("a".into(), "b".into());
        room.votes.insert("b".into(), "a".into());

        assert_eq!(winning_target(&room), Some("b".to_string()));
    }

    #[test]
    fn votes_from_departed_players_are_ignored() {
        let mut room = room_with_players(&["a", "b"]);
        room.votes.insert("ghost".into(), "a".into());
        room.votes.insert("a".into(), "b".into());

        assert_eq!(winning_target(&room), Some("b".to_string()));
    }

    #[test]
    fn no_votes_means_no_winner() {
        let room = room_with_players(&["a", "b"]);
        assert_eq!(winning_target(&room), None);
    }

    #[test]
    fn overwriting_a_vote_counts_only_the_latest_target() {
        let mut room = room_with_players(&["a", "b", "c"]);
        room.votes.insert("a".into(), "b".into());
        room.votes.insert("b".into(), "c".into());
        room.votes.insert("a".into(), "c".into());

        assert_eq!(room.votes.len(), 2);
        assert_eq!(winning_target(&room), Some("c".to_string()));
    }
}

use oddmonkey::protocol::{ClientMessage, ServerMessage};
use oddmonkey::state::AppState;
use oddmonkey::types::{GamePhase, PlayerRole};
use oddmonkey::ws::handlers::handle_message;
use tokio::sync::mpsc;

async fn connect(state: &AppState, conn: &str) -> mpsc::UnboundedReceiver<ServerMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    state.register_connection(conn, tx).await;
    rx
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// End-to-end integration test for a complete round over the message protocol
#[tokio::test]
async fn test_full_game_flow() {
    let state = AppState::default();

    // 1. Host opens a socket and creates a room
    let mut ana_rx = connect(&state, "conn_ana").await;

    let created = handle_message(
        ClientMessage::CreateRoom {
            player_name: "Ana".to_string(),
        },
        "conn_ana",
        &state,
    )
    .await;

    let (room_code, ana_id) = match created {
        Some(ServerMessage::RoomCreated {
            room_code,
            player_id,
            players,
        }) => {
            assert_eq!(players.len(), 1);
            assert!(players[0].is_host, "Room creator starts as host");
            assert_eq!(players[0].score, 0);
            (room_code, player_id)
        }
        other => panic!("Expected RoomCreated, got {:?}", other),
    };

    // 2. Two more players join, one typing the code in lowercase
    let mut ben_rx = connect(&state, "conn_ben").await;
    let joined = handle_message(
        ClientMessage::JoinRoom {
            room_code: room_code.to_lowercase(),
            player_name: "Ben".to_string(),
        },
        "conn_ben",
        &state,
    )
    .await;

    let ben_id = match joined {
        Some(ServerMessage::RoomJoined {
            player_id, players, ..
        }) => {
            assert_eq!(players.len(), 2);
            player_id
        }
        other => panic!("Expected RoomJoined, got {:?}", other),
    };

    let mut cleo_rx = connect(&state, "conn_cleo").await;
    let joined = handle_message(
        ClientMessage::JoinRoom {
            room_code: room_code.clone(),
            player_name: "Cleo".to_string(),
        },
        "conn_cleo",
        &state,
    )
    .await;

    let cleo_id = match joined {
        Some(ServerMessage::RoomJoined {
            player_id, players, ..
        }) => {
            assert_eq!(players.len(), 3);
            player_id
        }
        other => panic!("Expected RoomJoined, got {:?}", other),
    };

    // 3. Each join was broadcast to the players already in the room
    let ana_msgs = drain(&mut ana_rx);
    let rosters = ana_msgs
        .iter()
        .filter(|m| matches!(m, ServerMessage::UpdatePlayers { .. }))
        .count();
    assert_eq!(rosters, 2, "Host sees one roster update per join");
    drain(&mut ben_rx);
    drain(&mut cleo_rx);

    // 4. Starting the game deals one impostor and unicasts the prompts
    let ack = handle_message(
        ClientMessage::StartGame {
            room_code: room_code.clone(),
        },
        "conn_ana",
        &state,
    )
    .await;
    assert!(ack.is_none(), "start_game is fire-and-forget");

    let mut dealt = Vec::new();
    for (rx, player_id) in [
        (&mut ana_rx, &ana_id),
        (&mut ben_rx, &ben_id),
        (&mut cleo_rx, &cleo_id),
    ] {
        let msgs = drain(rx);
        assert_eq!(msgs.len(), 2);
        match &msgs[0] {
            ServerMessage::RoundStart { role, question } => {
                dealt.push((player_id.clone(), role.clone(), question.clone()));
            }
            other => panic!("Expected RoundStart, got {:?}", other),
        }
        assert!(matches!(
            msgs[1],
            ServerMessage::PhaseChanged {
                phase: GamePhase::Writing
            }
        ));
    }

    let impostors: Vec<_> = dealt
        .iter()
        .filter(|(_, role, _)| *role == PlayerRole::Impostor)
        .collect();
    assert_eq!(impostors.len(), 1, "Exactly one player is the impostor");
    let impostor_id = impostors[0].0.clone();
    let impostor_question = impostors[0].2.clone();

    let normal_questions: Vec<_> = dealt
        .iter()
        .filter(|(_, role, _)| *role == PlayerRole::Normal)
        .map(|(_, _, question)| question)
        .collect();
    assert_eq!(normal_questions.len(), 2);
    assert_eq!(
        normal_questions[0], normal_questions[1],
        "Regular players share the same question"
    );
    assert_ne!(
        &impostor_question, normal_questions[0],
        "The impostor gets a different question"
    );

    // 5. Everyone writes an answer
    for (conn, player_id, text) in [
        ("conn_ana", &ana_id, "Pancakes"),
        ("conn_ben", &ben_id, "Cold pizza"),
        ("conn_cleo", &cleo_id, "Leftover noodles"),
    ] {
        let ack = handle_message(
            ClientMessage::SubmitAnswer {
                room_code: room_code.clone(),
                player_id: player_id.clone(),
                answer: text.to_string(),
            },
            conn,
            &state,
        )
        .await;
        assert!(ack.is_none());
    }

    // 6. The third answer flips the room into voting
    for rx in [&mut ana_rx, &mut ben_rx, &mut cleo_rx] {
        let msgs = drain(rx);
        assert_eq!(msgs.len(), 5, "Three count updates, then the reveal");
        match &msgs[3] {
            ServerMessage::StartVoting { answers } => {
                assert_eq!(answers.len(), 3);
            }
            other => panic!("Expected StartVoting, got {:?}", other),
        }
        assert!(matches!(
            msgs[4],
            ServerMessage::PhaseChanged {
                phase: GamePhase::Voting
            }
        ));
    }

    // 7. Everyone votes for the impostor
    for (conn, voter_id) in [
        ("conn_ana", &ana_id),
        ("conn_ben", &ben_id),
        ("conn_cleo", &cleo_id),
    ] {
        handle_message(
            ClientMessage::SubmitVote {
                room_code: room_code.clone(),
                voter_id: voter_id.clone(),
                target_id: impostor_id.clone(),
            },
            conn,
            &state,
        )
        .await;
    }

    // 8. The last vote resolves the round for the whole room
    let impostor_name = if impostor_id == ana_id {
        "Ana"
    } else if impostor_id == ben_id {
        "Ben"
    } else {
        "Cleo"
    };

    for rx in [&mut ana_rx, &mut ben_rx, &mut cleo_rx] {
        let msgs = drain(rx);
        assert_eq!(msgs.len(), 2);
        match &msgs[0] {
            ServerMessage::GameOver {
                impostor_caught,
                impostor_name: name,
                real_question,
            } => {
                assert!(*impostor_caught, "A unanimous vote catches the impostor");
                assert_eq!(name, impostor_name);
                assert_eq!(real_question, normal_questions[0]);
            }
            other => panic!("Expected GameOver, got {:?}", other),
        }
        assert!(matches!(
            msgs[1],
            ServerMessage::PhaseChanged {
                phase: GamePhase::Result
            }
        ));
    }

    // 9. The next round starts straight from the results screen
    handle_message(
        ClientMessage::StartGame {
            room_code: room_code.clone(),
        },
        "conn_ana",
        &state,
    )
    .await;

    let msgs = drain(&mut ana_rx);
    assert!(matches!(msgs[0], ServerMessage::RoundStart { .. }));
    assert!(matches!(
        msgs[1],
        ServerMessage::PhaseChanged {
            phase: GamePhase::Writing
        }
    ));

    println!("✅ Full game flow integration test passed!");
}

/// Test that a reconnect mid-round restores the session without losing progress
#[tokio::test]
async fn test_reconnect_resumes_a_live_round() {
    let state = AppState::default();

    let mut ana_rx = connect(&state, "c1").await;
    let created = handle_message(
        ClientMessage::CreateRoom {
            player_name: "Ana".to_string(),
        },
        "c1",
        &state,
    )
    .await;
    let (room_code, ana_id) = match created {
        Some(ServerMessage::RoomCreated {
            room_code,
            player_id,
            ..
        }) => (room_code, player_id),
        other => panic!("Expected RoomCreated, got {:?}", other),
    };

    let mut ben_rx = connect(&state, "c2").await;
    let joined = handle_message(
        ClientMessage::JoinRoom {
            room_code: room_code.clone(),
            player_name: "Ben".to_string(),
        },
        "c2",
        &state,
    )
    .await;
    let ben_id = match joined {
        Some(ServerMessage::RoomJoined { player_id, .. }) => player_id,
        other => panic!("Expected RoomJoined, got {:?}", other),
    };

    handle_message(
        ClientMessage::StartGame {
            room_code: room_code.clone(),
        },
        "c1",
        &state,
    )
    .await;

    handle_message(
        ClientMessage::SubmitAnswer {
            room_code: room_code.clone(),
            player_id: ben_id.clone(),
            answer: "A sock full of marbles".to_string(),
        },
        "c2",
        &state,
    )
    .await;

    drain(&mut ana_rx);
    drain(&mut ben_rx);

    // Ben's phone changes networks: a fresh socket presents his stored identity
    let mut ben2_rx = connect(&state, "c2-reborn").await;
    let restored = handle_message(
        ClientMessage::Reconnect {
            room_code: room_code.clone(),
            player_id: ben_id.clone(),
        },
        "c2-reborn",
        &state,
    )
    .await;

    match restored {
        Some(ServerMessage::SessionRestored {
            phase,
            players,
            has_submitted,
            round_info,
            ..
        }) => {
            assert_eq!(phase, GamePhase::Writing);
            assert_eq!(players.len(), 2);
            assert!(has_submitted, "The answer from before the drop still counts");
            let info = round_info.expect("An active round comes with the player's prompt");
            assert!(!info.question.is_empty());
        }
        other => panic!("Expected SessionRestored, got {:?}", other),
    }

    let ana_msgs = drain(&mut ana_rx);
    assert!(
        ana_msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::UpdatePlayers { .. })),
        "The roster is rebroadcast after a reconnect"
    );

    // The old socket's close arrives late and must not take Ben out of the game
    state.handle_disconnect("c2").await;

    handle_message(
        ClientMessage::SubmitAnswer {
            room_code: room_code.clone(),
            player_id: ana_id.clone(),
            answer: "An umbrella".to_string(),
        },
        "c1",
        &state,
    )
    .await;

    let ben_msgs = drain(&mut ben2_rx);
    assert!(
        ben_msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::StartVoting { .. })),
        "Both players still count, so the second answer completes the phase"
    );

    println!("✅ Reconnect mid-round test passed!");
}

/// Test that a running game rejects newcomers and unknown identities
#[tokio::test]
async fn test_late_join_is_rejected() {
    let state = AppState::default();

    let _ana_rx = connect(&state, "c1").await;
    let created = handle_message(
        ClientMessage::CreateRoom {
            player_name: "Ana".to_string(),
        },
        "c1",
        &state,
    )
    .await;
    let room_code = match created {
        Some(ServerMessage::RoomCreated { room_code, .. }) => room_code,
        other => panic!("Expected RoomCreated, got {:?}", other),
    };

    let _ben_rx = connect(&state, "c2").await;
    handle_message(
        ClientMessage::JoinRoom {
            room_code: room_code.clone(),
            player_name: "Ben".to_string(),
        },
        "c2",
        &state,
    )
    .await;

    handle_message(
        ClientMessage::StartGame {
            room_code: room_code.clone(),
        },
        "c1",
        &state,
    )
    .await;

    let _zoe_rx = connect(&state, "c3").await;
    let result = handle_message(
        ClientMessage::JoinRoom {
            room_code: room_code.clone(),
            player_name: "Zoe".to_string(),
        },
        "c3",
        &state,
    )
    .await;

    match result {
        Some(ServerMessage::Error { code, .. }) => {
            assert_eq!(code, "GAME_IN_PROGRESS");
        }
        other => panic!("Expected error for a mid-round join, got {:?}", other),
    }

    // An identity the room has never seen cannot reconnect into it either
    let result = handle_message(
        ClientMessage::Reconnect {
            room_code: room_code.clone(),
            player_id: "nobody".to_string(),
        },
        "c3",
        &state,
    )
    .await;

    match result {
        Some(ServerMessage::Error { code, .. }) => {
            assert_eq!(code, "PLAYER_NOT_FOUND");
        }
        other => panic!("Expected error for an unknown identity, got {:?}", other),
    }
}

// ============================================================================
// Wire Format Tests
// ============================================================================

/// Test that client frames parse from their tagged JSON form
#[test]
fn test_client_messages_parse_from_tagged_json() {
    let msg: ClientMessage =
        serde_json::from_str(r#"{"t":"join_room","room_code":"ab2cd","player_name":"Ana"}"#)
            .expect("join_room should parse");
    assert!(matches!(
        msg,
        ClientMessage::JoinRoom { room_code, player_name }
            if room_code == "ab2cd" && player_name == "Ana"
    ));

    let msg: ClientMessage = serde_json::from_str(
        r#"{"t":"submit_vote","room_code":"AB2CD","voter_id":"p1","target_id":"p2"}"#,
    )
    .expect("submit_vote should parse");
    assert!(matches!(
        msg,
        ClientMessage::SubmitVote { voter_id, target_id, .. }
            if voter_id == "p1" && target_id == "p2"
    ));

    let msg: ClientMessage = serde_json::from_str(r#"{"t":"check_room","room_code":"AB2CD"}"#)
        .expect("check_room should parse");
    assert!(matches!(msg, ClientMessage::CheckRoom { .. }));
}

/// Test that server frames carry snake_case tags and screaming phase names
#[test]
fn test_server_messages_use_snake_case_tags() {
    let v = serde_json::to_value(ServerMessage::RoomChecked {
        room_code: "AB2CD".to_string(),
        exists: true,
    })
    .unwrap();
    assert_eq!(v["t"], "room_checked");
    assert_eq!(v["exists"], true);

    let v = serde_json::to_value(ServerMessage::PhaseChanged {
        phase: GamePhase::Voting,
    })
    .unwrap();
    assert_eq!(v["t"], "phase_changed");
    assert_eq!(v["phase"], "VOTING");

    let v = serde_json::to_value(ServerMessage::GameOver {
        impostor_caught: false,
        impostor_name: "Ben".to_string(),
        real_question: "What's the best food to eat at midnight?".to_string(),
    })
    .unwrap();
    assert_eq!(v["t"], "game_over");
    assert_eq!(v["impostor_caught"], false);
    assert_eq!(v["impostor_name"], "Ben");
}

/// Test that a lobby-phase session restore omits the round block entirely
#[test]
fn test_session_restored_omits_round_info_in_lobby() {
    let v = serde_json::to_value(ServerMessage::SessionRestored {
        room_code: "AB2CD".to_string(),
        player_id: "p1".to_string(),
        phase: GamePhase::Lobby,
        players: Vec::new(),
        has_submitted: false,
        round_info: None,
    })
    .unwrap();
    assert_eq!(v["t"], "session_restored");
    assert_eq!(v["phase"], "LOBBY");
    assert!(v.get("round_info").is_none());
}

/// Test that frames the protocol does not know fail to parse
#[test]
fn test_malformed_frames_fail_to_parse() {
    assert!(serde_json::from_str::<ClientMessage>("not json at all").is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"no_such_message"}"#).is_err());
    // A known tag missing required fields is malformed too
    assert!(
        serde_json::from_str::<ClientMessage>(r#"{"t":"submit_vote","room_code":"AB2CD"}"#)
            .is_err()
    );
}

//! Integration tests for rooms and the registry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use quizforge_protocol::{RoomCode, ScoreEntry, ServerMessage};
use quizforge_room::{
    BotConfig, MessageSink, Question, QuestionBank, RoomConfig, RoomError, RoomRegistry,
    RoomState,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

/// `n` questions whose right answer is always option B (`b<i>`).
fn bank(n: usize) -> QuestionBank {
    QuestionBank::new(
        (1..=n)
            .map(|i| Question {
                text: format!("Question {i}?"),
                options: [
                    format!("a{i}"),
                    format!("b{i}"),
                    format!("c{i}"),
                    format!("d{i}"),
                ],
                correct: format!("b{i}"),
            })
            .collect(),
    )
}

fn config(time_limit_secs: u64) -> RoomConfig {
    RoomConfig {
        time_limit: Duration::from_secs(time_limit_secs),
        bot: None,
    }
}

fn registry(questions: usize) -> RoomRegistry {
    RoomRegistry::with_rng(config(10), bank(questions), StdRng::seed_from_u64(1))
}

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

/// A network-style sink plus the receiver that observes it.
fn player() -> (Box<dyn MessageSink>, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Box::new(tx), rx)
}

/// Everything delivered so far.
fn drain(rx: &mut Inbox) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Receives until `done` matches, returning every message seen (inclusive).
async fn recv_until(rx: &mut Inbox, done: impl Fn(&ServerMessage) -> bool) -> Vec<ServerMessage> {
    let mut seen = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("sink closed");
        let stop = done(&msg);
        seen.push(msg);
        if stop {
            return seen;
        }
    }
}

fn question_numbers(msgs: &[ServerMessage]) -> Vec<usize> {
    msgs.iter()
        .filter_map(|m| m.as_question().map(|q| q.number))
        .collect()
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_create_room_greets_creator_with_code() {
    let mut reg = registry(3);
    let (sink, mut rx) = player();

    let room = reg.create_room("ada", sink).await.unwrap();

    let msgs = drain(&mut rx);
    assert_eq!(msgs[0], ServerMessage::RoomCode(room.code().clone()));
    assert_eq!(msgs[1], ServerMessage::PlayerList(vec!["ada".into()]));
    assert_eq!(msgs[2], ServerMessage::info("ada has joined the room."));
    assert_eq!(reg.room_count(), 1);
    assert_eq!(reg.room_codes(), vec![room.code().clone()]);
}

#[tokio::test]
async fn test_concurrent_creates_yield_distinct_codes() {
    let reg = Arc::new(Mutex::new(registry(1)));

    let mut tasks = Vec::new();
    for i in 0..50 {
        let reg = Arc::clone(&reg);
        tasks.push(tokio::spawn(async move {
            let (tx, _rx) = mpsc::unbounded_channel::<ServerMessage>();
            let room = reg
                .lock()
                .await
                .create_room(&format!("p{i}"), Box::new(tx))
                .await
                .unwrap();
            room.code().clone()
        }));
    }

    let mut codes = HashSet::new();
    for task in tasks {
        codes.insert(task.await.unwrap());
    }
    assert_eq!(codes.len(), 50);
    assert_eq!(reg.lock().await.room_count(), 50);
}

#[tokio::test]
async fn test_join_unknown_code_changes_nothing() {
    let mut reg = registry(1);
    let (host, _host_rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    let unknown = if room.code().as_str() == "ZZZZ" { "YYYY" } else { "ZZZZ" };
    let (sink, _rx) = player();
    let result = reg
        .join_room(&RoomCode::parse(unknown).unwrap(), "bob", sink)
        .await;

    assert!(matches!(result, Err(RoomError::NotFound(_))));
    assert_eq!(reg.room_count(), 1);
    let info = room.info().await.unwrap();
    assert_eq!(info.participants, vec!["ada".to_string()]);
}

#[tokio::test]
async fn test_join_sends_success_and_broadcasts_roster() {
    let mut reg = registry(1);
    let (host, mut host_rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    drain(&mut host_rx);

    let (sink, mut bob_rx) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();

    let bob = drain(&mut bob_rx);
    assert_eq!(bob[0], ServerMessage::JoinSuccess(room.code().clone()));
    let roster = ServerMessage::PlayerList(vec!["ada".into(), "bob".into()]);
    assert_eq!(bob[1], roster);

    let ada = drain(&mut host_rx);
    assert_eq!(
        ada,
        vec![roster, ServerMessage::info("bob has joined the room.")]
    );
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    let (sink, _rx) = player();
    let result = reg.join_room(room.code(), "ada", sink).await;
    assert!(matches!(result, Err(RoomError::NameTaken { .. })));
    assert_eq!(room.info().await.unwrap().participants.len(), 1);
}

#[tokio::test]
async fn test_destroy_room() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    reg.destroy_room(room.code()).await.unwrap();
    assert_eq!(reg.room_count(), 0);
    assert!(reg.room(room.code()).is_none());

    let again = reg.destroy_room(room.code()).await;
    assert!(matches!(again, Err(RoomError::NotFound(_))));
}

// =========================================================================
// Host authority and game flow
// =========================================================================

#[tokio::test]
async fn test_only_host_can_start_and_advance() {
    let mut reg = registry(3);
    let (host, mut host_rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    let (sink, _bob_rx) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();

    assert!(matches!(room.start("bob").await, Err(RoomError::NotHost(_))));
    assert_eq!(room.info().await.unwrap().state, RoomState::Lobby);

    drain(&mut host_rx);
    room.start("ada").await.unwrap();
    let msgs = drain(&mut host_rx);
    assert_eq!(msgs[0], ServerMessage::GameStarted);
    assert_eq!(question_numbers(&msgs), vec![1]);

    assert!(matches!(room.next("bob").await, Err(RoomError::NotHost(_))));
    room.next("ada").await.unwrap();
    assert_eq!(question_numbers(&drain(&mut host_rx)), vec![2]);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let mut reg = registry(2);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    room.start("ada").await.unwrap();
    assert!(matches!(
        room.start("ada").await,
        Err(RoomError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_next_requires_active_game() {
    let mut reg = registry(2);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    assert!(matches!(room.next("ada").await, Err(RoomError::NotActive)));
}

#[tokio::test]
async fn test_every_question_then_final_scores() {
    let mut reg = registry(4);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    room.start("ada").await.unwrap();
    for _ in 0..4 {
        room.next("ada").await.unwrap();
    }

    let msgs = drain(&mut rx);
    assert_eq!(question_numbers(&msgs), vec![1, 2, 3, 4]);
    for msg in &msgs {
        if let Some(q) = msg.as_question() {
            assert_eq!(q.total, 4);
            assert_eq!(q.time_limit_secs, 10);
        }
    }
    let finals: Vec<_> = msgs
        .iter()
        .filter(|m| matches!(m, ServerMessage::FinalScores(_)))
        .collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(msgs.last(), finals.last().copied());

    let info = room.info().await.unwrap();
    assert_eq!(info.state, RoomState::Ended);
    assert!(info.ended_at.is_some());
    assert!(matches!(room.next("ada").await, Err(RoomError::NotActive)));
}

// =========================================================================
// Answers and scoring
// =========================================================================

#[tokio::test]
async fn test_letter_and_text_are_both_correct() {
    let mut reg = registry(3);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();
    drain(&mut rx);

    room.submit_answer("ada", "b").await.unwrap();
    let msgs = drain(&mut rx);
    assert_eq!(
        msgs[0],
        ServerMessage::AnswerResult {
            correct: true,
            score: 1,
            correct_answer: "b1".into(),
        }
    );
    assert_eq!(msgs[1], ServerMessage::Scores(vec![ScoreEntry::new("ada", 1)]));

    room.next("ada").await.unwrap();
    drain(&mut rx);
    room.submit_answer("ada", "  B2 ").await.unwrap();
    assert!(matches!(
        drain(&mut rx)[0],
        ServerMessage::AnswerResult {
            correct: true,
            score: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn test_wrong_answer_keeps_score() {
    let mut reg = registry(2);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();

    room.submit_answer("ada", "B").await.unwrap();
    drain(&mut rx);
    room.submit_answer("ada", "A").await.unwrap();

    let msgs = drain(&mut rx);
    assert_eq!(
        msgs[0],
        ServerMessage::AnswerResult {
            correct: false,
            score: 1,
            correct_answer: "b1".into(),
        }
    );
    assert_eq!(msgs[1], ServerMessage::Scores(vec![ScoreEntry::new("ada", 1)]));
}

#[tokio::test]
async fn test_simultaneous_correct_answers_all_count() {
    const PLAYERS: usize = 20;
    let mut reg = registry(2);
    let (host, mut host_rx) = player();
    let room = reg.create_room("p0", host).await.unwrap();
    let mut inboxes = Vec::new();
    for i in 1..PLAYERS {
        let (sink, rx) = player();
        reg.join_room(room.code(), &format!("p{i}"), sink).await.unwrap();
        inboxes.push(rx);
    }
    room.start("p0").await.unwrap();
    drain(&mut host_rx);
    for rx in &mut inboxes {
        drain(rx);
    }

    let tasks: Vec<_> = (0..PLAYERS)
        .map(|i| {
            let room = room.clone();
            tokio::spawn(async move { room.submit_answer(&format!("p{i}"), "B").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let info = room.info().await.unwrap();
    assert_eq!(info.scores.len(), PLAYERS);
    assert!(info.scores.iter().all(|s| s.score == 1), "{:?}", info.scores);

    let host_msgs = drain(&mut host_rx);
    let broadcasts: Vec<_> = host_msgs
        .iter()
        .filter(|m| matches!(m, ServerMessage::Scores(_)))
        .collect();
    assert_eq!(broadcasts.len(), PLAYERS);
    // Each broadcast carries one more point than the one before it.
    for (i, msg) in broadcasts.iter().enumerate() {
        let ServerMessage::Scores(scores) = msg else { unreachable!() };
        let total: u32 = scores.iter().map(|s| s.score).sum();
        assert_eq!(total as usize, i + 1);
    }

    for rx in &mut inboxes {
        let results: Vec<_> = drain(rx)
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::AnswerResult { .. }))
            .collect();
        assert_eq!(
            results,
            vec![ServerMessage::AnswerResult {
                correct: true,
                score: 1,
                correct_answer: "b1".into(),
            }]
        );
    }
}

#[tokio::test]
async fn test_answer_result_goes_only_to_answerer() {
    let mut reg = registry(2);
    let (host, mut ada_rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    let (sink, mut bob_rx) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();
    room.start("ada").await.unwrap();
    drain(&mut ada_rx);
    drain(&mut bob_rx);

    room.submit_answer("bob", "B").await.unwrap();

    let scores = ServerMessage::Scores(vec![ScoreEntry::new("ada", 0), ScoreEntry::new("bob", 1)]);
    assert_eq!(drain(&mut ada_rx), vec![scores.clone()]);
    let bob = drain(&mut bob_rx);
    assert!(matches!(bob[0], ServerMessage::AnswerResult { correct: true, .. }));
    assert_eq!(bob[1], scores);
}

#[tokio::test]
async fn test_answer_rejected_outside_active_game() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    assert!(matches!(
        room.submit_answer("ada", "A").await,
        Err(RoomError::NotActive)
    ));

    room.start("ada").await.unwrap();
    assert!(matches!(
        room.submit_answer("mallory", "A").await,
        Err(RoomError::NotInRoom(_))
    ));

    room.next("ada").await.unwrap();
    assert!(matches!(
        room.submit_answer("ada", "A").await,
        Err(RoomError::NotActive)
    ));
}

#[tokio::test]
async fn test_final_scores_sorted_with_ties_in_join_order() {
    let mut reg = registry(2);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    for name in ["bob", "cy"] {
        let (sink, _rx) = player();
        reg.join_room(room.code(), name, sink).await.unwrap();
    }

    room.start("ada").await.unwrap();
    room.submit_answer("cy", "B").await.unwrap();
    room.next("ada").await.unwrap();
    room.submit_answer("cy", "B").await.unwrap();
    room.submit_answer("bob", "B").await.unwrap();
    room.next("ada").await.unwrap();

    let msgs = drain(&mut rx);
    assert_eq!(
        msgs.last(),
        Some(&ServerMessage::FinalScores(vec![
            ScoreEntry::new("cy", 2),
            ScoreEntry::new("bob", 1),
            ScoreEntry::new("ada", 0),
        ]))
    );
}

#[tokio::test]
async fn test_score_survives_leave() {
    let mut reg = registry(2);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    let (sink, _bob_rx) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();
    room.start("ada").await.unwrap();
    room.submit_answer("bob", "B").await.unwrap();
    drain(&mut rx);

    room.leave("bob").await.unwrap();
    let msgs = drain(&mut rx);
    assert_eq!(msgs[0], ServerMessage::info("bob has left the room."));
    assert_eq!(msgs[1], ServerMessage::PlayerList(vec!["ada".into()]));

    let info = room.info().await.unwrap();
    assert_eq!(info.participants, vec!["ada".to_string()]);
    assert_eq!(info.scores[1], ScoreEntry::new("bob", 1));
}

#[tokio::test]
async fn test_closed_sink_does_not_block_others() {
    let mut reg = registry(1);
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    let (sink, bob_rx) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();
    drop(bob_rx);
    drain(&mut rx);

    room.start("ada").await.unwrap();
    assert_eq!(drain(&mut rx)[0], ServerMessage::GameStarted);
}

// =========================================================================
// Leaving and host handover
// =========================================================================

#[tokio::test]
async fn test_host_passes_to_next_networked_participant() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    let (sink, _b) = player();
    reg.join_room(room.code(), "bob", sink).await.unwrap();

    room.leave("ada").await.unwrap();
    assert_eq!(room.info().await.unwrap().host.as_deref(), Some("bob"));
    room.start("bob").await.unwrap();
}

#[tokio::test]
async fn test_leave_unknown_name() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    assert!(matches!(
        room.leave("bob").await,
        Err(RoomError::NotInRoom(_))
    ));
}

#[tokio::test]
async fn test_last_player_leaving_ends_active_game() {
    let mut reg = RoomRegistry::with_rng(
        RoomConfig::default(),
        bank(3),
        StdRng::seed_from_u64(2),
    );
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();

    room.leave("ada").await.unwrap();

    let info = room.info().await.unwrap();
    assert_eq!(info.state, RoomState::Ended);
    assert_eq!(info.networked_count, 0);
    assert_eq!(info.participants, vec!["Computer".to_string()]);
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unanswered_question_times_out_and_advances() {
    let mut reg = RoomRegistry::with_rng(config(3), bank(2), StdRng::seed_from_u64(3));
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();
    drain(&mut rx);

    let started = Instant::now();
    let msgs = recv_until(&mut rx, |m| m.as_question().is_some()).await;
    assert_eq!(started.elapsed(), Duration::from_secs(3));

    assert_eq!(
        msgs,
        vec![
            ServerMessage::TimerUpdate {
                fraction: 2.0 / 3.0,
                seconds_left: 2
            },
            ServerMessage::TimerUpdate {
                fraction: 1.0 / 3.0,
                seconds_left: 1
            },
            ServerMessage::TimerUpdate {
                fraction: 0.0,
                seconds_left: 0
            },
            ServerMessage::TimeUp,
            ServerMessage::info("Time's up! Correct answer was: b1"),
            ServerMessage::Scores(vec![ScoreEntry::new("ada", 0)]),
            msgs[6].clone(),
        ]
    );
    assert_eq!(msgs[6].as_question().map(|q| q.number), Some(2));

    // The last question times out too, and the game ends on its own.
    let rest = recv_until(&mut rx, |m| matches!(m, ServerMessage::FinalScores(_))).await;
    assert!(rest.contains(&ServerMessage::TimeUp));
    assert_eq!(room.info().await.unwrap().state, RoomState::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_question_countdown_is_silenced() {
    let mut reg = RoomRegistry::with_rng(config(3), bank(3), StdRng::seed_from_u64(4));
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();

    // Let the first countdown tick once, then skip mid-second.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    room.next("ada").await.unwrap();
    let before = drain(&mut rx);
    assert_eq!(question_numbers(&before), vec![1, 2]);

    let msgs = recv_until(&mut rx, |m| m.as_question().is_some()).await;
    let seconds: Vec<u32> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::TimerUpdate { seconds_left, .. } => Some(*seconds_left),
            _ => None,
        })
        .collect();
    assert_eq!(seconds, vec![2, 1, 0]);
    assert_eq!(
        msgs.iter().filter(|m| **m == ServerMessage::TimeUp).count(),
        1
    );
    assert_eq!(question_numbers(&msgs), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_no_ticks_after_game_ends() {
    let mut reg = RoomRegistry::with_rng(config(3), bank(1), StdRng::seed_from_u64(5));
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();
    room.next("ada").await.unwrap();
    drain(&mut rx);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(drain(&mut rx).is_empty());
}

// =========================================================================
// Synthetic participant
// =========================================================================

#[tokio::test]
async fn test_bot_joins_with_creator_and_is_never_host() {
    let mut reg = RoomRegistry::with_rng(RoomConfig::default(), bank(1), StdRng::seed_from_u64(6));
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();

    let msgs = drain(&mut rx);
    assert!(msgs.contains(&ServerMessage::PlayerList(vec![
        "ada".into(),
        "Computer".into()
    ])));
    assert!(msgs.contains(&ServerMessage::info("Computer has joined the room.")));

    let info = room.info().await.unwrap();
    assert_eq!(info.host.as_deref(), Some("ada"));
    assert_eq!(info.networked_count, 1);
    assert!(matches!(
        room.start("Computer").await,
        Err(RoomError::NotHost(_))
    ));

    // The bot's name is taken like any other.
    let (sink, _rx) = player();
    assert!(matches!(
        reg.join_room(room.code(), "Computer", sink).await,
        Err(RoomError::NameTaken { .. })
    ));
}

#[tokio::test]
async fn test_bot_renamed_when_creator_takes_its_name() {
    let mut reg = RoomRegistry::with_rng(RoomConfig::default(), bank(1), StdRng::seed_from_u64(6));
    let (host, mut rx) = player();
    let room = reg.create_room("Computer", host).await.unwrap();

    let msgs = drain(&mut rx);
    assert!(msgs.contains(&ServerMessage::PlayerList(vec![
        "Computer".into(),
        "Computer 2".into()
    ])));

    let info = room.info().await.unwrap();
    assert_eq!(info.participants, vec!["Computer", "Computer 2"]);
    assert_eq!(
        info.scores,
        vec![ScoreEntry::new("Computer", 0), ScoreEntry::new("Computer 2", 0)]
    );
    assert_eq!(info.host.as_deref(), Some("Computer"));
}

#[tokio::test(start_paused = true)]
async fn test_accurate_bot_scores_before_time_up() {
    let bot = BotConfig {
        accuracy: 1.0,
        ..BotConfig::default()
    };
    let room_config = RoomConfig {
        time_limit: Duration::from_secs(10),
        bot: Some(bot),
    };
    let mut reg = RoomRegistry::with_rng(room_config, bank(2), StdRng::seed_from_u64(7));
    let (host, mut rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();
    drain(&mut rx);

    let started = Instant::now();
    let msgs = recv_until(&mut rx, |m| {
        matches!(m, ServerMessage::Scores(_) | ServerMessage::TimeUp)
    })
    .await;
    let elapsed = started.elapsed();

    assert_eq!(
        msgs.last(),
        Some(&ServerMessage::Scores(vec![
            ScoreEntry::new("ada", 0),
            ScoreEntry::new("Computer", 1),
        ]))
    );
    assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
    assert!(elapsed <= Duration::from_secs(8), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_bot_answer_for_skipped_question_is_discarded() {
    let bot = BotConfig {
        accuracy: 1.0,
        min_delay: Duration::from_secs(5),
        max_delay: Duration::from_secs(5),
        ..BotConfig::default()
    };
    let room_config = RoomConfig {
        time_limit: Duration::from_secs(10),
        bot: Some(bot),
    };
    let mut reg = RoomRegistry::with_rng(room_config, bank(2), StdRng::seed_from_u64(8));
    let (host, _rx) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();

    // Skip question 1 before the bot's answer to it lands. The bot's
    // answer for question 2 is still 5s away when we look.
    tokio::time::sleep(Duration::from_secs(2)).await;
    room.next("ada").await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let info = room.info().await.unwrap();
    assert_eq!(info.question_index, Some(1));
    assert_eq!(info.scores[1], ScoreEntry::new("Computer", 0));
}

// =========================================================================
// Eviction
// =========================================================================

#[tokio::test]
async fn test_ended_room_evicted_after_ttl() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let room = reg.create_room("ada", host).await.unwrap();
    room.start("ada").await.unwrap();
    room.next("ada").await.unwrap();

    let ttl = Duration::from_secs(300);
    let now = Instant::now();
    assert!(reg.evict_idle(now, ttl).await.is_empty());
    assert_eq!(reg.room_count(), 1);

    let evicted = reg.evict_idle(now + ttl, ttl).await;
    assert_eq!(evicted, vec![room.code().clone()]);
    assert_eq!(reg.room_count(), 0);
}

#[tokio::test]
async fn test_abandoned_room_evicted() {
    let mut reg = registry(1);
    let (host, _h) = player();
    let abandoned = reg.create_room("ada", host).await.unwrap();
    let (host, _h2) = player();
    let busy = reg.create_room("bob", host).await.unwrap();

    abandoned.leave("ada").await.unwrap();
    let evicted = reg.evict_idle(Instant::now(), Duration::from_secs(300)).await;

    assert_eq!(evicted, vec![abandoned.code().clone()]);
    assert_eq!(reg.room_codes(), vec![busy.code().clone()]);
}

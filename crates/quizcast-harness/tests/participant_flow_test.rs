//! Participant flows through the real runtime with fake I/O.

use std::{sync::Arc, time::Duration};

use quizcast_app::{ChannelHub, Command, ParticipantRuntime, RuntimeError, run_participant};
use quizcast_client::{Phase, Session, session};
use quizcast_core::{ApiError, MemoryStorage, Storage, keys};
use quizcast_harness::{
    FakeApi, FakeChannel, ScriptedDriver,
    fixtures::{self, JOIN_CODE, NAME},
};
use quizcast_proto::{CurrentQuestion, ServerEvent};
use tokio::time::timeout;

#[tokio::test(start_paused = true)]
async fn join_answer_and_end() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let storage = MemoryStorage::new();
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage.clone());
    runtime.mount().await.unwrap();

    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();
    let stored = storage.get(keys::CURRENT_QUIZ).unwrap().unwrap();
    assert_eq!(Session::decode(&stored), Some(Session::new("q1", "u1")));
    assert_eq!(storage.get(keys::JOIN_CODE).unwrap().as_deref(), Some(JOIN_CODE));

    // reconciliation: nothing pushed yet
    runtime.step().await.unwrap();
    assert_eq!(runtime.machine().phase(), Phase::Waiting);

    server.push(ServerEvent::question_pushed("q1", fixtures::question("Q1", 30)));
    runtime.step().await.unwrap();
    let current = runtime.machine().current().unwrap();
    assert_eq!(current.question.text, "2+2?");
    assert_eq!(current.time_left, 30);

    runtime.answer("B").await.unwrap();
    assert!(runtime.machine().current().unwrap().has_answered);
    runtime.step().await.unwrap();

    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].selected_option_key, "B");
    assert_eq!(submissions[0].quiz_user_id.as_str(), "u1");

    server.push(ServerEvent::quiz_ended("q1"));
    runtime.step().await.unwrap();
    assert_eq!(runtime.machine().phase(), Phase::Ended);
    assert!(!storage.contains(keys::CURRENT_QUIZ));
    assert!(!runtime.countdown().is_running());

    drop(runtime);
    assert_eq!(server.room_joins(), 1);
}

#[tokio::test]
async fn scripted_session_reaches_the_end() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let storage = MemoryStorage::new();
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage.clone());

    let submitted = Arc::clone(&api);
    let mut driver = ScriptedDriver::new()
        .with_server(server)
        .send(Command::Join { code: JOIN_CODE.into(), name: NAME.into() })
        .until("joined", |f| f.participant().is_some_and(|p| p.phase() == Phase::Waiting))
        .push(ServerEvent::question_pushed("q1", fixtures::question("Q1", 30)))
        .until("question shown", |f| f.participant().is_some_and(|p| p.current().is_some()))
        .send(Command::Answer { key: "B".into() })
        .until("submitted", move |_| submitted.count("submit_answer") == 1)
        .push(ServerEvent::quiz_ended("q1"))
        .until("ended", |f| f.participant().is_some_and(|p| p.phase() == Phase::Ended));

    timeout(Duration::from_secs(5), run_participant(&mut driver, &mut runtime))
        .await
        .unwrap()
        .unwrap();

    assert!(driver.is_finished());
    assert!(driver.alerts().is_empty());
    assert!(!storage.contains(keys::CURRENT_QUIZ));
    drop(runtime);
    assert_eq!(hub.listener_count(), 0);
}

#[tokio::test]
async fn leave_clears_persisted_session() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    let (channel, _server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let storage = MemoryStorage::new();
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage.clone());
    runtime.mount().await.unwrap();
    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();
    assert!(storage.contains(keys::CURRENT_QUIZ));

    runtime.leave().await.unwrap();

    for key in [keys::CURRENT_QUIZ, keys::JOIN_CODE, keys::DISPLAY_NAME] {
        assert!(!storage.contains(key), "{key} still stored");
    }
    assert_eq!(runtime.machine().phase(), Phase::Unjoined);
    assert_eq!(api.count("leave"), 1);
}

#[tokio::test]
async fn leave_survives_a_failing_backend() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    api.fail_next("leave", ApiError::Network("connection refused".into()));
    let (channel, _server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let storage = MemoryStorage::new();
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage.clone());
    runtime.mount().await.unwrap();
    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();

    runtime.leave().await.unwrap();
    assert!(storage.is_empty());
    assert_eq!(runtime.machine().phase(), Phase::Unjoined);
}

#[tokio::test]
async fn reload_reconciles_with_the_server() {
    let api = Arc::new(FakeApi::new());
    api.set_current_question(CurrentQuestion {
        index: 0,
        question: Some(fixtures::question("Q1", 30)),
    });
    let storage = MemoryStorage::new();
    storage.set(keys::CURRENT_QUIZ, &Session::new("q1", "u1").encode().unwrap()).unwrap();
    storage.set(keys::JOIN_CODE, JOIN_CODE).unwrap();
    storage.set(keys::DISPLAY_NAME, &session::obfuscate(NAME)).unwrap();

    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage);
    runtime.mount().await.unwrap();

    assert_eq!(runtime.machine().phase(), Phase::Waiting);
    assert_eq!(runtime.machine().display_name(), NAME);
    assert_eq!(runtime.machine().join_code(), JOIN_CODE);

    runtime.step().await.unwrap();
    let current = runtime.machine().current().unwrap();
    assert_eq!(current.time_left, 30);
    assert!(!current.has_answered);
    assert_eq!(server.room_joins(), 1);
}

#[tokio::test]
async fn corrupt_session_is_discarded() {
    let storage = MemoryStorage::new();
    storage.set(keys::CURRENT_QUIZ, "{not json").unwrap();
    storage.set(keys::JOIN_CODE, JOIN_CODE).unwrap();

    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let mut runtime = ParticipantRuntime::new(Arc::new(FakeApi::new()), &mut hub, storage.clone());
    runtime.mount().await.unwrap();

    assert_eq!(runtime.machine().phase(), Phase::Unjoined);
    assert!(!storage.contains(keys::CURRENT_QUIZ));
    assert_eq!(runtime.machine().join_code(), JOIN_CODE);
    assert_eq!(server.room_joins(), 0);
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    api.fail_next("submit_answer", ApiError::Network("timeout".into()));
    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, MemoryStorage::new());
    runtime.mount().await.unwrap();
    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();
    runtime.step().await.unwrap();
    server.push(ServerEvent::question_pushed("q1", fixtures::question("Q1", 30)));
    runtime.step().await.unwrap();

    runtime.answer("A").await.unwrap();
    runtime.step().await.unwrap();
    assert_eq!(runtime.take_alerts(), ["Failed to submit answer"]);
    assert_eq!(runtime.machine().phase(), Phase::QuestionActive);

    runtime.answer("B").await.unwrap();
    runtime.step().await.unwrap();
    assert_eq!(runtime.machine().phase(), Phase::Answered);
    let keys: Vec<_> = api.submissions().into_iter().map(|s| s.selected_option_key).collect();
    assert_eq!(keys, ["A", "B"]);
}

#[tokio::test]
async fn events_for_other_quizzes_are_ignored() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    let (channel, server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let mut runtime = ParticipantRuntime::new(api, &mut hub, MemoryStorage::new());
    runtime.mount().await.unwrap();
    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();
    runtime.step().await.unwrap();

    server.push(ServerEvent::question_pushed("q2", fixtures::question("X1", 30)));
    runtime.step().await.unwrap();
    server.push(ServerEvent::quiz_ended("q2"));
    runtime.step().await.unwrap();

    assert_eq!(runtime.machine().phase(), Phase::Waiting);
    assert!(!runtime.countdown().is_running());
}

#[tokio::test]
async fn rejected_join_shows_the_server_message() {
    let api = Arc::new(FakeApi::new());
    let (channel, _server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let storage = MemoryStorage::new();
    let mut runtime = ParticipantRuntime::new(api, &mut hub, storage.clone());
    runtime.mount().await.unwrap();

    runtime.join("ZZ99ZZ", NAME).await.unwrap();
    runtime.step().await.unwrap();

    assert_eq!(runtime.take_alerts(), ["Invalid join code"]);
    assert_eq!(runtime.machine().phase(), Phase::Unjoined);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn joining_twice_is_refused() {
    let api = Arc::new(FakeApi::new());
    api.script_join(Ok(fixtures::joined()));
    let (channel, _server) = FakeChannel::pair();
    let mut hub = ChannelHub::new(channel);
    let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, MemoryStorage::new());
    runtime.mount().await.unwrap();
    runtime.join(JOIN_CODE, NAME).await.unwrap();
    runtime.step().await.unwrap();

    let err = runtime.join(JOIN_CODE, NAME).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Client(_)));
    assert_eq!(api.count("join"), 1);
}

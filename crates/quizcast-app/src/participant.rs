//! Participant runtime.
//!
//! Executes the actions of a [`Participant`] machine: REST calls run on a
//! task set and come back as events, channel events arrive through a hub
//! subscription, and the countdown feeds ticks. Storage writes happen inline
//! so the stored session always matches the machine once `apply` returns.

use std::sync::Arc;

use quizcast_client::{Participant, ParticipantAction, ParticipantEvent, PersistedState};
use quizcast_core::{QuizApi, RealtimeChannel, Storage, StorageError, keys};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    PARTICIPANT_EVENTS,
    countdown::Countdown,
    error::RuntimeError,
    hub::{ChannelHub, Subscription, next_event},
};

/// Drives one participant view.
pub struct ParticipantRuntime<'h, A, C, S> {
    machine: Participant,
    api: Arc<A>,
    hub: &'h mut ChannelHub<C>,
    storage: S,
    subscription: Option<Subscription>,
    countdown: Countdown,
    calls: JoinSet<ParticipantEvent>,
    alerts: Vec<String>,
    user_id: Option<String>,
    channel_open: bool,
}

impl<'h, A, C, S> ParticipantRuntime<'h, A, C, S>
where
    A: QuizApi + 'static,
    C: RealtimeChannel,
    S: Storage,
{
    /// New runtime. Nothing happens until [`Self::mount`].
    pub fn new(api: Arc<A>, hub: &'h mut ChannelHub<C>, storage: S) -> Self {
        let channel_open = hub.is_connected();
        Self {
            machine: Participant::new(),
            api,
            hub,
            storage,
            subscription: None,
            countdown: Countdown::new(),
            calls: JoinSet::new(),
            alerts: Vec::new(),
            user_id: None,
            channel_open,
        }
    }

    /// Logged-in user to attach to join requests.
    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// The state machine.
    pub fn machine(&self) -> &Participant {
        &self.machine
    }

    /// The countdown, for inspection.
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Number of REST calls in flight.
    pub fn calls_in_flight(&self) -> usize {
        self.calls.len()
    }

    /// Subscribe to participant events and restore the stored session.
    ///
    /// A stored session rejoins its room and asks the server for the current
    /// question.
    ///
    /// # Errors
    ///
    /// `Storage` if stored values cannot be read.
    pub async fn mount(&mut self) -> Result<(), RuntimeError> {
        if self.subscription.is_none() {
            self.subscription = Some(self.hub.subscribe(&PARTICIPANT_EVENTS));
        }
        let persisted = PersistedState {
            session: self.storage.get(keys::CURRENT_QUIZ)?,
            join_code: self.storage.get(keys::JOIN_CODE)?,
            display_name: self.storage.get(keys::DISPLAY_NAME)?,
        };
        self.apply(ParticipantEvent::Initialize(persisted)).await
    }

    /// Tear down the view: unsubscribe, stop the countdown and drop in-flight
    /// calls. The stored session is kept.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.countdown.stop();
        self.calls.abort_all();
        debug!("participant view unmounted");
    }

    /// Ask to join with a code and display name.
    ///
    /// # Errors
    ///
    /// `Client` for blank fields or when already joined.
    pub async fn join(&mut self, join_code: &str, name: &str) -> Result<(), RuntimeError> {
        self.apply(ParticipantEvent::JoinRequested {
            join_code: join_code.to_string(),
            name: name.to_string(),
            user_id: self.user_id.clone(),
        })
        .await
    }

    /// Pick an option of the question on screen.
    ///
    /// # Errors
    ///
    /// `Client` when not joined or the key is not an option.
    pub async fn answer(&mut self, option_key: &str) -> Result<(), RuntimeError> {
        self.apply(ParticipantEvent::AnswerSelected { option_key: option_key.to_string() }).await
    }

    /// Leave the quiz and forget everything stored about it.
    ///
    /// # Errors
    ///
    /// `Storage` if stored values cannot be removed.
    pub async fn leave(&mut self) -> Result<(), RuntimeError> {
        self.apply(ParticipantEvent::LeaveRequested).await
    }

    /// Alerts raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Wait for the next input: a finished call, a countdown tick or a
    /// channel event. Cancel-safe.
    pub async fn next_input(&mut self) -> ParticipantEvent {
        loop {
            let Self { calls, countdown, subscription, hub, channel_open, .. } = &mut *self;
            tokio::select! {
                Some(joined) = calls.join_next(), if !calls.is_empty() => match joined {
                    Ok(event) => return event,
                    Err(err) if err.is_cancelled() => {},
                    Err(err) => warn!(%err, "api call task failed"),
                },
                () = countdown.tick() => return ParticipantEvent::Tick,
                Some(event) = next_event(subscription) => return ParticipantEvent::Server(event),
                pumped = hub.pump(), if *channel_open => {
                    if pumped.is_none() {
                        *channel_open = false;
                        warn!("realtime channel closed; waiting on REST results only");
                    }
                },
            }
        }
    }

    /// Wait for one input and apply it.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub async fn step(&mut self) -> Result<(), RuntimeError> {
        let event = self.next_input().await;
        self.apply(event).await
    }

    /// Feed one event to the machine and perform its actions.
    ///
    /// # Errors
    ///
    /// `Client` if the machine rejects the event; `Storage` if persisting
    /// fails. Every action still runs after a storage failure, so the room
    /// join and reconciliation happen even when the session cannot be saved.
    pub async fn apply(&mut self, event: ParticipantEvent) -> Result<(), RuntimeError> {
        let actions = self.machine.handle(event)?;
        let mut first_error = None;
        for action in actions {
            if let Err(err) = self.execute(action).await {
                warn!(%err, "storage update failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Run every write, returning the first failure.
    fn store_all<'a>(
        &self,
        writes: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Result<(), StorageError> {
        let mut first_error = None;
        for (key, value) in writes {
            let written = match value {
                Some(value) => self.storage.set(key, value),
                None => self.storage.remove(key),
            };
            if let Err(err) = written {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn execute(&mut self, action: ParticipantAction) -> Result<(), RuntimeError> {
        match action {
            ParticipantAction::Join(request) => {
                let api = Arc::clone(&self.api);
                self.calls.spawn(async move {
                    ParticipantEvent::JoinCompleted(api.join(&request).await)
                });
            },
            ParticipantAction::FetchCurrentQuestion { quiz_id } => {
                let api = Arc::clone(&self.api);
                self.calls.spawn(async move {
                    let result = api.current_question(&quiz_id).await;
                    ParticipantEvent::CurrentQuestionFetched { quiz_id, result }
                });
            },
            ParticipantAction::SubmitAnswer { quiz_id, submission } => {
                let api = Arc::clone(&self.api);
                self.calls.spawn(async move {
                    let result = api.submit_answer(&quiz_id, &submission).await;
                    ParticipantEvent::AnswerCompleted { question_id: submission.question_id, result }
                });
            },
            ParticipantAction::Leave { quiz_id, quiz_user_id } => {
                match self.api.leave(&quiz_id, &quiz_user_id).await {
                    Ok(()) => info!(%quiz_id, "left quiz"),
                    Err(err) => warn!(%quiz_id, %err, "leave call failed; clearing locally"),
                }
            },
            ParticipantAction::JoinRoom { quiz_id } => {
                if let Err(err) = self.hub.join_room(&quiz_id).await {
                    warn!(%quiz_id, %err, "could not join room");
                }
            },
            ParticipantAction::PersistSession { session, join_code, display_name } => {
                let encoded = session.encode().map_err(StorageError::from)?;
                self.store_all([
                    (keys::CURRENT_QUIZ, Some(encoded.as_str())),
                    (keys::JOIN_CODE, Some(join_code.as_str())),
                    (keys::DISPLAY_NAME, Some(display_name.as_str())),
                ])?;
            },
            ParticipantAction::ClearSession => self.storage.remove(keys::CURRENT_QUIZ)?,
            ParticipantAction::ClearAll => self.store_all([
                (keys::CURRENT_QUIZ, None),
                (keys::JOIN_CODE, None),
                (keys::DISPLAY_NAME, None),
            ])?,
            ParticipantAction::StartCountdown => self.countdown.start(),
            ParticipantAction::StopCountdown => self.countdown.stop(),
            ParticipantAction::Alert { message } => self.alerts.push(message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quizcast_client::Phase;
    use quizcast_core::{ApiError, MemoryStorage};
    use quizcast_proto::{
        JoinResponse, QuestionId, QuizOption, QuizQuestion, QuizUserId, ServerEvent,
    };

    use super::*;
    use crate::testing::{StubApi, hub};

    fn joining_api() -> Arc<StubApi> {
        Arc::new(StubApi {
            join: Some(Ok(JoinResponse {
                quiz_id: "q1".into(),
                quiz_user_id: QuizUserId::new("u1"),
            })),
            ..StubApi::default()
        })
    }

    #[tokio::test]
    async fn join_persists_session_and_subscribes() {
        let (mut hub, _tx) = hub();
        let storage = MemoryStorage::new();
        let mut runtime = ParticipantRuntime::new(joining_api(), &mut hub, storage.clone());
        runtime.mount().await.unwrap();

        runtime.join("ab12cd", "Ada").await.unwrap();
        assert!(runtime.machine().is_joining());
        runtime.step().await.unwrap();
        // current-question reconciliation
        runtime.step().await.unwrap();

        assert_eq!(runtime.machine().phase(), Phase::Waiting);
        assert_eq!(storage.get(keys::JOIN_CODE).unwrap().as_deref(), Some("AB12CD"));
        assert_eq!(storage.get(keys::DISPLAY_NAME).unwrap().as_deref(), Some("QWRh"));
        assert!(storage.contains(keys::CURRENT_QUIZ));
        drop(runtime);
        assert_eq!(hub.joined_rooms().count(), 1);
    }

    #[tokio::test]
    async fn failed_join_raises_alert() {
        let (mut hub, _tx) = hub();
        let api = Arc::new(StubApi {
            join: Some(Err(ApiError::Rejected { message: Some("Quiz not found".into()) })),
            ..StubApi::default()
        });
        let mut runtime = ParticipantRuntime::new(api, &mut hub, MemoryStorage::new());
        runtime.mount().await.unwrap();

        runtime.join("ZZZZZZ", "Ada").await.unwrap();
        runtime.step().await.unwrap();

        assert_eq!(runtime.take_alerts(), ["Quiz not found"]);
        assert_eq!(runtime.machine().phase(), Phase::Unjoined);
        assert!(runtime.take_alerts().is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_any_call() {
        let (mut hub, _tx) = hub();
        let mut runtime = ParticipantRuntime::new(joining_api(), &mut hub, MemoryStorage::new());
        runtime.mount().await.unwrap();

        let err = runtime.join("AB12CD", "  ").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Client(_)));
        assert_eq!(runtime.calls_in_flight(), 0);
    }

    #[tokio::test]
    async fn leave_clears_storage_and_calls_backend() {
        let (mut hub, _tx) = hub();
        let storage = MemoryStorage::new();
        let api = joining_api();
        let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, storage.clone());
        runtime.mount().await.unwrap();
        runtime.join("AB12CD", "Ada").await.unwrap();
        runtime.step().await.unwrap();

        runtime.leave().await.unwrap();

        assert!(storage.is_empty());
        assert_eq!(runtime.machine().phase(), Phase::Unjoined);
        assert!(api.calls().contains(&"leave q1".to_string()));
    }

    /// Storage that refuses every write but still counts them.
    #[derive(Default)]
    struct ReadOnlyStorage {
        writes: std::sync::Mutex<Vec<String>>,
    }

    impl ReadOnlyStorage {
        fn refuse(&self, key: &str) -> Result<(), StorageError> {
            self.writes.lock().unwrap().push(key.to_string());
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
        }
    }

    impl Storage for ReadOnlyStorage {
        fn get(&self, _: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _: &str) -> Result<(), StorageError> {
            self.refuse(key)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.refuse(key)
        }
    }

    #[tokio::test]
    async fn failed_save_still_joins_the_room() {
        let (mut hub, _tx) = hub();
        let storage = Arc::new(ReadOnlyStorage::default());
        let api = joining_api();
        let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, Arc::clone(&storage));
        runtime.mount().await.unwrap();
        runtime.join("AB12CD", "Ada").await.unwrap();

        let err = runtime.step().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Storage(_)));
        assert_eq!(runtime.machine().phase(), Phase::Waiting);
        assert_eq!(runtime.calls_in_flight(), 1);
        runtime.step().await.unwrap();
        assert!(api.calls().contains(&"current q1".to_string()));

        drop(runtime);
        assert_eq!(hub.joined_rooms().count(), 1);
        assert_eq!(storage.writes.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_clear_still_leaves() {
        let (mut hub, _tx) = hub();
        let storage = Arc::new(ReadOnlyStorage::default());
        let api = joining_api();
        let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, Arc::clone(&storage));
        runtime.mount().await.unwrap();
        runtime.join("AB12CD", "Ada").await.unwrap();
        let _ = runtime.step().await;

        let err = runtime.leave().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Storage(_)));
        assert_eq!(runtime.machine().phase(), Phase::Unjoined);
        assert!(!runtime.countdown().is_running());
        assert!(api.calls().contains(&"leave q1".to_string()));
        // three failed saves, then all three keys attempted on clear
        assert_eq!(storage.writes.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn unmount_drops_the_subscription() {
        let (mut hub, _tx) = hub();
        let mut runtime = ParticipantRuntime::new(joining_api(), &mut hub, MemoryStorage::new());
        runtime.mount().await.unwrap();
        runtime.mount().await.unwrap();
        runtime.unmount();
        drop(runtime);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pushed_question_counts_down_and_accepts_one_answer() {
        let (mut hub, tx) = hub();
        let api = joining_api();
        let mut runtime = ParticipantRuntime::new(Arc::clone(&api), &mut hub, MemoryStorage::new());
        runtime.mount().await.unwrap();
        runtime.join("AB12CD", "Ada").await.unwrap();
        runtime.step().await.unwrap();
        runtime.step().await.unwrap();

        let question = QuizQuestion {
            question_id: Some(QuestionId::new("Q1")),
            text: "2+2?".into(),
            options: vec![QuizOption::new("A", "3"), QuizOption::new("B", "4")],
            time_limit_seconds: 3,
            max_marks: 10,
        };
        tx.send(ServerEvent::question_pushed("q1", question)).unwrap();
        runtime.step().await.unwrap();
        assert!(runtime.countdown().is_running());
        assert_eq!(runtime.machine().current().unwrap().time_left, 3);

        runtime.step().await.unwrap();
        assert_eq!(runtime.machine().current().unwrap().time_left, 2);

        runtime.answer("B").await.unwrap();
        runtime.answer("A").await.unwrap();
        assert_eq!(runtime.machine().phase(), Phase::Answered);

        runtime.step().await.unwrap();
        assert_eq!(api.calls().iter().filter(|c| c.starts_with("answer")).count(), 1);
    }
}

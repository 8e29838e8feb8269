//! Host runtime.
//!
//! Same shape as the participant runtime without storage or countdown: host
//! sessions live only as long as the view.

use std::sync::Arc;

use quizcast_client::{Host, HostAction, HostEvent};
use quizcast_core::{QuizApi, RealtimeChannel};
use quizcast_proto::QuizId;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    HOST_EVENTS,
    error::RuntimeError,
    hub::{ChannelHub, Subscription, next_event},
};

/// Drives one host view.
pub struct HostRuntime<'h, A, C> {
    machine: Host,
    api: Arc<A>,
    hub: &'h mut ChannelHub<C>,
    subscription: Option<Subscription>,
    calls: JoinSet<HostEvent>,
    alerts: Vec<String>,
    channel_open: bool,
}

impl<'h, A, C> HostRuntime<'h, A, C>
where
    A: QuizApi + 'static,
    C: RealtimeChannel,
{
    /// Runtime for `quiz_id`. A join code already known (e.g. from the quiz
    /// list) can be passed so it shows before the quiz loads.
    pub fn new(
        api: Arc<A>,
        hub: &'h mut ChannelHub<C>,
        quiz_id: QuizId,
        join_code: Option<String>,
    ) -> Self {
        let channel_open = hub.is_connected();
        Self {
            machine: Host::new(quiz_id, join_code),
            api,
            hub,
            subscription: None,
            calls: JoinSet::new(),
            alerts: Vec::new(),
            channel_open,
        }
    }

    /// The state machine.
    pub fn machine(&self) -> &Host {
        &self.machine
    }

    /// Number of REST calls in flight.
    pub fn calls_in_flight(&self) -> usize {
        self.calls.len()
    }

    /// Subscribe, join the room and load the quiz and participant list.
    pub async fn mount(&mut self) -> Result<(), RuntimeError> {
        if self.subscription.is_none() {
            self.subscription = Some(self.hub.subscribe(&HOST_EVENTS));
        }
        self.apply(HostEvent::Mount).await
    }

    /// Unsubscribe and drop in-flight calls.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.calls.abort_all();
        debug!(quiz_id = %self.machine.quiz_id(), "host view unmounted");
    }

    /// Publish the quiz so participants can join.
    pub async fn host(&mut self) -> Result<(), RuntimeError> {
        self.apply(HostEvent::HostRequested).await
    }

    /// Start the quiz.
    ///
    /// # Errors
    ///
    /// `Client` if the quiz has not been hosted.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        self.apply(HostEvent::StartRequested).await
    }

    /// Push question `index` (0-based).
    ///
    /// # Errors
    ///
    /// `Client` if the quiz is not active or `index` is past the last
    /// question.
    pub async fn push(&mut self, index: u32) -> Result<(), RuntimeError> {
        self.apply(HostEvent::PushRequested { index }).await
    }

    /// End the quiz.
    ///
    /// # Errors
    ///
    /// `Client` if the quiz is not active.
    pub async fn end(&mut self) -> Result<(), RuntimeError> {
        self.apply(HostEvent::EndRequested).await
    }

    /// Remove every participant.
    pub async fn clear(&mut self) -> Result<(), RuntimeError> {
        self.apply(HostEvent::ClearRequested).await
    }

    /// Alerts raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Wait for the next finished call or channel event. Cancel-safe.
    ///
    /// Pends forever when nothing is in flight and the channel is closed.
    pub async fn next_input(&mut self) -> HostEvent {
        loop {
            let Self { calls, subscription, hub, channel_open, .. } = &mut *self;
            tokio::select! {
                Some(joined) = calls.join_next(), if !calls.is_empty() => match joined {
                    Ok(event) => return event,
                    Err(err) if err.is_cancelled() => {},
                    Err(err) => warn!(%err, "api call task failed"),
                },
                Some(event) = next_event(subscription) => return HostEvent::Server(event),
                pumped = hub.pump(), if *channel_open => {
                    if pumped.is_none() {
                        *channel_open = false;
                        warn!("realtime channel closed; live updates stopped");
                    }
                },
                else => std::future::pending::<()>().await,
            }
        }
    }

    /// Wait for one input and apply it.
    pub async fn step(&mut self) -> Result<(), RuntimeError> {
        let event = self.next_input().await;
        self.apply(event).await
    }

    /// Feed one event to the machine and perform its actions.
    ///
    /// # Errors
    ///
    /// `Client` if the machine rejects the event.
    pub async fn apply(&mut self, event: HostEvent) -> Result<(), RuntimeError> {
        let actions = self.machine.handle(event)?;
        for action in actions {
            self.execute(action).await;
        }
        Ok(())
    }

    async fn execute(&mut self, action: HostAction) {
        let quiz_id = self.machine.quiz_id().clone();
        let api = Arc::clone(&self.api);
        match action {
            HostAction::JoinRoom { quiz_id } => {
                if let Err(err) = self.hub.join_room(&quiz_id).await {
                    warn!(%quiz_id, %err, "could not join room");
                }
            },
            HostAction::FetchQuiz => {
                self.calls.spawn(async move { HostEvent::QuizLoaded(api.get_quiz(&quiz_id).await) });
            },
            HostAction::FetchParticipants => {
                self.calls.spawn(async move {
                    HostEvent::ParticipantsLoaded(api.list_participants(&quiz_id).await)
                });
            },
            HostAction::Host => {
                self.calls.spawn(async move { HostEvent::HostCompleted(api.host(&quiz_id).await) });
            },
            HostAction::Start => {
                self.calls.spawn(async move { HostEvent::StartCompleted(api.start(&quiz_id).await) });
            },
            HostAction::Push { index } => {
                self.calls.spawn(async move {
                    let result = api.push_question(&quiz_id, index).await;
                    HostEvent::PushCompleted { index, result }
                });
            },
            HostAction::End => {
                self.calls.spawn(async move { HostEvent::EndCompleted(api.end(&quiz_id).await) });
            },
            HostAction::Clear => {
                self.calls.spawn(async move {
                    HostEvent::ClearCompleted(api.clear_participants(&quiz_id).await)
                });
            },
            HostAction::FetchLeaderboard => {
                self.calls.spawn(async move {
                    HostEvent::LeaderboardLoaded(api.leaderboard(&quiz_id).await)
                });
            },
            HostAction::Alert { message } => self.alerts.push(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use quizcast_core::ApiError;
    use quizcast_proto::{
        HostResponse, Participant, Quiz, QuizOption, QuizQuestion, QuizStatus, ServerEvent,
        events::VotesUpdate,
    };

    use super::*;
    use crate::testing::{StubApi, hub};

    fn quiz(status: QuizStatus) -> Quiz {
        Quiz {
            id: None,
            quiz_id: QuizId::new("q1"),
            title: "Arithmetic".into(),
            description: None,
            status,
            join_code: None,
            owner_user_id: None,
            questions: vec![QuizQuestion {
                question_id: None,
                text: "2+2?".into(),
                options: vec![QuizOption::new("A", "3"), QuizOption::new("B", "4")],
                time_limit_seconds: 30,
                max_marks: 10,
            }],
            created_at: None,
            updated_at: None,
            participants: None,
            total_participants: None,
        }
    }

    async fn settle<A: QuizApi + 'static, C: RealtimeChannel>(runtime: &mut HostRuntime<'_, A, C>) {
        while runtime.calls_in_flight() > 0 {
            runtime.step().await.unwrap();
        }
    }

    #[tokio::test]
    async fn full_host_flow() {
        let (mut hub, _tx) = hub();
        let api = Arc::new(StubApi {
            quiz: Some(Ok(quiz(QuizStatus::Draft))),
            hosted: Some(Ok(HostResponse { join_code: Some("AB12CD".into()) })),
            leaderboard: vec![Participant {
                quiz_user_id: "u1".into(),
                participant_name: "Ada".into(),
                total_score: Some(10.0),
            }],
            ..StubApi::default()
        });
        let mut runtime = HostRuntime::new(Arc::clone(&api), &mut hub, QuizId::new("q1"), None);
        runtime.mount().await.unwrap();
        settle(&mut runtime).await;

        runtime.host().await.unwrap();
        settle(&mut runtime).await;
        assert_eq!(runtime.machine().join_code(), Some("AB12CD"));

        runtime.start().await.unwrap();
        settle(&mut runtime).await;
        runtime.push(0).await.unwrap();
        settle(&mut runtime).await;
        assert_eq!(runtime.machine().current_index(), Some(0));

        runtime.end().await.unwrap();
        settle(&mut runtime).await;
        assert!(runtime.machine().is_ended());
        assert_eq!(runtime.machine().leaderboard().len(), 1);

        let calls = api.calls();
        assert!(calls[..2].contains(&"quiz q1".to_string()));
        assert!(calls[..2].contains(&"participants q1".to_string()));
        assert_eq!(calls[2..], ["host q1", "start q1", "push q1 0", "end q1", "leaderboard q1"]);
    }

    #[tokio::test]
    async fn failed_end_alerts_and_stays_active() {
        let (mut hub, _tx) = hub();
        let api = Arc::new(StubApi {
            quiz: Some(Ok(quiz(QuizStatus::Active))),
            end: Some(Err(ApiError::Rejected { message: None })),
            ..StubApi::default()
        });
        let mut runtime = HostRuntime::new(api, &mut hub, QuizId::new("q1"), None);
        runtime.mount().await.unwrap();
        settle(&mut runtime).await;

        runtime.end().await.unwrap();
        settle(&mut runtime).await;
        assert_eq!(runtime.take_alerts(), ["Failed to stop quiz"]);
        assert!(runtime.machine().is_active());
    }

    #[tokio::test]
    async fn start_before_hosting_is_rejected() {
        let (mut hub, _tx) = hub();
        let api = Arc::new(StubApi { quiz: Some(Ok(quiz(QuizStatus::Draft))), ..StubApi::default() });
        let mut runtime = HostRuntime::new(api, &mut hub, QuizId::new("q1"), None);
        runtime.mount().await.unwrap();
        settle(&mut runtime).await;

        assert!(matches!(runtime.start().await, Err(RuntimeError::Client(_))));
        assert_eq!(runtime.calls_in_flight(), 0);
    }

    #[tokio::test]
    async fn votes_arrive_through_the_hub() {
        let (mut hub, tx) = hub();
        let api = Arc::new(StubApi { quiz: Some(Ok(quiz(QuizStatus::Active))), ..StubApi::default() });
        let mut runtime = HostRuntime::new(api, &mut hub, QuizId::new("q1"), None);
        runtime.mount().await.unwrap();
        settle(&mut runtime).await;

        let counts = [("A".to_string(), 1), ("B".to_string(), 3)].into_iter().collect();
        tx.send(ServerEvent::VotesUpdate(VotesUpdate {
            quiz_id: QuizId::new("q1"),
            counts,
        }))
        .unwrap();
        runtime.step().await.unwrap();
        assert_eq!(runtime.machine().votes().total(), 4);
    }
}

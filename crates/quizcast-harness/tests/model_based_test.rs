//! Model-based property tests.
//!
//! Random operation sequences are applied to the real participant machine
//! and to the reference model; both must agree after every step.
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!   ModelParticipant   Participant     Compare
//!     (reference)       (real)         phase, timer, submissions
//! ```

use proptest::prelude::*;
use quizcast_client::{Participant, ParticipantAction, ParticipantEvent};
use quizcast_core::ApiError;
use quizcast_harness::{
    ModelOutcome, ModelParticipant, Operation,
    fixtures::{self, JOIN_CODE, NAME},
    model::QuizRef,
};
use quizcast_proto::{QuestionId, ServerEvent};

/// Real machine wrapper mirroring the model's interface.
struct RealWorld {
    machine: Participant,
    countdowns_running: bool,
}

impl RealWorld {
    fn new() -> Self {
        Self { machine: Participant::new(), countdowns_running: false }
    }

    fn apply(&mut self, op: &Operation) -> ModelOutcome {
        let event = match *op {
            Operation::RequestJoin => ParticipantEvent::JoinRequested {
                join_code: JOIN_CODE.into(),
                name: NAME.into(),
                user_id: None,
            },
            Operation::CompleteJoin { ok } => ParticipantEvent::JoinCompleted(if ok {
                Ok(fixtures::joined())
            } else {
                Err(ApiError::Rejected { message: Some("Invalid join code".into()) })
            }),
            Operation::Push { quiz, question, time_limit } => ParticipantEvent::Server(
                ServerEvent::question_pushed(
                    quiz.id(),
                    fixtures::question(&format!("Q{question}"), time_limit),
                ),
            ),
            Operation::Tick => ParticipantEvent::Tick,
            Operation::Answer { key } => {
                ParticipantEvent::AnswerSelected { option_key: key.to_string() }
            },
            Operation::AnswerFails => {
                let question_id = self
                    .machine
                    .current()
                    .and_then(|q| q.question.question_id.clone())
                    .unwrap_or_else(|| QuestionId::new("stale"));
                ParticipantEvent::AnswerCompleted {
                    question_id,
                    result: Err(ApiError::Network("connection reset".into())),
                }
            },
            Operation::End { quiz } => ParticipantEvent::Server(ServerEvent::quiz_ended(quiz.id())),
            Operation::Leave => ParticipantEvent::LeaveRequested,
        };

        match self.machine.handle(event) {
            Ok(actions) => {
                let mut submitted = 0;
                for action in &actions {
                    match action {
                        ParticipantAction::SubmitAnswer { .. } => submitted += 1,
                        ParticipantAction::StartCountdown => self.countdowns_running = true,
                        ParticipantAction::StopCountdown => self.countdowns_running = false,
                        _ => {},
                    }
                }
                match submitted {
                    0 => ModelOutcome::Ok,
                    1 => ModelOutcome::Submitted,
                    n => panic!("{n} submissions from one operation"),
                }
            },
            Err(_) => ModelOutcome::Rejected,
        }
    }

    fn question_number(&self) -> Option<u8> {
        let id = self.machine.current()?.question.question_id.as_ref()?;
        id.as_str().strip_prefix('Q')?.parse().ok()
    }
}

fn quiz_ref() -> impl Strategy<Value = QuizRef> {
    prop_oneof![4 => Just(QuizRef::Joined), 1 => Just(QuizRef::Other)]
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        2 => Just(Operation::RequestJoin),
        2 => any::<bool>().prop_map(|ok| Operation::CompleteJoin { ok }),
        4 => (quiz_ref(), 1u8..20, 1u32..6)
            .prop_map(|(quiz, question, time_limit)| Operation::Push { quiz, question, time_limit }),
        6 => Just(Operation::Tick),
        4 => prop_oneof![Just('A'), Just('B'), Just('Z')].prop_map(|key| Operation::Answer { key }),
        1 => Just(Operation::AnswerFails),
        1 => quiz_ref().prop_map(|quiz| Operation::End { quiz }),
        1 => Just(Operation::Leave),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn machine_matches_model(ops in prop::collection::vec(operation(), 1..60)) {
        let mut model = ModelParticipant::new();
        let mut real = RealWorld::new();

        for (step, op) in ops.iter().enumerate() {
            let expected = model.apply(op);
            let actual = real.apply(op);
            prop_assert_eq!(actual, expected, "outcome diverged at step {} ({:?})", step, op);
            prop_assert_eq!(real.machine.phase(), model.phase(), "phase diverged at step {}", step);
            prop_assert_eq!(
                real.machine.current().map(|q| q.time_left),
                model.time_left(),
                "timer diverged at step {}",
                step
            );
            prop_assert_eq!(real.question_number(), model.question());
        }
    }

    #[test]
    fn countdown_never_outlives_its_question(ops in prop::collection::vec(operation(), 1..60)) {
        let mut real = RealWorld::new();
        for op in &ops {
            real.apply(op);
            if real.countdowns_running {
                let current = real.machine.current();
                prop_assert!(
                    current.is_some_and(|q| !q.is_time_up),
                    "countdown running without a live question"
                );
            }
        }
    }

    #[test]
    fn answered_question_never_submits_again(
        limit in 1u32..10,
        ticks in 0usize..5,
        keys in prop::collection::vec(prop_oneof![Just('A'), Just('B')], 2..6),
    ) {
        let mut real = RealWorld::new();
        real.apply(&Operation::RequestJoin);
        real.apply(&Operation::CompleteJoin { ok: true });
        real.apply(&Operation::Push { quiz: QuizRef::Joined, question: 1, time_limit: limit });
        for _ in 0..ticks {
            real.apply(&Operation::Tick);
        }

        let submitted = keys
            .iter()
            .filter(|&&key| real.apply(&Operation::Answer { key }) == ModelOutcome::Submitted)
            .count();
        prop_assert!(submitted <= 1);
        prop_assert_eq!(submitted == 1, ticks < limit as usize);
    }
}

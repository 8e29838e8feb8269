//! Reference model of the participant machine.
//!
//! A deliberately naive restatement of the participant rules, used by the
//! model-based property tests: the real machine and this model receive the
//! same [`Operation`]s and must agree on every observable.

use quizcast_client::Phase;

/// Quiz selector: the joined quiz or some other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizRef {
    /// `q1`, the quiz every successful join lands in.
    Joined,
    /// `q2`, never joined.
    Other,
}

impl QuizRef {
    /// Wire id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Joined => "q1",
            Self::Other => "q2",
        }
    }
}

/// One input to both the model and the real machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// User submits the join form.
    RequestJoin,
    /// Join call returns.
    CompleteJoin {
        /// Whether the server accepted.
        ok: bool,
    },
    /// Server pushes a question.
    Push {
        /// Quiz the event is for.
        quiz: QuizRef,
        /// Question number, for the id.
        question: u8,
        /// Time limit in seconds.
        time_limit: u32,
    },
    /// One second passes.
    Tick,
    /// User picks an option.
    Answer {
        /// Option key; only `A` and `B` exist.
        key: char,
    },
    /// The submission for the question on screen fails.
    AnswerFails,
    /// Server ends a quiz.
    End {
        /// Quiz the event is for.
        quiz: QuizRef,
    },
    /// User leaves.
    Leave,
}

/// What an operation did, as far as the outside can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Accepted.
    Ok,
    /// Accepted and produced exactly one answer submission.
    Submitted,
    /// Rejected with an error.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelQuestion {
    number: u8,
    time_left: u32,
    answered: bool,
    time_up: bool,
}

/// Reference participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelParticipant {
    joined: bool,
    joining: bool,
    ended: bool,
    current: Option<ModelQuestion>,
}

impl ModelParticipant {
    /// Unjoined participant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected phase.
    pub fn phase(&self) -> Phase {
        match (self.joined, self.ended, self.current) {
            (false, ..) => Phase::Unjoined,
            (true, true, _) => Phase::Ended,
            (true, false, None) => Phase::Waiting,
            (true, false, Some(q)) if q.answered => Phase::Answered,
            (true, false, Some(q)) if q.time_up => Phase::TimedOut,
            (true, false, Some(_)) => Phase::QuestionActive,
        }
    }

    /// Expected seconds left on the question on screen.
    pub fn time_left(&self) -> Option<u32> {
        self.current.map(|q| q.time_left)
    }

    /// Number of the question on screen.
    pub fn question(&self) -> Option<u8> {
        self.current.map(|q| q.number)
    }

    /// Apply `op`.
    pub fn apply(&mut self, op: &Operation) -> ModelOutcome {
        match *op {
            Operation::RequestJoin => {
                if self.joined {
                    return ModelOutcome::Rejected;
                }
                self.joining = true;
                ModelOutcome::Ok
            },
            Operation::CompleteJoin { ok } => {
                if self.joining {
                    self.joining = false;
                    if ok {
                        self.joined = true;
                        self.ended = false;
                        self.current = None;
                    }
                }
                ModelOutcome::Ok
            },
            Operation::Push { quiz, question, time_limit } => {
                if self.live_for(quiz) {
                    self.current = Some(ModelQuestion {
                        number: question,
                        time_left: time_limit,
                        answered: false,
                        time_up: false,
                    });
                }
                ModelOutcome::Ok
            },
            Operation::Tick => {
                if let Some(q) = self.current.as_mut().filter(|q| !q.time_up) {
                    q.time_left = q.time_left.saturating_sub(1);
                    q.time_up = q.time_left == 0;
                }
                ModelOutcome::Ok
            },
            Operation::Answer { key } => {
                if !self.joined {
                    return ModelOutcome::Rejected;
                }
                match self.current.as_mut() {
                    Some(q) if !q.answered && !q.time_up => {
                        if key != 'A' && key != 'B' {
                            return ModelOutcome::Rejected;
                        }
                        q.answered = true;
                        ModelOutcome::Submitted
                    },
                    _ => ModelOutcome::Ok,
                }
            },
            Operation::AnswerFails => {
                if let Some(q) = self.current.as_mut() {
                    q.answered = false;
                }
                ModelOutcome::Ok
            },
            Operation::End { quiz } => {
                if self.live_for(quiz) {
                    self.ended = true;
                    self.current = None;
                }
                ModelOutcome::Ok
            },
            Operation::Leave => {
                *self = Self::default();
                ModelOutcome::Ok
            },
        }
    }

    fn live_for(&self, quiz: QuizRef) -> bool {
        self.joined && !self.ended && quiz == QuizRef::Joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_follows_the_happy_path() {
        let mut model = ModelParticipant::new();
        model.apply(&Operation::RequestJoin);
        model.apply(&Operation::CompleteJoin { ok: true });
        assert_eq!(model.phase(), Phase::Waiting);

        model.apply(&Operation::Push { quiz: QuizRef::Joined, question: 1, time_limit: 2 });
        assert_eq!(model.apply(&Operation::Answer { key: 'B' }), ModelOutcome::Submitted);
        assert_eq!(model.apply(&Operation::Answer { key: 'A' }), ModelOutcome::Ok);

        model.apply(&Operation::End { quiz: QuizRef::Joined });
        assert_eq!(model.phase(), Phase::Ended);
    }

    #[test]
    fn model_ignores_other_quizzes() {
        let mut model = ModelParticipant::new();
        model.apply(&Operation::RequestJoin);
        model.apply(&Operation::CompleteJoin { ok: true });
        model.apply(&Operation::End { quiz: QuizRef::Other });
        assert_eq!(model.phase(), Phase::Waiting);
    }
}

//! Shared test data.

use quizcast_proto::{
    JoinResponse, QuestionId, Quiz, QuizId, QuizOption, QuizQuestion, QuizStatus, QuizUserId,
};

/// Join code used throughout.
pub const JOIN_CODE: &str = "AB12CD";

/// Display name used throughout.
pub const NAME: &str = "Ada";

/// `"2+2?"` with options A:"3" and B:"4".
pub fn question(id: &str, time_limit_seconds: u32) -> QuizQuestion {
    QuizQuestion {
        question_id: Some(QuestionId::new(id)),
        text: "2+2?".into(),
        options: vec![QuizOption::new("A", "3"), QuizOption::new("B", "4")],
        time_limit_seconds,
        max_marks: 10,
    }
}

/// Successful join into `q1` as `u1`.
pub fn joined() -> JoinResponse {
    JoinResponse { quiz_id: QuizId::new("q1"), quiz_user_id: QuizUserId::new("u1") }
}

/// Quiz `q1` with `questions` questions, in `status`.
pub fn quiz(status: QuizStatus, questions: usize) -> Quiz {
    Quiz {
        id: None,
        quiz_id: QuizId::new("q1"),
        title: "Arithmetic".into(),
        description: None,
        status,
        join_code: Some(JOIN_CODE.into()),
        owner_user_id: Some("user-1".into()),
        questions: (1..=questions).map(|n| question(&format!("Q{n}"), 30)).collect(),
        created_at: None,
        updated_at: None,
        participants: None,
        total_participants: None,
    }
}

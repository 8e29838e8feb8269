//! Line-oriented terminal driver.
//!
//! Reads commands from a line source and prints state changes to a writer.
//! Renders arrive after every input, so each screen remembers what it last
//! printed and only writes what changed. The countdown is printed at round
//! numbers and for the last five seconds.

use std::{
    collections::VecDeque,
    io::{self, Write},
};

use quizcast_app::{Command, Driver, View};
use quizcast_client::{Host, Participant, Phase};
use quizcast_proto::{QuestionId, QuizQuestion, VoteTally};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{
    commands::{self, HELP, Input},
    report::status_name,
};

/// Terminal I/O failure.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Reading input or writing output failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParticipantScreen {
    phase: Phase,
    joining: bool,
    question: Option<QuestionId>,
    time_left: Option<u32>,
}

impl ParticipantScreen {
    fn of(participant: &Participant) -> Self {
        let current = participant.current();
        Self {
            phase: participant.phase(),
            joining: participant.is_joining(),
            question: current.and_then(|q| q.question.question_id.clone()),
            time_left: current.map(|q| q.time_left),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct HostScreen {
    loaded: bool,
    hosted: bool,
    active: bool,
    ended: bool,
    current_index: Option<u32>,
    participants: Vec<String>,
    votes: VoteTally,
    leaderboard: usize,
}

impl HostScreen {
    fn of(host: &Host) -> Self {
        Self {
            loaded: host.quiz().is_some(),
            hosted: host.is_hosted(),
            active: host.is_active(),
            ended: host.is_ended(),
            current_index: host.current_index(),
            participants: host.participants().iter().map(|p| p.participant_name.clone()).collect(),
            votes: host.votes().clone(),
            leaderboard: host.leaderboard().len(),
        }
    }
}

/// [`Driver`] over a line reader and a writer.
#[derive(Debug)]
pub struct TerminalDriver<R, W> {
    lines: Lines<R>,
    out: W,
    queued: VecDeque<Command>,
    participant: Option<ParticipantScreen>,
    host: Option<HostScreen>,
}

impl TerminalDriver<BufReader<Stdin>, io::Stdout> {
    /// Driver on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), io::stdout())
    }
}

impl<R, W> TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Driver reading lines from `input` and printing to `out`.
    pub fn new(input: R, out: W) -> Self {
        Self { lines: input.lines(), out, queued: VecDeque::new(), participant: None, host: None }
    }

    /// Run `command` before reading any input.
    pub fn queue(&mut self, command: Command) {
        self.queued.push_back(command);
    }

    /// The output writer.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn print(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    fn render_participant(&mut self, participant: &Participant) -> io::Result<()> {
        let screen = ParticipantScreen::of(participant);
        let previous = self.participant.replace(screen.clone());

        let lines = match previous {
            Some(prev)
                if (prev.phase, prev.joining, &prev.question)
                    == (screen.phase, screen.joining, &screen.question) =>
            {
                match screen.time_left {
                    Some(left)
                        if screen.phase == Phase::QuestionActive
                            && prev.time_left != Some(left)
                            && is_countdown_mark(left) =>
                    {
                        vec![format!("  {left}s left")]
                    },
                    _ => Vec::new(),
                }
            },
            _ => participant_lines(participant),
        };
        self.print(&lines)
    }

    fn render_host(&mut self, host: &Host) -> io::Result<()> {
        let screen = HostScreen::of(host);
        let previous = self.host.replace(screen.clone()).unwrap_or_default();
        let lines = host_changes(&previous, &screen, host);
        self.print(&lines)
    }
}

impl<R, W> Driver for TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = TerminalError;

    async fn poll_command(&mut self) -> Result<Option<Command>, TerminalError> {
        if let Some(command) = self.queued.pop_front() {
            return Ok(Some(command));
        }
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let reply = match commands::parse(&line) {
                Input::Command(command) => return Ok(Some(command)),
                Input::Empty => Vec::new(),
                Input::Help => HELP.iter().map(|line| (*line).to_string()).collect(),
                Input::Unknown { input } => vec![format!("Unknown command: {input} (try /help)")],
                Input::InvalidArgs { command, error } => vec![format!("/{command}: {error}")],
            };
            self.print(&reply)?;
        }
    }

    fn render(&mut self, view: View<'_>) -> Result<(), TerminalError> {
        match view {
            View::Participant(participant) => self.render_participant(participant)?,
            View::Host(host) => self.render_host(host)?,
        }
        Ok(())
    }

    fn alert(&mut self, message: &str) -> Result<(), TerminalError> {
        self.print(&[format!("! {message}")])?;
        Ok(())
    }
}

fn is_countdown_mark(seconds: u32) -> bool {
    seconds <= 5 || seconds % 10 == 0
}

fn question_lines(question: &QuizQuestion, heading: String) -> Vec<String> {
    let mut lines = vec![heading];
    lines.extend(question.options.iter().map(|o| format!("  {}) {}", o.key, o.text)));
    lines
}

/// Full participant screen.
fn participant_lines(participant: &Participant) -> Vec<String> {
    match participant.phase() {
        Phase::Unjoined if participant.is_joining() => vec!["Joining...".into()],
        Phase::Unjoined if participant.join_code().is_empty() => {
            vec!["Not in a quiz. Use /join CODE NAME.".into()]
        },
        Phase::Unjoined => vec![format!(
            "Not in a quiz. Last code: {}. Use /join CODE NAME.",
            participant.join_code()
        )],
        Phase::Waiting => {
            let quiz = participant.session().map(|s| s.quiz_id.as_str()).unwrap_or_default();
            vec![format!("Joined quiz {quiz}. Waiting for the next question...")]
        },
        Phase::QuestionActive => match participant.current() {
            Some(current) => question_lines(
                &current.question,
                format!("{}  ({}s)", current.question.text, current.time_left),
            ),
            None => Vec::new(),
        },
        Phase::Answered => vec!["Answer sent. Waiting for the next question...".into()],
        Phase::TimedOut => vec!["Time is up.".into()],
        Phase::Ended => vec!["Quiz complete. Thanks for playing!".into()],
    }
}

fn vote_line(votes: &VoteTally) -> String {
    let parts: Vec<String> = votes
        .iter()
        .map(|(key, count)| format!("{key} {count} ({}%)", votes.percentage(key)))
        .collect();
    format!("Votes: {}", parts.join("  "))
}

/// Lines announcing what changed between two host screens.
fn host_changes(prev: &HostScreen, next: &HostScreen, host: &Host) -> Vec<String> {
    let mut lines = Vec::new();

    if next.loaded && !prev.loaded {
        if let Some(quiz) = host.quiz() {
            lines.push(format!(
                "Quiz: {} ({} questions, {})",
                quiz.title,
                quiz.questions.len(),
                status_name(quiz.status)
            ));
        }
    }
    if next.hosted && !prev.hosted {
        match host.join_code() {
            Some(code) => lines.push(format!("Join code: {code}")),
            None => lines.push("Quiz is open for joining.".into()),
        }
    }
    if next.active && !prev.active {
        lines.push("Quiz started. Use /push N to show a question.".into());
    }
    if next.participants != prev.participants {
        lines.push(format!(
            "Participants ({}): {}",
            next.participants.len(),
            next.participants.join(", ")
        ));
    }
    if next.current_index != prev.current_index {
        let question = next
            .current_index
            .and_then(|i| Some((i, host.quiz()?.questions.get(i as usize)?)));
        if let Some((index, question)) = question {
            let total = host.question_count().unwrap_or_default();
            lines.extend(question_lines(
                question,
                format!("Question {}/{total}: {}", index + 1, question.text),
            ));
        }
    }
    if next.votes != prev.votes && !next.votes.is_empty() {
        lines.push(vote_line(&next.votes));
    }
    if next.ended && !prev.ended {
        lines.push("Quiz ended.".into());
    }
    if next.leaderboard != prev.leaderboard && next.leaderboard > 0 {
        lines.push("Leaderboard:".into());
        lines.extend(host.leaderboard().iter().enumerate().map(|(rank, entry)| {
            let score = entry.total_score.map_or_else(|| "-".to_string(), |s| s.to_string());
            format!("  {}. {}  {score}", rank + 1, entry.participant_name)
        }));
    }
    lines
}

#[cfg(test)]
mod tests {
    use quizcast_client::{HostEvent, ParticipantEvent};
    use quizcast_proto::{
        HostResponse, JoinResponse, Participant as Player, Quiz, QuizId, QuizOption, QuizStatus,
        QuizUserId, ServerEvent,
    };

    use super::*;

    fn question(id: &str, limit: u32) -> QuizQuestion {
        QuizQuestion {
            question_id: Some(QuestionId::new(id)),
            text: "2+2?".into(),
            options: vec![QuizOption::new("A", "3"), QuizOption::new("B", "4")],
            time_limit_seconds: limit,
            max_marks: 10,
        }
    }

    fn driver(input: &'static str) -> TerminalDriver<&'static [u8], Vec<u8>> {
        TerminalDriver::new(input.as_bytes(), Vec::new())
    }

    fn printed(driver: &TerminalDriver<&'static [u8], Vec<u8>>) -> String {
        String::from_utf8_lossy(driver.output()).into_owned()
    }

    fn joined_participant() -> Participant {
        let mut p = Participant::new();
        p.handle(ParticipantEvent::JoinRequested {
            join_code: "ab12cd".into(),
            name: "Ada".into(),
            user_id: None,
        })
        .unwrap();
        p.handle(ParticipantEvent::JoinCompleted(Ok(JoinResponse {
            quiz_id: QuizId::new("q1"),
            quiz_user_id: QuizUserId::new("u1"),
        })))
        .unwrap();
        p
    }

    #[tokio::test]
    async fn commands_skip_noise() {
        let mut d = driver("\nhello\n/push 0\n/help\nb\n");
        assert_eq!(d.poll_command().await.unwrap(), Some(Command::Answer { key: "B".into() }));
        assert_eq!(d.poll_command().await.unwrap(), None);
        let out = printed(&d);
        assert!(out.contains("Unknown command: hello"));
        assert!(out.contains("/push: Question numbers start at 1"));
        assert!(out.contains("/join CODE NAME"));
    }

    #[tokio::test]
    async fn queued_commands_come_first() {
        let mut d = driver("/quit\n");
        d.queue(Command::Join { code: "AB12CD".into(), name: "Ada".into() });
        assert!(matches!(d.poll_command().await.unwrap(), Some(Command::Join { .. })));
        assert_eq!(d.poll_command().await.unwrap(), Some(Command::Quit));
    }

    #[test]
    fn participant_screen_prints_changes_only() {
        let mut d = driver("");
        let mut p = joined_participant();
        d.render(View::Participant(&p)).unwrap();
        d.render(View::Participant(&p)).unwrap();

        p.handle(ParticipantEvent::Server(ServerEvent::question_pushed("q1", question("Q1", 12))))
            .unwrap();
        d.render(View::Participant(&p)).unwrap();
        for _ in 0..8 {
            p.handle(ParticipantEvent::Tick).unwrap();
            d.render(View::Participant(&p)).unwrap();
        }
        p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        d.render(View::Participant(&p)).unwrap();
        d.alert("Failed to submit answer").unwrap();

        insta::assert_snapshot!(printed(&d), @r"
        Joined quiz q1. Waiting for the next question...
        2+2?  (12s)
          A) 3
          B) 4
          10s left
          5s left
          4s left
        Answer sent. Waiting for the next question...
        ! Failed to submit answer
        ");
    }

    #[test]
    fn unjoined_screen_offers_the_last_code() {
        let mut p = Participant::new();
        p.handle(ParticipantEvent::Initialize(quizcast_client::PersistedState {
            session: None,
            join_code: Some("AB12CD".into()),
            display_name: None,
        }))
        .unwrap();
        assert_eq!(participant_lines(&p), ["Not in a quiz. Last code: AB12CD. Use /join CODE NAME."]);
    }

    #[test]
    fn host_screen_announces_progress() {
        let mut d = driver("");
        let mut host = Host::new(QuizId::new("q1"), None);
        d.render(View::Host(&host)).unwrap();

        host.handle(HostEvent::QuizLoaded(Ok(Quiz {
            id: None,
            quiz_id: QuizId::new("q1"),
            title: "Arithmetic".into(),
            description: None,
            status: QuizStatus::Draft,
            join_code: None,
            owner_user_id: None,
            questions: vec![question("Q1", 30), question("Q2", 30)],
            created_at: None,
            updated_at: None,
            participants: None,
            total_participants: None,
        })))
        .unwrap();
        d.render(View::Host(&host)).unwrap();
        host.handle(HostEvent::HostCompleted(Ok(HostResponse { join_code: Some("AB12CD".into()) })))
            .unwrap();
        host.handle(HostEvent::StartCompleted(Ok(()))).unwrap();
        d.render(View::Host(&host)).unwrap();
        host.handle(HostEvent::Server(ServerEvent::ParticipantJoined(
            quizcast_proto::events::ParticipantJoined {
                quiz_id: QuizId::new("q1"),
                participant: Player {
                    quiz_user_id: QuizUserId::new("u1"),
                    participant_name: "Ada".into(),
                    total_score: None,
                },
            },
        )))
        .unwrap();
        host.handle(HostEvent::PushCompleted { index: 1, result: Ok(()) }).unwrap();
        d.render(View::Host(&host)).unwrap();
        host.handle(HostEvent::Server(ServerEvent::VotesUpdate(quizcast_proto::events::VotesUpdate {
            quiz_id: QuizId::new("q1"),
            counts: [("A".to_string(), 1), ("B".to_string(), 3)].into_iter().collect(),
        })))
        .unwrap();
        d.render(View::Host(&host)).unwrap();
        host.handle(HostEvent::EndCompleted(Ok(()))).unwrap();
        host.handle(HostEvent::LeaderboardLoaded(Ok(vec![Player {
            quiz_user_id: QuizUserId::new("u1"),
            participant_name: "Ada".into(),
            total_score: Some(20.0),
        }])))
        .unwrap();
        d.render(View::Host(&host)).unwrap();

        insta::assert_snapshot!(printed(&d), @r"
        Quiz: Arithmetic (2 questions, draft)
        Join code: AB12CD
        Quiz started. Use /push N to show a question.
        Participants (1): Ada
        Question 2/2: 2+2?
          A) 3
          B) 4
        Votes: A 1 (25%)  B 3 (75%)
        Quiz ended.
        Leaderboard:
          1. Ada  20
        ");
    }
}

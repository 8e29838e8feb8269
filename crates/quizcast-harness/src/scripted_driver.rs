//! Scripted [`Driver`].
//!
//! Plays a fixed list of [`Step`]s: commands to send, server events to push,
//! and conditions on the rendered state to wait for. Every render is kept as
//! a [`Frame`] so tests can assert on what the user would have seen.

use std::{collections::VecDeque, convert::Infallible, fmt, future};

use quizcast_app::{Command, Driver, View};
use quizcast_client::{Host, Participant};
use quizcast_proto::ServerEvent;
use tracing::debug;

use crate::fake_channel::FakeServer;

/// Snapshot taken at render time.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Participant screen.
    Participant(Participant),
    /// Host screen.
    Host(Host),
}

impl Frame {
    /// Participant state, if this is a participant frame.
    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Self::Participant(p) => Some(p),
            Self::Host(_) => None,
        }
    }

    /// Host state, if this is a host frame.
    pub fn host(&self) -> Option<&Host> {
        match self {
            Self::Host(h) => Some(h),
            Self::Participant(_) => None,
        }
    }
}

type Condition = Box<dyn Fn(&Frame) -> bool + Send>;

enum Step {
    Send(Command),
    Push(ServerEvent),
    Until(&'static str, Condition),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(command) => f.debug_tuple("Send").field(command).finish(),
            Self::Push(event) => f.debug_tuple("Push").field(&event.kind()).finish(),
            Self::Until(label, _) => f.debug_tuple("Until").field(label).finish(),
        }
    }
}

/// Driver that replays a script. Input ends when the script runs out.
#[derive(Debug)]
pub struct ScriptedDriver {
    steps: VecDeque<Step>,
    server: Option<FakeServer>,
    frames: Vec<Frame>,
    alerts: Vec<String>,
}

impl ScriptedDriver {
    /// Empty script.
    pub fn new() -> Self {
        Self { steps: VecDeque::new(), server: None, frames: Vec::new(), alerts: Vec::new() }
    }

    /// Attach the server half used by [`Self::push`] steps.
    #[must_use]
    pub fn with_server(mut self, server: FakeServer) -> Self {
        self.server = Some(server);
        self
    }

    /// Send a command.
    #[must_use]
    pub fn send(mut self, command: Command) -> Self {
        self.steps.push_back(Step::Send(command));
        self
    }

    /// Push a server event.
    #[must_use]
    pub fn push(mut self, event: ServerEvent) -> Self {
        self.steps.push_back(Step::Push(event));
        self
    }

    /// Wait until the last rendered frame satisfies `condition`.
    #[must_use]
    pub fn until(
        mut self,
        label: &'static str,
        condition: impl Fn(&Frame) -> bool + Send + 'static,
    ) -> Self {
        self.steps.push_back(Step::Until(label, Box::new(condition)));
        self
    }

    /// Every rendered frame, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Last rendered frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Every alert shown, oldest first.
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Whether every step has been played.
    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pop steps until a command is due. `None` means the script is done;
    /// `Some(None)` means a condition is still unmet.
    fn advance(&mut self) -> Option<Option<Command>> {
        loop {
            match self.steps.front()? {
                Step::Until(label, condition) => {
                    if !self.frames.last().is_some_and(condition) {
                        return Some(None);
                    }
                    debug!(label, "condition met");
                },
                Step::Send(_) | Step::Push(_) => {},
            }
            match self.steps.pop_front()? {
                Step::Send(command) => return Some(Some(command)),
                Step::Push(event) => {
                    if let Some(server) = &self.server {
                        server.push(event);
                    }
                },
                Step::Until(..) => {},
            }
        }
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;

    async fn poll_command(&mut self) -> Result<Option<Command>, Infallible> {
        match self.advance() {
            None => Ok(None),
            Some(Some(command)) => Ok(Some(command)),
            Some(None) => future::pending().await,
        }
    }

    fn render(&mut self, view: View<'_>) -> Result<(), Infallible> {
        self.frames.push(match view {
            View::Participant(p) => Frame::Participant(p.clone()),
            View::Host(h) => Frame::Host(h.clone()),
        });
        Ok(())
    }

    fn alert(&mut self, message: &str) -> Result<(), Infallible> {
        debug!(message, "alert");
        self.alerts.push(message.to_string());
        Ok(())
    }
}

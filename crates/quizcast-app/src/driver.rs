//! Driver trait and the run loops built on it.
//!
//! A [`Driver`] supplies user commands and shows state; the run loops own
//! everything else. The same loops run behind the terminal frontend and the
//! scripted drivers used in tests.

use std::future::Future;

use quizcast_client::{Host, Participant};
use quizcast_core::{QuizApi, RealtimeChannel, Storage};
use tracing::debug;

use crate::{error::RuntimeError, host::HostRuntime, participant::ParticipantRuntime};

/// Alert shown when a command fails without a more specific message.
const COMMAND_FAILED: &str = "Something went wrong";

/// User request from a frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join a quiz.
    Join {
        /// Join code.
        code: String,
        /// Display name.
        name: String,
    },
    /// Answer the current question.
    Answer {
        /// Option key.
        key: String,
    },
    /// Leave the quiz.
    Leave,
    /// Publish the hosted quiz.
    Host,
    /// Start the hosted quiz.
    Start,
    /// Push a question (0-based).
    Push {
        /// Question index.
        index: u32,
    },
    /// End the hosted quiz.
    End,
    /// Remove all participants.
    Clear,
    /// Stop the run loop.
    Quit,
}

impl Command {
    /// Short name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Answer { .. } => "answer",
            Self::Leave => "leave",
            Self::Host => "host",
            Self::Start => "start",
            Self::Push { .. } => "push",
            Self::End => "end",
            Self::Clear => "clear",
            Self::Quit => "quit",
        }
    }
}

/// State handed to [`Driver::render`].
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    /// Participant screen.
    Participant(&'a Participant),
    /// Host screen.
    Host(&'a Host),
}

/// Frontend I/O.
pub trait Driver: Send {
    /// Frontend error type. Returning one ends the run loop.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user command.
    ///
    /// Returns `None` when input is exhausted. Must be cancel-safe: the run
    /// loop drops this future whenever another input arrives first.
    fn poll_command(&mut self) -> impl Future<Output = Result<Option<Command>, Self::Error>> + Send;

    /// Show the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render(&mut self, view: View<'_>) -> Result<(), Self::Error>;

    /// Show a one-off message.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn alert(&mut self, message: &str) -> Result<(), Self::Error>;
}

/// Run a participant view until the user quits or input ends.
///
/// Failed commands and calls become alerts; only driver errors end the loop.
/// The view is unmounted on return. The stored session is kept unless the
/// user left.
///
/// # Errors
///
/// The first driver error.
pub async fn run_participant<D, A, C, S>(
    driver: &mut D,
    runtime: &mut ParticipantRuntime<'_, A, C, S>,
) -> Result<(), D::Error>
where
    D: Driver,
    A: QuizApi + 'static,
    C: RealtimeChannel,
    S: Storage,
{
    let mounted = runtime.mount().await;
    let result = participant_loop(driver, runtime, mounted).await;
    runtime.unmount();
    result
}

async fn participant_loop<D, A, C, S>(
    driver: &mut D,
    runtime: &mut ParticipantRuntime<'_, A, C, S>,
    mut outcome: Result<(), RuntimeError>,
) -> Result<(), D::Error>
where
    D: Driver,
    A: QuizApi + 'static,
    C: RealtimeChannel,
    S: Storage,
{
    loop {
        if let Err(err) = outcome {
            driver.alert(&err.user_message(COMMAND_FAILED))?;
        }
        for alert in runtime.take_alerts() {
            driver.alert(&alert)?;
        }
        driver.render(View::Participant(runtime.machine()))?;

        outcome = tokio::select! {
            command = driver.poll_command() => match command? {
                None | Some(Command::Quit) => break,
                Some(command) => participant_command(driver, runtime, command).await?,
            },
            event = runtime.next_input() => runtime.apply(event).await,
        };
    }
    debug!("participant loop finished");
    Ok(())
}

async fn participant_command<D, A, C, S>(
    driver: &mut D,
    runtime: &mut ParticipantRuntime<'_, A, C, S>,
    command: Command,
) -> Result<Result<(), RuntimeError>, D::Error>
where
    D: Driver,
    A: QuizApi + 'static,
    C: RealtimeChannel,
    S: Storage,
{
    Ok(match command {
        Command::Join { code, name } => runtime.join(&code, &name).await,
        Command::Answer { key } => runtime.answer(&key).await,
        Command::Leave => runtime.leave().await,
        other => {
            driver.alert(&format!("/{} is only available to hosts", other.name()))?;
            Ok(())
        },
    })
}

/// Run a host view until the user quits or input ends.
///
/// # Errors
///
/// The first driver error.
pub async fn run_host<D, A, C>(
    driver: &mut D,
    runtime: &mut HostRuntime<'_, A, C>,
) -> Result<(), D::Error>
where
    D: Driver,
    A: QuizApi + 'static,
    C: RealtimeChannel,
{
    let mounted = runtime.mount().await;
    let result = host_loop(driver, runtime, mounted).await;
    runtime.unmount();
    result
}

async fn host_loop<D, A, C>(
    driver: &mut D,
    runtime: &mut HostRuntime<'_, A, C>,
    mut outcome: Result<(), RuntimeError>,
) -> Result<(), D::Error>
where
    D: Driver,
    A: QuizApi + 'static,
    C: RealtimeChannel,
{
    loop {
        if let Err(err) = outcome {
            driver.alert(&err.user_message(COMMAND_FAILED))?;
        }
        for alert in runtime.take_alerts() {
            driver.alert(&alert)?;
        }
        driver.render(View::Host(runtime.machine()))?;

        outcome = tokio::select! {
            command = driver.poll_command() => match command? {
                None | Some(Command::Quit) => break,
                Some(Command::Host) => runtime.host().await,
                Some(Command::Start) => runtime.start().await,
                Some(Command::Push { index }) => runtime.push(index).await,
                Some(Command::End) => runtime.end().await,
                Some(Command::Clear) => runtime.clear().await,
                Some(other) => {
                    driver.alert(&format!("/{} is only available to participants", other.name()))?;
                    Ok(())
                },
            },
            event = runtime.next_input() => runtime.apply(event).await,
        };
    }
    debug!("host loop finished");
    Ok(())
}

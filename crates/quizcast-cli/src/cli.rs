//! Argument parsing and subcommand dispatch.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use quizcast_app::{
    AuthService, ChannelHub, Command, Config, Driver, HostRuntime, ParticipantRuntime, run_host,
    run_participant,
};
use quizcast_client::{
    draft,
    transport::{HttpApi, WebSocketChannel},
};
use quizcast_core::{FileStorage, QuizApi, Storage};
use quizcast_proto::{ListQuery, QuizDraft, QuizId, SignupRequest};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    error::CliError,
    report,
    terminal::TerminalDriver,
    tracker::{self, GoalsCommand, TasksCommand},
};

/// Join or host live quizzes from the terminal.
#[derive(Debug, Parser)]
#[command(name = "quizcast", version, about)]
pub struct Cli {
    /// Backend base URL. Overrides `QUIZCAST_BACKEND_URL`.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// File holding the quiz session and login token.
    #[arg(long, global = true, default_value = ".quizcast.json")]
    pub storage: PathBuf,

    /// What to do.
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Join a quiz as a participant. Resumes a stored session if there is one.
    Join {
        /// Join code shown by the host.
        #[arg(long)]
        code: Option<String>,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Run a quiz you own.
    Host {
        /// Quiz id.
        quiz_id: String,
    },

    /// Manage quizzes.
    Quizzes {
        /// Quiz operation.
        #[command(subcommand)]
        action: QuizzesCommand,
    },

    /// Track goals, milestones and subtasks. Needs a login.
    Goals {
        /// Goal operation.
        #[command(subcommand)]
        action: GoalsCommand,
    },

    /// Track recurring daily tasks. Needs a login.
    Tasks {
        /// Task operation.
        #[command(subcommand)]
        action: TasksCommand,
    },

    /// Log in.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },

    /// Create an account and log in.
    Signup {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
        /// Full name.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Log out.
    Logout,

    /// Show the logged-in user.
    Whoami,
}

/// `quizzes` subcommands.
#[derive(Debug, Subcommand)]
pub enum QuizzesCommand {
    /// List quizzes.
    List {
        /// Free-text search.
        #[arg(long)]
        search: Option<String>,
        /// Only quizzes you own.
        #[arg(long)]
        mine: bool,
        /// 1-based page.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Create a draft from a JSON file (`{title, description?, questions}`).
    Create {
        /// Draft file.
        file: PathBuf,
    },

    /// List finished quizzes.
    Past {
        /// 1-based page.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show questions, participants and leaderboard of a quiz.
    Details {
        /// Quiz id.
        quiz_id: String,
    },
}

type Api = Arc<HttpApi>;
type Store = Arc<FileStorage>;

fn print(lines: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Run one invocation.
///
/// # Errors
///
/// Configuration, storage and connection failures, and failed one-shot
/// requests. Failures inside an interactive session are shown as alerts
/// instead.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.backend {
        config = config.with_backend(url)?;
    }
    debug!(backend = config.backend_url(), storage = %cli.storage.display(), "starting");

    let storage: Store = Arc::new(FileStorage::open(cli.storage.clone())?);
    let token_store: Arc<dyn Storage> = storage.clone();
    let api: Api = Arc::new(HttpApi::new(config.backend_url())?.with_token_store(token_store));

    match cli.command {
        CliCommand::Join { code, name } => join(&config, api, storage, code, name).await,
        CliCommand::Host { quiz_id } => host(&config, api, storage, QuizId::new(quiz_id)).await,
        CliCommand::Quizzes { action } => quizzes(api, storage, action).await,
        CliCommand::Goals { action } => {
            print(&tracker::goals(api.as_ref(), action).await?)?;
            Ok(())
        },
        CliCommand::Tasks { action } => {
            print(&tracker::tasks(api.as_ref(), action).await?)?;
            Ok(())
        },
        CliCommand::Login { email, password } => {
            let mut auth = AuthService::new(api, storage);
            auth.login(&email, &password).await?;
            print(&[format!("Logged in as {}", report::user(auth.user()))])?;
            Ok(())
        },
        CliCommand::Signup { username, email, password, name } => {
            let mut auth = AuthService::new(api, storage);
            auth.signup(&SignupRequest { username, email, password, name }).await?;
            print(&[format!("Signed up as {}", report::user(auth.user()))])?;
            Ok(())
        },
        CliCommand::Logout => {
            AuthService::new(api, storage).logout().await?;
            print(&["Logged out.".to_string()])?;
            Ok(())
        },
        CliCommand::Whoami => {
            let mut auth = AuthService::new(api, storage);
            auth.check().await?;
            print(&[report::user(auth.user())])?;
            Ok(())
        },
    }
}

async fn join(
    config: &Config,
    api: Api,
    storage: Store,
    code: Option<String>,
    name: Option<String>,
) -> Result<(), CliError> {
    let mut auth = AuthService::new(Arc::clone(&api), Arc::clone(&storage));
    auth.check().await?;

    let mut driver = TerminalDriver::stdio();
    match (code, name) {
        (Some(code), Some(name)) => driver.queue(Command::Join { code, name }),
        (None, None) => {},
        _ => driver.alert("Both --code and --name are needed; use /join CODE NAME instead")?,
    }

    let channel = open_channel(config, &mut driver).await?;
    let mut hub = ChannelHub::new(channel);
    {
        let mut runtime = ParticipantRuntime::new(api, &mut hub, storage);
        runtime.set_user_id(auth.user_id().map(str::to_string));
        tokio::select! {
            finished = run_participant(&mut driver, &mut runtime) => finished?,
            never = auth.keep_fresh() => match never {},
        }
    }
    hub.close().await;
    Ok(())
}

async fn host(config: &Config, api: Api, storage: Store, quiz_id: QuizId) -> Result<(), CliError> {
    let mut auth = AuthService::new(Arc::clone(&api), storage);
    auth.check().await?;
    if auth.user_id().is_none() {
        warn!("not logged in; host calls for quizzes you own will be refused");
    }

    let mut driver = TerminalDriver::stdio();
    let channel = open_channel(config, &mut driver).await?;
    let mut hub = ChannelHub::new(channel);
    {
        let mut runtime = HostRuntime::new(api, &mut hub, quiz_id, None);
        tokio::select! {
            finished = run_host(&mut driver, &mut runtime) => finished?,
            never = auth.keep_fresh() => match never {},
        }
    }
    hub.close().await;
    Ok(())
}

/// Alert shown when a session starts without live updates.
pub const OFFLINE: &str = "Live updates unavailable; showing server state only";

/// Connect the realtime channel, falling back to an offline one so the
/// session still runs on REST calls.
async fn open_channel<D>(config: &Config, driver: &mut D) -> Result<WebSocketChannel, CliError>
where
    D: Driver,
    CliError: From<D::Error>,
{
    match WebSocketChannel::connect(config.backend_url()).await {
        Ok(channel) => Ok(channel),
        Err(err) => {
            warn!(%err, "realtime connection failed");
            driver.alert(OFFLINE)?;
            Ok(WebSocketChannel::offline())
        },
    }
}

async fn quizzes(api: Api, storage: Store, action: QuizzesCommand) -> Result<(), CliError> {
    let lines = match action {
        QuizzesCommand::List { search, mine, page, limit } => {
            let owner_user_id = if mine {
                let mut auth = AuthService::new(Arc::clone(&api), storage);
                auth.check().await?;
                if auth.user_id().is_none() {
                    warn!("--mine needs a login; listing all quizzes");
                }
                auth.user_id().map(str::to_string)
            } else {
                None
            };
            let query = ListQuery { owner_user_id, search, page, limit };
            report::quiz_list(&api.list_quizzes(&query).await?)
        },
        QuizzesCommand::Create { file } => {
            let parsed = read_draft(file).await?;
            let quiz = api.create_quiz(&draft::prepare(parsed)?).await?;
            vec![
                format!("Created quiz {} ({} questions)", quiz.quiz_id, quiz.questions.len()),
                format!("Host it with: quizcast host {}", quiz.quiz_id),
            ]
        },
        QuizzesCommand::Past { page, limit } => {
            let query = ListQuery { page, limit, ..ListQuery::default() };
            report::past_quizzes(&api.admin_list_past(&query).await?)
        },
        QuizzesCommand::Details { quiz_id } => {
            report::quiz_details(&api.admin_details(&QuizId::new(quiz_id)).await?)
        },
    };
    print(&lines)?;
    Ok(())
}

async fn read_draft(path: PathBuf) -> Result<QuizDraft, CliError> {
    read_json(path, "quiz draft").await
}

/// Read and decode a JSON input file.
pub(crate) async fn read_json<T: DeserializeOwned>(
    path: PathBuf,
    what: &'static str,
) -> Result<T, CliError> {
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(source) => return Err(CliError::InputFile { path, source }),
    };
    serde_json::from_str(&text).map_err(|source| CliError::InputJson { path, what, source })
}

//! Command parsing for the interactive session.
//!
//! Lines starting with `/` are commands. A bare option key (`A`, `b`) is
//! shorthand for `/answer`.

use quizcast_app::Command;

/// Parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A command for the run loop.
    Command(Command),

    /// Print the command list.
    Help,

    /// Nothing typed.
    Empty,

    /// Unknown command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Usage lines shown by `/help`.
pub const HELP: &[&str] = &[
    "/join CODE NAME   join a quiz",
    "/answer KEY       answer the current question (or type the key alone)",
    "/leave            leave the quiz",
    "/host             publish the quiz (host)",
    "/start            start the quiz (host)",
    "/push N           push question N, counting from 1 (host)",
    "/end              end the quiz (host)",
    "/clear            remove all participants (host)",
    "/quit             exit",
];

fn invalid(command: &str, error: &str) -> Input {
    Input::InvalidArgs { command: command.into(), error: error.into() }
}

/// Parse a user input line.
pub fn parse(input: &str) -> Input {
    let input = input.trim();

    if input.is_empty() {
        return Input::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        if is_option_key(input) {
            return Input::Command(Command::Answer { key: input.to_ascii_uppercase() });
        }
        return Input::Unknown { input: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    let parsed = match command {
        "join" => match parts.get(1) {
            Some(code) if parts.len() > 2 => {
                Command::Join { code: (*code).to_string(), name: parts[2..].join(" ") }
            },
            _ => return invalid("join", "Usage: /join <code> <name>"),
        },

        "answer" | "a" => match parts.get(1) {
            Some(key) if is_option_key(key) => Command::Answer { key: key.to_ascii_uppercase() },
            Some(_) => return invalid(command, "Option keys are single letters"),
            None => return invalid(command, "Usage: /answer <key>"),
        },

        "leave" => Command::Leave,
        "host" => Command::Host,
        "start" => Command::Start,

        "push" => match parts.get(1).map(|n| n.parse::<u32>()) {
            Some(Ok(number)) if number >= 1 => Command::Push { index: number - 1 },
            Some(_) => return invalid("push", "Question numbers start at 1"),
            None => return invalid("push", "Usage: /push <number>"),
        },

        "end" => Command::End,
        "clear" => Command::Clear,
        "quit" | "q" => Command::Quit,
        "help" | "h" | "?" => return Input::Help,

        _ => return Input::Unknown { input: input.to_string() },
    };
    Input::Command(parsed)
}

fn is_option_key(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

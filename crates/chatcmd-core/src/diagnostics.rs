//! Rendering of dispatch failures into chat messages.

use crate::error::DispatchError;
use crate::matcher::{MISSING_TOKEN, SyntaxError, SyntaxHint};
use crate::message::{Message, Style};

pub const UNKNOWN_COMMAND_KEY: &str = "commands.generic.unknown";
pub const SYNTAX_KEY: &str = "commands.generic.syntax";

/// Messages the sender should see for `error`.
pub fn render(error: &DispatchError) -> Vec<Message> {
    match error {
        DispatchError::NotFound { name, suggestions } => {
            let mut msg = Message::new(Style::Error).with_translation(UNKNOWN_COMMAND_KEY, [name.as_str()]);
            if !suggestions.is_empty() {
                msg = msg.with_text(format!(" Did you mean: {}?", suggestions.join(", ")));
            }
            vec![msg]
        }
        DispatchError::PermissionDenied { command, message } => vec![Message::error(
            message
                .clone()
                .unwrap_or_else(|| format!("You do not have permission to use \"{command}\"")),
        )],
        DispatchError::Syntax(err) => render_syntax(err),
        DispatchError::OnCooldown { command, remaining } => vec![Message::error(format!(
            "Please wait {:.1}s before using \"{command}\" again",
            remaining.as_secs_f64()
        ))],
        DispatchError::Incomplete { command } => vec![Message::error(format!(
            "Incomplete command \"{command}\", see help for its usage"
        ))],
        DispatchError::HandlerFailed { report, .. } => vec![Message::error(format!(
            "An error occurred while executing this command, {report}"
        ))],
    }
}

fn render_syntax(err: &SyntaxError) -> Vec<Message> {
    let position = Message::new(Style::Error).with_translation(
        SYNTAX_KEY,
        [
            err.usage_prefix(),
            err.token.clone().unwrap_or_else(|| " ".to_string()),
            err.remaining.join(" "),
        ],
    );
    let hint = match &err.hint {
        SyntaxHint::Candidates { argument, types } => format!(
            "\"{}\" is not valid! Argument \"{argument}\" can be typeof: \"{}\"",
            err.token.as_deref().unwrap_or(MISSING_TOKEN),
            types.join("\", \"")
        ),
        SyntaxHint::Expected(text) => text.clone(),
    };
    vec![position, Message::error(hint)]
}

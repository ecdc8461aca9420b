//! Error types for the chatcmd core library.

use std::time::Duration;

use thiserror::Error;

use crate::args::ValueKind;
use crate::matcher::SyntaxError;

/// Result type alias using chatcmd Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for chatcmd operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command tree construction error
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised while declaring commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A root name or alias is already claimed by an earlier root.
    #[error("Command name \"{name}\" is already registered by \"{existing}\"")]
    DuplicateRoot { name: String, existing: String },

    /// A handler's parameter list does not line up with the values its node produces.
    #[error("Handler for \"{node}\" takes [{}] but the node produces [{}]", join_kinds(.found), join_kinds(.expected))]
    SignatureMismatch {
        node: String,
        expected: Vec<ValueKind>,
        found: Vec<ValueKind>,
    },
}

/// Why a dispatch did not reach (or did not survive) its handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown command \"{name}\"")]
    NotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Permission denied for \"{command}\"")]
    PermissionDenied {
        command: String,
        message: Option<String>,
    },

    #[error(transparent)]
    Syntax(SyntaxError),

    #[error("\"{command}\" is on cooldown for another {remaining:?}")]
    OnCooldown { command: String, remaining: Duration },

    /// The input ended on a node with no handler at or above it.
    #[error("\"{command}\" is incomplete")]
    Incomplete { command: String },

    #[error("Handler for \"{command}\" failed: {report}")]
    HandlerFailed { command: String, report: String },
}

fn join_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

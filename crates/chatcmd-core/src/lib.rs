//! chatcmd Core Library
//!
//! Prefixed chat-command parsing and dispatch:
//! - Typed argument grammar and the arena-backed command tree
//! - First-match tree resolution with syntax diagnostics
//! - Async dispatcher with permissions, cooldowns and contained handler failures
//! - Help/introspection rendering
//! - Configuration resolution and tracing setup

pub mod args;
pub mod config;
pub mod cooldown;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod help;
pub mod matcher;
pub mod message;
pub mod sender;
pub mod suggest;
pub mod tokenizer;
pub mod tracing_init;
pub mod tree;

pub use args::{ArgValue, ArgumentType, CustomArgument, MatchEnv, ValueKind};
pub use config::Config;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{DispatchError, Error, Result, TreeError};
pub use message::{Message, Style};
pub use sender::{CommandSender, NoPlayers, PlayerDirectory, SenderRef, Vec3};
pub use tree::{CommandContext, CommandData, CommandRegistry, Completion, NodeId};

//! Chat message dispatch.
//!
//! A dispatch runs these stages in order: prefix check, tokenize, root
//! lookup, root permission, cooldown, tree resolution, value extraction,
//! handler invocation and post-handler bookkeeping. Every failure before
//! the handler is rendered to the sender and reported back to the host as
//! a [`DispatchOutcome::Failed`]; nothing is propagated as a panic.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::args::{ArgValue, Coordinate, MatchEnv, resolve_location};
use crate::config::DispatchConfig;
use crate::cooldown::CooldownTracker;
use crate::diagnostics;
use crate::error::{DispatchError, Error, Result};
use crate::matcher::{MatchError, Resolve};
use crate::sender::{PlayerDirectory, SenderRef};
use crate::suggest;
use crate::tokenizer::tokenize;
use crate::tree::{CommandContext, CommandRegistry, Completion, NodeId};

/// What happened to one inbound chat message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command: no prefix, or nothing after it.
    Ignored,
    /// The handler ran to completion.
    Executed,
    /// The handler signalled a soft failure; no bookkeeping was done.
    SoftFailed,
    /// The sender disconnected before the handler could start.
    SenderGone,
    /// Dispatch stopped; the sender has already been told why.
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub const fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }

    pub const fn error(&self) -> Option<&DispatchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// JSON body embedded in the generic execution-error message.
#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    command: &'a str,
    message: String,
    causes: Vec<String>,
}

impl FailureReport<'_> {
    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

/// Routes prefixed chat messages through an immutable command registry.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    players: Arc<dyn PlayerDirectory>,
    prefix: Arc<str>,
    cooldowns: CooldownTracker,
}

impl Dispatcher {
    /// Freeze `registry` and prepare to dispatch against it.
    pub fn new(
        registry: CommandRegistry,
        players: Arc<dyn PlayerDirectory>,
        config: &DispatchConfig,
    ) -> Result<Self> {
        if config.prefix.is_empty() {
            return Err(Error::Config("Command prefix must not be empty".into()));
        }
        registry.validate()?;
        info!(
            prefix = %config.prefix,
            commands = registry.roots().count(),
            nodes = registry.len(),
            "Command registry ready"
        );
        Ok(Self {
            registry: Arc::new(registry),
            players,
            prefix: Arc::from(config.prefix.as_str()),
            cooldowns: CooldownTracker::new(),
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub const fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Handle one chat message from `sender`.
    pub async fn dispatch(&self, message: &str, sender: SenderRef) -> DispatchOutcome {
        let Some(body) = message.strip_prefix(&*self.prefix) else {
            return DispatchOutcome::Ignored;
        };
        let tokens = tokenize(body);
        let Some((name, args)) = tokens.split_first() else {
            return DispatchOutcome::Ignored;
        };

        debug!(sender = %sender.name(), command = %name, args = args.len(), "Dispatching");
        match self.run(name, args, &sender).await {
            Ok(outcome) => outcome,
            Err(err) => {
                for msg in diagnostics::render(&err) {
                    sender.send_message(msg);
                }
                DispatchOutcome::Failed(err)
            }
        }
    }

    async fn run(
        &self,
        name: &str,
        args: &[String],
        sender: &SenderRef,
    ) -> std::result::Result<DispatchOutcome, DispatchError> {
        let Some(root) = self.registry.find_root(name) else {
            let suggestions = suggest::similar_commands(&self.registry, sender.as_ref(), name);
            debug!(command = %name, ?suggestions, "Unknown command");
            return Err(DispatchError::NotFound {
                name: name.to_string(),
                suggestions,
            });
        };

        let data = self.registry.node(root).data();
        if !data.permits(sender.as_ref()) {
            warn!(sender = %sender.name(), command = %data.name, "Permission denied");
            return Err(DispatchError::PermissionDenied {
                command: data.name.clone(),
                message: data.invalid_permission.clone(),
            });
        }

        if let Some(cooldown) = data.cooldown {
            if let Some(remaining) = self.cooldowns.remaining(sender.name(), root, cooldown).await {
                warn!(sender = %sender.name(), command = %data.name, ?remaining, "Command on cooldown");
                return Err(DispatchError::OnCooldown {
                    command: data.name.clone(),
                    remaining,
                });
            }
        }

        let resolve = Resolve {
            registry: &self.registry,
            env: self.env(),
            sender: sender.as_ref(),
            prefix: &self.prefix,
        };
        let path = resolve.run(root, args).map_err(|err| match err {
            MatchError::Syntax(err) => {
                debug!(error = %err, "Syntax error");
                DispatchError::Syntax(err)
            }
            MatchError::PermissionDenied { node } => {
                let data = self.registry.node(node).data();
                warn!(sender = %sender.name(), node = %self.registry.describe(node), "Permission denied");
                DispatchError::PermissionDenied {
                    command: data.name.clone(),
                    message: data.invalid_permission.clone(),
                }
            }
        })?;

        if !sender.is_valid() {
            debug!(sender = %sender.name(), "Sender no longer valid, dropping command");
            return Ok(DispatchOutcome::SenderGone);
        }

        let (handler_node, taken) = match path
            .iter()
            .rposition(|id| self.registry.node(*id).has_handler())
        {
            Some(index) => (path[index], index + 1),
            None if self.registry.node(root).has_handler() => (root, 0),
            None => {
                let last = path.last().copied().unwrap_or(root);
                return Err(DispatchError::Incomplete {
                    command: format!("{}{}", self.prefix, self.registry.describe(last)),
                });
            }
        };
        let Some(handler) = self.registry.node(handler_node).handler() else {
            return Err(DispatchError::Incomplete {
                command: format!("{}{}", self.prefix, self.registry.describe(handler_node)),
            });
        };

        let values = self.extract(&path[..taken], args, sender);
        let command = self.registry.describe(handler_node);
        debug!(command = %command, values = values.len(), "Invoking handler");

        let ctx = CommandContext::new(
            Arc::clone(sender),
            Arc::clone(&self.registry),
            Arc::clone(&self.players),
            Arc::clone(&self.prefix),
        );
        let task_sender = Arc::clone(sender);
        let joined = tokio::spawn(async move {
            if !task_sender.is_valid() {
                return Ok(None);
            }
            handler.call(ctx, values).await.map(Some)
        })
        .await;

        if !sender.is_valid() {
            debug!(sender = %sender.name(), command = %command, "Sender left during handler");
            return Ok(DispatchOutcome::SenderGone);
        }

        let completion = match joined {
            Ok(Ok(Some(completion))) => completion,
            Ok(Ok(None)) => {
                debug!(sender = %sender.name(), "Sender left before handler start");
                return Ok(DispatchOutcome::SenderGone);
            }
            Ok(Err(err)) => {
                error!(command = %command, error = %err, "Command handler failed");
                let report = FailureReport {
                    command: &command,
                    message: err.to_string(),
                    causes: err.chain().skip(1).map(ToString::to_string).collect(),
                }
                .render();
                return Err(DispatchError::HandlerFailed { command, report });
            }
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                error!(command = %command, panic = %message, "Command handler panicked");
                let report = FailureReport {
                    command: &command,
                    message,
                    causes: Vec::new(),
                }
                .render();
                return Err(DispatchError::HandlerFailed { command, report });
            }
        };

        match completion {
            Completion::Fail => {
                debug!(command = %command, "Handler soft-failed");
                Ok(DispatchOutcome::SoftFailed)
            }
            Completion::Done => {
                if data.cooldown.is_some() {
                    self.cooldowns.record(sender.name(), root).await;
                }
                Ok(DispatchOutcome::Executed)
            }
        }
    }

    fn env(&self) -> MatchEnv<'_> {
        MatchEnv {
            registry: &self.registry,
            players: self.players.as_ref(),
        }
    }

    /// Convert the tokens of `path` into handler values. `path[i]` consumed `args[i]`.
    fn extract(&self, path: &[NodeId], args: &[String], sender: &SenderRef) -> Vec<ArgValue> {
        let env = self.env();
        let mut values = Vec::new();
        for (index, (id, token)) in path.iter().zip(args).enumerate() {
            let kind = self.registry.node(*id).kind();
            if kind.value_kind().is_none() {
                continue;
            }
            if kind.is_location() {
                let axes = std::array::from_fn(|axis| coordinate_at(args, index + axis));
                values.push(ArgValue::Location(resolve_location(
                    axes,
                    sender.location(),
                    sender.view_direction(),
                )));
                continue;
            }
            match kind.matches(token, &env) {
                Some(value) => values.push(value),
                None => trace!(token = %token, "Token no longer converts"),
            }
        }
        values
    }
}

/// Axis token at `index`, parsed as a coordinate. An axis past the end of
/// the input stays at the sender's own position.
fn coordinate_at(args: &[String], index: usize) -> Coordinate {
    args.get(index)
        .and_then(|token| Coordinate::parse(token))
        .unwrap_or(Coordinate::Relative(0.0))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "handler panicked".to_string(), |s| (*s).to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::message::Message;
    use crate::sender::{CommandSender, NoPlayers, Vec3};
    use crate::tree::CommandData;

    #[derive(Default)]
    struct Recorder {
        valid: AtomicBool,
        messages: Mutex<Vec<Message>>,
    }

    impl Recorder {
        fn online() -> Arc<Self> {
            Arc::new(Self {
                valid: AtomicBool::new(true),
                ..Self::default()
            })
        }

        fn messages(&self) -> Vec<Message> {
            self.messages.lock().unwrap().clone()
        }

        fn disconnect(&self) {
            self.valid.store(false, Ordering::SeqCst);
        }
    }

    impl CommandSender for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn is_valid(&self) -> bool {
            self.valid.load(Ordering::SeqCst)
        }
        fn location(&self) -> Vec3 {
            Vec3::new(10.0, 64.0, -5.0)
        }
        fn view_direction(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, 1.0)
        }
        fn send_message(&self, message: Message) {
            self.messages.lock().unwrap().push(message);
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn dispatcher(registry: CommandRegistry) -> Dispatcher {
        Dispatcher::new(registry, Arc::new(NoPlayers), &DispatchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn unprefixed_and_empty_messages_are_ignored() {
        let d = dispatcher(CommandRegistry::new());
        let sender = Recorder::online();
        assert!(matches!(
            d.dispatch("hello there", sender.clone()).await,
            DispatchOutcome::Ignored
        ));
        assert!(matches!(d.dispatch("-   ", sender.clone()).await, DispatchOutcome::Ignored));
        assert!(sender.messages().is_empty());
    }

    #[tokio::test]
    async fn location_resolves_relative_axes() {
        let seen = Arc::new(Mutex::new(None));
        let mut registry = CommandRegistry::new();
        let captured = Arc::clone(&seen);
        registry
            .command(CommandData::new("mark", ""))
            .unwrap()
            .location("at")
            .executes(move |_ctx: CommandContext, at: Vec3| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock().unwrap() = Some(at);
                }
            })
            .unwrap();
        let d = dispatcher(registry);

        let outcome = d.dispatch("-mark ~5 70 ^2", Recorder::online()).await;
        assert!(outcome.is_executed());
        assert_eq!(*seen.lock().unwrap(), Some(Vec3::new(15.0, 70.0, 3.0)));
    }

    #[tokio::test]
    async fn deepest_handler_on_path_runs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        let bare = Arc::clone(&seen);
        let paged = Arc::clone(&seen);
        registry
            .command(CommandData::new("list", ""))
            .unwrap()
            .executes(move |_ctx: CommandContext| {
                let bare = Arc::clone(&bare);
                async move { bare.lock().unwrap().push(0) }
            })
            .unwrap()
            .int("page")
            .executes(move |_ctx: CommandContext, page: i64| {
                let paged = Arc::clone(&paged);
                async move { paged.lock().unwrap().push(page) }
            })
            .unwrap();
        let d = dispatcher(registry);
        let sender = Recorder::online();

        d.dispatch("-list", sender.clone()).await;
        d.dispatch("-list 3", sender.clone()).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 3]);
    }

    #[tokio::test]
    async fn leaf_without_handler_is_incomplete() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("debug", ""))
            .unwrap()
            .string("topic");
        let d = dispatcher(registry);
        let sender = Recorder::online();
        let outcome = d.dispatch("-debug net", sender.clone()).await;
        assert!(matches!(
            outcome.error(),
            Some(DispatchError::Incomplete { command }) if command == "-debug <topic>"
        ));
        assert_eq!(sender.messages().len(), 1);
    }

    #[tokio::test]
    async fn invalid_sender_is_dropped_silently() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("ping", ""))
            .unwrap()
            .executes(move |_ctx: CommandContext| {
                let flag = Arc::clone(&flag);
                async move { *flag.lock().unwrap() = true }
            })
            .unwrap();
        let d = dispatcher(registry);
        let sender = Arc::new(Recorder::default());
        assert!(matches!(
            d.dispatch("-ping", sender.clone()).await,
            DispatchOutcome::SenderGone
        ));
        assert!(!*ran.lock().unwrap());
        assert!(sender.messages().is_empty());
    }

    async fn boom(_ctx: CommandContext) {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("boom", ""))
            .unwrap()
            .executes(boom)
            .unwrap();
        let d = dispatcher(registry);
        let sender = Recorder::online();
        let outcome = d.dispatch("-boom", sender.clone()).await;
        let Some(DispatchError::HandlerFailed { report, .. }) = outcome.error() else {
            panic!("expected handler failure, got {outcome:?}");
        };
        let report: serde_json::Value = serde_json::from_str(report).unwrap();
        assert_eq!(report["message"], "kaboom");
        assert_eq!(sender.messages().len(), 1);
    }

    fn leave(ctx: &CommandContext) {
        if let Some(recorder) = ctx.sender().as_any().downcast_ref::<Recorder>() {
            recorder.disconnect();
        }
    }

    async fn leave_then_fail(ctx: CommandContext) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        leave(&ctx);
        anyhow::bail!("boom")
    }

    async fn leave_then_finish(ctx: CommandContext) {
        tokio::task::yield_now().await;
        leave(&ctx);
    }

    #[tokio::test]
    async fn sender_leaving_mid_handler_gets_no_error_report() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("quit", ""))
            .unwrap()
            .executes(leave_then_fail)
            .unwrap();
        let d = dispatcher(registry);
        let sender = Recorder::online();
        assert!(matches!(
            d.dispatch("-quit", sender.clone()).await,
            DispatchOutcome::SenderGone
        ));
        assert!(sender.messages().is_empty());
    }

    #[tokio::test]
    async fn sender_leaving_mid_handler_starts_no_cooldown() {
        let mut registry = CommandRegistry::new();
        let root = registry
            .command(CommandData::new("logout", "").cooldown(Duration::from_secs(10)))
            .unwrap()
            .executes(leave_then_finish)
            .unwrap()
            .id();
        let d = dispatcher(registry);
        let sender = Recorder::online();
        assert!(matches!(
            d.dispatch("-logout", sender.clone()).await,
            DispatchOutcome::SenderGone
        ));
        assert_eq!(
            d.cooldowns()
                .remaining("recorder", root, Duration::from_secs(10))
                .await,
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_blocks_second_use() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("heal", "").cooldown(Duration::from_secs(10)))
            .unwrap()
            .executes(|_ctx: CommandContext| async {})
            .unwrap();
        let d = dispatcher(registry);
        let sender = Recorder::online();

        assert!(d.dispatch("-heal", sender.clone()).await.is_executed());
        let outcome = d.dispatch("-heal", sender.clone()).await;
        assert!(matches!(outcome.error(), Some(DispatchError::OnCooldown { .. })));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(d.dispatch("-heal", sender.clone()).await.is_executed());
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let config = DispatchConfig {
            prefix: String::new(),
        };
        assert!(Dispatcher::new(CommandRegistry::new(), Arc::new(NoPlayers), &config).is_err());
    }
}

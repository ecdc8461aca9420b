//! Command introspection and the built-in `help` command.
//!
//! Usage text is derived from the tree itself: one line per node that has a
//! handler, literals rendered by keyword and every other argument as
//! `<name: type>`. Synthetic location axes are left out.

use crate::args::{ArgValue, ArgumentType, CustomArgument, MatchEnv, ValueKind};
use crate::error::TreeError;
use crate::message::{Message, Style};
use crate::sender::CommandSender;
use crate::tree::{CommandContext, CommandData, CommandRegistry, NodeId};

/// Root commands listed per help page.
pub const HELP_PAGE_SIZE: usize = 5;

/// Roots the sender may see, in registration order.
pub fn visible_roots(registry: &CommandRegistry, sender: &dyn CommandSender) -> Vec<NodeId> {
    registry
        .roots()
        .filter(|id| {
            let data = registry.node(*id).data();
            data.permits(sender) && (!data.requires_op || sender.is_op())
        })
        .collect()
}

/// One page of the command listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpPage {
    /// 1-indexed page actually shown after clamping.
    pub page: usize,
    pub max_page: usize,
    pub commands: Vec<NodeId>,
}

impl HelpPage {
    pub fn header(&self, prefix: &str) -> String {
        format!(
            "--- Showing help page {} of {} ({prefix}help <page: int>) ---",
            self.page, self.max_page
        )
    }
}

/// Page `requested` of the sender's visible roots, clamped into range.
/// `None` when the sender can see no commands at all.
pub fn page(
    registry: &CommandRegistry,
    sender: &dyn CommandSender,
    requested: i64,
) -> Option<HelpPage> {
    let visible = visible_roots(registry, sender);
    if visible.is_empty() {
        return None;
    }
    let max_page = visible.len().div_ceil(HELP_PAGE_SIZE);
    let page = usize::try_from(requested.max(1)).map_or(max_page, |p| p.min(max_page));
    let commands = visible
        .into_iter()
        .skip((page - 1) * HELP_PAGE_SIZE)
        .take(HELP_PAGE_SIZE)
        .collect();
    Some(HelpPage {
        page,
        max_page,
        commands,
    })
}

/// Usage lines of `root` as seen by `sender`, depth-first in declaration order.
pub fn usage_lines(
    registry: &CommandRegistry,
    root: NodeId,
    sender: &dyn CommandSender,
    prefix: &str,
) -> Vec<String> {
    let head = format!("{prefix}{}", registry.node(root).data().name);
    let mut lines = Vec::new();
    let mut parts = Vec::new();
    collect_usage(registry, root, sender, &head, &mut parts, &mut lines);
    lines
}

fn collect_usage(
    registry: &CommandRegistry,
    id: NodeId,
    sender: &dyn CommandSender,
    head: &str,
    parts: &mut Vec<String>,
    lines: &mut Vec<String>,
) {
    let node = registry.node(id);
    if !node.data().permits(sender) {
        return;
    }
    let pushed = !node.is_root() && !node.kind().is_trailing();
    if pushed {
        parts.push(render_part(node.kind()));
    }
    if node.has_handler() {
        if parts.is_empty() {
            lines.push(head.to_string());
        } else {
            lines.push(format!("{head} {}", parts.join(" ")));
        }
    }
    for child in node.children() {
        collect_usage(registry, *child, sender, head, parts, lines);
    }
    if pushed {
        parts.pop();
    }
}

fn render_part(kind: &ArgumentType) -> String {
    if kind.is_literal() {
        kind.name().to_string()
    } else {
        format!("<{}: {}>", kind.name(), kind.type_name())
    }
}

/// Accepts the name (not an alias) of any registered root command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandNameArgument;

impl CustomArgument for CommandNameArgument {
    fn type_name(&self) -> &str {
        "CommandName"
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn matches(&self, token: &str, env: &MatchEnv<'_>) -> Option<ArgValue> {
        env.registry
            .roots()
            .any(|id| env.registry.node(id).data().name == token)
            .then(|| ArgValue::Text(token.to_string()))
    }

    fn fail(&self, token: &str) -> String {
        format!("{token} should be a command name!")
    }
}

/// Declare `help` (aliases `?`, `h`) on `registry`.
pub fn register_help(registry: &mut CommandRegistry) -> Result<NodeId, TreeError> {
    let root = registry
        .command(
            CommandData::new("help", "Provides help/list of commands.").aliases(["?", "h"]),
        )?
        .executes(first_page)?
        .id();
    registry.at(root).int("page").executes(requested_page)?;
    registry
        .at(root)
        .custom("command", CommandNameArgument)
        .executes(command_usage)?;
    Ok(root)
}

async fn first_page(ctx: CommandContext) {
    send_page(&ctx, 1);
}

async fn requested_page(ctx: CommandContext, page: i64) {
    send_page(&ctx, page);
}

fn send_page(ctx: &CommandContext, requested: i64) {
    let sender = ctx.sender().as_ref();
    let Some(page) = page(ctx.registry(), sender, requested) else {
        ctx.reply(Message::error("There are no commands available to you"));
        return;
    };
    ctx.reply(Message::new(Style::Header).with_text(page.header(ctx.prefix())));
    for root in page.commands {
        for line in usage_lines(ctx.registry(), root, sender, ctx.prefix()) {
            ctx.reply_text(line);
        }
    }
}

async fn command_usage(ctx: CommandContext, name: String) {
    let registry = ctx.registry();
    let sender = ctx.sender().as_ref();
    let Some(root) = visible_roots(registry, sender)
        .into_iter()
        .find(|id| registry.node(*id).data().name == name)
    else {
        ctx.reply(Message::error("Command not found!"));
        return;
    };

    let data = registry.node(root).data();
    let mut title = data.name.clone();
    if !data.aliases.is_empty() {
        title = format!("{title} (also {})", data.aliases.join(", "));
    }
    ctx.reply(Message::new(Style::Highlight).with_text(title));
    if !data.description.is_empty() {
        ctx.reply_text(data.description.clone());
    }
    ctx.reply_text("Usage:");
    for line in usage_lines(registry, root, sender, ctx.prefix()) {
        ctx.reply_text(line);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::sender::{NoPlayers, SenderRef, Vec3};

    struct Viewer {
        op: bool,
    }

    impl CommandSender for Viewer {
        fn name(&self) -> &str {
            "viewer"
        }
        fn is_valid(&self) -> bool {
            true
        }
        fn is_op(&self) -> bool {
            self.op
        }
        fn location(&self) -> Vec3 {
            Vec3::default()
        }
        fn view_direction(&self) -> Vec3 {
            Vec3::default()
        }
        fn send_message(&self, _message: Message) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    async fn noop(_ctx: CommandContext) {}

    fn registry_with(n: usize) -> (CommandRegistry, Vec<NodeId>) {
        let mut registry = CommandRegistry::new();
        let ids = (0..n)
            .map(|i| {
                registry
                    .command(CommandData::new(format!("cmd{i}"), ""))
                    .unwrap()
                    .executes(noop)
                    .unwrap()
                    .id()
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn seven_commands_make_two_pages() {
        let (registry, ids) = registry_with(7);
        let viewer = Viewer { op: false };
        let first = page(&registry, &viewer, 1).unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.max_page, 2);
        assert_eq!(first.commands, ids[..5]);
        assert_eq!(
            first.header("-"),
            "--- Showing help page 1 of 2 (-help <page: int>) ---"
        );

        let second = page(&registry, &viewer, 2).unwrap();
        assert_eq!(second.commands, ids[5..]);
    }

    #[test]
    fn requested_page_is_clamped() {
        let (registry, _) = registry_with(7);
        let viewer = Viewer { op: false };
        assert_eq!(page(&registry, &viewer, 0).unwrap().page, 1);
        assert_eq!(page(&registry, &viewer, -4).unwrap().page, 1);
        assert_eq!(page(&registry, &viewer, 99).unwrap().page, 2);
    }

    #[test]
    fn nothing_visible_has_no_page() {
        let registry = CommandRegistry::new();
        assert_eq!(page(&registry, &Viewer { op: false }, 1), None);
    }

    #[test]
    fn op_only_roots_are_hidden_from_others() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("stop", "").op_only())
            .unwrap();
        let public = registry.command(CommandData::new("spawn", "")).unwrap().id();
        assert_eq!(visible_roots(&registry, &Viewer { op: false }), vec![public]);
        assert_eq!(visible_roots(&registry, &Viewer { op: true }).len(), 2);
    }

    #[test]
    fn usage_skips_axis_markers_and_literal_types() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("tp", "")).unwrap().id();
        registry
            .at(root)
            .location("destination")
            .executes(|_ctx: CommandContext, _to: Vec3| async {})
            .unwrap()
            .literal(CommandData::new("facing", ""))
            .player("target")
            .executes(|_ctx: CommandContext, _to: Vec3, _target: SenderRef| async {})
            .unwrap();
        assert_eq!(
            usage_lines(&registry, root, &Viewer { op: false }, "-"),
            vec![
                "-tp <destination: location>",
                "-tp <destination: location> facing <target: player>",
            ]
        );
    }

    #[test]
    fn usage_does_not_descend_into_denied_literals() {
        let mut registry = CommandRegistry::new();
        let root = registry
            .command(CommandData::new("ban", ""))
            .unwrap()
            .executes(noop)
            .unwrap()
            .id();
        registry
            .at(root)
            .literal(CommandData::new("purge", "").requires(|s| s.is_op()))
            .executes(noop)
            .unwrap();
        assert_eq!(
            usage_lines(&registry, root, &Viewer { op: false }, "!"),
            vec!["!ban"]
        );
        assert_eq!(
            usage_lines(&registry, root, &Viewer { op: true }, "!").len(),
            2
        );
    }

    #[test]
    fn command_name_accepts_root_names_only() {
        let mut registry = CommandRegistry::new();
        register_help(&mut registry).unwrap();
        let env = MatchEnv {
            registry: &registry,
            players: &NoPlayers,
        };
        assert_eq!(
            CommandNameArgument.matches("help", &env),
            Some(ArgValue::Text("help".into()))
        );
        assert_eq!(CommandNameArgument.matches("?", &env), None);
        assert_eq!(
            CommandNameArgument.fail("nope"),
            "nope should be a command name!"
        );
    }
}

//! Recursive-descent resolution of tokens against a command tree.
//!
//! Starting at a root, each step picks the first child (in declaration
//! order) whose argument type accepts the next token. There is no
//! backtracking: once a child is chosen the walk commits to it.

use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::args::MatchEnv;
use crate::sender::CommandSender;
use crate::tree::{CommandRegistry, NodeId};

/// Shown where a token was expected but the input ended.
pub const MISSING_TOKEN: &str = "<missing>";

/// What to tell the sender about the position that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxHint {
    /// Several children (or no token at all): list what would have fit.
    Candidates {
        /// Display name of the first candidate argument.
        argument: String,
        /// Literal keywords or type names of every child, in order.
        types: Vec<String>,
    },
    /// The sole child's tailored rejection message.
    Expected(String),
}

/// A token was missing or no child accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// `prefix + root name`.
    pub command: String,
    /// Tokens accepted before the failure.
    pub consumed: Vec<String>,
    /// The rejected token, `None` when the input ran out.
    pub token: Option<String>,
    /// Tokens after the rejected one.
    pub remaining: Vec<String>,
    pub hint: SyntaxHint,
}

impl SyntaxError {
    /// The command as typed up to the failure, e.g. `-tp 1 2`.
    pub fn usage_prefix(&self) -> String {
        format!("{} {}", self.command, self.consumed.join(" "))
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax error: unexpected \"{}\" at >>{}<<",
            self.token.as_deref().unwrap_or(MISSING_TOKEN),
            self.usage_prefix().trim_end()
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Why resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The matched node's predicate rejected the sender.
    #[error("Permission denied at node {node:?}")]
    PermissionDenied { node: NodeId },
}

/// Inputs to a single resolution.
pub struct Resolve<'a> {
    pub registry: &'a CommandRegistry,
    pub env: MatchEnv<'a>,
    pub sender: &'a dyn CommandSender,
    /// Prefix used when reconstructing the command in diagnostics.
    pub prefix: &'a str,
}

impl Resolve<'_> {
    /// Walk from `root` consuming `tokens`; returns the verified path
    /// (excluding the root). Token `i` belongs to path entry `i`.
    pub fn run(&self, root: NodeId, tokens: &[String]) -> Result<Vec<NodeId>, MatchError> {
        let mut path = Vec::new();
        let mut current = root;

        loop {
            let node = self.registry.node(current);
            if node.children().is_empty() {
                return Ok(path);
            }

            let index = path.len();
            let Some(token) = tokens.get(index) else {
                if node.has_handler() {
                    return Ok(path);
                }
                return Err(self.syntax_error(root, current, tokens, index).into());
            };

            let matched = node
                .children()
                .iter()
                .copied()
                .find(|child| self.registry.node(*child).kind().matches(token, &self.env).is_some());

            let Some(child) = matched else {
                if node.has_handler() {
                    trace!(token = %token, "Unmatched trailing token left for handler node");
                    return Ok(path);
                }
                return Err(self.syntax_error(root, current, tokens, index).into());
            };

            if !self.registry.node(child).data().permits(self.sender) {
                return Err(MatchError::PermissionDenied { node: child });
            }

            trace!(node = %self.registry.describe(child), token = %token, "Matched");
            path.push(child);
            current = child;
        }
    }

    fn syntax_error(
        &self,
        root: NodeId,
        at: NodeId,
        tokens: &[String],
        index: usize,
    ) -> SyntaxError {
        let node = self.registry.node(at);
        let token = tokens.get(index).cloned();
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| self.registry.node(*child).kind())
            .collect();

        let hint = match (children.as_slice(), token.as_deref()) {
            ([only], Some(token)) => SyntaxHint::Expected(only.fail(token)),
            _ => SyntaxHint::Candidates {
                argument: children
                    .first()
                    .map(|kind| kind.name().to_string())
                    .unwrap_or_default(),
                types: children
                    .iter()
                    .map(|kind| {
                        if kind.is_literal() {
                            kind.name().to_string()
                        } else {
                            kind.type_name().into_owned()
                        }
                    })
                    .collect(),
            },
        };

        SyntaxError {
            command: format!("{}{}", self.prefix, self.registry.node(root).data().name),
            consumed: tokens[..index.min(tokens.len())].to_vec(),
            token,
            remaining: tokens.iter().skip(index + 1).cloned().collect(),
            hint,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::message::Message;
    use crate::sender::{NoPlayers, Vec3};
    use crate::tree::{CommandContext, CommandData};

    struct Tester {
        op: bool,
    }

    impl CommandSender for Tester {
        fn name(&self) -> &str {
            "tester"
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

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn resolve(
        registry: &CommandRegistry,
        op: bool,
        input: &str,
    ) -> Result<Vec<NodeId>, MatchError> {
        let sender = Tester { op };
        let root = registry.find_root("cmd").unwrap();
        let resolve = Resolve {
            registry,
            env: MatchEnv {
                registry,
                players: &NoPlayers,
            },
            sender: &sender,
            prefix: "-",
        };
        resolve.run(root, &tokens(input))
    }

    fn noop(_ctx: CommandContext) -> impl Future<Output = ()> + Send + 'static {
        async {}
    }

    #[test]
    fn first_declared_child_wins() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("cmd", "")).unwrap().id();
        let literal = registry
            .at(root)
            .literal(CommandData::new("list", ""))
            .id();
        registry.at(root).string("anything");
        let path = resolve(&registry, false, "list").unwrap();
        assert_eq!(path, vec![literal]);
    }

    #[test]
    fn earlier_string_shadows_later_literal() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("cmd", "")).unwrap().id();
        let string = registry.at(root).string("anything").id();
        registry.at(root).literal(CommandData::new("list", ""));
        let path = resolve(&registry, false, "list").unwrap();
        assert_eq!(path, vec![string]);
    }

    #[test]
    fn bare_invocation_stops_at_handler() {
        let mut registry = CommandRegistry::new();
        let root = registry
            .command(CommandData::new("cmd", ""))
            .unwrap()
            .executes(noop)
            .unwrap()
            .id();
        registry.at(root).int("page");
        assert!(resolve(&registry, false, "").unwrap().is_empty());
    }

    #[test]
    fn unmatched_token_on_handler_node_is_left_over() {
        let mut registry = CommandRegistry::new();
        let root = registry
            .command(CommandData::new("cmd", ""))
            .unwrap()
            .executes(noop)
            .unwrap()
            .id();
        registry.at(root).int("page");
        assert!(resolve(&registry, false, "abc").unwrap().is_empty());
    }

    #[test]
    fn missing_token_lists_candidates() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("cmd", "")).unwrap().id();
        registry.at(root).int("count");
        let err = resolve(&registry, false, "").unwrap_err();
        let MatchError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.token, None);
        assert_eq!(
            err.hint,
            SyntaxHint::Candidates {
                argument: "count".into(),
                types: vec!["int".into()],
            }
        );
    }

    #[test]
    fn single_candidate_uses_fail_message() {
        let mut registry = CommandRegistry::new();
        registry
            .command(CommandData::new("cmd", ""))
            .unwrap()
            .boolean("flag")
            .int_in("n", 1..=3)
            .executes(|_ctx: CommandContext, _f: bool, _n: i64| async {})
            .unwrap();
        let err = resolve(&registry, false, "true 9 tail").unwrap_err();
        let MatchError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.command, "-cmd");
        assert_eq!(err.consumed, vec!["true"]);
        assert_eq!(err.token.as_deref(), Some("9"));
        assert_eq!(err.remaining, vec!["tail"]);
        assert_eq!(
            err.hint,
            SyntaxHint::Expected("\"9\" should be an integer between 1 and 3".into())
        );
    }

    #[test]
    fn several_candidates_list_literals_by_name() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("cmd", "")).unwrap().id();
        registry.at(root).literal(CommandData::new("facing", ""));
        registry.at(root).boolean("flag");
        let MatchError::Syntax(err) = resolve(&registry, false, "nope").unwrap_err() else {
            panic!("expected syntax error");
        };
        assert_eq!(
            err.hint,
            SyntaxHint::Candidates {
                argument: "facing".into(),
                types: vec!["facing".into(), "boolean".into()],
            }
        );
    }

    #[test]
    fn permission_checked_on_matched_child() {
        let mut registry = CommandRegistry::new();
        let root = registry.command(CommandData::new("cmd", "")).unwrap().id();
        let admin = registry
            .at(root)
            .literal(CommandData::new("admin", "").requires(|s| s.is_op()))
            .executes(noop)
            .unwrap()
            .id();
        assert_eq!(
            resolve(&registry, false, "admin").unwrap_err(),
            MatchError::PermissionDenied { node: admin }
        );
        assert_eq!(resolve(&registry, true, "admin").unwrap(), vec![admin]);
    }

    #[test]
    fn leaf_stops_even_with_extra_tokens() {
        let mut registry = CommandRegistry::new();
        let leaf = registry
            .command(CommandData::new("cmd", ""))
            .unwrap()
            .string("a")
            .id();
        assert_eq!(resolve(&registry, false, "x y z").unwrap(), vec![leaf]);
    }
}

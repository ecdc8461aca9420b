//! Command tree.
//!
//! All nodes of every command live in one arena owned by
//! [`CommandRegistry`], in construction order. Parents and children refer
//! to each other by [`NodeId`], so diagnostics can walk back to the root
//! without the tree owning cycles.

mod builder;
mod handler;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use builder::NodeBuilder;
pub use handler::{
    CommandContext, Completion, FromArgValue, Handler, HandlerFuture, HandlerResult,
    IntoHandlerResult,
};
pub(crate) use handler::ErasedHandler;

use crate::args::{ArgumentType, ValueKind};
use crate::error::TreeError;
use crate::sender::CommandSender;

/// Permission check evaluated against the issuing sender.
pub type Predicate = Arc<dyn Fn(&dyn CommandSender) -> bool + Send + Sync>;

/// Descriptive metadata of a command or sub-literal.
#[derive(Clone)]
pub struct CommandData {
    /// Name typed by the sender, e.g. `"ban"`.
    pub name: String,
    pub description: String,
    /// Other names that reach this command (roots only).
    pub aliases: Vec<String>,
    requires: Option<Predicate>,
    /// Shown instead of the default denial text.
    pub invalid_permission: Option<String>,
    /// Hide from help unless the sender is OP. The predicate still has to enforce it.
    pub requires_op: bool,
    pub cooldown: Option<Duration>,
}

impl CommandData {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            aliases: Vec::new(),
            requires: None,
            invalid_permission: None,
            requires_op: false,
            cooldown: None,
        }
    }

    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn requires<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&dyn CommandSender) -> bool + Send + Sync + 'static,
    {
        self.requires = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn invalid_permission(mut self, message: impl Into<String>) -> Self {
        self.invalid_permission = Some(message.into());
        self
    }

    #[must_use]
    pub const fn op_only(mut self) -> Self {
        self.requires_op = true;
        self
    }

    #[must_use]
    pub const fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Evaluate the permission predicate; no predicate means everyone.
    pub fn permits(&self, sender: &dyn CommandSender) -> bool {
        self.requires.as_ref().is_none_or(|requires| requires(sender))
    }

    /// Name or alias match.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }
}

impl fmt::Debug for CommandData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandData")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .field("restricted", &self.requires.is_some())
            .field("requires_op", &self.requires_op)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One node of a command tree.
pub struct Node {
    data: Arc<CommandData>,
    kind: ArgumentType,
    depth: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    handler: Option<Arc<dyn ErasedHandler>>,
}

impl Node {
    pub fn data(&self) -> &CommandData {
        &self.data
    }

    pub const fn kind(&self) -> &ArgumentType {
        &self.kind
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub const fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub(crate) fn handler(&self) -> Option<Arc<dyn ErasedHandler>> {
        self.handler.clone()
    }

    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("depth", &self.depth)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Every node ever declared, roots and arguments alike, in declaration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    nodes: Vec<Node>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new root command.
    ///
    /// Fails if the name or any alias is already claimed by a root.
    pub fn command(&mut self, data: CommandData) -> Result<NodeBuilder<'_>, TreeError> {
        let claimed = std::iter::once(&data.name).chain(&data.aliases);
        for name in claimed {
            if let Some(existing) = self.find_root(name) {
                return Err(TreeError::DuplicateRoot {
                    name: name.clone(),
                    existing: self.node(existing).data.name.clone(),
                });
            }
        }
        let kind = ArgumentType::literal(data.name.clone());
        let id = self.push(None, Arc::new(data), kind);
        Ok(NodeBuilder::new(self, id))
    }

    /// Reopen a builder on an existing node to add another branch.
    pub fn at(&mut self, id: NodeId) -> NodeBuilder<'_> {
        NodeBuilder::new(self, id)
    }

    /// Look up a node. Ids are only minted by this registry.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Root commands in registration order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.is_root())
            .map(|(id, _)| id)
    }

    /// First root answering to `name` by name or alias.
    pub fn find_root(&self, name: &str) -> Option<NodeId> {
        self.roots().find(|id| self.node(*id).data.answers_to(name))
    }

    /// Nodes from the root down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.node(parent).parent;
        }
        path.reverse();
        path
    }

    /// Ordered kinds of the values a handler on `id` receives.
    pub fn schema(&self, id: NodeId) -> Vec<ValueKind> {
        self.path(id)
            .into_iter()
            .filter_map(|node| self.node(node).kind.value_kind())
            .collect()
    }

    /// Space-joined display of the path to `id`, for diagnostics.
    pub fn describe(&self, id: NodeId) -> String {
        self.path(id)
            .into_iter()
            .map(|node| {
                let node = self.node(node);
                if node.is_root() || node.kind.is_literal() {
                    node.kind.name().to_string()
                } else {
                    format!("<{}>", node.kind.name())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Re-check that no two roots share a name or alias.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for id in self.roots() {
            let data = &self.node(id).data;
            for name in std::iter::once(&data.name).chain(&data.aliases) {
                if let Some((_, owner)) = seen.iter().find(|(claimed, _)| *claimed == name.as_str()) {
                    return Err(TreeError::DuplicateRoot {
                        name: name.clone(),
                        existing: (*owner).to_string(),
                    });
                }
                seen.push((name.as_str(), data.name.as_str()));
            }
        }
        Ok(())
    }

    fn push(&mut self, parent: Option<NodeId>, data: Arc<CommandData>, kind: ArgumentType) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = parent.map_or(0, |p| self.node(p).depth + 1);
        self.nodes.push(Node {
            data,
            kind,
            depth,
            parent,
            children: Vec::new(),
            handler: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn set_handler(&mut self, id: NodeId, handler: Arc<dyn ErasedHandler>) {
        self.nodes[id.0].handler = Some(handler);
    }
}

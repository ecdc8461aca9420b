use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::debug;

use super::handler::TypedHandler;
use super::{CommandData, CommandRegistry, Handler, NodeId};
use crate::args::{ArgumentType, CustomArgument, TRAILING_MARKER};
use crate::error::TreeError;

/// Cursor on one node of the registry while commands are being declared.
///
/// Every argument method appends a child and returns a builder positioned
/// on it, so chaining declares arguments left to right. Use
/// [`CommandRegistry::at`] with a saved [`NodeBuilder::id`] to hang another
/// branch off an earlier node.
pub struct NodeBuilder<'r> {
    registry: &'r mut CommandRegistry,
    id: NodeId,
}

impl<'r> NodeBuilder<'r> {
    pub(super) const fn new(registry: &'r mut CommandRegistry, id: NodeId) -> Self {
        Self { registry, id }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Append a child governed by `kind`. The child inherits this node's metadata.
    pub fn argument(self, kind: ArgumentType) -> Self {
        let data = Arc::clone(&self.registry.node(self.id).data);
        let id = self.registry.push(Some(self.id), data, kind);
        Self {
            registry: self.registry,
            id,
        }
    }

    /// Append a child of a host-defined argument type.
    pub fn custom(self, name: &str, parser: impl CustomArgument + 'static) -> Self {
        self.argument(ArgumentType::custom(name, parser))
    }

    /// Append a sub-command keyword with its own metadata.
    pub fn literal(self, data: CommandData) -> Self {
        let kind = ArgumentType::literal(data.name.clone());
        let id = self.registry.push(Some(self.id), Arc::new(data), kind);
        Self {
            registry: self.registry,
            id,
        }
    }

    pub fn string(self, name: &str) -> Self {
        self.argument(ArgumentType::String { name: name.into() })
    }

    pub fn int(self, name: &str) -> Self {
        self.argument(ArgumentType::Integer {
            name: name.into(),
            range: None,
        })
    }

    /// Integer restricted to an inclusive range.
    pub fn int_in(self, name: &str, range: RangeInclusive<i64>) -> Self {
        self.argument(ArgumentType::Integer {
            name: name.into(),
            range: Some(range),
        })
    }

    pub fn boolean(self, name: &str) -> Self {
        self.argument(ArgumentType::Boolean { name: name.into() })
    }

    pub fn array<I, S>(self, name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument(ArgumentType::Array {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
        })
    }

    pub fn player(self, name: &str) -> Self {
        self.argument(ArgumentType::Player { name: name.into() })
    }

    /// Three chained axis nodes `name`, `name_y*`, `name_z*`; returns the last.
    ///
    /// A name that already carries the trailing marker adds a single axis.
    pub fn location(self, name: &str) -> Self {
        let axis = self.argument(ArgumentType::Location { name: name.into() });
        if name.ends_with(TRAILING_MARKER) {
            return axis;
        }
        axis.location(&format!("{name}_y{TRAILING_MARKER}"))
            .location(&format!("{name}_z{TRAILING_MARKER}"))
    }

    /// Attach a terminal handler to this node.
    ///
    /// The handler's parameters must line up with the values the path to
    /// this node produces.
    pub fn executes<H, A>(self, handler: H) -> Result<Self, TreeError>
    where
        H: Handler<A>,
        A: 'static,
    {
        let expected = self.registry.schema(self.id);
        let found = H::kinds();
        if expected != found {
            return Err(TreeError::SignatureMismatch {
                node: self.registry.describe(self.id),
                expected,
                found,
            });
        }
        debug!(node = %self.registry.describe(self.id), "Handler attached");
        self.registry
            .set_handler(self.id, Arc::new(TypedHandler::new(handler)));
        Ok(self)
    }
}

impl fmt::Debug for NodeBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBuilder")
            .field("id", &self.id)
            .field("node", &self.registry.describe(self.id))
            .finish()
    }
}

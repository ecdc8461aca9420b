//! Typed terminal handlers.
//!
//! Handlers are ordinary async closures taking a [`CommandContext`] followed
//! by one parameter per value the command path produces. Each parameter type
//! declares its [`ValueKind`], so the declared parameter list can be checked
//! against the node's value schema when the handler is attached.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::args::{ArgValue, ValueKind};
use crate::message::Message;
use crate::sender::{PlayerDirectory, SenderRef, Vec3};

use super::CommandRegistry;

/// How a handler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    /// Success; post-handler bookkeeping runs.
    #[default]
    Done,
    /// Soft failure: stop quietly and skip bookkeeping.
    Fail,
}

pub type HandlerResult = anyhow::Result<Completion>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Return values a handler may produce.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Completion::Done)
    }
}

impl IntoHandlerResult for Completion {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoHandlerResult for anyhow::Result<()> {
    fn into_handler_result(self) -> HandlerResult {
        self.map(|()| Completion::Done)
    }
}

impl IntoHandlerResult for anyhow::Result<Completion> {
    fn into_handler_result(self) -> HandlerResult {
        self
    }
}

/// Sender-bound call context handed to every handler first.
#[derive(Clone)]
pub struct CommandContext {
    sender: SenderRef,
    registry: Arc<CommandRegistry>,
    players: Arc<dyn PlayerDirectory>,
    prefix: Arc<str>,
}

impl CommandContext {
    pub fn new(
        sender: SenderRef,
        registry: Arc<CommandRegistry>,
        players: Arc<dyn PlayerDirectory>,
        prefix: Arc<str>,
    ) -> Self {
        Self {
            sender,
            registry,
            players,
            prefix,
        }
    }

    pub const fn sender(&self) -> &SenderRef {
        &self.sender
    }

    /// The registry being dispatched against, for introspection.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn players(&self) -> &dyn PlayerDirectory {
        self.players.as_ref()
    }

    /// Configured command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn reply(&self, message: Message) {
        self.sender.send_message(message);
    }

    pub fn reply_text(&self, text: impl Into<String>) {
        self.reply(Message::text(text));
    }
}

/// Conversion from an extracted value into a handler parameter.
pub trait FromArgValue: Sized {
    const KIND: ValueKind;

    fn from_arg(value: ArgValue) -> Option<Self>;
}

impl FromArgValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromArgValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Integer(n) => Some(n),
            _ => None,
        }
    }
}

impl FromArgValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FromArgValue for SenderRef {
    const KIND: ValueKind = ValueKind::Player;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Player(p) => Some(p),
            _ => None,
        }
    }
}

impl FromArgValue for Vec3 {
    const KIND: ValueKind = ValueKind::Location;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Location(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgValue for serde_json::Value {
    const KIND: ValueKind = ValueKind::Json;

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// A typed handler; `Args` is the tuple of its value parameters.
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// Declared parameter kinds, in order.
    fn kinds() -> Vec<ValueKind>;

    fn call(&self, ctx: CommandContext, values: Vec<ArgValue>) -> HandlerFuture;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn(CommandContext, $($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoHandlerResult,
            $($ty: FromArgValue + Send + 'static,)*
        {
            fn kinds() -> Vec<ValueKind> {
                vec![$(<$ty as FromArgValue>::KIND,)*]
            }

            fn call(&self, ctx: CommandContext, values: Vec<ArgValue>) -> HandlerFuture {
                let handler = self.clone();
                Box::pin(async move {
                    let mut values = values.into_iter();
                    $(
                        let Some($ty) = values.next().and_then(<$ty as FromArgValue>::from_arg) else {
                            anyhow::bail!(
                                "argument does not convert to {}",
                                <$ty as FromArgValue>::KIND
                            );
                        };
                    )*
                    handler(ctx, $($ty,)*).await.into_handler_result()
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

/// Type-erased handler stored on a node.
pub(crate) trait ErasedHandler: Send + Sync {
    fn call(&self, ctx: CommandContext, values: Vec<ArgValue>) -> HandlerFuture;
}

pub(crate) struct TypedHandler<H, A> {
    handler: H,
    _args: PhantomData<fn() -> A>,
}

impl<H, A> TypedHandler<H, A> {
    pub(crate) const fn new(handler: H) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<H, A> ErasedHandler for TypedHandler<H, A>
where
    H: Handler<A>,
    A: 'static,
{
    fn call(&self, ctx: CommandContext, values: Vec<ArgValue>) -> HandlerFuture {
        self.handler.call(ctx, values)
    }
}

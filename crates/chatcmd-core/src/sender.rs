//! The host-facing identity of whoever issued a command.
//!
//! The core never owns players or worlds. It only needs a validity check,
//! a permission surface, a position for relative coordinates, and a sink
//! for outbound messages.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Identity of a command issuer as exposed by the host.
pub trait CommandSender: Send + Sync {
    /// Display name, also used as the cooldown key.
    fn name(&self) -> &str;

    /// Whether the sender is still connected. Checked before a handler runs.
    fn is_valid(&self) -> bool;

    /// Operator status, consulted by OP-only help visibility and predicates.
    fn is_op(&self) -> bool {
        false
    }

    /// Current position, base for `~` coordinates.
    fn location(&self) -> Vec3;

    /// Unit view direction, base for `^` coordinates.
    fn view_direction(&self) -> Vec3;

    /// Deliver a user-visible message.
    fn send_message(&self, message: Message);

    /// Host escape hatch for downcasting back to the concrete player type.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a sender or online player.
pub type SenderRef = Arc<dyn CommandSender>;

/// Lookup of currently online players, used by player arguments.
pub trait PlayerDirectory: Send + Sync {
    /// Exact, case-sensitive name lookup.
    fn find_player(&self, name: &str) -> Option<SenderRef>;
}

/// Directory with nobody online.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlayers;

impl PlayerDirectory for NoPlayers {
    fn find_player(&self, _name: &str) -> Option<SenderRef> {
        None
    }
}

//! In-memory players for the shell.
//!
//! There is no terrain: a teleport just moves the player and, when asked
//! to, turns them to face a point or a rotation.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chatcmd_core::{CommandSender, Message, PlayerDirectory, SenderRef, Vec3};
use tracing::debug;

/// Where new players appear.
pub const SPAWN: Vec3 = Vec3::new(0.0, 64.0, 0.0);

/// How a teleport should orient the player afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeleportOptions {
    pub check_for_blocks: bool,
    /// `(y_rot, x_rot)` in degrees.
    pub rotation: Option<(i64, i64)>,
    /// Point to look at once arrived.
    pub facing: Option<Vec3>,
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    location: Vec3,
    view: Vec3,
}

/// A connected player.
#[derive(Debug)]
pub struct DemoPlayer {
    name: String,
    op: bool,
    pose: Mutex<Pose>,
    inbox: Mutex<Vec<Message>>,
}

impl DemoPlayer {
    pub fn new(name: impl Into<String>, op: bool) -> Self {
        Self {
            name: name.into(),
            op,
            pose: Mutex::new(Pose {
                location: SPAWN,
                view: Vec3::new(0.0, 0.0, 1.0),
            }),
            inbox: Mutex::new(Vec::new()),
        }
    }

    /// Move to `to`, then apply the orientation in `options`.
    pub fn teleport(&self, to: Vec3, options: TeleportOptions) {
        let mut pose = self.pose.lock().unwrap_or_else(PoisonError::into_inner);
        pose.location = to;
        if let Some(target) = options.facing {
            if let Some(view) = direction_towards(to, target) {
                pose.view = view;
            }
        } else if let Some((y_rot, x_rot)) = options.rotation {
            pose.view = direction_from_rotation(y_rot, x_rot);
        }
        debug!(
            player = %self.name,
            to = %to,
            check_for_blocks = options.check_for_blocks,
            "Teleported"
        );
    }

    /// Take every message delivered so far.
    pub fn take_messages(&self) -> Vec<Message> {
        std::mem::take(&mut *self.inbox.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn pose(&self) -> Pose {
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommandSender for DemoPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn is_op(&self) -> bool {
        self.op
    }

    fn location(&self) -> Vec3 {
        self.pose().location
    }

    fn view_direction(&self) -> Vec3 {
        self.pose().view
    }

    fn send_message(&self, message: Message) {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unit vector from `from` to `to`, `None` when they coincide.
fn direction_towards(from: Vec3, to: Vec3) -> Option<Vec3> {
    let (dx, dy, dz) = (to.x - from.x, to.y - from.y, to.z - from.z);
    let len = dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt();
    (len > f64::EPSILON).then(|| Vec3::new(dx / len, dy / len, dz / len))
}

/// Look vector for a yaw (`y_rot`) and pitch (`x_rot`) in degrees.
#[allow(clippy::cast_precision_loss)]
fn direction_from_rotation(y_rot: i64, x_rot: i64) -> Vec3 {
    let yaw = (y_rot as f64).to_radians();
    let pitch = (x_rot as f64).to_radians();
    Vec3::new(
        -yaw.sin() * pitch.cos(),
        -pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
}

/// Everyone currently online, by name.
#[derive(Debug, Default)]
pub struct World {
    players: RwLock<BTreeMap<String, Arc<DemoPlayer>>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring a player online, replacing any previous one with that name.
    pub fn join(&self, name: &str, op: bool) -> Arc<DemoPlayer> {
        let player = Arc::new(DemoPlayer::new(name, op));
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&player));
        player
    }

    pub fn get(&self, name: &str) -> Option<Arc<DemoPlayer>> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Pending messages of every player, ordered by player name.
    pub fn drain_messages(&self) -> Vec<(String, Message)> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flat_map(|player| {
                player
                    .take_messages()
                    .into_iter()
                    .map(|message| (player.name.clone(), message))
            })
            .collect()
    }
}

impl PlayerDirectory for World {
    fn find_player(&self, name: &str) -> Option<SenderRef> {
        self.get(name).map(|player| player as SenderRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 && (a.z - b.z).abs() < 1e-9
    }

    #[test]
    fn teleport_faces_target() {
        let player = DemoPlayer::new("Steve", false);
        player.teleport(
            Vec3::new(0.0, 64.0, 0.0),
            TeleportOptions {
                facing: Some(Vec3::new(10.0, 64.0, 0.0)),
                ..TeleportOptions::default()
            },
        );
        assert!(close(player.view_direction(), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn rotation_zero_looks_south() {
        assert!(close(direction_from_rotation(0, 0), Vec3::new(0.0, 0.0, 1.0)));
        assert!(close(direction_from_rotation(0, 90), Vec3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn directory_finds_online_players_by_exact_name() {
        let world = World::new();
        world.join("Alex", false);
        assert!(world.find_player("Alex").is_some());
        assert!(world.find_player("alex").is_none());
    }

    #[test]
    fn drain_empties_inboxes() {
        let world = World::new();
        let alex = world.join("Alex", false);
        alex.send_message(Message::text("hi"));
        assert_eq!(
            world.drain_messages(),
            vec![("Alex".to_string(), Message::text("hi"))]
        );
        assert!(world.drain_messages().is_empty());
    }
}

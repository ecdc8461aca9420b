//! The `teleport` command family.
//!
//! Every `victim` branch sits behind `<destination: player>`, which accepts
//! the same tokens and is declared first, so resolution never reaches it.
//! The branches are still declared so they show up in help.

use chatcmd_core::{
    CommandContext, CommandData, CommandRegistry, CommandSender, Completion, Message, NodeId,
    SenderRef, TreeError, Vec3,
};

use crate::world::{DemoPlayer, TeleportOptions};

const FACING_DESCRIPTION: &str = "A entity or position to face after the teleport";

/// Declare `teleport` (alias `tp`, OP only) and all of its branches.
pub fn register_teleport(registry: &mut CommandRegistry) -> Result<NodeId, TreeError> {
    let root = registry
        .command(
            CommandData::new("teleport", "Teleport to a player")
                .aliases(["tp"])
                .requires(|sender| sender.is_op())
                .op_only(),
        )?
        .id();

    registry.at(root).player("destination").executes(to_player)?;

    let destination = registry.at(root).location("destination").id();
    registry
        .at(destination)
        .boolean("checkForBlocks")
        .executes(to_location)?;
    registry
        .at(destination)
        .int("yRot")
        .int("xRot")
        .boolean("checkForBlocks")
        .executes(to_location_rotated)?;
    let facing = registry
        .at(destination)
        .literal(CommandData::new("facing", FACING_DESCRIPTION))
        .id();
    registry
        .at(facing)
        .player("lookAtEntity")
        .boolean("checkForBlocks")
        .executes(to_location_facing_entity)?;
    registry
        .at(facing)
        .location("lookAtPosition")
        .boolean("checkForBlocks")
        .executes(to_location_facing_position)?;

    let victim = registry.at(root).player("victim").id();
    registry
        .at(victim)
        .player("destination")
        .boolean("checkForBlocks")
        .executes(victim_to_player)?;
    let victim_destination = registry.at(victim).location("destination").id();
    registry
        .at(victim_destination)
        .boolean("checkForBlocks")
        .executes(victim_to_location)?;
    registry
        .at(victim_destination)
        .int("yRot")
        .int("xRot")
        .boolean("checkForBlocks")
        .executes(victim_to_location_rotated)?;
    let victim_facing = registry
        .at(victim_destination)
        .literal(CommandData::new("facing", FACING_DESCRIPTION))
        .id();
    registry
        .at(victim_facing)
        .player("lookAtEntity")
        .boolean("checkForBlocks")
        .executes(victim_to_location_facing_entity)?;
    registry
        .at(victim_facing)
        .location("lookAtPosition")
        .boolean("checkForBlocks")
        .executes(victim_to_location_facing_position)?;

    Ok(root)
}

/// Move `who` and confirm to the command's sender.
fn move_player(
    ctx: &CommandContext,
    who: &SenderRef,
    to: Vec3,
    options: TeleportOptions,
) -> Completion {
    let Some(player) = who.as_any().downcast_ref::<DemoPlayer>() else {
        ctx.reply(Message::error(format!(
            "{} cannot be teleported",
            who.name()
        )));
        return Completion::Fail;
    };
    player.teleport(to, options);
    ctx.reply_text(format!("Teleported {} to {to}", who.name()));
    Completion::Done
}

async fn to_player(ctx: CommandContext, destination: SenderRef) -> Completion {
    let sender = ctx.sender().clone();
    move_player(&ctx, &sender, destination.location(), TeleportOptions::default())
}

async fn to_location(ctx: CommandContext, destination: Vec3, check_for_blocks: bool) -> Completion {
    let sender = ctx.sender().clone();
    move_player(
        &ctx,
        &sender,
        destination,
        TeleportOptions {
            check_for_blocks,
            ..TeleportOptions::default()
        },
    )
}

async fn to_location_rotated(
    ctx: CommandContext,
    destination: Vec3,
    y_rot: i64,
    x_rot: i64,
    check_for_blocks: bool,
) -> Completion {
    let sender = ctx.sender().clone();
    move_player(
        &ctx,
        &sender,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: Some((y_rot, x_rot)),
            facing: None,
        },
    )
}

async fn to_location_facing_entity(
    ctx: CommandContext,
    destination: Vec3,
    look_at: SenderRef,
    check_for_blocks: bool,
) -> Completion {
    let sender = ctx.sender().clone();
    move_player(
        &ctx,
        &sender,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: None,
            facing: Some(look_at.location()),
        },
    )
}

async fn to_location_facing_position(
    ctx: CommandContext,
    destination: Vec3,
    look_at: Vec3,
    check_for_blocks: bool,
) -> Completion {
    let sender = ctx.sender().clone();
    move_player(
        &ctx,
        &sender,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: None,
            facing: Some(look_at),
        },
    )
}

async fn victim_to_player(
    ctx: CommandContext,
    victim: SenderRef,
    destination: SenderRef,
    check_for_blocks: bool,
) -> Completion {
    move_player(
        &ctx,
        &victim,
        destination.location(),
        TeleportOptions {
            check_for_blocks,
            ..TeleportOptions::default()
        },
    )
}

async fn victim_to_location(
    ctx: CommandContext,
    victim: SenderRef,
    destination: Vec3,
    check_for_blocks: bool,
) -> Completion {
    move_player(
        &ctx,
        &victim,
        destination,
        TeleportOptions {
            check_for_blocks,
            ..TeleportOptions::default()
        },
    )
}

async fn victim_to_location_rotated(
    ctx: CommandContext,
    victim: SenderRef,
    destination: Vec3,
    y_rot: i64,
    x_rot: i64,
    check_for_blocks: bool,
) -> Completion {
    move_player(
        &ctx,
        &victim,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: Some((y_rot, x_rot)),
            facing: None,
        },
    )
}

async fn victim_to_location_facing_entity(
    ctx: CommandContext,
    victim: SenderRef,
    destination: Vec3,
    look_at: SenderRef,
    check_for_blocks: bool,
) -> Completion {
    move_player(
        &ctx,
        &victim,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: None,
            facing: Some(look_at.location()),
        },
    )
}

async fn victim_to_location_facing_position(
    ctx: CommandContext,
    victim: SenderRef,
    destination: Vec3,
    look_at: Vec3,
    check_for_blocks: bool,
) -> Completion {
    move_player(
        &ctx,
        &victim,
        destination,
        TeleportOptions {
            check_for_blocks,
            rotation: None,
            facing: Some(look_at),
        },
    )
}

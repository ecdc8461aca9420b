//! chatcmd shell
//!
//! Reads chat lines from stdin and dispatches them as the acting player.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use chatcmd_core::config::load_config;
use chatcmd_core::help::register_help;
use chatcmd_core::tracing_init::init_tracing;
use chatcmd_core::{CommandRegistry, Dispatcher, PlayerDirectory};
use chatcmd_shell::shell::Shell;
use chatcmd_shell::teleport::register_teleport;
use chatcmd_shell::world::World;

#[derive(Parser, Debug)]
#[command(name = "chatcmd")]
#[command(version, about = "Chat command dispatcher shell", long_about = None)]
struct Cli {
    /// Command prefix (overrides config)
    #[arg(long)]
    prefix: Option<String>,

    /// Player the input is sent as
    #[arg(long, default_value = "Steve")]
    player: String,

    /// Other online players, comma separated
    #[arg(long, value_delimiter = ',')]
    players: Vec<String>,

    /// Give the acting player operator status
    #[arg(long)]
    op: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,

    /// Directory holding .chatcmd/settings.json
    #[arg(long, env = "CHATCMD_PROJECT_DIR")]
    project_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut config = load_config(Some(&project_dir))?;
    if let Some(prefix) = cli.prefix {
        config.dispatch.prefix = prefix;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.log_json {
        config.logging.json = true;
    }
    config.validate()?;

    init_tracing(&config.logging.level, config.logging.json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting chatcmd shell");

    let world = Arc::new(World::new());
    world.join(&cli.player, cli.op);
    for name in cli.players.iter().filter(|name| **name != cli.player) {
        world.join(name, false);
    }

    let mut registry = CommandRegistry::new();
    register_help(&mut registry)?;
    register_teleport(&mut registry)?;
    let dispatcher = Dispatcher::new(
        registry,
        Arc::clone(&world) as Arc<dyn PlayerDirectory>,
        &config.dispatch,
    )?;

    let mut shell = Shell::new(dispatcher, world, cli.player);
    shell
        .run(tokio::io::BufReader::new(tokio::io::stdin()), std::io::stdout())
        .await
}

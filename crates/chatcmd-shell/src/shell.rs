//! Line-oriented chat loop.
//!
//! Each input line is chat from the acting player. `@name` switches the
//! acting player, optionally followed by a line to send as them.

use std::io::Write;
use std::sync::Arc;

use chatcmd_core::{DispatchOutcome, Dispatcher, Message, Style};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::world::World;

pub struct Shell {
    dispatcher: Dispatcher,
    world: Arc<World>,
    acting: String,
}

impl Shell {
    pub fn new(dispatcher: Dispatcher, world: Arc<World>, acting: impl Into<String>) -> Self {
        Self {
            dispatcher,
            world,
            acting: acting.into(),
        }
    }

    /// Name of the player new lines are sent as.
    pub fn acting(&self) -> &str {
        &self.acting
    }

    /// Feed `input` line by line until EOF, writing everything players see to `output`.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            for text in self.handle_line(&line).await {
                writeln!(output, "{text}")?;
            }
            output.flush()?;
        }
        Ok(())
    }

    /// Process one line and return the transcript it produced.
    pub async fn handle_line(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let text = match line.strip_prefix('@') {
            Some(rest) => {
                let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if self.world.get(name).is_none() {
                    return vec![format!("No player named {name} is online")];
                }
                self.acting = name.to_string();
                text.trim()
            }
            None => line,
        };
        if text.is_empty() {
            return vec![format!("Now chatting as {}", self.acting)];
        }

        let Some(player) = self.world.get(&self.acting) else {
            return vec![format!("{} is no longer online", self.acting)];
        };
        let outcome = self.dispatcher.dispatch(text, player).await;
        debug!(player = %self.acting, ?outcome, "Line handled");

        let mut transcript = Vec::new();
        if matches!(outcome, DispatchOutcome::Ignored) {
            transcript.push(format!("<{}> {text}", self.acting));
        }
        transcript.extend(
            self.world
                .drain_messages()
                .into_iter()
                .map(|(name, message)| render(&name, &message)),
        );
        transcript
    }
}

fn render(recipient: &str, message: &Message) -> String {
    let marker = match message.style {
        Style::Error => "! ",
        Style::Header => "== ",
        Style::Highlight => "* ",
        Style::Plain => "",
    };
    format!("[{recipient}] {marker}{}", message.plain_text())
}

//! Interactive harness - feed synthetic events through the same routing path, no service needed

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::application::context::ShareContext;
use crate::application::messaging::{invoke, is_routed, route};
use crate::domain::entities::Event;
use crate::infrastructure::adapters::console::{offline_session, ConsoleAdapter, OFFLINE_USER};
use crate::infrastructure::config::Config;
use crate::infrastructure::database::Database;
use crate::plugins::registry::PluginRegistry;
use crate::plugins::trait_def::HookPayload;

pub const PROMPT: &str = "slask> ";

/// Runs commands against a registry that was discovered once, on an offline session
pub struct Harness {
    ctx: ShareContext,
}

impl Harness {
    /// Build the context and fire `init` so storage-backed plugins are ready
    pub fn new(config: Arc<Config>, registry: Arc<PluginRegistry>, db: Database) -> Self {
        let ctx = ShareContext::new(config, registry, db, offline_session());
        invoke(ctx.registry(), "init", HookPayload::Init, &ctx);
        ctx.take_outbox();
        Self { ctx }
    }

    /// Synthesize one event of type `hook` carrying `text` and return the reply
    pub fn run_once(&self, text: &str, hook: &str) -> Option<String> {
        let event = Event::new(hook).with_text(text).with_user(OFFLINE_USER);

        if is_routed(hook) {
            return route(&event, &self.ctx);
        }

        let responses = invoke(self.ctx.registry(), hook, HookPayload::Event(&event), &self.ctx);
        if responses.is_empty() {
            None
        } else {
            Some(responses.join("\n"))
        }
    }

    /// Read-eval loop; ends on `quit`, `exit` or end of input
    pub fn repl<R: BufRead, W: Write>(&self, console: &mut ConsoleAdapter<R, W>, hook: &str) -> io::Result<()> {
        loop {
            let Some(line) = console.read_line(PROMPT)? else {
                return console.print("");
            };

            let command = line.trim();
            if command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit") {
                return Ok(());
            }
            if command.is_empty() {
                continue;
            }

            if let Some(reply) = self.run_once(command, hook) {
                console.print(&reply)?;
            }
            for message in self.ctx.take_outbox() {
                console.print(&format!("[{}] {}", message.channel, message.text))?;
            }
        }
    }

    pub fn context(&self) -> &ShareContext {
        &self.ctx
    }
}

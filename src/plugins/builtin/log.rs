use crate::application::context::ShareContext;
use crate::plugins::trait_def::{handler, Handler, HandlerResult, HookPayload, Plugin};

/// Logs every message it sees to the `log` table
pub struct LogPlugin;

impl LogPlugin {
    fn on_init(_payload: HookPayload<'_>, ctx: &ShareContext) -> HandlerResult {
        ctx.query(
            "CREATE TABLE IF NOT EXISTS log (msg TEXT, sender TEXT, time TEXT, team TEXT, channel TEXT)",
            std::iter::empty::<String>(),
        )?;
        Ok(None)
    }

    fn on_message(payload: HookPayload<'_>, ctx: &ShareContext) -> HandlerResult {
        let event = payload.require_event("message")?;
        ctx.query(
            "INSERT INTO log VALUES (?, ?, ?, ?, ?)",
            [
                event.text.clone(),
                event.user.clone().unwrap_or_default(),
                event.ts.clone(),
                event.team.clone(),
                event.channel.clone(),
            ],
        )?;
        Ok(None)
    }
}

impl Plugin for LogPlugin {
    fn name(&self) -> &str {
        "log"
    }

    fn description(&self) -> Option<&str> {
        Some("Log all messages to the database")
    }

    fn hooks(&self) -> Vec<(String, Handler)> {
        vec![
            ("message".to_string(), handler(Self::on_message)),
            ("init".to_string(), handler(Self::on_init)),
        ]
    }
}

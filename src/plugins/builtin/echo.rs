use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::application::context::ShareContext;
use crate::plugins::trait_def::{handler, Handler, HandlerResult, HookPayload, Plugin};

static ECHO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^!echo\s+(.+)$").expect("valid echo pattern"));

/// Repeats whatever follows `!echo`
pub struct EchoPlugin;

impl EchoPlugin {
    fn on_message(payload: HookPayload<'_>, _ctx: &ShareContext) -> HandlerResult {
        let event = payload.require_event("message")?;
        Ok(ECHO
            .captures(event.text.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()))
    }
}

impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> Option<&str> {
        Some("!echo <text>: echo the text back")
    }

    fn hooks(&self) -> Vec<(String, Handler)> {
        vec![("message".to_string(), handler(Self::on_message))]
    }
}

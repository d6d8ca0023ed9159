use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::application::context::ShareContext;
use crate::plugins::trait_def::{handler, Handler, HandlerResult, HookPayload, Plugin};

static HELP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!help(?:\s+(\S+))?\s*$").expect("valid help pattern"));

/// Lists plugins, or shows one plugin's full description
pub struct HelpPlugin;

impl HelpPlugin {
    fn on_message(payload: HookPayload<'_>, ctx: &ShareContext) -> HandlerResult {
        let event = payload.require_event("message")?;
        let Some(caps) = HELP.captures(event.text.trim()) else {
            return Ok(None);
        };

        let help = ctx.registry().help();
        let reply = match caps.get(1).map(|m| m.as_str()) {
            Some(name) => match help.extended.get(name) {
                Some(text) => text.clone(),
                None => format!("No help for {}", name),
            },
            None => help
                .short
                .iter()
                .map(|(name, line)| format!("{}: {}", name, line))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Ok(Some(reply))
    }
}

impl Plugin for HelpPlugin {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> Option<&str> {
        Some("!help [plugin]: list plugins, or show one plugin's help")
    }

    fn hooks(&self) -> Vec<(String, Handler)> {
        vec![("message".to_string(), handler(Self::on_message))]
    }
}

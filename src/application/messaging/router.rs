//! Event router - picks a routing function by event type

use tracing::debug;

use crate::application::context::ShareContext;
use crate::domain::entities::Event;
use crate::plugins::trait_def::HookPayload;
use super::dispatcher::invoke;

/// Account the service itself posts as; never answered
pub const SYSTEM_ACCOUNT: &str = "slackbot";

type RouteFn = fn(&Event, &ShareContext) -> Option<String>;

const ROUTES: &[(&str, RouteFn)] = &[("message", handle_message)];

/// Route one event; `None` when there is nothing to send back
pub fn route(event: &Event, ctx: &ShareContext) -> Option<String> {
    let (_, handler) = ROUTES.iter().find(|(kind, _)| *kind == event.kind)?;
    handler(event, ctx)
}

/// Whether `route` has a routing function for this event type
pub fn is_routed(kind: &str) -> bool {
    ROUTES.iter().any(|(k, _)| *k == kind)
}

fn handle_message(event: &Event, ctx: &ShareContext) -> Option<String> {
    if event.is_ignored_subtype() {
        return None;
    }

    let user = match event.user.as_deref().and_then(|id| ctx.user(id)) {
        Some(user) => user,
        None => {
            debug!("event {:?} has no known user", event);
            return None;
        }
    };

    // The bot's own name is compared exactly; the system account in any case.
    if user.name == ctx.bot_name() || user.name.to_lowercase() == SYSTEM_ACCOUNT {
        return None;
    }

    let responses = invoke(ctx.registry(), "message", HookPayload::Event(event), ctx);
    if responses.is_empty() {
        None
    } else {
        Some(responses.join("\n"))
    }
}

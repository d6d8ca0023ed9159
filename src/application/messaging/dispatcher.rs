//! Hook dispatcher - runs every handler registered for a hook

use tracing::{debug_span, warn};

use crate::application::context::ShareContext;
use crate::application::errors::PluginError;
use crate::plugins::guard;
use crate::plugins::registry::PluginRegistry;
use crate::plugins::trait_def::HookPayload;

/// Non-empty responses, in handler registration order
pub type DispatchResult = Vec<String>;

/// Invoke every handler registered under `hook`.
///
/// A failing or panicking handler is logged and skipped; the remaining
/// handlers always run. An unknown hook yields an empty result.
pub fn invoke(registry: &PluginRegistry, hook: &str, payload: HookPayload<'_>, ctx: &ShareContext) -> DispatchResult {
    let span = debug_span!("dispatch", hook = %hook);
    let _enter = span.enter();

    let mut responses = Vec::new();
    for entry in registry.handlers(hook) {
        match guard::catch(|| (entry.handler)(payload, ctx)) {
            Ok(Ok(Some(text))) if !text.is_empty() => responses.push(text),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("Failed to run plugin {} on hook {}: {}", entry.plugin, hook, e);
            }
            Err(report) => {
                let e = PluginError::Panicked(report.to_string());
                warn!(
                    "Failed to run plugin {} on hook {}: {}\n{}",
                    entry.plugin,
                    hook,
                    e,
                    report.backtrace
                );
            }
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Event, Session};
    use crate::infrastructure::config::Config;
    use crate::infrastructure::database::Database;
    use crate::infrastructure::logging::CapturedLog;
    use crate::plugins::trait_def::{FnPlugin, HandlerResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn context(registry: &Arc<PluginRegistry>) -> ShareContext {
        ShareContext::new(
            Arc::new(Config::default()),
            Arc::clone(registry),
            Database::in_memory().unwrap(),
            Session::new("slask"),
        )
    }

    fn counting(name: &str, calls: &Arc<AtomicUsize>, reply: Result<Option<&'static str>, &'static str>) -> FnPlugin {
        let calls = Arc::clone(calls);
        FnPlugin::new(name).on("message", move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            match reply {
                Ok(text) => Ok(text.map(str::to_string)),
                Err(e) => Err(PluginError::handler(e)),
            }
        })
    }

    #[test]
    fn test_every_handler_runs_despite_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(counting("a", &calls, Ok(Some("first")))));
        registry.register_builtin(Box::new(counting("b", &calls, Err("broken"))));
        registry.register_builtin(Box::new(counting("c", &calls, Ok(Some("third")))));
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        let event = Event::message("U1", "hi");
        let result = invoke(&registry, "message", HookPayload::Event(&event), &ctx);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result, vec!["first", "third"]);
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("boom").on("message", |_, _| panic!("plugin bug"))));
        registry.register_builtin(Box::new(counting("after", &calls, Ok(Some("still here")))));
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        let event = Event::message("U1", "hi");
        let result = invoke(&registry, "message", HookPayload::Event(&event), &ctx);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result, vec!["still here"]);
    }

    fn faulty_handler(_: HookPayload<'_>, _: &ShareContext) -> HandlerResult {
        panic!("plugin bug in faulty_handler")
    }

    #[test]
    fn test_panic_logged_with_its_location() {
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("faulty").on("message", faulty_handler)));
        registry.register_builtin(Box::new(FnPlugin::new("broken").on("message", |_, _| Err(PluginError::handler("no weather today")))));
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        let log = CapturedLog::default();
        let event = Event::message("U1", "hi");
        let result = tracing::subscriber::with_default(log.subscriber(), || {
            invoke(&registry, "message", HookPayload::Event(&event), &ctx)
        });
        assert!(result.is_empty());

        let output = log.contents();
        assert!(output.contains("Failed to run plugin faulty on hook message: Handler panicked: plugin bug in faulty_handler"));
        assert!(output.contains(&format!("at {}:", file!())), "{}", output);
        assert!(output.contains("Failed to run plugin broken on hook message: Handler failed: no weather today"));
    }

    #[test]
    fn test_empty_and_missing_output_dropped() {
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("empty").on("message", |_, _| Ok(Some(String::new())))));
        registry.register_builtin(Box::new(FnPlugin::new("none").on("message", |_, _| Ok(None))));
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        let event = Event::message("U1", "hi");
        assert!(invoke(&registry, "message", HookPayload::Event(&event), &ctx).is_empty());
    }

    #[test]
    fn test_unknown_hook_is_empty() {
        let registry = Arc::new(PluginRegistry::new());
        let ctx = context(&registry);
        assert!(invoke(&registry, "reaction_added", HookPayload::Init, &ctx).is_empty());
    }

    #[test]
    fn test_storage_failure_is_a_handler_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("db").on("init", |_, ctx| {
            ctx.query("INSERT INTO missing VALUES (?)", ["x".to_string()])?;
            Ok(Some("unreachable".to_string()))
        })));
        let calls_after = Arc::clone(&calls);
        registry.register_builtin(Box::new(FnPlugin::new("next").on("init", move |_, _| {
            calls_after.fetch_add(1, Ordering::SeqCst);
            Ok(Some("ok".to_string()))
        })));
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        assert_eq!(invoke(&registry, "init", HookPayload::Init, &ctx), vec!["ok"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_order_is_registration_order() {
        let mut registry = PluginRegistry::new();
        for name in ["one", "two", "three"] {
            let reply = name.to_string();
            registry.register_builtin(Box::new(FnPlugin::new(name).on("message", move |_, _| Ok(Some(reply.clone())))));
        }
        let registry = Arc::new(registry);
        let ctx = context(&registry);

        let event = Event::message("U1", "hi");
        assert_eq!(invoke(&registry, "message", HookPayload::Event(&event), &ctx), vec!["one", "two", "three"]);
    }
}

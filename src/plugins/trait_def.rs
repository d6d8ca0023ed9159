//! Plugin trait definitions

use std::fmt;
use std::sync::Arc;

use crate::application::context::ShareContext;
use crate::application::errors::PluginError;
use crate::domain::entities::Event;

/// What a handler returns: some text to contribute to the reply, or nothing
pub type HandlerResult = Result<Option<String>, PluginError>;

/// A callable registered under a hook
pub type Handler = Arc<dyn Fn(HookPayload<'_>, &ShareContext) -> HandlerResult + Send + Sync>;

/// Positional arguments passed to a handler, besides the context
#[derive(Debug, Clone, Copy)]
pub enum HookPayload<'a> {
    /// Hooks without an event, e.g. `init`
    Init,
    Event(&'a Event),
}

impl<'a> HookPayload<'a> {
    pub fn event(&self) -> Option<&'a Event> {
        match self {
            HookPayload::Event(event) => Some(event),
            HookPayload::Init => None,
        }
    }

    /// The event, or a handler error naming the hook that expected one
    pub fn require_event(&self, hook: &str) -> Result<&'a Event, PluginError> {
        self.event()
            .ok_or_else(|| PluginError::handler(format!("hook '{}' expects an event", hook)))
    }
}

/// Core plugin trait that all plugin units must implement.
///
/// `hooks` is evaluated once at load time; the returned handlers are copied
/// into the hook table and the unit is never asked again.
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Help text. The first line is the short description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Handlers keyed by hook name (`"message"`, `"init"`, ...)
    fn hooks(&self) -> Vec<(String, Handler)>;
}

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(HookPayload<'_>, &ShareContext) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A plugin assembled from closures, for units that have no state of their own
pub struct FnPlugin {
    name: String,
    description: Option<String>,
    hooks: Vec<(String, Handler)>,
}

impl FnPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            hooks: Vec::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn on<F>(mut self, hook: impl Into<String>, f: F) -> Self
    where
        F: Fn(HookPayload<'_>, &ShareContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.hooks.push((hook.into(), handler(f)));
        self
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn hooks(&self) -> Vec<(String, Handler)> {
        self.hooks.clone()
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("hooks", &self.hooks.iter().map(|(h, _)| h.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

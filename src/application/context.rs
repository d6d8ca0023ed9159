//! Shared context handed to every handler call

use std::cell::RefCell;
use std::sync::Arc;

use rusqlite::types::Value;

use crate::application::errors::StorageError;
use crate::domain::entities::{Session, User};
use crate::infrastructure::config::Config;
use crate::infrastructure::database::{Database, Row};
use crate::plugins::registry::PluginRegistry;

/// A message a plugin asked to send outside of its hook's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub channel: String,
    pub text: String,
}

/// The narrow surface plugins see: storage queries, read-only config and
/// registry, the session snapshot, and a send queue.
///
/// One instance per process. Handlers receive it by shared reference and run
/// one at a time, so the outbox needs no locking.
pub struct ShareContext {
    config: Arc<Config>,
    registry: Arc<PluginRegistry>,
    db: Database,
    session: Session,
    outbox: RefCell<Vec<Outgoing>>,
}

impl ShareContext {
    pub fn new(config: Arc<Config>, registry: Arc<PluginRegistry>, db: Database, session: Session) -> Self {
        Self {
            config,
            registry,
            db,
            session,
            outbox: RefCell::new(Vec::new()),
        }
    }

    /// Run one parameterised statement; committed before this returns
    pub fn query<P>(&self, sql: &str, params: P) -> Result<Vec<Row>, StorageError>
    where
        P: IntoIterator,
        P::Item: Into<Value>,
    {
        self.db.query(sql, params)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn bot_name(&self) -> &str {
        &self.session.bot_name
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.session.user(id)
    }

    /// Queue a message; the run loop sends it after the current event
    pub fn send(&self, channel: impl Into<String>, text: impl Into<String>) {
        self.outbox.borrow_mut().push(Outgoing {
            channel: channel.into(),
            text: text.into(),
        });
    }

    pub fn take_outbox(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.outbox.borrow_mut())
    }
}

/// Context over an in-memory database with a small user directory
#[cfg(test)]
pub(crate) fn test_context(registry: PluginRegistry) -> ShareContext {
    ShareContext::new(
        Arc::new(Config::default()),
        Arc::new(registry),
        Database::in_memory().expect("in-memory database"),
        Session::new("slask")
            .with_user(User::new("U1", "alice"))
            .with_user(User::new("msguser", "msguser")),
    )
}

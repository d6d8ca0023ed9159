use async_trait::async_trait;
use crate::domain::entities::{Event, Session};
use crate::application::errors::BotError;

/// Transport trait - abstraction over the real-time messaging service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authenticate and fetch the bot identity and user directory
    async fn connect(&mut self) -> Result<Session, BotError>;

    /// Poll for the next batch of events (may be empty)
    async fn read_events(&mut self) -> Result<Vec<Event>, BotError>;

    /// Send a text message to a channel
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), BotError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

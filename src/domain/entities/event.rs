use serde::{Deserialize, Serialize};

/// Subtype the service stamps on messages posted by bots (including us)
pub const SUBTYPE_BOT_MESSAGE: &str = "bot_message";

/// Subtype of the event emitted when a message is edited
pub const SUBTYPE_MESSAGE_CHANGED: &str = "message_changed";

/// An incoming event, as delivered by the transport or synthesized by the harness
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub ts: String,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn message(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("message").with_user(user).with_text(text)
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = ts.into();
        self
    }

    pub fn subtype(&self) -> &str {
        self.subtype.as_deref().unwrap_or("")
    }

    /// Bot posts and edits are never fed to plugins
    pub fn is_ignored_subtype(&self) -> bool {
        matches!(self.subtype(), SUBTYPE_BOT_MESSAGE | SUBTYPE_MESSAGE_CHANGED)
    }
}

//! Slack adapter
//!
//! Polls the Web API instead of holding a socket open: every channel the bot
//! is a member of is read with `conversations.history`, starting from the
//! newest timestamp already seen.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::application::errors::BotError;
use crate::domain::entities::{Event, Session, User};
use crate::domain::traits::Transport;

/// Channel list is refreshed after this many polls
const CHANNEL_REFRESH_POLLS: u32 = 60;

/// Page size for list and history calls
const PAGE_LIMIT: u32 = 200;

/// Error codes that mean the token is no good
const AUTH_ERRORS: &[&str] = &["invalid_auth", "not_authed", "account_inactive", "token_revoked", "token_expired"];

#[derive(Debug, Deserialize)]
struct AuthTest {
    user: String,
    #[serde(default)]
    team: String,
}

#[derive(Debug, Deserialize)]
struct UsersList {
    members: Vec<User>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ConversationsList {
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    is_member: bool,
    #[serde(default)]
    is_im: bool,
}

#[derive(Debug, Deserialize)]
struct History {
    messages: Vec<Event>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

impl ResponseMetadata {
    fn cursor(meta: Option<Self>) -> Option<String> {
        meta.map(|m| m.next_cursor).filter(|c| !c.is_empty())
    }
}

/// Slack transport adapter
pub struct SlackAdapter {
    token: String,
    api_base: String,
    client: Client,
    team: String,
    /// Channel id to the newest message timestamp seen there
    cursors: HashMap<String, String>,
    polls: u32,
}

impl SlackAdapter {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            team: String::new(),
            cursors: HashMap::new(),
            polls: 0,
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Call a read method and unwrap Slack's `{ok, error}` envelope
    async fn call<T: DeserializeOwned>(&self, method: &str, query: &[(&str, String)]) -> Result<T, BotError> {
        let response = self.client
            .get(self.api_url(method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Slack API error on {}: {}", method, response.status())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        unwrap_envelope(method, body)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, BotError> {
        let mut users = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }
            let page: UsersList = self.call("users.list", &query).await?;
            users.extend(page.members);
            match ResponseMetadata::cursor(page.response_metadata) {
                Some(next) => cursor = Some(next),
                None => return Ok(users),
            }
        }
    }

    async fn fetch_channels(&self) -> Result<Vec<String>, BotError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![
                ("limit", PAGE_LIMIT.to_string()),
                ("exclude_archived", "true".to_string()),
                ("types", "public_channel,private_channel,mpim,im".to_string()),
            ];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }
            let page: ConversationsList = self.call("conversations.list", &query).await?;
            channels.extend(page.channels.into_iter().filter(|c| c.is_member || c.is_im).map(|c| c.id));
            match ResponseMetadata::cursor(page.response_metadata) {
                Some(next) => cursor = Some(next),
                None => return Ok(channels),
            }
        }
    }

    /// Track new channels from now on and forget ones we left
    async fn refresh_channels(&mut self) -> Result<(), BotError> {
        let channels = self.fetch_channels().await?;
        let now = now_ts();
        self.cursors.retain(|id, _| channels.contains(id));
        for id in channels {
            self.cursors.entry(id).or_insert_with(|| now.clone());
        }
        tracing::debug!("Watching {} channels", self.cursors.len());
        Ok(())
    }

    async fn read_channel(&self, channel: &str, oldest: &str) -> Result<Vec<Event>, BotError> {
        let query = [
            ("channel", channel.to_string()),
            ("oldest", oldest.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];
        let history: History = self.call("conversations.history", &query).await?;

        // History is newest first
        let mut events = history.messages;
        events.reverse();
        for event in &mut events {
            if event.kind.is_empty() {
                event.kind = "message".to_string();
            }
            event.channel = channel.to_string();
            if event.team.is_empty() {
                event.team = self.team.clone();
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl Transport for SlackAdapter {
    async fn connect(&mut self) -> Result<Session, BotError> {
        let auth: AuthTest = self.call("auth.test", &[]).await?;
        self.team = auth.team.clone();

        let mut session = Session::new(auth.user).with_team(auth.team);
        for user in self.fetch_users().await? {
            session.add_user(user);
        }

        self.cursors.clear();
        self.refresh_channels().await?;

        tracing::info!(
            "Connected to {} as {} ({} users, {} channels)",
            session.team,
            session.bot_name,
            session.user_count(),
            self.cursors.len()
        );
        Ok(session)
    }

    async fn read_events(&mut self) -> Result<Vec<Event>, BotError> {
        self.polls += 1;
        if self.polls % CHANNEL_REFRESH_POLLS == 0 {
            if let Err(e) = self.refresh_channels().await {
                tracing::warn!("Failed to refresh channel list: {}", e);
            }
        }

        let mut channels: Vec<(String, String)> = self.cursors.iter().map(|(c, ts)| (c.clone(), ts.clone())).collect();
        channels.sort();

        // Cursors only move for channels whose events are handed back
        let mut events = Vec::new();
        let mut advanced = Vec::new();
        let mut first_error = None;
        let mut read = 0;
        for (channel, oldest) in channels {
            let batch = match self.read_channel(&channel, &oldest).await.map_err(revoked) {
                Ok(batch) => batch,
                Err(e @ BotError::Disconnected(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to read channel {}: {}", channel, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    continue;
                }
            };
            read += 1;
            if let Some(newest) = batch.iter().map(|e| e.ts.as_str()).filter(|ts| ts_after(ts, &oldest)).max_by(|a, b| ts_cmp(a, b)) {
                advanced.push((channel.clone(), newest.to_string()));
            }
            // `oldest` is inclusive on some workspaces
            events.extend(batch.into_iter().filter(|e| ts_after(&e.ts, &oldest)));
        }

        match first_error {
            Some(e) if read == 0 => Err(e),
            _ => {
                self.cursors.extend(advanced);
                Ok(events)
            }
        }
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct PostMessageRequest<'a> {
            channel: &'a str,
            text: &'a str,
        }

        tracing::debug!("Sending to {}: {}", channel, text);

        let response = self.client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Slack API error: {}", response.status())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        unwrap_envelope::<serde_json::Value>("chat.postMessage", body).map(|_| ())
    }

    fn name(&self) -> &str {
        "slack"
    }
}

fn unwrap_envelope<T: DeserializeOwned>(method: &str, body: serde_json::Value) -> Result<T, BotError> {
    if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
        let error = body.get("error").and_then(|v| v.as_str()).unwrap_or("unknown_error");
        return Err(if AUTH_ERRORS.contains(&error) {
            BotError::Auth(format!("{}: {}", method, error))
        } else {
            BotError::Network(format!("{}: {}", method, error))
        });
    }
    serde_json::from_value(body).map_err(|e| BotError::Parse(format!("{}: {}", method, e)))
}

/// A token rejected mid-session ends the session
fn revoked(e: BotError) -> BotError {
    match e {
        BotError::Auth(reason) => BotError::Disconnected(reason),
        other => other,
    }
}

/// Slack timestamps are `seconds.micros` strings; a short fraction is padded
fn ts_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |ts: &str| -> (u64, u64) {
        let (secs, fraction) = ts.split_once('.').unwrap_or((ts, ""));
        let micros: String = fraction.chars().chain(std::iter::repeat('0')).take(6).collect();
        (secs.parse().unwrap_or(0), micros.parse().unwrap_or(0))
    };
    parse(a).cmp(&parse(b))
}

fn ts_after(ts: &str, oldest: &str) -> bool {
    ts_cmp(ts, oldest) == std::cmp::Ordering::Greater
}

fn now_ts() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

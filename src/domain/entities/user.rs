use serde::Deserialize;
use std::collections::HashMap;

/// A member of the workspace, as listed in the transport's user directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            real_name: None,
            is_bot: false,
        }
    }
}

/// What the transport tells us once connected: who we are and who everyone else is
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub bot_name: String,
    pub team: String,
    users: HashMap<String, User>,
}

impl Session {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            team: String::new(),
            users: HashMap::new(),
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.add_user(user);
        self
    }

    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

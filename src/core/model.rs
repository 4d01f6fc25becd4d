use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use uuid::Uuid;

/// Who authored a [Turn].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single message in a session transcript.
///
/// Turns cannot be modified once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// An opaque piece of text representing one unit of the dataset,
/// e.g. the attributes of a single startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(String);

impl Record {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A stable ID derived from the record's content.
    /// Storing the same record twice under this ID overwrites it instead of duplicating it.
    pub fn id(&self) -> Uuid {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

impl From<String> for Record {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable() {
        let a = Record::new("StartupX, founded 2012, city: Austin");
        let b = Record::new("StartupX, founded 2012, city: Austin");
        let c = Record::new("StartupY, founded 2015, city: Boston");

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(Some(uuid::Version::Random), a.id().get_version());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let turn = Turn::assistant("Hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!("assistant", json["role"]);
        assert_eq!("Hello", json["content"]);
    }
}

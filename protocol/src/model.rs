use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Server-assigned meeting identifier.
///
/// The API hands out integer ids, but ids are only ever compared and echoed
/// back into paths, so they are kept as strings. Both JSON numbers and JSON
/// strings are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MeetingId(pub String);

impl MeetingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeetingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for MeetingId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for MeetingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(id) => Self(id.to_string()),
            Raw::Str(id) => Self(id),
        })
    }
}

/// Which collection fetch produced a meeting record.
///
/// This is a client-side annotation. The server never sends it, and the same
/// meeting can carry different tags in different collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Active,
    Upcoming,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Upcoming => "upcoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "meeting_id", alias = "id")]
    pub id: MeetingId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Start time, ISO-8601 as sent by the server
    pub t1: String,
    /// End time, ISO-8601 as sent by the server
    pub t2: String,
    pub lat: f64,
    pub long: f64,
    /// Emails of the invited participants
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetingStatus>,
}

impl Meeting {
    pub fn with_status(mut self, status: MeetingStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Body of `POST /meetings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub t1: String,
    pub t2: String,
    pub lat: f64,
    pub long: f64,
    /// Comma-separated participant emails
    pub participants: String,
}

/// The identity kept for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl UserIdentity {
    /// An identity is usable only if it names a user.
    pub fn is_well_formed(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// Body of `POST /users`.
///
/// Registration forms may carry fields beyond the identity; those are sent to
/// the server as-is but never stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            age: None,
            gender: None,
            extra: Map::new(),
        }
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            email: self.email.clone(),
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub email: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub meeting_id: Option<MeetingId>,
}

/// A point used for the nearby-meetings query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

use serde_json::Value;

use crate::model::MeetingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Every operation the client issues against the REST API
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// POST /users
    CreateUser,

    /// GET /users/{email}
    GetUser(String),

    /// POST /meetings
    CreateMeeting,

    /// GET /meetings/{id}
    GetMeeting(MeetingId),

    /// GET /meetings/active
    ActiveMeetings,

    /// GET /meetings/upcoming
    UpcomingMeetings,

    /// GET /meetings/nearby
    NearbyMeetings,

    /// POST /meetings/{id}/join
    JoinMeeting(MeetingId),

    /// POST /meetings/{id}/leave
    LeaveMeeting(MeetingId),

    /// POST /meetings/{id}/end
    EndMeeting(MeetingId),

    /// DELETE /meetings/{id}
    DeleteMeeting(MeetingId),

    /// GET /meetings/{id}/participants
    Participants(MeetingId),

    /// GET /meetings/{email}/meetings
    CreatedMeetings(String),

    /// POST /chat/post
    PostMessage,

    /// GET /meetings/{id}/messages
    MeetingMessages(MeetingId),

    /// GET /users/{email}/messages
    UserMessages(String),
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Self::CreateUser
            | Self::CreateMeeting
            | Self::JoinMeeting(_)
            | Self::LeaveMeeting(_)
            | Self::EndMeeting(_)
            | Self::PostMessage => Method::Post,
            Self::DeleteMeeting(_) => Method::Delete,
            _ => Method::Get,
        }
    }

    /// Path relative to the API base address
    pub fn path(&self) -> String {
        match self {
            Self::CreateUser => "/users".to_string(),
            Self::GetUser(email) => format!("/users/{}", email),
            Self::CreateMeeting => "/meetings".to_string(),
            Self::GetMeeting(id) | Self::DeleteMeeting(id) => format!("/meetings/{}", id),
            Self::ActiveMeetings => "/meetings/active".to_string(),
            Self::UpcomingMeetings => "/meetings/upcoming".to_string(),
            Self::NearbyMeetings => "/meetings/nearby".to_string(),
            Self::JoinMeeting(id) => format!("/meetings/{}/join", id),
            Self::LeaveMeeting(id) => format!("/meetings/{}/leave", id),
            Self::EndMeeting(id) => format!("/meetings/{}/end", id),
            Self::Participants(id) => format!("/meetings/{}/participants", id),
            Self::CreatedMeetings(email) => format!("/meetings/{}/meetings", email),
            Self::PostMessage => "/chat/post".to_string(),
            Self::MeetingMessages(id) => format!("/meetings/{}/messages", id),
            Self::UserMessages(email) => format!("/users/{}/messages", email),
        }
    }

    pub fn request(&self) -> ApiRequest {
        ApiRequest::new(self.method(), self.path())
    }
}

/// A fully described HTTP call: method, path, query pairs and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query pair only when a value is present
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

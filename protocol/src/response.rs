use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ProtocolError;
use crate::model::{ChatMessage, MeetingId};

/// Decode a JSON body into a typed response
pub fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, ProtocolError> {
    if body.is_null() {
        return Err(ProtocolError::EmptyBody);
    }
    Ok(T::deserialize(body)?)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeetingIdResponse {
    #[serde(default)]
    pub success: bool,
    pub meeting_id: MeetingId,
}

/// Id list returned by the collection endpoints.
///
/// `meetings` may be missing entirely; that is an empty result, not an error.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MeetingListResponse {
    #[serde(default)]
    pub meetings: Option<Vec<MeetingId>>,
}

impl MeetingListResponse {
    pub fn into_ids(self) -> Vec<MeetingId> {
        self.meetings.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticipantListResponse {
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndMeetingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub timed_out_participants: Vec<String>,
}

/// Error payload of a failed request.
///
/// The API reports problems either as `{"error": "..."}` or, for framework
/// generated errors, as `{"detail": ...}` where detail may be a string or a
/// structured validation list.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn from_value(body: &Value) -> Self {
        Self::deserialize(body).unwrap_or_default()
    }

    /// The most specific human-readable message in the body
    pub fn message(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref()
            && !error.is_empty()
        {
            return Some(error.to_string());
        }

        match self.detail.as_ref()? {
            Value::String(detail) if detail.is_empty() => None,
            Value::String(detail) => Some(detail.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

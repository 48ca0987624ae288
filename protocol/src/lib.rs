use thiserror::Error;

pub mod endpoint;
pub mod model;
pub mod response;

pub use endpoint::{ApiRequest, Endpoint, Method};
pub use model::{
    ChatMessage, Location, Meeting, MeetingId, MeetingStatus, NewMeeting, NewUser, UserIdentity,
};
pub use response::{
    EndMeetingResponse, ErrorBody, MeetingIdResponse, MeetingListResponse, MessageListResponse,
    ParticipantListResponse, SuccessResponse, decode,
};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Empty response body")]
    EmptyBody,
}

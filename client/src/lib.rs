//! Client-side state layer for the StepIn meeting API.
//!
//! A [`Store`] owns the session, the meeting/chat collections and the shared
//! loading and error flags. Its async operations call the REST API through a
//! [`Transport`], apply retry and refresh policy, and write the results back.
//! [`router`] decides view transitions from that state.

mod api;
mod chat;
mod config;
mod error;
mod meetings;
mod retry;
mod session;
mod state;
mod storage;
mod store;

pub mod router;

#[cfg(test)]
mod testing;

pub use stepin_protocol::{
    ApiRequest, ChatMessage, EndMeetingResponse, Endpoint, Location, Meeting, MeetingId,
    MeetingIdResponse, MeetingStatus, Method, NewMeeting, NewUser, SuccessResponse, UserIdentity,
};

pub use api::{ApiClient, ApiError, ApiResponse, Transport};
pub use config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL, SESSION_FILE_ENV};
pub use error::ClientError;
pub use meetings::Refresh;
pub use retry::RetryPolicy;
pub use router::{GuardContext, Navigation, ResolvedRoute, RouteMeta, RouteName};
pub use state::{AppState, MeetingCollection};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::Store;

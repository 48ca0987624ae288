use thiserror::Error;

use crate::api::ApiError;

pub const NOT_AUTHENTICATED: &str = "User not authenticated";

/// Errors returned by command-style operations.
///
/// Every variant has also been published to the store's error slot by the
/// time the caller sees it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation needs a signed-in user and there is none
    #[error("User not authenticated")]
    NotAuthenticated,

    /// The API call failed; `message` is what was published to the error slot
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl ClientError {
    /// Wrap an API failure, taking the message from the server's error body
    /// and falling back to `fallback`.
    pub fn from_api(source: ApiError, fallback: &str) -> Self {
        let message = source
            .server_message()
            .unwrap_or_else(|| fallback.to_string());
        Self::Api { message, source }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            Self::NotAuthenticated => None,
        }
    }
}

/// Message published when a collection refresh fails. Collection refreshes
/// never surface an error to the caller, so this is the only trace of the
/// failure the user sees.
pub(crate) fn collection_error_message(source: &ApiError, fallback: &str) -> String {
    source
        .server_message()
        .unwrap_or_else(|| format!("{}: {}", fallback, source))
}

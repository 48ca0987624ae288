use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use stepin_protocol::{ApiRequest, ChatMessage, Location, Meeting, UserIdentity};

use crate::api::{ApiClient, ApiError, ApiResponse, Transport};
use crate::config::ClientConfig;
use crate::error::{ClientError, NOT_AUTHENTICATED};
use crate::retry::RetryPolicy;
use crate::state::{AppState, MeetingCollection};
use crate::storage::{FileStorage, SessionStorage};

/// Shared client state plus the collaborators every action needs.
///
/// Cloning is cheap and every clone sees the same state, so a store can be
/// handed to whichever layer needs it.
#[derive(Clone)]
pub struct Store {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn SessionStorage>,
    state: Arc<RwLock<AppState>>,
    retry: RetryPolicy,
    cache_buster: Arc<CacheBuster>,
}

impl Store {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            transport,
            storage,
            state: Arc::new(RwLock::new(AppState::default())),
            retry: RetryPolicy::default(),
            cache_buster: Arc::new(CacheBuster::default()),
        }
    }

    /// Store talking to the configured API, persisting the session to the configured file
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = ApiClient::from_config(config)?;
        let storage = FileStorage::new(config.session_file.clone());
        Ok(Self::new(Arc::new(client), Arc::new(storage)).with_retry(config.retry))
    }

    /// Policy for per-item detail fetches during collection refreshes
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Copy of the whole state at this instant
    pub fn snapshot(&self) -> AppState {
        self.read(AppState::clone)
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.read(|s| s.user().cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(AppState::is_authenticated)
    }

    pub fn meetings(&self, collection: MeetingCollection) -> Vec<Meeting> {
        self.read(|s| s.meetings(collection).to_vec())
    }

    pub fn active_meetings(&self) -> Vec<Meeting> {
        self.meetings(MeetingCollection::Active)
    }

    pub fn upcoming_meetings(&self) -> Vec<Meeting> {
        self.meetings(MeetingCollection::Upcoming)
    }

    pub fn nearby_meetings(&self) -> Vec<Meeting> {
        self.meetings(MeetingCollection::Nearby)
    }

    pub fn user_created_meetings(&self) -> Vec<Meeting> {
        self.meetings(MeetingCollection::Created)
    }

    pub fn current_meeting(&self) -> Option<Meeting> {
        self.read(|s| s.current_meeting().cloned())
    }

    pub fn joined_meeting(&self) -> Option<Meeting> {
        self.read(|s| s.joined_meeting().cloned())
    }

    pub fn meeting_participants(&self) -> Vec<String> {
        self.read(|s| s.participants().to_vec())
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.read(|s| s.chat_messages().to_vec())
    }

    pub fn user_messages(&self) -> Vec<ChatMessage> {
        self.read(|s| s.user_messages().to_vec())
    }

    pub fn user_location(&self) -> Option<Location> {
        self.read(AppState::user_location)
    }

    pub fn is_loading(&self) -> bool {
        self.read(AppState::is_loading)
    }

    pub fn has_error(&self) -> bool {
        self.read(AppState::has_error)
    }

    pub fn error_message(&self) -> Option<String> {
        self.read(|s| s.error_message().map(str::to_string))
    }

    /// Acknowledge the current error
    pub fn clear_error(&self) {
        self.update(AppState::clear_error);
    }

    pub fn set_user_location(&self, location: Location) {
        self.update(|s| s.set_user_location(Some(location)));
    }

    pub(crate) fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    pub(crate) fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut AppState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    /// Mark an operation as in flight until the returned guard drops
    pub(crate) fn loading(&self) -> LoadingGuard<'_> {
        self.update(AppState::begin_loading);
        LoadingGuard { store: self }
    }

    pub(crate) fn publish_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.set_error(message));
    }

    /// The signed-in identity, or a published not-authenticated error
    pub(crate) fn require_user(&self) -> Result<UserIdentity, ClientError> {
        self.current_user().ok_or_else(|| {
            self.publish_error(NOT_AUTHENTICATED);
            ClientError::NotAuthenticated
        })
    }

    /// Single exchange with no error interpretation
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.transport.execute(request).await
    }

    /// Exchange for command-style operations: failures are logged, published
    /// and returned.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let path = request.path.clone();
        let result = match self.send(request).await {
            Ok(response) => response.json::<T>(),
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            tracing::error!(path = %path, error = %e, "{}", fallback);
            let err = ClientError::from_api(e, fallback);
            self.publish_error(err.to_string());
            err
        })
    }

    /// Next cache-defeat value, strictly increasing for the life of the store
    pub(crate) fn cache_token(&self) -> i64 {
        self.cache_buster.next()
    }
}

pub(crate) struct LoadingGuard<'a> {
    store: &'a Store,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.update(AppState::end_loading);
    }
}

/// Millisecond timestamps, bumped when two are requested within the same millisecond
#[derive(Debug, Default)]
struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

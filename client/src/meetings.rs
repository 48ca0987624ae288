use futures_util::future::join_all;
use serde_json::json;
use stepin_protocol::{
    ApiRequest, EndMeetingResponse, Endpoint, Location, Meeting, MeetingId, MeetingIdResponse,
    MeetingListResponse, MeetingStatus, NewMeeting, ParticipantListResponse, SuccessResponse,
};

use crate::Store;
use crate::api::ApiError;
use crate::error::{ClientError, NOT_AUTHENTICATED, collection_error_message};
use crate::state::MeetingCollection;

/// Whether a collection fetch may be answered by intermediate caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    #[default]
    Cached,
    /// Append a unique `cache` query parameter to every request of the fetch
    Force,
}

/// The collections filled by listing ids, then fetching every detail
/// concurrently with retries.
#[derive(Debug, Clone, Copy)]
enum TaggedCollection {
    Active,
    Upcoming,
}

impl TaggedCollection {
    fn endpoint(self) -> Endpoint {
        match self {
            Self::Active => Endpoint::ActiveMeetings,
            Self::Upcoming => Endpoint::UpcomingMeetings,
        }
    }

    fn status(self) -> MeetingStatus {
        match self {
            Self::Active => MeetingStatus::Active,
            Self::Upcoming => MeetingStatus::Upcoming,
        }
    }

    fn collection(self) -> MeetingCollection {
        match self {
            Self::Active => MeetingCollection::Active,
            Self::Upcoming => MeetingCollection::Upcoming,
        }
    }

    fn error_message(self) -> &'static str {
        match self {
            Self::Active => "Error getting active meetings",
            Self::Upcoming => "Error getting upcoming meetings",
        }
    }
}

impl Store {
    /// Refresh the active meetings collection.
    ///
    /// Never fails: a broken list endpoint publishes an error and leaves the
    /// collection empty. Meetings whose detail cannot be fetched after
    /// retrying are left out.
    pub async fn get_active_meetings(&self, refresh: Refresh) -> Vec<Meeting> {
        self.fetch_tagged(TaggedCollection::Active, refresh).await
    }

    /// Refresh the upcoming meetings collection, same contract as
    /// [`get_active_meetings`](Self::get_active_meetings).
    pub async fn get_upcoming_meetings(&self, refresh: Refresh) -> Vec<Meeting> {
        self.fetch_tagged(TaggedCollection::Upcoming, refresh).await
    }

    async fn fetch_tagged(&self, kind: TaggedCollection, refresh: Refresh) -> Vec<Meeting> {
        let _loading = self.loading();
        let collection = kind.collection();
        let cache = match refresh {
            Refresh::Force => Some(self.cache_token()),
            Refresh::Cached => None,
        };

        tracing::debug!(collection = ?collection, refresh = ?refresh, "Fetching meetings");

        let list = kind.endpoint().request().query_opt("cache", cache);
        let ids = match self.list_ids(list).await {
            Ok(ids) => ids,
            Err(e) => return self.collection_failed(collection, e, kind.error_message()),
        };

        if ids.is_empty() {
            tracing::debug!(collection = ?collection, "No meetings listed");
            self.update(|s| s.set_meetings(collection, Vec::new()));
            return Vec::new();
        }

        let fetches = ids
            .iter()
            .map(|id| self.fetch_meeting_with_retry(id, cache, kind.status()));
        let meetings: Vec<Meeting> = join_all(fetches).await.into_iter().flatten().collect();

        tracing::debug!(
            collection = ?collection,
            listed = ids.len(),
            loaded = meetings.len(),
            "Meetings loaded"
        );
        self.update(|s| s.set_meetings(collection, meetings.clone()));
        meetings
    }

    /// Detail fetch for one listed id. Exhausting the retries yields `None`.
    async fn fetch_meeting_with_retry(
        &self,
        id: &MeetingId,
        cache: Option<i64>,
        status: MeetingStatus,
    ) -> Option<Meeting> {
        let label = format!("Fetching meeting {}", id);
        let result = self
            .retry()
            .run(&label, move |_| async move {
                let request = Endpoint::GetMeeting(id.clone())
                    .request()
                    .query_opt("cache", cache);
                self.send(request).await?.json::<Meeting>()
            })
            .await;

        result.ok().map(|meeting| meeting.with_status(status))
    }

    /// Ids from a list endpoint; a missing list is an empty one
    async fn list_ids(&self, request: ApiRequest) -> Result<Vec<MeetingId>, ApiError> {
        let list: MeetingListResponse = self.send(request).await?.json()?;
        Ok(list.into_ids())
    }

    /// Failure path of every collection refresh: publish, empty the
    /// collection, resolve empty.
    fn collection_failed(
        &self,
        collection: MeetingCollection,
        error: ApiError,
        fallback: &str,
    ) -> Vec<Meeting> {
        tracing::error!(collection = ?collection, error = %error, "{}", fallback);
        self.publish_error(collection_error_message(&error, fallback));
        self.update(|s| s.set_meetings(collection, Vec::new()));
        Vec::new()
    }

    /// Details fetched one at a time without retry; failed items are skipped
    async fn fetch_each(&self, ids: &[MeetingId]) -> Vec<Meeting> {
        let mut meetings = Vec::with_capacity(ids.len());
        for id in ids {
            let result = self
                .send(Endpoint::GetMeeting(id.clone()).request())
                .await
                .and_then(|r| r.json::<Meeting>());
            match result {
                Ok(meeting) => meetings.push(meeting),
                Err(e) => tracing::warn!(meeting = %id, error = %e, "Skipping meeting"),
            }
        }
        meetings
    }

    /// Meetings near `location` that the signed-in user can join.
    ///
    /// `None` searches around the location last given to
    /// [`set_user_location`](Self::set_user_location). Without a session or
    /// without any location this resolves empty without touching the network.
    /// List failures publish an error and resolve empty.
    pub async fn get_nearby_meetings(&self, location: Option<Location>) -> Vec<Meeting> {
        let (user, location) = match (self.current_user(), location.or(self.user_location())) {
            (Some(user), Some(location)) => (user, location),
            (user, _) => {
                tracing::debug!(
                    authenticated = user.is_some(),
                    "Skipping nearby search without a session and a location"
                );
                self.update(|s| s.set_meetings(MeetingCollection::Nearby, Vec::new()));
                return Vec::new();
            }
        };

        let _loading = self.loading();
        let request = Endpoint::NearbyMeetings
            .request()
            .query("email", &user.email)
            .query("x", location.x)
            .query("y", location.y);

        let ids = match self.list_ids(request).await {
            Ok(ids) => ids,
            Err(e) => {
                return self.collection_failed(
                    MeetingCollection::Nearby,
                    e,
                    "Error getting nearby meetings",
                );
            }
        };

        let meetings = self.fetch_each(&ids).await;
        self.update(|s| s.set_meetings(MeetingCollection::Nearby, meetings.clone()));
        meetings
    }

    /// Meetings created by the signed-in user. Never fails; without a session
    /// a not-authenticated error is published and the result is empty.
    pub async fn get_user_created_meetings(&self) -> Vec<Meeting> {
        let _loading = self.loading();

        let Some(user) = self.current_user() else {
            self.publish_error(NOT_AUTHENTICATED);
            self.update(|s| s.set_meetings(MeetingCollection::Created, Vec::new()));
            return Vec::new();
        };

        let ids = match self
            .list_ids(Endpoint::CreatedMeetings(user.email).request())
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                return self.collection_failed(
                    MeetingCollection::Created,
                    e,
                    "Error getting user created meetings",
                );
            }
        };

        let meetings = self.fetch_each(&ids).await;
        self.update(|s| s.set_meetings(MeetingCollection::Created, meetings.clone()));
        meetings
    }

    /// Create a meeting.
    ///
    /// On success this also force-refreshes the active meetings and, with a
    /// session, the user's created meetings, so both reflect the new meeting
    /// once this returns.
    pub async fn create_meeting(
        &self,
        meeting: &NewMeeting,
    ) -> Result<MeetingIdResponse, ClientError> {
        let _loading = self.loading();

        let request = Endpoint::CreateMeeting.request().body(json!(meeting));
        let response: MeetingIdResponse = self.call(request, "Error creating meeting").await?;

        tracing::info!(meeting = %response.meeting_id, "Meeting created");

        self.get_active_meetings(Refresh::Force).await;
        if self.is_authenticated() {
            self.get_user_created_meetings().await;
        }
        Ok(response)
    }

    /// Fetch one meeting and make it the current meeting
    pub async fn get_meeting(&self, id: &MeetingId) -> Result<Meeting, ClientError> {
        let _loading = self.loading();

        let meeting: Meeting = self
            .call(
                Endpoint::GetMeeting(id.clone()).request(),
                "Error getting meeting details",
            )
            .await?;
        self.update(|s| s.set_current_meeting(Some(meeting.clone())));
        Ok(meeting)
    }

    /// Join a meeting; when the server accepts, its details become the joined meeting
    pub async fn join_meeting(&self, id: &MeetingId) -> Result<SuccessResponse, ClientError> {
        let user = self.require_user()?;
        let _loading = self.loading();

        let request = Endpoint::JoinMeeting(id.clone())
            .request()
            .body(json!({ "email": user.email }));
        let response: SuccessResponse = self.call(request, "Error joining meeting").await?;

        if response.success {
            let meeting: Meeting = self
                .call(
                    Endpoint::GetMeeting(id.clone()).request(),
                    "Error joining meeting",
                )
                .await?;
            self.update(|s| s.set_joined_meeting(Some(meeting)));
        }
        Ok(response)
    }

    pub async fn leave_meeting(&self, id: &MeetingId) -> Result<SuccessResponse, ClientError> {
        let user = self.require_user()?;
        let _loading = self.loading();

        let request = Endpoint::LeaveMeeting(id.clone())
            .request()
            .body(json!({ "email": user.email }));
        let response: SuccessResponse = self.call(request, "Error leaving meeting").await?;

        if response.success {
            self.update(|s| s.set_joined_meeting(None));
        }
        Ok(response)
    }

    /// End a meeting for everyone. The joined meeting is cleared on success.
    pub async fn end_meeting(&self, id: &MeetingId) -> Result<EndMeetingResponse, ClientError> {
        let _loading = self.loading();

        let response: EndMeetingResponse = self
            .call(
                Endpoint::EndMeeting(id.clone()).request(),
                "Error ending meeting",
            )
            .await?;

        if response.success {
            self.update(|s| s.set_joined_meeting(None));
        }
        Ok(response)
    }

    /// Delete a meeting owned by the signed-in user.
    ///
    /// On success the created meetings and the active meetings are both
    /// refreshed before this returns.
    pub async fn delete_meeting(&self, id: &MeetingId) -> Result<(), ClientError> {
        let user = self.require_user()?;
        let _loading = self.loading();

        let request = Endpoint::DeleteMeeting(id.clone())
            .request()
            .query("email", &user.email);
        if let Err(e) = self.send(request).await {
            tracing::error!(meeting = %id, error = %e, "Failed to delete meeting");
            let err = ClientError::from_api(e, "Error deleting meeting");
            self.publish_error(err.to_string());
            return Err(err);
        }

        tracing::info!(meeting = %id, "Meeting deleted");

        self.get_user_created_meetings().await;
        self.get_active_meetings(Refresh::Cached).await;
        Ok(())
    }

    pub async fn get_meeting_participants(
        &self,
        id: &MeetingId,
    ) -> Result<Vec<String>, ClientError> {
        let _loading = self.loading();

        let response: ParticipantListResponse = self
            .call(
                Endpoint::Participants(id.clone()).request(),
                "Error getting meeting participants",
            )
            .await?;
        self.update(|s| s.set_participants(response.participants.clone()));
        Ok(response.participants)
    }
}

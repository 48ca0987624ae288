use stepin_protocol::{ChatMessage, Location, Meeting, UserIdentity};

/// Meeting collections that are refreshed as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingCollection {
    Active,
    Upcoming,
    Nearby,
    Created,
}

/// Everything the client knows, accumulated from API responses.
///
/// Fields are only changed through the named transitions below, which are
/// crate-private; callers get read access through the getters or a
/// [`Store::snapshot`](crate::Store::snapshot).
#[derive(Debug, Clone, Default)]
pub struct AppState {
    user: Option<UserIdentity>,
    user_location: Option<Location>,

    active_meetings: Vec<Meeting>,
    upcoming_meetings: Vec<Meeting>,
    nearby_meetings: Vec<Meeting>,
    created_meetings: Vec<Meeting>,

    current_meeting: Option<Meeting>,
    joined_meeting: Option<Meeting>,

    participants: Vec<String>,
    chat_messages: Vec<ChatMessage>,
    user_messages: Vec<ChatMessage>,

    in_flight: usize,
    error: Option<String>,
}

impl AppState {
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_location(&self) -> Option<Location> {
        self.user_location
    }

    pub fn meetings(&self, collection: MeetingCollection) -> &[Meeting] {
        match collection {
            MeetingCollection::Active => &self.active_meetings,
            MeetingCollection::Upcoming => &self.upcoming_meetings,
            MeetingCollection::Nearby => &self.nearby_meetings,
            MeetingCollection::Created => &self.created_meetings,
        }
    }

    pub fn current_meeting(&self) -> Option<&Meeting> {
        self.current_meeting.as_ref()
    }

    pub fn joined_meeting(&self) -> Option<&Meeting> {
        self.joined_meeting.as_ref()
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn chat_messages(&self) -> &[ChatMessage] {
        &self.chat_messages
    }

    pub fn user_messages(&self) -> &[ChatMessage] {
        &self.user_messages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_user(&mut self, user: Option<UserIdentity>) {
        self.user = user;
    }

    /// Drops the identity and the joined meeting in one step
    pub(crate) fn clear_session(&mut self) {
        self.user = None;
        self.joined_meeting = None;
    }

    pub(crate) fn set_user_location(&mut self, location: Option<Location>) {
        self.user_location = location;
    }

    pub(crate) fn set_meetings(&mut self, collection: MeetingCollection, meetings: Vec<Meeting>) {
        let slot = match collection {
            MeetingCollection::Active => &mut self.active_meetings,
            MeetingCollection::Upcoming => &mut self.upcoming_meetings,
            MeetingCollection::Nearby => &mut self.nearby_meetings,
            MeetingCollection::Created => &mut self.created_meetings,
        };
        *slot = meetings;
    }

    pub(crate) fn set_current_meeting(&mut self, meeting: Option<Meeting>) {
        self.current_meeting = meeting;
    }

    pub(crate) fn set_joined_meeting(&mut self, meeting: Option<Meeting>) {
        self.joined_meeting = meeting;
    }

    pub(crate) fn set_participants(&mut self, participants: Vec<String>) {
        self.participants = participants;
    }

    pub(crate) fn set_chat_messages(&mut self, messages: Vec<ChatMessage>) {
        self.chat_messages = messages;
    }

    pub(crate) fn set_user_messages(&mut self, messages: Vec<ChatMessage>) {
        self.user_messages = messages;
    }

    pub(crate) fn begin_loading(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn end_loading(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

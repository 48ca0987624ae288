use serde_json::json;
use stepin_protocol::{ChatMessage, Endpoint, MeetingId, MessageListResponse, SuccessResponse};

use crate::Store;
use crate::error::ClientError;

impl Store {
    /// Post `text` as the signed-in user, optionally scoped to a meeting
    pub async fn post_message(
        &self,
        text: &str,
        meeting_id: Option<&MeetingId>,
    ) -> Result<SuccessResponse, ClientError> {
        let user = self.require_user()?;
        let _loading = self.loading();

        let request = Endpoint::PostMessage.request().body(json!({
            "email": user.email,
            "text": text,
            "meeting_id": meeting_id,
        }));
        self.call(request, "Error posting message").await
    }

    /// Load the chat history of a meeting into the chat messages collection
    pub async fn get_meeting_messages(
        &self,
        id: &MeetingId,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let _loading = self.loading();

        let response: MessageListResponse = self
            .call(
                Endpoint::MeetingMessages(id.clone()).request(),
                "Error getting chat messages",
            )
            .await?;
        self.update(|s| s.set_chat_messages(response.messages.clone()));
        Ok(response.messages)
    }

    /// Messages written by the signed-in user, across meetings or within one
    pub async fn get_user_messages(
        &self,
        meeting_id: Option<&MeetingId>,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let user = self.require_user()?;
        let _loading = self.loading();

        let request = Endpoint::UserMessages(user.email)
            .request()
            .query_opt("meeting_id", meeting_id);
        let response: MessageListResponse =
            self.call(request, "Error getting user messages").await?;
        self.update(|s| s.set_user_messages(response.messages.clone()));
        Ok(response.messages)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use stepin_protocol::{MeetingId, Method, UserIdentity};

    use crate::storage::MemoryStorage;
    use crate::testing::ScriptedTransport;
    use crate::{ClientError, Store};

    fn signed_in() -> (Store, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Store::new(transport.clone(), Arc::new(MemoryStorage::new()));
        store.login(UserIdentity {
            email: "ana@example.com".into(),
            name: "Ana".into(),
            age: None,
            gender: None,
        });
        (store, transport)
    }

    fn messages() -> serde_json::Value {
        json!({
            "messages": [
                {
                    "email": "ana@example.com",
                    "message": "on my way",
                    "timestamp": "2025-03-01T09:01:00",
                    "meeting_id": 4,
                },
                {
                    "email": "bo@example.com",
                    "message": "see you",
                    "timestamp": "2025-03-01T09:02:00",
                },
            ]
        })
    }

    #[tokio::test]
    async fn test_post_message_body() {
        let (store, transport) = signed_in();
        transport.respond(Method::Post, "/chat/post", json!({ "success": true }));

        let response = store
            .post_message("hello", Some(&MeetingId::new("4")))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({
                "email": "ana@example.com",
                "text": "hello",
                "meeting_id": "4",
            }))
        );
    }

    #[tokio::test]
    async fn test_post_message_requires_session() {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Store::new(transport.clone(), Arc::new(MemoryStorage::new()));

        let err = store.post_message("hello", None).await.unwrap_err();

        assert!(matches!(err, ClientError::NotAuthenticated));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_meeting_messages_replace_collection() {
        let (store, transport) = signed_in();
        transport
            .respond(Method::Get, "/meetings/4/messages", messages())
            .respond(Method::Get, "/meetings/4/messages", json!({ "messages": [] }));

        let loaded = store.get_meeting_messages(&"4".into()).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(store.chat_messages(), loaded);
        assert_eq!(loaded[1].meeting_id, None);

        store.get_meeting_messages(&"4".into()).await.unwrap();
        assert!(store.chat_messages().is_empty());
    }

    #[tokio::test]
    async fn test_user_messages_filter_by_meeting() {
        let (store, transport) = signed_in();
        transport.respond(Method::Get, "/users/ana@example.com/messages", messages());

        store.get_user_messages(None).await.unwrap();
        store
            .get_user_messages(Some(&MeetingId::new("4")))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].query_value("meeting_id"), None);
        assert_eq!(requests[1].query_value("meeting_id"), Some("4"));
        assert_eq!(store.user_messages().len(), 2);
    }

    #[tokio::test]
    async fn test_message_failure_is_published() {
        let (store, transport) = signed_in();
        transport.disconnect(Method::Get, "/meetings/4/messages");

        let err = store.get_meeting_messages(&"4".into()).await.unwrap_err();

        assert_eq!(err.to_string(), "Error getting chat messages");
        assert_eq!(
            store.error_message().as_deref(),
            Some("Error getting chat messages")
        );
        assert!(!store.is_loading());
    }
}

use serde_json::json;
use stepin_protocol::{Endpoint, NewUser, SuccessResponse, UserIdentity};

use crate::Store;
use crate::error::ClientError;

impl Store {
    /// Install `identity` as the signed-in user and mirror it to storage.
    ///
    /// Credentials are not checked here; callers validate them first.
    pub fn login(&self, identity: UserIdentity) {
        if let Err(e) = self.storage().save(&identity) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
        self.update(|s| s.set_user(Some(identity)));
    }

    /// Forget the user and the joined meeting, and drop the stored session
    pub fn logout(&self) {
        self.update(|s| s.clear_session());
        if let Err(e) = self.storage().clear() {
            tracing::warn!(error = %e, "Failed to remove stored session");
        }
    }

    /// Install the stored identity, if there is a usable one.
    ///
    /// Missing, unreadable or malformed storage all mean "no session". Returns
    /// whether a session was restored.
    pub fn restore_session(&self) -> bool {
        match self.storage().load() {
            Ok(Some(identity)) => {
                tracing::debug!(email = %identity.email, "Restored session");
                self.update(|s| s.set_user(Some(identity)));
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring stored session");
                false
            }
        }
    }

    /// Startup step: restore the stored session once, before the first
    /// navigation is evaluated.
    pub fn bootstrap(&self) -> Option<UserIdentity> {
        if !self.is_authenticated() {
            self.restore_session();
        }
        let user = self.current_user();
        match &user {
            Some(identity) => tracing::info!(email = %identity.email, "Session active"),
            None => tracing::info!("No stored session"),
        }
        user
    }

    /// Register a user; on success the new identity is signed in
    pub async fn create_user(&self, user: &NewUser) -> Result<SuccessResponse, ClientError> {
        let _loading = self.loading();

        let request = Endpoint::CreateUser.request().body(json!(user));
        let response: SuccessResponse = self.call(request, "Error creating user").await?;

        if response.success {
            self.login(user.identity());
        }
        Ok(response)
    }

    /// Look up a user record by email
    pub async fn get_user(&self, email: &str) -> Result<UserIdentity, ClientError> {
        let _loading = self.loading();

        self.call(
            Endpoint::GetUser(email.to_string()).request(),
            "Error getting user details",
        )
        .await
    }
}

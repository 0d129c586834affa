//! Typed CRM operations on top of the session client.

use serde_json::Value;
use shared::{
    domain::{DashboardStats, Lead, ReportSummary, User},
    protocol::{
        DateRange, FollowupUpdate, LeadDraft, LeadUpdate, LoginRequest, LoginResponse, NewUser,
        Route,
    },
};
use tracing::{info, warn};

use crate::{error::ClientResult, ApiClient};

/// Outcome of resuming a persisted session at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRestore {
    /// Nothing was persisted.
    Anonymous,
    Restored(User),
    /// A token was persisted but the backend did not accept it; it has been
    /// cleared.
    Rejected { reason: String },
}

impl SessionRestore {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Restored(user) => Some(user),
            _ => None,
        }
    }
}

impl ApiClient {
    /// Exchanges credentials for a token and makes it the session token.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let response: LoginResponse = self
            .post(
                Route::Login.as_str(),
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.set_token(Some(response.token.clone())).await?;
        info!(email, "logged in");
        Ok(response)
    }

    pub async fn current_user(&self) -> ClientResult<User> {
        self.get(Route::Me.as_str(), &[]).await
    }

    /// Resumes the persisted session. Any failure to confirm the token drops
    /// it and leaves the client logged out.
    pub async fn restore_session(&self) -> ClientResult<SessionRestore> {
        let Some(token) = self.token().await else {
            return Ok(SessionRestore::Anonymous);
        };

        match self.current_user().await {
            Ok(user) => {
                self.set_token(Some(token)).await?;
                info!(user_id = %user.id, "session restored");
                Ok(SessionRestore::Restored(user))
            }
            Err(err) => {
                warn!("discarding persisted session: {err}");
                self.set_token(None).await?;
                Ok(SessionRestore::Rejected {
                    reason: err.to_string(),
                })
            }
        }
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.set_token(None).await?;
        info!("logged out");
        Ok(())
    }

    pub async fn list_leads(&self) -> ClientResult<Vec<Lead>> {
        self.get(Route::Leads.as_str(), &[]).await
    }

    pub async fn create_lead(&self, draft: &LeadDraft) -> ClientResult<Value> {
        self.post(Route::Leads.as_str(), draft).await
    }

    pub async fn update_lead(&self, update: &LeadUpdate) -> ClientResult<Value> {
        self.put(Route::Leads.as_str(), update).await
    }

    pub async fn list_followups(&self) -> ClientResult<Vec<Lead>> {
        self.get(Route::Followups.as_str(), &[]).await
    }

    pub async fn update_followup(&self, update: &FollowupUpdate) -> ClientResult<Value> {
        self.put(Route::Followups.as_str(), update).await
    }

    pub async fn dashboard(&self, range: DateRange) -> ClientResult<DashboardStats> {
        self.get(Route::Dashboard.as_str(), &range.to_params()).await
    }

    pub async fn reports(&self, range: DateRange) -> ClientResult<ReportSummary> {
        self.get(Route::Reports.as_str(), &range.to_params()).await
    }

    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.get(Route::Users.as_str(), &[]).await
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<Value> {
        self.post(Route::Users.as_str(), user).await
    }
}

// src/integrations/backend/auth.rs
//
// Authentication endpoints under /auth/.
//
// These paths never go through refresh-and-retry: a 401 here is an answer,
// not an expired session. Successful login/verify store the access token in
// the shared session; logout always drops it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::{ApiClient, ApiRequest};
use crate::domain::User;
use crate::error::{AppError, AppResult};

/// Result of a password login.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(User),
    /// Two-factor is on: a code was sent and must be verified.
    OtpRequired { user_id: String },
}

/// Why an OTP is being (re)sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    #[default]
    Signup,
    Login,
    PasswordReset,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome>;
    /// Returns the id of the pending account.
    async fn signup(&self, email: &str, password: &str, name: &str) -> AppResult<String>;
    async fn verify_otp(&self, user_id: &str, code: &str) -> AppResult<User>;
    async fn resend_otp(&self, user_id: &str, purpose: OtpPurpose) -> AppResult<()>;
    /// Obtain a fresh access token from the refresh cookie.
    async fn refresh(&self) -> AppResult<()>;
    async fn logout(&self) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthData {
    user: User,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupData {
    user_id: String,
}

/// `403 { data: { requiresOTP: true, userId } }` means "send a code".
fn otp_challenge(error: &AppError) -> Option<String> {
    let AppError::Api {
        status: 403,
        details: Some(body),
        ..
    } = error
    else {
        return None;
    };

    let data = body.get("data")?;
    if !data.get("requiresOTP")?.as_bool()? {
        return None;
    }
    data.get("userId")?.as_str().map(str::to_string)
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let request = ApiRequest::post("/auth/login")
            .json(&json!({ "email": email, "password": password }))?;

        match self.fetch_required::<AuthData>(&request).await {
            Ok(auth) => {
                self.session().set_access_token(Some(auth.access_token));
                Ok(LoginOutcome::Authenticated(auth.user))
            }
            Err(err) => match otp_challenge(&err) {
                Some(user_id) => {
                    log::info!("login for {} requires OTP verification", user_id);
                    Ok(LoginOutcome::OtpRequired { user_id })
                }
                None => Err(err),
            },
        }
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> AppResult<String> {
        let request = ApiRequest::post("/auth/signup").json(&json!({
            "email": email,
            "password": password,
            "name": name,
        }))?;

        let data: SignupData = self.fetch_required(&request).await?;
        Ok(data.user_id)
    }

    async fn verify_otp(&self, user_id: &str, code: &str) -> AppResult<User> {
        let request = ApiRequest::post("/auth/verify")
            .json(&json!({ "userId": user_id, "code": code }))?;

        let auth: AuthData = self.fetch_required(&request).await?;
        self.session().set_access_token(Some(auth.access_token));
        Ok(auth.user)
    }

    async fn resend_otp(&self, user_id: &str, purpose: OtpPurpose) -> AppResult<()> {
        let request = ApiRequest::post("/auth/resend-otp")
            .json(&json!({ "userId": user_id, "purpose": purpose }))?;
        self.send(&request).await
    }

    async fn refresh(&self) -> AppResult<()> {
        self.session()
            .force_refresh(|| self.refresh_access_token())
            .await?;
        Ok(())
    }

    async fn logout(&self) -> AppResult<()> {
        let result = self.send(&ApiRequest::post("/auth/logout")).await;
        self.session().clear("logout");
        if let Err(e) = &result {
            log::warn!("logout request failed, local session cleared anyway: {}", e);
        }
        result
    }
}

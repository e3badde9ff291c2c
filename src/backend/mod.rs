use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::{
    auth::session::Session,
    config::Config,
    errors::{AppError, AppResult},
};

/// Credential a backend call runs under. User calls are subject to the
/// database's row-level security; service calls bypass it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    User(String),
    Anon,
    Service,
}

/// REST client for the managed backend: stored procedures under
/// `/rest/v1/rpc` and the auth endpoints under `/auth/v1`.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    service_role_key: SecretString,
}

impl BackendClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
            anon_key: config.backend_anon_key.clone(),
            service_role_key: config.backend_service_role_key.clone(),
        })
    }

    fn authorize(&self, builder: RequestBuilder, access: &Access) -> RequestBuilder {
        let api_key = match access {
            Access::Service => self.service_role_key.expose_secret(),
            _ => self.anon_key.expose_secret(),
        };
        let bearer = match access {
            Access::User(token) => token.as_str(),
            Access::Anon => self.anon_key.expose_secret(),
            Access::Service => self.service_role_key.expose_secret(),
        };

        builder
            .header("apikey", api_key)
            .bearer_auth(bearer)
    }

    /// Invokes the stored procedure `name` with named parameters.
    pub async fn rpc<P, R>(&self, name: &str, params: &P, access: &Access) -> AppResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, name);
        log::debug!("rpc {} as {:?}", name, access_label(access));

        let request = self
            .authorize(self.http.post(&url), access)
            .header("content-type", "application/json")
            .json(params);

        let response = request.send().await.map_err(|e| {
            log::error!("rpc {} failed to send: {}", name, e);
            AppError::BackendError(format!("rpc {}: {}", name, e))
        })?;

        read_json(response, name).await
    }

    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> AppResult<Session> {
        let url = format!("{}/auth/v1/token?grant_type=pkce", self.base_url);
        let response = self
            .authorize(self.http.post(&url), &Access::Anon)
            .json(&json!({
                "auth_code": auth_code,
                "code_verifier": code_verifier,
            }))
            .send()
            .await?;

        match read_json(response, "code exchange").await {
            Err(AppError::BackendError(msg)) | Err(AppError::BadRequest(msg)) => {
                Err(AppError::Unauthorized(format!("Code exchange failed: {}", msg)))
            }
            other => other,
        }
    }

    /// Writes `app_metadata` on the auth user record (service role only).
    pub async fn update_user_app_metadata(&self, user_id: &str, metadata: Value) -> AppResult<()> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);
        let response = self
            .authorize(self.http.put(&url), &Access::Service)
            .json(&json!({ "app_metadata": metadata }))
            .send()
            .await?;

        let _: Value = read_json(response, "update app_metadata").await?;
        Ok(())
    }

    pub async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/rest/v1/", self.base_url);
        let response = self
            .authorize(self.http.get(&url), &Access::Anon)
            .send()
            .await?;

        if response.status().is_server_error() {
            return Err(AppError::BackendError(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn access_label(access: &Access) -> &'static str {
    match access {
        Access::User(_) => "user",
        Access::Anon => "anon",
        Access::Service => "service",
    }
}

async fn read_json<R: DeserializeOwned>(response: Response, operation: &str) -> AppResult<R> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| body.clone());
        log::warn!("{} returned {}: {}", operation, status, message);
        return Err(status_error(status, operation, message));
    }

    // Void procedures answer with an empty body.
    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| {
        AppError::BackendError(format!("{}: unexpected response shape: {}", operation, e))
    })
}

fn status_error(status: StatusCode, operation: &str, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST => AppError::BadRequest(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{}: {}", operation, message)),
        _ => AppError::BackendError(format!("{} ({}): {}", operation, status, message)),
    }
}

/// Pulls the human-readable message out of a REST or auth error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

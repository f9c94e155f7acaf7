//! Client for the remote API that owns users, water-consumption records and
//! catalog items. Every call is a single request: no retries, and no timeout
//! unless one is configured.

use std::time::Duration;

use actix_web::cookie::Cookie;
use reqwest::{
    header::{ACCEPT, COOKIE, SET_COOKIE},
    Client, RequestBuilder, Response,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::{
    session::SESSION_COOKIE,
    structs::{Credentials, Registration, User},
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed ({status})")]
    Status { status: u16, message: Option<String> },

    #[error("not authenticated")]
    Unauthenticated,

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message for a failed write: the server's own words when it sent any.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_owned(),
        }
    }

    /// Message for a failed read, shown next to the retry action.
    pub fn read_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { status, .. } => format!("Error en la respuesta: {status}"),
            _ => fallback.to_owned(),
        }
    }
}

/// The two record collections exposed by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    WaterConsumption,
    Catalog,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::WaterConsumption => "/api/consumo-agua",
            Resource::Catalog => "/api/catalogo",
        }
    }
}

/// Successful login: the user as reported by the API and the session token.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: Option<User>,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteApi {
    client: Client,
    base_url: String,
}

impl RemoteApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        Url::parse(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        })
    }

    /// Joins `path` onto the base URL, keeping any path prefix the base has.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.base_url,
            path.trim().trim_start_matches('/')
        ))?)
    }

    fn record_endpoint(&self, resource: Resource, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(resource.path())?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    fn authorized(builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .bearer_auth(token)
            .header(COOKIE, format!("{SESSION_COOKIE}={token}"))
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Login, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/api/users/login")?)
            .json(credentials)
            .send()
            .await?;
        let response = expect_success(response).await?;

        let cookie_token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_owned()).ok())
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty());

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .or(cookie_token);

        // A user without a role cannot be routed anywhere.
        let user = User::from_body(&body).filter(|_| {
            let user = body.get("user").unwrap_or(&body);
            user.get("role")
                .and_then(Value::as_str)
                .is_some_and(|role| !role.is_empty())
        });
        Ok(Login { user, token })
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("/api/users")?)
            .json(registration)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let request = self.client.post(self.endpoint("/api/users/logout")?);
        let response = Self::authorized(request, token).send().await?;
        expect_success(response).await?;
        Ok(())
    }

    /// Resolves the user behind `token`.
    pub async fn me(&self, token: &str) -> Result<User, ApiError> {
        let request = self
            .client
            .get(self.endpoint("/api/users/me")?)
            .header(ACCEPT, "application/json");
        let response = expect_success(Self::authorized(request, token).send().await?).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        User::from_body(&body).ok_or(ApiError::Unauthenticated)
    }

    /// Fetches a collection as raw JSON; shape coercion is the caller's job.
    pub async fn list(&self, resource: Resource, token: &str) -> Result<Value, ApiError> {
        let request = self
            .client
            .get(self.endpoint(resource.path())?)
            .header(ACCEPT, "application/json");
        let response = expect_success(Self::authorized(request, token).send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn create<B: Serialize>(
        &self,
        resource: Resource,
        token: &str,
        body: B,
    ) -> Result<(), ApiError> {
        let request = self.client.post(self.endpoint(resource.path())?).json(&body);
        expect_success(Self::authorized(request, token).send().await?).await?;
        Ok(())
    }

    pub async fn update<B: Serialize>(
        &self,
        resource: Resource,
        id: &str,
        token: &str,
        body: B,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.record_endpoint(resource, id)?)
            .json(&body);
        expect_success(Self::authorized(request, token).send().await?).await?;
        Ok(())
    }

    pub async fn delete(&self, resource: Resource, id: &str, token: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.record_endpoint(resource, id)?);
        expect_success(Self::authorized(request, token).send().await?).await?;
        Ok(())
    }
}

async fn expect_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: server_message(&body),
    })
}

/// Pulls `message` or `errors[0].message` out of an error body.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("message").and_then(Value::as_str).or_else(|| {
        value
            .get("errors")
            .and_then(|errors| errors.get(0))
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
    })?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_owned())
}

// API client module: a small blocking HTTP client for the snapsecounter
// service. Every call is synchronous; the session loop waits on each one.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{CreatedEvent, Event, EventSummary, NewEvent, User};

pub const DEFAULT_BASE_URL: &str = "https://snapsecounter.serveo.net/";

const LOGIN_PATH: &str = "api-token-auth/";
const API_PREFIX: &str = "api/";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The login endpoint answered without a token.
    #[error("wrong username/password combination")]
    Auth,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server issued a token that cannot be sent as a header")]
    InvalidToken,
}

/// Message attached to a `"success": false` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
    pub message: String,
}

/// A decoded response body. The server signals logical failures with a
/// `"success": false` object instead of an HTTP error, so each body is
/// classified once here and call sites only match on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Ok(T),
    Failed(ServerFailure),
}

impl<T> Reply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Ok(v) => Reply::Ok(f(v)),
            Reply::Failed(e) => Reply::Failed(e),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Reply::Ok(v) => Some(v),
            Reply::Failed(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Reply<T> {
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        // Some POST endpoints answer with an empty body.
        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body)?
        };
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        if let Some(obj) = value.as_object() {
            if obj.get("success") == Some(&Value::Bool(false)) {
                let message = ["message", "error", "detail"]
                    .iter()
                    .find_map(|key| obj.get(*key))
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "request was rejected".into());
                return Ok(Reply::Failed(ServerFailure { message }));
            }
        }
        Ok(Reply::Ok(serde_json::from_value(value)?))
    }
}

/// Operations the session loop needs from the remote service.
pub trait DrinkApi {
    /// Exchange credentials for a token and keep it for later calls.
    fn login(&mut self, username: &str, password: &str) -> Result<String, ApiError>;
    fn list_events(&self) -> Result<Reply<Vec<EventSummary>>, ApiError>;
    fn get_event(&self, id: u64) -> Result<Reply<Event>, ApiError>;
    fn create_event(&self, name: &str) -> Result<Reply<u64>, ApiError>;
    fn join_event(&self, id: u64) -> Result<Reply<()>, ApiError>;
    /// Append a drink for the logged in user; the server stamps the time.
    fn record_drink(&self, event_id: u64) -> Result<Reply<()>, ApiError>;
    fn list_users(&self) -> Result<Reply<Vec<User>>, ApiError>;
}

/// Login form fields.
#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login reply. A rejected login comes back without `token`.
#[derive(Deserialize, Debug)]
struct LoginResponse {
    token: Option<String>,
}

/// HTTP implementation of [`DrinkApi`]. Holds the reqwest blocking client,
/// the service base URL and the token once logged in.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    show_progress: bool,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(ApiClient {
            client,
            base_url,
            token: None,
            show_progress: false,
        })
    }

    /// Show a spinner on stderr while requests are in flight.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("Token {t}"))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }

    /// Send a request and return the raw body text.
    fn fetch(&self, what: &str, req: RequestBuilder) -> Result<String, ApiError> {
        let spinner = self.spinner(what);
        let result = req.send().and_then(|res| {
            let status = res.status();
            res.text().map(|body| (status, body))
        });
        if let Some(s) = spinner {
            s.finish_and_clear();
        }
        let (status, body) = result?;
        debug!(%status, bytes = body.len(), "{what}");
        Ok(body)
    }

    fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<Reply<T>, ApiError> {
        let req = req.headers(self.auth_headers()?);
        let reply = Reply::from_body(&self.fetch(what, req)?)?;
        if let Reply::Failed(failure) = &reply {
            warn!(message = %failure.message, "{what} rejected by server");
        }
        Ok(reply)
    }

    fn get<T: DeserializeOwned>(&self, what: &str, path: &str) -> Result<Reply<T>, ApiError> {
        self.send(what, self.client.get(self.api_url(path)))
    }

    fn post<T: DeserializeOwned>(&self, what: &str, path: &str) -> Result<Reply<T>, ApiError> {
        self.send(what, self.client.post(self.api_url(path)))
    }
}

impl DrinkApi for ApiClient {
    fn login(&mut self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let req = self.client.post(url).form(&LoginRequest { username, password });
        let body = self.fetch("Logging in...", req)?;
        let resp: LoginResponse = serde_json::from_str(&body)?;
        match resp.token {
            Some(token) if !token.is_empty() => {
                self.set_token(&token);
                Ok(token)
            }
            _ => Err(ApiError::Auth),
        }
    }

    fn list_events(&self) -> Result<Reply<Vec<EventSummary>>, ApiError> {
        self.get("Fetching events...", "events/")
    }

    fn get_event(&self, id: u64) -> Result<Reply<Event>, ApiError> {
        self.get("Fetching event...", &format!("events/{id}/"))
    }

    fn create_event(&self, name: &str) -> Result<Reply<u64>, ApiError> {
        let req = self
            .client
            .post(self.api_url("events/"))
            .json(&NewEvent { name });
        let created: Reply<CreatedEvent> = self.send("Creating event...", req)?;
        Ok(created.map(|c| c.id))
    }

    fn join_event(&self, id: u64) -> Result<Reply<()>, ApiError> {
        let reply: Reply<IgnoredAny> = self.post("Joining event...", &format!("events/{id}/join/"))?;
        Ok(reply.map(|_| ()))
    }

    fn record_drink(&self, event_id: u64) -> Result<Reply<()>, ApiError> {
        let reply: Reply<IgnoredAny> = self.post(
            "Recording drink...",
            &format!("events/{event_id}/create_drinkevent/"),
        )?;
        Ok(reply.map(|_| ()))
    }

    fn list_users(&self) -> Result<Reply<Vec<User>>, ApiError> {
        self.get("Fetching users...", "users/")
    }
}

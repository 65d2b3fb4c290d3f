//! Authenticated handle to the remote service.
//!
//! # Design
//! A `Session` pairs a `Transport` with the endpoint map and the auth token
//! obtained at login. Every resource spawned from a user shares the same
//! session through `Rc`, so the handle is single-threaded by construction:
//! requests go out one at a time and nothing needs a lock.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Endpoints};
use crate::error::{classify_login, ApiError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Header carrying the session token on authenticated requests.
pub const AUTH_HEADER: &str = "X-Anydo-Auth";

/// Email and password the session was established with. Account removal
/// has to present them again.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    auth_token: String,
}

pub struct Session {
    transport: Rc<dyn Transport>,
    endpoints: Endpoints,
    auth_token: Option<String>,
    credentials: Option<Credentials>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints)
            .field("authenticated", &self.auth_token.is_some())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Session {
    /// A session without a token, for the few calls the service accepts
    /// unauthenticated (login, registration).
    pub fn anonymous(transport: Rc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            endpoints: config.endpoints(),
            auth_token: None,
            credentials: None,
        }
    }

    /// Resume a session from a token obtained elsewhere.
    pub fn with_auth_token(
        transport: Rc<dyn Transport>,
        config: &ClientConfig,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            auth_token: Some(auth_token.into()),
            ..Self::anonymous(transport, config)
        }
    }

    /// Authenticate with email and password.
    ///
    /// Rejected credentials (401/403) surface as `ApiError::Unauthorized`;
    /// no session is produced.
    pub fn login(
        transport: Rc<dyn Transport>,
        config: &ClientConfig,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        if email.is_empty() {
            return Err(ApiError::MissingArgument("email"));
        }
        if password.is_empty() {
            return Err(ApiError::MissingArgument("password"));
        }

        let session = Self::anonymous(transport, config);
        let request = HttpRequest::post(session.endpoints.login()).json_body(&LoginRequest {
            username: email,
            password,
        })?;
        let response = session.send(request)?;
        if !response.is_success() {
            let err = classify_login(&response);
            warn!(email, status = response.status, "login rejected");
            return Err(err);
        }
        let LoginResponse { auth_token } = response.json()?;
        info!(email, "session established");

        Ok(Self {
            auth_token: Some(auth_token),
            credentials: Some(Credentials {
                email: email.to_string(),
                password: password.to_string(),
            }),
            ..session
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Execute one request, attaching the auth token when there is one.
    /// Transport failures become `InternalServiceError`; status codes are
    /// left for the caller to classify.
    pub fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if let Some(token) = &self.auth_token {
            request = request.header(AUTH_HEADER, token.as_str());
        }
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(&request).map_err(|err| {
            warn!(method = %request.method, url = %request.url, error = %err, "transport failure");
            ApiError::from(err)
        })?;
        debug!(status = response.status, url = %request.url, "response received");
        Ok(response)
    }
}

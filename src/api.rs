// API client module: a small blocking HTTP client for the File Browser
// API. It performs the login call once and then one raw POST per file,
// streaming the file from disk.

use std::fmt;
use std::fs::File;
use std::time::Duration;

use reqwest::blocking::{Body, Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Serialize;

use crate::error::UploadError;
use crate::planner::UploadTask;
use crate::progress::ProgressReader;
use crate::ui;

/// Header read by File Browser >= 2.0.3. Older servers read `Authorization`.
const X_AUTH: &str = "x-auth";

/// Username and password sent to the login endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login request payload. The server requires `recaptcha` to be present
/// even though this client never solves a challenge.
#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    recaptcha: &'a str,
}

/// Session token returned by the login endpoint, kept verbatim.
///
/// It is sent under both `X-Auth` and `Authorization: Bearer` because the
/// server version on the other end is unknown.
#[derive(Clone)]
pub struct AuthToken {
    raw: String,
    headers: HeaderMap,
}

impl AuthToken {
    pub fn new(raw: String) -> Result<Self, UploadError> {
        let mut x_auth = HeaderValue::from_str(&raw).map_err(|_| UploadError::InvalidToken)?;
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {raw}")).map_err(|_| UploadError::InvalidToken)?;
        x_auth.set_sensitive(true);
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(X_AUTH), x_auth);
        headers.insert(AUTHORIZATION, bearer);
        Ok(AuthToken { raw, headers })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Headers attached to every authenticated request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Status line of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpStatus {
    pub code: u16,
    pub reason: String,
}

impl From<StatusCode> for HttpStatus {
    fn from(status: StatusCode) -> Self {
        HttpStatus {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

impl HttpStatus {
    /// Status line as the server sent it. hyper only keeps the phrase when
    /// it differs from the canonical one for the code.
    fn of(res: &Response) -> Self {
        let code = res.status();
        let reason = match res.extensions().get::<hyper::ext::ReasonPhrase>() {
            Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
            None => code.canonical_reason().unwrap_or("Unknown").to_string(),
        };
        HttpStatus {
            code: code.as_u16(),
            reason,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

/// The two remote calls the orchestrator needs.
pub trait Remote {
    /// Exchange credentials for a session token.
    fn login(&self, credentials: &Credentials) -> Result<AuthToken, UploadError>;

    /// Upload one planned file. A non-2xx answer is a normal `Ok` result;
    /// only local I/O and connection failures are errors.
    fn upload(
        &self,
        task: &UploadTask,
        token: &AuthToken,
        override_existing: bool,
        show_progress: bool,
    ) -> Result<HttpStatus, UploadError>;
}

/// Blocking client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for `base_url`. Certificate validation is only turned
    /// off when `insecure_tls` is set for this client.
    pub fn new(base_url: Url, insecure_tls: bool) -> Result<Self, UploadError> {
        // The blocking client defaults to a 30s timeout, which would cut
        // off large uploads.
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure_tls)
            .timeout(None::<Duration>)
            .build()?;
        Ok(ApiClient { client, base_url })
    }

    fn endpoint(&self, name: &str) -> Result<Url, UploadError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UploadError::ConfigInvalid(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }
}

impl Remote for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<AuthToken, UploadError> {
        let url = self.endpoint("login")?;
        let req = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
            recaptcha: "",
        };
        let res = self.client.post(url).json(&req).send()?;
        if !res.status().is_success() {
            let status = HttpStatus::of(&res);
            return Err(UploadError::AuthenticationFailed {
                username: credentials.username.clone(),
                status: status.code,
                reason: status.reason,
            });
        }
        let raw = res.text()?;
        tracing::debug!(user = %credentials.username, "login succeeded");
        AuthToken::new(raw)
    }

    fn upload(
        &self,
        task: &UploadTask,
        token: &AuthToken,
        override_existing: bool,
        show_progress: bool,
    ) -> Result<HttpStatus, UploadError> {
        let unreadable = |source| UploadError::FileUnreadable {
            path: task.local_path.clone(),
            source,
        };
        let file = File::open(&task.local_path).map_err(unreadable)?;
        let len = file.metadata().map_err(unreadable)?.len();

        // The file is closed when the body is dropped, whatever the outcome.
        let body = if show_progress {
            let reader = ProgressReader::new(file, len, Box::new(ui::transfer_bar(len)));
            Body::sized(reader, len)
        } else {
            Body::sized(file, len)
        };

        let override_param = if override_existing { "true" } else { "false" };
        let res = self
            .client
            .post(task.remote_url.clone())
            .query(&[("override", override_param)])
            .headers(token.headers().clone())
            .body(body)
            .send()?;

        let status = HttpStatus::of(&res);
        tracing::debug!(url = %task.remote_url, bytes = len, status = %status, "upload finished");
        Ok(status)
    }
}

// 🔐 Authenticated Fetch - Bearer token + CSRF header + silent refresh
//
// Request lifecycle (at most ONE refresh-and-retry per call):
//
//   Sent ──(status != 401)──────────────────────────────▶ Done
//     │
//     └─(401)─▶ Unauthorized ─▶ Refreshing ─(new token)─▶ Retried
//                                   │
//                                   └─(rejected / no token)─▶ RefreshFailed
//
// - Retried: whatever the retry returned is handed back, even another 401
// - RefreshFailed: token store cleared, the ORIGINAL 401 is handed back
// - Transport failures of the request itself propagate as ApiError
//
// Concurrent 401s are not de-duplicated: each caller refreshes on its own
// and the last refresh to finish wins the token store.

use crate::config::ClientConfig;
use crate::environment::resolve_base_url;
use crate::error::{ApiError, ApiResult};
use crate::token_store::TokenStore;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Endpoint exchanging the session cookie for a new access token
pub const REFRESH_PATH: &str = "/usuario/refresh";

// ============================================================================
// REQUEST DESCRIPTION
// ============================================================================

/// Whether the cookie jar travels with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    /// Send cookies (session + CSRF) - the default
    #[default]
    Include,

    /// Send no cookies at all
    Omit,
}

/// Everything needed to (re)issue a request
///
/// Kept as plain data so the exact same request can be replayed after a
/// token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,

    /// Absolute URL, or a path joined with the resolved base URL
    pub path: String,

    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub credentials: CredentialsMode,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            credentials: CredentialsMode::Include,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Builder pattern: JSON body (sets Content-Type)
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Builder pattern: extra header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Builder pattern: credential inclusion
    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = mode;
        self
    }
}

// ============================================================================
// FETCH OUTCOME
// ============================================================================

/// Terminal state of one `execute` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// First response was not a 401
    Done,

    /// Token refreshed, request replayed once
    Retried,

    /// Refresh rejected or unusable, original 401 returned
    RefreshFailed,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub state: FetchState,
}

impl FetchOutcome {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }
}

/// Why a refresh did not produce a token
#[derive(Debug, Clone, PartialEq, Eq)]
enum RefreshFailure {
    Rejected(StatusCode),
    NoUsableToken,
    Transport(String),
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailure::Rejected(status) => write!(f, "refresh rejected with {}", status),
            RefreshFailure::NoUsableToken => write!(f, "refresh response carried no access token"),
            RefreshFailure::Transport(msg) => write!(f, "refresh request failed: {}", msg),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
}

// ============================================================================
// AUTHENTICATED CLIENT
// ============================================================================

/// HTTP client that attaches credentials and recovers from expired tokens
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    anonymous: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    tokens: TokenStore,
    csrf_cookie: String,
    csrf_header: HeaderName,
}

impl AuthenticatedClient {
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> ApiResult<Self> {
        let jar = Arc::new(Jar::default());

        let mut with_cookies = reqwest::Client::builder().cookie_provider(jar.clone());
        let mut without_cookies = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            with_cookies = with_cookies.timeout(timeout);
            without_cookies = without_cookies.timeout(timeout);
        }

        let csrf_header = HeaderName::from_bytes(config.csrf_header.as_bytes())
            .map_err(|_| ApiError::InvalidHeader(config.csrf_header.clone()))?;

        Ok(AuthenticatedClient {
            http: with_cookies.build()?,
            anonymous: without_cookies.build()?,
            jar,
            base_url: resolve_base_url(config),
            tokens,
            csrf_cookie: config.csrf_cookie.clone(),
            csrf_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Seed the cookie jar (e.g. with a session cookie captured elsewhere)
    pub fn add_cookie(&self, cookie: &str, url: &Url) {
        self.jar.add_cookie_str(cookie, url);
    }

    /// Absolute URL passthrough, otherwise join with the base URL
    pub fn resolve_url(&self, path: &str) -> ApiResult<Url> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { url: raw, source })
    }

    /// Anti-forgery token from the cookie jar, if one applies to `url`
    pub fn csrf_token(&self, url: &Url) -> Option<String> {
        let cookies = self.jar.cookies(url)?;
        let cookies = cookies.to_str().ok()?;

        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.csrf_cookie)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Send and return the final response
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<Response> {
        Ok(self.execute(request).await?.response)
    }

    /// Send, refreshing the access token once on 401
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult<FetchOutcome> {
        let url = self.resolve_url(&request.path)?;

        let headers = self.build_headers(request, &url)?;
        debug!(method = %request.method, url = %url, "sending request");
        let first = self.dispatch(request, &url, headers).await?;

        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(FetchOutcome {
                response: first,
                state: FetchState::Done,
            });
        }

        info!(url = %url, "access token rejected, refreshing");
        match self.refresh().await? {
            Ok(token) => {
                self.tokens.set_token(Some(token));

                let headers = self.build_headers(request, &url)?;
                debug!(method = %request.method, url = %url, "replaying request after refresh");
                let retried = self.dispatch(request, &url, headers).await?;

                Ok(FetchOutcome {
                    response: retried,
                    state: FetchState::Retried,
                })
            }
            Err(failure) => {
                warn!(%failure, "token refresh failed, clearing access token");
                self.tokens.clear_token();

                Ok(FetchOutcome {
                    response: first,
                    state: FetchState::RefreshFailed,
                })
            }
        }
    }

    /// Send once with credentials attached, never refreshing
    ///
    /// For the auth endpoints themselves, where a 401 means "wrong
    /// password" rather than "expired token".
    pub async fn send_without_refresh(&self, request: &ApiRequest) -> ApiResult<Response> {
        let url = self.resolve_url(&request.path)?;
        let headers = self.build_headers(request, &url)?;
        debug!(method = %request.method, url = %url, "sending request (no refresh)");
        self.dispatch(request, &url, headers).await
    }

    fn build_headers(&self, request: &ApiRequest, url: &Url) -> ApiResult<HeaderMap> {
        let mut headers = request.headers.clone();

        if let Some(token) = self.tokens.get_token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidHeader("Authorization".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        if !headers.contains_key(&self.csrf_header) {
            if let Some(value) = self.csrf_header_value(url) {
                headers.insert(self.csrf_header.clone(), value);
            }
        }

        Ok(headers)
    }

    fn csrf_header_value(&self, url: &Url) -> Option<HeaderValue> {
        self.csrf_token(url)
            .and_then(|token| HeaderValue::from_str(&token).ok())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &Url,
        headers: HeaderMap,
    ) -> ApiResult<Response> {
        let client = match request.credentials {
            CredentialsMode::Include => &self.http,
            CredentialsMode::Omit => &self.anonymous,
        };

        let mut builder = client
            .request(request.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder.send().await?)
    }

    /// One round-trip to the refresh endpoint
    ///
    /// Outer error: the refresh URL itself is unusable (configuration bug).
    /// Inner error: the backend would not hand out a token.
    async fn refresh(&self) -> ApiResult<Result<String, RefreshFailure>> {
        let url = self.resolve_url(REFRESH_PATH)?;

        let mut headers = HeaderMap::new();
        if let Some(value) = self.csrf_header_value(&url) {
            headers.insert(self.csrf_header.clone(), value);
        }

        let response = match self.http.post(url).headers(headers).send().await {
            Ok(response) => response,
            Err(err) => return Ok(Err(RefreshFailure::Transport(err.to_string()))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(Err(RefreshFailure::Rejected(status)));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => return Ok(Err(RefreshFailure::Transport(err.to_string()))),
        };

        let token = serde_json::from_slice::<RefreshResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.access_token)
            .filter(|token| !token.trim().is_empty());

        match token {
            Some(token) => {
                info!("access token refreshed");
                Ok(Ok(token))
            }
            None => Ok(Err(RefreshFailure::NoUsableToken)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

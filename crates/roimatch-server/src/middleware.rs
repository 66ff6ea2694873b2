//! Request ids, bearer-token auth, and per-client rate limiting for the
//! `/api/v1` routes.

use std::{
    collections::{HashMap, HashSet},
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use roimatch_core::Environment;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Expired client windows are swept once this many clients are tracked.
const SWEEP_THRESHOLD: usize = 4096;

/// Request ID stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepted API keys. An empty set means auth is off.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
}

impl AuthState {
    /// Auth for the given environment. Development may run without keys;
    /// anywhere else an empty key list is a startup error.
    ///
    /// # Errors
    ///
    /// Returns an error when `keys` is empty outside development.
    pub fn new(keys: &[String], env: Environment) -> anyhow::Result<Self> {
        if !keys.is_empty() {
            return Ok(Self::with_keys(keys));
        }
        if env == Environment::Development {
            tracing::warn!("ROIMATCH_API_KEYS not set; API auth is off in development");
            return Ok(Self::disabled());
        }
        anyhow::bail!("ROIMATCH_API_KEYS must be set when ROIMATCH_ENV is {env}")
    }

    #[must_use]
    pub fn with_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            api_keys: Arc::new(
                keys.iter()
                    .map(|k| k.as_ref().trim())
                    .filter(|k| !k.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_keys: Arc::new(HashSet::new()),
        }
    }

    fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn accepts(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| self.api_keys.contains(token))
    }
}

/// Who a request is counted against. Behind auth the key identifies the
/// caller; otherwise the peer address does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ClientKey {
    ApiKey(String),
    Peer(IpAddr),
    Anonymous,
}

impl ClientKey {
    fn of(req: &Request) -> Self {
        if let Some(token) = bearer_token(req.headers()) {
            return ClientKey::ApiKey(token.to_owned());
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(ClientKey::Anonymous, |ConnectInfo(addr)| {
                ClientKey::Peer(addr.ip())
            })
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Never log the key itself.
            ClientKey::ApiKey(_) => f.write_str("api-key"),
            ClientKey::Peer(ip) => write!(f, "{ip}"),
            ClientKey::Anonymous => f.write_str("anonymous"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

/// Fixed-window request budget, tracked separately for each client.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<ClientKey, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    async fn admit(&self, client: &ClientKey, now: Instant) -> Admission {
        let mut clients = self.clients.lock().await;
        if clients.len() >= SWEEP_THRESHOLD {
            clients.retain(|_, w| now.duration_since(w.started_at) < self.window);
        }

        let fresh = Window {
            started_at: now,
            count: 0,
        };
        let window = clients.entry(client.clone()).or_insert(fresh);
        let elapsed = now.duration_since(window.started_at);
        if elapsed >= self.window {
            *window = fresh;
        }

        if window.count >= self.max_requests {
            return Admission::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }
        window.count += 1;
        Admission::Allowed
    }
}

fn reject(req: &Request, code: &str, message: &str) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    ApiError::new(request_id, code, message).into_response()
}

/// Uses a well-formed incoming `x-request-id` or generates a `UUIDv4`,
/// stores it as a [`RequestId`] extension, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() || auth.accepts(req.headers()) {
        return next.run(req).await;
    }
    tracing::debug!(path = %req.uri().path(), "rejected request without a valid api key");
    reject(&req, "unauthorized", "missing or invalid bearer token")
}

pub async fn enforce_rate_limit(
    State(limiter): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = ClientKey::of(&req);
    match limiter.admit(&client, Instant::now()).await {
        Admission::Allowed => next.run(req).await,
        Admission::Limited { retry_after } => {
            tracing::warn!(%client, path = %req.uri().path(), "rate limit exceeded");
            let mut res = reject(&req, "rate_limited", "rate limit exceeded");
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs.max(1)));
            res
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_requires_the_bearer_scheme() {
        assert_eq!(
            bearer_token(&headers_with_auth("Bearer  key-1 ")),
            Some("key-1")
        );
        assert_eq!(bearer_token(&headers_with_auth("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn keys_are_optional_only_in_development() {
        let dev = AuthState::new(&[], Environment::Development).expect("dev without keys");
        assert!(!dev.is_enabled());
        assert!(AuthState::new(&[], Environment::Test).is_err());
        assert!(AuthState::new(&[], Environment::Production).is_err());

        let prod = AuthState::new(&["key-1".to_string()], Environment::Production).expect("keys");
        assert!(prod.is_enabled());
        assert!(prod.accepts(&headers_with_auth("Bearer key-1")));
        assert!(!prod.accepts(&headers_with_auth("Bearer key-2")));
    }

    #[test]
    fn client_key_display_hides_api_keys() {
        assert_eq!(ClientKey::ApiKey("secret".to_string()).to_string(), "api-key");
        assert_eq!(
            ClientKey::Peer(IpAddr::from([10, 0, 0, 1])).to_string(),
            "10.0.0.1"
        );
    }

    #[tokio::test]
    async fn each_client_gets_its_own_budget() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        let alice = ClientKey::ApiKey("alice".to_string());
        let bob = ClientKey::ApiKey("bob".to_string());
        let now = Instant::now();

        assert_eq!(limiter.admit(&alice, now).await, Admission::Allowed);
        assert_eq!(limiter.admit(&alice, now).await, Admission::Allowed);
        assert!(matches!(
            limiter.admit(&alice, now).await,
            Admission::Limited { .. }
        ));
        assert_eq!(limiter.admit(&bob, now).await, Admission::Allowed);
        assert_eq!(
            limiter.admit(&ClientKey::Anonymous, now).await,
            Admission::Allowed
        );
    }

    #[tokio::test]
    async fn budget_resets_when_the_window_elapses() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let client = ClientKey::Peer(IpAddr::from([127, 0, 0, 1]));
        let start = Instant::now();

        assert_eq!(limiter.admit(&client, start).await, Admission::Allowed);
        assert_eq!(
            limiter.admit(&client, start + Duration::from_secs(45)).await,
            Admission::Limited {
                retry_after: Duration::from_secs(15)
            }
        );
        assert_eq!(
            limiter.admit(&client, start + Duration::from_secs(60)).await,
            Admission::Allowed
        );
    }

    #[tokio::test]
    async fn expired_clients_are_swept() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..SWEEP_THRESHOLD {
            let client = ClientKey::ApiKey(format!("key-{i}"));
            limiter.admit(&client, start).await;
        }
        assert_eq!(limiter.clients.lock().await.len(), SWEEP_THRESHOLD);

        let later = start + Duration::from_secs(61);
        limiter.admit(&ClientKey::Anonymous, later).await;
        assert_eq!(limiter.clients.lock().await.len(), 1);
    }
}

//! Per-request access decision for the documentation routes.
//!
//! The flow for a single request is:
//!
//! ```text
//! Received -> path protected? --no--> Allow
//!          -> token present?  --no--> RedirectToLogin
//!          -> guard accepts?  --no--> RedirectToLogin
//!          -> bare docs path? --yes-> RedirectToCanonical
//!          -> Allow
//! ```
//!
//! The only suspension point is the guard call.

use super::{
    config::SwaggerProtectOptions,
    cookies::CookieHandler,
    error::{GuardError, GuardResult},
    login::BACK_URL_PARAM,
    pattern::UI_INDEX_SUFFIX,
};
use crate::handler::{Request, RequestExt};
use hyper::{HeaderMap, Method};
use log::{debug, error, warn};
use std::{fmt::Write, sync::Arc};

/// Outcome of [`AccessDecisionEngine::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Serve the requested resource.
    Allow,
    /// Authorized request for the bare docs path; go to the UI index.
    RedirectToCanonical(String),
    /// Missing or rejected token; go to the login path with `backUrl`.
    RedirectToLogin(String),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectToCanonical(url) | Decision::RedirectToLogin(url) => Some(url),
        }
    }
}

/// Borrowed view of the parts of a request the engine looks at.
#[derive(Debug, Clone, Copy)]
pub struct IncomingRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    /// Path and query exactly as requested.
    pub path_and_query: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> From<&'a Request> for IncomingRequest<'a> {
    fn from(req: &'a Request) -> Self {
        Self {
            method: req.method(),
            path: req.uri().path(),
            path_and_query: req.path_and_query(),
            headers: req.headers(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessDecisionEngine {
    options: Arc<SwaggerProtectOptions>,
}

impl AccessDecisionEngine {
    pub fn new(options: Arc<SwaggerProtectOptions>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SwaggerProtectOptions {
        &self.options
    }

    pub async fn decide(&self, request: &IncomingRequest<'_>) -> Decision {
        let options = &self.options;

        if !options.swagger_path().matches(request.path) {
            return Decision::Allow;
        }

        let Some(token) = CookieHandler::get_cookie_value(request.headers, options.cookie_key())
        else {
            debug!("{} {}: no session cookie", request.method, request.path);
            return self.login_redirect(request);
        };

        if !self.validate(&token).await {
            debug!("{} {}: session token rejected", request.method, request.path);
            return self.login_redirect(request);
        }

        if options.is_docs_root(request.path) {
            // `./api/...` resolved against `/api/` would point below the mount
            let target = if request.path.ends_with('/') {
                format!(".{UI_INDEX_SUFFIX}")
            } else {
                options.canonical_url().to_string()
            };
            return Decision::RedirectToCanonical(target);
        }

        Decision::Allow
    }

    /// Runs the guard, failing closed on errors and timeouts.
    async fn validate(&self, token: &str) -> bool {
        match self.check(token).await {
            Ok(valid) => valid,
            Err(e @ GuardError::Timeout(_)) => {
                warn!("swagger guard: {}", e);
                false
            }
            Err(e) => {
                error!("swagger guard failed: {}", e);
                false
            }
        }
    }

    /// Guard call bounded by the configured timeout.
    async fn check(&self, token: &str) -> GuardResult<bool> {
        let check = self.options.guard().can_activate(token);

        match self.options.guard_timeout() {
            Some(limit) => tokio::time::timeout(limit, check)
                .await
                .unwrap_or_else(|_| Err(GuardError::Timeout(limit))),
            None => check.await,
        }
    }

    fn login_redirect(&self, request: &IncomingRequest<'_>) -> Decision {
        Decision::RedirectToLogin(login_location(
            self.options.login_path(),
            request.path_and_query,
        ))
    }
}

/// `login_path?backUrl=<back_url>`, escaping only what would break the value.
pub(crate) fn login_location(login_path: &str, back_url: &str) -> String {
    let mut location = String::with_capacity(login_path.len() + back_url.len() + 9);
    location.push_str(login_path);
    location.push('?');
    location.push_str(BACK_URL_PARAM);
    location.push('=');
    encode_back_url(&mut location, back_url);
    location
}

fn encode_back_url(out: &mut String, value: &str) {
    for b in value.bytes() {
        match b {
            b'&' | b'#' | b'%' | b'+' | b' ' | b'"' | b'<' | b'>' | b'\\' | b'^' | b'`'
            | b'{' | b'|' | b'}' => {
                let _ = write!(out, "%{b:02X}");
            }
            b if b.is_ascii_graphic() => out.push(b as char),
            b => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::{
        SwaggerProtect,
        guard::{SwaggerGuard, async_guard_fn, guard_fn},
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use hyper::header::COOKIE;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    const TOKEN: &str = "3f6c1a52-4d1e-4a0f-9a51-0c6a3e6f2b11";

    fn engine(guard: impl SwaggerGuard + 'static) -> AccessDecisionEngine {
        SwaggerProtect::builder()
            .cookie_key("swagger_key")
            .login_path("/login-me")
            .guard(guard)
            .build()
            .unwrap()
            .engine()
    }

    fn valid_only() -> impl SwaggerGuard + 'static {
        guard_fn(|token| token == TOKEN)
    }

    fn request(uri: &str, cookie: Option<&str>) -> Request {
        let mut builder = hyper::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Bytes::new()).unwrap()
    }

    async fn decide(engine: &AccessDecisionEngine, uri: &str, cookie: Option<&str>) -> Decision {
        let req = request(uri, cookie);
        engine.decide(&IncomingRequest::from(&req)).await
    }

    #[tokio::test]
    async fn unprotected_paths_pass_through() {
        let engine = engine(valid_only());

        for uri in ["/cats", "/login-me", "/api/cats", "/"] {
            assert_eq!(decide(&engine, uri, None).await, Decision::Allow);
        }
    }

    #[tokio::test]
    async fn missing_cookie_redirects_to_login() {
        let engine = engine(valid_only());

        for path in ["/api", "/api/json", "/api/static/index.html"] {
            assert_eq!(
                decide(&engine, path, None).await,
                Decision::RedirectToLogin(format!("/login-me?backUrl={path}"))
            );
        }
    }

    #[tokio::test]
    async fn back_url_keeps_query() {
        let engine = engine(valid_only());

        assert_eq!(
            decide(&engine, "/api/json?tag=cats&v=2", None).await,
            Decision::RedirectToLogin("/login-me?backUrl=/api/json?tag=cats%26v=2".to_string())
        );
    }

    #[tokio::test]
    async fn rejected_token_looks_like_missing_cookie() {
        let engine = engine(valid_only());

        let missing = decide(&engine, "/api/static/index.html", None).await;
        for token in ["random", "other-uuid", "x"] {
            let cookie = format!("swagger_key={token}");
            assert_eq!(
                decide(&engine, "/api/static/index.html", Some(&cookie)).await,
                missing
            );
        }
    }

    #[tokio::test]
    async fn valid_token_is_allowed() {
        let engine = engine(valid_only());
        let cookie = format!("lang=en; swagger_key={TOKEN}");

        assert_eq!(
            decide(&engine, "/api/json", Some(&cookie)).await,
            Decision::Allow
        );
        assert_eq!(
            decide(&engine, "/api/static/index.html", Some(&cookie)).await,
            Decision::Allow
        );
    }

    #[tokio::test]
    async fn valid_token_on_docs_root_is_normalized() {
        let engine = engine(valid_only());
        let cookie = format!("swagger_key={TOKEN}");

        assert_eq!(
            decide(&engine, "/api", Some(&cookie)).await,
            Decision::RedirectToCanonical("./api/static/index.html".to_string())
        );
    }

    #[tokio::test]
    async fn docs_root_with_trailing_slash_stays_under_the_mount() {
        let engine = engine(valid_only());
        let cookie = format!("swagger_key={TOKEN}");

        // relative to `/api/`, this resolves to `/api/static/index.html`
        assert_eq!(
            decide(&engine, "/api/", Some(&cookie)).await,
            Decision::RedirectToCanonical("./static/index.html".to_string())
        );
    }

    #[tokio::test]
    async fn empty_or_malformed_cookie_is_no_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine(guard_fn({
            let calls = calls.clone();
            move |_: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        }));

        for cookie in ["swagger_key=", ";;;", "swagger_key", "=abc"] {
            assert!(matches!(
                decide(&engine, "/api/json", Some(cookie)).await,
                Decision::RedirectToLogin(_)
            ));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn guard_is_not_called_for_unprotected_paths() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine(guard_fn({
            let calls = calls.clone();
            move |_: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        }));

        decide(&engine, "/cats", Some("swagger_key=abc")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn guard_failure_fails_closed() {
        let engine = engine(async_guard_fn(|_token: String| async {
            Err(GuardError::msg("session store unreachable"))
        }));

        assert_eq!(
            decide(&engine, "/api/json", Some("swagger_key=abc")).await,
            Decision::RedirectToLogin("/login-me?backUrl=/api/json".to_string())
        );
    }

    struct SlowGuard;

    #[async_trait]
    impl SwaggerGuard for SlowGuard {
        async fn can_activate(&self, _token: &str) -> GuardResult<bool> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(true)
        }
    }

    fn slow_engine() -> AccessDecisionEngine {
        SwaggerProtect::builder()
            .login_path("/login-me")
            .guard(SlowGuard)
            .guard_timeout(Duration::from_millis(50))
            .build()
            .unwrap()
            .engine()
    }

    #[tokio::test(start_paused = true)]
    async fn guard_timeout_fails_closed() {
        let engine = slow_engine();

        assert!(matches!(
            decide(&engine, "/api/json", Some("swagger_key=abc")).await,
            Decision::RedirectToLogin(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn guard_timeout_is_reported_as_timeout() {
        let engine = slow_engine();

        let err = engine.check("abc").await.unwrap_err();
        assert!(matches!(err, GuardError::Timeout(limit) if limit == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn concurrent_decisions_do_not_serialize() {
        let engine = engine(async_guard_fn(|token: String| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(token == TOKEN)
        }));

        let cookie = format!("swagger_key={TOKEN}");
        let started = std::time::Instant::now();
        let decisions = futures_util::future::join_all(
            (0..20).map(|_| decide(&engine, "/api/json", Some(&cookie))),
        )
        .await;

        assert!(decisions.iter().all(Decision::is_allow));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn back_url_encoding() {
        assert_eq!(
            login_location("/login-me", "/api/json"),
            "/login-me?backUrl=/api/json"
        );
        assert_eq!(
            login_location("/login", "/api/json?q=a b&x=1#frag"),
            "/login?backUrl=/api/json?q=a%20b%26x=1%23frag"
        );
        assert_eq!(
            login_location("/login", "/api/json?q=100%+é"),
            "/login?backUrl=/api/json?q=100%25%2B%C3%A9"
        );
    }

    #[test]
    fn decision_location() {
        assert_eq!(Decision::Allow.location(), None);
        assert_eq!(
            Decision::RedirectToLogin("/login".into()).location(),
            Some("/login")
        );
    }
}

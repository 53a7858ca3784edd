use super::{
    config::SwaggerProtectOptions,
    cookies::CookieHandler,
    decision::login_location,
    error::GuardResult,
    pattern::{JSON_SUFFIX, UI_INDEX_SUFFIX},
};
use crate::handler::{Handler, Request, RequestExt, Response};
use async_trait::async_trait;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::Arc;

/// Name of the query parameter carrying the originally requested URL.
pub const BACK_URL_PARAM: &str = "backUrl";

/// Credentials submitted to the login path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
}

impl LoginCredentials {
    /// Reads credentials from a JSON or form-urlencoded body.
    pub fn from_request(req: &Request) -> Option<Self> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            return serde_json::from_slice(req.body()).ok();
        }

        let mut login = None;
        let mut password = None;
        for (key, value) in req.form_fields() {
            match key.as_str() {
                "login" => login = Some(value),
                "password" => password = Some(value),
                _ => {}
            }
        }

        Some(Self {
            login: login?,
            password: password?,
        })
    }
}

/// Integrator-supplied login: exchanges credentials for a session token the
/// guard will later accept. `Ok(None)` means the credentials were refused.
#[async_trait]
pub trait SwaggerLogin: Send + Sync {
    async fn log_in(&self, credentials: LoginCredentials) -> GuardResult<Option<String>>;
}

/// Handler an integrator may mount on the login path.
///
/// On success it sets the session cookie and sends the client back to
/// `backUrl`; otherwise it sends them back to the login path.
#[derive(Clone)]
pub struct LoginHandler {
    options: Arc<SwaggerProtectOptions>,
    log_in: Arc<dyn SwaggerLogin>,
}

impl LoginHandler {
    pub(crate) fn new(options: Arc<SwaggerProtectOptions>, log_in: Arc<dyn SwaggerLogin>) -> Self {
        Self { options, log_in }
    }

    /// Where to send the client after logging in. Only local absolute paths
    /// are honoured.
    fn back_url(&self, req: &Request) -> String {
        req.query_param(BACK_URL_PARAM)
            .filter(|url| is_local_path(url))
            .unwrap_or_else(|| {
                let suffix = if self.options.use_ui() {
                    UI_INDEX_SUFFIX
                } else {
                    JSON_SUFFIX
                };
                format!("{}{}", self.options.docs_path(), suffix)
            })
    }

    fn retry(&self, res: &mut Response, back_url: &str) {
        let location = login_location(self.options.login_path(), back_url);
        redirect_or_login(res, &location, self.options.login_path());
    }
}

#[async_trait]
impl Handler for LoginHandler {
    async fn call(&self, req: &Request, res: &mut Response) {
        let back_url = self.back_url(req);

        let Some(credentials) = LoginCredentials::from_request(req) else {
            warn!("login request without credentials");
            self.retry(res, &back_url);
            return;
        };

        let login = credentials.login.clone();
        match self.log_in.log_in(credentials).await {
            Ok(Some(token)) => {
                let cookie = CookieHandler::create_session_cookie(
                    self.options.cookie_key(),
                    &token,
                    self.options.secure_cookies(),
                );
                if let Err(e) = res.cookie(&cookie) {
                    error!("session cookie rejected: {}", e);
                    self.retry(res, &back_url);
                    return;
                }
                info!("swagger login succeeded for `{}`", login);
                redirect_or_login(res, &back_url, self.options.login_path());
            }
            Ok(None) => {
                info!("swagger login refused for `{}`", login);
                self.retry(res, &back_url);
            }
            Err(e) => {
                error!("swagger login capability failed: {}", e);
                self.retry(res, &back_url);
            }
        }
    }
}

/// Handler clearing the session cookie, then redirecting to the login path.
#[derive(Debug, Clone)]
pub struct LogoutHandler {
    cookie_key: String,
    login_path: String,
}

impl LogoutHandler {
    pub(crate) fn new(options: &SwaggerProtectOptions) -> Self {
        Self {
            cookie_key: options.cookie_key().to_string(),
            login_path: options.login_path().to_string(),
        }
    }
}

#[async_trait]
impl Handler for LogoutHandler {
    async fn call(&self, _req: &Request, res: &mut Response) {
        if let Err(e) = res.cookie(&CookieHandler::create_logout_cookie(&self.cookie_key)) {
            error!("logout cookie rejected: {}", e);
        }
        redirect_or_login(res, &self.login_path, &self.login_path);
    }
}

fn redirect_or_login(res: &mut Response, location: &str, login_path: &str) {
    if res.redirect(location).is_err() {
        // login_path is checked to be a valid header value at build time
        let fallback = HeaderValue::from_str(login_path)
            .unwrap_or_else(|_| HeaderValue::from_static("/"));
        res.redirect_to(fallback);
    }
}

fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::{SwaggerProtect, error::GuardError, guard::guard_fn};
    use bytes::Bytes;
    use hyper::{
        Method, StatusCode,
        header::{LOCATION, SET_COOKIE},
    };

    struct StaticLogin;

    #[async_trait]
    impl SwaggerLogin for StaticLogin {
        async fn log_in(&self, credentials: LoginCredentials) -> GuardResult<Option<String>> {
            match (credentials.login.as_str(), credentials.password.as_str()) {
                ("admin", "hunter2") => Ok(Some("token-1".to_string())),
                ("broken", _) => Err(GuardError::msg("directory down")),
                _ => Ok(None),
            }
        }
    }

    fn handler() -> LoginHandler {
        SwaggerProtect::builder()
            .login_path("/login-me")
            .guard(guard_fn(|token| token == "token-1"))
            .log_in(StaticLogin)
            .build()
            .unwrap()
            .login_handler()
            .unwrap()
    }

    fn post(uri: &str, content_type: &'static str, body: &'static str) -> Request {
        hyper::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    async fn submit(req: Request) -> hyper::Response<http_body_util::Full<Bytes>> {
        let mut res = Response::new();
        handler().call(&req, &mut res).await;
        res.into_hyper()
    }

    #[tokio::test]
    async fn success_sets_cookie_and_returns_to_back_url() {
        let res = submit(post(
            "/login-me?backUrl=/api/json",
            "application/x-www-form-urlencoded",
            "login=admin&password=hunter2",
        ))
        .await;

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/api/json");
        let cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("swagger_key=token-1"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn json_body_is_accepted() {
        let res = submit(post(
            "/login-me",
            "application/json",
            r#"{"login":"admin","password":"hunter2"}"#,
        ))
        .await;

        assert_eq!(
            res.headers().get(LOCATION).unwrap(),
            "/api/static/index.html"
        );
    }

    #[tokio::test]
    async fn refused_credentials_go_back_to_login() {
        let res = submit(post(
            "/login-me?backUrl=/api/json",
            "application/x-www-form-urlencoded",
            "login=admin&password=wrong",
        ))
        .await;

        assert_eq!(
            res.headers().get(LOCATION).unwrap(),
            "/login-me?backUrl=/api/json"
        );
        assert!(res.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn capability_failure_goes_back_to_login() {
        let res = submit(post(
            "/login-me",
            "application/x-www-form-urlencoded",
            "login=broken&password=x",
        ))
        .await;

        assert_eq!(
            res.headers().get(LOCATION).unwrap(),
            "/login-me?backUrl=/api/static/index.html"
        );
    }

    #[tokio::test]
    async fn external_back_url_is_ignored() {
        let res = submit(post(
            "/login-me?backUrl=//evil.example/steal",
            "application/x-www-form-urlencoded",
            "login=admin&password=hunter2",
        ))
        .await;

        assert_eq!(
            res.headers().get(LOCATION).unwrap(),
            "/api/static/index.html"
        );
    }

    #[tokio::test]
    async fn missing_credentials() {
        let res = submit(post("/login-me", "application/x-www-form-urlencoded", "login=admin")).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert!(res.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let protect = SwaggerProtect::builder()
            .login_path("/login-me")
            .guard(guard_fn(|_| true))
            .build()
            .unwrap();

        let req = post("/logout", "text/plain", "");
        let mut res = Response::new();
        protect.logout_handler().call(&req, &mut res).await;
        let res = res.into_hyper();

        assert_eq!(res.headers().get(LOCATION).unwrap(), "/login-me");
        let cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }
}

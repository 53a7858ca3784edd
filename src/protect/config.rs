use super::{
    SwaggerProtect,
    error::ConfigError,
    guard::SwaggerGuard,
    login::SwaggerLogin,
    pattern::{JSON_SUFFIX, SwaggerPath, UI_INDEX_SUFFIX, trim_trailing_slash},
};
use hyper::header::HeaderValue;
use std::{fmt, sync::Arc, time::Duration};

pub const DEFAULT_COOKIE_KEY: &str = "swagger_key";
pub const DEFAULT_LOGIN_PATH: &str = "/login-api";
pub const DEFAULT_DOCS_PATH: &str = "/api";

/// Validated, read-only settings shared by every request.
///
/// Only obtainable through [`SwaggerProtectBuilder::build`].
pub struct SwaggerProtectOptions {
    cookie_key: String,
    login_path: String,
    swagger_path: SwaggerPath,
    docs_path: String,
    canonical_url: String,
    guard: Arc<dyn SwaggerGuard>,
    log_in: Option<Arc<dyn SwaggerLogin>>,
    use_ui: bool,
    secure_cookies: bool,
    guard_timeout: Option<Duration>,
}

impl SwaggerProtectOptions {
    /// Name of the cookie carrying the session token
    pub fn cookie_key(&self) -> &str {
        &self.cookie_key
    }

    /// Path unauthenticated requests are redirected to
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn swagger_path(&self) -> &SwaggerPath {
        &self.swagger_path
    }

    /// Mount point of the documentation, without trailing slash
    pub fn docs_path(&self) -> &str {
        &self.docs_path
    }

    /// Relative location a bare docs path is normalized to, e.g.
    /// `./api/static/index.html` for `/api`.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn guard(&self) -> &Arc<dyn SwaggerGuard> {
        &self.guard
    }

    pub fn log_in(&self) -> Option<&Arc<dyn SwaggerLogin>> {
        self.log_in.as_ref()
    }

    pub fn use_ui(&self) -> bool {
        self.use_ui
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub fn guard_timeout(&self) -> Option<Duration> {
        self.guard_timeout
    }

    /// True when `path` is the bare docs mount point.
    pub fn is_docs_root(&self, path: &str) -> bool {
        trim_trailing_slash(path) == self.docs_path
    }
}

impl fmt::Debug for SwaggerProtectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaggerProtectOptions")
            .field("cookie_key", &self.cookie_key)
            .field("login_path", &self.login_path)
            .field("swagger_path", &self.swagger_path)
            .field("docs_path", &self.docs_path)
            .field("guard", &"<guard>")
            .field("log_in", &self.log_in.as_ref().map(|_| "<login>"))
            .field("use_ui", &self.use_ui)
            .field("secure_cookies", &self.secure_cookies)
            .field("guard_timeout", &self.guard_timeout)
            .finish()
    }
}

/// Builder for [`SwaggerProtect`]
pub struct SwaggerProtectBuilder {
    cookie_key: String,
    login_path: String,
    swagger_path: Option<SwaggerPath>,
    swagger_pattern: Option<String>,
    docs_path: String,
    guard: Option<Arc<dyn SwaggerGuard>>,
    log_in: Option<Arc<dyn SwaggerLogin>>,
    use_ui: bool,
    secure_cookies: bool,
    guard_timeout: Option<Duration>,
}

impl SwaggerProtectBuilder {
    pub fn new() -> Self {
        Self {
            cookie_key: DEFAULT_COOKIE_KEY.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            swagger_path: None,
            swagger_pattern: None,
            docs_path: DEFAULT_DOCS_PATH.to_string(),
            guard: None,
            log_in: None,
            use_ui: true,
            secure_cookies: false,
            guard_timeout: None,
        }
    }

    pub fn cookie_key(mut self, key: impl Into<String>) -> Self {
        self.cookie_key = key.into();
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Defaults to `SwaggerPath::Exact(docs_path)` when unset.
    pub fn swagger_path(mut self, path: impl Into<SwaggerPath>) -> Self {
        self.swagger_path = Some(path.into());
        self.swagger_pattern = None;
        self
    }

    /// Regex source compiled during `build`.
    pub fn swagger_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.swagger_pattern = Some(pattern.into());
        self.swagger_path = None;
        self
    }

    pub fn docs_path(mut self, path: impl Into<String>) -> Self {
        self.docs_path = path.into();
        self
    }

    pub fn guard(self, guard: impl SwaggerGuard + 'static) -> Self {
        self.shared_guard(Arc::new(guard))
    }

    pub fn shared_guard(mut self, guard: Arc<dyn SwaggerGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn log_in(mut self, log_in: impl SwaggerLogin + 'static) -> Self {
        self.log_in = Some(Arc::new(log_in));
        self
    }

    pub fn use_ui(mut self, use_ui: bool) -> Self {
        self.use_ui = use_ui;
        self
    }

    /// Marks session cookies issued by the login handler as `Secure`.
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Upper bound on a single guard call; expiry counts as a rejection.
    pub fn guard_timeout(mut self, timeout: Duration) -> Self {
        self.guard_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SwaggerProtect, ConfigError> {
        if self.cookie_key.is_empty() {
            return Err(ConfigError::EmptyCookieKey);
        }
        if !self.cookie_key.bytes().all(is_cookie_name_byte) {
            return Err(ConfigError::InvalidCookieKey(self.cookie_key));
        }

        if !is_absolute_path(&self.login_path)
            || self.login_path.contains(['?', '#'])
            || HeaderValue::from_str(&self.login_path).is_err()
        {
            return Err(ConfigError::InvalidLoginPath(self.login_path));
        }

        let docs_path = trim_trailing_slash(&self.docs_path).to_string();
        if !is_absolute_path(&docs_path)
            || docs_path == "/"
            || docs_path.contains(['?', '#', '{', '}', '*'])
        {
            return Err(ConfigError::InvalidDocsPath(self.docs_path));
        }

        let swagger_path = match (self.swagger_path, self.swagger_pattern) {
            (_, Some(pattern)) => SwaggerPath::pattern(&pattern)?,
            (Some(path), None) => path,
            (None, None) => SwaggerPath::exact(docs_path.clone()),
        };
        swagger_path.validate()?;

        if swagger_path.matches(&self.login_path) {
            return Err(ConfigError::LoginPathProtected {
                login_path: self.login_path,
            });
        }

        // every mounted document route must sit behind the guard
        let mut mounted = vec![format!("{docs_path}{JSON_SUFFIX}")];
        if self.use_ui {
            mounted.push(format!("{docs_path}{UI_INDEX_SUFFIX}"));
        }
        if let Some(path) = mounted.into_iter().find(|p| !swagger_path.matches(p)) {
            return Err(ConfigError::DocsNotProtected { path });
        }

        let guard = self.guard.ok_or(ConfigError::MissingGuard)?;

        let last_segment = docs_path.rsplit('/').next().unwrap_or_default();
        let canonical_url = format!("./{last_segment}{UI_INDEX_SUFFIX}");

        Ok(SwaggerProtect::from_options(SwaggerProtectOptions {
            cookie_key: self.cookie_key,
            login_path: self.login_path,
            swagger_path,
            docs_path,
            canonical_url,
            guard,
            log_in: self.log_in,
            use_ui: self.use_ui,
            secure_cookies: self.secure_cookies,
            guard_timeout: self.guard_timeout,
        }))
    }
}

impl Default for SwaggerProtectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

/// RFC 6265 cookie-name: any visible ASCII except separators.
fn is_cookie_name_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

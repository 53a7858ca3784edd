use crate::handler::{
    Request, Response,
    middleware::{Middleware, MiddlewareResult, next},
};
use async_trait::async_trait;
use hyper::header::{COOKIE, USER_AGENT};
use log::info;

/// Middleware that logs each incoming HTTP request.
///
/// Logs the method, path, user agent and whether any cookie was sent. Cookie
/// values are never logged since they carry session tokens.
///
/// Example log output:
/// ```text
/// GET /api/json - cookies: yes - User-Agent: Mozilla/5.0
/// ```
#[derive(Debug, Clone)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn call(&self, req: &mut Request, _res: &mut Response) -> MiddlewareResult {
        info!(
            "{} {} - cookies: {} - User-Agent: {}",
            req.method(),
            req.uri().path(),
            if req.headers().contains_key(COOKIE) { "yes" } else { "no" },
            req.headers()
                .get(USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("Unknown")
        );
        next()
    }
}

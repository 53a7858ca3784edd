use cookie::{Cookie, SameSite};
use hyper::{HeaderMap, header::COOKIE};
use log::debug;

/// Cookie handling utility using the cookie crate
#[derive(Debug, Clone)]
pub struct CookieHandler;

impl CookieHandler {
    /// Extracts a cookie value from every `Cookie` header in `headers`.
    ///
    /// Never fails: non-UTF-8 headers and malformed pairs are skipped, and an
    /// empty value counts as absent. When the key repeats, the first
    /// non-empty value wins.
    pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
        for cookie_header in headers.get_all(COOKIE) {
            let Ok(cookie_str) = cookie_header.to_str() else {
                debug!("skipping non UTF-8 cookie header");
                continue;
            };

            for pair in cookie_str.split(';') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }

                match Cookie::parse(pair) {
                    Ok(cookie) if cookie.name() == cookie_name && !cookie.value().is_empty() => {
                        return Some(cookie.value().to_string());
                    }
                    Ok(_) => {}
                    Err(e) => debug!("skipping malformed cookie pair: {}", e),
                }
            }
        }

        None
    }

    /// Creates the session cookie handed out after a successful login
    pub fn create_session_cookie(name: &str, value: &str, secure: bool) -> Cookie<'static> {
        Cookie::build((name.to_owned(), value.to_owned()))
            .path("/")
            .secure(secure)
            .http_only(true)
            .same_site(SameSite::Strict)
            .build()
    }

    /// Creates a cookie to clear/logout
    pub fn create_logout_cookie(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_owned(), ""))
            .path("/")
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

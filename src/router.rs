use crate::handler::{Middleware, Request, Response};
use hyper::{
    StatusCode,
    header::{ALLOW, HeaderValue},
};
use log::debug;
use matchit::{InsertError, Router as MatchitRouter};
use std::sync::Arc;

mod route;

pub use route::Route;

/// Path router with a global middleware stack.
///
/// Global middleware runs for every request before matching. Route
/// middleware runs only once a path and method have matched, so a route
/// that was never registered answers 404 without touching it.
#[derive(Debug, Clone, Default)]
pub struct Router {
    stack: Vec<Arc<dyn Middleware>>,
    routes: Vec<Route>,
    pub matcher: MatchitRouter<usize>,
}

impl Router {
    /// Returns the route for `path`, creating it on first use.
    ///
    /// # Panics
    ///
    /// When `path` is not a valid route pattern or conflicts with an existing
    /// one. Use [`Router::try_route`] for paths that come from configuration.
    pub fn route(&mut self, path: impl AsRef<str>) -> &mut Route {
        let path = path.as_ref();
        match self.try_route(path) {
            Ok(route) => route,
            Err(e) => panic!("invalid route `{path}`: {e}"),
        }
    }

    pub fn try_route(&mut self, path: impl AsRef<str>) -> Result<&mut Route, InsertError> {
        let path = path.as_ref();

        let existing = self
            .matcher
            .at(path)
            .ok()
            .map(|entry| *entry.value)
            .filter(|&index| self.routes[index].path == path);

        let index = match existing {
            Some(index) => index,
            None => {
                let index = self.routes.len();
                self.matcher.insert(path, index)?;
                self.routes.push(Route::new(path));
                index
            }
        };

        Ok(&mut self.routes[index])
    }

    pub fn use_with<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    pub async fn handle(&self, mut req: Request, res: &mut Response) {
        for middleware in &self.stack {
            if middleware.call(&mut req, res).await.is_stop() {
                return;
            }
        }

        let route = match self.matcher.at(req.uri().path()) {
            Ok(m) => &self.routes[*m.value],
            Err(_) => {
                debug!("no route for {}", req.uri().path());
                res.not_found();
                return;
            }
        };

        let Some(endpoint) = route.endpoint(req.method()) else {
            // matching path but not method
            if let Ok(allow) = route.allowed_methods().parse::<HeaderValue>() {
                res.set(ALLOW, allow);
            }
            res.status(StatusCode::METHOD_NOT_ALLOWED)
                .send("Method Not Allowed");
            return;
        };

        for middleware in route.middleware() {
            if middleware.call(&mut req, res).await.is_stop() {
                return;
            }
        }

        endpoint.call(&req, res).await;
    }
}

impl std::fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<middleware>")
    }
}

use crate::handler::{Handler, Middleware, Request as AppRequest, Response as AppResponse};
use crate::router::{Route, Router};
use matchit::InsertError;
use crate::server::Server;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use log::{debug, info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Request bodies larger than this are answered with `413 Payload Too Large`.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

/// Application: a router behind an `Arc`, so cloning it per connection is
/// cheap. Routes must be registered before the app starts serving.
#[derive(Debug, Clone)]
pub struct App {
    router: Arc<Router>,
    body_limit: usize,
}

impl Default for App {
    fn default() -> Self {
        Self {
            router: Arc::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl App {
    pub async fn handle(&self, req: AppRequest) -> Response<Full<Bytes>> {
        let mut res = AppResponse::new();
        self.router.handle(req, &mut res).await;
        res.into_hyper()
    }

    fn router_mut(&mut self) -> &mut Router {
        Arc::make_mut(&mut self.router)
    }

    pub fn use_with<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.router_mut().use_with(middleware);
        self
    }

    /// Returns the route at `path` for chaining handlers and route middleware.
    pub fn route(&mut self, path: impl AsRef<str>) -> &mut Route {
        self.router_mut().route(path)
    }

    /// Like [`App::route`], but reports a malformed path instead of panicking.
    pub fn try_route(&mut self, path: impl AsRef<str>) -> Result<&mut Route, InsertError> {
        self.router_mut().try_route(path)
    }

    /// Maximum request body size in bytes.
    pub fn body_limit(&mut self, bytes: usize) -> &mut Self {
        self.body_limit = bytes;
        self
    }

    pub async fn listen<T: FnOnce()>(
        self,
        port: u16,
        callback: T,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;

        let shutdown = CancellationToken::new();
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("🛑 Received Ctrl+C, shutting down server...");
                }
                shutdown.cancel();
            }
        });

        callback();

        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` is cancelled.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Server::serve(listener, self, shutdown).await
    }
}

impl Service<Request<Incoming>> for App {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let app = self.clone();

        Box::pin(async move {
            let start = Instant::now();
            let (parts, body) = req.into_parts();

            let body = match Limited::new(body, app.body_limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let mut res = AppResponse::new();
                    if e.is::<LengthLimitError>() {
                        warn!(
                            "{} {}: body exceeds limit of {} bytes",
                            parts.method,
                            parts.uri.path(),
                            app.body_limit
                        );
                        res.status(StatusCode::PAYLOAD_TOO_LARGE)
                            .send("Payload Too Large");
                    } else {
                        warn!("failed to read request body: {}", e);
                        res.status(StatusCode::BAD_REQUEST).send("Bad Request");
                    }
                    return Ok(res.into_hyper());
                }
            };

            let method = parts.method.clone();
            let path = parts.uri.path().to_owned();
            let response = app.handle(Request::from_parts(parts, body)).await;

            if cfg!(debug_assertions) {
                info!(
                    "{} {} {} ({} ms)",
                    method,
                    path,
                    response.status().as_u16(),
                    start.elapsed().as_millis()
                );
            } else {
                debug!("{} {} {}", method, path, response.status().as_u16());
            }

            Ok(response)
        })
    }
}

macro_rules! generate_methods {
    (
        methods: [$($name:ident => $method:ident),* $(,)?]
    ) => {
        impl App {
            $(
                pub fn $name(&mut self, path: impl AsRef<str>, handle: impl Handler) -> &mut Route {
                    self.route(path).method(Method::$method, handle)
                }
            )*
        }
    };
}

generate_methods! {
    methods: [get => GET, post => POST, put => PUT, delete => DELETE, patch => PATCH]
}

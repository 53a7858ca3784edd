use async_trait::async_trait;

pub mod middleware;
pub mod request;
pub mod response;

pub use middleware::{Middleware, MiddlewareResult};
pub use request::{Request, RequestExt};
pub use response::Response;

/// Terminal request handler mounted on a route.
///
/// Any `Fn(&Request, &mut Response)` closure is a handler; types that need to
/// await something implement the trait directly.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, req: &Request, res: &mut Response);
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync + 'static,
{
    async fn call(&self, req: &Request, res: &mut Response) {
        (self)(req, res)
    }
}

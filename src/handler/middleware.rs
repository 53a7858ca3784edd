use super::{Request, Response};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareResult {
    Next,
    Stop,
}

/// Trait for middleware handlers.
///
/// A middleware either lets the request continue down the chain (`Next`) or
/// takes ownership of the response and ends it (`Stop`).
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn call(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult;
}

pub fn next() -> MiddlewareResult {
    MiddlewareResult::Next
}

pub fn stop() -> MiddlewareResult {
    MiddlewareResult::Stop
}

impl MiddlewareResult {
    pub fn is_next(&self) -> bool {
        matches!(self, MiddlewareResult::Next)
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, MiddlewareResult::Stop)
    }
}

use super::error::GuardResult;
use async_trait::async_trait;
use std::{future::Future, sync::Arc};

/// Integrator-supplied check deciding whether a session token may see the
/// documentation.
///
/// The token is opaque to this crate. Returning `Ok(false)` rejects it;
/// returning an error is treated the same way after being logged.
#[async_trait]
pub trait SwaggerGuard: Send + Sync {
    async fn can_activate(&self, token: &str) -> GuardResult<bool>;
}

#[async_trait]
impl<T: SwaggerGuard + ?Sized> SwaggerGuard for Arc<T> {
    async fn can_activate(&self, token: &str) -> GuardResult<bool> {
        (**self).can_activate(token).await
    }
}

/// Guard backed by a synchronous predicate.
#[derive(Clone)]
pub struct FnGuard<F>(F);

/// Wraps a synchronous predicate, e.g. `guard_fn(|token| token == expected)`.
pub fn guard_fn<F>(f: F) -> FnGuard<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    FnGuard(f)
}

#[async_trait]
impl<F> SwaggerGuard for FnGuard<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn can_activate(&self, token: &str) -> GuardResult<bool> {
        Ok((self.0)(token))
    }
}

/// Guard backed by an async closure, for lookups against a session store.
#[derive(Clone)]
pub struct AsyncFnGuard<F>(F);

pub fn async_guard_fn<F, Fut>(f: F) -> AsyncFnGuard<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = GuardResult<bool>> + Send,
{
    AsyncFnGuard(f)
}

#[async_trait]
impl<F, Fut> SwaggerGuard for AsyncFnGuard<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = GuardResult<bool>> + Send,
{
    async fn can_activate(&self, token: &str) -> GuardResult<bool> {
        (self.0)(token.to_owned()).await
    }
}

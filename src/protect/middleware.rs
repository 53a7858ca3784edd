use super::decision::{AccessDecisionEngine, Decision, IncomingRequest};
use crate::handler::{
    Request, Response,
    middleware::{Middleware, MiddlewareResult, next, stop},
};
use async_trait::async_trait;
use hyper::header::HeaderValue;
use log::error;

/// Route middleware placed in front of the documentation handlers.
///
/// On any redirect decision it answers `302 Found` itself and the wrapped
/// handler never runs.
#[derive(Debug, Clone)]
pub struct SwaggerProtectMiddleware {
    engine: AccessDecisionEngine,
    fallback: HeaderValue,
}

impl SwaggerProtectMiddleware {
    pub fn new(engine: AccessDecisionEngine) -> Self {
        let fallback = HeaderValue::from_str(engine.options().login_path())
            .unwrap_or_else(|_| HeaderValue::from_static("/"));

        Self { engine, fallback }
    }

    fn redirect(&self, res: &mut Response, decision: &Decision, location: &str) {
        if let Err(e) = res.redirect(location).map(|_| ()) {
            error!("unusable redirect target for {:?}: {}", decision, e);
            res.redirect_to(self.fallback.clone());
        }
    }
}

#[async_trait]
impl Middleware for SwaggerProtectMiddleware {
    async fn call(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        let decision = self.engine.decide(&IncomingRequest::from(&*req)).await;

        match decision.location() {
            None => next(),
            Some(location) => {
                self.redirect(res, &decision, location);
                stop()
            }
        }
    }
}

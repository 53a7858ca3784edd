//! Cookie-session gate in front of the Swagger/OpenAPI documentation routes.
//!
//! ```no_run
//! use swagger_protect::protect::{SwaggerProtect, guard::guard_fn};
//!
//! let protect = SwaggerProtect::builder()
//!     .cookie_key("swagger_key")
//!     .login_path("/login-me")
//!     .guard(guard_fn(|token| token == "s3cret"))
//!     .build()
//!     .expect("invalid swagger protection settings");
//! ```

pub mod config;
pub mod cookies;
pub mod decision;
pub mod error;
pub mod guard;
pub mod login;
pub mod middleware;
pub mod pattern;

use config::{SwaggerProtectBuilder, SwaggerProtectOptions};
use decision::AccessDecisionEngine;
use login::{LoginHandler, LogoutHandler};
use middleware::SwaggerProtectMiddleware;
use std::sync::Arc;

/// Built, validated protection module. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SwaggerProtect {
    options: Arc<SwaggerProtectOptions>,
}

impl SwaggerProtect {
    pub fn builder() -> SwaggerProtectBuilder {
        SwaggerProtectBuilder::new()
    }

    pub(crate) fn from_options(options: SwaggerProtectOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &SwaggerProtectOptions {
        &self.options
    }

    pub fn engine(&self) -> AccessDecisionEngine {
        AccessDecisionEngine::new(self.options.clone())
    }

    /// Interceptor to put in front of each documentation route.
    pub fn middleware(&self) -> SwaggerProtectMiddleware {
        SwaggerProtectMiddleware::new(self.engine())
    }

    /// Login handler for the integrator to mount on the login path, if a
    /// login capability was configured. Never mounted automatically.
    pub fn login_handler(&self) -> Option<LoginHandler> {
        self.options
            .log_in()
            .map(|log_in| LoginHandler::new(self.options.clone(), log_in.clone()))
    }

    pub fn logout_handler(&self) -> LogoutHandler {
        LogoutHandler::new(&self.options)
    }
}

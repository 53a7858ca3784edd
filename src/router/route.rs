use crate::handler::{Handler, Middleware};
use hyper::Method;
use std::{collections::HashMap, fmt, sync::Arc};

/// Every handler registered under a single path, plus the middleware that
/// runs in front of them.
#[derive(Clone, Default)]
pub struct Route {
    pub path: String,
    endpoints: HashMap<Method, Arc<dyn Handler>>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            endpoints: HashMap::new(),
            middleware: Vec::new(),
        }
    }

    /// Registers `handler` for `method`, replacing any previous one.
    pub fn method(&mut self, method: Method, handler: impl Handler) -> &mut Self {
        self.endpoints.insert(method, Arc::new(handler));
        self
    }

    /// Runs `middleware` before any handler on this route.
    pub fn with(&mut self, middleware: impl Middleware) -> &mut Self {
        self.with_shared(Arc::new(middleware))
    }

    pub fn with_shared(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn endpoint(&self, method: &Method) -> Option<&Arc<dyn Handler>> {
        self.endpoints.get(method)
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Comma separated list of the registered methods, for `Allow` headers.
    pub fn allowed_methods(&self) -> String {
        let mut methods: Vec<&str> = self.endpoints.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        methods.join(", ")
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("methods", &self.allowed_methods())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

macro_rules! generate_methods {
    (
        methods: [$($name:ident => $method:ident),* $(,)?]
    ) => {
        impl Route {
            $(
                pub fn $name(&mut self, handler: impl Handler) -> &mut Self {
                    self.method(Method::$method, handler)
                }
            )*
        }
    };
}

generate_methods! {
    methods: [get => GET, post => POST, put => PUT, delete => DELETE, patch => PATCH, head => HEAD]
}

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use axum::response::Response;
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;

/// Named captures extracted from the request path.
pub type Params = HashMap<String, String>;

/// Everything a handler gets to see about a matched request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub params: Params,
    pub body: Bytes,
}

impl RouteRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A request handler bound to a route and method.
pub type Handler = Arc<dyn Fn(RouteRequest) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Handlers for one path pattern, keyed by HTTP method.
#[derive(Clone, Default)]
pub struct MethodMap {
    handlers: HashMap<Method, Handler>,
}

impl MethodMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `method`, replacing any earlier binding.
    pub fn on(mut self, method: Method, handler: Handler) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn get(&self, method: &Method) -> Option<&Handler> {
        self.handlers.get(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for MethodMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<&str> = self.handlers.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("MethodMap").field("methods", &methods).finish()
    }
}

/// Path patterns and their method maps, in registration order.
///
/// Patterns are regular expressions matched against the whole request
/// path. When several patterns could match, the one registered first wins,
/// so register specific patterns before general ones.
#[derive(Debug, Clone, Default)]
pub struct RouteMap {
    routes: IndexMap<String, MethodMap>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `methods` under `pattern`.
    ///
    /// Re-registering a pattern replaces its whole method map; the pattern
    /// keeps the position of its first registration.
    pub fn route(mut self, pattern: impl Into<String>, methods: MethodMap) -> Self {
        self.routes.insert(pattern.into(), methods);
        self
    }

    /// Merge route maps in order. A pattern present in several maps takes
    /// the method map from the last one, with no per-method union.
    pub fn merge(maps: impl IntoIterator<Item = RouteMap>) -> RouteMap {
        let mut merged = RouteMap::new();
        for map in maps {
            for (pattern, methods) in map.routes {
                merged.routes.insert(pattern, methods);
            }
        }
        merged
    }

    pub fn get(&self, pattern: &str) -> Option<&MethodMap> {
        self.routes.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, MethodMap)> {
        self.routes.into_iter()
    }
}

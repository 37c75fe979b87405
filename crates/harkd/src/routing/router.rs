use axum::http::Method;
use regex::Regex;

use super::table::{Handler, MethodMap, Params, RouteMap};

/// A route pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("bad path: could not compile {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Terminal routing outcomes other than a match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("No handler for '{method} {path}'")]
    NoRoute { method: Method, path: String },

    #[error("Method not allowed for '{method} {path}'")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },
}

/// A successful match: the handler plus the named captures.
pub struct RouteMatch {
    pub handler: Handler,
    pub params: Params,
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct CompiledRoute {
    regex: Regex,
    param_names: Vec<String>,
    methods: MethodMap,
}

impl CompiledRoute {
    /// Match the whole of `path`, returning the named captures.
    fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let params = self
            .param_names
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(params)
    }
}

/// Immutable routing table built once at startup.
#[derive(Debug)]
pub struct CompiledRouter {
    routes: Vec<CompiledRoute>,
}

impl CompiledRouter {
    /// Compile every pattern in `map`, failing on the first malformed one.
    ///
    /// Patterns are anchored at both ends, so a route only ever matches a
    /// whole path.
    pub fn compile(map: RouteMap) -> Result<Self, PatternError> {
        let routes = map
            .into_entries()
            .map(|(pattern, methods)| {
                let bad_pattern = |source| PatternError {
                    pattern: pattern.clone(),
                    source,
                };
                // Checked on its own first so a stray `)` can't escape the anchors
                Regex::new(&pattern).map_err(bad_pattern)?;
                let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(bad_pattern)?;
                let param_names = regex
                    .capture_names()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                Ok(CompiledRoute {
                    regex,
                    param_names,
                    methods,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the handler for `method` on `path`.
    ///
    /// The first route (in registration order) whose pattern matches the
    /// whole path decides the outcome: if it has no handler for `method`
    /// the result is `MethodNotAllowed`, and later routes are not consulted.
    pub fn find(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteError> {
        for route in &self.routes {
            let Some(params) = route.captures(path) else {
                continue;
            };

            return match route.methods.get(method) {
                Some(handler) => Ok(RouteMatch {
                    handler: handler.clone(),
                    params,
                }),
                None => {
                    let mut allowed: Vec<Method> = route.methods.methods().cloned().collect();
                    allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                    Err(RouteError::MethodNotAllowed {
                        method: method.clone(),
                        path: path.to_string(),
                        allowed,
                    })
                }
            };
        }

        Err(RouteError::NoRoute {
            method: method.clone(),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::table::handler;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn tagged(status: StatusCode) -> Handler {
        handler(move |_req| async move { status.into_response() })
    }

    async fn status_of(m: RouteMatch) -> StatusCode {
        let req = crate::routing::RouteRequest {
            method: Method::GET,
            path: String::new(),
            params: m.params.clone(),
            body: Default::default(),
        };
        (m.handler)(req).await.status()
    }

    #[test]
    fn test_named_capture_extraction() {
        let router = CompiledRouter::compile(RouteMap::new().route(
            r"^/api/machine/(?P<id>\w+)$",
            MethodMap::new().on(Method::GET, tagged(StatusCode::OK)),
        ))
        .unwrap();

        let m = router.find(&Method::GET, "/api/machine/abc123").unwrap();
        assert_eq!(m.params.get("id").map(String::as_str), Some("abc123"));
        assert_eq!(m.params.len(), 1);

        for path in ["/api/machine/", "/api/other/abc123", "/api/machine/abc/def"] {
            assert!(matches!(
                router.find(&Method::GET, path),
                Err(RouteError::NoRoute { .. })
            ));
        }
    }

    #[test]
    fn test_unanchored_pattern_must_cover_whole_path() {
        let router = CompiledRouter::compile(RouteMap::new().route(
            "/api/machine",
            MethodMap::new().on(Method::GET, tagged(StatusCode::OK)),
        ))
        .unwrap();

        assert!(router.find(&Method::GET, "/api/machine").is_ok());
        assert!(router.find(&Method::GET, "/prefix/api/machine").is_err());
        assert!(router.find(&Method::GET, "/api/machine/extra").is_err());
    }

    #[test]
    fn test_alternation_matches_longer_branch() {
        let router = CompiledRouter::compile(RouteMap::new().route(
            "/api/machine|/api/machine/(?P<id>\\w+)",
            MethodMap::new().on(Method::GET, tagged(StatusCode::OK)),
        ))
        .unwrap();

        assert!(router.find(&Method::GET, "/api/machine").is_ok());
        let m = router.find(&Method::GET, "/api/machine/m1").unwrap();
        assert_eq!(m.params.get("id").map(String::as_str), Some("m1"));
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchors() {
        let err = CompiledRouter::compile(RouteMap::new().route(
            "/a)|(/b",
            MethodMap::new().on(Method::GET, tagged(StatusCode::OK)),
        ))
        .unwrap_err();
        assert_eq!(err.pattern, "/a)|(/b");
    }

    #[test]
    fn test_malformed_pattern_fails_compile() {
        let err = CompiledRouter::compile(
            RouteMap::new()
                .route("^/ok$", MethodMap::new())
                .route("^/bad/(?P<id>\\w+$", MethodMap::new()),
        )
        .unwrap_err();
        assert_eq!(err.pattern, "^/bad/(?P<id>\\w+$");
    }

    #[tokio::test]
    async fn test_first_registered_match_wins() {
        let router = CompiledRouter::compile(
            RouteMap::new()
                .route(
                    "^/api/machine/special$",
                    MethodMap::new().on(Method::GET, tagged(StatusCode::ACCEPTED)),
                )
                .route(
                    r"^/api/machine/(?P<id>\w+)$",
                    MethodMap::new().on(Method::GET, tagged(StatusCode::OK)),
                ),
        )
        .unwrap();

        let m = router.find(&Method::GET, "/api/machine/special").unwrap();
        assert!(m.params.is_empty());
        assert_eq!(status_of(m).await, StatusCode::ACCEPTED);

        let m = router.find(&Method::GET, "/api/machine/other").unwrap();
        assert_eq!(status_of(m).await, StatusCode::OK);
    }

    #[test]
    fn test_method_not_allowed_stops_search() {
        let router = CompiledRouter::compile(
            RouteMap::new()
                .route(
                    "^/api/machine$",
                    MethodMap::new()
                        .on(Method::GET, tagged(StatusCode::OK))
                        .on(Method::PUT, tagged(StatusCode::CREATED)),
                )
                // Would accept DELETE, but is never consulted for this path
                .route(
                    "^/api/.*$",
                    MethodMap::new().on(Method::DELETE, tagged(StatusCode::OK)),
                ),
        )
        .unwrap();

        match router.find(&Method::DELETE, "/api/machine") {
            Err(RouteError::MethodNotAllowed { allowed, .. }) => {
                assert_eq!(allowed, vec![Method::GET, Method::PUT]);
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }

        assert!(router.find(&Method::DELETE, "/api/system").is_ok());
    }
}

//! Method and path matching for the REST endpoint.
//!
//! Patterns use `{name}` segments for parameters. Literal segments match
//! ASCII case-insensitively; parameters capture the raw segment text.
//!
//! # Example
//!
//! ```rust
//! use bulwark_server::Router;
//! use http::Method;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Route {
//!     Item,
//! }
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/api/items/{id}", Route::Item);
//!
//! let m = router.match_route(&Method::GET, "/API/items/7").unwrap();
//! assert_eq!(m.target(), Route::Item);
//! assert_eq!(m.param("id"), Some("7"));
//! ```

use std::collections::HashMap;

use http::Method;

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<T> {
    target: T,
    params: HashMap<String, String>,
}

impl<T: Copy> RouteMatch<T> {
    /// Returns the value registered for the route.
    #[must_use]
    pub fn target(&self) -> T {
        self.target
    }

    /// Returns all extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route<T> {
    method: Method,
    segments: Vec<PathSegment>,
    target: T,
}

impl<T> Route<T> {
    fn new(method: Method, pattern: &str, target: T) -> Self {
        Self {
            method,
            segments: parse_segments(pattern),
            target,
        }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, segment) in self.segments.iter().zip(actual) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if !expected.eq_ignore_ascii_case(segment) {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), segment.to_string());
                }
            }
        }
        Some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

/// First-match-wins router mapping method and path to a `T`.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T: Copy> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. Earlier registrations win on overlap.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, target: T) {
        self.routes.push(Route::new(method, pattern.as_ref(), target));
    }

    /// Chaining form of [`Router::add_route`].
    #[must_use]
    pub fn route(mut self, method: Method, pattern: impl AsRef<str>, target: T) -> Self {
        self.add_route(method, pattern, target);
        self
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the first route matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<T>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    target: route.target,
                    params,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        List,
        Get,
        Create,
        Pair,
        Fixed,
    }

    fn router() -> Router<Op> {
        Router::new()
            .route(Method::GET, "/items", Op::List)
            .route(Method::GET, "/items/fixed", Op::Fixed)
            .route(Method::GET, "/items/{id}", Op::Get)
            .route(Method::POST, "/items", Op::Create)
            .route(Method::GET, "/pairs/{left}/{right}", Op::Pair)
    }

    #[test]
    fn test_empty_router() {
        let router: Router<Op> = Router::new();
        assert_eq!(router.route_count(), 0);
        assert!(router.match_route(&Method::GET, "/items").is_none());
    }

    #[test]
    fn test_match_literal() {
        let m = router().match_route(&Method::GET, "/items").unwrap();
        assert_eq!(m.target(), Op::List);
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_match_param() {
        let m = router().match_route(&Method::GET, "/items/42").unwrap();
        assert_eq!(m.target(), Op::Get);
        assert_eq!(m.param("id"), Some("42"));
    }

    #[test]
    fn test_match_multiple_params() {
        let m = router().match_route(&Method::GET, "/pairs/a/b").unwrap();
        assert_eq!(m.target(), Op::Pair);
        assert_eq!(m.param("left"), Some("a"));
        assert_eq!(m.param("right"), Some("b"));
    }

    #[test]
    fn test_first_registration_wins() {
        let m = router().match_route(&Method::GET, "/items/fixed").unwrap();
        assert_eq!(m.target(), Op::Fixed);
    }

    #[test]
    fn test_method_is_part_of_match() {
        let router = router();
        assert_eq!(
            router.match_route(&Method::POST, "/items").unwrap().target(),
            Op::Create
        );
        assert!(router.match_route(&Method::DELETE, "/items").is_none());
    }

    #[test]
    fn test_literals_ignore_case_and_trailing_slash() {
        let router = router();
        assert_eq!(
            router.match_route(&Method::GET, "/ITEMS/").unwrap().target(),
            Op::List
        );
    }

    #[test]
    fn test_segment_count_must_match() {
        let router = router();
        assert!(router.match_route(&Method::GET, "/items/1/extra").is_none());
        assert!(router.match_route(&Method::GET, "/pairs/a").is_none());
    }

    #[test]
    fn test_params_keep_case() {
        let m = router().match_route(&Method::GET, "/items/AbC").unwrap();
        assert_eq!(m.param("id"), Some("AbC"));
    }
}

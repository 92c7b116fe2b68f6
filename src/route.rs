use std::rc::Rc;
use std::sync::Arc;

use http::Method;

use crate::error::BuildPathError;
use crate::middleware::{Handler, Middleware};
use crate::params::Params;
use crate::pattern::PathPattern;
use crate::registry::NameRegistry;

/// One method + path template + handler binding.
///
/// Routes are created through [`Router::map`](crate::Router::map) and
/// configured in place:
///
/// ```
/// use bytes::Bytes;
/// use clear_router::{Request, Router};
///
/// let mut router = Router::new();
/// router
///     .map("GET|POST", "/post/{id:[0-9]+}", |_req: Request| {
///         Ok(http::Response::builder().body(Bytes::new()).unwrap())
///     })
///     .name("post");
/// ```
///
/// A route is read-only during dispatch; captured parameters and the
/// in-flight middleware cursor live on the dispatch call, never on the route.
pub struct Route {
    /// Accepted methods; empty means any.
    methods: Vec<Method>,

    /// Compiled full-path pattern, group prefix included.
    pattern: Arc<PathPattern>,

    middleware: Vec<Rc<dyn Middleware>>,

    handler: Rc<dyn Handler>,

    name: Option<String>,

    registry: Rc<NameRegistry>,
}

impl Route {
    pub(crate) fn new(
        methods: &str,
        pattern: PathPattern,
        handler: Rc<dyn Handler>,
        registry: Rc<NameRegistry>,
    ) -> Route {
        Route {
            methods: parse_methods(methods),
            pattern: Arc::new(pattern),
            middleware: Vec::new(),
            handler,
            name: None,
            registry,
        }
    }

    /// Registers this route under a unique name for reverse path building.
    ///
    /// # Panics
    /// Panics if `name` is empty or already registered anywhere in the same
    /// route tree.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Route {
        let name = name.into();
        assert!(!name.is_empty(), "route name should not be empty");

        self.registry.register(&name, Arc::clone(&self.pattern));
        self.name = Some(name);
        self
    }

    /// Appends a middleware to this route's own chain.
    ///
    /// Route middleware runs after the middleware of every enclosing group.
    pub fn middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Route {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// Returns the route's template, group prefix included.
    pub fn pattern(&self) -> &str {
        self.pattern.template()
    }

    /// Returns the registered route name, if any.
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Builds a concrete path from this route's template.
    ///
    /// # Errors
    /// See [`PathPattern::build_path`].
    pub fn url_for<K, V>(&self, values: &[(K, V)]) -> Result<String, BuildPathError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.pattern.build_path(values)
    }

    /// Returns `true` iff the method is accepted.
    ///
    /// Matching is case-insensitive by construction (`Method` is normalized
    /// at registration); `HEAD` matches routes accepting `GET`.
    pub fn accepts(&self, method: &Method) -> bool {
        if self.methods.is_empty() {
            return true;
        }

        if self.methods.contains(method) {
            return true;
        }

        *method == Method::HEAD && self.methods.contains(&Method::GET)
    }

    /// Matches method and full path, returning captured parameters on success.
    pub(crate) fn try_match(&self, method: &Method, path: &str) -> Option<Params> {
        if !self.accepts(method) {
            return None;
        }

        self.pattern.capture(path)
    }

    pub(crate) fn middleware_list(&self) -> &[Rc<dyn Middleware>] {
        &self.middleware
    }

    pub(crate) fn handler(&self) -> &dyn Handler {
        &*self.handler
    }
}

/// Parses a method spec string such as `"GET"`, `"get|post"`, `"*"` or `""`.
///
/// `"*"` and the empty string accept any method. Tokens are normalized to
/// uppercase before parsing, so matching is case-insensitive.
///
/// # Panics
/// Panics on an unparseable token; an impossible method set is a
/// configuration error and fails fast at registration.
fn parse_methods(spec: &str) -> Vec<Method> {
    let spec = spec.trim();

    if spec.is_empty() || spec == "*" {
        return Vec::new();
    }

    spec.split('|')
        .map(|token| {
            let token = token.trim().to_ascii_uppercase();
            Method::from_bytes(token.as_bytes())
                .unwrap_or_else(|_| panic!(r#"invalid method "{}" in spec "{}""#, token, spec))
        })
        .collect()
}

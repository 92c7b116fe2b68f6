use std::rc::Rc;

use http::Method;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{BuildPathError, Error};
use crate::middleware::{Handler, Middleware, Next};
use crate::params::Params;
use crate::pattern::PathPattern;
use crate::registry::NameRegistry;
use crate::route::Route;
use crate::{Request, Response};

/// Effective middleware chain assembled for one dispatch call.
type MiddlewareStack = SmallVec<[Rc<dyn Middleware>; 8]>;

/// A path-prefixed collection of routes and nested groups.
///
/// Children keep insertion order and the first full match wins. Middleware
/// attached to a group wraps every route below it; enclosing groups run
/// before nested ones, and group middleware always runs before the matched
/// route's own.
pub struct RouteGroup {
    /// Accumulated prefix, parent prefixes included.
    prefix: String,

    /// `prefix` compiled in prefix mode, for the "starts with" dispatch test.
    prefix_pattern: PathPattern,

    middleware: Vec<Rc<dyn Middleware>>,

    entries: Vec<Entry>,

    registry: Rc<NameRegistry>,
}

enum Entry {
    Route(Route),
    Group(RouteGroup),
}

impl RouteGroup {
    fn new(prefix: String, registry: Rc<NameRegistry>) -> RouteGroup {
        RouteGroup {
            prefix_pattern: PathPattern::prefix(prefix.clone()),
            prefix,
            middleware: Vec::new(),
            entries: Vec::new(),
            registry,
        }
    }

    /// Returns this group's accumulated path prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers a route for `path`, prefixed with this group's prefix.
    ///
    /// `methods` accepts a `|`-separated list such as `"GET|POST"`; `"*"` or
    /// an empty string accepts every method. The returned route can be named
    /// and given middleware in place.
    ///
    /// # Panics
    /// Panics on an invalid method token or a malformed path template.
    pub fn map(
        &mut self,
        methods: &str,
        path: &str,
        handler: impl Handler + 'static,
    ) -> &mut Route {
        let pattern = PathPattern::new(format!("{}{}", self.prefix, path));
        let route = Route::new(methods, pattern, Rc::new(handler), Rc::clone(&self.registry));

        self.entries.push(Entry::Route(route));
        match self.entries.last_mut() {
            Some(Entry::Route(route)) => route,
            _ => unreachable!(),
        }
    }

    /// Creates a nested group under this group's prefix.
    pub fn group(&mut self, path: &str) -> &mut RouteGroup {
        let child = RouteGroup::new(
            format!("{}{}", self.prefix, path),
            Rc::clone(&self.registry),
        );

        self.entries.push(Entry::Group(child));
        match self.entries.last_mut() {
            Some(Entry::Group(group)) => group,
            _ => unreachable!(),
        }
    }

    /// Appends a middleware wrapping every route registered below this group.
    pub fn middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut RouteGroup {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// Scans children in insertion order for the first full match.
    ///
    /// On a hit, `stack` holds the middleware of every group on the matched
    /// path, outermost first. On a miss the group's contribution is unwound
    /// so a later sibling starts from a clean stack; this is the
    /// swallowed-not-found behavior that lets sibling branches compete.
    fn find(
        &self,
        method: &Method,
        path: &str,
        stack: &mut MiddlewareStack,
    ) -> Option<(&Route, Params)> {
        let mark = stack.len();
        stack.extend(self.middleware.iter().cloned());

        for entry in &self.entries {
            match entry {
                Entry::Route(route) => {
                    if let Some(params) = route.try_match(method, path) {
                        return Some((route, params));
                    }
                }
                Entry::Group(group) => {
                    if group.prefix_pattern.is_match(path) {
                        if let Some(found) = group.find(method, path, stack) {
                            return Some(found);
                        }
                    }
                }
            }
        }

        stack.truncate(mark);
        None
    }
}

/// The root of a route tree and its dispatch entry point.
///
/// ```
/// use bytes::Bytes;
/// use clear_router::{Request, Router};
///
/// let mut router = Router::new();
/// let api = router.group("/api");
/// let v1 = api.group("/v1");
/// v1.map("GET", "/status", |_req: Request| {
///     Ok(http::Response::builder().body(Bytes::from_static(b"ok")).unwrap())
/// });
///
/// let req = http::Request::get("/api/v1/status").body(Bytes::new()).unwrap();
/// let res = router.dispatch(req).unwrap();
/// assert_eq!(res.body(), "ok");
/// ```
pub struct Router {
    root: RouteGroup,
}

impl Router {
    /// Creates an empty route tree.
    pub fn new() -> Router {
        Router {
            root: RouteGroup::new(String::new(), Rc::new(NameRegistry::default())),
        }
    }

    /// Registers a top-level route. See [`RouteGroup::map`].
    pub fn map(
        &mut self,
        methods: &str,
        path: &str,
        handler: impl Handler + 'static,
    ) -> &mut Route {
        self.root.map(methods, path, handler)
    }

    /// Creates a top-level group. See [`RouteGroup::group`].
    pub fn group(&mut self, path: &str) -> &mut RouteGroup {
        self.root.group(path)
    }

    /// Appends a middleware wrapping every route in the tree.
    pub fn middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Router {
        self.root.middleware(middleware);
        self
    }

    /// Dispatches a request to the first matching route.
    ///
    /// Captured path parameters are stored in the request's extensions before
    /// the middleware chain runs, so every middleware and the handler observe
    /// them via [`RequestExt::params`](crate::RequestExt::params).
    ///
    /// # Errors
    /// [`Error::not_found`] when no route in the tree matches; any error
    /// raised by middleware or the handler is passed through unmodified.
    pub fn dispatch(&self, mut req: Request) -> Result<Response, Error> {
        let method = req.method().clone();
        let mut stack = MiddlewareStack::new();

        match self.root.find(&method, req.uri().path(), &mut stack) {
            Some((route, params)) => {
                req.extensions_mut().insert(params);
                stack.extend(route.middleware_list().iter().cloned());
                Next::new(&stack, route.handler()).handle(req)
            }
            None => {
                debug!("no route matched {} {}", method, req.uri().path());
                Err(Error::not_found())
            }
        }
    }

    /// Builds the path of the named route from a parameter value map.
    ///
    /// # Errors
    /// [`BuildPathError::UnknownName`] if no route carries `name`; otherwise
    /// the route template's build errors. See [`PathPattern::build_path`].
    pub fn url_for<K, V>(&self, name: &str, values: &[(K, V)]) -> Result<String, BuildPathError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.root.registry.build_path(name, values)
    }
}

impl Default for Router {
    fn default() -> Router {
        Router::new()
    }
}

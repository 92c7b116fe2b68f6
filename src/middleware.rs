use std::rc::Rc;

use crate::error::Error;
use crate::{Request, Response};

/// Terminal request handler of a route.
///
/// Implemented for free by closures and functions taking a request and
/// returning a response result.
pub trait Handler {
    fn handle(&self, req: Request) -> Result<Response, Error>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Result<Response, Error>,
{
    fn handle(&self, req: Request) -> Result<Response, Error> {
        (self)(req)
    }
}

impl<H: Handler + ?Sized> Handler for Rc<H> {
    fn handle(&self, req: Request) -> Result<Response, Error> {
        (**self).handle(req)
    }
}

/// A composable request interceptor.
///
/// A middleware receives the request and a [`Next`] handle to the remainder of
/// the chain. It may act before delegating, act on the returned response
/// afterwards, or short-circuit by not calling [`Next::handle`] at all.
///
/// Middleware instances attached to groups and routes are reference-counted,
/// so one instance can serve any number of routes.
///
/// # Examples
/// ```
/// use clear_router::{Error, Middleware, Next, Request, Response};
///
/// struct ServerHeader;
///
/// impl Middleware for ServerHeader {
///     fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
///         let mut res = next.handle(req)?;
///         res.headers_mut().insert("server", "clear".parse().unwrap());
///         Ok(res)
///     }
/// }
/// ```
pub trait Middleware {
    fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error>;
}

impl<M: Middleware + ?Sized> Middleware for Rc<M> {
    fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
        (**self).process(req, next)
    }
}

/// Creates a middleware from a function.
///
/// Mirrors implementing [`Middleware`] by hand; useful for plain `fn` items:
///
/// ```
/// use clear_router::{fn_middleware, Error, Next, Request, Response, Router};
///
/// fn no_store(req: Request, next: Next<'_>) -> Result<Response, Error> {
///     let mut res = next.handle(req)?;
///     res.headers_mut().insert("cache-control", "no-store".parse().unwrap());
///     Ok(res)
/// }
///
/// let mut router = Router::new();
/// router.middleware(fn_middleware(no_store));
/// ```
pub fn fn_middleware<F>(f: F) -> impl Middleware
where
    F: for<'a> Fn(Request, Next<'a>) -> Result<Response, Error>,
{
    MiddlewareFn(f)
}

struct MiddlewareFn<F>(F);

impl<F> Middleware for MiddlewareFn<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> Result<Response, Error>,
{
    fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
        (self.0)(req, next)
    }
}

/// The remaining middleware chain of one dispatch call.
///
/// `Next` borrows the effective middleware list assembled for the current
/// request plus the route's terminal handler; it carries no state of its own
/// beyond a cursor, so shared route objects stay untouched while a request is
/// in flight.
pub struct Next<'a> {
    middleware: &'a [Rc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a [Rc<dyn Middleware>], handler: &'a dyn Handler) -> Next<'a> {
        Next {
            middleware,
            handler,
        }
    }

    /// Runs the rest of the chain: the next middleware if one remains,
    /// otherwise the route's handler.
    pub fn handle(self, req: Request) -> Result<Response, Error> {
        match self.middleware.split_first() {
            Some((mw, rest)) => mw.process(req, Next::new(rest, self.handler)),
            None => self.handler.handle(req),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn text(body: &'static str) -> Response {
        http::Response::builder()
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    fn request() -> Request {
        http::Request::builder().body(Bytes::new()).unwrap()
    }

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
            let mut res = next.handle(req)?;
            let tagged = format!("{}+{}", self.0, String::from_utf8_lossy(res.body()));
            *res.body_mut() = Bytes::from(tagged);
            Ok(res)
        }
    }

    struct Reject;

    impl Middleware for Reject {
        fn process(&self, _req: Request, _next: Next<'_>) -> Result<Response, Error> {
            Err(Error::forbidden())
        }
    }

    #[test]
    fn empty_chain_calls_handler() {
        let handler = |_req: Request| -> Result<Response, Error> { Ok(text("done")) };
        let res = Next::new(&[], &handler).handle(request()).unwrap();
        assert_eq!(res.body(), "done");
    }

    #[test]
    fn chain_runs_outermost_first() {
        let handler = |_req: Request| -> Result<Response, Error> { Ok(text("h")) };
        let chain: Vec<Rc<dyn Middleware>> = vec![Rc::new(Tag("outer")), Rc::new(Tag("inner"))];
        let res = Next::new(&chain, &handler).handle(request()).unwrap();
        assert_eq!(res.body(), "outer+inner+h");
    }

    #[test]
    fn middleware_can_short_circuit() {
        let handler = |_req: Request| -> Result<Response, Error> {
            panic!("handler must not run");
        };
        let chain: Vec<Rc<dyn Middleware>> = vec![Rc::new(Reject), Rc::new(Tag("never"))];
        let err = Next::new(&chain, &handler).handle(request()).unwrap_err();
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn shared_instance_across_chains() {
        let shared: Rc<dyn Middleware> = Rc::new(Tag("shared"));
        let handler = |_req: Request| -> Result<Response, Error> { Ok(text("h")) };

        for _ in 0..2 {
            let chain = [shared.clone()];
            let res = Next::new(&chain, &handler).handle(request()).unwrap();
            assert_eq!(res.body(), "shared+h");
        }
    }
}

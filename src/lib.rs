//! Regex-based path routing with nested route groups and ordered middleware.
//!
//! `clear-router` is the request-routing core of a small web framework. It
//! compiles route path templates with dynamic segments (`{name}`,
//! `{name:regex}`) into matching regular expressions, organizes routes into
//! nested path-prefixed groups, and composes middleware around matched
//! handlers, outermost group first.
//!
//! The crate is synchronous and transport-agnostic: requests and responses
//! are plain [`http`] messages with [`bytes::Bytes`] bodies, and one
//! [`Router::dispatch`] call handles one request to completion. The route
//! tree is built once at bootstrap and stays read-only during dispatch; all
//! request-scoped state (captured parameters, the middleware cursor) is
//! allocated per call.
//!
//! # Examples
//! ```
//! use bytes::Bytes;
//! use clear_router::{Request, RequestExt, Router};
//!
//! let mut router = Router::new();
//! router
//!     .map("GET", "/post/{id:[0-9]+}-{slug}", |req: Request| {
//!         let body = format!("post #{}", req.params().query("id"));
//!         Ok(http::Response::builder().body(Bytes::from(body)).unwrap())
//!     })
//!     .name("post");
//!
//! let req = http::Request::get("/post/42-hello-world").body(Bytes::new()).unwrap();
//! let res = router.dispatch(req).unwrap();
//! assert_eq!(res.body(), "post #42");
//!
//! let path = router.url_for("post", &[("id", "42"), ("slug", "hello-world")]).unwrap();
//! assert_eq!(path, "/post/42-hello-world");
//! ```

#![deny(rust_2018_idioms, nonstandard_style)]

mod de;
mod error;
mod group;
mod middleware;
mod params;
mod pattern;
mod registry;
mod route;

pub use self::de::ParamsDeserializer;
pub use self::error::{BuildPathError, Error};
pub use self::group::{RouteGroup, Router};
pub use self::middleware::{fn_middleware, Handler, Middleware, Next};
pub use self::params::{Params, RequestExt};
pub use self::pattern::PathPattern;
pub use self::route::Route;

/// Inbound request: an [`http::Request`] with a [`bytes::Bytes`] body.
///
/// Request-scoped data, including the [`Params`] bound by dispatch, lives in
/// the request's extension map.
pub type Request = http::Request<bytes::Bytes>;

/// Outbound response: an [`http::Response`] with a [`bytes::Bytes`] body.
pub type Response = http::Response<bytes::Bytes>;

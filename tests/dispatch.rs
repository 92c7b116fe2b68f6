//! End-to-end dispatch behavior: group nesting, middleware order, errors.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use clear_router::{Error, Middleware, Next, Request, RequestExt, Response, Router};
use http::StatusCode;

fn text(body: impl Into<Bytes>) -> Response {
    http::Response::builder().body(body.into()).unwrap()
}

fn get(path: &str) -> Request {
    http::Request::get(path).body(Bytes::new()).unwrap()
}

fn ok(_req: Request) -> Result<Response, Error> {
    Ok(text("ok"))
}

/// Appends its label to a shared log when the request passes through.
struct Recorder {
    label: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Recorder {
    fn new(label: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Recorder {
        Recorder {
            label,
            log: Rc::clone(log),
        }
    }
}

impl Middleware for Recorder {
    fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
        self.log.borrow_mut().push(self.label);
        next.handle(req)
    }
}

struct Gate;

impl Middleware for Gate {
    fn process(&self, req: Request, next: Next<'_>) -> Result<Response, Error> {
        if req.headers().contains_key("authorization") {
            next.handle(req)
        } else {
            Err(Error::unauthorized())
        }
    }
}

#[test]
fn end_to_end_named_route() {
    let mut router = Router::new();
    router
        .map("GET", "/post/{id:[0-9]+}-{slug}", |req: Request| {
            let params = req.params();
            Ok(text(format!(
                "{}:{}",
                params.query("id"),
                params.query("slug")
            )))
        })
        .name("post");

    let res = router.dispatch(get("/post/42-hello-world")).unwrap();
    assert_eq!(res.body(), "42:hello-world");

    let path = router
        .url_for("post", &[("id", "42"), ("slug", "hello-world")])
        .unwrap();
    assert_eq!(path, "/post/42-hello-world");

    // non-numeric id violates the id constraint
    let err = router.dispatch(get("/post/abc-hello")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn middleware_runs_outer_to_inner() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut router = Router::new();
    let api = router.group("/api");
    api.middleware(Recorder::new("api", &log));

    let v1 = api.group("/v1");
    v1.middleware(Recorder::new("v1", &log));
    v1.map("GET", "/status", ok)
        .middleware(Recorder::new("route", &log));

    let res = router.dispatch(get("/api/v1/status")).unwrap();
    assert_eq!(res.body(), "ok");
    assert_eq!(*log.borrow(), ["api", "v1", "route"]);
}

#[test]
fn sibling_group_matches_after_swallowed_miss() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut router = Router::new();

    // textual prefix of the request path, but no leaf matches below it
    let decoy = router.group("/ap");
    decoy.middleware(Recorder::new("decoy", &log));
    decoy.map("GET", "/x", ok);

    let app = router.group("/app");
    app.middleware(Recorder::new("app", &log));
    app.map("GET", "/shared", ok);

    let res = router.dispatch(get("/app/shared")).unwrap();
    assert_eq!(res.body(), "ok");

    // the decoy group's middleware was unwound along with its miss
    assert_eq!(*log.borrow(), ["app"]);
}

#[test]
fn group_middleware_does_not_leak_to_outside_routes() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut router = Router::new();
    let api = router.group("/api");
    api.middleware(Recorder::new("api", &log));
    api.map("GET", "/inside", ok);
    router.map("GET", "/outside", ok);

    router.dispatch(get("/outside")).unwrap();
    assert!(log.borrow().is_empty());

    router.dispatch(get("/api/inside")).unwrap();
    assert_eq!(*log.borrow(), ["api"]);
}

#[test]
fn auth_errors_pass_through_unmodified() {
    let mut router = Router::new();
    let admin = router.group("/admin");
    admin.middleware(Gate);
    admin.map("GET", "/panel", ok);

    let err = router.dispatch(get("/admin/panel")).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert!(!err.is_not_found());

    let req = http::Request::get("/admin/panel")
        .header("authorization", "Bearer xyz")
        .body(Bytes::new())
        .unwrap();
    let res = router.dispatch(req).unwrap();
    assert_eq!(res.body(), "ok");
}

#[test]
fn head_dispatches_to_get_route() {
    let mut router = Router::new();
    router.map("GET", "/page", ok);

    let req = http::Request::builder()
        .method(http::Method::HEAD)
        .uri("/page")
        .body(Bytes::new())
        .unwrap();
    let res = router.dispatch(req).unwrap();
    assert_eq!(res.body(), "ok");
}

#[test]
fn path_matching_is_case_insensitive() {
    let mut router = Router::new();
    router.group("/api").map("GET", "/status", ok);

    let res = router.dispatch(get("/API/Status")).unwrap();
    assert_eq!(res.body(), "ok");
}

#[test]
fn boundary_translates_errors_to_responses() {
    let mut router = Router::new();
    router.map("GET", "/ok", ok);

    // the application-boundary glue the router contract supports
    let handle = |router: &Router, req: Request| -> Response {
        router.dispatch(req).unwrap_or_else(|err| err.to_response())
    };

    let res = handle(&router, get("/ok"));
    assert_eq!(res.status(), StatusCode::OK);

    let res = handle(&router, get("/missing"));
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn params_are_empty_without_dynamic_segments() {
    let mut router = Router::new();
    router.map("GET", "/static", |req: Request| {
        assert!(req.params().is_empty());
        Ok(text("ok"))
    });

    router.dispatch(get("/static")).unwrap();
}

#[test]
fn typed_params_in_handler() {
    #[derive(serde::Deserialize)]
    struct Info {
        id: u32,
        slug: String,
    }

    let mut router = Router::new();
    router.map("GET", "/post/{id:[0-9]+}-{slug}", |req: Request| {
        let info: Info = req.params().load().map_err(Error::internal)?;
        Ok(text(format!("{}/{}", info.id, info.slug)))
    });

    let res = router.dispatch(get("/post/7-seven")).unwrap();
    assert_eq!(res.body(), "7/seven");
}

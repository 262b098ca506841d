use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use asgate::{
    BoxFuture, Bytes, Config, Failure, Gateway, Hooks, Inbound, Method, Outbound, Params, Phase, Request, Response,
    Routes, Scope, StatusCode,
};
use serde_json::{json, Value};

struct Sent {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Sent {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn call(gateway: &Gateway, scope: Scope, body: &'static str) -> Sent {
    let mut sent: Vec<Outbound> = Vec::new();
    gateway
        .serve(scope, VecDeque::from([Inbound::body(body)]), &mut sent)
        .await
        .unwrap();

    assert_eq!(sent.len(), 2, "expected a start and a body message: {:?}", sent);
    let mut sent = sent.into_iter();
    match (sent.next(), sent.next()) {
        (
            Some(Outbound::ResponseStart { status, headers }),
            Some(Outbound::ResponseBody {
                body,
                more_body: false,
            }),
        ) => Sent {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| {
                    (
                        String::from_utf8(k.to_vec()).unwrap(),
                        String::from_utf8(v.to_vec()).unwrap(),
                    )
                })
                .collect(),
            body,
        },
        other => panic!("unexpected messages: {:?}", other),
    }
}

fn hello(_: &mut Request, params: Params) -> BoxFuture<'_, Result<String, Failure>> {
    Box::pin(async move { Ok(format!("hello {}", params.get("name").unwrap_or("world"))) })
}

fn echo_json(req: &mut Request, _: Params) -> BoxFuture<'_, Result<Value, Failure>> {
    Box::pin(async move { Ok(json!({ "got": req.json().clone(), "route": req.route() })) })
}

fn created(_: &mut Request, _: Params) -> BoxFuture<'_, Result<(Value, StatusCode, Vec<(String, String)>), Failure>> {
    Box::pin(async move {
        Ok((
            json!({ "id": 1 }),
            StatusCode::CREATED,
            vec![("X-Id".to_owned(), "1".to_owned())],
        ))
    })
}

fn teapot(_: &mut Request, _: Params) -> BoxFuture<'_, Result<(), Failure>> {
    Box::pin(async move {
        Err(Failure::application(StatusCode::IM_A_TEAPOT, "short and stout").with_body("no coffee here"))
    })
}

fn explode(_: &mut Request, params: Params) -> BoxFuture<'_, Result<(), Failure>> {
    Box::pin(async move {
        if params.get("kind") == Some("panic") {
            panic!("handler exploded");
        }
        Ok(())
    })
}

#[tokio::test]
async fn routes_to_handler() {
    let gateway = Gateway::new().itinerary(Routes::new().get("/hello/:name", hello).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/hello/ferris"), "").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.header("content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(sent.body, "hello ferris");
}

#[tokio::test]
async fn json_request_and_reply() {
    let gateway = Gateway::new().itinerary(Routes::new().post("/echo", echo_json).unwrap());
    let scope = Scope::http(Method::POST, "/echo").header("Content-Type", "application/json");

    let sent = call(&gateway, scope, r#"{"a": [1, 2]}"#).await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.header("content-type"), Some("application/json"));
    assert_eq!(sent.json(), json!({ "got": { "a": [1, 2] }, "route": "/echo" }));
}

#[tokio::test]
async fn tuple_replies() {
    let gateway = Gateway::new().itinerary(Routes::new().post("/items", created).unwrap());

    let sent = call(&gateway, Scope::http(Method::POST, "/items"), "").await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.header("x-id"), Some("1"));
    assert_eq!(sent.json(), json!({ "id": 1 }));
}

#[tokio::test]
async fn response_headers_are_lower_cased() {
    let gateway = Gateway::new()
        .hooks(Hooks::new().before_response(|res| res.header("X-Served-By", "asgate")))
        .itinerary(Routes::new().get("/", hello).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/"), "").await;
    assert_eq!(sent.header("x-served-by"), Some("asgate"));
    assert!(sent.headers.iter().all(|(k, _)| *k == k.to_ascii_lowercase()));
}

#[tokio::test]
async fn options_short_circuits() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted(_: &mut Request, _: Params) -> BoxFuture<'_, Result<&'static str, Failure>> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok("body") })
    }

    let routes = Routes::new()
        .route(Method::OPTIONS, "/thing", counted)
        .unwrap()
        .get("/thing", counted)
        .unwrap();
    let gateway = Gateway::new().itinerary(routes);

    let sent = call(&gateway, Scope::http(Method::OPTIONS, "/thing"), "").await;
    assert_eq!(sent.status, StatusCode::NO_CONTENT);
    assert!(sent.body.is_empty());
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn decode_failure_skips_handler() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted(_: &mut Request, _: Params) -> BoxFuture<'_, Result<&'static str, Failure>> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok("body") })
    }

    let gateway = Gateway::new().itinerary(Routes::new().post("/", counted).unwrap());
    let scope = Scope::http(Method::POST, "/").header("Content-Type", "application/json");

    let sent = call(&gateway, scope, "{broken").await;
    assert_eq!(sent.status, StatusCode::BAD_REQUEST);
    assert_eq!(sent.json()["status"], 400);
    assert_eq!(sent.json()["reason"], "Bad Request");
    assert!(sent.json().get("trace").is_none());
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payload_too_large() {
    let gateway = Gateway::new()
        .config(Config::new().limit(4))
        .itinerary(Routes::new().post("/", hello).unwrap());

    let sent = call(&gateway, Scope::http(Method::POST, "/"), "too long").await;
    assert_eq!(sent.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn hooks_run_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    fn record(req: &mut Request, _: Params) -> BoxFuture<'_, Result<&'static str, Failure>> {
        Box::pin(async move {
            if let Some(log) = req.extensions().get::<Arc<Mutex<Vec<&'static str>>>>() {
                log.lock().unwrap().push("handler");
            }
            Ok("done")
        })
    }

    let (init, before, route_hook, response) = (log.clone(), log.clone(), log.clone(), log.clone());
    let hooks = Hooks::new()
        .init_request(move |req| {
            init.lock().unwrap().push("init");
            req.extensions_mut().insert(init.clone());
        })
        .before_request(move |_| -> Result<Option<Response>, Failure> {
            before.lock().unwrap().push("before");
            Ok(None)
        })
        .before_response(move |res| {
            response.lock().unwrap().push("response");
            res
        });
    let routes = Routes::new()
        .get("/", record)
        .unwrap()
        .before_request(move |_| -> Result<Option<Response>, Failure> {
            route_hook.lock().unwrap().push("route");
            Ok(None)
        });

    let gateway = Gateway::new().hooks(hooks).itinerary(routes);
    let sent = call(&gateway, Scope::http(Method::GET, "/"), "").await;

    assert_eq!(sent.body, "done");
    assert_eq!(*log.lock().unwrap(), ["init", "before", "route", "handler", "response"]);
}

#[tokio::test]
async fn before_request_short_circuits() {
    let hooks = Hooks::new()
        .before_request(|req| Ok((req.path() == "/admin").then(|| ("forbidden", StatusCode::FORBIDDEN))))
        .before_request(|_| Ok(Some("second hook")));
    let gateway = Gateway::new()
        .hooks(hooks)
        .itinerary(Routes::new().get("/admin", hello).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/admin"), "").await;
    assert_eq!(sent.status, StatusCode::FORBIDDEN);
    assert_eq!(sent.body, "forbidden");

    let sent = call(&gateway, Scope::http(Method::GET, "/other"), "").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body, "second hook");
}

#[tokio::test]
async fn route_hook_reply_is_post_processed() {
    let routes = Routes::new()
        .get("/", hello)
        .unwrap()
        .before_request(|req| Ok(req.actor::<String>().is_none().then(|| ("login first", StatusCode::UNAUTHORIZED))))
        .modify_response(|res| res.header("X-Table", "main"));
    let gateway = Gateway::new().itinerary(routes);

    let sent = call(&gateway, Scope::http(Method::GET, "/"), "").await;
    assert_eq!(sent.status, StatusCode::UNAUTHORIZED);
    assert_eq!(sent.header("x-table"), Some("main"));
}

#[tokio::test]
async fn before_request_failure_is_answered() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted(_: &mut Request, _: Params) -> BoxFuture<'_, Result<&'static str, Failure>> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok("body") })
    }

    let hooks = Hooks::new().before_request(|_| -> Result<Option<String>, Failure> {
        Err(Failure::application(StatusCode::SERVICE_UNAVAILABLE, "auth backend down"))
    });
    let gateway = Gateway::new()
        .hooks(hooks)
        .itinerary(Routes::new().get("/", counted).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/"), "").await;
    assert_eq!(sent.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(sent.json()["reason"], "auth backend down");
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn route_hook_failure_is_answered() {
    let routes = Routes::new()
        .get("/", hello)
        .unwrap()
        .before_request(|req| -> Result<Option<String>, Failure> {
            match req.header("authorization") {
                Some(_) => Ok(None),
                None => Err(Failure::application(StatusCode::UNAUTHORIZED, "missing token")),
            }
        })
        .error_handler(StatusCode::UNAUTHORIZED, |res: Response, _: Option<&Request>| {
            res.header("WWW-Authenticate", "Bearer")
        });
    let gateway = Gateway::new().itinerary(routes);

    let sent = call(&gateway, Scope::http(Method::GET, "/"), "").await;
    assert_eq!(sent.status, StatusCode::UNAUTHORIZED);
    assert_eq!(sent.header("www-authenticate"), Some("Bearer"));
    assert_eq!(sent.json()["reason"], "missing token");

    let sent = call(&gateway, Scope::http(Method::GET, "/").header("Authorization", "Bearer t"), "").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body, "hello world");
}

#[tokio::test]
async fn hook_panics_are_answered() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("app.js"), "let x = 1;").unwrap();

    let routes = || Routes::new().get("/", hello).unwrap();
    let cases = vec![
        (
            "init failed",
            "/",
            Gateway::new()
                .hooks(Hooks::new().init_request(|_| panic!("init failed")))
                .itinerary(routes()),
        ),
        (
            "auth backend down",
            "/",
            Gateway::new()
                .hooks(Hooks::new().before_request(|_| -> Result<Option<String>, Failure> { panic!("auth backend down") }))
                .itinerary(routes()),
        ),
        (
            "route hook failed",
            "/",
            Gateway::new().itinerary(
                routes().before_request(|_| -> Result<Option<String>, Failure> { panic!("route hook failed") }),
            ),
        ),
        (
            "rewrite failed",
            "/",
            Gateway::new().itinerary(routes().modify_response(|_| -> Response { panic!("rewrite failed") })),
        ),
        (
            "mount failed",
            "/assets/app.js",
            Gateway::new().itinerary(
                Routes::new().static_files_with("/assets", root.path(), |_, _| -> Response { panic!("mount failed") }),
            ),
        ),
        (
            "late failure",
            "/",
            Gateway::new()
                .hooks(Hooks::new().before_response(|res| {
                    if res.status == StatusCode::OK {
                        panic!("late failure");
                    }
                    res
                }))
                .itinerary(routes()),
        ),
        (
            "renderer broke",
            "/missing",
            Gateway::new().itinerary(
                routes().error_handler(StatusCode::NOT_FOUND, |_: Response, _: Option<&Request>| -> Response {
                    panic!("renderer broke")
                }),
            ),
        ),
    ];

    for (reason, path, gateway) in cases {
        let sent = call(&gateway, Scope::http(Method::GET, path), "").await;
        assert_eq!(sent.status, StatusCode::INTERNAL_SERVER_ERROR, "{}", reason);
        assert_eq!(sent.header("content-type"), Some("application/json"), "{}", reason);
        assert_eq!(sent.json()["reason"], reason);
    }
}

#[tokio::test]
async fn first_matching_table_owns_the_call() {
    let first = Routes::new()
        .get("/a", hello)
        .unwrap()
        .modify_response(|res| res.header("X-Table", "first"));
    let second = Routes::new()
        .get("/b", hello)
        .unwrap()
        .get("/a", echo_json)
        .unwrap()
        .modify_response(|res| res.header("X-Table", "second"));
    let gateway = Gateway::new().itinerary(first).itinerary(second);

    let sent = call(&gateway, Scope::http(Method::GET, "/a"), "").await;
    assert_eq!(sent.header("x-table"), Some("first"));
    assert_eq!(sent.body, "hello world");

    let sent = call(&gateway, Scope::http(Method::GET, "/b"), "").await;
    assert_eq!(sent.header("x-table"), Some("second"));
}

#[tokio::test]
async fn not_found() {
    let gateway = Gateway::new().itinerary(Routes::new().get("/", hello).unwrap());

    let sent = call(&gateway, Scope::http(Method::POST, "/"), "").await;
    assert_eq!(sent.status, StatusCode::NOT_FOUND);
    assert_eq!(
        sent.json(),
        json!({ "status": 404, "reason": "Not Found", "body": "no route for POST /" })
    );
}

#[tokio::test]
async fn application_failure_keeps_its_status() {
    let gateway = Gateway::new()
        .config(Config::new().expose_trace(true))
        .itinerary(Routes::new().get("/tea", teapot).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/tea"), "").await;
    assert_eq!(sent.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(
        sent.json(),
        json!({ "status": 418, "reason": "short and stout", "body": "no coffee here", "trace": [] })
    );
}

#[tokio::test]
async fn error_handler_renders_body() {
    let routes = Routes::new()
        .get("/", hello)
        .unwrap()
        .error_handler(StatusCode::NOT_FOUND, |res: Response, req: Option<&Request>| {
            let path = req.map(Request::path).unwrap_or("?");
            Response::text(format!("{} is nowhere ({})", path, res.status.as_u16())).status(res.status)
        });
    let gateway = Gateway::new().itinerary(routes);

    let sent = call(&gateway, Scope::http(Method::GET, "/missing"), "").await;
    assert_eq!(sent.status, StatusCode::NOT_FOUND);
    assert_eq!(sent.header("content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(sent.body, "/missing is nowhere (404)");
}

#[tokio::test]
async fn custom_error_responder() {
    let gateway = Gateway::new()
        .error_responder(|report: &asgate::ErrorReport, _: Option<&Request>| {
            Response::text(format!("oops: {}", report.reason)).status(report.status)
        })
        .itinerary(Routes::new().get("/tea", teapot).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/tea"), "").await;
    assert_eq!(sent.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(sent.body, "oops: short and stout");
}

#[tokio::test]
async fn handler_panic_is_a_500() {
    let gateway = Gateway::new().itinerary(Routes::new().get("/boom/:kind", explode).unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/boom/panic"), "").await;
    assert_eq!(sent.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(sent.json()["reason"], "handler exploded");

    let sent = call(&gateway, Scope::http(Method::GET, "/boom/calm"), "").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert!(sent.body.is_empty());
}

const UPLOAD: &str = "--XyZ\r\n\
Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello file\r\n\
--XyZ--\r\n";

fn upload(path: &str) -> Scope {
    Scope::http(Method::POST, path).header("Content-Type", "multipart/form-data; boundary=XyZ")
}

fn entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn stored(req: &mut Request, params: Params) -> BoxFuture<'_, Result<String, Failure>> {
    Box::pin(async move {
        let files = req.files();
        assert_eq!(files.len(), 1);
        let path = files[0].filepath().unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        if params.get("outcome") == Some("fail") {
            return Err(Failure::application(StatusCode::CONFLICT, "rejected upload"));
        }
        Ok(name)
    })
}

#[tokio::test]
async fn temp_files_are_released() {
    let temp = tempfile::tempdir().unwrap();
    let gateway = Gateway::new()
        .config(Config::new().temp_dir(temp.path()))
        .itinerary(Routes::new().post("/upload/:outcome", stored).unwrap());

    let sent = call(&gateway, upload("/upload/ok"), UPLOAD).await;
    assert_eq!(sent.status, StatusCode::OK);
    assert!(String::from_utf8(sent.body.to_vec()).unwrap().starts_with("asgate_"));
    assert_eq!(entries(temp.path()), 0);

    let sent = call(&gateway, upload("/upload/fail"), UPLOAD).await;
    assert_eq!(sent.status, StatusCode::CONFLICT);
    assert_eq!(entries(temp.path()), 0);

    let broken = "--XyZ\r\n\
Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\n\
\r\n\
hello file\r\n\
--XyZ\r\n\
Content-Disposition: form-data\r\n\
\r\n\
nameless\r\n\
--XyZ--\r\n";
    let sent = call(&gateway, upload("/upload/ok"), broken).await;
    assert_eq!(sent.status, StatusCode::BAD_REQUEST);
    assert_eq!(entries(temp.path()), 0);
}

#[derive(Clone)]
struct SaveTo(std::path::PathBuf);

fn keep(req: &mut Request, _: Params) -> BoxFuture<'_, Result<String, Failure>> {
    Box::pin(async move {
        let target = req.extensions().get::<SaveTo>().map(|to| to.0.clone()).unwrap();
        let mut saved = Vec::new();
        for (i, file) in req.files_mut().into_iter().enumerate() {
            file.save(target.join(format!("kept-{}", i)))?;
            saved.push(file.filename().unwrap_or_default().to_owned());
        }
        if let Ok(asgate::body::Body::File(file)) = req.body_mut() {
            file.save(target.join("raw.bin"))?;
            saved.push(file.filename().unwrap_or_default().to_owned());
        }
        Ok(saved.join(","))
    })
}

#[tokio::test]
async fn handlers_can_keep_uploads() {
    let temp = tempfile::tempdir().unwrap();
    let kept = tempfile::tempdir().unwrap();
    let target = kept.path().to_path_buf();

    let gateway = Gateway::new()
        .config(Config::new().temp_dir(temp.path()))
        .hooks(Hooks::new().init_request(move |req| {
            req.extensions_mut().insert(SaveTo(target.clone()));
        }))
        .itinerary(Routes::new().post("/keep", keep).unwrap().put("/keep", keep).unwrap());

    let sent = call(&gateway, upload("/keep"), UPLOAD).await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body, "kept-0");
    assert_eq!(std::fs::read(kept.path().join("kept-0")).unwrap(), b"hello file");

    let sent = call(&gateway, Scope::http(Method::PUT, "/keep"), "\u{0}\u{1}binary").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body, "raw.bin");
    assert_eq!(std::fs::read(kept.path().join("raw.bin")).unwrap(), b"\x00\x01binary");

    assert_eq!(entries(temp.path()), 0);
}

#[tokio::test]
async fn redirect() {
    let gateway = Gateway::new().itinerary(Routes::new().redirect("/old", "/new").unwrap());

    let sent = call(&gateway, Scope::http(Method::GET, "/old"), "").await;
    assert_eq!(sent.status, StatusCode::FOUND);
    assert_eq!(sent.header("location"), Some("/new"));
}

#[tokio::test]
async fn static_files() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("css")).unwrap();
    std::fs::write(root.path().join("css/app.css"), "body { margin: 0 }").unwrap();

    let routes = Routes::new()
        .static_files_with("/assets", root.path(), |res, _| res.header("Cache-Control", "max-age=60"));
    let gateway = Gateway::new().itinerary(routes);

    let sent = call(&gateway, Scope::http(Method::GET, "/assets/css/app.css"), "").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.header("content-type"), Some("text/css"));
    assert_eq!(sent.header("cache-control"), Some("max-age=60"));
    assert_eq!(sent.body, "body { margin: 0 }");

    let sent = call(&gateway, Scope::http(Method::GET, "/assets/missing.js"), "").await;
    assert_eq!(sent.status, StatusCode::NOT_FOUND);

    let sent = call(&gateway, Scope::http(Method::GET, "/assets/%2e%2e/secret"), "").await;
    assert_eq!(sent.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lifespan() {
    static STARTED: AtomicUsize = AtomicUsize::new(0);

    let hooks = Hooks::new()
        .on_startup(|| async {
            STARTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_shutdown(|| async { Err(Failure::application(StatusCode::INTERNAL_SERVER_ERROR, "pool busy")) });
    let gateway = Gateway::new().hooks(hooks);

    let receive = VecDeque::from([Inbound::Startup, Inbound::body("ignored"), Inbound::Shutdown, Inbound::Startup]);
    let mut sent: Vec<Outbound> = Vec::new();
    gateway.serve(Scope::lifespan(), receive, &mut sent).await.unwrap();

    assert_eq!(STARTED.load(Ordering::SeqCst), 1);
    assert_eq!(
        sent,
        [
            Outbound::StartupComplete,
            Outbound::ShutdownFailed {
                message: "pool busy".to_owned()
            },
        ]
    );
}

#[tokio::test]
async fn startup_failure() {
    let hooks = Hooks::new().on_startup(|| async { Err(Failure::application(StatusCode::INTERNAL_SERVER_ERROR, "no db")) });
    let gateway = Gateway::new().hooks(hooks);

    let mut sent: Vec<Outbound> = Vec::new();
    gateway
        .serve(Scope::lifespan(), VecDeque::from([Inbound::Startup]), &mut sent)
        .await
        .unwrap();

    assert_eq!(
        sent,
        [Outbound::StartupFailed {
            message: "no db".to_owned()
        }]
    );
}

#[tokio::test]
async fn websocket_is_unsupported() {
    let gateway = Gateway::new();
    let mut sent: Vec<Outbound> = Vec::new();

    let err = gateway
        .serve(Scope::websocket("/ws"), VecDeque::new(), &mut sent)
        .await
        .unwrap_err();
    assert!(matches!(err, Failure::UnsupportedPhase(Phase::Websocket)));
    assert!(sent.is_empty());
}

#[tokio::test]
async fn transport_failure_is_returned() {
    let gateway = Gateway::new().itinerary(Routes::new().get("/", hello).unwrap());
    let (tx, rx) = tokio::sync::mpsc::channel::<Outbound>(4);
    drop(rx);

    let err = gateway
        .serve(Scope::http(Method::GET, "/"), VecDeque::from([Inbound::body("")]), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, Failure::Transport { .. }));
}

#[tokio::test]
async fn channel_pair() {
    let gateway = Gateway::new().itinerary(Routes::new().put("/hello/:name", hello).unwrap());
    let (in_tx, in_rx) = tokio::sync::mpsc::unbounded_channel();
    let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel();

    in_tx.send(Inbound::chunk("par")).unwrap();
    in_tx.send(Inbound::body("tial")).unwrap();
    gateway
        .serve(Scope::http(Method::PUT, "/hello/you"), in_rx, out_tx)
        .await
        .unwrap();

    assert!(matches!(
        out_rx.recv().await,
        Some(Outbound::ResponseStart { status, .. }) if status == StatusCode::OK
    ));
    assert_eq!(
        out_rx.recv().await,
        Some(Outbound::ResponseBody {
            body: Bytes::from("hello you"),
            more_body: false
        })
    );
}

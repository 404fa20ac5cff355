//! Capture-wrapper behavior against a live client, with panic hooks
//! disabled so the wrappers are the only reporting path.
//!
//! One test function: the active client is process-wide.

use std::panic;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrappers_report_then_let_the_failure_continue() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = faultline::init(
        faultline::Config::new("test-token", format!("{}/ingest", server.uri()))
            .with_panic_hook(false)
            .with_thread_hook(false),
    )
    .expect("init");

    tokio::task::spawn_blocking(move || {
        // capture_call: the original payload is re-raised unchanged and
        // exactly one event is enqueued.
        let outcome = panic::catch_unwind(|| faultline::capture_call(|| -> () { panic!("x") }));
        let payload = outcome.expect_err("panic propagates");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"x"));

        // capture_scope: reports once on unwinding exit, nothing on normal
        // exit.
        {
            let _quiet = faultline::capture_scope();
        }
        let outcome = panic::catch_unwind(|| {
            let _guard = faultline::capture_scope();
            panic!("scoped boom");
        });
        assert!(outcome.is_err());

        // capture_result: the error passes through and is reported.
        let err: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "deadline exceeded",
        ));
        assert!(faultline::capture_result(err).is_err());

        assert!(client.flush(Duration::from_secs(10)));
    })
    .await
    .expect("blocking task");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);

    let bodies: Vec<serde_json::Value> = requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .collect();

    assert_eq!(bodies[0]["exception"]["type"], "panic");
    assert_eq!(bodies[0]["exception"]["message"], "x");

    assert_eq!(bodies[1]["exception"]["type"], "panic");
    assert_eq!(bodies[1]["exception"]["message"], "panic inside guarded scope");

    assert_eq!(bodies[2]["exception"]["type"], "Error");
    assert_eq!(bodies[2]["exception"]["message"], "deadline exceeded");
}

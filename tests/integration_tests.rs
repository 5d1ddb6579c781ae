//! Integration tests for the intake server and submission client
//!
//! These tests run a real listener on an ephemeral loopback port backed by a
//! temporary SQLite file and talk to it over TCP.

use intake_client::session::{SessionError, SubmissionSession};
use intake_server::auth::AuthGate;
use intake_server::config::ServerConfig;
use intake_server::error::ServerError;
use intake_server::network::Server;
use intake_server::service::IntakeService;
use intake_server::store::ApplicationStore;
use intake_shared::{Application, SubmissionRequest, SubmissionResponse};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const AUTH_KEY: &str = "integration-secret";
const IDLE_WINDOW: Duration = Duration::from_millis(300);

struct TestServer {
    addr: String,
    store: ApplicationStore,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(database: &Path) -> Self {
        let mut config = ServerConfig::new(AUTH_KEY);
        config.port = 0;
        config.database = database.to_path_buf();
        config.idle_window = IDLE_WINDOW;

        let store = ApplicationStore::open(&config.database).unwrap();
        let service = IntakeService::new(AuthGate::new(AUTH_KEY), store.clone());
        let server = Server::bind(&config, service).await.unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(server.run(shutdown_rx));

        TestServer {
            addr,
            store,
            shutdown,
            handle,
        }
    }

    fn session(&self) -> SubmissionSession {
        SubmissionSession::new(self.addr.clone())
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

fn alice() -> Application {
    Application {
        name: "Alice Smith".to_string(),
        address: "1 Main St".to_string(),
        educational_qualifications: "BSc CS".to_string(),
        course: "MSc Data Analytics".to_string(),
        start_year: 2025,
        start_month: "September".to_string(),
    }
}

/// Checks `DBS-<code>-<yy>-XXXXXXXX` with an uppercase hex suffix.
fn assert_registration_format(number: &str, code: &str, yy: &str) {
    let prefix = format!("DBS-{}-{}-", code, yy);
    assert!(number.starts_with(&prefix), "{} lacks prefix {}", number, prefix);

    let suffix = &number[prefix.len()..];
    assert_eq!(suffix.len(), 8, "bad suffix in {}", number);
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
        "bad suffix in {}",
        number
    );
}

/// Sends raw bytes and reads until the server closes the connection.
async fn raw_exchange(addr: &str, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    if !payload.is_empty() {
        stream.write_all(payload).await.unwrap();
    }
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    reply
}

/// END-TO-END SUBMISSION SCENARIOS
mod submission_tests {
    use super::*;

    /// Valid submission is stored and answered with a registration number
    #[tokio::test]
    async fn valid_submission_is_registered() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let response = server
            .session()
            .submit(&SubmissionRequest::new(alice(), AUTH_KEY))
            .await
            .unwrap();

        assert!(response.success, "unexpected {:?}", response);
        assert!(response.error.is_none());
        let number = response.registration_number.unwrap();
        assert_registration_format(&number, "DA", "25");

        let stored = server.store.find(&number).unwrap().unwrap();
        assert_eq!(stored.application, alice());
        assert!(!stored.application_date.is_empty());

        server.stop().await;
    }

    /// Each catalogue course maps to its own code; anything else is GEN
    #[tokio::test]
    async fn course_codes_appear_in_registration_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let cases = [
            ("MSc in Cyber Security", 2024, "CS", "24"),
            ("MSc Information Systems & Computing", 2030, "ISC", "30"),
            ("Diploma in Something Else", 2027, "GEN", "27"),
        ];

        for (course, year, code, yy) in cases {
            let mut application = alice();
            application.course = course.to_string();
            application.start_year = year;

            let response = server
                .session()
                .submit(&SubmissionRequest::new(application, AUTH_KEY))
                .await
                .unwrap();

            assert_registration_format(&response.registration_number.unwrap(), code, yy);
        }

        server.stop().await;
    }

    /// Wrong secret is rejected and nothing is stored
    #[tokio::test]
    async fn wrong_auth_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let response = server
            .session()
            .submit(&SubmissionRequest::new(alice(), "wrong"))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Authentication failed"));
        assert!(response.registration_number.is_none());
        assert_eq!(server.store.count().unwrap(), 0);

        server.stop().await;
    }

    /// A request without any auth_key field is rejected the same way
    #[tokio::test]
    async fn missing_auth_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let payload = serde_json::to_vec(&alice()).unwrap();
        let reply = raw_exchange(&server.addr, &payload).await;
        let response = SubmissionResponse::from_bytes(&reply).unwrap();

        assert_eq!(response, SubmissionResponse::rejected("Authentication failed"));
        assert_eq!(server.store.count().unwrap(), 0);

        server.stop().await;
    }

    /// Unparsable body yields a format error within the idle window
    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let started = Instant::now();
        let reply = raw_exchange(&server.addr, b"{\"name\": \"Alice\", oops").await;
        let elapsed = started.elapsed();

        let response = SubmissionResponse::from_bytes(&reply).unwrap();
        assert_eq!(response, SubmissionResponse::rejected("Invalid data format"));
        assert!(
            elapsed < IDLE_WINDOW + Duration::from_secs(2),
            "connection lingered for {:?}",
            elapsed
        );
        assert_eq!(server.store.count().unwrap(), 0);

        server.stop().await;
    }

    /// Twenty simultaneous submissions all succeed with distinct numbers
    #[tokio::test]
    async fn concurrent_submissions_get_distinct_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let session = server.session();
                tokio::spawn(async move {
                    let mut application = alice();
                    application.name = format!("Applicant {}", i);
                    session
                        .submit(&SubmissionRequest::new(application, AUTH_KEY))
                        .await
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert!(response.success, "unexpected {:?}", response);
            numbers.insert(response.registration_number.unwrap());
        }

        assert_eq!(numbers.len(), 20);
        assert_eq!(server.store.count().unwrap(), 20);

        server.stop().await;
    }
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// A connection that sends nothing is closed without a reply
    #[tokio::test]
    async fn empty_connection_is_closed_silently() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        let reply = raw_exchange(&server.addr, b"").await;

        assert!(reply.is_empty());
        assert_eq!(server.store.count().unwrap(), 0);

        server.stop().await;
    }

    /// A bad connection does not affect the next one
    #[tokio::test]
    async fn server_survives_bad_connection() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;

        raw_exchange(&server.addr, b"\xff\xff\xff").await;

        let response = server
            .session()
            .submit(&SubmissionRequest::new(alice(), AUTH_KEY))
            .await
            .unwrap();
        assert!(response.success);

        server.stop().await;
    }

    /// Records survive a restart and new submissions still succeed
    #[tokio::test]
    async fn restart_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("intake.db");

        let first = TestServer::start(&database).await;
        let before = first
            .session()
            .submit(&SubmissionRequest::new(alice(), AUTH_KEY))
            .await
            .unwrap()
            .registration_number
            .unwrap();
        first.stop().await;

        let second = TestServer::start(&database).await;
        assert_eq!(second.store.count().unwrap(), 1);
        assert!(second.store.find(&before).unwrap().is_some());

        let mut bob = alice();
        bob.name = "Bob Jones".to_string();
        let after = second
            .session()
            .submit(&SubmissionRequest::new(bob, AUTH_KEY))
            .await
            .unwrap();

        assert!(after.success);
        assert_ne!(after.registration_number.unwrap(), before);
        assert_eq!(second.store.count().unwrap(), 2);

        second.stop().await;
    }

    /// After shutdown the port no longer accepts submissions
    #[tokio::test]
    async fn stopped_server_refuses_connections() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::start(&dir.path().join("intake.db")).await;
        let session = server.session();
        server.stop().await;

        let err = session
            .submit(&SubmissionRequest::new(alice(), AUTH_KEY))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Refused(_)), "{:?}", err);
        assert!(err.is_transport());
    }
}

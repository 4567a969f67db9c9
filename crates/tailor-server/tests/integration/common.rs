use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tailor_core::Orchestrator;
use tailor_core::testutil::{
    MockCompleter, MockCompleterFactory, MockExtractor, MockScraper, jane_doe_completion,
};
use tailor_server::config::ServerConfig;
use tailor_server::routes;
use tailor_server::state::AppState;

pub const SERVER_KEY: &str = "server-env-key";
pub const JOB_URL: &str = "https://jobs.example.com/data-engineer";

const BOUNDARY: &str = "tailor-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub factory: MockCompleterFactory,
    pub scraper: MockScraper,
}

/// Collaborators for one test app. Defaults: a readable resume, a job page,
/// and a provider answering with the Jane Doe record.
pub struct TestAppBuilder {
    extractor: MockExtractor,
    scraper: MockScraper,
    factory: MockCompleterFactory,
    free_tier_cap: u32,
    config: ServerConfig,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            extractor: MockExtractor::new("Jane Doe\nSoftware Engineer at Acme"),
            scraper: MockScraper::new("Data Engineer. Python and SQL required."),
            factory: MockCompleterFactory::new(&jane_doe_completion()),
            free_tier_cap: 3,
            config: ServerConfig::default(),
        }
    }

    pub fn extractor(mut self, extractor: MockExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn scraper(mut self, scraper: MockScraper) -> Self {
        self.scraper = scraper;
        self
    }

    pub fn completion(mut self, completion: &str) -> Self {
        self.factory = MockCompleterFactory::with_completer(MockCompleter::new(completion));
        self
    }

    pub fn free_tier_cap(mut self, cap: u32) -> Self {
        self.free_tier_cap = cap;
        self
    }

    pub fn max_upload_bytes(mut self, max: usize) -> Self {
        self.config.max_upload_bytes = max;
        self
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.config.max_sessions = max;
        self
    }

    pub fn build(self) -> TestApp {
        let orchestrator = Orchestrator::new(self.extractor, self.scraper.clone(), self.factory.clone())
            .with_free_tier_cap(self.free_tier_cap)
            .with_env(|_| Some(SERVER_KEY.to_string()));

        let state = Arc::new(AppState::new(Arc::new(orchestrator), self.config));

        TestApp {
            router: routes::router(state),
            factory: self.factory,
            scraper: self.scraper,
        }
    }
}

pub fn setup_test_app() -> TestApp {
    TestAppBuilder::new().build()
}

/// A multipart form part: field name, optional file name, and contents.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some("resume.pdf"),
            data,
        }
    }
}

pub fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/v1/tailor")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% test resume\n";

/// The usual upload: resume plus job URL, free tier.
pub fn tailor_request() -> Request<Body> {
    multipart_request(&[Part::file("resume", FAKE_PDF), Part::text("job_url", JOB_URL)])
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Runs a successful upload and returns the new session id.
pub async fn create_session(app: &TestApp) -> String {
    let response = send(&app.router, tailor_request()).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}
